use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const CURRENT_VERSION: u32 = 1;
const SETTINGS_FILENAME: &str = "config.yaml";
pub const APP_NAME: &str = "pagerat";
const FALLBACK_EDITOR: &str = "vim";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_version")]
    pub version: u32,

    /// Wrap column count; `None` wraps at the terminal width.
    #[serde(default)]
    pub columns: Option<usize>,

    #[serde(default = "default_true")]
    pub show_status: bool,

    /// Editor used when neither `$VISUAL` nor `$EDITOR` is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub editor: Option<String>,

    /// Command run with an image path; the platform opener is used when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_viewer: Option<String>,
}

fn default_true() -> bool {
    true
}

fn default_version() -> u32 {
    CURRENT_VERSION
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            columns: None,
            show_status: true,
            editor: None,
            image_viewer: None,
        }
    }
}

impl Settings {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_NAME).join(SETTINGS_FILENAME))
    }

    /// Load from `path`, or from the default location when `None`. Missing or
    /// unreadable files yield the defaults.
    pub fn load(path: Option<&Path>) -> Self {
        match path.map(Path::to_path_buf).or_else(Self::default_path) {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    pub fn load_from(path: &Path) -> Self {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                debug!("No settings at {}: {e}", path.display());
                return Self::default();
            }
        };
        Self::parse(&content).unwrap_or_else(|e| {
            warn!("Ignoring invalid settings file {}: {e}", path.display());
            Self::default()
        })
    }

    pub fn parse(content: &str) -> Result<Self, serde_yaml::Error> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
    }

    pub fn editor_command(&self) -> String {
        resolve_editor(
            std::env::var("VISUAL").ok(),
            std::env::var("EDITOR").ok(),
            self.editor.as_deref(),
        )
    }
}

fn resolve_editor(visual: Option<String>, editor: Option<String>, configured: Option<&str>) -> String {
    [visual, editor, configured.map(str::to_string)]
        .into_iter()
        .flatten()
        .find(|cmd| !cmd.trim().is_empty())
        .unwrap_or_else(|| FALLBACK_EDITOR.to_string())
}
