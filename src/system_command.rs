//! Hand-off to external programs: the text editor and the image viewer.
//!
//! Calls block until the program exits. The real executor releases the
//! terminal for the duration of the call; the mock records what would have
//! run so the event loop can be tested without spawning anything.

use std::any::Any;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Mutex;

use log::{error, info};

use crate::terminal_guard::SuspendedTerminal;

pub trait SystemCommandExecutor {
    /// Open `path` in a text editor and wait for it to exit.
    fn edit_file(&self, path: &Path) -> Result<(), String>;

    /// Show the image at `path`.
    fn view_image(&self, path: &Path) -> Result<(), String>;

    fn as_any(&self) -> &dyn Any;
}

/// Split a configured command line such as `code --wait` into program and
/// leading arguments.
fn split_command(command: &str) -> Option<(&str, Vec<&str>)> {
    let mut parts = command.split_whitespace();
    let program = parts.next()?;
    Some((program, parts.collect()))
}

fn run_blocking(command: &str, path: &Path) -> Result<(), String> {
    let (program, args) =
        split_command(command).ok_or_else(|| "no command configured".to_string())?;
    info!("Running {program} on {}", path.display());

    let _suspended = SuspendedTerminal::new();
    let status = Command::new(program)
        .args(args)
        .arg(path)
        .status()
        .map_err(|e| format!("{program}: {e}"))?;
    if status.success() {
        Ok(())
    } else {
        Err(format!("{program} exited with {status}"))
    }
}

pub struct RealSystemCommandExecutor {
    editor: String,
    image_viewer: Option<String>,
}

impl RealSystemCommandExecutor {
    pub fn new(editor: String, image_viewer: Option<String>) -> Self {
        Self {
            editor,
            image_viewer,
        }
    }
}

impl SystemCommandExecutor for RealSystemCommandExecutor {
    fn edit_file(&self, path: &Path) -> Result<(), String> {
        run_blocking(&self.editor, path).inspect_err(|e| error!("Editor failed: {e}"))
    }

    fn view_image(&self, path: &Path) -> Result<(), String> {
        let result = match &self.image_viewer {
            Some(viewer) => run_blocking(viewer, path),
            None => open::that(path).map_err(|e| e.to_string()),
        };
        result.inspect_err(|e| error!("Image viewer failed: {e}"))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutedCommand {
    Edit(PathBuf),
    View(PathBuf),
}

/// Records invocations instead of running anything. When `fail` is set every
/// call reports an error.
#[derive(Default)]
pub struct MockSystemCommandExecutor {
    executed: Mutex<Vec<ExecutedCommand>>,
    edited_contents: Mutex<Vec<String>>,
    fail: bool,
}

impl MockSystemCommandExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn get_executed_commands(&self) -> Vec<ExecutedCommand> {
        self.executed.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// File contents seen by each edit call, read while the file existed.
    pub fn get_edited_contents(&self) -> Vec<String> {
        self.edited_contents
            .lock()
            .map(|c| c.clone())
            .unwrap_or_default()
    }

    fn record(&self, command: ExecutedCommand) -> Result<(), String> {
        if let Ok(mut executed) = self.executed.lock() {
            executed.push(command);
        }
        if self.fail {
            Err("mock failure".to_string())
        } else {
            Ok(())
        }
    }
}

impl SystemCommandExecutor for MockSystemCommandExecutor {
    fn edit_file(&self, path: &Path) -> Result<(), String> {
        if let (Ok(content), Ok(mut seen)) =
            (std::fs::read_to_string(path), self.edited_contents.lock())
        {
            seen.push(content);
        }
        self.record(ExecutedCommand::Edit(path.to_path_buf()))
    }

    fn view_image(&self, path: &Path) -> Result<(), String> {
        self.record(ExecutedCommand::View(path.to_path_buf()))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
