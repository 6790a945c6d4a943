use std::io::Write;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{Event, KeyEvent, KeyEventKind};
use log::{debug, info, warn};
use ratatui::{backend::Backend, Terminal};
use tempfile::TempDir;

use crate::display;
use crate::event_source::EventSource;
use crate::inputs::{action_for, Action};
use crate::navigation::{Effect, Navigator};
use crate::paths;
use crate::system_command::SystemCommandExecutor;
use crate::text_renderer::ImageRef;

/// How long to block for input when no chapter number is being typed.
const IDLE_POLL: Duration = Duration::from_millis(500);

pub struct App {
    pub navigator: Navigator,
    pub system_command_executor: Box<dyn SystemCommandExecutor>,
    pub show_help: bool,
    /// Session-lifetime directory for images handed to the viewer.
    scratch: Option<TempDir>,
}

impl App {
    pub fn new(navigator: Navigator, executor: Box<dyn SystemCommandExecutor>) -> Self {
        Self {
            navigator,
            system_command_executor: executor,
            show_help: false,
            scratch: None,
        }
    }

    /// Returns `true` when the session should end.
    pub fn handle_key_event(&mut self, key: KeyEvent, now: Instant) -> bool {
        if self.show_help {
            self.show_help = false;
            return false;
        }
        let Some(action) = action_for(&key) else {
            return false;
        };

        match self.navigator.handle(action, now) {
            Effect::None => {}
            Effect::Quit => return true,
            Effect::ShowHelp => self.show_help = true,
            Effect::EditChapter { index } => self.edit_chapter(index),
            Effect::ViewImages(images) => self.view_images(&images),
        }
        false
    }

    /// Write the chapter's markup to a scratch file and open it in the
    /// editor. The package is read-only, so the edited file is discarded.
    fn edit_chapter(&mut self, index: usize) {
        let markup = match self.navigator.book().chapter_markup(index) {
            Ok(Some(markup)) => markup,
            Ok(None) => return,
            Err(e) => {
                self.navigator.set_notice(format!("Cannot read chapter: {e}"));
                return;
            }
        };

        let result = tempfile::Builder::new()
            .prefix("pagerat-")
            .suffix(".xhtml")
            .tempfile()
            .and_then(|mut file| {
                file.write_all(markup.as_bytes())?;
                file.flush()?;
                Ok(file)
            });
        let file = match result {
            Ok(file) => file,
            Err(e) => {
                self.navigator.set_notice(format!("Cannot create scratch file: {e}"));
                return;
            }
        };

        if let Err(e) = self.system_command_executor.edit_file(file.path()) {
            self.navigator.set_notice(format!("Editor failed: {e}"));
            return;
        }
        match std::fs::read_to_string(file.path()) {
            Ok(edited) if edited != markup => {
                info!("Chapter {index} was edited; changes are not written back");
                self.navigator
                    .set_notice("Edits discarded: the book is opened read-only");
            }
            Ok(_) => {}
            Err(e) => warn!("Cannot re-read edited chapter: {e}"),
        }
    }

    fn scratch_dir(&mut self) -> std::io::Result<PathBuf> {
        let dir = match self.scratch.take() {
            Some(dir) => dir,
            None => tempfile::Builder::new().prefix("pagerat-").tempdir()?,
        };
        let path = dir.path().to_path_buf();
        self.scratch = Some(dir);
        Ok(path)
    }

    fn view_images(&mut self, images: &[ImageRef]) {
        let mut unshown = Vec::new();
        for image in images {
            if let Err(e) = self.view_image(image) {
                warn!("Cannot show {}: {e}", image.path);
                unshown.push(image.path.clone());
            }
        }
        if !unshown.is_empty() {
            self.navigator
                .set_notice(format!("Image: {}", unshown.join(", ")));
        }
    }

    fn view_image(&mut self, image: &ImageRef) -> std::result::Result<(), String> {
        let data = self
            .navigator
            .book()
            .read_resource(&image.path)
            .map_err(|e| e.to_string())?;
        let dir = self.scratch_dir().map_err(|e| e.to_string())?;
        let name = paths::strip_fragment(&image.path).replace('/', "_");
        let target = dir.join(name);
        std::fs::write(&target, data).map_err(|e| e.to_string())?;
        self.system_command_executor.view_image(&target)
    }
}

pub fn run_app_with_event_source<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    event_source: &mut dyn EventSource,
) -> Result<()>
where
    B::Error: Send + Sync + 'static,
{
    let size = terminal.size()?;
    app.navigator.resize(size.width, size.height);

    loop {
        let snapshot = app.navigator.snapshot();
        let show_help = app.show_help;
        terminal.draw(|frame| display::draw(frame, &snapshot, show_help))?;

        let timeout = match app.navigator.jump_deadline() {
            Some(deadline) => deadline.saturating_duration_since(Instant::now()),
            None => IDLE_POLL,
        };
        if !event_source.poll(timeout)? {
            app.navigator.tick(Instant::now());
            continue;
        }

        match event_source.read()? {
            Event::Key(key) if key.kind != KeyEventKind::Release => {
                let had_external = matches!(
                    action_for(&key),
                    Some(Action::Edit | Action::Images)
                );
                if app.handle_key_event(key, Instant::now()) {
                    info!("Quit requested");
                    return Ok(());
                }
                if had_external {
                    terminal.clear()?;
                }
            }
            Event::Resize(width, height) => {
                debug!("Resized to {width}x{height}");
                app.navigator.resize(width, height);
            }
            _ => {}
        }
    }
}
