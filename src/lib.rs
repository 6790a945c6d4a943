// Export modules for use in tests
pub mod app;
pub mod archive;
pub mod book;
pub mod display;
pub mod error;
pub mod event_source;
pub mod inputs;
pub mod navigation;
pub mod panic_handler;
pub mod paths;
pub mod settings;
pub mod structure;
pub mod system_command;
pub mod tag_tree;
pub mod terminal_guard;
pub mod text_renderer;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use app::{run_app_with_event_source, App};
pub use book::Book;
pub use error::{BookError, BookResult};
pub use navigation::{Mode, Navigator, Viewport};
pub use structure::{resolve_toc, ChapterEntry};
