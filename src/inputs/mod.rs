pub mod chapter_jump;
pub mod keymap;

pub use chapter_jump::{ChapterJump, JumpOutcome, JUMP_IDLE_TIMEOUT};
pub use keymap::{action_for, Action, HELP_TEXT};
