//! Reader state: which view is shown, where the cursor and scroll positions
//! are, and how actions change them.
//!
//! Nothing here touches the terminal. The event loop feeds actions in and
//! paints the [`Snapshot`] that comes out; requests that need the outside
//! world (editor, image viewer, help screen) are returned as [`Effect`]s.

use std::time::Instant;

use log::debug;

use crate::book::Book;
use crate::inputs::{Action, ChapterJump, JumpOutcome};
use crate::text_renderer::{self, ImageRef, RenderedChapter};

/// Rows kept free for the status line at the bottom of the chapter view.
pub const STATUS_ROWS: u16 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    TableOfContents,
    Chapter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u16,
    pub height: u16,
}

/// Request for the event loop to act outside the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    None,
    Quit,
    ShowHelp,
    EditChapter { index: usize },
    ViewImages(Vec<ImageRef>),
}

#[derive(Debug)]
struct CachedChapter {
    index: usize,
    rendered: RenderedChapter,
}

#[derive(Debug)]
pub struct NavigationState {
    pub mode: Mode,
    pub toc_cursor_row: usize,
    pub toc_window_start: usize,
    pub current_chapter: Option<usize>,
    /// Scroll position of every table-of-contents entry, kept for the session.
    pub chapter_offsets: Vec<usize>,
    rendered: Option<CachedChapter>,
    pub pending_jump: ChapterJump,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocRow {
    pub index: usize,
    pub title: String,
}

impl TocRow {
    pub fn is_book_title(&self) -> bool {
        self.index == 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatusLine {
    pub title: String,
    pub chapter: usize,
    pub total_chapters: usize,
    pub page: usize,
    pub total_pages: usize,
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum View {
    TableOfContents {
        rows: Vec<TocRow>,
        highlighted_row: usize,
    },
    Chapter {
        lines: Vec<String>,
        status: Option<StatusLine>,
    },
}

/// Everything the display layer needs to paint one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub mode: Mode,
    pub view: View,
    pub notice: Option<String>,
    pub pending_jump: Option<usize>,
}

pub struct Navigator {
    book: Book,
    state: NavigationState,
    viewport: Viewport,
    columns: Option<usize>,
    show_status: bool,
    notice: Option<String>,
}

impl Navigator {
    pub fn new(book: Book, viewport: Viewport, columns: Option<usize>, show_status: bool) -> Self {
        let entries = book.toc().len();
        let state = NavigationState {
            mode: Mode::TableOfContents,
            toc_cursor_row: 0,
            toc_window_start: 0,
            current_chapter: None,
            chapter_offsets: vec![0; entries],
            rendered: None,
            pending_jump: ChapterJump::new(book.last_index()),
        };
        let mut navigator = Self {
            book,
            state,
            viewport,
            columns,
            show_status,
            notice: None,
        };
        navigator.place_cursor(navigator.first_selectable());
        navigator
    }

    pub fn book(&self) -> &Book {
        &self.book
    }

    pub fn state(&self) -> &NavigationState {
        &self.state
    }

    pub fn mode(&self) -> Mode {
        self.state.mode
    }

    pub fn current_chapter(&self) -> Option<usize> {
        self.state.current_chapter
    }

    /// Table-of-contents index under the cursor.
    pub fn selected_index(&self) -> usize {
        self.state.toc_window_start + self.state.toc_cursor_row
    }

    pub fn chapter_offset(&self, index: usize) -> usize {
        self.state.chapter_offsets.get(index).copied().unwrap_or(0)
    }

    pub fn set_notice(&mut self, notice: impl Into<String>) {
        self.notice = Some(notice.into());
    }

    pub fn jump_deadline(&self) -> Option<Instant> {
        self.state.pending_jump.deadline()
    }

    /// Lines of the resident chapter render, rendering it first if needed.
    pub fn chapter_lines(&mut self) -> &[String] {
        self.ensure_rendered();
        self.state
            .rendered
            .as_ref()
            .map(|c| c.rendered.lines.as_slice())
            .unwrap_or_default()
    }

    fn toc_rows(&self) -> usize {
        usize::from(self.viewport.height.max(1))
    }

    /// Rows moved by page-scale input and lines shown in the chapter view.
    pub fn page_size(&self) -> usize {
        let reserved = if self.show_status { STATUS_ROWS } else { 0 };
        usize::from(self.viewport.height.saturating_sub(reserved).max(1))
    }

    fn wrap_columns(&self) -> usize {
        let width = usize::from(self.viewport.width.max(1));
        self.columns.map_or(width, |cols| cols.clamp(1, width))
    }

    fn last_entry(&self) -> usize {
        self.book.last_index()
    }

    /// The title entry is only selectable when the book has no chapters.
    fn first_selectable(&self) -> usize {
        self.last_entry().min(1)
    }

    fn place_cursor(&mut self, target: usize) {
        let target = target.clamp(self.first_selectable(), self.last_entry());
        let rows = self.toc_rows();
        let max_start = self.book.toc().len().saturating_sub(rows);

        let mut start = self.state.toc_window_start;
        if target < start {
            // Bring the title row back into view when reaching the top.
            start = if target == self.first_selectable() && target < rows {
                0
            } else {
                target
            };
        } else if target >= start + rows {
            start = target + 1 - rows;
        }
        start = start.min(max_start);

        self.state.toc_window_start = start;
        self.state.toc_cursor_row = target - start;
    }

    fn center_on(&mut self, target: usize) {
        let rows = self.toc_rows();
        let max_start = self.book.toc().len().saturating_sub(rows);
        self.state.toc_window_start = target.saturating_sub(rows / 2).min(max_start);
        self.place_cursor(target);
    }

    fn move_cursor(&mut self, delta: isize) {
        let target = self.selected_index().saturating_add_signed(delta);
        self.place_cursor(target);
    }

    fn ensure_rendered(&mut self) {
        let Some(index) = self.state.current_chapter else {
            return;
        };
        if self.state.rendered.as_ref().is_some_and(|c| c.index == index) {
            return;
        }

        let columns = self.wrap_columns();
        debug!("Rendering chapter {index} at {columns} columns");
        let rendered = self.book.render_chapter(index, Some(columns));
        let last_offset = rendered.lines.len().saturating_sub(1);
        if let Some(offset) = self.state.chapter_offsets.get_mut(index) {
            *offset = (*offset).min(last_offset);
        }
        self.state.rendered = Some(CachedChapter { index, rendered });
    }

    fn scroll(&mut self, delta: isize) {
        let Some(index) = self.state.current_chapter else {
            return;
        };
        let last_offset = self.chapter_lines().len().saturating_sub(1);
        if let Some(offset) = self.state.chapter_offsets.get_mut(index) {
            *offset = offset.saturating_add_signed(delta).min(last_offset);
        }
    }

    fn open_chapter(&mut self, index: usize) {
        let has_content = self
            .book
            .entry(index)
            .is_some_and(|e| e.content_path.is_some());
        if !has_content {
            return;
        }
        if self.state.rendered.as_ref().is_some_and(|c| c.index != index) {
            self.state.rendered = None;
        }
        self.state.mode = Mode::Chapter;
        self.state.current_chapter = Some(index);
    }

    fn close_chapter(&mut self) {
        self.state.mode = Mode::TableOfContents;
        self.state.current_chapter = None;
    }

    fn apply_jump(&mut self, outcome: JumpOutcome) {
        match outcome {
            JumpOutcome::Jump(index) if self.book.entry(index).is_some_and(|e| e.content_path.is_some()) => {
                debug!("Jumping to chapter {index}");
                self.center_on(index);
                self.open_chapter(index);
            }
            JumpOutcome::Jump(index) => debug!("Ignoring jump to entry {index} without content"),
            JumpOutcome::Discarded => debug!("Discarding out-of-range chapter number"),
            JumpOutcome::Pending => {}
        }
    }

    /// Complete a pending chapter number whose idle timeout has passed.
    pub fn tick(&mut self, now: Instant) {
        if let Some(outcome) = self.state.pending_jump.poll(now) {
            self.apply_jump(outcome);
        }
    }

    pub fn handle(&mut self, action: Action, now: Instant) -> Effect {
        self.notice = None;
        self.tick(now);
        if !matches!(action, Action::Digit(_)) {
            if let Some(outcome) = self.state.pending_jump.finish() {
                self.apply_jump(outcome);
            }
        }

        let page = self.page_size() as isize;
        match (self.state.mode, action) {
            (_, Action::Quit) => return Effect::Quit,
            (_, Action::Help) => return Effect::ShowHelp,

            (Mode::TableOfContents, Action::SwitchView) => self.open_chapter(self.selected_index()),
            (Mode::Chapter, Action::SwitchView) => self.close_chapter(),

            (Mode::TableOfContents, Action::LineDown) => self.move_cursor(1),
            (Mode::TableOfContents, Action::LineUp) => self.move_cursor(-1),
            (Mode::TableOfContents, Action::PageDown) => self.move_cursor(page),
            (Mode::TableOfContents, Action::PageUp) => self.move_cursor(-page),
            (Mode::TableOfContents, Action::Home) => self.place_cursor(0),
            (Mode::TableOfContents, Action::End) => self.place_cursor(self.last_entry()),
            (Mode::TableOfContents, Action::Digit(digit)) => {
                let outcome = self.state.pending_jump.push(digit, now);
                self.apply_jump(outcome);
            }

            (Mode::Chapter, Action::LineDown) => self.scroll(1),
            (Mode::Chapter, Action::LineUp) => self.scroll(-1),
            (Mode::Chapter, Action::PageDown) => self.scroll(page),
            (Mode::Chapter, Action::PageUp) => self.scroll(-page),
            (Mode::Chapter, Action::Home) => self.scroll(isize::MIN),
            (Mode::Chapter, Action::End) => self.scroll(isize::MAX),
            (Mode::Chapter, Action::Digit(_)) => {}

            (Mode::Chapter, Action::Edit) => {
                if let Some(index) = self.state.current_chapter {
                    return Effect::EditChapter { index };
                }
            }
            (Mode::Chapter, Action::Images) => {
                let images = text_renderer::images_in(&self.visible_lines());
                if images.is_empty() {
                    self.set_notice("No images on this page");
                } else {
                    return Effect::ViewImages(images);
                }
            }
            (Mode::TableOfContents, Action::Edit | Action::Images) => {
                self.set_notice("Open a chapter first");
            }
        }
        Effect::None
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        let viewport = Viewport { width, height };
        if viewport == self.viewport {
            return;
        }
        self.viewport = viewport;
        self.state.rendered = None;
        self.place_cursor(self.selected_index());
    }

    fn visible_lines(&mut self) -> Vec<String> {
        let Some(index) = self.state.current_chapter else {
            return Vec::new();
        };
        let page = self.page_size();
        let offset = self.chapter_offset(index);
        let lines = self.chapter_lines();
        let start = offset.min(lines.len());
        let end = (offset + page).min(lines.len());
        lines[start..end].to_vec()
    }

    fn status_line(&mut self, index: usize) -> StatusLine {
        let page = self.page_size();
        let offset = self.chapter_offset(index);
        let total_lines = self.chapter_lines().len();
        let percent = if total_lines == 0 {
            0.0
        } else {
            100.0 * offset as f64 / total_lines as f64
        };
        StatusLine {
            title: self
                .book
                .entry(index)
                .map(|e| e.title.clone())
                .unwrap_or_default(),
            chapter: index,
            total_chapters: self.last_entry(),
            page: offset / page + 1,
            total_pages: total_lines / page + 1,
            percent,
        }
    }

    pub fn snapshot(&mut self) -> Snapshot {
        let view = match (self.state.mode, self.state.current_chapter) {
            (Mode::Chapter, Some(index)) => View::Chapter {
                lines: self.visible_lines(),
                status: self.show_status.then(|| self.status_line(index)),
            },
            _ => {
                let start = self.state.toc_window_start;
                let rows = self
                    .book
                    .toc()
                    .iter()
                    .enumerate()
                    .skip(start)
                    .take(self.toc_rows())
                    .map(|(index, entry)| TocRow {
                        index,
                        title: entry.title.clone(),
                    })
                    .collect();
                View::TableOfContents {
                    rows,
                    highlighted_row: self.state.toc_cursor_row,
                }
            }
        };
        Snapshot {
            mode: self.state.mode,
            view,
            notice: self.notice.clone(),
            pending_jump: self.state.pending_jump.pending_value(),
        }
    }
}
