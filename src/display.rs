//! Paints a [`Snapshot`] with ratatui. Every painted string is cut to the
//! terminal width first, so an overlong title or line only loses its tail.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Clear, Paragraph},
    Frame,
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::inputs::HELP_TEXT;
use crate::navigation::{Snapshot, StatusLine, TocRow, View};

const ELLIPSIS: char = '\u{2026}';

/// Longest prefix of `text` that fits in `width` terminal cells.
pub fn truncate_to_width(text: &str, width: usize) -> String {
    let mut used = 0;
    let mut out = String::new();
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > width {
            break;
        }
        used += w;
        out.push(c);
    }
    out
}

fn truncate_with_ellipsis(text: &str, width: usize) -> String {
    if text.width() <= width {
        return text.to_string();
    }
    if width == 0 {
        return String::new();
    }
    let mut out = truncate_to_width(text, width - 1);
    out.push(ELLIPSIS);
    out
}

pub fn format_toc_row(row: &TocRow) -> String {
    if row.is_book_title() {
        format!("      {}", row.title)
    } else {
        format!("{:5} {}", row.index, row.title)
    }
}

/// `<title> (cur/total)` on the left and `Page p/n (pct%)` on the right,
/// padded or truncated to exactly `width` cells where possible.
pub fn format_status(status: &StatusLine, width: usize) -> String {
    let counter = format!("({:3}/{:3})", status.chapter, status.total_chapters);
    let position = format!(
        "Page {:3}/{:3} ({:5.1}%)",
        status.page, status.total_pages, status.percent
    );
    let fixed = counter.width() + position.width() + 2;
    let title = truncate_with_ellipsis(&status.title, width.saturating_sub(fixed));
    let left = format!("{title} {counter}");
    let padding = width.saturating_sub(left.width() + position.width()).max(1);
    let line = format!("{left}{}{position}", " ".repeat(padding));
    truncate_to_width(&line, width)
}

pub fn draw(frame: &mut Frame, snapshot: &Snapshot, show_help: bool) {
    let area = frame.area();
    let width = usize::from(area.width);

    if show_help {
        frame.render_widget(Clear, area);
        let lines: Vec<Line> = HELP_TEXT
            .lines()
            .map(|l| Line::from(truncate_to_width(l, width)))
            .collect();
        frame.render_widget(Paragraph::new(lines), area);
        return;
    }

    let mut lines: Vec<Line> = match &snapshot.view {
        View::TableOfContents {
            rows,
            highlighted_row,
        } => rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let mut style = Style::default();
                if row.is_book_title() {
                    style = style.add_modifier(Modifier::BOLD);
                }
                if i == *highlighted_row {
                    style = style.add_modifier(Modifier::REVERSED);
                }
                Line::from(Span::styled(
                    truncate_to_width(&format_toc_row(row), width),
                    style,
                ))
            })
            .collect(),
        View::Chapter { lines, .. } => lines
            .iter()
            .map(|l| Line::from(truncate_to_width(l, width)))
            .collect(),
    };
    lines.truncate(usize::from(area.height));
    frame.render_widget(Paragraph::new(lines), area);

    let bottom_text = if let Some(notice) = &snapshot.notice {
        Some((notice.clone(), Style::default().add_modifier(Modifier::BOLD)))
    } else if let Some(value) = snapshot.pending_jump {
        Some((
            format!("Go to chapter: {value}"),
            Style::default().add_modifier(Modifier::BOLD),
        ))
    } else if let View::Chapter {
        status: Some(status),
        ..
    } = &snapshot.view
    {
        Some((format_status(status, width), Style::default()))
    } else {
        None
    };

    if let Some((text, style)) = bottom_text {
        if area.height == 0 {
            return;
        }
        let row = Rect::new(area.x, area.y + area.height - 1, area.width, 1);
        frame.render_widget(Clear, row);
        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(truncate_to_width(&text, width), style))),
            row,
        );
    }
}
