//! Turns chapter markup into wrapped display lines.
//!
//! Images are not drawn inline. Each one becomes a marker line
//! (`[img: OEBPS/images/fig.png | alt text]`) at the point where it occurs,
//! so the lines on screen can later be scanned for the images they show.

use std::sync::LazyLock;

use regex::Regex;

use crate::paths;
use crate::tag_tree::{self, TagNode};

const MARKER_PREFIX: &str = "[img: ";
const MARKER_ALT_SEPARATOR: &str = " | ";

static MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[img: (?P<path>[^|\]]+?)(?: \| (?P<alt>[^\]]*))?\]$")
        .expect("image marker pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    /// Archive path of the image.
    pub path: String,
    pub alt: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedChapter {
    pub lines: Vec<String>,
    pub images: Vec<ImageRef>,
}

impl RenderedChapter {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Render the markup of the chapter stored at `chapter_path`.
///
/// `columns` is the wrap width; `None` leaves every paragraph on one line.
pub fn render_chapter(markup: &str, chapter_path: &str, columns: Option<usize>) -> RenderedChapter {
    let root = tag_tree::parse(markup);
    let body = root.find("body").unwrap_or(&root);
    let chapter_dir = paths::parent_dir(chapter_path);

    let mut images = Vec::new();
    let mut text = String::new();
    body.accumulate_text(&mut text, &mut |node: &TagNode| {
        let image = image_ref(node, &chapter_dir)?;
        let marker = image_marker(&image);
        images.push(image);
        Some(format!("\n{marker}\n"))
    });

    RenderedChapter {
        lines: wrap_text(&text, columns),
        images,
    }
}

fn image_ref(node: &TagNode, chapter_dir: &str) -> Option<ImageRef> {
    let src = match node.local_name() {
        "img" => node.attr("src"),
        "image" => node.attr("xlink:href").or_else(|| node.attr("href")),
        _ => None,
    }?;
    if src.is_empty() || src.starts_with("data:") || src.contains("://") {
        return None;
    }
    Some(ImageRef {
        path: paths::resolve(chapter_dir, src),
        alt: node.attr("alt").unwrap_or_default().trim().to_string(),
    })
}

pub fn image_marker(image: &ImageRef) -> String {
    let path = sanitize_marker_field(&image.path, &['|', ']']);
    if image.alt.is_empty() {
        format!("{MARKER_PREFIX}{path}]")
    } else {
        let alt = sanitize_marker_field(&image.alt, &[']', '\n']);
        format!("{MARKER_PREFIX}{path}{MARKER_ALT_SEPARATOR}{alt}]")
    }
}

fn sanitize_marker_field(field: &str, forbidden: &[char]) -> String {
    field
        .chars()
        .map(|c| if forbidden.contains(&c) { ' ' } else { c })
        .collect::<String>()
        .trim()
        .to_string()
}

pub fn parse_image_marker(line: &str) -> Option<ImageRef> {
    let captures = MARKER_RE.captures(line.trim())?;
    Some(ImageRef {
        path: captures["path"].to_string(),
        alt: captures
            .name("alt")
            .map(|m| m.as_str().to_string())
            .unwrap_or_default(),
    })
}

/// Images whose markers appear in `lines`, in order.
pub fn images_in<S: AsRef<str>>(lines: &[S]) -> Vec<ImageRef> {
    lines
        .iter()
        .filter_map(|line| parse_image_marker(line.as_ref()))
        .collect()
}

/// Wrap every newline-delimited segment of `text` on its own and join the
/// wrapped segments with a blank line.
pub fn wrap_text(text: &str, columns: Option<usize>) -> Vec<String> {
    let segments: Vec<String> = text
        .lines()
        .map(|segment| wrap_line(segment, columns).join("\n"))
        .collect();
    if segments.is_empty() {
        return Vec::new();
    }
    segments
        .join("\n\n")
        .split('\n')
        .map(str::to_string)
        .collect()
}

/// Wrap a single segment. Image markers are never split.
pub fn wrap_line(segment: &str, columns: Option<usize>) -> Vec<String> {
    let segment = segment.trim();
    if segment.is_empty() {
        return Vec::new();
    }
    match columns {
        Some(width) if !MARKER_RE.is_match(segment) => textwrap::wrap(segment, width.max(1))
            .into_iter()
            .map(|line| line.into_owned())
            .collect(),
        _ => vec![segment.to_string()],
    }
}
