//! Tolerant markup tree builder shared by the package structure files and the
//! chapter bodies.
//!
//! The tree is built from the `quick-xml` event stream with an explicit stack:
//! start tags attach a new node under the top of the stack (or the root),
//! end tags pop, and text is attached to the top of the stack. End tags never
//! have to match their start tags, so unbalanced HTML degrades to a slightly
//! different tree instead of an error.

use std::collections::BTreeMap;

use log::debug;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// Name carried by the synthetic root node returned from [`parse`].
pub const ROOT_NAME: &str = "#root";

/// Elements after which accumulated text gets a paragraph break.
const BLOCK_ELEMENTS: &[&str] = &["p", "h1", "h2", "h3", "h4", "h5", "h6"];

/// Elements that never hold content. HTML-style documents write them without
/// a closing slash (`<img src=x>`), so a start tag must not open them.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "image", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagNode {
    /// Lower-cased element name including any namespace prefix
    /// (`dc:title`). Empty for text nodes.
    pub name: String,
    pub attributes: BTreeMap<String, String>,
    /// Literal text, only set on text nodes.
    pub text: String,
    pub children: Vec<TagNode>,
}

impl TagNode {
    pub fn element(name: impl Into<String>, attributes: BTreeMap<String, String>) -> Self {
        Self {
            name: name.into(),
            attributes,
            ..Self::default()
        }
    }

    pub fn text_node(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn is_text(&self) -> bool {
        self.name.is_empty()
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Element name without its namespace prefix.
    pub fn local_name(&self) -> &str {
        match self.name.rsplit_once(':') {
            Some((_, local)) => local,
            None => &self.name,
        }
    }

    /// First node named `name` in pre-order, starting with `self`.
    pub fn find(&self, name: &str) -> Option<&TagNode> {
        self.find_by(&|node: &TagNode| node.name == name)
    }

    pub fn find_by(&self, pred: &dyn Fn(&TagNode) -> bool) -> Option<&TagNode> {
        if pred(self) {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find_by(pred))
    }

    /// Every node named `name` in pre-order, left to right.
    pub fn find_all(&self, name: &str) -> Vec<&TagNode> {
        let mut found = Vec::new();
        self.collect_named(name, &mut found);
        found
    }

    fn collect_named<'a>(&'a self, name: &str, found: &mut Vec<&'a TagNode>) {
        if self.name == name {
            found.push(self);
        }
        for child in &self.children {
            child.collect_named(name, found);
        }
    }

    /// Accumulated text of this subtree: own text, then each child's text in
    /// document order, with a newline after block elements.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.accumulate_text(&mut out, &mut |_: &TagNode| None);
        out
    }

    /// Same as [`TagNode::text_content`], but `inline` may substitute the
    /// whole contribution of an element node (its subtree is then skipped).
    pub fn accumulate_text(
        &self,
        out: &mut String,
        inline: &mut dyn FnMut(&TagNode) -> Option<String>,
    ) {
        if !self.is_text() {
            if let Some(replacement) = inline(self) {
                out.push_str(&replacement);
                return;
            }
        }

        out.push_str(&self.text);
        for child in &self.children {
            child.accumulate_text(out, inline);
        }
        if is_block_element(&self.name) {
            out.push('\n');
        }
    }
}

pub fn is_block_element(name: &str) -> bool {
    BLOCK_ELEMENTS.contains(&name)
}

fn is_void_element(name: &str) -> bool {
    let local = name.rsplit_once(':').map_or(name, |(_, local)| local);
    VOID_ELEMENTS.contains(&local)
}

/// Parse `markup` into a tree rooted at a synthetic [`ROOT_NAME`] node.
///
/// Never fails: parsing stops at the first tokenizer error and whatever was
/// built up to that point is returned.
pub fn parse(markup: &str) -> TagNode {
    let mut reader = Reader::from_str(markup);
    let config = reader.config_mut();
    config.check_end_names = false;
    config.allow_unmatched_ends = true;
    config.allow_dangling_amp = true;

    let mut builder = TreeBuilder::new();
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                builder.flush_text();
                let node = element_from(&e);
                if is_void_element(&node.name) {
                    builder.attach(node);
                } else {
                    builder.open(node);
                }
            }
            Ok(Event::Empty(e)) => {
                builder.flush_text();
                builder.attach(element_from(&e));
            }
            Ok(Event::End(e)) => {
                builder.flush_text();
                let name = String::from_utf8_lossy(e.name().as_ref()).to_ascii_lowercase();
                // `<img ...></img>` was never opened, so its end tag closes nothing.
                if !is_void_element(&name) {
                    builder.close();
                }
            }
            Ok(Event::Text(e)) => match e.decode() {
                Ok(text) => builder.pending_text.push_str(&text),
                Err(err) => debug!("Skipping undecodable text: {err}"),
            },
            Ok(Event::CData(e)) => {
                builder
                    .pending_text
                    .push_str(&String::from_utf8_lossy(&e.into_inner()));
            }
            Ok(Event::GeneralRef(e)) => {
                if let Ok(Some(ch)) = e.resolve_char_ref() {
                    builder.pending_text.push(ch);
                } else {
                    let name = String::from_utf8_lossy(e.as_ref()).into_owned();
                    builder.pending_text.push_str(&resolve_entity(&name));
                }
            }
            Ok(Event::Eof) => break,
            Err(err) => {
                debug!(
                    "Markup error at byte {}: {err}; keeping partial tree",
                    reader.error_position()
                );
                break;
            }
            Ok(_) => {}
        }
    }
    builder.finish()
}

fn element_from(start: &BytesStart) -> TagNode {
    let name = String::from_utf8_lossy(start.name().as_ref()).to_ascii_lowercase();
    let mut attributes = BTreeMap::new();
    for attr in start.html_attributes().flatten() {
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_ascii_lowercase();
        let raw = String::from_utf8_lossy(&attr.value).into_owned();
        let value = match quick_xml::escape::unescape(&raw) {
            Ok(value) => value.into_owned(),
            Err(_) => raw,
        };
        attributes.insert(key, value);
    }
    TagNode::element(name, attributes)
}

fn resolve_entity(name: &str) -> String {
    if let Some(resolved) = quick_xml::escape::resolve_predefined_entity(name) {
        return resolved.to_string();
    }
    let resolved = match name {
        "nbsp" => "\u{a0}",
        "shy" => "\u{ad}",
        "mdash" => "\u{2014}",
        "ndash" => "\u{2013}",
        "hellip" => "\u{2026}",
        "lsquo" => "\u{2018}",
        "rsquo" => "\u{2019}",
        "ldquo" => "\u{201c}",
        "rdquo" => "\u{201d}",
        "copy" => "\u{a9}",
        _ => return format!("&{name};"),
    };
    resolved.to_string()
}

struct TreeBuilder {
    root: TagNode,
    /// Child-index path from the root to the currently open element.
    open: Vec<usize>,
    pending_text: String,
}

impl TreeBuilder {
    fn new() -> Self {
        Self {
            root: TagNode::element(ROOT_NAME, BTreeMap::new()),
            open: Vec::new(),
            pending_text: String::new(),
        }
    }

    fn current(&mut self) -> &mut TagNode {
        let mut node = &mut self.root;
        for &index in &self.open {
            node = &mut node.children[index];
        }
        node
    }

    fn attach(&mut self, node: TagNode) -> usize {
        let parent = self.current();
        parent.children.push(node);
        parent.children.len() - 1
    }

    fn open(&mut self, node: TagNode) {
        let index = self.attach(node);
        self.open.push(index);
    }

    fn close(&mut self) {
        self.open.pop();
    }

    fn flush_text(&mut self) {
        let text = std::mem::take(&mut self.pending_text);
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            self.attach(TagNode::text_node(trimmed));
        }
    }

    fn finish(mut self) -> TagNode {
        self.flush_text();
        self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_nested_tree_with_trimmed_text() {
        let root = parse("<html><body>\n  <p>  Hello  </p>\n</body></html>");
        let body = root.find("body").unwrap();
        assert_eq!(body.children.len(), 1);
        let p = &body.children[0];
        assert_eq!(p.name, "p");
        assert_eq!(p.children, vec![TagNode::text_node("Hello")]);
    }

    #[test]
    fn names_are_lower_cased_and_keep_prefix() {
        let root = parse(r#"<navMap><navPoint id="n1"/><dc:Title>T</dc:Title></navMap>"#);
        assert!(root.find("navpoint").is_some());
        let title = root.find("dc:title").unwrap();
        assert_eq!(title.local_name(), "title");
        assert_eq!(title.text_content(), "T");
    }

    #[test]
    fn self_closing_elements_keep_attributes() {
        let root = parse(r#"<body><p>a<img src="img/x.png" alt="An &amp; B"/>b</p></body>"#);
        let img = root.find("img").unwrap();
        assert!(img.children.is_empty());
        assert_eq!(img.attr("src"), Some("img/x.png"));
        assert_eq!(img.attr("alt"), Some("An & B"));
        let p = root.find("p").unwrap();
        assert_eq!(p.children.len(), 3);
    }

    #[test]
    fn void_elements_never_swallow_following_siblings() {
        let root = parse(r#"<body><p>a<br>b</p><img src="x.png"><p>c</p><img src="y.png"></img><p>d</p></body>"#);
        let body = root.find("body").unwrap();
        let names: Vec<&str> = body.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["p", "img", "p", "img", "p"]);
        assert!(body.children[1].children.is_empty());
        assert_eq!(body.text_content(), "ab\nc\nd\n");
    }

    #[test]
    fn unmatched_end_tags_are_ignored() {
        let root = parse("</div></p><p>kept</p>");
        assert_eq!(root.find("p").unwrap().text_content(), "kept\n");
    }

    #[test]
    fn unclosed_elements_still_collect_text() {
        let root = parse("<body><p>one<p>two");
        assert_eq!(root.find("body").unwrap().text_content(), "onetwo\n\n");
    }

    #[test]
    fn text_content_breaks_after_block_elements() {
        let root = parse("<body><h1>Title</h1><p>First <em>para</em></p><div>x</div></body>");
        assert_eq!(
            root.find("body").unwrap().text_content(),
            "Title\nFirstpara\nx"
        );
    }

    #[test]
    fn entities_inside_text_do_not_split_chunks() {
        let root = parse("<p>Fish &amp; chips &#8212; &nbsp;cheap</p>");
        assert_eq!(
            root.find("p").unwrap().text_content(),
            "Fish & chips \u{2014} \u{a0}cheap\n"
        );
    }

    #[test]
    fn find_all_is_pre_order() {
        let root = parse(r#"<ol><li><a href="1"/><ol><li><a href="2"/></li></ol></li><li><a href="3"/></li></ol>"#);
        let hrefs: Vec<_> = root
            .find_all("a")
            .into_iter()
            .filter_map(|a| a.attr("href"))
            .collect();
        assert_eq!(hrefs, vec!["1", "2", "3"]);
        assert_eq!(root.find("li").unwrap().find("a").unwrap().attr("href"), Some("1"));
    }

    #[test]
    fn inline_hook_replaces_subtree() {
        let root = parse(r#"<p>x<img src="a.png"/>y</p>"#);
        let mut out = String::new();
        root.accumulate_text(&mut out, &mut |node: &TagNode| {
            (node.name == "img").then(|| "[IMG]".to_string())
        });
        assert_eq!(out, "x[IMG]y\n");
    }

    #[test]
    fn truncated_markup_returns_partial_tree() {
        let root = parse("<body><p>ok</p><p attr=\"unterminated");
        assert_eq!(root.find("p").unwrap().text_content(), "ok\n");
    }
}
