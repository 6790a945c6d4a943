//! Resolves a package's container, package document and navigation document
//! into the ordered chapter list shown in the table of contents.

use std::collections::HashMap;

use log::{debug, info, warn};

use crate::archive::Archive;
use crate::error::{BookError, BookResult};
use crate::paths;
use crate::tag_tree::{self, TagNode};

pub const CONTAINER_PATH: &str = "META-INF/container.xml";
const NCX_MEDIA_TYPE: &str = "application/x-dtbncx+xml";
const NAV_PROPERTY: &str = "nav";

/// One row of the table of contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterEntry {
    pub title: String,
    /// Archive path of the chapter document. `None` only for the leading
    /// book-title entry.
    pub content_path: Option<String>,
}

impl ChapterEntry {
    pub fn new(title: impl Into<String>, content_path: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content_path: Some(content_path.into()),
        }
    }

    pub fn book_title(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content_path: None,
        }
    }
}

/// Which table-of-contents encoding the package uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TocSource {
    /// NCX document at the given archive path.
    Legacy(String),
    /// XHTML navigation document at the given archive path.
    Modern(String),
}

#[derive(Debug, Clone)]
struct ManifestItem {
    id: String,
    href: String,
    media_type: String,
    properties: Option<String>,
}

impl ManifestItem {
    fn from_node(node: &TagNode) -> Option<Self> {
        Some(Self {
            id: node.attr("id")?.to_string(),
            href: node.attr("href")?.to_string(),
            media_type: node.attr("media-type").unwrap_or_default().to_string(),
            properties: node.attr("properties").map(str::to_string),
        })
    }

    fn is_nav(&self) -> bool {
        self.properties
            .as_deref()
            .is_some_and(|props| props.split_ascii_whitespace().any(|p| p == NAV_PROPERTY))
    }

    fn is_ncx(&self) -> bool {
        self.media_type == NCX_MEDIA_TYPE
    }
}

/// Manifest ids mapped to resolved archive paths, plus the detected TOC
/// encoding and the base directory navigation links resolve against.
struct ManifestWalk {
    paths: HashMap<String, String>,
    toc_source: Option<TocSource>,
    base_dir: String,
}

/// Build the full table of contents: the book title entry followed by one
/// entry per reading-order document.
pub fn resolve_toc(archive: &dyn Archive) -> BookResult<Vec<ChapterEntry>> {
    let container = tag_tree::parse(&read_structure_file(archive, CONTAINER_PATH)?);
    let opf_path = container
        .find("rootfile")
        .and_then(|rootfile| rootfile.attr("full-path"))
        .filter(|path| !path.is_empty())
        .ok_or_else(|| BookError::invalid("container.xml has no rootfile"))?
        .to_string();
    let base_dir = paths::parent_dir(&opf_path);
    debug!("Package document at {opf_path}, base directory '{base_dir}'");

    let package = tag_tree::parse(&read_structure_file(archive, &opf_path)?);
    let manifest = package
        .find("manifest")
        .ok_or_else(|| BookError::invalid(format!("{opf_path} has no manifest")))?;
    let spine = package
        .find("spine")
        .ok_or_else(|| BookError::invalid(format!("{opf_path} has no spine")))?;

    let mut entries = vec![ChapterEntry::book_title(book_title(&package))];

    let walk = walk_manifest(manifest, base_dir);
    let chapters = match &walk.toc_source {
        Some(TocSource::Legacy(ncx_path)) => {
            info!("Using NCX table of contents {ncx_path}");
            let labels = match archive.read_string(ncx_path) {
                Ok(ncx) => ncx_labels(&tag_tree::parse(&ncx), &paths::parent_dir(ncx_path)),
                Err(e) => {
                    warn!("Cannot read NCX {ncx_path}: {e}");
                    HashMap::new()
                }
            };
            spine_entries(spine, &walk.paths, &labels)
        }
        Some(TocSource::Modern(nav_path)) => {
            info!("Using navigation document {nav_path}");
            match archive.read_string(nav_path) {
                Ok(nav) => nav_entries(&tag_tree::parse(&nav), &walk.base_dir),
                Err(e) => {
                    warn!("Cannot read navigation document {nav_path}: {e}; falling back to spine");
                    spine_entries(spine, &walk.paths, &HashMap::new())
                }
            }
        }
        None => {
            warn!("{opf_path} declares no table of contents");
            Vec::new()
        }
    };
    debug!("Resolved {} chapters", chapters.len());

    entries.extend(chapters);
    Ok(entries)
}

fn read_structure_file(archive: &dyn Archive, path: &str) -> BookResult<String> {
    archive.read_string(path).map_err(|e| match e {
        BookError::ContentMissing(path) => BookError::invalid(format!("{path} not found")),
        other => other,
    })
}

/// First Dublin Core title; a bare `title` inside the metadata block is
/// accepted when the package binds Dublin Core as the default namespace.
fn book_title(package: &TagNode) -> String {
    let title = package.find("dc:title").or_else(|| {
        package
            .find("metadata")
            .and_then(|metadata| metadata.find("title"))
    });
    title
        .map(|node| node.text_content().trim().to_string())
        .unwrap_or_default()
}

fn walk_manifest(manifest: &TagNode, opf_dir: String) -> ManifestWalk {
    let mut walk = ManifestWalk {
        paths: HashMap::new(),
        toc_source: None,
        base_dir: opf_dir.clone(),
    };
    let mut ncx: Option<String> = None;
    let mut nav: Option<String> = None;

    for item in manifest
        .find_all("item")
        .into_iter()
        .filter_map(ManifestItem::from_node)
    {
        let path = paths::resolve(&opf_dir, &item.href);
        if item.is_nav() {
            nav = Some(path.clone());
        } else if item.is_ncx() {
            ncx = Some(path.clone());
        }
        walk.paths.insert(item.id, path);
    }

    walk.toc_source = match (ncx, nav) {
        (Some(ncx), _) => Some(TocSource::Legacy(ncx)),
        (None, Some(nav)) => {
            walk.base_dir = paths::parent_dir(&nav);
            Some(TocSource::Modern(nav))
        }
        (None, None) => None,
    };
    walk
}

/// NCX navigation point targets (fragment stripped) mapped to their labels.
/// When several points target the same document, the first one wins.
fn ncx_labels(ncx: &TagNode, ncx_dir: &str) -> HashMap<String, String> {
    let mut labels = HashMap::new();
    for nav_point in ncx.find_all("navpoint") {
        let Some(src) = nav_point.find("content").and_then(|c| c.attr("src")) else {
            continue;
        };
        if src.is_empty() {
            continue;
        }
        let target = paths::resolve(ncx_dir, paths::strip_fragment(src));
        let label = nav_point
            .find("navlabel")
            .map(|l| l.text_content().trim().to_string())
            .unwrap_or_default();
        labels.entry(target).or_insert(label);
    }
    labels
}

fn spine_entries(
    spine: &TagNode,
    manifest: &HashMap<String, String>,
    labels: &HashMap<String, String>,
) -> Vec<ChapterEntry> {
    spine
        .find_all("itemref")
        .into_iter()
        .filter_map(|itemref| {
            let idref = itemref.attr("idref")?;
            let Some(path) = manifest.get(idref) else {
                warn!("Spine references unknown manifest id '{idref}'");
                return None;
            };
            let path = paths::strip_fragment(path).to_string();
            let title = labels.get(&path).cloned().unwrap_or_default();
            Some(ChapterEntry::new(title, path))
        })
        .collect()
}

/// Chapters from the navigation document's link list, in document order.
fn nav_entries(nav_doc: &TagNode, base_dir: &str) -> Vec<ChapterEntry> {
    let nav = nav_doc
        .find_by(&|node: &TagNode| node.name == "nav" && node.attr("epub:type") == Some("toc"))
        .or_else(|| nav_doc.find("nav"));
    let Some(nav) = nav else {
        warn!("Navigation document has no <nav> element");
        return Vec::new();
    };

    nav.find_all("a")
        .into_iter()
        .filter_map(|link| {
            let href = link.attr("href")?;
            let path = paths::resolve(base_dir, paths::strip_fragment(href));
            Some(ChapterEntry::new(link.text_content().trim(), path))
        })
        .collect()
}
