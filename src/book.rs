use std::io::{self, Write};
use std::path::Path;

use log::{info, warn};

use crate::archive::{Archive, ZipBookArchive};
use crate::error::{BookError, BookResult};
use crate::structure::{self, ChapterEntry};
use crate::text_renderer::{self, RenderedChapter};

/// An opened package: its entries and the resolved table of contents.
pub struct Book {
    archive: Box<dyn Archive>,
    toc: Vec<ChapterEntry>,
}

impl Book {
    pub fn open(path: &Path) -> BookResult<Self> {
        if !path.is_file() {
            return Err(BookError::invalid(format!("{} is not a file", path.display())));
        }
        let is_epub = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("epub"));
        if !is_epub {
            warn!("{} does not have an .epub extension", path.display());
        }

        info!("Loading {}", path.display());
        Self::from_archive(ZipBookArchive::open(path)?)
    }

    pub fn from_archive(archive: impl Archive + 'static) -> BookResult<Self> {
        let toc = structure::resolve_toc(&archive)?;
        info!("Table of contents has {} chapters", toc.len().saturating_sub(1));
        Ok(Self {
            archive: Box::new(archive),
            toc,
        })
    }

    pub fn title(&self) -> &str {
        self.toc.first().map(|e| e.title.as_str()).unwrap_or_default()
    }

    /// Entry 0 is the book title, entries `1..` are the chapters.
    pub fn toc(&self) -> &[ChapterEntry] {
        &self.toc
    }

    pub fn entry(&self, index: usize) -> Option<&ChapterEntry> {
        self.toc.get(index)
    }

    /// Highest valid table-of-contents index.
    pub fn last_index(&self) -> usize {
        self.toc.len().saturating_sub(1)
    }

    /// Raw markup of the chapter at `index`; `None` for entries without
    /// content.
    pub fn chapter_markup(&self, index: usize) -> BookResult<Option<String>> {
        match self.entry(index).and_then(|e| e.content_path.as_deref()) {
            Some(path) => self.archive.read_string(path).map(Some),
            None => Ok(None),
        }
    }

    pub fn read_resource(&self, path: &str) -> BookResult<Vec<u8>> {
        self.archive.read(path)
    }

    /// Render the chapter at `index`. A chapter whose document is missing from
    /// the archive renders as empty text.
    pub fn render_chapter(&self, index: usize, columns: Option<usize>) -> RenderedChapter {
        let Some(path) = self.entry(index).and_then(|e| e.content_path.as_deref()) else {
            return RenderedChapter::default();
        };
        match self.archive.read_string(path) {
            Ok(markup) => text_renderer::render_chapter(&markup, path, columns),
            Err(e) => {
                warn!("Chapter {index} unavailable: {e}");
                RenderedChapter::default()
            }
        }
    }

    /// Write every entry as plain text: its title, the wrapped chapter text
    /// and a blank line.
    pub fn dump(&self, out: &mut dyn Write, columns: Option<usize>) -> io::Result<()> {
        for (index, entry) in self.toc.iter().enumerate() {
            writeln!(out, "{}", entry.title)?;
            if entry.content_path.is_some() {
                for line in self.render_chapter(index, columns).lines {
                    writeln!(out, "{line}")?;
                }
                writeln!(out)?;
            }
        }
        out.flush()
    }
}
