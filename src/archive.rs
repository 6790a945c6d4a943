//! Read-only access to the named entries of a book package.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use log::debug;
use zip::result::ZipError;
use zip::ZipArchive;

use crate::error::{BookError, BookResult};

/// Upper bound on the buffer reserved up front for one entry.
const MAX_PREALLOCATION: u64 = 1 << 20;

/// An immutable store of named entries.
///
/// Paths are archive-relative, `/`-separated and case-sensitive.
pub trait Archive {
    /// Read the whole entry at `path`, failing with
    /// [`BookError::ContentMissing`] when no such entry exists.
    fn read(&self, path: &str) -> BookResult<Vec<u8>>;

    /// Read an entry and decode it as UTF-8, replacing invalid sequences.
    fn read_string(&self, path: &str) -> BookResult<String> {
        let bytes = self.read(path)?;
        let text = match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        };
        Ok(text.trim_start_matches('\u{feff}').to_string())
    }
}

/// Zip file on disk.
pub struct ZipBookArchive {
    inner: RefCell<ZipArchive<BufReader<File>>>,
}

impl ZipBookArchive {
    pub fn open(path: &Path) -> BookResult<Self> {
        let file = File::open(path)?;
        let archive = ZipArchive::new(BufReader::new(file)).map_err(|e| match e {
            ZipError::InvalidArchive(msg) | ZipError::UnsupportedArchive(msg) => {
                BookError::invalid(format!("{}: {msg}", path.display()))
            }
            other => BookError::Zip(other),
        })?;
        debug!("Opened {} with {} entries", path.display(), archive.len());
        Ok(Self {
            inner: RefCell::new(archive),
        })
    }
}

impl Archive for ZipBookArchive {
    fn read(&self, path: &str) -> BookResult<Vec<u8>> {
        let mut archive = self.inner.borrow_mut();
        let mut entry = match archive.by_name(path) {
            Ok(entry) => entry,
            Err(ZipError::FileNotFound) => return Err(BookError::ContentMissing(path.to_string())),
            Err(e) => return Err(e.into()),
        };
        // The declared size comes from the archive and is not trusted.
        let mut data = Vec::with_capacity(entry.size().min(MAX_PREALLOCATION) as usize);
        entry.read_to_end(&mut data)?;
        Ok(data)
    }
}

/// Entries held in memory, keyed by archive path.
#[derive(Debug, Default, Clone)]
pub struct MemoryArchive {
    entries: HashMap<String, Vec<u8>>,
}

impl MemoryArchive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, path: &str, data: impl Into<Vec<u8>>) -> Self {
        self.insert(path, data);
        self
    }

    pub fn insert(&mut self, path: &str, data: impl Into<Vec<u8>>) {
        self.entries.insert(path.to_string(), data.into());
    }

    pub fn remove(&mut self, path: &str) -> Option<Vec<u8>> {
        self.entries.remove(path)
    }
}

impl Archive for MemoryArchive {
    fn read(&self, path: &str) -> BookResult<Vec<u8>> {
        self.entries
            .get(path)
            .cloned()
            .ok_or_else(|| BookError::ContentMissing(path.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::FileOptions;

    #[test]
    fn memory_archive_reports_missing_entries() {
        let archive = MemoryArchive::new().with_entry("a/b.txt", "hello");
        assert_eq!(archive.read("a/b.txt").unwrap(), b"hello");
        assert!(matches!(
            archive.read("A/b.txt"),
            Err(BookError::ContentMissing(p)) if p == "A/b.txt"
        ));
    }

    #[test]
    fn read_string_strips_byte_order_mark() {
        let archive = MemoryArchive::new().with_entry("x.xml", "\u{feff}<a/>");
        assert_eq!(archive.read_string("x.xml").unwrap(), "<a/>");
    }

    #[test]
    fn zip_archive_reads_entries() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("book.epub");
        {
            let file = File::create(&path).unwrap();
            let mut zip = zip::ZipWriter::new(file);
            zip.start_file("META-INF/container.xml", FileOptions::default())
                .unwrap();
            zip.write_all(b"<container/>").unwrap();
            zip.finish().unwrap();
        }

        let archive = ZipBookArchive::open(&path).unwrap();
        assert_eq!(
            archive.read_string("META-INF/container.xml").unwrap(),
            "<container/>"
        );
        assert!(matches!(
            archive.read("missing.xhtml"),
            Err(BookError::ContentMissing(_))
        ));
    }

    #[test]
    fn entries_larger_than_the_reserved_buffer_read_whole() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("big.epub");
        let payload: Vec<u8> = (0..MAX_PREALLOCATION as usize + 4096)
            .map(|i| (i % 251) as u8)
            .collect();
        {
            let file = File::create(&path).unwrap();
            let mut zip = zip::ZipWriter::new(file);
            zip.start_file("OEBPS/images/big.png", FileOptions::default())
                .unwrap();
            zip.write_all(&payload).unwrap();
            zip.finish().unwrap();
        }

        let archive = ZipBookArchive::open(&path).unwrap();
        assert_eq!(archive.read("OEBPS/images/big.png").unwrap(), payload);
    }

    #[test]
    fn non_zip_file_is_an_invalid_package() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("not-a-book.epub");
        std::fs::write(&path, b"plain text, not a zip").unwrap();

        assert!(matches!(
            ZipBookArchive::open(&path),
            Err(BookError::PackageInvalid(_))
        ));
    }
}
