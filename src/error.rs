use std::io;

/// Failures surfaced while opening or reading a book package.
#[derive(Debug, thiserror::Error)]
pub enum BookError {
    /// The package cannot produce a table of contents: the container, the
    /// package document or one of its required sections is missing.
    #[error("invalid package: {0}")]
    PackageInvalid(String),

    /// An archive entry referenced by the package is absent.
    #[error("missing archive entry: {0}")]
    ContentMissing(String),

    #[error("I/O: {0}")]
    Io(#[from] io::Error),

    #[error("zip: {0}")]
    Zip(#[from] zip::result::ZipError),
}

impl BookError {
    pub fn invalid(detail: impl Into<String>) -> Self {
        Self::PackageInvalid(detail.into())
    }
}

pub type BookResult<T> = Result<T, BookError>;
