use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while turning an uploaded document into plain text.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unsupported document format: {0}")]
    UnsupportedFormat(String),

    #[error("document not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read document: {0}")]
    Io(#[from] std::io::Error),

    #[error("document is not valid UTF-8: {0}")]
    InvalidEncoding(#[from] std::string::FromUtf8Error),

    #[error("PDF text extraction failed: {0}")]
    Pdf(String),

    #[error("DOCX text extraction failed: {0}")]
    Docx(String),
}

/// Errors raised by an analysis result store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("result store backend failure: {0}")]
    Backend(String),
}

pub type ExtractResult<T> = std::result::Result<T, ExtractError>;
