//! PDF front end for the outliner pipeline.
//!
//! Loads a document with `lopdf`, walks every page's content stream and
//! returns positioned word tokens ready for [`outliner_core`].

use std::path::Path;

use thiserror::Error;

use outliner_core::{
    process_document, DocumentOutline, LayoutConfig, OutlineError, PositionedToken, TokenSource,
};
use parser::backend::LopdfBackend;

pub mod parser;
pub mod text;

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("PDF parsing error: {0}")]
    Parse(String),
    #[error("Document is encrypted")]
    Encrypted,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// A loaded PDF, ready for token extraction.
///
/// Constructed via [`PdfDocument::from_bytes`] or [`PdfDocument::open`].
/// Parsing happens once; each call to [`TokenSource::tokens`] re-walks the
/// content streams.
pub struct PdfDocument {
    backend: LopdfBackend,
}

impl PdfDocument {
    /// Parse PDF bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PdfError> {
        Ok(PdfDocument {
            backend: LopdfBackend::load_bytes(bytes)?,
        })
    }

    /// Read and parse the PDF at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PdfError> {
        let bytes = std::fs::read(path.as_ref())?;
        Self::from_bytes(&bytes)
    }

    pub fn page_count(&self) -> usize {
        self.backend.page_count()
    }
}

impl TokenSource for PdfDocument {
    type Error = PdfError;

    fn tokens(&self) -> Result<Vec<PositionedToken>, PdfError> {
        parser::words::extract_document_tokens(&self.backend)
    }
}

// ---------------------------------------------------------------------------
// Convenience free functions (stateless, re-parse each call)
// ---------------------------------------------------------------------------

/// Extract every word token from PDF bytes.
pub fn extract_tokens(bytes: &[u8]) -> Result<Vec<PositionedToken>, PdfError> {
    PdfDocument::from_bytes(bytes)?.tokens()
}

/// Infer `{title, outline}` for PDF bytes.
///
/// Load and extraction failures both surface as
/// [`OutlineError::Extraction`].
pub fn outline(bytes: &[u8], config: &LayoutConfig) -> Result<DocumentOutline, OutlineError> {
    let document =
        PdfDocument::from_bytes(bytes).map_err(|e| OutlineError::Extraction(Box::new(e)))?;
    process_document(&document, config)
}
