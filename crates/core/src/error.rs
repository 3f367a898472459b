use thiserror::Error;

/// Failures surfaced by the outline pipeline.
///
/// Empty documents, documents without heading candidates and form documents
/// are not errors; they produce ordinary (possibly empty) results.
#[derive(Debug, Error)]
pub enum OutlineError {
    #[error("Text extraction failed: {0}")]
    Extraction(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("Invalid layout configuration: {0}")]
    Config(String),
}

impl From<toml::de::Error> for OutlineError {
    fn from(e: toml::de::Error) -> Self {
        OutlineError::Config(e.to_string())
    }
}
