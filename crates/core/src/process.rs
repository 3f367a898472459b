use crate::config::LayoutConfig;
use crate::form::is_form;
use crate::headings::classify_headings;
use crate::lines::group_tokens_into_lines;
use crate::title::assemble_title;
use crate::types::{DocumentOutline, PositionedToken};
use crate::OutlineError;

/// Anything that can produce the positioned word tokens of one document.
///
/// Implementations own whatever resources they need to read the document;
/// the pipeline only asks for the complete token list once.
pub trait TokenSource {
    type Error: std::error::Error + Send + Sync + 'static;

    /// All tokens of the document, pages numbered from 1.
    fn tokens(&self) -> Result<Vec<PositionedToken>, Self::Error>;
}

impl TokenSource for Vec<PositionedToken> {
    type Error = std::convert::Infallible;

    fn tokens(&self) -> Result<Vec<PositionedToken>, Self::Error> {
        Ok(self.clone())
    }
}

/// Pull tokens from `source` and run the full pipeline.
///
/// An extraction failure is returned as [`OutlineError::Extraction`]; no
/// partial result is produced in that case.
pub fn process_document<S: TokenSource>(
    source: &S,
    config: &LayoutConfig,
) -> Result<DocumentOutline, OutlineError> {
    let tokens = source
        .tokens()
        .map_err(|e| OutlineError::Extraction(Box::new(e)))?;
    Ok(build_outline(&tokens, config))
}

/// Pure pipeline: tokens -> lines -> `{title, outline}`.
pub fn build_outline(tokens: &[PositionedToken], config: &LayoutConfig) -> DocumentOutline {
    if tokens.is_empty() {
        log::debug!("document has no tokens; returning empty outline");
        return DocumentOutline::default();
    }

    let lines = group_tokens_into_lines(tokens, &config.grouping);
    let title = assemble_title(&lines, &config.title);

    let outline = if is_form(&lines, &config.form) {
        log::debug!("first page looks like a form; suppressing outline");
        Vec::new()
    } else {
        classify_headings(&lines, &config.headings)
    };

    DocumentOutline { title, outline }
}
