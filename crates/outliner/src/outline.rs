use std::path::PathBuf;

use outliner_core::{process_document, DocumentOutline};
use outliner_pdf::PdfDocument;

use crate::prelude::{println, *};

/// Options for outlining a single document
#[derive(Debug, clap::Args, Clone)]
pub struct OutlineOptions {
    /// Path to the PDF file
    pub path: PathBuf,

    /// Write the JSON here instead of printing it
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Handle the outline command
pub async fn run(options: OutlineOptions, global: crate::Global) -> Result<()> {
    let config = crate::config::load(global.config.as_deref())?;
    let path = options.path.clone();

    let outline = tokio::task::spawn_blocking(move || -> Result<DocumentOutline> {
        let document =
            PdfDocument::open(&path).wrap_err_with(|| f!("Failed to load {}", path.display()))?;
        Ok(process_document(&document, &config)?)
    })
    .await
    .map_err(|e| eyre!("Task join error: {e}"))??;

    match options.output {
        Some(out) => crate::batch::write_outline(&out, &outline)?,
        None => println!("{}", serde_json::to_string_pretty(&outline)?),
    }

    Ok(())
}
