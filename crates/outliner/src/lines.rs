use std::path::PathBuf;

use colored::Colorize;
use outliner_core::lines::group_tokens_into_lines;
use outliner_core::{Line, TokenSource};
use outliner_pdf::PdfDocument;

use crate::prelude::{println, *};

/// Options for dumping grouped lines
#[derive(Debug, clap::Args, Clone)]
pub struct LinesOptions {
    /// Path to the PDF file
    pub path: PathBuf,

    /// Only show this page (0-based, as in the outline)
    #[arg(short, long)]
    pub page: Option<usize>,
}

/// Lines in reading order, optionally restricted to one page.
pub fn reading_order(mut lines: Vec<Line>, page: Option<usize>) -> Vec<Line> {
    lines.retain(|l| page.map_or(true, |p| l.page == p));
    lines.sort_by(|a, b| {
        a.page.cmp(&b.page).then(
            a.bbox
                .top
                .partial_cmp(&b.bbox.top)
                .unwrap_or(std::cmp::Ordering::Equal),
        )
    });
    lines
}

/// Handle the lines command
pub async fn run(options: LinesOptions, global: crate::Global) -> Result<()> {
    let config = crate::config::load(global.config.as_deref())?;
    let path = options.path.clone();

    let tokens = tokio::task::spawn_blocking(move || -> Result<_> {
        let document =
            PdfDocument::open(&path).wrap_err_with(|| f!("Failed to load {}", path.display()))?;
        Ok(document.tokens()?)
    })
    .await
    .map_err(|e| eyre!("Task join error: {e}"))??;

    let lines = reading_order(
        group_tokens_into_lines(&tokens, &config.grouping),
        options.page,
    );

    if lines.is_empty() {
        println!("No text lines found.");
        return Ok(());
    }

    let mut table = crate::prelude::new_table();
    table.add_row(prettytable::row![
        "Page".bold().cyan(),
        "Top".bold().cyan(),
        "X0".bold().cyan(),
        "Size".bold().cyan(),
        "Bold".bold().cyan(),
        "Text".bold().cyan()
    ]);

    for line in &lines {
        let bold = if line.is_bold {
            "yes".bright_magenta()
        } else {
            "".normal()
        };
        table.add_row(prettytable::row![
            line.page,
            f!("{:.1}", line.bbox.top),
            f!("{:.1}", line.bbox.x0),
            f!("{:.1}", line.font_size).bright_yellow(),
            bold,
            line.text
        ]);
    }

    table.printstd();
    Ok(())
}
