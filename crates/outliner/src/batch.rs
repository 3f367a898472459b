use std::path::{Path, PathBuf};
use std::sync::Arc;

use colored::Colorize;
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use outliner_core::{process_document, DocumentOutline, LayoutConfig};
use outliner_pdf::PdfDocument;

use crate::prelude::{eprintln, println, *};

/// Options for the batch driver
#[derive(Debug, clap::Args, Clone)]
pub struct BatchOptions {
    /// Directory scanned (non-recursively) for `.pdf` files
    #[arg(long, short, env = "OUTLINER_INPUT_DIR", default_value = "/app/input")]
    pub input: PathBuf,

    /// Directory that receives one `<stem>.json` per document
    #[arg(long, short, env = "OUTLINER_OUTPUT_DIR", default_value = "/app/output")]
    pub output: PathBuf,

    /// Documents processed concurrently (defaults to the number of CPUs)
    #[arg(long, short, env = "OUTLINER_JOBS")]
    pub jobs: Option<usize>,
}

/// Outcome of one document.
#[derive(Debug)]
pub struct DocumentReport {
    pub input: PathBuf,
    pub result: Result<DocumentOutline>,
}

/// List the PDF files directly inside `dir`, sorted by file name.
///
/// The extension match is case-insensitive.
pub fn discover_documents(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(Error::InputNotFound(dir.to_path_buf()).into());
    }

    let mut documents: Vec<PathBuf> = std::fs::read_dir(dir)
        .wrap_err_with(|| f!("Failed to list {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && has_pdf_extension(path))
        .collect();

    documents.sort();
    Ok(documents)
}

fn has_pdf_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

/// `<output_dir>/<input stem>.json`
pub fn output_path(output_dir: &Path, input: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or(input.as_os_str());
    let mut name = stem.to_os_string();
    name.push(".json");
    output_dir.join(name)
}

/// Write `outline` as two-space indented JSON with non-ASCII kept verbatim.
pub fn write_outline(path: &Path, outline: &DocumentOutline) -> Result<()> {
    let json = serde_json::to_string_pretty(outline)
        .map_err(|e| eyre!("Failed to serialize outline: {}", e))?;
    std::fs::write(path, json).wrap_err_with(|| f!("Failed to write {}", path.display()))
}

/// Extract, classify and write one document.
fn process_one(input: &Path, output_dir: &Path, config: &LayoutConfig) -> Result<DocumentOutline> {
    let document =
        PdfDocument::open(input).wrap_err_with(|| f!("Failed to load {}", input.display()))?;
    let outline = process_document(&document, config)
        .wrap_err_with(|| f!("Failed to process {}", input.display()))?;
    write_outline(&output_path(output_dir, input), &outline)?;
    Ok(outline)
}

/// Process `inputs` with at most `jobs` documents in flight.
///
/// Every document is attempted; reports come back in input order.
pub async fn run_batch(
    inputs: Vec<PathBuf>,
    output_dir: &Path,
    config: Arc<LayoutConfig>,
    jobs: usize,
    progress: Option<&ProgressBar>,
) -> Vec<DocumentReport> {
    let mut reports: Vec<(usize, DocumentReport)> =
        futures::stream::iter(inputs.into_iter().enumerate())
            .map(|(index, input)| {
                let output_dir = output_dir.to_path_buf();
                let config = Arc::clone(&config);
                async move {
                    let task_input = input.clone();
                    let result = tokio::task::spawn_blocking(move || {
                        process_one(&task_input, &output_dir, &config)
                    })
                    .await
                    .map_err(|e| eyre!("Task join error: {e}"))
                    .and_then(|r| r);

                    (index, DocumentReport { input, result })
                }
            })
            .buffer_unordered(jobs.max(1))
            .inspect(|(_, report)| {
                if let Some(p) = progress {
                    p.set_message(display_name(&report.input));
                    p.inc(1);
                }
            })
            .collect()
            .await;

    reports.sort_by_key(|(index, _)| *index);
    reports.into_iter().map(|(_, report)| report).collect()
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn default_jobs() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Handle the batch command
pub async fn run(options: BatchOptions, global: crate::Global) -> Result<()> {
    let config = Arc::new(crate::config::load(global.config.as_deref())?);
    let inputs = discover_documents(&options.input)?;

    std::fs::create_dir_all(&options.output)
        .wrap_err_with(|| f!("Failed to create {}", options.output.display()))?;

    if inputs.is_empty() {
        eprintln!("No PDF documents found in {}", options.input.display());
        return Ok(());
    }

    let jobs = options.jobs.unwrap_or_else(default_jobs);
    log::info!(
        "processing {} documents from {} with {} jobs",
        inputs.len(),
        options.input.display(),
        jobs
    );

    let progress = ProgressBar::new(inputs.len() as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?,
    );
    progress.enable_steady_tick(std::time::Duration::from_millis(100));

    let reports = run_batch(inputs, &options.output, config, jobs, Some(&progress)).await;

    progress.finish_and_clear();

    for report in &reports {
        if let Err(e) = &report.result {
            log::error!("{}: {:#}", report.input.display(), e);
        }
    }

    print_summary(&reports);

    let failed = reports.iter().filter(|r| r.result.is_err()).count();
    if failed > 0 {
        return Err(Error::BatchFailed {
            failed,
            total: reports.len(),
        }
        .into());
    }

    Ok(())
}

fn print_summary(reports: &[DocumentReport]) {
    let mut table = crate::prelude::new_table();
    table.add_row(prettytable::row![
        "Document".bold().cyan(),
        "Title".bold().cyan(),
        "Headings".bold().cyan(),
        "Status".bold().cyan()
    ]);

    for report in reports {
        let name = display_name(&report.input);
        match &report.result {
            Ok(outline) => table.add_row(prettytable::row![
                name.bright_white(),
                outline.title,
                outline.outline.len(),
                "ok".bright_green()
            ]),
            Err(e) => table.add_row(prettytable::row![
                name.bright_white(),
                "",
                "",
                f!("failed: {}", e.root_cause()).bright_red()
            ]),
        };
    }

    let ok = reports.iter().filter(|r| r.result.is_ok()).count();
    println!(
        "\nProcessed {} document(s), {} ok:\n",
        reports.len().to_string().bold(),
        ok
    );
    table.printstd();
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{dictionary, Document, Object, ObjectId, Stream};
    use tempfile::TempDir;

    /// Minimal one-page PDF with a large banner line and a heading line.
    fn sample_pdf(banner: &str) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id: ObjectId = doc.new_object_id();
        let font = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica-Bold",
        });

        let content = format!(
            "BT /F1 24 Tf 72 740 Td ({banner}) Tj ET\nBT /F1 12 Tf 72 600 Td (Background) Tj ET\n"
        );
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => content_id,
            "Resources" => dictionary! { "Font" => dictionary! { "F1" => font } },
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }

    #[test]
    fn test_discover_filters_and_sorts() {
        let dir = TempDir::new().unwrap();
        for name in ["b.pdf", "A.PDF", "notes.txt", "c.Pdf"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        std::fs::create_dir(dir.path().join("nested.pdf")).unwrap();

        let found: Vec<String> = discover_documents(dir.path())
            .unwrap()
            .iter()
            .map(|p| display_name(p))
            .collect();
        assert_eq!(found, vec!["A.PDF", "b.pdf", "c.Pdf"]);
    }

    #[test]
    fn test_discover_missing_directory() {
        let dir = TempDir::new().unwrap();
        assert!(discover_documents(&dir.path().join("missing")).is_err());
    }

    #[test]
    fn test_output_path_uses_stem() {
        let out = output_path(Path::new("/out"), Path::new("/in/Report.Final.PDF"));
        assert_eq!(out, PathBuf::from("/out/Report.Final.json"));
    }

    #[test]
    fn test_write_outline_keeps_non_ascii() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("doc.json");
        let outline = DocumentOutline {
            title: "Résumé".to_string(),
            outline: vec![],
        };

        write_outline(&path, &outline).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, "{\n  \"title\": \"Résumé\",\n  \"outline\": []\n}");
    }

    #[tokio::test]
    async fn test_run_batch_isolates_failures() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        std::fs::write(input.path().join("a.pdf"), sample_pdf("Annual Report")).unwrap();
        std::fs::write(input.path().join("b.pdf"), b"%PDF-1.4 truncated").unwrap();
        std::fs::write(input.path().join("c.pdf"), sample_pdf("Field Guide")).unwrap();

        let inputs = discover_documents(input.path()).unwrap();
        let reports = run_batch(
            inputs,
            output.path(),
            Arc::new(LayoutConfig::default()),
            2,
            None,
        )
        .await;

        let names: Vec<String> = reports.iter().map(|r| display_name(&r.input)).collect();
        assert_eq!(names, vec!["a.pdf", "b.pdf", "c.pdf"]);

        assert_eq!(reports[0].result.as_ref().unwrap().title, "Annual Report");
        assert!(reports[1].result.is_err());
        assert_eq!(reports[2].result.as_ref().unwrap().title, "Field Guide");

        assert!(output.path().join("a.json").exists());
        assert!(!output.path().join("b.json").exists());

        let written: DocumentOutline = serde_json::from_str(
            &std::fs::read_to_string(output.path().join("c.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(written.title, "Field Guide");
    }
}
