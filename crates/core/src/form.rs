use crate::config::FormConfig;
use crate::types::Line;

/// Decide whether page 0 looks like a fillable form.
///
/// Forms are dominated by short label/value lines and mention field names
/// such as "name" or "date".  Both conditions must hold.
pub fn is_form(lines: &[Line], config: &FormConfig) -> bool {
    let first_page: Vec<&Line> = lines.iter().filter(|l| l.page == 0).collect();

    let short_lines = first_page
        .iter()
        .filter(|l| l.text.chars().count() < config.short_line_chars)
        .count();

    let field_labels = first_page
        .iter()
        .filter(|l| {
            let lower = l.text.to_lowercase();
            config.field_words.iter().any(|w| lower.contains(w.as_str()))
        })
        .count();

    let mostly_short = short_lines as f32 > config.short_line_ratio * first_page.len() as f32;
    let result = mostly_short && field_labels > config.min_field_labels;

    log::debug!(
        "form check: {} page-0 lines, {} short, {} field labels -> {}",
        first_page.len(),
        short_lines,
        field_labels,
        result
    );

    result
}
