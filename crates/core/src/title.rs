use crate::config::TitleConfig;
use crate::normalize::{clean, collapse_whitespace};
use crate::types::Line;

/// Assemble the document title from the banner region of page 0.
///
/// Keeps every banner line whose size is within
/// [`TitleConfig::size_tolerance`] of the largest banner line and joins them
/// top to bottom.  Returns an empty string when the banner region is empty.
pub fn assemble_title(lines: &[Line], config: &TitleConfig) -> String {
    let mut banner: Vec<&Line> = lines
        .iter()
        .filter(|l| l.page == 0 && l.bbox.top < config.region_height)
        .collect();

    if banner.is_empty() {
        return String::new();
    }

    banner.sort_by(|a, b| {
        a.bbox
            .top
            .partial_cmp(&b.bbox.top)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let max_size = banner
        .iter()
        .map(|l| l.font_size)
        .fold(f32::MIN, f32::max);

    let joined = banner
        .iter()
        .filter(|l| (l.font_size - max_size).abs() < config.size_tolerance)
        .map(|l| clean(&l.text))
        .collect::<Vec<_>>()
        .join(" ");

    let title = collapse_whitespace(&joined);
    log::debug!("title assembled from banner region: {:?}", title);
    title
}
