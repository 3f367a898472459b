//! Heading classification.
//!
//! # Pipeline
//!
//! ```text
//! Line[]  ->  candidates  ->  Heading[]  ->  merged  ->  filtered  ->  OutlineEntry[]
//!            (min length)    (percentile    (wrapped     (noise,      (dedup, cap)
//!                             thresholds)    sublines)    stop words)
//! ```
//!
//! Thresholds are derived from the document's own size distribution, so
//! every candidate line has to be materialised before any level can be
//! assigned.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;

use crate::config::HeadingConfig;
use crate::normalize::clean;
use crate::types::{Heading, HeadingLevel, Line, OutlineEntry};

/// Characters stripped from both ends before the noise checks.
const BULLET_CHARS: &[char] = &[' ', ':', '-', '•', '●'];

/// Letterhead-style banners with more words than this are kept.
const BANNER_MAX_WORDS: usize = 4;

// ---------------------------------------------------------------------------
// Thresholds
// ---------------------------------------------------------------------------

/// Font-size cut-offs for the three heading levels of one document.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub h1: f64,
    pub h2: f64,
    pub h3: f64,
}

impl Thresholds {
    /// Compute thresholds from candidate sizes.  `None` when there are no
    /// candidates.
    pub fn from_sizes(sizes: &[f32], config: &HeadingConfig) -> Option<Self> {
        if sizes.is_empty() {
            return None;
        }

        let mut sorted: Vec<f64> = sizes.iter().map(|&s| f64::from(s)).collect();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        Some(Thresholds {
            h1: percentile(&sorted, config.h1_percentile),
            h2: percentile(&sorted, config.h2_percentile),
            h3: percentile(&sorted, config.h3_percentile),
        })
    }

    /// Most restrictive level first, so each size maps to at most one level.
    pub fn level_for(&self, size: f32) -> Option<HeadingLevel> {
        let size = f64::from(size);
        if size >= self.h1 {
            Some(HeadingLevel::H1)
        } else if size >= self.h2 {
            Some(HeadingLevel::H2)
        } else if size >= self.h3 {
            Some(HeadingLevel::H3)
        } else {
            None
        }
    }
}

/// Percentile `p` (0..=100) of an ascending, non-empty slice, linearly
/// interpolating between the two nearest order statistics.
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    debug_assert!(!sorted.is_empty());
    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

// ---------------------------------------------------------------------------
// Tagging and merging
// ---------------------------------------------------------------------------

/// Tag every sufficiently long line with a level and return the tagged
/// lines in reading order (page, then top edge).
pub fn tag_candidates(lines: &[Line], config: &HeadingConfig) -> Vec<Heading> {
    let candidates: Vec<&Line> = lines
        .iter()
        .filter(|l| l.text.chars().count() >= config.min_chars)
        .collect();

    let sizes: Vec<f32> = candidates.iter().map(|l| l.font_size).collect();
    let Some(thresholds) = Thresholds::from_sizes(&sizes, config) else {
        log::debug!("no heading candidates among {} lines", lines.len());
        return Vec::new();
    };

    log::debug!(
        "heading thresholds over {} candidates: h1={:.2} h2={:.2} h3={:.2}",
        candidates.len(),
        thresholds.h1,
        thresholds.h2,
        thresholds.h3
    );

    let mut tagged: Vec<Heading> = candidates
        .into_iter()
        .filter_map(|line| {
            thresholds.level_for(line.font_size).map(|level| Heading {
                line: line.clone(),
                level,
            })
        })
        .collect();

    // Stable, so lines sharing a top keep their grouping order.
    tagged.sort_by(|a, b| {
        a.line.page.cmp(&b.line.page).then(
            a.line
                .bbox
                .top
                .partial_cmp(&b.line.bbox.top)
                .unwrap_or(std::cmp::Ordering::Equal),
        )
    });

    tagged
}

/// Whether `next` continues `current` as a wrapped subline.
fn is_continuation(current: &Heading, next: &Heading, config: &HeadingConfig) -> bool {
    let (cur, nxt) = (&current.line, &next.line);
    nxt.page == cur.page
        && (nxt.bbox.top - cur.bbox.bottom).abs() < config.merge_max_gap
        && (nxt.font_size - cur.font_size).abs() < config.merge_max_size_delta
        && (nxt.bbox.x0 - cur.bbox.x0).abs() < config.merge_max_indent
}

/// Merge wrapped heading sublines into the heading they continue.
///
/// Single forward pass: a heading keeps absorbing the following candidates
/// until one fails [`is_continuation`].  Absorbed candidates are skipped, so
/// each one joins at most one heading.  The merged heading keeps its
/// original size, left edge and level; only its text and bottom edge grow.
pub fn merge_continuations(headings: Vec<Heading>, config: &HeadingConfig) -> Vec<Heading> {
    let mut merged: Vec<Heading> = Vec::with_capacity(headings.len());
    let mut iter = headings.into_iter().peekable();

    while let Some(mut current) = iter.next() {
        while let Some(next) = iter.next_if(|n| is_continuation(&current, n, config)) {
            log::trace!(
                "merging continuation {:?} into {:?}",
                next.line.text,
                current.line.text
            );
            current.line.text.push(' ');
            current.line.text.push_str(&next.line.text);
            current.line.raw_text.push(' ');
            current.line.raw_text.push_str(&next.line.raw_text);
            current.line.bbox.bottom = next.line.bbox.bottom;
            current.line.bbox.x1 = current.line.bbox.x1.max(next.line.bbox.x1);
        }
        current.line.text = clean(&current.line.text);
        merged.push(current);
    }

    merged
}

// ---------------------------------------------------------------------------
// Noise filter
// ---------------------------------------------------------------------------

/// Returns `true` for heading text that is almost certainly not a section
/// heading: tiny fragments, all-caps letterhead banners, URLs, RSVP lines,
/// postal codes and bare field labels.
pub fn is_noisy(text: &str, config: &HeadingConfig) -> bool {
    let text = text.trim_matches(BULLET_CHARS);

    if text.chars().count() < config.noise_min_chars {
        return true;
    }

    static RE_BANNER: OnceLock<Regex> = OnceLock::new();
    let re_banner = RE_BANNER.get_or_init(|| Regex::new(r"^[A-Z\d\s,]+$").unwrap());
    if re_banner.is_match(text) && text.split_whitespace().count() <= BANNER_MAX_WORDS {
        return true;
    }

    if is_junk(text) {
        return true;
    }

    let label = text.to_lowercase();
    let label = label.trim_matches(':');
    config.stop_words.iter().any(|w| w == label)
}

/// URLs, RSVP lines and bare five-digit postal codes.
fn is_junk(text: &str) -> bool {
    static RE_JUNK: OnceLock<Regex> = OnceLock::new();
    let re_junk =
        RE_JUNK.get_or_init(|| Regex::new(r"(?i)\.com|\bwww\b|RSVP\b|^\d{5}$").unwrap());
    re_junk.is_match(text)
}

// ---------------------------------------------------------------------------
// Full classifier
// ---------------------------------------------------------------------------

/// Run the complete heading classifier over a document's lines.
///
/// Returns at most [`HeadingConfig::max_entries`] entries in reading order,
/// unique on `(text, page, level)`.
pub fn classify_headings(lines: &[Line], config: &HeadingConfig) -> Vec<OutlineEntry> {
    let tagged = tag_candidates(lines, config);
    let tagged_count = tagged.len();
    let merged = merge_continuations(tagged, config);

    let mut seen: HashSet<(String, usize, HeadingLevel)> = HashSet::new();
    let mut outline: Vec<OutlineEntry> = Vec::new();

    for heading in merged {
        let text = clean(&heading.line.text);
        if is_noisy(&text, config) {
            log::trace!("dropping noisy heading {:?}", text);
            continue;
        }
        if seen.insert((text.clone(), heading.line.page, heading.level)) {
            outline.push(OutlineEntry {
                level: heading.level,
                text,
                page: heading.line.page,
            });
        }
    }

    log::debug!(
        "{} tagged lines -> {} outline entries (cap {})",
        tagged_count,
        outline.len(),
        config.max_entries
    );

    outline.truncate(config.max_entries);
    outline
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BoundingBox;
    use proptest::prelude::*;

    fn line(text: &str, page: usize, top: f32, x0: f32, size: f32) -> Line {
        Line {
            text: text.to_string(),
            raw_text: text.to_string(),
            font_size: size,
            font_name: "Helvetica".to_string(),
            is_bold: false,
            bbox: BoundingBox {
                x0,
                x1: x0 + 200.0,
                top,
                bottom: top + size,
            },
            page,
        }
    }

    fn heading(text: &str, page: usize, top: f32, x0: f32, size: f32) -> Heading {
        Heading {
            line: line(text, page, top, x0, size),
            level: HeadingLevel::H1,
        }
    }

    fn config() -> HeadingConfig {
        HeadingConfig::default()
    }

    // =====================================================================
    // percentile / thresholds
    // =====================================================================

    #[test]
    fn test_percentile_linear_interpolation() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert!((percentile(&sorted, 0.0) - 1.0).abs() < 1e-9);
        assert!((percentile(&sorted, 100.0) - 4.0).abs() < 1e-9);
        assert!((percentile(&sorted, 50.0) - 2.5).abs() < 1e-9);
        // rank = 0.9 * 3 = 2.7
        assert!((percentile(&sorted, 90.0) - 3.7).abs() < 1e-9);
    }

    #[test]
    fn test_percentile_single_value() {
        assert_eq!(percentile(&[11.0], 75.0), 11.0);
    }

    #[test]
    fn test_thresholds_none_without_candidates() {
        assert!(Thresholds::from_sizes(&[], &config()).is_none());
    }

    #[test]
    fn test_level_assignment() {
        let sizes: Vec<f32> = (1..=10).map(|s| s as f32).collect();
        let t = Thresholds::from_sizes(&sizes, &config()).unwrap();
        // p90 = 9.1, p75 = 7.75, p60 = 6.4
        assert_eq!(t.level_for(10.0), Some(HeadingLevel::H1));
        assert_eq!(t.level_for(9.0), Some(HeadingLevel::H2));
        assert_eq!(t.level_for(8.0), Some(HeadingLevel::H2));
        assert_eq!(t.level_for(7.0), Some(HeadingLevel::H3));
        assert_eq!(t.level_for(6.0), None);
    }

    proptest! {
        #[test]
        fn prop_thresholds_are_monotonic(sizes in prop::collection::vec(1.0f32..72.0, 1..60)) {
            let t = Thresholds::from_sizes(&sizes, &config()).unwrap();
            prop_assert!(t.h1 >= t.h2);
            prop_assert!(t.h2 >= t.h3);
        }

        #[test]
        fn prop_h1_never_smaller_than_h3(sizes in prop::collection::vec(1.0f32..72.0, 1..60)) {
            let t = Thresholds::from_sizes(&sizes, &config()).unwrap();
            let h1: Vec<f32> = sizes.iter().copied().filter(|&s| t.level_for(s) == Some(HeadingLevel::H1)).collect();
            let h3: Vec<f32> = sizes.iter().copied().filter(|&s| t.level_for(s) == Some(HeadingLevel::H3)).collect();
            for a in &h1 {
                for b in &h3 {
                    prop_assert!(a >= b);
                }
            }
        }

        #[test]
        fn prop_outline_is_bounded(n in 0usize..60) {
            let lines: Vec<Line> = (0..n)
                .map(|i| line(&format!("Section number {i}"), i / 5, (i % 5) as f32 * 150.0, 50.0, 14.0))
                .collect();
            prop_assert!(classify_headings(&lines, &config()).len() <= 10);
        }
    }

    // =====================================================================
    // tag_candidates
    // =====================================================================

    #[test]
    fn test_short_lines_are_not_candidates() {
        let lines = vec![line("Tiny", 0, 100.0, 50.0, 30.0)];
        assert!(tag_candidates(&lines, &config()).is_empty());
    }

    #[test]
    fn test_candidates_sorted_in_reading_order() {
        let lines = vec![
            line("Page two heading", 1, 50.0, 50.0, 20.0),
            line("Lower heading", 0, 400.0, 50.0, 20.0),
            line("Upper heading", 0, 100.0, 50.0, 20.0),
        ];
        let tagged = tag_candidates(&lines, &config());
        let texts: Vec<&str> = tagged.iter().map(|h| h.line.text.as_str()).collect();
        assert_eq!(texts, ["Upper heading", "Lower heading", "Page two heading"]);
    }

    // =====================================================================
    // merge_continuations
    // =====================================================================

    #[test]
    fn test_continuation_merges_with_single_space() {
        // Gap 10, size delta 0.3, indent 4.
        let first = heading("Results of the", 0, 100.0, 50.0, 16.0);
        let second = heading("Annual Survey", 0, 126.0, 54.0, 16.3);
        let merged = merge_continuations(vec![first, second], &config());
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].line.text, "Results of the Annual Survey");
        assert_eq!(merged[0].line.bbox.bottom, 126.0 + 16.3);
    }

    #[test]
    fn test_continuation_chains_forward() {
        let a = heading("A very long", 0, 100.0, 50.0, 16.0);
        let b = heading("heading that", 0, 120.0, 50.0, 16.0);
        let c = heading("wraps twice", 0, 140.0, 50.0, 16.0);
        let merged = merge_continuations(vec![a, b, c], &config());
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].line.text, "A very long heading that wraps twice");
    }

    #[test]
    fn test_merge_uses_original_size_and_indent() {
        // Each step is within tolerance of its predecessor but the third is
        // too far from the original heading's size and left edge.
        let a = heading("Opening line", 0, 100.0, 50.0, 16.0);
        let b = heading("drifting line", 0, 120.0, 58.0, 17.0);
        let c = heading("drifted away", 0, 140.0, 66.0, 18.0);
        let merged = merge_continuations(vec![a, b, c], &config());
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].line.text, "Opening line drifting line");
        assert_eq!(merged[1].line.text, "drifted away");
    }

    #[test]
    fn test_no_merge_across_pages() {
        let a = heading("Bottom of page", 0, 700.0, 50.0, 16.0);
        let b = heading("Top of next page", 1, 705.0, 50.0, 16.0);
        assert_eq!(merge_continuations(vec![a, b], &config()).len(), 2);
    }

    #[test]
    fn test_no_merge_when_gap_too_large() {
        let a = heading("First heading", 0, 100.0, 50.0, 16.0);
        let b = heading("Second heading", 0, 131.0, 50.0, 16.0);
        assert_eq!(merge_continuations(vec![a, b], &config()).len(), 2);
    }

    #[test]
    fn test_no_merge_when_indent_differs() {
        let a = heading("First heading", 0, 100.0, 50.0, 16.0);
        let b = heading("Indented heading", 0, 120.0, 70.0, 16.0);
        assert_eq!(merge_continuations(vec![a, b], &config()).len(), 2);
    }

    #[test]
    fn test_absorbed_line_not_reused() {
        let a = heading("Alpha heading", 0, 100.0, 50.0, 16.0);
        let b = heading("beta subline", 0, 120.0, 50.0, 16.0);
        let c = heading("Gamma heading", 0, 300.0, 50.0, 16.0);
        let merged = merge_continuations(vec![a, b, c], &config());
        let texts: Vec<&str> = merged.iter().map(|h| h.line.text.as_str()).collect();
        assert_eq!(texts, ["Alpha heading beta subline", "Gamma heading"]);
    }

    // =====================================================================
    // is_noisy
    // =====================================================================

    #[test]
    fn test_postal_code_is_noise() {
        assert!(is_noisy("12345", &config()));
    }

    #[test]
    fn test_postal_code_rule_is_anchored() {
        assert!(is_junk("12345"));
        assert!(!is_junk("123456"));
        assert!(!is_junk("Zip 12345"));
        assert!(!is_junk("Suite 12345 Annex"));
        assert!(!is_noisy("Zip 12345", &config()));
    }

    #[test]
    fn test_noise_length_independent_of_candidate_length() {
        let mut cfg = config();
        cfg.min_chars = 1;
        assert!(is_noisy("Scope", &HeadingConfig { noise_min_chars: 6, ..cfg.clone() }));
        assert!(is_noisy("Aim", &cfg));

        cfg.min_chars = 20;
        assert!(!is_noisy("Scope", &cfg));
    }

    #[test]
    fn test_field_label_is_noise() {
        assert!(is_noisy("DATE", &config()));
        assert!(is_noisy("Address:", &config()));
        assert!(is_noisy("Location", &config()));
    }

    #[test]
    fn test_short_after_bullet_strip_is_noise() {
        assert!(is_noisy("• Go -", &config()));
        assert!(is_noisy("●●● ab :", &config()));
    }

    #[test]
    fn test_all_caps_banner_is_noise() {
        assert!(is_noisy("ACME CORPORATION", &config()));
        assert!(is_noisy("SUITE 100, AUSTIN", &config()));
        assert!(is_noisy("API V2", &config()));
    }

    #[test]
    fn test_long_all_caps_line_is_kept() {
        assert!(!is_noisy("PART ONE OF THE REPORT", &config()));
    }

    #[test]
    fn test_urls_and_rsvp_are_noise() {
        assert!(is_noisy("Visit example.com today", &config()));
        assert!(is_noisy("See www example org", &config()));
        assert!(is_noisy("Please rsvp by Friday", &config()));
    }

    #[test]
    fn test_mixed_case_heading_is_kept() {
        assert!(!is_noisy("Introduction", &config()));
        assert!(!is_noisy("3. Methods and Materials", &config()));
    }

    // =====================================================================
    // classify_headings
    // =====================================================================

    #[test]
    fn test_three_h1_scenario() {
        let lines = vec![
            line("Results", 1, 400.0, 50.0, 20.0),
            line("Introduction", 0, 100.0, 50.0, 20.0),
            line("Methods", 1, 100.0, 50.0, 20.0),
        ];
        let outline = classify_headings(&lines, &config());
        let expected = vec![
            OutlineEntry {
                level: HeadingLevel::H1,
                text: "Introduction".to_string(),
                page: 0,
            },
            OutlineEntry {
                level: HeadingLevel::H1,
                text: "Methods".to_string(),
                page: 1,
            },
            OutlineEntry {
                level: HeadingLevel::H1,
                text: "Results".to_string(),
                page: 1,
            },
        ];
        assert_eq!(outline, expected);
    }

    #[test]
    fn test_duplicates_keep_first_occurrence() {
        let lines = vec![
            line("Running Header", 0, 30.0, 50.0, 18.0),
            line("Chapter Overview", 0, 200.0, 50.0, 18.0),
            line("Running Header", 0, 600.0, 50.0, 18.0),
            line("Running Header", 1, 30.0, 50.0, 18.0),
        ];
        let outline = classify_headings(&lines, &config());
        let texts: Vec<(&str, usize)> = outline.iter().map(|e| (e.text.as_str(), e.page)).collect();
        assert_eq!(
            texts,
            [
                ("Running Header", 0),
                ("Chapter Overview", 0),
                ("Running Header", 1)
            ]
        );
    }

    #[test]
    fn test_outline_truncated_to_max_entries() {
        let lines: Vec<Line> = (0..25)
            .map(|i| line(&format!("Section {i} overview"), i, 100.0, 50.0, 16.0))
            .collect();
        let outline = classify_headings(&lines, &config());
        assert_eq!(outline.len(), 10);
        assert_eq!(outline[0].text, "Section 0 overview");
        assert_eq!(outline[9].text, "Section 9 overview");
    }

    #[test]
    fn test_noise_dropped_even_at_largest_size() {
        let lines = vec![
            line("12345", 0, 100.0, 50.0, 40.0),
            line("Real Heading", 0, 300.0, 50.0, 40.0),
        ];
        let outline = classify_headings(&lines, &config());
        assert_eq!(outline.len(), 1);
        assert_eq!(outline[0].text, "Real Heading");
    }

    #[test]
    fn test_body_text_below_threshold_excluded() {
        let mut lines = vec![line("Overview of Results", 0, 100.0, 50.0, 24.0)];
        for i in 0..9 {
            lines.push(line(
                "Body text paragraph line",
                0,
                200.0 + i as f32 * 40.0,
                50.0,
                10.0 - i as f32 * 0.1,
            ));
        }
        let outline = classify_headings(&lines, &config());
        assert_eq!(outline[0].text, "Overview of Results");
        assert_eq!(outline[0].level, HeadingLevel::H1);
        assert!(outline.len() < lines.len());
    }

    #[test]
    fn test_degenerate_layout_yields_empty_outline() {
        let lines = vec![line("a", 0, 100.0, 50.0, 12.0), line("bcd", 0, 200.0, 50.0, 12.0)];
        assert!(classify_headings(&lines, &config()).is_empty());
    }
}
