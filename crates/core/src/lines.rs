//! Token -> line grouping.
//!
//! Tokens are bucketed by quantised top edge instead of by geometric
//! overlap: two tokens land on the same line when `round(top / tolerance)`
//! matches.  Adjacent visual lines whose tops differ by less than the
//! tolerance can therefore merge; widen or narrow
//! [`GroupingConfig::line_tolerance`] to trade that off.

use std::collections::BTreeMap;

use crate::config::GroupingConfig;
use crate::normalize::clean;
use crate::types::{BoundingBox, Line, PositionedToken};

/// Group tokens into lines keyed by `(page, bucket)`.
///
/// Output is ordered by page then bucket, but callers that need reading
/// order must still sort on `(page, bbox.top)` explicitly.
pub fn group_tokens_into_lines(tokens: &[PositionedToken], config: &GroupingConfig) -> Vec<Line> {
    let mut groups: BTreeMap<(usize, i64), Vec<&PositionedToken>> = BTreeMap::new();

    for token in tokens {
        let page = (token.page as usize).saturating_sub(1);
        groups
            .entry((page, bucket(token.top, config.line_tolerance)))
            .or_default()
            .push(token);
    }

    let lines: Vec<Line> = groups
        .into_iter()
        .map(|((page, _), group)| assemble_line(page, group, config.word_gap))
        .collect();

    log::debug!(
        "grouped {} tokens into {} lines",
        tokens.len(),
        lines.len()
    );

    lines
}

/// Quantise a vertical coordinate.  Ties round to even so that `x.5` buckets
/// do not all drift in one direction.
fn bucket(top: f32, tolerance: f32) -> i64 {
    (top / tolerance).round_ties_even() as i64
}

/// Build a [`Line`] from a non-empty group of tokens sharing one bucket.
fn assemble_line(page: usize, group: Vec<&PositionedToken>, word_gap: f32) -> Line {
    // Font name and bold flag come from grouping order, not from the
    // left-to-right order used for the text.
    let font_name = group[0].font_name.clone();
    let is_bold = group
        .iter()
        .any(|t| t.font_name.to_lowercase().contains("bold"));
    let font_size = group.iter().map(|t| t.font_size).sum::<f32>() / group.len() as f32;

    let mut sorted = group;
    sorted.sort_by(|a, b| a.x0.partial_cmp(&b.x0).unwrap_or(std::cmp::Ordering::Equal));

    let mut raw_text = String::new();
    let mut prev_x1: Option<f32> = None;
    let mut bbox = BoundingBox {
        x0: sorted[0].x0,
        x1: sorted[0].x1,
        top: sorted[0].top,
        bottom: sorted[0].bottom,
    };

    for token in &sorted {
        if prev_x1.is_some_and(|x1| token.x0 - x1 > word_gap) {
            raw_text.push(' ');
        }
        raw_text.push_str(&token.text);
        prev_x1 = Some(token.x1);
        bbox = bbox.union(&BoundingBox {
            x0: token.x0,
            x1: token.x1,
            top: token.top,
            bottom: token.bottom,
        });
    }

    Line {
        text: clean(&raw_text),
        raw_text,
        font_size,
        font_name,
        is_bold,
        bbox,
        page,
    }
}
