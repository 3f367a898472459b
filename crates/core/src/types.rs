use serde::{Deserialize, Serialize};

/// One word as produced by a text-extraction backend.
///
/// Coordinates use a top-left origin: `top <= bottom` grows down the page.
/// `page` is 1-based, exactly as the extractor reports it.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionedToken {
    pub text: String,
    pub font_name: String,
    pub font_size: f32,
    pub x0: f32,
    pub x1: f32,
    pub top: f32,
    pub bottom: f32,
    pub page: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoundingBox {
    pub x0: f32,
    pub x1: f32,
    pub top: f32,
    pub bottom: f32,
}

impl BoundingBox {
    /// Grow the box so it also covers `other`.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            x0: self.x0.min(other.x0),
            x1: self.x1.max(other.x1),
            top: self.top.min(other.top),
            bottom: self.bottom.max(other.bottom),
        }
    }
}

/// A visual line: tokens sharing a page and a quantised vertical position.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    /// Normalised text (see [`crate::normalize::clean`]).
    pub text: String,
    /// Text as concatenated from the tokens, before normalisation.
    pub raw_text: String,
    /// Mean font size of the constituent tokens.
    pub font_size: f32,
    /// Font name of the first token in the group.
    pub font_name: String,
    pub is_bold: bool,
    pub bbox: BoundingBox,
    /// 0-based page index.
    pub page: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HeadingLevel {
    H1,
    H2,
    H3,
}

/// A line that passed size thresholding, tagged with its level.
#[derive(Debug, Clone, PartialEq)]
pub struct Heading {
    pub line: Line,
    pub level: HeadingLevel,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct OutlineEntry {
    pub level: HeadingLevel,
    pub text: String,
    pub page: usize,
}

/// Final per-document result. Serializes to exactly `{title, outline}`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct DocumentOutline {
    pub title: String,
    pub outline: Vec<OutlineEntry>,
}
