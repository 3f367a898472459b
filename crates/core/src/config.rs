//! Tunable thresholds for every stage of the pipeline.
//!
//! All values are in the extractor's render units (points for PDF).  The
//! defaults reproduce the reference heuristics; a TOML file may override any
//! subset of them:
//!
//! ```toml
//! [grouping]
//! line_tolerance = 3.0
//!
//! [headings]
//! max_entries = 20
//! ```

use serde::{Deserialize, Serialize};

use crate::OutlineError;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LayoutConfig {
    pub grouping: GroupingConfig,
    pub title: TitleConfig,
    pub form: FormConfig,
    pub headings: HeadingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GroupingConfig {
    /// Vertical quantisation step used to bucket tokens into lines.
    pub line_tolerance: f32,
    /// Horizontal gaps wider than this become a space between tokens.
    pub word_gap: f32,
}

impl Default for GroupingConfig {
    fn default() -> Self {
        Self {
            line_tolerance: 2.0,
            word_gap: 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TitleConfig {
    /// Only page-0 lines whose top edge is above this value are considered.
    pub region_height: f32,
    /// Lines within this distance of the largest size join the title.
    pub size_tolerance: f32,
}

impl Default for TitleConfig {
    fn default() -> Self {
        Self {
            region_height: 120.0,
            size_tolerance: 1.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FormConfig {
    pub short_line_chars: usize,
    /// Share of page-0 lines that must be short.
    pub short_line_ratio: f32,
    /// Field-label line count must exceed this.
    pub min_field_labels: usize,
    pub field_words: Vec<String>,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            short_line_chars: 30,
            short_line_ratio: 0.5,
            min_field_labels: 2,
            field_words: [
                "name",
                "date",
                "form",
                "designation",
                "service",
                "advance",
                "book",
                "block",
                "relationship",
                "fare",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HeadingConfig {
    /// Lines shorter than this (in characters) never become headings.
    pub min_chars: usize,
    pub h1_percentile: f64,
    pub h2_percentile: f64,
    pub h3_percentile: f64,
    pub merge_max_gap: f32,
    pub merge_max_size_delta: f32,
    pub merge_max_indent: f32,
    pub max_entries: usize,
    /// Heading text shorter than this, after bullet trimming, is noise.
    pub noise_min_chars: usize,
    /// Exact (lowercase) texts rejected as form-field labels.
    pub stop_words: Vec<String>,
}

impl Default for HeadingConfig {
    fn default() -> Self {
        Self {
            min_chars: 5,
            h1_percentile: 90.0,
            h2_percentile: 75.0,
            h3_percentile: 60.0,
            merge_max_gap: 15.0,
            merge_max_size_delta: 1.2,
            merge_max_indent: 10.0,
            max_entries: 10,
            noise_min_chars: 5,
            stop_words: ["address", "date", "time", "location", "page"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl LayoutConfig {
    /// Parse and validate a TOML document.  Missing keys keep their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self, OutlineError> {
        let config: LayoutConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), OutlineError> {
        if !(self.grouping.line_tolerance > 0.0) {
            return Err(OutlineError::Config(format!(
                "grouping.line_tolerance must be positive, got {}",
                self.grouping.line_tolerance
            )));
        }

        let h = &self.headings;
        for (name, p) in [
            ("h1_percentile", h.h1_percentile),
            ("h2_percentile", h.h2_percentile),
            ("h3_percentile", h.h3_percentile),
        ] {
            if !(0.0..=100.0).contains(&p) {
                return Err(OutlineError::Config(format!(
                    "headings.{name} must be within 0..=100, got {p}"
                )));
            }
        }
        if !(h.h1_percentile >= h.h2_percentile && h.h2_percentile >= h.h3_percentile) {
            return Err(OutlineError::Config(
                "heading percentiles must satisfy h1 >= h2 >= h3".into(),
            ));
        }

        Ok(())
    }
}
