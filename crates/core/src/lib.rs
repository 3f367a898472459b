//! Core library for outliner
//!
//! This crate implements the **Functional Core** of the outliner application:
//! it infers a document's title and heading outline purely from the visual
//! layout of positioned word tokens (font size, boldness, position).
//!
//! # Architecture Overview
//!
//! - **`outliner_core`** (this crate): the layout-to-structure pipeline, with zero I/O
//! - **`outliner_pdf`**: the PDF text-extraction backend that produces tokens
//! - **`outliner`**: the CLI shell (batch driver, output files, logging)
//!
//! # Pipeline
//!
//! ```text
//! PositionedToken[] -> Line[] -> { title, is_form, headings } -> DocumentOutline
//!                      lines      title / form / headings        process
//! ```
//!
//! # Module Organization
//!
//! - [`lines`]: token -> line grouping by quantised vertical position
//! - [`normalize`]: stutter and whitespace cleanup of line text
//! - [`title`]: banner-region title assembly
//! - [`form`]: fillable-form detection
//! - [`headings`]: percentile thresholds, continuation merge, noise filter
//! - [`process`]: per-document orchestration and the [`TokenSource`] seam
//! - [`config`]: every tunable constant, loadable from TOML
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use outliner_core::{build_outline, LayoutConfig, PositionedToken};
//!
//! let tokens: Vec<PositionedToken> = load_fixture();
//! let result = build_outline(&tokens, &LayoutConfig::default());
//! println!("{}", result.title);
//! ```

pub mod config;
pub mod error;
pub mod form;
pub mod headings;
pub mod lines;
pub mod normalize;
pub mod process;
pub mod title;
pub mod types;

pub use config::LayoutConfig;
pub use error::OutlineError;
pub use process::{build_outline, process_document, TokenSource};
pub use types::*;
