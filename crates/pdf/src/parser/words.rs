//! Word extraction from PDF content streams.
//!
//! Every function below is a pure transformation over data served by a
//! [`PdfBackend`]; the backend owns all parsing and I/O.
//!
//! # Pipeline
//!
//! ```text
//! content ops  ->  PositionedGlyph[]  ->  PositionedToken[]
//!   (per page)      extract_page_glyphs    assemble_words
//! ```
//!
//! Glyph positions come from a simplified text-rendering state machine.
//! Widths use the font's `Widths` array when the string maps one byte to one
//! glyph, and a fixed fraction of the font size otherwise.

use outliner_core::PositionedToken;

use super::backend::{get_number_from_value, BackendFontInfo, PageId, PdfBackend, PdfValue};
use crate::text::clean_token_text;
use crate::PdfError;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// One rendered character in user space (PDF origin: bottom-left).
#[derive(Debug, Clone, PartialEq)]
pub struct PositionedGlyph {
    pub ch: char,
    pub x0: f32,
    pub x1: f32,
    pub baseline: f32,
    pub font_size: f32,
    pub font_name: String,
}

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Glyph width (in thousandths of the font size) assumed when the font does
/// not declare one.
const APPROX_GLYPH_WIDTH: f32 = 500.0;

/// Glyphs further apart than this horizontally start a new word.
const WORD_X_TOLERANCE: f32 = 3.0;

/// Glyphs whose baselines differ by more than this start a new word.
const WORD_Y_TOLERANCE: f32 = 3.0;

/// The identity 2x3 text matrix: [a, b, c, d, tx, ty].
const IDENTITY_MATRIX: [f32; 6] = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

/// `m` followed by `n`: the matrix product `m x n` in PDF's row-vector
/// convention.
fn concat(m: &[f32; 6], n: &[f32; 6]) -> [f32; 6] {
    [
        m[0] * n[0] + m[1] * n[2],
        m[0] * n[1] + m[1] * n[3],
        m[2] * n[0] + m[3] * n[2],
        m[2] * n[1] + m[3] * n[3],
        m[4] * n[0] + m[5] * n[2] + n[4],
        m[4] * n[1] + m[5] * n[3] + n[5],
    ]
}

fn transform_point(m: &[f32; 6], x: f32, y: f32) -> (f32, f32) {
    (m[0] * x + m[2] * y + m[4], m[1] * x + m[3] * y + m[5])
}

// ---------------------------------------------------------------------------
// Internal: PDF text-state machine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct TextState {
    /// Font selected by the last `Tf`, if it exists in the page resources.
    font: Option<BackendFontInfo>,
    /// Base-font name, or the resource key when the font is unknown.
    font_name: String,
    font_size: f32,
    text_matrix: [f32; 6],
    line_matrix: [f32; 6],
    /// Current transformation matrix, set by `cm`.
    ctm: [f32; 6],
    /// `Tz` / 100.
    horiz_scale: f32,
    char_spacing: f32,
    word_spacing: f32,
    text_rise: f32,
    leading: f32,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            font: None,
            font_name: String::new(),
            font_size: 0.0,
            text_matrix: IDENTITY_MATRIX,
            line_matrix: IDENTITY_MATRIX,
            ctm: IDENTITY_MATRIX,
            horiz_scale: 1.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            text_rise: 0.0,
            leading: 0.0,
        }
    }
}

impl TextState {
    /// Text space to user space: `Tm x CTM`.
    fn rendering_matrix(&self) -> [f32; 6] {
        concat(&self.text_matrix, &self.ctm)
    }

    /// Rendered size: `font_size * sqrt(b^2 + d^2)` of the rendering matrix.
    fn effective_font_size(&self) -> f32 {
        let trm = self.rendering_matrix();
        let scale = (trm[1].powi(2) + trm[3].powi(2)).sqrt();
        (self.font_size * scale).abs()
    }

    /// Advance the text matrix by `dx` text-space units.
    fn advance_x(&mut self, dx: f32) {
        self.text_matrix[4] += dx * self.text_matrix[0];
        self.text_matrix[5] += dx * self.text_matrix[1];
    }

    /// `Td`: translate the line matrix and reset the text matrix to it.
    fn translate_line(&mut self, tx: f32, ty: f32) {
        let new_tx = self.line_matrix[0] * tx + self.line_matrix[2] * ty + self.line_matrix[4];
        let new_ty = self.line_matrix[1] * tx + self.line_matrix[3] * ty + self.line_matrix[5];
        self.line_matrix[4] = new_tx;
        self.line_matrix[5] = new_ty;
        self.text_matrix = self.line_matrix;
    }

    fn next_line(&mut self) {
        self.translate_line(0.0, -self.leading);
    }
}

// ---------------------------------------------------------------------------
// Public API: glyph extraction
// ---------------------------------------------------------------------------

/// Walk one page's content stream and return its glyphs in stream order.
///
/// Handles `q Q cm BT ET Tf Tm Td TD T* TL Tc Tw Tz Ts Tj TJ ' "`; every
/// other operator is ignored.  Glyph positions are mapped through `Tm x CTM`
/// into user space.
pub fn extract_page_glyphs(
    backend: &dyn PdfBackend,
    page_id: PageId,
) -> Result<Vec<PositionedGlyph>, PdfError> {
    let raw_content = backend.page_content(page_id)?;
    let ops = backend.decode_content(&raw_content)?;
    let fonts = backend.page_fonts(page_id).unwrap_or_else(|e| {
        log::warn!("page {:?}: {}; falling back to estimated widths", page_id, e);
        Vec::new()
    });

    let mut state = TextState::default();
    let mut saved_states: Vec<TextState> = Vec::new();
    let mut glyphs: Vec<PositionedGlyph> = Vec::new();

    for op in &ops {
        let first_number = || op.operands.first().and_then(get_number_from_value);

        match op.operator.as_str() {
            "q" => saved_states.push(state.clone()),
            "Q" => {
                if let Some(saved) = saved_states.pop() {
                    state = saved;
                }
            }
            "cm" => {
                let vals: Vec<f32> = op
                    .operands
                    .iter()
                    .take(6)
                    .filter_map(get_number_from_value)
                    .collect();
                if let Ok(matrix) = <[f32; 6]>::try_from(vals) {
                    state.ctm = concat(&matrix, &state.ctm);
                }
            }
            "BT" => {
                state.text_matrix = IDENTITY_MATRIX;
                state.line_matrix = IDENTITY_MATRIX;
            }
            // Font state survives ET.
            "ET" => {}
            "Tf" => handle_tf(&op.operands, &fonts, &mut state),
            "Tm" => handle_tm(&op.operands, &mut state),
            "Td" | "TD" => {
                if let [tx, ty, ..] = op.operands.as_slice() {
                    let tx = get_number_from_value(tx).unwrap_or(0.0);
                    let ty = get_number_from_value(ty).unwrap_or(0.0);
                    if op.operator == "TD" {
                        state.leading = -ty;
                    }
                    state.translate_line(tx, ty);
                }
            }
            "T*" => state.next_line(),
            "TL" => {
                if let Some(v) = first_number() {
                    state.leading = v;
                }
            }
            "Tc" => {
                if let Some(v) = first_number() {
                    state.char_spacing = v;
                }
            }
            "Tw" => {
                if let Some(v) = first_number() {
                    state.word_spacing = v;
                }
            }
            "Tz" => {
                if let Some(v) = first_number() {
                    state.horiz_scale = v / 100.0;
                }
            }
            "Ts" => {
                if let Some(v) = first_number() {
                    state.text_rise = v;
                }
            }
            "Tj" => {
                if let Some(first) = op.operands.first() {
                    show_string(first, backend, &mut state, &mut glyphs);
                }
            }
            "TJ" => {
                if let Some(PdfValue::Array(arr)) = op.operands.first() {
                    handle_tj_array(arr, backend, &mut state, &mut glyphs);
                }
            }
            "'" => {
                state.next_line();
                if let Some(first) = op.operands.first() {
                    show_string(first, backend, &mut state, &mut glyphs);
                }
            }
            "\"" => {
                if let [aw, ac, text, ..] = op.operands.as_slice() {
                    if let Some(aw) = get_number_from_value(aw) {
                        state.word_spacing = aw;
                    }
                    if let Some(ac) = get_number_from_value(ac) {
                        state.char_spacing = ac;
                    }
                    state.next_line();
                    show_string(text, backend, &mut state, &mut glyphs);
                }
            }
            _ => {}
        }
    }

    Ok(glyphs)
}

fn handle_tf(operands: &[PdfValue], fonts: &[BackendFontInfo], state: &mut TextState) {
    let [key, size, ..] = operands else {
        return;
    };
    let key = match key {
        PdfValue::Name(n) | PdfValue::Str(n) => n,
        _ => return,
    };

    state.font_size = get_number_from_value(size).unwrap_or(0.0);
    state.font = fonts.iter().find(|info| &info.name == key).cloned();
    state.font_name = state
        .font
        .as_ref()
        .and_then(|f| f.base_font.clone())
        .unwrap_or_else(|| String::from_utf8_lossy(key).into_owned());
}

fn handle_tm(operands: &[PdfValue], state: &mut TextState) {
    let vals: Vec<f32> = operands
        .iter()
        .take(6)
        .filter_map(get_number_from_value)
        .collect();
    if let Ok(matrix) = <[f32; 6]>::try_from(vals) {
        state.text_matrix = matrix;
        state.line_matrix = matrix;
    }
}

/// Render one string operand: emit a glyph per character and advance the
/// text matrix by `(w0 * Tfs + Tc + Tw) * Th` per glyph.
fn show_string(
    operand: &PdfValue,
    backend: &dyn PdfBackend,
    state: &mut TextState,
    glyphs: &mut Vec<PositionedGlyph>,
) {
    let PdfValue::Str(bytes) = operand else {
        return;
    };

    let text = backend.decode_text(state.font.as_ref(), bytes);
    let chars: Vec<char> = text.chars().collect();

    // Declared widths are only usable when codes map 1:1 onto characters.
    let declared: Option<Vec<f32>> = state
        .font
        .as_ref()
        .filter(|f| !f.is_two_byte() && !f.widths.is_empty() && chars.len() == bytes.len())
        .map(|f| {
            bytes
                .iter()
                .map(|&b| f.glyph_width(b).unwrap_or(APPROX_GLYPH_WIDTH))
                .collect()
        });

    let rendered_size = state.effective_font_size();

    for (i, &ch) in chars.iter().enumerate() {
        let w0 = declared.as_ref().map_or(APPROX_GLYPH_WIDTH, |w| w[i]) / 1000.0;
        let glyph_width = w0 * state.font_size * state.horiz_scale;

        let trm = state.rendering_matrix();
        let (x0, baseline) = transform_point(&trm, 0.0, state.text_rise);
        let (x1, _) = transform_point(&trm, glyph_width, state.text_rise);
        glyphs.push(PositionedGlyph {
            ch,
            x0: x0.min(x1),
            x1: x0.max(x1),
            baseline,
            font_size: rendered_size,
            font_name: state.font_name.clone(),
        });

        let mut advance = glyph_width + state.char_spacing * state.horiz_scale;
        if ch == ' ' {
            advance += state.word_spacing * state.horiz_scale;
        }
        state.advance_x(advance);
    }
}

/// `TJ`: strings are rendered, numbers shift the pen left by
/// `n / 1000 * font_size`.
fn handle_tj_array(
    arr: &[PdfValue],
    backend: &dyn PdfBackend,
    state: &mut TextState,
    glyphs: &mut Vec<PositionedGlyph>,
) {
    for elem in arr {
        match elem {
            PdfValue::Str(_) => show_string(elem, backend, state, glyphs),
            val => {
                if let Some(adj) = get_number_from_value(val) {
                    state.advance_x(-adj / 1000.0 * state.font_size * state.horiz_scale);
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Public API: glyph -> word assembly
// ---------------------------------------------------------------------------

/// Whether `next` continues the word that ends with `prev`.
///
/// Words never span a font change, a baseline jump, or a horizontal gap
/// wider than [`WORD_X_TOLERANCE`].
fn continues_word(prev: &PositionedGlyph, next: &PositionedGlyph) -> bool {
    next.font_name == prev.font_name
        && (next.font_size - prev.font_size).abs() < 0.01
        && (next.baseline - prev.baseline).abs() <= WORD_Y_TOLERANCE
        && next.x0 <= prev.x1 + WORD_X_TOLERANCE
        && next.x0 + WORD_X_TOLERANCE >= prev.x0
}

/// Group glyphs (in stream order) into word tokens for one page.
///
/// Coordinates are flipped so that `top`/`bottom` are measured down from
/// the top edge of a page `page_height` units tall.
pub fn assemble_words(
    glyphs: &[PositionedGlyph],
    page_number: u32,
    page_height: f32,
) -> Vec<PositionedToken> {
    let mut tokens: Vec<PositionedToken> = Vec::new();
    let mut current: Vec<&PositionedGlyph> = Vec::new();

    for glyph in glyphs {
        if glyph.ch.is_whitespace() {
            flush_word(&mut current, page_number, page_height, &mut tokens);
            continue;
        }
        if current.last().is_some_and(|prev| !continues_word(prev, glyph)) {
            flush_word(&mut current, page_number, page_height, &mut tokens);
        }
        current.push(glyph);
    }
    flush_word(&mut current, page_number, page_height, &mut tokens);

    tokens
}

fn flush_word(
    current: &mut Vec<&PositionedGlyph>,
    page_number: u32,
    page_height: f32,
    tokens: &mut Vec<PositionedToken>,
) {
    let Some(first) = current.first() else {
        return;
    };

    let raw: String = current.iter().map(|g| g.ch).collect();
    let text = clean_token_text(&raw);
    if !text.is_empty() {
        let x0 = current.iter().map(|g| g.x0).fold(f32::MAX, f32::min);
        let x1 = current.iter().map(|g| g.x1).fold(f32::MIN, f32::max);
        let top_baseline = current.iter().map(|g| g.baseline).fold(f32::MIN, f32::max);
        let low_baseline = current.iter().map(|g| g.baseline).fold(f32::MAX, f32::min);

        tokens.push(PositionedToken {
            text,
            font_name: first.font_name.clone(),
            font_size: first.font_size,
            x0,
            x1,
            top: page_height - top_baseline - first.font_size,
            bottom: page_height - low_baseline,
            page: page_number,
        });
    }

    current.clear();
}

// ---------------------------------------------------------------------------
// Public API: multi-page extraction
// ---------------------------------------------------------------------------

/// Extract word tokens from every page, numbered from 1 in page-tree order.
///
/// Any page whose content cannot be read or decoded fails the whole
/// document.
pub fn extract_document_tokens(backend: &dyn PdfBackend) -> Result<Vec<PositionedToken>, PdfError> {
    let page_map = backend.pages();
    let mut tokens: Vec<PositionedToken> = Vec::new();

    for (&page_num, &page_id) in &page_map {
        let glyphs = extract_page_glyphs(backend, page_id)?;
        let page_tokens = assemble_words(&glyphs, page_num, backend.page_height(page_id));
        log::debug!(
            "page {}: {} glyphs -> {} word tokens",
            page_num,
            glyphs.len(),
            page_tokens.len()
        );
        tokens.extend(page_tokens);
    }

    Ok(tokens)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
