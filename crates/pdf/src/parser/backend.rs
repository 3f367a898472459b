use std::collections::BTreeMap;

use lopdf::{self, content::Content};

use crate::PdfError;

/// Page height used when a page has no resolvable MediaBox (US Letter).
pub const DEFAULT_PAGE_HEIGHT: f32 = 792.0;

/// `(object number, generation)` of a page object.
pub type PageId = (u32, u16);

// ---------------------------------------------------------------------------
// Supporting types
// ---------------------------------------------------------------------------

/// Font information pulled from a page's resource dictionary.
#[derive(Debug, Clone, Default)]
pub struct BackendFontInfo {
    /// Resource key as used by `Tf` (e.g. `b"F1"`).
    pub name: Vec<u8>,
    /// `BaseFont` entry, e.g. `"ABCDEF+Arial-BoldMT"`.
    pub base_font: Option<String>,
    /// `Encoding` entry when it is a plain name.
    pub encoding: Option<String>,
    /// `FirstChar` entry; the code that `widths[0]` describes.
    pub first_char: u32,
    /// `Widths` entry in glyph space (thousandths of text space).
    pub widths: Vec<f32>,
}

impl BackendFontInfo {
    /// Width of a single-byte glyph in glyph-space units, if the font
    /// declares one.
    pub fn glyph_width(&self, code: u8) -> Option<f32> {
        let idx = (code as u32).checked_sub(self.first_char)? as usize;
        self.widths.get(idx).copied()
    }

    /// Whether the font uses two-byte character codes.
    pub fn is_two_byte(&self) -> bool {
        self.encoding
            .as_deref()
            .is_some_and(|e| e.contains("Identity"))
    }
}

/// A content-stream operand, detached from lopdf so the text-state machine
/// can be driven by plain data in tests.
#[derive(Debug, Clone, PartialEq)]
pub enum PdfValue {
    Integer(i64),
    Real(f32),
    Name(Vec<u8>),
    Str(Vec<u8>),
    Array(Vec<PdfValue>),
    /// Booleans, nulls, inline dictionaries: nothing text extraction reads.
    Other,
}

/// A single content-stream operation (operator + operands).
#[derive(Debug, Clone)]
pub struct ContentOp {
    pub operator: String,
    pub operands: Vec<PdfValue>,
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Read a number out of a [`PdfValue`], accepting both `Integer` and `Real`.
pub fn get_number_from_value(val: &PdfValue) -> Option<f32> {
    match val {
        PdfValue::Integer(i) => Some(*i as f32),
        PdfValue::Real(f) => Some(*f),
        _ => None,
    }
}

/// Convert a content-stream operand.
pub fn convert_object(obj: &lopdf::Object) -> PdfValue {
    match obj {
        lopdf::Object::Integer(i) => PdfValue::Integer(*i),
        lopdf::Object::Real(f) => PdfValue::Real(*f),
        lopdf::Object::Name(n) => PdfValue::Name(n.clone()),
        lopdf::Object::String(s, _) => PdfValue::Str(s.clone()),
        lopdf::Object::Array(arr) => PdfValue::Array(arr.iter().map(convert_object).collect()),
        _ => PdfValue::Other,
    }
}

/// Best-effort decoding of PDF string bytes.
///
/// UTF-16BE with a BOM first, then UTF-8, then Latin-1 so that every byte
/// still maps to exactly one character.
pub fn decode_text_simple(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let code_units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16_lossy(&code_units);
    }

    if let Ok(s) = std::str::from_utf8(bytes) {
        return s.to_string();
    }

    bytes.iter().map(|&b| b as char).collect()
}

// ---------------------------------------------------------------------------
// PdfBackend trait
// ---------------------------------------------------------------------------

/// The operations word extraction needs from a PDF parser.
///
/// Kept as a trait so the content-stream walker can be tested against a
/// mock that serves pre-decoded operators.
pub trait PdfBackend {
    /// 1-based page number -> [`PageId`].
    fn pages(&self) -> BTreeMap<u32, PageId>;

    fn page_fonts(&self, page: PageId) -> Result<Vec<BackendFontInfo>, PdfError>;

    /// Raw (decompressed) content stream bytes of a page.
    fn page_content(&self, page: PageId) -> Result<Vec<u8>, PdfError>;

    fn decode_content(&self, data: &[u8]) -> Result<Vec<ContentOp>, PdfError>;

    /// Decode the operand of a text-showing operator for the given font.
    fn decode_text(&self, font: Option<&BackendFontInfo>, bytes: &[u8]) -> String;

    /// Page height in user space, used to flip coordinates to a top-left
    /// origin.
    fn page_height(&self, page: PageId) -> f32;
}

// ---------------------------------------------------------------------------
// LopdfBackend
// ---------------------------------------------------------------------------

/// [`PdfBackend`] over an in-memory [`lopdf::Document`].
pub struct LopdfBackend {
    doc: lopdf::Document,
}

impl LopdfBackend {
    /// Parse a PDF from bytes.  Encrypted documents are rejected.
    pub fn load_bytes(data: &[u8]) -> Result<Self, PdfError> {
        let doc = lopdf::Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        if doc.is_encrypted() {
            return Err(PdfError::Encrypted);
        }

        Ok(Self { doc })
    }

    pub fn page_count(&self) -> usize {
        self.doc.get_pages().len()
    }

    /// `(width, height)` of a page from its (possibly inherited) MediaBox.
    pub fn page_dimensions(&self, page: PageId) -> Result<(f32, f32), PdfError> {
        let page_dict = self
            .doc
            .get_object(page)
            .and_then(|obj| obj.as_dict())
            .map_err(|e| PdfError::Parse(format!("cannot get page dictionary: {}", e)))?;

        let media_box = self
            .find_media_box(page_dict)
            .ok_or_else(|| PdfError::Parse("MediaBox not found for page".into()))?;

        let nums = self.array_to_f32s(&media_box)?;
        if nums.len() < 4 {
            return Err(PdfError::Parse(format!(
                "MediaBox has {} elements, expected 4",
                nums.len()
            )));
        }

        Ok((nums[2] - nums[0], nums[3] - nums[1]))
    }

    // -- private helpers ----------------------------------------------------

    /// Walk up the page tree until a MediaBox is found.
    fn find_media_box(&self, dict: &lopdf::Dictionary) -> Option<Vec<lopdf::Object>> {
        if let Some(arr) = dict.get(b"MediaBox").ok().and_then(|o| self.resolve_array(o)) {
            return Some(arr);
        }

        let parent_id = dict.get(b"Parent").ok()?.as_reference().ok()?;
        let parent = self.doc.get_object(parent_id).ok()?.as_dict().ok()?;
        self.find_media_box(parent)
    }

    /// Resolve an object to an array, following one level of indirection.
    fn resolve_array(&self, obj: &lopdf::Object) -> Option<Vec<lopdf::Object>> {
        match self.resolve(obj) {
            lopdf::Object::Array(arr) => Some(arr.clone()),
            _ => None,
        }
    }

    fn resolve<'a>(&'a self, obj: &'a lopdf::Object) -> &'a lopdf::Object {
        match obj {
            lopdf::Object::Reference(id) => self.doc.get_object(*id).unwrap_or(obj),
            other => other,
        }
    }

    fn array_to_f32s(&self, objects: &[lopdf::Object]) -> Result<Vec<f32>, PdfError> {
        objects
            .iter()
            .map(|obj| match self.resolve(obj) {
                lopdf::Object::Integer(i) => Ok(*i as f32),
                lopdf::Object::Real(f) => Ok(*f),
                other => Err(PdfError::Parse(format!(
                    "expected number in array, got {:?}",
                    other
                ))),
            })
            .collect()
    }

    fn name_entry(&self, dict: &lopdf::Dictionary, key: &[u8]) -> Option<String> {
        match self.resolve(dict.get(key).ok()?) {
            lopdf::Object::Name(n) => Some(String::from_utf8_lossy(n).into_owned()),
            _ => None,
        }
    }

    /// `Widths` may be inline or an indirect array; malformed entries are
    /// treated as missing so the caller falls back to estimated widths.
    fn widths_entry(&self, dict: &lopdf::Dictionary) -> Vec<f32> {
        dict.get(b"Widths")
            .ok()
            .and_then(|o| self.resolve_array(o))
            .and_then(|arr| self.array_to_f32s(&arr).ok())
            .unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// PdfBackend implementation for LopdfBackend
// ---------------------------------------------------------------------------

impl PdfBackend for LopdfBackend {
    fn pages(&self) -> BTreeMap<u32, PageId> {
        self.doc.get_pages()
    }

    fn page_fonts(&self, page: PageId) -> Result<Vec<BackendFontInfo>, PdfError> {
        let fonts_map = self
            .doc
            .get_page_fonts(page)
            .map_err(|e| PdfError::Parse(format!("cannot get page fonts: {}", e)))?;

        Ok(fonts_map
            .iter()
            .map(|(name, dict)| BackendFontInfo {
                name: name.clone(),
                base_font: self.name_entry(dict, b"BaseFont"),
                encoding: self.name_entry(dict, b"Encoding"),
                first_char: dict
                    .get(b"FirstChar")
                    .ok()
                    .and_then(|o| o.as_i64().ok())
                    .and_then(|v| u32::try_from(v).ok())
                    .unwrap_or(0),
                widths: self.widths_entry(dict),
            })
            .collect())
    }

    fn page_content(&self, page: PageId) -> Result<Vec<u8>, PdfError> {
        self.doc
            .get_page_content(page)
            .map_err(|e| PdfError::Parse(format!("cannot get page content: {}", e)))
    }

    fn decode_content(&self, data: &[u8]) -> Result<Vec<ContentOp>, PdfError> {
        let content = Content::decode(data)
            .map_err(|e| PdfError::Parse(format!("content stream decode error: {}", e)))?;

        Ok(content
            .operations
            .into_iter()
            .map(|op| ContentOp {
                operator: op.operator,
                operands: op.operands.iter().map(convert_object).collect(),
            })
            .collect())
    }

    fn decode_text(&self, font: Option<&BackendFontInfo>, bytes: &[u8]) -> String {
        // Identity-encoded CID fonts usually carry Unicode-ish 2-byte codes.
        if font.is_some_and(|f| f.is_two_byte()) && bytes.len() >= 2 && bytes.len() % 2 == 0 {
            let code_units: Vec<u16> = bytes
                .chunks_exact(2)
                .map(|c| u16::from_be_bytes([c[0], c[1]]))
                .collect();
            let decoded = String::from_utf16_lossy(&code_units);
            if !decoded.chars().all(|c| c == '\u{FFFD}' || c == '\0') {
                return decoded;
            }
        }

        decode_text_simple(bytes)
    }

    fn page_height(&self, page: PageId) -> f32 {
        match self.page_dimensions(page) {
            Ok((_, height)) if height > 0.0 => height,
            Ok(_) | Err(_) => {
                log::warn!(
                    "page {:?} has no usable MediaBox; assuming height {}",
                    page,
                    DEFAULT_PAGE_HEIGHT
                );
                DEFAULT_PAGE_HEIGHT
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
