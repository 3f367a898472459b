use unicode_normalization::UnicodeNormalization;

const LIGATURES: [(char, &str); 5] = [
    ('\u{FB00}', "ff"),
    ('\u{FB01}', "fi"),
    ('\u{FB02}', "fl"),
    ('\u{FB03}', "ffi"),
    ('\u{FB04}', "ffl"),
];

/// Normalise the text of one extracted word.
///
/// NFC-composes, expands Latin ligatures, and drops U+FFFD left behind by
/// undecodable glyphs and NUL padding from two-byte strings.
pub fn clean_token_text(text: &str) -> String {
    let mut result = String::with_capacity(text.len());

    for ch in text.nfc() {
        match LIGATURES.iter().find(|(lig, _)| *lig == ch) {
            Some((_, expanded)) => result.push_str(expanded),
            None if ch == '\u{FFFD}' || ch == '\0' => {}
            None => result.push(ch),
        }
    }

    result
}
