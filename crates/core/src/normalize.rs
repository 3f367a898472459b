use std::sync::OnceLock;

use regex::Regex;

/// Minimum run length at which a repeated ASCII letter is treated as a
/// rendering artifact.
const STUTTER_RUN: usize = 3;

/// Normalise line text.
///
/// Collapses stuttered letters first, then whitespace.  The order matters:
/// stutter collapse never joins whitespace-separated words, so the result is
/// stable under a second application.
pub fn clean(text: &str) -> String {
    collapse_whitespace(&collapse_stutter(text))
}

/// Collapse any run of three or more identical ASCII letters into a single
/// occurrence (`"SSSales"` -> `"Sales"`).  Digits, punctuation and non-ASCII
/// characters are left alone regardless of run length.
pub fn collapse_stutter(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        let mut run = 1;
        while chars.peek() == Some(&c) {
            chars.next();
            run += 1;
        }

        if c.is_ascii_alphabetic() && run >= STUTTER_RUN {
            out.push(c);
        } else {
            out.extend(std::iter::repeat(c).take(run));
        }
    }

    out
}

/// Replace every whitespace run with a single space and trim both ends.
pub fn collapse_whitespace(text: &str) -> String {
    static RE_SPACES: OnceLock<Regex> = OnceLock::new();
    let re_spaces = RE_SPACES.get_or_init(|| Regex::new(r"\s+").unwrap());
    re_spaces.replace_all(text, " ").trim().to_string()
}
