use once_cell::sync::Lazy;
use regex::Regex;

static WHITESPACE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

fn map_char(c: char) -> Option<&'static str> {
    let mapped = match c {
        // Smart single quotes, primes and modifier apostrophes
        '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}' | '\u{2032}' | '\u{02BC}'
        | '\u{FF07}' => "'",
        // Smart double quotes
        '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{201F}' | '\u{2033}' | '\u{FF02}' => "\"",
        // Figure, en, em and horizontal-bar dashes
        '\u{2012}' | '\u{2013}' | '\u{2014}' | '\u{2015}' => "-",
        '\u{2026}' => "...",
        // Non-breaking and typographic spaces
        '\u{00A0}' | '\u{1680}' | '\u{2000}'..='\u{200A}' | '\u{202F}' | '\u{205F}'
        | '\u{3000}' => " ",
        // Zero-width characters and the byte order mark
        '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{2060}' | '\u{FEFF}' => "",
        // The engine drops audio around semicolons
        ';' | '\u{FF1B}' => ",",
        '\t' | '\r' | '\n' | '\u{000B}' | '\u{000C}' | '\u{0085}' | '\u{2028}' | '\u{2029}' => {
            " "
        }
        _ => return None,
    };
    Some(mapped)
}

/// Rewrite text into the ASCII-safe form the synthesis engine handles.
///
/// Smart quotes, dashes, ellipses and exotic spaces become their ASCII
/// counterparts, zero-width characters are dropped, semicolons become commas
/// and every whitespace run collapses to a single space. The result is
/// trimmed, and `normalize(normalize(s)) == normalize(s)`.
pub fn normalize(text: &str) -> String {
    let mut mapped = String::with_capacity(text.len());
    for c in text.chars() {
        match map_char(c) {
            Some(replacement) => mapped.push_str(replacement),
            None => mapped.push(c),
        }
    }

    WHITESPACE_RUN
        .replace_all(&mapped, " ")
        .trim()
        .to_string()
}
