use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// Default chunk size for batch synthesis
pub const DEFAULT_CHUNK_LENGTH: usize = 350;

static TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*\S+").expect("token pattern is valid"));

/// A bounded slice of the input text, sized for one synthesis call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextChunk {
    pub sequence_index: usize,
    pub content: String,
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Decide whether the whitespace following `before` ends a sentence.
///
/// `before` is the text up to and including the punctuation mark. Abbreviations
/// such as "Mr." or "e.g." and initials like "J." do not end a sentence.
fn is_sentence_end(before: &[char]) -> bool {
    let n = before.len();
    let Some(&last) = before.last() else {
        return false;
    };
    if !matches!(last, '.' | '!' | '?') {
        return false;
    }
    if last != '.' {
        return true;
    }

    // "Mr." / "Dr." style: capital, lowercase, dot
    if n >= 3 && before[n - 3].is_uppercase() && before[n - 2].is_lowercase() {
        return false;
    }
    // "e.g." / "U.S." style: word char, dot, word char, dot
    if n >= 4
        && before[n - 4].is_alphanumeric()
        && before[n - 3] == '.'
        && before[n - 2].is_alphanumeric()
    {
        return false;
    }
    // Single letter initial: "J. Smith"
    if n >= 2 && before[n - 2].is_alphabetic() && (n == 2 || before[n - 3].is_whitespace()) {
        return false;
    }
    true
}

/// Split text into trimmed sentences on `.`, `!` or `?` followed by whitespace.
pub fn split_sentences(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < chars.len() {
        if chars[i].is_whitespace() && i > start && is_sentence_end(&chars[start..i]) {
            let sentence: String = chars[start..i].iter().collect();
            let sentence = sentence.trim();
            if !sentence.is_empty() {
                sentences.push(sentence.to_string());
            }
            while i < chars.len() && chars[i].is_whitespace() {
                i += 1;
            }
            start = i;
            continue;
        }
        i += 1;
    }

    let rest: String = chars[start..].iter().collect();
    let rest = rest.trim();
    if !rest.is_empty() {
        sentences.push(rest.to_string());
    }
    sentences
}

/// Greedily pack `pieces` into strings no longer than `max_length`, joining
/// with single spaces. A piece longer than `max_length` on its own is
/// emitted as-is.
fn pack(pieces: impl IntoIterator<Item = String>, max_length: usize, out: &mut Vec<String>) {
    let mut current = String::new();
    for piece in pieces {
        if current.is_empty() {
            current = piece;
        } else if char_len(&current) + char_len(&piece) + 1 <= max_length {
            current.push(' ');
            current.push_str(&piece);
        } else {
            out.push(std::mem::replace(&mut current, piece));
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
}

/// Split text into chunks of at most `max_length` characters along sentence
/// boundaries.
///
/// Sentences are packed greedily. A sentence that is longer than `max_length`
/// by itself is split on word boundaries instead, so only a single word longer
/// than `max_length` can produce an oversized chunk.
pub fn chunk_by_length(text: &str, max_length: usize) -> Vec<TextChunk> {
    let max_length = max_length.max(1);
    let mut pieces = Vec::new();

    for sentence in split_sentences(text) {
        if char_len(&sentence) <= max_length {
            pieces.push(sentence);
        } else {
            let mut words = Vec::new();
            pack(
                sentence.split_whitespace().map(str::to_string),
                max_length,
                &mut words,
            );
            pieces.extend(words);
        }
    }

    let mut packed = Vec::new();
    pack(pieces, max_length, &mut packed);

    packed
        .into_iter()
        .filter(|content| !content.trim().is_empty())
        .enumerate()
        .map(|(sequence_index, content)| TextChunk {
            sequence_index,
            content,
        })
        .collect()
}

/// Split text into streaming tokens: each token is one word with the
/// whitespace that precedes it, so concatenating the tokens yields the input.
///
/// Trailing whitespace is attached to the final token. Whitespace-only input
/// becomes a single token.
pub fn tokenize(text: &str) -> Vec<&str> {
    let mut tokens: Vec<&str> = TOKEN.find_iter(text).map(|m| m.as_str()).collect();

    let consumed: usize = tokens.iter().map(|t| t.len()).sum();
    if consumed < text.len() {
        match tokens.pop() {
            Some(last) => {
                let start = consumed - last.len();
                tokens.push(&text[start..]);
            }
            None => tokens.push(text),
        }
    }
    tokens
}

/// Rough synthesis time: `max(minimum_ms, words * ms_per_word)`. Text with
/// no words still costs one.
pub fn estimate_processing_time(text: &str, ms_per_word: u64, minimum_ms: u64) -> u64 {
    let words = text.split_whitespace().count().max(1) as u64;
    minimum_ms.max(words * ms_per_word)
}
