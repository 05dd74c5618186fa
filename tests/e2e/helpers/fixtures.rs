use kokoro_speak::domain::text::{chunk_by_length, normalize};

/// Sentences long enough to give one chunk each at `chunk_max_length = 40`
pub const THREE_SENTENCES: &str =
    "First sentence is right here. Second one follows it now. Third closes the text.";

/// Prose of roughly `sentences * 45` characters
pub fn long_text(sentences: usize) -> String {
    (0..sentences)
        .map(|i| format!("This is sentence number {} of the long text.", i + 1))
        .collect::<Vec<_>>()
        .join(" ")
}

/// The chunk contents batch synthesis will send for `text`
pub fn expected_chunks(text: &str, max_length: usize) -> Vec<String> {
    chunk_by_length(&normalize(text), max_length)
        .into_iter()
        .map(|chunk| chunk.content)
        .collect()
}
