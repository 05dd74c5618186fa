pub mod audio;
pub mod shared;
pub mod stream;
pub mod text;
pub mod tts;
