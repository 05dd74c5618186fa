pub mod engine_manager;
pub mod kokoro_engine;
pub mod sentence_stream;
pub mod synthesis_engine;
pub mod token_feed;

pub use engine_manager::{EngineFactory, EngineManager, EngineSettings};
pub use kokoro_engine::{voice_info_from_id, KokoroEngine, KokoroEngineFactory};
pub use sentence_stream::{sentence_stream, SentenceSplitter};
pub use synthesis_engine::{Audio, AudioChunk, AudioStream, EngineError, SynthesisEngine, VoiceInfo};
pub use token_feed::{token_feed, TokenFeed, TokenSource};
