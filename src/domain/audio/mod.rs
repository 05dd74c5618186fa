pub mod wav;

pub use wav::{
    build_header, estimate_duration, is_valid_wav, merge, merge_checked, parse_header, payload,
    silence, synthesize_silence, CodecError, WavInfo, MAX_DATA_SIZE, WAV_HEADER_SIZE,
};
