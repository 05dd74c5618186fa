use kokoro_speak::domain::audio::{parse_header, payload, WAV_HEADER_SIZE};
use kokoro_speak::domain::shared::SynthesisEvent;
use pretty_assertions::assert_eq;
use std::path::Path;

use super::engine_mocks::{pcm_for, MOCK_SAMPLE_RATE};

/// The file is a WAV whose samples are exactly the mock PCM for `texts`, in order
pub fn assert_wav_spells(path: &Path, texts: &[String]) {
    let wav = std::fs::read(path).expect("output file should exist");
    let expected: Vec<u8> = texts.iter().flat_map(|t| pcm_for(t)).collect();

    let info = parse_header(&wav).expect("output should be a valid WAV");
    assert_eq!(info.data_size as usize, expected.len());
    assert_eq!(info.sample_rate, MOCK_SAMPLE_RATE);
    assert_eq!(wav.len(), WAV_HEADER_SIZE + expected.len());
    assert_eq!(
        String::from_utf8_lossy(payload(&wav)),
        String::from_utf8_lossy(&expected)
    );
}

/// Read the file with hound and return how many samples it holds
pub fn assert_readable_by_hound(path: &Path) -> usize {
    let mut reader = hound::WavReader::open(path).expect("hound should open the WAV");
    let format = reader.spec();
    assert_eq!(format.channels, 1);
    assert_eq!(format.bits_per_sample, 16);
    assert_eq!(format.sample_format, hound::SampleFormat::Int);

    let samples: Result<Vec<i16>, _> = reader.samples::<i16>().collect();
    samples.expect("all samples should decode").len()
}

pub fn chunk_ready_count(events: &[SynthesisEvent]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, SynthesisEvent::ChunkReady { .. }))
        .count()
}

pub fn has_complete(events: &[SynthesisEvent]) -> bool {
    events
        .iter()
        .any(|e| matches!(e, SynthesisEvent::Complete { .. }))
}
