use serde::Serialize;

/// Size of the canonical PCM WAV header
pub const WAV_HEADER_SIZE: usize = 44;

const CHUNK_SIZE_OFFSET: usize = 4;
const DATA_SIZE_OFFSET: usize = 40;

/// Largest payload a canonical header can describe (`ChunkSize` is `36 + data`)
pub const MAX_DATA_SIZE: u32 = u32::MAX - 36;

/// Format and size fields read from a canonical 44-byte WAV header
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WavInfo {
    pub file_size: u32,
    pub audio_format: u16,
    pub num_channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
    pub data_size: u32,
    /// Duration in seconds (`data_size / byte_rate`)
    pub duration: f64,
}

impl WavInfo {
    /// True when both headers describe the same sample layout
    pub fn same_format(&self, other: &WavInfo) -> bool {
        self.audio_format == other.audio_format
            && self.num_channels == other.num_channels
            && self.sample_rate == other.sample_rate
            && self.bits_per_sample == other.bits_per_sample
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum CodecError {
    #[error("buffer {index} is not a valid WAV file")]
    InvalidBuffer { index: usize },
    #[error("buffer {index} format differs from the first buffer")]
    FormatMismatch { index: usize },
    #[error("payload of {data_size} bytes exceeds the WAV size limit")]
    TooLarge { data_size: u64 },
    #[error("unsupported format: {sample_rate} Hz, {channels} channels, {bits_per_sample} bits")]
    UnsupportedFormat {
        sample_rate: u32,
        channels: u16,
        bits_per_sample: u16,
    },
}

fn read_u16(buffer: &[u8], offset: usize) -> Option<u16> {
    let bytes = buffer.get(offset..offset + 2)?;
    Some(u16::from_le_bytes([bytes[0], bytes[1]]))
}

fn read_u32(buffer: &[u8], offset: usize) -> Option<u32> {
    let bytes = buffer.get(offset..offset + 4)?;
    Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

fn write_u32(buffer: &mut [u8], offset: usize, value: u32) {
    buffer[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

/// Check the RIFF/WAVE magic of a buffer. Never panics on short input.
pub fn is_valid_wav(buffer: &[u8]) -> bool {
    buffer.len() >= WAV_HEADER_SIZE && &buffer[0..4] == b"RIFF" && &buffer[8..12] == b"WAVE"
}

/// Parse the header fields of a WAV buffer, or `None` if it is not one.
pub fn parse_header(buffer: &[u8]) -> Option<WavInfo> {
    if !is_valid_wav(buffer) {
        return None;
    }

    let byte_rate = read_u32(buffer, 28)?;
    let data_size = read_u32(buffer, DATA_SIZE_OFFSET)?;
    let duration = if byte_rate == 0 {
        0.0
    } else {
        data_size as f64 / byte_rate as f64
    };

    Some(WavInfo {
        file_size: read_u32(buffer, CHUNK_SIZE_OFFSET)?.saturating_add(8),
        audio_format: read_u16(buffer, 20)?,
        num_channels: read_u16(buffer, 22)?,
        sample_rate: read_u32(buffer, 24)?,
        byte_rate,
        block_align: read_u16(buffer, 32)?,
        bits_per_sample: read_u16(buffer, 34)?,
        data_size,
        duration,
    })
}

/// Duration in seconds of a WAV buffer, `None` if the buffer is invalid
pub fn estimate_duration(buffer: &[u8]) -> Option<f64> {
    parse_header(buffer).map(|info| info.duration)
}

/// PCM payload of a buffer (everything after the canonical header)
pub fn payload(buffer: &[u8]) -> &[u8] {
    buffer.get(WAV_HEADER_SIZE..).unwrap_or(&[])
}

/// Checked payload size for a header, rejecting anything over [`MAX_DATA_SIZE`]
fn data_size_field(data_size: u64) -> Result<u32, CodecError> {
    u32::try_from(data_size)
        .ok()
        .filter(|size| *size <= MAX_DATA_SIZE)
        .ok_or(CodecError::TooLarge { data_size })
}

/// Build a canonical PCM header for `data_size` bytes of samples.
///
/// Fails when the payload is too large for the 32-bit size fields or when
/// the block align or byte rate overflow their fields.
pub fn build_header(
    sample_rate: u32,
    channels: u16,
    bits_per_sample: u16,
    data_size: u64,
) -> Result<[u8; WAV_HEADER_SIZE], CodecError> {
    let unsupported = || CodecError::UnsupportedFormat {
        sample_rate,
        channels,
        bits_per_sample,
    };
    let block_align = channels
        .checked_mul(bits_per_sample / 8)
        .ok_or_else(unsupported)?;
    let byte_rate = sample_rate
        .checked_mul(block_align as u32)
        .ok_or_else(unsupported)?;
    let data_size = data_size_field(data_size)?;

    let mut header = [0u8; WAV_HEADER_SIZE];
    header[0..4].copy_from_slice(b"RIFF");
    write_u32(&mut header, CHUNK_SIZE_OFFSET, 36 + data_size);
    header[8..12].copy_from_slice(b"WAVE");
    header[12..16].copy_from_slice(b"fmt ");
    write_u32(&mut header, 16, 16);
    header[20..22].copy_from_slice(&1u16.to_le_bytes());
    header[22..24].copy_from_slice(&channels.to_le_bytes());
    write_u32(&mut header, 24, sample_rate);
    write_u32(&mut header, 28, byte_rate);
    header[32..34].copy_from_slice(&block_align.to_le_bytes());
    header[34..36].copy_from_slice(&bits_per_sample.to_le_bytes());
    header[36..40].copy_from_slice(b"data");
    write_u32(&mut header, DATA_SIZE_OFFSET, data_size);
    Ok(header)
}

/// Merge WAV buffers into one file.
///
/// The payloads are concatenated in input order under a copy of the first
/// buffer's header with `ChunkSize` and `Subchunk2Size` rewritten. Samples are
/// never re-encoded. Formats are not enforced: a buffer whose format differs
/// from the first is merged anyway and logged; use [`merge_checked`] to reject
/// it instead. Past [`MAX_DATA_SIZE`] the size fields saturate.
pub fn merge(mut buffers: Vec<Vec<u8>>) -> Vec<u8> {
    match buffers.len() {
        0 => return Vec::new(),
        1 => return buffers.remove(0),
        _ => {}
    }

    let first_info = parse_header(&buffers[0]);
    for (index, buffer) in buffers.iter().enumerate().skip(1) {
        let info = parse_header(buffer);
        if let (Some(first), Some(info)) = (first_info.as_ref(), info.as_ref()) {
            if !first.same_format(info) {
                tracing::warn!(
                    buffer_index = index,
                    expected_sample_rate = first.sample_rate,
                    sample_rate = info.sample_rate,
                    expected_channels = first.num_channels,
                    channels = info.num_channels,
                    "Merging WAV buffers with mismatched formats"
                );
            }
        } else if buffer.len() < WAV_HEADER_SIZE {
            tracing::warn!(
                buffer_index = index,
                buffer_len = buffer.len(),
                "WAV buffer shorter than header, contributes no samples"
            );
        }
    }

    let total_data_length: usize = buffers.iter().map(|b| payload(b).len()).sum();
    let data_size = saturated_data_size(total_data_length as u64);

    let mut header = match buffers[0].get(..WAV_HEADER_SIZE) {
        Some(bytes) => {
            let mut header = [0u8; WAV_HEADER_SIZE];
            header.copy_from_slice(bytes);
            header
        }
        None => build_header(24_000, 1, 16, 0).unwrap_or([0u8; WAV_HEADER_SIZE]),
    };
    write_u32(&mut header, CHUNK_SIZE_OFFSET, 36 + data_size);
    write_u32(&mut header, DATA_SIZE_OFFSET, data_size);

    let mut merged = Vec::with_capacity(WAV_HEADER_SIZE + total_data_length);
    merged.extend_from_slice(&header);
    for buffer in &buffers {
        merged.extend_from_slice(payload(buffer));
    }
    merged
}

/// `data_size` clamped to [`MAX_DATA_SIZE`]
fn saturated_data_size(data_size: u64) -> u32 {
    data_size_field(data_size).unwrap_or_else(|_| {
        tracing::error!(
            data_size,
            max = MAX_DATA_SIZE,
            "Merged WAV payload too large for its header, size fields saturated"
        );
        MAX_DATA_SIZE
    })
}

/// Like [`merge`], but every buffer must be a valid WAV sharing the first
/// buffer's format, and the merged payload must fit the header.
pub fn merge_checked(buffers: Vec<Vec<u8>>) -> Result<Vec<u8>, CodecError> {
    let total: u64 = buffers.iter().map(|b| payload(b).len() as u64).sum();
    data_size_field(total)?;

    let mut first: Option<WavInfo> = None;
    for (index, buffer) in buffers.iter().enumerate() {
        let info = parse_header(buffer).ok_or(CodecError::InvalidBuffer { index })?;
        match &first {
            None => first = Some(info),
            Some(first) if !first.same_format(&info) => {
                return Err(CodecError::FormatMismatch { index })
            }
            Some(_) => {}
        }
    }
    Ok(merge(buffers))
}

/// Build a WAV buffer of zeroed samples. Fails if the header cannot describe
/// the payload.
pub fn synthesize_silence(
    duration_seconds: f64,
    sample_rate: u32,
    channels: u16,
    bits_per_sample: u16,
) -> Result<Vec<u8>, CodecError> {
    let bytes_per_second =
        sample_rate as f64 * channels as f64 * (bits_per_sample as f64 / 8.0);
    let data_size = (duration_seconds.max(0.0) * bytes_per_second).floor() as u64;
    let header = build_header(sample_rate, channels, bits_per_sample, data_size)?;

    let total = WAV_HEADER_SIZE + data_size as usize;
    let mut buffer = Vec::with_capacity(total);
    buffer.extend_from_slice(&header);
    buffer.resize(total, 0);
    Ok(buffer)
}

/// [`synthesize_silence`] with the defaults (44.1kHz, mono, 16-bit)
pub fn silence(duration_seconds: f64) -> Result<Vec<u8>, CodecError> {
    synthesize_silence(duration_seconds, 44_100, 1, 16)
}
