//! Canonical 44-byte WAV framing for exported stories.

use bytes::{BufMut, Bytes, BytesMut};

/// Provider speech output is 24 kHz mono.
pub const DEFAULT_SAMPLE_RATE: u32 = 24000;
pub const WAV_HEADER_LEN: usize = 44;
pub const WAV_MIME_TYPE: &str = "audio/wav";

const NUM_CHANNELS: u16 = 1;
const BITS_PER_SAMPLE: u16 = 16;
const BLOCK_ALIGN: u16 = NUM_CHANNELS * BITS_PER_SAMPLE / 8;
const FILE_SUFFIX: &str = "_fablespeak.wav";

/// Wrap raw mono 16-bit PCM in a RIFF/WAVE container. The body is copied untouched.
///
/// Header fields that do not fit in 32 bits are clamped to `u32::MAX`.
pub fn encode_as_wav(pcm: &[u8], sample_rate: u32) -> Bytes {
    let data_len = u32::try_from(pcm.len()).unwrap_or(u32::MAX);
    let byte_rate = sample_rate.saturating_mul(BLOCK_ALIGN as u32);

    let mut buf = BytesMut::with_capacity(WAV_HEADER_LEN + pcm.len());

    // RIFF header
    buf.put_slice(b"RIFF");
    buf.put_u32_le(data_len.saturating_add(36));
    buf.put_slice(b"WAVE");

    // fmt chunk
    buf.put_slice(b"fmt ");
    buf.put_u32_le(16);
    buf.put_u16_le(1); // PCM
    buf.put_u16_le(NUM_CHANNELS);
    buf.put_u32_le(sample_rate);
    buf.put_u32_le(byte_rate);
    buf.put_u16_le(BLOCK_ALIGN);
    buf.put_u16_le(BITS_PER_SAMPLE);

    // data chunk
    buf.put_slice(b"data");
    buf.put_u32_le(data_len);
    buf.put_slice(pcm);

    buf.freeze()
}

/// Export file name for a story title: each whitespace run becomes one `_`.
pub fn wav_file_name(title: &str) -> String {
    let mut name = String::with_capacity(title.len() + FILE_SUFFIX.len());
    let mut in_space = false;
    for c in title.chars() {
        if c.is_whitespace() {
            if !in_space {
                name.push('_');
            }
            in_space = true;
        } else {
            name.push(c);
            in_space = false;
        }
    }
    name.push_str(FILE_SUFFIX);
    name
}
