//! Raw 16-bit PCM -> normalized float frames for the playback engines.

use std::time::Duration;

use crate::error::AudioError;

/// Bytes per signed 16-bit sample.
pub const BYTES_PER_SAMPLE: usize = 2;

/// Divisor mapping the i16 range onto [-1.0, 1.0).
const I16_SCALE: f32 = 32768.0;

/// Decoded audio, one sample vector per channel.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackBuffer {
    pub sample_rate: u32,
    pub channels: Vec<Vec<f32>>,
}

impl PlaybackBuffer {
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Frames per channel. All channels have the same length.
    pub fn frame_count(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.frame_count() == 0
    }

    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.frame_count() as f64 / self.sample_rate as f64)
    }

    /// Re-interleave the frames as i16 samples, the layout ALSA expects.
    pub fn to_interleaved_i16(&self) -> Vec<i16> {
        let channels = self.channel_count();
        let frames = self.frame_count();
        let mut out = Vec::with_capacity(frames * channels);
        for i in 0..frames {
            for ch in &self.channels {
                let scaled = (ch[i] * I16_SCALE).round();
                out.push(scaled.clamp(i16::MIN as f32, i16::MAX as f32) as i16);
            }
        }
        out
    }
}

/// Split interleaved little-endian i16 PCM into normalized per-channel frames.
///
/// A trailing partial frame (odd byte, or fewer samples than `channel_count`)
/// is dropped. Empty input produces an empty buffer; callers that need audio
/// decide whether that is acceptable.
pub fn decode_for_playback(
    bytes: &[u8],
    sample_rate: u32,
    channel_count: usize,
) -> Result<PlaybackBuffer, AudioError> {
    if sample_rate == 0 {
        return Err(AudioError::InvalidParameter(
            "sample rate must be greater than 0".to_string(),
        ));
    }
    if channel_count == 0 {
        return Err(AudioError::InvalidParameter(
            "channel count must be at least 1".to_string(),
        ));
    }

    let frame_count = bytes.len() / BYTES_PER_SAMPLE / channel_count;
    let frame_bytes = BYTES_PER_SAMPLE * channel_count;

    let mut channels: Vec<Vec<f32>> = (0..channel_count)
        .map(|_| Vec::with_capacity(frame_count))
        .collect();

    for frame in bytes.chunks_exact(frame_bytes).take(frame_count) {
        for (ch, sample) in frame.chunks_exact(BYTES_PER_SAMPLE).enumerate() {
            let value = i16::from_le_bytes([sample[0], sample[1]]);
            channels[ch].push(value as f32 / I16_SCALE);
        }
    }

    Ok(PlaybackBuffer {
        sample_rate,
        channels,
    })
}

/// [`decode_for_playback`] on the blocking pool, so the calling task keeps
/// servicing its own events while large payloads are converted.
pub async fn decode_for_playback_async(
    bytes: Vec<u8>,
    sample_rate: u32,
    channel_count: usize,
) -> Result<Result<PlaybackBuffer, AudioError>, tokio::task::JoinError> {
    tokio::task::spawn_blocking(move || decode_for_playback(&bytes, sample_rate, channel_count))
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_mono_samples() {
        let buf = decode_for_playback(&[0x00, 0x00, 0x00, 0x80], 24000, 1).unwrap();
        assert_eq!(buf.channels, vec![vec![0.0, -1.0]]);
        assert_eq!(buf.sample_rate, 24000);
    }

    #[test]
    fn max_positive_stays_below_one() {
        let buf = decode_for_playback(&[0xff, 0x7f], 24000, 1).unwrap();
        let v = buf.channels[0][0];
        assert!(v < 1.0);
        assert!((v - 32767.0 / 32768.0).abs() < f32::EPSILON);
    }

    #[test]
    fn drops_trailing_odd_byte() {
        let buf = decode_for_playback(&[0, 0, 0, 0x40, 0x12], 24000, 1).unwrap();
        assert_eq!(buf.frame_count(), 2);
        assert_eq!(buf.channels[0], vec![0.0, 0.5]);
    }

    #[test]
    fn deinterleaves_stereo_and_drops_partial_frame() {
        // L0=0, R0=16384, L1=-16384, R1=0, then a lone left sample
        let bytes = [0x00, 0x00, 0x00, 0x40, 0x00, 0xc0, 0x00, 0x00, 0xff, 0x7f];
        let buf = decode_for_playback(&bytes, 48000, 2).unwrap();
        assert_eq!(buf.channel_count(), 2);
        assert_eq!(buf.frame_count(), 2);
        assert_eq!(buf.channels[0], vec![0.0, -0.5]);
        assert_eq!(buf.channels[1], vec![0.5, 0.0]);
    }

    #[test]
    fn empty_input_is_empty_buffer() {
        let buf = decode_for_playback(&[], 24000, 1).unwrap();
        assert!(buf.is_empty());
        assert_eq!(buf.channel_count(), 1);
        assert_eq!(buf.duration(), Duration::ZERO);
    }

    #[test]
    fn rejects_zero_rate_or_channels() {
        assert!(matches!(
            decode_for_playback(&[0, 0], 0, 1),
            Err(AudioError::InvalidParameter(_))
        ));
        assert!(matches!(
            decode_for_playback(&[0, 0], 24000, 0),
            Err(AudioError::InvalidParameter(_))
        ));
    }

    #[test]
    fn duration_follows_sample_rate() {
        let bytes = vec![0u8; 24000 * 2];
        let buf = decode_for_playback(&bytes, 24000, 1).unwrap();
        assert_eq!(buf.duration(), Duration::from_secs(1));
    }

    #[test]
    fn interleaves_back_to_original_samples() {
        let samples: [i16; 6] = [0, 1, -1, i16::MAX, i16::MIN, 1234];
        let bytes: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
        let buf = decode_for_playback(&bytes, 24000, 2).unwrap();
        assert_eq!(buf.to_interleaved_i16(), samples.to_vec());
    }

    #[tokio::test]
    async fn async_decode_matches_sync() {
        let bytes = vec![0x00, 0x00, 0x00, 0x80];
        let buf = decode_for_playback_async(bytes, 24000, 1)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(buf.channels[0], vec![0.0, -1.0]);
    }
}
