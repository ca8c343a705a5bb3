//! audio - Payload codec, PCM/WAV transcoding and playback
//!
//! Provider speech arrives as base64 text of raw 16-bit PCM. It is decoded
//! to bytes, then either normalized into per-channel float frames for a
//! [`PlaybackEngine`] or framed as a WAV file for export.

#[cfg(feature = "alsa")]
mod alsa_device;
#[cfg(feature = "alsa")]
mod alsa_engine;
pub mod base64_codec;
pub mod engine;
pub mod pcm;
pub mod player;
pub mod wav;

#[cfg(feature = "alsa")]
pub use alsa_engine::AlsaEngine;
pub use engine::{ActiveStream, NullEngine, PlaybackEngine};
pub use pcm::{PlaybackBuffer, decode_for_playback, decode_for_playback_async};
pub use player::{PlaybackController, PlaybackSession, PlaybackState};
pub use wav::{DEFAULT_SAMPLE_RATE, WAV_MIME_TYPE, encode_as_wav, wav_file_name};
