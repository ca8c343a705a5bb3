//! [`PlaybackEngine`] backed by an ALSA playback device.
//!
//! Rendering runs on a dedicated OS thread (not a tokio task) so blocking
//! `writei` calls never stall the async runtime.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::{oneshot, watch};

use super::alsa_device;
use super::engine::{ActiveStream, PlaybackEngine, completion_channel, wait_completion};
use super::pcm::PlaybackBuffer;
use crate::config::PlaybackConfig;

/// Consecutive failed writes tolerated before the rest of a buffer is dropped.
const MAX_RECOVERY_RETRIES: u32 = 3;

pub struct AlsaEngine {
    config: PlaybackConfig,
}

impl AlsaEngine {
    pub fn new(config: PlaybackConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl PlaybackEngine for AlsaEngine {
    fn name(&self) -> &str {
        "alsa"
    }

    async fn start(&self, buffer: PlaybackBuffer) -> Result<Box<dyn ActiveStream>> {
        let running = Arc::new(AtomicBool::new(true));
        let (ready_tx, ready_rx) = oneshot::channel::<Result<()>>();
        let (done_tx, done_rx) = completion_channel();

        {
            let running = running.clone();
            let config = self.config.clone();
            thread::Builder::new()
                .name("audio-play".into())
                .spawn(move || {
                    if let Err(e) = play_thread(&config, &buffer, &running, ready_tx) {
                        log::error!("Playback thread error: {}", e);
                    }
                    let _ = done_tx.send(true);
                })?;
        }

        // The device either opened and took the buffer, or the error comes back here.
        ready_rx
            .await
            .map_err(|_| anyhow::anyhow!("playback thread exited before opening the device"))??;

        Ok(Box::new(AlsaStream {
            running,
            done: done_rx,
        }))
    }
}

struct AlsaStream {
    running: Arc<AtomicBool>,
    done: watch::Receiver<bool>,
}

#[async_trait]
impl ActiveStream for AlsaStream {
    fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
    }

    fn is_finished(&self) -> bool {
        *self.done.borrow()
    }

    async fn finished(&mut self) {
        wait_completion(&mut self.done).await;
    }
}

impl Drop for AlsaStream {
    fn drop(&mut self) {
        // The thread sees the flag at its next period and exits on its own.
        self.running.store(false, Ordering::SeqCst);
    }
}

/// Spread the buffer's channels over the device's channel count.
/// Extra device channels repeat the last source channel (mono -> both speakers).
fn interleave_for_device(buffer: &PlaybackBuffer, device_channels: usize) -> Vec<i16> {
    let samples = buffer.to_interleaved_i16();
    let src_channels = buffer.channel_count();
    if src_channels == device_channels || src_channels == 0 {
        return samples;
    }
    let frames = buffer.frame_count();
    let mut out = Vec::with_capacity(frames * device_channels);
    for frame in samples.chunks_exact(src_channels) {
        for dc in 0..device_channels {
            out.push(frame[dc.min(src_channels - 1)]);
        }
    }
    out
}

fn play_thread(
    config: &PlaybackConfig,
    buffer: &PlaybackBuffer,
    running: &AtomicBool,
    ready: oneshot::Sender<Result<()>>,
) -> Result<()> {
    let period_size_opt = if config.period_size > 0 {
        Some(config.period_size)
    } else {
        None
    };
    let opened = alsa_device::open_playback(
        &config.device,
        buffer.sample_rate,
        config.channels,
        period_size_opt,
    );
    let (pcm, params) = match opened {
        Ok(v) => v,
        Err(e) => {
            let _ = ready.send(Err(e));
            return Ok(());
        }
    };

    if params.sample_rate != buffer.sample_rate {
        log::warn!(
            "Device negotiated {}Hz for a {}Hz buffer, pitch will be off",
            params.sample_rate,
            buffer.sample_rate
        );
    }

    let io = match pcm.io_i16() {
        Ok(io) => io,
        Err(e) => {
            let _ = ready.send(Err(e.into()));
            return Ok(());
        }
    };
    let _ = ready.send(Ok(()));

    let channels = params.channels as usize;
    let pcm_data = interleave_for_device(buffer, channels);
    let total_frames = pcm_data.len() / channels;
    let chunk_frames = params.period_size.max(1);

    log::info!(
        "Playback started: {} frames, rate={}, ch={}",
        total_frames,
        params.sample_rate,
        channels
    );

    let mut frames_written = 0;
    let mut retry_count = 0u32;
    while frames_written < total_frames && running.load(Ordering::Relaxed) {
        let offset = frames_written * channels;
        let end = (frames_written + chunk_frames).min(total_frames) * channels;
        match io.writei(&pcm_data[offset..end]) {
            Ok(n) => {
                frames_written += n;
                retry_count = 0;
            }
            Err(e) => {
                log::warn!("ALSA XRUN or error: {}, recovering...", e);
                retry_count += 1;
                if let Err(e2) = pcm.prepare() {
                    log::error!("Failed to recover PCM playback: {}", e2);
                    break;
                }
                if retry_count >= MAX_RECOVERY_RETRIES {
                    log::error!(
                        "Max recovery retries ({}) reached. Dropping {} unwritten frames.",
                        retry_count,
                        total_frames - frames_written
                    );
                    break;
                }
            }
        }
    }

    if running.load(Ordering::Relaxed) {
        pcm.drain()?;
        log::info!("Playback finished");
    } else {
        pcm.drop()?;
        log::info!("Playback stopped");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mono_is_duplicated_onto_stereo_device() {
        let buffer = PlaybackBuffer {
            sample_rate: 24000,
            channels: vec![vec![0.0, 0.5]],
        };
        assert_eq!(interleave_for_device(&buffer, 2), vec![0, 0, 16384, 16384]);
    }

    #[test]
    fn matching_layout_is_untouched() {
        let buffer = PlaybackBuffer {
            sample_rate: 24000,
            channels: vec![vec![0.0, -0.5], vec![0.5, 0.0]],
        };
        assert_eq!(interleave_for_device(&buffer, 2), vec![0, 16384, -16384, 0]);
    }
}
