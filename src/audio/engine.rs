//! Output engines that render a decoded [`PlaybackBuffer`].

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::pcm::PlaybackBuffer;

/// Something that can accept a decoded buffer and start rendering it.
///
/// Engine failures (no device, device busy, ...) are reported as-is; the
/// playback controller passes them through without reinterpreting them.
#[async_trait]
pub trait PlaybackEngine: Send + Sync {
    fn name(&self) -> &str;

    /// Hand `buffer` to the output. Resolves once the output has accepted it.
    async fn start(&self, buffer: PlaybackBuffer) -> anyhow::Result<Box<dyn ActiveStream>>;
}

/// Handle to a buffer that is currently being rendered.
#[async_trait]
pub trait ActiveStream: Send {
    /// Stop rendering. Calling it more than once is harmless.
    fn stop(&mut self);

    fn is_finished(&self) -> bool;

    /// Resolves when the stream ends, naturally or through [`ActiveStream::stop`].
    async fn finished(&mut self);
}

/// Completion flag shared between a rendering worker and its stream handle.
pub(crate) fn completion_channel() -> (watch::Sender<bool>, watch::Receiver<bool>) {
    watch::channel(false)
}

pub(crate) async fn wait_completion(rx: &mut watch::Receiver<bool>) {
    // A dropped sender means the worker is gone, which also counts as done.
    let _ = rx.wait_for(|done| *done).await;
}

/// Engine without an audio device: keeps time for the buffer's duration.
///
/// Used on hosts built without the `alsa` feature, and in tests.
#[derive(Debug, Default, Clone)]
pub struct NullEngine;

#[async_trait]
impl PlaybackEngine for NullEngine {
    fn name(&self) -> &str {
        "null"
    }

    async fn start(&self, buffer: PlaybackBuffer) -> anyhow::Result<Box<dyn ActiveStream>> {
        let duration = buffer.duration();
        let (done_tx, done_rx) = completion_channel();
        log::debug!(
            "NullEngine: {} frames @ {}Hz ({:?})",
            buffer.frame_count(),
            buffer.sample_rate,
            duration
        );
        let timer = tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            let _ = done_tx.send(true);
        });
        Ok(Box::new(TimedStream {
            timer,
            done: done_rx,
            stopped: false,
        }))
    }
}

struct TimedStream {
    timer: JoinHandle<()>,
    done: watch::Receiver<bool>,
    stopped: bool,
}

#[async_trait]
impl ActiveStream for TimedStream {
    fn stop(&mut self) {
        self.stopped = true;
        self.timer.abort();
    }

    fn is_finished(&self) -> bool {
        self.stopped || *self.done.borrow()
    }

    async fn finished(&mut self) {
        if self.stopped {
            return;
        }
        wait_completion(&mut self.done).await;
    }
}

impl Drop for TimedStream {
    fn drop(&mut self) {
        self.timer.abort();
    }
}
