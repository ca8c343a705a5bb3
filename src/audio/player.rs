//! Per-story playback controller.
//!
//! States: `Idle -> Loading -> Playing -> Idle`. The active stream lives in a
//! [`PlaybackSession`] owned by the controller; stopping (or natural end)
//! consumes the session and releases the stream.

use std::sync::Arc;
use std::time::Instant;

use super::base64_codec;
use super::engine::{ActiveStream, PlaybackEngine};
use super::pcm;
use crate::error::{AudioError, PlaybackError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Loading,
    Playing,
}

/// One active rendering of a story's audio.
pub struct PlaybackSession {
    story_id: String,
    stream: Box<dyn ActiveStream>,
    started_at: Instant,
}

impl PlaybackSession {
    pub fn story_id(&self) -> &str {
        &self.story_id
    }

    fn stop(mut self) {
        self.stream.stop();
        log::info!(
            "Stopped playback of {} after {:?}",
            self.story_id,
            self.started_at.elapsed()
        );
    }
}

pub struct PlaybackController {
    engine: Arc<dyn PlaybackEngine>,
    sample_rate: u32,
    channel_count: usize,
    state: PlaybackState,
    session: Option<PlaybackSession>,
}

impl PlaybackController {
    pub fn new(engine: Arc<dyn PlaybackEngine>, sample_rate: u32, channel_count: usize) -> Self {
        Self {
            engine,
            sample_rate,
            channel_count,
            state: PlaybackState::Idle,
            session: None,
        }
    }

    /// Current state. A stream that ended on its own is reaped here.
    pub fn state(&mut self) -> PlaybackState {
        self.reap_finished();
        self.state
    }

    pub fn active_story(&self) -> Option<&str> {
        self.session.as_ref().map(PlaybackSession::story_id)
    }

    /// Decode `payload` and start playing it.
    ///
    /// An already active session is stopped first. On any failure the
    /// controller is left `Idle` and the error is returned unchanged.
    pub async fn play(&mut self, story_id: &str, payload: &str) -> Result<(), PlaybackError> {
        if let Some(previous) = self.session.take() {
            log::info!(
                "Play requested for {} while {} is active, stopping it",
                story_id,
                previous.story_id()
            );
            previous.stop();
        }

        self.state = PlaybackState::Loading;
        match self.load(payload).await {
            Ok(stream) => {
                self.session = Some(PlaybackSession {
                    story_id: story_id.to_string(),
                    stream,
                    started_at: Instant::now(),
                });
                self.state = PlaybackState::Playing;
                log::info!("Playing {} on {}", story_id, self.engine.name());
                Ok(())
            }
            Err(e) => {
                self.state = PlaybackState::Idle;
                log::error!("Playback failed for {}: {}", story_id, e);
                Err(e)
            }
        }
    }

    async fn load(&self, payload: &str) -> Result<Box<dyn ActiveStream>, PlaybackError> {
        let bytes = base64_codec::decode(payload)?;
        let buffer =
            pcm::decode_for_playback_async(bytes, self.sample_rate, self.channel_count).await??;
        if buffer.is_empty() {
            return Err(AudioError::MalformedPayload(
                "payload holds no complete audio frame".to_string(),
            )
            .into());
        }
        self.engine
            .start(buffer)
            .await
            .map_err(PlaybackError::Engine)
    }

    /// Stop the active session. Returns false when nothing was playing.
    pub fn stop(&mut self) -> bool {
        self.state = PlaybackState::Idle;
        match self.session.take() {
            Some(session) => {
                session.stop();
                true
            }
            None => false,
        }
    }

    /// Wait for the active session to end, then release it.
    pub async fn wait(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.stream.finished().await;
        }
        self.session = None;
        self.state = PlaybackState::Idle;
    }

    fn reap_finished(&mut self) {
        let finished = self
            .session
            .as_ref()
            .is_some_and(|s| s.stream.is_finished());
        if finished {
            if let Some(session) = self.session.take() {
                log::info!(
                    "Playback of {} ended after {:?}",
                    session.story_id,
                    session.started_at.elapsed()
                );
            }
            self.state = PlaybackState::Idle;
        }
    }
}

impl Drop for PlaybackController {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            session.stop();
        }
    }
}
