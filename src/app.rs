use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::audio::{PlaybackController, WAV_MIME_TYPE};
use crate::catalog::{self, Language};
use crate::connectivity::{NetworkProbe, NetworkStatus};
use crate::error::{AppError, ConfigError};
use crate::gemini::{StoryGenerator, StoryRequest};
use crate::store::StoryStore;
use crate::story::Story;

/// Ties the provider, the library and the audio core together.
pub struct StoryApp {
    generator: Option<Arc<dyn StoryGenerator>>,
    probe: Arc<dyn NetworkProbe>,
    store: StoryStore,
    sample_rate: u32,
}

impl StoryApp {
    /// An app that can browse, play and export the library. Generation
    /// additionally needs [`StoryApp::with_generator`].
    pub fn new(store: StoryStore, probe: Arc<dyn NetworkProbe>, sample_rate: u32) -> Self {
        Self {
            generator: None,
            probe,
            store,
            sample_rate,
        }
    }

    pub fn with_generator(mut self, generator: Arc<dyn StoryGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    pub async fn network_status(&self) -> NetworkStatus {
        self.probe.status().await
    }

    /// Generate a story for `prompt`, narrated by `persona_id`, and save it.
    ///
    /// Unknown persona ids fall back to the first persona.
    pub async fn generate(
        &self,
        prompt: &str,
        persona_id: &str,
        language: Language,
    ) -> Result<Story, AppError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(AppError::EmptyPrompt);
        }
        let generator = self
            .generator
            .as_ref()
            .ok_or(AppError::Config(ConfigError::MissingApiKey))?;
        if !self.network_status().await.is_online() {
            return Err(AppError::Offline);
        }

        let persona = catalog::persona_or_default(persona_id);
        let request = StoryRequest {
            prompt: prompt.to_string(),
            voice: persona.voice,
            tone: persona.tone.to_string(),
            language,
        };

        let generated = generator.generate(&request).await.map_err(|e| {
            log::error!("Story generation failed: {}", e);
            AppError::Generation {
                message: language.generation_failed_message().to_string(),
                source: e,
            }
        })?;

        let story = Story::new(
            prompt,
            generated.content,
            generated.audio_base64,
            persona,
            language,
        );
        self.store.upsert(&story).await?;
        log::info!("Story {} saved ({})", story.id, story.title);
        Ok(story)
    }

    pub async fn list(&self) -> Result<Vec<Story>, AppError> {
        Ok(self.store.list().await?)
    }

    pub async fn get(&self, id: &str) -> Result<Story, AppError> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound(id.to_string()))
    }

    pub async fn delete(&self, id: &str) -> Result<(), AppError> {
        if self.store.delete(id).await? {
            Ok(())
        } else {
            Err(AppError::NotFound(id.to_string()))
        }
    }

    /// Write the story's audio as a WAV file into `dir`, returning its path.
    pub async fn export_wav(&self, id: &str, dir: &Path) -> Result<PathBuf, AppError> {
        let story = self.get(id).await?;
        let wav = story
            .to_wav(self.sample_rate)
            .ok_or_else(|| AppError::NoAudio(id.to_string()))??;

        tokio::fs::create_dir_all(dir).await.map_err(AppError::Export)?;
        let path = dir.join(story.wav_file_name());
        tokio::fs::write(&path, &wav).await.map_err(AppError::Export)?;
        log::info!("Exported {} ({}, {} bytes)", path.display(), WAV_MIME_TYPE, wav.len());
        Ok(path)
    }

    /// Start playing the story's audio on `player`.
    pub async fn play(&self, id: &str, player: &mut PlaybackController) -> Result<Story, AppError> {
        let story = self.get(id).await?;
        let payload = story
            .audio_base64
            .as_deref()
            .filter(|a| !a.is_empty())
            .ok_or_else(|| AppError::NoAudio(id.to_string()))?;
        player.play(&story.id, payload).await?;
        Ok(story)
    }
}
