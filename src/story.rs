use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::audio::{base64_codec, encode_as_wav, wav_file_name};
use crate::catalog::{Language, NarratorPersona, VoiceName};
use crate::error::AudioError;

/// Longest title taken verbatim from a prompt, in characters.
pub const TITLE_MAX_CHARS: usize = 30;

/// A generated story as kept in the local library.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Story {
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_base64: Option<String>,
    pub voice: VoiceName,
    pub tone: String,
    pub language: Language,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

impl Story {
    pub fn new(
        prompt: &str,
        content: String,
        audio_base64: Option<String>,
        persona: &NarratorPersona,
        language: Language,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: title_from_prompt(prompt),
            content,
            audio_base64,
            voice: persona.voice,
            tone: persona.tone.to_string(),
            language,
            timestamp: Utc::now().timestamp_millis(),
        }
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp)
    }

    pub fn has_audio(&self) -> bool {
        self.audio_base64.as_deref().is_some_and(|a| !a.is_empty())
    }

    /// One-line description shown under the title.
    pub fn byline(&self) -> String {
        match self.language {
            Language::Hi => format!("{} • स्वर: {}", self.voice, self.tone),
            Language::En => format!("Narrated by {} • Tone: {}", self.voice, self.tone),
        }
    }

    pub fn wav_file_name(&self) -> String {
        wav_file_name(&self.title)
    }

    /// Stored audio as a WAV file, or `None` when the story has no audio.
    pub fn to_wav(&self, sample_rate: u32) -> Option<Result<bytes::Bytes, AudioError>> {
        let payload = self.audio_base64.as_deref().filter(|a| !a.is_empty())?;
        Some(base64_codec::decode(payload).map(|pcm| encode_as_wav(&pcm, sample_rate)))
    }
}

/// Prompts longer than [`TITLE_MAX_CHARS`] are cut and suffixed with `...`.
pub fn title_from_prompt(prompt: &str) -> String {
    if prompt.chars().count() > TITLE_MAX_CHARS {
        let mut title: String = prompt.chars().take(TITLE_MAX_CHARS).collect();
        title.push_str("...");
        title
    } else {
        prompt.to_string()
    }
}
