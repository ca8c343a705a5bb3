//! Two-phase story generation against a `generateContent` style API:
//! first the story text, then a spoken rendition of it.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::catalog::{Language, VoiceName};
use crate::config::Config;
use crate::error::GenerationError;

/// Used when the text model answers with no text at all.
pub const FALLBACK_STORY: &str = "Once upon a time...";

#[derive(Debug, Clone)]
pub struct StoryRequest {
    pub prompt: String,
    pub voice: VoiceName,
    pub tone: String,
    pub language: Language,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedStory {
    pub content: String,
    /// Base64 raw PCM (16-bit mono, 24 kHz). Absent when the speech model returned no audio.
    pub audio_base64: Option<String>,
}

#[async_trait]
pub trait StoryGenerator: Send + Sync {
    async fn generate(&self, request: &StoryRequest) -> Result<GeneratedStory, GenerationError>;
}

// ---- wire format ----

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig<'a>>,
}

#[derive(Serialize, Debug)]
struct Content<'a> {
    parts: Vec<TextPart<'a>>,
}

#[derive(Serialize, Debug)]
struct TextPart<'a> {
    text: &'a str,
}

impl<'a> Content<'a> {
    fn text(text: &'a str) -> Self {
        Self {
            parts: vec![TextPart { text }],
        }
    }
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    response_modalities: Vec<&'static str>,
    speech_config: SpeechConfig<'a>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct SpeechConfig<'a> {
    voice_config: VoiceConfig<'a>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct VoiceConfig<'a> {
    prebuilt_voice_config: PrebuiltVoiceConfig<'a>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct PrebuiltVoiceConfig<'a> {
    voice_name: &'a str,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize, Debug)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Deserialize, Debug)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct ResponsePart {
    text: Option<String>,
    inline_data: Option<InlineData>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    #[allow(dead_code)]
    mime_type: Option<String>,
    data: String,
}

impl GenerateContentResponse {
    fn first_parts(&self) -> &[ResponsePart] {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|c| c.parts.as_slice())
            .unwrap_or(&[])
    }

    /// Text parts of the first candidate, joined.
    fn text(&self) -> Option<String> {
        let text: String = self
            .first_parts()
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        if text.trim().is_empty() { None } else { Some(text) }
    }

    fn audio_data(&self) -> Option<String> {
        self.first_parts()
            .first()
            .and_then(|p| p.inline_data.as_ref())
            .map(|d| d.data.clone())
            .filter(|d| !d.is_empty())
    }
}

fn text_request<'a>(prompt: &'a str, instruction: &'a str) -> GenerateContentRequest<'a> {
    GenerateContentRequest {
        contents: vec![Content::text(prompt)],
        system_instruction: Some(Content::text(instruction)),
        generation_config: None,
    }
}

fn speech_request<'a>(tts_prompt: &'a str, voice: VoiceName) -> GenerateContentRequest<'a> {
    GenerateContentRequest {
        contents: vec![Content::text(tts_prompt)],
        system_instruction: None,
        generation_config: Some(GenerationConfig {
            response_modalities: vec!["AUDIO"],
            speech_config: SpeechConfig {
                voice_config: VoiceConfig {
                    prebuilt_voice_config: PrebuiltVoiceConfig {
                        voice_name: voice.as_str(),
                    },
                },
            },
        }),
    }
}

/// Tone is injected into the speech prompt, the speech model has no tone setting.
pub fn speech_prompt(tone: &str, story: &str) -> String {
    format!("Speak in a {} tone: {}", tone, story)
}

pub struct GeminiClient {
    http: Client,
    base_url: Url,
    api_key: String,
    text_model: String,
    tts_model: String,
}

impl GeminiClient {
    /// `api_key` is passed explicitly; the client never reads the environment.
    pub fn new(api_key: impl Into<String>, config: &Config) -> Result<Self, GenerationError> {
        let mut base = config.api_base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: Url::parse(&base)?,
            api_key: api_key.into(),
            text_model: config.text_model.clone(),
            tts_model: config.tts_model.clone(),
        })
    }

    fn endpoint(&self, model: &str) -> Result<Url, GenerationError> {
        Ok(self
            .base_url
            .join(&format!("v1beta/models/{}:generateContent", model))?)
    }

    async fn generate_content(
        &self,
        model: &str,
        body: &GenerateContentRequest<'_>,
    ) -> Result<GenerateContentResponse, GenerationError> {
        let url = self.endpoint(model)?;
        log::debug!("POST {}", url);

        let resp = self
            .http
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(GenerationError::Status { status, body: text });
        }
        serde_json::from_str(&text).map_err(|e| GenerationError::Decode(e.to_string()))
    }
}

#[async_trait]
impl StoryGenerator for GeminiClient {
    async fn generate(&self, request: &StoryRequest) -> Result<GeneratedStory, GenerationError> {
        log::info!(
            "Generating story with {} (lang={}, voice={}, tone={})",
            self.text_model,
            request.language,
            request.voice,
            request.tone
        );
        let instruction = request.language.system_instruction();
        let text_resp = self
            .generate_content(&self.text_model, &text_request(&request.prompt, &instruction))
            .await?;
        let content = text_resp.text().unwrap_or_else(|| {
            log::warn!("Text model returned no text, using fallback opening");
            FALLBACK_STORY.to_string()
        });

        log::info!("Synthesizing speech with {}", self.tts_model);
        let tts_prompt = speech_prompt(&request.tone, &content);
        let tts_resp = self
            .generate_content(&self.tts_model, &speech_request(&tts_prompt, request.voice))
            .await?;
        let audio_base64 = tts_resp.audio_data();
        if audio_base64.is_none() {
            log::warn!("Speech model returned no audio");
        }

        Ok(GeneratedStory {
            content,
            audio_base64,
        })
    }
}
