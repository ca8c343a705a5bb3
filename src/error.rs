use thiserror::Error;

/// Errors raised by the base64 / PCM / WAV audio core.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AudioError {
    /// Payload is not valid base64, or its bytes do not form the expected PCM layout.
    #[error("malformed audio payload: {0}")]
    MalformedPayload(String),
    #[error("invalid audio parameter: {0}")]
    InvalidParameter(String),
}

/// Errors from the remote story/speech provider.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("request to provider failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("provider returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("invalid provider url: {0}")]
    Url(#[from] url::ParseError),
    #[error("unexpected provider response: {0}")]
    Decode(String),
}

/// Errors from the on-disk story store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("story store io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("story store is corrupt: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
    #[error("api_key is not set (add it to the config file or set FABLESPEAK_API_KEY)")]
    MissingApiKey,
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Errors surfaced by the playback controller.
#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error(transparent)]
    Audio(#[from] AudioError),
    /// Output device failures, passed through untouched.
    #[error(transparent)]
    Engine(anyhow::Error),
    #[error("decode task aborted: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Top level error for [`crate::app::StoryApp`] operations.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("prompt is empty")]
    EmptyPrompt,
    #[error("offline: connect to the internet to generate stories")]
    Offline,
    #[error("{message}")]
    Generation {
        /// Localized text meant for the user.
        message: String,
        #[source]
        source: GenerationError,
    },
    #[error("story {0} not found")]
    NotFound(String),
    #[error("story {0} has no audio")]
    NoAudio(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Audio(#[from] AudioError),
    #[error(transparent)]
    Playback(#[from] PlaybackError),
    #[error("failed to write export: {0}")]
    Export(#[source] std::io::Error),
}
