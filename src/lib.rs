//! fablespeak - narrated short stories from a generative AI provider,
//! kept in a local library for offline playback and WAV export.

pub mod app;
pub mod audio;
pub mod catalog;
pub mod config;
pub mod connectivity;
pub mod error;
pub mod gemini;
pub mod store;
pub mod story;

pub use crate::app::StoryApp;
pub use crate::config::Config;
pub use crate::error::{AppError, AudioError};
