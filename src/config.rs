use std::fmt;
use std::path::{Path, PathBuf};

use config::{Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use crate::audio::DEFAULT_SAMPLE_RATE;
use crate::catalog::Language;
use crate::error::ConfigError;

pub const DEFAULT_CONFIG_FILE: &str = "fablespeak.toml";
pub const ENV_PREFIX: &str = "FABLESPEAK";
/// Highest PCM rate accepted from configuration.
pub const MAX_SAMPLE_RATE: u32 = 384_000;

/// Runtime configuration, loaded once in `main` and handed to every component.
#[derive(Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct Config {
    // 远端模型服务
    pub api_key: String,
    pub api_base_url: String,
    pub text_model: String,
    pub tts_model: String,
    pub request_timeout_secs: u64,

    // 网络状态探测
    pub connectivity_url: String,
    pub connectivity_timeout_secs: u64,

    // 本地存储
    pub store_path: PathBuf,
    pub export_dir: PathBuf,

    // 默认选择
    pub default_persona: String,
    pub default_language: Language,

    /// Sample rate of provider speech; it carries no header of its own.
    pub sample_rate: u32,
    pub playback: PlaybackConfig,
}

/// Output device settings, used by the ALSA engine.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct PlaybackConfig {
    /// ALSA playback device name (e.g. "default", "plughw:0,0")
    pub device: String,
    /// Desired device channel count; mono audio is duplicated onto extra channels
    pub channels: u32,
    /// Desired ALSA period size (0 = let ALSA decide)
    pub period_size: usize,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            device: "default".to_string(),
            channels: 2,
            period_size: 1024,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base_url: "https://generativelanguage.googleapis.com".to_string(),
            text_model: "gemini-3-flash-preview".to_string(),
            tts_model: "gemini-2.5-flash-preview-tts".to_string(),
            request_timeout_secs: 120,
            connectivity_url: "https://generativelanguage.googleapis.com".to_string(),
            connectivity_timeout_secs: 3,
            store_path: PathBuf::from("fablespeak_stories.json"),
            export_dir: PathBuf::from("."),
            default_persona: "kabira".to_string(),
            default_language: Language::Hi,
            sample_rate: DEFAULT_SAMPLE_RATE,
            playback: PlaybackConfig::default(),
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &if self.api_key.is_empty() { "<unset>" } else { "<redacted>" })
            .field("api_base_url", &self.api_base_url)
            .field("text_model", &self.text_model)
            .field("tts_model", &self.tts_model)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("connectivity_url", &self.connectivity_url)
            .field("connectivity_timeout_secs", &self.connectivity_timeout_secs)
            .field("store_path", &self.store_path)
            .field("export_dir", &self.export_dir)
            .field("default_persona", &self.default_persona)
            .field("default_language", &self.default_language)
            .field("sample_rate", &self.sample_rate)
            .field("playback", &self.playback)
            .finish()
    }
}

impl Config {
    /// Load from an optional TOML file layered under `FABLESPEAK_*` variables.
    ///
    /// An explicit `path` must exist; without one, `fablespeak.toml` in the
    /// working directory is used when present. Nested keys use `__` in
    /// variable names, e.g. `FABLESPEAK_PLAYBACK__DEVICE`.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(p) => File::from(p).format(FileFormat::Toml).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE)
                .format(FileFormat::Toml)
                .required(false),
        };
        Self::from_sources(file, Environment::with_prefix(ENV_PREFIX))
    }

    fn from_sources<S>(file: S, env: Environment) -> Result<Self, ConfigError>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let config: Config = config::Config::builder()
            .add_source(file)
            .add_source(
                env.prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_rate == 0 || self.sample_rate > MAX_SAMPLE_RATE {
            return Err(ConfigError::Invalid(format!(
                "sample_rate must be between 1 and {}",
                MAX_SAMPLE_RATE
            )));
        }
        if self.playback.channels == 0 {
            return Err(ConfigError::Invalid(
                "playback.channels must be at least 1".to_string(),
            ));
        }
        url::Url::parse(&self.api_base_url)
            .map_err(|e| ConfigError::Invalid(format!("api_base_url: {}", e)))?;
        Ok(())
    }

    /// The provider key. Only commands that talk to the provider need it.
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        let key = self.api_key.trim();
        if key.is_empty() {
            Err(ConfigError::MissingApiKey)
        } else {
            Ok(key)
        }
    }

    /// Default configuration as TOML, for `fablespeak init-config`.
    pub fn default_toml() -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(&Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn load_with_env(path: &Path, vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_sources(
            File::from(path).format(FileFormat::Toml).required(true),
            Environment::with_prefix(ENV_PREFIX).source(Some(vars)),
        )
    }

    fn write_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn file_values_override_defaults() {
        let file = write_file(
            r#"
api_key = "k-123"
sample_rate = 16000

[playback]
device = "plughw:0,0"
"#,
        );
        let config = load_with_env(file.path(), &[]).unwrap();
        assert_eq!(config.require_api_key().unwrap(), "k-123");
        assert_eq!(config.sample_rate, 16000);
        assert_eq!(config.playback.device, "plughw:0,0");
        assert_eq!(config.playback.channels, 2);
        assert_eq!(config.text_model, "gemini-3-flash-preview");
    }

    #[test]
    fn environment_overrides_file() {
        let file = write_file("api_key = \"from-file\"\n");
        let config = load_with_env(
            file.path(),
            &[
                ("FABLESPEAK_API_KEY", "from-env"),
                ("FABLESPEAK_PLAYBACK__CHANNELS", "1"),
            ],
        )
        .unwrap();
        assert_eq!(config.api_key, "from-env");
        assert_eq!(config.playback.channels, 1);
    }

    #[test]
    fn missing_api_key_is_reported() {
        let file = write_file("");
        let config = load_with_env(file.path(), &[]).unwrap();
        assert!(matches!(config.require_api_key(), Err(ConfigError::MissingApiKey)));
    }

    #[test]
    fn zero_sample_rate_is_invalid() {
        let file = write_file("sample_rate = 0\n");
        assert!(matches!(
            load_with_env(file.path(), &[]),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn oversized_sample_rate_is_invalid() {
        let file = write_file("sample_rate = 500000\n");
        assert!(matches!(
            load_with_env(file.path(), &[]),
            Err(ConfigError::Invalid(_))
        ));
        let file = write_file("sample_rate = 384000\n");
        assert_eq!(load_with_env(file.path(), &[]).unwrap().sample_rate, MAX_SAMPLE_RATE);
    }

    #[test]
    fn debug_lists_timeouts() {
        let printed = format!("{:?}", Config::default());
        assert!(printed.contains("connectivity_timeout_secs: 3"));
        assert!(printed.contains("request_timeout_secs: 120"));
    }

    #[test]
    fn debug_never_prints_key() {
        let config = Config {
            api_key: "secret-value".to_string(),
            ..Config::default()
        };
        let printed = format!("{:?}", config);
        assert!(!printed.contains("secret-value"));
        assert!(printed.contains("<redacted>"));
    }

    #[test]
    fn default_toml_parses_back() {
        let text = Config::default_toml().unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.sample_rate, DEFAULT_SAMPLE_RATE);
        assert_eq!(parsed.default_language, Language::Hi);
    }
}
