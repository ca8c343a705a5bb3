//! Online/offline detection. Generation needs the provider; saved stories don't.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::catalog::Language;
use crate::config::Config;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkStatus {
    Online,
    Offline,
}

impl NetworkStatus {
    pub fn is_online(self) -> bool {
        self == NetworkStatus::Online
    }

    /// Banner text for the status line.
    pub fn banner(self, lang: Language) -> &'static str {
        match self {
            NetworkStatus::Online => match lang {
                Language::Hi => "ऑनलाइन",
                Language::En => "Online",
            },
            NetworkStatus::Offline => lang.offline_message(),
        }
    }
}

#[async_trait]
pub trait NetworkProbe: Send + Sync {
    async fn status(&self) -> NetworkStatus;
}

/// A fixed status, for forced offline mode and tests.
#[async_trait]
impl NetworkProbe for NetworkStatus {
    async fn status(&self) -> NetworkStatus {
        *self
    }
}

/// Probes reachability with a `HEAD` request. Any HTTP answer counts as online.
pub struct Connectivity {
    http: Client,
    url: String,
}

impl Connectivity {
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.connectivity_timeout_secs))
            .build()?;
        Ok(Self {
            http,
            url: config.connectivity_url.clone(),
        })
    }
}

#[async_trait]
impl NetworkProbe for Connectivity {
    async fn status(&self) -> NetworkStatus {
        match self.http.head(&self.url).send().await {
            Ok(resp) => {
                log::debug!("Connectivity probe {} -> {}", self.url, resp.status());
                NetworkStatus::Online
            }
            Err(e) => {
                log::warn!("Connectivity probe failed: {}", e);
                NetworkStatus::Offline
            }
        }
    }
}
