//! Where presence documents come from.

use super::error::{MonitorError, Result};
use super::presence::PresenceDocument;
use crate::config::Config;
use reqwest::StatusCode;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use tracing::debug;

pub trait PresenceSource: Send + Sync {
    fn fetch<'a>(
        &'a self,
        url: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<PresenceDocument>> + Send + 'a>>;
}

/// HTTP source backed by a pooled `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::Client,
}

impl HttpSource {
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| MonitorError::Network {
                url: config.api_base_url.clone(),
                message: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self { client })
    }
}

impl PresenceSource for HttpSource {
    fn fetch<'a>(
        &'a self,
        url: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<PresenceDocument>> + Send + 'a>> {
        Box::pin(async move {
            let network = |e: reqwest::Error| MonitorError::Network {
                url: url.to_string(),
                message: e.to_string(),
            };

            debug!(url, "GET");
            let resp = self.client.get(url).send().await.map_err(network)?;
            let status = resp.status();
            if status == StatusCode::NOT_FOUND {
                return Err(MonitorError::NotFound(url.to_string()));
            }
            if !status.is_success() {
                return Err(MonitorError::Network {
                    url: url.to_string(),
                    message: format!("HTTP {status}"),
                });
            }

            let body = resp.bytes().await.map_err(network)?;
            serde_json::from_slice(&body)
                .map_err(|e| MonitorError::MalformedData(format!("{url}: {e}")))
        })
    }
}
