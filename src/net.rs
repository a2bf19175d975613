use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::redirect::Policy;
use reqwest::StatusCode;
use tracing::debug;
use url::Url;

use crate::config::Settings;
use crate::error::ScrapeError;

const MAX_REDIRECTS: usize = 10;

/// Network seam for the pipeline. Implementations only ever see on-host URLs.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// GET the body of `url`; non-success statuses are errors.
    async fn get(&self, url: &str) -> Result<String>;

    /// Existence probe: true only for a 200 response.
    async fn exists(&self, url: &str) -> bool;
}

/// Parse `url` and check that it lives on `host`.
pub fn ensure_on_host(url: &str, host: &str) -> Result<Url> {
    let parsed = Url::parse(url).with_context(|| format!("Invalid URL {}", url))?;
    if parsed.host_str() != Some(host) {
        bail!(ScrapeError::OffHost {
            url: url.to_string(),
            allowed: host.to_string(),
        });
    }
    Ok(parsed)
}

pub struct HttpFetcher {
    client: reqwest::Client,
    host: String,
}

impl HttpFetcher {
    pub fn new(settings: &Settings) -> Result<Self> {
        let host = validate_host(&settings.host)?;

        let allowed = host.clone();
        let redirects = Policy::custom(move |attempt| {
            let on_host = attempt.url().host_str() == Some(allowed.as_str());
            if on_host && attempt.previous().len() < MAX_REDIRECTS {
                attempt.follow()
            } else {
                attempt.stop()
            }
        });

        let client = reqwest::Client::builder()
            .timeout(settings.timeout())
            .user_agent(settings.user_agent.as_str())
            .redirect(redirects)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, host })
    }
}

/// Reject anything that is not a bare hostname (no scheme, port, or path).
pub fn validate_host(host: &str) -> Result<String> {
    let invalid = || ScrapeError::InvalidHost(host.to_string());
    if host.is_empty() || host.contains(['/', ':', '@']) {
        bail!(invalid());
    }
    let url = Url::parse(&format!("https://{}/", host)).map_err(|_| invalid())?;
    match url.host_str() {
        Some(h) if h.eq_ignore_ascii_case(host) => Ok(h.to_string()),
        _ => bail!(invalid()),
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn get(&self, url: &str) -> Result<String> {
        let target = ensure_on_host(url, &self.host)?;
        let response = self
            .client
            .get(target)
            .send()
            .await
            .with_context(|| format!("GET {} failed", url))?;

        let status = response.status();
        if !status.is_success() {
            bail!(ScrapeError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        response
            .text()
            .await
            .with_context(|| format!("Failed to read body of {}", url))
    }

    async fn exists(&self, url: &str) -> bool {
        let Ok(target) = ensure_on_host(url, &self.host) else {
            return false;
        };
        match self.client.head(target).send().await {
            Ok(r) => r.status() == StatusCode::OK,
            Err(e) => {
                debug!("HEAD {} failed: {}", url, e);
                false
            }
        }
    }
}

#[cfg(test)]
pub mod testing {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    /// In-memory fetcher: URL -> (status, body). Unknown URLs are 404.
    #[derive(Default)]
    pub struct StaticFetcher {
        pages: HashMap<String, (u16, String)>,
        pub requests: Mutex<Vec<String>>,
    }

    impl StaticFetcher {
        pub fn with(mut self, url: &str, status: u16, body: &str) -> Self {
            self.pages.insert(url.to_string(), (status, body.to_string()));
            self
        }

        pub fn requested(&self) -> Vec<String> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Fetcher for StaticFetcher {
        async fn get(&self, url: &str) -> Result<String> {
            self.requests.lock().unwrap().push(format!("GET {}", url));
            match self.pages.get(url) {
                Some((status, body)) if (200..300).contains(status) => Ok(body.clone()),
                Some((status, _)) => bail!(ScrapeError::Status {
                    status: *status,
                    url: url.to_string(),
                }),
                None => bail!("connection refused: {}", url),
            }
        }

        async fn exists(&self, url: &str) -> bool {
            self.requests.lock().unwrap().push(format!("HEAD {}", url));
            matches!(self.pages.get(url), Some((200, _)))
        }
    }
}
