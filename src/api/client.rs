use http::header::{ETAG, IF_NONE_MATCH};
use http::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tokio_retry::strategy::ExponentialBackoff;
use tokio_retry::RetryIf;

use super::cache::ResponseCache;
use super::error::ApiError;
use crate::config::{parse_timeout, Config};

/// Connection settings for the score service, built from the config file.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout: Duration,
    /// Total attempts for retried requests (at least 1)
    pub retries: usize,
}

impl ApiConfig {
    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        let timeout = parse_timeout(&config.api.timeout)
            .map_err(|e| ApiError::InvalidConfig(format!("api.timeout: {}", e)))?;
        Ok(Self {
            base_url: config.api.base_url.trim().trim_end_matches('/').to_string(),
            timeout,
            retries: config.api.retries.max(1),
        })
    }
}

fn join_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// HTTP client for the score service
///
/// Cloning is cheap; clones share the connection pool and response cache.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
    cache: Option<ResponseCache>,
    retries: usize,
}

impl ApiClient {
    pub fn new(
        config: &ApiConfig,
        token: Option<String>,
        cache: Option<ResponseCache>,
    ) -> Result<Self, ApiError> {
        if config.base_url.is_empty() {
            return Err(ApiError::InvalidConfig("api.base_url is empty".to_string()));
        }
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("scorebook/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            token,
            cache,
            retries: config.retries.max(1),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    fn url(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }

    fn retry_strategy(&self) -> impl Iterator<Item = Duration> {
        ExponentialBackoff::from_millis(100)
            .max_delay(Duration::from_secs(5))
            .take(self.retries - 1)
    }

    fn request(&self, method: Method, url: &str) -> reqwest::RequestBuilder {
        let builder = self.http.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn error_for(response: reqwest::Response, path: &str) -> ApiError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        ApiError::from_status(status, path, &body)
    }

    fn decode<T: DeserializeOwned>(path: &str, body: &[u8]) -> Result<T, ApiError> {
        serde_json::from_slice(body).map_err(|e| ApiError::Decode {
            path: path.to_string(),
            message: e.to_string(),
        })
    }

    async fn get_once(&self, path: &str, url: &str) -> Result<Vec<u8>, ApiError> {
        let cached = self.cache.as_ref().and_then(|cache| cache.lookup(url));

        let mut request = self.request(Method::GET, url);
        if let Some(entry) = &cached {
            request = request.header(IF_NONE_MATCH, entry.etag.as_str());
        }
        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::NOT_MODIFIED {
            return match cached {
                Some(entry) => {
                    tracing::debug!("GET {} not modified, using cached response", path);
                    Ok(entry.body)
                }
                None => Err(ApiError::Decode {
                    path: path.to_string(),
                    message: "304 Not Modified without a cached response".to_string(),
                }),
            };
        }
        if !status.is_success() {
            return Err(Self::error_for(response, path).await);
        }

        let etag = response
            .headers()
            .get(ETAG)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await?.to_vec();

        if let (Some(cache), Some(etag)) = (&self.cache, etag) {
            cache.store(url, etag, body.clone());
        }
        Ok(body)
    }

    /// GET and decode a JSON resource. Transient failures are retried.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.url(path);
        tracing::debug!("GET {}", url);
        let body = RetryIf::spawn(
            self.retry_strategy(),
            || self.get_once(path, &url),
            |e: &ApiError| {
                let transient = e.is_transient();
                if transient {
                    tracing::warn!("GET {} failed, retrying: {}", path, e);
                }
                transient
            },
        )
        .await?;
        Self::decode(path, &body)
    }

    /// Send a JSON body and decode the JSON reply. Not retried: a write may
    /// have reached the server even when the response was lost.
    pub async fn send_json<B, T>(&self, method: Method, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path);
        tracing::debug!("{} {}", method, url);
        let response = self.request(method, &url).json(body).send().await?;
        if !response.status().is_success() {
            return Err(Self::error_for(response, path).await);
        }
        let bytes = response.bytes().await?;
        Self::decode(path, &bytes)
    }

    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        let url = self.url(path);
        tracing::debug!("DELETE {}", url);
        let response = self.request(Method::DELETE, &url).send().await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::error_for(response, path).await)
        }
    }
}

/// A client for a port nothing listens on, and a permit for `role`.
/// Requests that get past the permit check fail with a network error.
#[cfg(test)]
pub(crate) fn offline_client_and_permit(
    role: crate::api::types::Role,
    capability: crate::access::Capability,
) -> (ApiClient, crate::access::Permit) {
    let _ = rustls::crypto::ring::default_provider().install_default();
    let config = ApiConfig {
        base_url: "http://127.0.0.1:9/api".to_string(),
        timeout: Duration::from_secs(2),
        retries: 1,
    };
    let client = ApiClient::new(&config, Some("t".to_string()), None).unwrap();
    let session = crate::session::Session::new("ana".to_string(), role, config.base_url.clone());
    let permit = crate::access::authorize(Some(&session), capability).unwrap();
    (client, permit)
}
