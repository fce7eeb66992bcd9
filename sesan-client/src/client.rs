//! HTTP client for the speech analysis service
//!
//! One [`ApiClient`] handles the whole REST surface; the endpoint wrappers
//! live in sibling modules (`auth`, `participants`, `analyze`, `results`,
//! `reports`) as additional `impl` blocks on this type.

use reqwest::Method;
use sesan_common::config::Config;
use sesan_common::error::check_response;
use sesan_common::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

const USER_AGENT: &str = concat!("sesan/", env!("CARGO_PKG_VERSION"));

/// Client for the speech analysis service API
///
/// Cheap to clone; the underlying connection pool is shared.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    bearer_token: Option<String>,
    upload_timeout: Duration,
    poll_interval: Duration,
}

impl ApiClient {
    /// Build a client from configuration
    ///
    /// No global request timeout is set: the analyze endpoint blocks for the
    /// job's full duration and gets its own per-request timeout instead.
    pub fn new(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.api_base_url.clone(),
            bearer_token: None,
            upload_timeout: Duration::from_secs(config.upload_timeout_secs),
            poll_interval: Duration::from_millis(config.poll_interval_ms),
        })
    }

    /// Attach a bearer token to all subsequent requests
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// Replace or clear the bearer token
    pub fn set_token(&mut self, token: Option<String>) {
        self.bearer_token = token;
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn upload_timeout(&self) -> Duration {
        self.upload_timeout
    }

    /// Fixed interval between progress polls
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Start a request with the bearer token applied when present
    pub(crate) fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let mut builder = self.http.request(method, self.url(path));
        if let Some(token) = &self.bearer_token {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    /// GET a JSON resource
    pub(crate) async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.request(Method::GET, path).send().await?;
        let response = check_response(response).await?;
        Ok(response.json().await?)
    }

    /// POST a JSON body, decode a JSON response
    pub(crate) async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let response = self.request(Method::POST, path).json(body).send().await?;
        let response = check_response(response).await?;
        Ok(response.json().await?)
    }

    /// DELETE a resource, ignoring any response body
    pub(crate) async fn delete(&self, path: &str) -> Result<()> {
        let response = self.request(Method::DELETE, path).send().await?;
        check_response(response).await?;
        Ok(())
    }
}
