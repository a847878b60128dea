//! HTTP transport for the vendor REST dialect.
//!
//! A thin adapter around `reqwest::Client` that owns the connection pool for
//! the lifetime of the client, attaches the access token to every request,
//! and maps wire failures to [`Error::Transport`]. The facade and tests talk
//! to the [`VendorTransport`] trait, not to reqwest directly.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tokio::sync::RwLock;
use url::Url;

use crate::error::{Error, Result};

/// Production vendor host.
pub const DEFAULT_BASE_URL: &str = "http://captchatypers.com";

/// Default per-request HTTP timeout.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(60);

/// Request parameters, excluding the token (the transport adds that).
pub type Params = Vec<(&'static str, String)>;

/// Authenticated access to the vendor endpoints.
#[async_trait]
pub trait VendorTransport: Send + Sync {
    /// GET with the token as a query parameter.
    async fn get(&self, path: &str, params: Params) -> Result<String>;

    /// POST with the token as a form field.
    async fn post(&self, path: &str, params: Params) -> Result<String>;

    /// Release the connection pool. Idempotent; later requests fail with
    /// [`Error::ClientClosed`].
    async fn close(&self);

    async fn is_closed(&self) -> bool;
}

/// Reqwest-backed transport used by the real client.
pub struct ReqwestTransport {
    access_token: String,
    base_url: Url,
    /// `None` once closed. `reqwest::Client` is an `Arc` internally, so the
    /// lock is never held across an await.
    client: RwLock<Option<Client>>,
}

impl ReqwestTransport {
    pub fn new(
        access_token: impl Into<String>,
        base_url: Url,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            access_token: access_token.into(),
            base_url,
            client: RwLock::new(Some(client)),
        })
    }

    async fn client(&self) -> Result<Client> {
        self.client.read().await.clone().ok_or(Error::ClientClosed)
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    /// Append the token as its literal text. Clients that serialized the
    /// token through a byte-string/debug rendering were rejected with
    /// INVALID_REQUEST; percent-encoding is left entirely to reqwest.
    fn with_token(&self, mut params: Params) -> Params {
        params.push(("token", self.access_token.clone()));
        params
    }
}

#[async_trait]
impl VendorTransport for ReqwestTransport {
    async fn get(&self, path: &str, params: Params) -> Result<String> {
        let client = self.client().await?;
        let url = self.endpoint(path)?;
        let response = client
            .get(url)
            .query(&self.with_token(params))
            .send()
            .await?
            .error_for_status()?;
        Ok(response.text().await?)
    }

    async fn post(&self, path: &str, params: Params) -> Result<String> {
        let client = self.client().await?;
        let url = self.endpoint(path)?;
        let response = client
            .post(url)
            .form(&self.with_token(params))
            .send()
            .await?
            .error_for_status()?;
        Ok(response.text().await?)
    }

    async fn close(&self) {
        if self.client.write().await.take().is_some() {
            log::debug!("vendor transport closed");
        }
    }

    async fn is_closed(&self) -> bool {
        self.client.read().await.is_none()
    }
}

impl Drop for ReqwestTransport {
    fn drop(&mut self) {
        if self.client.get_mut().is_some() {
            log::warn!("vendor transport dropped without close(); releasing implicitly");
        }
    }
}
