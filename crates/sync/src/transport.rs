//! Ways of getting a batch to the backend.

use crate::{PatchBackend, SubmitPayload, SubmitResponse};
use reqwest::Client;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use url::Url;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("server answered with status {0}")]
    Status(u16),
    #[error("malformed response body: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Submits one batch and reports the backend's answer.
///
/// Timeouts are applied by the caller.
pub trait Transport: Send + Sync + 'static {
    /// # Errors
    /// A [`TransportError`] when no well formed answer was received.
    fn submit(
        &self,
        payload: SubmitPayload,
    ) -> impl Future<Output = Result<SubmitResponse, TransportError>> + Send;
}

/// `POST`s batches as JSON to the patch submission endpoint.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: Client,
    endpoint: Url,
}

impl HttpTransport {
    /// # Errors
    /// Returns an error if the HTTP client cannot be initialised.
    pub fn new(endpoint: Url) -> Result<Self, TransportError> {
        let client = Client::builder().build()?;
        Ok(Self { client, endpoint })
    }

    #[inline]
    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

impl Transport for HttpTransport {
    async fn submit(&self, payload: SubmitPayload) -> Result<SubmitResponse, TransportError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&payload)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

/// Hands batches to an in-process [`PatchBackend`], encoded the same way as
/// over HTTP.
#[derive(Clone, Debug, Default)]
pub struct LocalTransport {
    backend: Arc<Mutex<PatchBackend>>,
}

impl LocalTransport {
    pub fn new(backend: PatchBackend) -> Self {
        Self {
            backend: Arc::new(Mutex::new(backend)),
        }
    }

    /// Shared access to the backend, for inspection.
    pub fn backend(&self) -> Arc<Mutex<PatchBackend>> {
        Arc::clone(&self.backend)
    }
}

impl Transport for LocalTransport {
    async fn submit(&self, payload: SubmitPayload) -> Result<SubmitResponse, TransportError> {
        let body = serde_json::to_vec(&payload)?;
        let response = self.backend.lock().await.handle_json(&body);
        let echoed = serde_json::to_vec(&response)?;
        Ok(serde_json::from_slice(&echoed)?)
    }
}
