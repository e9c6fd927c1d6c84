//! Delivery of log batches to the remote collector

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use tracing::debug;
use url::Url;

use crate::config::ShipperConfig;
use crate::entry::LogBatch;
use crate::error::{Error, Result};

/// Destination for log batches.
///
/// One call is one flight: the whole batch goes out as a single payload.
#[async_trait]
pub trait Collector: Send + Sync + 'static {
    /// Deliver `batch`, authenticated with `token` (possibly empty).
    ///
    /// # Errors
    ///
    /// Any transport failure or rejection by the collector.
    async fn deliver(&self, batch: &LogBatch, token: &str) -> Result<()>;
}

#[async_trait]
impl<C> Collector for Arc<C>
where
    C: Collector + ?Sized,
{
    async fn deliver(&self, batch: &LogBatch, token: &str) -> Result<()> {
        (**self).deliver(batch, token).await
    }
}

/// Collector reached over HTTP: `POST <endpoint>` with a JSON body and a
/// bearer credential.
#[derive(Clone, Debug)]
pub struct HttpCollector {
    client: Client,
    endpoint: Url,
}

impl HttpCollector {
    /// Creates a collector for the endpoint described by `config`.
    ///
    /// # Errors
    ///
    /// Fails if the endpoint URL is invalid or the HTTP client cannot be built.
    pub fn new(config: &ShipperConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            endpoint: config.endpoint()?,
        })
    }

    /// Creates a collector from an existing client and endpoint.
    #[must_use]
    pub const fn with_client(client: Client, endpoint: Url) -> Self {
        Self { client, endpoint }
    }

    /// The endpoint batches are posted to.
    #[must_use]
    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl Collector for HttpCollector {
    async fn deliver(&self, batch: &LogBatch, token: &str) -> Result<()> {
        let body = serde_json::to_vec(batch)?;

        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(token)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status(status));
        }

        debug!("collector accepted {} entries ({})", batch.len(), status);

        Ok(())
    }
}
