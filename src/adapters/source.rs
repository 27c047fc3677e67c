use crate::domain::model::{SourceBuffer, SourceInput};
use crate::domain::ports::SourceLoader;
use crate::utils::error::{Result, SpimError};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Reads local files with `tokio::fs` and remote ones with a single GET.
#[derive(Debug, Clone)]
pub struct SourceAcquirer {
    client: Client,
}

impl SourceAcquirer {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        tracing::debug!("Fetching assembly source from: {}", url);
        let response = self.client.get(url).send().await?;

        let status = response.status();
        tracing::debug!("Source response status: {}", status);
        if !status.is_success() {
            return Err(SpimError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        Ok(body.to_vec())
    }
}

impl Default for SourceAcquirer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SourceLoader for SourceAcquirer {
    async fn load(&self, input: &SourceInput) -> Result<SourceBuffer> {
        let bytes = match input {
            SourceInput::LocalFile(path) => {
                tracing::debug!("Reading assembly source from: {}", path.display());
                tokio::fs::read(path).await?
            }
            SourceInput::Remote(url) => self.fetch(url).await?,
        };

        tracing::info!("Loaded {} bytes from {}", bytes.len(), input);
        Ok(SourceBuffer {
            input: input.clone(),
            bytes,
        })
    }
}
