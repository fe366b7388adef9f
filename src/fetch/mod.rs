use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::{instrument, Level};
use url::Url;

use crate::error::{Error, Result};

/// Where meal-plan pages come from.
#[async_trait]
pub trait MenuSource: Send + Sync {
    /// The page body, or an error for transport failures and any status but 200.
    async fn fetch(&self, url: &Url) -> Result<String>;
}

pub fn make_client() -> Result<Client> {
    Client::builder().gzip(true).build().map_err(From::from)
}

/// Plain GET over a shared client. No retries, transport default timeouts.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
}

impl HttpSource {
    pub const fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl MenuSource for HttpSource {
    #[instrument(skip(self, url), fields(
        url = %url,
    ), level = Level::DEBUG)]
    async fn fetch(&self, url: &Url) -> Result<String> {
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if status != StatusCode::OK {
            log::debug!("meal plan request answered with {status}");
            return Err(Error::Status(status));
        }
        let start = std::time::Instant::now();
        let text = response.text().await?;
        log::trace!("Got text of meal plan in \t {:?}", start.elapsed());
        Ok(text)
    }
}
