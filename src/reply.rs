use async_trait::async_trait;
use tokio::{
    io::{AsyncWriteExt, Stdout},
    sync::Mutex,
};

use crate::error::Result;

/// The conversation a triggering message came from.
#[async_trait]
pub trait ReplySink: Send + Sync {
    async fn send(&self, text: String) -> Result<()>;
}

/// Writes each reply to stdout, followed by a blank line.
#[derive(Debug)]
pub struct StdoutSink(Mutex<Stdout>);

impl Default for StdoutSink {
    fn default() -> Self {
        Self(Mutex::new(tokio::io::stdout()))
    }
}

#[async_trait]
impl ReplySink for StdoutSink {
    async fn send(&self, text: String) -> Result<()> {
        let mut out = self.0.lock().await;
        out.write_all(text.as_bytes()).await?;
        out.write_all(b"\n\n").await?;
        out.flush().await?;
        Ok(())
    }
}
