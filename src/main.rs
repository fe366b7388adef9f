#![deny(unused_crate_dependencies)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

mod bot;
mod config;
mod error;
mod fetch;
mod format;
mod parse;
mod reply;
mod trigger;

use std::sync::Arc;

use tokio::io::BufReader;

use crate::{
    bot::MensaBot,
    config::Config,
    fetch::{make_client, HttpSource},
    reply::StdoutSink,
};

#[cfg(all(target_env = "musl", target_pointer_width = "64"))]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

/// Stand-in host: every stdin line is one chat message, replies go to stdout.
#[tokio::main(flavor = "current_thread")]
async fn main() -> core::result::Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let config = Config::load().await?;
    let source = HttpSource::new(make_client()?);
    let bot = Arc::new(MensaBot::new(config, source)?);
    let sink = Arc::new(StdoutSink::default());

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::warn!("cannot listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };
    log::info!("reading messages from stdin");
    bot::serve(BufReader::new(tokio::io::stdin()), &bot, &sink, shutdown).await;
    Ok(())
}
