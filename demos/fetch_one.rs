//! Example downloading one file with terminal progress.
//!
//! ```sh
//! cargo run --example fetch_one -- https://httpbin.org/bytes/256000 [fetchkeep.toml]
//! ```

use color_eyre::{eyre::eyre, Result};
use fetchkeep::download::DownloadRequest;
use fetchkeep::downloader::{DownloaderBuilder, Settings};
use fetchkeep::notify::ConsoleNotifier;
use fetchkeep::session::DownloadSession;
use fetchkeep::UserId;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

const USER: i64 = 1;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    fetchkeep::logging::init("fetchkeep=info");

    let mut args = std::env::args().skip(1);
    let url = args
        .next()
        .ok_or_else(|| eyre!("usage: fetch_one <url> [settings.toml]"))?;
    let settings = match args.next() {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };

    let downloader = DownloaderBuilder::from_settings(&settings).build()?;
    let session = DownloadSession::new(downloader, Arc::new(ConsoleNotifier::new()));

    // Ctrl-C cancels the transfer and removes the partial file.
    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_signal.cancel();
        }
    });

    let request = DownloadRequest::new(url, USER, USER, 1);
    match session.handle(&request, &cancel).await {
        Ok(metadata) => println!("\nStored at {}", metadata.file_path.display()),
        Err(err) => println!("\nDownload failed: {err}"),
    }

    println!("{}", session.statistics_text(UserId::new(USER)?).await);
    Ok(())
}
