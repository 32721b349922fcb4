pub mod chat;
pub mod models;
pub mod pull;
pub mod records;

use std::path::PathBuf;

use anyhow::Context;
use chorus::prelude::*;

/// Store at `--data-dir`, or the default location under the home directory.
pub fn open_store(data_dir: Option<PathBuf>) -> anyhow::Result<FsStore> {
    match data_dir {
        Some(dir) => Ok(FsStore::new(&dir)),
        None => FsStore::default_location()
            .context("could not determine the home directory; pass --data-dir"),
    }
}

/// Client for `host`, failing early when the server does not answer.
pub async fn connect(host: &str) -> anyhow::Result<Ollama> {
    let client = Ollama::new().base_url(host);
    if !client.check_connection().await {
        anyhow::bail!("cannot connect to Ollama at {host}. Is `ollama serve` running?");
    }
    Ok(client)
}
