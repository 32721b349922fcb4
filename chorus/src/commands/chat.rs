use std::path::{Path, PathBuf};

use anyhow::Context;
use chorus::prelude::*;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;

use crate::view::{LiveView, print_outcome};

pub struct ChatArgs {
    pub models: Vec<String>,
    pub profile: Option<String>,
    pub template: Option<String>,
    pub resume: Option<PathBuf>,
}

fn live_observer() -> impl ChatObserver + 'static {
    chorus_orch::CompositeObserver::new()
        .with(TracingObserver::new())
        .with(LiveView::new())
}

/// Session for a saved chat, with its histories, profile and template.
async fn resumed(host: &str, store: &FsStore, path: &Path) -> anyhow::Result<Session<Ollama>> {
    let export = store
        .import_chat(path)
        .await
        .with_context(|| format!("could not load {}", path.display()))?;
    if export.models.is_empty() {
        anyhow::bail!("{} has no models to resume", path.display());
    }
    let name = export.name.clone();
    let client = super::connect(host).await?;
    let session = Session::from_export(client, export).observer(live_observer());
    println!("Resumed \"{name}\".");
    Ok(session)
}

async fn fresh(host: &str, store: &FsStore, args: ChatArgs) -> anyhow::Result<Session<Ollama>> {
    let template = match &args.template {
        Some(id) => Some(
            store
                .templates()
                .get(id)
                .await?
                .with_context(|| format!("no template with id '{id}'"))?,
        ),
        None => None,
    };
    let profile = match &args.profile {
        Some(id) => Some(
            store
                .profiles()
                .get(id)
                .await?
                .with_context(|| format!("no profile with id '{id}'"))?,
        ),
        None => None,
    };

    let mut models = args.models;
    if let Some(template) = &template {
        models.extend(template.model_names.iter().cloned());
    }
    if models.is_empty() {
        anyhow::bail!("select at least one model with -m or a template with --template");
    }

    let client = super::connect(host).await?;
    let mut session = Session::new(client, models).observer(live_observer());
    if let Some(profile) = profile {
        session = session.profile(profile);
    }
    if let Some(template) = template {
        session = session.template(template);
    }
    Ok(session)
}

pub async fn run(host: &str, store: FsStore, mut args: ChatArgs) -> anyhow::Result<()> {
    let mut session = match args.resume.take() {
        Some(path) => resumed(host, &store, &path).await?,
        None => fresh(host, &store, args).await?,
    };

    let names: Vec<&str> = session.models().collect();
    println!("Chatting with {}. /export <name> saves, /quit exits.", names.join(", "));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "/quit" || line == "/exit" {
            break;
        }
        if let Some(name) = line.strip_prefix("/export") {
            let name = match name.trim() {
                "" => "chat",
                name => name,
            };
            let path = store.export_chat(&session.export(name)).await?;
            println!("Saved to {}", path.display());
            continue;
        }

        let cancel = CancellationToken::new();
        let watcher = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    cancel.cancel();
                }
            })
        };
        let outcomes = session.submit_cancellable(line, &cancel).await;
        watcher.abort();

        for outcome in &outcomes {
            print_outcome(outcome, session.status(&outcome.model));
        }
    }
    Ok(())
}
