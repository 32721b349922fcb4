use chorus::prelude::*;
use indicatif::{ProgressBar, ProgressStyle};

pub async fn run(host: &str, name: &str) -> anyhow::Result<()> {
    let client = super::connect(host).await?;

    let bar = ProgressBar::new(100);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{prefix:.bold} [{bar:40}] {pos:>3}% {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );
    bar.set_prefix(name.trim().to_string());

    let progress = bar.clone();
    let observer = move |event: &ChatEvent| {
        if let ChatEvent::InstallProgress(p) = event {
            progress.set_position(u64::from(p.percent));
            match p.status {
                InstallStatus::Downloading => progress.set_message("downloading"),
                InstallStatus::Installing => progress.set_message("installing"),
                InstallStatus::Completed => progress.finish_with_message("done"),
                InstallStatus::Error => {
                    progress.abandon_with_message(p.error.clone().unwrap_or_default());
                }
            }
        }
    };

    let installer = Installer::new(client).observer(observer);
    installer.install(name).await?;
    Ok(())
}
