mod cli;
mod commands;
mod view;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use commands::chat::ChatArgs;

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Models => commands::models::run(&cli.host).await?,
        Commands::Pull { name } => commands::pull::run(&cli.host, &name).await?,
        Commands::Chat {
            models,
            profile,
            template,
            resume,
        } => {
            let store = commands::open_store(cli.data_dir)?;
            let args = ChatArgs {
                models,
                profile,
                template,
                resume,
            };
            commands::chat::run(&cli.host, store, args).await?;
        }
        Commands::Profiles { action } => {
            let store = commands::open_store(cli.data_dir)?;
            commands::records::profiles(&store, action).await?;
        }
        Commands::Templates { action } => {
            let store = commands::open_store(cli.data_dir)?;
            commands::records::templates(&store, action).await?;
        }
        Commands::Exports { action } => {
            let store = commands::open_store(cli.data_dir)?;
            commands::records::exports(&store, action).await?;
        }
    }

    Ok(())
}
