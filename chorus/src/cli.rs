use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Talk to several local Ollama models at once
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Ollama server URL
    #[arg(long, env = "OLLAMA_HOST", default_value = chorus_provider_ollama::DEFAULT_BASE_URL)]
    pub host: String,

    /// Directory for profiles, templates and exports [default: ~/.ollama-multi-chat]
    #[arg(long, env = "CHORUS_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace). Logs go to stderr.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// List installed models
    Models,

    /// Download a model
    Pull {
        /// Model name, e.g. llama3.2:3b
        name: String,
    },

    /// Chat with one or more models; each input line is one turn
    Chat {
        /// Model to include (repeatable)
        #[arg(short, long = "model")]
        models: Vec<String>,

        /// Profile id whose system prompt starts each conversation
        #[arg(short, long)]
        profile: Option<String>,

        /// Template id whose models are added to the selection
        #[arg(short, long)]
        template: Option<String>,

        /// Continue a saved chat export (see `chorus exports list`)
        #[arg(long, value_name = "PATH", conflicts_with_all = ["models", "profile", "template"])]
        resume: Option<PathBuf>,
    },

    /// Manage profiles
    Profiles {
        #[command(subcommand)]
        action: ProfileAction,
    },

    /// Manage model templates
    Templates {
        #[command(subcommand)]
        action: TemplateAction,
    },

    /// Saved chat exports
    Exports {
        #[command(subcommand)]
        action: ExportAction,
    },
}

#[derive(Subcommand)]
pub enum ExportAction {
    /// List saved chats, oldest first
    List,
}

#[derive(Subcommand)]
pub enum ProfileAction {
    /// List profiles
    List,
    /// Create a profile
    Add {
        /// Display name
        #[arg(long)]
        name: String,
        /// Short description
        #[arg(long, default_value = "")]
        description: String,
        /// System prompt
        #[arg(long)]
        prompt: String,
    },
    /// Delete a custom profile
    Delete {
        /// Profile id
        id: String,
    },
}

#[derive(Subcommand)]
pub enum TemplateAction {
    /// List templates
    List,
    /// Create a template
    Add {
        /// Display name
        #[arg(long)]
        name: String,
        /// Short description
        #[arg(long, default_value = "")]
        description: String,
        /// Model to include (repeatable)
        #[arg(short, long = "model", required = true)]
        models: Vec<String>,
    },
    /// Delete a custom template
    Delete {
        /// Template id
        id: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn chat_accepts_repeated_models() {
        let cli = Cli::try_parse_from([
            "chorus", "chat", "-m", "llama3.2:3b", "-m", "phi3:mini", "--profile", "reviewer",
        ])
        .unwrap();
        match cli.command {
            Commands::Chat {
                models, profile, ..
            } => {
                assert_eq!(models, vec!["llama3.2:3b", "phi3:mini"]);
                assert_eq!(profile.as_deref(), Some("reviewer"));
            }
            _ => panic!("expected chat"),
        }
    }

    #[test]
    fn resume_takes_a_path_and_excludes_a_new_selection() {
        let cli = Cli::try_parse_from(["chorus", "chat", "--resume", "saved.json"]).unwrap();
        match cli.command {
            Commands::Chat { resume, .. } => {
                assert_eq!(resume, Some(PathBuf::from("saved.json")));
            }
            _ => panic!("expected chat"),
        }
        assert!(
            Cli::try_parse_from(["chorus", "chat", "--resume", "saved.json", "-m", "phi3:mini"])
                .is_err()
        );
    }

    #[test]
    fn exports_list_parses() {
        let cli = Cli::try_parse_from(["chorus", "exports", "list"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Exports {
                action: ExportAction::List
            }
        ));
    }

    #[test]
    fn verbose_counts() {
        let cli = Cli::try_parse_from(["chorus", "-vv", "models"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }
}
