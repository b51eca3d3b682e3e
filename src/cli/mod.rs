//! CLI command definitions and parsing
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "medibot",
    version,
    about = "Hospital operations assistant with retrieval-augmented answers",
    long_about = "Medibot answers questions about hospital services by retrieving relevant \
                  passages from ingested documents and generating short practical answers \
                  through a ladder of fallback models, with rule-based answers when every \
                  model is unavailable."
)]
pub struct Cli {
    /// Global config file path (defaults to ~/.config/medibot/config.toml)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ingest documents into the vector store
    Ingest {
        /// Directory of .txt/.md documents (defaults to the configured documents directory)
        #[arg(long, value_name = "DIR")]
        dir: Option<PathBuf>,
    },

    /// Ask a single question and print the answer
    Ask {
        /// The question to answer
        question: String,

        /// Skip retrieval and answer from the model ladder alone
        #[arg(long)]
        no_retrieval: bool,
    },

    /// Interactive question-answering session
    Chat,

    /// Show vector store status
    Status,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Write a default configuration file
    Init {
        /// Overwrite an existing configuration file
        #[arg(long)]
        force: bool,
    },

    /// Print the active configuration
    Show,

    /// Validate a configuration file
    Validate {
        /// Configuration file to validate (defaults to the active one)
        #[arg(long, value_name = "FILE")]
        file: Option<PathBuf>,
    },
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_ask() {
        let cli = Cli::parse_from(["medibot", "ask", "how do I book appointment?"]);
        match cli.command {
            Commands::Ask {
                question,
                no_retrieval,
            } => {
                assert_eq!(question, "how do I book appointment?");
                assert!(!no_retrieval);
            }
            _ => panic!("Expected ask command"),
        }
    }

    #[test]
    fn test_parse_ingest_with_dir() {
        let cli = Cli::parse_from(["medibot", "ingest", "--dir", "/tmp/docs"]);
        match cli.command {
            Commands::Ingest { dir } => {
                assert_eq!(dir, Some(PathBuf::from("/tmp/docs")));
            }
            _ => panic!("Expected ingest command"),
        }
    }

    #[test]
    fn test_global_config_flag() {
        let cli = Cli::parse_from(["medibot", "--config", "/tmp/c.toml", "status"]);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/c.toml")));
    }
}
