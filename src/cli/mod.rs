use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use zkballot::config::{default_config_path, PollConfig};

pub mod init;
pub mod poll;
pub mod proof;
pub mod version;

#[derive(Parser)]
#[command(name = "zkballot")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Operator CLI for anonymous Merkle-membership polls", long_about = None)]
pub struct Cli {
    /// Path to config file (default: ~/.local/share/zkballot/config.toml)
    #[arg(long, global = true, env = "ZKBALLOT_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a default config and an empty registry
    Init {
        /// Directory for the registry and ledger files
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Build the voter tree and bind the ledger to its root
    Open,

    /// Print a membership proof
    Proof {
        /// Voter identity
        #[arg(long, conflicts_with = "index", required_unless_present = "index")]
        voter: Option<String>,

        /// Leaf index, including padding slots
        #[arg(long, allow_negative_numbers = true)]
        index: Option<i64>,
    },

    /// Cast a vote with the built-in mock prover and verifier against an
    /// in-memory copy of the ledger
    Rehearse {
        /// Voter identity
        #[arg(long)]
        voter: String,

        /// Choice index
        #[arg(long)]
        vote: u64,
    },

    /// Show the tally
    Results,

    /// Stop accepting votes
    Close,

    /// Clear tally and spent nullifiers and unbind the voting ID
    Reset {
        /// Skip confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },

    /// Display version information
    Version,
}

impl Cli {
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(default_config_path)
    }
}

/// Load the config for commands that need one.
pub fn load_config(path: &Path) -> Result<PollConfig, Box<dyn std::error::Error>> {
    if !path.exists() {
        return Err(format!(
            "config file '{}' not found; run `zkballot init` first",
            path.display()
        )
        .into());
    }
    Ok(PollConfig::load(path)?)
}

pub async fn execute(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config_path = cli.config_path();
    match cli.command {
        Commands::Init { data_dir, force } => init::execute(&config_path, data_dir, force),
        Commands::Open => poll::open(&load_config(&config_path)?).await,
        Commands::Proof { voter, index } => {
            proof::execute(&load_config(&config_path)?, voter, index)
        }
        Commands::Rehearse { voter, vote } => {
            poll::rehearse(&load_config(&config_path)?, &voter, vote).await?;
            Ok(())
        }
        Commands::Results => poll::results(&load_config(&config_path)?).await,
        Commands::Close => poll::close(&load_config(&config_path)?).await,
        Commands::Reset { yes } => poll::reset(&load_config(&config_path)?, yes).await,
        Commands::Version => {
            version::execute();
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_init() {
        let cli = Cli::parse_from(["zkballot", "init", "--data-dir", "/tmp/poll"]);

        match cli.command {
            Commands::Init { data_dir, force } => {
                assert_eq!(data_dir, Some(PathBuf::from("/tmp/poll")));
                assert!(!force);
            }
            _ => panic!("Expected Init command"),
        }
    }

    #[test]
    fn test_cli_parse_global_config() {
        let cli = Cli::parse_from(["zkballot", "open", "--config", "/etc/zkballot.toml"]);
        assert!(matches!(cli.command, Commands::Open));
        assert_eq!(cli.config_path(), PathBuf::from("/etc/zkballot.toml"));
    }

    #[test]
    fn test_cli_parse_proof_by_voter() {
        let cli = Cli::parse_from(["zkballot", "proof", "--voter", "0xC"]);

        match cli.command {
            Commands::Proof { voter, index } => {
                assert_eq!(voter, Some("0xC".to_string()));
                assert_eq!(index, None);
            }
            _ => panic!("Expected Proof command"),
        }
    }

    #[test]
    fn test_cli_parse_proof_by_index() {
        let cli = Cli::parse_from(["zkballot", "proof", "--index", "-1"]);

        match cli.command {
            Commands::Proof { voter, index } => {
                assert_eq!(voter, None);
                assert_eq!(index, Some(-1));
            }
            _ => panic!("Expected Proof command"),
        }
    }

    #[test]
    fn test_cli_proof_requires_selector() {
        assert!(Cli::try_parse_from(["zkballot", "proof"]).is_err());
        assert!(
            Cli::try_parse_from(["zkballot", "proof", "--voter", "0xA", "--index", "0"]).is_err()
        );
    }

    #[test]
    fn test_cli_parse_rehearse() {
        let cli = Cli::parse_from(["zkballot", "rehearse", "--voter", "0xB", "--vote", "1"]);

        match cli.command {
            Commands::Rehearse { voter, vote } => {
                assert_eq!(voter, "0xB");
                assert_eq!(vote, 1);
            }
            _ => panic!("Expected Rehearse command"),
        }
        assert!(Cli::try_parse_from(["zkballot", "rehearse", "--voter", "0xB"]).is_err());
    }

    #[test]
    fn test_cli_parse_reset() {
        let cli = Cli::parse_from(["zkballot", "reset", "-y"]);
        assert!(matches!(cli.command, Commands::Reset { yes: true }));
    }

    #[test]
    fn test_cli_parse_simple_commands() {
        assert!(matches!(
            Cli::parse_from(["zkballot", "results"]).command,
            Commands::Results
        ));
        assert!(matches!(
            Cli::parse_from(["zkballot", "close"]).command,
            Commands::Close
        ));
        assert!(matches!(
            Cli::parse_from(["zkballot", "version"]).command,
            Commands::Version
        ));
    }

    #[test]
    fn test_load_config_missing_file() {
        let err = load_config(Path::new("/nonexistent/zkballot/config.toml")).unwrap_err();
        assert!(err.to_string().contains("zkballot init"));
    }
}
