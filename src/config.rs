//! zkballot operator configuration
//!
//! TOML file, by default at `~/.local/share/zkballot/config.toml`. It names
//! the registry and ledger files and sets the choice list, proving retries,
//! verification timeout and log level.
//!
//! The registry contents and the resulting voting ID are not configuration:
//! the voting ID is derived from the registry when the poll opens and the
//! ledger refuses to be rebound without a reset.

use crate::poll::PollSettings;
use crate::registry::PaddingPolicy;
use crate::retry::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

const DEFAULT_LOG_LEVEL: &str = "info";

/// Deepest tree a `tree_depth` setting may request.
pub const MAX_TREE_DEPTH: u32 = 32;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write config file '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Operator configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollConfig {
    pub poll: PollSection,

    #[serde(default)]
    pub proving: ProvingConfig,

    #[serde(default)]
    pub verification: VerificationConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Registry, ledger and ballot shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollSection {
    /// `{"voters": [...]}` file
    pub registry_path: PathBuf,

    /// Ledger snapshot file
    pub ledger_path: PathBuf,

    #[serde(default = "default_choices")]
    pub choices: Vec<String>,

    /// Fixed tree depth; smallest fitting tree if unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tree_depth: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvingConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_backoff_millis")]
    pub backoff_millis: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_choices() -> Vec<String> {
    vec!["no".to_string(), "yes".to_string()]
}

fn default_max_attempts() -> u32 {
    3
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_backoff_millis() -> u64 {
    250
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

impl Default for ProvingConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
        }
    }
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_attempts: default_max_attempts(),
            backoff_millis: default_backoff_millis(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl PollConfig {
    /// Configuration with files placed under `data_dir`.
    pub fn new(data_dir: &Path) -> Self {
        Self {
            poll: PollSection {
                registry_path: data_dir.join("registry.json"),
                ledger_path: data_dir.join("results.json"),
                choices: default_choices(),
                tree_depth: None,
            },
            proving: ProvingConfig::default(),
            verification: VerificationConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    /// Load and validate a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config: PollConfig = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Save to a TOML file, creating the parent directory if needed.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(self)?;
        write_file(path, &contents)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll.choices.is_empty() {
            return Err(ConfigError::Invalid("poll.choices is empty".to_string()));
        }
        if let Some(depth) = self.poll.tree_depth {
            if depth > MAX_TREE_DEPTH {
                return Err(ConfigError::Invalid(format!(
                    "poll.tree_depth {depth} exceeds {MAX_TREE_DEPTH}"
                )));
            }
        }
        if self.verification.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "verification.timeout_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn padding(&self) -> PaddingPolicy {
        match self.poll.tree_depth {
            Some(depth) => PaddingPolicy::FixedDepth(depth),
            None => PaddingPolicy::NextPowerOfTwo,
        }
    }

    /// Runtime settings for [`crate::poll::Poll::open`].
    pub fn settings(&self) -> PollSettings {
        PollSettings {
            choices: self.poll.choices.clone(),
            padding: self.padding(),
            proving_attempts: self.proving.max_attempts,
            verification_timeout: Duration::from_secs(self.verification.timeout_secs),
            verification_retry: RetryPolicy::new(
                self.verification.max_attempts,
                Duration::from_millis(self.verification.backoff_millis),
            ),
        }
    }

    /// Default configuration as commented TOML.
    pub fn generate_default_toml(data_dir: &Path) -> String {
        format!(
            r#"# zkballot operator configuration
#
# The voting ID is the Merkle root of the registry and is fixed when the
# poll opens. Changing the registry requires `zkballot reset` first.

[poll]
# Voter registry: {{"voters": ["0x...", ...]}}
registry_path = "{registry}"

# Ledger snapshot (tally and spent nullifiers)
ledger_path = "{ledger}"

# Choice labels; a vote is the index of its label
choices = ["no", "yes"]

# Fixed tree depth (2^depth leaves). Smallest fitting tree if unset.
# tree_depth = 10

[proving]
# Attempts per ballot, each with fresh randomness
max_attempts = 3

[verification]
# Upper bound on one verification call
timeout_secs = 120

# Attempts when the service is unreachable
max_attempts = 3

# First retry delay, doubled on each further retry
backoff_millis = 250

[logging]
# Log level: trace, debug, info, warn, error (RUST_LOG overrides)
level = "info"
"#,
            registry = data_dir.join("registry.json").display(),
            ledger = data_dir.join("results.json").display(),
        )
    }

    /// Write the default configuration file.
    pub fn create_default(config_path: &Path, data_dir: &Path) -> Result<(), ConfigError> {
        write_file(config_path, &Self::generate_default_toml(data_dir))
    }
}

fn write_file(path: &Path, contents: &str) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::write(path, contents).map_err(|source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Default data directory: `~/.local/share/zkballot`.
pub fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("zkballot")
}

/// Default config file path inside the data directory.
pub fn default_config_path() -> PathBuf {
    default_data_dir().join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = PollConfig::new(Path::new("/data/zkballot"));

        assert_eq!(
            config.poll.registry_path,
            PathBuf::from("/data/zkballot/registry.json")
        );
        assert_eq!(config.poll.choices, vec!["no", "yes"]);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.padding(), PaddingPolicy::NextPowerOfTwo);
    }

    #[test]
    fn test_save_and_load_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");

        let mut config = PollConfig::new(temp_dir.path());
        config.poll.tree_depth = Some(10);
        config.save(&config_path).unwrap();

        let loaded = PollConfig::load(&config_path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.padding(), PaddingPolicy::FixedDepth(10));
    }

    #[test]
    fn test_create_default_config_loads() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.toml");

        PollConfig::create_default(&config_path, temp_dir.path()).unwrap();

        let config = PollConfig::load(&config_path).unwrap();
        assert_eq!(config, PollConfig::new(temp_dir.path()));
    }

    #[test]
    fn test_load_config_with_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");

        let minimal_config = r#"
[poll]
registry_path = "/tmp/registry.json"
ledger_path = "/tmp/results.json"
"#;
        fs::write(&config_path, minimal_config).unwrap();

        let config = PollConfig::load(&config_path).unwrap();
        assert_eq!(config.proving.max_attempts, 3);
        assert_eq!(config.verification.timeout_secs, 120);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.poll.tree_depth, None);
    }

    #[test]
    fn test_invalid_configs_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");

        fs::write(
            &config_path,
            "[poll]\nregistry_path = \"r\"\nledger_path = \"l\"\nchoices = []\n",
        )
        .unwrap();
        assert!(matches!(
            PollConfig::load(&config_path),
            Err(ConfigError::Invalid(_))
        ));

        fs::write(&config_path, "[poll]\nregistry_path = 1\n").unwrap();
        assert!(matches!(
            PollConfig::load(&config_path),
            Err(ConfigError::Parse { .. })
        ));

        assert!(matches!(
            PollConfig::load(&temp_dir.path().join("missing.toml")),
            Err(ConfigError::Read { .. })
        ));
    }

    #[test]
    fn test_settings_from_config() {
        let mut config = PollConfig::new(Path::new("/tmp"));
        config.verification.timeout_secs = 5;
        config.verification.backoff_millis = 10;

        let settings = config.settings();
        assert_eq!(settings.verification_timeout, Duration::from_secs(5));
        assert_eq!(settings.verification_retry.base_delay, Duration::from_millis(10));
        assert_eq!(settings.proving_attempts, 3);
    }

    #[test]
    fn test_default_config_path() {
        assert!(default_config_path().ends_with("zkballot/config.toml"));
    }
}
