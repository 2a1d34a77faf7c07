use std::fs;
use std::path::{Path, PathBuf};
use zkballot::config::{default_data_dir, PollConfig};
use zkballot::registry::RegistryFile;

/// Write a default config and, if absent, an empty registry file.
pub fn execute(
    config_path: &Path,
    data_dir: Option<PathBuf>,
    force: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if config_path.exists() && !force {
        return Err(format!(
            "config file '{}' already exists; pass --force to overwrite",
            config_path.display()
        )
        .into());
    }

    let data_dir = data_dir.unwrap_or_else(default_data_dir);
    PollConfig::create_default(config_path, &data_dir)?;
    println!("Wrote config: {}", config_path.display());

    let config = PollConfig::load(config_path)?;
    let registry_path = &config.poll.registry_path;
    if !registry_path.exists() {
        if let Some(parent) = registry_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let empty = RegistryFile { voters: Vec::new() };
        fs::write(registry_path, serde_json::to_string_pretty(&empty)?)?;
        println!("Wrote empty registry: {}", registry_path.display());
    }

    println!();
    println!("Add voter identities to the registry, then run `zkballot open`.");
    Ok(())
}
