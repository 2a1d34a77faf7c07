mod cli;

use clap::Parser;
use cli::Cli;
use tracing_subscriber::EnvFilter;
use zkballot::config::PollConfig;

fn init_logging(cli: &Cli) {
    let level = PollConfig::load(&cli.config_path())
        .map(|config| config.logging.level)
        .unwrap_or_else(|_| "info".to_string());

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(&cli);

    if let Err(e) = cli::execute(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
