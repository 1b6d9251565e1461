//! Cacheway CLI entry point.

use clap::Parser;

use cacheway::cli::{self, Cli, Commands};
use cacheway::infrastructure::logging::{LogConfig, LoggerImpl};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match cli::load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => cli::handle_error(err, cli.json),
    };

    // Command output owns stdout; log lines join it only when RUST_LOG is set.
    let mut log_config = LogConfig::from(&config.logging);
    log_config.enable_stdout = std::env::var_os("RUST_LOG").is_some();
    let _logger = match LoggerImpl::init(&log_config) {
        Ok(logger) => Some(logger),
        Err(err) => {
            eprintln!("warning: logging disabled: {err}");
            None
        }
    };

    let result = match cli.command {
        Commands::Install => cli::commands::install::execute(&config, cli.json).await,
        Commands::Fetch(args) => cli::commands::fetch::execute(args, &config, cli.json).await,
        Commands::Partitions => cli::commands::partitions::execute(&config, cli.json).await,
        Commands::Window(args) => cli::commands::window::execute(&args, &config, cli.json),
    };

    if let Err(err) = result {
        cli::handle_error(err, cli.json);
    }
}
