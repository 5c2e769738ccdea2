use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use gws::config::loader::{apply_env, fill_missing_secrets, finalize, load_config};
use gws::lifecycle::{signals, startup, Shutdown};
use gws::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "gws")]
#[command(about = "Small web server with encrypted cookie sessions", long_about = None)]
struct Cli {
    /// Address to listen on, e.g. localhost:8080.
    #[arg(short, long, env = "GWS_LISTEN_ADDR")]
    listen: Option<String>,

    /// Optional TOML configuration file.
    #[arg(short, long, env = "GWS_CONFIG")]
    config: Option<PathBuf>,

    /// Log level when RUST_LOG is not set.
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;
    apply_env(&mut config);
    if let Some(listen) = cli.listen {
        config.listener.bind_address = listen;
    }
    if let Some(level) = cli.log_level {
        config.observability.log_level = level;
    }

    logging::init_logging(&config.observability.log_level);
    tracing::info!("gws v{} starting", env!("CARGO_PKG_VERSION"));

    for field in fill_missing_secrets(&mut config) {
        tracing::warn!(
            field,
            "No secret configured, generated a random one; sessions will not survive a restart"
        );
    }
    let config = finalize(config)?;

    tracing::info!(
        bind_address = %config.listener.bind_address,
        read_timeout_secs = config.timeouts.read_secs,
        write_timeout_secs = config.timeouts.write_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let shutdown = Arc::new(Shutdown::new());
    signals::spawn_signal_handler(shutdown.clone());

    startup::run(&config, shutdown).await?;
    Ok(())
}
