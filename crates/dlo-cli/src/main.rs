//! `dlo` — run the delivery scheduler and manage accounts, memories and
//! messages from the command line.
//!
//! ```bash
//! dlo serve
//! dlo user create -e alice@example.com -n Alice -p hunter22
//! dlo memory schedule -u alice@example.com -t "Happy birthday" \
//!     --to kid@example.com -m "Proud of you." --at 2030-05-01T09:00
//! dlo memory send-now -u alice@example.com <ID>
//! dlo deliver-once
//! ```

use clap::Parser;
use tracing::warn;

mod app;
mod cli;
mod commands;

use cli::Cli;
use dlo_core::config::DloConfig;

const DEFAULT_LOG_FILTER: &str =
    "dlo=info,dlo_scheduler=info,dlo_notify=info,dlo_memories=info,dlo_users=info";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is normal.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .init();

    let cli = Cli::parse();

    // load config: --config > DLO_CONFIG env > ./dlo.toml
    let config_path = cli.config.clone().or_else(|| std::env::var("DLO_CONFIG").ok());
    let config = DloConfig::load(config_path.as_deref()).unwrap_or_else(|e| {
        warn!("Config load failed ({}), using defaults", e);
        DloConfig::default()
    });

    let app = app::App::open(config)?;
    commands::run(&app, cli.command).await
}
