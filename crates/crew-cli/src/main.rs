use std::sync::Arc;

use clap::Parser;
use crew_cli::{execute, Cli};
use crew_core::LogNotifier;
use crewflow_rust::{build_app, AppConfig, AppError};
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter)
                             .with_writer(std::io::stderr)
                             .init();
}

async fn run(cli: Cli) -> Result<String, AppError> {
    let cfg = AppConfig::from_env()?;
    if cfg.database.is_none() {
        log::warn!("DATABASE_URL no definido: backends en memoria, nada persiste entre ejecuciones");
    }
    let app = build_app(&cfg, Arc::new(LogNotifier))?;
    app.console.load().await?;
    let out = execute(&app, &cfg, cli.command).await;
    app.console.dispose().await;
    out
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match run(cli).await {
        Ok(out) => println!("{out}"),
        Err(e) => {
            eprintln!("[crew] {e}");
            std::process::exit(e.exit_code());
        }
    }
}
