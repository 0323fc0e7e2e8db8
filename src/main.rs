use std::sync::Arc;

use crewflow_rust::{build_app, run_walkthrough, AppConfig};
use crew_core::RecordingNotifier;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
                             .init();

    // el recorrido siempre corre en memoria
    let cfg = AppConfig::in_memory();
    let notifier = Arc::new(RecordingNotifier::new());
    let app = match build_app(&cfg, notifier.clone()) {
        Ok(app) => app,
        Err(e) => {
            eprintln!("[crewflow-demo] {e}");
            std::process::exit(e.exit_code());
        }
    };
    let result = run_walkthrough(&app, &notifier, cfg.recent_applicants).await;
    app.console.dispose().await;
    match result.and_then(|report| serde_json::to_string_pretty(&report).map_err(Into::into)) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("[crewflow-demo] {e}");
            std::process::exit(e.exit_code());
        }
    }
}
