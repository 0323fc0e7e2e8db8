//! CrewFlow
//!
//! Librería de aplicación sobre los crates `crew-*`:
//! - `config`: `AppConfig` desde `.env` / entorno.
//! - `errors`: `AppError` y códigos de salida.
//! - `bootstrap`: arma la `Console` con backends Postgres o en memoria.
//! - `walkthrough`: recorrido guionado usado por el binario de demo.
//!
//! Lo usan `main.rs` (`crewflow-demo`) y la CLI `crew`.

pub mod bootstrap;
pub mod config;
pub mod errors;
pub mod walkthrough;

pub use bootstrap::{build_app, App};
pub use config::AppConfig;
pub use errors::AppError;
pub use walkthrough::{run_walkthrough, WalkthroughReport};
