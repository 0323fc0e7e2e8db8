//! crew-cli: subcomandos de operación sobre la consola CrewFlow.
//!
//! Con `DATABASE_URL` trabaja contra Postgres; sin ella usa backends en
//! memoria (los datos viven sólo durante el proceso).

pub mod actions;
pub mod commands;

pub use actions::execute;
pub use commands::Cli;
