//! crew-adapters
//!
//! Adaptadores hacia servicios externos:
//! - `emailjs`: despacho de correos transaccionales vía la API REST de EmailJS.
//! - `config`: lectura de credenciales desde `.env` / entorno.

pub mod config;
pub mod emailjs;

pub use config::{AdapterConfigError, EmailJsConfig, DEFAULT_EMAILJS_ENDPOINT};
pub use emailjs::{EmailJsDispatcher, EmailJsRequest};
