//! Credenciales de EmailJS desde variables de entorno.

use std::env;

use once_cell::sync::Lazy;
use thiserror::Error;

static DOTENV_LOADED: Lazy<()> = Lazy::new(|| {
    let _ = dotenvy::dotenv();
});

pub const DEFAULT_EMAILJS_ENDPOINT: &str = "https://api.emailjs.com/api/v1.0/email/send";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AdapterConfigError {
    #[error("missing environment variable {0}")]
    Missing(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailJsConfig {
    pub endpoint: String,
    pub service_id: String,
    /// "user_id" en la API pública.
    pub public_key: String,
    pub deployment_template_id: String,
    pub otp_template_id: String,
}

fn required(name: &'static str) -> Result<String, AdapterConfigError> {
    env::var(name).ok()
                  .filter(|v| !v.trim().is_empty())
                  .ok_or(AdapterConfigError::Missing(name))
}

impl EmailJsConfig {
    pub fn from_env() -> Result<Self, AdapterConfigError> {
        Lazy::force(&DOTENV_LOADED);
        Ok(Self { endpoint: env::var("EMAILJS_ENDPOINT").unwrap_or_else(|_| DEFAULT_EMAILJS_ENDPOINT.to_string()),
                  service_id: required("EMAILJS_SERVICE_ID")?,
                  public_key: required("EMAILJS_PUBLIC_KEY")?,
                  deployment_template_id: required("EMAILJS_DEPLOY_TEMPLATE_ID")?,
                  otp_template_id: required("EMAILJS_OTP_TEMPLATE_ID")? })
    }
}
