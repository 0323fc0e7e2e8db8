//! Configuración central de la aplicación.
//! Carga variables de entorno (.env) una sola vez y arma `AppConfig` con las
//! secciones opcionales: sin `DATABASE_URL` se usan backends en memoria y sin
//! credenciales de EmailJS los correos se retienen en memoria.
use std::env;

use chrono::Duration;
use crew_adapters::EmailJsConfig;
use crew_core::otp::DEFAULT_OTP_TTL_MINUTES;
use crew_persistence::DbConfig;
use once_cell::sync::Lazy;

use crate::errors::AppError;

static DOTENV_LOADED: Lazy<()> = Lazy::new(|| {
    let _ = dotenvy::dotenv();
});

/// Configuración de la aplicación (inmutable una vez construida).
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Vigencia de los códigos de recuperación.
    pub otp_ttl: Duration,
    /// Cantidad de postulantes recientes en el resumen.
    pub recent_applicants: usize,
    /// `None` => backends en memoria.
    pub database: Option<DbConfig>,
    /// `None` => correos retenidos en memoria.
    pub mail: Option<EmailJsConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self { otp_ttl: Duration::minutes(DEFAULT_OTP_TTL_MINUTES),
               recent_applicants: 5,
               database: None,
               mail: None }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> Result<T, AppError> {
    match env::var(name) {
        Ok(raw) => raw.trim()
                      .parse()
                      .map_err(|_| AppError::Config(format!("{name} inválido: {raw}"))),
        Err(_) => Ok(default),
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Lazy::force(&DOTENV_LOADED);
        let ttl_minutes: i64 = parse_var("OTP_TTL_MINUTES", DEFAULT_OTP_TTL_MINUTES)?;
        if ttl_minutes <= 0 {
            return Err(AppError::Config(format!("OTP_TTL_MINUTES debe ser positivo: {ttl_minutes}")));
        }
        let database = match env::var("DATABASE_URL") {
            Ok(_) => Some(DbConfig::from_env()?),
            Err(_) => None,
        };
        let mail = match env::var("EMAILJS_SERVICE_ID") {
            Ok(_) => Some(EmailJsConfig::from_env()?),
            Err(_) => None,
        };
        Ok(Self { otp_ttl: Duration::minutes(ttl_minutes),
                  recent_applicants: parse_var("RECENT_APPLICANTS", 5)?,
                  database,
                  mail })
    }

    /// Sólo memoria, sin leer el entorno (demo y tests).
    pub fn in_memory() -> Self {
        Self::default()
    }
}
