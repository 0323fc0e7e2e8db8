use crew_adapters::AdapterConfigError;
use crew_core::CoreError;
use crew_persistence::PersistenceError;
use thiserror::Error;

/// Errores de la aplicación (arranque, configuración y comandos).
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Core(#[from] CoreError),
    #[error("Error de persistencia: {0}")]
    Persistence(#[from] PersistenceError),
    #[error("Error de configuración: {0}")]
    Config(String),
    #[error("Error en IO: {0}")]
    Io(#[from] std::io::Error),
    #[error("Error de serialización: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<AdapterConfigError> for AppError {
    fn from(err: AdapterConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl AppError {
    /// Código de salida para procesos: 4 = rechazo del dominio, 5 = fallo de
    /// infraestructura.
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::Core(CoreError::ValidationFailed { .. }) | AppError::Core(CoreError::NotFound { .. }) => 4,
            _ => 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_variant_format() {
        let err = AppError::Config("OTP_TTL_MINUTES inválido".into());
        assert_eq!(err.to_string(), "Error de configuración: OTP_TTL_MINUTES inválido");
    }

    #[test]
    fn core_errors_keep_their_message() {
        let err: AppError = CoreError::remote("quota exceeded").into();
        assert_eq!(err.to_string(), "quota exceeded");
        assert_eq!(err.exit_code(), 5);
    }

    #[test]
    fn missing_email_settings_are_config_errors() {
        let err: AppError = AdapterConfigError::Missing("EMAILJS_SERVICE_ID").into();
        assert!(matches!(err, AppError::Config(_)));
        assert!(err.to_string().contains("EMAILJS_SERVICE_ID"));
    }

    #[test]
    fn io_variant_from() {
        let err: AppError = std::io::Error::other("falló IO").into();
        assert_eq!(err.to_string(), "Error en IO: falló IO");
    }
}
