use thiserror::Error;

/// Errores del dominio: validación de entradas del lado cliente.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid {field}: {reason}")]
    ValidationFailed { field: String, reason: String },
    #[error("unknown {kind} value: {value}")]
    UnknownVariant { kind: &'static str, value: String },
}

impl DomainError {
    pub fn invalid(field: &str, reason: impl Into<String>) -> Self {
        DomainError::ValidationFailed { field: field.to_string(),
                                        reason: reason.into() }
    }
}
