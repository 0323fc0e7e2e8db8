//! Errores del core.
//!
//! Taxonomía:
//! - `RemoteOperationFailed`: cualquier llamada al backend que falló.
//! - `ValidationFailed`: entrada rechazada del lado cliente, antes de tocar el
//!   backend.
//! - `NotFound`: acción explícita sobre una entidad ausente del store local.
//!   Las búsquedas tolerantes (`get_by_id`) modelan la ausencia con `None`.

use crew_domain::DomainError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub enum CoreError {
    #[error("{message}")]
    RemoteOperationFailed { message: String },
    #[error("invalid {field}: {reason}")]
    ValidationFailed { field: String, reason: String },
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: Uuid },
}

impl CoreError {
    pub fn remote(message: impl Into<String>) -> Self {
        CoreError::RemoteOperationFailed { message: message.into() }
    }

    pub fn invalid(field: &str, reason: impl Into<String>) -> Self {
        CoreError::ValidationFailed { field: field.to_string(),
                                      reason: reason.into() }
    }

    /// Mensaje subyacente, vacío si no hay detalle útil.
    pub fn detail(&self) -> String {
        match self {
            CoreError::RemoteOperationFailed { message } => message.trim().to_string(),
            other => other.to_string(),
        }
    }
}

impl From<DomainError> for CoreError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::ValidationFailed { field, reason } => CoreError::ValidationFailed { field, reason },
            DomainError::UnknownVariant { kind, value } => {
                CoreError::ValidationFailed { field: kind.to_string(),
                                              reason: format!("unknown value {value}") }
            }
        }
    }
}
