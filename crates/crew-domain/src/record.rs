//! Contrato común de las entidades persistidas.
//!
//! Cada colección del backend se modela como un tipo `Record` con un borrador
//! de creación (`Draft`) y un parche parcial (`Patch`). Los backends son
//! genéricos sobre este trait: construyen la entidad con `from_draft` y
//! aplican los cambios con `apply_patch`, de modo que las reglas de forma
//! viven aquí y no en cada adaptador.
use std::fmt::Debug;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;
use crate::ladder::LadderStatus;

pub trait Record: Clone + Debug + Send + Sync + Serialize + DeserializeOwned + 'static {
    type Draft: Clone + Debug + Send + Sync + 'static;
    type Patch: Clone + Debug + Send + Sync + 'static;

    /// Nombre de la tabla/colección en el backend.
    const COLLECTION: &'static str;
    /// Nombre legible en singular, usado en notificaciones.
    const LABEL: &'static str;

    fn id(&self) -> Uuid;
    fn created_at(&self) -> DateTime<Utc>;
    /// Marca de escritura del servidor; decide last-write-wins.
    fn updated_at(&self) -> DateTime<Utc>;

    /// Clave foránea usada para acotar listados y suscripciones.
    fn owner_id(&self) -> Option<Uuid> {
        None
    }

    fn validate_draft(_draft: &Self::Draft) -> Result<(), DomainError> {
        Ok(())
    }

    fn validate_patch(_patch: &Self::Patch) -> Result<(), DomainError> {
        Ok(())
    }

    fn from_draft(id: Uuid, draft: Self::Draft, now: DateTime<Utc>) -> Self;

    fn apply_patch(&mut self, patch: Self::Patch, now: DateTime<Utc>);
}

/// Entidad que avanza por una escalera de estados.
pub trait Laddered: Record {
    type Status: LadderStatus + Serialize + DeserializeOwned;

    fn status(&self) -> Self::Status;

    /// Nota libre adjunta a la última transición.
    fn status_note(&self) -> Option<&str>;

    /// Parche que mueve la entidad a `status` con una nota opcional.
    fn status_patch(status: Self::Status, note: Option<String>) -> Self::Patch;
}

/// Alcance de un listado o de una suscripción.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scope {
    #[default]
    All,
    Owner(Uuid),
}

impl Scope {
    pub fn matches<R: Record>(&self, record: &R) -> bool {
        match self {
            Scope::All => true,
            Scope::Owner(owner) => record.owner_id() == Some(*owner),
        }
    }

    /// Nombre del canal de cambios para una colección dentro de este alcance.
    pub fn channel_name(&self, collection: &str) -> String {
        match self {
            Scope::All => format!("{collection}-changes"),
            Scope::Owner(owner) => format!("{collection}-{owner}"),
        }
    }
}
