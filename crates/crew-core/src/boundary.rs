//! Frontera de acceso a datos.
//!
//! El backend (tablas, storage de blobs, notificaciones de cambios) es una caja
//! negra consumida a través de estos traits. Todas las llamadas son
//! asíncronas y cualquier fallo llega como `CoreError::RemoteOperationFailed`.
//!
//! Cambios en tiempo real: cada colección publica `ChangeEvent`s en un
//! `ChangeHub` (broadcast). Un suscriptor recibe un `ChangeFeed` acotado a un
//! `Scope`; no hay garantías de orden ni de entrega única, los consumidores
//! aplican por id de forma idempotente.
use async_trait::async_trait;
use crew_domain::{Record, Scope, StoredImage};
use log::warn;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use uuid::Uuid;

use crate::errors::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// Evento de cambio sobre una fila. `new` viene en insert/update, `old` en
/// update/delete (si el backend lo conoce).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent<R> {
    pub kind: ChangeKind,
    pub new: Option<R>,
    pub old: Option<R>,
}

impl<R: Record> ChangeEvent<R> {
    pub fn insert(row: R) -> Self {
        Self { kind: ChangeKind::Insert,
               new: Some(row),
               old: None }
    }

    pub fn update(old: Option<R>, new: R) -> Self {
        Self { kind: ChangeKind::Update,
               new: Some(new),
               old }
    }

    pub fn delete(old: R) -> Self {
        Self { kind: ChangeKind::Delete,
               new: None,
               old: Some(old) }
    }

    /// Id de la fila afectada.
    pub fn row_id(&self) -> Option<Uuid> {
        self.new.as_ref().or(self.old.as_ref()).map(Record::id)
    }

    pub fn matches(&self, scope: &Scope) -> bool {
        self.new.as_ref().is_some_and(|r| scope.matches(r)) || self.old.as_ref().is_some_and(|r| scope.matches(r))
    }
}

/// Canal de difusión de cambios de una colección.
pub struct ChangeHub<R: Record> {
    sender: broadcast::Sender<ChangeEvent<R>>,
}

impl<R: Record> ChangeHub<R> {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publica un evento. Sin suscriptores el evento se descarta.
    pub fn publish(&self, event: ChangeEvent<R>) {
        let _ = self.sender.send(event);
    }

    pub fn feed(&self, scope: Scope) -> ChangeFeed<R> {
        ChangeFeed { scope,
                     receiver: self.sender.subscribe() }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl<R: Record> Default for ChangeHub<R> {
    fn default() -> Self {
        Self::new(256)
    }
}

/// Flujo de cambios acotado a un scope. Se cierra cuando el hub se destruye.
pub struct ChangeFeed<R: Record> {
    scope: Scope,
    receiver: broadcast::Receiver<ChangeEvent<R>>,
}

impl<R: Record> ChangeFeed<R> {
    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub async fn next(&mut self) -> Option<ChangeEvent<R>> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if event.matches(&self.scope) => return Some(event),
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    warn!("change feed {} lagged, {skipped} events skipped",
                          self.scope.channel_name(R::COLLECTION));
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}

/// Operaciones CRUD + suscripción sobre una colección del backend.
#[async_trait]
pub trait RecordBackend<R: Record>: Send + Sync {
    /// Filas del scope, más recientes primero.
    async fn list(&self, scope: &Scope) -> Result<Vec<R>, CoreError>;
    /// La ausencia no es un error.
    async fn get_by_id(&self, id: Uuid) -> Result<Option<R>, CoreError>;
    async fn create(&self, draft: R::Draft) -> Result<R, CoreError>;
    async fn update(&self, id: Uuid, patch: R::Patch) -> Result<R, CoreError>;
    /// Borrar un id inexistente no falla.
    async fn delete(&self, id: Uuid) -> Result<(), CoreError>;
    async fn subscribe(&self, scope: Scope) -> Result<ChangeFeed<R>, CoreError>;
}

/// Archivo a subir tal como llega del formulario.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl BlobFile {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self { file_name: file_name.into(),
               content_type: None,
               bytes }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// Storage de blobs organizado en carpetas (buckets).
#[async_trait]
pub trait BlobStorage: Send + Sync {
    /// Sube (o reemplaza) `path` dentro de `folder` y devuelve su URL pública.
    async fn upload_blob(&self, folder: &str, path: &str, file: &BlobFile) -> Result<StoredImage, CoreError>;
    async fn delete_blob(&self, folder: &str, path: &str) -> Result<(), CoreError>;
}
