//! Backends en memoria (tests, demo y desarrollo sin base de datos).
//!
//! Replican el contrato observable de la frontera: orden por `created_at`
//! descendente, borrado idempotente, eventos de cambio tras cada mutación.
//! Permiten además inyectar fallos para ejercitar las rutas de error.
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use crew_domain::{Record, Scope, StoredImage};
use dashmap::DashMap;
use uuid::Uuid;

use crate::boundary::{BlobFile, BlobStorage, ChangeEvent, ChangeFeed, ChangeHub, RecordBackend};
use crate::clock::{Clock, SystemClock};
use crate::errors::CoreError;

/// Colección en memoria para un tipo de `Record`.
pub struct InMemoryBackend<R: Record> {
    rows: DashMap<Uuid, R>,
    hub: ChangeHub<R>,
    clock: Arc<dyn Clock>,
    failure: Mutex<Option<String>>,
}

impl<R: Record> InMemoryBackend<R> {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self { rows: DashMap::new(),
               hub: ChangeHub::default(),
               clock,
               failure: Mutex::new(None) }
    }

    /// Con `Some(msg)` todas las llamadas fallan con ese mensaje hasta que se
    /// restablezca con `None`.
    pub fn set_failure(&self, message: Option<&str>) {
        *self.failure.lock().unwrap_or_else(|p| p.into_inner()) = message.map(str::to_string);
    }

    /// Inserta una fila tal cual, sin pasar por `from_draft` ni emitir evento.
    pub fn seed(&self, row: R) {
        self.rows.insert(row.id(), row);
    }

    /// Publica un evento como si viniera de otro cliente.
    pub fn publish(&self, event: ChangeEvent<R>) {
        self.hub.publish(event);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn subscriber_count(&self) -> usize {
        self.hub.subscriber_count()
    }

    fn check(&self) -> Result<(), CoreError> {
        match self.failure.lock().unwrap_or_else(|p| p.into_inner()).as_ref() {
            Some(message) => Err(CoreError::remote(message.clone())),
            None => Ok(()),
        }
    }
}

impl<R: Record> Default for InMemoryBackend<R> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<R: Record> RecordBackend<R> for InMemoryBackend<R> {
    async fn list(&self, scope: &Scope) -> Result<Vec<R>, CoreError> {
        self.check()?;
        let mut rows: Vec<R> = self.rows
                                   .iter()
                                   .filter(|entry| scope.matches(entry.value()))
                                   .map(|entry| entry.value().clone())
                                   .collect();
        rows.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        Ok(rows)
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<R>, CoreError> {
        self.check()?;
        Ok(self.rows.get(&id).map(|entry| entry.value().clone()))
    }

    async fn create(&self, draft: R::Draft) -> Result<R, CoreError> {
        self.check()?;
        let row = R::from_draft(Uuid::new_v4(), draft, self.clock.now());
        self.rows.insert(row.id(), row.clone());
        self.hub.publish(ChangeEvent::insert(row.clone()));
        Ok(row)
    }

    async fn update(&self, id: Uuid, patch: R::Patch) -> Result<R, CoreError> {
        self.check()?;
        let (old, new) = {
            let mut entry = self.rows
                                .get_mut(&id)
                                .ok_or_else(|| CoreError::remote(format!("{} {id} not found", R::LABEL)))?;
            let old = entry.value().clone();
            entry.value_mut().apply_patch(patch, self.clock.now());
            (old, entry.value().clone())
        };
        self.hub.publish(ChangeEvent::update(Some(old), new.clone()));
        Ok(new)
    }

    async fn delete(&self, id: Uuid) -> Result<(), CoreError> {
        self.check()?;
        if let Some((_, old)) = self.rows.remove(&id) {
            self.hub.publish(ChangeEvent::delete(old));
        }
        Ok(())
    }

    async fn subscribe(&self, scope: Scope) -> Result<ChangeFeed<R>, CoreError> {
        self.check()?;
        Ok(self.hub.feed(scope))
    }
}

/// Storage de blobs en memoria, indexado por ruta.
pub struct InMemoryBlobStorage {
    base_url: String,
    blobs: DashMap<String, BlobFile>,
    fail_uploads: Mutex<Option<String>>,
    fail_deletes: Mutex<Option<String>>,
}

impl InMemoryBlobStorage {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into().trim_end_matches('/').to_string(),
               blobs: DashMap::new(),
               fail_uploads: Mutex::new(None),
               fail_deletes: Mutex::new(None) }
    }

    pub fn contains(&self, path: &str) -> bool {
        self.blobs.contains_key(path)
    }

    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.blobs.iter().map(|e| e.key().clone()).collect();
        paths.sort();
        paths
    }

    pub fn set_upload_failure(&self, message: Option<&str>) {
        *self.fail_uploads.lock().unwrap_or_else(|p| p.into_inner()) = message.map(str::to_string);
    }

    pub fn set_delete_failure(&self, message: Option<&str>) {
        *self.fail_deletes.lock().unwrap_or_else(|p| p.into_inner()) = message.map(str::to_string);
    }
}

impl Default for InMemoryBlobStorage {
    fn default() -> Self {
        Self::new("memory://storage")
    }
}

#[async_trait]
impl BlobStorage for InMemoryBlobStorage {
    async fn upload_blob(&self, folder: &str, path: &str, file: &BlobFile) -> Result<StoredImage, CoreError> {
        if let Some(message) = self.fail_uploads.lock().unwrap_or_else(|p| p.into_inner()).clone() {
            return Err(CoreError::remote(message));
        }
        self.blobs.insert(path.to_string(), file.clone());
        Ok(StoredImage { url: format!("{}/{folder}/{path}", self.base_url),
                         path: path.to_string() })
    }

    async fn delete_blob(&self, _folder: &str, path: &str) -> Result<(), CoreError> {
        if let Some(message) = self.fail_deletes.lock().unwrap_or_else(|p| p.into_inner()).clone() {
            return Err(CoreError::remote(message));
        }
        self.blobs.remove(path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crew_domain::{Applicant, ApplicantDraft, ApplicantPatch, EmploymentType};

    use super::*;
    use crate::boundary::ChangeKind;

    fn draft(name: &str) -> ApplicantDraft {
        ApplicantDraft::new(name, format!("{}@x.com", name.to_lowercase()), EmploymentType::FullTime)
    }

    #[tokio::test]
    async fn crud_round_and_events() {
        let backend = InMemoryBackend::<Applicant>::new();
        let mut feed = backend.subscribe(Scope::All).await.unwrap();

        let created = backend.create(draft("Jane")).await.unwrap();
        let ev = feed.next().await.unwrap();
        assert_eq!(ev.kind, ChangeKind::Insert);
        assert_eq!(ev.row_id(), Some(created.id));

        let patch = ApplicantPatch { fullname: Some("Jane D.".into()), ..Default::default() };
        let updated = backend.update(created.id, patch).await.unwrap();
        assert_eq!(updated.fullname, "Jane D.");
        let ev = feed.next().await.unwrap();
        assert_eq!(ev.kind, ChangeKind::Update);
        assert_eq!(ev.old.unwrap().fullname, "Jane");

        backend.delete(created.id).await.unwrap();
        backend.delete(created.id).await.unwrap();
        let ev = feed.next().await.unwrap();
        assert_eq!(ev.kind, ChangeKind::Delete);
        assert!(backend.get_by_id(created.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_of_missing_row_fails_remotely() {
        let backend = InMemoryBackend::<Applicant>::new();
        let err = backend.update(Uuid::new_v4(), ApplicantPatch::default()).await.unwrap_err();
        assert!(matches!(err, CoreError::RemoteOperationFailed { .. }));
    }

    #[tokio::test]
    async fn injected_failure_applies_to_every_call() {
        let backend = InMemoryBackend::<Applicant>::new();
        backend.set_failure(Some("network down"));
        assert_eq!(backend.list(&Scope::All).await.unwrap_err(), CoreError::remote("network down"));
        backend.set_failure(None);
        assert!(backend.list(&Scope::All).await.unwrap().is_empty());
    }
}
