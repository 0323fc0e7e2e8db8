//! Store por colección: caché local dueña de sus datos sobre un
//! `RecordBackend`.
//!
//! Mantiene `items` (más recientes primero), `loading` y `error`. Toda
//! mutación va primero al backend y sólo después se refleja localmente. Los
//! cambios remotos llegan por suscripción y se aplican por id con
//! last-write-wins sobre `updated_at`.
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use crew_domain::{next_status, previous_status, Applicant, ApplicantStatus, LadderStatus, Laddered, Record, Scope,
                  StatusChange, StatusChangeDraft};
use log::{debug, warn};
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::boundary::{ChangeEvent, ChangeKind, RecordBackend};
use crate::errors::CoreError;
use crate::notify::{Notifier, Operation};

#[derive(Debug, Clone)]
pub struct StoreState<R> {
    pub items: Vec<R>,
    pub loading: bool,
    pub error: Option<String>,
}

impl<R> Default for StoreState<R> {
    fn default() -> Self {
        Self { items: Vec::new(),
               loading: false,
               error: None }
    }
}

/// Efecto posterior a un update confirmado por el backend.
#[async_trait]
pub trait RecordHook<R: Record>: Send + Sync {
    async fn after_update(&self, before: Option<&R>, after: &R) -> Result<(), CoreError>;
}

pub struct RecordStore<R: Record> {
    backend: Arc<dyn RecordBackend<R>>,
    state: Arc<RwLock<StoreState<R>>>,
    notifier: Arc<dyn Notifier>,
    hooks: Vec<Arc<dyn RecordHook<R>>>,
    channels: Mutex<HashMap<Scope, JoinHandle<()>>>,
}

impl<R: Record> RecordStore<R> {
    pub fn new(backend: Arc<dyn RecordBackend<R>>, notifier: Arc<dyn Notifier>) -> Self {
        Self { backend,
               state: Arc::new(RwLock::new(StoreState::default())),
               notifier,
               hooks: Vec::new(),
               channels: Mutex::new(HashMap::new()) }
    }

    pub fn with_hook(mut self, hook: Arc<dyn RecordHook<R>>) -> Self {
        self.hooks.push(hook);
        self
    }

    pub fn backend(&self) -> Arc<dyn RecordBackend<R>> {
        Arc::clone(&self.backend)
    }

    pub async fn fetch_all(&self) -> Result<Vec<R>, CoreError> {
        self.fetch_scoped(Scope::All).await
    }

    /// Reemplaza la colección local por el listado del backend. Si falla se
    /// conserva la colección anterior.
    pub async fn fetch_scoped(&self, scope: Scope) -> Result<Vec<R>, CoreError> {
        self.state.write().await.loading = true;
        let result = self.backend.list(&scope).await;
        let mut state = self.state.write().await;
        state.loading = false;
        match result {
            Ok(rows) => {
                debug!("fetched {} {} rows for {:?}", rows.len(), R::COLLECTION, scope);
                state.items = rows.clone();
                state.error = None;
                Ok(rows)
            }
            Err(err) => {
                state.error = Some(err.detail());
                drop(state);
                self.notifier.notify(Operation::Fetch.failure(R::LABEL, &err));
                Err(err)
            }
        }
    }

    pub async fn create(&self, draft: R::Draft) -> Result<R, CoreError> {
        if let Err(err) = R::validate_draft(&draft) {
            return Err(self.fail(Operation::Add, err.into()).await);
        }
        let row = match self.backend.create(draft).await {
            Ok(row) => row,
            Err(err) => return Err(self.fail(Operation::Add, err).await),
        };
        upsert(&mut self.state.write().await.items, row.clone());
        self.notifier.notify(Operation::Add.success(R::LABEL));
        Ok(row)
    }

    pub async fn update(&self, id: Uuid, patch: R::Patch) -> Result<R, CoreError> {
        self.update_with(id, patch, Operation::Update).await
    }

    /// Update con el aviso de `op`. Los hooks reciben el valor previo (local o,
    /// si no está en caché, leído del backend).
    pub(crate) async fn update_with(&self, id: Uuid, patch: R::Patch, op: Operation) -> Result<R, CoreError> {
        if let Err(err) = R::validate_patch(&patch) {
            return Err(self.fail(op, err.into()).await);
        }
        let mut before = self.find(id).await;
        if before.is_none() && !self.hooks.is_empty() {
            before = match self.backend.get_by_id(id).await {
                Ok(row) => row,
                Err(err) => return Err(self.fail(op, err).await),
            };
        }
        let row = match self.backend.update(id, patch).await {
            Ok(row) => row,
            Err(err) => return Err(self.fail(op, err).await),
        };
        replace_if_newer(&mut self.state.write().await.items, row.clone());
        for hook in &self.hooks {
            if let Err(err) = hook.after_update(before.as_ref(), &row).await {
                return Err(self.fail(op, err).await);
            }
        }
        self.notifier.notify(op.success(R::LABEL));
        Ok(row)
    }

    /// Borra por id. Repetirlo no falla.
    pub async fn delete(&self, id: Uuid) -> Result<(), CoreError> {
        if let Err(err) = self.backend.delete(id).await {
            return Err(self.fail(Operation::Delete, err).await);
        }
        self.state.write().await.items.retain(|r| r.id() != id);
        self.notifier.notify(Operation::Delete.success(R::LABEL));
        Ok(())
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<R>, CoreError> {
        self.backend.get_by_id(id).await
    }

    pub async fn find(&self, id: Uuid) -> Option<R> {
        self.state.read().await.items.iter().find(|r| r.id() == id).cloned()
    }

    pub async fn snapshot(&self) -> Vec<R> {
        self.state.read().await.items.clone()
    }

    pub async fn is_loading(&self) -> bool {
        self.state.read().await.loading
    }

    pub async fn last_error(&self) -> Option<String> {
        self.state.read().await.error.clone()
    }

    /// Abre el canal de cambios de `scope`. Devuelve `Ok(false)` si ya había
    /// uno activo.
    pub async fn subscribe_to_changes(&self, scope: Scope) -> Result<bool, CoreError> {
        let mut channels = self.channels.lock().await;
        if channels.get(&scope).is_some_and(|h| !h.is_finished()) {
            return Ok(false);
        }
        let mut feed = self.backend.subscribe(scope).await?;
        let state = Arc::clone(&self.state);
        let channel = scope.channel_name(R::COLLECTION);
        debug!("subscribed to {channel}");
        let handle = tokio::spawn(async move {
            while let Some(event) = feed.next().await {
                apply_change(&mut state.write().await.items, event);
            }
            debug!("change feed {channel} closed");
        });
        channels.insert(scope, handle);
        Ok(true)
    }

    pub async fn unsubscribe(&self, scope: Scope) -> bool {
        match self.channels.lock().await.remove(&scope) {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    pub async fn unsubscribe_all(&self) {
        for (_, handle) in self.channels.lock().await.drain() {
            handle.abort();
        }
    }

    pub async fn active_subscriptions(&self) -> Vec<Scope> {
        self.channels
            .lock()
            .await
            .iter()
            .filter(|(_, h)| !h.is_finished())
            .map(|(scope, _)| *scope)
            .collect()
    }

    pub async fn dispose(&self) {
        self.unsubscribe_all().await;
    }

    pub(crate) async fn fail(&self, op: Operation, err: CoreError) -> CoreError {
        if matches!(err, CoreError::RemoteOperationFailed { .. }) {
            self.state.write().await.error = Some(err.detail());
        }
        self.notifier.notify(op.failure(R::LABEL, &err));
        err
    }
}

impl<R: Laddered> RecordStore<R> {
    /// Avanza un paso. Ausente localmente o al final de la escalera: no-op.
    pub async fn promote(&self, id: Uuid, note: Option<String>) -> Result<Option<R>, CoreError> {
        self.step(id, note, true).await
    }

    pub async fn demote(&self, id: Uuid, note: Option<String>) -> Result<Option<R>, CoreError> {
        self.step(id, note, false).await
    }

    /// Salto explícito a cualquier estado (incluidos los terminales).
    pub async fn transition(&self, id: Uuid, status: R::Status, note: Option<String>) -> Result<R, CoreError> {
        self.update_with(id, R::status_patch(status, note), Operation::Update).await
    }

    async fn step(&self, id: Uuid, note: Option<String>, forward: bool) -> Result<Option<R>, CoreError> {
        let Some(current) = self.find(id).await else {
            return Ok(None);
        };
        let status = current.status();
        if status.is_terminal() {
            let op = if forward {
                Operation::Promote(status.to_string())
            } else {
                Operation::Demote(status.to_string())
            };
            let err = CoreError::invalid("status", format!("{status} is terminal"));
            return Err(self.fail(op, err).await);
        }
        let ladder = R::Status::LADDER;
        let target = if forward {
            next_status(status, ladder)
        } else {
            previous_status(status, ladder)
        };
        let Some(target) = target else {
            return Ok(None);
        };
        let op = if forward {
            Operation::Promote(target.to_string())
        } else {
            Operation::Demote(target.to_string())
        };
        self.update_with(id, R::status_patch(target, note), op).await.map(Some)
    }
}

impl RecordStore<Applicant> {
    pub async fn cancel(&self, id: Uuid, note: Option<String>) -> Result<Applicant, CoreError> {
        self.update_with(id, Applicant::status_patch(ApplicantStatus::Cancelled, note), Operation::Cancel)
            .await
    }
}

impl<R: Record> Drop for RecordStore<R> {
    fn drop(&mut self) {
        for (_, handle) in self.channels.get_mut().drain() {
            handle.abort();
        }
    }
}

/// Inserta al principio o reemplaza si el id ya está (p.ej. porque el evento
/// de inserción llegó antes que la respuesta). Una fila local más nueva gana.
fn upsert<R: Record>(items: &mut Vec<R>, row: R) {
    if !replace_if_newer(items, row.clone()) && !items.iter().any(|r| r.id() == row.id()) {
        items.insert(0, row);
    }
}

/// Reemplaza la fila con el mismo id salvo que la local tenga un
/// `updated_at` posterior. Devuelve `true` si reemplazó.
fn replace_if_newer<R: Record>(items: &mut [R], row: R) -> bool {
    match items.iter_mut().find(|r| r.id() == row.id()) {
        Some(slot) if row.updated_at() >= slot.updated_at() => {
            *slot = row;
            true
        }
        _ => false,
    }
}

/// Aplica un evento de cambio sobre la colección local. Devuelve `true` si la
/// colección cambió.
pub fn apply_change<R: Record>(items: &mut Vec<R>, event: ChangeEvent<R>) -> bool {
    match event.kind {
        ChangeKind::Insert | ChangeKind::Update => {
            let Some(row) = event.new else {
                warn!("{} {:?} event without row", R::COLLECTION, event.kind);
                return false;
            };
            match items.iter_mut().find(|r| r.id() == row.id()) {
                Some(slot) if row.updated_at() >= slot.updated_at() => {
                    *slot = row;
                    true
                }
                Some(_) => false,
                None if event.kind == ChangeKind::Insert => {
                    items.insert(0, row);
                    true
                }
                None => false,
            }
        }
        ChangeKind::Delete => {
            let Some(id) = event.old.as_ref().map(|r| r.id()) else {
                return false;
            };
            let before = items.len();
            items.retain(|r| r.id() != id);
            items.len() != before
        }
    }
}

/// Historial append-only de transiciones; se engancha como hook de los
/// stores con escalera.
pub struct StatusHistory<S: LadderStatus + serde::Serialize + serde::de::DeserializeOwned> {
    backend: Arc<dyn RecordBackend<StatusChange<S>>>,
}

impl<S> StatusHistory<S> where S: LadderStatus + serde::Serialize + serde::de::DeserializeOwned
{
    pub fn new(backend: Arc<dyn RecordBackend<StatusChange<S>>>) -> Self {
        Self { backend }
    }

    pub async fn append(&self, subject_id: Uuid, old_status: S, new_status: S, note: Option<String>)
                        -> Result<StatusChange<S>, CoreError> {
        self.backend
            .create(StatusChangeDraft { subject_id,
                                        old_status,
                                        new_status,
                                        note })
            .await
    }

    /// Transiciones de un sujeto, más antiguas primero.
    pub async fn for_subject(&self, subject_id: Uuid) -> Result<Vec<StatusChange<S>>, CoreError> {
        let mut changes = self.backend.list(&Scope::Owner(subject_id)).await?;
        changes.sort_by(|a, b| a.changed_at.cmp(&b.changed_at));
        Ok(changes)
    }
}

#[async_trait]
impl<R> RecordHook<R> for StatusHistory<R::Status> where R: Laddered
{
    async fn after_update(&self, before: Option<&R>, after: &R) -> Result<(), CoreError> {
        let Some(before) = before else {
            warn!("{} {} updated without a known previous status", R::LABEL, after.id());
            return Ok(());
        };
        if before.status() == after.status() {
            return Ok(());
        }
        self.append(after.id(),
                    before.status(),
                    after.status(),
                    after.status_note().map(str::to_string))
            .await
            .map(|_| ())
    }
}
