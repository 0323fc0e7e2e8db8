//! Nota del administrador: una sola fila vigente, la más reciente.
use crew_domain::{AdminNote, NoteDraft, NotePatch};
use tokio::sync::RwLock;

use crate::errors::CoreError;
use crate::notify::Operation;
use crate::store::RecordStore;

pub struct NoteBoard {
    notes: RecordStore<AdminNote>,
    current: RwLock<Option<AdminNote>>,
}

impl NoteBoard {
    pub fn new(notes: RecordStore<AdminNote>) -> Self {
        Self { notes,
               current: RwLock::new(None) }
    }

    pub async fn current(&self) -> Option<AdminNote> {
        self.current.read().await.clone()
    }

    /// Nota más reciente por `created_at`, o `None` si no hay ninguna.
    pub async fn fetch_latest(&self) -> Result<Option<AdminNote>, CoreError> {
        let latest = self.notes.fetch_all().await?.into_iter().max_by_key(|n| n.created_at);
        *self.current.write().await = latest.clone();
        Ok(latest)
    }

    /// Actualiza la nota vigente; si aún no se leyó, la busca antes de decidir
    /// entre actualizar e insertar.
    pub async fn save(&self, text: &str) -> Result<AdminNote, CoreError> {
        let text = text.to_string();
        let mut known = self.current.read().await.as_ref().map(|n| n.id);
        if known.is_none() {
            known = self.fetch_latest().await?.map(|n| n.id);
        }
        let saved = match known {
            Some(id) => self.notes.update_with(id, NotePatch { text }, Operation::SaveNote).await?,
            None => self.notes.create(NoteDraft { text }).await?,
        };
        *self.current.write().await = Some(saved.clone());
        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::boundary::RecordBackend;
    use crate::memory::InMemoryBackend;
    use crate::notify::RecordingNotifier;

    #[tokio::test]
    async fn save_upserts_the_single_note() {
        let backend = Arc::new(InMemoryBackend::<AdminNote>::new());
        let board = NoteBoard::new(RecordStore::new(backend.clone(), Arc::new(RecordingNotifier::new())));
        assert!(board.fetch_latest().await.unwrap().is_none());

        let first = board.save("Inventory on Friday").await.unwrap();
        let second = board.save("Inventory moved to Saturday").await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(backend.len(), 1);
        assert_eq!(board.fetch_latest().await.unwrap().unwrap().text, "Inventory moved to Saturday");
    }

    #[tokio::test]
    async fn fresh_board_updates_the_existing_note() {
        let backend = Arc::new(InMemoryBackend::<AdminNote>::new());
        let existing = backend.create(NoteDraft { text: "Inventory on Friday".into() })
                              .await
                              .unwrap();

        let board = NoteBoard::new(RecordStore::new(backend.clone(), Arc::new(RecordingNotifier::new())));
        let saved = board.save("Inventory moved to Saturday").await.unwrap();
        assert_eq!(saved.id, existing.id);
        assert_eq!(backend.len(), 1);
        assert_eq!(board.current().await.unwrap().text, "Inventory moved to Saturday");
    }
}
