use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::record::Record;

/// Nota libre del administrador (patrón "última nota").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminNote {
    pub id: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NoteDraft {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NotePatch {
    pub text: String,
}

impl Record for AdminNote {
    type Draft = NoteDraft;
    type Patch = NotePatch;

    const COLLECTION: &'static str = "notes";
    const LABEL: &'static str = "note";

    fn id(&self) -> Uuid {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn from_draft(id: Uuid, draft: NoteDraft, now: DateTime<Utc>) -> Self {
        AdminNote { id,
                    text: draft.text,
                    created_at: now,
                    updated_at: now }
    }

    fn apply_patch(&mut self, patch: NotePatch, now: DateTime<Utc>) {
        self.text = patch.text;
        self.updated_at = now;
    }
}
