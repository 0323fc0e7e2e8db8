//! Historial append-only de transiciones de estado.
//!
//! Invariante: un `StatusChange` nunca se modifica ni se elimina. El tipo de
//! parche es `Infallible`, así que no existe un valor con el que actualizarlo.
use std::convert::Infallible;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ladder::LadderStatus;
use crate::record::Record;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusChange<S> {
    pub id: Uuid,
    /// Entidad que transicionó (postulante o estación).
    pub subject_id: Uuid,
    pub old_status: S,
    pub new_status: S,
    pub changed_at: DateTime<Utc>,
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatusChangeDraft<S> {
    pub subject_id: Uuid,
    pub old_status: S,
    pub new_status: S,
    pub note: Option<String>,
}

impl<S> Record for StatusChange<S> where S: LadderStatus + Serialize + serde::de::DeserializeOwned
{
    type Draft = StatusChangeDraft<S>;
    type Patch = Infallible;

    const COLLECTION: &'static str = S::HISTORY_COLLECTION;
    const LABEL: &'static str = "status change";

    fn id(&self) -> Uuid {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.changed_at
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.changed_at
    }

    fn owner_id(&self) -> Option<Uuid> {
        Some(self.subject_id)
    }

    fn from_draft(id: Uuid, draft: StatusChangeDraft<S>, now: DateTime<Utc>) -> Self {
        StatusChange { id,
                       subject_id: draft.subject_id,
                       old_status: draft.old_status,
                       new_status: draft.new_status,
                       changed_at: now,
                       note: draft.note }
    }

    fn apply_patch(&mut self, patch: Infallible, _now: DateTime<Utc>) {
        match patch {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::{ApplicantStatus, StationStatus};

    #[test]
    fn history_collections_follow_the_status_kind() {
        assert_eq!(<StatusChange<ApplicantStatus> as Record>::COLLECTION, "applicant_status_history");
        assert_eq!(<StatusChange<StationStatus> as Record>::COLLECTION, "station_status_history");
    }

    #[test]
    fn change_is_scoped_to_its_subject() {
        let subject = Uuid::new_v4();
        let draft = StatusChangeDraft { subject_id: subject,
                                        old_status: StationStatus::Initial,
                                        new_status: StationStatus::FollowUp,
                                        note: Some("observed on grill".into()) };
        let change = StatusChange::from_draft(Uuid::new_v4(), draft, Utc::now());
        assert_eq!(change.owner_id(), Some(subject));
        let v = serde_json::to_value(&change).unwrap();
        assert_eq!(v["old_status"], "initial");
        assert_eq!(v["new_status"], "follow-up");
    }
}
