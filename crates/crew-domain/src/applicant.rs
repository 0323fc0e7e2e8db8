use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;
use crate::record::{Laddered, Record};
use crate::status::{ApplicantStatus, EmploymentType};
use crate::validate::{require_email, require_text};

/// Postulante dentro del proceso de contratación.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Applicant {
    pub id: Uuid,
    pub fullname: String,
    pub email: String,
    #[serde(rename = "type")]
    pub employment_type: EmploymentType,
    pub status: ApplicantStatus,
    #[serde(default)]
    pub status_note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicantDraft {
    pub fullname: String,
    pub email: String,
    #[serde(rename = "type")]
    pub employment_type: EmploymentType,
}

impl ApplicantDraft {
    pub fn new(fullname: impl Into<String>, email: impl Into<String>, employment_type: EmploymentType) -> Self {
        Self { fullname: fullname.into(),
               email: email.into(),
               employment_type }
    }
}

/// Cambios parciales. `note` acompaña a un cambio de `status`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplicantPatch {
    pub fullname: Option<String>,
    pub email: Option<String>,
    #[serde(rename = "type")]
    pub employment_type: Option<EmploymentType>,
    pub status: Option<ApplicantStatus>,
    pub note: Option<String>,
}

impl Record for Applicant {
    type Draft = ApplicantDraft;
    type Patch = ApplicantPatch;

    const COLLECTION: &'static str = "applicants";
    const LABEL: &'static str = "applicant";

    fn id(&self) -> Uuid {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn validate_draft(draft: &ApplicantDraft) -> Result<(), DomainError> {
        require_text("fullname", &draft.fullname)?;
        require_email("email", &draft.email)
    }

    fn validate_patch(patch: &ApplicantPatch) -> Result<(), DomainError> {
        if let Some(name) = &patch.fullname {
            require_text("fullname", name)?;
        }
        if let Some(email) = &patch.email {
            require_email("email", email)?;
        }
        Ok(())
    }

    fn from_draft(id: Uuid, draft: ApplicantDraft, now: DateTime<Utc>) -> Self {
        Applicant { id,
                    fullname: draft.fullname.trim().to_string(),
                    email: draft.email.trim().to_string(),
                    employment_type: draft.employment_type,
                    status: ApplicantStatus::NoStatus,
                    status_note: None,
                    created_at: now,
                    updated_at: now }
    }

    fn apply_patch(&mut self, patch: ApplicantPatch, now: DateTime<Utc>) {
        if let Some(name) = patch.fullname {
            self.fullname = name.trim().to_string();
        }
        if let Some(email) = patch.email {
            self.email = email.trim().to_string();
        }
        if let Some(t) = patch.employment_type {
            self.employment_type = t;
        }
        match patch.status {
            Some(status) => {
                self.status = status;
                self.status_note = patch.note;
            }
            None if patch.note.is_some() => self.status_note = patch.note,
            None => {}
        }
        self.updated_at = now;
    }
}

impl Laddered for Applicant {
    type Status = ApplicantStatus;

    fn status(&self) -> ApplicantStatus {
        self.status
    }

    fn status_note(&self) -> Option<&str> {
        self.status_note.as_deref()
    }

    fn status_patch(status: ApplicantStatus, note: Option<String>) -> ApplicantPatch {
        ApplicantPatch { status: Some(status),
                         note,
                         ..Default::default() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jane() -> Applicant {
        let draft = ApplicantDraft::new(" Jane Doe ", "jane@x.com", EmploymentType::WorkingStudent);
        Applicant::from_draft(Uuid::new_v4(), draft, Utc::now())
    }

    #[test]
    fn new_applicants_start_without_status() {
        let a = jane();
        assert_eq!(a.status, ApplicantStatus::NoStatus);
        assert_eq!(a.fullname, "Jane Doe");
        assert_eq!(a.created_at, a.updated_at);
    }

    #[test]
    fn status_patch_replaces_note() {
        let mut a = jane();
        a.apply_patch(Applicant::status_patch(ApplicantStatus::Examination, Some("passed screening".into())),
                      Utc::now());
        assert_eq!(a.status_note(), Some("passed screening"));
        a.apply_patch(Applicant::status_patch(ApplicantStatus::Interview, None), Utc::now());
        assert_eq!(a.status, ApplicantStatus::Interview);
        assert_eq!(a.status_note(), None);
    }

    #[test]
    fn draft_validation() {
        let bad = ApplicantDraft::new("", "jane@x.com", EmploymentType::FullTime);
        assert!(Applicant::validate_draft(&bad).is_err());
        let bad_mail = ApplicantDraft::new("Jane", "jane", EmploymentType::FullTime);
        assert!(Applicant::validate_draft(&bad_mail).is_err());
    }

    #[test]
    fn wire_shape_uses_type_key() {
        let v = serde_json::to_value(jane()).unwrap();
        assert_eq!(v["type"], "working-student");
        assert_eq!(v["status"], "no-status");
    }
}
