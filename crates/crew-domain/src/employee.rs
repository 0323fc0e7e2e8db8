use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;
use crate::record::{Laddered, Record};
use crate::status::{EmploymentType, StationName, StationStatus};
use crate::validate::{require_email, require_text};

/// Empleado desplegado (postulante que completó el proceso).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    pub id: Uuid,
    pub fullname: String,
    pub email: Option<String>,
    #[serde(rename = "type")]
    pub employment_type: EmploymentType,
    pub deployed_at: DateTime<Utc>,
    pub applicant_id: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeDraft {
    pub fullname: String,
    pub email: Option<String>,
    #[serde(rename = "type")]
    pub employment_type: EmploymentType,
    pub applicant_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmployeePatch {
    pub fullname: Option<String>,
    pub email: Option<String>,
    #[serde(rename = "type")]
    pub employment_type: Option<EmploymentType>,
}

impl Record for Employee {
    type Draft = EmployeeDraft;
    type Patch = EmployeePatch;

    const COLLECTION: &'static str = "employees";
    const LABEL: &'static str = "employee";

    fn id(&self) -> Uuid {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.deployed_at
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn validate_draft(draft: &EmployeeDraft) -> Result<(), DomainError> {
        require_text("fullname", &draft.fullname)?;
        match &draft.email {
            Some(email) => require_email("email", email),
            None => Ok(()),
        }
    }

    fn validate_patch(patch: &EmployeePatch) -> Result<(), DomainError> {
        if let Some(name) = &patch.fullname {
            require_text("fullname", name)?;
        }
        if let Some(email) = &patch.email {
            require_email("email", email)?;
        }
        Ok(())
    }

    fn from_draft(id: Uuid, draft: EmployeeDraft, now: DateTime<Utc>) -> Self {
        Employee { id,
                   fullname: draft.fullname.trim().to_string(),
                   email: draft.email.map(|e| e.trim().to_string()),
                   employment_type: draft.employment_type,
                   deployed_at: now,
                   applicant_id: draft.applicant_id,
                   updated_at: now }
    }

    fn apply_patch(&mut self, patch: EmployeePatch, now: DateTime<Utc>) {
        if let Some(name) = patch.fullname {
            self.fullname = name.trim().to_string();
        }
        if let Some(email) = patch.email {
            self.email = Some(email.trim().to_string());
        }
        if let Some(t) = patch.employment_type {
            self.employment_type = t;
        }
        self.updated_at = now;
    }
}

/// Asignación de un empleado a una estación con su nivel de certificación.
///
/// `station_name == None` representa la fila placeholder creada al desplegar,
/// antes de asignar un área concreta.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeStation {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub station_name: Option<StationName>,
    pub status: StationStatus,
    #[serde(default)]
    pub status_note: Option<String>,
    pub assigned_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationDraft {
    pub employee_id: Uuid,
    pub station_name: Option<StationName>,
    pub status: Option<StationStatus>,
}

impl StationDraft {
    pub fn placeholder(employee_id: Uuid) -> Self {
        Self { employee_id,
               station_name: None,
               status: None }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StationPatch {
    /// `Some(None)` limpia la estación asignada.
    pub station_name: Option<Option<StationName>>,
    pub status: Option<StationStatus>,
    pub note: Option<String>,
}

impl Record for EmployeeStation {
    type Draft = StationDraft;
    type Patch = StationPatch;

    const COLLECTION: &'static str = "employee_stations";
    const LABEL: &'static str = "station";

    fn id(&self) -> Uuid {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.assigned_at
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn owner_id(&self) -> Option<Uuid> {
        Some(self.employee_id)
    }

    fn from_draft(id: Uuid, draft: StationDraft, now: DateTime<Utc>) -> Self {
        EmployeeStation { id,
                          employee_id: draft.employee_id,
                          station_name: draft.station_name,
                          status: draft.status.unwrap_or(StationStatus::NoStatus),
                          status_note: None,
                          assigned_at: now,
                          updated_at: now }
    }

    fn apply_patch(&mut self, patch: StationPatch, now: DateTime<Utc>) {
        if let Some(name) = patch.station_name {
            self.station_name = name;
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

impl Laddered for EmployeeStation {
    type Status = StationStatus;

    fn status(&self) -> StationStatus {
        self.status
    }

    fn status_note(&self) -> Option<&str> {
        self.status_note.as_deref()
    }

    fn status_patch(status: StationStatus, note: Option<String>) -> StationPatch {
        StationPatch { status: Some(status),
                       note,
                       ..Default::default() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_station_has_no_name_and_no_status() {
        let employee = Uuid::new_v4();
        let st = EmployeeStation::from_draft(Uuid::new_v4(), StationDraft::placeholder(employee), Utc::now());
        assert_eq!(st.station_name, None);
        assert_eq!(st.status, StationStatus::NoStatus);
        assert_eq!(st.owner_id(), Some(employee));
    }

    #[test]
    fn patch_can_clear_station_name() {
        let draft = StationDraft { employee_id: Uuid::new_v4(),
                                   station_name: Some(StationName::Grill),
                                   status: Some(StationStatus::Initial) };
        let mut st = EmployeeStation::from_draft(Uuid::new_v4(), draft, Utc::now());
        st.apply_patch(StationPatch { station_name: Some(None), ..Default::default() }, Utc::now());
        assert_eq!(st.station_name, None);
        assert_eq!(st.status, StationStatus::Initial);
    }

    #[test]
    fn employee_email_is_optional_but_checked() {
        let mut draft = EmployeeDraft { fullname: "Jane Doe".into(),
                                        email: None,
                                        employment_type: EmploymentType::FullTime,
                                        applicant_id: None };
        assert!(Employee::validate_draft(&draft).is_ok());
        draft.email = Some("nope".into());
        assert!(Employee::validate_draft(&draft).is_err());
    }
}
