//! Despliegue de un postulante: alta de credenciales, correo de bienvenida,
//! transición a `deployed` y creación del empleado con su estación
//! placeholder.
//!
//! Los pasos se ejecutan en orden y el primer fallo corta el resto; no hay
//! compensación de los pasos ya completados.
use std::sync::Arc;

use crew_domain::{Applicant, ApplicantStatus, Employee, EmployeeDraft, EmployeeStation, LadderStatus, Laddered,
                  Record, StationDraft};
use log::info;
use serde::Serialize;
use uuid::Uuid;

use crate::auth::{AuthService, AuthUser, MIN_PASSWORD_LEN};
use crate::errors::CoreError;
use crate::mail::{MailDispatcher, MailMessage};
use crate::notify::{Notifier, Operation};
use crate::store::RecordStore;

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const SUFFIX_LEN: usize = 4;

/// `<nombre sin espacios en minúsculas><4 caracteres base36>`; con nombres
/// cortos el sufijo crece hasta `MIN_PASSWORD_LEN`.
pub fn provisional_password(fullname: &str) -> String {
    let base: String = fullname.split_whitespace().collect::<String>().to_lowercase();
    let len = SUFFIX_LEN.max(MIN_PASSWORD_LEN.saturating_sub(base.chars().count()));
    let mut n = Uuid::new_v4().as_u128();
    let mut suffix = String::with_capacity(len);
    for _ in 0..len {
        suffix.push(BASE36[(n % 36) as usize] as char);
        n /= 36;
    }
    format!("{base}{suffix}")
}

#[derive(Debug, Clone, Serialize)]
pub struct Deployment {
    pub applicant: Applicant,
    pub account: AuthUser,
    pub employee: Employee,
    pub station: EmployeeStation,
    /// Contraseña provisional enviada por correo.
    #[serde(skip)]
    pub password: String,
}

pub struct DeploymentService {
    applicants: Arc<RecordStore<Applicant>>,
    employees: Arc<RecordStore<Employee>>,
    stations: Arc<RecordStore<EmployeeStation>>,
    auth: Arc<dyn AuthService>,
    mailer: Arc<dyn MailDispatcher>,
    notifier: Arc<dyn Notifier>,
}

impl DeploymentService {
    pub fn new(applicants: Arc<RecordStore<Applicant>>,
               employees: Arc<RecordStore<Employee>>,
               stations: Arc<RecordStore<EmployeeStation>>,
               auth: Arc<dyn AuthService>,
               mailer: Arc<dyn MailDispatcher>,
               notifier: Arc<dyn Notifier>)
               -> Self {
        Self { applicants,
               employees,
               stations,
               auth,
               mailer,
               notifier }
    }

    pub async fn deploy(&self, applicant_id: Uuid, note: Option<String>) -> Result<Deployment, CoreError> {
        let applicant = match self.applicants.find(applicant_id).await {
            Some(a) => a,
            None => {
                return Err(self.fail(CoreError::NotFound { entity: Applicant::LABEL.to_string(),
                                                           id: applicant_id }))
            }
        };
        if applicant.status().is_terminal() {
            return Err(self.fail(CoreError::invalid("status", format!("{} is terminal", applicant.status))));
        }

        let password = provisional_password(&applicant.fullname);
        let account = self.auth
                          .sign_up(&applicant.email, &password)
                          .await
                          .map_err(|e| self.fail(e))?;
        self.mailer
            .send(&MailMessage::deployment(&applicant.fullname, &applicant.email, &password))
            .await
            .map_err(|e| self.fail(e))?;

        let applicant = self.applicants
                            .update_with(applicant_id,
                                         Applicant::status_patch(ApplicantStatus::Deployed, note),
                                         Operation::Deploy)
                            .await?;
        let employee = self.employees
                           .create(EmployeeDraft { fullname: applicant.fullname.clone(),
                                                   email: Some(applicant.email.clone()),
                                                   employment_type: applicant.employment_type,
                                                   applicant_id: Some(applicant.id) })
                           .await?;
        let station = self.stations.create(StationDraft::placeholder(employee.id)).await?;
        info!("applicant {} deployed as employee {}", applicant.id, employee.id);
        Ok(Deployment { applicant,
                        account,
                        employee,
                        station,
                        password })
    }

    fn fail(&self, err: CoreError) -> CoreError {
        self.notifier.notify(Operation::Deploy.failure(Applicant::LABEL, &err));
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::validate_password;

    #[test]
    fn provisional_password_shape() {
        let pw = provisional_password("Jane  Doe");
        assert!(pw.starts_with("janedoe"));
        assert_eq!(pw.len(), "janedoe".len() + 4);
        assert!(pw["janedoe".len()..].chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }

    #[test]
    fn short_names_still_yield_a_valid_password() {
        for name in ["A", "Al", "", "   "] {
            let pw = provisional_password(name);
            assert!(pw.chars().count() >= MIN_PASSWORD_LEN, "{name:?} -> {pw}");
            assert!(validate_password(&pw).is_ok());
        }
        assert!(provisional_password("Al").starts_with("al"));
    }
}
