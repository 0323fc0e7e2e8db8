//! Resúmenes para el tablero: conteos de postulantes y datos del gráfico de
//! certificaciones por estación. Funciones puras sobre snapshots de los stores.
use serde::Serialize;
use uuid::Uuid;

use crate::applicant::Applicant;
use crate::employee::{Employee, EmployeeStation};
use crate::ladder::LadderStatus;
use crate::status::{ApplicantStatus, StationName, StationStatus};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApplicantSummary {
    pub total: usize,
    pub cancelled: usize,
    pub deployed: usize,
    /// Los más recientes primero.
    pub recent: Vec<Applicant>,
}

impl ApplicantSummary {
    pub fn from_applicants(applicants: &[Applicant], recent: usize) -> Self {
        let count = |status: ApplicantStatus| applicants.iter().filter(|a| a.status == status).count();
        let mut newest: Vec<Applicant> = applicants.to_vec();
        newest.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        newest.truncate(recent);
        ApplicantSummary { total: applicants.len(),
                           cancelled: count(ApplicantStatus::Cancelled),
                           deployed: count(ApplicantStatus::Deployed),
                           recent: newest }
    }
}

/// Qué muestra el gráfico de estaciones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartSelection {
    /// Todas las estaciones de un empleado.
    Employee(Uuid),
    /// Un punto por empleado; `None` toma cualquier estación.
    Station(Option<StationName>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartPoint {
    pub label: String,
    /// Posición del estado en la escalera de estaciones.
    pub status_value: usize,
    pub status_label: StationStatus,
}

pub fn station_chart(employees: &[Employee], stations: &[EmployeeStation], selection: ChartSelection) -> Vec<ChartPoint> {
    match selection {
        ChartSelection::Employee(employee_id) => {
            stations.iter()
                    .filter(|s| s.employee_id == employee_id)
                    .map(|s| ChartPoint { label: s.station_name
                                                  .map(|n| n.as_str().to_string())
                                                  .unwrap_or_else(|| "Unassigned".to_string()),
                                          status_value: s.status.position().unwrap_or(0),
                                          status_label: s.status })
                    .collect()
        }
        ChartSelection::Station(filter) => {
            employees.iter()
                     .map(|e| {
                         let status = stations.iter()
                                              .find(|s| {
                                                  s.employee_id == e.id
                                                  && filter.map_or(true, |wanted| s.station_name == Some(wanted))
                                              })
                                              .map(|s| s.status)
                                              .unwrap_or(StationStatus::NoStatus);
                         ChartPoint { label: e.fullname.clone(),
                                      status_value: status.position().unwrap_or(0),
                                      status_label: status }
                     })
                     .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;
    use crate::applicant::ApplicantDraft;
    use crate::employee::{EmployeeDraft, StationDraft};
    use crate::record::Record;
    use crate::status::EmploymentType;

    #[test]
    fn summary_counts_terminal_statuses() {
        let now = Utc::now();
        let mut list = Vec::new();
        for (i, status) in [ApplicantStatus::Cancelled, ApplicantStatus::Deployed, ApplicantStatus::Interview].into_iter()
                                                                                                            .enumerate()
        {
            let draft = ApplicantDraft::new(format!("A{i}"), format!("a{i}@x.com"), EmploymentType::FullTime);
            let mut a = Applicant::from_draft(Uuid::new_v4(), draft, now + Duration::seconds(i as i64));
            a.status = status;
            list.push(a);
        }
        let summary = ApplicantSummary::from_applicants(&list, 2);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.cancelled, 1);
        assert_eq!(summary.deployed, 1);
        assert_eq!(summary.recent.len(), 2);
        assert_eq!(summary.recent[0].fullname, "A2");
    }

    #[test]
    fn chart_per_employee_and_per_station() {
        let now = Utc::now();
        let jane = Employee::from_draft(Uuid::new_v4(),
                                        EmployeeDraft { fullname: "Jane".into(),
                                                        email: None,
                                                        employment_type: EmploymentType::FullTime,
                                                        applicant_id: None },
                                        now);
        let joe = Employee::from_draft(Uuid::new_v4(),
                                       EmployeeDraft { fullname: "Joe".into(),
                                                       email: None,
                                                       employment_type: EmploymentType::WorkingStudent,
                                                       applicant_id: None },
                                       now);
        let grill = EmployeeStation::from_draft(Uuid::new_v4(),
                                                StationDraft { employee_id: jane.id,
                                                               station_name: Some(StationName::Grill),
                                                               status: Some(StationStatus::Certify) },
                                                now);
        let placeholder = EmployeeStation::from_draft(Uuid::new_v4(), StationDraft::placeholder(jane.id), now);
        let employees = vec![jane.clone(), joe];
        let stations = vec![grill, placeholder];

        let per_employee = station_chart(&employees, &stations, ChartSelection::Employee(jane.id));
        assert_eq!(per_employee.len(), 2);
        assert_eq!(per_employee[0].label, "grill");
        assert_eq!(per_employee[0].status_value, 3);
        assert_eq!(per_employee[1].label, "Unassigned");

        let per_station = station_chart(&employees, &stations, ChartSelection::Station(Some(StationName::Grill)));
        assert_eq!(per_station.len(), 2);
        assert_eq!(per_station[0].status_label, StationStatus::Certify);
        assert_eq!(per_station[1].label, "Joe");
        assert_eq!(per_station[1].status_value, 0);
    }
}
