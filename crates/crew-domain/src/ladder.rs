//! Escalera de estados.
//!
//! Una escalera es una secuencia finita y estrictamente ordenada de estados.
//! Promover mueve un paso hacia adelante y degradar un paso hacia atrás. Los
//! extremos son no-ops: la función devuelve `None` y el llamador no emite
//! ningún update.
//!
//! Las escaleras son configuración fija (constantes), no se derivan en
//! runtime. Los estados terminales (p.ej. `cancelled`, `deployed`) no son
//! miembros de la escalera; rechazarlos es responsabilidad del llamador.
use std::fmt::{Debug, Display};

use crate::status::{ApplicantStatus, StationStatus};

/// Estado que pertenece (o no) a una escalera fija.
pub trait LadderStatus: Copy + Eq + Debug + Display + Send + Sync + 'static {
    /// Orden canónico de la escalera.
    const LADDER: &'static [Self];
    /// Colección donde se registra el historial de transiciones.
    const HISTORY_COLLECTION: &'static str;

    /// Un estado es terminal si no forma parte de la escalera.
    fn is_terminal(self) -> bool {
        !Self::LADDER.contains(&self)
    }

    fn position(self) -> Option<usize> {
        ladder_index(self, Self::LADDER)
    }
}

pub fn ladder_index<S: PartialEq>(current: S, ladder: &[S]) -> Option<usize> {
    ladder.iter().position(|s| *s == current)
}

/// Estado inmediatamente posterior a `current`, si existe.
pub fn next_status<S: PartialEq + Copy>(current: S, ladder: &[S]) -> Option<S> {
    let idx = ladder_index(current, ladder)?;
    ladder.get(idx + 1).copied()
}

/// Estado inmediatamente anterior a `current`, si existe.
pub fn previous_status<S: PartialEq + Copy>(current: S, ladder: &[S]) -> Option<S> {
    let idx = ladder_index(current, ladder)?;
    idx.checked_sub(1).and_then(|i| ladder.get(i)).copied()
}

impl LadderStatus for ApplicantStatus {
    const LADDER: &'static [Self] = &[ApplicantStatus::NoStatus,
                                      ApplicantStatus::Examination,
                                      ApplicantStatus::Interview,
                                      ApplicantStatus::Requirements,
                                      ApplicantStatus::Deployment,
                                      ApplicantStatus::Orientation];
    const HISTORY_COLLECTION: &'static str = "applicant_status_history";
}

impl LadderStatus for StationStatus {
    const LADDER: &'static [Self] = &[StationStatus::NoStatus,
                                      StationStatus::Initial,
                                      StationStatus::FollowUp,
                                      StationStatus::Certify,
                                      StationStatus::Recertify];
    const HISTORY_COLLECTION: &'static str = "station_status_history";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_walks_the_applicant_ladder() {
        let ladder = ApplicantStatus::LADDER;
        for (i, s) in ladder.iter().enumerate() {
            let expected = ladder.get(i + 1).copied();
            assert_eq!(next_status(*s, ladder), expected, "next of {s}");
        }
        assert_eq!(next_status(ApplicantStatus::Orientation, ladder), None);
    }

    #[test]
    fn previous_walks_the_applicant_ladder() {
        let ladder = ApplicantStatus::LADDER;
        for (i, s) in ladder.iter().enumerate().skip(1) {
            assert_eq!(previous_status(*s, ladder), Some(ladder[i - 1]), "previous of {s}");
        }
        assert_eq!(previous_status(ApplicantStatus::NoStatus, ladder), None);
    }

    #[test]
    fn terminal_statuses_are_outside_the_ladder() {
        assert!(ApplicantStatus::Cancelled.is_terminal());
        assert!(ApplicantStatus::Deployed.is_terminal());
        assert!(!ApplicantStatus::Orientation.is_terminal());
        assert_eq!(next_status(ApplicantStatus::Deployed, ApplicantStatus::LADDER), None);
        assert_eq!(previous_status(ApplicantStatus::Cancelled, ApplicantStatus::LADDER), None);
    }

    #[test]
    fn station_ladder_is_symmetric() {
        let ladder = StationStatus::LADDER;
        assert_eq!(next_status(StationStatus::NoStatus, ladder), Some(StationStatus::Initial));
        assert_eq!(next_status(StationStatus::Recertify, ladder), None);
        assert_eq!(previous_status(StationStatus::Initial, ladder), Some(StationStatus::NoStatus));
        assert_eq!(StationStatus::Certify.position(), Some(3));
        assert!(ladder.iter().all(|s| !s.is_terminal()));
    }
}
