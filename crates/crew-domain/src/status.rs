//! Enumeraciones cerradas del dominio.
//!
//! Cada valor tiene una representación textual estable (kebab-case) que es la
//! misma que se persiste en JSON y la que aceptan los comandos de la CLI. Un
//! valor fuera del vocabulario se rechaza al deserializar o al parsear, nunca
//! llega a una entidad.
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

macro_rules! text_enum {
    (
        $(#[$meta:meta])*
        $name:ident ($kind:literal) {
            $( $(#[$vmeta:meta])* $variant:ident => $text:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $( $(#[$vmeta])* #[serde(rename = $text)] $variant ),+
        }

        impl $name {
            /// Todos los valores en orden de declaración.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim().to_ascii_lowercase();
                $name::ALL.iter()
                          .copied()
                          .find(|v| v.as_str() == wanted)
                          .ok_or(DomainError::UnknownVariant { kind: $kind, value: s.to_string() })
            }
        }
    };
}

text_enum! {
    /// Etapa de un postulante dentro del proceso de contratación.
    ///
    /// `Cancelled` y `Deployed` son terminales: no forman parte de la escalera
    /// y sólo se alcanzan por acciones explícitas (cancelar, desplegar).
    ApplicantStatus ("applicant status") {
        NoStatus => "no-status",
        Examination => "examination",
        Interview => "interview",
        Requirements => "requirements",
        Deployment => "deployment",
        Orientation => "orientation",
        Cancelled => "cancelled",
        Deployed => "deployed",
    }
}

text_enum! {
    /// Nivel de certificación de un empleado en una estación.
    StationStatus ("station status") {
        NoStatus => "no-status",
        Initial => "initial",
        FollowUp => "follow-up",
        Certify => "certify",
        Recertify => "recertify",
    }
}

text_enum! {
    /// Áreas físicas de trabajo del local.
    StationName ("station name") {
        Pantry => "pantry",
        Grill => "grill",
        Fryman => "fryman",
        BackUp => "back-up",
        Stockman => "stockman",
        Counter => "counter",
        Dining => "dining",
        DriveThru => "drive-thru",
        Jeds => "jeds",
        Um => "um",
        Sc => "sc",
    }
}

/// Modalidad de contratación.
///
/// Registros antiguos usaban `part-time`; se acepta como alias de
/// `working-student` al leer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EmploymentType {
    #[serde(rename = "working-student", alias = "part-time")]
    WorkingStudent,
    #[serde(rename = "full-time")]
    FullTime,
}

impl EmploymentType {
    pub fn as_str(self) -> &'static str {
        match self {
            EmploymentType::WorkingStudent => "working-student",
            EmploymentType::FullTime => "full-time",
        }
    }
}

impl fmt::Display for EmploymentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmploymentType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "working-student" | "part-time" => Ok(EmploymentType::WorkingStudent),
            "full-time" => Ok(EmploymentType::FullTime),
            _ => Err(DomainError::UnknownVariant { kind: "employment type", value: s.to_string() }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_serialize_as_kebab_case() {
        assert_eq!(serde_json::to_string(&ApplicantStatus::NoStatus).unwrap(), "\"no-status\"");
        assert_eq!(serde_json::to_string(&StationStatus::FollowUp).unwrap(), "\"follow-up\"");
        assert_eq!(serde_json::to_string(&StationName::DriveThru).unwrap(), "\"drive-thru\"");
    }

    #[test]
    fn parse_accepts_known_values_and_rejects_others() {
        assert_eq!("Interview".parse::<ApplicantStatus>().unwrap(), ApplicantStatus::Interview);
        assert_eq!("back-up".parse::<StationName>().unwrap(), StationName::BackUp);
        let err = "gold".parse::<StationStatus>().unwrap_err();
        assert_eq!(err.to_string(), "unknown station status value: gold");
    }

    #[test]
    fn legacy_part_time_reads_as_working_student() {
        let t: EmploymentType = serde_json::from_str("\"part-time\"").unwrap();
        assert_eq!(t, EmploymentType::WorkingStudent);
        assert_eq!(serde_json::to_string(&t).unwrap(), "\"working-student\"");
        assert_eq!("full-time".parse::<EmploymentType>().unwrap(), EmploymentType::FullTime);
    }
}
