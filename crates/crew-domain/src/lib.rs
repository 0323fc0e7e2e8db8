// crew-domain library entry point
pub mod applicant;
pub mod catalog;
pub mod employee;
pub mod error;
pub mod history;
pub mod ladder;
pub mod note;
pub mod record;
pub mod reports;
pub mod status;
pub mod validate;

pub use applicant::{Applicant, ApplicantDraft, ApplicantPatch};
pub use catalog::{CategoryDraft, CategoryPatch, Product, ProductCategory, ProductDraft, ProductPatch, StoredImage};
pub use employee::{Employee, EmployeeDraft, EmployeePatch, EmployeeStation, StationDraft, StationPatch};
pub use error::DomainError;
pub use history::{StatusChange, StatusChangeDraft};
pub use ladder::{ladder_index, next_status, previous_status, LadderStatus};
pub use note::{AdminNote, NoteDraft, NotePatch};
pub use record::{Laddered, Record, Scope};
pub use reports::{station_chart, ApplicantSummary, ChartPoint, ChartSelection};
pub use status::{ApplicantStatus, EmploymentType, StationName, StationStatus};
