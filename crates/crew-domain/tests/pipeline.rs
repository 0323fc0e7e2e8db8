use chrono::Utc;
use crew_domain::{next_status, previous_status, Applicant, ApplicantDraft, ApplicantStatus, EmploymentType, Laddered,
                  LadderStatus, Record, StationStatus};
use uuid::Uuid;

#[test]
fn walking_the_applicant_ladder_ends_at_orientation() {
    let mut status = ApplicantStatus::NoStatus;
    let mut steps = vec![status];
    while let Some(next) = next_status(status, ApplicantStatus::LADDER) {
        status = next;
        steps.push(next);
    }
    assert_eq!(steps.len(), 6);
    assert_eq!(status, ApplicantStatus::Orientation);
    assert_eq!(previous_status(ApplicantStatus::NoStatus, ApplicantStatus::LADDER), None);
}

#[test]
fn terminal_statuses_are_outside_the_ladders() {
    assert!(ApplicantStatus::Cancelled.is_terminal());
    assert!(ApplicantStatus::Deployed.is_terminal());
    assert_eq!(next_status(ApplicantStatus::Deployed, ApplicantStatus::LADDER), None);
    assert!(StationStatus::LADDER.iter().all(|s| !s.is_terminal()));
    assert_eq!(previous_status(StationStatus::Initial, StationStatus::LADDER), Some(StationStatus::NoStatus));
}

#[test]
fn status_patch_moves_an_applicant_and_keeps_the_note() {
    let now = Utc::now();
    let mut a = Applicant::from_draft(Uuid::new_v4(),
                                      ApplicantDraft::new("  Jane Doe ", "jane@x.com", EmploymentType::WorkingStudent),
                                      now);
    assert_eq!(a.fullname, "Jane Doe");
    a.apply_patch(Applicant::status_patch(ApplicantStatus::Examination, Some("on time".into())), now);
    assert_eq!(a.status(), ApplicantStatus::Examination);
    assert_eq!(a.status_note(), Some("on time"));
}

#[test]
fn legacy_part_time_rows_still_load() {
    let json = serde_json::json!({
        "id": Uuid::new_v4(),
        "fullname": "Old Row",
        "email": "old@x.com",
        "type": "part-time",
        "status": "interview",
        "created_at": Utc::now(),
        "updated_at": Utc::now()
    });
    let a: Applicant = serde_json::from_value(json).unwrap();
    assert_eq!(a.employment_type, EmploymentType::WorkingStudent);
    assert_eq!(serde_json::to_value(&a).unwrap()["type"], "working-student");
}

#[test]
fn unknown_statuses_are_rejected() {
    assert!("onboarding".parse::<ApplicantStatus>().is_err());
    assert_eq!(" Follow-Up ".parse::<StationStatus>().unwrap(), StationStatus::FollowUp);
    let bad = serde_json::json!({
        "id": Uuid::new_v4(),
        "fullname": "X",
        "email": "x@x.com",
        "type": "full-time",
        "status": "hired",
        "created_at": Utc::now(),
        "updated_at": Utc::now()
    });
    assert!(serde_json::from_value::<Applicant>(bad).is_err());
}
