use std::sync::Arc;

use crew_core::RecordingNotifier;
use crew_domain::StationStatus;
use crewflow_rust::{build_app, run_walkthrough, AppConfig};

#[test]
fn walkthrough_deploys_and_recovers_password() {
    let notifier = Arc::new(RecordingNotifier::new());
    let app = build_app(&AppConfig::in_memory(), notifier.clone()).unwrap();
    let report = tokio_test::block_on(run_walkthrough(&app, &notifier, 3)).unwrap();

    assert_eq!(report.summary.total, 1);
    assert_eq!(report.summary.deployed, 1);
    // cinco promociones más el despliegue
    assert_eq!(report.history_steps, 6);
    assert!(report.password_reset);
    assert_eq!(report.note.as_deref(), Some("Inventory count on Friday"));

    let url = report.product_image_url.unwrap();
    assert!(url.starts_with("memory://storage/products/"));

    assert_eq!(report.chart.len(), 1);
    assert_eq!(report.chart[0].label, "grill");
    assert_eq!(report.chart[0].status_label, StationStatus::Initial);

    assert!(report.notices.iter().any(|n| n == "Applicant has been deployed and email sent successfully!"));
}

#[test]
fn walkthrough_report_serializes() {
    let notifier = Arc::new(RecordingNotifier::new());
    let app = build_app(&AppConfig::in_memory(), notifier.clone()).unwrap();
    let report = tokio_test::block_on(run_walkthrough(&app, &notifier, 5)).unwrap();
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["summary"]["deployed"], 1);
    assert_eq!(json["chart"][0]["status_label"], "initial");
}
