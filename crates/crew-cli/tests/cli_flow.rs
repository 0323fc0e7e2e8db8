use std::sync::Arc;

use clap::Parser;
use crew_cli::{execute, Cli};
use crew_core::RecordingNotifier;
use crewflow_rust::{build_app, App, AppConfig, AppError};
use serde_json::Value;

fn app() -> App {
    build_app(&AppConfig::in_memory(), Arc::new(RecordingNotifier::new())).unwrap()
}

async fn run(app: &App, args: &[&str]) -> Result<Value, AppError> {
    let mut argv = vec!["crew"];
    argv.extend_from_slice(args);
    let cli = Cli::try_parse_from(argv).unwrap();
    let out = execute(app, &AppConfig::in_memory(), cli.command).await?;
    Ok(serde_json::from_str(&out).unwrap())
}

#[tokio::test]
async fn applicant_commands_drive_the_pipeline() {
    let app = app();
    let created = run(&app, &["applicants", "add", "--name", "Jane Doe", "--email", "jane@x.com"]).await.unwrap();
    assert_eq!(created["status"], "no-status");
    assert_eq!(created["type"], "working-student");
    let id = created["id"].as_str().unwrap().to_string();

    let promoted = run(&app, &["applicants", "promote", &id, "--note", "passed"]).await.unwrap();
    assert_eq!(promoted["status"], "examination");

    let deployed = run(&app, &["applicants", "deploy", &id]).await.unwrap();
    assert_eq!(deployed["applicant"]["status"], "deployed");
    assert!(deployed.get("password").is_none());

    let history = run(&app, &["applicants", "history", &id]).await.unwrap();
    assert_eq!(history.as_array().unwrap().len(), 2);

    let summary = run(&app, &["summary"]).await.unwrap();
    assert_eq!(summary["deployed"], 1);

    let outbox = app.outbox.as_ref().unwrap();
    assert!(outbox.last_to("jane@x.com").is_some());
}

#[tokio::test]
async fn promoting_a_cancelled_applicant_is_rejected() {
    let app = app();
    let created = run(&app, &["applicants", "add", "--name", "Ann", "--email", "ann@x.com", "--type", "full-time"]).await
                                                                                                                    .unwrap();
    let id = created["id"].as_str().unwrap().to_string();
    run(&app, &["applicants", "cancel", &id]).await.unwrap();
    let err = run(&app, &["applicants", "promote", &id]).await.unwrap_err();
    assert_eq!(err.exit_code(), 4);
}

#[tokio::test]
async fn station_and_chart_commands() {
    let app = app();
    let created = run(&app, &["applicants", "add", "--name", "Bo", "--email", "bo@x.com"]).await.unwrap();
    let deployed = run(&app, &["applicants", "deploy", created["id"].as_str().unwrap()]).await.unwrap();
    let employee = deployed["employee"]["id"].as_str().unwrap().to_string();

    let grill = run(&app, &["stations", "add", "--employee", &employee, "--station", "grill"]).await.unwrap();
    assert_eq!(grill["station_name"], "grill");
    run(&app, &["stations", "promote", grill["id"].as_str().unwrap()]).await.unwrap();

    let mine = run(&app, &["stations", "list", "--employee", &employee]).await.unwrap();
    assert_eq!(mine.as_array().unwrap().len(), 2);

    let chart = run(&app, &["chart", "--employee", &employee]).await.unwrap();
    assert_eq!(chart.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn note_and_otp_commands() {
    let app = app();
    assert_eq!(run(&app, &["note", "show"]).await.unwrap(), Value::Null);
    run(&app, &["note", "set", "Inventory Friday"]).await.unwrap();
    let note = run(&app, &["note", "show"]).await.unwrap();
    assert_eq!(note["text"], "Inventory Friday");

    let issued = run(&app, &["otp", "issue", "--email", "a@b.com"]).await.unwrap();
    assert!(issued.get("code_hash").is_none());
    let code = app.outbox.as_ref().unwrap().last_to("a@b.com").unwrap().params["passcode"].clone();
    let verified = run(&app, &["otp", "verify", "--email", "a@b.com", "--code", &code]).await.unwrap();
    assert_eq!(verified["valid"], true);
}

#[test]
fn unknown_station_names_fail_to_parse() {
    assert!(Cli::try_parse_from(["crew", "chart", "--station", "bakery"]).is_err());
    assert!(Cli::try_parse_from(["crew", "chart", "--station", "drive-thru"]).is_ok());
}
