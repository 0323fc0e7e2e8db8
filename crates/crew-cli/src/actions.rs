//! Ejecución de los subcomandos sobre una `Console` ya cargada. Cada acción
//! devuelve el texto a imprimir (JSON legible).
use std::fs;
use std::path::Path;

use crew_core::{BlobFile, OtpService, RecordAuthService};
use crew_domain::{ApplicantDraft, CategoryDraft, ChartSelection, ProductDraft, Scope, StationDraft};
use crewflow_rust::{App, AppConfig, AppError};
use serde::Serialize;
use serde_json::json;

use crate::commands::{ApplicantCommand, CategoryCommand, Commands, NoteCommand, OtpCommand, ProductCommand,
                      StationCommand};

fn render<T: Serialize>(value: &T) -> Result<String, AppError> {
    Ok(serde_json::to_string_pretty(value)?)
}

fn content_type_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        "svg" => Some("image/svg+xml"),
        _ => None,
    }
}

pub fn read_image(path: &Path) -> Result<BlobFile, AppError> {
    let bytes = fs::read(path)?;
    let file_name = path.file_name()
                        .and_then(|n| n.to_str())
                        .unwrap_or("upload")
                        .to_string();
    let file = BlobFile::new(file_name, bytes);
    Ok(match content_type_for(path) {
        Some(ct) => file.with_content_type(ct),
        None => file,
    })
}

pub async fn execute(app: &App, cfg: &AppConfig, command: Commands) -> Result<String, AppError> {
    let console = &app.console;
    match command {
        Commands::Applicants { command } => match command {
            ApplicantCommand::List => render(&console.applicants.snapshot().await),
            ApplicantCommand::Add { name, email, employment_type } => {
                render(&console.applicants.create(ApplicantDraft::new(name, email, employment_type)).await?)
            }
            ApplicantCommand::Promote(step) => render(&console.applicants.promote(step.id, step.note).await?),
            ApplicantCommand::Demote(step) => render(&console.applicants.demote(step.id, step.note).await?),
            ApplicantCommand::Cancel(step) => render(&console.applicants.cancel(step.id, step.note).await?),
            ApplicantCommand::Deploy(step) => {
                let deployment = console.deployments.deploy(step.id, step.note).await?;
                render(&deployment)
            }
            ApplicantCommand::History { id } => render(&console.applicant_history.for_subject(id).await?),
            ApplicantCommand::Delete { id } => {
                console.applicants.delete(id).await?;
                render(&json!({ "deleted": id }))
            }
        },
        Commands::Stations { command } => match command {
            StationCommand::List { employee } => match employee {
                Some(employee_id) => render(&console.stations.fetch_scoped(Scope::Owner(employee_id)).await?),
                None => render(&console.stations.snapshot().await),
            },
            StationCommand::Add { employee, station } => {
                let draft = StationDraft { employee_id: employee,
                                           station_name: station,
                                           status: None };
                render(&console.stations.create(draft).await?)
            }
            StationCommand::Promote(step) => render(&console.stations.promote(step.id, step.note).await?),
            StationCommand::Demote(step) => render(&console.stations.demote(step.id, step.note).await?),
        },
        Commands::Products { command } => match command {
            ProductCommand::List => render(&console.products.records().snapshot().await),
            ProductCommand::Add { name, mp, sp, pt, mc, cc, category, image } => {
                let file = image.as_deref().map(read_image).transpose()?;
                let draft = ProductDraft { name,
                                           mc,
                                           cc,
                                           mp,
                                           sp,
                                           pt,
                                           category,
                                           image: None };
                render(&console.products.create(draft, file.as_ref()).await?)
            }
            ProductCommand::Delete { id } => {
                console.products.delete(id).await?;
                render(&json!({ "deleted": id }))
            }
        },
        Commands::Categories { command } => match command {
            CategoryCommand::List => render(&console.categories.records().snapshot().await),
            CategoryCommand::Add { label, image } => {
                let file = image.as_deref().map(read_image).transpose()?;
                let draft = CategoryDraft { label, image: None };
                render(&console.categories.create(draft, file.as_ref()).await?)
            }
            CategoryCommand::Delete { id } => {
                console.categories.delete(id).await?;
                render(&json!({ "deleted": id }))
            }
        },
        Commands::Otp { command } => match command {
            OtpCommand::Issue { email } => {
                let issued = console.otp.issue_otp(&email).await?;
                // el código sólo viaja por correo
                render(&json!({ "email": issued.email, "expires_at": issued.expires_at }))
            }
            OtpCommand::Verify { email, code } => {
                let valid = console.otp.verify_otp(&email, &code).await?;
                render(&json!({ "email": email, "valid": valid }))
            }
            OtpCommand::Reset { email, password } => {
                let auth = RecordAuthService::new(app.backends.accounts.clone());
                console.otp.reset_password(&auth, &email, &password).await?;
                render(&json!({ "email": email, "reset": true }))
            }
        },
        Commands::Note { command } => match command {
            NoteCommand::Show => render(&console.notes.current().await),
            NoteCommand::Set { text } => render(&console.notes.save(&text).await?),
        },
        Commands::Summary { recent } => render(&console.summary(recent.unwrap_or(cfg.recent_applicants)).await),
        Commands::Chart { employee, station } => {
            let selection = match employee {
                Some(id) => ChartSelection::Employee(id),
                None => ChartSelection::Station(station),
            };
            render(&console.chart(selection).await)
        }
    }
}
