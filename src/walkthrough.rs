//! Recorrido guionado de la consola: catálogo, contratación de un postulante
//! hasta `deployed`, certificación de estación, nota y recuperación de
//! contraseña. Devuelve un reporte serializable con lo ocurrido.
use std::sync::Arc;

use crew_core::{AuthService, BlobFile, Console, CoreError, OtpService, RecordAuthService, RecordingMailer,
                RecordingNotifier};
use crew_domain::{ApplicantDraft, ApplicantSummary, CategoryDraft, ChartPoint, ChartSelection, EmploymentType,
                  ProductDraft, StationName, StationPatch};
use log::info;
use serde::Serialize;
use uuid::Uuid;

use crate::bootstrap::App;
use crate::errors::AppError;

#[derive(Debug, Clone, Serialize)]
pub struct WalkthroughReport {
    pub applicant_id: Uuid,
    pub employee_id: Uuid,
    pub product_image_url: Option<String>,
    pub history_steps: usize,
    pub summary: ApplicantSummary,
    pub chart: Vec<ChartPoint>,
    pub note: Option<String>,
    pub password_reset: bool,
    pub notices: Vec<String>,
}

const DEMO_EMAIL: &str = "jane.doe@crewflow.test";

fn outbox(app: &App) -> Result<&Arc<RecordingMailer>, AppError> {
    app.outbox
       .as_ref()
       .ok_or_else(|| AppError::Config("el recorrido necesita el buzón en memoria".into()))
}

pub async fn run_walkthrough(app: &App, notifier: &RecordingNotifier, recent: usize) -> Result<WalkthroughReport, AppError> {
    let console: &Console = &app.console;
    console.load().await?;

    // catálogo
    let logo = BlobFile::new("burger.png", vec![0x89, b'P', b'N', b'G']).with_content_type("image/png");
    let category = console.categories
                          .create(CategoryDraft { label: "Burgers".into(),
                                                  image: None },
                                  Some(&logo))
                          .await?;
    let product = console.products
                         .create(ProductDraft { name: "Cheeseburger".into(),
                                                mp: 25.0,
                                                sp: 59.0,
                                                pt: 3.5,
                                                category: Some(category.label.clone()),
                                                ..Default::default() },
                                 Some(&logo))
                         .await?;
    info!("producto {} con imagen {:?}", product.name, product.image_url);

    // contratación
    let applicant = console.applicants
                           .create(ApplicantDraft::new("Jane Doe", DEMO_EMAIL, EmploymentType::WorkingStudent))
                           .await?;
    while let Some(promoted) = console.applicants.promote(applicant.id, None).await? {
        info!("{} -> {}", promoted.fullname, promoted.status);
    }
    let deployment = console.deployments.deploy(applicant.id, Some("walkthrough".into())).await?;

    // estación
    let station = console.stations
                         .update(deployment.station.id,
                                 StationPatch { station_name: Some(Some(StationName::Grill)),
                                                ..Default::default() })
                         .await?;
    console.stations.promote(station.id, Some("first shift".into())).await?;

    let note = console.notes.save("Inventory count on Friday").await?;

    // recuperación de contraseña
    let mail = outbox(app)?;
    console.otp.issue_otp(DEMO_EMAIL).await?;
    let code = mail.last_to(DEMO_EMAIL)
                   .and_then(|m| m.params.get("passcode").cloned())
                   .ok_or_else(|| CoreError::remote("passcode mail missing"))?;
    let verified = console.otp.verify_otp(DEMO_EMAIL, &code).await?;
    let auth = RecordAuthService::new(app.backends.accounts.clone());
    console.otp.reset_password(&auth, DEMO_EMAIL, "fresh-start").await?;
    let password_reset = verified && auth.sign_in(DEMO_EMAIL, "fresh-start").await.is_ok();

    let history = console.applicant_history.for_subject(applicant.id).await?;
    Ok(WalkthroughReport { applicant_id: applicant.id,
                           employee_id: deployment.employee.id,
                           product_image_url: product.image_url,
                           history_steps: history.len(),
                           summary: console.summary(recent).await,
                           chart: console.chart(ChartSelection::Employee(deployment.employee.id)).await,
                           note: Some(note.text),
                           password_reset,
                           notices: notifier.notices().into_iter().map(|n| n.message).collect() })
}
