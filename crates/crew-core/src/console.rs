//! Contenedor explícito con todos los stores de la consola.
//!
//! Se construye con `Console::new` a partir de un juego de backends y se
//! libera con `dispose` (o al soltarlo): los canales de cambios abiertos se
//! cierran con él.
use std::sync::Arc;

use chrono::Duration;
use crew_domain::{station_chart, AdminNote, Applicant, ApplicantStatus, ApplicantSummary, ChartPoint, ChartSelection,
                  Employee, EmployeeStation, Product, ProductCategory, StationStatus, StatusChange};

use crate::auth::{Account, AuthStore, RecordAuthService};
use crate::boundary::{BlobStorage, RecordBackend};
use crate::catalog::CatalogStore;
use crate::clock::{Clock, SystemClock};
use crate::deploy::DeploymentService;
use crate::errors::CoreError;
use crate::images::ImageAttachments;
use crate::mail::MailDispatcher;
use crate::memory::{InMemoryBackend, InMemoryBlobStorage};
use crate::notes::NoteBoard;
use crate::notify::Notifier;
use crate::otp::{OneTimePasscode, PasscodeService, DEFAULT_OTP_TTL_MINUTES};
use crate::store::{RecordStore, StatusHistory};

/// Un backend por colección más storage de blobs y correo.
#[derive(Clone)]
pub struct Backends {
    pub applicants: Arc<dyn RecordBackend<Applicant>>,
    pub applicant_history: Arc<dyn RecordBackend<StatusChange<ApplicantStatus>>>,
    pub employees: Arc<dyn RecordBackend<Employee>>,
    pub stations: Arc<dyn RecordBackend<EmployeeStation>>,
    pub station_history: Arc<dyn RecordBackend<StatusChange<StationStatus>>>,
    pub products: Arc<dyn RecordBackend<Product>>,
    pub categories: Arc<dyn RecordBackend<ProductCategory>>,
    pub notes: Arc<dyn RecordBackend<AdminNote>>,
    pub accounts: Arc<dyn RecordBackend<Account>>,
    pub passcodes: Arc<dyn RecordBackend<OneTimePasscode>>,
    pub blobs: Arc<dyn BlobStorage>,
    pub mailer: Arc<dyn MailDispatcher>,
}

impl Backends {
    /// Todo en memoria, con el reloj dado para marcas de tiempo.
    pub fn in_memory(clock: Arc<dyn Clock>, mailer: Arc<dyn MailDispatcher>) -> Self {
        Backends { applicants: Arc::new(InMemoryBackend::<Applicant>::with_clock(clock.clone())),
                   applicant_history: Arc::new(InMemoryBackend::<StatusChange<ApplicantStatus>>::with_clock(clock.clone())),
                   employees: Arc::new(InMemoryBackend::<Employee>::with_clock(clock.clone())),
                   stations: Arc::new(InMemoryBackend::<EmployeeStation>::with_clock(clock.clone())),
                   station_history: Arc::new(InMemoryBackend::<StatusChange<StationStatus>>::with_clock(clock.clone())),
                   products: Arc::new(InMemoryBackend::<Product>::with_clock(clock.clone())),
                   categories: Arc::new(InMemoryBackend::<ProductCategory>::with_clock(clock.clone())),
                   notes: Arc::new(InMemoryBackend::<AdminNote>::with_clock(clock.clone())),
                   accounts: Arc::new(InMemoryBackend::<Account>::with_clock(clock.clone())),
                   passcodes: Arc::new(InMemoryBackend::<OneTimePasscode>::with_clock(clock)),
                   blobs: Arc::new(InMemoryBlobStorage::default()),
                   mailer }
    }
}

#[derive(Clone)]
pub struct ConsoleOptions {
    pub otp_ttl: Duration,
    pub clock: Arc<dyn Clock>,
}

impl Default for ConsoleOptions {
    fn default() -> Self {
        Self { otp_ttl: Duration::minutes(DEFAULT_OTP_TTL_MINUTES),
               clock: Arc::new(SystemClock) }
    }
}

pub struct Console {
    pub applicants: Arc<RecordStore<Applicant>>,
    pub applicant_history: Arc<StatusHistory<ApplicantStatus>>,
    pub employees: Arc<RecordStore<Employee>>,
    pub stations: Arc<RecordStore<EmployeeStation>>,
    pub station_history: Arc<StatusHistory<StationStatus>>,
    pub products: CatalogStore<Product>,
    pub categories: CatalogStore<ProductCategory>,
    pub notes: NoteBoard,
    pub auth: AuthStore,
    pub otp: PasscodeService,
    pub deployments: DeploymentService,
}

impl Console {
    pub fn new(backends: Backends, notifier: Arc<dyn Notifier>, options: ConsoleOptions) -> Self {
        let applicant_history = Arc::new(StatusHistory::new(backends.applicant_history.clone()));
        let station_history = Arc::new(StatusHistory::new(backends.station_history.clone()));

        let applicants = Arc::new(RecordStore::new(backends.applicants.clone(), notifier.clone())
                                      .with_hook(applicant_history.clone()));
        let employees = Arc::new(RecordStore::new(backends.employees.clone(), notifier.clone()));
        let stations = Arc::new(RecordStore::new(backends.stations.clone(), notifier.clone())
                                    .with_hook(station_history.clone()));

        let images = ImageAttachments::with_clock(backends.blobs.clone(), options.clock.clone());
        let products = CatalogStore::new(RecordStore::new(backends.products.clone(), notifier.clone()), images.clone());
        let categories = CatalogStore::new(RecordStore::new(backends.categories.clone(), notifier.clone()), images);

        let auth_service = Arc::new(RecordAuthService::with_clock(backends.accounts.clone(), options.clock.clone()));
        let auth = AuthStore::new(auth_service.clone(), notifier.clone());
        let otp = PasscodeService::new(backends.passcodes.clone(), backends.mailer.clone(), notifier.clone())
            .with_clock(options.clock.clone())
            .with_ttl(options.otp_ttl);

        let deployments = DeploymentService::new(applicants.clone(),
                                                 employees.clone(),
                                                 stations.clone(),
                                                 auth_service,
                                                 backends.mailer.clone(),
                                                 notifier.clone());

        Console { applicants,
                  applicant_history,
                  employees,
                  stations,
                  station_history,
                  products,
                  categories,
                  notes: NoteBoard::new(RecordStore::new(backends.notes, notifier)),
                  auth,
                  otp,
                  deployments }
    }

    /// Carga inicial de todas las colecciones del tablero.
    pub async fn load(&self) -> Result<(), CoreError> {
        self.applicants.fetch_all().await?;
        self.employees.fetch_all().await?;
        self.stations.fetch_all().await?;
        self.products.records().fetch_all().await?;
        self.categories.records().fetch_all().await?;
        self.notes.fetch_latest().await?;
        Ok(())
    }

    pub async fn summary(&self, recent: usize) -> ApplicantSummary {
        ApplicantSummary::from_applicants(&self.applicants.snapshot().await, recent)
    }

    pub async fn chart(&self, selection: ChartSelection) -> Vec<ChartPoint> {
        station_chart(&self.employees.snapshot().await, &self.stations.snapshot().await, selection)
    }

    /// Cierra todos los canales de cambios.
    pub async fn dispose(&self) {
        self.applicants.dispose().await;
        self.employees.dispose().await;
        self.stations.dispose().await;
        self.products.records().dispose().await;
        self.categories.records().dispose().await;
    }
}
