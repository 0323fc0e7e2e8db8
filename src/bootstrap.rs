//! Arma la `Console` a partir de `AppConfig`: Postgres o memoria para los
//! datos, EmailJS o buzón en memoria para el correo.
use std::sync::Arc;

use crew_adapters::EmailJsDispatcher;
use crew_core::{Backends, Clock, Console, ConsoleOptions, MailDispatcher, Notifier, RecordingMailer, SystemClock};
use crew_persistence::{build_pool, pg_backends, PoolProvider};
use log::{info, warn};

use crate::config::AppConfig;
use crate::errors::AppError;

/// Consola lista para usar junto con los backends que la sostienen.
pub struct App {
    pub console: Console,
    pub backends: Backends,
    /// Presente cuando el correo no sale del proceso.
    pub outbox: Option<Arc<RecordingMailer>>,
}

pub fn build_app(cfg: &AppConfig, notifier: Arc<dyn Notifier>) -> Result<App, AppError> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let (mailer, outbox): (Arc<dyn MailDispatcher>, Option<Arc<RecordingMailer>>) = match &cfg.mail {
        Some(mail) => (Arc::new(EmailJsDispatcher::new(mail.clone())), None),
        None => {
            warn!("EmailJS no configurado: los correos quedan en memoria");
            let outbox = Arc::new(RecordingMailer::new());
            (outbox.clone(), Some(outbox))
        }
    };

    let backends = match &cfg.database {
        Some(db) => {
            let pool = build_pool(&db.url, db.min_connections, db.max_connections)?;
            info!("backends Postgres (pool {}..{})", db.min_connections, db.max_connections);
            pg_backends(Arc::new(PoolProvider { pool }), &db.storage_public_url, clock.clone(), mailer)
        }
        None => {
            info!("backends en memoria");
            Backends::in_memory(clock.clone(), mailer)
        }
    };

    let console = Console::new(backends.clone(),
                               notifier,
                               ConsoleOptions { otp_ttl: cfg.otp_ttl,
                                                clock });
    Ok(App { console,
             backends,
             outbox })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crew_core::RecordingNotifier;

    #[test]
    fn in_memory_app_keeps_mail_local() {
        let app = build_app(&AppConfig::in_memory(), Arc::new(RecordingNotifier::new())).unwrap();
        assert!(app.outbox.is_some());
    }
}
