//! Códigos de un solo uso para recuperar la contraseña.
//!
//! Se persiste sólo el digest de `email:código`. Un código vale mientras
//! `now <= expires_at` y no se haya usado; verificarlo lo marca como usado.
//! El reseteo de contraseña exige un código verificado dentro de la ventana
//! y lo canjea: cada verificación autoriza un solo reseteo.
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use crew_domain::{validate::require_email, DomainError, Record, Scope};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::{validate_password, AuthService};
use crate::boundary::RecordBackend;
use crate::clock::{Clock, SystemClock};
use crate::errors::CoreError;
use crate::hashing::digest_hex;
use crate::mail::{MailDispatcher, MailMessage};
use crate::notify::{Notifier, Operation};

pub const DEFAULT_OTP_TTL_MINUTES: i64 = 5;
pub const OTP_DIGITS: usize = 6;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneTimePasscode {
    pub id: Uuid,
    pub email: String,
    pub code_hash: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
    #[serde(default)]
    pub redeemed: bool,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PasscodeDraft {
    pub email: String,
    pub code_hash: String,
    pub expires_at: DateTime<Utc>,
}

/// Transiciones permitidas: verificado, y después canjeado por un reseteo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasscodeUpdate {
    MarkUsed,
    Redeem,
}

impl Record for OneTimePasscode {
    type Draft = PasscodeDraft;
    type Patch = PasscodeUpdate;

    const COLLECTION: &'static str = "one_time_passcodes";
    const LABEL: &'static str = "passcode";

    fn id(&self) -> Uuid {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn validate_draft(draft: &PasscodeDraft) -> Result<(), DomainError> {
        require_email("email", &draft.email)
    }

    fn from_draft(id: Uuid, draft: PasscodeDraft, now: DateTime<Utc>) -> Self {
        OneTimePasscode { id,
                          email: draft.email,
                          code_hash: draft.code_hash,
                          created_at: now,
                          expires_at: draft.expires_at,
                          used: false,
                          redeemed: false,
                          updated_at: now }
    }

    fn apply_patch(&mut self, patch: PasscodeUpdate, now: DateTime<Utc>) {
        match patch {
            PasscodeUpdate::MarkUsed => self.used = true,
            PasscodeUpdate::Redeem => {
                self.used = true;
                self.redeemed = true;
            }
        }
        self.updated_at = now;
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn code_digest(email: &str, code: &str) -> String {
    digest_hex(&[&normalize_email(email), code])
}

/// Código numérico de `OTP_DIGITS` cifras, con ceros a la izquierda.
pub fn generate_code() -> String {
    let n = Uuid::new_v4().as_u128() % 1_000_000;
    format!("{n:06}")
}

fn check_code(code: &str) -> Result<(), CoreError> {
    let code = code.trim();
    if code.len() != OTP_DIGITS || !code.chars().all(|c| c.is_ascii_digit()) {
        return Err(CoreError::invalid("otp", format!("must be {OTP_DIGITS} digits")));
    }
    Ok(())
}

/// Emisión y verificación de códigos.
#[async_trait]
pub trait OtpService: Send + Sync {
    /// Genera, persiste y envía un código. Devuelve el registro guardado.
    async fn issue_otp(&self, email: &str) -> Result<OneTimePasscode, CoreError>;
    async fn verify_otp(&self, email: &str, code: &str) -> Result<bool, CoreError>;
}

pub struct PasscodeService {
    codes: Arc<dyn RecordBackend<OneTimePasscode>>,
    mailer: Arc<dyn MailDispatcher>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl PasscodeService {
    pub fn new(codes: Arc<dyn RecordBackend<OneTimePasscode>>,
               mailer: Arc<dyn MailDispatcher>,
               notifier: Arc<dyn Notifier>)
               -> Self {
        Self { codes,
               mailer,
               notifier,
               clock: Arc::new(SystemClock),
               ttl: Duration::minutes(DEFAULT_OTP_TTL_MINUTES) }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    async fn issue_with_code(&self, email: &str, code: &str) -> Result<OneTimePasscode, CoreError> {
        match self.send_code(email, code).await {
            Ok(record) => {
                self.notifier.notify(Operation::SendOtp.success(OneTimePasscode::LABEL));
                Ok(record)
            }
            Err(err) => {
                self.notifier.notify(Operation::SendOtp.failure(OneTimePasscode::LABEL, &err));
                Err(err)
            }
        }
    }

    async fn send_code(&self, email: &str, code: &str) -> Result<OneTimePasscode, CoreError> {
        require_email("email", email)?;
        let email = normalize_email(email);
        let draft = PasscodeDraft { code_hash: code_digest(&email, code),
                                    expires_at: self.clock.now() + self.ttl,
                                    email: email.clone() };
        let record = self.codes.create(draft).await?;
        self.mailer
            .send(&MailMessage::otp(&email, code, self.ttl.num_minutes()))
            .await?;
        info!("passcode issued for {email}, expires at {}", record.expires_at);
        Ok(record)
    }

    async fn verified_code(&self, email: &str) -> Result<Option<OneTimePasscode>, CoreError> {
        let email = normalize_email(email);
        let now = self.clock.now();
        Ok(self.codes
               .list(&Scope::All)
               .await?
               .into_iter()
               .find(|c| c.email == email && c.used && !c.redeemed && now <= c.expires_at))
    }

    /// ¿Hay un código de `email` verificado, sin canjear y con la ventana abierta?
    pub async fn has_verified_code(&self, email: &str) -> Result<bool, CoreError> {
        Ok(self.verified_code(email).await?.is_some())
    }

    /// Cambia la contraseña canjeando una verificación exitosa.
    pub async fn reset_password(&self, auth: &dyn AuthService, email: &str, new_password: &str)
                                -> Result<(), CoreError> {
        match self.redeem_and_reset(auth, email, new_password).await {
            Ok(()) => {
                self.notifier.notify(Operation::ResetPassword.success(OneTimePasscode::LABEL));
                Ok(())
            }
            Err(err) => {
                self.notifier.notify(Operation::ResetPassword.failure(OneTimePasscode::LABEL, &err));
                Err(err)
            }
        }
    }

    async fn redeem_and_reset(&self, auth: &dyn AuthService, email: &str, new_password: &str)
                              -> Result<(), CoreError> {
        validate_password(new_password)?;
        let Some(record) = self.verified_code(email).await? else {
            return Err(CoreError::invalid("otp", "no verified passcode for this email"));
        };
        // Canjear antes de resetear: dos reseteos concurrentes no comparten código.
        self.codes.update(record.id, PasscodeUpdate::Redeem).await?;
        auth.reset_password(email, new_password).await?;
        debug!("passcode {} redeemed", record.id);
        Ok(())
    }

    async fn check_and_mark(&self, email: &str, code: &str) -> Result<bool, CoreError> {
        check_code(code)?;
        let email = normalize_email(email);
        let digest = code_digest(&email, code.trim());
        let now = self.clock.now();
        let candidate = self.codes
                            .list(&Scope::All)
                            .await?
                            .into_iter()
                            .find(|c| c.email == email && !c.used && c.code_hash == digest && now <= c.expires_at);
        match candidate {
            Some(record) => {
                self.codes.update(record.id, PasscodeUpdate::MarkUsed).await?;
                debug!("passcode {} verified", record.id);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl OtpService for PasscodeService {
    async fn issue_otp(&self, email: &str) -> Result<OneTimePasscode, CoreError> {
        self.issue_with_code(email, &generate_code()).await
    }

    async fn verify_otp(&self, email: &str, code: &str) -> Result<bool, CoreError> {
        let outcome = self.check_and_mark(email, code).await;
        let notice = match &outcome {
            Ok(true) => Operation::VerifyOtp.success(OneTimePasscode::LABEL),
            Ok(false) => {
                let rejected = CoreError::invalid("otp", "invalid or expired code");
                Operation::VerifyOtp.failure(OneTimePasscode::LABEL, &rejected)
            }
            Err(err) => Operation::VerifyOtp.failure(OneTimePasscode::LABEL, err),
        };
        self.notifier.notify(notice);
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::mail::RecordingMailer;
    use crate::auth::{Account, RecordAuthService};
    use crate::memory::InMemoryBackend;
    use crate::notify::RecordingNotifier;

    fn service(clock: Arc<ManualClock>) -> (PasscodeService, Arc<RecordingMailer>) {
        let (svc, mailer, _) = service_with_notices(clock);
        (svc, mailer)
    }

    fn service_with_notices(clock: Arc<ManualClock>)
                            -> (PasscodeService, Arc<RecordingMailer>, Arc<RecordingNotifier>) {
        let mailer = Arc::new(RecordingMailer::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let codes = Arc::new(InMemoryBackend::<OneTimePasscode>::with_clock(clock.clone()));
        (PasscodeService::new(codes, mailer.clone(), notifier.clone()).with_clock(clock), mailer, notifier)
    }

    fn messages(notifier: &RecordingNotifier) -> Vec<String> {
        notifier.take().into_iter().map(|n| n.message).collect()
    }

    #[test]
    fn generated_codes_are_six_digits() {
        for _ in 0..50 {
            let code = generate_code();
            assert_eq!(code.len(), 6);
            assert!(check_code(&code).is_ok());
        }
    }

    #[tokio::test]
    async fn code_is_single_use() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let (svc, mailer) = service(clock);
        svc.issue_with_code("a@b.com", "123456").await.unwrap();
        assert_eq!(mailer.last_to("a@b.com").unwrap().params["passcode"], "123456");

        assert!(!svc.verify_otp("a@b.com", "654321").await.unwrap());
        assert!(svc.verify_otp("A@B.com", "123456").await.unwrap());
        assert!(!svc.verify_otp("a@b.com", "123456").await.unwrap());
    }

    #[tokio::test]
    async fn expired_code_is_rejected() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let (svc, _) = service(clock.clone());
        svc.issue_with_code("a@b.com", "123456").await.unwrap();
        clock.advance(Duration::minutes(6));
        assert!(!svc.verify_otp("a@b.com", "123456").await.unwrap());
    }

    #[tokio::test]
    async fn malformed_code_is_a_validation_error() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let (svc, _) = service(clock);
        for bad in ["", "12345", "12a456", "1234567"] {
            let err = svc.verify_otp("a@b.com", bad).await.unwrap_err();
            assert!(matches!(err, CoreError::ValidationFailed { .. }), "{bad}");
        }
    }

    #[tokio::test]
    async fn each_step_reports_a_notice() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let (svc, mailer, notifier) = service_with_notices(clock);
        svc.issue_with_code("a@b.com", "123456").await.unwrap();
        svc.issue_with_code("not-an-email", "123456").await.unwrap_err();
        mailer.set_failure(Some("quota exceeded"));
        svc.issue_with_code("a@b.com", "654321").await.unwrap_err();
        mailer.set_failure(None);
        let sent = messages(&notifier);
        assert_eq!(sent[0], "OTP sent");
        assert!(sent[1].starts_with("Failed to send OTP"));
        assert_eq!(sent[2], "Failed to send OTP: quota exceeded");

        assert!(!svc.verify_otp("a@b.com", "000000").await.unwrap());
        assert!(svc.verify_otp("a@b.com", "123456").await.unwrap());
        let verified = messages(&notifier);
        assert_eq!(verified[0], "Failed to verify OTP: invalid otp: invalid or expired code");
        assert_eq!(verified[1], "OTP verified");
    }

    #[tokio::test]
    async fn a_verification_authorizes_a_single_reset() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let (svc, _, notifier) = service_with_notices(clock.clone());
        let accounts = Arc::new(InMemoryBackend::<Account>::with_clock(clock.clone()));
        let auth = RecordAuthService::with_clock(accounts, clock);
        auth.sign_up("a@b.com", "initial1").await.unwrap();

        svc.issue_with_code("a@b.com", "123456").await.unwrap();
        assert!(svc.verify_otp("a@b.com", "123456").await.unwrap());
        notifier.take();

        svc.reset_password(&auth, "a@b.com", "second2").await.unwrap();
        assert_eq!(notifier.last().unwrap().message, "Password reset successful!");
        assert!(!svc.has_verified_code("a@b.com").await.unwrap());

        let err = svc.reset_password(&auth, "a@b.com", "third33").await.unwrap_err();
        assert!(matches!(err, CoreError::ValidationFailed { .. }));
        assert!(notifier.last().unwrap().message.starts_with("Failed to reset password"));
    }
}
