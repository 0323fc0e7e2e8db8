//! Autenticación: cuentas, sesión actual y estado de sesión para la UI.
//!
//! `AuthService` es la frontera; `RecordAuthService` la implementa sobre una
//! colección `accounts` con digest SHA-256 salado. `AuthStore` guarda
//! `session`/`loading`/`error` y emite avisos como el resto de stores.
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use crew_domain::{validate::require_email, DomainError, Record, Scope};
use log::debug;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::boundary::RecordBackend;
use crate::clock::{Clock, SystemClock};
use crate::errors::CoreError;
use crate::hashing::{digest_hex, new_salt};
use crate::notify::{Notifier, Operation};

pub const MIN_PASSWORD_LEN: usize = 6;

pub fn validate_password(password: &str) -> Result<(), CoreError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(CoreError::invalid("password", format!("must be at least {MIN_PASSWORD_LEN} characters")));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub salt: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AccountDraft {
    pub email: String,
    pub password_hash: String,
    pub salt: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AccountPatch {
    pub password_hash: String,
    pub salt: String,
}

impl Account {
    pub fn password_matches(&self, password: &str) -> bool {
        digest_hex(&[&self.salt, password]) == self.password_hash
    }
}

impl Record for Account {
    type Draft = AccountDraft;
    type Patch = AccountPatch;

    const COLLECTION: &'static str = "accounts";
    const LABEL: &'static str = "account";

    fn id(&self) -> Uuid {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn validate_draft(draft: &AccountDraft) -> Result<(), DomainError> {
        require_email("email", &draft.email)
    }

    fn from_draft(id: Uuid, draft: AccountDraft, now: DateTime<Utc>) -> Self {
        Account { id,
                  email: draft.email.trim().to_lowercase(),
                  password_hash: draft.password_hash,
                  salt: draft.salt,
                  created_at: now,
                  updated_at: now }
    }

    fn apply_patch(&mut self, patch: AccountPatch, now: DateTime<Utc>) {
        self.password_hash = patch.password_hash;
        self.salt = patch.salt;
        self.updated_at = now;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user: AuthUser,
    pub token: String,
    pub issued_at: DateTime<Utc>,
}

#[async_trait]
pub trait AuthService: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, CoreError>;
    async fn current_session(&self) -> Result<Option<Session>, CoreError>;
    async fn sign_out(&self) -> Result<(), CoreError>;
    /// Cambia la contraseña del usuario con sesión activa.
    async fn update_password(&self, new_password: &str) -> Result<AuthUser, CoreError>;
    /// Alta de una cuenta nueva (aprovisionamiento al desplegar).
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthUser, CoreError>;
    /// Cambio de contraseña sin sesión, tras verificar un OTP.
    async fn reset_password(&self, email: &str, new_password: &str) -> Result<AuthUser, CoreError>;
}

pub struct RecordAuthService {
    accounts: Arc<dyn RecordBackend<Account>>,
    session: RwLock<Option<Session>>,
    clock: Arc<dyn Clock>,
}

impl RecordAuthService {
    pub fn new(accounts: Arc<dyn RecordBackend<Account>>) -> Self {
        Self::with_clock(accounts, Arc::new(SystemClock))
    }

    pub fn with_clock(accounts: Arc<dyn RecordBackend<Account>>, clock: Arc<dyn Clock>) -> Self {
        Self { accounts,
               session: RwLock::new(None),
               clock }
    }

    async fn find_account(&self, email: &str) -> Result<Option<Account>, CoreError> {
        let wanted = email.trim().to_lowercase();
        Ok(self.accounts
               .list(&Scope::All)
               .await?
               .into_iter()
               .find(|a| a.email == wanted))
    }

    async fn set_password(&self, account: &Account, new_password: &str) -> Result<AuthUser, CoreError> {
        validate_password(new_password)?;
        let salt = new_salt();
        let patch = AccountPatch { password_hash: digest_hex(&[&salt, new_password]),
                                   salt };
        let updated = self.accounts.update(account.id, patch).await?;
        Ok(AuthUser { id: updated.id,
                      email: updated.email })
    }
}

#[async_trait]
impl AuthService for RecordAuthService {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, CoreError> {
        let account = self.find_account(email)
                          .await?
                          .filter(|a| a.password_matches(password))
                          .ok_or_else(|| CoreError::remote("Invalid login credentials"))?;
        let session = Session { user: AuthUser { id: account.id,
                                                  email: account.email },
                                token: Uuid::new_v4().simple().to_string(),
                                issued_at: self.clock.now() };
        *self.session.write().await = Some(session.clone());
        debug!("session opened for {}", session.user.email);
        Ok(session)
    }

    async fn current_session(&self) -> Result<Option<Session>, CoreError> {
        Ok(self.session.read().await.clone())
    }

    async fn sign_out(&self) -> Result<(), CoreError> {
        *self.session.write().await = None;
        Ok(())
    }

    async fn update_password(&self, new_password: &str) -> Result<AuthUser, CoreError> {
        let user = self.session
                       .read()
                       .await
                       .as_ref()
                       .map(|s| s.user.clone())
                       .ok_or_else(|| CoreError::remote("Auth session missing!"))?;
        let account = self.accounts
                          .get_by_id(user.id)
                          .await?
                          .ok_or_else(|| CoreError::remote("User not found"))?;
        self.set_password(&account, new_password).await
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthUser, CoreError> {
        validate_password(password)?;
        if self.find_account(email).await?.is_some() {
            return Err(CoreError::remote("User already registered"));
        }
        let salt = new_salt();
        let draft = AccountDraft { email: email.to_string(),
                                   password_hash: digest_hex(&[&salt, password]),
                                   salt };
        Account::validate_draft(&draft)?;
        let account = self.accounts.create(draft).await?;
        Ok(AuthUser { id: account.id,
                      email: account.email })
    }

    async fn reset_password(&self, email: &str, new_password: &str) -> Result<AuthUser, CoreError> {
        let account = self.find_account(email)
                          .await?
                          .ok_or_else(|| CoreError::remote("User not found"))?;
        self.set_password(&account, new_password).await
    }
}

#[derive(Debug, Clone, Default)]
pub struct AuthState {
    pub session: Option<Session>,
    pub loading: bool,
    pub error: Option<String>,
}

pub struct AuthStore {
    auth: Arc<dyn AuthService>,
    notifier: Arc<dyn Notifier>,
    state: RwLock<AuthState>,
}

impl AuthStore {
    pub fn new(auth: Arc<dyn AuthService>, notifier: Arc<dyn Notifier>) -> Self {
        Self { auth,
               notifier,
               state: RwLock::new(AuthState::default()) }
    }

    pub fn service(&self) -> Arc<dyn AuthService> {
        Arc::clone(&self.auth)
    }

    pub async fn session(&self) -> Option<Session> {
        self.state.read().await.session.clone()
    }

    pub async fn user(&self) -> Option<AuthUser> {
        self.state.read().await.session.as_ref().map(|s| s.user.clone())
    }

    pub async fn is_loading(&self) -> bool {
        self.state.read().await.loading
    }

    pub async fn last_error(&self) -> Option<String> {
        self.state.read().await.error.clone()
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, CoreError> {
        self.begin().await;
        let result = self.auth.sign_in(email, password).await;
        self.finish(Operation::SignIn, result.as_ref().map(|s| Some(s.clone())), true)
            .await?;
        result
    }

    pub async fn sign_out(&self) -> Result<(), CoreError> {
        self.begin().await;
        let result = self.auth.sign_out().await;
        self.finish(Operation::SignOut, result.as_ref().map(|_| None), true).await
    }

    /// Relee la sesión del servicio. Sólo avisa si falla.
    pub async fn refresh_session(&self) -> Result<Option<Session>, CoreError> {
        self.begin().await;
        let result = self.auth.current_session().await;
        self.finish(Operation::RefreshSession, result.as_ref().cloned(), false).await?;
        result
    }

    pub async fn update_password(&self, new_password: &str) -> Result<(), CoreError> {
        self.begin().await;
        let result = match self.auth.update_password(new_password).await {
            Ok(_) => self.auth.current_session().await,
            Err(err) => Err(err),
        };
        self.finish(Operation::UpdatePassword, result.as_ref().cloned(), true).await
    }

    async fn begin(&self) {
        let mut state = self.state.write().await;
        state.loading = true;
        state.error = None;
    }

    async fn finish(&self, op: Operation, result: Result<Option<Session>, &CoreError>, announce: bool)
                    -> Result<(), CoreError> {
        let mut state = self.state.write().await;
        state.loading = false;
        match result {
            Ok(session) => {
                state.session = session;
                if announce {
                    self.notifier.notify(op.success("session"));
                }
                Ok(())
            }
            Err(err) => {
                let notice = op.failure("session", err);
                state.error = Some(notice.message.clone());
                self.notifier.notify(notice);
                Err(err.clone())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryBackend;
    use crate::notify::{NoticeLevel, RecordingNotifier};

    fn service() -> Arc<RecordAuthService> {
        Arc::new(RecordAuthService::new(Arc::new(InMemoryBackend::<Account>::new())))
    }

    #[tokio::test]
    async fn sign_up_then_sign_in() {
        let auth = service();
        let user = auth.sign_up("Jane@X.com", "janedoe1").await.unwrap();
        assert_eq!(user.email, "jane@x.com");
        let session = auth.sign_in("jane@x.com", "janedoe1").await.unwrap();
        assert_eq!(session.user.id, user.id);
        assert!(auth.sign_in("jane@x.com", "wrong-pass").await.is_err());
    }

    #[tokio::test]
    async fn short_passwords_are_rejected() {
        let auth = service();
        let err = auth.sign_up("jane@x.com", "123").await.unwrap_err();
        assert!(matches!(err, CoreError::ValidationFailed { .. }));
    }

    #[tokio::test]
    async fn duplicate_sign_up_fails() {
        let auth = service();
        auth.sign_up("jane@x.com", "secret1").await.unwrap();
        assert_eq!(auth.sign_up("JANE@x.com", "secret2").await.unwrap_err(),
                   CoreError::remote("User already registered"));
    }

    #[tokio::test]
    async fn store_tracks_session_and_notifies() {
        let auth = service();
        auth.sign_up("jane@x.com", "secret1").await.unwrap();
        let notifier = Arc::new(RecordingNotifier::new());
        let store = AuthStore::new(auth, notifier.clone());

        assert!(store.sign_in("jane@x.com", "nope").await.is_err());
        assert_eq!(store.last_error().await.as_deref(), Some("Failed to sign in: Invalid login credentials"));
        assert!(store.session().await.is_none());

        store.sign_in("jane@x.com", "secret1").await.unwrap();
        assert_eq!(store.user().await.unwrap().email, "jane@x.com");
        assert_eq!(notifier.last().unwrap().message, "Signed in successfully!");

        store.update_password("secret2").await.unwrap();
        assert!(store.session().await.is_some());

        store.sign_out().await.unwrap();
        assert!(store.session().await.is_none());
        let failures = notifier.notices().into_iter().filter(|n| n.level == NoticeLevel::Failure).count();
        assert_eq!(failures, 1);
    }
}
