//! Envío de correos transaccionales por plantilla.
use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MailTemplate {
    /// Credenciales del empleado recién desplegado.
    Deployment,
    /// Código de recuperación de contraseña.
    Otp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailMessage {
    pub template: MailTemplate,
    pub to: String,
    pub params: BTreeMap<String, String>,
}

impl MailMessage {
    pub fn new(template: MailTemplate, to: impl Into<String>) -> Self {
        Self { template,
               to: to.into(),
               params: BTreeMap::new() }
    }

    pub fn param(mut self, key: &str, value: impl Into<String>) -> Self {
        self.params.insert(key.to_string(), value.into());
        self
    }

    pub fn deployment(name: &str, email: &str, password: &str) -> Self {
        Self::new(MailTemplate::Deployment, email).param("name", name)
                                                 .param("email", email)
                                                 .param("password", password)
    }

    pub fn otp(email: &str, code: &str, ttl_minutes: i64) -> Self {
        Self::new(MailTemplate::Otp, email).param("email", email)
                                          .param("passcode", code)
                                          .param("time", format!("{ttl_minutes} minutes"))
    }
}

#[async_trait]
pub trait MailDispatcher: Send + Sync {
    async fn send(&self, message: &MailMessage) -> Result<(), CoreError>;
}

/// Guarda los mensajes en vez de enviarlos.
#[derive(Debug, Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<MailMessage>>,
    failure: Mutex<Option<String>>,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<MailMessage> {
        self.sent.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    pub fn last_to(&self, to: &str) -> Option<MailMessage> {
        self.sent().into_iter().rev().find(|m| m.to == to)
    }

    pub fn set_failure(&self, message: Option<&str>) {
        *self.failure.lock().unwrap_or_else(|p| p.into_inner()) = message.map(str::to_string);
    }
}

#[async_trait]
impl MailDispatcher for RecordingMailer {
    async fn send(&self, message: &MailMessage) -> Result<(), CoreError> {
        if let Some(err) = self.failure.lock().unwrap_or_else(|p| p.into_inner()).clone() {
            return Err(CoreError::remote(err));
        }
        self.sent.lock().unwrap_or_else(|p| p.into_inner()).push(message.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn deployment_message_carries_credentials() {
        let mailer = RecordingMailer::new();
        mailer.send(&MailMessage::deployment("Jane Doe", "jane@x.com", "janedoeab12"))
              .await
              .unwrap();
        let msg = mailer.last_to("jane@x.com").unwrap();
        assert_eq!(msg.template, MailTemplate::Deployment);
        assert_eq!(msg.params["name"], "Jane Doe");
        assert_eq!(msg.params["password"], "janedoeab12");
    }

    #[tokio::test]
    async fn failing_mailer_records_nothing() {
        let mailer = RecordingMailer::new();
        mailer.set_failure(Some("quota exceeded"));
        assert!(mailer.send(&MailMessage::otp("a@x.com", "123456", 5)).await.is_err());
        assert!(mailer.sent().is_empty());
    }
}
