//! `MailDispatcher` sobre la API REST de EmailJS.
//!
//! Cada `MailTemplate` se traduce al id de plantilla configurado; los
//! `params` del mensaje viajan tal cual como `template_params`.

use std::collections::BTreeMap;

use async_trait::async_trait;
use crew_core::{CoreError, MailDispatcher, MailMessage, MailTemplate};
use log::{debug, error};
use serde::Serialize;

use crate::config::EmailJsConfig;

/// Cuerpo JSON aceptado por `POST /api/v1.0/email/send`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailJsRequest {
    pub service_id: String,
    pub template_id: String,
    pub user_id: String,
    pub template_params: BTreeMap<String, String>,
}

pub struct EmailJsDispatcher {
    config: EmailJsConfig,
    client: reqwest::Client,
}

impl EmailJsDispatcher {
    pub fn new(config: EmailJsConfig) -> Self {
        Self { config,
               client: reqwest::Client::new() }
    }

    pub fn template_id(&self, template: MailTemplate) -> &str {
        match template {
            MailTemplate::Deployment => &self.config.deployment_template_id,
            MailTemplate::Otp => &self.config.otp_template_id,
        }
    }

    pub fn request_for(&self, message: &MailMessage) -> EmailJsRequest {
        EmailJsRequest { service_id: self.config.service_id.clone(),
                         template_id: self.template_id(message.template).to_string(),
                         user_id: self.config.public_key.clone(),
                         template_params: message.params.clone() }
    }
}

#[async_trait]
impl MailDispatcher for EmailJsDispatcher {
    async fn send(&self, message: &MailMessage) -> Result<(), CoreError> {
        let body = self.request_for(message);
        debug!("emailjs send template={} to={}", body.template_id, message.to);
        let response = self.client
                           .post(&self.config.endpoint)
                           .json(&body)
                           .send()
                           .await
                           .map_err(|e| CoreError::remote(format!("email request failed: {e}")))?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        // EmailJS responde texto plano con el motivo
        let text = response.text().await.unwrap_or_default();
        error!("emailjs rejected message to {}: {} {}", message.to, status, text);
        let reason = if text.trim().is_empty() { status.to_string() } else { text };
        Err(CoreError::remote(reason))
    }
}
