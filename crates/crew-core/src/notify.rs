//! Avisos al usuario tras cada mutación.
//!
//! Los stores devuelven `Result` y, además, emiten un `Notice` a un `Notifier`
//! inyectado. El texto de fallo lleva el mensaje subyacente o, si no hay
//! detalle, una frase fija por operación.
use std::sync::Mutex;

use log::{info, warn};
use serde::Serialize;

use crate::errors::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NoticeLevel {
    Success,
    Failure,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Notice { level: NoticeLevel::Success,
                 message: message.into() }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Notice { level: NoticeLevel::Failure,
                 message: message.into() }
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Envía los avisos al log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Success => info!("{}", notice.message),
            NoticeLevel::Failure => warn!("{}", notice.message),
        }
    }
}

/// Acumula los avisos para inspeccionarlos después (tests, CLI).
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    pub fn last(&self) -> Option<Notice> {
        self.notices.lock().unwrap_or_else(|p| p.into_inner()).last().cloned()
    }

    pub fn take(&self) -> Vec<Notice> {
        std::mem::take(&mut *self.notices.lock().unwrap_or_else(|p| p.into_inner()))
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices.lock().unwrap_or_else(|p| p.into_inner()).push(notice);
    }
}

/// Operación que origina un aviso.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Fetch,
    Add,
    Update,
    Delete,
    Promote(String),
    Demote(String),
    Cancel,
    Deploy,
    SignIn,
    SignOut,
    RefreshSession,
    UpdatePassword,
    SendOtp,
    VerifyOtp,
    ResetPassword,
    SaveNote,
}

impl Operation {
    /// Mensaje de éxito para una entidad con etiqueta `label` ("applicant").
    pub fn success_message(&self, label: &str) -> String {
        let subject = capitalize(label);
        match self {
            Operation::Fetch => format!("{subject} list refreshed"),
            Operation::Add => format!("{subject} added successfully!"),
            Operation::Update => format!("{subject} updated successfully!"),
            Operation::Delete => format!("{subject} deleted successfully!"),
            Operation::Promote(to) => format!("{subject} promoted to {to}"),
            Operation::Demote(to) => format!("{subject} demoted to {to}"),
            Operation::Cancel => format!("{subject} has been cancelled"),
            Operation::Deploy => format!("{subject} has been deployed and email sent successfully!"),
            Operation::SignIn => "Signed in successfully!".to_string(),
            Operation::SignOut => "Signed out successfully!".to_string(),
            Operation::RefreshSession => "Session refreshed".to_string(),
            Operation::UpdatePassword => "Password updated successfully!".to_string(),
            Operation::SendOtp => "OTP sent".to_string(),
            Operation::VerifyOtp => "OTP verified".to_string(),
            Operation::ResetPassword => "Password reset successful!".to_string(),
            Operation::SaveNote => "Note saved".to_string(),
        }
    }

    /// Frase fija usada cuando el error no trae detalle.
    pub fn fallback_failure(&self, label: &str) -> String {
        match self {
            Operation::Fetch => format!("Failed to fetch {label} list"),
            Operation::Add => format!("Failed to add {label}"),
            Operation::Update => format!("Failed to update {label}"),
            Operation::Delete => format!("Failed to delete {label}"),
            Operation::Promote(_) => format!("Failed to promote {label}"),
            Operation::Demote(_) => format!("Failed to demote {label}"),
            Operation::Cancel => format!("Failed to cancel {label}"),
            Operation::Deploy => "Deployment failed".to_string(),
            Operation::SignIn => "Failed to sign in".to_string(),
            Operation::SignOut => "Failed to sign out".to_string(),
            Operation::RefreshSession => "Failed to get session".to_string(),
            Operation::UpdatePassword => "Failed to update password".to_string(),
            Operation::SendOtp => "Failed to send OTP".to_string(),
            Operation::VerifyOtp => "Failed to verify OTP".to_string(),
            Operation::ResetPassword => "Failed to reset password".to_string(),
            Operation::SaveNote => "Failed to save note".to_string(),
        }
    }

    pub fn success(&self, label: &str) -> Notice {
        Notice::success(self.success_message(label))
    }

    /// `"<frase>: <detalle>"`, o sólo la frase si el error viene vacío.
    pub fn failure(&self, label: &str, err: &CoreError) -> Notice {
        let phrase = self.fallback_failure(label);
        let detail = err.detail();
        if detail.is_empty() {
            Notice::failure(format!("{phrase}."))
        } else {
            Notice::failure(format!("{phrase}: {detail}"))
        }
    }
}

fn capitalize(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_messages_name_the_entity() {
        assert_eq!(Operation::Add.success_message("applicant"), "Applicant added successfully!");
        assert_eq!(Operation::Promote("interview".into()).success_message("applicant"),
                   "Applicant promoted to interview");
    }

    #[test]
    fn failure_carries_detail_or_falls_back() {
        let with_detail = Operation::Add.failure("product", &CoreError::remote("duplicate key"));
        assert_eq!(with_detail.message, "Failed to add product: duplicate key");
        assert_eq!(with_detail.level, NoticeLevel::Failure);

        let empty = Operation::Delete.failure("applicant", &CoreError::remote(""));
        assert_eq!(empty.message, "Failed to delete applicant.");
    }

    #[test]
    fn recording_notifier_keeps_order() {
        let n = RecordingNotifier::new();
        n.notify(Notice::success("a"));
        n.notify(Notice::failure("b"));
        assert_eq!(n.last().unwrap().message, "b");
        assert_eq!(n.take().len(), 2);
        assert!(n.notices().is_empty());
    }
}
