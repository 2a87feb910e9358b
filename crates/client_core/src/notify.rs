//! Transient user-facing messages derived from workflow events.
//!
//! Each message belongs to one logical operation key; a newer message for a
//! key replaces the older one instead of stacking next to it.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use shared::error::{RegistrationError, UploadError, ValidationError};
use tokio::sync::{broadcast, Mutex};

use crate::events::OrchestratorEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKey {
    Upload,
    Register,
    Voters,
}

impl NotificationKey {
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationKey::Upload => "upload",
            NotificationKey::Register => "register",
            NotificationKey::Voters => "voters",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub key: NotificationKey,
    pub severity: Severity,
    pub message: String,
    pub issued_at: DateTime<Utc>,
}

pub struct NotificationBridge {
    active: Mutex<HashMap<NotificationKey, Notification>>,
    published: broadcast::Sender<Notification>,
}

impl Default for NotificationBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationBridge {
    pub fn new() -> Self {
        let (published, _) = broadcast::channel(64);
        Self {
            active: Mutex::new(HashMap::new()),
            published,
        }
    }

    pub async fn notify(&self, event: &OrchestratorEvent) {
        let Some((key, severity, message)) = describe(event) else {
            return;
        };

        let notification = Notification {
            key,
            severity,
            message,
            issued_at: Utc::now(),
        };
        self.active
            .lock()
            .await
            .insert(key, notification.clone());
        let _ = self.published.send(notification);
    }

    pub async fn active(&self, key: NotificationKey) -> Option<Notification> {
        self.active.lock().await.get(&key).cloned()
    }

    pub async fn dismiss(&self, key: NotificationKey) -> Option<Notification> {
        self.active.lock().await.remove(&key)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.published.subscribe()
    }
}

fn describe(event: &OrchestratorEvent) -> Option<(NotificationKey, Severity, String)> {
    use NotificationKey::{Register, Upload, Voters};

    let described: (NotificationKey, Severity, String) = match event {
        OrchestratorEvent::UploadStarted { .. } => (Upload, Severity::Info, "Uploading image...".into()),
        OrchestratorEvent::UploadReady { .. } => (
            Upload,
            Severity::Success,
            "Image uploaded successfully!".into(),
        ),
        OrchestratorEvent::UploadRejected(error) | OrchestratorEvent::UploadFailed { error, .. } => {
            (Upload, Severity::Error, upload_message(error).into())
        }
        OrchestratorEvent::RegistrationRejected { error, .. } => {
            (Register, Severity::Error, validation_message(error).into())
        }
        OrchestratorEvent::TransactionPending { .. } => (
            Register,
            Severity::Info,
            "Authorizing voter on blockchain...".into(),
        ),
        OrchestratorEvent::RegistrationConfirmed { .. } => (
            Register,
            Severity::Success,
            "Voter authorized successfully".into(),
        ),
        OrchestratorEvent::RegistrationFailed { error, .. } => {
            (Register, Severity::Error, registration_message(error).into())
        }
        OrchestratorEvent::VoterRefreshFailed(_) => (
            Voters,
            Severity::Error,
            "Could not load the voter list.".into(),
        ),
        OrchestratorEvent::PhaseChanged { .. }
        | OrchestratorEvent::FormEdited(_)
        | OrchestratorEvent::UploadCleared
        | OrchestratorEvent::VotersRefreshed(_) => return None,
    };
    Some(described)
}

fn upload_message(error: &UploadError) -> &'static str {
    match error {
        UploadError::FileTooLarge { .. } => "Image exceeds the 5 MB limit.",
        UploadError::UnsupportedType { .. } => "Only image files can be uploaded.",
        UploadError::UploadFailed { .. } => "Image upload failed!",
    }
}

fn validation_message(error: &ValidationError) -> &'static str {
    match error {
        ValidationError::MissingField { .. } => "All fields are required.",
        ValidationError::InvalidAddressFormat => "Invalid wallet address format.",
        ValidationError::MissingImage => "Please upload a profile image.",
    }
}

fn registration_message(error: &RegistrationError) -> &'static str {
    match error {
        RegistrationError::Validation(inner) => validation_message(inner),
        RegistrationError::TransactionFailed { .. } => {
            "Transaction failed. Check wallet & try again."
        }
        RegistrationError::MalformedCollaboratorResponse { .. } => "Something went wrong.",
    }
}

#[cfg(test)]
#[path = "tests/notify_tests.rs"]
mod tests;
