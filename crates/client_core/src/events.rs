//! Events published by the registration workflow, and the hub fanning them
//! out to the notification bridge and to view subscribers.

use std::sync::Arc;

use shared::{
    domain::{RegistrationForm, VoterRecord},
    error::{RegistrationError, UploadError, ValidationError},
    protocol::TransactionReceipt,
};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::{notify::NotificationBridge, orchestrator::RegistrationPhase};

const EVENT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
pub enum OrchestratorEvent {
    PhaseChanged {
        attempt_id: Option<Uuid>,
        phase: RegistrationPhase,
    },
    FormEdited(RegistrationForm),
    UploadStarted {
        generation: u64,
        file_name: String,
    },
    UploadReady {
        generation: u64,
        content_uri: String,
    },
    UploadRejected(UploadError),
    UploadFailed {
        generation: u64,
        error: UploadError,
    },
    UploadCleared,
    RegistrationRejected {
        attempt_id: Uuid,
        error: ValidationError,
    },
    TransactionPending {
        attempt_id: Uuid,
    },
    RegistrationConfirmed {
        attempt_id: Uuid,
        receipt: TransactionReceipt,
    },
    RegistrationFailed {
        attempt_id: Uuid,
        error: RegistrationError,
    },
    VotersRefreshed(Vec<VoterRecord>),
    VoterRefreshFailed(String),
}

#[derive(Clone)]
pub struct EventHub {
    events: broadcast::Sender<OrchestratorEvent>,
    notifications: Arc<NotificationBridge>,
}

impl EventHub {
    pub fn new(notifications: Arc<NotificationBridge>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            events,
            notifications,
        }
    }

    /// Notifies first so a subscriber reacting to the event already sees the
    /// matching message as active.
    pub async fn publish(&self, event: OrchestratorEvent) {
        self.notifications.notify(&event).await;
        let _ = self.events.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<OrchestratorEvent> {
        self.events.subscribe()
    }

    pub fn notifications(&self) -> &Arc<NotificationBridge> {
        &self.notifications
    }
}
