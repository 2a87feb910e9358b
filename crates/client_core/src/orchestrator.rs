//! Registration workflow: validation, transaction submission and settlement.
//!
//! The orchestrator is driven by [`RegistrationIntent`] messages. At most one
//! registration attempt is in flight; submits that arrive while an attempt is
//! running are ignored. Form and image are reset only after the network
//! confirms the transaction.

use std::sync::Arc;

use serde::Serialize;
use shared::{
    domain::{FormField, ImageFile, RegistrationForm, VoterRecord},
    error::{RegistrationError, ValidationError},
    protocol::{TransactionReceipt, TransactionStatus},
};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::{
    events::{EventHub, OrchestratorEvent},
    notify::NotificationBridge,
    upload::{UploadCoordinator, UploadOutcome, UploadStatus},
    validation::validate,
    ContentStore, Navigator, VoterContract,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationPhase {
    Idle,
    Validating,
    Rejected,
    AwaitingTransaction,
    Settling,
    Failed,
}

impl RegistrationPhase {
    pub fn is_busy(self) -> bool {
        matches!(
            self,
            RegistrationPhase::Validating
                | RegistrationPhase::AwaitingTransaction
                | RegistrationPhase::Settling
        )
    }
}

#[derive(Debug, Clone)]
pub enum RegistrationIntent {
    EditName(String),
    EditWalletAddress(String),
    EditPosition(String),
    DropFile(ImageFile),
    Submit,
    RefreshVoters,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Another attempt is still running.
    Ignored,
    Rejected(ValidationError),
    Registered(TransactionReceipt),
    Failed(RegistrationError),
}

/// What [`RegistrationOrchestrator::dispatch`] did with an intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntentOutcome {
    FormUpdated,
    Upload(UploadOutcome),
    Submit(SubmitOutcome),
    VotersRefreshed(usize),
    VoterRefreshFailed(String),
}

#[derive(Debug, Clone)]
pub struct OrchestratorSnapshot {
    pub phase: RegistrationPhase,
    pub form: RegistrationForm,
    pub upload: UploadStatus,
    pub voters: Vec<VoterRecord>,
    pub busy: bool,
}

struct OrchestratorState {
    phase: RegistrationPhase,
    form: RegistrationForm,
    voters: Vec<VoterRecord>,
}

pub struct RegistrationOrchestrator {
    contract: Arc<dyn VoterContract>,
    navigator: Arc<dyn Navigator>,
    uploads: UploadCoordinator,
    hub: EventHub,
    inner: Mutex<OrchestratorState>,
}

impl RegistrationOrchestrator {
    pub fn new(
        store: Arc<dyn ContentStore>,
        contract: Arc<dyn VoterContract>,
        navigator: Arc<dyn Navigator>,
    ) -> Arc<Self> {
        Self::new_with_notifications(
            store,
            contract,
            navigator,
            Arc::new(NotificationBridge::new()),
        )
    }

    pub fn new_with_notifications(
        store: Arc<dyn ContentStore>,
        contract: Arc<dyn VoterContract>,
        navigator: Arc<dyn Navigator>,
        notifications: Arc<NotificationBridge>,
    ) -> Arc<Self> {
        let hub = EventHub::new(notifications);
        Arc::new(Self {
            contract,
            navigator,
            uploads: UploadCoordinator::new(store, hub.clone()),
            hub,
            inner: Mutex::new(OrchestratorState {
                phase: RegistrationPhase::Idle,
                form: RegistrationForm::default(),
                voters: Vec::new(),
            }),
        })
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<OrchestratorEvent> {
        self.hub.subscribe()
    }

    pub fn notifications(&self) -> &Arc<NotificationBridge> {
        self.hub.notifications()
    }

    pub async fn snapshot(&self) -> OrchestratorSnapshot {
        let upload = self.uploads.status().await;
        let guard = self.inner.lock().await;
        OrchestratorSnapshot {
            phase: guard.phase,
            form: guard.form.clone(),
            upload,
            voters: guard.voters.clone(),
            busy: guard.phase.is_busy(),
        }
    }

    pub async fn dispatch(self: &Arc<Self>, intent: RegistrationIntent) -> IntentOutcome {
        match intent {
            RegistrationIntent::EditName(value) => self.edit(FormField::Name, value).await,
            RegistrationIntent::EditWalletAddress(value) => {
                self.edit(FormField::WalletAddress, value).await
            }
            RegistrationIntent::EditPosition(value) => {
                self.edit(FormField::Position, value).await
            }
            RegistrationIntent::DropFile(file) => {
                IntentOutcome::Upload(self.uploads.upload(file).await)
            }
            RegistrationIntent::Submit => IntentOutcome::Submit(self.submit().await),
            RegistrationIntent::RefreshVoters => match self.refresh_voters().await {
                Ok(count) => IntentOutcome::VotersRefreshed(count),
                Err(reason) => IntentOutcome::VoterRefreshFailed(reason),
            },
        }
    }

    async fn edit(&self, field: FormField, value: String) -> IntentOutcome {
        let form = {
            let mut guard = self.inner.lock().await;
            guard.form.set(field, value);
            guard.form.clone()
        };
        self.hub.publish(OrchestratorEvent::FormEdited(form)).await;
        IntentOutcome::FormUpdated
    }

    /// Runs one registration attempt. The attempt lives on its own task, so
    /// dropping the returned future does not strand the phase outside `Idle`.
    pub async fn submit(self: &Arc<Self>) -> SubmitOutcome {
        let attempt_id = Uuid::new_v4();
        let form = {
            let mut guard = self.inner.lock().await;
            if guard.phase != RegistrationPhase::Idle {
                debug!(%attempt_id, phase = ?guard.phase, "register: submit ignored, attempt in flight");
                return SubmitOutcome::Ignored;
            }
            guard.phase = RegistrationPhase::Validating;
            guard.form.clone()
        };

        let this = Arc::clone(self);
        let attempt = tokio::spawn(async move { this.run_attempt(attempt_id, form).await });
        match attempt.await {
            Ok(outcome) => outcome,
            Err(err) => {
                error!(%attempt_id, %err, "register: attempt task aborted");
                self.enter_phase(attempt_id, RegistrationPhase::Idle).await;
                SubmitOutcome::Failed(RegistrationError::MalformedCollaboratorResponse {
                    detail: format!("registration attempt aborted: {err}"),
                })
            }
        }
    }

    async fn run_attempt(&self, attempt_id: Uuid, form: RegistrationForm) -> SubmitOutcome {
        self.announce_phase(attempt_id, RegistrationPhase::Validating)
            .await;

        match self.register(attempt_id, &form).await {
            Ok(receipt) => {
                self.enter_phase(attempt_id, RegistrationPhase::Settling)
                    .await;
                {
                    let mut guard = self.inner.lock().await;
                    guard.form = RegistrationForm::default();
                }
                self.uploads.reset().await;
                self.hub
                    .publish(OrchestratorEvent::FormEdited(RegistrationForm::default()))
                    .await;
                info!(%attempt_id, transaction_hash = %receipt.transaction_hash, "register: confirmed");
                self.hub
                    .publish(OrchestratorEvent::RegistrationConfirmed {
                        attempt_id,
                        receipt: receipt.clone(),
                    })
                    .await;
                self.enter_phase(attempt_id, RegistrationPhase::Idle).await;
                SubmitOutcome::Registered(receipt)
            }
            Err(RegistrationError::Validation(error)) => {
                info!(%attempt_id, %error, "register: rejected by validation");
                self.enter_phase(attempt_id, RegistrationPhase::Rejected)
                    .await;
                self.hub
                    .publish(OrchestratorEvent::RegistrationRejected {
                        attempt_id,
                        error: error.clone(),
                    })
                    .await;
                self.enter_phase(attempt_id, RegistrationPhase::Idle).await;
                SubmitOutcome::Rejected(error)
            }
            Err(error) => {
                if error.is_user_recoverable() {
                    warn!(%attempt_id, %error, "register: transaction failed");
                } else {
                    error!(%attempt_id, %error, "register: contract client violated its contract");
                }
                self.enter_phase(attempt_id, RegistrationPhase::Failed)
                    .await;
                self.hub
                    .publish(OrchestratorEvent::RegistrationFailed {
                        attempt_id,
                        error: error.clone(),
                    })
                    .await;
                self.enter_phase(attempt_id, RegistrationPhase::Idle).await;
                SubmitOutcome::Failed(error)
            }
        }
    }

    /// Validates the snapshot, submits it and waits for settlement.
    async fn register(
        &self,
        attempt_id: Uuid,
        form: &RegistrationForm,
    ) -> Result<TransactionReceipt, RegistrationError> {
        let upload = self.uploads.current().await;
        let registration = validate(form, &upload)?;

        self.enter_phase(attempt_id, RegistrationPhase::AwaitingTransaction)
            .await;
        info!(
            %attempt_id,
            wallet_address = %registration.wallet_address,
            content_uri = %registration.content_uri,
            "register: submitting transaction"
        );
        let pending = self
            .contract
            .create_voter(&registration, Arc::clone(&self.navigator));
        self.hub
            .publish(OrchestratorEvent::TransactionPending { attempt_id })
            .await;

        match pending {
            Some(pending) => settle(pending.await),
            None => Err(RegistrationError::MalformedCollaboratorResponse {
                detail: "contract client returned no settlement handle".to_string(),
            }),
        }
    }

    /// Reloads the read-only voter list from the contract.
    pub async fn refresh_voters(&self) -> Result<usize, String> {
        match self.contract.voters().await {
            Ok(voters) => {
                let count = voters.len();
                self.inner.lock().await.voters = voters.clone();
                self.hub
                    .publish(OrchestratorEvent::VotersRefreshed(voters))
                    .await;
                Ok(count)
            }
            Err(err) => {
                let reason = format!("{err:#}");
                warn!(%reason, "voters: refresh failed");
                self.hub
                    .publish(OrchestratorEvent::VoterRefreshFailed(reason.clone()))
                    .await;
                Err(reason)
            }
        }
    }

    async fn enter_phase(&self, attempt_id: Uuid, phase: RegistrationPhase) {
        self.inner.lock().await.phase = phase;
        self.announce_phase(attempt_id, phase).await;
    }

    async fn announce_phase(&self, attempt_id: Uuid, phase: RegistrationPhase) {
        debug!(%attempt_id, ?phase, "register: phase changed");
        self.hub
            .publish(OrchestratorEvent::PhaseChanged {
                attempt_id: Some(attempt_id),
                phase,
            })
            .await;
    }
}

fn settle(result: anyhow::Result<TransactionReceipt>) -> Result<TransactionReceipt, RegistrationError> {
    let receipt = result.map_err(|err| RegistrationError::TransactionFailed {
        reason: format!("{err:#}"),
    })?;

    if receipt.transaction_hash.trim().is_empty() {
        return Err(RegistrationError::MalformedCollaboratorResponse {
            detail: "settled receipt carries no transaction hash".to_string(),
        });
    }

    match receipt.status {
        TransactionStatus::Confirmed => Ok(receipt),
        TransactionStatus::Reverted => Err(RegistrationError::TransactionFailed {
            reason: receipt
                .reason
                .unwrap_or_else(|| "transaction reverted".to_string()),
        }),
    }
}

#[cfg(test)]
#[path = "tests/orchestrator_tests.rs"]
mod tests;
