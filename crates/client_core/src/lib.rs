use std::{
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context as TaskContext, Poll},
};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use futures::future::BoxFuture;
use shared::{
    domain::{ImageFile, Route, ValidatedRegistration, VoterRecord, WalletAddress},
    protocol::TransactionReceipt,
};

pub mod contract;
pub mod events;
pub mod ipfs;
pub mod notify;
pub mod orchestrator;
pub mod upload;
pub mod validation;
pub mod view;
pub mod wallet;

pub use contract::GatewayVoterContract;
pub use events::{EventHub, OrchestratorEvent};
pub use ipfs::IpfsHttpStore;
pub use notify::{Notification, NotificationBridge, NotificationKey, Severity};
pub use orchestrator::{
    OrchestratorSnapshot, RegistrationIntent, RegistrationOrchestrator, RegistrationPhase,
    SubmitOutcome,
};
pub use upload::{UploadCoordinator, UploadOutcome, UploadStatus, MAX_IMAGE_BYTES};
pub use validation::validate;
pub use wallet::ConfiguredWallet;

/// Account provider for the organizer submitting registrations.
#[async_trait]
pub trait WalletSession: Send + Sync {
    async fn connect(&self) -> Result<WalletAddress>;
    async fn disconnect(&self);
    async fn current_account(&self) -> Option<WalletAddress>;
    async fn error(&self) -> Option<String>;
}

pub struct MissingWalletSession;

#[async_trait]
impl WalletSession for MissingWalletSession {
    async fn connect(&self) -> Result<WalletAddress> {
        Err(anyhow!("no wallet provider is available"))
    }

    async fn disconnect(&self) {}

    async fn current_account(&self) -> Option<WalletAddress> {
        None
    }

    async fn error(&self) -> Option<String> {
        Some("no wallet provider is available".to_string())
    }
}

/// Content-addressed storage. `Ok(None)` is an empty answer from the store.
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn upload(&self, file: &ImageFile) -> Result<Option<String>>;
}

pub struct MissingContentStore;

#[async_trait]
impl ContentStore for MissingContentStore {
    async fn upload(&self, file: &ImageFile) -> Result<Option<String>> {
        Err(anyhow!(
            "content store unavailable for {}",
            file.file_name
        ))
    }
}

pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route);
}

pub struct NoopNavigator;

impl Navigator for NoopNavigator {
    fn navigate(&self, _route: Route) {}
}

/// Settles once the network confirms or rejects a submitted transaction.
pub struct PendingTransaction(BoxFuture<'static, Result<TransactionReceipt>>);

impl PendingTransaction {
    pub fn new<F>(settlement: F) -> Self
    where
        F: Future<Output = Result<TransactionReceipt>> + Send + 'static,
    {
        Self(Box::pin(settlement))
    }
}

impl Future for PendingTransaction {
    type Output = Result<TransactionReceipt>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<Self::Output> {
        self.0.as_mut().poll(cx)
    }
}

#[async_trait]
pub trait VoterContract: Send + Sync {
    /// Starts the registration write. `None` means the client could not
    /// produce a settlement handle at all.
    fn create_voter(
        &self,
        registration: &ValidatedRegistration,
        navigator: Arc<dyn Navigator>,
    ) -> Option<PendingTransaction>;

    async fn voters(&self) -> Result<Vec<VoterRecord>>;
}

pub struct MissingVoterContract;

#[async_trait]
impl VoterContract for MissingVoterContract {
    fn create_voter(
        &self,
        _registration: &ValidatedRegistration,
        _navigator: Arc<dyn Navigator>,
    ) -> Option<PendingTransaction> {
        Some(PendingTransaction::new(async {
            Err(anyhow!("voter contract is unavailable"))
        }))
    }

    async fn voters(&self) -> Result<Vec<VoterRecord>> {
        Err(anyhow!("voter contract is unavailable"))
    }
}

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
