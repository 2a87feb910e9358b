//! Collaborator doubles shared by the unit tests.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex as StdMutex,
    },
    time::Duration,
};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use shared::{
    domain::{ImageFile, Route, ValidatedRegistration, VoterId, VoterRecord},
    protocol::{TransactionReceipt, TransactionStatus},
};
use tokio::sync::{broadcast, broadcast::error::RecvError, oneshot, Mutex};

use crate::{
    events::{EventHub, OrchestratorEvent},
    notify::NotificationBridge,
    ContentStore, Navigator, PendingTransaction, VoterContract,
};

pub(crate) type StoreReply = Result<Option<String>>;
pub(crate) type ContractReply = Result<TransactionReceipt>;

pub(crate) fn hub() -> EventHub {
    EventHub::new(Arc::new(NotificationBridge::new()))
}

pub(crate) fn png(file_name: &str, size_bytes: usize) -> ImageFile {
    ImageFile::new(file_name, Some("image/png".to_string()), vec![0u8; size_bytes])
}

pub(crate) fn confirmed_receipt(hash: &str) -> TransactionReceipt {
    TransactionReceipt {
        transaction_hash: hash.to_string(),
        status: TransactionStatus::Confirmed,
        voter_id: Some(VoterId(1)),
        reason: None,
    }
}

pub(crate) async fn wait_for<F>(
    rx: &mut broadcast::Receiver<OrchestratorEvent>,
    predicate: F,
) -> OrchestratorEvent
where
    F: Fn(&OrchestratorEvent) -> bool,
{
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match rx.recv().await {
                Ok(event) if predicate(&event) => return event,
                Ok(_) | Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => panic!("event channel closed"),
            }
        }
    })
    .await
    .expect("timed out waiting for event")
}

/// Answers uploads immediately unless a gate was opened for the file name.
#[derive(Default)]
pub(crate) struct GatedStore {
    gates: Mutex<HashMap<String, oneshot::Receiver<StoreReply>>>,
    calls: Mutex<Vec<String>>,
}

impl GatedStore {
    pub(crate) async fn gate(&self, file_name: &str) -> oneshot::Sender<StoreReply> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().await.insert(file_name.to_string(), rx);
        tx
    }

    pub(crate) async fn calls(&self) -> Vec<String> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl ContentStore for GatedStore {
    async fn upload(&self, file: &ImageFile) -> Result<Option<String>> {
        self.calls.lock().await.push(file.file_name.clone());
        let gate = self.gates.lock().await.remove(&file.file_name);
        match gate {
            Some(rx) => rx.await.unwrap_or_else(|_| Err(anyhow!("gate dropped"))),
            None => Ok(Some(format!("ipfs://{}", file.file_name))),
        }
    }
}

pub(crate) enum ContractBehavior {
    Confirm,
    Fail(String),
    NoHandle,
    Gated(oneshot::Receiver<ContractReply>),
}

pub(crate) struct ScriptedContract {
    behavior: StdMutex<Option<ContractBehavior>>,
    calls: AtomicUsize,
    submitted: StdMutex<Vec<ValidatedRegistration>>,
    voters: Vec<VoterRecord>,
}

impl ScriptedContract {
    pub(crate) fn new(behavior: ContractBehavior) -> Self {
        Self {
            behavior: StdMutex::new(Some(behavior)),
            calls: AtomicUsize::new(0),
            submitted: StdMutex::new(Vec::new()),
            voters: vec![VoterRecord {
                voter_id: VoterId(7),
                name: "Bob".to_string(),
                address: format!("0x{}", "b".repeat(40)),
                image: Some("ipfs://bob".to_string()),
                voting_status: false,
            }],
        }
    }

    pub(crate) fn gated() -> (Self, oneshot::Sender<ContractReply>) {
        let (tx, rx) = oneshot::channel();
        (Self::new(ContractBehavior::Gated(rx)), tx)
    }

    pub(crate) fn set_behavior(&self, behavior: ContractBehavior) {
        *self.behavior.lock().expect("behavior lock") = Some(behavior);
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn submitted(&self) -> Vec<ValidatedRegistration> {
        self.submitted.lock().expect("submitted lock").clone()
    }
}

#[async_trait]
impl VoterContract for ScriptedContract {
    fn create_voter(
        &self,
        registration: &ValidatedRegistration,
        navigator: Arc<dyn Navigator>,
    ) -> Option<PendingTransaction> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.submitted
            .lock()
            .expect("submitted lock")
            .push(registration.clone());

        let behavior = self
            .behavior
            .lock()
            .expect("behavior lock")
            .take()
            .unwrap_or(ContractBehavior::Confirm);
        match behavior {
            ContractBehavior::Confirm => Some(PendingTransaction::new(async move {
                navigator.navigate(Route::VoterList);
                Ok(confirmed_receipt("0xconfirmed"))
            })),
            ContractBehavior::Fail(reason) => {
                Some(PendingTransaction::new(async move { Err(anyhow!(reason)) }))
            }
            ContractBehavior::NoHandle => None,
            ContractBehavior::Gated(rx) => Some(PendingTransaction::new(async move {
                rx.await.unwrap_or_else(|_| Err(anyhow!("gate dropped")))
            })),
        }
    }

    async fn voters(&self) -> Result<Vec<VoterRecord>> {
        Ok(self.voters.clone())
    }
}

#[derive(Default)]
pub(crate) struct RecordingNavigator {
    routes: StdMutex<Vec<Route>>,
}

impl RecordingNavigator {
    pub(crate) fn routes(&self) -> Vec<Route> {
        self.routes.lock().expect("routes lock").clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: Route) {
        self.routes.lock().expect("routes lock").push(route);
    }
}
