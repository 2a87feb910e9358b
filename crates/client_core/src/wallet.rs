use anyhow::{anyhow, Result};
use async_trait::async_trait;
use shared::domain::WalletAddress;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::WalletSession;

#[derive(Default)]
struct WalletState {
    account: Option<WalletAddress>,
    error: Option<String>,
}

/// Organizer session backed by an account named in configuration.
pub struct ConfiguredWallet {
    configured_account: Option<String>,
    state: Mutex<WalletState>,
}

impl ConfiguredWallet {
    pub fn new(configured_account: Option<String>) -> Self {
        Self {
            configured_account,
            state: Mutex::new(WalletState::default()),
        }
    }
}

#[async_trait]
impl WalletSession for ConfiguredWallet {
    async fn connect(&self) -> Result<WalletAddress> {
        let parsed = match self.configured_account.as_deref().map(str::trim) {
            None | Some("") => Err("no organizer account configured".to_string()),
            Some(raw) => WalletAddress::parse(raw)
                .map_err(|_| format!("configured organizer account {raw:?} is not a wallet address")),
        };

        let mut state = self.state.lock().await;
        match parsed {
            Ok(account) => {
                info!(account = %account, "wallet: connected");
                state.account = Some(account.clone());
                state.error = None;
                Ok(account)
            }
            Err(message) => {
                warn!(%message, "wallet: connect failed");
                state.account = None;
                state.error = Some(message.clone());
                Err(anyhow!(message))
            }
        }
    }

    async fn disconnect(&self) {
        let mut state = self.state.lock().await;
        if let Some(account) = state.account.take() {
            info!(account = %account, "wallet: disconnected");
        }
    }

    async fn current_account(&self) -> Option<WalletAddress> {
        self.state.lock().await.account.clone()
    }

    async fn error(&self) -> Option<String> {
        self.state.lock().await.error.clone()
    }
}

#[cfg(test)]
#[path = "tests/wallet_tests.rs"]
mod tests;
