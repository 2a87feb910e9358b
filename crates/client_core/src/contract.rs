//! Voter contract access through an HTTP relay that signs and submits
//! transactions on behalf of the connected organizer.

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use shared::{
    domain::{Route, ValidatedRegistration, VoterRecord},
    protocol::{CreateVoterRequest, TransactionReceipt, TransactionStatus, VoterListResponse},
};
use tracing::{info, warn};

use crate::{Navigator, PendingTransaction, VoterContract, WalletSession};

pub struct GatewayVoterContract {
    http: Client,
    gateway_url: String,
    wallet: Arc<dyn WalletSession>,
}

impl GatewayVoterContract {
    pub fn new(gateway_url: impl Into<String>, wallet: Arc<dyn WalletSession>) -> Self {
        Self::with_client(Client::new(), gateway_url, wallet)
    }

    pub fn with_client(
        http: Client,
        gateway_url: impl Into<String>,
        wallet: Arc<dyn WalletSession>,
    ) -> Self {
        Self {
            http,
            gateway_url: gateway_url.into().trim_end_matches('/').to_string(),
            wallet,
        }
    }
}

#[async_trait]
impl VoterContract for GatewayVoterContract {
    fn create_voter(
        &self,
        registration: &ValidatedRegistration,
        navigator: Arc<dyn Navigator>,
    ) -> Option<PendingTransaction> {
        let http = self.http.clone();
        let url = format!("{}/voters", self.gateway_url);
        let wallet = Arc::clone(&self.wallet);
        let registration = registration.clone();

        Some(PendingTransaction::new(async move {
            let organizer = wallet
                .current_account()
                .await
                .ok_or_else(|| anyhow!("wallet not connected; connect the organizer account first"))?;

            let request = CreateVoterRequest {
                organizer: organizer.to_string(),
                name: registration.name,
                address: registration.wallet_address.to_string(),
                position: registration.position,
                image: registration.content_uri,
            };
            let receipt: TransactionReceipt = http
                .post(&url)
                .json(&request)
                .send()
                .await
                .with_context(|| format!("failed to reach contract gateway at {url}"))?
                .error_for_status()?
                .json()
                .await
                .context("contract gateway returned an unreadable receipt")?;

            if receipt.status == TransactionStatus::Reverted {
                warn!(transaction_hash = %receipt.transaction_hash, "contract: transaction reverted");
                return Err(anyhow!(
                    "transaction {} reverted: {}",
                    receipt.transaction_hash,
                    receipt.reason.as_deref().unwrap_or("no reason given")
                ));
            }

            info!(transaction_hash = %receipt.transaction_hash, "contract: voter registered");
            navigator.navigate(Route::VoterList);
            Ok(receipt)
        }))
    }

    async fn voters(&self) -> Result<Vec<VoterRecord>> {
        let response: VoterListResponse = self
            .http
            .get(format!("{}/voters", self.gateway_url))
            .send()
            .await
            .with_context(|| format!("failed to reach contract gateway at {}", self.gateway_url))?
            .error_for_status()?
            .json()
            .await?;
        Ok(response.voters)
    }
}
