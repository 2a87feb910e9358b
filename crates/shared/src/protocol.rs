//! Wire payloads exchanged with the storage API and the contract gateway.

use serde::{Deserialize, Serialize};

use crate::domain::{VoterId, VoterRecord};

/// Response of the IPFS HTTP API `add` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpfsAddResponse {
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "Hash", default)]
    pub hash: String,
    #[serde(rename = "Size", default)]
    pub size: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateVoterRequest {
    pub organizer: String,
    pub name: String,
    pub address: String,
    pub position: String,
    pub image: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Confirmed,
    Reverted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionReceipt {
    pub transaction_hash: String,
    pub status: TransactionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voter_id: Option<VoterId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoterListResponse {
    pub voters: Vec<VoterRecord>,
}
