use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

pub const WALLET_ADDRESS_PREFIX: &str = "0x";
pub const WALLET_ADDRESS_HEX_LEN: usize = 40;
pub const WALLET_ADDRESS_LEN: usize = WALLET_ADDRESS_PREFIX.len() + WALLET_ADDRESS_HEX_LEN;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub u64);
    };
}

id_newtype!(VoterId);

/// A 20-byte account address, hex encoded behind a `0x` marker.
///
/// Hex digits are accepted in either case and the original casing is kept so
/// checksummed addresses round-trip unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WalletAddress(String);

impl WalletAddress {
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        if is_wallet_address(raw) {
            Ok(Self(raw.to_string()))
        } else {
            Err(ValidationError::InvalidAddressFormat)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

pub fn is_wallet_address(raw: &str) -> bool {
    raw.len() == WALLET_ADDRESS_LEN
        && raw.starts_with(WALLET_ADDRESS_PREFIX)
        && raw[WALLET_ADDRESS_PREFIX.len()..]
            .bytes()
            .all(|b| b.is_ascii_hexdigit())
}

impl FromStr for WalletAddress {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for WalletAddress {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<WalletAddress> for String {
    fn from(value: WalletAddress) -> Self {
        value.0
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormField {
    Name,
    WalletAddress,
    Position,
}

impl FormField {
    pub fn label(self) -> &'static str {
        match self {
            FormField::Name => "voter name",
            FormField::WalletAddress => "wallet address",
            FormField::Position => "position",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationForm {
    pub name: String,
    pub wallet_address: String,
    pub position: String,
}

impl RegistrationForm {
    pub fn new(
        name: impl Into<String>,
        wallet_address: impl Into<String>,
        position: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            wallet_address: wallet_address.into(),
            position: position.into(),
        }
    }

    pub fn field(&self, field: FormField) -> &str {
        match field {
            FormField::Name => &self.name,
            FormField::WalletAddress => &self.wallet_address,
            FormField::Position => &self.position,
        }
    }

    pub fn set(&mut self, field: FormField, value: impl Into<String>) {
        let slot = match field {
            FormField::Name => &mut self.name,
            FormField::WalletAddress => &mut self.wallet_address,
            FormField::Position => &mut self.position,
        };
        *slot = value.into();
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_empty() && self.wallet_address.is_empty() && self.position.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_uri: Option<String>,
}

impl UploadResult {
    pub fn absent() -> Self {
        Self::default()
    }

    pub fn present(content_uri: impl Into<String>) -> Self {
        Self {
            content_uri: Some(content_uri.into()),
        }
    }
}

/// A form that passed every client-side check, paired with its pinned image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatedRegistration {
    pub name: String,
    pub wallet_address: WalletAddress,
    pub position: String,
    pub content_uri: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub file_name: String,
    pub mime_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl ImageFile {
    pub fn new(file_name: impl Into<String>, mime_type: Option<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type,
            bytes,
        }
    }

    pub fn size_bytes(&self) -> usize {
        self.bytes.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterRecord {
    pub voter_id: VoterId,
    pub name: String,
    pub address: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub voting_status: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    Home,
    CandidateRegistration,
    AllowedVoters,
    VoterList,
}

impl Route {
    pub const ALL: [Route; 4] = [
        Route::Home,
        Route::CandidateRegistration,
        Route::AllowedVoters,
        Route::VoterList,
    ];

    pub fn path(self) -> &'static str {
        match self {
            Route::Home => "/",
            Route::CandidateRegistration => "/candidate-registration",
            Route::AllowedVoters => "/allowed-voters",
            Route::VoterList => "/voter-list",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Route::Home => "Home",
            Route::CandidateRegistration => "Candidate Registration",
            Route::AllowedVoters => "Voter Registration",
            Route::VoterList => "Voter List",
        }
    }
}

#[cfg(test)]
#[path = "tests/domain_tests.rs"]
mod tests;
