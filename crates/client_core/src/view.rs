//! Presentation helpers shared by front-ends. Nothing here touches the
//! workflow state; it only formats what the orchestrator exposes.

use shared::domain::{RegistrationForm, Route, VoterRecord};

pub const FALLBACK_IMAGE: &str = "/fallback.png";
pub const CANDIDATE_STRIP_LEN: usize = 4;
const PREVIEW_ADDRESS_CHARS: usize = 20;
const STRIP_ADDRESS_CHARS: usize = 10;
const NOT_AVAILABLE: &str = "N/A";

/// `0x1234...abcd` form used on cards and the account button. Short inputs
/// are not special-cased, so head and tail may overlap.
pub fn shorten_address(address: Option<&str>) -> String {
    match address.filter(|a| !a.is_empty()) {
        None => NOT_AVAILABLE.to_string(),
        Some(address) => {
            let chars: Vec<char> = address.chars().collect();
            let head: String = chars.iter().take(6).collect();
            let tail: String = chars[chars.len().saturating_sub(4)..].iter().collect();
            format!("{head}...{tail}")
        }
    }
}

fn truncate(value: &str, max_chars: usize) -> String {
    value.chars().take(max_chars).collect()
}

fn or_not_available(value: &str) -> String {
    if value.is_empty() {
        NOT_AVAILABLE.to_string()
    } else {
        value.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoterCard {
    pub title: String,
    pub image: String,
    pub wallet: String,
    pub status: &'static str,
    pub has_voted: bool,
}

impl VoterCard {
    pub fn from_record(record: &VoterRecord) -> Self {
        let name = if record.name.is_empty() {
            "Unnamed"
        } else {
            record.name.as_str()
        };
        Self {
            title: format!("{name} #{}", record.voter_id.0),
            image: record
                .image
                .clone()
                .filter(|image| !image.is_empty())
                .unwrap_or_else(|| FALLBACK_IMAGE.to_string()),
            wallet: shorten_address(Some(&record.address)),
            status: if record.voting_status {
                "Already Voted"
            } else {
                "Not Voted Yet"
            },
            has_voted: record.voting_status,
        }
    }
}

/// Left-hand preview shown once an image has been pinned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationPreview {
    pub image: String,
    pub name: String,
    pub address: String,
    pub position: String,
}

impl RegistrationPreview {
    pub fn new(form: &RegistrationForm, content_uri: &str) -> Self {
        Self {
            image: content_uri.to_string(),
            name: or_not_available(&form.name),
            address: or_not_available(&truncate(&form.wallet_address, PREVIEW_ADDRESS_CHARS)),
            position: or_not_available(&form.position),
        }
    }
}

/// Short list of existing voters shown beside an empty form.
pub fn candidate_strip(voters: &[VoterRecord]) -> Vec<String> {
    voters
        .iter()
        .take(CANDIDATE_STRIP_LEN)
        .map(|voter| {
            let address = if voter.address.is_empty() {
                NOT_AVAILABLE.to_string()
            } else {
                format!("{}...", truncate(&voter.address, STRIP_ADDRESS_CHARS))
            };
            format!("{} #{} Address: {address}", voter.name, voter.voter_id.0)
        })
        .collect()
}

/// Account dropdown. Opens and closes on the account button, closes on any
/// click outside it.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct NavMenu {
    open: bool,
}

impl NavMenu {
    pub fn toggle(&mut self) {
        self.open = !self.open;
    }

    pub fn outside_click(&mut self) {
        self.open = false;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn entries(&self) -> &'static [Route] {
        if self.open {
            &Route::ALL
        } else {
            &[]
        }
    }
}

#[cfg(test)]
#[path = "tests/view_tests.rs"]
mod tests;
