use std::{collections::HashMap, fs, path::Path};

use anyhow::{bail, Context};
use url::Url;

pub const DEFAULT_CONFIG_PATH: &str = "registrar.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub ipfs_api_url: String,
    pub ipfs_gateway_url: String,
    pub contract_gateway_url: String,
    pub organizer_account: Option<String>,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ipfs_api_url: "http://127.0.0.1:5001".into(),
            ipfs_gateway_url: "https://ipfs.io".into(),
            contract_gateway_url: "http://127.0.0.1:8787".into(),
            organizer_account: None,
            log_filter: "info".into(),
        }
    }
}

pub fn load_settings(path: &Path) -> Settings {
    load_settings_with(path, |key| std::env::var(key).ok())
}

/// File values first, then `REGISTRAR__*` variables from `lookup`.
pub fn load_settings_with<F>(path: &Path, lookup: F) -> Settings
where
    F: Fn(&str) -> Option<String>,
{
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        match toml::from_str::<HashMap<String, String>>(&raw) {
            Ok(file_cfg) => apply_values(&mut settings, |key| file_cfg.get(key).cloned()),
            Err(err) => {
                tracing::warn!(path = %path.display(), %err, "ignoring unreadable config file")
            }
        }
    }

    apply_values(&mut settings, |key| {
        lookup(&format!("REGISTRAR__{}", key.to_ascii_uppercase()))
    });

    settings
}

fn apply_values<F>(settings: &mut Settings, value: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = value("ipfs_api_url") {
        settings.ipfs_api_url = v;
    }
    if let Some(v) = value("ipfs_gateway_url") {
        settings.ipfs_gateway_url = v;
    }
    if let Some(v) = value("contract_gateway_url") {
        settings.contract_gateway_url = v;
    }
    if let Some(v) = value("organizer_account") {
        let v = v.trim().to_string();
        settings.organizer_account = (!v.is_empty()).then_some(v);
    }
    if let Some(v) = value("log_filter") {
        settings.log_filter = v;
    }
}

pub fn validate_settings(settings: &Settings) -> anyhow::Result<()> {
    for (name, raw) in [
        ("ipfs_api_url", &settings.ipfs_api_url),
        ("ipfs_gateway_url", &settings.ipfs_gateway_url),
        ("contract_gateway_url", &settings.contract_gateway_url),
    ] {
        let url = Url::parse(raw).with_context(|| format!("{name} is not a valid URL: '{raw}'"))?;
        if !matches!(url.scheme(), "http" | "https") {
            bail!("{name} must use http or https, got '{}'", url.scheme());
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
