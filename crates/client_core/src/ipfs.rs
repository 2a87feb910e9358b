//! Pins images through an IPFS HTTP API node.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    Client,
};
use shared::{domain::ImageFile, protocol::IpfsAddResponse};
use tracing::debug;

use crate::{upload::resolve_mime_type, ContentStore};

pub struct IpfsHttpStore {
    http: Client,
    api_url: String,
    gateway_url: String,
}

impl IpfsHttpStore {
    pub fn new(api_url: impl Into<String>, gateway_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), api_url, gateway_url)
    }

    pub fn with_client(
        http: Client,
        api_url: impl Into<String>,
        gateway_url: impl Into<String>,
    ) -> Self {
        Self {
            http,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            gateway_url: gateway_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn gateway_uri(&self, cid: &str) -> String {
        format!("{}/ipfs/{cid}", self.gateway_url)
    }
}

#[async_trait]
impl ContentStore for IpfsHttpStore {
    async fn upload(&self, file: &ImageFile) -> Result<Option<String>> {
        let part = Part::bytes(file.bytes.clone())
            .file_name(file.file_name.clone())
            .mime_str(&resolve_mime_type(file))
            .context("invalid image mime type")?;
        let form = Form::new().part("file", part);

        let response: IpfsAddResponse = self
            .http
            .post(format!("{}/api/v0/add", self.api_url))
            .query(&[("pin", "true"), ("cid-version", "1")])
            .multipart(form)
            .send()
            .await
            .with_context(|| format!("failed to reach IPFS API at {}", self.api_url))?
            .error_for_status()?
            .json()
            .await
            .context("IPFS API returned an unreadable add response")?;

        let cid = response.hash.trim();
        if cid.is_empty() {
            debug!(file_name = %file.file_name, "ipfs: add response carried no hash");
            return Ok(None);
        }
        debug!(file_name = %file.file_name, %cid, size = %response.size, "ipfs: pinned");
        Ok(Some(self.gateway_uri(cid)))
    }
}
