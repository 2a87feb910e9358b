//! Profile image upload with newest-drop-wins semantics.

use std::sync::Arc;

use shared::{
    domain::{ImageFile, UploadResult},
    error::UploadError,
};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::{
    events::{EventHub, OrchestratorEvent},
    ContentStore,
};

pub const MAX_IMAGE_BYTES: usize = 5_000_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadStatus {
    Idle,
    Pending { generation: u64, file_name: String },
    Ready { generation: u64, content_uri: String },
    Failed { generation: u64, error: UploadError },
}

impl UploadStatus {
    pub fn content_uri(&self) -> Option<&str> {
        match self {
            UploadStatus::Ready { content_uri, .. } => Some(content_uri),
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, UploadStatus::Pending { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    Ready(String),
    Rejected(UploadError),
    Failed(UploadError),
    /// A newer drop (or a reset) took over before this one settled.
    Superseded,
}

struct UploadSlot {
    generation: u64,
    status: UploadStatus,
}

pub struct UploadCoordinator {
    store: Arc<dyn ContentStore>,
    hub: EventHub,
    slot: Mutex<UploadSlot>,
}

impl UploadCoordinator {
    pub fn new(store: Arc<dyn ContentStore>, hub: EventHub) -> Self {
        Self {
            store,
            hub,
            slot: Mutex::new(UploadSlot {
                generation: 0,
                status: UploadStatus::Idle,
            }),
        }
    }

    pub async fn status(&self) -> UploadStatus {
        self.slot.lock().await.status.clone()
    }

    pub async fn current(&self) -> UploadResult {
        UploadResult {
            content_uri: self
                .slot
                .lock()
                .await
                .status
                .content_uri()
                .map(str::to_string),
        }
    }

    pub async fn upload(&self, file: ImageFile) -> UploadOutcome {
        if let Err(error) = check_image(&file) {
            warn!(file_name = %file.file_name, %error, "upload: drop rejected before transfer");
            self.hub
                .publish(OrchestratorEvent::UploadRejected(error.clone()))
                .await;
            return UploadOutcome::Rejected(error);
        }

        let generation = {
            let mut slot = self.slot.lock().await;
            slot.generation += 1;
            slot.status = UploadStatus::Pending {
                generation: slot.generation,
                file_name: file.file_name.clone(),
            };
            slot.generation
        };
        info!(generation, file_name = %file.file_name, size_bytes = file.size_bytes(), "upload: started");
        self.hub
            .publish(OrchestratorEvent::UploadStarted {
                generation,
                file_name: file.file_name.clone(),
            })
            .await;

        let settled = match self.store.upload(&file).await {
            Ok(Some(uri)) if !uri.trim().is_empty() => Ok(uri),
            Ok(_) => Err(UploadError::UploadFailed {
                reason: "content store returned an empty response".to_string(),
            }),
            Err(err) => Err(UploadError::UploadFailed {
                reason: format!("{err:#}"),
            }),
        };

        let event = {
            let mut slot = self.slot.lock().await;
            if slot.generation != generation {
                debug!(
                    generation,
                    current = slot.generation,
                    "upload: discarding superseded result"
                );
                return UploadOutcome::Superseded;
            }

            match &settled {
                Ok(content_uri) => {
                    slot.status = UploadStatus::Ready {
                        generation,
                        content_uri: content_uri.clone(),
                    };
                    OrchestratorEvent::UploadReady {
                        generation,
                        content_uri: content_uri.clone(),
                    }
                }
                Err(error) => {
                    slot.status = UploadStatus::Failed {
                        generation,
                        error: error.clone(),
                    };
                    OrchestratorEvent::UploadFailed {
                        generation,
                        error: error.clone(),
                    }
                }
            }
        };

        match &settled {
            Ok(content_uri) => info!(generation, %content_uri, "upload: pinned"),
            Err(error) => warn!(generation, %error, "upload: failed"),
        }
        self.hub.publish(event).await;

        match settled {
            Ok(content_uri) => UploadOutcome::Ready(content_uri),
            Err(error) => UploadOutcome::Failed(error),
        }
    }

    /// Back to no image; any transfer still in flight is discarded when it lands.
    pub async fn reset(&self) {
        {
            let mut slot = self.slot.lock().await;
            slot.generation += 1;
            slot.status = UploadStatus::Idle;
        }
        self.hub.publish(OrchestratorEvent::UploadCleared).await;
    }
}

pub fn check_image(file: &ImageFile) -> Result<(), UploadError> {
    if file.size_bytes() > MAX_IMAGE_BYTES {
        return Err(UploadError::FileTooLarge {
            size_bytes: file.size_bytes(),
            limit_bytes: MAX_IMAGE_BYTES,
        });
    }

    let mime_type = resolve_mime_type(file);
    if !mime_type.starts_with("image/") {
        return Err(UploadError::UnsupportedType { mime_type });
    }
    Ok(())
}

/// Declared type when present, otherwise a guess from the file extension.
pub fn resolve_mime_type(file: &ImageFile) -> String {
    file.mime_type
        .as_deref()
        .map(str::trim)
        .filter(|mime| !mime.is_empty())
        .map(str::to_ascii_lowercase)
        .unwrap_or_else(|| {
            mime_guess::from_path(&file.file_name)
                .first_raw()
                .unwrap_or("application/octet-stream")
                .to_string()
        })
}

#[cfg(test)]
#[path = "tests/upload_tests.rs"]
mod tests;
