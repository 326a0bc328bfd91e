//! File attachments carried by messages.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{ColloquyError, Result};
use crate::files::{FileStore, StoredFile};

/// Where an attachment's bytes currently live. Inline bytes and a stored
/// reference are mutually exclusive.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AttachmentData {
    Inline {
        #[serde(with = "base64_bytes")]
        bytes: Vec<u8>,
    },
    Stored(StoredFile),
}

/// Processing state. Moves forward only: pending to stored or failed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AttachmentStatus {
    #[default]
    Pending,
    Stored,
    Failed { error: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Attachment {
    filename: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    mime_type: Option<String>,
    data: AttachmentData,
    #[serde(default)]
    status: AttachmentStatus,
    /// Extracted content (overview, text, error) supplied by an external processor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    processed_content: Option<serde_json::Value>,
}

impl Attachment {
    /// Pending attachment holding raw bytes.
    pub fn from_bytes(filename: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        let filename = filename.into();
        let bytes = bytes.into();
        Self {
            mime_type: mime_from_name(&filename).or_else(|| mime_from_content(&bytes)),
            filename,
            data: AttachmentData::Inline { bytes },
            status: AttachmentStatus::Pending,
            processed_content: None,
        }
    }

    /// Pending attachment from base64 text. A `data:` URL prefix is accepted.
    pub fn from_base64(filename: impl Into<String>, encoded: &str) -> Result<Self> {
        let payload = match encoded.split_once(";base64,") {
            Some((prefix, rest)) if prefix.starts_with("data:") => rest,
            _ => encoded,
        };
        let bytes = STANDARD
            .decode(payload.trim())
            .map_err(|e| ColloquyError::validation(format!("invalid base64 attachment: {e}")))?;
        Ok(Self::from_bytes(filename, bytes))
    }

    /// Attachment that already lives in a file store.
    pub fn stored(filename: impl Into<String>, file: StoredFile) -> Self {
        let filename = filename.into();
        Self {
            mime_type: mime_from_name(&filename),
            filename,
            data: AttachmentData::Stored(file),
            status: AttachmentStatus::Stored,
            processed_content: None,
        }
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    pub fn with_processed_content(mut self, content: serde_json::Value) -> Self {
        self.processed_content = Some(content);
        self
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn mime_type(&self) -> Option<&str> {
        self.mime_type.as_deref()
    }

    pub fn data(&self) -> &AttachmentData {
        &self.data
    }

    pub fn status(&self) -> &AttachmentStatus {
        &self.status
    }

    pub fn processed_content(&self) -> Option<&serde_json::Value> {
        self.processed_content.as_ref()
    }

    pub fn stored_file(&self) -> Option<&StoredFile> {
        match &self.data {
            AttachmentData::Stored(file) => Some(file),
            AttachmentData::Inline { .. } => None,
        }
    }

    pub fn is_image(&self) -> bool {
        self.mime_type
            .as_deref()
            .is_some_and(|m| m.starts_with("image/"))
    }

    /// Push inline bytes into `store`.
    ///
    /// Only a pending attachment is touched. On success the inline bytes are
    /// dropped in favour of the stored reference; on failure the bytes are
    /// kept and the status records the error.
    pub async fn ensure_stored(&mut self, store: &dyn FileStore) -> &AttachmentStatus {
        if self.status != AttachmentStatus::Pending {
            return &self.status;
        }
        let bytes = match &self.data {
            AttachmentData::Inline { bytes } => bytes,
            AttachmentData::Stored(_) => {
                self.status = AttachmentStatus::Stored;
                return &self.status;
            }
        };

        match store
            .save(bytes, &self.filename, self.mime_type.as_deref())
            .await
        {
            Ok(file) => {
                debug!(filename = %self.filename, file_id = %file.file_id, "attachment stored");
                self.data = AttachmentData::Stored(file);
                self.status = AttachmentStatus::Stored;
            }
            Err(e) => {
                warn!(filename = %self.filename, error = %e, "failed to store attachment");
                self.status = AttachmentStatus::Failed {
                    error: e.to_string(),
                };
            }
        }
        &self.status
    }
}

fn mime_from_name(filename: &str) -> Option<String> {
    mime_guess::from_path(filename)
        .first()
        .map(|mime| mime.essence_str().to_string())
}

/// Magic-number detection for bytes whose name has no known extension.
fn mime_from_content(bytes: &[u8]) -> Option<String> {
    infer::get(bytes).map(|kind| kind.mime_type().to_string())
}

mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}
