use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

pub const PDF_MEDIA_TYPE: &str = "application/pdf";

/// Reference document (promotion memo) handed to the reasoning service.
///
/// `name` is the identity; `base64` carries the full content as a
/// self-describing data URI (`data:<media-type>;base64,<payload>`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub name: String,
    pub base64: String,
    pub mime_type: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_system: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl Document {
    pub fn from_bytes(name: impl Into<String>, mime_type: impl Into<String>, bytes: &[u8]) -> Self {
        let mime_type = mime_type.into();
        let base64 = encode_data_uri(&mime_type, bytes);
        Self { name: name.into(), base64, mime_type, is_system: false }
    }

    pub fn into_system(mut self) -> Self {
        self.is_system = true;
        self
    }

    /// Raw base64 payload with the data URI prefix stripped.
    pub fn payload(&self) -> Result<&str, DomainError> {
        split_data_uri(&self.base64).map(|(_, payload)| payload)
    }

    pub fn decode_content(&self) -> Result<Vec<u8>, DomainError> {
        let payload = self.payload()?;
        BASE64
            .decode(payload)
            .map_err(|error| DomainError::MalformedDataUri(format!("{}: {error}", self.name)))
    }
}

/// Binary file picked by the operator, not yet staged.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadedFile {
    pub name: String,
    pub media_type: String,
    pub bytes: Vec<u8>,
}

pub fn encode_data_uri(media_type: &str, bytes: &[u8]) -> String {
    format!("data:{media_type};base64,{}", BASE64.encode(bytes))
}

/// Splits a data URI into its prefix (`data:<media-type>;base64`) and payload.
pub fn split_data_uri(uri: &str) -> Result<(&str, &str), DomainError> {
    match uri.split_once(',') {
        Some((prefix, payload)) if prefix.starts_with("data:") => Ok((prefix, payload)),
        _ => Err(DomainError::MalformedDataUri(truncate(uri, 32))),
    }
}

fn truncate(value: &str, max_chars: usize) -> String {
    value.chars().take(max_chars).collect()
}
