//! Response envelopes shared by the Sendo API

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Decode a response that is either a `{ status, message, data }` envelope
/// or the bare object
///
/// When `data` is present it is decoded strictly; the envelope itself is
/// never read as the payload.
pub fn open_envelope<T: DeserializeOwned>(value: JsonValue) -> serde_json::Result<T> {
    match value {
        JsonValue::Object(mut fields) => match fields.remove("data") {
            Some(data) => serde_json::from_value(data),
            None => serde_json::from_value(JsonValue::Object(fields)),
        },
        bare => serde_json::from_value(bare),
    }
}

/// The `status` an envelope reports in its body, which can differ from
/// the HTTP status
pub fn envelope_status(value: &JsonValue) -> Option<u16> {
    value
        .get("status")
        .and_then(JsonValue::as_u64)
        .and_then(|status| u16::try_from(status).ok())
}

/// Server-side pagination block
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_items: u64,
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

fn first_page() -> u32 {
    1
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            page: 1,
            total_pages: 0,
            total_items: 0,
            items: Vec::new(),
        }
    }
}
