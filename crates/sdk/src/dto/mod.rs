//! Request and response payloads
//!
//! Requests are built through validating builders and serialize with the
//! provider's PascalCase field names. Responses tolerate missing and unknown
//! fields; only a body that is not JSON of the right shape fails to parse.

pub mod account;
pub mod b2c;
pub mod c2b;
pub mod stk_push;
pub mod transaction;

use serde::{Deserialize, Serialize};

/// Generic key/value pair used by C2B and STK push payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValue {
    #[serde(rename = "Key")]
    pub key: String,
    #[serde(rename = "Value")]
    pub value: String,
}

impl KeyValue {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Acknowledgement returned by the asynchronous command endpoints (balance,
/// B2C, simulate, status, reversal). The final result arrives on the
/// request's ResultURL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CommandAcknowledgement {
    #[serde(rename = "OriginatorConversationID", default)]
    pub originator_conversation_id: Option<String>,
    #[serde(rename = "ConversationID", default)]
    pub conversation_id: Option<String>,
    #[serde(rename = "ResponseCode", default)]
    pub response_code: Option<String>,
    #[serde(rename = "ResponseDescription", default)]
    pub response_description: Option<String>,
}

impl CommandAcknowledgement {
    /// The provider accepted the command for processing.
    pub fn is_accepted(&self) -> bool {
        self.response_code.as_deref() == Some("0")
    }
}

/// Local wall-clock time as `yyyyMMddHHmmss`.
pub(crate) fn timestamp() -> String {
    chrono::Local::now().format("%Y%m%d%H%M%S").to_string()
}

pub(crate) fn new_request_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
