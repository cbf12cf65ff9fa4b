//! Account balance query

use mpesa_common::Secret;
use serde::Serialize;

use super::{CommandAcknowledgement, new_request_id};
use crate::error::Result;
use crate::validation::{
    require_base64, require_non_empty, require_secret, require_short_code, require_url,
};

pub type AccountBalanceResponse = CommandAcknowledgement;

#[derive(Debug, Clone, Serialize)]
pub struct AccountBalanceRequest {
    #[serde(rename = "OriginatorConversationID")]
    originator_conversation_id: String,
    #[serde(rename = "Initiator")]
    initiator: String,
    #[serde(rename = "SecurityCredential")]
    security_credential: Secret<String>,
    #[serde(rename = "CommandID")]
    command_id: &'static str,
    #[serde(rename = "PartyA")]
    party_a: String,
    #[serde(rename = "IdentifierType")]
    identifier_type: String,
    #[serde(rename = "Remarks", skip_serializing_if = "Option::is_none")]
    remarks: Option<String>,
    #[serde(rename = "QueueTimeOutURL")]
    queue_timeout_url: String,
    #[serde(rename = "ResultURL")]
    result_url: String,
}

impl AccountBalanceRequest {
    pub fn builder() -> AccountBalanceRequestBuilder {
        AccountBalanceRequestBuilder::default()
    }

    /// Correlates the asynchronous result with this request.
    pub fn originator_conversation_id(&self) -> &str {
        &self.originator_conversation_id
    }
}

#[derive(Debug, Default)]
pub struct AccountBalanceRequestBuilder {
    originator_conversation_id: Option<String>,
    initiator: Option<String>,
    security_credential: Option<Secret<String>>,
    party_a: Option<String>,
    identifier_type: Option<String>,
    remarks: Option<String>,
    queue_timeout_url: Option<String>,
    result_url: Option<String>,
}

impl AccountBalanceRequestBuilder {
    /// Defaults to a fresh UUID.
    pub fn originator_conversation_id(mut self, id: impl Into<String>) -> Self {
        self.originator_conversation_id = Some(id.into());
        self
    }

    pub fn initiator(mut self, initiator: impl Into<String>) -> Self {
        self.initiator = Some(initiator.into());
        self
    }

    pub fn security_credential(mut self, credential: impl Into<Secret<String>>) -> Self {
        self.security_credential = Some(credential.into());
        self
    }

    pub fn party_a(mut self, short_code: impl Into<String>) -> Self {
        self.party_a = Some(short_code.into());
        self
    }

    pub fn identifier_type(mut self, identifier_type: impl Into<String>) -> Self {
        self.identifier_type = Some(identifier_type.into());
        self
    }

    pub fn remarks(mut self, remarks: impl Into<String>) -> Self {
        self.remarks = Some(remarks.into());
        self
    }

    pub fn queue_timeout_url(mut self, url: impl Into<String>) -> Self {
        self.queue_timeout_url = Some(url.into());
        self
    }

    pub fn result_url(mut self, url: impl Into<String>) -> Self {
        self.result_url = Some(url.into());
        self
    }

    pub fn build(self) -> Result<AccountBalanceRequest> {
        let originator_conversation_id = match self.originator_conversation_id {
            Some(id) => require_non_empty(Some(id.as_str()), "OriginatorConversationID")?.to_owned(),
            None => new_request_id(),
        };
        let initiator = require_non_empty(self.initiator.as_deref(), "Initiator")?.to_owned();
        let security_credential =
            require_secret(self.security_credential, "SecurityCredential")?;
        require_base64(security_credential.expose(), "SecurityCredential")?;
        let party_a = require_non_empty(self.party_a.as_deref(), "PartyA")?.to_owned();
        require_short_code(&party_a, "PartyA")?;
        let identifier_type =
            require_non_empty(self.identifier_type.as_deref(), "IdentifierType")?.to_owned();
        let queue_timeout_url =
            require_non_empty(self.queue_timeout_url.as_deref(), "QueueTimeOutURL")?.to_owned();
        require_url(&queue_timeout_url, "QueueTimeOutURL")?;
        let result_url = require_non_empty(self.result_url.as_deref(), "ResultURL")?.to_owned();
        require_url(&result_url, "ResultURL")?;

        Ok(AccountBalanceRequest {
            originator_conversation_id,
            initiator,
            security_credential,
            command_id: "AccountBalance",
            party_a,
            identifier_type,
            remarks: self.remarks,
            queue_timeout_url,
            result_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MpesaError;

    fn valid() -> AccountBalanceRequestBuilder {
        AccountBalanceRequest::builder()
            .initiator("apitest")
            .security_credential("c2VjcmV0")
            .party_a("101010")
            .identifier_type("4")
            .remarks("balance")
            .queue_timeout_url("https://example.com/timeout")
            .result_url("https://example.com/result")
    }

    #[test]
    fn serializes_with_wire_names() {
        let request = valid().originator_conversation_id("conv-1").build().unwrap();
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["OriginatorConversationID"], "conv-1");
        assert_eq!(json["CommandID"], "AccountBalance");
        assert_eq!(json["SecurityCredential"], "c2VjcmV0");
        assert_eq!(json["PartyA"], "101010");
        assert_eq!(json["QueueTimeOutURL"], "https://example.com/timeout");
    }

    #[test]
    fn generates_conversation_id() {
        let request = valid().build().unwrap();
        assert!(uuid::Uuid::parse_str(request.originator_conversation_id()).is_ok());
    }

    #[test]
    fn debug_hides_security_credential() {
        let request = valid().build().unwrap();
        assert!(!format!("{request:?}").contains("c2VjcmV0"));
    }

    #[test]
    fn rejects_missing_and_malformed_fields() {
        let err = valid().party_a("12").build().unwrap_err();
        assert!(matches!(err, MpesaError::InvalidRequest(m) if m.contains("PartyA")));

        let err = valid().security_credential("not base64!").build().unwrap_err();
        assert!(matches!(err, MpesaError::InvalidRequest(m) if m.contains("SecurityCredential")));

        let err = valid().result_url("nope").build().unwrap_err();
        assert!(matches!(err, MpesaError::InvalidRequest(m) if m.contains("ResultURL")));

        let err = AccountBalanceRequest::builder().build().unwrap_err();
        assert!(matches!(err, MpesaError::InvalidRequest(m) if m.contains("Initiator")));
    }
}
