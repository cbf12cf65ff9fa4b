//! Transaction status queries and reversals

use mpesa_common::Secret;
use serde::Serialize;

use super::{CommandAcknowledgement, new_request_id};
use crate::error::{MpesaError, Result};
use crate::validation::{
    require_base64, require_length, require_non_empty, require_numeric, require_secret,
    require_url,
};

pub type TransactionStatusResponse = CommandAcknowledgement;
pub type TransactionReversalResponse = CommandAcknowledgement;

/// Look up a transaction by `TransactionID` or `OriginalConversationID`.
#[derive(Debug, Clone, Serialize)]
pub struct TransactionStatusRequest {
    #[serde(rename = "Initiator")]
    initiator: String,
    #[serde(rename = "SecurityCredential")]
    security_credential: Secret<String>,
    #[serde(rename = "CommandID")]
    command_id: &'static str,
    #[serde(rename = "TransactionID", skip_serializing_if = "Option::is_none")]
    transaction_id: Option<String>,
    #[serde(
        rename = "OriginalConversationID",
        skip_serializing_if = "Option::is_none"
    )]
    original_conversation_id: Option<String>,
    #[serde(rename = "PartyA")]
    party_a: String,
    #[serde(rename = "IdentifierType")]
    identifier_type: String,
    #[serde(rename = "ResultURL")]
    result_url: String,
    #[serde(rename = "QueueTimeOutURL")]
    queue_timeout_url: String,
    #[serde(rename = "Remarks", skip_serializing_if = "Option::is_none")]
    remarks: Option<String>,
    #[serde(rename = "Occasion", skip_serializing_if = "Option::is_none")]
    occasion: Option<String>,
}

impl TransactionStatusRequest {
    pub fn builder() -> TransactionStatusRequestBuilder {
        TransactionStatusRequestBuilder::default()
    }
}

#[derive(Debug, Default)]
pub struct TransactionStatusRequestBuilder {
    initiator: Option<String>,
    security_credential: Option<Secret<String>>,
    transaction_id: Option<String>,
    original_conversation_id: Option<String>,
    party_a: Option<String>,
    identifier_type: Option<String>,
    result_url: Option<String>,
    queue_timeout_url: Option<String>,
    remarks: Option<String>,
    occasion: Option<String>,
}

impl TransactionStatusRequestBuilder {
    pub fn initiator(mut self, initiator: impl Into<String>) -> Self {
        self.initiator = Some(initiator.into());
        self
    }

    pub fn security_credential(mut self, credential: impl Into<Secret<String>>) -> Self {
        self.security_credential = Some(credential.into());
        self
    }

    pub fn transaction_id(mut self, id: impl Into<String>) -> Self {
        self.transaction_id = Some(id.into());
        self
    }

    pub fn original_conversation_id(mut self, id: impl Into<String>) -> Self {
        self.original_conversation_id = Some(id.into());
        self
    }

    pub fn party_a(mut self, party: impl Into<String>) -> Self {
        self.party_a = Some(party.into());
        self
    }

    pub fn identifier_type(mut self, identifier_type: impl Into<String>) -> Self {
        self.identifier_type = Some(identifier_type.into());
        self
    }

    pub fn result_url(mut self, url: impl Into<String>) -> Self {
        self.result_url = Some(url.into());
        self
    }

    pub fn queue_timeout_url(mut self, url: impl Into<String>) -> Self {
        self.queue_timeout_url = Some(url.into());
        self
    }

    /// Up to 100 characters.
    pub fn remarks(mut self, remarks: impl Into<String>) -> Self {
        self.remarks = Some(remarks.into());
        self
    }

    /// Up to 100 characters.
    pub fn occasion(mut self, occasion: impl Into<String>) -> Self {
        self.occasion = Some(occasion.into());
        self
    }

    pub fn build(self) -> Result<TransactionStatusRequest> {
        let initiator = require_non_empty(self.initiator.as_deref(), "Initiator")?.to_owned();
        let security_credential =
            require_secret(self.security_credential, "SecurityCredential")?;

        let transaction_id = non_blank(self.transaction_id);
        let original_conversation_id = non_blank(self.original_conversation_id);
        if transaction_id.is_none() && original_conversation_id.is_none() {
            return Err(MpesaError::InvalidRequest(
                "Either TransactionID or OriginalConversationID must be provided.".into(),
            ));
        }

        let party_a = require_non_empty(self.party_a.as_deref(), "PartyA")?.to_owned();
        let identifier_type =
            require_non_empty(self.identifier_type.as_deref(), "IdentifierType")?.to_owned();
        require_numeric(&identifier_type, "IdentifierType")?;
        let result_url = require_non_empty(self.result_url.as_deref(), "ResultURL")?.to_owned();
        require_url(&result_url, "ResultURL")?;
        let queue_timeout_url =
            require_non_empty(self.queue_timeout_url.as_deref(), "QueueTimeOutURL")?.to_owned();
        require_url(&queue_timeout_url, "QueueTimeOutURL")?;
        if let Some(remarks) = &self.remarks {
            require_length(remarks, 0, 100, "Remarks")?;
        }
        if let Some(occasion) = &self.occasion {
            require_length(occasion, 0, 100, "Occasion")?;
        }

        Ok(TransactionStatusRequest {
            initiator,
            security_credential,
            command_id: "TransactionStatusQuery",
            transaction_id,
            original_conversation_id,
            party_a,
            identifier_type,
            result_url,
            queue_timeout_url,
            remarks: self.remarks,
            occasion: self.occasion,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[derive(Debug, Clone, Serialize)]
pub struct TransactionReversalRequest {
    #[serde(rename = "OriginatorConversationID")]
    originator_conversation_id: String,
    #[serde(rename = "Initiator")]
    initiator: String,
    #[serde(rename = "SecurityCredential")]
    security_credential: Secret<String>,
    #[serde(rename = "CommandID")]
    command_id: &'static str,
    #[serde(rename = "TransactionID")]
    transaction_id: String,
    #[serde(rename = "Amount")]
    amount: String,
    #[serde(rename = "OriginalConversationID")]
    original_conversation_id: String,
    #[serde(rename = "PartyA")]
    party_a: String,
    #[serde(rename = "ReceiverIdentifierType")]
    receiver_identifier_type: String,
    #[serde(rename = "ReceiverParty")]
    receiver_party: String,
    #[serde(rename = "ResultURL")]
    result_url: String,
    #[serde(rename = "QueueTimeOutURL")]
    queue_timeout_url: String,
    #[serde(rename = "Remarks")]
    remarks: String,
    #[serde(rename = "Occasion", skip_serializing_if = "Option::is_none")]
    occasion: Option<String>,
}

impl TransactionReversalRequest {
    pub fn builder() -> TransactionReversalRequestBuilder {
        TransactionReversalRequestBuilder::default()
    }

    pub fn originator_conversation_id(&self) -> &str {
        &self.originator_conversation_id
    }
}

#[derive(Debug, Default)]
pub struct TransactionReversalRequestBuilder {
    originator_conversation_id: Option<String>,
    initiator: Option<String>,
    security_credential: Option<Secret<String>>,
    transaction_id: Option<String>,
    amount: Option<String>,
    original_conversation_id: Option<String>,
    party_a: Option<String>,
    receiver_identifier_type: Option<String>,
    receiver_party: Option<String>,
    result_url: Option<String>,
    queue_timeout_url: Option<String>,
    remarks: Option<String>,
    occasion: Option<String>,
}

impl TransactionReversalRequestBuilder {
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

    pub fn transaction_id(mut self, id: impl Into<String>) -> Self {
        self.transaction_id = Some(id.into());
        self
    }

    pub fn amount(mut self, amount: impl Into<String>) -> Self {
        self.amount = Some(amount.into());
        self
    }

    pub fn original_conversation_id(mut self, id: impl Into<String>) -> Self {
        self.original_conversation_id = Some(id.into());
        self
    }

    pub fn party_a(mut self, party: impl Into<String>) -> Self {
        self.party_a = Some(party.into());
        self
    }

    pub fn receiver_identifier_type(mut self, identifier_type: impl Into<String>) -> Self {
        self.receiver_identifier_type = Some(identifier_type.into());
        self
    }

    pub fn receiver_party(mut self, party: impl Into<String>) -> Self {
        self.receiver_party = Some(party.into());
        self
    }

    pub fn result_url(mut self, url: impl Into<String>) -> Self {
        self.result_url = Some(url.into());
        self
    }

    pub fn queue_timeout_url(mut self, url: impl Into<String>) -> Self {
        self.queue_timeout_url = Some(url.into());
        self
    }

    pub fn remarks(mut self, remarks: impl Into<String>) -> Self {
        self.remarks = Some(remarks.into());
        self
    }

    pub fn occasion(mut self, occasion: impl Into<String>) -> Self {
        self.occasion = Some(occasion.into());
        self
    }

    pub fn build(self) -> Result<TransactionReversalRequest> {
        let originator_conversation_id = match self.originator_conversation_id {
            Some(id) => require_non_empty(Some(id.as_str()), "OriginatorConversationID")?.to_owned(),
            None => new_request_id(),
        };
        let initiator = require_non_empty(self.initiator.as_deref(), "Initiator")?.to_owned();
        let security_credential =
            require_secret(self.security_credential, "SecurityCredential")?;
        require_base64(security_credential.expose(), "SecurityCredential")?;
        let transaction_id =
            require_non_empty(self.transaction_id.as_deref(), "TransactionID")?.to_owned();
        let amount = require_non_empty(self.amount.as_deref(), "Amount")?.to_owned();
        let original_conversation_id = require_non_empty(
            self.original_conversation_id.as_deref(),
            "OriginalConversationID",
        )?
        .to_owned();
        let party_a = require_non_empty(self.party_a.as_deref(), "PartyA")?.to_owned();
        let receiver_identifier_type = require_non_empty(
            self.receiver_identifier_type.as_deref(),
            "ReceiverIdentifierType",
        )?
        .to_owned();
        let receiver_party =
            require_non_empty(self.receiver_party.as_deref(), "ReceiverParty")?.to_owned();
        let remarks = require_non_empty(self.remarks.as_deref(), "Remarks")?.to_owned();
        let result_url = require_non_empty(self.result_url.as_deref(), "ResultURL")?.to_owned();
        require_url(&result_url, "ResultURL")?;
        let queue_timeout_url =
            require_non_empty(self.queue_timeout_url.as_deref(), "QueueTimeOutURL")?.to_owned();
        require_url(&queue_timeout_url, "QueueTimeOutURL")?;

        Ok(TransactionReversalRequest {
            originator_conversation_id,
            initiator,
            security_credential,
            command_id: "TransactionReversal",
            transaction_id,
            amount,
            original_conversation_id,
            party_a,
            receiver_identifier_type,
            receiver_party,
            result_url,
            queue_timeout_url,
            remarks,
            occasion: self.occasion,
        })
    }
}
