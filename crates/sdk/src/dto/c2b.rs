//! Customer-to-business: URL registration, payment and simulation

use mpesa_common::Secret;
use serde::{Deserialize, Serialize};

use super::{CommandAcknowledgement, KeyValue, new_request_id, timestamp};
use crate::error::{MpesaError, Result};
use crate::validation::{
    require_non_empty, require_numeric, require_phone_number, require_secret, require_short_code,
    require_url,
};

pub type C2bSimulatePaymentResponse = CommandAcknowledgement;

/// What the provider does when the validation URL cannot be reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ResponseType {
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Serialize)]
pub struct C2bRegisterRequest {
    #[serde(rename = "ShortCode")]
    short_code: String,
    #[serde(rename = "ResponseType")]
    response_type: ResponseType,
    #[serde(rename = "CommandID")]
    command_id: &'static str,
    #[serde(rename = "ConfirmationURL")]
    confirmation_url: String,
    #[serde(rename = "ValidationURL")]
    validation_url: String,
}

impl C2bRegisterRequest {
    pub fn builder() -> C2bRegisterRequestBuilder {
        C2bRegisterRequestBuilder::default()
    }
}

#[derive(Debug, Default)]
pub struct C2bRegisterRequestBuilder {
    short_code: Option<String>,
    response_type: Option<ResponseType>,
    confirmation_url: Option<String>,
    validation_url: Option<String>,
}

impl C2bRegisterRequestBuilder {
    pub fn short_code(mut self, short_code: impl Into<String>) -> Self {
        self.short_code = Some(short_code.into());
        self
    }

    pub fn response_type(mut self, response_type: ResponseType) -> Self {
        self.response_type = Some(response_type);
        self
    }

    pub fn confirmation_url(mut self, url: impl Into<String>) -> Self {
        self.confirmation_url = Some(url.into());
        self
    }

    pub fn validation_url(mut self, url: impl Into<String>) -> Self {
        self.validation_url = Some(url.into());
        self
    }

    pub fn build(self) -> Result<C2bRegisterRequest> {
        let short_code = require_non_empty(self.short_code.as_deref(), "ShortCode")?.to_owned();
        require_short_code(&short_code, "ShortCode")?;
        let response_type = self.response_type.ok_or_else(|| {
            MpesaError::InvalidRequest("ResponseType must be 'Completed' or 'Cancelled'.".into())
        })?;
        let confirmation_url =
            require_non_empty(self.confirmation_url.as_deref(), "ConfirmationURL")?.to_owned();
        require_url(&confirmation_url, "ConfirmationURL")?;
        let validation_url =
            require_non_empty(self.validation_url.as_deref(), "ValidationURL")?.to_owned();
        require_url(&validation_url, "ValidationURL")?;

        Ok(C2bRegisterRequest {
            short_code,
            response_type,
            command_id: "RegisterURL",
            confirmation_url,
            validation_url,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct C2bRegisterHeader {
    #[serde(default)]
    pub response_code: Option<String>,
    #[serde(default)]
    pub response_message: Option<String>,
    #[serde(default)]
    pub customer_message: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct C2bRegisterResponse {
    #[serde(default)]
    pub header: Option<C2bRegisterHeader>,
}

impl C2bRegisterResponse {
    pub fn is_successful(&self) -> bool {
        self.header
            .as_ref()
            .and_then(|h| h.response_code.as_deref())
            == Some("0")
    }
}

/// Party initiating a C2B payment on behalf of the organization.
#[derive(Debug, Clone, Serialize)]
pub struct Initiator {
    #[serde(rename = "IdentifierType")]
    identifier_type: u8,
    #[serde(rename = "Identifier")]
    identifier: String,
    #[serde(rename = "SecurityCredential")]
    security_credential: Secret<String>,
    #[serde(rename = "SecretKey")]
    secret_key: Secret<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Party {
    #[serde(rename = "IdentifierType")]
    identifier_type: u8,
    #[serde(rename = "Identifier")]
    identifier: String,
    #[serde(rename = "ShortCode", skip_serializing_if = "Option::is_none")]
    short_code: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct C2bPaymentRequest {
    #[serde(rename = "RequestRefID")]
    request_ref_id: String,
    #[serde(rename = "CommandID")]
    command_id: &'static str,
    #[serde(rename = "Remark")]
    remark: String,
    #[serde(rename = "ChannelSessionID")]
    channel_session_id: String,
    #[serde(rename = "SourceSystem")]
    source_system: String,
    #[serde(rename = "Timestamp")]
    timestamp: String,
    #[serde(rename = "Parameters")]
    parameters: Vec<KeyValue>,
    #[serde(rename = "ReferenceData")]
    reference_data: Vec<KeyValue>,
    #[serde(rename = "Initiator")]
    initiator: Initiator,
    #[serde(rename = "PrimaryParty")]
    primary_party: Party,
    #[serde(rename = "ReceiverParty")]
    receiver_party: Party,
}

impl C2bPaymentRequest {
    pub fn builder() -> C2bPaymentRequestBuilder {
        C2bPaymentRequestBuilder::default()
    }

    pub fn request_ref_id(&self) -> &str {
        &self.request_ref_id
    }
}

#[derive(Debug, Default)]
pub struct C2bPaymentRequestBuilder {
    remark: Option<String>,
    channel_session_id: Option<String>,
    source_system: Option<String>,
    parameters: Vec<(String, String)>,
    reference_data: Vec<(String, String)>,
    initiator: Option<(String, Secret<String>, Secret<String>)>,
    primary_party: Option<String>,
    receiver_party: Option<(String, String)>,
}

impl C2bPaymentRequestBuilder {
    pub fn remark(mut self, remark: impl Into<String>) -> Self {
        self.remark = Some(remark.into());
        self
    }

    pub fn channel_session_id(mut self, id: impl Into<String>) -> Self {
        self.channel_session_id = Some(id.into());
        self
    }

    pub fn source_system(mut self, source_system: impl Into<String>) -> Self {
        self.source_system = Some(source_system.into());
        self
    }

    /// Payment parameter such as `Amount` or `AccountReference`.
    pub fn add_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.push((key.into(), value.into()));
        self
    }

    pub fn add_reference_data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.reference_data.push((key.into(), value.into()));
        self
    }

    pub fn initiator(
        mut self,
        identifier: impl Into<String>,
        security_credential: impl Into<Secret<String>>,
        secret_key: impl Into<Secret<String>>,
    ) -> Self {
        self.initiator = Some((
            identifier.into(),
            security_credential.into(),
            secret_key.into(),
        ));
        self
    }

    /// Paying customer MSISDN.
    pub fn primary_party(mut self, phone_number: impl Into<String>) -> Self {
        self.primary_party = Some(phone_number.into());
        self
    }

    pub fn receiver_party(
        mut self,
        identifier: impl Into<String>,
        short_code: impl Into<String>,
    ) -> Self {
        self.receiver_party = Some((identifier.into(), short_code.into()));
        self
    }

    pub fn build(self) -> Result<C2bPaymentRequest> {
        let remark = require_non_empty(self.remark.as_deref(), "Remark")?.to_owned();
        let channel_session_id =
            require_non_empty(self.channel_session_id.as_deref(), "ChannelSessionID")?.to_owned();
        let source_system =
            require_non_empty(self.source_system.as_deref(), "SourceSystem")?.to_owned();

        if self.parameters.is_empty() {
            return Err(MpesaError::InvalidRequest(
                "At least one parameter (Amount, AccountReference, etc.) is required.".into(),
            ));
        }
        let parameters = key_values(self.parameters, "Parameter")?;
        let reference_data = key_values(self.reference_data, "ReferenceData")?;

        let (identifier, security_credential, secret_key) = self.initiator.ok_or_else(|| {
            MpesaError::InvalidRequest("Initiator details must be provided.".into())
        })?;
        let initiator = Initiator {
            identifier_type: 1,
            identifier: require_non_empty(Some(identifier.as_str()), "Initiator Identifier")?
                .to_owned(),
            security_credential: require_secret(Some(security_credential), "Security Credential")?,
            secret_key: require_secret(Some(secret_key), "Secret Key")?,
        };

        let primary = self.primary_party.ok_or_else(|| {
            MpesaError::InvalidRequest("Primary party details must be provided.".into())
        })?;
        require_phone_number(&primary, "PrimaryParty Identifier")?;
        let primary_party = Party {
            identifier_type: 1,
            identifier: primary,
            short_code: None,
        };

        let (receiver, short_code) = self.receiver_party.ok_or_else(|| {
            MpesaError::InvalidRequest("Receiver party details must be provided.".into())
        })?;
        require_short_code(&receiver, "ReceiverParty Identifier")?;
        require_short_code(&short_code, "ReceiverParty ShortCode")?;
        let receiver_party = Party {
            identifier_type: 4,
            identifier: receiver,
            short_code: Some(short_code),
        };

        Ok(C2bPaymentRequest {
            request_ref_id: new_request_id(),
            command_id: "CustomerPayBillOnline",
            remark,
            channel_session_id,
            source_system,
            timestamp: timestamp(),
            parameters,
            reference_data,
            initiator,
            primary_party,
            receiver_party,
        })
    }
}

fn key_values(pairs: Vec<(String, String)>, label: &str) -> Result<Vec<KeyValue>> {
    pairs
        .into_iter()
        .map(|(key, value)| -> Result<KeyValue> {
            require_non_empty(Some(key.as_str()), &format!("{label} Key"))?;
            require_non_empty(Some(value.as_str()), &format!("{label} Value"))?;
            Ok(KeyValue { key, value })
        })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct C2bPaymentResponse {
    #[serde(rename = "RequestRefID", default)]
    pub request_ref_id: Option<String>,
    #[serde(rename = "ResponseCode", default)]
    pub response_code: Option<String>,
    #[serde(rename = "ResponseDesc", default)]
    pub response_desc: Option<String>,
    #[serde(rename = "TransactionID", default)]
    pub transaction_id: Option<String>,
    #[serde(rename = "AdditionalInfo", default)]
    pub additional_info: Vec<KeyValue>,
}

impl C2bPaymentResponse {
    pub fn is_successful(&self) -> bool {
        self.response_code.as_deref() == Some("0")
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct C2bSimulatePaymentRequest {
    #[serde(rename = "CommandID")]
    command_id: String,
    #[serde(rename = "Amount")]
    amount: String,
    #[serde(rename = "Msisdn")]
    msisdn: String,
    #[serde(rename = "BillRefNumber")]
    bill_ref_number: String,
    #[serde(rename = "ShortCode")]
    short_code: String,
}

impl C2bSimulatePaymentRequest {
    pub fn builder() -> C2bSimulatePaymentRequestBuilder {
        C2bSimulatePaymentRequestBuilder::default()
    }
}

#[derive(Debug, Default)]
pub struct C2bSimulatePaymentRequestBuilder {
    command_id: Option<String>,
    amount: Option<String>,
    msisdn: Option<String>,
    bill_ref_number: Option<String>,
    short_code: Option<String>,
}

impl C2bSimulatePaymentRequestBuilder {
    /// Defaults to `CustomerPayBillOnline`.
    pub fn command_id(mut self, command_id: impl Into<String>) -> Self {
        self.command_id = Some(command_id.into());
        self
    }

    pub fn amount(mut self, amount: impl Into<String>) -> Self {
        self.amount = Some(amount.into());
        self
    }

    pub fn msisdn(mut self, msisdn: impl Into<String>) -> Self {
        self.msisdn = Some(msisdn.into());
        self
    }

    /// Defaults to a fresh UUID.
    pub fn bill_ref_number(mut self, reference: impl Into<String>) -> Self {
        self.bill_ref_number = Some(reference.into());
        self
    }

    pub fn short_code(mut self, short_code: impl Into<String>) -> Self {
        self.short_code = Some(short_code.into());
        self
    }

    pub fn build(self) -> Result<C2bSimulatePaymentRequest> {
        let command_id = match self.command_id {
            Some(id) => require_non_empty(Some(id.as_str()), "CommandID")?.to_owned(),
            None => "CustomerPayBillOnline".to_owned(),
        };
        let amount = require_non_empty(self.amount.as_deref(), "Amount")?.to_owned();
        require_numeric(&amount, "Amount")?;
        let msisdn = require_non_empty(self.msisdn.as_deref(), "Msisdn")?.to_owned();
        require_phone_number(&msisdn, "Msisdn")?;
        let bill_ref_number = match self.bill_ref_number {
            Some(r) => require_non_empty(Some(r.as_str()), "BillRefNumber")?.to_owned(),
            None => new_request_id(),
        };
        let short_code = require_non_empty(self.short_code.as_deref(), "ShortCode")?.to_owned();
        require_short_code(&short_code, "ShortCode")?;

        Ok(C2bSimulatePaymentRequest {
            command_id,
            amount,
            msisdn,
            bill_ref_number,
            short_code,
        })
    }
}
