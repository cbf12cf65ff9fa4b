//! Business-to-customer payout

use std::fmt;
use std::str::FromStr;

use mpesa_common::Secret;
use serde::Serialize;

use super::CommandAcknowledgement;
use crate::error::{MpesaError, Result};
use crate::validation::{
    require_base64, require_non_empty, require_numeric, require_phone_number, require_secret,
    require_short_code, require_url,
};

pub type B2cPaymentResponse = CommandAcknowledgement;

/// Payout kinds accepted by the B2C endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum B2cCommand {
    SalaryPayment,
    BusinessPayment,
    PromotionPayment,
}

impl B2cCommand {
    pub fn as_str(&self) -> &'static str {
        match self {
            B2cCommand::SalaryPayment => "SalaryPayment",
            B2cCommand::BusinessPayment => "BusinessPayment",
            B2cCommand::PromotionPayment => "PromotionPayment",
        }
    }
}

impl fmt::Display for B2cCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for B2cCommand {
    type Err = MpesaError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "SalaryPayment" => Ok(B2cCommand::SalaryPayment),
            "BusinessPayment" => Ok(B2cCommand::BusinessPayment),
            "PromotionPayment" => Ok(B2cCommand::PromotionPayment),
            _ => Err(MpesaError::InvalidRequest(
                "CommandID must be one of 'SalaryPayment', 'BusinessPayment', and 'PromotionPayment'."
                    .into(),
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct B2cPaymentRequest {
    #[serde(rename = "InitiatorName")]
    initiator_name: String,
    #[serde(rename = "SecurityCredential")]
    security_credential: Secret<String>,
    /// Provider field name is spelled `Occassion` on this endpoint.
    #[serde(rename = "Occassion")]
    occasion: String,
    #[serde(rename = "CommandID")]
    command_id: B2cCommand,
    #[serde(rename = "PartyA")]
    party_a: String,
    #[serde(rename = "PartyB")]
    party_b: String,
    #[serde(rename = "Remarks")]
    remarks: String,
    #[serde(rename = "Amount")]
    amount: String,
    #[serde(rename = "QueueTimeOutURL")]
    queue_timeout_url: String,
    #[serde(rename = "ResultURL")]
    result_url: String,
}

impl B2cPaymentRequest {
    pub fn builder() -> B2cPaymentRequestBuilder {
        B2cPaymentRequestBuilder::default()
    }
}

#[derive(Debug, Default)]
pub struct B2cPaymentRequestBuilder {
    initiator_name: Option<String>,
    security_credential: Option<Secret<String>>,
    occasion: Option<String>,
    command_id: Option<B2cCommand>,
    party_a: Option<String>,
    party_b: Option<String>,
    remarks: Option<String>,
    amount: Option<String>,
    queue_timeout_url: Option<String>,
    result_url: Option<String>,
}

impl B2cPaymentRequestBuilder {
    pub fn initiator_name(mut self, name: impl Into<String>) -> Self {
        self.initiator_name = Some(name.into());
        self
    }

    pub fn security_credential(mut self, credential: impl Into<Secret<String>>) -> Self {
        self.security_credential = Some(credential.into());
        self
    }

    pub fn occasion(mut self, occasion: impl Into<String>) -> Self {
        self.occasion = Some(occasion.into());
        self
    }

    pub fn command_id(mut self, command: B2cCommand) -> Self {
        self.command_id = Some(command);
        self
    }

    /// Paying organization short code.
    pub fn party_a(mut self, short_code: impl Into<String>) -> Self {
        self.party_a = Some(short_code.into());
        self
    }

    /// Receiving customer MSISDN.
    pub fn party_b(mut self, phone_number: impl Into<String>) -> Self {
        self.party_b = Some(phone_number.into());
        self
    }

    pub fn remarks(mut self, remarks: impl Into<String>) -> Self {
        self.remarks = Some(remarks.into());
        self
    }

    /// Whole currency units, digits only.
    pub fn amount(mut self, amount: impl Into<String>) -> Self {
        self.amount = Some(amount.into());
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

    pub fn build(self) -> Result<B2cPaymentRequest> {
        let initiator_name =
            require_non_empty(self.initiator_name.as_deref(), "InitiatorName")?.to_owned();
        let security_credential =
            require_secret(self.security_credential, "SecurityCredential")?;
        require_base64(security_credential.expose(), "SecurityCredential")?;
        let occasion = require_non_empty(self.occasion.as_deref(), "Occasion")?.to_owned();
        let command_id = self.command_id.ok_or_else(|| {
            MpesaError::InvalidRequest("CommandID must not be empty.".into())
        })?;
        let party_a = require_non_empty(self.party_a.as_deref(), "PartyA")?.to_owned();
        require_short_code(&party_a, "PartyA")?;
        let party_b = require_non_empty(self.party_b.as_deref(), "PartyB")?.to_owned();
        require_phone_number(&party_b, "PartyB")?;
        let remarks = require_non_empty(self.remarks.as_deref(), "Remarks")?.to_owned();
        let amount = require_non_empty(self.amount.as_deref(), "Amount")?.to_owned();
        require_numeric(&amount, "Amount")?;
        let queue_timeout_url =
            require_non_empty(self.queue_timeout_url.as_deref(), "QueueTimeOutURL")?.to_owned();
        require_url(&queue_timeout_url, "QueueTimeOutURL")?;
        let result_url = require_non_empty(self.result_url.as_deref(), "ResultURL")?.to_owned();
        require_url(&result_url, "ResultURL")?;

        Ok(B2cPaymentRequest {
            initiator_name,
            security_credential,
            occasion,
            command_id,
            party_a,
            party_b,
            remarks,
            amount,
            queue_timeout_url,
            result_url,
        })
    }
}
