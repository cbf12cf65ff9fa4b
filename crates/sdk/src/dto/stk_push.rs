//! STK push (customer-facing payment prompt)

use mpesa_common::Secret;
use serde::{Deserialize, Serialize};

use super::{KeyValue, new_request_id, timestamp};
use crate::error::Result;
use crate::validation::{
    require_base64, require_length, require_non_empty, require_numeric, require_phone_number,
    require_secret, require_short_code, require_url,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum TransactionType {
    CustomerBuyGoodsOnline,
    #[default]
    CustomerPayBillOnline,
}

#[derive(Debug, Clone, Serialize)]
pub struct StkPushRequest {
    #[serde(rename = "MerchantRequestID")]
    merchant_request_id: String,
    #[serde(rename = "BusinessShortCode")]
    business_short_code: String,
    #[serde(rename = "Password")]
    password: Secret<String>,
    #[serde(rename = "Timestamp")]
    timestamp: String,
    #[serde(rename = "TransactionType")]
    transaction_type: TransactionType,
    #[serde(rename = "Amount")]
    amount: String,
    #[serde(rename = "PartyA")]
    party_a: String,
    #[serde(rename = "PartyB")]
    party_b: String,
    #[serde(rename = "PhoneNumber")]
    phone_number: String,
    #[serde(rename = "CallBackURL")]
    callback_url: String,
    #[serde(rename = "AccountReference")]
    account_reference: String,
    #[serde(rename = "TransactionDesc")]
    transaction_desc: String,
    #[serde(rename = "ReferenceData")]
    reference_data: Vec<KeyValue>,
}

impl StkPushRequest {
    pub fn builder() -> StkPushRequestBuilder {
        StkPushRequestBuilder::default()
    }

    pub fn merchant_request_id(&self) -> &str {
        &self.merchant_request_id
    }
}

#[derive(Debug, Default)]
pub struct StkPushRequestBuilder {
    business_short_code: Option<String>,
    password: Option<Secret<String>>,
    transaction_type: TransactionType,
    amount: Option<String>,
    party_a: Option<String>,
    party_b: Option<String>,
    phone_number: Option<String>,
    callback_url: Option<String>,
    account_reference: Option<String>,
    transaction_desc: Option<String>,
    reference_data: Vec<KeyValue>,
}

impl StkPushRequestBuilder {
    pub fn business_short_code(mut self, short_code: impl Into<String>) -> Self {
        self.business_short_code = Some(short_code.into());
        self
    }

    /// Base64 of short code, passkey and timestamp, as issued by the provider.
    pub fn password(mut self, password: impl Into<Secret<String>>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Defaults to `CustomerPayBillOnline`.
    pub fn transaction_type(mut self, transaction_type: TransactionType) -> Self {
        self.transaction_type = transaction_type;
        self
    }

    pub fn amount(mut self, amount: impl Into<String>) -> Self {
        self.amount = Some(amount.into());
        self
    }

    /// Customer MSISDN debited.
    pub fn party_a(mut self, phone_number: impl Into<String>) -> Self {
        self.party_a = Some(phone_number.into());
        self
    }

    /// Organization short code credited.
    pub fn party_b(mut self, short_code: impl Into<String>) -> Self {
        self.party_b = Some(short_code.into());
        self
    }

    pub fn phone_number(mut self, phone_number: impl Into<String>) -> Self {
        self.phone_number = Some(phone_number.into());
        self
    }

    pub fn callback_url(mut self, url: impl Into<String>) -> Self {
        self.callback_url = Some(url.into());
        self
    }

    pub fn account_reference(mut self, reference: impl Into<String>) -> Self {
        self.account_reference = Some(reference.into());
        self
    }

    pub fn transaction_desc(mut self, description: impl Into<String>) -> Self {
        self.transaction_desc = Some(description.into());
        self
    }

    pub fn add_reference_data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.reference_data.push(KeyValue::new(key, value));
        self
    }

    pub fn build(self) -> Result<StkPushRequest> {
        let business_short_code =
            require_non_empty(self.business_short_code.as_deref(), "BusinessShortCode")?
                .to_owned();
        require_short_code(&business_short_code, "BusinessShortCode")?;
        let password = require_secret(self.password, "Password")?;
        require_base64(password.expose(), "Password")?;
        let amount = require_non_empty(self.amount.as_deref(), "Amount")?.to_owned();
        require_numeric(&amount, "Amount")?;
        let party_a = require_non_empty(self.party_a.as_deref(), "PartyA")?.to_owned();
        require_phone_number(&party_a, "PartyA")?;
        let party_b = require_non_empty(self.party_b.as_deref(), "PartyB")?.to_owned();
        require_short_code(&party_b, "PartyB")?;
        let phone_number =
            require_non_empty(self.phone_number.as_deref(), "PhoneNumber")?.to_owned();
        require_phone_number(&phone_number, "PhoneNumber")?;
        let callback_url =
            require_non_empty(self.callback_url.as_deref(), "CallBackURL")?.to_owned();
        require_url(&callback_url, "CallBackURL")?;
        let account_reference =
            require_non_empty(self.account_reference.as_deref(), "AccountReference")?.to_owned();
        require_length(&account_reference, 1, 12, "AccountReference")?;
        let transaction_desc =
            require_non_empty(self.transaction_desc.as_deref(), "TransactionDesc")?.to_owned();
        require_length(&transaction_desc, 1, 13, "TransactionDesc")?;
        for kv in &self.reference_data {
            require_non_empty(Some(kv.key.as_str()), "ReferenceData Key")?;
            require_non_empty(Some(kv.value.as_str()), "ReferenceData Value")?;
        }

        Ok(StkPushRequest {
            merchant_request_id: new_request_id(),
            business_short_code,
            password,
            timestamp: timestamp(),
            transaction_type: self.transaction_type,
            amount,
            party_a,
            party_b,
            phone_number,
            callback_url,
            account_reference,
            transaction_desc,
            reference_data: self.reference_data,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StkPushResponse {
    #[serde(rename = "MerchantRequestID", default)]
    pub merchant_request_id: Option<String>,
    #[serde(rename = "CheckoutRequestID", default)]
    pub checkout_request_id: Option<String>,
    #[serde(rename = "ResponseCode", default)]
    pub response_code: Option<String>,
    #[serde(rename = "ResponseDescription", default)]
    pub response_description: Option<String>,
    #[serde(rename = "CustomerMessage", default)]
    pub customer_message: Option<String>,
}

impl StkPushResponse {
    pub fn is_successful(&self) -> bool {
        self.response_code.as_deref() == Some("0")
    }
}
