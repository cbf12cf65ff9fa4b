//! Shared call path for resource operations
//!
//! Every operation posts a validated request through the `Executor`, decodes
//! the 2xx body into its typed response and maps provider rejections onto
//! `ErrorCode`s. Response bodies travel inside errors but are never logged.

use mpesa_client::Executor;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{error, info, instrument};

use crate::config::Endpoint;
use crate::error::{ErrorCode, MpesaError, Result};

/// One provider operation exposed by `Mpesa`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    AccountBalance,
    B2cPayment,
    C2bRegister,
    C2bPayment,
    C2bSimulate,
    StkPush,
    TransactionStatus,
    TransactionReversal,
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::AccountBalance => "account balance",
            Operation::B2cPayment => "B2C payment",
            Operation::C2bRegister => "C2B registration",
            Operation::C2bPayment => "C2B payment",
            Operation::C2bSimulate => "C2B payment simulation",
            Operation::StkPush => "STK push",
            Operation::TransactionStatus => "transaction status",
            Operation::TransactionReversal => "transaction reversal",
        }
    }

    pub fn endpoint(&self) -> Endpoint {
        match self {
            Operation::AccountBalance => Endpoint::AccountBalance,
            Operation::B2cPayment => Endpoint::B2cPayment,
            Operation::C2bRegister => Endpoint::C2bRegister,
            Operation::C2bPayment => Endpoint::C2bPayment,
            Operation::C2bSimulate => Endpoint::C2bSimulate,
            Operation::StkPush => Endpoint::StkPush,
            Operation::TransactionStatus => Endpoint::TransactionStatus,
            Operation::TransactionReversal => Endpoint::TransactionReversal,
        }
    }

    /// Classify a non-retryable HTTP rejection for this operation.
    pub fn map_http(&self, status: u16, body: String) -> MpesaError {
        let (code, message) = match self {
            Operation::C2bRegister
                if status == 400 && body.contains("Short Code already Registered") =>
            {
                (
                    ErrorCode::ShortCodeRegistered,
                    "Short Code is already registered.".to_owned(),
                )
            }
            Operation::C2bPayment
                if status == 400 && body.contains("The initiator information is invalid.") =>
            {
                (
                    ErrorCode::InvalidInitiator,
                    "Invalid initiator information.".to_owned(),
                )
            }
            Operation::C2bSimulate if status == 400 && body.contains("invalid") => (
                ErrorCode::InvalidRequest,
                "Invalid request parameters.".to_owned(),
            ),
            _ => (
                ErrorCode::UnknownError,
                format!("Unexpected error in {} (HTTP {status}).", self.name()),
            ),
        };
        MpesaError::unexpected(code, message, Some(status), Some(body))
    }
}

/// Post `request` for `operation` and decode the typed response.
#[instrument(skip_all, fields(operation = operation.name()))]
pub(crate) async fn call<Req, Resp>(
    executor: &Executor,
    operation: Operation,
    url: &str,
    request: &Req,
) -> Result<Resp>
where
    Req: Serialize + ?Sized,
    Resp: DeserializeOwned,
{
    info!(url = %redact_query(url), "submitting request");

    let body = match executor.post(url, request).await {
        Ok(body) => body,
        Err(mpesa_client::Error::Http { status, body }) => {
            let err = operation.map_http(status, body);
            error!(status, code = ?err.code(), "provider rejected request");
            return Err(err);
        }
        Err(e) => {
            error!(error = %e, "request failed");
            return Err(e.into());
        }
    };

    serde_json::from_str(&body).map_err(|e| {
        error!(error = %e, body_len = body.len(), "failed to parse response");
        MpesaError::unexpected(
            ErrorCode::InvalidResponse,
            format!("Failed to parse {} response.", operation.name()),
            None,
            Some(body),
        )
    })
}

/// Strip the query string, which can carry the C2B api key.
fn redact_query(url: &str) -> &str {
    url.split_once('?').map_or(url, |(path, _)| path)
}
