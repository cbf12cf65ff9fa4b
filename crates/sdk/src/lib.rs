//! M-Pesa client SDK
//!
//! Typed, validated requests for the M-Pesa business APIs on top of the
//! credential manager and retrying executor.
//!
//! ```no_run
//! use mpesa_sdk::{ConsumerCredentials, Mpesa, MpesaConfig};
//! use mpesa_sdk::dto::stk_push::StkPushRequest;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let mpesa = Mpesa::new(ConsumerCredentials::from_env()?, MpesaConfig::default())?;
//! let request = StkPushRequest::builder()
//!     .business_short_code("1020")
//!     .password("c2VjcmV0")
//!     .amount("20")
//!     .party_a("251700404789")
//!     .party_b("554433")
//!     .phone_number("251700404789")
//!     .callback_url("https://example.com/stk")
//!     .account_reference("INV-1")
//!     .transaction_desc("Payment")
//!     .build()?;
//! let response = mpesa.request_stk_push(&request).await?;
//! println!("{:?}", response.checkout_request_id);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod dto;
pub mod error;
pub mod mpesa;
pub mod service;
pub mod validation;

pub use config::{ConsumerCredentials, Endpoint, Environment, MpesaConfig};
pub use error::{ErrorCode, ErrorResponse, MpesaError, Result};
pub use mpesa::Mpesa;
pub use service::Operation;
