//! M-Pesa environment constants
//!
//! Base URLs and the token path are public provider values. Consumer keys
//! and secrets are never compiled in; they are supplied at construction.

/// Base URL for the production environment
pub const PRODUCTION_BASE_URL: &str = "https://api.safaricom.et";

/// Base URL for the sandbox environment
pub const SANDBOX_BASE_URL: &str = "https://apisandbox.safaricom.et";

/// Token endpoint path (client-credentials grant)
pub const TOKEN_PATH: &str = "/v1/token/generate?grant_type=client_credentials";
