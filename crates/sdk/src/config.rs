//! Configuration types and loading
//!
//! Precedence: explicit overrides in the TOML file > environment defaults.
//! Consumer key and secret are loaded from MPESA_CONSUMER_KEY /
//! MPESA_CONSUMER_SECRET or from files named in `[credentials]`, never
//! stored in the TOML directly.

use std::path::{Path, PathBuf};
use std::time::Duration;

use mpesa_auth::{PRODUCTION_BASE_URL, SANDBOX_BASE_URL, TOKEN_PATH};
use mpesa_client::RetryPolicy;
use mpesa_common::Secret;
use mpesa_transport::TransportConfig;
use serde::Deserialize;

/// Default config file name when neither `--config` nor MPESA_CONFIG is set.
pub const DEFAULT_CONFIG_FILE: &str = "mpesa.toml";

pub const C2B_REGISTER_PATH: &str = "/v1/c2b-register-url/register";
pub const C2B_PAYMENT_PATH: &str = "/c2b/payments";
pub const C2B_SIMULATE_PATH: &str = "/mpesa/b2c/simulatetransaction/v1/request";
pub const STK_PUSH_PATH: &str = "/mpesa/stkpush/v3/processrequest";
pub const B2C_PAYMENT_PATH: &str = "/mpesa/b2c/v1/paymentrequest";
pub const TRANSACTION_STATUS_PATH: &str = "/mpesa/transactionstatus/v1/query";
pub const TRANSACTION_REVERSAL_PATH: &str = "/mpesa/reversal/v2/request";
pub const ACCOUNT_BALANCE_PATH: &str = "/mpesa/accountbalance/v2/query";

/// Provider environment; selects the base URL.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Sandbox,
    Production,
}

impl Environment {
    pub fn base_url(&self) -> &'static str {
        match self {
            Environment::Sandbox => SANDBOX_BASE_URL,
            Environment::Production => PRODUCTION_BASE_URL,
        }
    }
}

/// Resource endpoints, one per operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    C2bRegister,
    C2bPayment,
    C2bSimulate,
    StkPush,
    B2cPayment,
    TransactionStatus,
    TransactionReversal,
    AccountBalance,
}

impl Endpoint {
    pub const ALL: [Endpoint; 8] = [
        Endpoint::C2bRegister,
        Endpoint::C2bPayment,
        Endpoint::C2bSimulate,
        Endpoint::StkPush,
        Endpoint::B2cPayment,
        Endpoint::TransactionStatus,
        Endpoint::TransactionReversal,
        Endpoint::AccountBalance,
    ];

    /// Key of the override in the `[endpoints]` table.
    pub fn config_key(&self) -> &'static str {
        match self {
            Endpoint::C2bRegister => "c2b_register_url",
            Endpoint::C2bPayment => "c2b_payment_url",
            Endpoint::C2bSimulate => "c2b_simulate_payment_url",
            Endpoint::StkPush => "stk_push_url",
            Endpoint::B2cPayment => "b2c_payment_url",
            Endpoint::TransactionStatus => "transaction_status_url",
            Endpoint::TransactionReversal => "transaction_reversal_url",
            Endpoint::AccountBalance => "account_balance_url",
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::C2bRegister => C2B_REGISTER_PATH,
            Endpoint::C2bPayment => C2B_PAYMENT_PATH,
            Endpoint::C2bSimulate => C2B_SIMULATE_PATH,
            Endpoint::StkPush => STK_PUSH_PATH,
            Endpoint::B2cPayment => B2C_PAYMENT_PATH,
            Endpoint::TransactionStatus => TRANSACTION_STATUS_PATH,
            Endpoint::TransactionReversal => TRANSACTION_REVERSAL_PATH,
            Endpoint::AccountBalance => ACCOUNT_BALANCE_PATH,
        }
    }
}

/// Full-URL overrides for individual endpoints (`[endpoints]` table).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EndpointOverrides {
    pub c2b_register_url: Option<String>,
    pub c2b_payment_url: Option<String>,
    pub c2b_simulate_payment_url: Option<String>,
    pub stk_push_url: Option<String>,
    pub b2c_payment_url: Option<String>,
    pub transaction_status_url: Option<String>,
    pub transaction_reversal_url: Option<String>,
    pub account_balance_url: Option<String>,
}

impl EndpointOverrides {
    fn get(&self, endpoint: Endpoint) -> Option<&str> {
        let url = match endpoint {
            Endpoint::C2bRegister => &self.c2b_register_url,
            Endpoint::C2bPayment => &self.c2b_payment_url,
            Endpoint::C2bSimulate => &self.c2b_simulate_payment_url,
            Endpoint::StkPush => &self.stk_push_url,
            Endpoint::B2cPayment => &self.b2c_payment_url,
            Endpoint::TransactionStatus => &self.transaction_status_url,
            Endpoint::TransactionReversal => &self.transaction_reversal_url,
            Endpoint::AccountBalance => &self.account_balance_url,
        };
        url.as_deref()
    }
}

/// Where to find consumer credentials when the env vars are unset.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CredentialsConfig {
    pub consumer_key_file: Option<PathBuf>,
    pub consumer_secret_file: Option<PathBuf>,
}

/// Client configuration. Immutable once handed to `Mpesa`.
#[derive(Debug, Clone, Deserialize)]
pub struct MpesaConfig {
    #[serde(default)]
    pub environment: Environment,
    /// Token endpoint override (full URL, query included)
    #[serde(default)]
    pub auth_url: Option<String>,
    #[serde(default)]
    pub endpoints: EndpointOverrides,
    #[serde(default)]
    pub credentials: CredentialsConfig,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
    #[serde(default = "default_write_timeout_ms")]
    pub write_timeout_ms: u64,
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_connect_timeout_ms() -> u64 {
    5_000
}

fn default_read_timeout_ms() -> u64 {
    15_000
}

fn default_write_timeout_ms() -> u64 {
    10_000
}

fn default_retry_backoff_ms() -> u64 {
    500
}

fn default_max_retries() -> u32 {
    3
}

impl Default for MpesaConfig {
    fn default() -> Self {
        Self {
            environment: Environment::default(),
            auth_url: None,
            endpoints: EndpointOverrides::default(),
            credentials: CredentialsConfig::default(),
            connect_timeout_ms: default_connect_timeout_ms(),
            read_timeout_ms: default_read_timeout_ms(),
            write_timeout_ms: default_write_timeout_ms(),
            retry_backoff_ms: default_retry_backoff_ms(),
            max_retries: default_max_retries(),
        }
    }
}

impl MpesaConfig {
    /// Defaults for the given environment.
    pub fn for_environment(environment: Environment) -> Self {
        Self {
            environment,
            ..Self::default()
        }
    }

    /// Load configuration from a TOML file and validate it.
    pub fn load(path: &Path) -> mpesa_common::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: MpesaConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the client cannot run with.
    pub fn validate(&self) -> mpesa_common::Result<()> {
        require_http_url("auth_url", &self.token_url())?;
        for endpoint in Endpoint::ALL {
            require_http_url(endpoint.config_key(), &self.endpoint_url(endpoint))?;
        }

        for (name, value) in [
            ("connect_timeout_ms", self.connect_timeout_ms),
            ("read_timeout_ms", self.read_timeout_ms),
            ("write_timeout_ms", self.write_timeout_ms),
        ] {
            if value == 0 {
                return Err(mpesa_common::Error::Config(format!(
                    "{name} must be greater than 0"
                )));
            }
        }

        if self.max_retries == 0 {
            return Err(mpesa_common::Error::Config(
                "max_retries must be at least 1".into(),
            ));
        }

        Ok(())
    }

    pub fn base_url(&self) -> &'static str {
        self.environment.base_url()
    }

    pub fn token_url(&self) -> String {
        match &self.auth_url {
            Some(url) => url.clone(),
            None => format!("{}{}", self.base_url(), TOKEN_PATH),
        }
    }

    /// Override if configured, otherwise base URL + default path.
    pub fn endpoint_url(&self, endpoint: Endpoint) -> String {
        match self.endpoints.get(endpoint) {
            Some(url) => url.to_owned(),
            None => format!("{}{}", self.base_url(), endpoint.path()),
        }
    }

    pub fn transport_config(&self) -> TransportConfig {
        TransportConfig {
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            read_timeout: Duration::from_millis(self.read_timeout_ms),
            write_timeout: Duration::from_millis(self.write_timeout_ms),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_retries,
            Duration::from_millis(self.retry_backoff_ms),
        )
    }

    /// Resolve config file path from CLI arg or MPESA_CONFIG env var.
    pub fn resolve_path(cli_path: Option<&str>) -> PathBuf {
        if let Some(p) = cli_path {
            return PathBuf::from(p);
        }
        if let Ok(p) = std::env::var("MPESA_CONFIG") {
            return PathBuf::from(p);
        }
        PathBuf::from(DEFAULT_CONFIG_FILE)
    }
}

fn require_http_url(name: &str, url: &str) -> mpesa_common::Result<()> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(mpesa_common::Error::Config(format!(
            "{name} must start with http:// or https://, got: {url}"
        )));
    }
    Ok(())
}

/// Consumer key and secret issued by the provider portal.
#[derive(Debug, Clone)]
pub struct ConsumerCredentials {
    pub consumer_key: Secret<String>,
    pub consumer_secret: Secret<String>,
}

impl ConsumerCredentials {
    pub fn new(
        consumer_key: impl Into<Secret<String>>,
        consumer_secret: impl Into<Secret<String>>,
    ) -> Self {
        Self {
            consumer_key: consumer_key.into(),
            consumer_secret: consumer_secret.into(),
        }
    }

    /// Resolve credentials.
    ///
    /// Resolution order, per value:
    /// 1. MPESA_CONSUMER_KEY / MPESA_CONSUMER_SECRET env var
    /// 2. consumer_key_file / consumer_secret_file path from config
    pub fn resolve(config: &CredentialsConfig) -> mpesa_common::Result<Self> {
        let consumer_key = resolve_one(
            "MPESA_CONSUMER_KEY",
            config.consumer_key_file.as_deref(),
            "consumer key",
        )?;
        let consumer_secret = resolve_one(
            "MPESA_CONSUMER_SECRET",
            config.consumer_secret_file.as_deref(),
            "consumer secret",
        )?;
        Ok(Self {
            consumer_key,
            consumer_secret,
        })
    }

    /// Resolve from environment variables only.
    pub fn from_env() -> mpesa_common::Result<Self> {
        Self::resolve(&CredentialsConfig::default())
    }
}

fn resolve_one(
    env_var: &str,
    file: Option<&Path>,
    what: &str,
) -> mpesa_common::Result<Secret<String>> {
    if let Ok(value) = std::env::var(env_var) {
        let value = Secret::new(value);
        if !value.is_blank() {
            return Ok(value);
        }
    }

    if let Some(path) = file {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            mpesa_common::Error::Config(format!(
                "failed to read {what} file {}: {e}",
                path.display()
            ))
        })?;
        let value = Secret::new(contents.trim().to_owned());
        if !value.is_blank() {
            return Ok(value);
        }
    }

    Err(mpesa_common::Error::MissingCredential(format!(
        "{what}: set {env_var} or provide a file in [credentials]"
    )))
}
