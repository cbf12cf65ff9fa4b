//! Command-line and environment inputs

use anyhow::{Result, bail};
use mpesa_sdk::dto::account::AccountBalanceRequest;

/// Parsed command-line flags.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Args {
    /// `--config <path>`
    pub config: Option<String>,
    /// `--balance`: also submit an account balance query
    pub balance: bool,
    /// `--metrics`: print Prometheus counters before exiting
    pub metrics: bool,
}

impl Args {
    /// Parse flags, skipping the program name.
    pub fn parse<I>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut parsed = Args::default();
        let mut iter = args.into_iter().skip(1);
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--config" => match iter.next() {
                    Some(path) => parsed.config = Some(path),
                    None => bail!("--config requires a path"),
                },
                "--balance" => parsed.balance = true,
                "--metrics" => parsed.metrics = true,
                other => bail!("unknown argument: {other}"),
            }
        }
        Ok(parsed)
    }
}

/// Build the balance query from `MPESA_*` variables looked up via `var`.
pub fn balance_request<F>(var: F) -> Result<AccountBalanceRequest>
where
    F: Fn(&str) -> Option<String>,
{
    let required = |name: &str| match var(name) {
        Some(value) => Ok(value),
        None => Err(anyhow::anyhow!("{name} must be set for --balance")),
    };

    let mut builder = AccountBalanceRequest::builder()
        .initiator(required("MPESA_INITIATOR")?)
        .security_credential(required("MPESA_SECURITY_CREDENTIAL")?)
        .party_a(required("MPESA_SHORT_CODE")?)
        .identifier_type(var("MPESA_IDENTIFIER_TYPE").unwrap_or_else(|| "4".into()))
        .queue_timeout_url(required("MPESA_QUEUE_TIMEOUT_URL")?)
        .result_url(required("MPESA_RESULT_URL")?);
    if let Some(remarks) = var("MPESA_REMARKS") {
        builder = builder.remarks(remarks);
    }
    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn args(list: &[&str]) -> Result<Args> {
        Args::parse(list.iter().map(|s| s.to_string()))
    }

    #[test]
    fn parses_flags() {
        let parsed = args(&["mpesa-check", "--config", "/etc/mpesa.toml", "--balance"]).unwrap();
        assert_eq!(
            parsed,
            Args {
                config: Some("/etc/mpesa.toml".into()),
                balance: true,
                metrics: false,
            }
        );
        assert_eq!(args(&["mpesa-check"]).unwrap(), Args::default());
    }

    #[test]
    fn rejects_bad_flags() {
        assert!(args(&["mpesa-check", "--config"]).is_err());
        assert!(args(&["mpesa-check", "--verbose"]).is_err());
    }

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn balance_request_from_vars() {
        let vars = env(&[
            ("MPESA_INITIATOR", "apitest"),
            ("MPESA_SECURITY_CREDENTIAL", "c2VjcmV0"),
            ("MPESA_SHORT_CODE", "101010"),
            ("MPESA_QUEUE_TIMEOUT_URL", "https://example.com/timeout"),
            ("MPESA_RESULT_URL", "https://example.com/result"),
        ]);
        let request = balance_request(|k| vars.get(k).cloned()).unwrap();
        assert!(!request.originator_conversation_id().is_empty());
    }

    #[test]
    fn balance_request_names_missing_var() {
        let vars = env(&[("MPESA_INITIATOR", "apitest")]);
        let err = balance_request(|k| vars.get(k).cloned()).unwrap_err();
        assert!(err.to_string().contains("MPESA_SECURITY_CREDENTIAL"));
    }

    #[test]
    fn balance_request_surfaces_validation() {
        let vars = env(&[
            ("MPESA_INITIATOR", "apitest"),
            ("MPESA_SECURITY_CREDENTIAL", "c2VjcmV0"),
            ("MPESA_SHORT_CODE", "12"),
            ("MPESA_QUEUE_TIMEOUT_URL", "https://example.com/timeout"),
            ("MPESA_RESULT_URL", "https://example.com/result"),
        ]);
        let err = balance_request(|k| vars.get(k).cloned()).unwrap_err();
        assert!(err.to_string().contains("PartyA"));
    }
}
