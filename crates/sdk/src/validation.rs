//! Field validation for request builders
//!
//! Every check returns `MpesaError::InvalidRequest` naming the wire field, so
//! a bad request fails before any token or network call.

use std::sync::LazyLock;

use mpesa_common::Secret;
use regex::Regex;
use reqwest::Url;

use crate::error::{MpesaError, Result};

static NUMERIC: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+$").expect("valid regex"));

static BASE64: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9+/=]+$").expect("valid regex"));

static SHORT_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4,9}$").expect("valid regex"));

/// Ethiopian (2517...) or Kenyan (2547...) MSISDN.
static PHONE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(2517\d{8}|2547\d{8})$").expect("valid regex"));

fn invalid(message: String) -> MpesaError {
    MpesaError::InvalidRequest(message)
}

/// Present and not blank.
pub fn require_non_empty<'a>(value: Option<&'a str>, field: &str) -> Result<&'a str> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(invalid(format!("{field} must not be empty."))),
    }
}

/// Present and not blank, for values wrapped in `Secret`.
pub fn require_secret(value: Option<Secret<String>>, field: &str) -> Result<Secret<String>> {
    match value {
        Some(v) if !v.is_blank() => Ok(v),
        _ => Err(invalid(format!("{field} must not be empty."))),
    }
}

pub fn require_numeric(value: &str, field: &str) -> Result<()> {
    if NUMERIC.is_match(value) {
        Ok(())
    } else {
        Err(invalid(format!("{field} must be numeric.")))
    }
}

pub fn require_base64(value: &str, field: &str) -> Result<()> {
    if BASE64.is_match(value) {
        Ok(())
    } else {
        Err(invalid(format!(
            "{field} must be a valid base64 encoded string."
        )))
    }
}

/// Length in characters, inclusive on both ends.
pub fn require_length(value: &str, min: usize, max: usize, field: &str) -> Result<()> {
    let len = value.chars().count();
    if (min..=max).contains(&len) {
        Ok(())
    } else {
        Err(invalid(format!(
            "{field} must be between {min} and {max} characters long."
        )))
    }
}

pub fn require_url(value: &str, field: &str) -> Result<()> {
    Url::parse(value)
        .map(|_| ())
        .map_err(|_| invalid(format!("{field} must be a valid URL.")))
}

pub fn require_phone_number(value: &str, field: &str) -> Result<()> {
    if PHONE_NUMBER.is_match(value) {
        Ok(())
    } else {
        Err(invalid(format!(
            "{field} must be a valid Ethiopian (2517xxxxxxxx) or Kenyan (2547xxxxxxxx) number."
        )))
    }
}

pub fn require_short_code(value: &str, field: &str) -> Result<()> {
    if SHORT_CODE.is_match(value) {
        Ok(())
    } else {
        Err(invalid(format!(
            "{field} must be a valid business short code (4-9 digits)."
        )))
    }
}
