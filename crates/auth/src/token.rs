//! Client-credentials token exchange
//!
//! One GET against the token endpoint with HTTP Basic authentication over
//! `consumer_key:consumer_secret`. The endpoint answers
//! `{"access_token": "...", "expires_in": "3599"}`; `expires_in` arrives as a
//! string from the live provider and as a number from some gateways, so both
//! are accepted.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use mpesa_common::Secret;
use mpesa_transport::{
    AUTHORIZATION, CONTENT_TYPE, HeaderValue, HttpRequest, HttpResponse, Method, Transport,
};
use serde::{Deserialize, Deserializer};

use crate::error::{Error, Result};

/// Successful token endpoint payload.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: Secret<String>,
    /// Seconds until the access token expires (delta, not absolute)
    #[serde(deserialize_with = "seconds")]
    pub expires_in: u64,
}

/// `Basic base64(key:secret)` header value.
pub fn basic_auth_header(consumer_key: &Secret<String>, consumer_secret: &Secret<String>) -> Secret<String> {
    let raw = Secret::new(format!("{}:{}", consumer_key.expose(), consumer_secret.expose()));
    Secret::new(format!("Basic {}", STANDARD.encode(raw.expose().as_bytes())))
}

/// Build the token request.
pub fn build_token_request(
    token_url: &str,
    consumer_key: &Secret<String>,
    consumer_secret: &Secret<String>,
) -> Result<HttpRequest> {
    let auth = basic_auth_header(consumer_key, consumer_secret);
    let mut value = HeaderValue::from_str(auth.expose()).map_err(|e| Error::Authentication {
        message: format!("consumer credentials are not header-safe: {e}"),
        body: String::new(),
    })?;
    value.set_sensitive(true);

    Ok(HttpRequest::new(Method::GET, token_url)
        .with_header(AUTHORIZATION, value)
        .with_header(CONTENT_TYPE, HeaderValue::from_static("application/json")))
}

/// Classify a raw token endpoint response.
pub fn parse_token_response(response: HttpResponse) -> Result<TokenResponse> {
    let HttpResponse { status, body } = response;

    if status == 401 {
        return Err(Error::Authentication {
            message: "invalid API credentials (401 Unauthorized)".into(),
            body,
        });
    }

    if body.trim().is_empty() {
        return Err(Error::UnexpectedResponse {
            message: format!("token endpoint returned {status} with no body"),
            body: None,
        });
    }

    if !(200..300).contains(&status) {
        return Err(Error::UnexpectedResponse {
            message: format!("token endpoint returned {status}"),
            body: Some(body),
        });
    }

    let token: TokenResponse = match serde_json::from_str(&body) {
        Ok(token) => token,
        Err(e) => {
            return Err(Error::UnexpectedResponse {
                message: format!("cannot parse token response: {e}"),
                body: Some(body),
            });
        }
    };

    if token.access_token.is_blank() {
        return Err(Error::UnexpectedResponse {
            message: "token response carried an empty access_token".into(),
            body: Some(body),
        });
    }

    if HeaderValue::from_str(&format!("Bearer {}", token.access_token.expose())).is_err() {
        return Err(Error::UnexpectedResponse {
            message: "access_token is not usable as a bearer header value".into(),
            body: Some(body),
        });
    }

    Ok(token)
}

/// Perform one token exchange. No retries: callers decide what to do.
pub async fn request_token(
    transport: &dyn Transport,
    token_url: &str,
    consumer_key: &Secret<String>,
    consumer_secret: &Secret<String>,
) -> Result<TokenResponse> {
    let request = build_token_request(token_url, consumer_key, consumer_secret)?;
    let response = transport.send(request).await?;
    parse_token_response(response)
}

fn seconds<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Seconds {
        Number(u64),
        Text(String),
    }

    match Seconds::deserialize(deserializer)? {
        Seconds::Number(n) => Ok(n),
        Seconds::Text(s) => s
            .trim()
            .parse::<u64>()
            .map_err(|e| serde::de::Error::custom(format!("expires_in {s:?}: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mpesa_transport::scripted::ScriptedTransport;
    use mpesa_transport::TransportError;

    fn key() -> Secret<String> {
        "consumer-key".into()
    }

    fn secret() -> Secret<String> {
        "consumer-secret".into()
    }

    #[test]
    fn basic_auth_is_base64_of_key_colon_secret() {
        let header = basic_auth_header(&key(), &secret());
        // base64("consumer-key:consumer-secret")
        assert_eq!(
            header.expose(),
            "Basic Y29uc3VtZXIta2V5OmNvbnN1bWVyLXNlY3JldA=="
        );
    }

    #[test]
    fn token_request_is_get_with_basic_auth() {
        let request = build_token_request("https://auth.test/token", &key(), &secret()).unwrap();
        assert_eq!(request.method, Method::GET);
        assert_eq!(request.url, "https://auth.test/token");
        assert!(request.body.is_none());
        let auth = request.headers[AUTHORIZATION].to_str().unwrap();
        assert!(auth.starts_with("Basic "));
        assert!(request.headers[AUTHORIZATION].is_sensitive());
    }

    #[test]
    fn parses_numeric_and_string_ttl() {
        let numeric = parse_token_response(HttpResponse::new(
            200,
            r#"{"access_token":"at_1","expires_in":3599}"#,
        ))
        .unwrap();
        assert_eq!(numeric.access_token.expose(), "at_1");
        assert_eq!(numeric.expires_in, 3599);

        let text = parse_token_response(HttpResponse::new(
            200,
            r#"{"access_token":"at_2","expires_in":"3599","token_type":"Bearer"}"#,
        ))
        .unwrap();
        assert_eq!(text.expires_in, 3599);
    }

    #[test]
    fn unauthorized_is_authentication_error() {
        let err = parse_token_response(HttpResponse::new(401, "bad creds")).unwrap_err();
        match err {
            Error::Authentication { body, .. } => assert_eq!(body, "bad creds"),
            other => panic!("expected Authentication, got {other:?}"),
        }
    }

    #[test]
    fn empty_body_is_unexpected_without_body() {
        let err = parse_token_response(HttpResponse::new(200, "")).unwrap_err();
        assert!(matches!(err, Error::UnexpectedResponse { body: None, .. }));
    }

    #[test]
    fn malformed_body_is_unexpected_with_raw_body() {
        let err = parse_token_response(HttpResponse::new(200, r#"{"token":"x"}"#)).unwrap_err();
        match err {
            Error::UnexpectedResponse { body, .. } => {
                assert_eq!(body.as_deref(), Some(r#"{"token":"x"}"#));
            }
            other => panic!("expected UnexpectedResponse, got {other:?}"),
        }
    }

    #[test]
    fn non_numeric_ttl_is_unexpected() {
        let err = parse_token_response(HttpResponse::new(
            200,
            r#"{"access_token":"at","expires_in":"soon"}"#,
        ))
        .unwrap_err();
        assert!(matches!(err, Error::UnexpectedResponse { .. }));
    }

    #[test]
    fn blank_access_token_is_unexpected() {
        let err = parse_token_response(HttpResponse::new(
            200,
            r#"{"access_token":"","expires_in":3599}"#,
        ))
        .unwrap_err();
        assert!(matches!(err, Error::UnexpectedResponse { .. }));
    }

    #[test]
    fn header_unsafe_access_token_is_unexpected() {
        let raw = r#"{"access_token":"bad\u0001tok","expires_in":3599}"#;
        match parse_token_response(HttpResponse::new(200, raw)).unwrap_err() {
            Error::UnexpectedResponse { body, .. } => assert_eq!(body.as_deref(), Some(raw)),
            other => panic!("expected UnexpectedResponse, got {other:?}"),
        }
    }

    #[test]
    fn server_error_is_unexpected_not_retried() {
        let err = parse_token_response(HttpResponse::new(500, "boom")).unwrap_err();
        assert!(matches!(err, Error::UnexpectedResponse { .. }));
    }

    #[tokio::test]
    async fn transport_failure_is_network_error() {
        let transport =
            ScriptedTransport::new().fail(TransportError::Connect("connection refused".into()));
        let err = request_token(&transport, "https://auth.test/token", &key(), &secret())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Network(TransportError::Connect(_))));
        assert_eq!(transport.calls(), 1);
    }
}
