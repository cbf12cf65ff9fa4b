//! `Mpesa` client facade

use std::sync::Arc;

use mpesa_auth::CredentialManager;
use mpesa_client::Executor;
use mpesa_transport::{HttpTransport, Transport};
use reqwest::Url;
use tracing::info;

use crate::config::{ConsumerCredentials, MpesaConfig};
use crate::dto::account::{AccountBalanceRequest, AccountBalanceResponse};
use crate::dto::b2c::{B2cPaymentRequest, B2cPaymentResponse};
use crate::dto::c2b::{
    C2bPaymentRequest, C2bPaymentResponse, C2bRegisterRequest, C2bRegisterResponse,
    C2bSimulatePaymentRequest, C2bSimulatePaymentResponse,
};
use crate::dto::stk_push::{StkPushRequest, StkPushResponse};
use crate::dto::transaction::{
    TransactionReversalRequest, TransactionReversalResponse, TransactionStatusRequest,
    TransactionStatusResponse,
};
use crate::error::{MpesaError, Result};
use crate::service::{Operation, call};
use crate::validation::require_non_empty;

/// Entry point for all M-Pesa operations.
///
/// One instance owns one credential cache; share it behind an `Arc` rather
/// than building several for the same consumer key.
pub struct Mpesa {
    config: MpesaConfig,
    executor: Executor,
}

impl Mpesa {
    /// Validate `config` and build the reqwest transport from its timeouts.
    pub fn new(credentials: ConsumerCredentials, config: MpesaConfig) -> Result<Self> {
        config.validate()?;
        let transport = HttpTransport::new(&config.transport_config()).map_err(|e| {
            MpesaError::Network {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(e),
            }
        })?;
        Ok(Self::with_transport(credentials, config, Arc::new(transport)))
    }

    /// Sandbox defaults.
    pub fn with_defaults(credentials: ConsumerCredentials) -> Result<Self> {
        Self::new(credentials, MpesaConfig::default())
    }

    /// Use a caller-supplied transport for both token and resource calls.
    pub fn with_transport(
        credentials: ConsumerCredentials,
        config: MpesaConfig,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let ConsumerCredentials {
            consumer_key,
            consumer_secret,
        } = credentials;
        let manager = Arc::new(CredentialManager::new(
            config.token_url(),
            consumer_key,
            consumer_secret,
            Arc::clone(&transport),
        ));
        let executor = Executor::new(manager, transport, config.retry_policy());
        info!(
            environment = ?config.environment,
            max_retries = executor.policy().max_retries(),
            "mpesa client ready"
        );
        Self { config, executor }
    }

    pub fn config(&self) -> &MpesaConfig {
        &self.config
    }

    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    /// Force a token refresh to check the consumer credentials.
    pub async fn test_auth(&self) -> Result<()> {
        self.executor
            .credentials()
            .refresh()
            .await
            .map_err(|e| MpesaError::from(mpesa_client::Error::from(e)))
    }

    pub async fn check_account_balance(
        &self,
        request: &AccountBalanceRequest,
    ) -> Result<AccountBalanceResponse> {
        self.run(Operation::AccountBalance, request).await
    }

    pub async fn initiate_b2c_payment(
        &self,
        request: &B2cPaymentRequest,
    ) -> Result<B2cPaymentResponse> {
        self.run(Operation::B2cPayment, request).await
    }

    /// Register confirmation and validation URLs for a short code.
    pub async fn register_c2b(
        &self,
        request: &C2bRegisterRequest,
        api_key: &str,
    ) -> Result<C2bRegisterResponse> {
        let api_key = require_non_empty(Some(api_key), "apikey")?;
        let endpoint = self.config.endpoint_url(Operation::C2bRegister.endpoint());
        let mut url = Url::parse(&endpoint).map_err(|e| {
            mpesa_common::Error::Config(format!("c2b_register_url is not a valid URL: {e}"))
        })?;
        url.query_pairs_mut().append_pair("apikey", api_key);
        call(&self.executor, Operation::C2bRegister, url.as_str(), request).await
    }

    pub async fn initiate_c2b_payment(
        &self,
        request: &C2bPaymentRequest,
    ) -> Result<C2bPaymentResponse> {
        self.run(Operation::C2bPayment, request).await
    }

    pub async fn simulate_c2b_payment(
        &self,
        request: &C2bSimulatePaymentRequest,
    ) -> Result<C2bSimulatePaymentResponse> {
        self.run(Operation::C2bSimulate, request).await
    }

    pub async fn request_stk_push(&self, request: &StkPushRequest) -> Result<StkPushResponse> {
        self.run(Operation::StkPush, request).await
    }

    pub async fn check_transaction_status(
        &self,
        request: &TransactionStatusRequest,
    ) -> Result<TransactionStatusResponse> {
        self.run(Operation::TransactionStatus, request).await
    }

    pub async fn reverse_transaction(
        &self,
        request: &TransactionReversalRequest,
    ) -> Result<TransactionReversalResponse> {
        self.run(Operation::TransactionReversal, request).await
    }

    async fn run<Req, Resp>(&self, operation: Operation, request: &Req) -> Result<Resp>
    where
        Req: serde::Serialize,
        Resp: serde::de::DeserializeOwned,
    {
        let url = self.config.endpoint_url(operation.endpoint());
        call(&self.executor, operation, &url, request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Endpoint, EndpointOverrides};
    use crate::dto::b2c::B2cCommand;
    use crate::dto::c2b::ResponseType;
    use crate::error::ErrorCode;
    use mockito::{Matcher, Mock, ServerGuard};

    const TOKEN_BODY: &str = r#"{"access_token":"at_1","token_type":"Bearer","expires_in":"3599"}"#;

    fn config_for(server: &ServerGuard) -> MpesaConfig {
        let base = server.url();
        let url = |endpoint: Endpoint| Some(format!("{base}{}", endpoint.path()));
        MpesaConfig {
            auth_url: Some(format!(
                "{base}/v1/token/generate?grant_type=client_credentials"
            )),
            endpoints: EndpointOverrides {
                c2b_register_url: url(Endpoint::C2bRegister),
                c2b_payment_url: url(Endpoint::C2bPayment),
                c2b_simulate_payment_url: url(Endpoint::C2bSimulate),
                stk_push_url: url(Endpoint::StkPush),
                b2c_payment_url: url(Endpoint::B2cPayment),
                transaction_status_url: url(Endpoint::TransactionStatus),
                transaction_reversal_url: url(Endpoint::TransactionReversal),
                account_balance_url: url(Endpoint::AccountBalance),
            },
            retry_backoff_ms: 1,
            max_retries: 1,
            ..MpesaConfig::default()
        }
    }

    fn client(server: &ServerGuard) -> Mpesa {
        Mpesa::new(
            ConsumerCredentials::new("consumer-key", "consumer-secret"),
            config_for(server),
        )
        .unwrap()
    }

    async fn token_mock(server: &mut ServerGuard, hits: usize) -> Mock {
        server
            .mock("GET", "/v1/token/generate")
            .match_query(Matcher::UrlEncoded(
                "grant_type".into(),
                "client_credentials".into(),
            ))
            .match_header(
                "authorization",
                "Basic Y29uc3VtZXIta2V5OmNvbnN1bWVyLXNlY3JldA==",
            )
            .with_status(200)
            .with_body(TOKEN_BODY)
            .expect(hits)
            .create_async()
            .await
    }

    fn register_request() -> C2bRegisterRequest {
        C2bRegisterRequest::builder()
            .short_code("101010")
            .response_type(ResponseType::Completed)
            .confirmation_url("https://example.com/confirm")
            .validation_url("https://example.com/validate")
            .build()
            .unwrap()
    }

    fn simulate_request() -> C2bSimulatePaymentRequest {
        C2bSimulatePaymentRequest::builder()
            .amount("10")
            .msisdn("251745628580")
            .short_code("443443")
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn register_sends_api_key_and_parses_header() {
        let mut server = mockito::Server::new_async().await;
        let token = token_mock(&mut server, 1).await;
        let register = server
            .mock("POST", Endpoint::C2bRegister.path())
            .match_query(Matcher::UrlEncoded("apikey".into(), "key-1".into()))
            .match_header("authorization", "Bearer at_1")
            .match_body(Matcher::PartialJsonString(
                r#"{"CommandID":"RegisterURL","ShortCode":"101010"}"#.into(),
            ))
            .with_status(200)
            .with_body(r#"{"header":{"responseCode":"0","responseMessage":"Request processed successfully"}}"#)
            .create_async()
            .await;

        let response = client(&server)
            .register_c2b(&register_request(), "key-1")
            .await
            .unwrap();

        token.assert_async().await;
        register.assert_async().await;
        assert!(response.is_successful());
    }

    #[tokio::test]
    async fn register_duplicate_short_code_is_classified() {
        let mut server = mockito::Server::new_async().await;
        let _token = token_mock(&mut server, 1).await;
        let _register = server
            .mock("POST", Endpoint::C2bRegister.path())
            .match_query(Matcher::Any)
            .with_status(400)
            .with_body(r#"{"errorMessage":"Short Code already Registered"}"#)
            .create_async()
            .await;

        let err = client(&server)
            .register_c2b(&register_request(), "key-1")
            .await
            .unwrap_err();

        assert_eq!(err.code(), Some(ErrorCode::ShortCodeRegistered));
        match err {
            MpesaError::UnexpectedResponse {
                status,
                error_response,
                ..
            } => {
                assert_eq!(status, Some(400));
                assert_eq!(
                    error_response.and_then(|r| r.error_message).as_deref(),
                    Some("Short Code already Registered")
                );
            }
            other => panic!("expected UnexpectedResponse, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn register_rejects_blank_api_key_before_any_call() {
        let mut server = mockito::Server::new_async().await;
        let token = token_mock(&mut server, 0).await;

        let err = client(&server)
            .register_c2b(&register_request(), " ")
            .await
            .unwrap_err();

        assert!(matches!(err, MpesaError::InvalidRequest(m) if m.contains("apikey")));
        token.assert_async().await;
    }

    #[tokio::test]
    async fn c2b_payment_invalid_initiator() {
        let mut server = mockito::Server::new_async().await;
        let _token = token_mock(&mut server, 1).await;
        let _payment = server
            .mock("POST", Endpoint::C2bPayment.path())
            .with_status(400)
            .with_body("The initiator information is invalid.")
            .create_async()
            .await;

        let request = C2bPaymentRequest::builder()
            .remark("Pay bill")
            .channel_session_id("10100000037656400042")
            .source_system("USSD")
            .add_parameter("Amount", "500")
            .initiator("251799100026", "c2VjcmV0", "key-123")
            .primary_party("251799100026")
            .receiver_party("101010", "101010")
            .build()
            .unwrap();
        let err = client(&server)
            .initiate_c2b_payment(&request)
            .await
            .unwrap_err();

        assert_eq!(err.code(), Some(ErrorCode::InvalidInitiator));
    }

    #[tokio::test]
    async fn simulate_invalid_and_unknown_rejections() {
        let mut server = mockito::Server::new_async().await;
        let _token = token_mock(&mut server, 1).await;
        let invalid = server
            .mock("POST", Endpoint::C2bSimulate.path())
            .with_status(400)
            .with_body("Msisdn is invalid")
            .create_async()
            .await;

        let mpesa = client(&server);
        let err = mpesa
            .simulate_c2b_payment(&simulate_request())
            .await
            .unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::InvalidRequest));
        invalid.assert_async().await;
        invalid.remove_async().await;

        let _unknown = server
            .mock("POST", Endpoint::C2bSimulate.path())
            .with_status(404)
            .with_body("no such resource")
            .create_async()
            .await;
        let err = mpesa
            .simulate_c2b_payment(&simulate_request())
            .await
            .unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::UnknownError));
        assert_eq!(err.body(), Some("no such resource"));
    }

    #[tokio::test]
    async fn unparseable_success_body_is_invalid_response() {
        let mut server = mockito::Server::new_async().await;
        let _token = token_mock(&mut server, 1).await;
        let _stk = server
            .mock("POST", Endpoint::StkPush.path())
            .with_status(200)
            .with_body("<html>gateway page</html>")
            .create_async()
            .await;

        let request = StkPushRequest::builder()
            .business_short_code("1020")
            .password("c2VjcmV0")
            .amount("20")
            .party_a("251700404789")
            .party_b("554433")
            .phone_number("251700404789")
            .callback_url("https://example.com/stk")
            .account_reference("INV-1")
            .transaction_desc("Payment")
            .build()
            .unwrap();
        let err = client(&server)
            .request_stk_push(&request)
            .await
            .unwrap_err();

        assert_eq!(err.code(), Some(ErrorCode::InvalidResponse));
        assert_eq!(err.body(), Some("<html>gateway page</html>"));
    }

    #[tokio::test]
    async fn b2c_payment_success_reuses_cached_token() {
        let mut server = mockito::Server::new_async().await;
        let token = token_mock(&mut server, 1).await;
        let b2c = server
            .mock("POST", Endpoint::B2cPayment.path())
            .match_header("authorization", "Bearer at_1")
            .match_body(Matcher::PartialJsonString(
                r#"{"CommandID":"BusinessPayment","Occassion":"Disbursement"}"#.into(),
            ))
            .with_status(200)
            .with_body(
                r#"{"ConversationID":"AG_1","OriginatorConversationID":"o-1","ResponseCode":"0","ResponseDescription":"Accept the service request successfully."}"#,
            )
            .expect(2)
            .create_async()
            .await;

        let request = B2cPaymentRequest::builder()
            .initiator_name("testapi")
            .security_credential("c2VjcmV0")
            .occasion("Disbursement")
            .command_id(B2cCommand::BusinessPayment)
            .party_a("101010")
            .party_b("251700100150")
            .remarks("Test B2C")
            .amount("12")
            .queue_timeout_url("https://example.com/b2c/timeout")
            .result_url("https://example.com/b2c/result")
            .build()
            .unwrap();

        let mpesa = client(&server);
        let first = mpesa.initiate_b2c_payment(&request).await.unwrap();
        let second = mpesa.initiate_b2c_payment(&request).await.unwrap();

        assert!(first.is_accepted());
        assert_eq!(second.conversation_id.as_deref(), Some("AG_1"));
        token.assert_async().await;
        b2c.assert_async().await;
    }

    #[tokio::test]
    async fn balance_and_transaction_queries_return_acknowledgements() {
        let mut server = mockito::Server::new_async().await;
        let _token = token_mock(&mut server, 1).await;
        let ack = r#"{"ConversationID":"AG_2","ResponseCode":"0"}"#;
        let mut mocks = Vec::new();
        for endpoint in [
            Endpoint::AccountBalance,
            Endpoint::TransactionStatus,
            Endpoint::TransactionReversal,
        ] {
            let mock = server
                .mock("POST", endpoint.path())
                .with_status(200)
                .with_body(ack)
                .create_async()
                .await;
            mocks.push(mock);
        }

        let mpesa = client(&server);
        let balance = AccountBalanceRequest::builder()
            .initiator("apitest")
            .security_credential("c2VjcmV0")
            .party_a("101010")
            .identifier_type("4")
            .queue_timeout_url("https://example.com/timeout")
            .result_url("https://example.com/result")
            .build()
            .unwrap();
        let status = TransactionStatusRequest::builder()
            .initiator("apitest")
            .security_credential("c2VjcmV0")
            .transaction_id("RAL0000001")
            .party_a("101010")
            .identifier_type("4")
            .result_url("https://example.com/result")
            .queue_timeout_url("https://example.com/timeout")
            .build()
            .unwrap();
        let reversal = TransactionReversalRequest::builder()
            .initiator("apitest")
            .security_credential("c2VjcmV0")
            .transaction_id("RAL0000001")
            .amount("100")
            .original_conversation_id("AG_1")
            .party_a("101010")
            .receiver_identifier_type("4")
            .receiver_party("101010")
            .remarks("Refund")
            .result_url("https://example.com/result")
            .queue_timeout_url("https://example.com/timeout")
            .build()
            .unwrap();

        assert!(mpesa.check_account_balance(&balance).await.unwrap().is_accepted());
        assert!(mpesa.check_transaction_status(&status).await.unwrap().is_accepted());
        assert!(mpesa.reverse_transaction(&reversal).await.unwrap().is_accepted());
        for mock in mocks {
            mock.assert_async().await;
        }
    }

    #[tokio::test]
    async fn test_auth_forces_refresh() {
        let mut server = mockito::Server::new_async().await;
        let token = token_mock(&mut server, 2).await;

        let mpesa = client(&server);
        mpesa.test_auth().await.unwrap();
        mpesa.test_auth().await.unwrap();

        token.assert_async().await;
    }

    #[tokio::test]
    async fn test_auth_surfaces_rejected_credentials() {
        let mut server = mockito::Server::new_async().await;
        let _token = server
            .mock("GET", "/v1/token/generate")
            .match_query(Matcher::Any)
            .with_status(401)
            .with_body(r#"{"errorMessage":"Invalid credentials"}"#)
            .create_async()
            .await;

        let err = client(&server).test_auth().await.unwrap_err();

        assert!(matches!(err, MpesaError::Authentication { .. }));
        assert_eq!(err.body(), Some(r#"{"errorMessage":"Invalid credentials"}"#));
    }

    #[test]
    fn new_rejects_invalid_config() {
        let config = MpesaConfig {
            max_retries: 0,
            ..MpesaConfig::default()
        };
        let err = Mpesa::new(ConsumerCredentials::new("k", "s"), config).err().unwrap();
        assert!(matches!(err, MpesaError::Config(_)));
    }
}
