//! HTTP client for the unified payment gateway

use crate::poller::{self, OrderStatusSource, PollConfig};
use crate::signer::{self, Credentials};
use crate::types::*;
use crate::{PayError, Result};
use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const PAY_PATH: &str = "/api/v2/payment/pay";
const QUERY_PATH: &str = "/api/v2/payment/query";
const ORDERS_PATH: &str = "/api/v2/payment/orders";
const CANCEL_PATH: &str = "/api/v2/payment/cancel";
const REFUND_PATH: &str = "/api/v2/payment/refund";

/// Characters escaped when an order number is placed in a path segment
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Gateway base URL, e.g. `https://pay.example.com`
    pub base_url: String,
    pub app_id: String,
    pub app_secret: String,
    /// Request timeout
    pub timeout: Duration,
    /// Pre-built HTTP client; replaces the one built from `timeout`
    pub http_client: Option<Client>,
}

impl ClientConfig {
    /// Create a new client config
    pub fn new(
        base_url: impl Into<String>,
        app_id: impl Into<String>,
        app_secret: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            app_id: app_id.into(),
            app_secret: app_secret.into(),
            timeout: DEFAULT_TIMEOUT,
            http_client: None,
        }
    }

    /// Load configuration from environment variables
    ///
    /// Reads `PAYUNIFY_BASE_URL`, `PAYUNIFY_APP_ID`, `PAYUNIFY_APP_SECRET`
    /// and the optional `PAYUNIFY_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::new(String::new(), String::new(), String::new());

        if let Ok(base_url) = std::env::var("PAYUNIFY_BASE_URL") {
            config.base_url = base_url;
        }

        if let Ok(app_id) = std::env::var("PAYUNIFY_APP_ID") {
            config.app_id = app_id;
        }

        if let Ok(app_secret) = std::env::var("PAYUNIFY_APP_SECRET") {
            config.app_secret = app_secret;
        }

        if let Ok(timeout) = std::env::var("PAYUNIFY_TIMEOUT_SECS") {
            let secs: u64 = timeout
                .parse()
                .map_err(|e| PayError::config(format!("Invalid PAYUNIFY_TIMEOUT_SECS: {}", e)))?;
            config.timeout = Duration::from_secs(secs);
        }

        config.validate()?;
        Ok(config)
    }

    /// Set the request timeout; zero keeps the default
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        if !timeout.is_zero() {
            self.timeout = timeout;
        }
        self
    }

    /// Use a caller-supplied HTTP client
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.base_url.is_empty() {
            return Err(PayError::config("Base URL cannot be empty"));
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(PayError::config(
                "Base URL must start with http:// or https://",
            ));
        }

        url::Url::parse(&self.base_url)
            .map_err(|e| PayError::config(format!("Invalid base URL: {}", e)))?;

        if self.app_id.is_empty() {
            return Err(PayError::config("App id cannot be empty"));
        }

        if self.app_secret.is_empty() {
            return Err(PayError::config("App secret cannot be empty"));
        }

        Ok(())
    }
}

/// Payment gateway client.
///
/// Holds only immutable state, so one instance can serve concurrent calls.
#[derive(Debug, Clone)]
pub struct PaymentClient {
    base_url: String,
    credentials: Credentials,
    client: Client,
}

impl PaymentClient {
    /// Create a new payment client
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;

        let client = match config.http_client {
            Some(client) => client,
            None => Client::builder()
                .timeout(config.timeout)
                .build()
                .map_err(|e| PayError::config(format!("Failed to create HTTP client: {}", e)))?,
        };

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            credentials: Credentials::new(config.app_id, config.app_secret),
            client,
        })
    }

    /// Gateway base URL without a trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn app_id(&self) -> &str {
        self.credentials.app_id()
    }

    /// Create a payment order
    ///
    /// A success envelope without `data` yields [`PayError::MissingData`]
    /// rather than an empty payload.
    pub async fn create_payment(&self, request: &PaymentRequest) -> Result<PaymentData> {
        let body = serde_json::to_vec(request)?;
        let builder = self
            .client
            .post(self.url(PAY_PATH))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body);

        self.dispatch::<PaymentData>(builder, "create payment")
            .await?
            .into_result("create payment")
    }

    /// Query the current state of an order
    ///
    /// Fails with [`PayError::MissingData`] when the gateway reports success
    /// but sends no order.
    pub async fn query_order(&self, order_no: &str) -> Result<OrderStatusData> {
        let builder = self.client.get(self.order_url(QUERY_PATH, order_no));

        self.dispatch::<OrderStatusData>(builder, "query order")
            .await?
            .into_result("query order")
    }

    /// List orders matching the given filters
    pub async fn list_orders(&self, request: &OrderListRequest) -> Result<OrderListResponse> {
        let builder = self
            .client
            .get(self.url(ORDERS_PATH))
            .query(&request.query_pairs());

        self.dispatch::<OrderListResponse>(builder, "list orders")
            .await?
            .into_result("list orders")
    }

    /// Cancel an unpaid order
    pub async fn cancel_order(&self, order_no: &str, reason: Option<&str>) -> Result<()> {
        let body = CancelRequest {
            cancel_reason: reason.filter(|r| !r.is_empty()),
        };
        let builder = self
            .client
            .post(self.order_url(CANCEL_PATH, order_no))
            .json(&body);

        let response = self.dispatch::<Value>(builder, "cancel order").await?;
        if !response.is_success() {
            return Err(PayError::api(response.code, response.message));
        }
        Ok(())
    }

    /// Request a refund
    pub async fn refund_order(&self, request: &RefundRequest) -> Result<RefundResponse> {
        let builder = self.client.post(self.url(REFUND_PATH)).json(request);

        self.dispatch::<RefundResponse>(builder, "refund order")
            .await?
            .into_result("refund order")
    }

    /// Poll an order until it is paid, closed, or the retry budget is spent
    pub async fn poll_order_status(
        &self,
        order_no: &str,
        config: &PollConfig,
    ) -> Result<OrderStatusData> {
        poller::poll_order_status(self, order_no, config).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn order_url(&self, path: &str, order_no: &str) -> String {
        format!(
            "{}{}/{}",
            self.base_url,
            path,
            utf8_percent_encode(order_no, PATH_SEGMENT)
        )
    }

    /// Sign, send and decode one request.
    ///
    /// The envelope is returned as-is; callers decide how to treat its code.
    async fn dispatch<T>(&self, builder: RequestBuilder, operation: &str) -> Result<ApiResponse<T>>
    where
        T: DeserializeOwned,
    {
        let headers = signer::auth_headers(&self.credentials)?;
        debug!(operation, nonce = %headers.nonce, "sending gateway request");

        let response = headers.apply(builder).send().await?;
        let status = response.status();
        let body = response.text().await?;

        let envelope: ApiResponse<T> = serde_json::from_str(&body).map_err(|source| {
            warn!(operation, http_status = %status, "undecodable gateway response");
            PayError::Decode { source, body }
        })?;

        if !envelope.is_success() {
            warn!(
                operation,
                code = envelope.code,
                message = %envelope.message,
                "gateway rejected request"
            );
        }

        Ok(envelope)
    }
}

#[async_trait]
impl OrderStatusSource for PaymentClient {
    async fn query_status(&self, order_no: &str) -> Result<OrderStatusData> {
        self.query_order(order_no).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ClientConfig {
        ClientConfig::new("https://pay.example.com/", "demo-app", "test-secret")
    }

    #[test]
    fn test_client_creation() {
        let client = PaymentClient::new(config()).unwrap();
        assert_eq!(client.base_url(), "https://pay.example.com");
        assert_eq!(client.app_id(), "demo-app");
    }

    #[test]
    fn test_config_validation() {
        assert!(config().validate().is_ok());

        let missing_url = ClientConfig::new("", "demo-app", "test-secret");
        assert!(matches!(missing_url.validate(), Err(PayError::Config { .. })));

        let bad_scheme = ClientConfig::new("ftp://pay.example.com", "demo-app", "test-secret");
        assert!(bad_scheme.validate().is_err());

        let missing_secret = ClientConfig::new("https://pay.example.com", "demo-app", "");
        assert!(PaymentClient::new(missing_secret).is_err());
    }

    #[test]
    fn test_config_timeout() {
        assert_eq!(config().timeout, DEFAULT_TIMEOUT);
        assert_eq!(config().with_timeout(Duration::ZERO).timeout, DEFAULT_TIMEOUT);
        assert_eq!(
            config().with_timeout(Duration::from_secs(3)).timeout,
            Duration::from_secs(3)
        );
    }

    #[test]
    fn test_order_url_escapes_segment() {
        let client = PaymentClient::new(config()).unwrap();
        assert_eq!(
            client.order_url(QUERY_PATH, "P-001_a"),
            "https://pay.example.com/api/v2/payment/query/P-001_a"
        );
        assert_eq!(
            client.order_url(CANCEL_PATH, "a/b c"),
            "https://pay.example.com/api/v2/payment/cancel/a%2Fb%20c"
        );
    }
}
