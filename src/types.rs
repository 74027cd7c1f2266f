//! Request and response payloads for the payment gateway

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// Decode `null` the same as a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Envelope code the gateway uses for success
pub const SUCCESS_CODE: i64 = 200;

/// Supported payment channels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayWay {
    Alipay,
    Wechat,
    Paypal,
}

impl PayWay {
    /// Get the wire identifier for this channel
    pub fn as_str(&self) -> &'static str {
        match self {
            PayWay::Alipay => "alipay",
            PayWay::Wechat => "wechat",
            PayWay::Paypal => "paypal",
        }
    }
}

impl fmt::Display for PayWay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order status as reported by the gateway.
///
/// Codes the SDK does not know about land in [`OrderStatus::Unknown`] so a
/// newly introduced gateway status never fails decoding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum OrderStatus {
    /// Created, waiting for the payer
    #[default]
    NotPaid,
    /// Paid
    PaidSuccess,
    /// Closed or cancelled
    Closed,
    /// Any other code
    Unknown(i64),
}

impl OrderStatus {
    pub const NOT_PAID_CODE: i64 = 1;
    pub const PAID_SUCCESS_CODE: i64 = 2;
    pub const CLOSED_CODE: i64 = 201;

    /// The integer code used on the wire
    pub fn code(&self) -> i64 {
        match self {
            OrderStatus::NotPaid => Self::NOT_PAID_CODE,
            OrderStatus::PaidSuccess => Self::PAID_SUCCESS_CODE,
            OrderStatus::Closed => Self::CLOSED_CODE,
            OrderStatus::Unknown(code) => *code,
        }
    }

    /// Human-readable label
    pub fn text(&self) -> &'static str {
        match self {
            OrderStatus::NotPaid => "not paid",
            OrderStatus::PaidSuccess => "paid",
            OrderStatus::Closed => "closed",
            OrderStatus::Unknown(_) => "unknown",
        }
    }

    /// Whether polling stops on this status
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::PaidSuccess | OrderStatus::Closed)
    }
}

impl From<i64> for OrderStatus {
    fn from(code: i64) -> Self {
        match code {
            Self::NOT_PAID_CODE => OrderStatus::NotPaid,
            Self::PAID_SUCCESS_CODE => OrderStatus::PaidSuccess,
            Self::CLOSED_CODE => OrderStatus::Closed,
            other => OrderStatus::Unknown(other),
        }
    }
}

impl From<OrderStatus> for i64 {
    fn from(status: OrderStatus) -> Self {
        status.code()
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.text(), self.code())
    }
}

/// Payment creation request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    /// Order subject / product name
    pub subject: String,
    /// Amount in major currency units
    pub amount: f64,
    /// Payment channel
    pub pay_way: PayWay,
    /// Merchant-defined order type
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_type: Option<String>,
    /// Merchant user id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Opaque JSON string echoed back on the order
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra: Option<String>,
    /// Currency code (PayPal, defaults to USD on the gateway)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    /// Brand name shown on the PayPal checkout page
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand_name: Option<String>,
    /// Return URL when the payer cancels on PayPal
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancel_url: Option<String>,
}

impl PaymentRequest {
    /// Create a new payment request
    pub fn new(subject: impl Into<String>, amount: f64, pay_way: PayWay) -> Self {
        Self {
            subject: subject.into(),
            amount,
            pay_way,
            order_type: None,
            user_id: None,
            extra: None,
            currency: None,
            brand_name: None,
            cancel_url: None,
        }
    }

    pub fn with_order_type(mut self, order_type: impl Into<String>) -> Self {
        self.order_type = Some(order_type.into());
        self
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Attach merchant data; the gateway stores it as an opaque string
    pub fn with_extra(mut self, extra: &Value) -> Self {
        self.extra = Some(extra.to_string());
        self
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = Some(currency.into());
        self
    }

    pub fn with_brand_name(mut self, brand_name: impl Into<String>) -> Self {
        self.brand_name = Some(brand_name.into());
        self
    }

    pub fn with_cancel_url(mut self, cancel_url: impl Into<String>) -> Self {
        self.cancel_url = Some(cancel_url.into());
        self
    }
}

/// Result of a payment creation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PaymentData {
    /// Checkout link or QR code content
    #[serde(deserialize_with = "null_as_default")]
    pub pay_url: String,
    #[serde(deserialize_with = "null_as_default")]
    pub pay_way: String,
    #[serde(deserialize_with = "null_as_default")]
    pub amount: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub order_no: String,
    /// PayPal order id (PayPal only)
    #[serde(deserialize_with = "null_as_default")]
    pub order_id: String,
    /// Currency code (PayPal only)
    #[serde(deserialize_with = "null_as_default")]
    pub currency: String,
}

/// Order details returned by query and list calls
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrderStatusData {
    #[serde(deserialize_with = "null_as_default")]
    pub order_no: String,
    #[serde(deserialize_with = "null_as_default")]
    pub subject: String,
    #[serde(deserialize_with = "null_as_default")]
    pub amount: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub status: OrderStatus,
    #[serde(deserialize_with = "null_as_default")]
    pub pay_way: String,
    /// Trade number assigned by the payment channel
    #[serde(deserialize_with = "null_as_default")]
    pub trade_no: String,
    /// Unix seconds, zero until paid
    #[serde(deserialize_with = "null_as_default")]
    pub pay_time: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub order_type: String,
    #[serde(deserialize_with = "null_as_default")]
    pub user_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub extra: String,
    #[serde(deserialize_with = "null_as_default")]
    pub created_at: String,
    #[serde(deserialize_with = "null_as_default")]
    pub updated_at: String,
}

impl OrderStatusData {
    pub fn is_payment_success(&self) -> bool {
        self.status == OrderStatus::PaidSuccess
    }

    pub fn is_closed(&self) -> bool {
        self.status == OrderStatus::Closed
    }

    pub fn is_pending(&self) -> bool {
        self.status == OrderStatus::NotPaid
    }

    /// Payment time, if the order has been paid
    pub fn paid_at(&self) -> Option<DateTime<Utc>> {
        if self.pay_time <= 0 {
            return None;
        }
        DateTime::from_timestamp(self.pay_time, 0)
    }
}

/// Filters for the order list endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderListRequest {
    pub user_id: Option<String>,
    pub status: Option<String>,
    pub pay_way: Option<String>,
    pub page: u32,
    pub page_size: u32,
}

impl OrderListRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn with_pay_way(mut self, pay_way: impl Into<String>) -> Self {
        self.pay_way = Some(pay_way.into());
        self
    }

    pub fn with_page(mut self, page: u32, page_size: u32) -> Self {
        self.page = page;
        self.page_size = page_size;
        self
    }

    /// Query-string pairs; empty filters and zero paging values are left out
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        let filters = [
            ("userId", &self.user_id),
            ("status", &self.status),
            ("payWay", &self.pay_way),
        ];
        for (key, value) in filters {
            if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
                pairs.push((key, value.to_string()));
            }
        }
        if self.page > 0 {
            pairs.push(("page", self.page.to_string()));
        }
        if self.page_size > 0 {
            pairs.push(("pageSize", self.page_size.to_string()));
        }
        pairs
    }
}

/// One page of orders
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrderListResponse {
    #[serde(deserialize_with = "null_as_default")]
    pub list: Vec<OrderStatusData>,
    #[serde(deserialize_with = "null_as_default")]
    pub total: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub page: u32,
    #[serde(deserialize_with = "null_as_default")]
    pub page_size: u32,
}

/// Body of the cancel endpoint
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CancelRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancel_reason: Option<&'a str>,
}

/// Refund request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundRequest {
    /// Merchant order number
    pub out_trade_no: String,
    /// Amount to refund in major currency units
    pub refund_amount: f64,
    pub refund_reason: String,
}

impl RefundRequest {
    pub fn new(
        out_trade_no: impl Into<String>,
        refund_amount: f64,
        refund_reason: impl Into<String>,
    ) -> Self {
        Self {
            out_trade_no: out_trade_no.into(),
            refund_amount,
            refund_reason: refund_reason.into(),
        }
    }
}

/// Refund outcome
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RefundResponse {
    #[serde(deserialize_with = "null_as_default")]
    pub message: String,
    #[serde(deserialize_with = "null_as_default")]
    pub order_no: String,
    #[serde(deserialize_with = "null_as_default")]
    pub pay_way: String,
    #[serde(deserialize_with = "null_as_default")]
    pub trade_no: String,
    #[serde(deserialize_with = "null_as_default")]
    pub refund_amount: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub refund_request_no: String,
    /// Channel-specific refund details
    pub result: Option<Value>,
}

/// Envelope wrapping every gateway response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default = "Option::default")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn is_success(&self) -> bool {
        self.code == SUCCESS_CODE
    }

    /// Turn the envelope into its payload, surfacing gateway failures
    pub fn into_result(self, operation: &str) -> crate::Result<T> {
        if !self.is_success() {
            return Err(crate::PayError::api(self.code, self.message));
        }
        self.data
            .ok_or_else(|| crate::PayError::missing_data(operation))
    }
}
