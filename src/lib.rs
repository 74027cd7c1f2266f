//! # payunify - unified payment gateway SDK
//!
//! A Rust client for the unified payment gateway. It signs every request
//! with HMAC-SHA256, wraps the payment, order and refund endpoints, and
//! polls orders until the payer completes (or abandons) the payment.
//!
//! ```no_run
//! use payunify::{ClientConfig, PayWay, PaymentClient, PaymentRequest, PollConfig};
//!
//! # async fn run() -> payunify::Result<()> {
//! let client = PaymentClient::new(ClientConfig::new(
//!     "https://pay.example.com",
//!     "your-app-id",
//!     "your-app-secret",
//! ))?;
//!
//! let payment = client
//!     .create_payment(&PaymentRequest::new("VIP monthly", 0.01, PayWay::Alipay))
//!     .await?;
//! let paid = client
//!     .poll_order_status(&payment.order_no, &PollConfig::default())
//!     .await?;
//! println!("paid via {}", paid.pay_way);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod poller;
pub mod signer;
pub mod types;

// Re-exports for convenience
pub use client::{ClientConfig, PaymentClient};
pub use error::{PayError, Result};
pub use poller::{poll_order_status, OrderStatusSource, PollConfig};
pub use signer::{sign, Credentials, SignedRequestContext};
pub use types::*;

/// Current version of the payunify library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_constant() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_pay_way_wire_names() {
        assert_eq!(PayWay::Alipay.as_str(), "alipay");
        assert_eq!(PayWay::Wechat.to_string(), "wechat");
        assert_eq!(
            serde_json::to_value(PayWay::Paypal).unwrap(),
            serde_json::json!("paypal")
        );
    }

    #[test]
    fn test_status_text() {
        assert_eq!(OrderStatus::NotPaid.text(), "not paid");
        assert_eq!(OrderStatus::PaidSuccess.text(), "paid");
        assert_eq!(OrderStatus::Closed.text(), "closed");
        assert_eq!(OrderStatus::from(42).text(), "unknown");
    }
}
