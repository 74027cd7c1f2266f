//! Error handling tests for payunify

use payunify::{OrderStatus, OrderStatusData, PayError};

#[test]
fn test_api_error() {
    let error = PayError::api(400, "amount must be positive");

    let error_msg = error.to_string();
    assert!(
        error_msg.contains("code=400"),
        "Error message MUST contain the gateway code - actual: {}",
        error_msg
    );
    assert!(
        error_msg.contains("amount must be positive"),
        "Error message MUST contain the gateway message - actual: {}",
        error_msg
    );
    assert!(!error.is_retryable());
    assert!(PayError::api(503, "maintenance").is_retryable());
}

#[test]
fn test_poll_timeout_error() {
    let error = PayError::PollTimeout { max_retries: 12 };

    let error_msg = error.to_string();
    assert!(
        error_msg.contains("timed out") && error_msg.contains("12"),
        "Error message MUST mention the timeout and attempt count - actual: {}",
        error_msg
    );
    assert!(error.closed_status().is_none());
}

#[test]
fn test_order_closed_error() {
    let error = PayError::OrderClosed {
        status: Box::new(OrderStatusData {
            order_no: "P20240101".to_string(),
            status: OrderStatus::Closed,
            ..Default::default()
        }),
    };

    let error_msg = error.to_string();
    assert!(
        error_msg.contains("P20240101") && error_msg.contains("closed"),
        "Error message MUST name the closed order - actual: {}",
        error_msg
    );
    assert!(!error.is_retryable());
    assert_eq!(error.closed_status().unwrap().status, OrderStatus::Closed);
}

#[test]
fn test_decode_error_keeps_body() {
    let source = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
    let error = PayError::Decode {
        source,
        body: "not json".to_string(),
    };

    let error_msg = error.to_string();
    assert!(
        error_msg.contains("Failed to decode response") && error_msg.contains("body: not json"),
        "Error message MUST contain the raw body - actual: {}",
        error_msg
    );
    assert!(std::error::Error::source(&error).is_some());
}

#[test]
fn test_config_error() {
    let error = PayError::config("Base URL cannot be empty");

    let error_msg = error.to_string();
    assert!(
        error_msg.contains("Configuration error"),
        "Error message MUST contain 'Configuration error' - actual: {}",
        error_msg
    );
    assert!(
        error_msg.contains("Base URL cannot be empty"),
        "Error message MUST contain the specific reason - actual: {}",
        error_msg
    );
}

#[test]
fn test_missing_data_error() {
    let error = PayError::missing_data("query order");

    assert_eq!(error.to_string(), "Response to query order carried no data");
}

#[test]
fn test_json_error_conversion() {
    let json_error = serde_json::from_str::<OrderStatusData>("{").unwrap_err();
    let error: PayError = json_error.into();

    assert!(matches!(error, PayError::Json(_)));
    assert!(error.to_string().starts_with("JSON error"));
}
