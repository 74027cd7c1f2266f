//! End-to-end payment flow against a running gateway
//!
//! Configure with `PAYUNIFY_BASE_URL`, `PAYUNIFY_APP_ID` and
//! `PAYUNIFY_APP_SECRET`, then run `cargo run --example payment_flow`.

use payunify::{
    ClientConfig, OrderListRequest, PayError, PayWay, PaymentClient, PaymentRequest, PollConfig,
};
use serde_json::json;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const MAX_RETRIES: i64 = 12;

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let client = PaymentClient::new(ClientConfig::from_env()?)?;

    println!("Creating Alipay order...");
    let request = PaymentRequest::new("VIP monthly", 0.01, PayWay::Alipay)
        .with_order_type("vip")
        .with_user_id("user_12345")
        .with_extra(&json!({ "productId": "vip_001", "period": "30days" }));
    let payment = client.create_payment(&request).await?;
    println!("  order:  {}", payment.order_no);
    println!("  amount: {:.2}", payment.amount);
    println!("  pay at: {}", payment.pay_url);

    let order = client.query_order(&payment.order_no).await?;
    println!("Current status: {}", order.status);

    println!("Waiting for payment...");
    let config = PollConfig::new(Duration::from_secs(5), MAX_RETRIES)
        .on_check(|attempt, status| {
            println!("  [{}/{}] {}", attempt, MAX_RETRIES, status.status.text());
        })
        .on_error(|attempt, err| {
            println!("  [{}/{}] query failed: {}", attempt, MAX_RETRIES, err);
        });

    match client.poll_order_status(&payment.order_no, &config).await {
        Ok(paid) => {
            println!("Paid! trade no {}", paid.trade_no);
            if let Some(paid_at) = paid.paid_at() {
                println!("  at {}", paid_at.format("%Y-%m-%d %H:%M:%S"));
            }
        }
        Err(PayError::OrderClosed { status }) => {
            println!("Order {} was closed", status.order_no);
        }
        Err(PayError::PollTimeout { .. }) => {
            println!("Payer did not finish in time, cancelling");
            client
                .cancel_order(&payment.order_no, Some("payment timed out"))
                .await?;
        }
        Err(err) => return Err(err.into()),
    }

    let page = client
        .list_orders(&OrderListRequest::new().with_user_id("user_12345").with_page(1, 5))
        .await?;
    println!("{} orders for user_12345:", page.total);
    for (i, order) in page.list.iter().enumerate() {
        println!(
            "  {}. {} | {:.2} | {}",
            i + 1,
            order.order_no,
            order.amount,
            order.status.text()
        );
    }

    Ok(())
}
