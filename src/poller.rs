//! Polling for asynchronous payment completion.
//!
//! The poller waits one interval, queries the order, and repeats until the
//! order is paid, the order is closed, or the retry budget runs out. Query
//! failures inside the loop are reported through the error callback and
//! count as a consumed attempt; they never abort the loop.

use crate::types::{OrderStatus, OrderStatusData};
use crate::{PayError, Result};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Interval used when none (or zero) is configured
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Attempt budget used when none (or a non-positive count) is configured
pub const DEFAULT_MAX_RETRIES: u32 = 12;

/// Callback invoked with the attempt number and a non-terminal status
pub type CheckCallback = Arc<dyn Fn(u32, &OrderStatusData) + Send + Sync>;

/// Callback invoked with the attempt number and the query error
pub type ErrorCallback = Arc<dyn Fn(u32, &PayError) + Send + Sync>;

/// Anything that can report the current status of an order
#[async_trait]
pub trait OrderStatusSource: Send + Sync {
    async fn query_status(&self, order_no: &str) -> Result<OrderStatusData>;
}

/// Polling configuration.
///
/// Out-of-range values are coerced to the defaults when set, so a built
/// config is always valid.
#[derive(Clone)]
pub struct PollConfig {
    interval: Duration,
    max_retries: u32,
    on_check: Option<CheckCallback>,
    on_error: Option<ErrorCallback>,
}

impl fmt::Debug for PollConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PollConfig")
            .field("interval", &self.interval)
            .field("max_retries", &self.max_retries)
            .field("on_check", &self.on_check.as_ref().map(|_| "<function>"))
            .field("on_error", &self.on_error.as_ref().map(|_| "<function>"))
            .finish()
    }
}

impl PollConfig {
    /// Create a config; zero interval or non-positive retries fall back to defaults
    pub fn new(interval: Duration, max_retries: i64) -> Self {
        Self::default()
            .with_interval(interval)
            .with_max_retries(max_retries)
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = if interval.is_zero() {
            DEFAULT_POLL_INTERVAL
        } else {
            interval
        };
        self
    }

    pub fn with_max_retries(mut self, max_retries: i64) -> Self {
        self.max_retries = if max_retries <= 0 {
            DEFAULT_MAX_RETRIES
        } else {
            u32::try_from(max_retries).unwrap_or(u32::MAX)
        };
        self
    }

    /// Observe every non-terminal status (`NotPaid` or unknown codes).
    ///
    /// Not called for paid or closed orders; those are reported through the
    /// return value of [`poll_order_status`].
    pub fn on_check<F>(mut self, callback: F) -> Self
    where
        F: Fn(u32, &OrderStatusData) + Send + Sync + 'static,
    {
        self.on_check = Some(Arc::new(callback));
        self
    }

    /// Observe every failed query
    pub fn on_error<F>(mut self, callback: F) -> Self
    where
        F: Fn(u32, &PayError) + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(callback));
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_retries: DEFAULT_MAX_RETRIES,
            on_check: None,
            on_error: None,
        }
    }
}

/// What a single query attempt decided
enum Step {
    Continue,
    Finished(Result<OrderStatusData>),
}

fn evaluate(attempt: u32, config: &PollConfig, outcome: Result<OrderStatusData>) -> Step {
    let status = match outcome {
        Ok(status) => status,
        Err(err) => {
            warn!(attempt, error = %err, "order status query failed");
            if let Some(on_error) = &config.on_error {
                on_error(attempt, &err);
            }
            return Step::Continue;
        }
    };

    match status.status {
        OrderStatus::PaidSuccess => {
            info!(attempt, order_no = %status.order_no, "order paid");
            Step::Finished(Ok(status))
        }
        OrderStatus::Closed => {
            info!(attempt, order_no = %status.order_no, "order closed");
            Step::Finished(Err(PayError::OrderClosed {
                status: Box::new(status),
            }))
        }
        OrderStatus::NotPaid | OrderStatus::Unknown(_) => {
            debug!(attempt, status = %status.status, "order not settled yet");
            if let Some(on_check) = &config.on_check {
                on_check(attempt, &status);
            }
            Step::Continue
        }
    }
}

/// Poll `order_no` until it is paid, closed, or the attempt budget is spent.
///
/// Returns the paid order on success, [`PayError::OrderClosed`] (carrying
/// the order) when it was closed, and [`PayError::PollTimeout`] when every
/// attempt came back non-terminal or failed.
pub async fn poll_order_status<S>(
    source: &S,
    order_no: &str,
    config: &PollConfig,
) -> Result<OrderStatusData>
where
    S: OrderStatusSource + ?Sized,
{
    for attempt in 1..=config.max_retries {
        tokio::time::sleep(config.interval).await;

        let outcome = source.query_status(order_no).await;
        if let Step::Finished(result) = evaluate(attempt, config, outcome) {
            return result;
        }
    }

    warn!(order_no, max_retries = config.max_retries, "polling exhausted");
    Err(PayError::PollTimeout {
        max_retries: config.max_retries,
    })
}
