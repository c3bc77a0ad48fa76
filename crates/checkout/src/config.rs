//! Checkout configuration and the store-call deadline helper.

use std::future::Future;
use std::time::Duration;

use store::StoreError;

/// Default deadline for a single store call.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);

/// Default order currency.
pub const DEFAULT_CURRENCY: &str = "USD";

/// Settings shared by the checkout services.
#[derive(Debug, Clone)]
pub struct CheckoutConfig {
    /// Upper bound for every store call made on behalf of a request.
    pub store_timeout: Duration,
    /// Currency stamped on locally created orders.
    pub currency: String,
}

impl CheckoutConfig {
    pub fn new(store_timeout: Duration, currency: impl Into<String>) -> Self {
        Self {
            store_timeout,
            currency: currency.into(),
        }
    }
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self::new(DEFAULT_STORE_TIMEOUT, DEFAULT_CURRENCY)
    }
}

/// Awaits a store call, turning an elapsed deadline into [`StoreError::Timeout`].
pub(crate) async fn bounded<T, F>(deadline: Duration, call: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    match tokio::time::timeout(deadline, call).await {
        Ok(result) => result,
        Err(_) => {
            metrics::counter!("store_timeouts_total").increment(1);
            Err(StoreError::Timeout)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CheckoutConfig::default();
        assert_eq!(config.store_timeout, Duration::from_secs(5));
        assert_eq!(config.currency, "USD");
    }

    #[tokio::test]
    async fn test_bounded_passes_result_through() {
        let value = bounded(Duration::from_secs(1), async { Ok::<_, StoreError>(7) })
            .await
            .unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn test_bounded_times_out() {
        let result = bounded(Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, StoreError>(())
        })
        .await;
        assert!(matches!(result, Err(StoreError::Timeout)));
    }
}
