//! Report module - timestamped, ordered gas price reports
//!
//! `EndpointRegistry` owns the endpoints and renders one report per call.
//! `PriceReporter` is the shared handle given to every trigger; it holds the
//! registry behind a mutex so overlapping triggers run one after another.

pub mod clock;
mod registry;

pub use clock::{Clock, FixedClock, ReportClock, SystemClock};
pub use registry::EndpointRegistry;

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Mutex;

use crate::error::GasBotError;

/// Single-flight access to the registry
#[derive(Clone)]
pub struct PriceReporter {
    registry: Arc<Mutex<EndpointRegistry>>,
}

impl PriceReporter {
    pub fn new(registry: EndpointRegistry) -> Self {
        Self {
            registry: Arc::new(Mutex::new(registry)),
        }
    }

    /// Build one report. Waits for any report already in flight.
    pub async fn report(&self, trigger: &str) -> Result<String, GasBotError> {
        let mut registry = self.registry.lock().await;
        let started = Instant::now();
        let result = registry.print_prices().await;
        match &result {
            Ok(_) => tracing::info!(
                trigger = trigger,
                endpoints = registry.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Price report built"
            ),
            Err(e) => tracing::error!(
                trigger = trigger,
                error = %e,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Price report failed"
            ),
        }
        result
    }

    /// Text sent to the chat when a report cannot be built
    pub fn failure_message(err: &GasBotError) -> String {
        format!("Failed to build price report: {}", err)
    }
}

impl std::fmt::Debug for PriceReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PriceReporter").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::GasPriceOracle;
    use crate::types::{ChainId, DstPrice, Glyphs};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
    use std::time::Duration;

    /// Oracle that yields mid-call and returns an increasing price
    struct SlowRising {
        calls: AtomicU32,
        in_flight: Arc<AtomicUsize>,
        max_in_flight: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl GasPriceOracle for SlowRising {
        async fn dst_price_lookup(&self, _chain_id: ChainId) -> anyhow::Result<DstPrice> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            let n = self.calls.fetch_add(1, Ordering::SeqCst) as u128 + 1;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(DstPrice::new(1, n * 1_000_000_000))
        }
    }

    #[tokio::test]
    async fn overlapping_reports_are_serialized() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let max_in_flight = Arc::new(AtomicUsize::new(0));
        let mut registry = EndpointRegistry::new(ReportClock::system()).with_glyphs(Glyphs::plain());
        registry.add_mainnet(
            "Ethereum",
            101,
            Box::new(SlowRising {
                calls: AtomicU32::new(0),
                in_flight: in_flight.clone(),
                max_in_flight: max_in_flight.clone(),
            }),
        );
        let reporter = PriceReporter::new(registry);

        let (a, b) = tokio::join!(reporter.report("schedule"), reporter.report("command"));
        let mut reports = vec![a.expect("a"), b.expect("b")];
        reports.sort_by_key(|r| r.contains("( - )"));

        assert_eq!(max_in_flight.load(Ordering::SeqCst), 1);
        // One report saw the first reading, the other compared against it
        assert!(reports[1].contains("Price:  1 Gwei ( - )"));
        assert!(reports[0].contains("Price:  2 Gwei (UP 100.0%)"));
    }

    #[test]
    fn failure_message_names_endpoint() {
        let err = GasBotError::oracle("Ethereum", 101, "timeout");
        assert_eq!(
            PriceReporter::failure_message(&err),
            "Failed to build price report: oracle query failed for Ethereum (chain 101): timeout"
        );
    }
}
