//! Endpoint registry - ordered mainnet/testnet groups and report assembly

use crate::error::GasBotError;
use crate::oracle::{GasPriceOracle, PriceEndpoint};
use crate::report::clock::ReportClock;
use crate::types::{ChainId, FailurePolicy, Glyphs, Network};

/// Two ordered endpoint groups rendered into one report
#[derive(Debug)]
pub struct EndpointRegistry {
    mainnet: Vec<PriceEndpoint>,
    testnet: Vec<PriceEndpoint>,
    clock: ReportClock,
    glyphs: Glyphs,
    failure_policy: FailurePolicy,
}

impl EndpointRegistry {
    pub fn new(clock: ReportClock) -> Self {
        Self {
            mainnet: Vec::new(),
            testnet: Vec::new(),
            clock,
            glyphs: Glyphs::default(),
            failure_policy: FailurePolicy::default(),
        }
    }

    /// Set the glyphs used for endpoints registered afterwards
    pub fn with_glyphs(mut self, glyphs: Glyphs) -> Self {
        self.glyphs = glyphs;
        self
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    pub fn add_mainnet(
        &mut self,
        name: impl Into<String>,
        chain_id: ChainId,
        oracle: Box<dyn GasPriceOracle>,
    ) {
        self.add(Network::Mainnet, name, chain_id, oracle);
    }

    pub fn add_testnet(
        &mut self,
        name: impl Into<String>,
        chain_id: ChainId,
        oracle: Box<dyn GasPriceOracle>,
    ) {
        self.add(Network::Testnet, name, chain_id, oracle);
    }

    /// Append an endpoint to `network`, keeping registration order
    pub fn add(
        &mut self,
        network: Network,
        name: impl Into<String>,
        chain_id: ChainId,
        oracle: Box<dyn GasPriceOracle>,
    ) {
        let endpoint = PriceEndpoint::new(name, chain_id, oracle).with_glyphs(self.glyphs.clone());
        tracing::debug!(
            network = %network,
            endpoint = %endpoint.name(),
            chain_id = chain_id,
            "Registered price endpoint"
        );
        match network {
            Network::Mainnet => self.mainnet.push(endpoint),
            Network::Testnet => self.testnet.push(endpoint),
        }
    }

    pub fn endpoints(&self, network: Network) -> &[PriceEndpoint] {
        match network {
            Network::Mainnet => &self.mainnet,
            Network::Testnet => &self.testnet,
        }
    }

    pub fn len(&self) -> usize {
        self.mainnet.len() + self.testnet.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Query every endpoint in order and assemble the report.
    ///
    /// Queries run one at a time, mainnet first. Under `FailurePolicy::Abort`
    /// the first failure is returned; endpoints already queried in this pass
    /// keep their new readings.
    pub async fn print_prices(&mut self) -> Result<String, GasBotError> {
        let mut report = self.clock.stamp();
        report.push('\n');

        report.push_str(Network::Mainnet.header());
        report.push('\n');
        Self::append_group(&mut report, &mut self.mainnet, self.failure_policy).await?;

        report.push('\n');
        report.push_str(Network::Testnet.header());
        report.push('\n');
        Self::append_group(&mut report, &mut self.testnet, self.failure_policy).await?;

        Ok(report)
    }

    async fn append_group(
        report: &mut String,
        group: &mut [PriceEndpoint],
        policy: FailurePolicy,
    ) -> Result<(), GasBotError> {
        for endpoint in group.iter_mut() {
            match endpoint.query().await {
                Ok(block) => report.push_str(&block),
                Err(e) if policy == FailurePolicy::Isolate => {
                    tracing::warn!(
                        endpoint = %endpoint.name(),
                        chain_id = endpoint.chain_id(),
                        error = %e,
                        "Endpoint unavailable, continuing report"
                    );
                    report.push_str(&unavailable_block(endpoint));
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}

fn unavailable_block(endpoint: &PriceEndpoint) -> String {
    format!(
        "  ({})\n        unavailable (chain {})\n",
        endpoint.name(),
        endpoint.chain_id()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::MockGasPriceOracle;
    use crate::report::clock::FixedClock;
    use crate::types::{DstPrice, Gwei};
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;

    const GWEI: u128 = 1_000_000_000;

    fn fixed_clock() -> ReportClock {
        ReportClock::new(Arc::new(FixedClock(
            Utc.with_ymd_and_hms(2024, 5, 10, 3, 0, 0).unwrap(),
        )))
    }

    fn constant(ratio: u128, wei: u128) -> Box<dyn GasPriceOracle> {
        let mut oracle = MockGasPriceOracle::new();
        oracle
            .expect_dst_price_lookup()
            .returning(move |_| Ok(DstPrice::new(ratio, wei)));
        Box::new(oracle)
    }

    fn failing() -> Box<dyn GasPriceOracle> {
        let mut oracle = MockGasPriceOracle::new();
        oracle
            .expect_dst_price_lookup()
            .returning(|_| Err(anyhow::anyhow!("connection refused")));
        Box::new(oracle)
    }

    #[tokio::test]
    async fn report_layout_matches_exactly() {
        let mut registry = EndpointRegistry::new(fixed_clock());
        registry.add_mainnet("Ethereum", 101, constant(100, 2 * GWEI));
        registry.add_testnet("Sepolia", 10161, constant(42, 1_500_000_000));

        let report = registry.print_prices().await.expect("report");
        let expected = "2024-05-10 12:00:00 (UTC+09:00)\n\
                        [Mainnet]\n\
                        \x20 (Ethereum)\n\
                        \x20       Ratio:  100\n\
                        \x20       Price:  2 Gwei ( - )\n\
                        \n\
                        [Testnet]\n\
                        \x20 (Sepolia)\n\
                        \x20       Ratio:  42\n\
                        \x20       Price:  1.5 Gwei ( - )\n";
        assert_eq!(report, expected);
    }

    #[tokio::test]
    async fn mainnet_precedes_testnet_in_registration_order() {
        let mut registry = EndpointRegistry::new(fixed_clock());
        registry.add_testnet("T1", 1, constant(1, GWEI));
        registry.add_mainnet("M1", 2, constant(1, GWEI));
        registry.add_testnet("T2", 3, constant(1, GWEI));
        registry.add_mainnet("M2", 4, constant(1, GWEI));

        let report = registry.print_prices().await.expect("report");
        let positions: Vec<usize> = ["[Mainnet]", "(M1)", "(M2)", "[Testnet]", "(T1)", "(T2)"]
            .iter()
            .map(|needle| report.find(needle).expect("present"))
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[tokio::test]
    async fn empty_groups_still_print_headers() {
        let mut registry = EndpointRegistry::new(fixed_clock());
        let report = registry.print_prices().await.expect("report");
        assert_eq!(report, "2024-05-10 12:00:00 (UTC+09:00)\n[Mainnet]\n\n[Testnet]\n");
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn abort_policy_propagates_first_failure() {
        let mut registry = EndpointRegistry::new(fixed_clock());
        registry.add_mainnet("Ethereum", 101, constant(1, 3 * GWEI));
        registry.add_testnet("Broken", 10102, failing());

        let err = registry.print_prices().await.expect_err("should abort");
        assert_eq!(
            err,
            GasBotError::OracleQueryFailure {
                name: "Broken".to_string(),
                chain_id: 10102,
                reason: "connection refused".to_string(),
            }
        );
        let ethereum = &registry.endpoints(Network::Mainnet)[0];
        assert_eq!(ethereum.previous_gwei(), Some(Gwei::from_wei(3 * GWEI)));
    }

    #[tokio::test]
    async fn isolate_policy_marks_endpoint_unavailable() {
        let mut registry =
            EndpointRegistry::new(fixed_clock()).with_failure_policy(FailurePolicy::Isolate);
        registry.add_mainnet("Broken", 102, failing());
        registry.add_mainnet("Ethereum", 101, constant(5, 4 * GWEI));

        let report = registry.print_prices().await.expect("isolated report");
        assert!(report.contains("  (Broken)\n        unavailable (chain 102)\n"));
        assert!(report.contains("Price:  4 Gwei ( - )"));
        assert_eq!(registry.endpoints(Network::Mainnet)[0].previous_gwei(), None);
    }

    #[tokio::test]
    async fn glyphs_apply_to_registered_endpoints() {
        let mut oracle = MockGasPriceOracle::new();
        let mut calls = 0u32;
        oracle.expect_dst_price_lookup().returning(move |_| {
            calls += 1;
            Ok(DstPrice::new(1, if calls == 1 { 4 * GWEI } else { 3 * GWEI }))
        });

        let mut registry = EndpointRegistry::new(fixed_clock()).with_glyphs(Glyphs::plain());
        registry.add_mainnet("Ethereum", 101, Box::new(oracle));

        registry.print_prices().await.expect("first");
        let second = registry.print_prices().await.expect("second");
        assert!(second.contains("Price:  3 Gwei (DOWN 25.0%)"));
    }
}
