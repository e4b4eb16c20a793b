//! Price endpoint - one relayer lookup plus the last observed price
//!
//! The endpoint owns its oracle client and is the only writer of its
//! previous reading. A reading is compared against the previous one before
//! the previous one is replaced; failed lookups leave it untouched.

use ethers::types::U256;

use crate::error::GasBotError;
use crate::oracle::GasPriceOracle;
use crate::types::{ChainId, Glyphs, Gwei, Movement, Percent};

/// Magnitude of the change from `previous` to `current` in tenths of a
/// percent, rounded half away from zero. `previous` must be non-zero.
fn change_tenths(previous: u128, current: u128) -> Percent {
    let diff = U256::from(current.abs_diff(previous));
    let previous = U256::from(previous);
    // both operands stay below 2^140
    let tenths = (diff * U256::from(2000u32) + previous) / (previous * U256::from(2u8));
    Percent::from_tenths(tenths)
}

/// Classify `current` against the previous reading.
///
/// A missing or zero previous value has no usable baseline and yields `Flat`.
fn classify(previous: Option<Gwei>, current: Gwei) -> Movement {
    let previous = match previous {
        Some(p) if !p.is_zero() => p,
        _ => return Movement::Flat,
    };
    if current == previous {
        return Movement::Flat;
    }

    let pct = change_tenths(previous.wei(), current.wei());
    if current < previous {
        Movement::Down(pct)
    } else {
        Movement::Up(pct)
    }
}

/// One successful observation of an endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceReading {
    pub name: String,
    pub chain_id: ChainId,
    pub price_ratio: u128,
    pub gwei: Gwei,
    pub movement: Movement,
}

impl PriceReading {
    /// Render the endpoint block of the report
    pub fn render(&self, glyphs: &Glyphs) -> String {
        format!(
            "  ({})\n        Ratio:  {}\n        Price:  {} Gwei ({})\n",
            self.name,
            self.price_ratio,
            self.gwei,
            glyphs.marker(&self.movement)
        )
    }
}

/// A named relayer lookup for one destination chain
pub struct PriceEndpoint {
    name: String,
    chain_id: ChainId,
    oracle: Box<dyn GasPriceOracle>,
    glyphs: Glyphs,
    previous_gwei: Option<Gwei>,
}

impl PriceEndpoint {
    pub fn new(name: impl Into<String>, chain_id: ChainId, oracle: Box<dyn GasPriceOracle>) -> Self {
        Self {
            name: name.into(),
            chain_id,
            oracle,
            glyphs: Glyphs::default(),
            previous_gwei: None,
        }
    }

    pub fn with_glyphs(mut self, glyphs: Glyphs) -> Self {
        self.glyphs = glyphs;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn chain_id(&self) -> ChainId {
        self.chain_id
    }

    /// Last successfully observed price in Gwei
    pub fn previous_gwei(&self) -> Option<Gwei> {
        self.previous_gwei
    }

    /// Query the oracle, classify the movement and advance the stored price
    pub async fn read(&mut self) -> Result<PriceReading, GasBotError> {
        let price = match self.oracle.dst_price_lookup(self.chain_id).await {
            Ok(price) => price,
            Err(e) => {
                tracing::warn!(
                    endpoint = %self.name,
                    chain_id = self.chain_id,
                    error = %e,
                    "Oracle lookup failed"
                );
                return Err(GasBotError::oracle(&self.name, self.chain_id, format!("{:#}", e)));
            }
        };

        let gwei = Gwei::from_wei(price.gas_price_wei);
        let movement = classify(self.previous_gwei, gwei);
        self.previous_gwei = Some(gwei);

        tracing::debug!(
            endpoint = %self.name,
            chain_id = self.chain_id,
            ratio = %price.price_ratio,
            gwei = %gwei,
            movement = ?movement,
            "Price reading"
        );

        Ok(PriceReading {
            name: self.name.clone(),
            chain_id: self.chain_id,
            price_ratio: price.price_ratio,
            gwei,
            movement,
        })
    }

    /// Query and render the endpoint block
    pub async fn query(&mut self) -> Result<String, GasBotError> {
        let reading = self.read().await?;
        Ok(reading.render(&self.glyphs))
    }
}

impl std::fmt::Debug for PriceEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PriceEndpoint")
            .field("name", &self.name)
            .field("chain_id", &self.chain_id)
            .field("previous_gwei", &self.previous_gwei)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::MockGasPriceOracle;
    use crate::types::{DstPrice, WEI_PER_GWEI as GWEI};
    use mockall::Sequence;

    fn scripted(readings: Vec<anyhow::Result<DstPrice>>) -> Box<dyn GasPriceOracle> {
        let mut oracle = MockGasPriceOracle::new();
        let mut seq = Sequence::new();
        for reading in readings {
            oracle
                .expect_dst_price_lookup()
                .times(1)
                .in_sequence(&mut seq)
                .return_once(move |_| reading);
        }
        Box::new(oracle)
    }

    fn gwei(n: u128) -> Gwei {
        Gwei::from_wei(n * GWEI)
    }

    fn up(tenths: u64) -> Movement {
        Movement::Up(Percent::from_tenths(tenths))
    }

    fn down(tenths: u64) -> Movement {
        Movement::Down(Percent::from_tenths(tenths))
    }

    #[test]
    fn classify_without_baseline_is_flat() {
        assert_eq!(classify(None, gwei(5)), Movement::Flat);
        assert_eq!(classify(None, Gwei::from_wei(0)), Movement::Flat);
        assert_eq!(classify(Some(Gwei::from_wei(0)), gwei(5)), Movement::Flat);
    }

    #[test]
    fn classify_rounds_to_one_decimal() {
        assert_eq!(classify(Some(gwei(3)), gwei(2)), down(333));
        assert_eq!(classify(Some(gwei(3)), gwei(4)), up(333));
        assert_eq!(classify(Some(gwei(2)), gwei(3)), up(500));
        assert_eq!(classify(Some(Gwei::from_wei(1_500_000_000)), Gwei::from_wei(1_500_000_000)), Movement::Flat);
        // 0.05% rounds away from zero
        assert_eq!(classify(Some(gwei(100)), Gwei::from_wei(100_050_000_000)), up(1));
        // 0.04% rounds to zero but is still a rise
        assert_eq!(classify(Some(gwei(100)), Gwei::from_wei(100_040_000_000)), up(0));
        // 2/3 of a percent drop
        assert_eq!(classify(Some(gwei(300)), gwei(298)), down(7));
    }

    #[test]
    fn classify_handles_extreme_u128_values() {
        let base = Gwei::from_wei(1u128 << 100);
        let half_more = Gwei::from_wei((1u128 << 100) + (1u128 << 99));
        assert_eq!(classify(Some(base), half_more), up(500));
        assert_eq!(classify(Some(half_more), base), down(333));

        let spike = classify(Some(Gwei::from_wei(1)), Gwei::from_wei(u128::MAX));
        assert_eq!(
            Glyphs::plain().marker(&spike),
            "UP 34028236692093846346337460743176821145400.0%"
        );
        assert_eq!(
            classify(Some(Gwei::from_wei(u128::MAX)), Gwei::from_wei(1)),
            down(1000)
        );
    }

    #[tokio::test]
    async fn first_reading_is_flat_even_at_zero() {
        let mut endpoint = PriceEndpoint::new("A", 101, scripted(vec![Ok(DstPrice::new(1, 0))]));
        let reading = endpoint.read().await.expect("reading");
        assert_eq!(reading.movement, Movement::Flat);
        assert_eq!(endpoint.previous_gwei(), Some(Gwei::from_wei(0)));
    }

    #[tokio::test]
    async fn successive_readings_report_direction() {
        let mut endpoint = PriceEndpoint::new(
            "A",
            101,
            scripted(vec![
                Ok(DstPrice::new(100, 2 * GWEI)),
                Ok(DstPrice::new(100, 3 * GWEI)),
                Ok(DstPrice::new(100, 3 * GWEI)),
                Ok(DstPrice::new(100, 2 * GWEI)),
            ]),
        )
        .with_glyphs(Glyphs::plain());

        let first = endpoint.query().await.expect("first");
        assert!(first.contains("Ratio:  100\n"));
        assert!(first.contains("Price:  2 Gwei ( - )"));

        let second = endpoint.query().await.expect("second");
        assert!(second.contains("Price:  3 Gwei (UP 50.0%)"));

        let third = endpoint.query().await.expect("third");
        assert!(third.contains("Price:  3 Gwei ( - )"));

        let fourth = endpoint.query().await.expect("fourth");
        assert!(fourth.contains("Price:  2 Gwei (DOWN 33.3%)"));
    }

    #[tokio::test]
    async fn failed_lookup_keeps_previous_price() {
        let mut endpoint = PriceEndpoint::new(
            "Sepolia",
            10161,
            scripted(vec![
                Ok(DstPrice::new(7, 4 * GWEI)),
                Err(anyhow::anyhow!("execution reverted")),
                Ok(DstPrice::new(7, 5 * GWEI)),
            ]),
        );

        endpoint.read().await.expect("first");
        let err = endpoint.read().await.expect_err("second should fail");
        match err {
            GasBotError::OracleQueryFailure { name, chain_id, reason } => {
                assert_eq!(name, "Sepolia");
                assert_eq!(chain_id, 10161);
                assert!(reason.contains("execution reverted"));
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert_eq!(endpoint.previous_gwei(), Some(gwei(4)));

        let third = endpoint.read().await.expect("third");
        assert_eq!(third.movement, up(250));
    }

    #[tokio::test]
    async fn huge_wei_readings_are_reported_and_tracked() {
        let mut endpoint = PriceEndpoint::new(
            "A",
            1,
            scripted(vec![
                Ok(DstPrice::new(1, 1u128 << 100)),
                Ok(DstPrice::new(1, u128::MAX)),
                Ok(DstPrice::new(1, 1u128 << 100)),
            ]),
        )
        .with_glyphs(Glyphs::plain());

        let first = endpoint.query().await.expect("2^100 wei is a valid reading");
        assert!(first.contains("Price:  1267650600228229401496.703205376 Gwei ( - )"));

        let second = endpoint.read().await.expect("u128::MAX wei is a valid reading");
        assert!(matches!(second.movement, Movement::Up(_)));
        assert_eq!(endpoint.previous_gwei(), Some(Gwei::from_wei(u128::MAX)));

        let third = endpoint.read().await.expect("falling back is a valid reading");
        assert!(matches!(third.movement, Movement::Down(_)));
        assert_eq!(endpoint.previous_gwei(), Some(Gwei::from_wei(1u128 << 100)));
    }

    #[tokio::test]
    async fn oracle_receives_bound_chain_id() {
        let mut oracle = MockGasPriceOracle::new();
        oracle
            .expect_dst_price_lookup()
            .withf(|chain_id| *chain_id == 10102)
            .times(1)
            .returning(|_| Ok(DstPrice::new(1, GWEI)));
        let mut endpoint = PriceEndpoint::new("Bsc-testnet", 10102, Box::new(oracle));
        tokio_test::assert_ok!(endpoint.read().await);
    }
}
