//! Oracle module - relayer gas price lookups
//!
//! A `GasPriceOracle` answers `dstPriceLookup(chainId)` for one relayer.
//! `PriceEndpoint` wraps one oracle and tracks the movement between readings.

mod endpoint;
mod relayer;

pub use endpoint::{PriceEndpoint, PriceReading};
pub use relayer::RelayerOracle;

use anyhow::Result;
use async_trait::async_trait;

use crate::types::{ChainId, DstPrice};

/// Capability to query one relayer's destination price table
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GasPriceOracle: Send + Sync {
    /// Look up the price entry for a destination chain
    async fn dst_price_lookup(&self, chain_id: ChainId) -> Result<DstPrice>;
}
