//! EVM relayer client for `dstPriceLookup`
//!
//! Each relayer gets its own HTTP provider; nothing is shared between endpoints.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use ethers::contract::abigen;
use ethers::providers::{Http, Provider};
use ethers::types::Address;

use crate::oracle::GasPriceOracle;
use crate::types::{ChainId, DstPrice};

abigen!(
    RelayerPriceLookup,
    r#"[
        function dstPriceLookup(uint16) external view returns (uint128 dstPriceRatio, uint128 dstGasPriceInWei)
    ]"#
);

/// Relayer contract reachable over JSON-RPC
pub struct RelayerOracle {
    rpc_url: String,
    relayer: Address,
    contract: RelayerPriceLookup<Provider<Http>>,
}

impl RelayerOracle {
    /// Build a client for `relayer` on `rpc_url`
    pub fn connect(rpc_url: &str, relayer: &str) -> Result<Self> {
        let relayer: Address = relayer
            .parse()
            .with_context(|| format!("Invalid relayer address '{}'", relayer))?;
        let provider = Provider::<Http>::try_from(rpc_url)
            .with_context(|| format!("Invalid RPC URL '{}'", rpc_url))?;
        let contract = RelayerPriceLookup::new(relayer, Arc::new(provider));

        Ok(Self {
            rpc_url: rpc_url.to_string(),
            relayer,
            contract,
        })
    }

    pub fn relayer(&self) -> Address {
        self.relayer
    }

    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }
}

#[async_trait]
impl GasPriceOracle for RelayerOracle {
    async fn dst_price_lookup(&self, chain_id: ChainId) -> Result<DstPrice> {
        let (price_ratio, gas_price_wei) = self
            .contract
            .dst_price_lookup(chain_id)
            .call()
            .await
            .with_context(|| {
                format!(
                    "dstPriceLookup({}) on {:#x} via {} failed",
                    chain_id, self.relayer, self.rpc_url
                )
            })?;

        Ok(DstPrice {
            price_ratio,
            gas_price_wei,
        })
    }
}
