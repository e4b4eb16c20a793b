//! Core types used throughout GasBot
//!
//! Defines oracle readings, price movements and the report formatting options.

use ethers::types::U256;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Destination chain identifier as used by the relayer's price lookup table
pub type ChainId = u16;

/// Raw answer of `dstPriceLookup(chainId)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DstPrice {
    /// Destination/source gas price ratio, reported verbatim
    pub price_ratio: u128,
    /// Destination gas price in wei
    pub gas_price_wei: u128,
}

impl DstPrice {
    pub fn new(price_ratio: u128, gas_price_wei: u128) -> Self {
        Self {
            price_ratio,
            gas_price_wei,
        }
    }
}

/// Network group an endpoint is reported under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    Testnet,
}

impl Network {
    /// Section header used in the report
    pub fn header(&self) -> &'static str {
        match self {
            Network::Mainnet => "[Mainnet]",
            Network::Testnet => "[Testnet]",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Network::Mainnet => write!(f, "mainnet"),
            Network::Testnet => write!(f, "testnet"),
        }
    }
}

/// Wei per Gwei
pub const WEI_PER_GWEI: u128 = 1_000_000_000;

/// Gas price in Gwei, stored as the exact wei amount
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Gwei {
    wei: u128,
}

impl Gwei {
    pub const fn from_wei(wei: u128) -> Self {
        Self { wei }
    }

    pub const fn wei(&self) -> u128 {
        self.wei
    }

    pub const fn is_zero(&self) -> bool {
        self.wei == 0
    }
}

impl fmt::Display for Gwei {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.wei / WEI_PER_GWEI;
        let frac = self.wei % WEI_PER_GWEI;
        if frac == 0 {
            return write!(f, "{}", whole);
        }
        let digits = format!("{:09}", frac);
        write!(f, "{}.{}", whole, digits.trim_end_matches('0'))
    }
}

/// Non-negative percentage held in tenths of a percent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Percent {
    tenths: U256,
}

impl Percent {
    pub fn from_tenths(tenths: impl Into<U256>) -> Self {
        Self {
            tenths: tenths.into(),
        }
    }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ten = U256::from(10u8);
        write!(f, "{}.{}", self.tenths / ten, self.tenths % ten)
    }
}

/// Direction of a reading relative to the previous reading of the same endpoint.
///
/// `Up` and `Down` carry the magnitude of the change, rounded to one decimal
/// place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Movement {
    Flat,
    Up(Percent),
    Down(Percent),
}

/// Display glyphs for price movements, resolved only when rendering text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Glyphs {
    pub up: String,
    pub down: String,
}

impl Default for Glyphs {
    fn default() -> Self {
        Self {
            up: "🔺".to_string(),
            down: "🔻".to_string(),
        }
    }
}

impl Glyphs {
    pub fn new(up: impl Into<String>, down: impl Into<String>) -> Self {
        Self {
            up: up.into(),
            down: down.into(),
        }
    }

    /// ASCII glyph set (`UP` / `DOWN`)
    pub fn plain() -> Self {
        Self::new("UP", "DOWN")
    }

    /// Render the marker shown inside the parentheses after the price
    pub fn marker(&self, movement: &Movement) -> String {
        match movement {
            Movement::Flat => " - ".to_string(),
            Movement::Up(pct) => format!("{} {}%", self.up, pct),
            Movement::Down(pct) => format!("{} {}%", self.down, pct),
        }
    }
}

/// What a report does when one endpoint cannot be queried
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Fail the whole report on the first failing endpoint
    Abort,
    /// Render the failing endpoint as unavailable and keep going
    Isolate,
}

impl Default for FailurePolicy {
    fn default() -> Self {
        FailurePolicy::Abort
    }
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailurePolicy::Abort => write!(f, "abort"),
            FailurePolicy::Isolate => write!(f, "isolate"),
        }
    }
}
