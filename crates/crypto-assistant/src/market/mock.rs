//! Mock Market Client
//!
//! For testing and demo purposes. Returns realistic static figures, or fails
//! every call to simulate a network outage.

use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::{CoinProfile, MarketChart, MarketDataClient, WEEK_MS};
use crate::error::{AssistantError, Result};
use crate::model::{PriceTable, SearchHit};

/// (id, name, symbol, price, market cap, 24h volume)
type Row = (&'static str, &'static str, &'static str, Decimal, Decimal, Decimal);

const COINS: &[Row] = &[
    ("bitcoin", "Bitcoin", "btc", dec!(67000.5), dec!(1320000000000), dec!(25000000000)),
    ("ethereum", "Ethereum", "eth", dec!(3450), dec!(415000000000), dec!(15000000000)),
    ("ether", "Ether", "eth", dec!(3450), dec!(415000000000), dec!(15000000000)),
    ("solana", "Solana", "sol", dec!(145.2), dec!(67000000000), dec!(3000000000)),
    ("cardano", "Cardano", "ada", dec!(0.45), dec!(16000000000), dec!(400000000)),
    ("dogecoin", "Dogecoin", "doge", dec!(0.16), dec!(23000000000), dec!(900000000)),
];

const TRENDING: &[&str] = &["Pepe", "Solana", "Bitcoin", "Dogecoin"];

/// Mock market-data client with static prices
#[derive(Default)]
pub struct MockMarketClient {
    failing: bool,
}

impl MockMarketClient {
    pub fn new() -> Self {
        Self { failing: false }
    }

    /// Client whose every call fails like an unreachable provider
    pub fn failing() -> Self {
        Self { failing: true }
    }

    fn check(&self) -> Result<()> {
        if self.failing {
            Err(AssistantError::Unavailable("simulated network error".into()))
        } else {
            Ok(())
        }
    }

    fn row(id: &str) -> Option<&'static Row> {
        COINS.iter().find(|c| c.0 == id)
    }
}

#[async_trait]
impl MarketDataClient for MockMarketClient {
    async fn simple_prices(&self, ids: &[String]) -> Result<PriceTable> {
        self.check()?;
        Ok(ids
            .iter()
            .filter_map(|id| Self::row(id).map(|c| (id.clone(), c.3)))
            .collect())
    }

    async fn trending(&self) -> Result<Vec<String>> {
        self.check()?;
        Ok(TRENDING.iter().map(ToString::to_string).collect())
    }

    async fn market_chart(&self, coin_id: &str, days: u32) -> Result<MarketChart> {
        self.check()?;
        let (_, _, _, price, cap, volume) =
            *Self::row(coin_id).ok_or_else(|| AssistantError::UnknownCoin(coin_id.to_string()))?;

        // Oldest point at 90% of the latest figures, the point a week back at 80%
        let start = 1_700_000_000_000_f64;
        let end = start + f64::from(days) * 86_400_000.0;
        let at = [start, end - WEEK_MS, end];
        let scale = [dec!(0.9), dec!(0.8), Decimal::ONE];
        let series = |latest: Decimal| -> Vec<(f64, Option<Decimal>)> {
            at.iter().zip(scale).map(|(t, s)| (*t, Some(latest * s))).collect()
        };
        Ok(MarketChart {
            prices: series(price),
            market_caps: series(cap),
            total_volumes: series(volume),
        })
    }

    async fn coin(&self, coin_id: &str) -> Result<CoinProfile> {
        self.check()?;
        let (id, name, symbol, ..) =
            *Self::row(coin_id).ok_or_else(|| AssistantError::UnknownCoin(coin_id.to_string()))?;
        Ok(CoinProfile {
            id: id.into(),
            name: name.into(),
            symbol: symbol.into(),
        })
    }

    async fn coin_history(&self, coin_id: &str, _date: &str) -> Result<Option<Decimal>> {
        self.check()?;
        Ok(Self::row(coin_id).map(|c| c.3 * dec!(0.98)))
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchHit>> {
        self.check()?;
        let query = query.to_lowercase();
        Ok(COINS
            .iter()
            .enumerate()
            .filter(|(_, c)| c.0.contains(&query) || c.1.to_lowercase().contains(&query) || c.2 == query)
            .map(|(rank, c)| SearchHit {
                id: c.0.into(),
                name: c.1.into(),
                symbol: c.2.into(),
                market_cap_rank: u32::try_from(rank + 1).ok(),
                current_price: None,
            })
            .collect())
    }

    fn name(&self) -> &str {
        "MockMarket"
    }
}
