//! Market Data
//!
//! `MarketDataClient` is the seam to the remote pricing API (CoinGecko in
//! production, a static mock in tests). `MarketData` wraps a client and turns
//! every failure into an error-shaped `Lookup` so a bad fetch never aborts a turn.

mod coingecko;
mod mock;

pub use coingecko::{CoinGeckoClient, CoinGeckoConfig};
pub use mock::MockMarketClient;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::{AssistantError, Result};
use crate::model::{
    HistoricalPrice, Insights, Lookup, PriceQuote, PriceTable, SearchHit, SearchOutcome, Trends,
};

/// Date format of the history endpoint
pub const HISTORY_DATE_FORMAT: &str = "%d-%m-%Y";

/// Days of market-chart history used for insights
pub const INSIGHTS_DAYS: u32 = 30;

/// Coins kept per search query
pub const SEARCH_LIMIT: usize = 5;

/// Raw `[timestamp_ms, value]` series returned by the market-chart endpoint
#[derive(Clone, Debug, Default, Deserialize)]
pub struct MarketChart {
    #[serde(default)]
    pub prices: Vec<(f64, Option<Decimal>)>,
    #[serde(default)]
    pub market_caps: Vec<(f64, Option<Decimal>)>,
    #[serde(default)]
    pub total_volumes: Vec<(f64, Option<Decimal>)>,
}

/// Name and symbol from the coin-by-id endpoint
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct CoinProfile {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub symbol: String,
}

const WEEK_MS: f64 = 7.0 * 86_400_000.0;

fn latest(series: &[(f64, Option<Decimal>)]) -> Option<Decimal> {
    series.last().and_then(|(_, value)| *value)
}

/// Percent change from the first point within a week of the last one
fn change_7d(prices: &[(f64, Option<Decimal>)]) -> Option<Decimal> {
    let &(last_at, last) = prices.last()?;
    let (_, base) = prices.iter().find(|(at, _)| *at >= last_at - WEEK_MS)?;
    let (last, base) = (last?, (*base)?);
    if base.is_zero() {
        return None;
    }
    Some(((last - base) / base * Decimal::ONE_HUNDRED).round_dp(2))
}

/// Market-data client trait (Strategy pattern)
#[async_trait]
pub trait MarketDataClient: Send + Sync {
    /// USD prices for several ids in one request; unknown ids are absent
    async fn simple_prices(&self, ids: &[String]) -> Result<PriceTable>;

    /// Names of currently trending coins
    async fn trending(&self) -> Result<Vec<String>>;

    /// Market-chart series over the last `days` days
    async fn market_chart(&self, coin_id: &str, days: u32) -> Result<MarketChart>;

    /// Name and symbol of one coin
    async fn coin(&self, coin_id: &str) -> Result<CoinProfile>;

    /// USD price at a `DD-MM-YYYY` date; `None` when the provider has no data
    async fn coin_history(&self, coin_id: &str, date: &str) -> Result<Option<Decimal>>;

    /// Coins matching a free-text query, best match first
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>>;

    /// Provider name
    fn name(&self) -> &str;
}

/// Never-failing facade over a `MarketDataClient`
#[derive(Clone)]
pub struct MarketData {
    client: Arc<dyn MarketDataClient>,
}

impl MarketData {
    pub fn new(client: Arc<dyn MarketDataClient>) -> Self {
        Self { client }
    }

    pub fn provider_name(&self) -> &str {
        self.client.name()
    }

    /// Latest USD price of one coin
    pub async fn get_price(&self, coin_id: &str) -> Lookup<PriceQuote> {
        let ids = [coin_id.to_string()];
        let result = self
            .client
            .simple_prices(&ids)
            .await
            .and_then(|prices| {
                prices
                    .get(coin_id)
                    .copied()
                    .ok_or_else(|| AssistantError::UnknownCoin(coin_id.to_string()))
            });

        match result {
            Ok(price) => Lookup::Found(PriceQuote {
                coin_id: coin_id.to_string(),
                price,
            }),
            Err(e) => {
                tracing::warn!(coin_id, "Price lookup failed: {}", e);
                Lookup::failed(Some(coin_id), format!("Failed to fetch price for {coin_id}: {e}"))
            }
        }
    }

    /// Latest USD prices of several coins, one batched request
    pub async fn get_prices(&self, coin_ids: &[String]) -> Lookup<PriceTable> {
        if coin_ids.is_empty() {
            return Lookup::failed(None, "No coin ids supplied");
        }
        match self.client.simple_prices(coin_ids).await {
            Ok(prices) => Lookup::Found(prices),
            Err(e) => {
                tracing::warn!(count = coin_ids.len(), "Batched price lookup failed: {}", e);
                Lookup::failed(None, format!("Failed to fetch prices: {e}"))
            }
        }
    }

    /// Trending coin names
    pub async fn get_trends(&self) -> Lookup<Trends> {
        match self.client.trending().await {
            Ok(trends) => Lookup::Found(Trends { trends }),
            Err(e) => {
                tracing::warn!("Trending lookup failed: {}", e);
                Lookup::failed(None, format!("Failed to fetch trending coins: {e}"))
            }
        }
    }

    /// Latest market cap and volume from the 30-day chart, with the coin's
    /// name, symbol and 7-day price change
    pub async fn get_insights(&self, coin_id: &str) -> Lookup<Insights> {
        let chart = match self.client.market_chart(coin_id, INSIGHTS_DAYS).await {
            Ok(chart) => chart,
            Err(e) => {
                tracing::warn!(coin_id, "Insights lookup failed: {}", e);
                return Lookup::failed(
                    Some(coin_id),
                    format!("Failed to fetch insights for {coin_id}: {e}"),
                );
            }
        };

        // The chart alone is enough to answer
        let profile = match self.client.coin(coin_id).await {
            Ok(profile) => Some(profile),
            Err(e) => {
                tracing::warn!(coin_id, "Coin profile lookup failed: {}", e);
                None
            }
        };
        let (name, symbol) = profile.map_or((None, None), |p| (Some(p.name), Some(p.symbol)));

        Lookup::Found(Insights {
            coin_id: coin_id.to_string(),
            name,
            symbol,
            current_price: latest(&chart.prices),
            market_caps: latest(&chart.market_caps),
            volume: latest(&chart.total_volumes),
            price_change_percentage_7d: change_7d(&chart.prices),
        })
    }

    /// USD price at `date` (`DD-MM-YYYY`), yesterday when omitted
    pub async fn get_history(&self, coin_id: &str, date: Option<&str>) -> Lookup<HistoricalPrice> {
        let date = match date {
            Some(d) => match NaiveDate::parse_from_str(d, HISTORY_DATE_FORMAT) {
                Ok(_) => d.to_string(),
                Err(_) => {
                    let e = AssistantError::InvalidDate(d.to_string());
                    return Lookup::failed(
                        Some(coin_id),
                        format!("Failed to fetch history for {coin_id}: {e}"),
                    );
                }
            },
            None => yesterday(),
        };

        let result = self
            .client
            .coin_history(coin_id, &date)
            .await
            .and_then(|price| {
                price.ok_or_else(|| AssistantError::PriceUnavailable(format!("{coin_id} on {date}")))
            });

        match result {
            Ok(price) => Lookup::Found(HistoricalPrice {
                coin_id: coin_id.to_string(),
                price,
                date,
            }),
            Err(e) => {
                tracing::warn!(coin_id, %date, "History lookup failed: {}", e);
                Lookup::failed(
                    Some(coin_id),
                    format!("Failed to fetch history for {coin_id}: {e}"),
                )
            }
        }
    }

    /// Search one query and price its top hits in a single batched request
    pub async fn search(&self, query: &str) -> SearchOutcome {
        let mut hits = match self.client.search(query).await {
            Ok(hits) => hits,
            Err(e) => {
                tracing::warn!(%query, "Search failed: {}", e);
                return SearchOutcome {
                    query: query.to_string(),
                    coins: Vec::new(),
                    error: Some(format!("Error fetching data for {query}: {e}")),
                };
            }
        };
        hits.truncate(SEARCH_LIMIT);

        let ids: Vec<String> = hits.iter().map(|h| h.id.clone()).collect();
        if !ids.is_empty() {
            match self.client.simple_prices(&ids).await {
                Ok(prices) => {
                    for hit in &mut hits {
                        hit.current_price = prices.get(&hit.id).copied();
                    }
                }
                Err(e) => tracing::warn!(%query, "Pricing search hits failed: {}", e),
            }
        }

        SearchOutcome {
            query: query.to_string(),
            coins: hits,
            error: None,
        }
    }
}

/// Yesterday's date in history-endpoint format
pub fn yesterday() -> String {
    (Utc::now() - Duration::days(1))
        .format(HISTORY_DATE_FORMAT)
        .to_string()
}
