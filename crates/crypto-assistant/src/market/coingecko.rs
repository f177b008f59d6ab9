//! CoinGecko Client
//!
//! REST client for the CoinGecko v3 API. The demo-tier key is sent in the
//! `x-cg-demo-api-key` header when configured.

use std::collections::HashMap;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use super::{CoinProfile, MarketChart, MarketDataClient};
use crate::error::{AssistantError, Result};
use crate::model::{PriceTable, SearchHit};

const API_KEY_HEADER: &str = "x-cg-demo-api-key";
const VS_CURRENCY: &str = "usd";

#[derive(Clone, Debug)]
pub struct CoinGeckoConfig {
    pub base_url: String,
    pub api_key: Option<String>,
}

impl Default for CoinGeckoConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.coingecko.com/api/v3".into(),
            api_key: None,
        }
    }
}

impl CoinGeckoConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: std::env::var("COINGECKO_BASE_URL").unwrap_or(defaults.base_url),
            api_key: std::env::var("COINGECKO_API_KEY").ok().filter(|k| !k.is_empty()),
        }
    }
}

/// CoinGecko market-data client
pub struct CoinGeckoClient {
    http: reqwest::Client,
    config: CoinGeckoConfig,
}

impl CoinGeckoClient {
    pub fn new(config: CoinGeckoConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    pub fn from_env() -> Self {
        Self::new(CoinGeckoConfig::from_env())
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T> {
        let url = format!("{}/{}", self.config.base_url.trim_end_matches('/'), path);
        let mut request = self.http.get(&url).query(query);
        if let Some(key) = &self.config.api_key {
            request = request.header(API_KEY_HEADER, key);
        }

        tracing::debug!(%url, "CoinGecko request");
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AssistantError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| AssistantError::Malformed(format!("{path}: {e}")))
    }
}

// Response shapes

type SimplePriceResponse = HashMap<String, HashMap<String, Decimal>>;

#[derive(Debug, Deserialize)]
struct TrendingResponse {
    coins: Vec<TrendingEntry>,
}

#[derive(Debug, Deserialize)]
struct TrendingEntry {
    item: TrendingItem,
}

#[derive(Debug, Deserialize)]
struct TrendingItem {
    name: String,
}

#[derive(Debug, Deserialize)]
struct HistoryResponse {
    #[serde(default)]
    market_data: Option<HistoryMarketData>,
}

#[derive(Debug, Deserialize)]
struct HistoryMarketData {
    current_price: HashMap<String, Decimal>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    coins: Vec<SearchHit>,
}

fn usd_prices(response: SimplePriceResponse) -> PriceTable {
    response
        .into_iter()
        .filter_map(|(id, quotes)| quotes.get(VS_CURRENCY).map(|p| (id, *p)))
        .collect()
}

#[async_trait]
impl MarketDataClient for CoinGeckoClient {
    async fn simple_prices(&self, ids: &[String]) -> Result<PriceTable> {
        let ids = ids.join(",");
        let response: SimplePriceResponse = self
            .get_json("simple/price", &[("ids", ids.as_str()), ("vs_currencies", VS_CURRENCY)])
            .await?;
        Ok(usd_prices(response))
    }

    async fn trending(&self) -> Result<Vec<String>> {
        let response: TrendingResponse = self.get_json("search/trending", &[]).await?;
        Ok(response.coins.into_iter().map(|c| c.item.name).collect())
    }

    async fn market_chart(&self, coin_id: &str, days: u32) -> Result<MarketChart> {
        let days = days.to_string();
        self.get_json(
            &format!("coins/{coin_id}/market_chart"),
            &[("vs_currency", VS_CURRENCY), ("days", days.as_str())],
        )
        .await
    }

    async fn coin(&self, coin_id: &str) -> Result<CoinProfile> {
        self.get_json(
            &format!("coins/{coin_id}"),
            &[
                ("localization", "false"),
                ("tickers", "false"),
                ("market_data", "false"),
                ("community_data", "false"),
                ("developer_data", "false"),
            ],
        )
        .await
    }

    async fn coin_history(&self, coin_id: &str, date: &str) -> Result<Option<Decimal>> {
        let response: HistoryResponse = self
            .get_json(
                &format!("coins/{coin_id}/history"),
                &[("date", date), ("localization", "false")],
            )
            .await?;
        Ok(response
            .market_data
            .and_then(|m| m.current_price.get(VS_CURRENCY).copied()))
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchHit>> {
        let response: SearchResponse = self.get_json("search", &[("query", query)]).await?;
        Ok(response.coins)
    }

    fn name(&self) -> &str {
        "CoinGecko"
    }
}
