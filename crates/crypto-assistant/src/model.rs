//! Domain Models
//!
//! Coin records tracked on the watchlist and the result shapes produced by
//! market-data lookups. Uses `rust_decimal` for all monetary values.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A tracked cryptocurrency
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coin {
    /// Provider identifier (e.g., "bitcoin"), the watchlist key
    pub id: String,

    /// Display name (e.g., "Bitcoin")
    #[serde(default)]
    pub name: String,

    /// Ticker symbol (e.g., "btc")
    #[serde(default)]
    pub symbol: String,

    /// Current price in USD, if known
    #[serde(default)]
    pub current_price: Option<Decimal>,

    #[serde(default)]
    pub market_cap: Option<Decimal>,

    #[serde(default)]
    pub volume: Option<Decimal>,

    #[serde(default)]
    pub description: Option<String>,
}

impl Coin {
    pub fn new(id: impl Into<String>, name: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            symbol: symbol.into(),
            current_price: None,
            market_cap: None,
            volume: None,
            description: None,
        }
    }

    #[must_use]
    pub const fn with_price(mut self, price: Decimal) -> Self {
        self.current_price = Some(price);
        self
    }

    /// Shallow merge: every field present in the patch overrides this record
    pub fn merge(&mut self, patch: &CoinPatch) {
        if let Some(name) = &patch.name {
            self.name.clone_from(name);
        }
        if let Some(symbol) = &patch.symbol {
            self.symbol.clone_from(symbol);
        }
        if patch.current_price.is_some() {
            self.current_price = patch.current_price;
        }
        if patch.market_cap.is_some() {
            self.market_cap = patch.market_cap;
        }
        if patch.volume.is_some() {
            self.volume = patch.volume;
        }
        if patch.description.is_some() {
            self.description.clone_from(&patch.description);
        }
    }
}

/// Partial coin record used by update requests
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CoinPatch {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub current_price: Option<Decimal>,
    #[serde(default)]
    pub market_cap: Option<Decimal>,
    #[serde(default)]
    pub volume: Option<Decimal>,
    #[serde(default)]
    pub description: Option<String>,
}

// ============================================================================
// Market-data results
// ============================================================================

/// Outcome of a market-data lookup: the payload, or an error-shaped result
///
/// Serialized untagged so the model sees either `{coin_id, price}` or
/// `{coin_id, error}`.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Lookup<T> {
    Found(T),
    Failed(LookupError),
}

impl<T> Lookup<T> {
    pub fn failed(coin_id: Option<&str>, error: impl Into<String>) -> Self {
        Self::Failed(LookupError {
            coin_id: coin_id.map(str::to_string),
            error: error.into(),
        })
    }

    pub const fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    pub const fn found(&self) -> Option<&T> {
        match self {
            Self::Found(value) => Some(value),
            Self::Failed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Found(_) => None,
            Self::Failed(e) => Some(&e.error),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LookupError {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coin_id: Option<String>,
    pub error: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PriceQuote {
    pub coin_id: String,
    /// USD
    pub price: Decimal,
}

/// Batched USD prices keyed by coin id
pub type PriceTable = BTreeMap<String, Decimal>;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Trends {
    /// Trending coin names, in provider order
    pub trends: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Insights {
    pub coin_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    /// Latest price of the 30-day series
    pub current_price: Option<Decimal>,
    /// Latest market capitalization of the 30-day series
    pub market_caps: Option<Decimal>,
    /// Latest total volume of the 30-day series
    pub volume: Option<Decimal>,
    /// Percent change over the last 7 days of the series, 2 decimal places
    pub price_change_percentage_7d: Option<Decimal>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HistoricalPrice {
    pub coin_id: String,
    pub price: Decimal,
    /// `DD-MM-YYYY`
    pub date: String,
}

/// One coin found by a search query
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: String,
    pub name: String,
    pub symbol: String,
    #[serde(default)]
    pub market_cap_rank: Option<u32>,
    #[serde(default)]
    pub current_price: Option<Decimal>,
}

/// Results of one search query
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SearchOutcome {
    pub query: String,
    pub coins: Vec<SearchHit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Scratch progress of one search query
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchProgress {
    pub query: String,
    pub results: Vec<String>,
    pub done: bool,
}

impl SearchProgress {
    pub fn pending(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            results: Vec::new(),
            done: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::{Value, json};

    #[test]
    fn test_merge_overrides_present_fields_only() {
        let mut coin = Coin::new("bitcoin", "Bitcoin", "btc").with_price(dec!(60000));
        coin.description = Some("digital gold".into());

        coin.merge(&CoinPatch {
            id: "bitcoin".into(),
            current_price: Some(dec!(67000.5)),
            volume: Some(dec!(1000)),
            ..Default::default()
        });

        assert_eq!(coin.name, "Bitcoin");
        assert_eq!(coin.current_price, Some(dec!(67000.5)));
        assert_eq!(coin.volume, Some(dec!(1000)));
        assert_eq!(coin.description.as_deref(), Some("digital gold"));
    }

    #[test]
    fn test_coin_from_model_arguments() {
        let coin: Coin = serde_json::from_value(json!({
            "id": "solana",
            "name": "Solana",
            "symbol": "sol",
            "current_price": 145.2,
            "market_cap": null
        }))
        .unwrap();
        assert_eq!(coin.current_price, Some(dec!(145.2)));
        assert!(coin.market_cap.is_none());
    }

    #[test]
    fn test_decimals_serialize_as_numbers() {
        let coin = Coin::new("solana", "Solana", "sol").with_price(dec!(145.2));
        let value = serde_json::to_value(&coin).unwrap();
        assert_eq!(value["current_price"], json!(145.2));
        assert_eq!(value["market_cap"], Value::Null);

        let quote = PriceQuote {
            coin_id: "bitcoin".into(),
            price: dec!(67000.5),
        };
        assert_eq!(
            serde_json::to_value(&quote).unwrap(),
            json!({"coin_id": "bitcoin", "price": 67000.5})
        );
    }

    #[test]
    fn test_lookup_serializes_untagged() {
        let ok: Lookup<PriceQuote> = Lookup::Found(PriceQuote {
            coin_id: "bitcoin".into(),
            price: dec!(67000.5),
        });
        let value = serde_json::to_value(&ok).unwrap();
        assert_eq!(value["coin_id"], "bitcoin");
        assert!(value.get("error").is_none());

        let failed: Lookup<Trends> = Lookup::failed(None, "timeout");
        assert_eq!(serde_json::to_value(&failed).unwrap(), json!({"error": "timeout"}));
        assert_eq!(failed.error(), Some("timeout"));
    }
}
