//! Tool Set
//!
//! The closed set of tools declared to the model. A `ToolCall` is parsed into a
//! `CryptoTool` before anything runs, so an unknown name or a malformed argument
//! surfaces as an error instead of a silent no-op.

use agent_core::{
    AgentError, Result as CoreResult, ToolCall,
    tool::{ParameterSchema, ToolSchema},
};
use serde_json::json;

use crate::model::{Coin, CoinPatch};

pub const GET_PRICE: &str = "get_price";
pub const GET_PRICES: &str = "get_prices";
pub const GET_TRENDS: &str = "get_trends";
pub const GET_INSIGHTS: &str = "get_insights";
pub const GET_HISTORY: &str = "get_history";
pub const ADD_CRYPTOS: &str = "add_cryptos";
pub const DELETE_CRYPTOS: &str = "delete_cryptos";
pub const UPDATE_CRYPTOS: &str = "update_cryptos";
pub const SEARCH_CRYPTOS: &str = "search_cryptos";

/// Tool identity, independent of arguments
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ToolKind {
    Price,
    Prices,
    Trends,
    Insights,
    History,
    AddCryptos,
    DeleteCryptos,
    UpdateCryptos,
    SearchCryptos,
}

impl ToolKind {
    pub const ALL: [Self; 9] = [
        Self::Price,
        Self::Prices,
        Self::Trends,
        Self::Insights,
        Self::History,
        Self::AddCryptos,
        Self::DeleteCryptos,
        Self::UpdateCryptos,
        Self::SearchCryptos,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Price => GET_PRICE,
            Self::Prices => GET_PRICES,
            Self::Trends => GET_TRENDS,
            Self::Insights => GET_INSIGHTS,
            Self::History => GET_HISTORY,
            Self::AddCryptos => ADD_CRYPTOS,
            Self::DeleteCryptos => DELETE_CRYPTOS,
            Self::UpdateCryptos => UPDATE_CRYPTOS,
            Self::SearchCryptos => SEARCH_CRYPTOS,
        }
    }

    /// Watchlist mutations, which may be batched in one assistant message
    pub const fn is_watchlist_action(self) -> bool {
        matches!(self, Self::AddCryptos | Self::DeleteCryptos | Self::UpdateCryptos)
    }
}

/// A parsed, fully-typed tool invocation
#[derive(Clone, Debug, PartialEq)]
pub enum CryptoTool {
    GetPrice { coin_id: String },
    GetPrices { coin_ids: Vec<String> },
    GetTrends,
    GetInsights { coin_id: String },
    GetHistory { coin_id: String, date: Option<String> },
    AddCryptos { cryptos: Vec<Coin> },
    DeleteCryptos { crypto_ids: Vec<String> },
    UpdateCryptos { cryptos: Vec<CoinPatch> },
    SearchCryptos { queries: Vec<String> },
}

impl CryptoTool {
    /// Parse a model invocation; unknown names and bad arguments are errors
    pub fn parse(call: &ToolCall) -> CoreResult<Self> {
        let kind =
            ToolKind::from_name(&call.name).ok_or_else(|| AgentError::ToolNotFound(call.name.clone()))?;

        let tool = match kind {
            ToolKind::Price => Self::GetPrice {
                coin_id: call.required_str("coin_id")?.to_string(),
            },
            ToolKind::Prices => Self::GetPrices {
                coin_ids: call.required("coin_ids")?,
            },
            ToolKind::Trends => Self::GetTrends,
            ToolKind::Insights => Self::GetInsights {
                coin_id: call.required_str("coin_id")?.to_string(),
            },
            ToolKind::History => Self::GetHistory {
                coin_id: call.required_str("coin_id")?.to_string(),
                date: call
                    .str_arg("date")
                    .filter(|d| !d.trim().is_empty())
                    .map(str::to_string),
            },
            ToolKind::AddCryptos => Self::AddCryptos {
                cryptos: call.required("cryptos")?,
            },
            ToolKind::DeleteCryptos => Self::DeleteCryptos {
                crypto_ids: call.required("crypto_ids")?,
            },
            ToolKind::UpdateCryptos => Self::UpdateCryptos {
                cryptos: call.required("cryptos")?,
            },
            ToolKind::SearchCryptos => Self::SearchCryptos {
                queries: call.required("queries")?,
            },
        };
        Ok(tool)
    }

    pub const fn kind(&self) -> ToolKind {
        match self {
            Self::GetPrice { .. } => ToolKind::Price,
            Self::GetPrices { .. } => ToolKind::Prices,
            Self::GetTrends => ToolKind::Trends,
            Self::GetInsights { .. } => ToolKind::Insights,
            Self::GetHistory { .. } => ToolKind::History,
            Self::AddCryptos { .. } => ToolKind::AddCryptos,
            Self::DeleteCryptos { .. } => ToolKind::DeleteCryptos,
            Self::UpdateCryptos { .. } => ToolKind::UpdateCryptos,
            Self::SearchCryptos { .. } => ToolKind::SearchCryptos,
        }
    }

    /// Coin the invocation is about, kept as the session's selected coin
    pub fn primary_coin_id(&self) -> Option<&str> {
        match self {
            Self::GetPrice { coin_id }
            | Self::GetInsights { coin_id }
            | Self::GetHistory { coin_id, .. } => Some(coin_id.as_str()),
            Self::GetPrices { coin_ids } => coin_ids.first().map(String::as_str),
            Self::AddCryptos { cryptos } => cryptos.first().map(|c| c.id.as_str()),
            Self::UpdateCryptos { cryptos } => cryptos.first().map(|c| c.id.as_str()),
            Self::GetTrends | Self::DeleteCryptos { .. } | Self::SearchCryptos { .. } => None,
        }
    }
}

fn coin_items(require_name: bool) -> serde_json::Value {
    let required = if require_name {
        json!(["id", "name", "symbol"])
    } else {
        json!(["id"])
    };
    json!({
        "type": "object",
        "properties": {
            "id": {"type": "string", "description": "CoinGecko coin id, e.g. 'bitcoin'"},
            "name": {"type": "string"},
            "symbol": {"type": "string"},
            "current_price": {"type": "number", "description": "USD"},
            "market_cap": {"type": "number"},
            "volume": {"type": "number"},
            "description": {"type": "string"}
        },
        "required": required
    })
}

/// Schemas declared to the model on every completion request
pub fn schemas() -> Vec<ToolSchema> {
    let coin_id = || ParameterSchema::string("coin_id", "CoinGecko coin id, e.g. 'bitcoin'").required();
    let strings = json!({"type": "string"});

    vec![
        ToolSchema {
            name: GET_PRICE.into(),
            description: "Fetch the latest USD price of a cryptocurrency".into(),
            parameters: vec![coin_id()],
            has_side_effects: false,
        },
        ToolSchema {
            name: GET_PRICES.into(),
            description: "Fetch the latest USD prices of several cryptocurrencies at once".into(),
            parameters: vec![
                ParameterSchema::array("coin_ids", "CoinGecko coin ids", strings.clone()).required(),
            ],
            has_side_effects: false,
        },
        ToolSchema {
            name: GET_TRENDS.into(),
            description: "Fetch the currently trending coins".into(),
            parameters: vec![],
            has_side_effects: false,
        },
        ToolSchema {
            name: GET_INSIGHTS.into(),
            description: "Fetch coin insights: latest market cap and trading volume".into(),
            parameters: vec![coin_id()],
            has_side_effects: false,
        },
        ToolSchema {
            name: GET_HISTORY.into(),
            description: "Fetch the USD price of a cryptocurrency on a past date".into(),
            parameters: vec![
                coin_id(),
                ParameterSchema::string("date", "Date as DD-MM-YYYY; defaults to yesterday"),
            ],
            has_side_effects: false,
        },
        ToolSchema {
            name: ADD_CRYPTOS.into(),
            description: "Add one or many cryptocurrencies to the user's watchlist".into(),
            parameters: vec![
                ParameterSchema::array("cryptos", "Coins to add", coin_items(true)).required(),
            ],
            has_side_effects: true,
        },
        ToolSchema {
            name: DELETE_CRYPTOS.into(),
            description: "Delete one or many cryptocurrencies from the user's watchlist".into(),
            parameters: vec![
                ParameterSchema::array("crypto_ids", "Ids of the coins to delete", strings.clone())
                    .required(),
            ],
            has_side_effects: true,
        },
        ToolSchema {
            name: UPDATE_CRYPTOS.into(),
            description: "Update fields of one or many cryptocurrencies on the watchlist".into(),
            parameters: vec![
                ParameterSchema::array("cryptos", "Partial coin records keyed by id", coin_items(false))
                    .required(),
            ],
            has_side_effects: true,
        },
        ToolSchema {
            name: SEARCH_CRYPTOS.into(),
            description: "Search for cryptocurrencies by name or symbol; returns ids, symbols and prices"
                .into(),
            parameters: vec![
                ParameterSchema::array("queries", "Free-text search queries", strings).required(),
            ],
            has_side_effects: false,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_names_cover_every_kind() {
        let names: Vec<String> = schemas().into_iter().map(|s| s.name).collect();
        for kind in ToolKind::ALL {
            assert!(names.iter().any(|n| n == kind.name()), "missing {}", kind.name());
        }
        assert_eq!(names.len(), ToolKind::ALL.len());
    }

    #[test]
    fn test_parse_price() {
        let call = ToolCall::new("c1", GET_PRICE, json!({"coin_id": "bitcoin"}));
        let tool = CryptoTool::parse(&call).unwrap();
        assert_eq!(tool, CryptoTool::GetPrice { coin_id: "bitcoin".into() });
        assert_eq!(tool.primary_coin_id(), Some("bitcoin"));
    }

    #[test]
    fn test_parse_unknown_tool_fails_loudly() {
        let call = ToolCall::new("c1", "buy_coins", json!({}));
        assert!(matches!(CryptoTool::parse(&call), Err(AgentError::ToolNotFound(name)) if name == "buy_coins"));
    }

    #[test]
    fn test_parse_missing_argument() {
        let call = ToolCall::new("c1", GET_INSIGHTS, json!({"coin": "bitcoin"}));
        assert!(matches!(CryptoTool::parse(&call), Err(AgentError::ToolValidation(_))));
    }

    #[test]
    fn test_parse_history_blank_date() {
        let call = ToolCall::new("c1", GET_HISTORY, json!({"coin_id": "bitcoin", "date": " "}));
        assert_eq!(
            CryptoTool::parse(&call).unwrap(),
            CryptoTool::GetHistory { coin_id: "bitcoin".into(), date: None }
        );
    }

    #[test]
    fn test_parse_watchlist_actions() {
        let call = ToolCall::new(
            "c1",
            ADD_CRYPTOS,
            json!({"cryptos": [{"id": "solana", "name": "Solana", "symbol": "sol", "current_price": 145.2}]}),
        );
        let tool = CryptoTool::parse(&call).unwrap();
        assert!(tool.kind().is_watchlist_action());
        assert_eq!(tool.primary_coin_id(), Some("solana"));

        let call = ToolCall::new("c2", DELETE_CRYPTOS, json!({"crypto_ids": ["solana"]}));
        let tool = CryptoTool::parse(&call).unwrap();
        assert_eq!(tool.primary_coin_id(), None);
    }
}
