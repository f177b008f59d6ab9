//! Market-data tools: price, prices, trends, insights, history

use agent_core::ToolResult;
use serde::Serialize;

use super::tools::CryptoTool;
use crate::market::MarketData;
use crate::model::Lookup;

pub(super) async fn execute(market: &MarketData, tool: &CryptoTool) -> ToolResult {
    let name = tool.kind().name();
    tracing::debug!(tool = name, coin_id = ?tool.primary_coin_id(), "Running market tool");

    match tool {
        CryptoTool::GetPrice { coin_id } => to_result(name, &market.get_price(coin_id).await),
        CryptoTool::GetPrices { coin_ids } => to_result(name, &market.get_prices(coin_ids).await),
        CryptoTool::GetTrends => to_result(name, &market.get_trends().await),
        CryptoTool::GetInsights { coin_id } => {
            to_result(name, &market.get_insights(coin_id).await)
        }
        CryptoTool::GetHistory { coin_id, date } => {
            to_result(name, &market.get_history(coin_id, date.as_deref()).await)
        }
        _ => ToolResult::failure(name, format!("Error: '{name}' is not a market-data tool")),
    }
}

/// The lookup's JSON goes to the model verbatim, error-shaped or not
fn to_result<T: Serialize>(name: &str, lookup: &Lookup<T>) -> ToolResult {
    match serde_json::to_value(lookup) {
        Ok(value) if lookup.is_found() => ToolResult::success(name, value.to_string()),
        Ok(value) => ToolResult::failure(name, value.to_string()),
        Err(e) => ToolResult::failure(name, format!("Error: could not encode result: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use serde_json::{Value, json};

    use crate::market::MockMarketClient;

    fn market() -> MarketData {
        MarketData::new(Arc::new(MockMarketClient::new()))
    }

    fn parsed(output: &str) -> Value {
        serde_json::from_str(output).unwrap()
    }

    #[tokio::test]
    async fn test_price_result_is_lookup_json() {
        let tool = CryptoTool::GetPrice { coin_id: "bitcoin".into() };
        let result = execute(&market(), &tool).await;
        assert!(result.success);
        assert_eq!(parsed(&result.output), json!({"coin_id": "bitcoin", "price": 67000.5}));
    }

    #[tokio::test]
    async fn test_failed_lookup_is_failure_result() {
        let failing = MarketData::new(Arc::new(MockMarketClient::failing()));
        let tool = CryptoTool::GetInsights { coin_id: "ethereum".into() };
        let result = execute(&failing, &tool).await;
        assert!(!result.success);
        let value = parsed(&result.output);
        assert_eq!(value["coin_id"], "ethereum");
        assert!(value["error"].as_str().unwrap().contains("simulated network error"));
    }

    #[tokio::test]
    async fn test_watchlist_tool_is_rejected() {
        let tool = CryptoTool::DeleteCryptos { crypto_ids: vec!["bitcoin".into()] };
        let result = execute(&market(), &tool).await;
        assert!(!result.success);
    }
}
