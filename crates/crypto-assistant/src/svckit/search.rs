//! Coin search
//!
//! Each query is searched and priced in turn. Progress entries live in the
//! session state only while the search runs and are empty again once the
//! result message is produced.

use agent_core::ToolResult;

use super::tools::SEARCH_CRYPTOS;
use crate::market::MarketData;
use crate::model::SearchProgress;
use crate::state::SessionState;

pub(super) async fn execute(
    market: &MarketData,
    state: &mut SessionState,
    queries: &[String],
) -> ToolResult {
    if queries.is_empty() {
        return ToolResult::failure(SEARCH_CRYPTOS, "Error: no search queries supplied");
    }

    state.search_progress = queries.iter().map(SearchProgress::pending).collect();

    let mut outcomes = Vec::with_capacity(queries.len());
    for (i, query) in queries.iter().enumerate() {
        let outcome = market.search(query).await;
        if let Some(progress) = state.search_progress.get_mut(i) {
            progress.results = outcome.coins.iter().map(|c| c.id.clone()).collect();
            progress.done = true;
        }
        tracing::debug!(%query, hits = outcome.coins.len(), "Search query done");
        outcomes.push(outcome);
    }

    state.search_progress.clear();

    match serde_json::to_value(&outcomes) {
        Ok(value) => ToolResult::success(SEARCH_CRYPTOS, value.to_string()),
        Err(e) => ToolResult::failure(SEARCH_CRYPTOS, format!("Error: could not encode result: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use serde_json::Value;

    use crate::market::MockMarketClient;

    #[tokio::test]
    async fn test_search_results_and_cleared_progress() {
        let market = MarketData::new(Arc::new(MockMarketClient::new()));
        let mut state = SessionState::new();

        let result = execute(&market, &mut state, &["sol".into(), "doge".into()]).await;
        assert!(result.success);
        assert!(state.search_progress.is_empty());

        let value: Value = serde_json::from_str(&result.output).unwrap();
        assert_eq!(value[0]["query"], "sol");
        assert_eq!(value[0]["coins"][0]["id"], "solana");
        assert_eq!(value[0]["coins"][0]["current_price"], 145.2);
        assert_eq!(value[1]["query"], "doge");
    }

    #[tokio::test]
    async fn test_search_failure_is_per_query() {
        let market = MarketData::new(Arc::new(MockMarketClient::failing()));
        let mut state = SessionState::new();

        let result = execute(&market, &mut state, &["sol".into()]).await;
        let value: Value = serde_json::from_str(&result.output).unwrap();
        assert!(value[0]["error"].as_str().unwrap().starts_with("Error fetching data for sol"));
        assert!(state.search_progress.is_empty());
    }

    #[tokio::test]
    async fn test_empty_queries() {
        let market = MarketData::new(Arc::new(MockMarketClient::new()));
        let result = execute(&market, &mut SessionState::new(), &[]).await;
        assert!(!result.success);
    }
}
