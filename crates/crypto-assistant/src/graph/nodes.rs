//! Handler Nodes
//!
//! Prices, insights and watchlist nodes answer the pending tool calls of the
//! last assistant message, one tool-result message per call, in request order.

use agent_core::ToolCall;

use super::router::Node;
use crate::market::MarketData;
use crate::state::SessionState;
use crate::svckit::{self, CryptoTool, ToolKind};

const fn accepts(node: Node, kind: ToolKind) -> bool {
    match node {
        Node::Prices => matches!(
            kind,
            ToolKind::Price | ToolKind::Prices | ToolKind::Trends | ToolKind::History
        ),
        Node::Insights => matches!(kind, ToolKind::Insights),
        Node::WatchlistExecute => kind.is_watchlist_action(),
        Node::Dialogue | Node::WatchlistAnnounce => false,
    }
}

/// Run a handler node against the session
pub async fn handle(node: Node, market: &MarketData, state: &mut SessionState) {
    if node == Node::WatchlistAnnounce {
        tracing::debug!(
            pending = state.messages.pending_tool_calls().len(),
            "Announcing watchlist actions"
        );
        return;
    }

    let calls: Vec<ToolCall> = state
        .messages
        .pending_tool_calls()
        .into_iter()
        .cloned()
        .collect();
    if calls.is_empty() {
        tracing::warn!(%node, "Handler entered without a pending tool call");
        return;
    }

    for call in &calls {
        let result = match CryptoTool::parse(call) {
            Ok(tool) if accepts(node, tool.kind()) => svckit::execute(tool, market, state).await,
            Ok(tool) => svckit::diagnostic(
                call,
                format!("'{}' cannot run in the {node} step", tool.kind().name()),
            ),
            Err(e) => svckit::diagnostic(call, e),
        };
        state.messages.push(svckit::result_message(call, result));
    }
}

/// Answer calls left without a result so the history stays well-formed
pub fn close_pending(state: &mut SessionState) {
    let stale: Vec<ToolCall> = state
        .messages
        .pending_tool_calls()
        .into_iter()
        .cloned()
        .collect();
    for call in &stale {
        let result = svckit::diagnostic(call, "no result was produced for this call");
        state.messages.push(svckit::result_message(call, result));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use agent_core::{Message, Role};
    use serde_json::json;

    use crate::market::MockMarketClient;
    use crate::model::Coin;
    use crate::svckit::{DELETE_CRYPTOS, GET_INSIGHTS, GET_PRICE};

    fn market() -> MarketData {
        MarketData::new(Arc::new(MockMarketClient::new()))
    }

    fn requesting(calls: Vec<ToolCall>) -> SessionState {
        let mut state = SessionState::new();
        state.messages.push(Message::user("hi"));
        state.messages.push(Message::assistant_with_tools("", calls));
        state
    }

    #[tokio::test]
    async fn test_prices_node_answers_call() {
        let mut state = requesting(vec![ToolCall::new("call_1", GET_PRICE, json!({"coin_id": "solana"}))]);
        handle(Node::Prices, &market(), &mut state).await;

        let last = state.messages.last().unwrap();
        assert_eq!(last.role, Role::Tool);
        assert_eq!(last.tool_call_id.as_deref(), Some("call_1"));
        assert!(last.content.contains("145.2"));
        assert!(state.messages.pending_tool_calls().is_empty());
    }

    #[tokio::test]
    async fn test_missing_argument_gets_diagnostic() {
        let mut state = requesting(vec![ToolCall::new("call_1", GET_INSIGHTS, json!({}))]);
        handle(Node::Insights, &market(), &mut state).await;

        let last = state.messages.last().unwrap();
        assert!(last.content.starts_with("Error: Tool validation error"));
    }

    #[tokio::test]
    async fn test_watchlist_batch_in_request_order() {
        let mut state = requesting(vec![
            ToolCall::new("call_1", DELETE_CRYPTOS, json!({"crypto_ids": ["bitcoin"]})),
            ToolCall::new("call_2", GET_PRICE, json!({"coin_id": "bitcoin"})),
            ToolCall::new("call_3", DELETE_CRYPTOS, json!({"crypto_ids": ["ether"]})),
        ]);
        state.add_coins(vec![Coin::new("bitcoin", "Bitcoin", "btc"), Coin::new("ether", "Ether", "eth")]);

        handle(Node::WatchlistAnnounce, &market(), &mut state).await;
        assert_eq!(state.messages.pending_tool_calls().len(), 3);

        handle(Node::WatchlistExecute, &market(), &mut state).await;
        let results: Vec<(&str, &str)> = state.messages.messages()[2..]
            .iter()
            .map(|m| (m.tool_call_id.as_deref().unwrap(), m.content.as_str()))
            .collect();
        assert_eq!(results[0], ("call_1", "Deleted 1 cryptocurrencies!"));
        assert_eq!(results[1].0, "call_2");
        assert!(results[1].1.starts_with("Error:"));
        assert_eq!(results[2], ("call_3", "Deleted 1 cryptocurrencies!"));
        assert!(state.watchlist.is_empty());
    }

    #[test]
    fn test_close_pending() {
        let mut state = requesting(vec![ToolCall::new("call_1", GET_PRICE, json!({}))]);
        close_pending(&mut state);
        assert!(state.messages.pending_tool_calls().is_empty());
        assert_eq!(state.messages.last().unwrap().role, Role::Tool);

        let len = state.messages.len();
        close_pending(&mut state);
        assert_eq!(state.messages.len(), len);
    }
}
