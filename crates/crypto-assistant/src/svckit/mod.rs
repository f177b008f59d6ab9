//! Service Kit - Tool Handlers
//!
//! Executes parsed `CryptoTool` invocations against market data and the
//! session's watchlist. Every handler returns a `ToolResult`; failures are
//! results, never errors, so one bad call cannot abort a turn.

mod market_tools;
mod search;
mod tools;
mod watchlist_actions;

pub use tools::{
    ADD_CRYPTOS, CryptoTool, DELETE_CRYPTOS, GET_HISTORY, GET_INSIGHTS, GET_PRICE, GET_PRICES,
    GET_TRENDS, SEARCH_CRYPTOS, ToolKind, UPDATE_CRYPTOS, schemas,
};

use agent_core::{Message, ToolCall, ToolResult};

use crate::market::MarketData;
use crate::state::SessionState;

/// Run one parsed invocation
pub async fn execute(tool: CryptoTool, market: &MarketData, state: &mut SessionState) -> ToolResult {
    match tool {
        CryptoTool::SearchCryptos { queries } => search::execute(market, state, &queries).await,
        tool if tool.kind().is_watchlist_action() => watchlist_actions::execute(state, tool),
        tool => market_tools::execute(market, &tool).await,
    }
}

/// Diagnostic result for a call that cannot be run
pub fn diagnostic(call: &ToolCall, reason: impl std::fmt::Display) -> ToolResult {
    tracing::warn!(tool = %call.name, call_id = %call.id, "Tool call rejected: {}", reason);
    ToolResult::failure(call.name.clone(), format!("Error: {reason}")).with_id(call.id.clone())
}

/// Tool-result message answering `call`
pub fn result_message(call: &ToolCall, result: ToolResult) -> Message {
    tracing::debug!(tool = %result.name, call_id = %call.id, success = result.success, "Tool finished");
    Message::tool(result.output, call.id.clone())
}
