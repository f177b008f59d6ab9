//! Dialogue Node
//!
//! Drives a turn: one completion request per visit, with the tool set declared.
//! Tool calls are recorded here and executed by the handler node the router
//! picks; search and unknown tools are answered in place.

use std::sync::Arc;

use agent_core::{GenerationOptions, LlmProvider, Message, ToolCall, ToolSchema};

use super::nodes;
use crate::market::MarketData;
use crate::state::SessionState;
use crate::svckit::{self, CryptoTool, ToolKind};

pub struct DialogueNode {
    provider: Arc<dyn LlmProvider>,
    system_prompt: String,
    options: GenerationOptions,
    tools: Vec<ToolSchema>,
}

impl DialogueNode {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        system_prompt: impl Into<String>,
        options: GenerationOptions,
    ) -> Self {
        Self {
            provider,
            system_prompt: system_prompt.into(),
            options,
            tools: svckit::schemas(),
        }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub async fn provider_ready(&self) -> bool {
        self.provider.health_check().await.unwrap_or(false)
    }

    pub async fn run(&self, market: &MarketData, state: &mut SessionState) {
        nodes::close_pending(state);

        let mut request = Vec::with_capacity(state.messages.len() + 1);
        request.push(Message::system(self.system_prompt.as_str()));
        request.extend(state.messages.messages().iter().cloned());

        let completion = match self.provider.complete(&request, &self.tools, &self.options).await {
            Ok(completion) => completion,
            Err(e) => {
                tracing::error!(provider = self.provider.name(), "Completion failed: {}", e);
                state.messages.push(Message::system(format!("An error occurred: {e}")));
                return;
            }
        };

        let mut message = completion.into_message();
        if message.tool_calls.is_empty() {
            state.messages.push(message);
            return;
        }

        keep_routable(&mut message.tool_calls);
        let first = message.tool_calls[0].clone();
        let parsed = CryptoTool::parse(&first);

        if let Some(coin_id) = parsed.as_ref().ok().and_then(CryptoTool::primary_coin_id) {
            state.select(coin_id);
        }
        tracing::debug!(
            tool = %first.name,
            calls = message.tool_calls.len(),
            selected = ?state.selected_coin_id,
            "Model requested tools"
        );
        state.messages.push(message);

        match parsed {
            Ok(tool) if tool.kind() == ToolKind::SearchCryptos => {
                let result = svckit::execute(tool, market, state).await;
                state.messages.push(svckit::result_message(&first, result));
            }
            Ok(_) => {}
            Err(e) => {
                let result = svckit::diagnostic(&first, e);
                state.messages.push(svckit::result_message(&first, result));
            }
        }
    }
}

/// Only the first call is kept, unless it opens a batch of watchlist actions
fn keep_routable(calls: &mut Vec<ToolCall>) {
    let batch = calls
        .first()
        .and_then(|c| ToolKind::from_name(&c.name))
        .is_some_and(ToolKind::is_watchlist_action);
    if !batch && calls.len() > 1 {
        tracing::debug!(dropped = calls.len() - 1, "Keeping only the first tool call");
        calls.truncate(1);
    }
}
