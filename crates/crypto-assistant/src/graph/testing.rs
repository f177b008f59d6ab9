//! Scripted provider for graph tests

use std::collections::VecDeque;
use std::sync::Mutex;

use agent_core::{
    AgentError, Completion, GenerationOptions, LlmProvider, Message, Result, ToolSchema,
};
use async_trait::async_trait;

/// Replays queued completions, then repeats `repeat` (if any) forever
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<Result<Completion>>>,
    repeat: Option<Completion>,
    requests: Mutex<Vec<Vec<Message>>>,
    tool_count: Mutex<usize>,
}

impl ScriptedProvider {
    pub fn new(replies: Vec<Result<Completion>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            repeat: None,
            requests: Mutex::new(Vec::new()),
            tool_count: Mutex::new(0),
        }
    }

    pub fn repeating(completion: Completion) -> Self {
        Self {
            repeat: Some(completion),
            ..Self::new(Vec::new())
        }
    }

    pub fn requests(&self) -> Vec<Vec<Message>> {
        self.requests.lock().unwrap().clone()
    }

    pub fn tool_count(&self) -> usize {
        *self.tool_count.lock().unwrap()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    async fn complete(
        &self,
        messages: &[Message],
        tools: &[ToolSchema],
        _options: &GenerationOptions,
    ) -> Result<Completion> {
        self.requests.lock().unwrap().push(messages.to_vec());
        *self.tool_count.lock().unwrap() = tools.len();

        let next = self.replies.lock().unwrap().pop_front();
        match next {
            Some(reply) => reply,
            None => self
                .repeat
                .clone()
                .ok_or_else(|| AgentError::Provider("script exhausted".into())),
        }
    }
}
