//! Turn Graph
//!
//! Cyclic state machine that runs one conversation turn:
//!
//! ```text
//!            ┌──────────────── tool result ◄──────────────────┐
//!            ▼                                                 │
//!  user ─► Dialogue ──router──► Prices / Insights ─────────────┤
//!            │         │                                       │
//!            │         └──► WatchlistAnnounce ─► WatchlistExecute
//!            ▼
//!          reply (end of turn)
//! ```
//!
//! Every step is checkpointed, so a turn interrupted mid-flight can be resumed
//! or inspected. Steps of one session never overlap; sessions run independently.

mod dialogue;
mod nodes;
mod router;
#[cfg(test)]
mod testing;

pub use dialogue::DialogueNode;
pub use router::{Node, Route, route};

use std::sync::Arc;

use agent_core::{
    AgentError, Checkpoint, CheckpointStore, GenerationOptions, LlmProvider,
    MemoryCheckpointStore, Message, Result, Role, SessionId, SessionLocks,
};
use serde::{Deserialize, Serialize};

use crate::ASSISTANT_PROMPT;
use crate::market::MarketData;
use crate::state::SessionState;

/// Default step limit of one turn
pub const DEFAULT_MAX_STEPS: usize = 25;

/// Graph configuration
#[derive(Clone, Debug)]
pub struct GraphConfig {
    /// System instruction sent ahead of every completion request
    pub system_prompt: String,

    /// Steps allowed per turn before it is cut off
    pub max_steps: usize,

    pub generation: GenerationOptions,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            system_prompt: ASSISTANT_PROMPT.into(),
            max_steps: DEFAULT_MAX_STEPS,
            generation: GenerationOptions::default(),
        }
    }
}

impl GraphConfig {
    /// Reads `MAX_TURN_STEPS` and `GROQ_MODEL`
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Ok(raw) = std::env::var("MAX_TURN_STEPS") {
            config.max_steps = raw
                .parse()
                .map_err(|_| AgentError::Config(format!("MAX_TURN_STEPS must be a number, got '{raw}'")))?;
        }
        if let Ok(model) = std::env::var("GROQ_MODEL") {
            if !model.is_empty() {
                config.generation.model = model;
            }
        }
        Ok(config)
    }
}

/// What is checkpointed after each step
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TurnSnapshot {
    /// Node that just ran; `None` before the first step of a turn
    pub node: Option<Node>,

    /// Node the turn continues with; `None` once the turn has ended
    pub next: Option<Node>,

    pub state: SessionState,
}

/// Result of running a turn
#[derive(Clone, Debug)]
pub struct TurnOutcome {
    pub session_id: SessionId,
    pub state: SessionState,
    /// Steps run by this call
    pub steps: usize,
}

impl TurnOutcome {
    /// Text that closed the turn: the assistant reply or a diagnostic
    pub fn reply(&self) -> Option<&str> {
        self.state
            .messages
            .last()
            .filter(|m| matches!(m.role, Role::Assistant | Role::System))
            .map(|m| m.content.as_str())
    }
}

pub struct TurnGraph {
    dialogue: DialogueNode,
    market: MarketData,
    store: Arc<dyn CheckpointStore<TurnSnapshot>>,
    locks: SessionLocks,
    max_steps: usize,
}

impl TurnGraph {
    pub fn builder() -> TurnGraphBuilder {
        TurnGraphBuilder::new()
    }

    pub fn provider_name(&self) -> &str {
        self.dialogue.provider_name()
    }

    /// Whether the completion service answers its health check
    pub async fn provider_ready(&self) -> bool {
        self.dialogue.provider_ready().await
    }

    pub fn market(&self) -> &MarketData {
        &self.market
    }

    /// Append a user message to the session and run the turn to its end
    pub async fn invoke(&self, session_id: &SessionId, user_text: &str) -> Result<TurnOutcome> {
        let _guard = self.locks.acquire(session_id).await?;

        let (mut state, step) = match self.store.load(session_id)? {
            Some(checkpoint) => {
                if let Some(next) = checkpoint.state.next {
                    tracing::warn!(%session_id, %next, "Previous turn was interrupted; starting a new one");
                }
                (checkpoint.state.state, checkpoint.step)
            }
            None => {
                tracing::info!(%session_id, "New session");
                (SessionState::new(), 0)
            }
        };

        nodes::close_pending(&mut state);
        state.messages.push(Message::user(user_text));
        self.save(session_id, step, None, Some(Node::Dialogue), &state)?;

        self.run(session_id, state, Node::Dialogue, step).await
    }

    /// Continue a turn whose last checkpoint still has a pending node
    pub async fn resume(&self, session_id: &SessionId) -> Result<TurnOutcome> {
        let _guard = self.locks.acquire(session_id).await?;

        let checkpoint = self
            .store
            .load(session_id)?
            .ok_or_else(|| AgentError::Session(format!("Unknown session: {session_id}")))?;

        match checkpoint.state.next {
            Some(next) => {
                tracing::info!(%session_id, %next, step = checkpoint.step, "Resuming turn");
                self.run(session_id, checkpoint.state.state, next, checkpoint.step)
                    .await
            }
            None => Ok(TurnOutcome {
                session_id: session_id.clone(),
                state: checkpoint.state.state,
                steps: 0,
            }),
        }
    }

    /// Latest checkpoint of a session
    pub fn snapshot(&self, session_id: &SessionId) -> Result<Option<Checkpoint<TurnSnapshot>>> {
        self.store.load(session_id)
    }

    async fn run(
        &self,
        session_id: &SessionId,
        mut state: SessionState,
        mut node: Node,
        mut step: u64,
    ) -> Result<TurnOutcome> {
        let mut steps = 0;
        let mut last = None;

        loop {
            if steps >= self.max_steps {
                tracing::warn!(%session_id, max_steps = self.max_steps, "Turn hit the step limit");
                nodes::close_pending(&mut state);
                state.messages.push(Message::system(format!(
                    "An error occurred: {}",
                    AgentError::MaxSteps(self.max_steps)
                )));
                self.save(session_id, step, last, None, &state)?;
                break;
            }

            tracing::debug!(%session_id, %node, step, "Running node");
            self.step(node, &mut state).await;
            steps += 1;
            step += 1;
            last = Some(node);

            let next = Self::next(node, &state);
            self.save(session_id, step, last, next, &state)?;

            match next {
                Some(n) => node = n,
                None => break,
            }
        }

        tracing::info!(
            %session_id,
            steps,
            messages = state.messages.len(),
            watchlist = state.watchlist.len(),
            "Turn complete"
        );
        Ok(TurnOutcome {
            session_id: session_id.clone(),
            state,
            steps,
        })
    }

    async fn step(&self, node: Node, state: &mut SessionState) {
        match node {
            Node::Dialogue => self.dialogue.run(&self.market, state).await,
            _ => nodes::handle(node, &self.market, state).await,
        }
    }

    fn next(node: Node, state: &SessionState) -> Option<Node> {
        match node {
            Node::Dialogue => match route(state.messages.messages()) {
                Route::Goto(next) => Some(next),
                Route::End => None,
            },
            Node::WatchlistAnnounce => Some(Node::WatchlistExecute),
            Node::Prices | Node::Insights | Node::WatchlistExecute => Some(Node::Dialogue),
        }
    }

    fn save(
        &self,
        session_id: &SessionId,
        step: u64,
        node: Option<Node>,
        next: Option<Node>,
        state: &SessionState,
    ) -> Result<()> {
        let snapshot = TurnSnapshot {
            node,
            next,
            state: state.clone(),
        };
        self.store
            .save(Checkpoint::new(session_id.clone(), step, snapshot))
    }
}

/// Builder for `TurnGraph`
pub struct TurnGraphBuilder {
    provider: Option<Arc<dyn LlmProvider>>,
    market: Option<MarketData>,
    store: Option<Arc<dyn CheckpointStore<TurnSnapshot>>>,
    config: GraphConfig,
}

impl Default for TurnGraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TurnGraphBuilder {
    pub fn new() -> Self {
        Self {
            provider: None,
            market: None,
            store: None,
            config: GraphConfig::default(),
        }
    }

    pub fn provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn market(mut self, market: MarketData) -> Self {
        self.market = Some(market);
        self
    }

    pub fn store(mut self, store: Arc<dyn CheckpointStore<TurnSnapshot>>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn config(mut self, config: GraphConfig) -> Self {
        self.config = config;
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = prompt.into();
        self
    }

    pub fn max_steps(mut self, max: usize) -> Self {
        self.config.max_steps = max;
        self
    }

    pub fn build(self) -> Result<TurnGraph> {
        let provider = self
            .provider
            .ok_or_else(|| AgentError::Config("Provider is required".into()))?;
        let market = self
            .market
            .ok_or_else(|| AgentError::Config("Market data client is required".into()))?;
        let store: Arc<dyn CheckpointStore<TurnSnapshot>> = match self.store {
            Some(store) => store,
            None => Arc::new(MemoryCheckpointStore::<TurnSnapshot>::new()),
        };

        Ok(TurnGraph {
            dialogue: DialogueNode::new(provider, self.config.system_prompt, self.config.generation),
            market,
            store,
            locks: SessionLocks::new(),
            max_steps: self.config.max_steps,
        })
    }
}
