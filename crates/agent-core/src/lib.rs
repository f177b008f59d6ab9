//! # agent-core
//!
//! Core conversation types with a provider-agnostic, tool-calling LLM abstraction.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Turn Graph                            │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────────┐  │
//! │  │ Conversation│  │ Tool calls  │  │   LlmProvider       │  │
//! │  │  + Session  │──│  + schemas  │──│   (Strategy)        │  │
//! │  └─────────────┘  └─────────────┘  └─────────────────────┘  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The `LlmProvider` trait enables swapping between Groq, OpenAI, or any other
//! tool-calling backend without changing routing logic.

pub mod error;
pub mod message;
pub mod provider;
pub mod session;
pub mod tool;

pub use error::{AgentError, Result};
pub use message::{Conversation, Message, Role};
pub use provider::{Completion, GenerationOptions, LlmProvider};
pub use session::{
    Checkpoint, CheckpointStore, MemoryCheckpointStore, SessionGuard, SessionId, SessionLocks,
};
pub use tool::{ParameterSchema, ToolCall, ToolResult, ToolSchema};
