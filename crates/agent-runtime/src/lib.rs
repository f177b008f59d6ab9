//! # agent-runtime
//!
//! Runtime providers for the crypto assistant.
//!
//! ## Providers
//!
//! - **Groq** (default): any OpenAI-compatible chat-completions endpoint with
//!   function calling; Groq is the default base URL
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agent_runtime::groq::GroqProvider;
//!
//! let provider = Arc::new(GroqProvider::from_env()?);
//! let graph = TurnGraph::builder().provider(provider).market(market).build()?;
//! ```

#[cfg(feature = "groq")]
pub mod groq;

#[cfg(feature = "groq")]
pub use groq::{GroqConfig, GroqProvider};

// Re-export core types for convenience
pub use agent_core::{AgentError, LlmProvider, Message, Result, Role};
