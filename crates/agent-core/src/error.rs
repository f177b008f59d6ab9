//! Error Types

use thiserror::Error;

/// Result type alias for agent operations
pub type Result<T> = std::result::Result<T, AgentError>;

/// Agent error types
#[derive(Error, Debug)]
pub enum AgentError {
    /// LLM provider error
    #[error("Provider error: {0}")]
    Provider(String),

    /// Provider unavailable or not responding
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// Tool name outside the declared tool set
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// Tool arguments missing or of the wrong shape
    #[error("Tool validation error: {0}")]
    ToolValidation(String),

    /// Turn exceeded its step limit
    #[error("Maximum steps ({0}) reached")]
    MaxSteps(usize),

    /// Parse error (e.g., provider response decoding)
    #[error("Parse error: {0}")]
    Parse(String),

    /// Session / checkpoint error
    #[error("Session error: {0}")]
    Session(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Rate limited
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Authentication failed
    #[error("Authentication failed: {0}")]
    Auth(String),

}

impl AgentError {
    /// Convert to a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            Self::Provider(msg) => format!("The AI service encountered an error: {msg}"),
            Self::ProviderUnavailable(_) => {
                "The AI service is currently unavailable. Please try again.".into()
            }
            Self::ToolNotFound(name) => format!("The tool '{name}' is not available."),
            Self::ToolValidation(msg) => format!("Invalid tool input: {msg}"),
            Self::MaxSteps(_) => {
                "The request took too long to process. Please try a simpler query.".into()
            }
            Self::Session(msg) => format!("Conversation state error: {msg}"),
            Self::RateLimited(_) => "You've made too many requests. Please wait a moment.".into(),
            Self::Auth(_) => "Authentication failed. Please check your credentials.".into(),
            _ => "An unexpected error occurred.".into(),
        }
    }

    /// Short machine-readable code for API responses
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Provider(_) => "PROVIDER_ERROR",
            Self::ProviderUnavailable(_) => "PROVIDER_UNAVAILABLE",
            Self::ToolNotFound(_) => "TOOL_NOT_FOUND",
            Self::ToolValidation(_) => "TOOL_VALIDATION",
            Self::MaxSteps(_) => "MAX_STEPS",
            Self::Parse(_) => "PARSE_ERROR",
            Self::Session(_) => "SESSION_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::RateLimited(_) => "RATE_LIMITED",
            Self::Auth(_) => "AUTH_FAILED",
        }
    }
}
