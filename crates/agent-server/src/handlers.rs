//! HTTP Handlers

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use agent_core::{AgentError, Checkpoint, SessionId};
use crypto_assistant::{Coin, TurnSnapshot};

use crate::state::AppState;

// ============================================================================
// Request / Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub provider: String,
    pub provider_ready: bool,
    pub market: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub conversation_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub message: String,
    pub conversation_id: String,
    pub selected_coin_id: Option<String>,
    pub watchlist: Vec<Coin>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, error: impl Into<String>, code: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
            code: code.into(),
        }),
    )
}

fn agent_error(e: &AgentError) -> ApiError {
    tracing::error!("Turn failed: {}", e);
    let status = match e {
        AgentError::Config(_) | AgentError::Auth(_) => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    api_error(status, e.user_message(), e.code())
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        provider: state.graph.provider_name().to_string(),
        provider_ready: state.graph.provider_ready().await,
        market: state.graph.market().provider_name().to_string(),
    })
}

/// Run one conversation turn
pub async fn chat_handler(
    State(state): State<AppState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    if payload.message.trim().is_empty() {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "Message must not be empty",
            "EMPTY_MESSAGE",
        ));
    }

    let session_id = payload
        .conversation_id
        .filter(|id| !id.is_empty())
        .map_or_else(SessionId::new, SessionId::from_string);

    let outcome = state
        .graph
        .invoke(&session_id, &payload.message)
        .await
        .map_err(|e| agent_error(&e))?;

    Ok(Json(ChatResponse {
        message: outcome.reply().unwrap_or_default().to_string(),
        conversation_id: session_id.to_string(),
        selected_coin_id: outcome.state.selected_coin_id.clone(),
        watchlist: outcome.state.watchlist.coins().to_vec(),
    }))
}

/// Latest checkpoint of a session
pub async fn session_snapshot(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Checkpoint<TurnSnapshot>>, ApiError> {
    let session_id = SessionId::from_string(id);
    match state.graph.snapshot(&session_id) {
        Ok(Some(checkpoint)) => Ok(Json(checkpoint)),
        Ok(None) => Err(api_error(
            StatusCode::NOT_FOUND,
            format!("No session {session_id}"),
            "SESSION_NOT_FOUND",
        )),
        Err(e) => Err(agent_error(&e)),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use agent_core::{Completion, GenerationOptions, LlmProvider, Message, Role, ToolSchema};
    use async_trait::async_trait;
    use axum::{
        Router,
        body::{Body, to_bytes},
        http::{Request, StatusCode},
    };
    use crypto_assistant::{MarketData, MockMarketClient, TurnGraph};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use crate::router;
    use crate::state::AppState;

    /// Answers every turn by echoing the user's last message
    struct EchoProvider;

    #[async_trait]
    impl LlmProvider for EchoProvider {
        fn name(&self) -> &str {
            "echo"
        }

        async fn health_check(&self) -> agent_core::Result<bool> {
            Ok(true)
        }

        async fn complete(
            &self,
            messages: &[Message],
            _tools: &[ToolSchema],
            _options: &GenerationOptions,
        ) -> agent_core::Result<Completion> {
            let last = messages
                .iter()
                .rev()
                .find(|m| m.role == Role::User)
                .map_or("", |m| m.content.as_str());
            Ok(Completion::text(format!("You said: {last}"), "echo"))
        }
    }

    fn app() -> Router {
        let graph = TurnGraph::builder()
            .provider(Arc::new(EchoProvider))
            .market(MarketData::new(Arc::new(MockMarketClient::new())))
            .build()
            .unwrap();
        router(AppState {
            graph: Arc::new(graph),
        })
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn chat(body: &Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/chat")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(app(), get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["provider"], "echo");
        assert_eq!(body["provider_ready"], true);
        assert_eq!(body["market"], "MockMarket");
    }

    #[tokio::test]
    async fn test_chat_runs_turn() {
        let (status, body) = send(
            app(),
            chat(&json!({"message": "hi", "conversation_id": "conv-1"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "You said: hi");
        assert_eq!(body["conversation_id"], "conv-1");
        assert_eq!(body["selected_coin_id"], Value::Null);
        assert_eq!(body["watchlist"], json!([]));
    }

    #[tokio::test]
    async fn test_chat_then_snapshot() {
        let app = app();
        let (_, body) = send(app.clone(), chat(&json!({"message": "hello"}))).await;
        let id = body["conversation_id"].as_str().unwrap().to_string();
        assert!(!id.is_empty());

        let (status, snapshot) = send(app, get(&format!("/api/sessions/{id}"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(snapshot["session_id"], id.as_str());
        assert_eq!(snapshot["state"]["next"], Value::Null);
        assert_eq!(snapshot["state"]["state"]["messages"][1]["content"], "You said: hello");
    }

    #[tokio::test]
    async fn test_unknown_session_is_404() {
        let (status, body) = send(app(), get("/api/sessions/missing")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "SESSION_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_empty_message_is_rejected() {
        let (status, body) = send(app(), chat(&json!({"message": "  "}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "EMPTY_MESSAGE");
    }
}
