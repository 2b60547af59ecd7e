//! Axum route handlers for the rahl HTTP server.
//!
//! # Routes
//!
//! - `GET  /health`       : Returns `{"status": "ok", "version": "0.3.0"}`
//! - `GET  /capabilities` : List registered capabilities
//! - `POST /detect`       : Route free text to a capability name
//! - `POST /execute`      : Run a named capability
//! - `POST /chat`         : Detect and run in one step, with a canned fallback

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::capabilities::{CapabilityRegistry, CapabilitySummary, RegistryError};

/// Reply used by `/chat` when no capability handles the message.
pub const FALLBACK_REPLY: &str =
    "I'm RAHL AI. Ask me to calculate, summarize or hash something and I'll get to work.";

/// Shared application state for the HTTP server.
#[derive(Clone)]
pub struct AppState {
    /// Registry built at startup; read-only from here on.
    pub registry: Arc<CapabilityRegistry>,
}

impl AppState {
    pub fn new(registry: CapabilityRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }
}

type ApiError = (StatusCode, Json<Value>);

/// Build the axum router with all routes.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/capabilities", get(list_handler))
        .route("/detect", post(detect_handler))
        .route("/execute", post(execute_handler))
        .route("/chat", post(chat_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Map a registry error onto an HTTP status and JSON body.
fn error_response(err: RegistryError) -> ApiError {
    match err {
        RegistryError::NotFound(_) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": err.to_string() })),
        ),
        RegistryError::Execution {
            capability,
            failure,
        } => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({
                "error": failure.message,
                "details": failure.details,
                "capability": capability,
            })),
        ),
    }
}

/// GET /health: liveness check.
async fn health_handler() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": crate::VERSION,
        "service": "rahl",
    }))
}

/// GET /capabilities: name, description and version of every capability.
async fn list_handler(State(state): State<AppState>) -> Json<Value> {
    let capabilities: Vec<CapabilitySummary> = state.registry.list().collect();
    Json(json!({
        "count": capabilities.len(),
        "capabilities": capabilities,
    }))
}

#[derive(Debug, Deserialize)]
struct DetectRequest {
    text: String,
}

/// POST /detect: `{ "text": "..." }` → `{ "capability": name | null, "registered": bool }`
async fn detect_handler(
    State(state): State<AppState>,
    Json(request): Json<DetectRequest>,
) -> Json<Value> {
    let detected = state.registry.detect(&request.text);
    let registered = detected.map_or(false, |name| state.registry.contains(name));
    Json(json!({
        "capability": detected,
        "registered": registered,
    }))
}

#[derive(Debug, Deserialize)]
struct ExecuteRequest {
    capability: String,
    input: String,
    #[serde(default)]
    options: Value,
}

/// POST /execute: run a capability by name.
///
/// Request: `{ "capability": "calculator", "input": "2+2", "options": {} }`
///
/// Unknown capabilities answer 404; failures raised by the capability answer
/// 422 with its message and details untouched.
async fn execute_handler(
    State(state): State<AppState>,
    Json(request): Json<ExecuteRequest>,
) -> Result<Json<Value>, ApiError> {
    let result = state
        .registry
        .execute(&request.capability, &request.input, &request.options)
        .await
        .map_err(|e| {
            tracing::debug!(capability = %request.capability, error = %e, "execute failed");
            error_response(e)
        })?;

    Ok(Json(json!({
        "capability": request.capability,
        "result": result,
    })))
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    message: String,
    #[serde(default)]
    options: Value,
}

/// POST /chat: detect a capability for the message and run it.
///
/// Messages that match no rule, or match a capability that is not
/// registered, get the canned reply with `"capability": null`.
async fn chat_handler(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<Value>, ApiError> {
    let detected = state
        .registry
        .detect(&request.message)
        .filter(|name| state.registry.contains(name));

    let Some(name) = detected else {
        return Ok(Json(json!({
            "reply": FALLBACK_REPLY,
            "capability": null,
        })));
    };

    let result = state
        .registry
        .execute(name, &request.message, &request.options)
        .await
        .map_err(error_response)?;

    let reply = result
        .get("formatted")
        .or_else(|| result.get("summary"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| format!("Done with {}.", name));

    Ok(Json(json!({
        "reply": reply,
        "capability": name,
        "result": result,
    })))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    use crate::capabilities::load_registry;
    use crate::config::RahlConfig;

    fn test_app() -> Router {
        app_router(AppState::new(load_registry(&RahlConfig::default())))
    }

    async fn send(app: Router, method: &str, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("Content-Type", "application/json")
            .body(if method == "GET" {
                Body::empty()
            } else {
                Body::from(serde_json::to_string(&body).unwrap())
            })
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let (status, json) = send(test_app(), "GET", "/health", Value::Null).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
        assert_eq!(json["version"], crate::VERSION);
        assert_eq!(json["service"], "rahl");
    }

    #[tokio::test]
    async fn test_list_capabilities() {
        let (status, json) = send(test_app(), "GET", "/capabilities", Value::Null).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["count"], 3);
        assert_eq!(json["capabilities"][0]["name"], "calculator");
        assert_eq!(
            json["capabilities"][0]["description"],
            "Perform mathematical calculations"
        );
    }

    #[tokio::test]
    async fn test_detect() {
        let (_, json) = send(test_app(), "POST", "/detect", json!({"text": "please calculate 2+2"})).await;
        assert_eq!(json["capability"], "calculator");
        assert_eq!(json["registered"], true);

        let (_, json) = send(test_app(), "POST", "/detect", json!({"text": "search for cats"})).await;
        assert_eq!(json["capability"], "web_search");
        assert_eq!(json["registered"], false);

        let (_, json) = send(test_app(), "POST", "/detect", json!({"text": "good morning"})).await;
        assert!(json["capability"].is_null());
    }

    #[tokio::test]
    async fn test_execute_calculator() {
        let (status, json) = send(
            test_app(),
            "POST",
            "/execute",
            json!({"capability": "calculator", "input": "2+2"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["capability"], "calculator");
        assert_eq!(json["result"]["result"], "4");
    }

    #[tokio::test]
    async fn test_execute_unknown_is_404() {
        let (status, json) = send(
            test_app(),
            "POST",
            "/execute",
            json!({"capability": "nonexistent", "input": "x"}),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"], "Capability 'nonexistent' not found");
    }

    #[tokio::test]
    async fn test_execute_failure_is_422() {
        let (status, json) = send(
            test_app(),
            "POST",
            "/execute",
            json!({"capability": "calculator", "input": "1/0"}),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json["error"], "Division by zero");
        assert_eq!(json["details"]["expression"], "1/0");
        assert_eq!(json["capability"], "calculator");
    }

    #[tokio::test]
    async fn test_chat_runs_detected_capability() {
        let (status, json) = send(
            test_app(),
            "POST",
            "/chat",
            json!({"message": "please calculate 6*7"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["capability"], "calculator");
        assert_eq!(json["reply"], "42");
    }

    #[tokio::test]
    async fn test_chat_reaches_summarizer_and_encryption() {
        let message = "Summarize: the meeting ran long. Nobody took notes.";
        let (status, json) = send(test_app(), "POST", "/chat", json!({"message": message})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["capability"], "summarizer");
        assert_eq!(json["reply"], message);

        let (status, json) = send(
            test_app(),
            "POST",
            "/chat",
            json!({"message": "hash this sentence please"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["capability"], "encryption");
        assert_eq!(json["reply"], "Done with encryption.");
        assert_eq!(json["result"]["encoding"], "hex");
        assert_eq!(json["result"]["hash"].as_str().unwrap().len(), 64);
    }

    #[tokio::test]
    async fn test_chat_capability_failure_is_422() {
        let (status, json) = send(test_app(), "POST", "/chat", json!({"message": "calculate it."})).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json["error"], "Invalid number '.'");
        assert_eq!(json["details"]["expression"], "calculate it.");
        assert_eq!(json["capability"], "calculator");

        let nested = format!("calculate {}1{}", "(".repeat(10_000), ")".repeat(10_000));
        let (status, json) = send(test_app(), "POST", "/chat", json!({"message": nested})).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json["error"], "Expression too deeply nested");
    }

    #[tokio::test]
    async fn test_chat_fallback() {
        for message in ["good morning", "search for cats"] {
            let (status, json) = send(test_app(), "POST", "/chat", json!({"message": message})).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(json["reply"], FALLBACK_REPLY);
            assert!(json["capability"].is_null());
        }
    }

    #[tokio::test]
    async fn test_malformed_body_rejected() {
        let request = Request::builder()
            .method("POST")
            .uri("/execute")
            .header("Content-Type", "application/json")
            .body(Body::from("{\"capability\": 1"))
            .unwrap();
        let response = test_app().oneshot(request).await.unwrap();
        assert!(response.status().is_client_error());
    }
}
