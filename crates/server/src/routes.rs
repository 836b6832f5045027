//! JSON API routes.
//!
//! - `GET  /api/health`                — liveness probe
//! - `POST /api/chat`                  — web-grounded chat with citations
//! - `POST /api/generate`              — plain text generation
//! - `POST /api/application/generate`  — application document, base or
//!   AI-enhanced depending on whether a business description is supplied
//!
//! Remote-runtime failures on the chat path are converted into `{"error"}`
//! payloads rather than transport-level failures; the local dev UI reads
//! them from the body.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use hojokin_agent::{AgentRuntime, ApplicationFormGenerator, EnhancedDocument, ToolDescriptor};
use hojokin_core::subsidy::SubsidyInfo;
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};
use uuid::Uuid;

#[derive(Clone)]
pub struct ApiState {
    pub runtime: Arc<AgentRuntime>,
    pub generator: Arc<ApplicationFormGenerator>,
}

// ---------------------------------------------------------------------------
// Request / Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Default, Serialize)]
pub struct ChatResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub prompt: String,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub generated_text: String,
    pub success: bool,
}

#[derive(Debug, Deserialize)]
pub struct ApplicationFormRequest {
    pub subsidy_info: Option<SubsidyInfo>,
    pub business_description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ApplicationFormResponse {
    pub template: String,
    pub ai_enhanced: bool,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn router(state: ApiState) -> Router {
    // The service fronts a local dev UI; origins are left open.
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route("/api/health", get(health))
        .route("/api/chat", post(chat))
        .route("/api/generate", post(generate))
        .route("/api/application/generate", post(generate_application))
        .layer(cors)
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

async fn chat(State(state): State<ApiState>, Json(body): Json<ChatRequest>) -> Json<ChatResponse> {
    let correlation_id = Uuid::new_v4().simple().to_string();
    info!(
        event_name = "api.chat.received",
        correlation_id = %correlation_id,
        "chat message received"
    );

    match state.runtime.ask(&body.message, Some(ToolDescriptor::WebGrounding)).await {
        Ok(reply) => {
            info!(
                event_name = "api.chat.replied",
                correlation_id = %correlation_id,
                citation_count = reply.citations.len(),
                "chat reply produced"
            );
            Json(ChatResponse {
                response: Some(reply.text),
                sources: (!reply.citations.is_empty()).then_some(reply.citations),
                query: reply.query,
                error: None,
            })
        }
        Err(ask_error) => {
            error!(
                event_name = "api.chat.failed",
                correlation_id = %correlation_id,
                error = %ask_error,
                "chat request failed"
            );
            Json(ChatResponse { error: Some(ask_error.to_string()), ..ChatResponse::default() })
        }
    }
}

async fn generate(
    State(state): State<ApiState>,
    Json(body): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, (StatusCode, Json<ErrorResponse>)> {
    let correlation_id = Uuid::new_v4().simple().to_string();
    let prompt = body.prompt.trim();
    if prompt.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse { error: "prompt is required".to_string() }),
        ));
    }

    match state.runtime.ask(prompt, None).await {
        Ok(reply) => Ok(Json(GenerateResponse { generated_text: reply.text, success: true })),
        Err(ask_error) => {
            error!(
                event_name = "api.generate.failed",
                correlation_id = %correlation_id,
                error = %ask_error,
                "text generation failed"
            );
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse { error: ask_error.to_string() }),
            ))
        }
    }
}

async fn generate_application(
    State(state): State<ApiState>,
    Json(body): Json<ApplicationFormRequest>,
) -> Result<Json<ApplicationFormResponse>, (StatusCode, Json<ErrorResponse>)> {
    let correlation_id = Uuid::new_v4().simple().to_string();
    let Some(info) = body.subsidy_info else {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse { error: "subsidy_info is required".to_string() }),
        ));
    };

    let business_description =
        body.business_description.as_deref().map(str::trim).filter(|text| !text.is_empty());

    let response = match business_description {
        Some(description) => {
            info!(
                event_name = "api.application.enhanced_requested",
                correlation_id = %correlation_id,
                "AI-enhanced application document requested"
            );
            let EnhancedDocument { template, ai_enhanced } =
                state.generator.generate_ai_enhanced(&info, description).await;
            ApplicationFormResponse { template, ai_enhanced }
        }
        None => {
            info!(
                event_name = "api.application.base_requested",
                correlation_id = %correlation_id,
                "base application document requested"
            );
            ApplicationFormResponse { template: state.generator.generate(&info), ai_enhanced: false }
        }
    };

    Ok(Json(response))
}
