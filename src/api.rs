//! REST API Server for the MoneyLingo orchestrator
//!
//! Exposes the request pipeline and the monetization views over HTTP.
//! Every body is wrapped in [`ApiResponse`].

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};

use crate::models::{
    Capability, Language, PlanningDetails, RemittanceDetails, Request, Response, ResponseStatus,
    UserLevel,
};
use crate::orchestrator::Orchestrator;

const ANONYMOUS_USER: &str = "anonymous";

/// =============================
/// Request Models
/// =============================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CapabilityRequest {
    pub user_id: Option<String>,
    #[serde(default)]
    pub text: String,
    /// Explicit target language; detection still runs and is reported
    pub language: Option<Language>,
    #[serde(default)]
    pub user_level: UserLevel,
    #[serde(default)]
    pub voice_output: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlanRequest {
    #[serde(flatten)]
    pub base: CapabilityRequest,
    #[serde(flatten)]
    pub planning: PlanningDetails,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemittanceRequest {
    #[serde(flatten)]
    pub base: CapabilityRequest,
    #[serde(flatten)]
    pub remittance: RemittanceDetails,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub user_id: Option<String>,
    pub messages: Vec<ChatMessage>,
    pub language: Option<Language>,
    #[serde(default)]
    pub user_level: UserLevel,
    #[serde(default)]
    pub voice_output: bool,
}

impl CapabilityRequest {
    fn into_request(self, capability: Option<Capability>) -> Request {
        Request {
            user_id: self
                .user_id
                .filter(|u| !u.trim().is_empty())
                .unwrap_or_else(|| ANONYMOUS_USER.to_string()),
            raw_text: self.text,
            explicit_language: self.language,
            user_level: self.user_level,
            requested_capability: capability,
            voice_output: self.voice_output,
            planning: None,
            remittance: None,
        }
    }
}

/// =============================
/// Response Wrapper
/// =============================

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    pub data: Option<serde_json::Value>,
    pub error: Option<String>,
    pub timestamp: String,
}

impl ApiResponse {
    pub fn success<T: Serialize>(data: T) -> Self {
        Self {
            success: true,
            data: serde_json::to_value(data).ok(),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Wrap a pipeline response. Denied and failed responses keep their
    /// body so clients can still read the detected language and capability.
    pub fn from_response(response: &Response) -> (StatusCode, Self) {
        let status = match response.status {
            ResponseStatus::Ok => StatusCode::OK,
            ResponseStatus::Denied => StatusCode::TOO_MANY_REQUESTS,
            ResponseStatus::Failed => StatusCode::BAD_GATEWAY,
        };

        let body = Self {
            success: response.status == ResponseStatus::Ok,
            data: serde_json::to_value(response).ok(),
            error: response.error.as_ref().map(|e| e.message.clone()),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        (status, body)
    }
}

type ApiResult = (StatusCode, Json<ApiResponse>);

fn bad_request(rejection: JsonRejection) -> ApiResult {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiResponse::error(format!("Invalid request body: {}", rejection.body_text()))),
    )
}

fn missing_text() -> ApiResult {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiResponse::error("Field `text` must not be empty".into())),
    )
}

/// =============================
/// API State
/// =============================

#[derive(Clone)]
pub struct ApiState {
    pub orchestrator: Arc<Orchestrator>,
}

impl ApiState {
    async fn dispatch(&self, request: Request) -> ApiResult {
        let response = self.orchestrator.handle(&request).await;
        let (status, body) = ApiResponse::from_response(&response);
        (status, Json(body))
    }
}

/// =============================
/// Health Endpoint
/// =============================

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "moneylingo-orchestrator",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// =============================
/// Capability Endpoints
/// =============================

async fn translate(
    State(state): State<ApiState>,
    payload: Result<Json<CapabilityRequest>, JsonRejection>,
) -> ApiResult {
    let Json(req) = match payload {
        Ok(p) => p,
        Err(rejection) => return bad_request(rejection),
    };
    if req.text.trim().is_empty() {
        return missing_text();
    }

    state
        .dispatch(req.into_request(Some(Capability::Translate)))
        .await
}

async fn plan(
    State(state): State<ApiState>,
    payload: Result<Json<PlanRequest>, JsonRejection>,
) -> ApiResult {
    let Json(req) = match payload {
        Ok(p) => p,
        Err(rejection) => return bad_request(rejection),
    };

    let PlanRequest { mut base, planning } = req;
    if base.text.trim().is_empty() {
        if planning.goals.is_empty() {
            return missing_text();
        }
        base.text = format!("Create a financial plan for my goals: {}", planning.goals.join("; "));
    }

    let mut request = base.into_request(Some(Capability::FinancialPlan));
    request.planning = Some(planning);
    state.dispatch(request).await
}

async fn analyze_remittance(
    State(state): State<ApiState>,
    payload: Result<Json<RemittanceRequest>, JsonRejection>,
) -> ApiResult {
    let Json(req) = match payload {
        Ok(p) => p,
        Err(rejection) => return bad_request(rejection),
    };

    let RemittanceRequest { mut base, remittance } = req;
    if base.text.trim().is_empty() {
        let Some(amount) = remittance.amount else {
            return missing_text();
        };
        base.text = format!(
            "Analyze sending {:.2} {} from {} to {}",
            amount,
            remittance.currency.as_deref().unwrap_or("USD"),
            remittance.source_country.as_deref().unwrap_or("my country"),
            remittance.destination_country.as_deref().unwrap_or("another country"),
        );
    }

    let mut request = base.into_request(Some(Capability::RemittanceAnalyze));
    request.remittance = Some(remittance);
    state.dispatch(request).await
}

async fn synthesize_voice(
    State(state): State<ApiState>,
    payload: Result<Json<CapabilityRequest>, JsonRejection>,
) -> ApiResult {
    let Json(req) = match payload {
        Ok(p) => p,
        Err(rejection) => return bad_request(rejection),
    };
    if req.text.trim().is_empty() {
        return missing_text();
    }

    state
        .dispatch(req.into_request(Some(Capability::VoiceSynthesize)))
        .await
}

/// Same as voice synthesis but always answers in the detected language
async fn auto_language_voice(
    State(state): State<ApiState>,
    payload: Result<Json<CapabilityRequest>, JsonRejection>,
) -> ApiResult {
    let Json(mut req) = match payload {
        Ok(p) => p,
        Err(rejection) => return bad_request(rejection),
    };
    if req.text.trim().is_empty() {
        return missing_text();
    }

    req.language = None;
    state
        .dispatch(req.into_request(Some(Capability::VoiceSynthesize)))
        .await
}

/// =============================
/// Chat Endpoint
/// =============================

async fn chat_handler(
    State(state): State<ApiState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> ApiResult {
    let Json(req) = match payload {
        Ok(p) => p,
        Err(rejection) => return bad_request(rejection),
    };

    // Only the latest user turn is routed
    let Some(user_msg) = req.messages.iter().rev().find(|m| m.role == "user") else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error("No user message found".into())),
        );
    };

    let base = CapabilityRequest {
        user_id: req.user_id,
        text: user_msg.content.clone(),
        language: req.language,
        user_level: req.user_level,
        voice_output: req.voice_output,
    };
    if base.text.trim().is_empty() {
        return missing_text();
    }

    info!(messages = req.messages.len(), "chat_handler: routing latest user message");
    state.dispatch(base.into_request(None)).await
}

/// =============================
/// Reference & Monetization Endpoints
/// =============================

async fn languages() -> Json<ApiResponse> {
    let items: Vec<_> = Language::ALL
        .iter()
        .map(|l| serde_json::json!({ "code": l.code(), "name": l.name() }))
        .collect();
    Json(ApiResponse::success(items))
}

async fn pricing(State(state): State<ApiState>) -> Json<ApiResponse> {
    Json(ApiResponse::success(state.orchestrator.gate().pricing()))
}

async fn usage(State(state): State<ApiState>, Path(user_id): Path<String>) -> ApiResult {
    match state.orchestrator.gate().usage(&user_id).await {
        Ok(summary) => (StatusCode::OK, Json(ApiResponse::success(summary))),
        Err(e) => {
            error!(%user_id, "Usage lookup failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(e.user_message())),
            )
        }
    }
}

async fn decisions(State(state): State<ApiState>, Path(user_id): Path<String>) -> ApiResult {
    match state.orchestrator.decisions().list_for_user(&user_id).await {
        Ok(records) => (StatusCode::OK, Json(ApiResponse::success(records))),
        Err(e) => {
            error!(%user_id, "Decision lookup failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(e.user_message())),
            )
        }
    }
}

/// =============================
/// Router
/// =============================

pub fn create_router(orchestrator: Arc<Orchestrator>) -> Router {
    let state = ApiState { orchestrator };

    Router::new()
        .route("/health", get(health))
        .route("/api/translate", post(translate))
        .route("/api/plan", post(plan))
        .route("/api/remittance/analyze", post(analyze_remittance))
        .route("/api/voice/synthesize", post(synthesize_voice))
        .route("/api/voice/auto-language", post(auto_language_voice))
        .route("/api/chat", post(chat_handler))
        .route("/api/languages", get(languages))
        .route("/api/monetization/pricing", get(pricing))
        .route("/api/monetization/usage/:user_id", get(usage))
        .route("/api/decisions/:user_id", get(decisions))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}

/// =============================
/// Server Startup
/// =============================

pub async fn start_server(
    orchestrator: Arc<Orchestrator>,
    host: &str,
    port: u16,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let router = create_router(orchestrator);

    let listener = tokio::net::TcpListener::bind(format!("{}:{}", host, port)).await?;

    info!("API Server listening on http://{}:{}", host, port);
    info!("Local: http://127.0.0.1:{}", port);

    axum::serve(listener, router).await?;

    Ok(())
}
