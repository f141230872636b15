use crate::config::Config;
use crate::errors::AppError;
use crate::form_controller::{FormController, FormSnapshot};
use crate::models::{
    FormField, PersonType, DEFAULT_CONTACT_PREFERENCE, DEFAULT_CONTACT_WINDOW, DUE_DAY_OPTIONS,
    PLAN_OPTIONS,
};
use crate::submission::SubmitOutcome;
use axum::{
    extract::State,
    http::{StatusCode, Uri},
    routing::{get, patch, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// The form session driven by this host.
    pub form: FormController,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, AppError> {
        let form = FormController::new(&config)?;
        Ok(Self { config, form })
    }
}

#[derive(Debug, Deserialize)]
pub struct ModeRequest {
    pub mode: PersonType,
}

#[derive(Debug, Deserialize)]
pub struct FieldChangeRequest {
    pub field: FormField,
    #[serde(default)]
    pub value: String,
}

/// Routes for the form session. Middleware is layered on by the caller.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/form", get(get_form))
        .route("/api/v1/form/options", get(form_options))
        .route("/api/v1/form/mode", put(set_mode))
        .route("/api/v1/form/fields", patch(change_field))
        .route("/api/v1/form/submit", post(submit_form))
        .route("/api/v1/support-link", get(support_link))
        .fallback(not_found)
        .with_state(state)
}

/// Health check endpoint.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "netway-contact-form",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

/// GET /api/v1/form
pub async fn get_form(State(state): State<Arc<AppState>>) -> Json<FormSnapshot> {
    Json(state.form.snapshot())
}

/// GET /api/v1/form/options
///
/// Choices for the plan and due-day selects, plus the preselected contact
/// preference and window.
pub async fn form_options() -> Json<serde_json::Value> {
    Json(json!({
        "plano": PLAN_OPTIONS,
        "vencimento": DUE_DAY_OPTIONS,
        "formaContato": DEFAULT_CONTACT_PREFERENCE,
        "horario": DEFAULT_CONTACT_WINDOW
    }))
}

/// PUT /api/v1/form/mode
///
/// Switches between Pessoa Física (`pf`) and Pessoa Jurídica (`pj`).
pub async fn set_mode(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ModeRequest>,
) -> Result<Json<FormSnapshot>, AppError> {
    state.form.set_mode(request.mode)?;
    Ok(Json(state.form.snapshot()))
}

/// PATCH /api/v1/form/fields
///
/// Applies one field change. CEP and CNPJ lookups it triggers keep running
/// after the response; poll `GET /api/v1/form` to see their results.
pub async fn change_field(
    State(state): State<Arc<AppState>>,
    Json(request): Json<FieldChangeRequest>,
) -> Result<Json<FormSnapshot>, AppError> {
    tracing::debug!("Field change: {}", request.field.key());
    state.form.handle_field_change(request.field, &request.value)?;
    Ok(Json(state.form.snapshot()))
}

/// POST /api/v1/form/submit
///
/// Resolves once the confirmation is showing (or immediately when the submit
/// is blocked or ignored).
pub async fn submit_form(State(state): State<Arc<AppState>>) -> Json<SubmitOutcome> {
    tracing::info!("POST /api/v1/form/submit");
    Json(state.form.submit().await)
}

/// GET /api/v1/support-link
pub async fn support_link(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(json!({ "url": state.config.support_chat_url }))
}

/// Any route the session does not serve.
pub async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("No route for {}", uri.path()))
}
