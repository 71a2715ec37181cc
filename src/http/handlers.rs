use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::control::parse_toggle;
use crate::export::recipients_csv;
use crate::monitor::StatusSnapshot;
use crate::recipient::{DeliveryRecord, Recipient};
use crate::storage::run_blocking;

use super::error::ApiError;
use super::AppState;

/// Body of `POST /register`.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    /// Phone number to register.
    #[serde(default)]
    pub numero: Option<String>,
}

/// Query of every admin endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct AdminQuery {
    /// Admin key.
    pub clave: Option<String>,
    /// Toggle value for `/pausar` and `/modo_simulacion`.
    pub on: Option<String>,
}

/// Body of `GET /status`.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    #[serde(flatten)]
    snapshot: StatusSnapshot,
    registrados: usize,
}

fn authorize(state: &AppState, query: &AdminQuery) -> Result<(), ApiError> {
    if state.credential.verify(query.clave.as_deref()) {
        return Ok(());
    }
    warn!(key_supplied = query.clave.is_some(), "admin request rejected");
    Err(ApiError::Forbidden)
}

async fn listed(state: &AppState) -> Result<Vec<Recipient>, ApiError> {
    let store = Arc::clone(&state.recipients);
    Ok(run_blocking(move || store.list_recipients()).await?)
}

pub(crate) async fn register(
    State(state): State<AppState>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(request) = body.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    let recipient = Recipient::parse(request.numero.as_deref().unwrap_or_default())?;

    let store = Arc::clone(&state.recipients);
    let entry = recipient.clone();
    let added = run_blocking(move || store.add_recipient(entry)).await?;
    if added {
        info!(recipient = %recipient.fingerprint(), "recipient registered");
    }
    Ok(Json(json!({ "ok": true, "registrado": recipient })))
}

pub(crate) async fn list_recipients(
    State(state): State<AppState>,
    Query(query): Query<AdminQuery>,
) -> Result<Json<Vec<Recipient>>, ApiError> {
    authorize(&state, &query)?;
    Ok(Json(listed(&state).await?))
}

pub(crate) async fn delivery_history(
    State(state): State<AppState>,
    Query(query): Query<AdminQuery>,
) -> Result<Json<Vec<DeliveryRecord>>, ApiError> {
    authorize(&state, &query)?;
    let store = Arc::clone(&state.deliveries);
    Ok(Json(run_blocking(move || store.read_deliveries()).await?))
}

pub(crate) async fn status(
    State(state): State<AppState>,
    Query(query): Query<AdminQuery>,
) -> Result<Json<StatusResponse>, ApiError> {
    authorize(&state, &query)?;
    let registrados = listed(&state).await?.len();
    Ok(Json(StatusResponse {
        snapshot: state.control.status_snapshot(),
        registrados,
    }))
}

pub(crate) async fn export_csv(
    State(state): State<AppState>,
    Query(query): Query<AdminQuery>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&state, &query)?;
    let body = recipients_csv(&listed(&state).await?);
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"numeros.csv\""),
        ],
        body,
    ))
}

pub(crate) async fn pause(
    State(state): State<AppState>,
    Query(query): Query<AdminQuery>,
) -> Result<Json<Value>, ApiError> {
    authorize(&state, &query)?;
    if let Some(raw) = query.on.as_deref() {
        let on = parse_toggle("on", raw)?;
        state.control.set_paused(on);
        info!(paused = on, "pause toggled");
    }
    Ok(Json(json!({ "pausado": state.control.is_paused() })))
}

pub(crate) async fn simulation(
    State(state): State<AppState>,
    Query(query): Query<AdminQuery>,
) -> Result<Json<Value>, ApiError> {
    authorize(&state, &query)?;
    if let Some(raw) = query.on.as_deref() {
        let on = parse_toggle("on", raw)?;
        state.control.set_simulation(on);
        info!(simulation = on, "simulation mode toggled");
    }
    Ok(Json(json!({ "modo_simulacion": state.control.is_simulation() })))
}

pub(crate) async fn send_test(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let recipient = state
        .test_recipient
        .as_ref()
        .ok_or_else(|| ApiError::Unavailable("No hay número de prueba configurado".to_string()))?;
    state.dispatcher.send_test(recipient).await.map_err(|err| {
        warn!(recipient = %recipient.fingerprint(), error = %err, "test message failed");
        ApiError::from(err)
    })?;
    Ok(Json(json!({ "status": "mensaje enviado con éxito" })))
}

pub(crate) async fn healthz() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
