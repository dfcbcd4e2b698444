// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! HTTP query and command surface.
//!
//! Query handlers only read a coordinator snapshot. Command handlers go through the
//! dispatcher, so a command's serial line is serialized with forwarded readings.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::io;
use std::path::Path;
use std::sync::Arc;
use thermobridge_core::{Reading, SamplingFrequency, SystemState};
use thermobridge_error::BridgeError;
use thermobridge_exec::{CommandDispatcher, Coordinator};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<Coordinator>,
    pub dispatcher: Arc<CommandDispatcher>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TemperatureResponse {
    pub temperature: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SamplingFrequencyResponse {
    pub sampling_frequency: SamplingFrequency,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemStateResponse {
    pub system_state: SystemState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowTiltResponse {
    pub window_tilt: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
}

impl StatusResponse {
    pub fn success() -> Self {
        Self {
            status: "success".to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandRequest {
    pub command: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub detail: String,
}

/// A [`BridgeError`] rendered as a JSON error response.
#[derive(Debug)]
pub struct ApiError(pub BridgeError);

impl From<BridgeError> for ApiError {
    fn from(err: BridgeError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, label) = match &self.0 {
            BridgeError::UnknownCommand { .. } => (StatusCode::BAD_REQUEST, "Invalid command"),
            BridgeError::InvalidRequest { .. } => {
                (StatusCode::BAD_REQUEST, "Invalid request body")
            }
            err if err.is_client_error() => (StatusCode::BAD_REQUEST, "Invalid request"),
            BridgeError::SerialUnavailable => {
                (StatusCode::SERVICE_UNAVAILABLE, "Actuator unavailable")
            }
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "Internal error"),
        };
        warn!(status = status.as_u16(), error = %self.0, "request rejected");

        let body = ErrorBody {
            error: label.to_owned(),
            detail: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

pub async fn get_temperature(State(state): State<AppState>) -> Json<TemperatureResponse> {
    Json(TemperatureResponse {
        temperature: state.coordinator.latest_temperature(),
    })
}

/// Oldest reading first.
pub async fn get_history(State(state): State<AppState>) -> Json<Vec<Reading>> {
    Json(state.coordinator.history())
}

pub async fn get_sampling_frequency(
    State(state): State<AppState>,
) -> Json<SamplingFrequencyResponse> {
    Json(SamplingFrequencyResponse {
        sampling_frequency: state.coordinator.sampling_frequency(),
    })
}

pub async fn get_system_state(State(state): State<AppState>) -> Json<SystemStateResponse> {
    Json(SystemStateResponse {
        system_state: state.coordinator.system_state(),
    })
}

pub async fn get_window_tilt(State(state): State<AppState>) -> Json<WindowTiltResponse> {
    Json(WindowTiltResponse {
        window_tilt: state.coordinator.window_tilt(),
    })
}

/// Runs `RESET_ALARM`, `AUTO_MODE` or `MANUAL_MODE`.
///
/// The command counts as accepted once it is valid; delivery on the serial line is best
/// effort and is not reported back.
pub async fn send_command(
    State(state): State<AppState>,
    payload: Result<Json<CommandRequest>, JsonRejection>,
) -> Result<Json<StatusResponse>, ApiError> {
    let Json(request) =
        payload.map_err(|rejection| BridgeError::invalid_request(rejection.body_text()))?;
    state.dispatcher.execute_named(&request.command).await?;
    Ok(Json(StatusResponse::success()))
}

/// Empties the history only; state, latch and frequency stay as they are.
pub async fn clear_history(State(state): State<AppState>) -> Json<StatusResponse> {
    state.coordinator.clear_history();
    Json(StatusResponse::success())
}

/// Builds the router. With `web_root`, unmatched paths are served from that directory.
pub fn router(state: AppState, web_root: Option<&Path>) -> Router {
    let api = Router::new()
        .route("/temperature", get(get_temperature))
        .route("/ESP32_temperature", get(get_temperature))
        .route("/temperatureHistory", get(get_history))
        .route("/samplingFrequency", get(get_sampling_frequency))
        .route("/systemState", get(get_system_state))
        .route("/windowTilt", get(get_window_tilt))
        .route("/sendCommand", post(send_command))
        .route("/clearTemperatureHistory", post(clear_history));

    let api = match web_root {
        Some(root) => api.fallback_service(ServeDir::new(root)),
        None => api,
    };

    api.layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serves `router` on `listener` until `cancel` fires, then drains open connections.
///
/// # Errors
/// Returns the I/O error that stopped the server.
pub async fn serve(listener: TcpListener, router: Router, cancel: CancellationToken) -> io::Result<()> {
    let addr = listener.local_addr()?;
    info!(%addr, "http server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(cancel.cancelled_owned())
        .await?;

    info!(%addr, "http server stopped");
    Ok(())
}
