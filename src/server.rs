//! HTTP event source: axum router and request handlers.
//!
//! The server runs on the tokio async runtime while the sketch thread runs on
//! a plain `std::thread`. Each request that carries a gesture or button press
//! becomes one `SketchCommand::Input` on the channel; nothing here touches the
//! sketch directly.
//!
//! ## Rust concepts
//! - axum extractors: `State`, `Json`
//! - Serde `Deserialize` for parsing JSON request bodies
//! - `tower-http` middleware for request tracing and CORS

use crate::render::{SketchCommand, SketchStatus};
use crate::sketch::{Button, Event, Gesture};
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, post};
use serde::Deserialize;
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

// ── App State ────────────────────────────────────────────────────────

/// Shared application state, passed to every handler via axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Channel to send commands to the sketch thread
    pub command_tx: Sender<SketchCommand>,
    /// Latest sketch snapshot (sketch thread writes, handlers read)
    pub status: Arc<Mutex<SketchStatus>>,
}

// ── OpenAPI Documentation ────────────────────────────────────────────

#[derive(OpenApi)]
#[openapi(
    paths(get_status, post_gesture, post_button),
    components(schemas(
        SketchStatus,
        crate::picture::Cell,
        Gesture,
        Button,
        GestureRequest,
        ButtonRequest,
    )),
    tags(
        (name = "input", description = "Gesture and button events"),
        (name = "system", description = "System status endpoints"),
    ),
    info(
        title = "LED Sketch API",
        version = env!("CARGO_PKG_VERSION"),
        description = "Drive a 5x5 LED etch-a-sketch with gestures and button presses"
    )
)]
pub struct ApiDoc;

// ── Request types ────────────────────────────────────────────────────

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct GestureRequest {
    /// One of tilt_left, tilt_right, tilt_up, tilt_down, shake
    #[schema(example = "tilt_left")]
    gesture: Gesture,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct ButtonRequest {
    /// a toggles the cell under the cursor, ab saves, b restores or resumes
    #[schema(example = "a")]
    button: Button,
}

// ── Router ───────────────────────────────────────────────────────────

/// Build the axum router with all API endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(
            SwaggerUi::new("/docs")
                .url("/api-docs/openapi.json", ApiDoc::openapi())
                .config(utoipa_swagger_ui::Config::new(["/api-docs/openapi.json"]).validator_url("none")),
        )
        .route("/api/v1/status", get(get_status))
        .route("/api/v1/gesture", post(post_gesture))
        .route("/api/v1/button", post(post_button))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ── Handlers ─────────────────────────────────────────────────────────

/// GET /api/v1/status: return the current sketch snapshot
#[utoipa::path(
    get,
    path = "/api/v1/status",
    tag = "system",
    responses(
        (status = 200, description = "Current sketch state", body = SketchStatus),
        (status = 500, description = "Status unavailable")
    )
)]
async fn get_status(
    State(state): State<AppState>,
) -> Result<Json<SketchStatus>, (StatusCode, String)> {
    let status = state
        .status
        .lock()
        .map_err(|_| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Sketch status unavailable".to_string(),
            )
        })?
        .clone();
    Ok(Json(status))
}

/// POST /api/v1/gesture: report a motion gesture
#[utoipa::path(
    post,
    path = "/api/v1/gesture",
    tag = "input",
    request_body = GestureRequest,
    responses(
        (status = 200, description = "Gesture delivered"),
        (status = 500, description = "Sketch thread gone")
    )
)]
async fn post_gesture(
    State(state): State<AppState>,
    Json(req): Json<GestureRequest>,
) -> Result<StatusCode, (StatusCode, String)> {
    send_input(&state, req.gesture.into())
}

/// POST /api/v1/button: report a button press
#[utoipa::path(
    post,
    path = "/api/v1/button",
    tag = "input",
    request_body = ButtonRequest,
    responses(
        (status = 200, description = "Button press delivered"),
        (status = 500, description = "Sketch thread gone")
    )
)]
async fn post_button(
    State(state): State<AppState>,
    Json(req): Json<ButtonRequest>,
) -> Result<StatusCode, (StatusCode, String)> {
    send_input(&state, req.button.into())
}

fn send_input(state: &AppState, event: Event) -> Result<StatusCode, (StatusCode, String)> {
    state
        .command_tx
        .send(SketchCommand::Input(event))
        .map_err(|_| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Sketch thread gone".to_string(),
            )
        })?;

    Ok(StatusCode::OK)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use std::sync::mpsc;

    #[rstest]
    #[case(r#"{"gesture":"tilt_left"}"#, Gesture::TiltLeft)]
    #[case(r#"{"gesture":"tilt_right"}"#, Gesture::TiltRight)]
    #[case(r#"{"gesture":"tilt_up"}"#, Gesture::TiltUp)]
    #[case(r#"{"gesture":"tilt_down"}"#, Gesture::TiltDown)]
    #[case(r#"{"gesture":"shake"}"#, Gesture::Shake)]
    fn gesture_request_parses(#[case] body: &str, #[case] expected: Gesture) {
        let req: GestureRequest = serde_json::from_str(body).unwrap();
        assert_eq!(req.gesture, expected);
    }

    #[rstest]
    #[case(r#"{"button":"a"}"#, Button::A)]
    #[case(r#"{"button":"b"}"#, Button::B)]
    #[case(r#"{"button":"ab"}"#, Button::AB)]
    fn button_request_parses(#[case] body: &str, #[case] expected: Button) {
        let req: ButtonRequest = serde_json::from_str(body).unwrap();
        assert_eq!(req.button, expected);
    }

    #[rstest]
    #[case(r#"{"gesture":"spin"}"#)]
    #[case(r#"{"gesture":"TiltLeft"}"#)]
    #[case(r#"{}"#)]
    fn unknown_gesture_is_rejected(#[case] body: &str) {
        assert!(serde_json::from_str::<GestureRequest>(body).is_err());
    }

    #[test]
    fn status_serializes_hidden_cursor_as_null() {
        let json = serde_json::to_value(SketchStatus::new()).unwrap();
        assert_eq!(json["cursor"], serde_json::Value::Null);
        assert_eq!(json["picture"][0], serde_json::json!([0, 0, 0, 0, 0]));
    }

    #[test]
    fn send_input_forwards_event() {
        let (tx, rx) = mpsc::channel();
        let state = AppState {
            command_tx: tx,
            status: Arc::new(Mutex::new(SketchStatus::new())),
        };
        assert_eq!(send_input(&state, Button::A.into()), Ok(StatusCode::OK));
        assert_eq!(rx.try_recv(), Ok(SketchCommand::Input(Event::Button(Button::A))));
    }

    #[test]
    fn send_input_reports_missing_thread() {
        let (tx, rx) = mpsc::channel();
        drop(rx);
        let state = AppState {
            command_tx: tx,
            status: Arc::new(Mutex::new(SketchStatus::new())),
        };
        let (code, _) = send_input(&state, Gesture::Shake.into()).unwrap_err();
        assert_eq!(code, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn openapi_lists_input_routes() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/v1/gesture"));
        assert!(doc.paths.paths.contains_key("/api/v1/button"));
        assert!(doc.paths.paths.contains_key("/api/v1/status"));
    }

    #[test]
    fn cursor_serializes_as_xy() {
        let json = serde_json::to_value(crate::picture::Cell::CENTER).unwrap();
        assert_eq!(json, serde_json::json!({"x": 2, "y": 2}));
    }
}
