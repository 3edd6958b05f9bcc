use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::json;

use super::client::ScoringService;
use super::domain::SessionId;
use super::intake::SubmissionInput;
use super::service::{ScreeningService, ScreeningServiceError};
use super::session::{session_from_header, NavigationState, SessionError, SessionStore};

/// Header selecting which operator session a request reads and writes.
pub const SESSION_HEADER: &str = "x-session-id";

/// Router builder exposing the screening endpoints.
pub fn screening_router<S, C>(service: Arc<ScreeningService<S, C>>) -> Router
where
    S: ScoringService + 'static,
    C: SessionStore + 'static,
{
    Router::new()
        .route("/api/v1/screening/evaluate", post(evaluate_handler::<S, C>))
        .route("/api/v1/screening/results", post(results_handler::<S, C>))
        .route("/api/v1/screening/last", get(last_handler::<S, C>))
        .route("/api/v1/screening/compare", post(compare_handler::<S, C>))
        .with_state(service)
}

pub(crate) async fn evaluate_handler<S, C>(
    State(service): State<Arc<ScreeningService<S, C>>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response
where
    S: ScoringService + 'static,
    C: SessionStore + 'static,
{
    let session = match session_for(&headers) {
        Ok(session) => session,
        Err(response) => return response,
    };
    let input: SubmissionInput = match serde_json::from_slice(&body) {
        Ok(input) => input,
        Err(error) => return bad_request(format!("invalid submission body: {error}")),
    };

    match service.evaluate(&session, input).await {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn results_handler<S, C>(
    State(service): State<Arc<ScreeningService<S, C>>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response
where
    S: ScoringService + 'static,
    C: SessionStore + 'static,
{
    let session = match session_for(&headers) {
        Ok(session) => session,
        Err(response) => return response,
    };
    let navigation = match navigation_from_body(&body) {
        Ok(navigation) => navigation,
        Err(response) => return response,
    };

    match service.results(&session, navigation) {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn last_handler<S, C>(
    State(service): State<Arc<ScreeningService<S, C>>>,
    headers: HeaderMap,
) -> Response
where
    S: ScoringService + 'static,
    C: SessionStore + 'static,
{
    let session = match session_for(&headers) {
        Ok(session) => session,
        Err(response) => return response,
    };

    match service.last(&session) {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn compare_handler<S, C>(
    State(service): State<Arc<ScreeningService<S, C>>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response
where
    S: ScoringService + 'static,
    C: SessionStore + 'static,
{
    let session = match session_for(&headers) {
        Ok(session) => session,
        Err(response) => return response,
    };
    let navigation = match navigation_from_body(&body) {
        Ok(navigation) => navigation,
        Err(response) => return response,
    };

    match service.compare(&session, navigation).await {
        Ok(report) => (StatusCode::OK, axum::Json(report)).into_response(),
        Err(error) => error_response(error),
    }
}

fn session_for(headers: &HeaderMap) -> Result<SessionId, Response> {
    let raw = match headers.get(SESSION_HEADER).map(|value| value.to_str()) {
        None => None,
        Some(Ok(value)) => Some(value),
        Some(Err(_)) => {
            return Err(bad_request(format!(
                "{SESSION_HEADER} must be visible ASCII"
            )))
        }
    };
    session_from_header(raw).map_err(|error| bad_request(error.to_string()))
}

/// Empty bodies mean "no navigation state"; anything else goes through the legacy adapter.
fn navigation_from_body(body: &Bytes) -> Result<NavigationState, Response> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(NavigationState::default());
    }

    serde_json::from_slice(body)
        .and_then(NavigationState::from_legacy_value)
        .map_err(|error| bad_request(format!("invalid navigation state: {error}")))
}

fn bad_request(message: String) -> Response {
    let payload = json!({ "error": message });
    (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response()
}

fn error_response(error: ScreeningServiceError) -> Response {
    match error {
        ScreeningServiceError::Validation(errors) => {
            let payload = json!({
                "error": errors.to_string(),
                "fields": errors,
            });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
        ScreeningServiceError::Scoring(error) => {
            let payload = json!({
                "error": error.user_message(),
                "upstream_status": error.status(),
            });
            (StatusCode::BAD_GATEWAY, axum::Json(payload)).into_response()
        }
        ScreeningServiceError::Superseded => {
            let payload = json!({
                "error": ScreeningServiceError::Superseded.to_string(),
            });
            (StatusCode::CONFLICT, axum::Json(payload)).into_response()
        }
        ScreeningServiceError::NoData(message) => {
            let payload = json!({
                "error": message,
            });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        ScreeningServiceError::Session(SessionError::InvalidId(id)) => {
            bad_request(SessionError::InvalidId(id).to_string())
        }
        other => {
            let payload = json!({
                "error": other.to_string(),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}
