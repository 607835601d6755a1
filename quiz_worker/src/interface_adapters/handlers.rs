use crate::domain::errors::{AcceptError, VerifyError};
use crate::interface_adapters::protocol::{
    ErrorResponse, GenerateQuizRequest, GenerateQuizResponse, HealthResponse,
};
use crate::interface_adapters::state::AppState;
use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
};
use std::sync::Arc;

// Accept a generation request, schedule it in the background and return immediately.
#[tracing::instrument(
    name = "generate_quiz",
    skip_all,
    fields(quiz_id = %body.quiz_id, user_id = %body.user_id)
)]
pub async fn generate_quiz(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<GenerateQuizRequest>,
) -> Result<Json<GenerateQuizResponse>, (StatusCode, Json<ErrorResponse>)> {
    let token = bearer_token(&headers)
        .ok_or_else(|| error_response(StatusCode::UNAUTHORIZED, "missing bearer token"))?;

    let identity = state.verifier.verify(token).await.map_err(map_verify_error)?;

    let quiz_id = body.quiz_id.clone();
    let handle = state
        .dispatcher
        .accept(&identity, body.into())
        .map_err(map_accept_error)?;
    // Dropping the handle detaches the task from this request.
    drop(handle);

    Ok(Json(GenerateQuizResponse::processing(quiz_id)))
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

// Helper to build a JSON error response.
fn error_response(status: StatusCode, detail: &str) -> (StatusCode, Json<ErrorResponse>) {
    (
        status,
        Json(ErrorResponse {
            detail: detail.to_string(),
        }),
    )
}

fn map_verify_error(err: VerifyError) -> (StatusCode, Json<ErrorResponse>) {
    tracing::info!(error = %err, "token rejected");
    error_response(StatusCode::UNAUTHORIZED, &err.to_string())
}

fn map_accept_error(err: AcceptError) -> (StatusCode, Json<ErrorResponse>) {
    match err {
        AcceptError::IdentityMismatch { .. } => error_response(
            StatusCode::FORBIDDEN,
            "User ID mismatch. You can only generate quizzes for yourself.",
        ),
    }
}
