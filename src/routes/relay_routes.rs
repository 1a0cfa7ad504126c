use axum::body::Body;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::header::{CACHE_CONTROL, CONNECTION, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use axum::Json;
use newsroom_protocol::RelayRequest;

use crate::errors::AppError;
use crate::service::relay_service::RelayService;

/// POST `/api/ai-chat` — streams the assistant reply as text-delta frames.
pub async fn ai_chat_handler(
    State(svc): State<RelayService>,
    payload: Result<Json<RelayRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(request) = payload.map_err(|e| AppError::InvalidRequest { message: e.body_text() })?;
    let frames = svc.open_stream(request).await?;

    Ok((
        [
            (CONTENT_TYPE, "text/plain; charset=utf-8"),
            (CACHE_CONTROL, "no-cache"),
            (CONNECTION, "keep-alive"),
        ],
        Body::from_stream(frames),
    )
        .into_response())
}

/// GET `/health` — liveness probe
pub async fn health_handler() -> &'static str {
    "ok"
}
