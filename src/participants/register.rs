use axum::{debug_handler, extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Deserialize;

use crate::{ChatResult, JsonBody};

use super::PresenceManager;

#[derive(Debug, Deserialize)]
pub(crate) struct RegisterBody {
    name: Option<String>,
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn register(
    State(presence): State<PresenceManager>,
    JsonBody(RegisterBody { name }): JsonBody<RegisterBody>,
) -> ChatResult<impl IntoResponse> {
    presence.register(name.as_deref()).await?;
    Ok(StatusCode::CREATED)
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn list_participants(
    State(presence): State<PresenceManager>,
) -> ChatResult<impl IntoResponse> {
    Ok(Json(presence.participants().await?))
}
