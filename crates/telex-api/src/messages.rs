use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use telex_types::api::{MessageResponse, SendMessageRequest, TokenizedPostRequest};

use crate::error::ApiError;
use crate::middleware::Credential;
use crate::{AppState, run_blocking};

pub async fn post_message(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Extension(Credential(token)): Extension<Credential>,
    Json(req): Json<SendMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let request = TokenizedPostRequest::new(token, name, req);
    let message = run_blocking(&state, move |repo| repo.post_message(&request)).await?;

    Ok((StatusCode::CREATED, Json(MessageResponse::from(&message))))
}

pub async fn get_messages(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let messages = run_blocking(&state, move |repo| repo.channel_messages(&name)).await?;

    Ok(Json(
        messages
            .iter()
            .map(MessageResponse::from)
            .collect::<Vec<_>>(),
    ))
}
