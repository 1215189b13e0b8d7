use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use telex_rtm::RtmError;
use telex_types::api::{ChannelResponse, SubscriptionResponse, TokenizedChannelRequest};

use crate::error::ApiError;
use crate::middleware::Credential;
use crate::{AppState, run_blocking};

pub async fn get_channel(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let channel = run_blocking(&state, move |repo| {
        repo.fetch_channel(&name)?
            .ok_or(RtmError::ChannelNotFound(name))
    })
    .await?;

    Ok(Json(ChannelResponse::from(&channel)))
}

pub async fn join_channel(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Extension(Credential(token)): Extension<Credential>,
) -> Result<impl IntoResponse, ApiError> {
    let request = TokenizedChannelRequest::new(token, name);
    let subscription = run_blocking(&state, move |repo| repo.join_channel(&request)).await?;

    Ok((StatusCode::CREATED, Json(SubscriptionResponse::from(&subscription))))
}

/// 200 with the removed subscription, or 204 when the caller was not a member.
pub async fn leave_channel(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Extension(Credential(token)): Extension<Credential>,
) -> Result<Response, ApiError> {
    let request = TokenizedChannelRequest::new(token, name);
    let removed = run_blocking(&state, move |repo| repo.leave_channel(&request)).await?;

    Ok(match removed {
        Some(subscription) => Json(SubscriptionResponse::from(&subscription)).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    })
}
