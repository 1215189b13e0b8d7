use axum::{extract::Request, http::StatusCode, middleware::Next, response::Response};
use axum_extra::TypedHeader;
use axum_extra::headers::{Authorization, authorization::Bearer};

/// Raw bearer token of the caller. Resolution to a user happens in the
/// repository.
#[derive(Debug, Clone)]
pub struct Credential(pub String);

/// Extract the bearer token from the Authorization header.
pub async fn require_credential(
    auth: Option<TypedHeader<Authorization<Bearer>>>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let TypedHeader(Authorization(bearer)) = auth.ok_or(StatusCode::UNAUTHORIZED)?;

    req.extensions_mut()
        .insert(Credential(bearer.token().to_string()));
    Ok(next.run(req).await)
}
