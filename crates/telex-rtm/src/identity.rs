use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use telex_db::{DbError, UserStore};
use telex_types::api::Claims;
use telex_types::models::User;
use thiserror::Error;
use tracing::debug;

/// Maps an opaque bearer credential to the user it belongs to.
pub trait IdentityResolver: Send + Sync {
    fn resolve(&self, credential: &str) -> Result<User, ResolveError>;
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("invalid token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),
    #[error("token subject {0} is not a known user")]
    UnknownUser(i64),
    #[error(transparent)]
    Storage(#[from] DbError),
}

/// Resolves HS256-signed JWTs whose `sub` claim is a user id.
pub struct JwtResolver {
    users: UserStore,
    key: DecodingKey,
    validation: Validation,
}

impl JwtResolver {
    pub fn new(secret: &str, users: UserStore) -> Self {
        Self {
            users,
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::default(),
        }
    }
}

impl IdentityResolver for JwtResolver {
    fn resolve(&self, credential: &str) -> Result<User, ResolveError> {
        let data = decode::<Claims>(credential, &self.key, &self.validation)?;
        let sub = data.claims.sub;
        let user = self.users.get(sub)?.ok_or(ResolveError::UnknownUser(sub))?;
        debug!("Resolved credential to user {} ({})", user.username, user.id);
        Ok(user)
    }
}

/// Signs a credential for `user` valid for `ttl`.
pub fn issue_token(secret: &str, user: &User, ttl: chrono::Duration) -> jsonwebtoken::errors::Result<String> {
    let claims = Claims {
        sub: user.id,
        username: user.username.clone(),
        exp: (chrono::Utc::now() + ttl).timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}
