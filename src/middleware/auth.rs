use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts},
    http::{request::Parts, StatusCode},
    Json,
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde_json::{json, Value};

use crate::models::auth::{AuthenticatedUser, Claims};

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or((StatusCode::UNAUTHORIZED, "Missing Authorization header"))?;

        authenticate(parts, auth_header)
    }
}

/// `Option<AuthenticatedUser>`: `None` without an Authorization header,
/// rejected when a header is present but invalid.
impl<S> OptionalFromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        let Some(auth_header) = parts
            .headers
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
        else {
            return Ok(None);
        };
        authenticate(parts, auth_header).map(Some)
    }
}

fn authenticate(
    parts: &Parts,
    auth_header: &str,
) -> Result<AuthenticatedUser, (StatusCode, &'static str)> {
    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or((StatusCode::UNAUTHORIZED, "Invalid Authorization header format"))?;

    let secret = parts
        .extensions
        .get::<JwtSecret>()
        .ok_or((StatusCode::INTERNAL_SERVER_ERROR, "JWT secret not configured"))?;

    decode_access_token(token, &secret.0)
        .map_err(|_| (StatusCode::UNAUTHORIZED, "Invalid or expired token"))
}

/// Extension type to carry the JWT secret through request extensions.
#[derive(Clone)]
pub struct JwtSecret(pub String);

pub fn decode_access_token(token: &str, secret: &str) -> Result<AuthenticatedUser, anyhow::Error> {
    let key = DecodingKey::from_secret(secret.as_bytes());
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;

    let data = decode::<Claims>(token, &key, &validation)?;
    let claims = data.claims;

    Ok(AuthenticatedUser {
        user_id: claims.sub.parse()?,
        email: claims.email,
        role: claims.role,
    })
}

pub fn require_admin(user: &AuthenticatedUser) -> Result<(), (StatusCode, Json<Value>)> {
    if user.is_admin() {
        Ok(())
    } else {
        Err((StatusCode::FORBIDDEN, Json(json!({ "error": "Admin role required" }))))
    }
}
