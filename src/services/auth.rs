use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use sqlx::PgPool;

use crate::{
    models::{
        auth::{AuthenticatedUser, Claims},
        user::{normalize_email, AuthResponse, LoginRequest, RegisterRequest, User, UserRole},
    },
    services::users::{AccountError, UserService},
};

pub struct AuthService;

impl AuthService {
    /// Create an account and sign the new user in.
    pub async fn register(
        pool: &PgPool,
        req: &RegisterRequest,
        caller: Option<&AuthenticatedUser>,
        default_timezone: &str,
        jwt_secret: &str,
        access_ttl: u64,
    ) -> Result<AuthResponse, AccountError> {
        let user = UserService::create(pool, req, caller, default_timezone).await?;
        let access_token = Self::generate_access_token(&user, jwt_secret, access_ttl)?;
        Ok(AuthResponse {
            access_token,
            user: user.into(),
        })
    }

    /// Validate credentials. Unknown email and wrong password are indistinguishable.
    pub async fn login(
        pool: &PgPool,
        req: &LoginRequest,
        jwt_secret: &str,
        access_ttl: u64,
    ) -> Result<AuthResponse, AccountError> {
        let email = normalize_email(&req.email).map_err(|_| AccountError::InvalidCredentials)?;
        let user = UserService::find_by_email(pool, &email)
            .await?
            .ok_or(AccountError::InvalidCredentials)?;

        let valid = bcrypt::verify(&req.password, &user.password_hash)
            .map_err(|_| AccountError::InvalidCredentials)?;
        if !valid {
            return Err(AccountError::InvalidCredentials);
        }

        let access_token = Self::generate_access_token(&user, jwt_secret, access_ttl)?;
        Ok(AuthResponse {
            access_token,
            user: user.into(),
        })
    }

    pub fn generate_access_token(
        user: &User,
        jwt_secret: &str,
        access_ttl: u64,
    ) -> anyhow::Result<String> {
        let role: UserRole = user.role.parse().unwrap_or(UserRole::User);
        let now = Utc::now().timestamp() as usize;
        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            role,
            iat: now,
            exp: now + access_ttl as usize,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(jwt_secret.as_bytes()),
        )?;
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::auth::decode_access_token;
    use uuid::Uuid;

    const SECRET: &str = "test-secret-test-secret-test-secret!";

    fn user(role: &str) -> User {
        User {
            id: Uuid::new_v4(),
            email: "cook@example.com".into(),
            password_hash: String::new(),
            name: "Cook".into(),
            role: role.into(),
            timezone: "Asia/Bangkok".into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_token_round_trip() {
        let u = user("admin");
        let token = AuthService::generate_access_token(&u, SECRET, 3600).unwrap();
        let decoded = decode_access_token(&token, SECRET).unwrap();
        assert_eq!(decoded.user_id, u.id);
        assert_eq!(decoded.role, UserRole::Admin);
        assert_eq!(decoded.email, "cook@example.com");
    }

    #[test]
    fn test_token_rejected_with_other_secret() {
        let token = AuthService::generate_access_token(&user("user"), SECRET, 3600).unwrap();
        assert!(decode_access_token(&token, "another-secret-another-secret-xx").is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let u = user("user");
        let past = (Utc::now().timestamp() - 3600) as usize;
        let claims = Claims {
            sub: u.id.to_string(),
            email: u.email.clone(),
            role: UserRole::User,
            iat: past - 60,
            exp: past,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();
        assert!(decode_access_token(&token, SECRET).is_err());
    }
}
