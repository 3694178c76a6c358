use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    models::{
        auth::AuthenticatedUser,
        pagination::{order_by, PageWindow, Paginated},
        user::{
            normalize_email, RegisterRequest, UpdateUserRequest, User, UserListQuery, UserProfile,
            UserRole, MIN_PASSWORD_LEN,
        },
    },
    services::timezone::parse_timezone,
};

const USER_COLUMNS: &str = "id, email, password_hash, name, role, timezone, created_at, updated_at";

const SORTABLE: &[&str] = &["created_at", "updated_at", "name", "email", "role"];

pub const BCRYPT_COST: u32 = 10;

/// Failures of account operations that map to distinct client responses.
#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("{0}")]
    Validation(String),
    #[error("User with this email already exists")]
    EmailTaken,
    #[error("{0}")]
    Forbidden(&'static str),
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<sqlx::Error> for AccountError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &e {
            if db.is_unique_violation() {
                return AccountError::EmailTaken;
            }
        }
        AccountError::Internal(e.into())
    }
}

fn validate_password(password: &str) -> Result<(), AccountError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AccountError::Validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

fn validate_timezone(tz: &str) -> Result<(), AccountError> {
    parse_timezone(tz).map_err(|e| AccountError::Validation(e.to_string()))?;
    Ok(())
}

/// Role granted to a new account: only an admin caller may choose it.
pub fn resolve_new_role(
    requested: Option<UserRole>,
    caller: Option<&AuthenticatedUser>,
) -> Result<UserRole, AccountError> {
    let caller_is_admin = caller.is_some_and(|c| c.is_admin());
    match requested {
        Some(UserRole::Admin) if !caller_is_admin => {
            Err(AccountError::Forbidden("Only admin can create admin users"))
        }
        Some(role) if caller_is_admin => Ok(role),
        _ => Ok(UserRole::User),
    }
}

pub struct UserService;

impl UserService {
    pub async fn create(
        pool: &PgPool,
        req: &RegisterRequest,
        caller: Option<&AuthenticatedUser>,
        default_timezone: &str,
    ) -> Result<User, AccountError> {
        let name = req.name.trim();
        if name.is_empty() {
            return Err(AccountError::Validation("name must not be empty".into()));
        }
        let email = normalize_email(&req.email).map_err(AccountError::Validation)?;
        validate_password(&req.password)?;
        let timezone = req.timezone.as_deref().unwrap_or(default_timezone);
        validate_timezone(timezone)?;
        let role = resolve_new_role(req.role, caller)?;

        if Self::find_by_email(pool, &email).await?.is_some() {
            return Err(AccountError::EmailTaken);
        }

        let password_hash =
            bcrypt::hash(&req.password, BCRYPT_COST).map_err(|e| AccountError::Internal(e.into()))?;

        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (email, password_hash, name, role, timezone)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {USER_COLUMNS}"
        ))
        .bind(&email)
        .bind(&password_hash)
        .bind(name)
        .bind(role.to_string())
        .bind(timezone)
        .fetch_one(pool)
        .await?;

        tracing::info!("Created {role} account {}", user.id);
        Ok(user)
    }

    pub async fn find(pool: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;
        Ok(user)
    }

    pub async fn find_by_email(pool: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(pool)
        .await?;
        Ok(user)
    }

    pub async fn list(
        pool: &PgPool,
        query: &UserListQuery,
    ) -> anyhow::Result<Paginated<UserProfile>> {
        let window = PageWindow::new(query.page, query.limit);
        let order = order_by(query.sort.as_deref(), SORTABLE);
        let filters = "($1::text IS NULL OR name ILIKE '%' || $1 || '%' OR email ILIKE '%' || $1 || '%')
              AND ($2::text IS NULL OR role = $2)";
        let role = query.role.map(|r| r.to_string());

        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users
             WHERE {filters}
             ORDER BY {order}
             LIMIT $3 OFFSET $4"
        ))
        .bind(&query.search)
        .bind(&role)
        .bind(window.limit)
        .bind(window.offset())
        .fetch_all(pool)
        .await?;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM users WHERE {filters}"))
            .bind(&query.search)
            .bind(&role)
            .fetch_one(pool)
            .await?;

        Ok(Paginated::new(
            users.into_iter().map(UserProfile::from).collect(),
            total,
            window,
        ))
    }

    /// Partial update of `id` on behalf of `caller`. Returns `None` for an unknown id.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        req: &UpdateUserRequest,
        caller: &AuthenticatedUser,
    ) -> Result<Option<User>, AccountError> {
        if req.role.is_some() && !caller.is_admin() {
            return Err(AccountError::Forbidden("Only admin can update user roles"));
        }
        let name = match req.name.as_deref().map(str::trim) {
            Some("") => return Err(AccountError::Validation("name must not be empty".into())),
            other => other,
        };
        let email = req
            .email
            .as_deref()
            .map(normalize_email)
            .transpose()
            .map_err(AccountError::Validation)?;
        if let Some(tz) = &req.timezone {
            validate_timezone(tz)?;
        }
        let password_hash = match &req.password {
            Some(pw) => {
                validate_password(pw)?;
                Some(bcrypt::hash(pw, BCRYPT_COST).map_err(|e| AccountError::Internal(e.into()))?)
            }
            None => None,
        };

        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users
             SET name = COALESCE($1, name),
                 email = COALESCE($2, email),
                 password_hash = COALESCE($3, password_hash),
                 timezone = COALESCE($4, timezone),
                 role = COALESCE($5, role),
                 updated_at = NOW()
             WHERE id = $6
             RETURNING {USER_COLUMNS}"
        ))
        .bind(name)
        .bind(&email)
        .bind(&password_hash)
        .bind(&req.timezone)
        .bind(req.role.map(|r| r.to_string()))
        .bind(id)
        .fetch_optional(pool)
        .await?;
        Ok(user)
    }

    /// Self-service update; the role field is ignored.
    pub async fn update_profile(
        pool: &PgPool,
        caller: &AuthenticatedUser,
        req: UpdateUserRequest,
    ) -> Result<Option<User>, AccountError> {
        let req = UpdateUserRequest { role: None, ..req };
        Self::update(pool, caller.user_id, &req, caller).await
    }

    /// Returns `false` when no row matched. Admins cannot delete their own account.
    pub async fn delete(
        pool: &PgPool,
        id: Uuid,
        caller: &AuthenticatedUser,
    ) -> Result<bool, AccountError> {
        if id == caller.user_id {
            return Err(AccountError::Forbidden("Cannot delete your own account"));
        }
        let res = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caller(role: UserRole) -> AuthenticatedUser {
        AuthenticatedUser {
            user_id: Uuid::new_v4(),
            email: "caller@example.com".into(),
            role,
        }
    }

    #[test]
    fn test_anonymous_cannot_request_admin() {
        assert!(matches!(
            resolve_new_role(Some(UserRole::Admin), None),
            Err(AccountError::Forbidden(_))
        ));
        assert!(matches!(
            resolve_new_role(Some(UserRole::Admin), Some(&caller(UserRole::User))),
            Err(AccountError::Forbidden(_))
        ));
    }

    #[test]
    fn test_admin_chooses_role() {
        let admin = caller(UserRole::Admin);
        assert_eq!(resolve_new_role(Some(UserRole::Admin), Some(&admin)).unwrap(), UserRole::Admin);
        assert_eq!(resolve_new_role(None, Some(&admin)).unwrap(), UserRole::User);
    }

    #[test]
    fn test_default_role_is_user() {
        assert_eq!(resolve_new_role(None, None).unwrap(), UserRole::User);
        assert_eq!(resolve_new_role(Some(UserRole::User), None).unwrap(), UserRole::User);
    }

    #[test]
    fn test_password_length() {
        assert!(validate_password("12345").is_err());
        assert!(validate_password("123456").is_ok());
    }
}
