//! PostgreSQL Repository Implementations

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::entity::{oauth_identity::OAuthIdentity, user::User};
use crate::domain::repository::{OAuthIdentityRepository, UserRepository};
use crate::domain::value_object::{
    email::Email,
    identity_token::TokenHash,
    provider_name::ProviderName,
    user_id::{OAuthIdentityId, UserId},
};
use crate::error::{AuthError, AuthResult};

/// PostgreSQL-backed auth repository
#[derive(Clone)]
pub struct PgAuthRepository {
    pool: PgPool,
}

impl PgAuthRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// SQLSTATE 23505
fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505"))
}

// ============================================================================
// User Repository Implementation
// ============================================================================

impl UserRepository for PgAuthRepository {
    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT
                user_id,
                email,
                display_name,
                created_at,
                updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(UserRow::into_user))
    }

    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT
                user_id,
                email,
                display_name,
                created_at,
                updated_at
            FROM users
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(UserRow::into_user))
    }

    async fn create(&self, user: &User) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (
                user_id,
                email,
                display_name,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(user.user_id.as_uuid())
        .bind(user.email.as_str())
        .bind(user.display_name.as_deref())
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AuthError::EmailTaken
            } else {
                AuthError::from(e)
            }
        })?;

        Ok(())
    }
}

// ============================================================================
// OAuth Identity Repository Implementation
// ============================================================================

impl OAuthIdentityRepository for PgAuthRepository {
    async fn find_by_provider_and_user(
        &self,
        provider: &ProviderName,
        user_id: &UserId,
    ) -> AuthResult<Option<OAuthIdentity>> {
        let row = sqlx::query_as::<_, OAuthIdentityRow>(
            r#"
            SELECT
                identity_id,
                provider,
                user_id,
                token_hash,
                created_at,
                updated_at
            FROM oauth_identities
            WHERE provider = $1 AND user_id = $2
            "#,
        )
        .bind(provider.as_str())
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(OAuthIdentityRow::into_identity))
    }

    async fn create(&self, identity: &OAuthIdentity) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO oauth_identities (
                identity_id,
                provider,
                user_id,
                token_hash,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(identity.identity_id.as_uuid())
        .bind(identity.provider.as_str())
        .bind(identity.user_id.as_uuid())
        .bind(identity.token_hash.as_str())
        .bind(identity.created_at)
        .bind(identity.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AuthError::IdentityAlreadyLinked
            } else {
                AuthError::from(e)
            }
        })?;

        Ok(())
    }

    async fn update_token_hash(&self, identity: &OAuthIdentity) -> AuthResult<()> {
        sqlx::query(
            r#"
            UPDATE oauth_identities SET
                token_hash = $2,
                updated_at = $3
            WHERE identity_id = $1
            "#,
        )
        .bind(identity.identity_id.as_uuid())
        .bind(identity.token_hash.as_str())
        .bind(identity.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

// ============================================================================
// Row Types
// ============================================================================

#[derive(sqlx::FromRow)]
struct UserRow {
    user_id: Uuid,
    email: String,
    display_name: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> User {
        User {
            user_id: UserId::from_uuid(self.user_id),
            email: Email::from_db(self.email),
            display_name: self.display_name,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct OAuthIdentityRow {
    identity_id: Uuid,
    provider: String,
    user_id: Uuid,
    token_hash: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OAuthIdentityRow {
    fn into_identity(self) -> OAuthIdentity {
        OAuthIdentity {
            identity_id: OAuthIdentityId::from_uuid(self.identity_id),
            provider: ProviderName::from_db(self.provider),
            user_id: UserId::from_uuid(self.user_id),
            token_hash: TokenHash::from_db(self.token_hash),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
