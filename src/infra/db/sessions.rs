use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    application::repos::{CreateSessionParams, ProfilesRepo, RepoError, SessionsRepo},
    domain::{
        entities::{ProfileRecord, SessionRecord},
        types::UserRole,
    },
};

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct SessionRow {
    id: Uuid,
    prefix: String,
    user_id: Uuid,
    token_hash: Vec<u8>,
    expires_at: OffsetDateTime,
    created_at: OffsetDateTime,
}

impl From<SessionRow> for SessionRecord {
    fn from(row: SessionRow) -> Self {
        Self {
            id: row.id,
            prefix: row.prefix,
            user_id: row.user_id,
            token_hash: row.token_hash,
            expires_at: row.expires_at,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ProfileRow {
    id: Uuid,
    email: String,
    role: UserRole,
}

#[async_trait]
impl SessionsRepo for PostgresRepositories {
    async fn create_session(
        &self,
        params: CreateSessionParams,
    ) -> Result<SessionRecord, RepoError> {
        let row = sqlx::query_as::<_, SessionRow>(
            r#"
            INSERT INTO sessions (id, prefix, user_id, token_hash, expires_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, prefix, user_id, token_hash, expires_at, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&params.prefix)
        .bind(params.user_id)
        .bind(&params.token_hash)
        .bind(params.expires_at)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(SessionRecord::from(row))
    }

    async fn find_session_by_prefix(
        &self,
        prefix: &str,
    ) -> Result<Option<SessionRecord>, RepoError> {
        let row = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT id, prefix, user_id, token_hash, expires_at, created_at
            FROM sessions
            WHERE prefix = $1
            "#,
        )
        .bind(prefix)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(SessionRecord::from))
    }
}

#[async_trait]
impl ProfilesRepo for PostgresRepositories {
    async fn find_profile(&self, id: Uuid) -> Result<Option<ProfileRecord>, RepoError> {
        let row = sqlx::query_as::<_, ProfileRow>(
            r#"
            SELECT id, email, role
            FROM profiles
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(|row| ProfileRecord {
            id: row.id,
            email: row.email,
            role: row.role,
        }))
    }
}
