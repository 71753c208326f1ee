use std::sync::Arc;

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use thiserror::Error;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::application::repos::{CreateSessionParams, ProfilesRepo, RepoError, SessionsRepo};
use crate::domain::entities::SessionRecord;
use crate::domain::types::UserRole;

const TOKEN_PREFIX: &str = "fl";
const MIN_SECRET_LEN: usize = 32;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing session token")]
    Missing,
    #[error("invalid session token")]
    Invalid,
    #[error("expired session")]
    Expired,
    #[error("admin role required")]
    Forbidden,
    #[error("profile `{0}` does not exist")]
    UnknownUser(Uuid),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone)]
pub struct SessionIssued {
    pub record: SessionRecord,
    pub token: String,
}

/// Authenticated caller.
#[derive(Debug, Clone)]
pub struct SessionPrincipal {
    pub session_id: Uuid,
    pub user_id: Uuid,
    pub role: UserRole,
}

#[derive(Clone)]
pub struct AuthService {
    sessions: Arc<dyn SessionsRepo>,
    profiles: Arc<dyn ProfilesRepo>,
    session_ttl: Duration,
}

impl AuthService {
    pub fn new(
        sessions: Arc<dyn SessionsRepo>,
        profiles: Arc<dyn ProfilesRepo>,
        session_ttl: Duration,
    ) -> Self {
        Self {
            sessions,
            profiles,
            session_ttl,
        }
    }

    /// Create a session for an existing profile and return its bearer token.
    ///
    /// The token is only ever shown here; the store keeps a hash.
    pub async fn issue_session(&self, user_id: Uuid) -> Result<SessionIssued, AuthError> {
        if self.profiles.find_profile(user_id).await?.is_none() {
            return Err(AuthError::UnknownUser(user_id));
        }

        let prefix = Self::generate_prefix();
        let secret = Self::generate_secret();
        let token = format!("{TOKEN_PREFIX}_{prefix}_{secret}");

        let record = self
            .sessions
            .create_session(CreateSessionParams {
                user_id,
                prefix,
                token_hash: Self::hash_secret(&secret),
                expires_at: OffsetDateTime::now_utc() + self.session_ttl,
            })
            .await?;

        Ok(SessionIssued { record, token })
    }

    pub async fn authenticate(&self, token: &str) -> Result<SessionPrincipal, AuthError> {
        let parsed = Self::parse_token(token).ok_or(AuthError::Invalid)?;
        let session = self
            .sessions
            .find_session_by_prefix(&parsed.prefix)
            .await?
            .ok_or(AuthError::Invalid)?;

        let hashed_input = Self::hash_secret(&parsed.secret);
        if session.token_hash.ct_eq(&hashed_input).unwrap_u8() == 0 {
            return Err(AuthError::Invalid);
        }

        if session.expires_at <= OffsetDateTime::now_utc() {
            return Err(AuthError::Expired);
        }

        let profile = self
            .profiles
            .find_profile(session.user_id)
            .await?
            .ok_or(AuthError::Invalid)?;

        Ok(SessionPrincipal {
            session_id: session.id,
            user_id: profile.id,
            role: profile.role,
        })
    }

    /// Authenticate and require the admin role.
    pub async fn require_admin(&self, token: Option<&str>) -> Result<SessionPrincipal, AuthError> {
        let token = token.ok_or(AuthError::Missing)?;
        let principal = self.authenticate(token).await?;
        if !principal.role.is_admin() {
            return Err(AuthError::Forbidden);
        }
        Ok(principal)
    }

    /// Short fingerprint of a token hash, safe for logs.
    pub fn fingerprint(record: &SessionRecord) -> String {
        hex::encode(&record.token_hash[..record.token_hash.len().min(6)])
    }

    fn hash_secret(secret: &str) -> Vec<u8> {
        let mut hasher = Sha256::new();
        hasher.update(secret.as_bytes());
        hasher.finalize().to_vec()
    }

    fn generate_prefix() -> String {
        Uuid::new_v4().simple().to_string()[..12].to_string()
    }

    fn generate_secret() -> String {
        format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
    }

    fn parse_token(token: &str) -> Option<ParsedToken> {
        let mut parts = token.trim().splitn(3, '_');
        if parts.next()? != TOKEN_PREFIX {
            return None;
        }
        let prefix = parts.next()?;
        let secret = parts.next()?;
        if prefix.is_empty() || secret.len() < MIN_SECRET_LEN {
            return None;
        }
        Some(ParsedToken {
            prefix: prefix.to_string(),
            secret: secret.to_string(),
        })
    }
}

struct ParsedToken {
    prefix: String,
    secret: String,
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::domain::entities::ProfileRecord;

    #[derive(Default)]
    struct FakeAuthStore {
        sessions: Mutex<Vec<SessionRecord>>,
        profiles: Vec<ProfileRecord>,
    }

    #[async_trait]
    impl SessionsRepo for FakeAuthStore {
        async fn create_session(
            &self,
            params: CreateSessionParams,
        ) -> Result<SessionRecord, RepoError> {
            let record = SessionRecord {
                id: Uuid::new_v4(),
                prefix: params.prefix,
                user_id: params.user_id,
                token_hash: params.token_hash,
                expires_at: params.expires_at,
                created_at: OffsetDateTime::now_utc(),
            };
            self.sessions.lock().unwrap().push(record.clone());
            Ok(record)
        }

        async fn find_session_by_prefix(
            &self,
            prefix: &str,
        ) -> Result<Option<SessionRecord>, RepoError> {
            Ok(self
                .sessions
                .lock()
                .unwrap()
                .iter()
                .find(|s| s.prefix == prefix)
                .cloned())
        }
    }

    #[async_trait]
    impl ProfilesRepo for FakeAuthStore {
        async fn find_profile(&self, id: Uuid) -> Result<Option<ProfileRecord>, RepoError> {
            Ok(self.profiles.iter().find(|p| p.id == id).cloned())
        }
    }

    fn profile(role: UserRole) -> ProfileRecord {
        ProfileRecord {
            id: Uuid::new_v4(),
            email: format!("{}@florista.test", role.as_str()),
            role,
        }
    }

    fn service(profiles: Vec<ProfileRecord>, ttl: Duration) -> AuthService {
        let store = Arc::new(FakeAuthStore {
            profiles,
            ..Default::default()
        });
        AuthService::new(store.clone(), store, ttl)
    }

    #[tokio::test]
    async fn issued_token_authenticates_admin() {
        let admin = profile(UserRole::Admin);
        let service = service(vec![admin.clone()], Duration::hours(1));

        let issued = service.issue_session(admin.id).await.unwrap();
        assert!(issued.token.starts_with("fl_"));
        assert_eq!(AuthService::fingerprint(&issued.record).len(), 12);

        let principal = service.require_admin(Some(&issued.token)).await.unwrap();
        assert_eq!(principal.user_id, admin.id);
        assert_eq!(principal.session_id, issued.record.id);
    }

    #[tokio::test]
    async fn customer_is_forbidden() {
        let customer = profile(UserRole::Customer);
        let service = service(vec![customer.clone()], Duration::hours(1));
        let issued = service.issue_session(customer.id).await.unwrap();

        assert!(matches!(
            service.require_admin(Some(&issued.token)).await,
            Err(AuthError::Forbidden)
        ));
    }

    #[tokio::test]
    async fn missing_tampered_and_expired_tokens_are_rejected() {
        let admin = profile(UserRole::Admin);
        let service = service(vec![admin.clone()], Duration::seconds(-1));
        let issued = service.issue_session(admin.id).await.unwrap();

        assert!(matches!(
            service.require_admin(None).await,
            Err(AuthError::Missing)
        ));
        assert!(matches!(
            service.authenticate("not-a-token").await,
            Err(AuthError::Invalid)
        ));

        let mut tampered = issued.token.clone();
        tampered.pop();
        tampered.push('0');
        if tampered != issued.token {
            assert!(matches!(
                service.authenticate(&tampered).await,
                Err(AuthError::Invalid)
            ));
        }

        assert!(matches!(
            service.authenticate(&issued.token).await,
            Err(AuthError::Expired)
        ));
    }

    #[tokio::test]
    async fn sessions_require_an_existing_profile() {
        let service = service(Vec::new(), Duration::hours(1));
        assert!(matches!(
            service.issue_session(Uuid::nil()).await,
            Err(AuthError::UnknownUser(_))
        ));
    }
}
