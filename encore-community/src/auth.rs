use std::sync::Arc;

use chrono::{Duration, Utc};
use log::warn;
use thiserror::Error;

use crate::{sanitize_text, session_token, Database, DatabaseError, NewSession, SessionData};

/// How long a session may sit idle before it expires
pub const SESSION_TTL_IN_HOURS: i64 = 24;
/// How many times a token collision is retried before giving up
const TOKEN_ATTEMPTS: usize = 3;

/// The maximum length of anything claiming to be a session token
const TOKEN_MAX_CHARS: usize = 200;

/// Manages the access gate and the anonymous sessions behind it
pub struct Auth<Db> {
    database: Arc<Db>,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("No access code was provided")]
    MissingCode,
    #[error("The access code is not valid")]
    InvalidCode,
    #[error("Failed to create a session")]
    SessionCreateFailed,
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// A successful access code redemption
#[derive(Debug, Clone)]
pub struct Redemption {
    pub token: String,
    /// The tier the redeemed code unlocks
    pub kind: String,
}

/// The outcome of checking a code scanned from a QR sticker
#[derive(Debug, Clone)]
pub struct QrCheck {
    pub valid: bool,
    pub kind: Option<String>,
    pub code: Option<String>,
}

impl<Db> Auth<Db>
where
    Db: Database,
{
    pub fn new(database: &Arc<Db>) -> Self {
        Self {
            database: database.clone(),
        }
    }

    /// Redeems an access code, creating a fresh session on success.
    /// The code is matched case-insensitively.
    pub async fn redeem(&self, code: &str) -> Result<Redemption, AuthError> {
        let code = sanitize_text(code).to_uppercase();

        if code.is_empty() {
            return Err(AuthError::MissingCode);
        }

        let access_code = self.database.access_code(&code).await.map_err(|e| match e {
            DatabaseError::NotFound { .. } => AuthError::InvalidCode,
            e => e.into(),
        })?;

        let session = self.create_session().await?;

        Ok(Redemption {
            token: session.token,
            kind: access_code.kind,
        })
    }

    /// Checks a code from a scanned QR sticker without creating a session.
    /// Any active code is valid, the kind tells the caller what it unlocks.
    pub async fn redeem_qr(&self, code: &str) -> Result<QrCheck, AuthError> {
        let code = sanitize_text(code).to_uppercase();

        if code.is_empty() {
            return Err(AuthError::MissingCode);
        }

        match self.database.access_code(&code).await {
            Ok(access_code) => Ok(QrCheck {
                valid: true,
                kind: Some(access_code.kind),
                code: Some(access_code.code),
            }),
            Err(DatabaseError::NotFound { .. }) => Ok(QrCheck {
                valid: false,
                kind: None,
                code: None,
            }),
            Err(e) => Err(e.into()),
        }
    }

    /// Returns true if the token belongs to a live session, sliding its
    /// expiry forward. Expired sessions are deleted on sight.
    pub async fn validate(&self, token: &str) -> Result<bool, AuthError> {
        if token.is_empty() || token.len() > TOKEN_MAX_CHARS {
            return Ok(false);
        }

        let session = match self.database.session_by_token(token).await {
            Ok(session) => session,
            Err(DatabaseError::NotFound { .. }) => return Ok(false),
            Err(e) => return Err(e.into()),
        };

        let now = Utc::now();

        if self.is_expired(&session) {
            self.database.delete_session_by_token(token).await?;
            return Ok(false);
        }

        // Best effort, a missed touch only shortens the window slightly
        if let Err(e) = self.database.touch_session(token, now).await {
            warn!("Failed to touch session: {}", e);
        }

        Ok(true)
    }

    /// Ends a session. Succeeds even if the session is already gone.
    pub async fn revoke(&self, token: &str) -> Result<(), AuthError> {
        self.database.delete_session_by_token(token).await?;
        Ok(())
    }

    fn is_expired(&self, session: &SessionData) -> bool {
        let expires_at = session.last_active + Duration::hours(SESSION_TTL_IN_HOURS);
        Utc::now() > expires_at
    }

    async fn create_session(&self) -> Result<SessionData, AuthError> {
        for _ in 0..TOKEN_ATTEMPTS {
            let now = Utc::now();

            let result = self
                .database
                .create_session(NewSession {
                    token: session_token(),
                    created_at: now,
                    last_active: now,
                })
                .await;

            match result {
                Ok(session) => return Ok(session),
                Err(DatabaseError::Conflict { .. }) => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Err(AuthError::SessionCreateFailed)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{MemoryDatabase, KIND_ALBUM, KIND_SPECIAL};

    fn auth_with_codes() -> Auth<MemoryDatabase> {
        let database = MemoryDatabase::new();
        database.add_access_code("ENCORE", KIND_ALBUM, true);
        database.add_access_code("BACKSTAGE", KIND_SPECIAL, true);
        database.add_access_code("RETIRED", KIND_ALBUM, false);

        Auth::new(&Arc::new(database))
    }

    #[tokio::test]
    async fn redeem_is_case_insensitive() {
        let auth = auth_with_codes();

        let redemption = auth.redeem("  encore  ").await.unwrap();
        assert_eq!(redemption.kind, KIND_ALBUM);
        assert!(auth.validate(&redemption.token).await.unwrap());
    }

    #[tokio::test]
    async fn redeem_rejects_bad_codes() {
        let auth = auth_with_codes();

        assert!(matches!(auth.redeem("").await, Err(AuthError::MissingCode)));
        assert!(matches!(
            auth.redeem("WRONG").await,
            Err(AuthError::InvalidCode)
        ));
        assert!(matches!(
            auth.redeem("RETIRED").await,
            Err(AuthError::InvalidCode)
        ));
    }

    #[tokio::test]
    async fn redemptions_create_distinct_sessions() {
        let auth = auth_with_codes();

        let first = auth.redeem("ENCORE").await.unwrap();
        let second = auth.redeem("ENCORE").await.unwrap();

        assert_ne!(first.token, second.token);
        assert!(auth.validate(&first.token).await.unwrap());
        assert!(auth.validate(&second.token).await.unwrap());
    }

    #[tokio::test]
    async fn validate_fails_closed() {
        let auth = auth_with_codes();

        assert!(!auth.validate("").await.unwrap());
        assert!(!auth.validate("nonsense").await.unwrap());
        assert!(!auth.validate(&"x".repeat(201)).await.unwrap());
    }

    #[tokio::test]
    async fn revoke_is_idempotent() {
        let auth = auth_with_codes();
        let redemption = auth.redeem("ENCORE").await.unwrap();

        auth.revoke(&redemption.token).await.unwrap();
        auth.revoke(&redemption.token).await.unwrap();

        assert!(!auth.validate(&redemption.token).await.unwrap());
    }

    #[tokio::test]
    async fn stale_sessions_expire_on_validation() {
        let database = Arc::new(MemoryDatabase::new());
        let auth = Auth::new(&database);

        let stale = Utc::now() - Duration::hours(SESSION_TTL_IN_HOURS + 1);
        database
            .create_session(NewSession {
                token: "stale-token-1234".to_string(),
                created_at: stale,
                last_active: stale,
            })
            .await
            .unwrap();

        assert!(!auth.validate("stale-token-1234").await.unwrap());
        // The session was deleted, not merely rejected
        assert!(matches!(
            database.session_by_token("stale-token-1234").await,
            Err(DatabaseError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn validation_slides_the_expiry_window() {
        let database = Arc::new(MemoryDatabase::new());
        let auth = Auth::new(&database);

        let earlier = Utc::now() - Duration::hours(SESSION_TTL_IN_HOURS - 1);
        database
            .create_session(NewSession {
                token: "aging-token-1234".to_string(),
                created_at: earlier,
                last_active: earlier,
            })
            .await
            .unwrap();

        assert!(auth.validate("aging-token-1234").await.unwrap());

        let session = database.session_by_token("aging-token-1234").await.unwrap();
        assert!(session.last_active > earlier);
    }

    #[tokio::test]
    async fn qr_checks_never_create_sessions() {
        let auth = auth_with_codes();

        let check = auth.redeem_qr("backstage").await.unwrap();
        assert!(check.valid);
        assert_eq!(check.kind.as_deref(), Some(KIND_SPECIAL));
        assert_eq!(check.code.as_deref(), Some("BACKSTAGE"));

        let wrong = auth.redeem_qr("WRONG").await.unwrap();
        assert!(!wrong.valid);
        assert!(wrong.code.is_none());
    }

    #[tokio::test]
    async fn qr_checks_accept_any_active_code() {
        let auth = auth_with_codes();

        let album = auth.redeem_qr("encore").await.unwrap();
        assert!(album.valid);
        assert_eq!(album.kind.as_deref(), Some(KIND_ALBUM));
        assert_eq!(album.code.as_deref(), Some("ENCORE"));

        let retired = auth.redeem_qr("RETIRED").await.unwrap();
        assert!(!retired.valid);
    }
}
