//! Session tokens
//!
//! Access and refresh tokens are HS256 JWTs carrying the user id, a token
//! type and a random `jti`. Access tokens are checked statelessly. A refresh
//! token is only honoured while its digest is still recorded in the store, so
//! rotating or revoking it invalidates the old value even before it expires.

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::{AuthError, ServiceError, ServiceResult};
use crate::db::{CatalogStore, StoreError};
use crate::models::TokenPair;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// Claims embedded in every token. Anything that does not deserialize into
/// this shape is rejected as [`AuthError::InvalidToken`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
    #[serde(rename = "tokenType")]
    pub token_type: TokenType,
}

#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    access_ttl_secs: i64,
    refresh_ttl_secs: i64,
}

impl TokenService {
    pub fn new(secret: &str, access_ttl_secs: i64, refresh_ttl_secs: i64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            access_ttl_secs,
            refresh_ttl_secs,
        }
    }

    fn sign(&self, user_id: &str, token_type: TokenType, ttl_secs: i64) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            user_id: user_id.to_string(),
            exp: now + ttl_secs,
            iat: now,
            jti: uuid::Uuid::new_v4().to_string(),
            token_type,
        };

        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?)
    }

    /// Mint a fresh access/refresh pair. Nothing is recorded.
    pub fn issue_pair(&self, user_id: &str) -> Result<TokenPair, AuthError> {
        Ok(TokenPair {
            access_token: self.sign(user_id, TokenType::Access, self.access_ttl_secs)?,
            refresh_token: self.sign(user_id, TokenType::Refresh, self.refresh_ttl_secs)?,
        })
    }

    /// Check signature, expiry and claim shape. Never touches the store.
    pub fn parse_and_validate(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!(reason = %e, "token rejected");
                AuthError::InvalidToken
            })
    }

    fn parse_typed(&self, token: &str, expected: TokenType) -> Result<Claims, AuthError> {
        let claims = self.parse_and_validate(token)?;
        if claims.token_type != expected {
            debug!(user_id = %claims.user_id, "token of the wrong type presented");
            return Err(AuthError::InvalidToken);
        }
        Ok(claims)
    }

    /// Identity behind a bearer access token
    pub fn authenticate(&self, access_token: &str) -> Result<String, AuthError> {
        self.parse_typed(access_token, TokenType::Access)
            .map(|claims| claims.user_id)
    }

    /// Issue a pair and record its refresh token against the user
    pub async fn issue_and_record(
        &self,
        store: &dyn CatalogStore,
        user_id: &str,
    ) -> ServiceResult<TokenPair> {
        let pair = self.issue_pair(user_id)?;
        store.add_refresh_token(user_id, &pair.refresh_token).await?;
        Ok(pair)
    }

    /// Exchange a recorded refresh token for a new pair. The old token is
    /// replaced in one store call; if that call fails the new pair is dropped
    /// and the old token stays valid.
    pub async fn rotate(
        &self,
        store: &dyn CatalogStore,
        refresh_token: &str,
    ) -> ServiceResult<TokenPair> {
        let claims = self.parse_typed(refresh_token, TokenType::Refresh)?;
        let pair = self.issue_pair(&claims.user_id)?;

        store
            .update_refresh_token(&claims.user_id, refresh_token, &pair.refresh_token)
            .await
            .map_err(|e| superseded(e, &claims.user_id))?;

        Ok(pair)
    }

    /// Forget a refresh token; it can no longer be rotated
    pub async fn revoke(&self, store: &dyn CatalogStore, refresh_token: &str) -> ServiceResult<()> {
        let claims = self.parse_typed(refresh_token, TokenType::Refresh)?;

        store
            .delete_refresh_token(&claims.user_id, refresh_token)
            .await
            .map_err(|e| superseded(e, &claims.user_id))
    }
}

/// A refresh token missing from the store was already rotated or revoked
fn superseded(err: StoreError, user_id: &str) -> ServiceError {
    if err.is_not_found() {
        debug!(user_id = %user_id, "refresh token no longer recorded");
        return AuthError::InvalidToken.into();
    }
    err.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MemoryStore, SqliteStore};
    use crate::models::{NewUser, UserRole};
    use serde_json::json;
    use std::sync::Arc;
    use tempfile::TempDir;
    use tokio::task::JoinSet;

    const SECRET: &str = "test-secret";

    fn service() -> TokenService {
        TokenService::new(SECRET, 900, 3600)
    }

    fn forge(claims: serde_json::Value, secret: &str) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    async fn store_with_user() -> (MemoryStore, String) {
        let store = MemoryStore::new();
        let user = store
            .add_new_user(NewUser {
                email: "ann@example.com".to_string(),
                username: "ann".to_string(),
                password: "hash".to_string(),
                role: UserRole::User,
            })
            .await
            .unwrap();
        (store, user.id)
    }

    fn is_invalid_token(err: &ServiceError) -> bool {
        matches!(err, ServiceError::Auth(AuthError::InvalidToken))
    }

    #[test]
    fn test_valid_token_yields_identity() {
        let tokens = service();
        let pair = tokens.issue_pair("user-1").unwrap();

        let claims = tokens.parse_and_validate(&pair.access_token).unwrap();
        assert_eq!(claims.user_id, "user-1");
        assert_eq!(claims.token_type, TokenType::Access);
        assert!(claims.exp > Utc::now().timestamp());
        assert_eq!(tokens.authenticate(&pair.access_token).unwrap(), "user-1");
    }

    #[test]
    fn test_expired_token_is_invalid() {
        let now = Utc::now().timestamp();
        let token = forge(
            json!({
                "userId": "user-1",
                "exp": now - 10,
                "iat": now - 100,
                "jti": "j",
                "tokenType": "access",
            }),
            SECRET,
        );

        assert!(matches!(
            service().parse_and_validate(&token),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn test_bad_signature_is_invalid() {
        let pair = TokenService::new("other-secret", 900, 3600)
            .issue_pair("user-1")
            .unwrap();
        assert!(matches!(
            service().parse_and_validate(&pair.access_token),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn test_missing_or_malformed_user_id_is_invalid() {
        let exp = Utc::now().timestamp() + 600;
        let missing = forge(
            json!({"exp": exp, "iat": 0, "jti": "j", "tokenType": "access"}),
            SECRET,
        );
        let numeric = forge(
            json!({"userId": 42, "exp": exp, "iat": 0, "jti": "j", "tokenType": "access"}),
            SECRET,
        );

        for token in [missing, numeric, "not.a.jwt".to_string(), String::new()] {
            assert!(matches!(
                service().parse_and_validate(&token),
                Err(AuthError::InvalidToken)
            ));
        }
    }

    #[test]
    fn test_token_types_are_not_interchangeable() {
        let tokens = service();
        let pair = tokens.issue_pair("user-1").unwrap();

        assert!(matches!(
            tokens.authenticate(&pair.refresh_token),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn test_pairs_are_unique() {
        let tokens = service();
        let a = tokens.issue_pair("user-1").unwrap();
        let b = tokens.issue_pair("user-1").unwrap();
        assert_ne!(a.refresh_token, b.refresh_token);
        assert_ne!(a.access_token, a.refresh_token);
    }

    #[tokio::test]
    async fn test_rotate_succeeds_exactly_once() {
        let (store, user_id) = store_with_user().await;
        let tokens = service();
        let first = tokens.issue_and_record(&store, &user_id).await.unwrap();

        let second = tokens.rotate(&store, &first.refresh_token).await.unwrap();
        assert_ne!(second.refresh_token, first.refresh_token);
        assert_eq!(tokens.authenticate(&second.access_token).unwrap(), user_id);

        let err = tokens.rotate(&store, &first.refresh_token).await.unwrap_err();
        assert!(is_invalid_token(&err));

        // the replacement keeps working
        tokens.rotate(&store, &second.refresh_token).await.unwrap();
    }

    #[tokio::test]
    async fn test_revoke_then_rotate_fails() {
        let (store, user_id) = store_with_user().await;
        let tokens = service();
        let pair = tokens.issue_and_record(&store, &user_id).await.unwrap();

        tokens.revoke(&store, &pair.refresh_token).await.unwrap();

        let err = tokens.rotate(&store, &pair.refresh_token).await.unwrap_err();
        assert!(is_invalid_token(&err));
        let err = tokens.revoke(&store, &pair.refresh_token).await.unwrap_err();
        assert!(is_invalid_token(&err));

        // access tokens are stateless and outlive sign-out
        assert_eq!(tokens.authenticate(&pair.access_token).unwrap(), user_id);
    }

    #[tokio::test]
    async fn test_unrecorded_refresh_token_cannot_rotate() {
        let (store, user_id) = store_with_user().await;
        let tokens = service();
        let pair = tokens.issue_pair(&user_id).unwrap();

        let err = tokens.rotate(&store, &pair.refresh_token).await.unwrap_err();
        assert!(is_invalid_token(&err));
    }

    #[tokio::test]
    async fn test_failed_store_update_keeps_old_token() {
        let (store, user_id) = store_with_user().await;
        let tokens = service();
        let pair = tokens.issue_and_record(&store, &user_id).await.unwrap();

        store.fail_on("update_refresh_token");
        let err = tokens.rotate(&store, &pair.refresh_token).await.unwrap_err();
        assert!(matches!(err, ServiceError::Store(StoreError::Unavailable(_))));

        // still recorded: revocation finds it
        tokens.revoke(&store, &pair.refresh_token).await.unwrap();
    }

    #[tokio::test]
    async fn test_access_token_cannot_be_rotated() {
        let (store, user_id) = store_with_user().await;
        let tokens = service();
        let pair = tokens.issue_and_record(&store, &user_id).await.unwrap();

        let err = tokens.rotate(&store, &pair.access_token).await.unwrap_err();
        assert!(is_invalid_token(&err));
    }

    const RACERS: usize = 8;

    /// Rotate one recorded refresh token from many tasks at once; returns
    /// how many rotations succeeded
    async fn race_rotations(store: Arc<dyn CatalogStore>) -> usize {
        let user = store
            .add_new_user(NewUser {
                email: "race@example.com".to_string(),
                username: "race".to_string(),
                password: "hash".to_string(),
                role: UserRole::User,
            })
            .await
            .unwrap();
        let tokens = service();
        let pair = tokens.issue_and_record(store.as_ref(), &user.id).await.unwrap();

        let mut tasks = JoinSet::new();
        for _ in 0..RACERS {
            let store = store.clone();
            let tokens = tokens.clone();
            let refresh = pair.refresh_token.clone();
            tasks.spawn(async move { tokens.rotate(store.as_ref(), &refresh).await });
        }

        let mut successes = 0;
        while let Some(joined) = tasks.join_next().await {
            match joined.unwrap() {
                Ok(_) => successes += 1,
                Err(err) => assert!(is_invalid_token(&err), "unexpected error: {err:?}"),
            }
        }
        successes
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_rotation_succeeds_once_in_memory() {
        assert_eq!(race_rotations(Arc::new(MemoryStore::new())).await, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_rotation_succeeds_once_in_sqlite() {
        let dir = TempDir::new().unwrap();
        let store = SqliteStore::open(&dir.path().join("race.db")).await.unwrap();
        assert_eq!(race_rotations(Arc::new(store)).await, 1);
    }
}
