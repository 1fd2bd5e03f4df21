//! Session lifecycle management.
//!
//! The session manager owns the current [`Credential`]: it adopts one on
//! login, persists it to the secure store, restores it at startup, and
//! clears it on logout, detected expiry, or a 401 signal from the API
//! client. The credential is replaced wholesale, never mutated in place.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info, warn};

use crate::api::{ApiClient, ApiError};
use crate::models::{LoginRequest, SignupRequest};

use super::credentials::SecureStore;
use super::token;

/// Fixed key the serialized credential is stored under.
const CREDENTIAL_KEY: &str = "credential";

/// The authenticated identity for the current user, as returned by the
/// sign-in endpoint and persisted in the secure store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credential {
    pub token: String,
    #[serde(rename = "type", default)]
    pub token_type: Option<String>,
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(rename = "fullName", default)]
    pub full_name: Option<String>,
    #[serde(rename = "emailVerified", default)]
    pub email_verified: Option<bool>,
    #[serde(default)]
    pub roles: Option<Vec<String>>,
}

impl Credential {
    pub fn is_expired(&self) -> bool {
        token::is_expired(&self.token)
    }

    /// Expiry instant derived from the token payload, if readable.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        token::expiration(&self.token).and_then(|exp| DateTime::from_timestamp(exp as i64, 0))
    }
}

/// Signal emitted by the API client toward the session manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionSignal {
    /// The server answered 401; the current credential is no longer accepted.
    Unauthorized,
}

/// Shared, atomically replaceable view of the current credential.
///
/// The session manager is the only writer. The API client reads the bearer
/// token through a clone of this handle on every request attempt, so a
/// reader can never observe half of one credential and half of another.
#[derive(Clone, Default)]
pub struct SessionState {
    current: Arc<RwLock<Option<Credential>>>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bearer token for the current credential, or `None` when there is no
    /// session or the credential has expired since it was adopted.
    pub async fn bearer_token(&self) -> Option<String> {
        let guard = self.current.read().await;
        guard
            .as_ref()
            .filter(|credential| !credential.is_expired())
            .map(|credential| credential.token.clone())
    }

    pub async fn current(&self) -> Option<Credential> {
        self.current.read().await.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.current.read().await.is_some()
    }

    pub(crate) async fn replace(&self, credential: Option<Credential>) {
        *self.current.write().await = credential;
    }
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Your session has expired - please log in again")]
    TokenExpired,
    #[error("Authentication failed - please check your credentials")]
    AuthenticationFailed,
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Owns the credential lifecycle: login, signup, restore, logout, expiry.
pub struct SessionManager {
    api: ApiClient,
    state: SessionState,
    store: Arc<dyn SecureStore>,
}

impl SessionManager {
    /// Wire up the session manager and start the listener that reacts to
    /// the API client's 401 signals. Must be called within a Tokio runtime.
    pub fn new(
        api: ApiClient,
        state: SessionState,
        store: Arc<dyn SecureStore>,
        signals: mpsc::UnboundedReceiver<SessionSignal>,
    ) -> Self {
        tokio::spawn(Self::listen_for_invalidation(
            state.clone(),
            store.clone(),
            signals,
        ));
        Self { api, state, store }
    }

    async fn listen_for_invalidation(
        state: SessionState,
        store: Arc<dyn SecureStore>,
        mut signals: mpsc::UnboundedReceiver<SessionSignal>,
    ) {
        while let Some(signal) = signals.recv().await {
            match signal {
                SessionSignal::Unauthorized => {
                    info!("Session invalidated by server, logging out");
                    state.replace(None).await;
                    if let Err(err) = store.delete(CREDENTIAL_KEY) {
                        warn!(error = %err, "Failed to delete persisted credential");
                    }
                }
            }
        }
    }

    /// Authenticate against the sign-in endpoint and adopt the returned
    /// credential. A credential whose token is already expired at receipt
    /// is rejected with [`AuthError::TokenExpired`] and never adopted.
    pub async fn login(&self, username: &str, password: &str) -> Result<(), AuthError> {
        // Drop any previous session before attempting a new one.
        self.state.replace(None).await;

        let request = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let credential = match self.api.sign_in(&request).await {
            Ok(credential) => credential,
            Err(ApiError::Unauthorized) => return Err(AuthError::AuthenticationFailed),
            Err(err) => return Err(err.into()),
        };

        if credential.is_expired() {
            warn!("Sign-in returned a credential that is already expired");
            return Err(AuthError::TokenExpired);
        }

        debug!(username = %credential.username, expires_at = ?credential.expires_at(), "Login successful");
        self.state.replace(Some(credential.clone())).await;
        self.persist(&credential);
        Ok(())
    }

    /// Register a new customer account, then log in with it.
    ///
    /// Customer accounts use the email as their username; the display name
    /// splits into first/last on the first space.
    pub async fn signup(&self, name: &str, email: &str, password: &str) -> Result<(), AuthError> {
        let mut parts = name.trim().splitn(2, ' ');
        let first_name = parts.next().unwrap_or_default().to_string();
        let last_name = parts.next().unwrap_or_default().to_string();

        let request = SignupRequest {
            username: email.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            first_name,
            last_name,
            phone_number: None,
            role: None,
        };
        self.api.sign_up(&request).await?;
        self.login(email, password).await
    }

    /// Clear the session and the persisted credential. Idempotent.
    pub async fn logout(&self) {
        info!("Logging out");
        self.state.replace(None).await;
        self.discard_persisted();
    }

    /// Restore a persisted session at startup.
    ///
    /// Graceful validation: a missing, expired, or unreadable credential
    /// leaves the session unauthenticated without raising an error.
    pub async fn restore_on_startup(&self) {
        let serialized = match self.store.get(CREDENTIAL_KEY) {
            Ok(Some(serialized)) => serialized,
            Ok(None) => {
                debug!("No persisted credential");
                return;
            }
            Err(err) => {
                warn!(error = %err, "Failed to read persisted credential");
                return;
            }
        };

        match serde_json::from_str::<Credential>(&serialized) {
            Ok(credential) if !credential.is_expired() => {
                debug!(username = %credential.username, "Restored persisted session");
                self.state.replace(Some(credential)).await;
            }
            Ok(_) => {
                debug!("Persisted credential is expired, discarding");
                self.discard_persisted();
            }
            Err(err) => {
                warn!(error = %err, "Persisted credential is unreadable, discarding");
                self.discard_persisted();
            }
        }
    }

    /// Strict validation: re-check the current credential's expiry, clearing
    /// the session as a side effect when it has lapsed.
    pub async fn is_session_valid(&self) -> bool {
        // The expiry check and the clear happen under one write lock, so a
        // concurrent login cannot interleave between them.
        let mut guard = self.state.current.write().await;
        let expired = match guard.as_ref() {
            Some(credential) => credential.is_expired(),
            None => return false,
        };

        if expired {
            info!("Session expired, logging out");
            *guard = None;
            drop(guard);
            self.discard_persisted();
            return false;
        }
        true
    }

    pub async fn is_authenticated(&self) -> bool {
        self.state.is_authenticated().await
    }

    pub async fn current_credential(&self) -> Option<Credential> {
        self.state.current().await
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    fn persist(&self, credential: &Credential) {
        // Persistence is best effort: a keychain hiccup should not log the
        // user out of the running process.
        match serde_json::to_string(credential) {
            Ok(serialized) => {
                if let Err(err) = self.store.put(CREDENTIAL_KEY, &serialized) {
                    warn!(error = %err, "Failed to persist credential");
                }
            }
            Err(err) => warn!(error = %err, "Failed to serialize credential"),
        }
    }

    fn discard_persisted(&self) {
        if let Err(err) = self.store.delete(CREDENTIAL_KEY) {
            warn!(error = %err, "Failed to delete persisted credential");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;
    use std::sync::Mutex;
    use std::time::Duration;

    use axum::extract::State;
    use axum::http::StatusCode;
    use axum::routing::{get, post};
    use axum::{Json, Router};

    use super::super::credentials::MemoryStore;
    use super::super::token::make_token;
    use super::*;
    use crate::config::Config;

    fn credential_json(token: &str) -> serde_json::Value {
        serde_json::json!({
            "token": token,
            "type": "Bearer",
            "id": 42,
            "username": "alice@example.com",
            "email": "alice@example.com",
            "fullName": "Alice Tester",
            "emailVerified": true,
            "roles": ["ROLE_CUSTOMER"],
        })
    }

    fn credential_with_token(token: &str) -> Credential {
        serde_json::from_value(credential_json(token)).expect("credential fixture")
    }

    async fn spawn_server(router: Router) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("listener address");
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("test server");
        });
        addr
    }

    fn manager_for(addr: SocketAddr) -> (SessionManager, Arc<MemoryStore>, ApiClient) {
        let config = Config {
            api_base_url: Some(format!("http://{}/api", addr)),
            last_username: None,
        };
        let state = SessionState::new();
        let (api, signals) = ApiClient::new(&config, state.clone()).expect("api client");
        let store = Arc::new(MemoryStore::new());
        let manager = SessionManager::new(api.clone(), state, store.clone(), signals);
        (manager, store, api)
    }

    fn signin_router(token: String) -> Router {
        Router::new().route(
            "/api/auth/customer/signin",
            post(move || {
                let token = token.clone();
                async move { Json(credential_json(&token)) }
            }),
        )
    }

    async fn wait_until_logged_out(manager: &SessionManager) {
        tokio::time::timeout(Duration::from_secs(1), async {
            while manager.is_authenticated().await {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("session should be invalidated");
    }

    #[tokio::test]
    async fn login_adopts_and_persists_credential() {
        let token = make_token(Utc::now().timestamp() + 3600);
        let addr = spawn_server(signin_router(token.clone())).await;
        let (manager, store, _api) = manager_for(addr);

        manager.login("alice@example.com", "hunter2").await.unwrap();

        assert!(manager.is_authenticated().await);
        assert!(manager.state().bearer_token().await.is_some());

        let persisted = store.get("credential").unwrap().expect("persisted blob");
        let credential: Credential = serde_json::from_str(&persisted).unwrap();
        assert_eq!(credential.username, "alice@example.com");
        assert_eq!(credential.token, token);
    }

    #[tokio::test]
    async fn login_rejects_credential_expired_at_receipt() {
        let token = make_token(Utc::now().timestamp() - 60);
        let addr = spawn_server(signin_router(token)).await;
        let (manager, store, _api) = manager_for(addr);

        let err = manager
            .login("alice@example.com", "hunter2")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::TokenExpired));
        assert!(!manager.is_authenticated().await);
        assert_eq!(store.get("credential").unwrap(), None);
    }

    #[tokio::test]
    async fn login_maps_unauthorized_to_authentication_failure() {
        let router = Router::new().route(
            "/api/auth/customer/signin",
            post(|| async {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(serde_json::json!({"message": "Bad credentials"})),
                )
            }),
        );
        let addr = spawn_server(router).await;
        let (manager, _store, _api) = manager_for(addr);

        let err = manager
            .login("alice@example.com", "wrong")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::AuthenticationFailed));
        assert!(!manager.is_authenticated().await);
    }

    #[tokio::test]
    async fn signup_registers_then_logs_in_with_email() {
        let seen_username: Arc<Mutex<Option<String>>> = Arc::new(Mutex::new(None));
        let token = make_token(Utc::now().timestamp() + 3600);

        let recorded = seen_username.clone();
        let router = Router::new()
            .route(
                "/api/auth/customer/signup",
                post(
                    move |State(recorded): State<Arc<Mutex<Option<String>>>>,
                          Json(body): Json<serde_json::Value>| async move {
                        *recorded.lock().unwrap() =
                            body["username"].as_str().map(ToString::to_string);
                        Json(serde_json::json!({"message": "registered"}))
                    },
                ),
            )
            .route(
                "/api/auth/customer/signin",
                post(move || {
                    let token = token.clone();
                    async move { Json(credential_json(&token)) }
                }),
            )
            .with_state(recorded);
        let addr = spawn_server(router).await;
        let (manager, _store, _api) = manager_for(addr);

        manager
            .signup("Alice Tester", "alice@example.com", "hunter2")
            .await
            .unwrap();

        assert!(manager.is_authenticated().await);
        assert_eq!(
            seen_username.lock().unwrap().as_deref(),
            Some("alice@example.com")
        );
    }

    #[tokio::test]
    async fn restore_adopts_valid_persisted_credential() {
        let addr = spawn_server(Router::new()).await;
        let (manager, store, _api) = manager_for(addr);

        let credential = credential_with_token(&make_token(Utc::now().timestamp() + 3600));
        store
            .put("credential", &serde_json::to_string(&credential).unwrap())
            .unwrap();

        manager.restore_on_startup().await;
        assert!(manager.is_authenticated().await);
        assert_eq!(
            manager.current_credential().await.unwrap().username,
            "alice@example.com"
        );
    }

    #[tokio::test]
    async fn restore_discards_expired_credential_silently() {
        let addr = spawn_server(Router::new()).await;
        let (manager, store, _api) = manager_for(addr);

        let credential = credential_with_token(&make_token(Utc::now().timestamp() - 60));
        store
            .put("credential", &serde_json::to_string(&credential).unwrap())
            .unwrap();

        manager.restore_on_startup().await;
        assert!(!manager.is_authenticated().await);
        assert_eq!(store.get("credential").unwrap(), None);
    }

    #[tokio::test]
    async fn restore_discards_unreadable_credential_silently() {
        let addr = spawn_server(Router::new()).await;
        let (manager, store, _api) = manager_for(addr);

        store.put("credential", "not json at all").unwrap();

        manager.restore_on_startup().await;
        assert!(!manager.is_authenticated().await);
        assert_eq!(store.get("credential").unwrap(), None);
    }

    #[tokio::test]
    async fn session_validity_check_clears_expired_session() {
        let addr = spawn_server(Router::new()).await;
        let (manager, store, _api) = manager_for(addr);

        let credential = credential_with_token(&make_token(Utc::now().timestamp() - 5));
        store
            .put("credential", &serde_json::to_string(&credential).unwrap())
            .unwrap();
        manager.state().replace(Some(credential)).await;

        assert!(!manager.is_session_valid().await);
        assert!(!manager.is_authenticated().await);
        assert_eq!(store.get("credential").unwrap(), None);
    }

    #[tokio::test]
    async fn session_validity_check_keeps_live_session() {
        let addr = spawn_server(Router::new()).await;
        let (manager, _store, _api) = manager_for(addr);

        let credential = credential_with_token(&make_token(Utc::now().timestamp() + 3600));
        manager.state().replace(Some(credential)).await;

        assert!(manager.is_session_valid().await);
        assert!(manager.is_authenticated().await);
    }

    #[tokio::test]
    async fn logout_is_idempotent() {
        let addr = spawn_server(Router::new()).await;
        let (manager, store, _api) = manager_for(addr);

        let credential = credential_with_token(&make_token(Utc::now().timestamp() + 3600));
        store
            .put("credential", &serde_json::to_string(&credential).unwrap())
            .unwrap();
        manager.state().replace(Some(credential)).await;

        manager.logout().await;
        assert!(!manager.is_authenticated().await);
        assert_eq!(store.get("credential").unwrap(), None);

        manager.logout().await;
        assert!(!manager.is_authenticated().await);
    }

    #[tokio::test]
    async fn unauthorized_response_logs_the_session_out() {
        let router = Router::new().route(
            "/api/orders",
            get(|| async {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(serde_json::json!({"message": "Token expired"})),
                )
            }),
        );
        let addr = spawn_server(router).await;
        let (manager, store, api) = manager_for(addr);

        let credential = credential_with_token(&make_token(Utc::now().timestamp() + 3600));
        store
            .put("credential", &serde_json::to_string(&credential).unwrap())
            .unwrap();
        manager.state().replace(Some(credential)).await;

        let err = api.fetch_orders().await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized));

        wait_until_logged_out(&manager).await;
        assert_eq!(store.get("credential").unwrap(), None);
    }
}
