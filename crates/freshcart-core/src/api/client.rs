//! API client for the FreshCart REST backend.
//!
//! This module provides the `ApiClient` struct: a generic request executor
//! with bounded retry on transient transport failures, plus typed
//! convenience methods for every endpoint the app consumes.
//!
//! Cart contents never travel through here; the cart is local-authoritative
//! and only product lookups and checkout touch the network.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::{header, multipart, Client, Method, Url};
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::auth::{Credential, SessionSignal, SessionState};
use crate::config::Config;
use crate::models::{
    Category, ChatMessage, CheckoutRequest, CustomerProfile, ImageUploadResponse, LoginRequest,
    MessageResponse, Order, Product, SignupRequest,
};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
/// 30s allows for slow API responses while failing fast enough for good UX.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Retries after the initial attempt for transient transport failures.
/// With the initial attempt this makes at most 4 tries per request.
const MAX_TRANSPORT_RETRIES: u32 = 3;

/// Fixed delay between transient retries.
/// 1 second is long enough for brief connectivity blips to clear.
const RETRY_DELAY_MS: u64 = 1000;

/// A single remote API call: path, method, optional JSON body, and whether
/// the request should carry the session's bearer token.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    pub path: String,
    pub method: Method,
    pub body: Option<Vec<u8>>,
    pub requires_auth: bool,
}

impl RequestDescriptor {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            method,
            body: None,
            requires_auth: true,
        }
    }

    /// Mark the request as one that is sent without an Authorization header.
    pub fn public(mut self) -> Self {
        self.requires_auth = false;
        self
    }

    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }
}

/// API client for the FreshCart backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    session: SessionState,
    invalidations: mpsc::UnboundedSender<SessionSignal>,
    max_retries: u32,
    retry_delay: Duration,
}

impl ApiClient {
    /// Create a client against the configured base URL.
    ///
    /// Returns the receiving end of the session-invalidation channel; hand
    /// it to `SessionManager::new` so 401 responses log the user out.
    pub fn new(
        config: &Config,
        session: SessionState,
    ) -> Result<(Self, mpsc::UnboundedReceiver<SessionSignal>), ApiError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(ApiError::RequestFailed)?;
        let (tx, rx) = mpsc::unbounded_channel();

        Ok((
            Self {
                http,
                base_url: config.base_url().trim_end_matches('/').to_string(),
                session,
                invalidations: tx,
                max_retries: MAX_TRANSPORT_RETRIES,
                retry_delay: Duration::from_millis(RETRY_DELAY_MS),
            },
            rx,
        ))
    }

    /// Override the transient-failure retry policy. The count stays finite;
    /// there is no unbounded mode.
    pub fn with_retry_policy(mut self, max_retries: u32, retry_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_delay = retry_delay;
        self
    }

    /// Rebuild the underlying HTTP client with a different request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Result<Self, ApiError> {
        self.http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ApiError::RequestFailed)?;
        Ok(self)
    }

    // ===== Core executor =====

    /// Execute a request, retrying transient transport failures with a fixed
    /// delay. HTTP-level errors are classified and returned immediately.
    pub async fn execute(&self, descriptor: &RequestDescriptor) -> Result<Vec<u8>, ApiError> {
        let url = Url::parse(&format!("{}{}", self.base_url, descriptor.path))
            .map_err(|_| ApiError::BadEndpoint)?;

        let mut attempt = 0u32;
        loop {
            attempt += 1;
            debug!(method = %descriptor.method, url = %url, attempt, "Sending request");

            match self.send_once(&url, descriptor).await {
                Ok(bytes) => return Ok(bytes),
                Err(err) if err.is_transient() && attempt <= self.max_retries => {
                    warn!(
                        url = %url,
                        attempt,
                        max_retries = self.max_retries,
                        error = %err,
                        "Transient network failure, retrying"
                    );
                    tokio::time::sleep(self.retry_delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn send_once(
        &self,
        url: &Url,
        descriptor: &RequestDescriptor,
    ) -> Result<Vec<u8>, ApiError> {
        let mut request = self
            .http
            .request(descriptor.method.clone(), url.clone())
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::ACCEPT, "application/json");

        if descriptor.requires_auth {
            // The token is re-read on every attempt in case the session
            // changed between retries. A missing token still sends the
            // request; the server answers 401 if it cares.
            match self.session.bearer_token().await {
                Some(token) => request = request.bearer_auth(token),
                None => debug!(path = %descriptor.path, "No credential for authenticated request"),
            }
        }

        if let Some(ref body) = descriptor.body {
            request = request.body(body.clone());
        }

        let response = request.send().await.map_err(ApiError::from_transport)?;
        self.check_response(response).await
    }

    /// Classify the response status, returning the body bytes on success.
    /// A 401 additionally emits one session-invalidation signal.
    async fn check_response(&self, response: reqwest::Response) -> Result<Vec<u8>, ApiError> {
        let status = response.status();
        if status.is_success() {
            let bytes = response.bytes().await.map_err(ApiError::from_transport)?;
            return Ok(bytes.to_vec());
        }

        let body = response.text().await.unwrap_or_default();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            warn!("Received 401, invalidating session");
            let _ = self.invalidations.send(SessionSignal::Unauthorized);
        }
        Err(ApiError::from_status(status, &body))
    }

    // ===== Typed JSON wrappers =====

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        requires_auth: bool,
    ) -> Result<T, ApiError> {
        let mut descriptor = RequestDescriptor::new(Method::GET, path);
        descriptor.requires_auth = requires_auth;
        let bytes = self.execute(&descriptor).await?;
        serde_json::from_slice(&bytes).map_err(ApiError::DecodingFailed)
    }

    async fn send_json<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: &B,
        requires_auth: bool,
    ) -> Result<T, ApiError> {
        let encoded = serde_json::to_vec(body).map_err(ApiError::DecodingFailed)?;
        let mut descriptor = RequestDescriptor::new(method, path).with_body(encoded);
        descriptor.requires_auth = requires_auth;
        let bytes = self.execute(&descriptor).await?;
        serde_json::from_slice(&bytes).map_err(ApiError::DecodingFailed)
    }

    // ===== Authentication API =====

    pub async fn sign_in(&self, request: &LoginRequest) -> Result<Credential, ApiError> {
        self.send_json(Method::POST, "/auth/customer/signin", request, false)
            .await
    }

    pub async fn sign_up(&self, request: &SignupRequest) -> Result<MessageResponse, ApiError> {
        self.send_json(Method::POST, "/auth/customer/signup", request, false)
            .await
    }

    // ===== Catalog API =====

    pub async fn fetch_categories(&self) -> Result<Vec<Category>, ApiError> {
        self.get_json("/categories", false).await
    }

    /// Fetch the product catalog, optionally restricted to one category.
    pub async fn fetch_products(&self, category_id: Option<i64>) -> Result<Vec<Product>, ApiError> {
        let path = match category_id {
            Some(id) => format!("/fruits?categoryId={}", id),
            None => "/fruits".to_string(),
        };
        self.get_json(&path, false).await
    }

    // ===== Order API =====

    pub async fn fetch_orders(&self) -> Result<Vec<Order>, ApiError> {
        self.get_json("/orders", true).await
    }

    pub async fn checkout(&self, request: &CheckoutRequest) -> Result<Order, ApiError> {
        self.send_json(Method::POST, "/orders/checkout", request, true)
            .await
    }

    // ===== Customer profile API =====

    pub async fn fetch_profile(&self) -> Result<CustomerProfile, ApiError> {
        self.get_json("/customers/profile", true).await
    }

    pub async fn update_profile(
        &self,
        profile: &CustomerProfile,
    ) -> Result<CustomerProfile, ApiError> {
        self.send_json(Method::PUT, "/customers/profile", profile, true)
            .await
    }

    // ===== Chat API =====

    pub async fn fetch_chat_history(&self) -> Result<Vec<ChatMessage>, ApiError> {
        self.get_json("/chat/history", true).await
    }

    pub async fn save_chat_message(
        &self,
        message: &ChatMessage,
    ) -> Result<MessageResponse, ApiError> {
        self.send_json(Method::POST, "/chat/messages", message, true)
            .await
    }

    // ===== Image upload =====

    /// Upload an image as `multipart/form-data` under the `file` field.
    /// Multipart bodies are not replayable, so uploads skip the retry loop.
    pub async fn upload_image(
        &self,
        image: Vec<u8>,
        file_name: &str,
    ) -> Result<ImageUploadResponse, ApiError> {
        let url = Url::parse(&format!("{}/images/upload", self.base_url))
            .map_err(|_| ApiError::BadEndpoint)?;

        let part = multipart::Part::bytes(image)
            .file_name(file_name.to_string())
            .mime_str("image/png")
            .map_err(ApiError::RequestFailed)?;
        let form = multipart::Form::new().part("file", part);

        let mut request = self.http.post(url).multipart(form);
        if let Some(token) = self.session.bearer_token().await {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(ApiError::from_transport)?;
        let bytes = self.check_response(response).await?;
        serde_json::from_slice(&bytes).map_err(ApiError::DecodingFailed)
    }

    // ===== Health check =====

    pub async fn health_check(&self) -> Result<HashMap<String, String>, ApiError> {
        self.get_json("/health/ping", false).await
    }

    pub async fn is_server_reachable(&self) -> bool {
        self.health_check().await.is_ok()
    }
}
