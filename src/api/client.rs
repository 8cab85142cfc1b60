//! REST client for the warehouse backend.
//!
//! The request builder reads the session store immediately before dispatch,
//! so a credential change between two calls is always picked up; there is no
//! ambient interceptor state. All responses pass through [`ApiClient::classify`],
//! which owns the status-code→taxonomy mapping (and the 401 side effect of
//! clearing the stored session).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::backend::PackoutBackend;
use crate::api::error::ApiError;
use crate::auth::{AuthSession, SessionStore, UserProfile};
use crate::config::Config;
use crate::orders::Order;
use crate::packout::CompletionReport;

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    token_type: String,
    expires_in: i64,
}

/// REST client for the warehouse backend
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    timeout: Duration,
    session: SessionStore,
}

impl ApiClient {
    pub fn new(config: &Config, session: SessionStore) -> Self {
        Self {
            http: Client::new(),
            base_url: config.api_base_url.clone(),
            timeout: config.request_timeout(),
            session,
        }
    }

    /// Build a request with the current credential attached.
    ///
    /// The session store is consulted here, at dispatch time, not when the
    /// client is constructed.
    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut builder = self.http.request(method, url).timeout(self.timeout);
        if let Some(authorization) = self.session.authorization_value() {
            builder = builder.header(reqwest::header::AUTHORIZATION, authorization);
        }
        builder
    }

    /// Map a response onto the error taxonomy.
    ///
    /// 401 destroys the stored credential: a rejected token must not be
    /// offered again on the next request.
    fn classify(&self, response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            self.session.clear();
            return Err(ApiError::AuthRejected);
        }
        if !status.is_success() {
            return Err(ApiError::Http { status });
        }
        Ok(response)
    }

    async fn dispatch(&self, builder: RequestBuilder) -> Result<reqwest::Response, ApiError> {
        let response = builder
            .send()
            .await
            .map_err(|e| ApiError::Unavailable(e.to_string()))?;
        self.classify(response)
    }

    /// Authenticate and persist the resulting session
    pub async fn login(&self, username: &str, password: &str) -> Result<AuthSession, ApiError> {
        let url = format!("{}/auth/login", self.base_url);
        let builder = self
            .http
            .post(url)
            .timeout(self.timeout)
            .json(&LoginRequest { username, password });

        let response = self.dispatch(builder).await?;
        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))?;

        let session = AuthSession {
            access_token: token.access_token,
            token_type: token.token_type,
            expires_in: token.expires_in,
            username: Some(username.to_string()),
        };
        self.session.set(&session);
        Ok(session)
    }

    /// Fetch the principal the current credential belongs to
    pub async fn me(&self) -> Result<UserProfile, ApiError> {
        let response = self.dispatch(self.request(Method::GET, "/auth/me")).await?;
        response
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// Resolve a scanned barcode to an order
    pub async fn order_by_barcode(&self, code: &str) -> Result<Order, ApiError> {
        let path = format!("/orders/by-barcode/{code}");
        let response = self.dispatch(self.request(Method::GET, &path)).await?;
        response
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// Submit a packout completion record
    pub async fn complete_packout(&self, report: &CompletionReport) -> Result<(), ApiError> {
        let builder = self
            .request(Method::POST, "/packout-tasks/complete")
            .json(report);
        self.dispatch(builder).await?;
        Ok(())
    }

    /// Submit a previously serialized completion payload (outbox replay path)
    pub async fn complete_packout_value(&self, payload: &Value) -> Result<(), ApiError> {
        let builder = self
            .request(Method::POST, "/packout-tasks/complete")
            .json(payload);
        self.dispatch(builder).await?;
        Ok(())
    }

    /// Reachability probe against the health endpoint
    pub async fn health(&self) -> bool {
        match self.dispatch(self.request(Method::GET, "/health")).await {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!(error = %e, "Health probe failed");
                false
            }
        }
    }
}

#[async_trait]
impl PackoutBackend for ApiClient {
    async fn deliver_completion(&self, payload: &Value) -> Result<(), ApiError> {
        self.complete_packout_value(payload).await
    }

    async fn is_reachable(&self) -> bool {
        self.health().await
    }
}
