use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};

use super::auth::{Credentials, Session, TokenResponse, TOKEN_PATH, TOKEN_REFRESH_PATH};
use super::common::{list_items, ApiErrorDetails, ApiErrorResponse, ApiQueryParams};
use super::error::ApiError;
use super::pool::{user_agent, ConnectionPoolConfig};

pub const CLUSTER_PATH: &str = "/api/clusters/1/";

/// VAST REST API client
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http_client: reqwest::Client,
    base_url: String,
    credentials: Credentials,
    session: Mutex<Option<Session>>,
    cluster_version: OnceCell<String>,
}

impl Client {
    /// Create a new API client with default connection settings
    pub fn new(
        endpoint: &str,
        credentials: Credentials,
        skip_ssl_verify: bool,
    ) -> Result<Self, ApiError> {
        Self::with_config(
            endpoint,
            credentials,
            skip_ssl_verify,
            ConnectionPoolConfig::default(),
        )
    }

    pub fn with_config(
        endpoint: &str,
        credentials: Credentials,
        skip_ssl_verify: bool,
        pool_config: ConnectionPoolConfig,
    ) -> Result<Self, ApiError> {
        let base_url = endpoint.trim_end_matches('/').to_string();
        url::Url::parse(&base_url)
            .map_err(|e| ApiError::Config(format!("invalid endpoint '{}': {}", base_url, e)))?;

        let http_client = pool_config.build_client(skip_ssl_verify, &user_agent())?;

        Ok(Self {
            inner: Arc::new(ClientInner {
                http_client,
                base_url,
                credentials,
                session: Mutex::new(None),
                cluster_version: OnceCell::new(),
            }),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    pub async fn get(&self, path: &str) -> Result<Value, ApiError> {
        self.execute(Method::GET, path, None).await
    }

    /// Execute a GET request with query parameters
    pub async fn get_with_params(
        &self,
        path: &str,
        params: &ApiQueryParams,
    ) -> Result<Value, ApiError> {
        let full_path = format!("{}{}", path, params.to_query_string());
        self.get(&full_path).await
    }

    /// GET a collection and unwrap the list, paginated or not
    pub async fn list(&self, path: &str, params: &ApiQueryParams) -> Result<Vec<Value>, ApiError> {
        list_items(self.get_with_params(path, params).await?)
    }

    pub async fn post<B: Serialize>(&self, path: &str, body: &B) -> Result<Value, ApiError> {
        let body = to_body(body)?;
        self.execute(Method::POST, path, Some(body)).await
    }

    pub async fn patch<B: Serialize>(&self, path: &str, body: &B) -> Result<Value, ApiError> {
        let body = to_body(body)?;
        self.execute(Method::PATCH, path, Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> Result<Value, ApiError> {
        self.execute(Method::DELETE, path, None).await
    }

    /// Software version reported by the cluster, fetched once per client
    pub async fn cluster_version(&self) -> Result<String, ApiError> {
        self.inner
            .cluster_version
            .get_or_try_init(|| async {
                let cluster = self.get(CLUSTER_PATH).await?;
                cluster
                    .get("sw_version")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .ok_or_else(|| {
                        ApiError::ParseError("cluster response has no sw_version".to_string())
                    })
            })
            .await
            .cloned()
    }

    async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, ApiError> {
        let url = format!("{}{}", self.inner.base_url, path);
        tracing::debug!("{} request to: {}", method, url);

        let authorization = self.authorization(false).await?;
        let mut response = self
            .send(method.clone(), &url, body.as_ref(), Some(&authorization))
            .await?;

        if response.status() == StatusCode::UNAUTHORIZED && self.inner.credentials.uses_session()
        {
            tracing::debug!("Session rejected for {}, logging in again", url);
            let authorization = self.authorization(true).await?;
            response = self
                .send(method, &url, body.as_ref(), Some(&authorization))
                .await?;
        }

        let status = response.status();
        tracing::debug!("Response status: {}", status);

        match status {
            StatusCode::OK | StatusCode::CREATED | StatusCode::NO_CONTENT => {
                self.parse_success_response(response).await
            }
            StatusCode::UNAUTHORIZED => {
                let text = response.text().await.unwrap_or_default();
                tracing::error!("Authentication rejected: {}", text);
                Err(ApiError::AuthError(text))
            }
            _ => self.handle_error_response(response).await,
        }
    }

    async fn send(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
        authorization: Option<&str>,
    ) -> Result<reqwest::Response, ApiError> {
        let mut request = self
            .inner
            .http_client
            .request(method, url)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json");

        if let Some(authorization) = authorization {
            request = request.header(AUTHORIZATION, authorization);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        Ok(request.send().await?)
    }

    /// Authorization header value, logging in or refreshing the session when needed
    async fn authorization(&self, force_login: bool) -> Result<String, ApiError> {
        let (username, password) = match &self.inner.credentials {
            Credentials::ApiToken(token) => return Ok(format!("Api-Token {}", token)),
            Credentials::UserPassword { username, password } => (username, password),
        };

        let mut session = self.inner.session.lock().await;
        let current = match session.take() {
            Some(existing) if !force_login && !existing.is_stale() => existing,
            Some(existing) if !force_login => match self.refresh(&existing).await {
                Ok(refreshed) => refreshed,
                Err(e) => {
                    tracing::debug!("Token refresh failed, logging in again: {}", e);
                    self.login(username, password).await?
                }
            },
            _ => self.login(username, password).await?,
        };

        let header = current.bearer();
        *session = Some(current);
        Ok(header)
    }

    async fn login(&self, username: &str, password: &str) -> Result<Session, ApiError> {
        let url = format!("{}{}", self.inner.base_url, TOKEN_PATH);
        tracing::debug!("Requesting session token for user {}", username);

        let body = json!({ "username": username, "password": password });
        let tokens = self.request_tokens(&url, &body).await?;
        let refresh = tokens
            .refresh
            .ok_or_else(|| ApiError::AuthError("token response has no refresh token".to_string()))?;
        Ok(Session::new(tokens.access, refresh))
    }

    async fn refresh(&self, session: &Session) -> Result<Session, ApiError> {
        let url = format!("{}{}", self.inner.base_url, TOKEN_REFRESH_PATH);
        tracing::debug!("Refreshing session token");

        let body = json!({ "refresh": session.refresh });
        let tokens = self.request_tokens(&url, &body).await?;
        Ok(Session::new(
            tokens.access,
            tokens.refresh.unwrap_or_else(|| session.refresh.clone()),
        ))
    }

    async fn request_tokens(&self, url: &str, body: &Value) -> Result<TokenResponse, ApiError> {
        let response = self.send(Method::POST, url, Some(body), None).await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            tracing::error!("Token request failed ({}): {}", status, text);
            return Err(ApiError::AuthError(format!("HTTP {}: {}", status.as_u16(), text)));
        }

        serde_json::from_str(&text)
            .map_err(|e| ApiError::ParseError(format!("Failed to parse token response: {}", e)))
    }

    /// Empty bodies (204, DELETE) come back as null
    async fn parse_success_response(&self, response: reqwest::Response) -> Result<Value, ApiError> {
        let text = response.text().await?;
        tracing::debug!("API response body: {}", text);

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&text).map_err(|e| {
            tracing::error!("Failed to deserialize response: {}, body: {}", e, text);
            ApiError::ParseError(format!("Failed to parse response: {}", e))
        })
    }

    async fn handle_error_response<T>(&self, response: reqwest::Response) -> Result<T, ApiError> {
        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        tracing::error!("API error response ({}): {}", status, text);

        let details = serde_json::from_str::<ApiErrorResponse>(&text)
            .ok()
            .map(|err_resp| Box::new(ApiErrorDetails::from(err_resp)));

        Err(ApiError::ApiError {
            status,
            message: text,
            details,
        })
    }
}

fn to_body<B: Serialize>(body: &B) -> Result<Value, ApiError> {
    serde_json::to_value(body)
        .map_err(|e| ApiError::ParseError(format!("Failed to encode request body: {}", e)))
}
