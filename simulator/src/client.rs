//! Thin HTTP client for the OrderDesk API.

use std::time::{Duration, Instant};

use orderdesk_common::{Order, OrderId, UserId, UserProfile};
use orderdesk_fx::ConversionResult;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::factory::{OrderDraft, UserDraft};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{method} {path} returned {status}: {body}")]
    Status {
        method: Method,
        path: String,
        status: StatusCode,
        body: String,
    },

    #[error("not logged in")]
    NoSession,
}

pub type ClientResult<T> = std::result::Result<T, ClientError>;

#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub user: UserProfile,
}

/// `GET /orders/{id}` body.
#[derive(Debug, Deserialize)]
pub struct ShownOrder {
    #[serde(flatten)]
    pub order: Order,
    pub converted_value: ConversionResult,
}

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

/// A response body plus how long the round trip took.
#[derive(Debug)]
pub struct Timed<T> {
    pub value: T,
    pub elapsed: Duration,
}

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> ClientResult<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    /// Same connection pool, different bearer token.
    pub fn with_token(&self, token: String) -> Self {
        Self {
            token: Some(token),
            ..self.clone()
        }
    }

    pub async fn register(&self, draft: &UserDraft) -> ClientResult<UserProfile> {
        let req = self.request(Method::POST, "/users").json(draft);
        Ok(self.send(Method::POST, "/users", req).await?.value)
    }

    pub async fn login(&self, email: &str, password: &str) -> ClientResult<LoginResponse> {
        let req = self
            .request(Method::POST, "/auth/login")
            .json(&Credentials { email, password });
        Ok(self.send(Method::POST, "/auth/login", req).await?.value)
    }

    pub async fn create_order(&self, draft: &OrderDraft) -> ClientResult<Timed<Order>> {
        let req = self.authed(Method::POST, "/orders")?.json(draft);
        self.send(Method::POST, "/orders", req).await
    }

    pub async fn show_order(&self, id: OrderId) -> ClientResult<Timed<ShownOrder>> {
        let path = format!("/orders/{id}");
        let req = self.authed(Method::GET, &path)?;
        self.send(Method::GET, &path, req).await
    }

    pub async fn delete_user(&self, id: UserId) -> ClientResult<()> {
        let path = format!("/users/{id}");
        let req = self.authed(Method::DELETE, &path)?;
        self.send::<serde_json::Value>(Method::DELETE, &path, req)
            .await
            .map(|_| ())
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.base_url, path))
            .header(reqwest::header::ACCEPT, "application/json")
    }

    fn authed(&self, method: Method, path: &str) -> ClientResult<RequestBuilder> {
        let token = self.token.as_deref().ok_or(ClientError::NoSession)?;
        Ok(self.request(method, path).bearer_auth(token))
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        req: RequestBuilder,
    ) -> ClientResult<Timed<T>> {
        let started = Instant::now();
        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ClientError::Status {
                method,
                path: path.to_string(),
                status,
                body,
            });
        }
        let value = resp.json::<T>().await?;
        Ok(Timed {
            value,
            elapsed: started.elapsed(),
        })
    }
}
