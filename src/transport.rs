//! The HTTP seam between the leaderboard client and the network.

use crate::error::TransportError;
use async_trait::async_trait;
use reqwest::{header::HeaderMap, Method, StatusCode};
use std::time::Duration;
use url::Url;

/// An outbound request.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// The HTTP method.
    pub method: Method,
    /// The full URL, including the query.
    pub url: Url,
    /// Request headers.
    pub headers: HeaderMap,
}

impl HttpRequest {
    /// A `GET` request with no headers.
    pub fn get(url: Url) -> Self {
        Self {
            method: Method::GET,
            url,
            headers: HeaderMap::new(),
        }
    }

    /// A `POST` request with no headers and an empty body.
    pub fn post(url: Url) -> Self {
        Self {
            method: Method::POST,
            url,
            headers: HeaderMap::new(),
        }
    }
}

/// A completed response. The body is kept opaque.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// The response status.
    pub status: StatusCode,
    /// The response body, decoded as text.
    pub body: String,
}

impl HttpResponse {
    /// Create a new response.
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Sends requests. Implemented over [`reqwest`] by [`ReqwestTransport`], and
/// by scripted stubs in tests.
#[async_trait]
pub trait HttpTransport: core::fmt::Debug + Send + Sync {
    /// Send the request and read the whole response body.
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// [`HttpTransport`] backed by a [`reqwest::Client`].
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Build a transport whose requests time out after `timeout`.
    ///
    /// Redirects are disabled, as the token endpoint must never be followed
    /// to another host with credentials in the query.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let HttpRequest {
            method,
            url,
            headers,
        } = request;

        let response = self
            .client
            .request(method, url)
            .headers(headers)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        Ok(HttpResponse { status, body })
    }
}
