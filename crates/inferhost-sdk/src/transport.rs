//! JSON-over-HTTPS transport shared by every resource client.

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{SdkError, SdkResult};

pub const CLIENT_ID_HEADER: &str = "CE-ClientId";
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Thin wrapper over a shared `reqwest::Client` rooted at one service base
/// URL.
#[derive(Debug, Clone)]
pub struct HttpClient {
    base_url: String,
    http: reqwest::Client,
}

impl HttpClient {
    pub fn new(base_url: &str, http: reqwest::Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str, headers: HeaderMap) -> SdkResult<T> {
        self.send(self.request(Method::GET, path, headers)).await
    }

    pub async fn get_with_query<T, Q>(&self, path: &str, headers: HeaderMap, query: &Q) -> SdkResult<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        self.send(self.request(Method::GET, path, headers).query(query))
            .await
    }

    pub async fn post<T, B>(&self, path: &str, headers: HeaderMap, body: &B) -> SdkResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send(self.request(Method::POST, path, headers).json(body))
            .await
    }

    pub async fn patch<T, B>(&self, path: &str, headers: HeaderMap, body: &B) -> SdkResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send(self.request(Method::PATCH, path, headers).json(body))
            .await
    }

    pub async fn delete<T, Q>(&self, path: &str, headers: HeaderMap, query: &Q) -> SdkResult<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        self.send(self.request(Method::DELETE, path, headers).query(query))
            .await
    }

    fn request(&self, method: Method, path: &str, headers: HeaderMap) -> RequestBuilder {
        self.http
            .request(method, self.url(path))
            .header(ACCEPT, HeaderValue::from_static(JSON_CONTENT_TYPE))
            .header(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE))
            .headers(headers)
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> SdkResult<T> {
        let resp = builder
            .send()
            .await
            .map_err(|e| SdkError::Transport(format!("HTTP request failed: {e}")))?;

        let status = resp.status();
        let body = resp
            .bytes()
            .await
            .map_err(|e| SdkError::Transport(format!("failed to read response body: {e}")))?;

        if !status.is_success() {
            let message = String::from_utf8_lossy(&body).trim().to_string();
            tracing::debug!(status = status.as_u16(), %message, "request rejected");
            return Err(SdkError::Api {
                status: status.as_u16(),
                message,
            });
        }

        // Some endpoints answer 2xx with an empty body.
        let body: &[u8] = if body.iter().all(u8::is_ascii_whitespace) {
            b"null"
        } else {
            &body
        };
        serde_json::from_slice(body)
            .map_err(|e| SdkError::Transport(format!("failed to parse JSON response: {e}")))
    }
}

/// Join `segments` into an absolute URL path, percent-encoding each one so
/// ids containing `/`, `?` or `#` stay inside their segment.
pub fn encode_path(segments: &[&str]) -> SdkResult<String> {
    let mut url = reqwest::Url::parse("http://localhost/")
        .map_err(|e| SdkError::Transport(format!("invalid URL: {e}")))?;
    url.path_segments_mut()
        .map_err(|()| SdkError::Transport("URL cannot carry a path".into()))?
        .clear()
        .extend(segments);
    Ok(url.path().to_string())
}
