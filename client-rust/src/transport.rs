use crate::{types::ErrorBody, ImageUpload, QueryResponse, RouterError, RouterResult};
use reqwest::{multipart, Client, StatusCode};
use serde_json::Value;
use std::time::Duration;

/// Multipart field name the image endpoints read.
pub const IMAGE_FIELD: &str = "image";

/// A completed HTTP exchange, before the body is interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Interpret the body as a diagnosis answer.
    ///
    /// A body that is not JSON at all is reported as a transport failure. A
    /// non-OK status uses the body's `answer` as the message, or `generic_error`
    /// when there is none.
    pub fn into_query_response(self, generic_error: &str) -> RouterResult<QueryResponse> {
        let value: Value = serde_json::from_slice(&self.body).map_err(|error| {
            RouterError::transport(format!(
                "Failed to parse response body (Status {}): {error}",
                self.status
            ))
        })?;

        if !self.status.is_success() {
            let message = serde_json::from_value::<ErrorBody>(value)
                .ok()
                .and_then(|body| body.answer)
                .filter(|answer| !answer.is_empty())
                .unwrap_or_else(|| generic_error.to_string());
            return Err(RouterError::StatusCode(self.status, message));
        }

        serde_json::from_value(value).map_err(|error| {
            RouterError::Invariant(format!("Unexpected response body: {error}"))
        })
    }
}

/// The HTTP capability the router sends requests through.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    async fn post_json(&self, path: &str, body: &Value) -> RouterResult<HttpResponse>;
    async fn post_multipart(&self, path: &str, image: &ImageUpload) -> RouterResult<HttpResponse>;
}

#[derive(Clone, Default)]
pub struct ReqwestTransportOptions {
    pub base_url: Option<String>,
    pub timeout: Option<Duration>,
    pub client: Option<Client>,
}

/// [`Transport`] backed by `reqwest`.
#[derive(Clone)]
pub struct ReqwestTransport {
    base_url: String,
    timeout: Option<Duration>,
    client: Client,
}

impl ReqwestTransport {
    #[must_use]
    pub fn new(options: ReqwestTransportOptions) -> Self {
        let ReqwestTransportOptions {
            base_url,
            timeout,
            client,
        } = options;

        let base_url = base_url
            .unwrap_or_else(|| crate::options::DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        let client = client.unwrap_or_else(Client::new);

        Self {
            base_url,
            timeout,
            client,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn read(response: reqwest::Response) -> RouterResult<HttpResponse> {
        let status = response.status();
        let body = response.bytes().await?;
        Ok(HttpResponse::new(status, body.to_vec()))
    }

    fn with_timeout(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.timeout {
            Some(timeout) => request.timeout(timeout),
            None => request,
        }
    }
}

#[async_trait::async_trait]
impl Transport for ReqwestTransport {
    async fn post_json(&self, path: &str, body: &Value) -> RouterResult<HttpResponse> {
        let request = self.with_timeout(self.client.post(self.url(path)).json(body));
        let response = request.send().await?;
        Self::read(response).await
    }

    async fn post_multipart(&self, path: &str, image: &ImageUpload) -> RouterResult<HttpResponse> {
        let part = multipart::Part::bytes(image.bytes.clone())
            .file_name(image.file_name.clone())
            .mime_str(&image.mime_type)?;
        let form = multipart::Form::new().part(IMAGE_FIELD, part);

        let request = self.with_timeout(self.client.post(self.url(path)).multipart(form));
        let response = request.send().await?;
        Self::read(response).await
    }
}
