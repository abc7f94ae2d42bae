//! HTTP client for the planner API, used by the dialog controllers.

use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::{multipart, Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;
use url::Url;

/// Shown when the server gave no usable error text.
pub const FALLBACK_MESSAGE: &str = "Something went wrong";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{message}")]
    Api { status: u16, message: String },
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected response: {0}")]
    Decode(String),
}

impl ClientError {
    /// Text suitable for a toast: the server's message, or the fallback.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Api { message, .. } if !message.trim().is_empty() => message.clone(),
            _ => FALLBACK_MESSAGE.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::Api { status, .. } if *status == StatusCode::NOT_FOUND.as_u16())
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

/// An image picked in a dialog but not yet uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAttachment {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageAttachment {
    pub fn new(
        filename: impl Into<String>,
        content_type: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.into(),
            bytes: bytes.into(),
        }
    }

    /// A `data:` URL for showing the picked image before upload.
    pub fn preview(&self) -> String {
        format!("data:{};base64,{}", self.content_type, STANDARD.encode(&self.bytes))
    }

    fn to_part(&self) -> ClientResult<multipart::Part> {
        Ok(multipart::Part::bytes(self.bytes.clone())
            .file_name(self.filename.clone())
            .mime_str(&self.content_type)?)
    }
}

/// The mutations a resource dialog needs. `collection` is the path segment
/// under `/api` (`equipment`, `personnel`, ...).
#[async_trait]
pub trait ResourceClient: Send + Sync {
    async fn list(&self, collection: &str) -> ClientResult<Vec<Value>>;

    async fn create(&self, collection: &str, payload: Value) -> ClientResult<Value>;

    /// Creates through a multipart body carrying the payload and the image.
    async fn create_with_image(
        &self,
        collection: &str,
        payload: Value,
        image: &ImageAttachment,
    ) -> ClientResult<Value>;

    async fn update(&self, collection: &str, id: &str, patch: Value) -> ClientResult<Value>;

    async fn delete(&self, collection: &str, id: &str) -> ClientResult<()>;

    /// Stores an image directly and returns its public URL.
    async fn upload_image(&self, collection: &str, image: &ImageAttachment)
        -> ClientResult<String>;
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenBody {
    access_token: String,
}

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    access_token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: Url) -> ClientResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("shootplanner/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_http_client(base_url, http))
    }

    pub fn with_http_client(base_url: Url, http: reqwest::Client) -> Self {
        Self {
            http,
            base_url,
            access_token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    pub async fn login(&mut self, username: &str, password: &str) -> ClientResult<()> {
        let response = self
            .request(Method::POST, &["auth", "login"])?
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await?;
        let body: TokenBody = decode(response).await?;
        self.access_token = Some(body.access_token);
        Ok(())
    }

    fn endpoint(&self, segments: &[&str]) -> ClientResult<Url> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| ClientError::Decode("base URL cannot hold a path".into()))?;
            path.pop_if_empty().push("api");
            for segment in segments {
                path.push(segment);
            }
        }
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> ClientResult<RequestBuilder> {
        let builder = self.http.request(method, self.endpoint(segments)?);
        Ok(match &self.access_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        })
    }
}

async fn check(response: Response) -> ClientResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .ok()
        .and_then(|body| body.error)
        .unwrap_or_default();
    tracing::debug!(status = status.as_u16(), %message, "api request failed");
    Err(ClientError::Api {
        status: status.as_u16(),
        message,
    })
}

async fn decode<T: serde::de::DeserializeOwned>(response: Response) -> ClientResult<T> {
    let response = check(response).await?;
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|err| ClientError::Decode(err.to_string()))
}

#[async_trait]
impl ResourceClient for ApiClient {
    async fn list(&self, collection: &str) -> ClientResult<Vec<Value>> {
        let response = self.request(Method::GET, &[collection])?.send().await?;
        decode(response).await
    }

    async fn create(&self, collection: &str, payload: Value) -> ClientResult<Value> {
        let response = self
            .request(Method::POST, &[collection])?
            .json(&payload)
            .send()
            .await?;
        decode(response).await
    }

    async fn create_with_image(
        &self,
        collection: &str,
        payload: Value,
        image: &ImageAttachment,
    ) -> ClientResult<Value> {
        let form = multipart::Form::new()
            .text("data", payload.to_string())
            .part("image", image.to_part()?);
        let response = self
            .request(Method::POST, &[collection])?
            .multipart(form)
            .send()
            .await?;
        decode(response).await
    }

    async fn update(&self, collection: &str, id: &str, patch: Value) -> ClientResult<Value> {
        let response = self
            .request(Method::PATCH, &[collection, id])?
            .json(&patch)
            .send()
            .await?;
        decode(response).await
    }

    async fn delete(&self, collection: &str, id: &str) -> ClientResult<()> {
        let response = self
            .request(Method::DELETE, &[collection, id])?
            .send()
            .await?;
        check(response).await.map(|_| ())
    }

    async fn upload_image(
        &self,
        collection: &str,
        image: &ImageAttachment,
    ) -> ClientResult<String> {
        let form = multipart::Form::new()
            .text("folder", collection.to_string())
            .part("file", image.to_part()?);
        let response = self
            .request(Method::POST, &["files"])?
            .multipart(form)
            .send()
            .await?;
        let record: Value = decode(response).await?;
        record
            .get("url")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| ClientError::Decode("upload response has no url".into()))
    }
}
