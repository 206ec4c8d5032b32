use async_trait::async_trait;
use common::models::{
    AnalyzeRequest, AnalyzeResponse, CheckRequest, CheckResponse, ErrorResponse, SplitRequest,
    SplitResponse,
};
use log::debug;
use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server answered {status}: {message}")]
    Server {
        status: u16,
        kind: Option<String>,
        message: String,
    },
}

/// The three learner operations of the feedback service.
#[async_trait]
pub trait SpraakApi: Send + Sync {
    async fn split(&self, request: &SplitRequest) -> Result<SplitResponse, ApiError>;

    async fn analyze(&self, request: &AnalyzeRequest) -> Result<AnalyzeResponse, ApiError>;

    async fn check_one(&self, request: &CheckRequest) -> Result<CheckResponse, ApiError>;
}

#[derive(Debug)]
pub struct HttpApi {
    client: Client,
    base_url: String,
}

impl HttpApi {
    pub fn new(base_url: &str) -> Self {
        HttpApi {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn post<B, R>(&self, path: &str, body: &B) -> Result<R, ApiError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let url = format!("{}{path}", self.base_url);
        debug!("POST {url}");
        let response = self.client.post(&url).json(body).send().await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let text = response.text().await?;
        let (kind, message) = match serde_json::from_str::<ErrorResponse>(&text) {
            Ok(body) => (body.kind, body.message),
            Err(_) => (None, text),
        };
        Err(ApiError::Server {
            status: status.as_u16(),
            kind,
            message,
        })
    }
}

#[async_trait]
impl SpraakApi for HttpApi {
    async fn split(&self, request: &SplitRequest) -> Result<SplitResponse, ApiError> {
        self.post("/api/v1/split", request).await
    }

    async fn analyze(&self, request: &AnalyzeRequest) -> Result<AnalyzeResponse, ApiError> {
        self.post("/api/v1/analyze", request).await
    }

    async fn check_one(&self, request: &CheckRequest) -> Result<CheckResponse, ApiError> {
        self.post("/api/v1/check", request).await
    }
}
