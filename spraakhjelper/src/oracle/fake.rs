use super::{AiOracle, ChatRequest};
use crate::error::OracleError;
use async_trait::async_trait;
use common::models::Provider;
use std::sync::Mutex;

/// Scripted backend for tests. Replies with a fixed payload or fails as unreachable.
pub struct FakeOracle {
    provider: Provider,
    reply: Option<String>,
    structured: bool,
    configured: bool,
    requests: Mutex<Vec<ChatRequest>>,
}

impl FakeOracle {
    pub fn replying(provider: Provider, reply: &str) -> Self {
        FakeOracle {
            provider,
            reply: Some(reply.to_string()),
            structured: false,
            configured: true,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn unreachable(provider: Provider) -> Self {
        FakeOracle {
            reply: None,
            ..FakeOracle::replying(provider, "")
        }
    }

    pub fn structured(mut self) -> Self {
        self.structured = true;
        self
    }

    pub fn unconfigured(mut self) -> Self {
        self.configured = false;
        self
    }

    pub fn last_request(&self) -> Option<ChatRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl AiOracle for FakeOracle {
    fn provider(&self) -> Provider {
        self.provider
    }

    fn supports_structured_output(&self) -> bool {
        self.structured
    }

    fn ensure_configured(&self) -> Result<(), OracleError> {
        if self.configured {
            Ok(())
        } else {
            Err(OracleError::Configuration(self.provider, "FAKE_API_KEY"))
        }
    }

    async fn complete(&self, request: ChatRequest) -> Result<String, OracleError> {
        self.requests.lock().unwrap().push(request);
        self.reply.clone().ok_or(OracleError::Unavailable {
            provider: self.provider,
            status: None,
            message: "connection refused".to_string(),
        })
    }
}

/// Serves `router` on an ephemeral local port and returns its base URL.
pub async fn serve_upstream(router: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

/// What the stand-in upstream saw of the last request.
#[derive(Debug, Clone, Default)]
pub struct Captured {
    pub uri: String,
    pub authorization: Option<String>,
    pub api_key: Option<String>,
    pub body: serde_json::Value,
}

pub type CapturedSlot = std::sync::Arc<Mutex<Option<Captured>>>;

/// Upstream handler that records the request and answers with `reply` as the message content.
pub fn completion_route(slot: CapturedSlot, reply: &'static str) -> axum::routing::MethodRouter {
    axum::routing::post(
        move |headers: axum::http::HeaderMap,
              uri: axum::http::Uri,
              axum::Json(body): axum::Json<serde_json::Value>| async move {
            let header = |name: &str| {
                headers
                    .get(name)
                    .and_then(|h| h.to_str().ok())
                    .map(str::to_string)
            };
            *slot.lock().unwrap() = Some(Captured {
                uri: uri.to_string(),
                authorization: header("authorization"),
                api_key: header("api-key"),
                body,
            });
            axum::Json(serde_json::json!({
                "choices": [{"index": 0, "message": {"role": "assistant", "content": reply}}]
            }))
        },
    )
}
