use super::{AiOracle, ChatRequest, extract_content, read_envelope};
use crate::Config;
use crate::error::OracleError;
use async_trait::async_trait;
use common::models::Provider;
use log::debug;
use serde_json::json;

/// OpenAI chat completions with bearer auth and JSON-schema constrained output.
#[derive(Debug)]
pub struct OpenAiOracle {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl OpenAiOracle {
    pub fn new(config: &Config) -> Self {
        OpenAiOracle {
            client: reqwest::Client::new(),
            base_url: config.openai_base_url.trim_end_matches('/').to_string(),
            api_key: config.openai_api_key.clone().filter(|key| !key.is_empty()),
            model: config.openai_model.clone(),
        }
    }

    fn api_key(&self) -> Result<&str, OracleError> {
        self.api_key
            .as_deref()
            .ok_or(OracleError::Configuration(Provider::OpenAi, "OPENAI_API_KEY"))
    }
}

#[async_trait]
impl AiOracle for OpenAiOracle {
    fn provider(&self) -> Provider {
        Provider::OpenAi
    }

    fn supports_structured_output(&self) -> bool {
        true
    }

    fn ensure_configured(&self) -> Result<(), OracleError> {
        self.api_key().map(|_| ())
    }

    async fn complete(&self, request: ChatRequest) -> Result<String, OracleError> {
        let api_key = self.api_key()?;
        let mut body = json!({
            "model": self.model,
            "messages": request.messages,
            "temperature": 0,
        });
        if let Some(schema) = request.response_schema {
            body["response_format"] = json!({
                "type": "json_schema",
                "json_schema": {
                    "name": schema.name,
                    "strict": true,
                    "schema": schema.schema,
                },
            });
        }

        debug!("calling {} with model {}", self.base_url, self.model);
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await;

        let envelope = read_envelope(Provider::OpenAi, response).await?;
        extract_content(Provider::OpenAi, &envelope)
    }
}
