use super::{AiOracle, ChatRequest, extract_content, read_envelope};
use crate::Config;
use crate::error::OracleError;
use async_trait::async_trait;
use common::models::Provider;
use log::debug;
use serde_json::json;

/// Azure OpenAI deployment addressed by endpoint, deployment name and api version.
#[derive(Debug)]
pub struct AzureOracle {
    client: reqwest::Client,
    endpoint: Option<String>,
    api_key: Option<String>,
    deployment: String,
    api_version: String,
}

impl AzureOracle {
    pub fn new(config: &Config) -> Self {
        AzureOracle {
            client: reqwest::Client::new(),
            endpoint: config
                .azure_openai_endpoint
                .as_deref()
                .map(|endpoint| endpoint.trim_end_matches('/').to_string())
                .filter(|endpoint| !endpoint.is_empty()),
            api_key: config
                .azure_openai_api_key
                .clone()
                .filter(|key| !key.is_empty()),
            deployment: config.azure_openai_deployment_name.clone(),
            api_version: config.azure_openai_api_version.clone(),
        }
    }

    fn credentials(&self) -> Result<(&str, &str), OracleError> {
        let endpoint = self
            .endpoint
            .as_deref()
            .ok_or(OracleError::Configuration(Provider::Azure, "AZURE_OPENAI_ENDPOINT"))?;
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(OracleError::Configuration(Provider::Azure, "AZURE_OPENAI_API_KEY"))?;
        Ok((endpoint, api_key))
    }

    fn completions_url(&self, endpoint: &str) -> String {
        format!(
            "{endpoint}/openai/deployments/{}/chat/completions?api-version={}",
            self.deployment, self.api_version
        )
    }
}

#[async_trait]
impl AiOracle for AzureOracle {
    fn provider(&self) -> Provider {
        Provider::Azure
    }

    fn supports_structured_output(&self) -> bool {
        false
    }

    fn ensure_configured(&self) -> Result<(), OracleError> {
        self.credentials().map(|_| ())
    }

    async fn complete(&self, request: ChatRequest) -> Result<String, OracleError> {
        let (endpoint, api_key) = self.credentials()?;
        let url = self.completions_url(endpoint);

        debug!("calling azure deployment {} at {endpoint}", self.deployment);
        let response = self
            .client
            .post(url)
            .header("api-key", api_key)
            .json(&json!({
                "messages": request.messages,
                "temperature": 0,
                "max_tokens": request.max_tokens,
            }))
            .send()
            .await;

        let envelope = read_envelope(Provider::Azure, response).await?;
        extract_content(Provider::Azure, &envelope)
    }
}
