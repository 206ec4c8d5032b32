mod azure;
#[cfg(test)]
pub mod fake;
mod openai;
pub mod prompt;

pub use azure::AzureOracle;
pub use openai::OpenAiOracle;

use crate::error::{OracleError, require_non_empty};
use crate::normalize;
use askama::Template;
use async_trait::async_trait;
use common::models::{CheckOutcome, Provider, SentenceAnalysis, SentenceSplit};
use log::{debug, info};
use prompt::{ANALYSIS_WRAPPER, AnalyzePrompt, CheckPrompt, SplitPrompt};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

const SPLIT_MAX_TOKENS: u32 = 4000;
const ANALYZE_MAX_TOKENS: u32 = 4000;
const CHECK_MAX_TOKENS: u32 = 1000;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        ChatMessage {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        ChatMessage {
            role: Role::User,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResponseSchema {
    pub name: &'static str,
    pub schema: Value,
}

#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub response_schema: Option<ResponseSchema>,
}

/// A chat-completion backend answering with a single text payload.
#[async_trait]
pub trait AiOracle: Send + Sync {
    fn provider(&self) -> Provider;

    fn supports_structured_output(&self) -> bool;

    fn ensure_configured(&self) -> Result<(), OracleError>;

    /// Sends one request and returns the first choice's message content.
    async fn complete(&self, request: ChatRequest) -> Result<String, OracleError>;
}

/// Reads a chat-completion envelope, mapping transport failures to
/// [`OracleError::Unavailable`].
async fn read_envelope(
    provider: Provider,
    response: Result<reqwest::Response, reqwest::Error>,
) -> Result<Value, OracleError> {
    let response = response.map_err(|e| OracleError::Unavailable {
        provider,
        status: e.status().map(|s| s.as_u16()),
        message: e.to_string(),
    })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(OracleError::Unavailable {
            provider,
            status: Some(status.as_u16()),
            message: format!("unexpected code {status}: {body}"),
        });
    }

    response
        .json::<Value>()
        .await
        .map_err(|e| OracleError::Malformed(format!("invalid completion envelope: {e}")))
}

fn extract_content(provider: Provider, envelope: &Value) -> Result<String, OracleError> {
    envelope["choices"][0]["message"]["content"]
        .as_str()
        .map(str::trim)
        .filter(|content| !content.is_empty())
        .map(str::to_string)
        .ok_or(OracleError::EmptyResponse(provider))
}

/// Runs the learner operations against one backend.
#[derive(Clone)]
pub struct OracleClient {
    oracle: Arc<dyn AiOracle>,
}

impl OracleClient {
    pub fn new(oracle: Arc<dyn AiOracle>) -> Self {
        OracleClient { oracle }
    }

    pub fn provider(&self) -> Provider {
        self.oracle.provider()
    }

    pub fn ensure_configured(&self) -> Result<(), OracleError> {
        self.oracle.ensure_configured()
    }

    pub async fn split_into_sentences(
        &self,
        text: &str,
        native_language: &str,
    ) -> Result<Vec<SentenceSplit>, OracleError> {
        self.oracle.ensure_configured()?;
        require_non_empty(&[("text", text), ("nativeLanguage", native_language)])?;

        let prompt = SplitPrompt {
            text,
            native_language,
        }
        .render()?;
        debug!("requesting sentence split from {}", self.provider());
        let raw = self
            .oracle
            .complete(ChatRequest {
                messages: vec![ChatMessage::user(prompt)],
                max_tokens: SPLIT_MAX_TOKENS,
                response_schema: None,
            })
            .await?;

        let sentences = normalize::sentence_splits(&raw)?;
        info!(
            "{} split text into {} sentences",
            self.provider(),
            sentences.len()
        );
        Ok(sentences)
    }

    pub async fn analyze_sentences(
        &self,
        text: &str,
        native_language: &str,
        submission_id: &str,
    ) -> Result<Vec<SentenceAnalysis>, OracleError> {
        self.oracle.ensure_configured()?;
        require_non_empty(&[("text", text), ("nativeLanguage", native_language)])?;

        let structured = self.oracle.supports_structured_output();
        let instructions = AnalyzePrompt::new(native_language, structured).render()?;
        let request = if structured {
            ChatRequest {
                messages: vec![
                    ChatMessage::system(instructions),
                    ChatMessage::user(prompt::analysis_user_message(text)),
                ],
                max_tokens: ANALYZE_MAX_TOKENS,
                response_schema: Some(ResponseSchema {
                    name: "sentence_analysis",
                    schema: prompt::analysis_schema(native_language),
                }),
            }
        } else {
            ChatRequest {
                messages: vec![ChatMessage::user(format!(
                    "{instructions}\n\n{}",
                    prompt::analysis_user_message(text)
                ))],
                max_tokens: ANALYZE_MAX_TOKENS,
                response_schema: None,
            }
        };

        debug!(
            "requesting analysis of submission {submission_id} from {}",
            self.provider()
        );
        let raw = self.oracle.complete(request).await?;
        normalize::sentence_analyses(&raw, submission_id, structured.then_some(ANALYSIS_WRAPPER))
    }

    pub async fn check_single_sentence(
        &self,
        user_sentence: &str,
        correct_sentence: &str,
        native_language: &str,
    ) -> Result<CheckOutcome, OracleError> {
        self.oracle.ensure_configured()?;
        require_non_empty(&[
            ("sentence", user_sentence),
            ("correctSentence", correct_sentence),
            ("nativeLanguage", native_language),
        ])?;

        let prompt = CheckPrompt {
            sentence: user_sentence,
            correct_sentence,
            native_language,
        }
        .render()?;
        let raw = self
            .oracle
            .complete(ChatRequest {
                messages: vec![ChatMessage::user(prompt)],
                max_tokens: CHECK_MAX_TOKENS,
                response_schema: None,
            })
            .await?;
        normalize::check_outcome(&raw)
    }
}
