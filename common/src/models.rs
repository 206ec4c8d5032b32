use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

/// LLM backend serving a request.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, ToSchema, PartialEq, Eq, Hash)]
pub enum Provider {
    #[default]
    #[serde(rename = "openai")]
    OpenAi,
    #[serde(rename = "azure")]
    Azure,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
            Provider::Azure => "azure",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum SentenceStatus {
    /// The oracle judged the sentence correct as first written.
    InitiallyCorrect,
    /// The learner fixed the sentence through a recheck.
    CorrectedByLearner,
    Incorrect,
}

impl SentenceStatus {
    pub fn is_correct(&self) -> bool {
        !matches!(self, SentenceStatus::Incorrect)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct SentenceSplit {
    pub original: String,
    /// Always equal to `original` when produced by the split operation.
    pub corrected: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SentenceAnalysis {
    pub user_sentence: String,
    pub correct_sentence: String,
    pub explanation_native: String,
    pub explanation_mother_tongue: String,
    pub status: SentenceStatus,
    pub sentence_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CheckOutcome {
    pub is_correct: bool,
    pub explanation_native: String,
    pub explanation_mother_tongue: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct SplitRequest {
    pub text: String,
    #[serde(alias = "morsmaal")]
    pub native_language: String,
    pub provider: Option<Provider>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct AnalyzeRequest {
    pub text: String,
    #[serde(alias = "morsmaal")]
    pub native_language: String,
    pub provider: Option<Provider>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct CheckRequest {
    pub sentence: String,
    pub correct_sentence: String,
    #[serde(alias = "morsmaal")]
    pub native_language: String,
    pub provider: Option<Provider>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SplitResponse {
    pub success: bool,
    pub sentences: Vec<SentenceSplit>,
    pub sentence_count: usize,
    pub native_language: String,
    pub original_text: String,
    pub provider: Provider,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    pub success: bool,
    pub submission_id: String,
    pub results: Vec<SentenceAnalysis>,
    pub native_language: String,
    pub original_text: String,
    pub provider: Provider,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckResponse {
    pub success: bool,
    #[serde(flatten)]
    pub outcome: CheckOutcome,
    pub provider: Provider,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<FieldError>,
}
