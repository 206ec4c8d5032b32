use crate::orchestrator::WorkflowError;
use common::languages::find_language;
use common::models::{AnalyzeResponse, Provider, SentenceAnalysis};
use serde::{Deserialize, Serialize};

/// Learner input as sent for splitting. Fields are fixed once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    raw_text: String,
    native_language: String,
    provider: Provider,
}

impl Submission {
    pub fn new(
        raw_text: &str,
        native_language: &str,
        provider: Provider,
    ) -> Result<Self, WorkflowError> {
        let raw_text = raw_text.trim();
        let native_language = native_language.trim();
        if raw_text.is_empty() {
            return Err(WorkflowError::Validation("text is required".to_string()));
        }
        if native_language.is_empty() {
            return Err(WorkflowError::Validation(
                "native language is required".to_string(),
            ));
        }
        if find_language(native_language).is_none() {
            return Err(WorkflowError::Validation(format!(
                "unsupported native language {native_language}"
            )));
        }
        Ok(Submission {
            raw_text: raw_text.to_string(),
            native_language: native_language.to_string(),
            provider,
        })
    }

    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    pub fn native_language(&self) -> &str {
        &self.native_language
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionResult {
    pub submission_id: String,
    pub sentences: Vec<SentenceAnalysis>,
    pub native_language: String,
    pub original_text: String,
    pub provider: Provider,
}

impl SubmissionResult {
    /// The learner's own version, including rewrites accepted on retry.
    pub fn user_text(&self) -> String {
        self.sentences
            .iter()
            .map(|s| s.user_sentence.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn corrected_text(&self) -> String {
        self.sentences
            .iter()
            .map(|s| s.correct_sentence.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl From<AnalyzeResponse> for SubmissionResult {
    fn from(response: AnalyzeResponse) -> Self {
        SubmissionResult {
            submission_id: response.submission_id,
            sentences: response.results,
            native_language: response.native_language,
            original_text: response.original_text,
            provider: response.provider,
        }
    }
}
