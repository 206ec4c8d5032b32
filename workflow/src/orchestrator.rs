//! The learner's path through one submission:
//!
//! `Form -> Splitting -> SplitReview -> Analyzing -> SentenceReview -> Summary`
//!
//! Every oracle-backed step can fail into `Error`, which remembers the
//! stable stage to return to once the learner acknowledges it. Calls are
//! serialized by `&mut self`, so at most one request is ever in flight.

use crate::api::{ApiError, SpraakApi};
use crate::session::{Submission, SubmissionResult};
use crate::store::SessionStore;
use crate::summary::{Summary, summarize};
use common::models::{
    AnalyzeRequest, CheckOutcome, CheckRequest, SentenceAnalysis, SentenceSplit, SentenceStatus,
    SplitRequest,
};
use log::{info, warn};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("invalid input: {0}")]
    Validation(String),
    #[error("cannot {action} while in {stage}")]
    InvalidTransition {
        action: &'static str,
        stage: &'static str,
    },
    #[error("sentence {0} cannot be retried")]
    NotRetryable(usize),
    #[error("the summary is only available from the last sentence")]
    NotAtLastSentence,
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// The split awaiting the learner's confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitDraft {
    pub submission: Submission,
    pub sentences: Vec<SentenceSplit>,
    /// Language echoed by the split, reused for analysis.
    pub native_language: String,
}

impl SplitDraft {
    pub fn joined_text(&self) -> String {
        self.sentences
            .iter()
            .map(|s| s.corrected.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    Form,
    Splitting(Submission),
    SplitReview(SplitDraft),
    Analyzing(SplitDraft),
    SentenceReview { cursor: usize },
    Summary { cursor: usize },
    Error { message: String, resume: Box<Stage> },
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Form => "form",
            Stage::Splitting(_) => "splitting",
            Stage::SplitReview(_) => "split review",
            Stage::Analyzing(_) => "analyzing",
            Stage::SentenceReview { .. } => "sentence review",
            Stage::Summary { .. } => "summary",
            Stage::Error { .. } => "error",
        }
    }
}

fn invalid(action: &'static str, stage: &Stage) -> WorkflowError {
    WorkflowError::InvalidTransition {
        action,
        stage: stage.name(),
    }
}

pub struct Orchestrator<A, S> {
    api: A,
    store: S,
    stage: Stage,
    result: Option<SubmissionResult>,
}

impl<A: SpraakApi, S: SessionStore> Orchestrator<A, S> {
    pub fn new(api: A, store: S) -> Self {
        Orchestrator {
            api,
            store,
            stage: Stage::Form,
            result: None,
        }
    }

    /// Resumes a stored submission at its first sentence, or starts at the form.
    pub fn restore(api: A, mut store: S) -> Self {
        let result = match store.load() {
            Ok(result) => result,
            Err(e) => {
                warn!("discarding stored session: {e}");
                if let Err(e) = store.clear() {
                    warn!("failed to clear stored session: {e}");
                }
                None
            }
        };
        let stage = match &result {
            Some(result) => {
                info!("restored submission {}", result.submission_id);
                Stage::SentenceReview { cursor: 0 }
            }
            None => Stage::Form,
        };
        Orchestrator {
            api,
            store,
            stage,
            result,
        }
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    pub fn result(&self) -> Option<&SubmissionResult> {
        self.result.as_ref()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn current_sentence(&self) -> Option<&SentenceAnalysis> {
        let cursor = match self.stage {
            Stage::SentenceReview { cursor } | Stage::Summary { cursor } => cursor,
            _ => return None,
        };
        self.result.as_ref()?.sentences.get(cursor)
    }

    pub fn summary(&self) -> Option<Summary> {
        self.result.as_ref().map(|r| summarize(&r.sentences))
    }

    pub async fn submit(&mut self, submission: Submission) -> Result<(), WorkflowError> {
        if self.stage != Stage::Form {
            return Err(invalid("submit", &self.stage));
        }
        let request = SplitRequest {
            text: submission.raw_text().to_string(),
            native_language: submission.native_language().to_string(),
            provider: Some(submission.provider()),
        };

        self.stage = Stage::Splitting(submission.clone());
        match self.api.split(&request).await {
            Ok(response) => {
                info!("text split into {} sentences", response.sentence_count);
                self.stage = Stage::SplitReview(SplitDraft {
                    submission,
                    sentences: response.sentences,
                    native_language: response.native_language,
                });
                Ok(())
            }
            Err(e) => Err(self.fail(e, Stage::Form)),
        }
    }

    pub async fn confirm_split(&mut self) -> Result<(), WorkflowError> {
        let draft = match &self.stage {
            Stage::SplitReview(draft) => draft.clone(),
            other => return Err(invalid("confirm the split", other)),
        };
        let request = AnalyzeRequest {
            text: draft.joined_text(),
            native_language: draft.native_language.clone(),
            provider: Some(draft.submission.provider()),
        };

        self.stage = Stage::Analyzing(draft.clone());
        match self.api.analyze(&request).await {
            Ok(response) => {
                info!(
                    "submission {} analyzed into {} sentences",
                    response.submission_id,
                    response.results.len()
                );
                self.result = Some(SubmissionResult::from(response));
                self.stage = Stage::SentenceReview { cursor: 0 };
                self.persist();
                Ok(())
            }
            Err(e) => Err(self.fail(e, Stage::SplitReview(draft))),
        }
    }

    pub fn next(&mut self) -> Result<(), WorkflowError> {
        let len = self.sentence_count();
        match &mut self.stage {
            Stage::SentenceReview { cursor } => {
                if *cursor + 1 < len {
                    *cursor += 1;
                }
                Ok(())
            }
            other => Err(invalid("move to the next sentence", other)),
        }
    }

    pub fn previous(&mut self) -> Result<(), WorkflowError> {
        match &mut self.stage {
            Stage::SentenceReview { cursor } => {
                *cursor = cursor.saturating_sub(1);
                Ok(())
            }
            other => Err(invalid("move to the previous sentence", other)),
        }
    }

    /// Rechecks the learner's rewrite of the current sentence.
    ///
    /// Only sentences still marked incorrect can be retried. Each attempt is
    /// an independent oracle call; on success the entry takes the candidate,
    /// the new status and the fresh explanations.
    pub async fn retry(&mut self, candidate: &str) -> Result<CheckOutcome, WorkflowError> {
        let cursor = match self.stage {
            Stage::SentenceReview { cursor } => cursor,
            ref other => return Err(invalid("retry a sentence", other)),
        };
        let candidate = candidate.trim();
        if candidate.is_empty() {
            return Err(WorkflowError::Validation("an answer is required".to_string()));
        }

        let request = {
            let result = self
                .result
                .as_ref()
                .ok_or_else(|| invalid("retry a sentence", &self.stage))?;
            let sentence = result
                .sentences
                .get(cursor)
                .filter(|s| s.status == SentenceStatus::Incorrect)
                .ok_or(WorkflowError::NotRetryable(cursor))?;
            CheckRequest {
                sentence: candidate.to_string(),
                correct_sentence: sentence.correct_sentence.clone(),
                native_language: result.native_language.clone(),
                provider: Some(result.provider),
            }
        };

        match self.api.check_one(&request).await {
            Ok(response) => {
                let outcome = response.outcome;
                if let Some(sentence) = self
                    .result
                    .as_mut()
                    .and_then(|r| r.sentences.get_mut(cursor))
                {
                    sentence.user_sentence = request.sentence;
                    sentence.status = if outcome.is_correct {
                        SentenceStatus::CorrectedByLearner
                    } else {
                        SentenceStatus::Incorrect
                    };
                    sentence.explanation_native = outcome.explanation_native.clone();
                    sentence.explanation_mother_tongue = outcome.explanation_mother_tongue.clone();
                }
                self.persist();
                Ok(outcome)
            }
            Err(e) => Err(self.fail(e, Stage::SentenceReview { cursor })),
        }
    }

    pub fn finish(&mut self) -> Result<(), WorkflowError> {
        let len = self.sentence_count();
        match self.stage {
            Stage::SentenceReview { cursor } if cursor + 1 >= len => {
                self.stage = Stage::Summary { cursor };
                self.persist();
                Ok(())
            }
            Stage::SentenceReview { .. } => Err(WorkflowError::NotAtLastSentence),
            ref other => Err(invalid("show the summary", other)),
        }
    }

    pub fn back(&mut self) -> Result<(), WorkflowError> {
        match self.stage {
            Stage::Summary { cursor } => {
                self.stage = Stage::SentenceReview { cursor };
                self.persist();
                Ok(())
            }
            ref other => Err(invalid("go back to the sentences", other)),
        }
    }

    /// Drops the submission and its stored copy and returns to the form.
    /// An error has to be acknowledged first.
    pub fn restart(&mut self) -> Result<(), WorkflowError> {
        if let Stage::Error { .. } = self.stage {
            return Err(invalid("restart", &self.stage));
        }
        self.result = None;
        self.stage = Stage::Form;
        if let Err(e) = self.store.clear() {
            warn!("failed to clear stored session: {e}");
        }
        Ok(())
    }

    pub fn acknowledge_error(&mut self) -> Result<(), WorkflowError> {
        match std::mem::replace(&mut self.stage, Stage::Form) {
            Stage::Error { resume, .. } => {
                self.stage = *resume;
                Ok(())
            }
            other => {
                let err = invalid("acknowledge an error", &other);
                self.stage = other;
                Err(err)
            }
        }
    }

    fn sentence_count(&self) -> usize {
        self.result.as_ref().map_or(0, |r| r.sentences.len())
    }

    fn persist(&mut self) {
        if let Some(result) = &self.result {
            if let Err(e) = self.store.save(result) {
                warn!("failed to persist submission {}: {e}", result.submission_id);
            }
        }
    }

    fn fail(&mut self, err: ApiError, resume: Stage) -> WorkflowError {
        warn!("{} failed: {err}", self.stage.name());
        self.stage = Stage::Error {
            message: err.to_string(),
            resume: Box::new(resume),
        };
        WorkflowError::Api(err)
    }
}
