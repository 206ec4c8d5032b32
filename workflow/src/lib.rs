//! Client-side learner workflow: submit text, review the sentence split,
//! step through per-sentence feedback with retries, and summarize.

pub mod api;
pub mod orchestrator;
pub mod session;
pub mod store;
pub mod summary;

pub use api::{ApiError, HttpApi, SpraakApi};
pub use orchestrator::{Orchestrator, SplitDraft, Stage, WorkflowError};
pub use session::{Submission, SubmissionResult};
pub use store::{FileStore, MemoryStore, SessionStore, StoreError};
pub use summary::{Summary, summarize};
