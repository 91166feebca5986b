//! Document-to-diagnosis analysis pipeline.
//!
//! An uploaded patient document flows through text extraction, prompt
//! assembly, a remote completion call with bounded retry, and response
//! normalization, ending in a well-shaped [`AnalysisResult`]. When no
//! remote credential is configured the pipeline produces a deterministic
//! offline analysis instead of calling out.

pub mod completion;
pub mod error;
pub mod extract;
pub mod fallback;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod prompt;
pub mod storage;

// Re-export commonly used types
pub use completion::{
    AnthropicClient, CompletionClient, CompletionConfig, CompletionOutcome, CompletionTransport,
    Credential, RetryPolicy,
};
pub use error::{ExtractError, ExtractResult, StoreError};
pub use extract::{extract_bytes, extract_document, extract_file};
pub use models::{
    AnalysisResult, CompletionRequest, Diagnosis, DocumentFormat, Likelihood, Medication,
    SourceDocument,
};
pub use normalize::normalize;
pub use pipeline::AnalysisPipeline;
pub use storage::{InMemoryResultStore, ResultStore, StoredAnalysis};
