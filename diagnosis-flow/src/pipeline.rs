//! The document-to-diagnosis orchestrator.
//!
//! Every entry point returns an [`AnalysisResult`]: extraction failures,
//! empty input, completion failures and unparseable model output all come
//! back as structured failure values with `error` set.

use std::path::Path;
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::completion::{CompletionClient, CompletionOutcome};
use crate::error::ExtractError;
use crate::extract;
use crate::fallback;
use crate::models::{AnalysisResult, DocumentFormat, SourceDocument};
use crate::normalize;
use crate::prompt;

pub struct AnalysisPipeline {
    client: Arc<dyn CompletionClient>,
}

impl AnalysisPipeline {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self { client }
    }

    /// Analyze the document at `path`, resolving the format from the file
    /// extension.
    pub async fn analyze_file(&self, path: &Path) -> AnalysisResult {
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
        match DocumentFormat::from_extension(extension) {
            Some(format) => self.analyze(&SourceDocument::new(path, format)).await,
            None => {
                warn!(extension = %extension, "rejected document with unsupported format");
                extraction_failure(&ExtractError::UnsupportedFormat(extension.to_string()))
            }
        }
    }

    /// Run the full pipeline for an already classified document.
    pub async fn analyze(&self, document: &SourceDocument) -> AnalysisResult {
        let doc = document.clone();
        let extracted =
            tokio::task::spawn_blocking(move || extract::extract_document(&doc)).await;
        let text = match extracted {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => {
                warn!(error = %e, path = %document.path.display(), "document extraction failed");
                return extraction_failure(&e);
            }
            Err(e) => {
                error!(error = %e, "extraction task did not complete");
                return AnalysisResult::failure(
                    format!("document extraction did not complete: {e}"),
                    "The uploaded document could not be read",
                    "This analysis could not be completed because text extraction failed.",
                );
            }
        };

        info!(
            extracted_chars = text.len(),
            format = %document.declared_format,
            "document text extracted"
        );
        self.analyze_text(&text).await
    }

    /// Analyze already extracted patient text.
    ///
    /// Empty or whitespace-only text short-circuits before any prompt is
    /// built or any completion call is made.
    pub async fn analyze_text(&self, patient_data: &str) -> AnalysisResult {
        if patient_data.trim().is_empty() {
            warn!("empty patient data, skipping completion call");
            return AnalysisResult::failure(
                "Empty patient data provided",
                "No patient data was provided for analysis",
                "This analysis could not be completed due to missing data.",
            );
        }

        if !self.client.is_configured() {
            info!("no completion credential configured, producing offline mock analysis");
            return fallback::mock_analysis(patient_data);
        }

        let request = prompt::build(patient_data);
        info!(
            prompt_chars = request.user_prompt.len(),
            prompt_version = prompt::PROMPT_VERSION,
            "requesting completion"
        );

        match self.client.complete(&request).await {
            CompletionOutcome::Success(raw) => normalize::normalize(&raw),
            CompletionOutcome::TransientFailure(reason)
            | CompletionOutcome::FatalFailure(reason) => {
                warn!(%reason, "completion failed, returning structured error result");
                AnalysisResult::failure(
                    reason,
                    "An error occurred during analysis",
                    "This system encountered an error and could not complete the analysis.",
                )
            }
        }
    }
}

fn extraction_failure(error: &ExtractError) -> AnalysisResult {
    AnalysisResult::failure(
        error.to_string(),
        "The uploaded document could not be read",
        "This analysis could not be completed because text extraction failed.",
    )
}
