use diagnosis_flow::AnalysisResult;
use serde::{Deserialize, Serialize};

/// Body returned by `POST /analyze`. `success` reports that the pipeline
/// ran; the analysis itself may still carry an `error` field.
#[derive(Debug, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub success: bool,
    pub analysis_id: String,
    pub result: AnalysisResult,
}
