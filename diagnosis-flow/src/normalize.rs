//! Completion output cleanup and shape validation.
//!
//! Models frequently wrap their JSON in a fenced code block even when told
//! not to. The normalizer strips that wrapping, then validates the payload
//! against the analysis shape. Anything that fails validation becomes a
//! structured failure result; raw model text never leaks to callers.

use tracing::warn;

use crate::models::AnalysisResult;

/// Turn raw completion text into a well-shaped [`AnalysisResult`].
pub fn normalize(raw_text: &str) -> AnalysisResult {
    let cleaned = strip_code_fence(raw_text);
    match serde_json::from_str::<AnalysisResult>(cleaned) {
        Ok(result) => result,
        Err(e) => {
            warn!(error = %e, "completion output failed shape validation");
            AnalysisResult::failure(
                format!("failed to parse completion output as analysis JSON: {e}"),
                "An error occurred during analysis",
                "This system encountered an error and could not complete the analysis.",
            )
        }
    }
}

/// Strip a wrapping fenced code block, if present. Handles a `json`-tagged
/// or bare opening fence; the closing fence is optional.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let without_prefix = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    let without_suffix = without_prefix.strip_suffix("```").unwrap_or(without_prefix);
    without_suffix.trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Likelihood;

    const VALID_ANALYSIS: &str = r#"{
        "diagnoses": [
            {
                "condition": "Influenza",
                "likelihood": "High",
                "reasoning": "Fever with body aches during flu season.",
                "medications": [
                    {
                        "name": "Oseltamivir (Tamiflu)",
                        "dosage": "75 mg",
                        "frequency": "Twice daily",
                        "duration": "5 days",
                        "notes": "Start within 48 hours of symptom onset."
                    }
                ],
                "additional_tests": ["Rapid influenza test"]
            }
        ],
        "warnings": ["Seek care if breathing becomes difficult"],
        "disclaimer": "This analysis is not a substitute for professional medical advice."
    }"#;

    #[test]
    fn plain_json_passes_through() {
        let result = normalize(VALID_ANALYSIS);
        assert!(result.error.is_none());
        assert_eq!(result.diagnoses.len(), 1);
        assert_eq!(result.diagnoses[0].condition, "Influenza");
        assert_eq!(result.diagnoses[0].likelihood, Likelihood::High);
    }

    #[test]
    fn json_fenced_output_is_unwrapped_exactly() {
        let fenced = format!("```json\n{VALID_ANALYSIS}\n```");
        assert_eq!(normalize(&fenced), normalize(VALID_ANALYSIS));
    }

    #[test]
    fn bare_fence_is_unwrapped_too() {
        let fenced = format!("```\n{VALID_ANALYSIS}\n```");
        assert_eq!(normalize(&fenced), normalize(VALID_ANALYSIS));
    }

    #[test]
    fn missing_closing_fence_is_tolerated() {
        let fenced = format!("```json\n{VALID_ANALYSIS}");
        assert_eq!(normalize(&fenced), normalize(VALID_ANALYSIS));
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        let padded = format!("\n\n   ```json\n{VALID_ANALYSIS}\n```   \n");
        assert!(normalize(&padded).error.is_none());
    }

    #[test]
    fn prose_output_becomes_structured_failure() {
        let result = normalize("I'm sorry, I cannot provide a diagnosis.");
        assert!(result.is_failure());
        assert!(result.diagnoses.is_empty());
        assert_eq!(result.warnings, vec!["An error occurred during analysis".to_string()]);
        assert_eq!(
            result.disclaimer,
            "This system encountered an error and could not complete the analysis."
        );
    }

    #[test]
    fn json_missing_diagnoses_fails_validation() {
        let result = normalize(r#"{"warnings": [], "disclaimer": "x"}"#);
        assert!(result.is_failure());
    }

    #[test]
    fn unknown_likelihood_fails_validation() {
        let raw = r#"{
            "diagnoses": [
                {"condition": "X", "likelihood": "Certain", "reasoning": "y"}
            ]
        }"#;
        assert!(normalize(raw).is_failure());
    }

    #[test]
    fn missing_warnings_and_disclaimer_default_benignly() {
        let raw = r#"{
            "diagnoses": [
                {"condition": "X", "likelihood": "Low", "reasoning": "y"}
            ]
        }"#;
        let result = normalize(raw);
        assert!(result.error.is_none());
        assert!(result.warnings.is_empty());
        assert_eq!(result.disclaimer, "");
    }

    #[test]
    fn error_field_in_model_output_is_preserved() {
        let raw = r#"{"diagnoses": [], "error": "insufficient data"}"#;
        let result = normalize(raw);
        assert_eq!(result.error.as_deref(), Some("insufficient data"));
    }
}
