use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Declared format of an uploaded patient document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Txt,
    Pdf,
    Docx,
}

impl DocumentFormat {
    /// File extensions the pipeline accepts, in the order they are reported
    /// to clients.
    pub const EXTENSIONS: [&'static str; 3] = ["txt", "pdf", "docx"];

    /// Resolve a format from a file extension, case-insensitively.
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "txt" => Some(Self::Txt),
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Txt => "txt",
            Self::Pdf => "pdf",
            Self::Docx => "docx",
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An uploaded document sitting in scratch storage, ready for extraction.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub path: PathBuf,
    pub declared_format: DocumentFormat,
}

impl SourceDocument {
    pub fn new(path: impl Into<PathBuf>, declared_format: DocumentFormat) -> Self {
        Self {
            path: path.into(),
            declared_format,
        }
    }
}

/// A fully rendered request for the completion endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system_instructions: String,
    pub user_prompt: String,
}

/// How strongly a candidate diagnosis is ranked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Likelihood {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Medication {
    pub name: String,
    #[serde(default)]
    pub dosage: String,
    #[serde(default)]
    pub frequency: String,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnosis {
    pub condition: String,
    pub likelihood: Likelihood,
    pub reasoning: String,
    #[serde(default)]
    pub medications: Vec<Medication>,
    #[serde(default)]
    pub additional_tests: Vec<String>,
}

/// The one value the pipeline hands back to callers. Always well shaped:
/// failure paths populate `error` instead of surfacing an exception.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub diagnoses: Vec<Diagnosis>,
    #[serde(default)]
    pub warnings: Vec<String>,
    #[serde(default)]
    pub disclaimer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AnalysisResult {
    /// Structured failure value used by every terminal error path.
    pub fn failure(
        error: impl Into<String>,
        warning: impl Into<String>,
        disclaimer: impl Into<String>,
    ) -> Self {
        Self {
            diagnoses: Vec::new(),
            warnings: vec![warning.into()],
            disclaimer: disclaimer.into(),
            error: Some(error.into()),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_resolution_is_case_insensitive() {
        assert_eq!(DocumentFormat::from_extension("PDF"), Some(DocumentFormat::Pdf));
        assert_eq!(DocumentFormat::from_extension("Docx"), Some(DocumentFormat::Docx));
        assert_eq!(DocumentFormat::from_extension("txt"), Some(DocumentFormat::Txt));
        assert_eq!(DocumentFormat::from_extension("csv"), None);
        assert_eq!(DocumentFormat::from_extension(""), None);
    }

    #[test]
    fn likelihood_serializes_as_plain_variant_name() {
        assert_eq!(serde_json::to_string(&Likelihood::High).unwrap(), "\"High\"");
        let parsed: Likelihood = serde_json::from_str("\"Medium\"").unwrap();
        assert_eq!(parsed, Likelihood::Medium);
        assert!(serde_json::from_str::<Likelihood>("\"Probable\"").is_err());
    }

    #[test]
    fn failure_result_is_well_shaped() {
        let result = AnalysisResult::failure("boom", "something went wrong", "no analysis");
        assert!(result.is_failure());
        assert!(result.diagnoses.is_empty());
        assert_eq!(result.warnings, vec!["something went wrong".to_string()]);

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["error"], "boom");
        assert_eq!(json["disclaimer"], "no analysis");
    }

    #[test]
    fn success_result_omits_error_field_in_json() {
        let result = AnalysisResult {
            diagnoses: Vec::new(),
            warnings: Vec::new(),
            disclaimer: "advice".to_string(),
            error: None,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("error").is_none());
    }
}
