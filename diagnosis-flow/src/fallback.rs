//! Deterministic offline analysis used when no remote credential exists.
//!
//! Keyword matching over the lower-cased document text drives a small fixed
//! rule set. The output is shaped exactly like a remote analysis so callers
//! cannot tell the two apart structurally; the warnings say so instead.

use crate::models::{AnalysisResult, Diagnosis, Likelihood, Medication};

const MOCK_WARNING: &str =
    "This is a mock response for testing only. No actual medical analysis was performed.";
const CREDENTIAL_WARNING: &str = "Development mode active: Please set a valid Anthropic API key using the ANTHROPIC_API_KEY environment variable.";
const MOCK_DISCLAIMER: &str = "This analysis is not a substitute for professional medical advice. API key was not provided or invalid.";

/// Symptom signals scanned for in the patient text. Matching is plain
/// substring containment, so "no fever" still sets `fever`.
struct Signals {
    fever: bool,
    headache: bool,
    cough: bool,
    sore_throat: bool,
    fatigue: bool,
}

impl Signals {
    fn scan(patient_data: &str) -> Self {
        let lower = patient_data.to_lowercase();
        Self {
            fever: lower.contains("fever") || lower.contains("temperature"),
            headache: lower.contains("headache"),
            cough: lower.contains("cough"),
            sore_throat: lower.contains("sore throat") || lower.contains("throat pain"),
            fatigue: lower.contains("fatigue") || lower.contains("tired"),
        }
    }
}

/// Produce the offline analysis for `patient_data`.
pub fn mock_analysis(patient_data: &str) -> AnalysisResult {
    let signals = Signals::scan(patient_data);
    let mut diagnoses = Vec::new();

    if signals.fever && (signals.cough || signals.sore_throat) {
        diagnoses.push(upper_respiratory_infection());
    }
    if signals.headache && signals.fatigue {
        diagnoses.push(tension_headache());
    }
    if diagnoses.is_empty() {
        diagnoses.push(nonspecific_symptoms());
    }

    AnalysisResult {
        diagnoses,
        warnings: vec![MOCK_WARNING.to_string(), CREDENTIAL_WARNING.to_string()],
        disclaimer: MOCK_DISCLAIMER.to_string(),
        error: None,
    }
}

fn upper_respiratory_infection() -> Diagnosis {
    Diagnosis {
        condition: "Common Cold or Upper Respiratory Infection".to_string(),
        likelihood: Likelihood::High,
        reasoning: "Patient reports symptoms consistent with viral upper respiratory infection including fever and respiratory symptoms.".to_string(),
        medications: vec![
            medication(
                "Acetaminophen (Tylenol)",
                "500-1000 mg",
                "Every 6 hours as needed",
                "Until symptoms resolve",
                "For fever and pain relief. Do not exceed 4000 mg per day.",
            ),
            medication(
                "Guaifenesin (Mucinex)",
                "400 mg",
                "Every 12 hours as needed",
                "Until symptoms resolve",
                "To help thin mucus secretions. Drink plenty of fluids.",
            ),
        ],
        additional_tests: vec![
            "If symptoms worsen or persist beyond 7 days, consider COVID-19 testing".to_string(),
        ],
    }
}

fn tension_headache() -> Diagnosis {
    Diagnosis {
        condition: "Tension Headache".to_string(),
        likelihood: Likelihood::Medium,
        reasoning: "Patient reports headache with fatigue, consistent with tension headache possibly due to stress or dehydration.".to_string(),
        medications: vec![medication(
            "Ibuprofen (Advil, Motrin)",
            "400-600 mg",
            "Every 6-8 hours as needed",
            "Until symptoms resolve",
            "Take with food to minimize gastrointestinal side effects.",
        )],
        additional_tests: vec![
            "If headaches are recurrent or worsening, consider neurological evaluation".to_string(),
        ],
    }
}

fn nonspecific_symptoms() -> Diagnosis {
    Diagnosis {
        condition: "Nonspecific Symptoms".to_string(),
        likelihood: Likelihood::Medium,
        reasoning: "Based on the limited information provided, a specific diagnosis cannot be determined with certainty.".to_string(),
        medications: vec![medication(
            "Supportive care",
            "N/A",
            "As needed",
            "Until symptoms resolve",
            "Rest, hydration, and monitoring of symptoms",
        )],
        additional_tests: vec![
            "Complete blood count (CBC)".to_string(),
            "Basic metabolic panel (BMP)".to_string(),
            "Follow up with primary care physician for further evaluation".to_string(),
        ],
    }
}

fn medication(name: &str, dosage: &str, frequency: &str, duration: &str, notes: &str) -> Medication {
    Medication {
        name: name.to_string(),
        dosage: dosage.to_string(),
        frequency: frequency.to_string(),
        duration: duration.to_string(),
        notes: notes.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fever_with_cough_suggests_respiratory_infection() {
        let result = mock_analysis("Patient reports fever and a persistent cough.");
        assert_eq!(result.diagnoses.len(), 1);
        assert_eq!(
            result.diagnoses[0].condition,
            "Common Cold or Upper Respiratory Infection"
        );
        assert_eq!(result.diagnoses[0].likelihood, Likelihood::High);
        assert_eq!(result.diagnoses[0].medications.len(), 2);
        assert!(result.error.is_none());
    }

    #[test]
    fn headache_with_fatigue_suggests_tension_headache() {
        let result = mock_analysis("Severe headache and fatigue for two days, no fever.");
        // "no fever" still sets the fever signal, but the respiratory rule
        // also needs cough or sore throat.
        assert_eq!(result.diagnoses.len(), 1);
        assert_eq!(result.diagnoses[0].condition, "Tension Headache");
        assert_eq!(result.diagnoses[0].likelihood, Likelihood::Medium);
    }

    #[test]
    fn both_rules_can_fire_together() {
        let result = mock_analysis("fever, cough, headache and constant fatigue");
        let conditions: Vec<&str> = result
            .diagnoses
            .iter()
            .map(|d| d.condition.as_str())
            .collect();
        assert_eq!(
            conditions,
            vec!["Common Cold or Upper Respiratory Infection", "Tension Headache"]
        );
    }

    #[test]
    fn unmatched_text_falls_back_to_nonspecific() {
        let result = mock_analysis("patient feels fine");
        assert_eq!(result.diagnoses.len(), 1);
        assert_eq!(result.diagnoses[0].condition, "Nonspecific Symptoms");
        assert_eq!(result.diagnoses[0].additional_tests.len(), 3);
    }

    #[test]
    fn synonyms_trigger_the_same_signals() {
        let by_synonym = mock_analysis("elevated temperature and throat pain, feels tired");
        let conditions: Vec<&str> = by_synonym
            .diagnoses
            .iter()
            .map(|d| d.condition.as_str())
            .collect();
        assert_eq!(conditions, vec!["Common Cold or Upper Respiratory Infection"]);
    }

    #[test]
    fn matching_is_case_insensitive() {
        let result = mock_analysis("FEVER and COUGH");
        assert_eq!(
            result.diagnoses[0].condition,
            "Common Cold or Upper Respiratory Infection"
        );
    }

    #[test]
    fn mock_results_carry_both_warnings_and_no_error() {
        let result = mock_analysis("anything");
        assert_eq!(result.warnings.len(), 2);
        assert!(result.warnings[0].contains("mock response"));
        assert!(result.warnings[1].contains("ANTHROPIC_API_KEY"));
        assert!(result.disclaimer.contains("API key was not provided or invalid"));
        assert!(result.error.is_none());
    }
}
