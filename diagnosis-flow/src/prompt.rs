//! Prompt templates for the diagnosis completion call.
//!
//! The templates are fixed: the uploaded document's text is the only part
//! that varies between requests. Keeping them in one place means the
//! rendered prompt can be versioned and asserted on in tests.

use crate::models::CompletionRequest;

/// Bump when either template below changes. The rendered prompt is part of
/// the observable contract with the completion endpoint.
pub const PROMPT_VERSION: &str = "1";

/// Role preamble sent as the system message.
pub const SYSTEM_INSTRUCTIONS: &str =
    "You are a medical diagnostic assistant that produces structured analysis in JSON format.";

/// User message template. `{patient_data}` is replaced with the extracted
/// document text; no other substitution is performed.
const USER_PROMPT_TEMPLATE: &str = r#"Based on the following patient data, please identify potential diagnoses and recommend appropriate medications.
Include reasoning for each diagnosis and medication.

PATIENT DATA:
{patient_data}

INSTRUCTIONS:
1. Analyze the patient's symptoms, history, and any test results
2. List potential diagnoses in order of likelihood
3. For each diagnosis, provide recommended medications
4. Include any warnings, contraindications, or further tests needed

YOUR RESPONSE MUST BE VALID JSON WITH THIS EXACT STRUCTURE:
{
    "diagnoses": [
        {
            "condition": "Name of condition",
            "likelihood": "High/Medium/Low",
            "reasoning": "Reasoning based on patient data",
            "medications": [
                {
                    "name": "Medication name",
                    "dosage": "Recommended dosage",
                    "frequency": "How often to take",
                    "duration": "How long to take",
                    "notes": "Any special instructions"
                }
            ],
            "additional_tests": ["Test 1", "Test 2"]
        }
    ],
    "warnings": ["Warning 1", "Warning 2"],
    "disclaimer": "This analysis is not a substitute for professional medical advice."
}"#;

/// Render the fixed template around the extracted patient text.
pub fn build(patient_data: &str) -> CompletionRequest {
    CompletionRequest {
        system_instructions: SYSTEM_INSTRUCTIONS.to_string(),
        user_prompt: USER_PROMPT_TEMPLATE.replace("{patient_data}", patient_data),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rendering_is_deterministic() {
        let a = build("fever and cough for two days");
        let b = build("fever and cough for two days");
        assert_eq!(a, b);
    }

    #[test]
    fn patient_data_lands_between_header_and_instructions() {
        let request = build("Patient reports chest pain.");
        let prompt = &request.user_prompt;

        let data_at = prompt.find("PATIENT DATA:").unwrap();
        let text_at = prompt.find("Patient reports chest pain.").unwrap();
        let instructions_at = prompt.find("INSTRUCTIONS:").unwrap();
        assert!(data_at < text_at && text_at < instructions_at);
    }

    #[test]
    fn template_demands_the_exact_response_shape() {
        let request = build("x");
        assert!(request.user_prompt.contains("YOUR RESPONSE MUST BE VALID JSON WITH THIS EXACT STRUCTURE:"));
        assert!(request.user_prompt.contains("\"additional_tests\""));
        assert!(request.user_prompt.contains("\"likelihood\": \"High/Medium/Low\""));
        assert_eq!(
            request.system_instructions,
            "You are a medical diagnostic assistant that produces structured analysis in JSON format."
        );
    }

    #[test]
    fn placeholder_never_survives_rendering() {
        let request = build("");
        assert!(!request.user_prompt.contains("{patient_data}"));
    }
}
