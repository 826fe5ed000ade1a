//! Prompt template for the text-generation service.

use serde::{Deserialize, Serialize};

/// The three explainers' one-line summaries, in a fixed order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplanationSummaries {
    /// Grad-CAM summary.
    pub gradcam: String,
    /// Local surrogate summary.
    pub surrogate: String,
    /// Occlusion sensitivity summary.
    pub occlusion: String,
}

/// Build the fixed prompt sent to the text-generation service.
///
/// # Arguments
///
/// * `label` - Human-readable diagnostic name.
/// * `summaries` - The three explainers' summaries.
#[must_use]
pub fn build_prompt(label: &str, summaries: &ExplanationSummaries) -> String {
    format!(
        "Write a short explanation of this diagnosis for a clinician.\n\
         \n\
         Diagnosis: {label}\n\
         Grad-CAM key regions: {gradcam}\n\
         Local surrogate focus: {surrogate}\n\
         Occlusion sensitivity: {occlusion}\n\
         \n\
         Answer in 4-5 sentences, as a physician would explain it to a \
         colleague. Give only the answer, without any reasoning steps.",
        label = label,
        gradcam = summaries.gradcam,
        surrogate = summaries.surrogate,
        occlusion = summaries.occlusion,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summaries() -> ExplanationSummaries {
        ExplanationSummaries {
            gradcam: "central activation".into(),
            surrogate: "five supporting regions".into(),
            occlusion: "upper-left sensitivity".into(),
        }
    }

    #[test]
    fn test_prompt_contains_all_inputs() {
        let prompt = build_prompt("Lung Adenocarcinoma", &summaries());
        assert!(prompt.contains("Lung Adenocarcinoma"));
        assert!(prompt.contains("central activation"));
        assert!(prompt.contains("five supporting regions"));
        assert!(prompt.contains("upper-left sensitivity"));
    }

    #[test]
    fn test_prompt_is_deterministic() {
        let a = build_prompt("X", &summaries());
        let b = build_prompt("X", &summaries());
        assert_eq!(a, b);
    }
}
