//! The diagnostic session: explicit application state and the
//! single-request pipeline.

use burn_autodiff::Autodiff;
use burn_ndarray::NdArray;
use image::RgbImage;
use thiserror::Error;
use tracing::{info, warn};

use xmed_core::{tensor_to_vec, ClassLabels, DeviceConfig, Prediction, TissueClassifier};
use xmed_explain::{
    grad_cam, occlusion_scan, surrogate_mask, ExplainError, ExplanationArtifact, OcclusionConfig,
    SurrogateConfig,
};
use xmed_imaging::ImageTransform;
use xmed_narrate::{fallback_narrative, ExplanationSummaries, NarrativeGenerator};
use xmed_report::{DiagnosticReport, ReportConfig};

/// The backend the session runs on: autodiff over ndarray, so the same
/// model serves plain inference and gradient-based explanation.
pub type DefaultBackend = Autodiff<NdArray>;

/// Result type alias using [`SessionError`].
pub type Result<T> = std::result::Result<T, SessionError>;

/// Errors surfaced by the diagnostic session.
#[derive(Error, Debug)]
pub enum SessionError {
    /// The classifier and the label mapping disagree on class count.
    #[error("Classifier has {model} outputs but label mapping has {labels} entries")]
    LabelMismatch {
        /// Number of classifier outputs.
        model: usize,
        /// Number of label entries.
        labels: usize,
    },

    /// Upload rejected before the pipeline ran.
    #[error(transparent)]
    Imaging(#[from] xmed_imaging::ImagingError),

    /// Prediction or invariant failure.
    #[error(transparent)]
    Core(#[from] xmed_core::CoreError),

    /// Explanation generation failure.
    #[error(transparent)]
    Explain(#[from] ExplainError),

    /// Report rendering or writing failure.
    #[error(transparent)]
    Report(#[from] xmed_report::ReportError),
}

/// Session configuration: transform, explainer parameters, device and
/// report settings, injected explicitly instead of living in globals.
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    /// Compute device.
    pub device: DeviceConfig,
    /// Resize + normalization transform.
    pub transform: ImageTransform,
    /// Local surrogate parameters.
    pub surrogate: SurrogateConfig,
    /// Occlusion scanner parameters.
    pub occlusion: OcclusionConfig,
    /// Report presentation settings.
    pub report: ReportConfig,
}

/// Where the narrative text came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NarrativeSource {
    /// The external text-generation service answered.
    Generated,
    /// The service failed; the deterministic fallback was used.
    Fallback {
        /// Why the service call failed.
        reason: String,
    },
}

/// Everything one diagnostic request produced.
#[derive(Debug)]
pub struct Diagnosis {
    /// The validated prediction.
    pub prediction: Prediction,
    /// Internal key of the predicted class.
    pub label_key: String,
    /// Human-readable diagnostic name of the predicted class.
    pub label: String,
    /// The resized section image the explanations refer to.
    pub section: RgbImage,
    /// Grad-CAM artifact.
    pub gradcam: ExplanationArtifact,
    /// Local surrogate artifact.
    pub surrogate: ExplanationArtifact,
    /// Occlusion sensitivity artifact.
    pub occlusion: ExplanationArtifact,
    /// Narrative text.
    pub narrative: String,
    /// Whether the narrative was generated or fell back to the template.
    pub narrative_source: NarrativeSource,
}

/// Explicit application state for diagnostic requests.
///
/// Holds the classifier, label mapping and configuration; immutable
/// after construction. The classifier weights are read-only, so one
/// session can serve any number of sequential requests — each request's
/// tensors, heatmaps and narrative are scoped to the [`diagnose`] call.
///
/// [`diagnose`]: DiagnosticSession::diagnose
pub struct DiagnosticSession<M: TissueClassifier<DefaultBackend>> {
    model: M,
    labels: ClassLabels,
    config: SessionConfig,
}

impl<M: TissueClassifier<DefaultBackend>> DiagnosticSession<M> {
    /// Create a session, checking the classifier against the label
    /// mapping.
    pub fn new(model: M, labels: ClassLabels, config: SessionConfig) -> Result<Self> {
        if model.n_classes() != labels.len() {
            return Err(SessionError::LabelMismatch {
                model: model.n_classes(),
                labels: labels.len(),
            });
        }
        Ok(Self {
            model,
            labels,
            config,
        })
    }

    /// The label mapping this session displays.
    #[must_use]
    pub fn labels(&self) -> &ClassLabels {
        &self.labels
    }

    /// The session configuration.
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Decode an uploaded byte buffer and run the pipeline.
    ///
    /// Malformed uploads are rejected here, before any model work.
    pub fn diagnose_bytes(
        &self,
        bytes: &[u8],
        narrator: &dyn NarrativeGenerator,
    ) -> Result<Diagnosis> {
        let image = xmed_imaging::decode_image(bytes)?;
        self.diagnose(&image, narrator)
    }

    /// Run the synchronous single-request pipeline on a validated image.
    ///
    /// Classification, then the three explainers — all handed the same
    /// immutable [`Prediction`] — then narrative generation. A failed
    /// narrative call falls back to the deterministic template and is
    /// recorded in [`Diagnosis::narrative_source`]; explanation
    /// failures abort the request.
    pub fn diagnose(
        &self,
        image: &RgbImage,
        narrator: &dyn NarrativeGenerator,
    ) -> Result<Diagnosis> {
        let device = self.config.device.ndarray_device();
        let section = self.config.transform.resize(image);
        let input = self
            .config
            .transform
            .to_tensor::<DefaultBackend>(&section, &device);

        // Classification
        let probs = tensor_to_vec(self.model.forward_probs(input.clone()))?;
        let prediction = Prediction::from_probs(probs)?;
        let class_index = prediction.class_index();

        let label_key = self
            .labels
            .key(class_index)
            .ok_or(xmed_core::CoreError::ClassOutOfRange {
                index: class_index,
                n_classes: self.labels.len(),
            })?
            .to_string();
        let label = self
            .labels
            .display_name(class_index)
            .unwrap_or(&label_key)
            .to_string();

        info!(
            label = %label,
            confidence = prediction.confidence(),
            "classified section"
        );

        // Explanations, all for the same prediction
        let gradcam = grad_cam(&self.model, input.clone(), &section, &prediction)?;

        let predict = |images: &[RgbImage]| -> xmed_explain::Result<Vec<Vec<f32>>> {
            let batch = self
                .config
                .transform
                .to_batch_tensor::<DefaultBackend>(images, &device);
            let probs = self.model.forward_probs(batch);
            let [_, n_classes] = probs.dims();
            let flat = tensor_to_vec(probs).map_err(ExplainError::from)?;
            Ok(flat.chunks(n_classes).map(<[f32]>::to_vec).collect())
        };
        let surrogate = surrogate_mask(predict, &section, &prediction, &self.config.surrogate)?;

        let occlusion = occlusion_scan(&self.model, input, &prediction, &self.config.occlusion)?
            .into_artifact(&prediction, self.config.occlusion.cell_scale)?;

        // Narrative, with the fallback decision made here
        let summaries = ExplanationSummaries {
            gradcam: gradcam.summary.clone(),
            surrogate: surrogate.summary.clone(),
            occlusion: occlusion.summary.clone(),
        };
        let (narrative, narrative_source) = match narrator.generate(&label, &summaries) {
            Ok(text) => (text, NarrativeSource::Generated),
            Err(e) => {
                warn!(error = %e, "narrative service failed, using fallback");
                (
                    fallback_narrative(&label, &summaries),
                    NarrativeSource::Fallback {
                        reason: e.to_string(),
                    },
                )
            }
        };

        Ok(Diagnosis {
            prediction,
            label_key,
            label,
            section,
            gradcam,
            surrogate,
            occlusion,
            narrative,
            narrative_source,
        })
    }

    /// Render the report document for a diagnosis.
    pub fn export_report(&self, diagnosis: &Diagnosis) -> Result<String> {
        let report = DiagnosticReport {
            label: &diagnosis.label,
            probability: diagnosis.prediction.confidence(),
            narrative: &diagnosis.narrative,
            original: &diagnosis.section,
            gradcam: &diagnosis.gradcam.image,
            surrogate: &diagnosis.surrogate.image,
            occlusion: &diagnosis.occlusion.image,
        };
        Ok(report.render_html(&self.config.report)?)
    }

    /// Render and write the report document to a file.
    pub fn write_report(
        &self,
        diagnosis: &Diagnosis,
        path: impl AsRef<std::path::Path>,
    ) -> Result<()> {
        let report = DiagnosticReport {
            label: &diagnosis.label,
            probability: diagnosis.prediction.confidence(),
            narrative: &diagnosis.narrative,
            original: &diagnosis.section,
            gradcam: &diagnosis.gradcam.image,
            surrogate: &diagnosis.surrogate.image,
            occlusion: &diagnosis.occlusion.image,
        };
        Ok(report.write_html(path, &self.config.report)?)
    }
}
