//! End-to-end pipeline tests with a stubbed classifier and narrator.

use burn::prelude::*;
use image::{Rgb, RgbImage};

use xmed::prelude::*;
use xmed::session::SessionError;
use xmed_core::Seed;
use xmed_imaging::SlicConfig;
use xmed_narrate::{NarrateError, Result as NarrateResult};

/// Classifier stub returning fixed probabilities. The head shifts every
/// logit by the feature mean, which keeps the softmax output fixed while
/// leaving the features on the autodiff tape for Grad-CAM.
struct StubClassifier {
    probs: Vec<f32>,
}

impl<B: Backend> TissueClassifier<B> for StubClassifier {
    fn features(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        x
    }

    fn head(&self, features: Tensor<B, 4>) -> Tensor<B, 2> {
        let device = features.device();
        let n = self.probs.len();
        let batch = features.dims()[0];
        let logp: Vec<f32> = self.probs.iter().map(|p| p.max(1e-6).ln()).collect();
        let base = Tensor::<B, 1>::from_floats(logp.as_slice(), &device).reshape([1, n]);
        let shift = features
            .mean_dim(3)
            .mean_dim(2)
            .mean_dim(1)
            .reshape([batch, 1]);
        base + shift
    }

    fn n_classes(&self) -> usize {
        self.probs.len()
    }
}

/// Narrator stub that always fails, forcing the fallback path.
struct UnavailableNarrator;

impl NarrativeGenerator for UnavailableNarrator {
    fn generate(&self, _label: &str, _summaries: &ExplanationSummaries) -> NarrateResult<String> {
        Err(NarrateError::Request("service unavailable".into()))
    }
}

/// Narrator stub that echoes a fixed answer.
struct CannedNarrator;

impl NarrativeGenerator for CannedNarrator {
    fn generate(&self, label: &str, _summaries: &ExplanationSummaries) -> NarrateResult<String> {
        Ok(format!("Service narrative for {label}."))
    }
}

fn test_session() -> DiagnosticSession<StubClassifier> {
    // Class 2 ("lung_aca") at 0.91
    let model = StubClassifier {
        probs: vec![0.02, 0.03, 0.91, 0.02, 0.02],
    };

    let config = SessionConfig {
        transform: xmed_imaging::ImageTransform::new(32),
        surrogate: SurrogateConfig {
            num_samples: 32,
            seed: Some(Seed::new(7)),
            slic: SlicConfig {
                n_segments: 9,
                ..Default::default()
            },
            ..Default::default()
        },
        occlusion: OcclusionConfig::default().with_tile(8, 8),
        ..Default::default()
    };

    DiagnosticSession::new(model, ClassLabels::default(), config).unwrap()
}

fn test_image() -> RgbImage {
    RgbImage::from_fn(64, 64, |x, y| {
        Rgb([(x * 3) as u8, (y * 3) as u8, 120])
    })
}

#[test]
fn test_end_to_end_with_failing_narrator() {
    let session = test_session();
    let diagnosis = session
        .diagnose(&test_image(), &UnavailableNarrator)
        .expect("pipeline should succeed");

    // Prediction invariants
    assert_eq!(diagnosis.prediction.class_index(), 2);
    assert!((diagnosis.prediction.confidence() - 0.91).abs() < 1e-4);
    assert_eq!(diagnosis.prediction.n_classes(), 5);
    let sum: f32 = diagnosis.prediction.probs().iter().sum();
    assert!((sum - 1.0).abs() < 1e-4);

    // Label text comes from the mapping entry for the class key
    assert_eq!(diagnosis.label_key, "lung_aca");
    assert_eq!(diagnosis.label, "Lung Adenocarcinoma");

    // Three non-empty explanation artifacts, all for the same class
    for artifact in [&diagnosis.gradcam, &diagnosis.surrogate, &diagnosis.occlusion] {
        let (w, h) = artifact.dimensions();
        assert!(w > 0 && h > 0);
        assert_eq!(artifact.class_index, 2);
        assert!(!artifact.summary.is_empty());
    }

    // Grad-CAM and surrogate match the resized input; occlusion stays
    // at native grid resolution (positions 0..24 step 8 = 3 per axis)
    assert_eq!(diagnosis.gradcam.dimensions(), (32, 32));
    assert_eq!(diagnosis.surrogate.dimensions(), (32, 32));
    assert_eq!(diagnosis.occlusion.dimensions(), (3, 3));

    // Fallback narrative contains the label verbatim
    assert!(matches!(
        diagnosis.narrative_source,
        NarrativeSource::Fallback { .. }
    ));
    assert!(!diagnosis.narrative.is_empty());
    assert!(diagnosis.narrative.contains("Lung Adenocarcinoma"));
}

#[test]
fn test_end_to_end_report_export() {
    let session = test_session();
    let diagnosis = session
        .diagnose(&test_image(), &UnavailableNarrator)
        .unwrap();

    let html = session.export_report(&diagnosis).unwrap();
    assert!(html.contains("Lung Adenocarcinoma"));
    assert!(html.contains("91.00%"));
    assert_eq!(html.matches("data:image/png;base64,").count(), 4);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.html");
    session.write_report(&diagnosis, &path).unwrap();
    assert!(path.exists());
}

#[test]
fn test_narrative_service_success_is_used() {
    let session = test_session();
    let diagnosis = session.diagnose(&test_image(), &CannedNarrator).unwrap();

    assert_eq!(diagnosis.narrative_source, NarrativeSource::Generated);
    assert_eq!(
        diagnosis.narrative,
        "Service narrative for Lung Adenocarcinoma."
    );
}

#[test]
fn test_malformed_upload_is_rejected_before_pipeline() {
    let session = test_session();
    let result = session.diagnose_bytes(b"not an image at all", &UnavailableNarrator);
    assert!(matches!(result, Err(SessionError::Imaging(_))));
}

#[test]
fn test_session_rejects_label_mismatch() {
    let model = StubClassifier {
        probs: vec![0.5, 0.5],
    };
    let result = DiagnosticSession::new(model, ClassLabels::default(), SessionConfig::default());
    assert!(matches!(
        result,
        Err(SessionError::LabelMismatch { model: 2, labels: 5 })
    ));
}
