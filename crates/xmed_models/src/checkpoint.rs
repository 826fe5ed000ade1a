//! Classifier checkpointing: weights via Burn's record system plus a
//! JSON metadata sidecar.
//!
//! A checkpoint directory holds two files:
//!
//! - `classifier.mpk`: named-MessagePack weight record
//! - `classifier.json`: [`ClassifierMetadata`] (architecture config and
//!   the class keys the weights were trained against)

use std::path::Path;

use burn::module::Module;
use burn::prelude::*;
use burn::record::{FullPrecisionSettings, NamedMpkFileRecorder, Recorder};
use xmed_core::ClassLabels;

use crate::resnet::{HistoResNet, HistoResNetConfig};

/// File name of the weight record inside a checkpoint directory.
pub const WEIGHTS_FILE: &str = "classifier.mpk";

/// File name of the metadata sidecar inside a checkpoint directory.
const METADATA_FILE: &str = "classifier.json";

/// Result type for checkpoint operations.
pub type Result<T> = std::result::Result<T, CheckpointError>;

/// Checkpoint-related errors.
#[derive(Debug, thiserror::Error)]
pub enum CheckpointError {
    /// Error saving a checkpoint.
    #[error("Failed to save checkpoint: {0}")]
    Save(String),

    /// Error loading a checkpoint.
    #[error("Failed to load checkpoint: {0}")]
    Load(String),

    /// Checkpoint does not match the expected classifier shape.
    #[error("Checkpoint mismatch: {0}")]
    Mismatch(String),
}

/// Metadata describing the weights in a checkpoint directory.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ClassifierMetadata {
    /// Architecture name.
    pub arch: String,
    /// Model configuration.
    pub config: HistoResNetConfig,
    /// Class keys, in output-index order.
    pub class_keys: Vec<String>,
}

impl ClassifierMetadata {
    /// Create metadata for a config and label mapping.
    #[must_use]
    pub fn new(config: HistoResNetConfig, labels: &ClassLabels) -> Self {
        Self {
            arch: "HistoResNet".into(),
            config,
            class_keys: labels.keys().iter().map(|k| (*k).to_string()).collect(),
        }
    }

    /// Check the checkpoint against a label mapping.
    ///
    /// The class count baked into the weights and the keys they were
    /// trained against must both agree with the mapping the session will
    /// display — a silent mismatch would attach wrong diagnostic names
    /// to the classifier's outputs.
    pub fn validate_against(&self, labels: &ClassLabels) -> Result<()> {
        if self.config.n_classes != labels.len() {
            return Err(CheckpointError::Mismatch(format!(
                "checkpoint has {} classes, label mapping has {}",
                self.config.n_classes,
                labels.len()
            )));
        }
        for (i, key) in self.class_keys.iter().enumerate() {
            if labels.key(i) != Some(key.as_str()) {
                return Err(CheckpointError::Mismatch(format!(
                    "class {} is '{}' in checkpoint but '{}' in label mapping",
                    i,
                    key,
                    labels.key(i).unwrap_or("<missing>")
                )));
            }
        }
        Ok(())
    }
}

/// Save a classifier and its metadata to a checkpoint directory.
pub fn save_classifier<B: Backend>(
    model: &HistoResNet<B>,
    metadata: &ClassifierMetadata,
    dir: impl AsRef<Path>,
) -> Result<()> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir).map_err(|e| CheckpointError::Save(e.to_string()))?;

    let recorder = NamedMpkFileRecorder::<FullPrecisionSettings>::new();
    recorder
        .record(model.clone().into_record(), dir.join(WEIGHTS_FILE))
        .map_err(|e| CheckpointError::Save(e.to_string()))?;

    let json = serde_json::to_string_pretty(metadata)
        .map_err(|e| CheckpointError::Save(e.to_string()))?;
    std::fs::write(dir.join(METADATA_FILE), json)
        .map_err(|e| CheckpointError::Save(e.to_string()))?;

    Ok(())
}

/// Load a classifier from a checkpoint directory, validating it against
/// the label mapping it will be displayed with.
pub fn load_classifier<B: Backend>(
    dir: impl AsRef<Path>,
    labels: &ClassLabels,
    device: &B::Device,
) -> Result<(HistoResNet<B>, ClassifierMetadata)> {
    let dir = dir.as_ref();

    let json = std::fs::read_to_string(dir.join(METADATA_FILE))
        .map_err(|e| CheckpointError::Load(format!("{}: {e}", dir.display())))?;
    let metadata: ClassifierMetadata =
        serde_json::from_str(&json).map_err(|e| CheckpointError::Load(e.to_string()))?;

    metadata.validate_against(labels)?;

    let recorder = NamedMpkFileRecorder::<FullPrecisionSettings>::new();
    let record = recorder
        .load(dir.join(WEIGHTS_FILE), device)
        .map_err(|e| CheckpointError::Load(e.to_string()))?;

    let model = metadata.config.init::<B>(device).load_record(record);
    Ok((model, metadata))
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;
    use xmed_core::TissueClassifier;

    fn tiny_config() -> HistoResNetConfig {
        HistoResNetConfig::resnet50(5)
            .with_base_filters(8)
            .with_layers(vec![1, 1, 1, 1])
    }

    #[test]
    fn test_metadata_validation_accepts_matching_labels() {
        let labels = ClassLabels::default();
        let meta = ClassifierMetadata::new(tiny_config(), &labels);
        assert!(meta.validate_against(&labels).is_ok());
    }

    #[test]
    fn test_metadata_validation_rejects_class_count_mismatch() {
        let labels = ClassLabels::default();
        let meta = ClassifierMetadata::new(HistoResNetConfig::resnet50(3), &labels);
        // Metadata records 3 classes, mapping has 5
        assert!(matches!(
            meta.validate_against(&labels),
            Err(CheckpointError::Mismatch(_))
        ));
    }

    #[test]
    fn test_metadata_validation_rejects_key_mismatch() {
        let labels = ClassLabels::default();
        let other =
            ClassLabels::from_pairs(vec![("a", "A"), ("b", "B"), ("c", "C"), ("d", "D"), ("e", "E")])
                .unwrap();
        let meta = ClassifierMetadata::new(tiny_config(), &other);
        assert!(meta.validate_against(&labels).is_err());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let device = Default::default();
        let labels = ClassLabels::default();
        let config = tiny_config();
        let model: HistoResNet<NdArray> = config.init(&device);
        let meta = ClassifierMetadata::new(config, &labels);

        let dir = tempfile::tempdir().unwrap();
        save_classifier(&model, &meta, dir.path()).unwrap();

        let (loaded, loaded_meta) =
            load_classifier::<NdArray>(dir.path(), &labels, &device).unwrap();
        assert_eq!(loaded.n_classes(), 5);
        assert_eq!(loaded_meta.class_keys.len(), 5);
    }

    #[test]
    fn test_load_missing_directory_fails() {
        let device = Default::default();
        let labels = ClassLabels::default();
        let result = load_classifier::<NdArray>("/nonexistent/checkpoint", &labels, &device);
        assert!(matches!(result, Err(CheckpointError::Load(_))));
    }
}
