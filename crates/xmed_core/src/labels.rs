//! Class label mapping between internal keys and diagnostic names.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Ordered mapping from class indices to (internal key, diagnostic name).
///
/// The classifier's output index `i` corresponds to the `i`-th entry.
/// Every display and report consults this mapping; raw class indices are
/// never shown to a clinician.
///
/// # Example
///
/// ```rust
/// use xmed_core::ClassLabels;
///
/// let labels = ClassLabels::default();
/// assert_eq!(labels.len(), 5);
/// assert_eq!(labels.display_name(2), Some("Lung Adenocarcinoma"));
/// assert_eq!(labels.key(2), Some("lung_aca"));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassLabels {
    entries: Vec<(String, String)>,
}

impl Default for ClassLabels {
    /// The lung/colon histopathology mapping this system ships with.
    fn default() -> Self {
        Self {
            entries: vec![
                ("colon_aca".into(), "Colon Adenocarcinoma".into()),
                ("colon_n".into(), "Colon Benign Tissue".into()),
                ("lung_aca".into(), "Lung Adenocarcinoma".into()),
                ("lung_n".into(), "Lung Benign Tissue".into()),
                ("lung_scc".into(), "Lung Squamous Cell Carcinoma".into()),
            ],
        }
    }
}

impl ClassLabels {
    /// Create a mapping from (key, display name) pairs.
    ///
    /// Fails on an empty list or duplicate keys.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Result<Self>
    where
        K: Into<String>,
        V: Into<String>,
    {
        let entries: Vec<(String, String)> = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();

        if entries.is_empty() {
            return Err(CoreError::InvalidLabels("empty label mapping".into()));
        }

        for (i, (key, _)) in entries.iter().enumerate() {
            if entries[..i].iter().any(|(k, _)| k == key) {
                return Err(CoreError::InvalidLabels(format!("duplicate key '{key}'")));
            }
        }

        Ok(Self { entries })
    }

    /// Number of classes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the mapping is empty. Never true for a validated mapping.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Internal key for a class index.
    #[must_use]
    pub fn key(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(|(k, _)| k.as_str())
    }

    /// Human-readable diagnostic name for a class index.
    #[must_use]
    pub fn display_name(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(|(_, v)| v.as_str())
    }

    /// Class index for an internal key.
    #[must_use]
    pub fn index_of(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k == key)
    }

    /// All internal keys, in class-index order.
    #[must_use]
    pub fn keys(&self) -> Vec<&str> {
        self.entries.iter().map(|(k, _)| k.as_str()).collect()
    }

    /// Iterate (key, display name) pairs in class-index order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_mapping_has_five_entries() {
        let labels = ClassLabels::default();
        assert_eq!(labels.len(), 5);
        assert_eq!(labels.key(0), Some("colon_aca"));
        assert_eq!(labels.display_name(0), Some("Colon Adenocarcinoma"));
        assert_eq!(labels.key(4), Some("lung_scc"));
        assert_eq!(
            labels.display_name(4),
            Some("Lung Squamous Cell Carcinoma")
        );
    }

    #[test]
    fn test_index_of_key() {
        let labels = ClassLabels::default();
        assert_eq!(labels.index_of("lung_aca"), Some(2));
        assert_eq!(labels.index_of("unknown"), None);
    }

    #[test]
    fn test_out_of_range_lookup() {
        let labels = ClassLabels::default();
        assert_eq!(labels.key(5), None);
        assert_eq!(labels.display_name(99), None);
    }

    #[test]
    fn test_from_pairs_rejects_empty() {
        let pairs: Vec<(&str, &str)> = vec![];
        assert!(ClassLabels::from_pairs(pairs).is_err());
    }

    #[test]
    fn test_from_pairs_rejects_duplicates() {
        let result = ClassLabels::from_pairs(vec![("a", "A"), ("a", "B")]);
        assert!(result.is_err());
    }
}
