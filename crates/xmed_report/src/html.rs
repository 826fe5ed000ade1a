//! Fixed-layout HTML report document.

use std::path::Path;

use image::RgbImage;
use serde::{Deserialize, Serialize};

use crate::encoding::png_data_uri;
use crate::error::{ReportError, Result};

/// Report presentation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Document title.
    pub title: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            title: "ExplainMed Diagnostic Report".into(),
        }
    }
}

/// All inputs of one diagnostic report.
///
/// The document represents all four images plus the narrative; the
/// narrative is included in full, never truncated.
#[derive(Debug)]
pub struct DiagnosticReport<'a> {
    /// Human-readable diagnostic label.
    pub label: &'a str,
    /// Probability of the predicted class.
    pub probability: f32,
    /// Narrative text.
    pub narrative: &'a str,
    /// The resized original section image.
    pub original: &'a RgbImage,
    /// Grad-CAM overlay.
    pub gradcam: &'a RgbImage,
    /// Local surrogate mask.
    pub surrogate: &'a RgbImage,
    /// Occlusion sensitivity grid.
    pub occlusion: &'a RgbImage,
}

impl DiagnosticReport<'_> {
    /// Render the complete document.
    ///
    /// All images are encoded before any output is assembled, so a
    /// failing encoder aborts the render with no partial document.
    pub fn render_html(&self, config: &ReportConfig) -> Result<String> {
        if self.label.is_empty() {
            return Err(ReportError::InvalidInput("empty label".into()));
        }
        if self.narrative.is_empty() {
            return Err(ReportError::InvalidInput("empty narrative".into()));
        }

        let original = png_data_uri(self.original, "original")?;
        let gradcam = png_data_uri(self.gradcam, "gradcam")?;
        let surrogate = png_data_uri(self.surrogate, "surrogate")?;
        let occlusion = png_data_uri(self.occlusion, "occlusion")?;

        let mut doc = String::new();
        doc.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
        doc.push_str(&format!("<title>{}</title>\n", escape(&config.title)));
        doc.push_str(
            "<style>\n\
             body { font-family: sans-serif; max-width: 960px; margin: 2em auto; }\n\
             h1 { border-bottom: 1px solid #ccc; padding-bottom: 0.3em; }\n\
             .diagnosis { font-size: 1.2em; }\n\
             .grid { display: grid; grid-template-columns: 1fr 1fr; gap: 1em; }\n\
             figure { margin: 0; }\n\
             figure img { width: 100%; image-rendering: pixelated; }\n\
             figcaption { text-align: center; color: #555; }\n\
             </style>\n</head>\n<body>\n",
        );
        doc.push_str(&format!("<h1>{}</h1>\n", escape(&config.title)));
        doc.push_str(&format!(
            "<p class=\"diagnosis\">Diagnosis: <strong>{}</strong> ({:.2}%)</p>\n",
            escape(self.label),
            self.probability * 100.0
        ));
        doc.push_str(&format!("<p>{}</p>\n", escape(self.narrative)));

        doc.push_str("<div class=\"grid\">\n");
        for (uri, caption) in [
            (&original, "Original Section"),
            (&gradcam, "Grad-CAM"),
            (&surrogate, "Local Surrogate"),
            (&occlusion, "Occlusion Sensitivity"),
        ] {
            doc.push_str(&format!(
                "<figure><img src=\"{uri}\" alt=\"{caption}\"><figcaption>{caption}</figcaption></figure>\n"
            ));
        }
        doc.push_str("</div>\n</body>\n</html>\n");

        Ok(doc)
    }

    /// Render and write the document to a file.
    pub fn write_html(&self, path: impl AsRef<Path>, config: &ReportConfig) -> Result<()> {
        let html = self.render_html(config)?;
        std::fs::write(path, html)?;
        Ok(())
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn report_images() -> [RgbImage; 4] {
        [
            RgbImage::from_pixel(8, 8, Rgb([200, 180, 190])),
            RgbImage::from_pixel(8, 8, Rgb([255, 0, 0])),
            RgbImage::from_pixel(8, 8, Rgb([0, 255, 0])),
            RgbImage::from_pixel(3, 3, Rgb([0, 0, 255])),
        ]
    }

    #[test]
    fn test_render_contains_all_inputs() {
        let [original, gradcam, surrogate, occlusion] = report_images();
        let report = DiagnosticReport {
            label: "Lung Adenocarcinoma",
            probability: 0.91,
            narrative: "The model classifies this section as Lung Adenocarcinoma.",
            original: &original,
            gradcam: &gradcam,
            surrogate: &surrogate,
            occlusion: &occlusion,
        };

        let html = report.render_html(&ReportConfig::default()).unwrap();
        assert!(html.contains("Lung Adenocarcinoma"));
        assert!(html.contains("91.00%"));
        assert_eq!(html.matches("data:image/png;base64,").count(), 4);
        assert!(html.contains("ExplainMed Diagnostic Report"));
        assert!(html.contains("classifies this section"));
    }

    #[test]
    fn test_render_rejects_empty_narrative() {
        let [original, gradcam, surrogate, occlusion] = report_images();
        let report = DiagnosticReport {
            label: "Lung Benign Tissue",
            probability: 0.5,
            narrative: "",
            original: &original,
            gradcam: &gradcam,
            surrogate: &surrogate,
            occlusion: &occlusion,
        };

        assert!(matches!(
            report.render_html(&ReportConfig::default()),
            Err(ReportError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_render_escapes_markup_in_narrative() {
        let [original, gradcam, surrogate, occlusion] = report_images();
        let report = DiagnosticReport {
            label: "Colon Benign Tissue",
            probability: 0.7,
            narrative: "no <script> here",
            original: &original,
            gradcam: &gradcam,
            surrogate: &surrogate,
            occlusion: &occlusion,
        };

        let html = report.render_html(&ReportConfig::default()).unwrap();
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_write_html_creates_file() {
        let [original, gradcam, surrogate, occlusion] = report_images();
        let report = DiagnosticReport {
            label: "Colon Adenocarcinoma",
            probability: 0.88,
            narrative: "Narrative text.",
            original: &original,
            gradcam: &gradcam,
            surrogate: &surrogate,
            occlusion: &occlusion,
        };

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.html");
        report.write_html(&path, &ReportConfig::default()).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("Colon Adenocarcinoma"));
    }
}
