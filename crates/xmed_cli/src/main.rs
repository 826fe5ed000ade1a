//! ExplainMed-rs CLI: classify a tissue section, explain the prediction
//! and export a diagnostic report.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use xmed::prelude::*;
use xmed::session::{DiagnosticSession, NarrativeSource, SessionConfig};

#[derive(Parser)]
#[command(name = "xmed")]
#[command(author, version)]
#[command(about = "Explainable histopathology diagnostics - classify, explain, report")]
#[command(long_about = "ExplainMed-rs: classify a histopathology section with a ResNet-50 \
classifier, explain the prediction with Grad-CAM, a local surrogate model and occlusion \
sensitivity, and export a diagnostic report.

EXAMPLES:
  # Show the diagnostic class mapping
  xmed labels

  # Inspect a checkpoint directory
  xmed inspect --checkpoint ./models/resnet50

  # Diagnose a section image and write artifacts + report
  xmed diagnose --image section.png --checkpoint ./models/resnet50 --output ./out

  # Reproducible surrogate sampling, no narrative service
  xmed diagnose --image section.png --checkpoint ./models/resnet50 --output ./out \\
      --seed 42 --offline")]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a section image, explain it and export a report
    Diagnose {
        /// Path to the section image (JPEG/PNG)
        #[arg(long, value_name = "FILE")]
        image: PathBuf,

        /// Checkpoint directory holding classifier weights + metadata
        #[arg(long, value_name = "DIR")]
        checkpoint: PathBuf,

        /// Output directory for explanation images and the report
        #[arg(long, default_value = "./out", value_name = "DIR")]
        output: PathBuf,

        /// Seed for the surrogate explainer's perturbation sampling
        #[arg(long, value_name = "SEED")]
        seed: Option<u64>,

        /// Number of perturbed variants scored by the surrogate explainer
        #[arg(long, default_value = "1000", value_name = "N")]
        samples: usize,

        /// Number of top segments the surrogate explainer highlights
        #[arg(long, default_value = "5", value_name = "N")]
        top_segments: usize,

        /// Occlusion tile edge length in pixels
        #[arg(long, default_value = "20", value_name = "PX")]
        tile: usize,

        /// Occlusion stride in pixels
        #[arg(long, default_value = "20", value_name = "PX")]
        stride: usize,

        /// Rendered pixels per occlusion grid cell
        #[arg(long, default_value = "1", value_name = "N")]
        cell_scale: u32,

        /// Ollama-compatible endpoint for narrative generation
        #[arg(long, default_value = "http://localhost:11434", value_name = "URL")]
        ollama_url: String,

        /// Model name on the narrative endpoint
        #[arg(long, default_value = "deepseek-r1:8b", value_name = "MODEL")]
        ollama_model: String,

        /// Narrative request timeout in seconds
        #[arg(long, default_value = "30", value_name = "SECS")]
        timeout: u64,

        /// Skip the narrative service and use the deterministic template
        #[arg(long, default_value = "false")]
        offline: bool,
    },
    /// Print the diagnostic class mapping
    Labels,
    /// Show checkpoint metadata
    Inspect {
        /// Checkpoint directory
        #[arg(long, value_name = "DIR")]
        checkpoint: PathBuf,
    },
    /// Write a randomly initialized checkpoint (untrained; for smoke tests)
    Init {
        /// Output checkpoint directory
        #[arg(long, value_name = "DIR")]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = match cli.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::filter::LevelFilter::from_level(log_level))
        .init();

    match cli.command {
        Commands::Diagnose {
            image,
            checkpoint,
            output,
            seed,
            samples,
            top_segments,
            tile,
            stride,
            cell_scale,
            ollama_url,
            ollama_model,
            timeout,
            offline,
        } => handle_diagnose(DiagnoseArgs {
            image,
            checkpoint,
            output,
            seed,
            samples,
            top_segments,
            tile,
            stride,
            cell_scale,
            ollama_url,
            ollama_model,
            timeout,
            offline,
        }),
        Commands::Labels => handle_labels(),
        Commands::Inspect { checkpoint } => handle_inspect(checkpoint),
        Commands::Init { output } => handle_init(output),
    }
}

struct DiagnoseArgs {
    image: PathBuf,
    checkpoint: PathBuf,
    output: PathBuf,
    seed: Option<u64>,
    samples: usize,
    top_segments: usize,
    tile: usize,
    stride: usize,
    cell_scale: u32,
    ollama_url: String,
    ollama_model: String,
    timeout: u64,
    offline: bool,
}

/// Narrator that refuses every request, forcing the deterministic
/// fallback template.
struct OfflineNarrator;

impl NarrativeGenerator for OfflineNarrator {
    fn generate(
        &self,
        _label: &str,
        _summaries: &ExplanationSummaries,
    ) -> xmed::narrate::Result<String> {
        Err(xmed::narrate::NarrateError::Request(
            "narrative service disabled (--offline)".into(),
        ))
    }
}

fn handle_diagnose(args: DiagnoseArgs) -> Result<()> {
    println!("=== ExplainMed Diagnosis ===\n");

    let labels = ClassLabels::default();
    let device_config = DeviceConfig::Cpu;
    let device = device_config.ndarray_device();

    // Load the classifier
    println!("Loading classifier from {:?}", args.checkpoint);
    let (model, metadata) = load_classifier::<DefaultBackend>(&args.checkpoint, &labels, &device)
        .context("Failed to load classifier checkpoint")?;
    println!("  Architecture: {}", metadata.arch);
    println!("  Classes: {}", metadata.class_keys.len());
    println!();

    // Validate the upload before any model work
    let image = load_image(&args.image)
        .with_context(|| format!("Rejected input image {:?}", args.image))?;
    println!("Input: {:?} ({}x{})", args.image, image.width(), image.height());

    let config = SessionConfig {
        device: device_config,
        surrogate: SurrogateConfig {
            num_samples: args.samples,
            top_segments: args.top_segments,
            seed: args.seed.map(Seed::new),
            ..Default::default()
        },
        occlusion: OcclusionConfig::default()
            .with_tile(args.tile, args.stride)
            .with_cell_scale(args.cell_scale),
        ..Default::default()
    };

    let session =
        DiagnosticSession::new(model, labels, config).context("Failed to create session")?;

    let diagnosis = if args.offline {
        session.diagnose(&image, &OfflineNarrator)
    } else {
        let narrator = OllamaClient::new(args.ollama_url)
            .with_model(args.ollama_model)
            .with_timeout(Duration::from_secs(args.timeout));
        session.diagnose(&image, &narrator)
    }
    .context("Diagnosis failed")?;

    println!();
    println!(
        "Diagnosis: {} ({:.2}%)",
        diagnosis.label,
        diagnosis.prediction.confidence() * 100.0
    );
    println!();
    println!("Explanations:");
    for artifact in [&diagnosis.gradcam, &diagnosis.surrogate, &diagnosis.occlusion] {
        println!("  {}: {}", artifact.method.display_name(), artifact.summary);
    }
    println!();
    match &diagnosis.narrative_source {
        NarrativeSource::Generated => println!("Narrative (generated):"),
        NarrativeSource::Fallback { reason } => {
            println!("Narrative (template fallback; service: {reason}):")
        }
    }
    println!("  {}", diagnosis.narrative);

    // Write artifacts and report
    std::fs::create_dir_all(&args.output)
        .with_context(|| format!("Failed to create output directory {:?}", args.output))?;

    for (name, img) in [
        ("original.png", &diagnosis.section),
        ("gradcam.png", &diagnosis.gradcam.image),
        ("surrogate.png", &diagnosis.surrogate.image),
        ("occlusion.png", &diagnosis.occlusion.image),
    ] {
        let path = args.output.join(name);
        img.save(&path)
            .with_context(|| format!("Failed to write {path:?}"))?;
    }

    let report_path = args.output.join("report.html");
    session
        .write_report(&diagnosis, &report_path)
        .context("Failed to export report")?;

    println!();
    println!("Wrote explanation images and report to {:?}", args.output);
    println!("\n=== Diagnosis complete ===");
    Ok(())
}

fn handle_labels() -> Result<()> {
    let labels = ClassLabels::default();

    println!("Diagnostic classes:\n");
    println!("  idx  key        name");
    println!("  ───────────────────────────────────────────");
    for (i, (key, name)) in labels.iter().enumerate() {
        println!("  {i:>3}  {key:<10} {name}");
    }
    Ok(())
}

fn handle_inspect(checkpoint: PathBuf) -> Result<()> {
    let labels = ClassLabels::default();
    let device = DeviceConfig::Cpu.ndarray_device();

    println!("Checkpoint: {checkpoint:?}\n");
    let (_, metadata) = load_classifier::<DefaultBackend>(&checkpoint, &labels, &device)
        .context("Failed to load checkpoint")?;

    println!("  Architecture:  {}", metadata.arch);
    println!("  Base filters:  {}", metadata.config.base_filters);
    println!("  Stage layout:  {:?}", metadata.config.layers);
    println!("  Expansion:     {}", metadata.config.expansion);
    println!("  Classes:       {}", metadata.config.n_classes);
    println!("  Class keys:    {}", metadata.class_keys.join(", "));
    Ok(())
}

fn handle_init(output: PathBuf) -> Result<()> {
    use xmed::models::ClassifierMetadata;

    println!("Initializing untrained ResNet-50 checkpoint at {output:?}");
    println!("WARNING: random weights; predictions are meaningless until trained.\n");

    let labels = ClassLabels::default();
    let device = DeviceConfig::Cpu.ndarray_device();
    let config = HistoResNetConfig::resnet50(labels.len());
    let model: HistoResNet<DefaultBackend> = config.init(&device);
    let metadata = ClassifierMetadata::new(config, &labels);

    save_classifier(&model, &metadata, &output).context("Failed to save checkpoint")?;

    println!("Checkpoint written. Inspect it with:");
    println!("  xmed inspect --checkpoint {}", output.display());
    Ok(())
}
