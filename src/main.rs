//! EcoLens - pollution assessment from environmental photos
//!
//! A CLI tool that scores water quality, air quality and visual
//! contamination indicators of an image and aggregates them into an
//! overall environmental score with an uncertainty-aware confidence.
//!
//! Exit codes:
//!   0 - Success (confidence at or above --min-confidence, or none set)
//!   1 - Bad arguments or runtime error (validation, download, decoding, config)
//!   2 - Overall confidence below --min-confidence

mod analysis;
mod cli;
mod config;
mod error;
mod imaging;
mod models;
mod report;
mod scoring;
mod validation;

use analysis::EnvironmentalAnalyzer;
use anyhow::{Context, Result};
use chrono::Utc;
use cli::{Args, OutputFormat};
use config::{Config, CONFIG_FILE_NAME};
use error::ImageError;
use imaging::{read_local_image, ImageFetcher, ImageProcessor};
use models::{
    AnalysisReport, AnalysisResultSet, AnalysisStatus, Category, HealthStatus, ImageDimensions,
    ImageSource, ProcessingMetadata,
};
use scoring::{ConfidenceScorer, ScoringProfile};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::level_filters::LevelFilter;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Informational modes exit early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }
    if args.health {
        return print_json(&HealthStatus::healthy());
    }
    if args.model_info {
        return print_json(&EnvironmentalAnalyzer::new().model_info());
    }

    // Load configuration before logging so the file can enable verbose output
    let (mut config, config_source) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    // Initialize logging
    init_logging(&args, &config);

    info!("EcoLens v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: {}", config_source);
    debug!("Arguments: {:?}", args);

    // Run the analysis
    match run_analysis(args, config).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Analysis failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .ecolens.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to customize weights, thresholds, image limits, and more.");
    Ok(())
}

/// Print a value as pretty JSON on stdout.
fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}

/// Initialize logging based on verbosity settings. `RUST_LOG` takes precedence.
fn init_logging(args: &Args, config: &Config) {
    let level = if !args.quiet && config.general.verbose {
        tracing::Level::DEBUG
    } else {
        args.log_level()
    };

    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .from_env_lossy();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Run the complete analysis workflow. Returns exit code (0 or 2).
async fn run_analysis(args: Args, config: Config) -> Result<i32> {
    let start_time = Instant::now();

    let request = args.to_request()?;
    let analyzer = EnvironmentalAnalyzer::new();

    // Step 1: Acquire the data and run the producers
    let (results, image_dimensions) = match request.source {
        ImageSource::Results(ref path) => {
            println!("📂 Loading stored results: {}", path.display());
            (load_results(path, &request.analysis_types)?, None)
        }
        ImageSource::Url(ref url) => {
            println!("📥 Downloading image: {}", url);
            let fetcher = ImageFetcher::new(&config.image, !args.quiet)?;
            let bytes = fetcher.download(url).await?;
            analyze_image(&analyzer, &config, bytes, &request.analysis_types).await?
        }
        ImageSource::Local(ref path) => {
            println!("📂 Reading image: {}", path.display());
            let bytes = read_local_image(path, config.image.max_file_size)?;
            analyze_image(&analyzer, &config, bytes, &request.analysis_types).await?
        }
    };

    // Step 2: Score the results
    println!("📐 Scoring {} categories...", results.len());

    let profile = ScoringProfile::from(&config.scoring);
    let scorer = ConfidenceScorer::new(&profile);
    debug!("Confidence scorer v{}: {:?}", scorer.version(), profile);
    let outcome = scorer.generate_report(&results);

    let status = if outcome.is_degraded() {
        warn!("Confidence report is degraded, using fallback scores");
        AnalysisStatus::Degraded
    } else {
        AnalysisStatus::Success
    };

    let recommendations = analyzer.generate_recommendations(&results, request.location.as_ref());

    // Step 3: Build the report
    println!("📝 Generating report...");

    let duration = start_time.elapsed().as_secs_f64();

    let metadata = ProcessingMetadata {
        model_version: analyzer.model_version().to_string(),
        analysis_types: request.analysis_types.clone(),
        image_dimensions,
        source: request.source.to_string(),
        location: request.location,
        analysis_date: Utc::now(),
        duration_seconds: duration,
    };

    let report = AnalysisReport {
        status,
        overall_score: outcome.environmental_score,
        overall_confidence: outcome.overall_confidence,
        confidence_report: outcome,
        pollution_indicators: results,
        recommendations,
        processing_metadata: metadata,
    };

    // Step 4: Render and save the report
    let output = match args.format {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => report::generate_markdown_report(&report, &config.report),
    };

    let output_path = output_path(&args, &config);
    std::fs::write(&output_path, &output)
        .with_context(|| format!("Failed to write report to {}", output_path.display()))?;

    // Print summary
    let level = report.confidence_report.confidence_level;
    println!("\n📊 Assessment Summary:");
    println!("   Environmental score: {:.3}", report.overall_score);
    println!(
        "   Confidence: {:.3} ({} {})",
        report.overall_confidence,
        level.emoji(),
        level
    );
    for rec in &report.recommendations {
        println!("   • {}", rec);
    }
    println!("   Duration: {:.1}s", duration);
    println!(
        "\n✅ Analysis complete! Report saved to: {}",
        output_path.display()
    );

    // Check --min-confidence threshold
    if let Some(min_confidence) = args.min_confidence {
        if report.overall_confidence < min_confidence {
            eprintln!(
                "\n⛔ Overall confidence {:.3} is below {:.3}. Failing (exit code 2).",
                report.overall_confidence, min_confidence
            );
            return Ok(2);
        }
    }

    Ok(0)
}

/// Decode and preprocess image bytes on the blocking pool, then run the producers.
async fn analyze_image(
    analyzer: &EnvironmentalAnalyzer,
    config: &Config,
    bytes: Vec<u8>,
    analysis_types: &[Category],
) -> Result<(AnalysisResultSet, Option<ImageDimensions>)> {
    let processor = ImageProcessor::new(&config.image);

    let image = tokio::task::spawn_blocking(move || processor.process(&bytes))
        .await
        .map_err(|e| ImageError::Task(e.to_string()))??;

    debug!(
        "Preprocessed {} image to {}",
        image.original,
        image.dimensions()
    );
    println!("🔬 Analyzing {} image...", image.dimensions());
    let results = analyzer.analyze(&image, analysis_types);

    Ok((results, Some(image.dimensions())))
}

/// Load a stored result set, keeping only the requested categories.
fn load_results(path: &Path, analysis_types: &[Category]) -> Result<AnalysisResultSet> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read results file: {}", path.display()))?;

    let stored: AnalysisResultSet = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse results file: {}", path.display()))?;

    for category in analysis_types {
        if stored.get(*category).is_none() {
            warn!("Results file has no {} entry", category);
        }
    }

    Ok(stored
        .iter()
        .filter(|(category, _)| analysis_types.contains(category))
        .map(|(category, result)| (category, result.clone()))
        .collect())
}

/// Report path. A JSON report without an explicit path gets a .json extension.
fn output_path(args: &Args, config: &Config) -> PathBuf {
    let path = PathBuf::from(&config.general.output);

    if args.output.is_none()
        && args.format == OutputFormat::Json
        && path.extension().is_some_and(|ext| ext == "md")
    {
        return path.with_extension("json");
    }

    path
}

/// Load configuration from file or use defaults. Also returns where it came from.
fn load_config(args: &Args) -> Result<(Config, String)> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        let config = Config::load(config_path)?;
        return Ok((config, config_path.display().to_string()));
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => Ok((config, CONFIG_FILE_NAME.to_string())),
        Ok(None) => Ok((Config::default(), "defaults".to_string())),
        Err(e) => {
            eprintln!("⚠️  Failed to load config, using defaults: {:#}", e);
            Ok((Config::default(), "defaults".to_string()))
        }
    }
}
