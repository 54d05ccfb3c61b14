//! HeritageAI
//!
//! Generates culturally-themed design assets (patterns, palettes, notes,
//! and metadata) through the Gemini/Imagen APIs.

use anyhow::Result;
use clap::{Parser, Subcommand};
use heritageai::{
    config::{Environment, Settings},
    logging::RollingFileWriter,
    server::App,
    services::{
        kit, palette, scoring, AspectRatio, CultureAnalyzer, GeminiClient, KitBuilder,
        PatternGenerator,
    },
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, Layer};

/// HeritageAI
///
/// Culturally-themed design asset generator.
#[derive(Parser, Debug)]
#[command(name = "heritageai")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Log level: trace, debug, info, warn, error (overrides LOG_LEVEL env var)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Log file path for JSON logs (enables file logging with rotation)
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate pattern images for a culture
    Generate {
        /// Culture to generate patterns for (e.g. yoruba, maori)
        #[arg(short, long)]
        culture: String,

        /// Number of images to generate
        #[arg(short = 'n', long, default_value_t = 4)]
        count: u32,

        /// Aspect ratio of the generated images
        #[arg(long, default_value = "1:1")]
        aspect_ratio: AspectRatio,

        /// File stem for the saved images (defaults to a timestamped name)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Generate a complete design kit for a culture
    GenerateKit {
        #[arg(short, long)]
        culture: String,
    },

    /// Extract a color palette from an image
    Palette {
        /// Image to extract colors from
        #[arg(short, long)]
        image: PathBuf,

        /// Number of colors to extract
        #[arg(long, default_value_t = 6)]
        colors: u8,
    },

    /// Generate a design brief for a culture from an image
    Brief {
        #[arg(short, long)]
        culture: String,

        /// Pattern image the brief is based on
        #[arg(short, long)]
        image: PathBuf,

        /// Target design style for the modern adaptation section
        #[arg(long, default_value = "modern")]
        style: String,
    },

    /// Build a palette-and-note bundle for one image
    Bundle {
        #[arg(short, long)]
        culture: String,

        #[arg(short, long)]
        image: PathBuf,
    },

    /// Score images against a text description
    ClipScore {
        /// Description to score against
        #[arg(short, long)]
        prompt: String,

        /// Score a single image instead of every PNG in the asset directory
        #[arg(short, long)]
        image: Option<PathBuf>,
    },

    /// Generate full culture metadata from an image
    GenerateCultureMetadata {
        #[arg(short, long)]
        culture: String,

        #[arg(short, long)]
        image: PathBuf,

        /// Where to write the metadata JSON (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run the HTTP server
    Serve {
        /// Port to listen on (overrides PORT env var)
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to (overrides HOST env var)
        #[arg(long)]
        host: Option<String>,

        /// Environment: dev, staging, prod (overrides ENVIRONMENT env var)
        #[arg(short, long)]
        env: Option<Environment>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration first (before logging, so we can use log_level)
    let mut settings = Settings::load()?;
    if let Some(log_level) = args.log_level {
        settings.log_level = log_level;
    }

    init_tracing(&settings.log_level, args.log_file.as_ref());

    match args.command {
        Command::Generate {
            culture,
            count,
            aspect_ratio,
            output,
        } => {
            settings.validate()?;
            let client = Arc::new(GeminiClient::new(&settings.gemini)?);
            let generator = PatternGenerator::new(client, settings.assets_dir.clone());

            let paths = generator
                .generate_patterns(&culture, output.as_deref(), count, aspect_ratio)
                .await?;
            for path in paths {
                println!("{}", path.display());
            }
        }

        Command::GenerateKit { culture } => {
            settings.validate()?;
            let client = Arc::new(GeminiClient::new(&settings.gemini)?);
            let generator = Arc::new(PatternGenerator::new(
                client.clone(),
                settings.assets_dir.clone(),
            ));
            let builder = KitBuilder::new(client, generator, Arc::new(settings));

            let summary = builder.build_kit(&culture).await?;
            println!("Kit directory: {}", summary.kit_dir.display());
            println!("Patterns: {}", summary.metadata.assets.patterns.len());
            for (format, path) in &summary.exports {
                println!("Export ({}): {}", format, path.display());
            }
        }

        Command::Palette { image, colors } => {
            let (palette_colors, path) = palette::extract_palette(&image, colors)?;
            for color in &palette_colors {
                println!("{}", color);
            }
            println!("Palette written to {}", path.display());
        }

        Command::Brief {
            culture,
            image,
            style,
        } => {
            settings.validate()?;
            let client = Arc::new(GeminiClient::new(&settings.gemini)?);
            let analyzer = CultureAnalyzer::new(client);

            let bytes = std::fs::read(&image)?;
            let brief = analyzer
                .generate_brief(&culture, &bytes, scoring::mime_type_for(&image), &style)
                .await;
            println!("{}", serde_json::to_string_pretty(&brief)?);
        }

        Command::Bundle { culture, image } => {
            settings.validate()?;
            let client = GeminiClient::new(&settings.gemini)?;

            let bundle_path = kit::build_bundle(&client, &image, &culture).await?;
            println!("Bundle written to {}", bundle_path.display());
        }

        Command::ClipScore { prompt, image } => {
            settings.validate()?;
            let client = GeminiClient::new(&settings.gemini)?;

            let targets = match image {
                Some(path) => vec![path],
                None => png_files_in(&settings.assets_dir)?,
            };
            anyhow::ensure!(!targets.is_empty(), "No images to score");

            for path in targets {
                let bytes = std::fs::read(&path)?;
                match scoring::score_image(&client, &bytes, scoring::mime_type_for(&path), &prompt)
                    .await
                {
                    Ok(score) => println!("{}\t{:.4}", path.display(), score),
                    Err(err) => {
                        tracing::warn!(image = %path.display(), error = %err, "Scoring failed");
                        println!("{}\t-", path.display());
                    }
                }
            }
        }

        Command::GenerateCultureMetadata {
            culture,
            image,
            output,
        } => {
            settings.validate()?;
            let client = Arc::new(GeminiClient::new(&settings.gemini)?);
            let analyzer = CultureAnalyzer::new(client);

            let metadata = analyzer.generate_metadata(&culture, &image).await?;
            let json = serde_json::to_string_pretty(&metadata)?;
            match output {
                Some(path) => {
                    std::fs::write(&path, json)?;
                    println!("Metadata written to {}", path.display());
                }
                None => println!("{}", json),
            }
        }

        Command::Serve { port, host, env } => {
            if let Some(port) = port {
                settings.port = port;
            }
            if let Some(host) = host {
                settings.host = host;
            }
            if let Some(env) = env {
                settings.environment = env;
            }
            settings.validate()?;

            tracing::info!(
                app_name = %settings.app_name,
                version = %settings.app_version,
                environment = %settings.environment,
                host = %settings.host,
                port = %settings.port,
                "Starting application"
            );

            let app = App::new(settings)?;
            app.run_with_graceful_shutdown().await?;

            tracing::info!("Application shutdown complete");
        }
    }

    Ok(())
}

/// Every PNG in a directory, sorted for stable output
fn png_files_in(dir: &std::path::Path) -> Result<Vec<PathBuf>> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("png"))
        })
        .collect();
    paths.sort();
    Ok(paths)
}

/// Initialize tracing subscriber with the specified log level
/// Optionally writes to a rolling log file
fn init_tracing(log_level: &str, log_file: Option<&PathBuf>) {
    // Build filter from RUST_LOG env var or use provided log level
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    let console_layer = fmt::layer().json().with_filter(filter);

    let subscriber = tracing_subscriber::registry().with(console_layer);

    if let Some(path) = log_file {
        let file_writer =
            RollingFileWriter::with_defaults(path).expect("Failed to create log file writer");

        let file_filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

        let file_layer = fmt::layer()
            .json()
            .with_writer(file_writer)
            .with_filter(file_filter);

        subscriber.with(file_layer).init();
    } else {
        subscriber.init();
    }
}
