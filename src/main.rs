use clap::{Parser, ValueEnum};
use image::DynamicImage;
use rok_ocr_lib::services::config::{load_from, ConfigManager};
use rok_ocr_lib::{init_logging, Engine, EngineConfig, HttpOcrClient, Vocabulary};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Screen {
    /// Governor profile
    Profile,
    /// Battle report
    Report,
    /// Action point items (several screenshots merge)
    Ap,
    /// Experience books (several screenshots merge)
    Xp,
}

/// Read Rise of Kingdoms screenshots through the OCR server and print the
/// interpreted record as JSON.
#[derive(Debug, Parser)]
#[command(name = "rok-ocr", version)]
struct Cli {
    #[arg(value_enum)]
    screen: Screen,

    #[arg(required = true)]
    images: Vec<PathBuf>,

    /// Config file, instead of the one in the user config directory
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log as JSON lines
    #[arg(long)]
    json_logs: bool,
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig, String> {
    match path {
        Some(path) => load_from(path).map_err(|e| e.to_string()),
        None => ConfigManager::new()
            .and_then(|manager| manager.load())
            .map_err(|e| e.to_string()),
    }
}

fn open_image(path: &Path) -> Result<DynamicImage, String> {
    image::open(path).map_err(|e| format!("Failed to open {}: {}", path.display(), e))
}

fn print_json<T: Serialize>(value: &T) -> Result<(), String> {
    let json = serde_json::to_string_pretty(value).map_err(|e| format!("Failed to serialize result: {}", e))?;
    println!("{}", json);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), String> {
    let cli = Cli::parse();
    init_logging(cli.json_logs);

    let config = load_config(cli.config.as_deref())?;
    let vocabulary = match &config.vocabulary_dir {
        Some(dir) => Vocabulary::builtin().with_entities_from(dir),
        None => Vocabulary::builtin(),
    };

    let client = HttpOcrClient::new(&config.recognizer).map_err(|e| e.to_string())?;
    if let Err(e) = client.health_check().await {
        warn!(error = %e, "OCR server health check failed");
    }

    let images = cli.images.iter().map(|path| open_image(path)).collect::<Result<Vec<_>, _>>()?;
    info!(screen = ?cli.screen, images = images.len(), "Starting analysis");

    let engine = Engine::new(config, Arc::new(vocabulary), Arc::new(client));

    let first = images.first().ok_or_else(|| "No image given".to_string())?;
    if matches!(cli.screen, Screen::Profile | Screen::Report) && images.len() > 1 {
        warn!(ignored = images.len() - 1, "Single-image screen, extra images ignored");
    }

    match cli.screen {
        Screen::Profile => print_json(&engine.analyze_profile(first).await),
        Screen::Report => print_json(&engine.analyze_report(first).await),
        Screen::Ap => print_json(&engine.analyze_action_points(&images).await),
        Screen::Xp => print_json(&engine.analyze_experience(&images).await),
    }
}
