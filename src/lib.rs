//! Interpretation engine for Rise of Kingdoms screenshots.
//!
//! Raw OCR detections go in; typed governor profiles, battle reports and
//! item inventories come out, each with a warning log and a confidence
//! score.

pub mod models;
pub mod services;

#[cfg(test)]
mod testing;

pub use models::config::EngineConfig;
pub use models::Analysis;
pub use services::ocr::{HttpOcrClient, Recognizer, RecognizerError};
pub use services::pipeline::Engine;
pub use services::vocabulary::Vocabulary;

use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "rok_ocr_lib=info,rok_ocr=info";

/// Install the global subscriber, writing to stderr.
///
/// `RUST_LOG` overrides the default filter. Calling twice is harmless.
pub fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}
