pub mod http_ocr;
pub mod recognizer;

// Re-export main types
pub use http_ocr::HttpOcrClient;
pub use recognizer::{BatchReading, Recognition, Recognizer, RecognizerError, RegionRequest};
