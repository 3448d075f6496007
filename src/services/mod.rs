pub mod audit;
pub mod cognitive;
pub mod config;
pub mod extractors;
pub mod merge;
pub mod ocr;
pub mod pipeline;
pub mod reacquire;
pub mod scoring;
pub mod vocabulary;
