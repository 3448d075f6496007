use serde::Serialize;

/// What every pipeline hands back: the record, the warning log and a
/// confidence score in `[0, 100]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analysis<T> {
    pub record: T,
    pub warnings: Vec<String>,
    pub confidence: f64,
}

impl<T> Analysis<T> {
    pub fn new(record: T, warnings: Vec<String>, confidence: f64) -> Self {
        let confidence = if confidence.is_nan() { 0.0 } else { confidence.clamp(0.0, 100.0) };
        Self {
            record,
            warnings,
            confidence,
        }
    }
}

impl<T: Default> Analysis<T> {
    /// A default record carrying a single warning
    pub fn failed(warning: String) -> Self {
        Self::new(T::default(), vec![warning], 0.0)
    }
}
