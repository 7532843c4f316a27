//! Text-generation boundary
//!
//! Translate, summarize, and extract-information features run against an
//! external service behind [`TextGenerationService`]. The core's only
//! obligation on failure is to surface the service's error verbatim in
//! the corresponding result area; document and annotation state are
//! never touched by these calls.

#[derive(Debug, thiserror::Error)]
pub enum TextGenError {
    #[error("network error: {0}")]
    Network(String),
    #[error("quota exceeded: {0}")]
    Quota(String),
    #[error("service error: {0}")]
    Service(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum SummaryLength {
    Short,
    Medium,
    Long,
}

pub trait TextGenerationService {
    fn translate(&self, text: &str, target_language: &str) -> Result<String, TextGenError>;
    fn summarize(&self, text: &str, length: SummaryLength) -> Result<String, TextGenError>;
    fn extract_information(&self, text: &str, query: &str) -> Result<String, TextGenError>;
}

/// What the result area shows after a service call settles.
#[derive(Debug, Clone, PartialEq)]
pub enum PanelOutput {
    Text(String),
    Error(String),
}

impl PanelOutput {
    /// Errors are rendered inline, word for word, never rethrown.
    pub fn from_result(result: Result<String, TextGenError>) -> Self {
        match result {
            Ok(text) => PanelOutput::Text(text),
            Err(err) => PanelOutput::Error(err.to_string()),
        }
    }
}
