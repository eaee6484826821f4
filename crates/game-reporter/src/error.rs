//! Reporter error types

use chess_core::TreeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// A node has no usable best line. Per-node and recoverable.
    #[error("Missing evaluation data: {0}")]
    MissingEvaluationData(String),

    /// Caller bug, e.g. classifying the root.
    #[error("Analysis precondition failed: {0}")]
    AnalysisPrecondition(&'static str),

    #[error("Engine protocol error: {0}")]
    EngineProtocol(String),

    #[error("Analysis aborted")]
    Aborted,

    #[error("Tree error: {0}")]
    Tree(#[from] TreeError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AnalysisError {
    pub fn is_aborted(&self) -> bool {
        matches!(self, AnalysisError::Aborted)
    }
}
