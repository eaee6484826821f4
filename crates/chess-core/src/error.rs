use thiserror::Error;

use crate::tree::NodeId;

#[derive(Error, Debug)]
pub enum TreeError {
    #[error("Invalid FEN: {0}")]
    InvalidFen(String),

    #[error("Illegal move {mv} in position {fen}")]
    IllegalMove { mv: String, fen: String },

    #[error("Unknown node: {0}")]
    UnknownNode(NodeId),

    #[error("The root node cannot be removed")]
    RemoveRoot,

    #[error("Invalid PGN: {0}")]
    InvalidPgn(String),
}
