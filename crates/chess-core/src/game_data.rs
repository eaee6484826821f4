use serde::{Deserialize, Serialize};

use crate::tree::GameTree;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GameMetadata {
    pub white: String,
    pub black: String,
    pub result: String, // "1-0", "0-1", "1/2-1/2", "*"
    pub date: Option<String>,
    pub event: Option<String>,
    pub time_control: Option<String>,
    pub eco: Option<String>,
    pub white_elo: Option<i32>,
    pub black_elo: Option<i32>,
    /// Starting position when the game did not begin from the standard setup
    pub fen: Option<String>,
}

/// A parsed game: headers plus the full move tree.
#[derive(Debug, Clone)]
pub struct Game {
    pub metadata: GameMetadata,
    pub tree: GameTree,
}
