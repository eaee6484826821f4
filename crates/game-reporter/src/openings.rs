//! Opening book: piece placement → opening name.
//!
//! The built-in table covers the common first moves. A JSON file of the form
//! `{"<board fen>": "<name>"}` replaces it entirely.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use shakmaty::{Chess, Position};
use tracing::{info, warn};

use crate::error::AnalysisError;

const BUILT_IN: &[(&str, &str)] = &[
    ("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR", "King's Pawn Opening"),
    ("rnbqkbnr/pppppppp/8/8/3P4/8/PPP1PPPP/RNBQKBNR", "Queen's Pawn Opening"),
    ("rnbqkbnr/pppppppp/8/8/2P5/8/PP1PPPPP/RNBQKBNR", "English Opening"),
    ("rnbqkbnr/pppppppp/8/8/8/5N2/PPPPPPPP/RNBQKB1R", "Zukertort Opening"),
    ("rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR", "King's Pawn Game"),
    ("rnbqkbnr/pp1ppppp/8/2p5/4P3/8/PPPP1PPP/RNBQKBNR", "Sicilian Defense"),
    ("rnbqkbnr/pppp1ppp/4p3/8/4P3/8/PPPP1PPP/RNBQKBNR", "French Defense"),
    ("rnbqkbnr/pp1ppppp/2p5/8/4P3/8/PPPP1PPP/RNBQKBNR", "Caro-Kann Defense"),
    ("rnbqkbnr/ppp1pppp/8/3p4/4P3/8/PPPP1PPP/RNBQKBNR", "Scandinavian Defense"),
    ("rnbqkbnr/pppp1ppp/8/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R", "King's Knight Opening"),
    ("r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R", "King's Knight Opening: Normal Variation"),
    ("r1bqkbnr/pppp1ppp/2n5/1B2p3/4P3/5N2/PPPP1PPP/RNBQK2R", "Ruy Lopez"),
    ("r1bqkbnr/pppp1ppp/2n5/4p3/2B1P3/5N2/PPPP1PPP/RNBQK2R", "Italian Game"),
    ("rnbqkbnr/ppp1pppp/8/3p4/3P4/8/PPP1PPPP/RNBQKBNR", "Queen's Pawn Game"),
    ("rnbqkbnr/ppp1pppp/8/3p4/2PP4/8/PP2PPPP/RNBQKBNR", "Queen's Gambit"),
    ("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR", "Starting Position"),
];

#[derive(Debug, Clone, Default)]
pub struct OpeningBook {
    names: HashMap<String, String>,
}

impl OpeningBook {
    pub fn built_in() -> Self {
        Self {
            names: BUILT_IN
                .iter()
                .map(|(board, name)| (board.to_string(), name.to_string()))
                .collect(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, AnalysisError> {
        let names: HashMap<String, String> = serde_json::from_str(json)?;
        Ok(Self { names })
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, AnalysisError> {
        let reader = BufReader::new(File::open(path)?);
        let names: HashMap<String, String> = serde_json::from_reader(reader)?;
        Ok(Self { names })
    }

    /// Load `path` if given, falling back to the built-in table when it is
    /// absent or unreadable.
    pub fn load_or_built_in(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::built_in();
        };
        match Self::load(path) {
            Ok(book) => {
                info!(path = %path.display(), positions = book.len(), "Loaded opening book");
                book
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to load opening book");
                warn!("Falling back to the built-in opening book");
                Self::built_in()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Opening name for a full or board-only FEN.
    pub fn name_for_fen(&self, fen: &str) -> Option<&str> {
        let board = fen.split_whitespace().next()?;
        self.names.get(board).map(String::as_str)
    }

    pub fn name_for(&self, position: &Chess) -> Option<&str> {
        self.names
            .get(&position.board().to_string())
            .map(String::as_str)
    }
}
