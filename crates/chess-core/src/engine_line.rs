//! Principal variations reported by engines and the rules for picking
//! between them.

use serde::{Deserialize, Serialize};

use crate::evaluation::Evaluation;

/// One move of a principal variation, in both notations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineMove {
    pub uci: String,
    pub san: String,
}

/// A single principal variation for one position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineLine {
    /// Engine/version label that produced the line
    pub source: String,
    pub depth: u32,
    /// MultiPV rank, 1 = best
    pub index: u32,
    pub evaluation: Evaluation,
    pub moves: Vec<LineMove>,
}

impl EngineLine {
    pub fn first_move(&self) -> Option<&LineMove> {
        self.moves.first()
    }
}

/// The best line: rank 1 with the greatest depth. Ties keep the earliest.
pub fn top_line(lines: &[EngineLine]) -> Option<&EngineLine> {
    deepest(lines.iter().filter(|line| line.index == 1))
}

/// The line of rank `index` from the same source as `line`.
pub fn sibling_line<'a>(
    lines: &'a [EngineLine],
    line: &EngineLine,
    index: u32,
) -> Option<&'a EngineLine> {
    deepest(
        lines
            .iter()
            .filter(|other| other.source == line.source && other.index == index),
    )
}

fn deepest<'a>(lines: impl Iterator<Item = &'a EngineLine>) -> Option<&'a EngineLine> {
    lines.fold(None, |best: Option<&EngineLine>, line| match best {
        Some(b) if b.depth >= line.depth => Some(b),
        _ => Some(line),
    })
}
