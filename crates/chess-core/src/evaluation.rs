//! Engine evaluations, always stored from White's point of view.

use serde::{Deserialize, Serialize};
use shakmaty::Color;

/// A position evaluation as reported by an engine, normalized so that
/// positive values favour White.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Evaluation {
    /// Centipawn score.
    Centipawn(i32),
    /// Mate in N plies. Positive = White mates, negative = Black mates,
    /// zero = the side to move is already checkmated.
    Mate(i32),
}

impl Evaluation {
    /// Raw signed value regardless of kind.
    pub fn value(&self) -> i32 {
        match *self {
            Evaluation::Centipawn(v) | Evaluation::Mate(v) => v,
        }
    }

    /// Same evaluation seen from `colour`'s side (sign flipped for Black).
    pub fn subjective(&self, colour: Color) -> Evaluation {
        let sign = colour_sign(colour);
        match *self {
            Evaluation::Centipawn(v) => Evaluation::Centipawn(v * sign),
            Evaluation::Mate(v) => Evaluation::Mate(v * sign),
        }
    }

    /// Flip an evaluation given from the side to move into White's view.
    pub fn from_side_to_move(self, turn: Color) -> Evaluation {
        self.subjective(turn)
    }
}

/// `1` for White, `-1` for Black.
pub fn colour_sign(colour: Color) -> i32 {
    match colour {
        Color::White => 1,
        Color::Black => -1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subjective_flips_for_black() {
        assert_eq!(
            Evaluation::Centipawn(35).subjective(Color::Black),
            Evaluation::Centipawn(-35)
        );
        assert_eq!(Evaluation::Mate(-3).subjective(Color::Black), Evaluation::Mate(3));
        assert_eq!(Evaluation::Mate(2).subjective(Color::White), Evaluation::Mate(2));
    }

    #[test]
    fn test_serde_shape() {
        let json = serde_json::to_string(&Evaluation::Mate(-4)).unwrap();
        assert_eq!(json, r#"{"type":"mate","value":-4}"#);

        let parsed: Evaluation = serde_json::from_str(r#"{"type":"centipawn","value":12}"#).unwrap();
        assert_eq!(parsed, Evaluation::Centipawn(12));
    }
}
