//! Expected points and accuracy: pure functions only
//! (No Engine/Board dependencies)

use chess_core::{Evaluation, GameTree};
use serde::{Deserialize, Serialize};
use shakmaty::Color;

/// Slope of the centipawn → win-probability curve
const CENTIPAWN_GRADIENT: f64 = 0.0035;

/// Accuracy curve constants: 103.16 · e^(−4·loss) − 3.17
const ACCURACY_SCALE: f64 = 103.16;
const ACCURACY_DECAY: f64 = 4.0;
const ACCURACY_OFFSET: f64 = 3.17;

/// Expected score in [0, 1] for White. `moving` only matters for a mate-in-0
/// evaluation, where the side that just moved has delivered mate.
pub fn expected_points(evaluation: &Evaluation, moving: Color) -> f64 {
    match *evaluation {
        Evaluation::Mate(0) => f64::from(u8::from(moving == Color::White)),
        Evaluation::Mate(n) => f64::from(u8::from(n > 0)),
        Evaluation::Centipawn(cp) => 1.0 / (1.0 + (-CENTIPAWN_GRADIENT * f64::from(cp)).exp()),
    }
}

/// Expected points given away by `move_colour` going from `previous` to
/// `current`. Never negative.
pub fn expected_points_loss(previous: &Evaluation, current: &Evaluation, move_colour: Color) -> f64 {
    let sign = match move_colour {
        Color::White => 1.0,
        Color::Black => -1.0,
    };
    let before = expected_points(previous, !move_colour);
    let after = expected_points(current, move_colour);
    ((before - after) * sign).max(0.0)
}

pub fn accuracy_from_point_loss(point_loss: f64) -> f64 {
    ACCURACY_SCALE * (-ACCURACY_DECAY * point_loss).exp() - ACCURACY_OFFSET
}

pub fn move_accuracy(previous: &Evaluation, current: &Evaluation, move_colour: Color) -> f64 {
    accuracy_from_point_loss(expected_points_loss(previous, current, move_colour))
}

/// Mean move accuracy per side. None for a side with no scored moves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GameAccuracy {
    pub white: Option<f64>,
    pub black: Option<f64>,
}

/// Average the accuracy of every mainline node, grouped by the side that moved.
pub fn game_accuracy(tree: &GameTree) -> GameAccuracy {
    let mut white = Vec::new();
    let mut black = Vec::new();

    for node in tree.mainline().into_iter().filter_map(|id| tree.get(id)) {
        match (node.state.move_colour, node.state.accuracy) {
            (Some(Color::White), Some(accuracy)) => white.push(accuracy),
            (Some(Color::Black), Some(accuracy)) => black.push(accuracy),
            _ => {}
        }
    }

    GameAccuracy {
        white: mean(&white),
        black: mean(&black),
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expected_points_centipawn() {
        assert!((expected_points(&Evaluation::Centipawn(0), Color::White) - 0.5).abs() < 1e-9);
        assert!(expected_points(&Evaluation::Centipawn(300), Color::White) > 0.7);
        assert!(expected_points(&Evaluation::Centipawn(-300), Color::White) < 0.3);
    }

    #[test]
    fn test_expected_points_mate() {
        assert_eq!(expected_points(&Evaluation::Mate(3), Color::Black), 1.0);
        assert_eq!(expected_points(&Evaluation::Mate(-1), Color::White), 0.0);
        assert_eq!(expected_points(&Evaluation::Mate(0), Color::White), 1.0);
        assert_eq!(expected_points(&Evaluation::Mate(0), Color::Black), 0.0);
    }

    #[test]
    fn test_point_loss_never_negative() {
        let gain = expected_points_loss(
            &Evaluation::Centipawn(0),
            &Evaluation::Centipawn(200),
            Color::White,
        );
        assert_eq!(gain, 0.0);
    }

    #[test]
    fn test_point_loss_monotonic() {
        for colour in [Color::White, Color::Black] {
            let previous = Evaluation::Centipawn(50).subjective(colour);
            let mut last = -1.0;
            for subjective in (-1000..=1000).rev().step_by(50) {
                let current = Evaluation::Centipawn(subjective).subjective(colour);
                let loss = expected_points_loss(&previous, &current, colour);
                assert!(loss >= last, "loss decreased at {subjective} for {colour:?}");
                last = loss;
            }
        }
    }

    #[test]
    fn test_point_loss_black() {
        // Black moves from -100 (good for Black) to +100
        let loss = expected_points_loss(
            &Evaluation::Centipawn(-100),
            &Evaluation::Centipawn(100),
            Color::Black,
        );
        assert!(loss > 0.15 && loss < 0.2);
    }

    #[test]
    fn test_accuracy_bounds() {
        assert!((accuracy_from_point_loss(0.0) - 99.99).abs() < 0.01);
        assert!((accuracy_from_point_loss(1e6) + 3.17).abs() < 1e-9);
        let same = move_accuracy(&Evaluation::Centipawn(30), &Evaluation::Centipawn(30), Color::White);
        assert!(same > 99.9);
    }

    #[test]
    fn test_game_accuracy_groups_by_side() {
        let mut tree = GameTree::from_san_moves(&["e4", "e5", "Nf3"]).unwrap();
        let chain = tree.mainline();
        for (id, accuracy) in chain.iter().skip(1).zip([90.0, 70.0, 80.0]) {
            tree.node_mut(*id).unwrap().state.accuracy = Some(accuracy);
        }

        let accuracy = game_accuracy(&tree);
        assert_eq!(accuracy.white, Some(85.0));
        assert_eq!(accuracy.black, Some(70.0));

        let empty = game_accuracy(&GameTree::default());
        assert_eq!(empty, GameAccuracy::default());
    }
}
