//! Classification of a move that was not the engine's first choice, from the
//! evaluation swing it caused.

use chess_core::evaluation::colour_sign;
use chess_core::{Classification, Evaluation};
use shakmaty::Color;

use crate::accuracy::expected_points_loss;

/// Expected-points loss thresholds, checked in order
const POINT_LOSS_THRESHOLDS: [(f64, Classification); 5] = [
    (0.01, Classification::Best),
    (0.045, Classification::Excellent),
    (0.08, Classification::Okay),
    (0.12, Classification::Inaccuracy),
    (0.22, Classification::Mistake),
];

/// Centipawns still held after losing a forced mate
const LOST_MATE_THRESHOLDS: [(i32, Classification); 4] = [
    (800, Classification::Excellent),
    (400, Classification::Okay),
    (200, Classification::Inaccuracy),
    (0, Classification::Mistake),
];

pub fn point_loss_classify(previous: Evaluation, current: Evaluation, mover: Color) -> Classification {
    let previous_subjective = previous.subjective(mover).value();
    let current_subjective = current.subjective(mover).value();

    match (previous, current) {
        (Evaluation::Mate(_), Evaluation::Mate(_)) => {
            mate_to_mate(previous, current, previous_subjective, current_subjective, mover)
        }

        (Evaluation::Mate(_), Evaluation::Centipawn(_)) => LOST_MATE_THRESHOLDS
            .iter()
            .find(|(floor, _)| current_subjective >= *floor)
            .map_or(Classification::Blunder, |(_, class)| *class),

        (Evaluation::Centipawn(_), Evaluation::Mate(_)) => {
            if current_subjective > 0 {
                Classification::Best
            } else if current_subjective >= -2 {
                Classification::Blunder
            } else if current_subjective >= -5 {
                Classification::Mistake
            } else {
                Classification::Inaccuracy
            }
        }

        (Evaluation::Centipawn(_), Evaluation::Centipawn(_)) => {
            let loss = expected_points_loss(&previous, &current, mover);
            POINT_LOSS_THRESHOLDS
                .iter()
                .find(|(limit, _)| loss < *limit)
                .map_or(Classification::Blunder, |(_, class)| *class)
        }
    }
}

fn mate_to_mate(
    previous: Evaluation,
    current: Evaluation,
    previous_subjective: i32,
    current_subjective: i32,
    mover: Color,
) -> Classification {
    // Winning mate turned into a losing one
    if previous_subjective > 0 && current_subjective < 0 {
        return if current_subjective < -3 {
            Classification::Mistake
        } else {
            Classification::Blunder
        };
    }

    let mate_loss = (current.value() - previous.value()) * colour_sign(mover);

    if mate_loss < 0 || (mate_loss == 0 && current_subjective < 0) {
        Classification::Best
    } else if mate_loss < 2 {
        Classification::Excellent
    } else if mate_loss < 7 {
        Classification::Okay
    } else {
        Classification::Inaccuracy
    }
}
