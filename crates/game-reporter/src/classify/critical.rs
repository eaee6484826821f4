//! Critical moves: the only good move in a position where the alternatives
//! lose ground.

use chess_core::Evaluation;
use shakmaty::{Color, Move, Position, Role};

use crate::accuracy::expected_points_loss;
use crate::board_utils::{capture_square, BoardPiece};
use crate::classify::extract::ExtractedNode;
use crate::tactics::is_piece_safe;

/// Subjective centipawns at which the mover is already winning comfortably
const DECISIVE_ADVANTAGE: i32 = 700;

/// Minimum expected points the second-best move would have given away
const CRITICAL_POINT_LOSS: f64 = 0.1;

/// Shared filter for the Critical and Brilliant checks.
pub fn is_move_critical_candidate(
    previous: &ExtractedNode<'_>,
    current: &ExtractedNode<'_>,
    played: &Move,
) -> bool {
    let reference = previous
        .second_subjective_evaluation
        .unwrap_or(current.subjective_evaluation);
    if let Evaluation::Centipawn(cp) = reference {
        if cp >= DECISIVE_ADVANTAGE {
            return false;
        }
    }

    if played.promotion() == Some(Role::Queen) {
        return false;
    }

    !previous.position.is_check()
}

pub fn consider_critical(
    previous: &ExtractedNode<'_>,
    current: &ExtractedNode<'_>,
    played: &Move,
    mover: Color,
) -> bool {
    if !is_move_critical_candidate(previous, current, played) {
        return false;
    }

    // Already mating
    if matches!(current.subjective_evaluation, Evaluation::Mate(n) if n > 0) {
        return false;
    }

    // Taking a free piece is never critical
    if let Some(captured) = played.capture() {
        let piece = BoardPiece::new(capture_square(played), captured, !mover);
        if !is_piece_safe(previous.position, &piece, None) {
            return false;
        }
    }

    let Some(second) = previous.second_top_line else {
        return false;
    };

    expected_points_loss(&previous.evaluation, &second.evaluation, mover) >= CRITICAL_POINT_LOSS
}
