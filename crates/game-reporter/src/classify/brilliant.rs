//! Brilliant moves: a good move that leaves material hanging on purpose.

use shakmaty::{Chess, Color, Move, Position};

use crate::board_utils::BoardPiece;
use crate::classify::critical::is_move_critical_candidate;
use crate::classify::extract::ExtractedNode;
use crate::tactics::{is_piece_trapped, unsafe_pieces};

pub fn consider_brilliant(
    previous: &ExtractedNode<'_>,
    current: &ExtractedNode<'_>,
    played: &Move,
    mover: Color,
) -> bool {
    if !is_move_critical_candidate(previous, current, played) {
        return false;
    }

    if previous.second_subjective_evaluation.is_none() {
        return false;
    }

    if played.promotion().is_some() {
        return false;
    }

    let previous_unsafe = unsafe_pieces(previous.position, mover, None);
    let current_unsafe = unsafe_pieces(current.position, mover, Some(played));

    // Moving pieces to safety is not a sacrifice
    if !current.position.is_check() && current_unsafe.len() < previous_unsafe.len() {
        return false;
    }

    let previous_trapped = trapped(previous.position, &previous_unsafe);
    let current_trapped = trapped(current.position, &current_unsafe);

    // Everything left hanging was lost anyway
    if current_trapped.len() == current_unsafe.len() {
        return false;
    }

    let moved_was_trapped = played
        .from()
        .is_some_and(|from| previous_trapped.iter().any(|piece| piece.square == from));
    if moved_was_trapped || current_trapped.len() < previous_trapped.len() {
        return false;
    }

    !current_unsafe.is_empty()
}

fn trapped(pos: &Chess, pieces: &[BoardPiece]) -> Vec<BoardPiece> {
    pieces
        .iter()
        .filter(|piece| is_piece_trapped(pos, piece))
        .copied()
        .collect()
}
