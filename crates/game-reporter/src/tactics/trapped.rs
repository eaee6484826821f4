use shakmaty::{Chess, Role};

use crate::board_utils::{moves_from, played, with_turn, BoardPiece};
use crate::tactics::danger::{has_counter_threat, ThreatMode};
use crate::tactics::safety::is_piece_safe;

/// A piece is trapped when it is unsafe where it stands and every move it
/// can make is either unsafe too or hands the opponent a bigger target.
pub fn is_piece_trapped(pos: &Chess, piece: &BoardPiece) -> bool {
    // Ask the question as if it were the piece's turn
    let Some(calibrated) = with_turn(pos, piece.color) else {
        return false;
    };

    if is_piece_safe(&calibrated, piece, None) {
        return false;
    }

    moves_from(&calibrated, piece.square).iter().all(|escape| {
        if escape.capture() == Some(Role::King) {
            return false;
        }

        if has_counter_threat(&calibrated, piece, std::slice::from_ref(escape), ThreatMode::Creates) {
            return true;
        }

        let after = played(&calibrated, escape);
        let moved = BoardPiece::new(escape.to(), piece.role, piece.color);
        !is_piece_safe(&after, &moved, Some(escape))
    })
}
