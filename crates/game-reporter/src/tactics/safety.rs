//! Piece safety: can a piece be won by the opponent?

use shakmaty::{Chess, Color, Move, Role};

use crate::board_utils::{piece_value, pieces_of, BoardPiece, KNIGHT_VALUE};
use crate::tactics::attackers::attacking_pieces;
use crate::tactics::defenders::defending_pieces;

pub fn is_piece_safe(pos: &Chess, piece: &BoardPiece, played_move: Option<&Move>) -> bool {
    let direct_attackers = attacking_pieces(pos, piece, false);
    let attackers = attacking_pieces(pos, piece, true);
    let defenders = defending_pieces(pos, piece, true);

    // Rook for two minors: a rook that just took a minor piece and is hit by
    // one defended minor is giving a favourable exchange
    let took_minor = played_move
        .and_then(|mv| mv.capture())
        .is_some_and(|captured| piece_value(captured) == KNIGHT_VALUE);
    if took_minor
        && piece.role == Role::Rook
        && attackers.len() == 1
        && !defenders.is_empty()
        && attackers[0].value() == KNIGHT_VALUE
    {
        return true;
    }

    if direct_attackers
        .iter()
        .any(|attacker| attacker.value() < piece.value())
    {
        return false;
    }

    if attackers.len() <= defenders.len() {
        return true;
    }

    let Some(lowest_attacker) = direct_attackers.iter().min_by_key(|a| a.value()) else {
        return true;
    };

    if piece.value() < lowest_attacker.value()
        && defenders
            .iter()
            .any(|defender| defender.value() < lowest_attacker.value())
    {
        return true;
    }

    defenders.iter().any(|defender| defender.role == Role::Pawn)
}

/// Non-pawn, non-king pieces of `colour` that are not safe. Pieces worth no
/// more than what `played_move` just captured are traded, not hanging.
pub fn unsafe_pieces(pos: &Chess, colour: Color, played_move: Option<&Move>) -> Vec<BoardPiece> {
    let captured_value = played_move
        .and_then(|mv| mv.capture())
        .map_or(0, piece_value);

    pieces_of(pos, colour)
        .into_iter()
        .filter(|piece| {
            piece.role != Role::Pawn
                && piece.role != Role::King
                && piece.value() > captured_value
                && !is_piece_safe(pos, piece, played_move)
        })
        .collect()
}
