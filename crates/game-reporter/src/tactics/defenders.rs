//! Defenders of a piece: who recaptures if it is taken.

use shakmaty::{Chess, Move, Piece};

use crate::board_utils::{find_legal_move, played, setup_of, setup_with_piece, with_turn, BoardPiece};
use crate::tactics::attackers::{attacking_moves, attacking_moves_in};

/// Simulate every direct capture of `target` and return the smallest set of
/// recaptures. An unattacked piece is swapped for an enemy piece of the same
/// kind and that piece's attackers are returned instead.
pub fn defending_moves(pos: &Chess, target: &BoardPiece, transitive: bool) -> Vec<Move> {
    let attacking = attacking_moves(pos, target, false);

    let smallest_recapture_set = with_turn(pos, !target.color).and_then(|capture_base| {
        attacking
            .iter()
            .filter_map(|attack| {
                let capture = find_legal_move(&capture_base, attack)?;
                let after = played(&capture_base, &capture);
                let capturer = BoardPiece::new(capture.to(), attack.role(), !target.color);
                Some(attacking_moves(&after, &capturer, transitive))
            })
            .min_by_key(Vec::len)
    });

    match smallest_recapture_set {
        Some(recaptures) => recaptures,
        None => {
            let flipped = BoardPiece::new(target.square, target.role, !target.color);
            let setup = setup_with_piece(
                &setup_of(pos),
                target.square,
                Piece {
                    color: flipped.color,
                    role: flipped.role,
                },
            );
            attacking_moves_in(&setup, &flipped, transitive)
        }
    }
}

pub fn defending_pieces(pos: &Chess, target: &BoardPiece, transitive: bool) -> Vec<BoardPiece> {
    defending_moves(pos, target, transitive)
        .iter()
        .filter_map(|mv| BoardPiece::mover(mv, target.color))
        .collect()
}
