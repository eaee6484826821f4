//! Counter-threats: does answering a threat expose something at least as
//! valuable?

use shakmaty::{Chess, Color, Move, Position};

use crate::board_utils::{find_legal_move, has_mating_reply, played, BoardPiece, QUEEN_VALUE};
use crate::tactics::attackers::attacking_moves;
use crate::tactics::safety::unsafe_pieces;

/// How a reply's counter-threats are counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreatMode {
    /// Only threats that did not exist before the reply count
    Creates,
    /// Any threat standing after the reply counts
    Leaves,
}

/// Attacks on unsafe pieces of `colour` worth at least as much as the
/// threatened piece, the threatened piece itself excluded.
fn relative_unsafe_piece_attacks(
    pos: &Chess,
    threatened: &BoardPiece,
    colour: Color,
    played_move: Option<&Move>,
) -> Vec<Move> {
    unsafe_pieces(pos, colour, played_move)
        .into_iter()
        .filter(|piece| piece.square != threatened.square && piece.value() >= threatened.value())
        .flat_map(|piece| attacking_moves(pos, &piece, false))
        .collect()
}

/// A cheap piece left en prise because taking it walks into mate.
fn low_value_checkmate_pin(after: &Chess, threatened: &BoardPiece) -> bool {
    threatened.value() < QUEEN_VALUE && has_mating_reply(after)
}

/// Whether playing `acting` (by the side to move) creates a new attack on a
/// piece of that side at least as valuable as `threatened`.
pub fn move_creates_greater_threat(pos: &Chess, threatened: &BoardPiece, acting: &Move) -> bool {
    let Some(mv) = find_legal_move(pos, acting) else {
        return false;
    };
    let colour = pos.turn();

    let previous = relative_unsafe_piece_attacks(pos, threatened, colour, None);

    let after = played(pos, &mv);
    let current = relative_unsafe_piece_attacks(&after, threatened, colour, Some(&mv));

    if current.iter().any(|attack| !previous.contains(attack)) {
        return true;
    }

    low_value_checkmate_pin(&after, threatened)
}

/// Whether, after `acting`, any piece of the mover at least as valuable as
/// `threatened` is under attack.
pub fn move_leaves_greater_threat(pos: &Chess, threatened: &BoardPiece, acting: &Move) -> bool {
    let Some(mv) = find_legal_move(pos, acting) else {
        return false;
    };
    let colour = pos.turn();

    let after = played(pos, &mv);
    if !relative_unsafe_piece_attacks(&after, threatened, colour, None).is_empty() {
        return true;
    }

    low_value_checkmate_pin(&after, threatened)
}

/// True when every candidate move answers the threat on `threatened` with a
/// counter-threat of equal or greater severity.
pub fn has_counter_threat(
    pos: &Chess,
    threatened: &BoardPiece,
    candidates: &[Move],
    mode: ThreatMode,
) -> bool {
    candidates.iter().all(|acting| match mode {
        ThreatMode::Creates => move_creates_greater_threat(pos, threatened, acting),
        ThreatMode::Leaves => move_leaves_greater_threat(pos, threatened, acting),
    })
}
