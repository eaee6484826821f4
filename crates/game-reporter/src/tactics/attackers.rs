//! Attackers of a piece, including x-ray attackers lined up behind them.

use shakmaty::{Chess, Move, Position, Rank, Role, Setup, Square};

use crate::board_utils::{
    capture_square, position_from, setup_of, setup_with_turn, setup_without_piece, BoardPiece,
};

/// Moves that capture `target` right now: every legal capture by the other
/// side, plus a king capture when the enemy king touches the square and no
/// legal king capture was found.
pub fn direct_attacking_moves(pos: &Chess, target: &BoardPiece) -> Vec<Move> {
    direct_attacks_in(&setup_of(pos), target)
}

/// Direct attackers plus every battery attacker revealed by taking the
/// front attacker off the board.
pub fn attacking_moves(pos: &Chess, target: &BoardPiece, transitive: bool) -> Vec<Move> {
    attacking_moves_in(&setup_of(pos), target, transitive)
}

pub(crate) fn attacking_moves_in(setup: &Setup, target: &BoardPiece, transitive: bool) -> Vec<Move> {
    let mut attacking = direct_attacks_in(setup, target);
    if !transitive {
        return attacking;
    }

    // (position in which the attacker is direct, attacker square, attacker role)
    let mut frontier: Vec<(Setup, Square, Role)> = attacking
        .iter()
        .filter_map(|mv| mv.from().map(|from| (setup.clone(), from, mv.role())))
        .collect();

    while let Some((direct_setup, square, role)) = frontier.pop() {
        // A king cannot be at the front of a battery
        if role == Role::King {
            continue;
        }

        let before: Vec<Move> = direct_attacks_in(&direct_setup, target)
            .into_iter()
            .filter(|mv| mv.from() != Some(square))
            .collect();

        let revealed_setup = setup_without_piece(&direct_setup, square);
        let after = direct_attacks_in(&revealed_setup, target);

        let revealed = symmetric_difference(before, after);

        frontier.extend(
            revealed
                .iter()
                .filter_map(|mv| mv.from().map(|from| (revealed_setup.clone(), from, mv.role()))),
        );
        attacking.extend(revealed);
    }

    attacking
}

fn direct_attacks_in(setup: &Setup, target: &BoardPiece) -> Vec<Move> {
    let attacker = !target.color;
    let board = &setup.board;

    let mut moves = match position_from(setup_with_turn(setup, attacker)) {
        Some(attacker_pos) => attacker_pos
            .legal_moves()
            .into_iter()
            .filter(|mv| {
                mv.capture().is_some()
                    && capture_square(mv) == target.square
                    // One entry per capturing pawn, not one per promotion piece
                    && mv.promotion().map_or(true, |role| role == Role::Queen)
            })
            .collect(),
        // The flipped position is unplayable (the defending side would be
        // in check), so fall back to raw board attacks.
        None => pseudo_attacking_moves(setup, target),
    };

    let king_square = (board.attacks_to(target.square, attacker, board.occupied())
        & board.kings())
    .first();

    if let Some(from) = king_square {
        if !moves.iter().any(|mv| mv.role() == Role::King) {
            moves.push(Move::Normal {
                role: Role::King,
                from,
                capture: Some(target.role),
                to: target.square,
                promotion: None,
            });
        }
    }

    moves
}

fn pseudo_attacking_moves(setup: &Setup, target: &BoardPiece) -> Vec<Move> {
    let board = &setup.board;
    let attackers = board.attacks_to(target.square, !target.color, board.occupied())
        & !board.kings();

    attackers
        .into_iter()
        .filter_map(|from| {
            let role = board.role_at(from)?;
            let back_rank = matches!(target.square.rank(), Rank::First | Rank::Eighth);
            let promotion = (role == Role::Pawn && back_rank).then_some(Role::Queen);
            Some(Move::Normal {
                role,
                from,
                capture: Some(target.role),
                to: target.square,
                promotion,
            })
        })
        .collect()
}

fn symmetric_difference(a: Vec<Move>, b: Vec<Move>) -> Vec<Move> {
    let mut out: Vec<Move> = a.iter().filter(|mv| !b.contains(mv)).cloned().collect();
    out.extend(b.iter().filter(|mv| !a.contains(mv)).cloned());
    out
}

/// Shorthand used by the safety checks: attacking moves turned into pieces.
pub fn attacking_pieces(pos: &Chess, target: &BoardPiece, transitive: bool) -> Vec<BoardPiece> {
    attacking_moves(pos, target, transitive)
        .iter()
        .filter_map(|mv| BoardPiece::mover(mv, !target.color))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use shakmaty::fen::Fen;
    use shakmaty::{CastlingMode, Color};

    fn pos(fen: &str) -> Chess {
        fen.parse::<Fen>()
            .unwrap()
            .into_position(CastlingMode::Standard)
            .unwrap()
    }

    fn piece(p: &Chess, square: Square) -> BoardPiece {
        BoardPiece::at(p, square).unwrap()
    }

    #[test]
    fn test_direct_attackers() {
        // Black pawn d5 attacked by the e4 pawn only
        let p = pos("4k3/8/2p5/3p4/4P3/8/8/4K3 w - - 0 1");
        let attacks = direct_attacking_moves(&p, &piece(&p, Square::D5));
        assert_eq!(attacks.len(), 1);
        assert_eq!(attacks[0].from(), Some(Square::E4));
    }

    #[test]
    fn test_battery_is_transitive() {
        // Rooks a2 and a1 line up against the a8 rook
        let p = pos("r3k3/8/8/8/8/8/R7/R3K3 w - - 0 1");
        let target = piece(&p, Square::A8);

        assert_eq!(attacking_moves(&p, &target, false).len(), 1);

        let all = attacking_moves(&p, &target, true);
        assert_eq!(all.len(), 2);
        assert!(all.iter().any(|mv| mv.from() == Some(Square::A1)));
    }

    #[test]
    fn test_king_attacker_listed_even_if_defended() {
        // Kxe2 is illegal (the rook on e8 defends), but the king still counts
        let p = pos("4r1k1/8/8/8/8/8/4n3/4K3 w - - 0 1");
        let attacks = direct_attacking_moves(&p, &piece(&p, Square::E2));
        assert_eq!(attacks.len(), 1);
        assert_eq!(attacks[0].role(), Role::King);
    }

    #[test]
    fn test_promotion_capture_counted_once() {
        let p = pos("1r2k3/P7/8/8/8/8/8/4K3 w - - 0 1");
        let attacks = direct_attacking_moves(&p, &piece(&p, Square::B8));
        assert_eq!(attacks.len(), 1);
        assert_eq!(attacks[0].promotion(), Some(Role::Queen));
    }

    #[test]
    fn test_fallback_when_flip_is_unplayable() {
        // White is in check, so Black cannot be made the side to move;
        // attackers of the white knight still come from the board.
        let p = pos("4k3/8/8/2N5/1b6/8/8/4K3 w - - 0 1");
        let knight = piece(&p, Square::C5);
        assert_eq!(knight.color, Color::White);
        let attacks = direct_attacking_moves(&p, &knight);
        assert_eq!(attacks.len(), 1);
        assert_eq!(attacks[0].from(), Some(Square::B4));
    }
}
