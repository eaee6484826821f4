//! Board utility functions for tactical analysis.
//!
//! Thin adapter over shakmaty: piece values, editing a position (flipping the
//! turn, removing or placing a piece) and looking up moves by shape.

use shakmaty::uci::UciMove;
use shakmaty::{
    CastlingMode, Chess, Color, EnPassantMode, FromSetup, Move, Piece, Position, PositionError,
    Role, Setup, Square,
};

// Piece values for material calculation
pub const PAWN_VALUE: i32 = 1;
pub const KNIGHT_VALUE: i32 = 3;
pub const BISHOP_VALUE: i32 = 3;
pub const ROOK_VALUE: i32 = 5;
pub const QUEEN_VALUE: i32 = 9;
pub const KING_VALUE: i32 = 99;

/// Material value of a role. The king outranks everything.
pub fn piece_value(role: Role) -> i32 {
    match role {
        Role::Pawn => PAWN_VALUE,
        Role::Knight => KNIGHT_VALUE,
        Role::Bishop => BISHOP_VALUE,
        Role::Rook => ROOK_VALUE,
        Role::Queen => QUEEN_VALUE,
        Role::King => KING_VALUE,
    }
}

/// A piece standing on a particular square.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoardPiece {
    pub square: Square,
    pub role: Role,
    pub color: Color,
}

impl BoardPiece {
    pub fn new(square: Square, role: Role, color: Color) -> Self {
        Self { square, role, color }
    }

    pub fn value(&self) -> i32 {
        piece_value(self.role)
    }

    pub fn at(pos: &Chess, square: Square) -> Option<Self> {
        pos.board()
            .piece_at(square)
            .map(|piece| Self::new(square, piece.role, piece.color))
    }

    /// The piece making `mv`, on its origin square.
    pub fn mover(mv: &Move, color: Color) -> Option<Self> {
        mv.from().map(|from| Self::new(from, mv.role(), color))
    }

    pub fn piece(&self) -> Piece {
        Piece {
            color: self.color,
            role: self.role,
        }
    }
}

/// Every piece of `color` on the board.
pub fn pieces_of(pos: &Chess, color: Color) -> Vec<BoardPiece> {
    let board = pos.board();
    board
        .by_color(color)
        .into_iter()
        .filter_map(|square| {
            board
                .piece_at(square)
                .map(|piece| BoardPiece::new(square, piece.role, piece.color))
        })
        .collect()
}

pub fn setup_of(pos: &Chess) -> Setup {
    pos.to_setup(EnPassantMode::Legal)
}

/// Build a playable position from an edited setup, tolerating the kinds of
/// irregularity editing introduces. None when the setup is unplayable
/// (missing king, side not to move in check, ...).
pub fn position_from(setup: Setup) -> Option<Chess> {
    Chess::from_setup(setup, CastlingMode::Standard)
        .or_else(PositionError::ignore_invalid_castling_rights)
        .or_else(PositionError::ignore_invalid_ep_square)
        .or_else(PositionError::ignore_impossible_check)
        .or_else(PositionError::ignore_too_much_material)
        .ok()
}

/// `setup` with `color` to move. Clears the en passant square when the
/// turn actually changes.
pub fn setup_with_turn(setup: &Setup, color: Color) -> Setup {
    let mut setup = setup.clone();
    if setup.turn != color {
        setup.turn = color;
        setup.ep_square = None;
    }
    setup
}

pub fn with_turn(pos: &Chess, color: Color) -> Option<Chess> {
    if pos.turn() == color {
        return Some(pos.clone());
    }
    position_from(setup_with_turn(&setup_of(pos), color))
}

/// `setup` with the square emptied.
pub fn setup_without_piece(setup: &Setup, square: Square) -> Setup {
    let mut setup = setup.clone();
    let _ = setup.board.remove_piece_at(square);
    setup.ep_square = None;
    setup
}

/// `setup` with `piece` placed on `square`, replacing whatever stood there.
pub fn setup_with_piece(setup: &Setup, square: Square, piece: Piece) -> Setup {
    let mut setup = setup.clone();
    setup.board.set_piece_at(square, piece);
    setup.ep_square = None;
    setup
}

/// Position after a legal move.
pub fn played(pos: &Chess, mv: &Move) -> Chess {
    let mut after = pos.clone();
    after.play_unchecked(*mv);
    after
}

/// Square of the captured piece (differs from the destination for en passant).
pub fn capture_square(mv: &Move) -> Square {
    match *mv {
        Move::EnPassant { from, to } => Square::from_coords(to.file(), from.rank()),
        _ => mv.to(),
    }
}

/// Legal moves of the piece on `square`.
pub fn moves_from(pos: &Chess, square: Square) -> Vec<Move> {
    pos.legal_moves()
        .into_iter()
        .filter(|mv| mv.from() == Some(square))
        .collect()
}

/// The legal move in `pos` with the same origin, destination and promotion
/// as `shape`, if there is one.
pub fn find_legal_move(pos: &Chess, shape: &Move) -> Option<Move> {
    pos.legal_moves().into_iter().find(|mv| {
        mv.from() == shape.from() && mv.to() == shape.to() && mv.promotion() == shape.promotion()
    })
}

/// Resolve a UCI move string against `pos`.
pub fn parse_uci_move(pos: &Chess, uci: &str) -> Option<Move> {
    uci.parse::<UciMove>().ok()?.to_move(pos).ok()
}

/// Whether any legal reply in `pos` delivers checkmate.
pub fn has_mating_reply(pos: &Chess) -> bool {
    pos.legal_moves()
        .iter()
        .any(|mv| played(pos, mv).is_checkmate())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shakmaty::fen::Fen;

    fn pos(fen: &str) -> Chess {
        fen.parse::<Fen>()
            .unwrap()
            .into_position(CastlingMode::Standard)
            .unwrap()
    }

    #[test]
    fn test_piece_values() {
        assert_eq!(piece_value(Role::Knight), piece_value(Role::Bishop));
        assert!(piece_value(Role::King) > piece_value(Role::Queen));
    }

    #[test]
    fn test_with_turn_flips() {
        let start = Chess::default();
        let flipped = with_turn(&start, Color::Black).unwrap();
        assert_eq!(flipped.turn(), Color::Black);
        assert_eq!(flipped.legal_moves().len(), 20);
    }

    #[test]
    fn test_with_turn_rejects_side_in_check() {
        // Black is in check, so White cannot be the side to move
        let checked = pos("4k3/8/8/8/8/8/8/4RK2 b - - 0 1");
        assert!(with_turn(&checked, Color::White).is_none());
    }

    #[test]
    fn test_capture_square_en_passant() {
        let p = pos("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 2");
        let ep = parse_uci_move(&p, "e5d6").unwrap();
        assert!(ep.is_en_passant());
        assert_eq!(capture_square(&ep), Square::D5);
    }

    #[test]
    fn test_find_legal_move_by_shape() {
        let start = Chess::default();
        let shape = Move::Normal {
            role: Role::Pawn,
            from: Square::E2,
            capture: None,
            to: Square::E4,
            promotion: None,
        };
        assert!(find_legal_move(&start, &shape).is_some());

        let illegal = Move::Normal {
            role: Role::Pawn,
            from: Square::E2,
            capture: None,
            to: Square::E5,
            promotion: None,
        };
        assert!(find_legal_move(&start, &illegal).is_none());
    }

    #[test]
    fn test_has_mating_reply() {
        // Black to move can play Qh4#
        let p = pos("rnbqkbnr/pppp1ppp/8/4p3/6P1/5P2/PPPPP2P/RNBQKBNR b KQkq - 0 2");
        assert!(has_mating_reply(&p));
        assert!(!has_mating_reply(&Chess::default()));
    }

    #[test]
    fn test_setup_edits() {
        let start = Chess::default();
        let setup = setup_without_piece(&setup_of(&start), Square::D1);
        let without_queen = position_from(setup).unwrap();
        assert!(without_queen.board().piece_at(Square::D1).is_none());

        let placed = setup_with_piece(
            &setup_of(&start),
            Square::E4,
            Piece {
                color: Color::Black,
                role: Role::Knight,
            },
        );
        assert_eq!(placed.board.piece_at(Square::E4).map(|p| p.role), Some(Role::Knight));
    }
}
