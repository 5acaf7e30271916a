use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::board::Board;
use crate::types::*;

/// A single ply. Built from a board snapshot, after which it is a plain value.
///
/// Equality, hashing and ordering only look at the start and end squares, so a move
/// assembled from a click pair compares equal to the generated one.
#[derive(Debug, Clone, Copy)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    pub piece_moved: Piece,
    pub piece_captured: Option<Piece>,
    pub is_pawn_promotion: bool,
    pub is_castle_move: bool,
    pub is_capture: bool,
}

impl Move {
    /// Move `piece` from `from` to `to`, reading the captured piece from `board`.
    pub fn new(from: Square, to: Square, piece: Piece, board: &Board) -> Move {
        let is_castle_move = piece.piece_type == PieceType::King
            && (to.col as i8 - from.col as i8).abs() == 2;
        // a kingside castle lands on the rook's square, that is not a capture
        let piece_captured = if is_castle_move { None } else { board.get(to) };
        Move {
            from,
            to,
            piece_moved: piece,
            piece_captured,
            is_pawn_promotion: piece.piece_type == PieceType::Pawn
                && to.row as usize == piece.color.promotion_row(),
            is_castle_move,
            is_capture: piece_captured.is_some(),
        }
    }

    /// Build a move from whatever stands on `from`, `None` if the square is empty
    pub fn from_board(from: Square, to: Square, board: &Board) -> Option<Move> {
        board.get(from).map(|piece| Move::new(from, to, piece, board))
    }

    /// Parse coordinate notation such as `d2d3` against `board`
    pub fn from_notation(notation: &str, board: &Board) -> Option<Move> {
        if notation.len() != 4 || !notation.is_ascii() {
            return None;
        }
        let from = Square::from_algebraic(&notation[0..2])?;
        let to = Square::from_algebraic(&notation[2..4])?;
        Move::from_board(from, to, board)
    }

    /// Ordering key, unique per (from, to) pair
    pub fn move_id(&self) -> u16 {
        self.from.row as u16 * 1000
            + self.from.col as u16 * 100
            + self.to.row as u16 * 10
            + self.to.col as u16
    }

    pub fn is_kingside_castle(&self) -> bool {
        self.is_castle_move && self.to.col > self.from.col
    }

    /// Start and end square, `d2d3`
    pub fn chess_notation(&self) -> String {
        format!("{}{}", self.from.to_algebraic(), self.to.to_algebraic())
    }

    pub fn to_human(&self) -> String {
        if self.is_castle_move {
            let side = if self.is_kingside_castle() {
                "kingside"
            } else {
                "queenside"
            };
            return format!("{} castles {}", self.piece_moved.color.to_human(), side);
        }
        let maybe_capture_str = match self.piece_captured {
            Some(p) => format!(" capturing {} {}", p.color.to_human(), p.piece_type.to_human()),
            None => "".to_string(),
        };
        let maybe_promotion_str = if self.is_pawn_promotion {
            " and promoting"
        } else {
            ""
        };
        format!(
            "{} moves {} from {} to {}{}{}",
            self.piece_moved.color.to_human(),
            self.piece_moved.piece_type.to_human(),
            self.from.to_algebraic(),
            self.to.to_algebraic(),
            maybe_capture_str,
            maybe_promotion_str,
        )
    }
}

impl PartialEq for Move {
    fn eq(&self, other: &Self) -> bool {
        self.move_id() == other.move_id()
    }
}

impl Eq for Move {}

impl Hash for Move {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.move_id().hash(state);
    }
}

impl PartialOrd for Move {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Move {
    fn cmp(&self, other: &Self) -> Ordering {
        self.move_id().cmp(&other.move_id())
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_castle_move {
            return if self.is_kingside_castle() {
                write!(f, "O-O")
            } else {
                write!(f, "O-O-O")
            };
        }
        let end_square = self.to.to_algebraic();
        if self.piece_moved.piece_type == PieceType::Pawn {
            if self.is_capture {
                return write!(f, "{}x{}", self.from.file_char(), end_square);
            }
            return write!(f, "{}", end_square);
        }
        write!(
            f,
            "{}{}{}",
            self.piece_moved.piece_type.to_char(),
            if self.is_capture { "x" } else { "" },
            end_square
        )
    }
}

/// Castling eligibility, per color and wing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CastleRights {
    pub white_kingside: bool,
    pub black_kingside: bool,
    pub white_queenside: bool,
    pub black_queenside: bool,
}

impl Default for CastleRights {
    fn default() -> Self {
        Self::all()
    }
}

impl CastleRights {
    pub fn all() -> Self {
        Self {
            white_kingside: true,
            black_kingside: true,
            white_queenside: true,
            black_queenside: true,
        }
    }

    pub fn none() -> Self {
        Self {
            white_kingside: false,
            black_kingside: false,
            white_queenside: false,
            black_queenside: false,
        }
    }

    /// Parse the `KQkq` field, `-` for no rights
    pub fn from_field(field: &str) -> Option<Self> {
        if field == "-" {
            return Some(Self::none());
        }
        if field.is_empty() || !field.chars().all(|c| "KQkq".contains(c)) {
            return None;
        }
        Some(Self {
            white_kingside: field.contains('K'),
            black_kingside: field.contains('k'),
            white_queenside: field.contains('Q'),
            black_queenside: field.contains('q'),
        })
    }

    pub fn kingside(&self, color: Color) -> bool {
        match color {
            Color::White => self.white_kingside,
            Color::Black => self.black_kingside,
        }
    }

    pub fn queenside(&self, color: Color) -> bool {
        match color {
            Color::White => self.white_queenside,
            Color::Black => self.black_queenside,
        }
    }

    pub fn revoke_kingside(&mut self, color: Color) {
        match color {
            Color::White => self.white_kingside = false,
            Color::Black => self.black_kingside = false,
        }
    }

    pub fn revoke_queenside(&mut self, color: Color) {
        match color {
            Color::White => self.white_queenside = false,
            Color::Black => self.black_queenside = false,
        }
    }

    pub fn revoke_all(&mut self, color: Color) {
        self.revoke_kingside(color);
        self.revoke_queenside(color);
    }
}

impl fmt::Display for CastleRights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut field = String::new();
        if self.white_kingside {
            field.push('K');
        }
        if self.white_queenside {
            field.push('Q');
        }
        if self.black_kingside {
            field.push('k');
        }
        if self.black_queenside {
            field.push('q');
        }
        if field.is_empty() {
            field.push('-');
        }
        write!(f, "{}", field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_flags_from_board() {
        let board = Board::from_layout("3k2/P5/6/2p3/1P4/R2K1R").unwrap();
        // . . . ♚ . .
        // ♙ . . . . .
        // . . . . . .
        // . . ♟ . . .
        // . ♙ . . . .
        // ♖ . . ♔ . ♖
        let promotion = Move::from_board(Square::new(1, 0), Square::new(0, 0), &board).unwrap();
        assert!(promotion.is_pawn_promotion);
        assert!(!promotion.is_capture);

        let capture = Move::from_board(Square::new(4, 1), Square::new(3, 2), &board).unwrap();
        assert!(capture.is_capture);
        assert_eq!(capture.piece_captured, Some(Piece::new(Color::Black, PieceType::Pawn)));
        assert_eq!(capture.to_string(), "bxc3");

        let castle = Move::from_board(Square::new(5, 3), Square::new(5, 5), &board).unwrap();
        assert!(castle.is_castle_move);
        assert!(castle.is_kingside_castle());
        assert!(!castle.is_capture);
        assert_eq!(castle.to_string(), "O-O");

        let long_castle = Move::from_board(Square::new(5, 3), Square::new(5, 1), &board).unwrap();
        assert_eq!(long_castle.to_string(), "O-O-O");

        let rook = Move::from_board(Square::new(5, 0), Square::new(2, 0), &board).unwrap();
        assert_eq!(rook.to_string(), "Ra4");
        assert_eq!(rook.chess_notation(), "a1a4");

        assert!(Move::from_board(Square::new(2, 2), Square::new(3, 3), &board).is_none());
    }

    #[test]
    fn test_move_equality_ignores_pieces() {
        let board = Board::new();
        let a = Move::from_board(Square::new(4, 3), Square::new(3, 3), &board).unwrap();
        let b = Move::new(
            Square::new(4, 3),
            Square::new(3, 3),
            Piece::new(Color::Black, PieceType::Queen),
            &Board::empty(),
        );
        assert_eq!(a, b);
        assert_eq!(a.move_id(), 4333);
        assert_eq!(a.to_string(), "d3");
        assert_eq!(Move::from_notation("d2d3", &board), Some(a));
        assert_eq!(Move::from_notation("d2d", &board), None);
    }

    #[test]
    fn test_castle_rights_field() {
        assert_eq!(CastleRights::from_field("KQkq"), Some(CastleRights::all()));
        assert_eq!(CastleRights::from_field("-"), Some(CastleRights::none()));
        assert_eq!(CastleRights::from_field("x"), None);
        let rights = CastleRights::from_field("Kq").unwrap();
        assert!(rights.kingside(Color::White));
        assert!(!rights.queenside(Color::White));
        assert!(rights.queenside(Color::Black));
        assert_eq!(rights.to_string(), "Kq");
        let mut rights = CastleRights::all();
        rights.revoke_all(Color::Black);
        assert_eq!(rights.to_string(), "KQ");
    }
}
