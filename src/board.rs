use std::fmt;

use itertools::Itertools;

use crate::error::{EngineError, EngineResult};
use crate::types::*;

/// Piece placement of the starting position, written from rank 6 (row 0) down to rank 1.
pub const STARTING_LAYOUT: &str = "rbnkbr/pppppp/6/6/PPPPPP/RBNKBR";

/// A cell is either empty or holds a piece
pub type Cell = Option<Piece>;

/// The 6x6 grid, row-major, row 0 is black's back rank.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Board {
    cells: [Cell; NUM_SQUARES],
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    /// Board in the starting position
    pub fn new() -> Board {
        let mut board = Board::empty();
        let back_rank = [
            PieceType::Rook,
            PieceType::Bishop,
            PieceType::Knight,
            PieceType::King,
            PieceType::Bishop,
            PieceType::Rook,
        ];
        for (col, piece_type) in back_rank.into_iter().enumerate() {
            let col = col as u8;
            board.set(Square::new(0, col), Some(Piece::new(Color::Black, piece_type)));
            board.set(Square::new(1, col), Some(Piece::new(Color::Black, PieceType::Pawn)));
            board.set(Square::new(4, col), Some(Piece::new(Color::White, PieceType::Pawn)));
            board.set(Square::new(5, col), Some(Piece::new(Color::White, piece_type)));
        }
        board
    }

    pub fn empty() -> Board {
        Board {
            cells: [None; NUM_SQUARES],
        }
    }

    /// Parse a placement string: six `/` separated ranks starting at rank 6,
    /// letters for pieces (uppercase white) and digits for runs of empty cells.
    pub fn from_layout(layout: &str) -> EngineResult<Board> {
        let ranks: Vec<&str> = layout.split('/').collect();
        if ranks.len() != DIMENSION {
            return Err(EngineError::InvalidLayout {
                reason: format!("expected {} ranks, found {}", DIMENSION, ranks.len()),
            });
        }

        let mut board = Board::empty();
        for (row, rank) in ranks.iter().enumerate() {
            let mut col = 0usize;
            for c in rank.chars() {
                if let Some(run) = c.to_digit(10) {
                    col += run as usize;
                } else if let Some(piece) = Piece::from_char(c) {
                    if col >= DIMENSION {
                        return Err(EngineError::InvalidLayout {
                            reason: format!("rank {} has too many files", DIMENSION - row),
                        });
                    }
                    board.set(Square::new(row as u8, col as u8), Some(piece));
                    col += 1;
                } else {
                    return Err(EngineError::InvalidLayout {
                        reason: format!("unexpected char {c} in rank {}", DIMENSION - row),
                    });
                }
            }
            if col != DIMENSION {
                return Err(EngineError::InvalidLayout {
                    reason: format!("rank {} does not have {} files", DIMENSION - row, DIMENSION),
                });
            }
        }

        for color in [Color::White, Color::Black] {
            let kings = board
                .pieces()
                .filter(|(_, p)| p.is(color, PieceType::King))
                .count();
            if kings != 1 {
                return Err(EngineError::InvalidLayout {
                    reason: format!("{} must have exactly one king, found {}", color.to_human(), kings),
                });
            }
        }
        Ok(board)
    }

    /// Inverse of `from_layout`
    pub fn to_layout(&self) -> String {
        (0..DIMENSION)
            .map(|row| {
                let mut rank = String::new();
                let mut empty_run = 0;
                for col in 0..DIMENSION {
                    match self.get(Square::new(row as u8, col as u8)) {
                        Some(piece) => {
                            if empty_run > 0 {
                                rank.push_str(&empty_run.to_string());
                                empty_run = 0;
                            }
                            rank.push(piece.to_char());
                        }
                        None => empty_run += 1,
                    }
                }
                if empty_run > 0 {
                    rank.push_str(&empty_run.to_string());
                }
                rank
            })
            .join("/")
    }

    #[inline]
    pub fn get(&self, sq: Square) -> Cell {
        self.cells[sq.index()]
    }

    #[inline]
    pub fn set(&mut self, sq: Square, cell: Cell) {
        self.cells[sq.index()] = cell;
    }

    /// Occupied squares with their pieces, in index order
    pub fn pieces(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter_map(|(i, cell)| cell.map(|p| (Square::from_index(i), p)))
    }

    pub fn find_king(&self, color: Color) -> Option<Square> {
        self.pieces()
            .find(|(_, p)| p.is(color, PieceType::King))
            .map(|(sq, _)| sq)
    }

    /// True when neither side has a rook, bishop, knight or pawn left.
    /// Queens do not count.
    pub fn lacks_mating_material(&self) -> bool {
        !self.pieces().any(|(_, p)| {
            matches!(
                p.piece_type,
                PieceType::Rook | PieceType::Bishop | PieceType::Knight | PieceType::Pawn
            )
        })
    }

    pub fn draw_board(&self) -> String {
        let mut string = String::new();
        for row in 0..DIMENSION {
            string.push((b'0' + (DIMENSION - row) as u8) as char);
            for col in 0..DIMENSION {
                let symbol = match self.get(Square::new(row as u8, col as u8)) {
                    Some(p) => p.to_symbol(),
                    None => ".",
                };
                string = format!("{} {}", string, symbol);
            }
            string.push('\n');
        }
        string.push_str("  a b c d e f\n");
        string
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.cells.chunks(DIMENSION) {
            let line = row
                .iter()
                .map(|cell| match cell {
                    Some(p) => p.code(),
                    None => "--".to_string(),
                })
                .join(" ");
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}
