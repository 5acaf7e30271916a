//! Check and pin detection by ray casting outward from a king.
//!
//! Every one of the eight rays is walked until it leaves the board or meets an enemy
//! piece. The first allied piece on a ray is remembered as a possible pin; an enemy that
//! can attack along that ray then turns it into a pin, or into a check when nothing stood
//! in between. Knights are probed separately since their checks can't be blocked.

use crate::board::Board;
use crate::types::*;

/// Allied piece that must stay on the line through its king
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pin {
    pub square: Square,
    /// Direction from the king towards the pinned piece
    pub direction: Direction,
}

/// Enemy piece attacking the king
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Check {
    pub square: Square,
    /// Direction from the king towards the checker. For knights this is the jump offset.
    pub direction: Direction,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Analysis {
    pub in_check: bool,
    pub pins: Vec<Pin>,
    pub checks: Vec<Check>,
}

impl Analysis {
    pub fn is_double_check(&self) -> bool {
        self.checks.len() >= 2
    }
}

/// Can an enemy `piece` met at `distance` along direction `d` (seen from the king) attack it?
fn attacks_along(piece: Piece, d: Direction, distance: i8) -> bool {
    match piece.piece_type {
        PieceType::Rook => !is_diagonal(d),
        PieceType::Bishop => is_diagonal(d),
        PieceType::Queen => true,
        PieceType::King => distance == 1,
        // the pawn has to sit one row behind the king, relative to its own direction of travel
        PieceType::Pawn => distance == 1 && is_diagonal(d) && d.0 == -piece.color.pawn_forward(),
        PieceType::Knight => false,
    }
}

/// Find checks and pins against the `color` king, as if it stood on `king`.
///
/// `king` does not have to be where the king actually is: the king generator passes
/// candidate squares. The real king square is treated as empty so that it does not shield
/// the candidate square from a slider.
pub fn analyze(board: &Board, color: Color, king: Square) -> Analysis {
    let mut analysis = Analysis::default();

    for d in DIRECTIONS {
        let mut possible_pin: Option<Pin> = None;
        for distance in 1..DIMENSION as i8 {
            let Some(sq) = king.offset(d, distance) else {
                break;
            };
            let Some(piece) = board.get(sq) else {
                continue;
            };
            if piece.color == color {
                if piece.piece_type == PieceType::King {
                    continue;
                }
                if possible_pin.is_some() {
                    // second allied piece, nothing can come through
                    break;
                }
                possible_pin = Some(Pin { square: sq, direction: d });
                continue;
            }
            if attacks_along(piece, d, distance) {
                match possible_pin {
                    None => {
                        analysis.in_check = true;
                        analysis.checks.push(Check { square: sq, direction: d });
                    }
                    Some(pin) => analysis.pins.push(pin),
                }
            }
            break;
        }
    }

    for offset in KNIGHT_OFFSETS {
        if let Some(sq) = king.offset(offset, 1) {
            if board
                .get(sq)
                .is_some_and(|p| p.is(color.other_color(), PieceType::Knight))
            {
                analysis.in_check = true;
                analysis.checks.push(Check { square: sq, direction: offset });
            }
        }
    }

    analysis
}

/// Whether the `color` king, placed on `king`, would be attacked
pub fn is_attacked(board: &Board, color: Color, king: Square) -> bool {
    analyze(board, color, king).in_check
}
