//! Per-piece move rules.
//!
//! Moves produced here respect pins, but apart from the king they do not know about
//! checks; the check filter lives in `game_state`.

use crate::analyzer::{analyze, Pin};
use crate::board::Board;
use crate::moves::Move;
use crate::types::*;

/// Upper bound on moves in a 6x6 position, used to size the buffer once
const MAX_MOVES: usize = 96;

/// Pins found for the side to move, consumed square by square while generating.
///
/// A square's entry is removed the first time it is looked up. Every square is visited
/// once per pass, so nothing is lost, and a fresh scratch is built for every pass.
#[derive(Debug, Clone, Default)]
pub struct PinScratch {
    pins: Vec<Pin>,
}

impl PinScratch {
    pub fn new(pins: Vec<Pin>) -> Self {
        Self { pins }
    }

    /// Remove and return the pin direction for `sq`, if the piece there is pinned
    pub fn take(&mut self, sq: Square) -> Option<Direction> {
        let idx = self.pins.iter().position(|p| p.square == sq)?;
        Some(self.pins.swap_remove(idx).direction)
    }

    pub fn is_empty(&self) -> bool {
        self.pins.is_empty()
    }
}

pub struct MoveGenerator<'a> {
    board: &'a Board,
    color: Color,
    pins: PinScratch,
    /// Whether king steps are checked against attacks. Off when probing what the
    /// opponent attacks, where plain movement rules are wanted.
    king_safety: bool,
    moves: Vec<Move>,
}

impl<'a> MoveGenerator<'a> {
    pub fn new(board: &'a Board, color: Color, pins: PinScratch) -> Self {
        Self {
            board,
            color,
            pins,
            king_safety: true,
            moves: Vec::with_capacity(MAX_MOVES),
        }
    }

    /// Generator for the squares `color` attacks: no pins, no king safety
    pub fn observer(board: &'a Board, color: Color) -> Self {
        Self {
            king_safety: false,
            ..Self::new(board, color, PinScratch::default())
        }
    }

    /// Moves for every piece of the side to move
    pub fn collect(mut self) -> Vec<Move> {
        let board = self.board;
        let color = self.color;
        for (sq, piece) in board.pieces().filter(|(_, p)| p.color == color) {
            let pin = self.pins.take(sq);
            match piece.piece_type {
                PieceType::Pawn => self.pawn_moves(sq, piece, pin),
                PieceType::Rook => self.sliding_moves(sq, piece, pin, &ROOK_DIRECTIONS),
                PieceType::Knight => self.knight_moves(sq, piece, pin),
                PieceType::Bishop => self.sliding_moves(sq, piece, pin, &BISHOP_DIRECTIONS),
                PieceType::Queen => {
                    self.sliding_moves(sq, piece, pin, &ROOK_DIRECTIONS);
                    self.sliding_moves(sq, piece, pin, &BISHOP_DIRECTIONS);
                }
                PieceType::King => self.king_moves(sq, piece),
            }
        }
        self.moves
    }

    /// Only the moves of the king standing on `king`
    pub fn collect_king_moves(mut self, king: Square) -> Vec<Move> {
        if let Some(piece) = self.board.get(king) {
            self.king_moves(king, piece);
        }
        self.moves
    }

    fn is_enemy(&self, sq: Square) -> bool {
        self.board.get(sq).is_some_and(|p| p.color != self.color)
    }

    fn is_ally(&self, sq: Square) -> bool {
        self.board.get(sq).is_some_and(|p| p.color == self.color)
    }

    fn push(&mut self, from: Square, to: Square, piece: Piece) {
        self.moves.push(Move::new(from, to, piece, self.board));
    }

    /// Single step forward onto an empty square, diagonal steps onto enemies.
    /// No double step and no en passant in this variant.
    fn pawn_moves(&mut self, sq: Square, piece: Piece, pin: Option<Direction>) {
        let forward = piece.color.pawn_forward();

        if let Some(target) = sq.offset((forward, 0), 1) {
            let pin_allows = pin.map_or(true, |p| p.1 == 0);
            if self.board.get(target).is_none() && pin_allows {
                self.push(sq, target, piece);
            }
        }

        for side in [-1, 1] {
            let d = (forward, side);
            if let Some(target) = sq.offset(d, 1) {
                let pin_allows = pin.map_or(true, |p| same_axis(p, d));
                if self.is_enemy(target) && pin_allows {
                    self.push(sq, target, piece);
                }
            }
        }
    }

    /// Slide along `directions` until blocked. A pinned slider keeps only its pin axis.
    fn sliding_moves(
        &mut self,
        sq: Square,
        piece: Piece,
        pin: Option<Direction>,
        directions: &[Direction],
    ) {
        for &d in directions {
            if pin.is_some_and(|p| !same_axis(p, d)) {
                continue;
            }
            for distance in 1..DIMENSION as i8 {
                let Some(target) = sq.offset(d, distance) else {
                    break;
                };
                if self.is_ally(target) {
                    break;
                }
                let capture = self.is_enemy(target);
                self.push(sq, target, piece);
                if capture {
                    break;
                }
            }
        }
    }

    /// A pinned knight can never stay on its pin line
    fn knight_moves(&mut self, sq: Square, piece: Piece, pin: Option<Direction>) {
        if pin.is_some() {
            return;
        }
        for offset in KNIGHT_OFFSETS {
            if let Some(target) = sq.offset(offset, 1) {
                if !self.is_ally(target) {
                    self.push(sq, target, piece);
                }
            }
        }
    }

    /// Adjacent squares. With king safety on, every candidate gets a full re-analysis
    /// with the king placed there; the pre-move pins and checks say nothing about it.
    fn king_moves(&mut self, sq: Square, piece: Piece) {
        for d in DIRECTIONS {
            let Some(target) = sq.offset(d, 1) else {
                continue;
            };
            if self.is_ally(target) {
                continue;
            }
            if self.king_safety && analyze(self.board, self.color, target).in_check {
                continue;
            }
            self.push(sq, target, piece);
        }
    }
}
