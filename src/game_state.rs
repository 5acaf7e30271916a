use std::collections::HashMap;
use std::fmt;

use itertools::Itertools;
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, trace};

use crate::analyzer::{analyze, is_attacked, Analysis, Check, Pin};
use crate::board::Board;
use crate::config::Rules;
use crate::error::{EngineError, EngineResult};
use crate::movegen::{MoveGenerator, PinScratch};
use crate::moves::{CastleRights, Move};
use crate::types::*;

/// Why a side forfeited
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForfeitReason {
    IllegalMove,
    Timeout,
}

/// Game result as read from the terminal flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Ongoing,
    Checkmate { winner: Color },
    Stalemate,
    DrawByMaterial,
    DrawByRepetition,
    Forfeit { loser: Color, reason: ForfeitReason },
}

impl Outcome {
    pub fn is_over(&self) -> bool {
        *self != Outcome::Ongoing
    }
}

/// Full state of one game: board, side to move, castling rights, move log and the
/// terminal flags. Mutated only through `make_move` and `undo_move`.
#[derive(Debug, Clone)]
pub struct GameState {
    board: Board,
    white_to_move: bool,
    white_king: Square,
    black_king: Square,
    castle_rights: CastleRights,
    /// One entry per ply plus the initial rights
    castle_rights_log: Vec<CastleRights>,
    move_log: Vec<Move>,
    /// Occurrences of every board reached by a move
    position_counts: HashMap<Board, u32>,
    /// Result of the last check/pin analysis done by `get_valid_moves`
    analysis: Analysis,
    check_mate: bool,
    stale_mate: bool,
    draw: bool,
    threefold: bool,
    illegal_move_done: bool,
    timed_out: bool,
    rules: Rules,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

impl GameState {
    /// A new game from the starting position, white to move, all castling rights
    pub fn new() -> Self {
        Self::with_rules(Rules::default())
    }

    pub fn with_rules(rules: Rules) -> Self {
        Self::assemble(
            Board::new(),
            true,
            CastleRights::all(),
            rules,
            Square::new(Color::White.back_row() as u8, 3),
            Square::new(Color::Black.back_row() as u8, 3),
        )
    }

    /// Start from an arbitrary position, `"<layout> <w|b> [castling]"`, e.g.
    /// `"rbnkbr/pppppp/6/6/PPPPPP/RBNKBR w KQkq"`. Castling defaults to none.
    pub fn from_layout(position: &str) -> EngineResult<Self> {
        Self::from_layout_with_rules(position, Rules::default())
    }

    pub fn from_layout_with_rules(position: &str, rules: Rules) -> EngineResult<Self> {
        let parts: Vec<&str> = position.split_whitespace().collect();
        if parts.len() < 2 || parts.len() > 3 {
            return Err(EngineError::InvalidLayout {
                reason: "expected `<layout> <side> [castling]`".to_string(),
            });
        }
        let board = Board::from_layout(parts[0])?;
        let side = parts[1]
            .chars()
            .exactly_one()
            .ok()
            .and_then(Color::from_char)
            .ok_or_else(|| EngineError::InvalidLayout {
                reason: format!("side to move must be `w` or `b`, got {}", parts[1]),
            })?;
        let rights = match parts.get(2) {
            Some(field) => CastleRights::from_field(field).ok_or_else(|| EngineError::InvalidLayout {
                reason: format!("bad castling field {field}"),
            })?,
            None => CastleRights::none(),
        };
        Self::from_parts(board, side == Color::White, rights, rules)
    }

    fn from_parts(
        board: Board,
        white_to_move: bool,
        castle_rights: CastleRights,
        rules: Rules,
    ) -> EngineResult<Self> {
        let missing_king = |color: Color| EngineError::InvalidLayout {
            reason: format!("no {} king", color.to_human()),
        };
        let white_king = board
            .find_king(Color::White)
            .ok_or_else(|| missing_king(Color::White))?;
        let black_king = board
            .find_king(Color::Black)
            .ok_or_else(|| missing_king(Color::Black))?;

        // the side that just moved can't have left its king en prise
        let (idle, idle_king) = if white_to_move {
            (Color::Black, black_king)
        } else {
            (Color::White, white_king)
        };
        if is_attacked(&board, idle, idle_king) {
            return Err(EngineError::InvalidLayout {
                reason: format!("{} king can be captured", idle.to_human()),
            });
        }

        Ok(Self::assemble(
            board,
            white_to_move,
            castle_rights,
            rules,
            white_king,
            black_king,
        ))
    }

    fn assemble(
        board: Board,
        white_to_move: bool,
        castle_rights: CastleRights,
        rules: Rules,
        white_king: Square,
        black_king: Square,
    ) -> Self {
        Self {
            board,
            white_to_move,
            white_king,
            black_king,
            castle_rights,
            castle_rights_log: vec![castle_rights],
            move_log: Vec::new(),
            position_counts: HashMap::new(),
            analysis: Analysis::default(),
            check_mate: false,
            stale_mate: false,
            draw: false,
            threefold: false,
            illegal_move_done: false,
            timed_out: false,
            rules,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn white_to_move(&self) -> bool {
        self.white_to_move
    }

    pub fn side_to_move(&self) -> Color {
        if self.white_to_move {
            Color::White
        } else {
            Color::Black
        }
    }

    pub fn king_location(&self, color: Color) -> Square {
        match color {
            Color::White => self.white_king,
            Color::Black => self.black_king,
        }
    }

    pub fn castle_rights(&self) -> CastleRights {
        self.castle_rights
    }

    pub fn castle_rights_log(&self) -> &[CastleRights] {
        &self.castle_rights_log
    }

    pub fn move_log(&self) -> &[Move] {
        &self.move_log
    }

    pub fn rules(&self) -> Rules {
        self.rules
    }

    /// Check status found by the last `get_valid_moves` call
    pub fn in_check(&self) -> bool {
        self.analysis.in_check
    }

    pub fn pins(&self) -> &[Pin] {
        &self.analysis.pins
    }

    pub fn checks(&self) -> &[Check] {
        &self.analysis.checks
    }

    pub fn is_checkmate(&self) -> bool {
        self.check_mate
    }

    pub fn is_stalemate(&self) -> bool {
        self.stale_mate
    }

    /// Draw by insufficient material
    pub fn is_draw(&self) -> bool {
        self.draw
    }

    pub fn is_threefold(&self) -> bool {
        self.threefold
    }

    pub fn illegal_move_done(&self) -> bool {
        self.illegal_move_done
    }

    pub fn timed_out(&self) -> bool {
        self.timed_out
    }

    /// Times the current board has been reached by a move
    pub fn repetitions(&self) -> u32 {
        self.position_counts.get(&self.board).copied().unwrap_or(0)
    }

    /// The side to move played a move outside the legal set and forfeits
    pub fn flag_illegal_move(&mut self) {
        self.illegal_move_done = true;
    }

    /// The side to move ran out of time and forfeits
    pub fn flag_timeout(&mut self) {
        self.timed_out = true;
    }

    pub fn outcome(&self) -> Outcome {
        let to_move = self.side_to_move();
        if self.threefold {
            Outcome::DrawByRepetition
        } else if self.check_mate {
            Outcome::Checkmate {
                winner: to_move.other_color(),
            }
        } else if self.stale_mate {
            Outcome::Stalemate
        } else if self.timed_out {
            Outcome::Forfeit {
                loser: to_move,
                reason: ForfeitReason::Timeout,
            }
        } else if self.draw {
            Outcome::DrawByMaterial
        } else if self.illegal_move_done {
            Outcome::Forfeit {
                loser: to_move,
                reason: ForfeitReason::IllegalMove,
            }
        } else {
            Outcome::Ongoing
        }
    }

    pub fn is_over(&self) -> bool {
        self.outcome().is_over()
    }

    /// All legal moves for the side to move, in random order.
    ///
    /// Recomputes checks and pins, and sets the checkmate or stalemate flag when
    /// there is no legal move.
    pub fn get_valid_moves(&mut self) -> Vec<Move> {
        self.get_valid_moves_with(&mut rand::thread_rng())
    }

    /// `get_valid_moves` with a caller supplied source of randomness for the shuffle
    pub fn get_valid_moves_with<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Vec<Move> {
        let (analysis, mut moves) = self.generate_legal_moves();
        if moves.is_empty() {
            if analysis.in_check {
                debug!(side = self.side_to_move().to_human(), "checkmate");
                self.check_mate = true;
            } else {
                debug!(side = self.side_to_move().to_human(), "stalemate");
                self.stale_mate = true;
            }
        }
        self.analysis = analysis;
        moves.shuffle(rng);
        moves
    }

    /// Legal moves in generation order, without touching any flag
    pub fn legal_moves(&self) -> Vec<Move> {
        self.generate_legal_moves().1
    }

    fn generate_legal_moves(&self) -> (Analysis, Vec<Move>) {
        let color = self.side_to_move();
        let king = self.king_location(color);
        let analysis = analyze(&self.board, color, king);

        let moves = if !analysis.in_check {
            let mut moves =
                MoveGenerator::new(&self.board, color, PinScratch::new(analysis.pins.clone()))
                    .collect();
            self.castle_moves(king, color, &mut moves);
            moves
        } else if !analysis.is_double_check() {
            // block the check, capture the checker, or move the king
            let valid_squares = self.interposing_squares(king, analysis.checks[0]);
            MoveGenerator::new(&self.board, color, PinScratch::new(analysis.pins.clone()))
                .collect()
                .into_iter()
                .filter(|m| {
                    m.piece_moved.piece_type == PieceType::King || valid_squares.contains(&m.to)
                })
                .collect()
        } else {
            // double check, king has to move
            MoveGenerator::new(&self.board, color, PinScratch::default()).collect_king_moves(king)
        };
        (analysis, moves)
    }

    /// Squares from the king (exclusive) up to the checking piece (inclusive).
    /// A knight check can only be answered on the knight's own square.
    fn interposing_squares(&self, king: Square, check: Check) -> Vec<Square> {
        let checker = self.board.get(check.square);
        if checker.is_some_and(|p| p.piece_type == PieceType::Knight) {
            return vec![check.square];
        }
        let mut squares = Vec::with_capacity(DIMENSION);
        for distance in 1..DIMENSION as i8 {
            let Some(sq) = king.offset(check.direction, distance) else {
                break;
            };
            squares.push(sq);
            if sq == check.square {
                break;
            }
        }
        squares
    }

    /// Is `sq` attacked by the opponent of `color`?
    ///
    /// Runs the opponent's move rules over the current board. Pawn pushes are not
    /// attacks, so pawns are tested on their capture diagonals instead.
    pub fn square_under_attack(&self, sq: Square, color: Color) -> bool {
        let enemy = color.other_color();
        let pawn_attack = [-1, 1].into_iter().any(|side| {
            sq.offset((-enemy.pawn_forward(), side), 1)
                .and_then(|from| self.board.get(from))
                .is_some_and(|p| p.is(enemy, PieceType::Pawn))
        });
        if pawn_attack {
            return true;
        }
        MoveGenerator::observer(&self.board, enemy)
            .collect()
            .iter()
            .any(|m| m.piece_moved.piece_type != PieceType::Pawn && m.to == sq)
    }

    /// Castling candidates for a king that is not in check. The king walks two files
    /// towards the rook; kingside it lands on the rook's own square.
    fn castle_moves(&self, king: Square, color: Color, moves: &mut Vec<Move>) {
        let row = color.back_row() as u8;
        if king != Square::new(row, 3) {
            return;
        }
        let Some(king_piece) = self.board.get(king) else {
            return;
        };
        let rook = Some(Piece::new(color, PieceType::Rook));

        if self.castle_rights.kingside(color)
            && self.board.get(Square::new(row, 5)) == rook
            && self.board.get(Square::new(row, 4)).is_none()
            && !self.square_under_attack(Square::new(row, 4), color)
            && !self.square_under_attack(Square::new(row, 5), color)
        {
            moves.push(Move::new(king, Square::new(row, 5), king_piece, &self.board));
        }

        if self.castle_rights.queenside(color)
            && self.board.get(Square::new(row, 0)) == rook
            && self.board.get(Square::new(row, 1)).is_none()
            && self.board.get(Square::new(row, 2)).is_none()
            && !self.square_under_attack(Square::new(row, 2), color)
            && !self.square_under_attack(Square::new(row, 1), color)
        {
            moves.push(Move::new(king, Square::new(row, 1), king_piece, &self.board));
        }
    }

    /// Play `mv` after checking it is legal. The state is untouched on error.
    pub fn make_move(&mut self, mv: &Move) -> EngineResult<()> {
        let legal = self
            .legal_moves()
            .into_iter()
            .find(|m| m == mv)
            .ok_or_else(|| EngineError::InvalidMove {
                notation: mv.chess_notation(),
            })?;
        self.make_move_unchecked(&legal);
        Ok(())
    }

    /// Play `mv`, which must come from the legal move set of this exact position.
    /// Anything else corrupts the state; used by search and perft.
    pub fn make_move_unchecked(&mut self, mv: &Move) {
        let color = mv.piece_moved.color;
        self.board.set(mv.from, None);
        let placed = if mv.is_pawn_promotion {
            Piece::new(color, self.rules.promotion)
        } else {
            mv.piece_moved
        };
        self.board.set(mv.to, Some(placed));
        self.white_to_move = !self.white_to_move;

        if mv.piece_moved.piece_type == PieceType::King {
            match color {
                Color::White => self.white_king = mv.to,
                Color::Black => self.black_king = mv.to,
            }
        }

        if mv.is_castle_move {
            let row = mv.to.row;
            if mv.is_kingside_castle() {
                self.board
                    .set(Square::new(row, mv.to.col - 1), Some(Piece::new(color, PieceType::Rook)));
            } else {
                let corner = Square::new(row, 0);
                self.board.set(Square::new(row, mv.to.col + 1), self.board.get(corner));
                self.board.set(corner, None);
            }
        }

        self.update_castle_rights(mv);
        self.castle_rights_log.push(self.castle_rights);
        self.move_log.push(*mv);

        let count = self.position_counts.entry(self.board.clone()).or_insert(0);
        *count += 1;
        if *count >= 3 && !self.threefold {
            debug!(ply = self.move_log.len(), "threefold repetition");
            self.threefold = true;
        }

        let draw = self.board.lacks_mating_material();
        if draw && !self.draw {
            debug!(ply = self.move_log.len(), "insufficient material");
        }
        self.draw = draw;
    }

    /// Revert the last move; nothing happens when no move was made.
    ///
    /// Clears the checkmate and stalemate flags. The repetition and material draw
    /// flags are left as they are.
    pub fn undo_move(&mut self) -> Option<Move> {
        let mv = self.move_log.pop()?;

        if let Some(count) = self.position_counts.get_mut(&self.board) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                self.position_counts.remove(&self.board);
            }
        }

        let color = mv.piece_moved.color;
        self.board.set(mv.from, Some(mv.piece_moved));
        self.board.set(mv.to, mv.piece_captured);
        self.white_to_move = !self.white_to_move;

        if mv.piece_moved.piece_type == PieceType::King {
            match color {
                Color::White => self.white_king = mv.from,
                Color::Black => self.black_king = mv.from,
            }
        }

        self.castle_rights_log.pop();
        if let Some(previous) = self.castle_rights_log.last() {
            self.castle_rights = *previous;
        }

        if mv.is_castle_move {
            let row = mv.to.row;
            if mv.is_kingside_castle() {
                let rook_square = Square::new(row, mv.to.col - 1);
                self.board.set(mv.to, self.board.get(rook_square));
                self.board.set(rook_square, None);
            } else {
                let rook_square = Square::new(row, mv.to.col + 1);
                self.board.set(Square::new(row, 0), self.board.get(rook_square));
                self.board.set(rook_square, None);
            }
        }

        self.check_mate = false;
        self.stale_mate = false;
        Some(mv)
    }

    /// A king move drops both rights of its color, a rook leaving its corner drops that
    /// wing, and a rook captured on its corner drops the wing for its owner.
    fn update_castle_rights(&mut self, mv: &Move) {
        let color = mv.piece_moved.color;
        match mv.piece_moved.piece_type {
            PieceType::King => self.castle_rights.revoke_all(color),
            PieceType::Rook if mv.from.row as usize == color.back_row() => {
                self.revoke_wing(color, mv.from.col);
            }
            _ => {}
        }

        if let Some(captured) = mv.piece_captured {
            if captured.piece_type == PieceType::Rook
                && mv.to.row as usize == captured.color.back_row()
            {
                self.revoke_wing(captured.color, mv.to.col);
            }
        }
    }

    fn revoke_wing(&mut self, color: Color, col: u8) {
        if col == 0 {
            trace!(color = color.to_human(), "queenside castling revoked");
            self.castle_rights.revoke_queenside(color);
        } else if col as usize == DIMENSION - 1 {
            trace!(color = color.to_human(), "kingside castling revoked");
            self.castle_rights.revoke_kingside(color);
        }
    }

    /// Numbered move list, `1. d3 c4 2. Nb3 Nb4`
    pub fn move_log_text(&self) -> String {
        self.move_log
            .chunks(2)
            .enumerate()
            .map(|(i, pair)| format!("{}. {}", i + 1, pair.iter().join(" ")))
            .join(" ")
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.board)?;
        writeln!(
            f,
            "{} to move, castling {}",
            self.side_to_move().to_human(),
            self.castle_rights
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn play(state: &mut GameState, notation: &str) {
        let mv = Move::from_notation(notation, state.board()).unwrap();
        state.make_move(&mv).unwrap();
    }

    fn sorted_notation(moves: &[Move]) -> Vec<String> {
        let mut moves: Vec<String> = moves.iter().map(|m| m.chess_notation()).collect();
        moves.sort();
        moves
    }

    fn find(moves: &[Move], notation: &str) -> Option<Move> {
        moves.iter().copied().find(|m| m.chess_notation() == notation)
    }

    #[test]
    fn starting_position_moves() {
        let mut state = GameState::new();
        let moves = state.get_valid_moves();
        assert_eq!(
            sorted_notation(&moves),
            vec!["a2a3", "b2b3", "c1b3", "c1d3", "c2c3", "d2d3", "e2e3", "f2f3"]
        );
        assert!(!state.in_check());
        assert!(!state.is_checkmate());
        assert!(!state.is_stalemate());
        assert_eq!(state.outcome(), Outcome::Ongoing);
    }

    #[test]
    fn shuffle_is_a_permutation() {
        let mut state = GameState::new();
        let mut rng = StdRng::seed_from_u64(7);
        let shuffled = state.get_valid_moves_with(&mut rng);
        assert_eq!(sorted_notation(&shuffled), sorted_notation(&state.legal_moves()));
    }

    #[test]
    fn make_and_undo_round_trip() {
        let mut state = GameState::new();
        let before = state.clone();
        play(&mut state, "c1b3");
        assert!(!state.white_to_move());
        assert_eq!(state.move_log().len(), 1);
        let undone = state.undo_move().unwrap();
        assert_eq!(undone.chess_notation(), "c1b3");
        assert_eq!(state.board(), before.board());
        assert_eq!(state.white_to_move(), before.white_to_move());
        assert_eq!(state.castle_rights(), before.castle_rights());
        assert_eq!(state.castle_rights_log(), before.castle_rights_log());
        assert!(state.move_log().is_empty());
    }

    #[test]
    fn undo_without_moves_is_a_no_op() {
        let mut state = GameState::new();
        assert!(state.undo_move().is_none());
        assert_eq!(state.board(), &Board::new());
        assert!(state.white_to_move());
    }

    #[test]
    fn illegal_move_is_rejected() {
        let mut state = GameState::new();
        let double_step = Move::from_notation("d2d4", state.board()).unwrap();
        assert!(matches!(
            state.make_move(&double_step),
            Err(EngineError::InvalidMove { .. })
        ));
        assert_eq!(state.board(), &Board::new());
        assert!(state.move_log().is_empty());
        assert!(state.white_to_move());
    }

    #[test]
    fn checkmate_sets_flag() {
        // ♚ . . . . ♖
        // . . . . . ♖
        // . . . . . .
        // . . . . . .
        // . . . . . .
        // . . . ♔ . .
        let mut state = GameState::from_layout("k4R/5R/6/6/6/3K2 b").unwrap();
        assert!(state.get_valid_moves().is_empty());
        assert!(state.in_check());
        assert!(state.is_checkmate());
        assert!(!state.is_stalemate());
        assert_eq!(
            state.outcome(),
            Outcome::Checkmate {
                winner: Color::White
            }
        );
    }

    #[test]
    fn stalemate_sets_flag() {
        // ♚ . . . . .
        // . . . . . ♖
        // . ♖ . . . .
        // . . . . . .
        // . . . . . .
        // . . . ♔ . .
        let mut state = GameState::from_layout("k5/5R/1R4/6/6/3K2 b").unwrap();
        assert!(state.get_valid_moves().is_empty());
        assert!(!state.in_check());
        assert!(state.is_stalemate());
        assert!(!state.is_checkmate());
        assert_eq!(state.outcome(), Outcome::Stalemate);
    }

    #[test]
    fn undo_clears_mate_flags() {
        let mut state = GameState::from_layout("k5/5R/2R3/6/6/3K2 w").unwrap();
        // Rc4-b4 stalemates the black king
        play(&mut state, "c4b4");
        assert!(state.get_valid_moves().is_empty());
        assert!(state.is_stalemate());
        state.undo_move();
        assert!(!state.is_stalemate());
        assert!(!state.is_checkmate());
    }

    #[test]
    fn double_check_only_king_moves() {
        // . . . ♚ . .
        // . . . . . .
        // . . . . . .
        // . . ♞ . . .
        // . . . . . .
        // ♜ . . ♔ ♗ .
        let mut state = GameState::from_layout("3k2/6/6/2n3/6/r2KB1 w").unwrap();
        let moves = state.get_valid_moves();
        assert_eq!(state.checks().len(), 2);
        assert!(moves.iter().all(|m| m.piece_moved.piece_type == PieceType::King));
        assert_eq!(sorted_notation(&moves), vec!["d1c2", "d1d2"]);
    }

    #[test]
    fn single_check_block_or_capture() {
        // . . . ♚ . .
        // . . . . . .
        // . . . . . .
        // . ♘ . . . .
        // . . . . ♙ .
        // ♜ . . ♔ . .
        let mut state = GameState::from_layout("3k2/6/6/1N4/4P1/r2K2 w").unwrap();
        let moves = state.get_valid_moves();
        let non_king: Vec<Move> = moves
            .iter()
            .copied()
            .filter(|m| m.piece_moved.piece_type != PieceType::King)
            .collect();
        assert_eq!(sorted_notation(&non_king), vec!["b3a1", "b3c1"]);
        let king: Vec<Move> = moves
            .iter()
            .copied()
            .filter(|m| m.piece_moved.piece_type == PieceType::King)
            .collect();
        assert_eq!(sorted_notation(&king), vec!["d1c2", "d1d2"]);
    }

    #[test]
    fn knight_check_can_only_be_captured() {
        // a knight check is answered by taking the knight or moving the king
        let mut state = GameState::from_layout("3k2/6/6/2n2R/6/3K2 w").unwrap();
        let moves = state.get_valid_moves();
        let non_king: Vec<Move> = moves
            .iter()
            .copied()
            .filter(|m| m.piece_moved.piece_type != PieceType::King)
            .collect();
        assert_eq!(sorted_notation(&non_king), vec!["f3c3"]);
    }

    #[test]
    fn castling_both_wings() {
        let mut state = GameState::from_layout("rbnkbr/pppppp/6/6/PPPPPP/R2K1R w KQkq").unwrap();
        let moves = state.get_valid_moves();
        let castles: Vec<String> = moves
            .iter()
            .filter(|m| m.is_castle_move)
            .map(|m| m.to_string())
            .sorted()
            .collect();
        assert_eq!(castles, vec!["O-O", "O-O-O"]);

        let short = find(&moves, "d1f1").unwrap();
        let before = state.clone();
        state.make_move(&short).unwrap();
        assert_eq!(
            state.board().get(Square::new(5, 5)),
            Some(Piece::new(Color::White, PieceType::King))
        );
        assert_eq!(
            state.board().get(Square::new(5, 4)),
            Some(Piece::new(Color::White, PieceType::Rook))
        );
        assert_eq!(state.board().get(Square::new(5, 3)), None);
        assert_eq!(state.king_location(Color::White), Square::new(5, 5));
        assert!(!state.castle_rights().kingside(Color::White));
        assert!(!state.castle_rights().queenside(Color::White));
        assert!(state.castle_rights().kingside(Color::Black));

        state.undo_move();
        assert_eq!(state.board(), before.board());
        assert_eq!(state.king_location(Color::White), Square::new(5, 3));
        assert_eq!(state.castle_rights(), CastleRights::all());

        let long = find(&moves, "d1b1").unwrap();
        state.make_move(&long).unwrap();
        assert_eq!(
            state.board().get(Square::new(5, 1)),
            Some(Piece::new(Color::White, PieceType::King))
        );
        assert_eq!(
            state.board().get(Square::new(5, 2)),
            Some(Piece::new(Color::White, PieceType::Rook))
        );
        assert_eq!(state.board().get(Square::new(5, 0)), None);
        state.undo_move();
        assert_eq!(state.board(), before.board());
    }

    #[test]
    fn castling_through_or_onto_attacked_squares() {
        // rook on the e file covers the kingside transit square
        let mut state = GameState::from_layout("3k2/4r1/6/6/6/R2K1R w KQ").unwrap();
        let castles: Vec<String> = state
            .get_valid_moves()
            .iter()
            .filter(|m| m.is_castle_move)
            .map(|m| m.to_string())
            .collect();
        assert_eq!(castles, vec!["O-O-O"]);

        // bishop eyes the rook on f1, where the king would land
        let mut state = GameState::from_layout("3k2/6/2b3/6/6/R2K1R w KQ").unwrap();
        let castles: Vec<String> = state
            .get_valid_moves()
            .iter()
            .filter(|m| m.is_castle_move)
            .map(|m| m.to_string())
            .collect();
        assert_eq!(castles, vec!["O-O-O"]);

        // pawn on f2 attacks e1 diagonally
        let mut state = GameState::from_layout("3k2/6/6/6/5p/R2K1R w KQ").unwrap();
        assert!(state.square_under_attack(Square::new(5, 4), Color::White));
        let castles: Vec<String> = state
            .get_valid_moves()
            .iter()
            .filter(|m| m.is_castle_move)
            .map(|m| m.to_string())
            .collect();
        assert_eq!(castles, vec!["O-O-O"]);
    }

    #[test]
    fn no_castling_out_of_check() {
        let mut state = GameState::from_layout("3rk1/6/6/6/6/R2K1R w KQ").unwrap();
        let moves = state.get_valid_moves();
        assert!(state.in_check());
        assert!(moves.iter().all(|m| !m.is_castle_move));
    }

    #[test]
    fn rook_move_revokes_and_undo_restores() {
        let mut state = GameState::from_layout("3k2/6/6/6/6/R2K1R w KQ").unwrap();
        play(&mut state, "a1a3");
        assert!(!state.castle_rights().queenside(Color::White));
        assert!(state.castle_rights().kingside(Color::White));
        state.undo_move();
        assert!(state.castle_rights().queenside(Color::White));
    }

    #[test]
    fn capturing_a_cornered_rook_revokes_its_right() {
        let mut state = GameState::from_layout("3k1r/6/6/6/6/R2K1R w KQk").unwrap();
        play(&mut state, "f1f6");
        let rights = state.castle_rights();
        assert!(!rights.kingside(Color::Black));
        assert!(!rights.kingside(Color::White));
        assert!(rights.queenside(Color::White));
        state.undo_move();
        assert!(state.castle_rights().kingside(Color::Black));
        assert_eq!(
            state.board().get(Square::new(0, 5)),
            Some(Piece::new(Color::Black, PieceType::Rook))
        );
    }

    #[test]
    fn promotion_defaults_to_rook() {
        let mut state = GameState::from_layout("3k2/P5/6/6/6/3K2 w").unwrap();
        let moves = state.get_valid_moves();
        let promotion = find(&moves, "a5a6").unwrap();
        assert!(promotion.is_pawn_promotion);
        state.make_move(&promotion).unwrap();
        assert_eq!(
            state.board().get(Square::new(0, 0)),
            Some(Piece::new(Color::White, PieceType::Rook))
        );
        state.undo_move();
        assert_eq!(
            state.board().get(Square::new(1, 0)),
            Some(Piece::new(Color::White, PieceType::Pawn))
        );
        assert_eq!(state.board().get(Square::new(0, 0)), None);
    }

    #[test]
    fn promotion_policy_is_configurable() {
        let rules = Rules::with_promotion(PieceType::Queen).unwrap();
        let mut state = GameState::from_layout_with_rules("3k2/P5/6/6/6/3K2 w", rules).unwrap();
        play(&mut state, "a5a6");
        assert_eq!(
            state.board().get(Square::new(0, 0)),
            Some(Piece::new(Color::White, PieceType::Queen))
        );
    }

    #[test]
    fn threefold_on_third_occurrence() {
        let mut state = GameState::new();
        let shuffle = ["c1b3", "c6b4", "b3c1", "b4c6"];
        for (ply, notation) in shuffle.iter().cycle().take(8).enumerate() {
            play(&mut state, notation);
            assert!(!state.is_threefold(), "flagged early at ply {}", ply + 1);
        }
        // the position after Nb3 now appears for the third time
        play(&mut state, "c1b3");
        assert!(state.is_threefold());
        assert_eq!(state.repetitions(), 3);
        assert_eq!(state.outcome(), Outcome::DrawByRepetition);

        // undo keeps the flag
        state.undo_move();
        assert!(state.is_threefold());
    }

    #[test]
    fn insufficient_material_draw() {
        // the white king takes the last pawn
        let mut state = GameState::from_layout("3k2/6/6/6/3p2/3K2 w").unwrap();
        play(&mut state, "d1d2");
        assert!(state.is_draw());
        assert_eq!(state.outcome(), Outcome::DrawByMaterial);
        // undo keeps the flag
        state.undo_move();
        assert!(state.is_draw());

        // a rook on the board is still mating material
        let mut state = GameState::from_layout("3k2/6/6/6/3p2/3K1R w").unwrap();
        play(&mut state, "d1d2");
        assert!(!state.is_draw());
    }

    #[test]
    fn forfeit_flags() {
        let mut state = GameState::new();
        state.flag_illegal_move();
        assert_eq!(
            state.outcome(),
            Outcome::Forfeit {
                loser: Color::White,
                reason: ForfeitReason::IllegalMove
            }
        );
        state.flag_timeout();
        assert_eq!(
            state.outcome(),
            Outcome::Forfeit {
                loser: Color::White,
                reason: ForfeitReason::Timeout
            }
        );
        assert!(state.is_over());
    }

    #[test]
    fn layout_errors() {
        assert!(GameState::from_layout("3k2/6/6/6/6/3K2").is_err());
        assert!(GameState::from_layout("3k2/6/6/6/6/3K2 x").is_err());
        assert!(GameState::from_layout("3k2/6/6/6/6/3K2 w KX").is_err());
        // white to move with the black king already attacked by the d1 rook
        assert!(matches!(
            GameState::from_layout("3k2/6/6/6/6/3RK1 w"),
            Err(EngineError::InvalidLayout { .. })
        ));
        assert!(GameState::from_layout("3k2/6/6/6/6/3RK1 b").is_ok());
        let state = GameState::from_layout("3k2/6/6/6/6/3K2 b").unwrap();
        assert_eq!(state.side_to_move(), Color::Black);
        assert_eq!(state.castle_rights(), CastleRights::none());
        assert_eq!(state.king_location(Color::Black), Square::new(0, 3));
    }

    #[test]
    fn move_log_text() {
        let mut state = GameState::new();
        for notation in ["d2d3", "c5c4", "d3c4"] {
            play(&mut state, notation);
        }
        assert_eq!(state.move_log_text(), "1. d3 c4 2. dxc4");
    }
}
