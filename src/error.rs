//! Error types for the engine and the match runner.
//!
//! Terminal game conditions (checkmate, forfeits, draws) are not errors; they are
//! flags on `GameState`. These errors cover contract violations and I/O.

use thiserror::Error;

use crate::types::PieceType;

#[derive(Error, Debug)]
pub enum EngineError {
    /// `make_move` was handed a move that is not in the legal set
    #[error("Invalid move: {notation} is not legal in this position")]
    InvalidMove { notation: String },

    /// A board layout string could not be parsed
    #[error("Invalid layout: {reason}")]
    InvalidLayout { reason: String },

    /// Pawns and kings are not promotion targets
    #[error("Cannot promote to {piece:?}")]
    InvalidPromotion { piece: PieceType },

    /// Agent could not be resolved or started
    #[error("Agent {name}: {reason}")]
    Agent { name: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type EngineResult<T> = Result<T, EngineError>;
