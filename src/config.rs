//! Rule switches for the engine and settings for the match runner.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{EngineError, EngineResult};
use crate::types::PieceType;

/// Variant rules. The default promotes pawns to a rook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rules {
    pub promotion: PieceType,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            promotion: PieceType::Rook,
        }
    }
}

impl Rules {
    pub fn with_promotion(piece: PieceType) -> EngineResult<Self> {
        match piece {
            PieceType::Pawn | PieceType::King => Err(EngineError::InvalidPromotion { piece }),
            _ => Ok(Self { promotion: piece }),
        }
    }
}

/// Settings of a series of games between two agents
#[derive(Debug, Clone)]
pub struct MatchConfig {
    pub num_games: usize,
    /// Thinking time per move
    pub time_control: Duration,
    /// Adjudicate a draw after this many plies, 0 disables the cap
    pub max_plies: usize,
    pub output_file: Option<PathBuf>,
    pub verbose: bool,
    pub rules: Rules,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            num_games: 1,
            time_control: Duration::from_secs(20),
            max_plies: 0,
            output_file: None,
            verbose: false,
            rules: Rules::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_promotes_to_rook() {
        assert_eq!(Rules::default().promotion, PieceType::Rook);
    }

    #[test]
    fn promotion_targets() {
        assert!(Rules::with_promotion(PieceType::Queen).is_ok());
        assert!(Rules::with_promotion(PieceType::Knight).is_ok());
        assert!(matches!(
            Rules::with_promotion(PieceType::King),
            Err(EngineError::InvalidPromotion { .. })
        ));
        assert!(Rules::with_promotion(PieceType::Pawn).is_err());
    }
}
