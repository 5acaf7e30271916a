pub mod types;
pub mod error;
pub mod config;
pub mod board;
pub mod moves;
pub mod analyzer;
pub mod movegen;
pub mod game_state;
pub mod agent;
pub mod driver;
pub mod perft;

pub use config::{MatchConfig, Rules};
pub use error::{EngineError, EngineResult};
pub use game_state::{ForfeitReason, GameState, Outcome};
pub use moves::{CastleRights, Move};
