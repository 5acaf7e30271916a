//! Headless match runner: alternates two agents on one game until it ends, enforcing the
//! per-move time budget and scoring forfeits like any other result.

use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::Write;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::agent::{search_channel, Agent, SearchReport};
use crate::config::MatchConfig;
use crate::error::{EngineError, EngineResult};
use crate::game_state::{ForfeitReason, GameState, Outcome};
use crate::types::{Color, PieceType};

/// Plies without a capture or pawn move before the game is drawn
pub const FIFTY_MOVE_PLIES: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameResult {
    FiftyMoveRule,
    Threefold,
    BlackCheckmate,
    WhiteCheckmate,
    BlackOnTime,
    WhiteOnTime,
    InsufficientMaterial,
    WhiteByIllegalMove,
    BlackByIllegalMove,
    Stalemate,
    MoveCap,
}

impl GameResult {
    pub const ALL: [GameResult; 11] = [
        GameResult::FiftyMoveRule,
        GameResult::Threefold,
        GameResult::BlackCheckmate,
        GameResult::WhiteCheckmate,
        GameResult::BlackOnTime,
        GameResult::WhiteOnTime,
        GameResult::InsufficientMaterial,
        GameResult::WhiteByIllegalMove,
        GameResult::BlackByIllegalMove,
        GameResult::Stalemate,
        GameResult::MoveCap,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            GameResult::FiftyMoveRule => "Draw by 50 move rule",
            GameResult::Threefold => "Draw by threefold position repetition",
            GameResult::BlackCheckmate => "Black wins by checkmate",
            GameResult::WhiteCheckmate => "White wins by checkmate",
            GameResult::BlackOnTime => "Black wins on time",
            GameResult::WhiteOnTime => "White wins on time",
            GameResult::InsufficientMaterial => "Draw by insufficient material",
            GameResult::WhiteByIllegalMove => "White wins by illegal move",
            GameResult::BlackByIllegalMove => "Black wins by illegal move",
            GameResult::Stalemate => "Draw by stalemate",
            GameResult::MoveCap => "Draw by move cap",
        }
    }

    pub fn winner(&self) -> Option<Color> {
        match self {
            GameResult::WhiteCheckmate | GameResult::WhiteOnTime | GameResult::WhiteByIllegalMove => {
                Some(Color::White)
            }
            GameResult::BlackCheckmate | GameResult::BlackOnTime | GameResult::BlackByIllegalMove => {
                Some(Color::Black)
            }
            _ => None,
        }
    }

    /// Result of a finished game, `None` while it goes on
    pub fn from_state(state: &GameState, halfmove_clock: u32) -> Option<GameResult> {
        let result = match state.outcome() {
            Outcome::DrawByRepetition => GameResult::Threefold,
            _ if halfmove_clock >= FIFTY_MOVE_PLIES => GameResult::FiftyMoveRule,
            Outcome::Checkmate {
                winner: Color::White,
            } => GameResult::WhiteCheckmate,
            Outcome::Checkmate {
                winner: Color::Black,
            } => GameResult::BlackCheckmate,
            Outcome::Stalemate => GameResult::Stalemate,
            Outcome::Forfeit { loser, reason } => match (loser, reason) {
                (Color::White, ForfeitReason::Timeout) => GameResult::BlackOnTime,
                (Color::Black, ForfeitReason::Timeout) => GameResult::WhiteOnTime,
                (Color::White, ForfeitReason::IllegalMove) => GameResult::BlackByIllegalMove,
                (Color::Black, ForfeitReason::IllegalMove) => GameResult::WhiteByIllegalMove,
            },
            Outcome::DrawByMaterial => GameResult::InsufficientMaterial,
            Outcome::Ongoing => return None,
        };
        Some(result)
    }
}

impl fmt::Display for GameResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// One finished game
#[derive(Debug, Clone)]
pub struct GameRecord {
    pub result: GameResult,
    pub state: GameState,
    /// Search depth of every move the white agent reported
    pub white_depths: Vec<i32>,
    /// Searches still running when their time budget ran out
    pub stalled_searches: usize,
}

impl GameRecord {
    pub fn plies(&self) -> usize {
        self.state.move_log().len()
    }
}

/// Worker threads whose search was cancelled but had not returned yet
#[derive(Debug, Default)]
struct StalledWorkers {
    running: Vec<JoinHandle<()>>,
    total: usize,
}

impl StalledWorkers {
    fn push(&mut self, handle: JoinHandle<()>) {
        self.total += 1;
        self.running.push(handle);
    }

    /// Join the workers that have returned since, leaving the rest. Returns how many remain.
    fn reap(&mut self) -> usize {
        let (finished, running): (Vec<_>, Vec<_>) =
            self.running.drain(..).partition(|handle| handle.is_finished());
        for handle in finished {
            join_worker(handle);
        }
        self.running = running;
        self.running.len()
    }
}

fn join_worker(handle: JoinHandle<()>) {
    let name = handle.thread().name().unwrap_or("search").to_string();
    if handle.join().is_err() {
        warn!(worker = %name, "search worker panicked");
    }
}

/// Run one search on a worker thread and wait at most `budget` for its last report.
///
/// A worker that returned is joined here; one still running after cancellation goes to
/// `stalled`.
fn run_search(
    agent: &Arc<dyn Agent>,
    state: &GameState,
    budget: Duration,
    stalled: &mut StalledWorkers,
) -> EngineResult<Option<SearchReport>> {
    let (reporter, mut listener) = search_channel();
    let worker = Arc::clone(agent);
    let snapshot = state.clone();
    let handle = thread::Builder::new()
        .name(format!("search-{}", agent.name()))
        .spawn(move || worker.find_best_move(snapshot, reporter))
        .map_err(|err| EngineError::Agent {
            name: agent.name().to_string(),
            reason: err.to_string(),
        })?;

    let report = listener.last_report_before(Instant::now() + budget);
    if listener.worker_done() {
        join_worker(handle);
    } else {
        debug!(agent = agent.name(), "search still running after cancellation");
        stalled.push(handle);
    }
    Ok(report)
}

/// Play one game, `white` against `black`, from the starting position
pub fn play_game(
    white: &Arc<dyn Agent>,
    black: &Arc<dyn Agent>,
    config: &MatchConfig,
) -> EngineResult<GameRecord> {
    let mut state = GameState::with_rules(config.rules);
    let mut halfmove_clock = 0;
    let mut white_depths = Vec::new();
    let mut stalled = StalledWorkers::default();
    state.get_valid_moves();

    let result = loop {
        if let Some(result) = GameResult::from_state(&state, halfmove_clock) {
            break result;
        }
        if config.max_plies > 0 && state.move_log().len() >= config.max_plies {
            break GameResult::MoveCap;
        }

        let side = state.side_to_move();
        let agent = match side {
            Color::White => white,
            Color::Black => black,
        };

        let running = stalled.reap();
        if running > 0 {
            debug!(running, "earlier searches still running");
        }

        let Some(report) = run_search(agent, &state, config.time_control, &mut stalled)? else {
            warn!(agent = agent.name(), side = side.to_human(), "no move within the time budget");
            state.flag_timeout();
            continue;
        };
        if side == Color::White {
            white_depths.push(report.depth);
        }
        debug!(
            side = side.to_human(),
            mv = %report.mv.to_human(),
            depth = report.depth,
            score = report.score,
            "agent move"
        );

        if let Err(err) = state.make_move(&report.mv) {
            warn!(agent = agent.name(), side = side.to_human(), %err, "illegal move");
            state.flag_illegal_move();
            continue;
        }

        if let Some(played) = state.move_log().last() {
            if played.piece_captured.is_none() && played.piece_moved.piece_type != PieceType::Pawn {
                halfmove_clock += 1;
            } else {
                halfmove_clock = 0;
            }
        }
        // refreshes the checkmate and stalemate flags for the next side
        state.get_valid_moves();
    };

    info!(
        white = white.name(),
        black = black.name(),
        plies = state.move_log().len(),
        "{result}"
    );
    // threads can't be killed, whatever is still running is left detached
    let still_running = stalled.reap();
    if stalled.total > 0 {
        warn!(
            stalled = stalled.total,
            still_running, "searches ignored cancellation"
        );
    }
    Ok(GameRecord {
        result,
        state,
        white_depths,
        stalled_searches: stalled.total,
    })
}

/// Tally of results over a match
#[derive(Debug, Clone, Default)]
pub struct ResultTable {
    counts: HashMap<GameResult, usize>,
    depths: Vec<i32>,
    games: usize,
    stalled_searches: usize,
}

impl ResultTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, game: &GameRecord) {
        *self.counts.entry(game.result).or_insert(0) += 1;
        self.depths.extend(&game.white_depths);
        self.games += 1;
        self.stalled_searches += game.stalled_searches;
    }

    pub fn count(&self, result: GameResult) -> usize {
        self.counts.get(&result).copied().unwrap_or(0)
    }

    pub fn games(&self) -> usize {
        self.games
    }

    /// Searches over the whole match that outlived their time budget
    pub fn stalled_searches(&self) -> usize {
        self.stalled_searches
    }

    pub fn wins(&self, color: Color) -> usize {
        self.counts
            .iter()
            .filter(|(result, _)| result.winner() == Some(color))
            .map(|(_, n)| n)
            .sum()
    }

    pub fn draws(&self) -> usize {
        self.games - self.wins(Color::White) - self.wins(Color::Black)
    }

    /// Average search depth reported by the white agent
    pub fn average_depth(&self) -> Option<f64> {
        if self.depths.is_empty() {
            return None;
        }
        Some(self.depths.iter().map(|&d| d as f64).sum::<f64>() / self.depths.len() as f64)
    }
}

impl fmt::Display for ResultTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for result in GameResult::ALL {
            writeln!(f, "{:<40}{:>5}", result.label(), self.count(result))?;
        }
        writeln!(
            f,
            "White {} / Black {} / Draws {} in {} games",
            self.wins(Color::White),
            self.wins(Color::Black),
            self.draws(),
            self.games
        )?;
        if let Some(depth) = self.average_depth() {
            writeln!(f, "avg depth: {:.2}", depth)?;
        }
        if self.stalled_searches > 0 {
            writeln!(f, "stalled searches: {}", self.stalled_searches)?;
        }
        Ok(())
    }
}

/// Play `config.num_games` games with fixed sides, printing and saving the results
pub fn run_match(
    white: &Arc<dyn Agent>,
    black: &Arc<dyn Agent>,
    config: &MatchConfig,
) -> EngineResult<ResultTable> {
    let mut output = match &config.output_file {
        Some(path) => {
            let mut file = File::create(path)?;
            writeln!(
                file,
                "{} vs {}, {} games, {}s per move, started {}",
                white.name(),
                black.name(),
                config.num_games,
                config.time_control.as_secs(),
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
            )?;
            Some(file)
        }
        None => None,
    };

    let mut table = ResultTable::new();
    for game in 1..=config.num_games {
        let record = play_game(white, black, config)?;
        table.record(&record);

        if config.verbose {
            println!("Game {}: {} after {} plies", game, record.result, record.plies());
            println!("{}", record.state.move_log_text());
            println!("Intermediate Results:\n{}", table);
            if let Some(file) = output.as_mut() {
                writeln!(file, "Game {}: {}", game, record.result)?;
                writeln!(file, "{}", record.state.move_log_text())?;
                write!(file, "{}", table)?;
            }
        }
    }

    if table.stalled_searches() > 0 {
        warn!(
            stalled = table.stalled_searches(),
            "some agents kept searching past their time budget"
        );
    }
    println!("Final Results:\n{}", table);
    if let Some(file) = output.as_mut() {
        write!(file, "Final Results:\n{}", table)?;
    }
    Ok(table)
}
