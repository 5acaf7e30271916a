//! Players that pick moves for one side.
//!
//! An agent runs on its own worker thread with a private copy of the game and talks to the
//! driver only through a [`SearchReporter`]: it may report as many candidate moves as it
//! likes, the driver keeps the last one it received before the time budget ran out.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::{EngineError, EngineResult};
use crate::game_state::GameState;
use crate::moves::Move;

/// A move proposed by an agent, with the score and depth its search reached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchReport {
    pub mv: Move,
    pub score: i32,
    pub depth: i32,
}

/// Worker side of a search: sends reports and watches for cancellation
#[derive(Debug, Clone)]
pub struct SearchReporter {
    sender: Sender<SearchReport>,
    cancelled: Arc<AtomicBool>,
}

/// Driver side of a search
#[derive(Debug)]
pub struct SearchListener {
    receiver: Receiver<SearchReport>,
    cancelled: Arc<AtomicBool>,
    worker_done: bool,
}

/// Connected reporter and listener for one search
pub fn search_channel() -> (SearchReporter, SearchListener) {
    let (sender, receiver) = crossbeam_channel::unbounded();
    let cancelled = Arc::new(AtomicBool::new(false));
    (
        SearchReporter {
            sender,
            cancelled: Arc::clone(&cancelled),
        },
        SearchListener {
            receiver,
            cancelled,
            worker_done: false,
        },
    )
}

impl SearchReporter {
    /// Queue a candidate move. Returns false once the driver stopped listening.
    pub fn report(&self, mv: Move, score: i32, depth: i32) -> bool {
        self.sender.send(SearchReport { mv, score, depth }).is_ok()
    }

    /// Cooperative agents should stop searching when this turns true
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

impl SearchListener {
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Collect reports until the worker finishes or `deadline` passes, then cancel the
    /// search and return the last report seen, if any.
    pub fn last_report_before(&mut self, deadline: Instant) -> Option<SearchReport> {
        let mut last = None;
        loop {
            match self.receiver.recv_deadline(deadline) {
                Ok(report) => last = Some(report),
                // every reporter was dropped, the worker is done
                Err(RecvTimeoutError::Disconnected) => {
                    self.worker_done = true;
                    break;
                }
                Err(RecvTimeoutError::Timeout) => {
                    self.cancel();
                    break;
                }
            }
        }
        // anything that slipped in right at the deadline
        self.receiver.try_iter().last().or(last)
    }

    /// True once the worker dropped its reporter, that is its search returned
    pub fn worker_done(&self) -> bool {
        self.worker_done
    }
}

pub trait Agent: Send + Sync {
    fn name(&self) -> &str;

    /// Search `state` and report moves through `reporter`. The state is the agent's own
    /// copy; the driver never sees changes made to it.
    fn find_best_move(&self, state: GameState, reporter: SearchReporter);
}

/// Plays a uniformly random legal move
#[derive(Debug)]
pub struct RandomAgent {
    rng: Mutex<StdRng>,
}

impl RandomAgent {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Default for RandomAgent {
    fn default() -> Self {
        Self::new()
    }
}

impl Agent for RandomAgent {
    fn name(&self) -> &str {
        "random"
    }

    fn find_best_move(&self, mut state: GameState, reporter: SearchReporter) {
        // the rng stays usable if another search panicked
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let moves = state.get_valid_moves_with(&mut *rng);
        if let Some(mv) = moves.choose(&mut *rng) {
            reporter.report(*mv, -1, -1);
        }
    }
}

/// Look up a built-in agent by name
pub fn agent_by_name(name: &str, seed: Option<u64>) -> EngineResult<Arc<dyn Agent>> {
    match name.to_lowercase().as_str() {
        "random" | "mrrandom" => {
            let agent = match seed {
                Some(seed) => RandomAgent::seeded(seed),
                None => RandomAgent::new(),
            };
            Ok(Arc::new(agent))
        }
        _ => Err(EngineError::Agent {
            name: name.to_string(),
            reason: "unknown agent".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn random_agent_reports_a_legal_move() {
        let state = GameState::new();
        let legal = state.legal_moves();
        let (reporter, mut listener) = search_channel();
        RandomAgent::seeded(3).find_best_move(state, reporter);
        let report = listener
            .last_report_before(Instant::now() + Duration::from_secs(1))
            .unwrap();
        assert!(legal.contains(&report.mv));
        assert_eq!(report.score, -1);
        assert_eq!(report.depth, -1);
    }

    #[test]
    fn seeded_agents_agree() {
        let a = RandomAgent::seeded(11);
        let b = RandomAgent::seeded(11);
        for _ in 0..5 {
            let (ra, mut la) = search_channel();
            let (rb, mut lb) = search_channel();
            a.find_best_move(GameState::new(), ra);
            b.find_best_move(GameState::new(), rb);
            let deadline = Instant::now() + Duration::from_secs(1);
            assert_eq!(
                la.last_report_before(deadline),
                lb.last_report_before(deadline)
            );
        }
    }

    #[test]
    fn listener_keeps_the_last_report() {
        let state = GameState::new();
        let moves = state.legal_moves();
        let (reporter, mut listener) = search_channel();
        reporter.report(moves[0], 10, 1);
        reporter.report(moves[1], 20, 2);
        drop(reporter);
        let report = listener.last_report_before(Instant::now()).unwrap();
        assert_eq!(report.mv, moves[1]);
        assert_eq!(report.depth, 2);
        assert!(listener.worker_done());
    }

    #[test]
    fn listener_cancels_a_slow_worker() {
        let (reporter, mut listener) = search_channel();
        let worker = thread::spawn(move || {
            while !reporter.is_cancelled() {
                thread::sleep(Duration::from_millis(5));
            }
        });
        let report = listener.last_report_before(Instant::now() + Duration::from_millis(30));
        assert!(report.is_none());
        assert!(!listener.worker_done());
        worker.join().unwrap();
    }

    #[test]
    fn unknown_agent_name() {
        assert!(agent_by_name("random", Some(1)).is_ok());
        assert!(agent_by_name("MrRandom", None).is_ok());
        assert!(matches!(
            agent_by_name("deep-thought", None),
            Err(EngineError::Agent { .. })
        ));
    }
}
