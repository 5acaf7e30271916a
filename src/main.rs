//! Match runner: pits two agents against each other for a number of games.
//!
//! Usage: cargo run --release -- --agent1 random --agent2 random --num-games 10 --time-control 1

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use color_eyre::eyre::eyre;
use tracing_subscriber::EnvFilter;

use diana_chess::agent::agent_by_name;
use diana_chess::driver::run_match;
use diana_chess::types::PieceType;
use diana_chess::{MatchConfig, Rules};

#[derive(Parser, Debug)]
#[command(name = "diana_chess")]
#[command(about = "Play Diana chess matches between two agents")]
struct MatchArgs {
    /// Agent playing white
    #[arg(long)]
    agent1: String,

    /// Agent playing black. Agents do not switch sides between games.
    #[arg(long)]
    agent2: String,

    /// Number of games to play
    #[arg(long, default_value_t = 1)]
    num_games: usize,

    /// Seconds per move
    #[arg(long, default_value_t = 20)]
    time_control: u64,

    /// File to save results to, overwritten if it exists
    #[arg(long)]
    output_file: Option<PathBuf>,

    /// Print every game and the intermediate results
    #[arg(long)]
    verbose: bool,

    /// Adjudicate a draw after this many plies, 0 for no limit
    #[arg(long, default_value_t = 0)]
    max_plies: usize,

    /// Piece a pawn promotes to (R, N, B or Q)
    #[arg(long, default_value = "R")]
    promote_to: char,

    /// Seed for the random agents
    #[arg(long)]
    seed: Option<u64>,
}

impl MatchArgs {
    fn to_config(&self) -> color_eyre::Result<MatchConfig> {
        let promotion = PieceType::from_char(self.promote_to)
            .ok_or_else(|| eyre!("unknown piece `{}`", self.promote_to))?;
        Ok(MatchConfig {
            num_games: self.num_games,
            time_control: Duration::from_secs(self.time_control),
            max_plies: self.max_plies,
            output_file: self.output_file.clone(),
            verbose: self.verbose,
            rules: Rules::with_promotion(promotion)?,
        })
    }
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let args = MatchArgs::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let config = args.to_config()?;
    // the second agent gets its own stream so both don't mirror each other
    let white = agent_by_name(&args.agent1, args.seed)?;
    let black = agent_by_name(&args.agent2, args.seed.map(|s| s.wrapping_add(1)))?;

    run_match(&white, &black, &config)?;
    Ok(())
}
