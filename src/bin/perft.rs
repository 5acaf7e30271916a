//! Perft from a position, split by root move.
//!
//! Usage: cargo run --release --bin perft -- --depth 4 --layout "rbnkbr/pppppp/6/6/PPPPPP/RBNKBR w KQkq"

use std::time::Instant;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use diana_chess::perft::perft_divide;
use diana_chess::GameState;

#[derive(Parser, Debug)]
#[command(name = "perft")]
#[command(about = "Count legal move tree nodes")]
struct Args {
    /// Search depth in plies
    #[arg(short, long, default_value_t = 4)]
    depth: u8,

    /// Position as `<layout> <w|b> [castling]`, the starting position by default
    #[arg(long)]
    layout: Option<String>,
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let args = Args::parse();

    let state = match &args.layout {
        Some(layout) => GameState::from_layout(layout)?,
        None => GameState::new(),
    };
    println!("{}", state.board().draw_board());

    for depth in 1..=args.depth {
        let start = Instant::now();
        let divided = perft_divide(&state, depth);
        let total: u64 = divided.iter().map(|(_, n)| n).sum();
        let elapsed = start.elapsed();
        if depth == args.depth {
            for (mv, nodes) in &divided {
                println!("{}: {}", mv.chess_notation(), nodes);
            }
        }
        info!(depth, nodes = total, ?elapsed, "perft");
    }
    Ok(())
}
