use rayon::prelude::*;

use crate::game_state::GameState;
use crate::moves::Move;

/// Count the leaf nodes of the legal move tree below `state`, `depth` plies deep.
///
/// Walks the tree with make/undo on a single state, so `state` is back where it started
/// when this returns.
pub fn perft(state: &mut GameState, depth: u8) -> u64 {
    if depth == 0 {
        return 1;
    }

    let moves = state.legal_moves();
    if depth == 1 {
        return moves.len() as u64;
    }

    let mut nodes = 0;
    for m in &moves {
        state.make_move_unchecked(m);
        nodes += perft(state, depth - 1);
        state.undo_move();
    }
    nodes
}

/// Node counts per root move, each subtree searched on its own clone of `state`
pub fn perft_divide(state: &GameState, depth: u8) -> Vec<(Move, u64)> {
    if depth == 0 {
        return Vec::new();
    }
    let mut counts: Vec<(Move, u64)> = state
        .legal_moves()
        .into_par_iter()
        .map(|m| {
            let mut child = state.clone();
            child.make_move_unchecked(&m);
            (m, perft(&mut child, depth - 1))
        })
        .collect();
    counts.sort_by_key(|(m, _)| *m);
    counts
}

/// Perft from the starting position
///
/// | Depth | Nodes |
/// | ----- | ----- |
/// | 0     | 1     |
/// | 1     | 8     |
/// | 2     | 64    |
///
/// Neither side can reach the other in the first two plies, so depth 2 is just 8 * 8.
pub fn expected_start_node_count(depth: u8) -> Option<u64> {
    match depth {
        0 => Some(1),
        1 => Some(8),
        2 => Some(64),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;

    #[test]
    fn perft_start() {
        let mut state = GameState::new();
        for depth in 0..=2 {
            let expected = expected_start_node_count(depth).unwrap();
            assert_eq!(perft(&mut state, depth), expected, "depth {}", depth);
        }
    }

    #[test]
    fn perft_restores_the_state() {
        let mut state = GameState::new();
        perft(&mut state, 3);
        assert_eq!(state.board(), &Board::new());
        assert!(state.move_log().is_empty());
        assert!(state.white_to_move());
        assert_eq!(state.castle_rights_log().len(), 1);
    }

    #[test]
    fn divide_adds_up() {
        let mut state = GameState::new();
        let divided = perft_divide(&state, 3);
        assert_eq!(divided.len(), 8);
        let total: u64 = divided.iter().map(|(_, n)| n).sum();
        assert_eq!(total, perft(&mut state, 3));
    }

    #[test]
    fn lone_kings() {
        // . . . ♚ . .
        // . . . . . .
        // . . . . . .
        // . . . . . .
        // . . . . . .
        // . . . ♔ . .
        let mut state = GameState::from_layout("3k2/6/6/6/6/3K2 w").unwrap();
        assert_eq!(perft(&mut state, 1), 5);
        assert_eq!(perft(&mut state, 2), 25);
    }
}
