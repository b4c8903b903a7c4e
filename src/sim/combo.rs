//! Merge detection
//!
//! A tile looks at its four neighbors in a fixed order and merges with the
//! first one the combination table knows about. Only one merge is picked
//! per check; chains happen by checking again from the merged tile.

use super::grid::{Board, Cell};
use crate::consts::MAX_TILE;
use crate::tuning::{ComboRule, ComboTable};

/// Neighbor scan order as (row, col) offsets: left, right, up, down
pub const NEIGHBOR_ORDER: [(isize, isize); 4] = [(0, -1), (0, 1), (-1, 0), (1, 0)];

/// A merge about to happen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Merge {
    /// Tile the check started from
    pub source: Cell,
    /// Neighbor it combines with
    pub neighbor: Cell,
    /// Where the result lands: the lower of the two rows, in the source column
    pub target: Cell,
    pub rule: ComboRule,
}

/// Find the merge for the tile at `at`, if any
pub fn find_merge(board: &Board, combos: &ComboTable, at: Cell) -> Option<Merge> {
    let value = board.get(at)?;
    if value == 0 || value >= MAX_TILE {
        return None;
    }

    NEIGHBOR_ORDER.iter().find_map(|&(d_row, d_col)| {
        let neighbor = at.offset(d_row, d_col)?;
        let other = board.get(neighbor)?;
        if other == 0 {
            return None;
        }
        let rule = combos
            .get(value, other)
            .filter(|rule| (1..=MAX_TILE).contains(&rule.result))?;

        Some(Merge {
            source: at,
            neighbor,
            target: Cell::new(at.row.max(neighbor.row), at.col),
            rule: rule.clone(),
        })
    })
}

/// Clear both tiles and write the result
pub fn apply_merge(board: &mut Board, merge: &Merge) {
    board.set(merge.source, 0);
    board.set(merge.neighbor, 0);
    board.set(merge.target, merge.rule.result);
}
