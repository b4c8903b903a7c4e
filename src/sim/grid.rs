//! Fixed-size board of number tiles
//!
//! Row 0 is the top of the board. A cell holds 0 when empty, otherwise the
//! tile value (1..=10).

use std::fmt;

use crate::consts::{COLS, ROWS};

/// A board position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
}

impl Cell {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Neighboring cell, or None if it would fall off the board
    pub fn offset(self, d_row: isize, d_col: isize) -> Option<Cell> {
        let row = self.row.checked_add_signed(d_row)?;
        let col = self.col.checked_add_signed(d_col)?;
        (row < ROWS && col < COLS).then_some(Cell { row, col })
    }
}

/// One tile moved down by gravity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileFall {
    pub col: usize,
    pub from_row: usize,
    pub to_row: usize,
    pub value: u8,
}

/// The playfield
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Board {
    cells: [[u8; COLS]; ROWS],
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rows(cells: [[u8; COLS]; ROWS]) -> Self {
        Self { cells }
    }

    pub fn rows(&self) -> &[[u8; COLS]; ROWS] {
        &self.cells
    }

    /// Tile value at `cell` (None off the board)
    pub fn get(&self, cell: Cell) -> Option<u8> {
        self.cells.get(cell.row)?.get(cell.col).copied()
    }

    /// In bounds and empty
    pub fn is_vacant(&self, cell: Cell) -> bool {
        self.get(cell) == Some(0)
    }

    pub fn set(&mut self, cell: Cell, value: u8) {
        self.cells[cell.row][cell.col] = value;
    }

    pub fn clear(&mut self) {
        self.cells = [[0; COLS]; ROWS];
    }

    pub fn tile_count(&self) -> usize {
        self.cells.iter().flatten().filter(|&&v| v != 0).count()
    }

    /// Compact every column downward.
    ///
    /// Bottom-up, each empty cell pulls down the nearest tile above it. One
    /// sweep leaves no gaps; relative order inside a column is preserved.
    pub fn apply_gravity(&mut self) -> Vec<TileFall> {
        let mut falls = Vec::new();

        for col in 0..COLS {
            for row in (0..ROWS).rev() {
                if self.cells[row][col] != 0 {
                    continue;
                }
                let Some(above) = (0..row).rev().find(|&r| self.cells[r][col] != 0) else {
                    // Nothing left above this column position
                    break;
                };
                let value = self.cells[above][col];
                self.cells[row][col] = value;
                self.cells[above][col] = 0;
                falls.push(TileFall {
                    col,
                    from_row: above,
                    to_row: row,
                    value,
                });
            }
        }

        falls
    }

    /// True when no empty cell has a tile somewhere above it
    pub fn is_settled(&self) -> bool {
        (0..COLS).all(|col| {
            let mut seen_tile = false;
            for row in 0..ROWS {
                match self.cells[row][col] {
                    0 if seen_tile => return false,
                    0 => {}
                    _ => seen_tile = true,
                }
            }
            true
        })
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.cells {
            for (col, &value) in row.iter().enumerate() {
                if col > 0 {
                    f.write_str(" ")?;
                }
                match value {
                    0 => f.write_str(" .")?,
                    v => write!(f, "{:>2}", v)?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn column(board: &Board, col: usize) -> Vec<u8> {
        board.rows().iter().map(|row| row[col]).collect()
    }

    #[test]
    fn test_cell_offset_bounds() {
        assert_eq!(Cell::new(0, 0).offset(-1, 0), None);
        assert_eq!(Cell::new(0, 0).offset(0, -1), None);
        assert_eq!(Cell::new(ROWS - 1, COLS - 1).offset(1, 0), None);
        assert_eq!(Cell::new(ROWS - 1, COLS - 1).offset(0, 1), None);
        assert_eq!(Cell::new(5, 5).offset(1, -1), Some(Cell::new(6, 4)));
    }

    #[test]
    fn test_vacancy() {
        let mut board = Board::new();
        let cell = Cell::new(3, 2);
        assert!(board.is_vacant(cell));
        board.set(cell, 7);
        assert!(!board.is_vacant(cell));
        assert_eq!(board.get(cell), Some(7));
        assert!(!board.is_vacant(Cell::new(ROWS, 0)));
        assert_eq!(board.tile_count(), 1);
        board.clear();
        assert_eq!(board.tile_count(), 0);
    }

    #[test]
    fn test_gravity_fills_gap() {
        let mut board = Board::new();
        board.set(Cell::new(8, 1), 3);
        board.set(Cell::new(9, 1), 5);
        // Row 10 empty (cleared by a merge), row 11 occupied
        board.set(Cell::new(11, 1), 2);

        let falls = board.apply_gravity();

        assert_eq!(column(&board, 1)[9..], [3, 5, 2]);
        assert_eq!(board.get(Cell::new(8, 1)), Some(0));
        assert_eq!(falls.len(), 2);
        assert_eq!(
            falls[0],
            TileFall {
                col: 1,
                from_row: 9,
                to_row: 10,
                value: 5
            }
        );
        assert!(board.is_settled());
    }

    #[test]
    fn test_gravity_noop_when_settled() {
        let mut board = Board::new();
        board.set(Cell::new(11, 0), 1);
        board.set(Cell::new(10, 0), 2);
        assert!(board.apply_gravity().is_empty());
    }

    #[test]
    fn test_display() {
        let mut board = Board::new();
        board.set(Cell::new(ROWS - 1, 0), 10);
        let text = board.to_string();
        assert_eq!(text.lines().count(), ROWS);
        assert!(text.lines().last().unwrap().starts_with("10"));
    }

    /// Flat vec of cells folded into rows; nested array strategies blow the
    /// test thread's stack
    fn arb_board() -> BoxedStrategy<Board> {
        let cell = prop_oneof![3 => Just(0u8), 2 => 1u8..=10];
        prop::collection::vec(cell, ROWS * COLS)
            .prop_map(|values| {
                let mut rows = [[0u8; COLS]; ROWS];
                for (index, value) in values.into_iter().enumerate() {
                    rows[index / COLS][index % COLS] = value;
                }
                Board::from_rows(rows)
            })
            .boxed()
    }

    proptest! {
        #[test]
        fn gravity_compacts_every_column(mut board in arb_board()) {
            let before = board.clone();
            board.apply_gravity();

            prop_assert!(board.is_settled());
            for col in 0..COLS {
                let tiles_before: Vec<u8> =
                    column(&before, col).into_iter().filter(|&v| v != 0).collect();
                let tiles_after: Vec<u8> =
                    column(&board, col).into_iter().filter(|&v| v != 0).collect();
                prop_assert_eq!(tiles_before, tiles_after);
            }
        }
    }
}
