use crate::{Coords, BOARD_SIZE};

/// What occupies a cell. Display brightness is derived from this, never the other way round.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CellState {
    Empty,
    Body,
    Food,
}

pub struct Board {
    cells: [[CellState; BOARD_SIZE as usize]; BOARD_SIZE as usize],
}

impl Board {
    pub fn new() -> Self {
        Board { cells: [[CellState::Empty; BOARD_SIZE as usize]; BOARD_SIZE as usize] }
    }

    pub fn in_bounds(pos: Coords) -> bool {
        let range = 0..BOARD_SIZE;
        range.contains(&pos.0) && range.contains(&pos.1)
    }

    /// Out-of-bounds positions have no state.
    pub fn get(&self, pos: Coords) -> Option<CellState> {
        if Board::in_bounds(pos) {
            Some(self.cells[pos.1 as usize][pos.0 as usize])
        } else {
            None
        }
    }

    pub fn set(&mut self, pos: Coords, state: CellState) {
        assert!(Board::in_bounds(pos), "cell {:?} is off the board", pos);
        self.cells[pos.1 as usize][pos.0 as usize] = state;
    }

    pub fn is_free(&self, pos: Coords) -> bool {
        self.get(pos) == Some(CellState::Empty)
    }

    pub fn free_cells(&self) -> usize {
        self.cells.iter().flatten().filter(|c| **c == CellState::Empty).count()
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

/// Every cell in animation order: column by column, top to bottom.
pub fn scan_order() -> impl Iterator<Item = Coords> {
    (0..BOARD_SIZE).flat_map(|x| (0..BOARD_SIZE).map(move |y| (x, y)))
}
