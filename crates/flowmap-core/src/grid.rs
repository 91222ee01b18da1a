use std::collections::BTreeMap;

use crate::cell::Cell;
use crate::error::{FlowError, Result};

/// Stable handle to a cell owned by a [`Grid`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellId(usize);

impl CellId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Sparse 2D collection of cells indexed by `(i, j)`.
///
/// Cells live in an arena and are addressed by [`CellId`]; a sorted
/// position index maps `(i, j)` to ids so iteration is row-major.
/// Absent positions are reported as `None`, never as errors.
#[derive(Clone, Debug)]
pub struct Grid {
    cells: Vec<Cell>,
    index: BTreeMap<(u32, u32), CellId>,
    /// Per row: max j + 1 of the cells in that row, 0 for empty rows.
    row_lengths: Vec<usize>,
}

impl Grid {
    /// Build a grid. Fails if two cells share the same `(i, j)`.
    pub fn new(cells: Vec<Cell>) -> Result<Self> {
        let mut index = BTreeMap::new();
        for (n, cell) in cells.iter().enumerate() {
            if index.insert((cell.i(), cell.j()), CellId(n)).is_some() {
                return Err(FlowError::DuplicatePosition {
                    i: cell.i(),
                    j: cell.j(),
                });
            }
        }
        let mut grid = Self {
            cells,
            index,
            row_lengths: Vec::new(),
        };
        grid.rebuild_row_lengths();
        Ok(grid)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Cell at `(i, j)`, or `None` when absent or out of range.
    pub fn get_cell(&self, i: i64, j: i64) -> Option<&Cell> {
        self.cell_id(i, j).map(|id| &self.cells[id.0])
    }

    pub fn cell_id(&self, i: i64, j: i64) -> Option<CellId> {
        let i = u32::try_from(i).ok()?;
        let j = u32::try_from(j).ok()?;
        self.index.get(&(i, j)).copied()
    }

    pub fn cell(&self, id: CellId) -> Option<&Cell> {
        self.cells.get(id.0)
    }

    /// All present cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> + '_ {
        self.index.values().map(move |id| &self.cells[id.0])
    }

    /// Ids of all present cells in row-major order.
    pub fn ids(&self) -> impl Iterator<Item = CellId> + '_ {
        self.index.values().copied()
    }

    /// Number of rows, i.e. max i + 1 (rows may be empty).
    pub fn num_rows(&self) -> usize {
        self.row_lengths.len()
    }

    /// Length of row `i` (max j + 1), 0 when the row is absent.
    pub fn num_column(&self, i: i64) -> usize {
        usize::try_from(i)
            .ok()
            .and_then(|i| self.row_lengths.get(i).copied())
            .unwrap_or(0)
    }

    pub fn max_column(&self) -> usize {
        self.row_lengths.iter().copied().max().unwrap_or(0)
    }

    /// Move a cell to a new position, keeping the index consistent.
    pub fn move_cell(&mut self, id: CellId, i: u32, j: u32) -> Result<()> {
        let cell = self.cells.get(id.0).ok_or(FlowError::UnknownCell(id.0))?;
        let old = (cell.i(), cell.j());
        if old == (i, j) {
            return Ok(());
        }
        if self.index.contains_key(&(i, j)) {
            return Err(FlowError::DuplicatePosition { i, j });
        }
        self.index.remove(&old);
        self.index.insert((i, j), id);
        self.cells[id.0].set_position(i, j);
        self.rebuild_row_lengths();
        Ok(())
    }

    fn rebuild_row_lengths(&mut self) {
        let rows = self.index.keys().map(|&(i, _)| i as usize + 1).max().unwrap_or(0);
        let mut row_lengths = vec![0; rows];
        for &(i, j) in self.index.keys() {
            let len = &mut row_lengths[i as usize];
            *len = (*len).max(j as usize + 1);
        }
        self.row_lengths = row_lengths;
    }
}
