//! Static tile classification and bounds queries.

use capyvent_core::{CellCoord, CellKind};

/// Fixed row-major grid of cell classifications.
#[derive(Clone, Debug)]
pub(crate) struct Grid {
    columns: u32,
    rows: u32,
    cells: Vec<CellKind>,
}

impl Grid {
    /// Builds a grid, padding missing cells with walls and dropping extras.
    pub(crate) fn new(columns: u32, rows: u32, mut cells: Vec<CellKind>) -> Self {
        let capacity_u64 = u64::from(columns) * u64::from(rows);
        let capacity = usize::try_from(capacity_u64).unwrap_or(0);
        cells.resize(capacity, CellKind::Wall);
        Self {
            columns,
            rows,
            cells,
        }
    }

    pub(crate) fn columns(&self) -> u32 {
        self.columns
    }

    pub(crate) fn rows(&self) -> u32 {
        self.rows
    }

    pub(crate) fn in_bounds(&self, cell: CellCoord) -> bool {
        cell.column() < self.columns && cell.row() < self.rows
    }

    /// Classification of `cell`; anything outside the grid reads as a wall.
    pub(crate) fn cell_at(&self, cell: CellCoord) -> CellKind {
        self.index(cell)
            .and_then(|index| self.cells.get(index).copied())
            .unwrap_or(CellKind::Wall)
    }

    /// Turns a destructible box into floor, reporting whether one was there.
    pub(crate) fn clear_box(&mut self, cell: CellCoord) -> bool {
        let Some(slot) = self.index(cell).and_then(|index| self.cells.get_mut(index)) else {
            return false;
        };
        if *slot != CellKind::Box {
            return false;
        }
        *slot = CellKind::Floor;
        true
    }

    /// Layout codes arranged as `rows[row][column]`.
    pub(crate) fn code_rows(&self) -> Vec<Vec<u8>> {
        let width = usize::try_from(self.columns).unwrap_or(0).max(1);
        self.cells
            .chunks(width)
            .map(|row| row.iter().map(|kind| kind.code()).collect())
            .collect()
    }

    pub(crate) fn clear(&mut self) {
        self.columns = 0;
        self.rows = 0;
        self.cells.clear();
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if !self.in_bounds(cell) {
            return None;
        }
        let row = usize::try_from(cell.row()).ok()?;
        let column = usize::try_from(cell.column()).ok()?;
        let width = usize::try_from(self.columns).ok()?;
        row.checked_mul(width)?.checked_add(column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_bounds_reads_as_wall() {
        let grid = Grid::new(2, 2, vec![CellKind::Floor; 4]);
        assert_eq!(grid.cell_at(CellCoord::new(2, 0)), CellKind::Wall);
        assert_eq!(grid.cell_at(CellCoord::new(1, 1)), CellKind::Floor);
        assert!(!grid.in_bounds(CellCoord::new(0, 2)));
    }

    #[test]
    fn short_layouts_are_padded_with_walls() {
        let grid = Grid::new(3, 2, vec![CellKind::Floor; 4]);
        assert_eq!(grid.cell_at(CellCoord::new(0, 1)), CellKind::Floor);
        assert_eq!(grid.cell_at(CellCoord::new(1, 1)), CellKind::Wall);
        assert_eq!(grid.code_rows(), vec![vec![0, 0, 0], vec![0, 1, 1]]);
    }

    #[test]
    fn clearing_only_affects_boxes() {
        let mut grid = Grid::new(2, 1, vec![CellKind::Box, CellKind::Wall]);
        assert!(grid.clear_box(CellCoord::new(0, 0)));
        assert!(!grid.clear_box(CellCoord::new(0, 0)));
        assert!(!grid.clear_box(CellCoord::new(1, 0)));
        assert_eq!(grid.cell_at(CellCoord::new(0, 0)), CellKind::Floor);
    }
}
