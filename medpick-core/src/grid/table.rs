//! Grid table and slot resolution
//!
//! Slots are numbered 1..=24 row by row, eight per row:
//!
//! ```text
//!          col 1  col 2  ...  col 8
//! row 1      1      2    ...    8
//! row 2      9     10    ...   16
//! row 3     17     18    ...   24
//! ```
//!
//! Columns are horizontal positions and rows are vertical positions, so a
//! slot resolves to `(columns[col], rows[row])`.

use crate::config::{GridConfig, COLUMN_COUNT, ROW_COUNT};
use crate::motion::{AxisId, Position};

/// Number of addressable slots
pub const SLOT_COUNT: u8 = (ROW_COUNT * COLUMN_COUNT) as u8;

/// Grid lookup errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GridError {
    /// Slot outside 1..=24
    InvalidSlot,
    /// Row/column lookup failed for an in-range slot
    InvalidPosition,
    /// Row outside 1..=3
    InvalidRow,
    /// Column outside 1..=8
    InvalidColumn,
}

/// A validated slot number
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Slot(u8);

impl Slot {
    /// Validate a raw slot number
    pub fn new(slot: i32) -> Result<Self, GridError> {
        if (1..=SLOT_COUNT as i32).contains(&slot) {
            Ok(Self(slot as u8))
        } else {
            Err(GridError::InvalidSlot)
        }
    }

    /// Slot number (1..=24)
    pub fn number(self) -> u8 {
        self.0
    }

    /// Row index (1..=3)
    pub fn row(self) -> u8 {
        (self.0 - 1) / COLUMN_COUNT as u8 + 1
    }

    /// Column index (1..=8)
    pub fn column(self) -> u8 {
        (self.0 - 1) % COLUMN_COUNT as u8 + 1
    }

    /// Slot at a row/column intersection
    pub fn from_row_column(row: u8, column: u8) -> Result<Self, GridError> {
        if !(1..=ROW_COUNT as u8).contains(&row) {
            return Err(GridError::InvalidRow);
        }
        if !(1..=COLUMN_COUNT as u8).contains(&column) {
            return Err(GridError::InvalidColumn);
        }
        Ok(Self((row - 1) * COLUMN_COUNT as u8 + column))
    }
}

/// Mutable row/column position table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridTable {
    rows: [i32; ROW_COUNT],
    columns: [i32; COLUMN_COUNT],
    drop_off: Position,
}

impl Default for GridTable {
    fn default() -> Self {
        Self::from_config(&GridConfig::default())
    }
}

impl GridTable {
    /// Create a table from configured values
    pub fn from_config(config: &GridConfig) -> Self {
        Self {
            rows: config.rows,
            columns: config.columns,
            drop_off: config.drop_off,
        }
    }

    /// Vertical position of a row (1..=3)
    pub fn row(&self, row: i32) -> Result<i32, GridError> {
        index(row, ROW_COUNT)
            .map(|i| self.rows[i])
            .ok_or(GridError::InvalidRow)
    }

    /// Horizontal position of a column (1..=8)
    pub fn column(&self, column: i32) -> Result<i32, GridError> {
        index(column, COLUMN_COUNT)
            .map(|i| self.columns[i])
            .ok_or(GridError::InvalidColumn)
    }

    /// Drop-off position
    pub fn drop_off(&self) -> Position {
        self.drop_off
    }

    /// Resolve a slot to its absolute target
    pub fn resolve_slot(&self, slot: i32) -> Result<Position, GridError> {
        let slot = Slot::new(slot)?;
        self.resolve(slot)
    }

    /// Resolve a validated slot to its absolute target
    pub fn resolve(&self, slot: Slot) -> Result<Position, GridError> {
        let horizontal = self
            .column(slot.column() as i32)
            .map_err(|_| GridError::InvalidPosition)?;
        let vertical = self
            .row(slot.row() as i32)
            .map_err(|_| GridError::InvalidPosition)?;
        Ok(Position::new(horizontal, vertical))
    }

    /// Overwrite a row position
    pub fn set_row(&mut self, row: i32, value: i32) -> Result<(), GridError> {
        let i = index(row, ROW_COUNT).ok_or(GridError::InvalidRow)?;
        self.rows[i] = value;
        Ok(())
    }

    /// Overwrite a column position
    pub fn set_column(&mut self, column: i32, value: i32) -> Result<(), GridError> {
        let i = index(column, COLUMN_COUNT).ok_or(GridError::InvalidColumn)?;
        self.columns[i] = value;
        Ok(())
    }

    /// Overwrite one component of the drop-off position
    pub fn set_drop_off(&mut self, axis: AxisId, value: i32) {
        self.drop_off.set(axis, value);
    }
}

/// Convert a 1-based key to an array index
fn index(key: i32, count: usize) -> Option<usize> {
    if key >= 1 && key as usize <= count {
        Some(key as usize - 1)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_row_column() {
        let slot = Slot::new(1).unwrap();
        assert_eq!((slot.row(), slot.column()), (1, 1));

        let slot = Slot::new(8).unwrap();
        assert_eq!((slot.row(), slot.column()), (1, 8));

        let slot = Slot::new(9).unwrap();
        assert_eq!((slot.row(), slot.column()), (2, 1));

        let slot = Slot::new(24).unwrap();
        assert_eq!((slot.row(), slot.column()), (3, 8));
    }

    #[test]
    fn test_invalid_slots() {
        for slot in [0, 25, -1, i32::MIN, i32::MAX] {
            assert_eq!(Slot::new(slot), Err(GridError::InvalidSlot));
        }
    }

    #[test]
    fn test_from_row_column() {
        assert_eq!(Slot::from_row_column(2, 3).unwrap().number(), 11);
        assert_eq!(Slot::from_row_column(0, 3), Err(GridError::InvalidRow));
        assert_eq!(Slot::from_row_column(1, 9), Err(GridError::InvalidColumn));
    }

    #[test]
    fn test_default_resolution() {
        let grid = GridTable::default();
        assert_eq!(grid.resolve_slot(1), Ok(Position::new(10, 10)));
        assert_eq!(grid.resolve_slot(9), Ok(Position::new(10, 20)));
        assert_eq!(grid.resolve_slot(24), Ok(Position::new(80, 30)));
        assert_eq!(grid.resolve_slot(0), Err(GridError::InvalidSlot));
        assert_eq!(grid.drop_off(), Position::new(1000, 5000));
    }

    #[test]
    fn test_set_column_changes_resolution() {
        let mut grid = GridTable::default();
        grid.set_column(3, 999).unwrap();
        assert_eq!(grid.resolve_slot(3).unwrap().horizontal, 999);
        assert_eq!(grid.resolve_slot(11).unwrap().horizontal, 999);
        assert_eq!(grid.resolve_slot(4).unwrap().horizontal, 40);
    }

    #[test]
    fn test_set_row() {
        let mut grid = GridTable::default();
        grid.set_row(2, 5000).unwrap();
        assert_eq!(grid.row(2), Ok(5000));
        assert_eq!(grid.resolve_slot(16).unwrap().vertical, 5000);
    }

    #[test]
    fn test_out_of_range_keys_rejected() {
        let mut grid = GridTable::default();
        assert_eq!(grid.set_column(9, 5), Err(GridError::InvalidColumn));
        assert_eq!(grid.set_column(0, 5), Err(GridError::InvalidColumn));
        assert_eq!(grid.set_row(4, 5), Err(GridError::InvalidRow));
        assert_eq!(grid.set_row(-1, 5), Err(GridError::InvalidRow));
        assert_eq!(grid, GridTable::default());
    }

    #[test]
    fn test_set_drop_off() {
        let mut grid = GridTable::default();
        grid.set_drop_off(AxisId::Horizontal, 1234);
        grid.set_drop_off(AxisId::Vertical, 4321);
        assert_eq!(grid.drop_off(), Position::new(1234, 4321));
    }
}
