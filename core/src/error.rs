use thiserror::Error;

use crate::{CellCount, CellIndex, Coord2};

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Board must be at least 1x1")]
    EmptyBoard,
    #[error("Too many mines, requested {mines} but the board only has {cells} cells")]
    TooManyMines { mines: CellCount, cells: CellCount },
    #[error("Cell index {0} is out of bounds")]
    InvalidIndex(CellIndex),
    #[error("Coordinates {0:?} are out of bounds")]
    InvalidCoords(Coord2),
    #[error("Invalid cell bits {bits:#x} at index {index}")]
    InvalidCellBits { index: CellIndex, bits: u8 },
    #[error("Cell {0} appears more than once in the snapshot")]
    DuplicateCell(CellIndex),
    #[error("Cell {0} cannot be both open and flagged")]
    OpenFlaggedCell(CellIndex),
    #[error("Snapshot holds {actual} mines but the board declares {expected}")]
    MineCountMismatch { expected: CellCount, actual: CellCount },
}

pub type Result<T> = core::result::Result<T, GameError>;
