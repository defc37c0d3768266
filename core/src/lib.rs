//! Game-state engine for Minesweeper.
//!
//! [`Board`] owns the cell grid and every rule of the game: mines are placed
//! lazily on the first operation so that the first cell and its neighbors are
//! always safe, zero cells cascade, flags and chords follow the classic rules,
//! and [`Board::dump`] / [`Board::init`] round-trip through the bit-packed
//! [`Snapshot`] save format.

use core::ops::BitOr;
use serde::{Deserialize, Serialize};

pub use board::*;
pub use cell::*;
pub use error::*;
pub use generator::*;
pub use snapshot::*;
pub use timer::*;
pub use types::*;

mod board;
mod cell;
mod error;
mod generator;
mod snapshot;
mod timer;
mod types;

/// Board dimensions and mine count.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardConfig {
    pub w: Coord,
    pub h: Coord,
    pub m: CellCount,
}

impl BoardConfig {
    pub const BEGINNER: Self = Self::new_unchecked(9, 9, 10);
    pub const INTERMEDIATE: Self = Self::new_unchecked(16, 16, 40);
    pub const EXPERT: Self = Self::new_unchecked(30, 16, 99);

    pub const fn new_unchecked(w: Coord, h: Coord, m: CellCount) -> Self {
        Self { w, h, m }
    }

    pub fn new(w: Coord, h: Coord, m: CellCount) -> Result<Self> {
        let config = Self::new_unchecked(w, h, m);
        config.validate()?;
        Ok(config)
    }

    /// At least one cell, and at least one cell without a mine.
    pub fn validate(&self) -> Result<()> {
        if self.w == 0 || self.h == 0 {
            return Err(GameError::EmptyBoard);
        }
        let cells = self.total_cells();
        if self.m >= cells {
            return Err(GameError::TooManyMines {
                mines: self.m,
                cells,
            });
        }
        Ok(())
    }

    pub const fn size(&self) -> Coord2 {
        (self.w, self.h)
    }

    pub const fn total_cells(&self) -> CellCount {
        mult(self.w, self.h)
    }

    pub const fn safe_cells(&self) -> CellCount {
        self.total_cells().saturating_sub(self.m)
    }
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self::BEGINNER
    }
}

/// What an operation did to the board.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    NoChange,
    FlagChanged,
    Opened,
    Exploded,
    Won,
}

impl Outcome {
    /// Whether this outcome could have caused an update to the board
    pub const fn has_update(self) -> bool {
        !matches!(self, Self::NoChange)
    }

    pub const fn is_game_over(self) -> bool {
        matches!(self, Self::Exploded | Self::Won)
    }
}

/// Used to merge outcomes when a chord opens several cells
impl BitOr for Outcome {
    type Output = Outcome;

    fn bitor(self, rhs: Self) -> Self::Output {
        use Outcome::*;
        match (self, rhs) {
            (Exploded, _) | (_, Exploded) => Exploded,
            (Won, _) | (_, Won) => Won,
            (Opened, _) | (_, Opened) => Opened,
            (FlagChanged, _) | (_, FlagChanged) => FlagChanged,
            (NoChange, NoChange) => NoChange,
        }
    }
}
