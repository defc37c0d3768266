use bitflags::bitflags;

use crate::CellIndex;

bitflags! {
    /// Per-cell state bits. `OPEN`, `MINE` and `FLAG` keep the values used by
    /// saved games.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
    pub struct CellState: u8 {
        const OPEN = 0x1;
        const MINE = 0x2;
        const FLAG = 0x4;
        /// The mine whose reveal lost the game.
        const BOOM = 0x8;
    }
}

impl CellState {
    /// Bits written to and read from a [`Snapshot`](crate::Snapshot).
    pub const PERSISTED: Self = Self::OPEN.union(Self::MINE).union(Self::FLAG);

    pub const fn persisted_bits(self) -> u8 {
        self.intersection(Self::PERSISTED).bits()
    }

    /// Parses a saved mask, rejecting zero and anything outside `open | mine | flag`.
    pub const fn from_persisted_bits(bits: u8) -> Option<Self> {
        if bits == 0 || bits & !Self::PERSISTED.bits() != 0 {
            None
        } else {
            Some(Self::from_bits_retain(bits))
        }
    }
}

/// Read-only view of a single cell, produced on demand by the board.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Cell {
    pub index: CellIndex,
    pub state: CellState,
    /// Only present once the engine has computed it, which happens when the
    /// cell is opened or when the count is queried after mine placement.
    pub around_mine_count: Option<u8>,
}

impl Cell {
    pub const fn is_open(&self) -> bool {
        self.state.contains(CellState::OPEN)
    }

    pub const fn is_mine(&self) -> bool {
        self.state.contains(CellState::MINE)
    }

    pub const fn is_flagged(&self) -> bool {
        self.state.contains(CellState::FLAG)
    }

    pub const fn is_boom(&self) -> bool {
        self.state.contains(CellState::BOOM)
    }

    /// An opened cell whose flag was wrong, only visible after a loss.
    pub const fn is_misflagged(&self) -> bool {
        self.is_open() && self.is_flagged() && !self.is_mine()
    }
}
