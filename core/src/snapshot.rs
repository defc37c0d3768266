use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::*;

/// Saved game, as produced by [`Board::dump`] and consumed by [`Board::init`].
///
/// `cell_bits` is sparse: only cells with a nonzero `open | mine | flag` mask
/// are listed, as `[index, bits]` pairs. `duration` is the accumulated play
/// time in milliseconds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub w: Coord,
    pub h: Coord,
    pub m: CellCount,
    #[serde(default)]
    pub cell_bits: Vec<(CellIndex, u8)>,
    #[serde(default)]
    pub duration: u64,
}

impl Snapshot {
    pub const fn config(&self) -> BoardConfig {
        BoardConfig::new_unchecked(self.w, self.h, self.m)
    }

    /// Checks the snapshot against its own declared size and decodes the
    /// cell masks.
    pub fn decode_cells(&self) -> Result<Vec<(CellIndex, CellState)>> {
        let config = self.config();
        config.validate()?;

        let total = usize::from(config.total_cells());
        let lost = self.has_open_mine();
        let mut seen = BTreeSet::new();
        let mut mines: CellCount = 0;
        let mut cells = Vec::with_capacity(self.cell_bits.len());

        for &(index, bits) in &self.cell_bits {
            if index >= total {
                return Err(GameError::InvalidIndex(index));
            }
            if !seen.insert(index) {
                return Err(GameError::DuplicateCell(index));
            }
            let state = CellState::from_persisted_bits(bits)
                .ok_or(GameError::InvalidCellBits { index, bits })?;
            // only a lost game opens flagged cells
            if state.contains(CellState::OPEN | CellState::FLAG) && !lost {
                return Err(GameError::OpenFlaggedCell(index));
            }
            if state.contains(CellState::MINE) {
                mines += 1;
            }
            cells.push((index, state));
        }

        if !cells.is_empty() && mines != config.m {
            return Err(GameError::MineCountMismatch {
                expected: config.m,
                actual: mines,
            });
        }

        Ok(cells)
    }

    /// An opened mine only exists once the game has been lost.
    pub fn has_open_mine(&self) -> bool {
        let open_mine = (CellState::OPEN | CellState::MINE).bits();
        self.cell_bits
            .iter()
            .any(|&(_, bits)| bits & open_mine == open_mine)
    }
}

impl From<BoardConfig> for Snapshot {
    fn from(config: BoardConfig) -> Self {
        Self {
            w: config.w,
            h: config.h,
            m: config.m,
            cell_bits: Vec::new(),
            duration: 0,
        }
    }
}
