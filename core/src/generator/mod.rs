use crate::*;
pub use random::*;

mod random;

/// Chooses which cells receive mines once the first operated cell is known.
pub trait MineGenerator {
    /// Picks exactly `count` distinct entries of `candidates`, or all of them
    /// when there are not enough.
    fn generate(&mut self, candidates: Vec<CellIndex>, count: CellCount) -> Vec<CellIndex>;
}

/// How much of the board around the first operated cell is kept mine-free.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SafeZone {
    /// Only the operated cell.
    Cell,
    /// The operated cell and its surrounding ring.
    Ring,
}
