use rand::prelude::*;

use super::*;

/// Uniform placement: a partial Fisher-Yates shuffle over the candidates.
#[derive(Clone, Debug, PartialEq)]
pub struct RandomMineGenerator {
    rng: SmallRng,
}

impl RandomMineGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    pub fn from_os_rng() -> Self {
        Self {
            rng: SmallRng::from_os_rng(),
        }
    }
}

impl Default for RandomMineGenerator {
    fn default() -> Self {
        Self::from_os_rng()
    }
}

impl MineGenerator for RandomMineGenerator {
    fn generate(&mut self, mut candidates: Vec<CellIndex>, count: CellCount) -> Vec<CellIndex> {
        let count = usize::from(count);
        if count > candidates.len() {
            log::warn!(
                "Not enough free cells for mines, requested {} but only fits {}",
                count,
                candidates.len()
            );
            return candidates;
        }

        let (picked, _) = candidates.partial_shuffle(&mut self.rng, count);
        picked.to_vec()
    }
}
