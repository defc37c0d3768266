use std::cell::OnceCell;
use std::collections::BTreeSet;

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use web_time::Instant;

use crate::*;

/// Valid transitions:
/// - Ready -> Playing, on the first operation or when resuming a snapshot
/// - Playing -> Won
/// - Playing -> Lost
/// - any -> Ready, through `restart` or `init`
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    #[default]
    Ready,
    Playing,
    Won,
    Lost,
}

impl Stage {
    pub const fn is_ready(self) -> bool {
        matches!(self, Self::Ready)
    }

    pub const fn is_playing(self) -> bool {
        matches!(self, Self::Playing)
    }

    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }
}

/// User intent on a single cell.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CellAction {
    Open,
    Flag,
    /// Chord: open every neighbor once the flags around the cell match its count.
    OpenAround,
}

type AroundCells = SmallVec<[CellIndex; 8]>;

#[derive(Clone, Debug)]
pub struct Board<G = RandomMineGenerator> {
    config: BoardConfig,
    cells: Vec<CellState>,
    around_cells: Vec<OnceCell<AroundCells>>,
    around_mine_counts: Vec<OnceCell<u8>>,
    mine_indices: Vec<CellIndex>,
    flag_indices: BTreeSet<CellIndex>,
    unopened_cell_count: CellCount,
    timer: Timer,
    stage: Stage,
    generator: G,
}

impl Board {
    pub fn new(config: BoardConfig) -> Result<Self> {
        Self::with_generator(config, RandomMineGenerator::default())
    }

    /// Board with a reproducible mine layout.
    pub fn with_seed(config: BoardConfig, seed: u64) -> Result<Self> {
        Self::with_generator(config, RandomMineGenerator::new(seed))
    }

    pub fn from_snapshot(snapshot: &Snapshot) -> Result<Self> {
        let mut board = Self::empty(RandomMineGenerator::default());
        board.init(snapshot)?;
        Ok(board)
    }
}

impl<G: MineGenerator> Board<G> {
    pub fn with_generator(config: BoardConfig, generator: G) -> Result<Self> {
        let mut board = Self::empty(generator);
        board.init(&Snapshot::from(config))?;
        Ok(board)
    }

    fn empty(generator: G) -> Self {
        Self {
            config: BoardConfig::new_unchecked(0, 0, 0),
            cells: Vec::new(),
            around_cells: Vec::new(),
            around_mine_counts: Vec::new(),
            mine_indices: Vec::new(),
            flag_indices: BTreeSet::new(),
            unopened_cell_count: 0,
            timer: Timer::default(),
            stage: Stage::Ready,
            generator,
        }
    }

    /// Resets the board to `options`, resuming a saved game when it carries
    /// cell bits. On error the board is left untouched.
    pub fn init(&mut self, options: &Snapshot) -> Result<()> {
        let config = options.config();
        let restored = options.decode_cells()?;

        if config.size() != self.config.size() {
            let total = usize::from(config.total_cells());
            self.cells = vec![CellState::empty(); total];
            self.around_cells = vec![OnceCell::new(); total];
            self.around_mine_counts = vec![OnceCell::new(); total];
        } else {
            // same geometry, the neighbor cache stays valid
            self.cells.fill(CellState::empty());
            self.reset_around_mine_counts();
        }
        self.config = config;
        self.mine_indices.clear();
        self.flag_indices.clear();
        self.unopened_cell_count = config.safe_cells();
        self.timer = Timer::from_millis(options.duration);
        self.stage = Stage::Ready;

        if restored.is_empty() {
            log::debug!("Board initialized: {}x{} with {} mines", config.w, config.h, config.m);
            return Ok(());
        }

        let mut opened = Vec::new();
        for (index, state) in restored {
            self.cells[index] = state;
            if state.contains(CellState::OPEN) {
                opened.push(index);
            }
            if state.contains(CellState::MINE) {
                self.mine_indices.push(index);
            }
            if state.contains(CellState::FLAG) {
                self.flag_indices.insert(index);
            }
        }

        let mut opened_safe: CellCount = 0;
        let mut opened_mine = false;
        for &index in &opened {
            self.mine_count_around(index);
            if self.cells[index].contains(CellState::MINE) {
                opened_mine = true;
            } else {
                opened_safe += 1;
            }
        }
        self.unopened_cell_count = self.unopened_cell_count.saturating_sub(opened_safe);

        let now = Instant::now();
        self.timer.start(now);
        self.stage = if opened_mine {
            Stage::Lost
        } else if self.unopened_cell_count == 0 {
            Stage::Won
        } else {
            Stage::Playing
        };
        if self.stage.is_finished() {
            self.timer.stop(now);
        }

        log::debug!(
            "Board resumed: {}x{} with {} mines, {} cells open, stage {:?}",
            config.w,
            config.h,
            config.m,
            opened.len(),
            self.stage
        );
        Ok(())
    }

    /// Starts a new game on the same board. Does nothing before the first move.
    pub fn restart(&mut self) {
        if self.stage.is_ready() {
            return;
        }

        self.cells.fill(CellState::empty());
        self.reset_around_mine_counts();
        self.mine_indices.clear();
        self.flag_indices.clear();
        self.unopened_cell_count = self.config.safe_cells();
        self.timer = Timer::default();
        self.timer.start(Instant::now());
        self.stage = Stage::Ready;
        log::debug!("Board restarted");
    }

    pub fn dump(&self) -> Snapshot {
        let cell_bits = self
            .cells
            .iter()
            .enumerate()
            .filter_map(|(index, state)| {
                let bits = state.persisted_bits();
                (bits != 0).then_some((index, bits))
            })
            .collect();

        Snapshot {
            w: self.config.w,
            h: self.config.h,
            m: self.config.m,
            cell_bits,
            duration: self.timer.elapsed_ms(Instant::now()),
        }
    }

    /// Single entry point for user moves. The first move of a game places the
    /// mines and starts the clock; moves on a finished game are ignored.
    ///
    /// With `allow_open_around`, an open or flag that has no effect falls back
    /// to a chord on the same cell.
    pub fn operate(
        &mut self,
        index: CellIndex,
        action: CellAction,
        allow_open_around: bool,
    ) -> Result<Outcome> {
        let index = self.validate_index(index)?;

        if self.stage.is_finished() {
            return Ok(Outcome::NoChange);
        }
        if self.stage.is_ready() {
            self.place_mines(index);
            self.timer.start(Instant::now());
            self.stage = Stage::Playing;
        }

        let outcome = match action {
            CellAction::OpenAround => return Ok(self.open_around(index)),
            CellAction::Open => self.open(index),
            CellAction::Flag => self.toggle_flag(index),
        };

        if !outcome.has_update() && allow_open_around {
            Ok(self.open_around(index))
        } else {
            Ok(outcome)
        }
    }

    pub fn config(&self) -> BoardConfig {
        self.config
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn timer(&self) -> Timer {
        self.timer
    }

    /// Elapsed play time for display: zero until the first move, frozen once
    /// the game is over.
    pub fn timer_ms(&self) -> u64 {
        if self.stage.is_ready() {
            0
        } else {
            self.timer.elapsed_ms(Instant::now())
        }
    }

    pub fn mine_indices(&self) -> &[CellIndex] {
        &self.mine_indices
    }

    pub fn flag_indices(&self) -> &BTreeSet<CellIndex> {
        &self.flag_indices
    }

    pub fn unopened_cell_count(&self) -> CellCount {
        self.unopened_cell_count
    }

    /// Mine counter display; goes negative when the player over-flags.
    pub fn mines_remaining(&self) -> isize {
        (self.config.m as isize) - (self.flag_indices.len() as isize)
    }

    pub fn cell(&self, index: CellIndex) -> Option<Cell> {
        (index < self.cells.len()).then(|| self.cell_view(index))
    }

    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        (0..self.cells.len()).map(|index| self.cell_view(index))
    }

    /// Row-major view indexed by `[y, x]`.
    pub fn cell_grid(&self) -> Array2<Cell> {
        let (w, h) = self.config.size();
        Array2::from_shape_fn((usize::from(h), usize::from(w)), |(y, x)| {
            self.cell_view(coords_to_index((x as Coord, y as Coord), w))
        })
    }

    pub fn pos_to_index(&self, coords: Coord2) -> Result<CellIndex> {
        let (w, h) = self.config.size();
        if coords.0 < w && coords.1 < h {
            Ok(coords_to_index(coords, w))
        } else {
            Err(GameError::InvalidCoords(coords))
        }
    }

    pub fn index_to_pos(&self, index: CellIndex) -> Result<Coord2> {
        let index = self.validate_index(index)?;
        Ok(index_to_coords(index, self.config.w))
    }

    /// In-bounds neighbors of a cell, top-left to bottom-right.
    pub fn around_cells(&self, index: CellIndex) -> Result<&[CellIndex]> {
        let index = self.validate_index(index)?;
        Ok(self.neighbors(index))
    }

    /// Number of mines next to a cell. Before the first move this is always
    /// zero; the cached values are discarded once mines are placed.
    pub fn around_mine_count(&self, index: CellIndex) -> Result<u8> {
        let index = self.validate_index(index)?;
        Ok(self.mine_count_around(index))
    }

    fn validate_index(&self, index: CellIndex) -> Result<CellIndex> {
        if index < self.cells.len() {
            Ok(index)
        } else {
            Err(GameError::InvalidIndex(index))
        }
    }

    fn cell_view(&self, index: CellIndex) -> Cell {
        Cell {
            index,
            state: self.cells[index],
            around_mine_count: self.around_mine_counts[index].get().copied(),
        }
    }

    fn neighbors(&self, index: CellIndex) -> &[CellIndex] {
        self.around_cells[index].get_or_init(|| NeighborIter::new(index, self.config.size()).collect())
    }

    fn mine_count_around(&self, index: CellIndex) -> u8 {
        *self.around_mine_counts[index].get_or_init(|| {
            self.neighbors(index)
                .iter()
                .filter(|&&neighbor| self.cells[neighbor].contains(CellState::MINE))
                .count() as u8
        })
    }

    fn reset_around_mine_counts(&mut self) {
        for count in &mut self.around_mine_counts {
            count.take();
        }
    }

    fn place_mines(&mut self, origin: CellIndex) {
        let total = self.cells.len();
        let ring = self.neighbors(origin);

        let zone = if total - 1 - ring.len() < usize::from(self.config.m) {
            log::warn!("Cannot keep the first cell's neighbors free of mines, only the cell itself is safe");
            SafeZone::Cell
        } else {
            SafeZone::Ring
        };
        let mut excluded: AroundCells = SmallVec::new();
        excluded.push(origin);
        if zone == SafeZone::Ring {
            excluded.extend_from_slice(ring);
        }

        let candidates = (0..total)
            .filter(|index| !excluded.contains(index))
            .collect();
        let mines = self.generator.generate(candidates, self.config.m);
        for &index in &mines {
            self.cells[index].insert(CellState::MINE);
        }
        self.mine_indices = mines;
        self.reset_around_mine_counts();

        log::debug!(
            "Placed {} mines, first cell {} with {:?} safe zone",
            self.mine_indices.len(),
            origin,
            zone
        );
    }

    fn is_closed_and_unflagged(&self, index: CellIndex) -> bool {
        !self.cells[index].intersects(CellState::OPEN | CellState::FLAG)
    }

    /// Reveals a cell, cascading through zero cells with a work list.
    fn open(&mut self, index: CellIndex) -> Outcome {
        if !self.is_closed_and_unflagged(index) {
            return Outcome::NoChange;
        }

        let mut pending = vec![index];
        while let Some(current) = pending.pop() {
            // queued more than once through different zero neighbors
            if !self.is_closed_and_unflagged(current) {
                continue;
            }

            self.cells[current].insert(CellState::OPEN);
            if self.cells[current].contains(CellState::MINE) {
                self.cells[current].insert(CellState::BOOM);
                self.end_game(false);
                return Outcome::Exploded;
            }

            self.unopened_cell_count = self.unopened_cell_count.saturating_sub(1);
            if self.unopened_cell_count == 0 {
                self.end_game(true);
                return Outcome::Won;
            }

            if self.mine_count_around(current) == 0 {
                pending.extend(
                    self.neighbors(current)
                        .iter()
                        .copied()
                        .filter(|&neighbor| self.is_closed_and_unflagged(neighbor)),
                );
            }
        }

        Outcome::Opened
    }

    fn toggle_flag(&mut self, index: CellIndex) -> Outcome {
        let state = &mut self.cells[index];
        if state.contains(CellState::OPEN) {
            return Outcome::NoChange;
        }

        state.toggle(CellState::FLAG);
        if state.contains(CellState::FLAG) {
            self.flag_indices.insert(index);
        } else {
            self.flag_indices.remove(&index);
        }
        Outcome::FlagChanged
    }

    /// Chord: only proceeds when the flags around an open cell exactly match
    /// its mine count.
    fn open_around(&mut self, index: CellIndex) -> Outcome {
        if !self.cells[index].contains(CellState::OPEN) {
            return Outcome::NoChange;
        }

        let around = AroundCells::from_slice(self.neighbors(index));
        let flag_count = around
            .iter()
            .filter(|&&neighbor| self.cells[neighbor].contains(CellState::FLAG))
            .count();
        if flag_count == 0 || flag_count != usize::from(self.mine_count_around(index)) {
            return Outcome::NoChange;
        }

        let mut outcome = Outcome::NoChange;
        for neighbor in around {
            if self.stage.is_finished() {
                break;
            }
            outcome = outcome | self.open(neighbor);
        }
        outcome
    }

    fn end_game(&mut self, won: bool) {
        self.timer.stop(Instant::now());

        if won {
            self.stage = Stage::Won;
            self.flag_indices.clear();
            for index in 0..self.cells.len() {
                if self.cells[index].contains(CellState::MINE) {
                    self.cells[index].insert(CellState::FLAG);
                    self.flag_indices.insert(index);
                } else {
                    self.cells[index].insert(CellState::OPEN);
                    self.mine_count_around(index);
                }
            }
        } else {
            self.stage = Stage::Lost;
            for &index in &self.mine_indices {
                self.cells[index].insert(CellState::OPEN);
            }
            // flags stay set so wrong ones can be told apart
            for &index in &self.flag_indices {
                self.cells[index].insert(CellState::OPEN);
            }
        }

        log::debug!(
            "Game over: {:?} after {} ms",
            self.stage,
            self.timer.stored().as_millis()
        );
    }
}
