//! Immutable chunk snapshots.
//!
//! A snapshot is captured once when a scan starts and discarded when the
//! scan finishes; later updates patch the scan's result list directly, so
//! a snapshot is never written after capture. Sparse vertical sections are
//! not copied at all and read back as the background state.

use crate::pos::{BlockPos, BlockState, ChunkPos};

/// Side length of one cubic section, in blocks.
pub const SECTION_SIZE: usize = 16;

/// Blocks per section.
pub const SECTION_VOLUME: usize = SECTION_SIZE * SECTION_SIZE * SECTION_SIZE;

/// Dense block-state table for one 16x16x16 sub-region of a chunk.
pub struct Section {
    states: Box<[BlockState; SECTION_VOLUME]>,
}

impl Section {
    /// A section filled with the background state.
    #[must_use]
    pub fn new() -> Self {
        Self::filled(BlockState::AIR)
    }

    /// A section filled with a single state.
    #[must_use]
    pub fn filled(state: BlockState) -> Self {
        Self {
            states: Box::new([state; SECTION_VOLUME]),
        }
    }

    fn index(lx: usize, ly: usize, lz: usize) -> usize {
        (ly * SECTION_SIZE + lz) * SECTION_SIZE + lx
    }

    /// Read a local position (each coordinate in `0..16`).
    #[must_use]
    pub fn get(&self, lx: usize, ly: usize, lz: usize) -> BlockState {
        self.states[Self::index(lx, ly, lz)]
    }

    /// Write a local position (each coordinate in `0..16`).
    pub fn set(&mut self, lx: usize, ly: usize, lz: usize, state: BlockState) {
        self.states[Self::index(lx, ly, lz)] = state;
    }
}

impl Default for Section {
    fn default() -> Self {
        Self::new()
    }
}

/// An immutable copy of one chunk's block states at scan start.
///
/// Bounds are `[base_x, base_x+15] x [min_y, max_y] x [base_z, base_z+15]`.
/// Sections that were empty at capture time stay `None` and resolve to
/// [`BlockState::AIR`]; positions outside the bounds, or cells the capture
/// marked [`BlockState::UNRESOLVED`], fail to resolve (`None`).
pub struct ChunkSnapshot {
    pos: ChunkPos,
    min_y: i32,
    sections: Vec<Option<Section>>,
}

impl ChunkSnapshot {
    /// An empty snapshot covering `section_count` sections upward from `min_y`.
    ///
    /// `min_y` must be section-aligned (a multiple of 16).
    #[must_use]
    pub fn new(pos: ChunkPos, min_y: i32, section_count: usize) -> Self {
        debug_assert_eq!(min_y.rem_euclid(16), 0, "min_y must be section-aligned");
        let mut sections = Vec::with_capacity(section_count);
        sections.resize_with(section_count, || None);
        Self {
            pos,
            min_y,
            sections,
        }
    }

    #[must_use]
    pub const fn pos(&self) -> ChunkPos {
        self.pos
    }

    /// Inclusive lower corner of the captured bounds.
    #[must_use]
    pub const fn min(&self) -> BlockPos {
        BlockPos::new(self.pos.base_x(), self.min_y, self.pos.base_z())
    }

    /// Inclusive upper corner of the captured bounds.
    #[must_use]
    pub fn max(&self) -> BlockPos {
        BlockPos::new(
            self.pos.base_x() + (SECTION_SIZE as i32 - 1),
            self.min_y + (self.sections.len() * SECTION_SIZE) as i32 - 1,
            self.pos.base_z() + (SECTION_SIZE as i32 - 1),
        )
    }

    /// Write one block state during capture.
    ///
    /// Materializes the owning section on first write. Positions outside
    /// the snapshot bounds are ignored.
    pub fn set_state(&mut self, pos: BlockPos, state: BlockState) {
        let Some(section_idx) = self.section_index(pos) else {
            debug_assert!(false, "set_state out of bounds: {pos:?}");
            return;
        };
        let lx = (pos.x - self.pos.base_x()) as usize;
        let ly = pos.y.rem_euclid(SECTION_SIZE as i32) as usize;
        let lz = (pos.z - self.pos.base_z()) as usize;
        self.sections[section_idx]
            .get_or_insert_with(Section::new)
            .set(lx, ly, lz, state);
    }

    /// Resolve the captured state at a position.
    ///
    /// `None` means the position cannot be resolved from this snapshot
    /// (outside the bounds, or marked unresolved at capture); callers must
    /// not evaluate predicates against it.
    #[must_use]
    pub fn state_at(&self, pos: BlockPos) -> Option<BlockState> {
        let section_idx = self.section_index(pos)?;
        let Some(section) = &self.sections[section_idx] else {
            return Some(BlockState::AIR);
        };
        let state = section.get(
            (pos.x - self.pos.base_x()) as usize,
            pos.y.rem_euclid(SECTION_SIZE as i32) as usize,
            (pos.z - self.pos.base_z()) as usize,
        );
        if state == BlockState::UNRESOLVED {
            None
        } else {
            Some(state)
        }
    }

    /// All positions inside the bounds, in scan order (y, then z, then x).
    pub fn positions(&self) -> impl Iterator<Item = BlockPos> + '_ {
        let min = self.min();
        let max = self.max();
        (min.y..=max.y).flat_map(move |y| {
            (min.z..=max.z)
                .flat_map(move |z| (min.x..=max.x).map(move |x| BlockPos::new(x, y, z)))
        })
    }

    fn section_index(&self, pos: BlockPos) -> Option<usize> {
        if pos.chunk() != self.pos {
            return None;
        }
        let dy = pos.y - self.min_y;
        if dy < 0 {
            return None;
        }
        let idx = (dy as usize) / SECTION_SIZE;
        (idx < self.sections.len()).then_some(idx)
    }
}
