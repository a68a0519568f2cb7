//! External world collaborators.

use crate::pos::{ChunkPos, DimensionId};
use crate::snapshot::ChunkSnapshot;

/// The search engine's window onto the live world.
///
/// Implemented by the host application. Called only from the driver thread:
/// coverage is queried once per tick and snapshots are captured before a
/// scan is handed to the worker pool, so implementations never see
/// concurrent calls.
pub trait WorldView {
    /// Identity of the current dimension/context. A change invalidates
    /// every live searcher.
    fn dimension(&self) -> DimensionId;

    /// Chunk coordinates currently inside the target coverage area.
    fn covered_chunks(&self) -> Vec<ChunkPos>;

    /// Capture an immutable copy of a chunk's current contents.
    ///
    /// `None` means the chunk is not resident/loaded; the scan then
    /// completes immediately with zero results.
    fn snapshot(&self, pos: ChunkPos) -> Option<ChunkSnapshot>;
}

/// Square coverage area of `radius` chunks around a movable origin.
#[derive(Clone, Copy, Debug)]
pub struct RadiusCoverage {
    pub origin: ChunkPos,
    pub radius: i32,
}

impl RadiusCoverage {
    #[must_use]
    pub const fn new(origin: ChunkPos, radius: i32) -> Self {
        Self { origin, radius }
    }

    /// Whether a chunk falls inside the area.
    #[must_use]
    pub fn contains(&self, pos: ChunkPos) -> bool {
        self.origin.distance_to(pos) <= self.radius
    }

    /// All covered chunk coordinates, row-major.
    #[must_use]
    pub fn chunks(&self) -> Vec<ChunkPos> {
        let mut out = Vec::with_capacity(((self.radius * 2 + 1).pow(2)) as usize);
        for x in (self.origin.x - self.radius)..=(self.origin.x + self.radius) {
            for z in (self.origin.z - self.radius)..=(self.origin.z + self.radius) {
                out.push(ChunkPos::new(x, z));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_radius_coverage_count_and_membership() {
        let coverage = RadiusCoverage::new(ChunkPos::new(2, -3), 2);

        let chunks = coverage.chunks();
        assert_eq!(chunks.len(), 25);
        assert!(chunks.iter().all(|&c| coverage.contains(c)));

        assert!(coverage.contains(ChunkPos::new(4, -1)));
        assert!(!coverage.contains(ChunkPos::new(5, -3)));
    }

    #[test]
    fn test_zero_radius_is_single_chunk() {
        let coverage = RadiusCoverage::new(ChunkPos::new(0, 0), 0);
        assert_eq!(coverage.chunks(), vec![ChunkPos::new(0, 0)]);
    }
}
