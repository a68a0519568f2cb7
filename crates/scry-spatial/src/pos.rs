//! Coordinate and state value types.

/// Chunk coordinates on the horizontal grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct ChunkPos {
    pub x: i32,
    pub z: i32,
}

impl ChunkPos {
    #[must_use]
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// World-space x of this chunk's west edge.
    #[must_use]
    pub const fn base_x(self) -> i32 {
        self.x << 4
    }

    /// World-space z of this chunk's north edge.
    #[must_use]
    pub const fn base_z(self) -> i32 {
        self.z << 4
    }

    /// Chebyshev distance in chunks.
    #[must_use]
    pub fn distance_to(self, other: Self) -> i32 {
        (self.x - other.x).abs().max((self.z - other.z).abs())
    }
}

/// A block position in world space.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// The chunk containing this position.
    #[must_use]
    pub const fn chunk(self) -> ChunkPos {
        ChunkPos::new(self.x >> 4, self.z >> 4)
    }
}

/// A compact block state identifier.
///
/// Opaque to the search core: predicates interpret it, the engine only
/// compares it for equality. [`BlockState::AIR`] is the background state
/// reported for sparse snapshot regions that were never captured.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct BlockState(pub u16);

impl BlockState {
    /// The empty/background state.
    pub const AIR: Self = Self(0);

    /// Sentinel written when capture could not read the backing storage.
    /// Resolves to `None` on lookup; the predicate is never shown it.
    pub const UNRESOLVED: Self = Self(u16::MAX);

    #[must_use]
    pub const fn is_air(self) -> bool {
        self.0 == Self::AIR.0
    }
}

/// Opaque identity of the surrounding context (world/dimension).
///
/// Compared only for equality; when it changes, every live searcher is
/// invalidated because chunk coordinates no longer refer to the same space.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DimensionId(pub u64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_to_chunk_mapping() {
        assert_eq!(BlockPos::new(0, 64, 0).chunk(), ChunkPos::new(0, 0));
        assert_eq!(BlockPos::new(15, 64, 15).chunk(), ChunkPos::new(0, 0));
        assert_eq!(BlockPos::new(16, 64, 0).chunk(), ChunkPos::new(1, 0));
        assert_eq!(BlockPos::new(-1, 64, -1).chunk(), ChunkPos::new(-1, -1));
        assert_eq!(BlockPos::new(-16, 64, -17).chunk(), ChunkPos::new(-1, -2));
    }

    #[test]
    fn test_chunk_distance() {
        let origin = ChunkPos::new(0, 0);
        assert_eq!(origin.distance_to(ChunkPos::new(3, -2)), 3);
        assert_eq!(origin.distance_to(origin), 0);
    }
}
