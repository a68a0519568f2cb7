//! Chunk-grid spatial primitives for the scry search engine.
//!
//! The searchable space is divided into fixed-size vertical columns
//! ("chunks") identified by an integer `(x, z)` pair. A [`ChunkSnapshot`]
//! is an immutable copy of one chunk's block states taken at scan start,
//! so a background scan never races the live world.

pub mod pos;
pub mod snapshot;
pub mod view;

pub use pos::{BlockPos, BlockState, ChunkPos, DimensionId};
pub use snapshot::{ChunkSnapshot, Section, SECTION_SIZE, SECTION_VOLUME};
pub use view::{RadiusCoverage, WorldView};
