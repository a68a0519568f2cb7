//! Demo driver: runs the search engine against a synthetic world.
//!
//! Seeds a deterministic world with ore veins, walks the coverage window
//! across it while streaming block mutations through the feed, and polls
//! the result version like a renderer would. Exercises the feature
//! registry and the speed arbiter along the way.

use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng as _, SeedableRng as _};
use tracing::info;

use scry_registry::{AppContext, CapabilityValue, Feature, FeatureRegistry};
use scry_search::{BlockPredicate, SearchCoordinator, SearchWorkers, StateSetPredicate};
use scry_spatial::{
    BlockPos, BlockState, ChunkPos, ChunkSnapshot, DimensionId, RadiusCoverage, WorldView,
};

const ORE: BlockState = BlockState(42);
const STONE: BlockState = BlockState(1);
const OVERWORLD: DimensionId = DimensionId(0);
const VIEW_RADIUS: i32 = 3;
const TICKS: u32 = 60;

/// Deterministic synthetic world: a stone layer with scattered ore.
struct DemoWorld {
    seed: u64,
    origin: ChunkPos,
}

impl DemoWorld {
    /// Ore layout for one chunk, derived from the world seed.
    fn ore_positions(&self, chunk: ChunkPos) -> Vec<BlockPos> {
        let chunk_seed = self
            .seed
            .wrapping_mul(31)
            .wrapping_add(chunk.x as u64)
            .wrapping_mul(31)
            .wrapping_add(chunk.z as u64);
        let mut rng = StdRng::seed_from_u64(chunk_seed);
        let count = rng.gen_range(0..4);
        (0..count)
            .map(|_| {
                BlockPos::new(
                    chunk.base_x() + rng.gen_range(0..16),
                    rng.gen_range(0..48),
                    chunk.base_z() + rng.gen_range(0..16),
                )
            })
            .collect()
    }
}

impl WorldView for DemoWorld {
    fn dimension(&self) -> DimensionId {
        OVERWORLD
    }

    fn covered_chunks(&self) -> Vec<ChunkPos> {
        RadiusCoverage::new(self.origin, VIEW_RADIUS).chunks()
    }

    fn snapshot(&self, pos: ChunkPos) -> Option<ChunkSnapshot> {
        let mut snapshot = ChunkSnapshot::new(pos, 0, 4);
        for y in 0..48 {
            for z in 0..16 {
                for x in 0..16 {
                    snapshot.set_state(
                        BlockPos::new(pos.base_x() + x, y, pos.base_z() + z),
                        STONE,
                    );
                }
            }
        }
        for ore in self.ore_positions(pos) {
            snapshot.set_state(ore, ORE);
        }
        Some(snapshot)
    }
}

/// Speed override backed by the arbitration table.
struct SpeedOverride {
    enabled: bool,
    multiplier: f64,
}

impl Feature for SpeedOverride {
    fn name(&self) -> &'static str {
        "speed-override"
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn on_enable(&mut self, cx: &mut AppContext) {
        self.enabled = true;
        cx.speed.request(self.name(), 10, self.multiplier, 40);
    }

    fn on_disable(&mut self, cx: &mut AppContext) {
        self.enabled = false;
        cx.speed.retract(&self.name());
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("scry_demo=info".parse()?),
        )
        .init();

    let mut world = DemoWorld {
        seed: 0x5eed,
        origin: ChunkPos::new(0, 0),
    };

    let predicate: Arc<dyn BlockPredicate> = Arc::new(StateSetPredicate::new([ORE]));
    let workers = Arc::new(SearchWorkers::with_default_size()?);
    let mut coordinator = SearchCoordinator::new(predicate, workers);
    coordinator.set_removal_hook(|pos| {
        tracing::debug!(?pos, "chunk left tracking");
    });

    let mut registry = FeatureRegistry::new();
    registry.register(Box::new(SpeedOverride {
        enabled: false,
        multiplier: 2.5,
    }))?;
    registry.register_capability::<SpeedOverride>(
        "speed-override",
        "speed-override.multiplier",
        |f| CapabilityValue::Float(f.multiplier),
        |f, v| {
            f.multiplier = v.as_float("speed-override.multiplier")?;
            Ok(())
        },
    )?;

    let mut cx = AppContext::new(coordinator.feed());
    registry.enable("speed-override", &mut cx)?;
    info!(speed = ?cx.active_speed(), "speed override in force");

    let feed = coordinator.feed();
    let mut last_version = coordinator.version();

    for tick in 0..TICKS {
        // Walk east one chunk every ten ticks.
        if tick % 10 == 9 {
            world.origin = ChunkPos::new(world.origin.x + 1, world.origin.z);
        }
        // A mutation burst mid-run: new ore appears near the origin.
        if tick == 25 {
            feed.block_changed(
                BlockPos::new(world.origin.base_x() + 8, 20, world.origin.base_z() + 8),
                ORE,
            );
        }

        let structural = coordinator.tick(&world);
        cx.speed.tick();

        if coordinator.version() != last_version {
            last_version = coordinator.version();
            let hits = coordinator.ready_matches().count();
            info!(
                tick,
                version = last_version,
                hits,
                ready_chunks = coordinator.ready_chunk_count(),
                searchers = coordinator.searcher_count(),
                structural,
                "results changed"
            );
        }

        std::thread::sleep(Duration::from_millis(10));
    }

    // TTL 40 has elapsed by now: the override lapsed on its own.
    info!(speed = ?cx.active_speed(), "speed override after expiry");

    let total = coordinator.ready_matches().count();
    info!(total, version = coordinator.version(), "final result set");
    Ok(())
}
