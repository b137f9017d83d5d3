//! Redistributes monster encounters across a game's location graph.
//!
//! Each location renders sprites out of a handful of shared pattern and
//! palette table slots, so reassignment is a constrained problem: the
//! shuffle harvests every eligible spawn into a global pool, then greedily
//! refills each location's slots under a graphics-compatibility algebra,
//! flier quotas, class uniqueness, and terrain-derived placement pools.
//!
//! The crate operates on already-resident data ([`rom_data::RomData`]);
//! parsing and serialization of the underlying binary live elsewhere.

pub mod adjustments;
pub mod constants;
pub mod constraint;
pub mod graphics;
pub mod placer;
pub mod pool;
pub mod reachability;
pub mod rom_data;
pub mod terrain;
pub mod tile;

pub use adjustments::{AdjustmentTable, LocationAdjustment};
pub use constraint::{Constraint, ConstraintOption, SlotSet};
pub use graphics::Graphics;
pub use placer::{MonsterPlacer, PlacementPools};
pub use pool::{shuffle_monsters, shuffle_monsters_with_progress, ShuffleConfig, ShuffleReport};
pub use reachability::reachable_tiles;
pub use rom_data::{Location, Monster, Placement, RomData, Spawn, SpawnKind};
pub use terrain::{TerrainClass, TerrainIndex, TileEffects, Tileset};
pub use tile::TileCoord;
