//! Placement pools and the randomized position picker.
//!
//! A multi-source BFS ranks every tile of a location by how far it sits
//! from the entrance-reachable frontier (distance 0 = reachable ground).
//! The four pools bucket that ranking: `normal` is safe reachable ground,
//! `moth` and `bird` are scenery at increasing depths, and `plant` hugs
//! the band just past the walkable edge (or, for one special location, a
//! specific flower metatile).

use crate::constants::*;
use crate::reachability::*;
use crate::rom_data::*;
use crate::tile::*;
use fnv::FnvHashMap;
use log::*;
use rand::Rng;
use std::collections::VecDeque;

/// The four candidate tile pools. Membership may overlap between pools.
#[derive(Clone, Debug, Default)]
pub struct PlacementPools {
    pub normal: Vec<TileCoord>,
    pub moth: Vec<TileCoord>,
    pub bird: Vec<TileCoord>,
    pub plant: Vec<TileCoord>,
}

impl PlacementPools {
    /// Build the pools for one location.
    pub fn build(rom: &RomData, location: &Location) -> PlacementPools {
        let reachable = reachable_tiles(rom, location);
        let width = location.width();
        let height = location.height();
        let hazard = rom.terrain_index(location).hazard_mask();

        // Multi-source BFS outward from the reachable frontier, over every
        // in-bounds tile regardless of terrain. The boss screen is excluded
        // from seeds, expansion, and pools alike.
        let mut distance: FnvHashMap<TileCoord, u32> = FnvHashMap::default();
        let mut queue: VecDeque<(TileCoord, u32)> = VecDeque::new();
        for &tile in reachable.keys() {
            if location.is_boss_screen(tile) {
                continue;
            }
            distance.insert(tile, 0);
            queue.push_back((tile, 0));
        }
        while let Some((tile, dist)) = queue.pop_front() {
            let next = dist + 1;
            for neighbor in tile.neighbors(width, height) {
                if location.is_boss_screen(neighbor) || distance.contains_key(&neighbor) {
                    continue;
                }
                distance.insert(neighbor, next);
                queue.push_back((neighbor, next));
            }
        }

        let mut pools = PlacementPools::default();
        for (&tile, &dist) in &distance {
            if dist == 0 {
                let effects = reachable[&tile];
                if (effects & hazard).is_empty() {
                    pools.normal.push(tile);
                }
            }
            if (MOTH_MIN_DISTANCE..=MOTH_MAX_DISTANCE).contains(&dist) {
                pools.moth.push(tile);
            }
            if dist >= BIRD_MIN_DISTANCE {
                pools.bird.push(tile);
            }
            match location.plant_tile {
                Some(flower) => {
                    if rom.metatile(location, tile) == flower {
                        pools.plant.push(tile);
                    }
                }
                None => {
                    if (PLANT_MIN_DISTANCE..=PLANT_MAX_DISTANCE).contains(&dist) {
                        pools.plant.push(tile);
                    }
                }
            }
        }
        // Hash iteration order must not leak into pool order.
        pools.normal.sort_unstable();
        pools.moth.sort_unstable();
        pools.bird.sort_unstable();
        pools.plant.sort_unstable();
        debug!(
            "location {:02x}: pools normal={} moth={} bird={} plant={}",
            location.id,
            pools.normal.len(),
            pools.moth.len(),
            pools.bird.len(),
            pools.plant.len()
        );
        pools
    }

    fn pool_mut(&mut self, placement: Placement) -> &mut Vec<TileCoord> {
        match placement {
            Placement::Normal => &mut self.normal,
            Placement::Moth => &mut self.moth,
            Placement::Bird => &mut self.bird,
            Placement::Plant => &mut self.plant,
        }
    }
}

/// Draws positions from the pools for one location's assignment run.
///
/// Uniform draws without replacement, rejecting candidates that crowd an
/// earlier placement or a used entrance. This is rejection sampling, not
/// an exact packer: a feasible packing that is hard to sample into will
/// come back as exhaustion.
pub struct MonsterPlacer {
    pools: PlacementPools,
    entrances: Vec<TileCoord>,
    placed: Vec<(TileCoord, u8)>,
}

impl MonsterPlacer {
    pub fn new(rom: &RomData, location: &Location) -> MonsterPlacer {
        MonsterPlacer {
            pools: PlacementPools::build(rom, location),
            entrances: location
                .entrances
                .iter()
                .filter(|e| e.used)
                .map(|e| e.tile)
                .collect(),
            placed: Vec::new(),
        }
    }

    /// Pick a position for a monster of the given placement category and
    /// clearance radius, or `None` once the pool is exhausted.
    pub fn place<R: Rng>(
        &mut self,
        rng: &mut R,
        placement: Placement,
        clearance: u8,
    ) -> Option<TileCoord> {
        let MonsterPlacer {
            pools,
            entrances,
            placed,
        } = self;
        let pool = pools.pool_mut(placement);
        while !pool.is_empty() {
            let candidate = pool.swap_remove(rng.gen_range(0..pool.len()));
            let crowded = placed.iter().any(|&(at, other)| {
                let radius = clearance as u32 + other as u32;
                candidate.distance_sq(at) <= radius * radius
            }) || entrances.iter().any(|&at| {
                let radius = clearance as u32 + 1;
                candidate.distance_sq(at) <= radius * radius
            });
            if crowded {
                trace!("rejecting crowded candidate {candidate:?}");
                continue;
            }
            placed.push((candidate, clearance));
            return Some(candidate);
        }
        None
    }
}
