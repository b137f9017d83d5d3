//! Entrance reachability: a union-find flood fill over the passable tiles
//! of one location. Only connected components containing a used entrance
//! survive; everything else is scenery as far as placement is concerned.

use crate::rom_data::*;
use crate::terrain::*;
use crate::tile::*;
use fnv::{FnvHashMap, FnvHashSet};
use log::*;

/// Disjoint sets over packed tile coordinates, with path compression.
struct UnionFind {
    parent: FnvHashMap<u16, u16>,
}

impl UnionFind {
    fn new() -> UnionFind {
        UnionFind {
            parent: FnvHashMap::default(),
        }
    }

    fn insert(&mut self, tile: u16) {
        self.parent.entry(tile).or_insert(tile);
    }

    fn find(&mut self, tile: u16) -> u16 {
        let mut root = tile;
        while self.parent[&root] != root {
            root = self.parent[&root];
        }
        // Compress the walked path.
        let mut current = tile;
        while current != root {
            let next = self.parent[&current];
            self.parent.insert(current, root);
            current = next;
        }
        root
    }

    fn union(&mut self, a: u16, b: u16) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra != rb {
            self.parent.insert(ra, rb);
        }
    }
}

/// Compute the tiles of `location` reachable from its used entrances,
/// mapped to their (alternate-resolved) effect bits.
///
/// Exit tiles are excluded from the passable set unconditionally. A used
/// entrance sitting on a blocked tile contributes nothing.
pub fn reachable_tiles(rom: &RomData, location: &Location) -> FnvHashMap<TileCoord, TileEffects> {
    let index = rom.terrain_index(location);
    let width = location.width();
    let height = location.height();
    let exits: FnvHashSet<TileCoord> = location.exits.iter().copied().collect();

    // Pass 1: classify every in-bounds sub-tile.
    let mut passable: FnvHashMap<TileCoord, TileEffects> = FnvHashMap::default();
    for screen_y in 0..height {
        for screen_x in 0..width {
            let screen_id = location.screen_id_at(screen_y, screen_x);
            let screen = &rom.screens[&screen_id];
            let flagged = location.is_flagged(screen_y, screen_x);
            for tile_y in 0..crate::constants::SCREEN_HEIGHT {
                for tile_x in 0..crate::constants::SCREEN_WIDTH {
                    let tile = TileCoord::new(screen_y, screen_x, tile_y, tile_x);
                    if exits.contains(&tile) {
                        continue;
                    }
                    let metatile = screen.get(tile_y, tile_x);
                    if !index.is_blocked(metatile, flagged, false) {
                        passable.insert(tile, index.effective_effects(metatile, flagged, false));
                    }
                }
            }
        }
    }

    // Pass 2: union 4-adjacent passable tiles. Right/below neighbors wrap
    // across screen edges.
    let mut sets = UnionFind::new();
    for &tile in passable.keys() {
        sets.insert(tile.packed_repr());
    }
    for &tile in passable.keys() {
        if let Some(right) = tile.right(width) {
            if passable.contains_key(&right) {
                sets.union(tile.packed_repr(), right.packed_repr());
            }
        }
        if let Some(below) = tile.below(height) {
            if passable.contains_key(&below) {
                sets.union(tile.packed_repr(), below.packed_repr());
            }
        }
    }

    // Pass 3: keep only components holding a used entrance.
    let mut entrance_roots: FnvHashSet<u16> = FnvHashSet::default();
    for entrance in &location.entrances {
        if !entrance.used {
            continue;
        }
        if passable.contains_key(&entrance.tile) {
            entrance_roots.insert(sets.find(entrance.tile.packed_repr()));
        }
    }
    if entrance_roots.is_empty() {
        trace!(
            "location {:02x}: no passable used entrance, reachable set empty",
            location.id
        );
        return FnvHashMap::default();
    }

    let reachable: FnvHashMap<TileCoord, TileEffects> = passable
        .into_iter()
        .filter(|(tile, _)| entrance_roots.contains(&sets.find(tile.packed_repr())))
        .collect();
    trace!(
        "location {:02x}: {} reachable tiles from {} entrance components",
        location.id,
        reachable.len(),
        entrance_roots.len()
    );
    reachable
}
