//! Per-tile passability from tileset effect bits, including the
//! flag-conditional alternate-metatile resolution.

use crate::constants::*;
use bitflags::*;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Interesting bits of the raw tile-effect byte.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct TileEffects: u8 {
        const NONE = 0;
        const PAIN = 0x01;
        const WATER = 0x02;
        const WALL = 0x04;
        const SLOPE = 0x20;
    }
}

/// Coarse terrain classification derived from the effect byte.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum TerrainClass {
    Open,
    Slope,
    Water,
    Wall,
}

impl TerrainClass {
    pub fn from_effects(effects: TileEffects) -> TerrainClass {
        if effects.contains(TileEffects::WALL) {
            TerrainClass::Wall
        } else if effects.contains(TileEffects::WATER) {
            TerrainClass::Water
        } else if effects.contains(TileEffects::SLOPE) {
            TerrainClass::Slope
        } else {
            TerrainClass::Open
        }
    }
}

/// A tileset's effect table plus the flag-conditional alternates for the
/// low metatile range.
#[derive(Clone, Serialize, Deserialize)]
pub struct Tileset {
    effects: Vec<u8>,
    alternates: Vec<u8>,
}

impl Tileset {
    pub fn new(effects: Vec<u8>, alternates: Vec<u8>) -> Tileset {
        debug_assert_eq!(effects.len(), 256);
        debug_assert_eq!(alternates.len(), ALTERNATE_METATILE_LIMIT as usize);
        Tileset { effects, alternates }
    }

    /// A tileset where every metatile carries the given effect byte.
    pub fn uniform(effect: u8) -> Tileset {
        Tileset {
            effects: vec![effect; 256],
            alternates: (0..ALTERNATE_METATILE_LIMIT).collect(),
        }
    }

    pub fn set_effect(&mut self, metatile: u8, effect: u8) {
        self.effects[metatile as usize] = effect;
    }

    pub fn set_alternate(&mut self, metatile: u8, alternate: u8) {
        self.alternates[metatile as usize] = alternate;
    }

    #[inline]
    pub fn effects(&self, metatile: u8) -> TileEffects {
        TileEffects::from_bits_truncate(self.effects[metatile as usize])
    }

    #[inline]
    pub fn alternate(&self, metatile: u8) -> u8 {
        self.alternates[metatile as usize]
    }
}

/// Resolves metatiles to passability for one location's tileset.
pub struct TerrainIndex<'a> {
    tileset: &'a Tileset,
    amphibious: bool,
}

impl<'a> TerrainIndex<'a> {
    pub fn new(tileset: &'a Tileset, amphibious: bool) -> Self {
        TerrainIndex { tileset, amphibious }
    }

    /// The effect byte governing this metatile, after the flag-conditional
    /// alternate is applied. The alternate only kicks in when the screen
    /// carries a flag, the metatile is in the alternate-eligible range with
    /// a distinct alternate id, and the default resolution is blocked.
    pub fn effective_effects(&self, metatile: u8, flagged: bool, flying: bool) -> TileEffects {
        let flying = flying || self.amphibious;
        let effects = self.tileset.effects(metatile);
        if flagged && metatile < ALTERNATE_METATILE_LIMIT {
            let alternate = self.tileset.alternate(metatile);
            if alternate != metatile && blocked_by(effects, flying) {
                return self.tileset.effects(alternate);
            }
        }
        effects
    }

    /// Whether this metatile blocks movement. Amphibious locations treat
    /// every monster as flying.
    pub fn is_blocked(&self, metatile: u8, flagged: bool, flying: bool) -> bool {
        let flying = flying || self.amphibious;
        blocked_by(self.effective_effects(metatile, flagged, flying), flying)
    }

    /// Hazard mask for ground placement in this location.
    pub fn hazard_mask(&self) -> TileEffects {
        if self.amphibious {
            TileEffects::from_bits_truncate(HAZARD_MASK_AMPHIBIOUS)
        } else {
            TileEffects::from_bits_truncate(HAZARD_MASK)
        }
    }
}

#[inline]
fn blocked_by(effects: TileEffects, flying: bool) -> bool {
    effects.contains(TileEffects::WALL) || (!flying && effects.contains(TileEffects::WATER))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walls_block_everyone_water_blocks_walkers() {
        let mut ts = Tileset::uniform(0);
        ts.set_effect(1, 0x04);
        ts.set_effect(2, 0x02);
        let idx = TerrainIndex::new(&ts, false);
        assert!(idx.is_blocked(1, false, false));
        assert!(idx.is_blocked(1, false, true));
        assert!(idx.is_blocked(2, false, false));
        assert!(!idx.is_blocked(2, false, true));
        assert!(!idx.is_blocked(0, false, false));
    }

    #[test]
    fn amphibious_locations_treat_everyone_as_flying() {
        let mut ts = Tileset::uniform(0);
        ts.set_effect(2, 0x02);
        let idx = TerrainIndex::new(&ts, true);
        assert!(!idx.is_blocked(2, false, false));
    }

    #[test]
    fn flag_override_reresolves_blocked_low_metatiles() {
        let mut ts = Tileset::uniform(0);
        // Metatile 4 is a wall whose alternate (0x30) is open.
        ts.set_effect(4, 0x04);
        ts.set_alternate(4, 0x30);
        let idx = TerrainIndex::new(&ts, false);
        assert!(idx.is_blocked(4, false, false));
        assert!(!idx.is_blocked(4, true, false));
        // An open metatile is never re-resolved, flagged or not.
        assert!(!idx.is_blocked(0, true, false));
    }

    #[test]
    fn flag_override_ignores_high_metatiles_and_self_alternates() {
        let mut ts = Tileset::uniform(0);
        ts.set_effect(0x21, 0x04);
        let idx = TerrainIndex::new(&ts, false);
        // Above the alternate-eligible range: stays blocked.
        assert!(idx.is_blocked(0x21, true, false));
        // In range but the alternate id equals the metatile id.
        ts.set_effect(5, 0x04);
        ts.set_alternate(5, 5);
        let idx = TerrainIndex::new(&ts, false);
        assert!(idx.is_blocked(5, true, false));
    }

    #[test]
    fn terrain_classes_derive_from_effect_bits() {
        assert_eq!(
            TerrainClass::from_effects(TileEffects::WALL),
            TerrainClass::Wall
        );
        assert_eq!(
            TerrainClass::from_effects(TileEffects::WATER | TileEffects::PAIN),
            TerrainClass::Water
        );
        assert_eq!(
            TerrainClass::from_effects(TileEffects::SLOPE),
            TerrainClass::Slope
        );
        assert_eq!(
            TerrainClass::from_effects(TileEffects::NONE),
            TerrainClass::Open
        );
    }
}
