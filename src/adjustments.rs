//! Static per-location adjustment metadata for the shuffle.
//!
//! The table is strongly typed and validated when it is attached to a data
//! set, so a malformed entry surfaces as a configuration error up front
//! rather than mid-run.

use crate::rom_data::*;
use fnv::FnvHashMap;

/// Hand-authored placement metadata for one location.
#[derive(Clone, Debug, Default)]
pub struct LocationAdjustment {
    /// How many flier-class monsters this location may take.
    pub max_flyers: u8,
    /// Exclude this location from the shuffle entirely.
    pub skip: bool,
    /// Tower locations only participate when tower shuffling is enabled.
    pub tower: bool,
    /// Hand-authored (dy, dx) sub-tile deltas per slot index, applied to
    /// ground monsters in fixed layouts.
    pub fixed_offsets: FnvHashMap<u8, (i8, i8)>,
}

impl LocationAdjustment {
    pub fn skip() -> LocationAdjustment {
        LocationAdjustment {
            skip: true,
            ..Default::default()
        }
    }

    pub fn with_max_flyers(max_flyers: u8) -> LocationAdjustment {
        LocationAdjustment {
            max_flyers,
            ..Default::default()
        }
    }
}

/// Adjustment entries keyed by location id. Locations without an entry get
/// the defaults (no fliers, not skipped, no fixed offsets).
#[derive(Clone, Debug, Default)]
pub struct AdjustmentTable {
    entries: FnvHashMap<u8, LocationAdjustment>,
}

impl AdjustmentTable {
    pub fn new() -> AdjustmentTable {
        AdjustmentTable::default()
    }

    pub fn insert(&mut self, location_id: u8, adjustment: LocationAdjustment) {
        self.entries.insert(location_id, adjustment);
    }

    /// Look up a location's adjustment, falling back to the defaults.
    pub fn get(&self, location_id: u8) -> LocationAdjustment {
        self.entries.get(&location_id).cloned().unwrap_or_default()
    }

    /// Validate every entry against the data set it will adjust. Errors
    /// here are data/programming bugs, not placement conflicts.
    pub fn validate(&self, rom: &RomData) -> Result<(), String> {
        for (&id, adjustment) in &self.entries {
            let location = rom
                .locations
                .iter()
                .find(|l| l.id == id)
                .ok_or_else(|| format!("adjustment for unknown location {id:02x}"))?;
            if adjustment.skip && (adjustment.max_flyers > 0 || !adjustment.fixed_offsets.is_empty())
            {
                return Err(format!(
                    "adjustment for location {id:02x} is skipped but carries placement data"
                ));
            }
            for &slot in adjustment.fixed_offsets.keys() {
                if (slot as usize) >= location.spawns.len() {
                    return Err(format!(
                        "adjustment for location {id:02x} references slot {slot} out of {}",
                        location.spawns.len()
                    ));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::Tileset;
    use crate::tile::TileCoord;

    fn tiny_rom() -> RomData {
        let mut rom = RomData::new();
        rom.tilesets.insert(0, Tileset::uniform(0));
        rom.screens.insert(0, Screen::uniform(0));
        let mut loc = Location::new(0x10, 0, vec![vec![0]]);
        loc.spawns.push(Spawn::new(
            SpawnKind::Monster,
            1,
            TileCoord::new(0, 0, 3, 3),
        ));
        rom.locations.push(loc);
        rom
    }

    #[test]
    fn default_entry_for_unknown_location() {
        let table = AdjustmentTable::new();
        let adj = table.get(0x42);
        assert!(!adj.skip);
        assert_eq!(adj.max_flyers, 0);
    }

    #[test]
    fn out_of_range_slot_is_a_configuration_error() {
        let rom = tiny_rom();
        let mut table = AdjustmentTable::new();
        let mut adj = LocationAdjustment::default();
        adj.fixed_offsets.insert(5, (0, 1));
        table.insert(0x10, adj);
        assert!(table.validate(&rom).is_err());
    }

    #[test]
    fn skip_with_placement_data_is_rejected() {
        let rom = tiny_rom();
        let mut table = AdjustmentTable::new();
        let mut adj = LocationAdjustment::skip();
        adj.max_flyers = 2;
        table.insert(0x10, adj);
        assert!(table.validate(&rom).is_err());

        let mut ok = AdjustmentTable::new();
        ok.insert(0x10, LocationAdjustment::skip());
        assert!(ok.validate(&rom).is_ok());
    }
}
