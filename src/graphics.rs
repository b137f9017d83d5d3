//! Graphics collaborator: the constraint tables for NPCs and monsters,
//! sprite-palette shuffling, and the pattern-bank commit once a location's
//! tables are finalized.

use crate::constraint::*;
use crate::rom_data::*;
use fnv::FnvHashMap;
use log::*;
use rand::seq::SliceRandom;
use rand::Rng;

pub struct Graphics {
    /// Fixed graphics requirements for NPC/boss spawns, keyed by
    /// (location id, spawn id). A missing entry means no requirement.
    npc: FnvHashMap<(u8, u8), Constraint>,
    /// Per-monster requirements; location-specific overrides win.
    monster: FnvHashMap<u8, Constraint>,
    monster_overrides: FnvHashMap<(u8, u8), Constraint>,
    /// Monster id to sprite pattern page, for the bank-bit commit.
    pages: FnvHashMap<u8, u8>,
}

impl Graphics {
    /// Derive the default monster constraints from the monster records:
    /// the monster's page must occupy a pattern slot and its palette one of
    /// the two shuffleable palette slots.
    pub fn new(rom: &RomData) -> Graphics {
        let mut monster = FnvHashMap::default();
        let mut pages = FnvHashMap::default();
        for (&id, record) in &rom.monsters {
            monster.insert(
                id,
                Constraint::from_options(vec![
                    ConstraintOption {
                        pat0: SlotSet::Any,
                        pat1: SlotSet::single(record.pattern),
                        pal2: SlotSet::single(record.palette),
                        pal3: SlotSet::Any,
                    },
                    ConstraintOption {
                        pat0: SlotSet::Any,
                        pat1: SlotSet::single(record.pattern),
                        pal2: SlotSet::Any,
                        pal3: SlotSet::single(record.palette),
                    },
                ]),
            );
            pages.insert(id, record.pattern);
        }
        Graphics {
            npc: FnvHashMap::default(),
            monster,
            monster_overrides: FnvHashMap::default(),
            pages,
        }
    }

    pub fn register_npc(&mut self, location_id: u8, spawn_id: u8, constraint: Constraint) {
        self.npc.insert((location_id, spawn_id), constraint);
    }

    pub fn register_monster_override(
        &mut self,
        location_id: u8,
        monster_id: u8,
        constraint: Constraint,
    ) {
        self.monster_overrides
            .insert((location_id, monster_id), constraint);
    }

    pub fn npc_constraint(&self, location_id: u8, spawn_id: u8) -> Option<&Constraint> {
        self.npc.get(&(location_id, spawn_id))
    }

    pub fn monster_constraint(&self, location_id: u8, monster_id: u8) -> Option<&Constraint> {
        self.monster_overrides
            .get(&(location_id, monster_id))
            .or_else(|| self.monster.get(&monster_id))
    }

    /// Permute the palette ids across every monster constraint. NPC
    /// constraints are untouched; their palettes are authored.
    pub fn shuffle_palettes<R: Rng>(&mut self, rng: &mut R) {
        let mut palettes: Vec<u8> = Vec::new();
        for constraint in self.monster.values().chain(self.monster_overrides.values()) {
            for option in constraint.options() {
                for set in [option.pal2, option.pal3] {
                    if let SlotSet::Of(_) = set {
                        for id in 0..128u8 {
                            if set.contains(id) && !palettes.contains(&id) {
                                palettes.push(id);
                            }
                        }
                    }
                }
            }
        }
        palettes.sort_unstable();
        let mut shuffled = palettes.clone();
        shuffled.shuffle(rng);
        debug!("shuffled {} monster palettes", shuffled.len());
        let map = move |id: u8| {
            palettes
                .iter()
                .position(|&p| p == id)
                .map(|i| shuffled[i])
                .unwrap_or(id)
        };
        for constraint in self
            .monster
            .values_mut()
            .chain(self.monster_overrides.values_mut())
        {
            *constraint = constraint.remap_palettes(&map);
        }
    }

    /// Commit a monster spawn's pattern-bank bit against the location's
    /// finalized pattern tables. Non-monster spawns keep their bank.
    pub fn configure(&self, location: &mut Location, spawn_index: usize) {
        let Some(patterns) = location.sprite_patterns else {
            return;
        };
        let spawn = &mut location.spawns[spawn_index];
        if !spawn.used || !spawn.is_monster() {
            return;
        }
        let Some(&page) = self.pages.get(&spawn.id) else {
            return;
        };
        if patterns[1] == page {
            spawn.pattern_bank = 1;
        } else if patterns[0] == page {
            spawn.pattern_bank = 0;
        } else {
            warn!(
                "location {:02x}: monster {:02x} page {:02x} absent from tables {:02x?}",
                location.id, spawn.id, page, patterns
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::TileCoord;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn rom_with_monsters() -> RomData {
        let mut rom = RomData::new();
        rom.monsters
            .insert(0x60, Monster::new(0x60, Placement::Normal, 0x50, 0x22));
        rom.monsters
            .insert(0x61, Monster::new(0x61, Placement::Normal, 0x52, 0x23));
        rom
    }

    #[test]
    fn default_monster_constraint_requires_page_and_palette() {
        let rom = rom_with_monsters();
        let gfx = Graphics::new(&rom);
        let constraint = gfx.monster_constraint(0, 0x60).unwrap();
        assert!(constraint
            .options()
            .iter()
            .all(|o| o.pat1.contains(0x50)));
        assert!(constraint
            .options()
            .iter()
            .any(|o| o.pal2.contains(0x22)));
    }

    #[test]
    fn overrides_shadow_the_default_table() {
        let rom = rom_with_monsters();
        let mut gfx = Graphics::new(&rom);
        gfx.register_monster_override(0x10, 0x60, Constraint::any());
        assert_eq!(gfx.monster_constraint(0x10, 0x60), Some(&Constraint::any()));
        assert_ne!(gfx.monster_constraint(0x11, 0x60), Some(&Constraint::any()));
    }

    #[test]
    fn palette_shuffle_permutes_within_the_palette_universe() {
        let rom = rom_with_monsters();
        let mut gfx = Graphics::new(&rom);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        gfx.shuffle_palettes(&mut rng);
        for id in [0x60u8, 0x61] {
            let constraint = gfx.monster_constraint(0, id).unwrap();
            for option in constraint.options() {
                for set in [option.pal2, option.pal3] {
                    if set.size().is_some() {
                        assert!(set.contains(0x22) || set.contains(0x23));
                    }
                }
            }
            // Each option still leaves one palette slot unconstrained.
            assert!(constraint.options().iter().all(|o| o.pal2.size().is_none()
                || o.pal3.size().is_none()));
        }
    }

    #[test]
    fn configure_sets_the_bank_of_the_matching_slot() {
        let rom = rom_with_monsters();
        let gfx = Graphics::new(&rom);
        let mut location = Location::new(5, 0, vec![vec![0]]);
        location.sprite_patterns = Some([0x52, 0x50]);
        location
            .spawns
            .push(Spawn::new(SpawnKind::Monster, 0x60, TileCoord::new(0, 0, 3, 3)));
        location
            .spawns
            .push(Spawn::new(SpawnKind::Monster, 0x61, TileCoord::new(0, 0, 5, 5)));
        gfx.configure(&mut location, 0);
        gfx.configure(&mut location, 1);
        assert_eq!(location.spawns[0].pattern_bank, 1);
        assert_eq!(location.spawns[1].pattern_bank, 0);
    }
}
