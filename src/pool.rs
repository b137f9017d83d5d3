//! The global monster pool: harvest every shuffleable spawn, shuffle, then
//! greedily re-assign monsters to locations under the graphics algebra,
//! flier quotas, and class uniqueness.
//!
//! Every rejection along the way is local: the candidate goes back (or the
//! next one is tried) and the run continues. Slots that survive both the
//! global pass and the used-pool pass are neutralized and reported, never
//! fatal. The only hard errors are configuration bugs: a malformed
//! adjustment table, or fixed spawns whose authored graphics cannot
//! coexist.

use crate::adjustments::*;
use crate::constants::*;
use crate::constraint::Constraint;
use crate::graphics::Graphics;
use crate::placer::MonsterPlacer;
use crate::rom_data::*;
use fnv::FnvHashMap;
use itertools::Itertools;
use log::*;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Feature toggles for one shuffle run.
#[derive(Copy, Clone, Debug, Default)]
pub struct ShuffleConfig {
    /// Tower locations keep their monsters unless this is set.
    pub shuffle_tower_monsters: bool,
    /// Allows the recolor fallback when a graphics merge fails.
    pub shuffle_sprite_palettes: bool,
}

/// One harvested monster spawn; created and consumed within a single run.
/// Graphics requirements are always resolved through the [`Graphics`]
/// tables (which palette shuffling rewrites), so only the identity and the
/// spawn's bank bit travel with the request.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct MonsterSlotRequest {
    pub monster_id: u8,
    pub pattern_bank: u8,
}

/// A location's open slots and static adjustment, queued for assignment.
struct LocationSlots {
    index: usize,
    id: u8,
    slots: Vec<u8>,
    max_flyers: u8,
    tower: bool,
    fixed_offsets: FnvHashMap<u8, (i8, i8)>,
}

/// How one location fared.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct LocationOutcome {
    pub filled: u32,
    pub neutralized: u32,
}

/// Per-location fill results, keyed by location id.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ShuffleReport {
    outcomes: FnvHashMap<u8, LocationOutcome>,
}

impl ShuffleReport {
    pub fn outcome(&self, location_id: u8) -> Option<&LocationOutcome> {
        self.outcomes.get(&location_id)
    }

    /// Slots neutralized across the whole run.
    pub fn shortfall(&self) -> u32 {
        self.outcomes.values().map(|o| o.neutralized).sum()
    }

    pub fn filled(&self) -> u32 {
        self.outcomes.values().map(|o| o.filled).sum()
    }
}

impl fmt::Display for ShuffleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (id, outcome) in self.outcomes.iter().sorted_by_key(|(id, _)| **id) {
            writeln!(
                f,
                "location {id:02x}: filled {}, neutralized {}",
                outcome.filled, outcome.neutralized
            )?;
        }
        Ok(())
    }
}

/// Run the whole shuffle with an internally-seeded RNG. Two runs over the
/// same corpus and seed produce identical spawn tables.
pub fn shuffle_monsters(
    rom: &mut RomData,
    adjustments: &AdjustmentTable,
    graphics: &mut Graphics,
    config: &ShuffleConfig,
    seed: u64,
) -> Result<ShuffleReport, String> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    shuffle_monsters_with_progress(rom, adjustments, graphics, config, &mut rng, |_, _| {})
}

/// As [`shuffle_monsters`], with a caller-provided RNG and a progress
/// callback invoked as `(done, total)` after each location.
pub fn shuffle_monsters_with_progress<R: Rng>(
    rom: &mut RomData,
    adjustments: &AdjustmentTable,
    graphics: &mut Graphics,
    config: &ShuffleConfig,
    rng: &mut R,
    mut progress: impl FnMut(usize, usize),
) -> Result<ShuffleReport, String> {
    adjustments.validate(rom)?;
    if config.shuffle_sprite_palettes {
        graphics.shuffle_palettes(rng);
    }

    // Collect: harvest every eligible monster spawn and each contributing
    // location's open slot indices.
    let mut monsters: Vec<MonsterSlotRequest> = Vec::new();
    let mut locations: Vec<LocationSlots> = Vec::new();
    for (index, location) in rom.locations.iter().enumerate() {
        if !location.used {
            continue;
        }
        let adjustment = adjustments.get(location.id);
        if adjustment.skip {
            trace!("location {:02x}: skipped by adjustment", location.id);
            continue;
        }
        if adjustment.tower && !config.shuffle_tower_monsters {
            continue;
        }
        if !location.has_sprite_tables() {
            continue;
        }
        let mut slots = Vec::new();
        for (slot, spawn) in location.spawns.iter().enumerate() {
            if !spawn.used || !spawn.is_monster() {
                continue;
            }
            if !rom.monsters.contains_key(&spawn.id) {
                continue;
            }
            monsters.push(MonsterSlotRequest {
                monster_id: spawn.id,
                pattern_bank: spawn.pattern_bank,
            });
            slots.push(slot as u8);
        }
        if slots.is_empty() {
            continue;
        }
        locations.push(LocationSlots {
            index,
            id: location.id,
            slots,
            max_flyers: adjustment.max_flyers,
            tower: adjustment.tower,
            fixed_offsets: adjustment.fixed_offsets,
        });
    }
    debug!(
        "collected {} monsters over {} locations",
        monsters.len(),
        locations.len()
    );

    // Shuffle the processing order and the global list independently.
    locations.shuffle(rng);
    monsters.shuffle(rng);

    let total = locations.len();
    let mut used_pool: Vec<MonsterSlotRequest> = Vec::new();
    let mut report = ShuffleReport::default();
    for (done, slots) in locations.into_iter().enumerate() {
        // Towers are filtered at collection; re-check in case the slot
        // list was built with a different config.
        if slots.tower && !config.shuffle_tower_monsters {
            continue;
        }
        let id = slots.id;
        let outcome =
            assign_location(rom, graphics, config, rng, slots, &mut monsters, &mut used_pool)?;
        report.outcomes.insert(id, outcome);
        progress(done + 1, total);
    }
    info!(
        "monster shuffle filled {} slots, neutralized {}",
        report.filled(),
        report.shortfall()
    );
    Ok(report)
}

/// All the mutable state of one location's assignment.
struct PlacementSession<'a> {
    location: &'a mut Location,
    monster_table: &'a FnvHashMap<u8, Monster>,
    graphics: &'a Graphics,
    config: &'a ShuffleConfig,
    placer: Option<MonsterPlacer>,
    constraint: Constraint,
    /// Chosen representative monster id per class at this location.
    classes: FnvHashMap<u8, u8>,
    open_slots: Vec<u8>,
    fixed_offsets: FnvHashMap<u8, (i8, i8)>,
    flyers_left: u8,
}

impl PlacementSession<'_> {
    fn is_flyer(&self, request: &MonsterSlotRequest) -> bool {
        self.monster_table
            .get(&request.monster_id)
            .map_or(false, |m| m.flyer)
    }

    /// The acceptance test, short-circuiting on the first failure. Every
    /// failure is recoverable; the caller just tries the next candidate.
    fn try_add_monster<R: Rng>(&mut self, rng: &mut R, request: &MonsterSlotRequest) -> bool {
        if self.open_slots.is_empty() {
            return false;
        }
        let Some(monster) = self.monster_table.get(&request.monster_id) else {
            return false;
        };

        // 1. Class uniqueness: one representative id per class here.
        if let Some(class) = monster.class {
            if let Some(&chosen) = self.classes.get(&class) {
                if chosen != monster.id {
                    trace!(
                        "location {:02x}: class {:02x} already uses {:02x}, rejecting {:02x}",
                        self.location.id,
                        class,
                        chosen,
                        monster.id
                    );
                    return false;
                }
            }
        }

        // 2. Flier quota, consumed on the attempt.
        if monster.flyer {
            if self.flyers_left == 0 {
                trace!(
                    "location {:02x}: flier quota exhausted, rejecting {:02x}",
                    self.location.id,
                    monster.id
                );
                return false;
            }
            self.flyers_left -= 1;
        }

        // 3. Graphics compatibility, with the gated recolor fallback.
        let Some(requirement) = self
            .graphics
            .monster_constraint(self.location.id, monster.id)
        else {
            return false;
        };
        let merged = match self.constraint.try_meet(requirement, false) {
            Some(merged) => merged,
            None => {
                let recolorable = self.config.shuffle_sprite_palettes
                    && self.constraint.pal2_size().is_none()
                    && self.constraint.pal3_size().is_none();
                let retried = recolorable.then(|| self.constraint.try_meet(requirement, true));
                match retried.flatten() {
                    Some(merged) => merged,
                    None => {
                        trace!(
                            "location {:02x}: graphics conflict for {:02x}",
                            self.location.id,
                            monster.id
                        );
                        return false;
                    }
                }
            }
        };

        // 4. Randomized layouts must yield a concrete position.
        let mut position = None;
        if self.location.randomized_map {
            let Some(placer) = self.placer.as_mut() else {
                return false;
            };
            match placer.place(rng, monster.placement, monster.clearance) {
                Some(at) => position = Some(at),
                None => {
                    trace!(
                        "location {:02x}: pool exhausted for {:02x} ({:?})",
                        self.location.id,
                        monster.id,
                        monster.placement
                    );
                    return false;
                }
            }
        }

        // 5. Accept: commit the merge, register the class, claim a slot.
        self.constraint = merged;
        if let Some(class) = monster.class {
            self.classes.insert(class, monster.id);
        }
        let wants_offset = !(monster.flyer || monster.moth_or_bat);
        let chosen = self
            .open_slots
            .iter()
            .position(|slot| self.fixed_offsets.contains_key(slot) == wants_offset)
            .unwrap_or(0);
        let slot = self.open_slots.remove(chosen);
        let width = self.location.width();
        let height = self.location.height();
        let spawn = &mut self.location.spawns[slot as usize];
        spawn.used = true;
        spawn.id = monster.id;
        spawn.pattern_bank = request.pattern_bank;
        if let Some(at) = position {
            spawn.set_tile_coord(at);
        } else if wants_offset {
            if let Some(&(dy, dx)) = self.fixed_offsets.get(&slot) {
                if let Some(at) = spawn.tile_coord().offset(dy, dx, width, height) {
                    spawn.set_tile_coord(at);
                }
            }
        }
        trace!(
            "location {:02x}: slot {} takes monster {:02x}",
            self.location.id,
            slot,
            monster.id
        );
        true
    }
}

fn assign_location<R: Rng>(
    rom: &mut RomData,
    graphics: &Graphics,
    config: &ShuffleConfig,
    rng: &mut R,
    slots: LocationSlots,
    monsters: &mut Vec<MonsterSlotRequest>,
    used_pool: &mut Vec<MonsterSlotRequest>,
) -> Result<LocationOutcome, String> {
    let placer = {
        let location = &rom.locations[slots.index];
        if location.randomized_map {
            Some(MonsterPlacer::new(rom, location))
        } else {
            None
        }
    };
    let location = &mut rom.locations[slots.index];
    let total_slots = slots.slots.len();

    // Seed the running constraint from the location's non-negotiable
    // spawns. A failure here is authored data contradicting itself.
    let mut constraint = Constraint::any();
    for spawn in location.spawns.iter().filter(|s| s.used) {
        let requirement = match spawn.kind {
            SpawnKind::Chest if spawn.id == SPECIAL_CHEST_ID => Some(Constraint::special_chest()),
            SpawnKind::Chest if spawn.is_mimic() => Some(Constraint::mimic()),
            SpawnKind::Chest => Some(Constraint::treasure_chest()),
            SpawnKind::Npc | SpawnKind::Boss => {
                graphics.npc_constraint(location.id, spawn.id).cloned()
            }
            SpawnKind::Wall if location.shooting_walls => Some(Constraint::shooting_wall()),
            _ => None,
        };
        if let Some(requirement) = requirement {
            constraint = constraint
                .meet(&requirement, true)
                .map_err(|e| format!("location {:02x}: {e}", location.id))?;
        }
    }

    let mut session = PlacementSession {
        location,
        monster_table: &rom.monsters,
        graphics,
        config,
        placer,
        constraint,
        classes: FnvHashMap::default(),
        open_slots: slots.slots,
        fixed_offsets: slots.fixed_offsets,
        flyers_left: slots.max_flyers,
    };

    // Flier pre-pass over the head of the global list, so the scarce
    // flier-capable slots are not starved by processing order.
    let mut index = 0;
    let mut scanned = 0;
    while index < monsters.len()
        && scanned < FLYER_SCAN_LIMIT
        && session.flyers_left > 0
        && !session.open_slots.is_empty()
    {
        scanned += 1;
        let request = monsters[index];
        if session.is_flyer(&request) && session.try_add_monster(rng, &request) {
            monsters.remove(index);
        } else {
            index += 1;
        }
    }

    // Main pass over the global list.
    let mut index = 0;
    while index < monsters.len() && !session.open_slots.is_empty() {
        let request = monsters[index];
        if session.try_add_monster(rng, &request) {
            monsters.remove(index);
            if !session.is_flyer(&request) {
                used_pool.push(request);
            }
        } else {
            index += 1;
        }
    }

    // Used-pool pass: monsters already placed elsewhere may appear again.
    // Accepted entries rotate to the back instead of being consumed.
    let mut index = 0;
    while index < used_pool.len() && !session.open_slots.is_empty() {
        let request = used_pool[index];
        if session.try_add_monster(rng, &request) {
            let rotated = used_pool.remove(index);
            used_pool.push(rotated);
        } else {
            index += 1;
        }
    }

    // Whatever is still open is unfillable this run.
    let neutralized = session.open_slots.len();
    for &slot in &session.open_slots {
        session.location.spawns[slot as usize].neutralize();
    }
    if neutralized > 0 {
        warn!(
            "location {:02x}: neutralized {} of {} slots",
            session.location.id, neutralized, total_slots
        );
    }

    // Finalize the sprite tables, then commit every spawn's bank bit.
    session.constraint.fix(session.location, rng);
    for slot in 0..session.location.spawns.len() {
        graphics.configure(session.location, slot);
    }

    Ok(LocationOutcome {
        filled: (total_slots - neutralized) as u32,
        neutralized: neutralized as u32,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::Tileset;
    use crate::tile::TileCoord;

    fn ground(id: u8) -> Monster {
        Monster::new(id, Placement::Normal, 0x50, 0x22)
    }

    fn flyer(id: u8) -> Monster {
        let mut m = Monster::new(id, Placement::Normal, 0x51, 0x22);
        m.flyer = true;
        m
    }

    fn open_rom() -> RomData {
        let mut rom = RomData::new();
        rom.tilesets.insert(0, Tileset::uniform(0));
        rom.screens.insert(0, Screen::uniform(0));
        rom
    }

    fn add_location(rom: &mut RomData, id: u8, monster_ids: &[u8]) {
        let mut loc = Location::new(id, 0, vec![vec![0]]);
        loc.entrances.push(Entrance {
            tile: TileCoord::new(0, 0, 7, 7),
            used: true,
        });
        for (i, &monster_id) in monster_ids.iter().enumerate() {
            loc.spawns.push(Spawn::new(
                SpawnKind::Monster,
                monster_id,
                TileCoord::new(0, 0, 3 + i as u8, 3),
            ));
        }
        rom.locations.push(loc);
    }

    #[test]
    fn zero_flier_location_fills_with_ground_monsters_only() {
        let mut rom = open_rom();
        for id in 0x60..0x65 {
            rom.monsters.insert(id, ground(id));
        }
        rom.monsters.insert(0x70, flyer(0x70));
        rom.monsters.insert(0x71, flyer(0x71));
        add_location(&mut rom, 0x10, &[0x60, 0x61, 0x62]);
        add_location(&mut rom, 0x20, &[0x63, 0x64, 0x70, 0x71]);
        let mut adjustments = AdjustmentTable::new();
        adjustments.insert(0x20, LocationAdjustment::with_max_flyers(2));
        let mut graphics = Graphics::new(&rom);
        let report = shuffle_monsters(
            &mut rom,
            &adjustments,
            &mut graphics,
            &ShuffleConfig::default(),
            0xdead,
        )
        .unwrap();
        let outcome = report.outcome(0x10).unwrap();
        assert_eq!(outcome.filled, 3);
        assert_eq!(outcome.neutralized, 0);
        let loc = rom.locations.iter().find(|l| l.id == 0x10).unwrap();
        for spawn in &loc.spawns {
            assert!(spawn.used);
            assert!(!rom.monsters[&spawn.id].flyer);
        }
    }

    #[test]
    fn flier_quota_bounds_every_location() {
        let mut rom = open_rom();
        for id in 0x70..0x74 {
            rom.monsters.insert(id, flyer(id));
        }
        rom.monsters.insert(0x60, ground(0x60));
        rom.monsters.insert(0x61, ground(0x61));
        add_location(&mut rom, 0x10, &[0x70, 0x71, 0x60]);
        add_location(&mut rom, 0x20, &[0x72, 0x73, 0x61]);
        let mut adjustments = AdjustmentTable::new();
        adjustments.insert(0x10, LocationAdjustment::with_max_flyers(1));
        adjustments.insert(0x20, LocationAdjustment::with_max_flyers(1));
        let mut graphics = Graphics::new(&rom);
        shuffle_monsters(
            &mut rom,
            &adjustments,
            &mut graphics,
            &ShuffleConfig::default(),
            7,
        )
        .unwrap();
        for loc in &rom.locations {
            let fliers = loc
                .spawns
                .iter()
                .filter(|s| s.used && rom.monsters.get(&s.id).map_or(false, |m| m.flyer))
                .count();
            assert!(fliers <= 1, "location {:02x} has {fliers} fliers", loc.id);
        }
    }

    #[test]
    fn class_members_resolve_to_one_id_per_location() {
        let mut rom = open_rom();
        for id in 0x60..0x64 {
            let mut m = ground(id);
            m.class = Some(1);
            rom.monsters.insert(id, m);
        }
        add_location(&mut rom, 0x10, &[0x60, 0x61, 0x62, 0x63]);
        let adjustments = AdjustmentTable::new();
        let mut graphics = Graphics::new(&rom);
        let report = shuffle_monsters(
            &mut rom,
            &adjustments,
            &mut graphics,
            &ShuffleConfig::default(),
            11,
        )
        .unwrap();
        // The used pool refills the remaining slots with the one chosen id.
        assert_eq!(report.outcome(0x10).unwrap().filled, 4);
        let loc = &rom.locations[0];
        let ids: Vec<u8> = loc.spawns.iter().filter(|s| s.used).map(|s| s.id).collect();
        assert_eq!(ids.len(), 4);
        assert!(ids.iter().all(|&id| id == ids[0]));
    }

    #[test]
    fn skipped_locations_are_untouched_and_unreported() {
        let mut rom = open_rom();
        rom.monsters.insert(0x60, ground(0x60));
        rom.monsters.insert(0x61, ground(0x61));
        add_location(&mut rom, 0x10, &[0x60, 0x61]);
        let before = rom.locations[0].spawns.clone();
        let mut adjustments = AdjustmentTable::new();
        adjustments.insert(0x10, LocationAdjustment::skip());
        let mut graphics = Graphics::new(&rom);
        let report = shuffle_monsters(
            &mut rom,
            &adjustments,
            &mut graphics,
            &ShuffleConfig::default(),
            3,
        )
        .unwrap();
        assert!(report.outcome(0x10).is_none());
        assert_eq!(rom.locations[0].spawns, before);
    }

    #[test]
    fn unplaceable_randomized_location_neutralizes_and_continues() {
        let mut rom = open_rom();
        rom.monsters.insert(0x60, ground(0x60));
        rom.monsters.insert(0x61, ground(0x61));
        add_location(&mut rom, 0x10, &[0x60, 0x61]);
        // No used entrance: every placement pool is empty.
        let loc = &mut rom.locations[0];
        loc.randomized_map = true;
        loc.entrances.clear();
        let adjustments = AdjustmentTable::new();
        let mut graphics = Graphics::new(&rom);
        let report = shuffle_monsters(
            &mut rom,
            &adjustments,
            &mut graphics,
            &ShuffleConfig::default(),
            5,
        )
        .unwrap();
        let outcome = report.outcome(0x10).unwrap();
        assert_eq!(outcome.filled, 0);
        assert_eq!(outcome.neutralized, 2);
        for spawn in &rom.locations[0].spawns {
            assert!(!spawn.used);
            assert_eq!(spawn.id, PLACEHOLDER_MONSTER_ID);
            assert_eq!((spawn.screen, spawn.tile), (0, 0));
        }
    }

    #[test]
    fn randomized_layouts_draw_positions_from_the_pools() {
        let mut rom = open_rom();
        rom.monsters.insert(0x60, ground(0x60));
        rom.monsters.insert(0x61, ground(0x61));
        add_location(&mut rom, 0x10, &[0x60, 0x61]);
        rom.locations[0].randomized_map = true;
        let adjustments = AdjustmentTable::new();
        let mut graphics = Graphics::new(&rom);
        let report = shuffle_monsters(
            &mut rom,
            &adjustments,
            &mut graphics,
            &ShuffleConfig::default(),
            9,
        )
        .unwrap();
        assert_eq!(report.outcome(0x10).unwrap().filled, 2);
        let loc = &rom.locations[0];
        for spawn in &loc.spawns {
            assert!(spawn.used);
            assert!(loc.in_bounds(spawn.tile_coord()));
        }
        // Two monsters never land on the same tile.
        assert_ne!(loc.spawns[0].tile_coord(), loc.spawns[1].tile_coord());
    }

    #[test]
    fn slot_conservation_holds_per_location() {
        let mut rom = open_rom();
        for id in 0x60..0x66 {
            rom.monsters.insert(id, ground(id));
        }
        rom.monsters.insert(0x70, flyer(0x70));
        add_location(&mut rom, 0x10, &[0x60, 0x61, 0x62]);
        add_location(&mut rom, 0x20, &[0x63, 0x64]);
        add_location(&mut rom, 0x30, &[0x65, 0x70]);
        let expected: FnvHashMap<u8, u32> =
            [(0x10u8, 3u32), (0x20, 2), (0x30, 2)].into_iter().collect();
        let mut adjustments = AdjustmentTable::new();
        adjustments.insert(0x30, LocationAdjustment::with_max_flyers(1));
        let mut graphics = Graphics::new(&rom);
        let report = shuffle_monsters(
            &mut rom,
            &adjustments,
            &mut graphics,
            &ShuffleConfig::default(),
            21,
        )
        .unwrap();
        for (&id, &slots) in &expected {
            let outcome = report.outcome(id).unwrap();
            assert_eq!(outcome.filled + outcome.neutralized, slots);
        }
    }

    #[test]
    fn identical_seeds_reproduce_identical_spawn_tables() {
        let build = || {
            let mut rom = open_rom();
            for id in 0x60..0x68 {
                rom.monsters.insert(id, ground(id));
            }
            rom.monsters.insert(0x70, flyer(0x70));
            add_location(&mut rom, 0x10, &[0x60, 0x61, 0x62]);
            add_location(&mut rom, 0x20, &[0x63, 0x64, 0x70]);
            add_location(&mut rom, 0x30, &[0x65, 0x66, 0x67]);
            rom.locations[2].randomized_map = true;
            rom
        };
        let mut adjustments = AdjustmentTable::new();
        adjustments.insert(0x20, LocationAdjustment::with_max_flyers(1));
        let config = ShuffleConfig {
            shuffle_sprite_palettes: true,
            ..Default::default()
        };
        let run = |seed: u64| {
            let mut rom = build();
            let mut graphics = Graphics::new(&rom);
            shuffle_monsters(&mut rom, &adjustments, &mut graphics, &config, seed).unwrap();
            rom
        };
        let a = run(0xfeed);
        let b = run(0xfeed);
        for (la, lb) in a.locations.iter().zip(&b.locations) {
            assert_eq!(la.spawns, lb.spawns);
            assert_eq!(la.sprite_patterns, lb.sprite_patterns);
            assert_eq!(la.sprite_palettes, lb.sprite_palettes);
        }
    }

    #[test]
    fn contradictory_fixed_graphics_are_a_fatal_error() {
        let mut rom = open_rom();
        rom.monsters.insert(0x60, ground(0x60));
        add_location(&mut rom, 0x10, &[0x60]);
        // A chest pins pat0 to its page; an NPC demanding a different pat0
        // page in the same location is authored nonsense.
        rom.locations[0].spawns.push(Spawn::new(
            SpawnKind::Chest,
            0x01,
            TileCoord::new(0, 0, 8, 8),
        ));
        rom.locations[0].spawns.push(Spawn::new(
            SpawnKind::Npc,
            0x05,
            TileCoord::new(0, 0, 9, 9),
        ));
        let mut graphics = Graphics::new(&rom);
        graphics.register_npc(
            0x10,
            0x05,
            crate::constraint::Constraint::from_options(vec![crate::constraint::ConstraintOption {
                pat0: crate::constraint::SlotSet::single(0x10),
                pat1: crate::constraint::SlotSet::Any,
                pal2: crate::constraint::SlotSet::Any,
                pal3: crate::constraint::SlotSet::Any,
            }]),
        );
        let adjustments = AdjustmentTable::new();
        let err = shuffle_monsters(
            &mut rom,
            &adjustments,
            &mut graphics,
            &ShuffleConfig::default(),
            1,
        )
        .unwrap_err();
        assert!(err.contains("location 10"));
    }

    #[test]
    fn contradictory_fixed_palettes_are_a_fatal_error() {
        let mut rom = open_rom();
        rom.monsters.insert(0x60, ground(0x60));
        add_location(&mut rom, 0x10, &[0x60]);
        // The chest pins pal2 to the chest palette; an NPC demanding a
        // disjoint pal2 in the same location must error, not recolor.
        rom.locations[0].spawns.push(Spawn::new(
            SpawnKind::Chest,
            0x01,
            TileCoord::new(0, 0, 8, 8),
        ));
        rom.locations[0].spawns.push(Spawn::new(
            SpawnKind::Npc,
            0x05,
            TileCoord::new(0, 0, 9, 9),
        ));
        let mut graphics = Graphics::new(&rom);
        graphics.register_npc(
            0x10,
            0x05,
            crate::constraint::Constraint::from_options(vec![crate::constraint::ConstraintOption {
                pat0: crate::constraint::SlotSet::Any,
                pat1: crate::constraint::SlotSet::Any,
                pal2: crate::constraint::SlotSet::of(&[0x30, 0x31]),
                pal3: crate::constraint::SlotSet::Any,
            }]),
        );
        let adjustments = AdjustmentTable::new();
        let err = shuffle_monsters(
            &mut rom,
            &adjustments,
            &mut graphics,
            &ShuffleConfig::default(),
            2,
        )
        .unwrap_err();
        assert!(err.contains("location 10"));
    }

    #[test]
    fn fixed_offsets_move_ground_monsters() {
        let mut rom = open_rom();
        rom.monsters.insert(0x60, ground(0x60));
        add_location(&mut rom, 0x10, &[0x60]);
        let mut adjustments = AdjustmentTable::new();
        let mut adjustment = LocationAdjustment::default();
        adjustment.fixed_offsets.insert(0, (1, 2));
        adjustments.insert(0x10, adjustment);
        let mut graphics = Graphics::new(&rom);
        shuffle_monsters(
            &mut rom,
            &adjustments,
            &mut graphics,
            &ShuffleConfig::default(),
            4,
        )
        .unwrap();
        let spawn = &rom.locations[0].spawns[0];
        assert!(spawn.used);
        assert_eq!(spawn.tile_coord(), TileCoord::new(0, 0, 4, 5));
    }

    #[test]
    fn progress_callback_ticks_once_per_location() {
        let mut rom = open_rom();
        rom.monsters.insert(0x60, ground(0x60));
        rom.monsters.insert(0x61, ground(0x61));
        add_location(&mut rom, 0x10, &[0x60]);
        add_location(&mut rom, 0x20, &[0x61]);
        let adjustments = AdjustmentTable::new();
        let mut graphics = Graphics::new(&rom);
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let mut ticks = Vec::new();
        shuffle_monsters_with_progress(
            &mut rom,
            &adjustments,
            &mut graphics,
            &ShuffleConfig::default(),
            &mut rng,
            |done, total| ticks.push((done, total)),
        )
        .unwrap();
        assert_eq!(ticks, vec![(1, 2), (2, 2)]);
    }
}
