//! In-memory entity model consumed by the shuffle. Parsing and
//! serialization of the underlying binary live elsewhere; this module only
//! describes the already-resident structures the shuffle reads and writes.

use crate::constants::*;
use crate::terrain::*;
use crate::tile::*;
use fnv::{FnvHashMap, FnvHashSet};
use serde::{Deserialize, Serialize};

/// What a spawn table entry controls.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum SpawnKind {
    Monster,
    Npc,
    Boss,
    Chest,
    Wall,
    Trigger,
}

/// One spawn table entry.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Spawn {
    pub used: bool,
    /// Packed screen position (row in the high nibble).
    pub screen: u8,
    /// Packed sub-tile position (row in the high nibble).
    pub tile: u8,
    pub kind: SpawnKind,
    pub id: u8,
    /// Which of the location's two sprite pattern slots this spawn uses.
    pub pattern_bank: u8,
}

impl Spawn {
    pub fn new(kind: SpawnKind, id: u8, at: TileCoord) -> Spawn {
        Spawn {
            used: true,
            screen: at.screen_byte(),
            tile: at.tile_byte(),
            kind,
            id,
            pattern_bank: 0,
        }
    }

    #[inline]
    pub fn tile_coord(&self) -> TileCoord {
        TileCoord::from_screen_tile(self.screen, self.tile)
    }

    pub fn set_tile_coord(&mut self, at: TileCoord) {
        self.screen = at.screen_byte();
        self.tile = at.tile_byte();
    }

    pub fn is_monster(&self) -> bool {
        self.kind == SpawnKind::Monster
    }

    pub fn is_chest(&self) -> bool {
        self.kind == SpawnKind::Chest
    }

    pub fn is_mimic(&self) -> bool {
        self.kind == SpawnKind::Chest && self.id >= MIMIC_CHEST_MIN
    }

    /// Disable this spawn entirely: coordinates zeroed, inert placeholder
    /// id, marked unused.
    pub fn neutralize(&mut self) {
        self.screen = 0;
        self.tile = 0;
        self.id = PLACEHOLDER_MONSTER_ID;
        self.used = false;
    }
}

/// A map entrance; only used entrances seed reachability.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Entrance {
    pub tile: TileCoord,
    pub used: bool,
}

/// A 16x15 grid of metatile ids.
#[derive(Clone, Serialize, Deserialize)]
pub struct Screen {
    tiles: Vec<u8>,
}

impl Screen {
    pub fn new(tiles: Vec<u8>) -> Screen {
        debug_assert_eq!(tiles.len(), TILES_PER_SCREEN);
        Screen { tiles }
    }

    pub fn uniform(metatile: u8) -> Screen {
        Screen {
            tiles: vec![metatile; TILES_PER_SCREEN],
        }
    }

    #[inline]
    pub fn get(&self, tile_y: u8, tile_x: u8) -> u8 {
        self.tiles[(tile_y as usize) * (SCREEN_WIDTH as usize) + (tile_x as usize)]
    }

    pub fn set(&mut self, tile_y: u8, tile_x: u8, metatile: u8) {
        self.tiles[(tile_y as usize) * (SCREEN_WIDTH as usize) + (tile_x as usize)] = metatile;
    }
}

/// One location in the game's location graph.
#[derive(Clone, Serialize, Deserialize)]
pub struct Location {
    pub id: u8,
    pub name: String,
    pub used: bool,
    /// Id of the tileset this location renders with.
    pub tileset: u8,
    /// Screen-id grid, row major; all rows have equal length.
    pub screens: Vec<Vec<u8>>,
    pub entrances: Vec<Entrance>,
    /// Exit tiles, excluded from the passable set unconditionally.
    pub exits: Vec<TileCoord>,
    pub spawns: Vec<Spawn>,
    /// Screens (packed row/col byte) whose flag-conditional alternate
    /// tiles are active.
    pub flagged_screens: FnvHashSet<u8>,
    /// The two sprite pattern table slots, when the location has sprites.
    pub sprite_patterns: Option<[u8; 2]>,
    /// The two shuffleable sprite palette slots (pal2, pal3).
    pub sprite_palettes: Option<[u8; 2]>,
    /// Water counts as ground here (swamp-style traversal).
    pub amphibious: bool,
    /// Screen (packed row/col byte) excluded from placement entirely.
    pub boss_screen: Option<u8>,
    /// When set, the plant pool is "metatile == this id" instead of the
    /// usual distance band.
    pub plant_tile: Option<u8>,
    /// The map layout was randomized, so hand-authored offsets are invalid
    /// and every placement must come from the position picker.
    pub randomized_map: bool,
    /// Wall spawns here are shooting walls with their own graphics needs.
    pub shooting_walls: bool,
}

impl Location {
    /// A minimal used location over a single uniform screen grid.
    pub fn new(id: u8, tileset: u8, screens: Vec<Vec<u8>>) -> Location {
        Location {
            id,
            name: format!("loc {id:02x}"),
            used: true,
            tileset,
            screens,
            entrances: Vec::new(),
            exits: Vec::new(),
            spawns: Vec::new(),
            flagged_screens: FnvHashSet::default(),
            sprite_patterns: Some([0, 0]),
            sprite_palettes: Some([0, 0]),
            amphibious: false,
            boss_screen: None,
            plant_tile: None,
            randomized_map: false,
            shooting_walls: false,
        }
    }

    /// Screen-grid width in screens.
    pub fn width(&self) -> u8 {
        self.screens.first().map(|r| r.len()).unwrap_or(0) as u8
    }

    /// Screen-grid height in screens.
    pub fn height(&self) -> u8 {
        self.screens.len() as u8
    }

    pub fn screen_id_at(&self, screen_y: u8, screen_x: u8) -> u8 {
        self.screens[screen_y as usize][screen_x as usize]
    }

    pub fn is_flagged(&self, screen_y: u8, screen_x: u8) -> bool {
        self.flagged_screens
            .contains(&((screen_y << 4) | screen_x))
    }

    pub fn is_boss_screen(&self, tile: TileCoord) -> bool {
        self.boss_screen == Some(tile.screen_byte())
    }

    pub fn has_sprite_tables(&self) -> bool {
        self.sprite_patterns.is_some() && self.sprite_palettes.is_some()
    }

    pub fn in_bounds(&self, tile: TileCoord) -> bool {
        tile.screen_y() < self.height() && tile.screen_x() < self.width()
    }
}

/// The four placement categories. Deliberately closed: adding a category
/// must be a compile error at every placement site.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Placement {
    Normal,
    Moth,
    Bird,
    Plant,
}

/// Read-only monster metadata consulted during assignment.
#[derive(Clone, Serialize, Deserialize)]
pub struct Monster {
    pub id: u8,
    pub name: String,
    /// Monsters sharing a class must resolve to one id per location.
    pub class: Option<u8>,
    pub placement: Placement,
    /// Clearance radius in sub-tiles for randomized positioning.
    pub clearance: u8,
    pub flyer: bool,
    pub moth_or_bat: bool,
    /// Sprite pattern page this monster renders from.
    pub pattern: u8,
    /// Sprite palette this monster renders with.
    pub palette: u8,
}

impl Monster {
    pub fn new(id: u8, placement: Placement, pattern: u8, palette: u8) -> Monster {
        Monster {
            id,
            name: format!("monster {id:02x}"),
            class: None,
            placement,
            clearance: 1,
            flyer: matches!(placement, Placement::Bird),
            moth_or_bat: matches!(placement, Placement::Moth),
            pattern,
            palette,
        }
    }
}

/// The resident slice of the game data the shuffle operates on.
#[derive(Clone, Serialize, Deserialize)]
pub struct RomData {
    pub locations: Vec<Location>,
    pub screens: FnvHashMap<u8, Screen>,
    pub tilesets: FnvHashMap<u8, Tileset>,
    pub monsters: FnvHashMap<u8, Monster>,
}

impl RomData {
    pub fn new() -> RomData {
        RomData {
            locations: Vec::new(),
            screens: FnvHashMap::default(),
            tilesets: FnvHashMap::default(),
            monsters: FnvHashMap::default(),
        }
    }

    /// The metatile id under a tile of a location.
    pub fn metatile(&self, location: &Location, tile: TileCoord) -> u8 {
        let screen_id = location.screen_id_at(tile.screen_y(), tile.screen_x());
        self.screens[&screen_id].get(tile.tile_y(), tile.tile_x())
    }

    pub fn terrain_index<'a>(&'a self, location: &Location) -> TerrainIndex<'a> {
        TerrainIndex::new(&self.tilesets[&location.tileset], location.amphibious)
    }
}

impl Default for RomData {
    fn default() -> Self {
        Self::new()
    }
}
