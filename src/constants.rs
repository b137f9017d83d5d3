//! Fixed geometry and id constants shared across the shuffle.

/// Width of one screen in sub-tiles.
pub const SCREEN_WIDTH: u8 = 16;
/// Height of one screen in sub-tiles.
pub const SCREEN_HEIGHT: u8 = 15;
/// Sub-tiles per screen.
pub const TILES_PER_SCREEN: usize = (SCREEN_WIDTH as usize) * (SCREEN_HEIGHT as usize);
/// Maximum screen-grid dimension (packed coordinates carry 4 bits per axis).
pub const MAX_SCREENS: u8 = 16;

/// Metatiles below this id may have a flag-conditional alternate.
pub const ALTERNATE_METATILE_LIMIT: u8 = 0x20;

/// Effect bits that make a tile unsafe as a ground spawn position.
pub const HAZARD_MASK: u8 = 0x27;
/// Hazard bits for amphibious locations (water is safe ground there).
pub const HAZARD_MASK_AMPHIBIOUS: u8 = 0x25;

/// Distance band for the moth pool (inclusive).
pub const MOTH_MIN_DISTANCE: u32 = 3;
pub const MOTH_MAX_DISTANCE: u32 = 7;
/// Minimum scenery depth for the bird pool.
pub const BIRD_MIN_DISTANCE: u32 = 12;
/// Distance band for the plant pool (inclusive).
pub const PLANT_MIN_DISTANCE: u32 = 2;
pub const PLANT_MAX_DISTANCE: u32 = 4;

/// How many entries of the global monster list the flier pre-pass scans,
/// so scarce flier slots are not starved by processing order.
pub const FLYER_SCAN_LIMIT: usize = 40;

/// Chest spawn ids at or above this value are mimics.
pub const MIMIC_CHEST_MIN: u8 = 0x70;
/// The one chest id with its own dedicated graphics requirement.
pub const SPECIAL_CHEST_ID: u8 = 0x6f;

/// Inert monster id written into neutralized spawn slots.
pub const PLACEHOLDER_MONSTER_ID: u8 = 0xb0;

/// Pattern pages required by the fixed spawn kinds.
pub const PAT_TREASURE_CHEST: u8 = 0x5e;
pub const PAT_MIMIC: u8 = 0x6c;
pub const PAT_SHOOTING_WALL: u8 = 0x61;
pub const PAT_SPECIAL_CHEST: u8 = 0x74;

/// Palette required by chest graphics (both regular and special).
pub const PAL_TREASURE_CHEST: u8 = 0x11;
