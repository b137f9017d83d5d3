use crate::constants::*;
use serde::*;

/// A packed tile coordinate: screen-row, screen-col, sub-row, sub-col,
/// four bits each. Screens are 16 sub-tiles wide and 15 tall, so sub-rows
/// only use values `0..15`.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, PartialOrd, Ord)]
#[repr(transparent)]
pub struct TileCoord {
    packed: u16,
}

impl TileCoord {
    pub fn new(screen_y: u8, screen_x: u8, tile_y: u8, tile_x: u8) -> Self {
        debug_assert!(screen_y < MAX_SCREENS && screen_x < MAX_SCREENS);
        debug_assert!(tile_y < SCREEN_HEIGHT && tile_x < SCREEN_WIDTH);
        TileCoord {
            packed: ((screen_y as u16) << 12)
                | ((screen_x as u16) << 8)
                | ((tile_y as u16) << 4)
                | (tile_x as u16),
        }
    }

    /// Reconstruct from a spawn's packed screen and tile bytes.
    pub fn from_screen_tile(screen: u8, tile: u8) -> Self {
        TileCoord {
            packed: ((screen as u16) << 8) | (tile as u16),
        }
    }

    #[inline]
    pub fn screen_y(self) -> u8 {
        ((self.packed >> 12) & 0xf) as u8
    }

    #[inline]
    pub fn screen_x(self) -> u8 {
        ((self.packed >> 8) & 0xf) as u8
    }

    #[inline]
    pub fn tile_y(self) -> u8 {
        ((self.packed >> 4) & 0xf) as u8
    }

    #[inline]
    pub fn tile_x(self) -> u8 {
        (self.packed & 0xf) as u8
    }

    /// The screen byte as stored on spawns (row in the high nibble).
    #[inline]
    pub fn screen_byte(self) -> u8 {
        (self.packed >> 8) as u8
    }

    /// The tile byte as stored on spawns (row in the high nibble).
    #[inline]
    pub fn tile_byte(self) -> u8 {
        (self.packed & 0xff) as u8
    }

    #[inline]
    pub fn packed_repr(self) -> u16 {
        self.packed
    }

    #[inline]
    pub fn from_packed(packed: u16) -> Self {
        TileCoord { packed }
    }

    /// Absolute column in sub-tiles across the whole screen grid.
    #[inline]
    pub fn global_x(self) -> u32 {
        (self.screen_x() as u32) * (SCREEN_WIDTH as u32) + (self.tile_x() as u32)
    }

    /// Absolute row in sub-tiles across the whole screen grid.
    #[inline]
    pub fn global_y(self) -> u32 {
        (self.screen_y() as u32) * (SCREEN_HEIGHT as u32) + (self.tile_y() as u32)
    }

    /// Squared Euclidean distance in sub-tile units.
    pub fn distance_sq(self, other: Self) -> u32 {
        let dx = self.global_x() as i32 - other.global_x() as i32;
        let dy = self.global_y() as i32 - other.global_y() as i32;
        (dx * dx + dy * dy) as u32
    }

    /// Neighbor to the right, wrapping across the screen edge.
    /// `width` is the location's screen-grid width.
    pub fn right(self, width: u8) -> Option<TileCoord> {
        if self.tile_x() + 1 < SCREEN_WIDTH {
            Some(TileCoord::from_packed(self.packed + 1))
        } else if self.screen_x() + 1 < width {
            Some(TileCoord::new(self.screen_y(), self.screen_x() + 1, self.tile_y(), 0))
        } else {
            None
        }
    }

    /// Neighbor below, wrapping across the screen edge.
    /// `height` is the location's screen-grid height.
    pub fn below(self, height: u8) -> Option<TileCoord> {
        if self.tile_y() + 1 < SCREEN_HEIGHT {
            Some(TileCoord::from_packed(self.packed + 0x10))
        } else if self.screen_y() + 1 < height {
            Some(TileCoord::new(self.screen_y() + 1, self.screen_x(), 0, self.tile_x()))
        } else {
            None
        }
    }

    pub fn left(self) -> Option<TileCoord> {
        if self.tile_x() > 0 {
            Some(TileCoord::from_packed(self.packed - 1))
        } else if self.screen_x() > 0 {
            Some(TileCoord::new(
                self.screen_y(),
                self.screen_x() - 1,
                self.tile_y(),
                SCREEN_WIDTH - 1,
            ))
        } else {
            None
        }
    }

    pub fn above(self) -> Option<TileCoord> {
        if self.tile_y() > 0 {
            Some(TileCoord::from_packed(self.packed - 0x10))
        } else if self.screen_y() > 0 {
            Some(TileCoord::new(
                self.screen_y() - 1,
                self.screen_x(),
                SCREEN_HEIGHT - 1,
                self.tile_x(),
            ))
        } else {
            None
        }
    }

    /// The four cardinal neighbors that stay inside a `width` x `height`
    /// screen grid.
    pub fn neighbors(self, width: u8, height: u8) -> impl Iterator<Item = TileCoord> {
        [
            self.above(),
            self.left(),
            self.right(width),
            self.below(height),
        ]
        .into_iter()
        .flatten()
    }

    /// Apply a sub-tile delta, staying inside the screen grid.
    pub fn offset(self, dy: i8, dx: i8, width: u8, height: u8) -> Option<TileCoord> {
        let gx = self.global_x() as i32 + dx as i32;
        let gy = self.global_y() as i32 + dy as i32;
        let max_x = (width as i32) * (SCREEN_WIDTH as i32);
        let max_y = (height as i32) * (SCREEN_HEIGHT as i32);
        if gx < 0 || gy < 0 || gx >= max_x || gy >= max_y {
            return None;
        }
        Some(TileCoord::new(
            (gy / SCREEN_HEIGHT as i32) as u8,
            (gx / SCREEN_WIDTH as i32) as u8,
            (gy % SCREEN_HEIGHT as i32) as u8,
            (gx % SCREEN_WIDTH as i32) as u8,
        ))
    }
}

impl Serialize for TileCoord {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.packed_repr().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for TileCoord {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        u16::deserialize(deserializer).map(TileCoord::from_packed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packing_round_trips() {
        let t = TileCoord::new(3, 5, 14, 15);
        assert_eq!(t.screen_y(), 3);
        assert_eq!(t.screen_x(), 5);
        assert_eq!(t.tile_y(), 14);
        assert_eq!(t.tile_x(), 15);
        assert_eq!(TileCoord::from_packed(t.packed_repr()), t);
        assert_eq!(TileCoord::from_screen_tile(t.screen_byte(), t.tile_byte()), t);
    }

    #[test]
    #[should_panic]
    fn screen_axes_only_carry_four_bits() {
        TileCoord::new(MAX_SCREENS, 0, 0, 0);
    }

    #[test]
    fn right_wraps_across_screens() {
        let t = TileCoord::new(0, 0, 4, 15);
        assert_eq!(t.right(2), Some(TileCoord::new(0, 1, 4, 0)));
        assert_eq!(t.right(1), None);
        let mid = TileCoord::new(0, 0, 4, 7);
        assert_eq!(mid.right(1), Some(TileCoord::new(0, 0, 4, 8)));
    }

    #[test]
    fn below_wraps_across_screens() {
        let t = TileCoord::new(0, 0, 14, 3);
        assert_eq!(t.below(2), Some(TileCoord::new(1, 0, 0, 3)));
        assert_eq!(t.below(1), None);
    }

    #[test]
    fn global_coordinates_span_screens() {
        let t = TileCoord::new(1, 2, 3, 4);
        assert_eq!(t.global_x(), 2 * 16 + 4);
        assert_eq!(t.global_y(), 15 + 3);
        // Adjacent tiles on either side of a screen seam are one apart.
        let a = TileCoord::new(0, 0, 0, 15);
        let b = TileCoord::new(0, 1, 0, 0);
        assert_eq!(a.distance_sq(b), 1);
    }

    #[test]
    fn offset_respects_bounds() {
        let t = TileCoord::new(0, 0, 0, 0);
        assert_eq!(t.offset(-1, 0, 1, 1), None);
        assert_eq!(t.offset(1, 2, 1, 1), Some(TileCoord::new(0, 0, 1, 2)));
        // Crossing a screen seam re-packs correctly.
        let edge = TileCoord::new(0, 0, 14, 0);
        assert_eq!(edge.offset(1, 0, 1, 2), Some(TileCoord::new(1, 0, 0, 0)));
    }
}
