//! The graphics-compatibility algebra.
//!
//! A location renders sprites out of four shared table slots: two pattern
//! pages (`pat0`, `pat1`) and two palettes (`pal2`, `pal3`). Everything
//! placed at a location competes for those slots, so compatibility is a
//! narrowing join: a `Constraint` is a non-empty union of options, each
//! option restricting the four slots, and merging two constraints keeps
//! exactly the option pairs that agree.

use crate::constants::*;
use crate::rom_data::Location;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// The values one table slot may still take: anything, or a set of ids
/// below 0x80 (pattern pages and palettes both fit).
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum SlotSet {
    Any,
    Of(u128),
}

impl SlotSet {
    pub fn single(id: u8) -> SlotSet {
        debug_assert!(id < 128);
        SlotSet::Of(1u128 << id)
    }

    pub fn of(ids: &[u8]) -> SlotSet {
        let mut bits = 0u128;
        for &id in ids {
            debug_assert!(id < 128);
            bits |= 1u128 << id;
        }
        SlotSet::Of(bits)
    }

    /// How many values remain, or `None` when unconstrained.
    pub fn size(self) -> Option<u32> {
        match self {
            SlotSet::Any => None,
            SlotSet::Of(bits) => Some(bits.count_ones()),
        }
    }

    pub fn contains(self, id: u8) -> bool {
        match self {
            SlotSet::Any => true,
            SlotSet::Of(bits) => bits & (1u128 << id) != 0,
        }
    }

    /// Intersection, `None` when the result would be empty.
    fn intersect(self, other: SlotSet) -> Option<SlotSet> {
        match (self, other) {
            (SlotSet::Any, s) | (s, SlotSet::Any) => Some(s),
            (SlotSet::Of(a), SlotSet::Of(b)) => {
                let bits = a & b;
                (bits != 0).then_some(SlotSet::Of(bits))
            }
        }
    }

    /// A uniformly random member, or `None` for an unconstrained slot.
    fn pick<R: Rng>(self, rng: &mut R) -> Option<u8> {
        let SlotSet::Of(bits) = self else { return None };
        let count = bits.count_ones();
        let mut nth = rng.gen_range(0..count);
        for id in 0..128u8 {
            if bits & (1u128 << id) != 0 {
                if nth == 0 {
                    return Some(id);
                }
                nth -= 1;
            }
        }
        unreachable!("non-empty slot set")
    }
}

/// One conjunctive option: all four slot restrictions hold together.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct ConstraintOption {
    pub pat0: SlotSet,
    pub pat1: SlotSet,
    pub pal2: SlotSet,
    pub pal3: SlotSet,
}

impl ConstraintOption {
    pub const ANY: ConstraintOption = ConstraintOption {
        pat0: SlotSet::Any,
        pat1: SlotSet::Any,
        pal2: SlotSet::Any,
        pal3: SlotSet::Any,
    };

    /// Field-wise merge. Non-exact additionally tries the pattern-swapped
    /// pairing of `other` (the spawn's bank bit is rewritten at commit, so
    /// a pattern requirement may land in either physical slot). The
    /// `recolor` flags carry the constraint-level recolor decision: a
    /// palette requirement that fails intersection may replace the running
    /// value only while the whole union still leaves that palette
    /// unconstrained; a pinned palette fails the merge.
    fn try_meet(
        self,
        other: ConstraintOption,
        exact: bool,
        recolor2: bool,
        recolor3: bool,
    ) -> Option<ConstraintOption> {
        let straight = self.merge_patterns(other.pat0, other.pat1);
        let patterns = if exact {
            straight?
        } else {
            match straight {
                Some(p) => p,
                None => self.merge_patterns(other.pat1, other.pat0)?,
            }
        };
        let pal2 = match self.pal2.intersect(other.pal2) {
            Some(palette) => palette,
            None if recolor2 => other.pal2,
            None => return None,
        };
        let pal3 = match self.pal3.intersect(other.pal3) {
            Some(palette) => palette,
            None if recolor3 => other.pal3,
            None => return None,
        };
        Some(ConstraintOption {
            pat0: patterns.0,
            pat1: patterns.1,
            pal2,
            pal3,
        })
    }

    fn merge_patterns(self, pat0: SlotSet, pat1: SlotSet) -> Option<(SlotSet, SlotSet)> {
        Some((self.pat0.intersect(pat0)?, self.pat1.intersect(pat1)?))
    }
}

/// A non-empty union of options over the four sprite table slots.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Constraint {
    options: Vec<ConstraintOption>,
}

impl Constraint {
    /// The top element: everything is still allowed.
    pub fn any() -> Constraint {
        Constraint {
            options: vec![ConstraintOption::ANY],
        }
    }

    pub fn from_options(options: Vec<ConstraintOption>) -> Constraint {
        debug_assert!(!options.is_empty());
        Constraint { options }
    }

    /// A regular treasure chest: fixed page in the first pattern slot and
    /// the chest palette in `pal2`.
    pub fn treasure_chest() -> Constraint {
        Constraint::from_options(vec![ConstraintOption {
            pat0: SlotSet::single(PAT_TREASURE_CHEST),
            pat1: SlotSet::Any,
            pal2: SlotSet::single(PAL_TREASURE_CHEST),
            pal3: SlotSet::Any,
        }])
    }

    /// A mimic renders out of its own page but shares the chest palette.
    pub fn mimic() -> Constraint {
        Constraint::from_options(vec![ConstraintOption {
            pat0: SlotSet::Any,
            pat1: SlotSet::single(PAT_MIMIC),
            pal2: SlotSet::single(PAL_TREASURE_CHEST),
            pal3: SlotSet::Any,
        }])
    }

    /// The one chest id with a dedicated graphics page.
    pub fn special_chest() -> Constraint {
        Constraint::from_options(vec![ConstraintOption {
            pat0: SlotSet::single(PAT_SPECIAL_CHEST),
            pat1: SlotSet::Any,
            pal2: SlotSet::single(PAL_TREASURE_CHEST),
            pal3: SlotSet::Any,
        }])
    }

    /// Shooting walls need their projectile page resident.
    pub fn shooting_wall() -> Constraint {
        Constraint::from_options(vec![ConstraintOption {
            pat0: SlotSet::single(PAT_SHOOTING_WALL),
            pat1: SlotSet::Any,
            pal2: SlotSet::Any,
            pal3: SlotSet::Any,
        }])
    }

    /// Soft merge: `None` means the two requirements cannot coexist.
    ///
    /// Exact mode forbids the pattern swap but may recolor: a palette
    /// requirement that fails intersection replaces the running value as
    /// long as that palette's union is still unconstrained. A palette the
    /// running constraint has pinned fails the merge instead, so authored
    /// contradictions stay visible to [`Constraint::meet`].
    pub fn try_meet(&self, other: &Constraint, exact: bool) -> Option<Constraint> {
        let recolor2 = exact && self.pal2_size().is_none();
        let recolor3 = exact && self.pal3_size().is_none();
        let mut options: Vec<ConstraintOption> = Vec::new();
        for &a in &self.options {
            for &b in &other.options {
                if let Some(merged) = a.try_meet(b, exact, recolor2, recolor3) {
                    if !options.contains(&merged) {
                        options.push(merged);
                    }
                }
            }
        }
        (!options.is_empty()).then_some(Constraint { options })
    }

    /// Hard merge. Failure here means the input data itself is
    /// inconsistent, not that a placement attempt lost a race.
    pub fn meet(&self, other: &Constraint, exact: bool) -> Result<Constraint, String> {
        self.try_meet(other, exact)
            .ok_or_else(|| format!("irreconcilable graphics requirements: {self:?} vs {other:?}"))
    }

    /// Remaining freedom of `pal2` across all options; `None` while any
    /// option leaves it unconstrained.
    pub fn pal2_size(&self) -> Option<u32> {
        self.union_size(|o| o.pal2)
    }

    /// Remaining freedom of `pal3` across all options.
    pub fn pal3_size(&self) -> Option<u32> {
        self.union_size(|o| o.pal3)
    }

    fn union_size(&self, field: impl Fn(&ConstraintOption) -> SlotSet) -> Option<u32> {
        let mut union = 0u128;
        for option in &self.options {
            match field(option) {
                SlotSet::Any => return None,
                SlotSet::Of(bits) => union |= bits,
            }
        }
        Some(union.count_ones())
    }

    /// Collapse the remaining freedom onto the location's sprite tables:
    /// pick one option, then one value per constrained slot. Unconstrained
    /// slots keep whatever the tables already held.
    pub fn fix<R: Rng>(&self, location: &mut Location, rng: &mut R) {
        let option = self.options[rng.gen_range(0..self.options.len())];
        if let Some(patterns) = location.sprite_patterns.as_mut() {
            if let Some(page) = option.pat0.pick(rng) {
                patterns[0] = page;
            }
            if let Some(page) = option.pat1.pick(rng) {
                patterns[1] = page;
            }
        }
        if let Some(palettes) = location.sprite_palettes.as_mut() {
            if let Some(palette) = option.pal2.pick(rng) {
                palettes[0] = palette;
            }
            if let Some(palette) = option.pal3.pick(rng) {
                palettes[1] = palette;
            }
        }
    }

    /// Rewrite every palette id through `map` (palette shuffling).
    pub(crate) fn remap_palettes(&self, map: impl Fn(u8) -> u8) -> Constraint {
        let remap = |set: SlotSet| match set {
            SlotSet::Any => SlotSet::Any,
            SlotSet::Of(bits) => {
                let mut out = 0u128;
                for id in 0..128u8 {
                    if bits & (1u128 << id) != 0 {
                        out |= 1u128 << map(id);
                    }
                }
                SlotSet::Of(out)
            }
        };
        Constraint {
            options: self
                .options
                .iter()
                .map(|o| ConstraintOption {
                    pat0: o.pat0,
                    pat1: o.pat1,
                    pal2: remap(o.pal2),
                    pal3: remap(o.pal3),
                })
                .collect(),
        }
    }

    pub(crate) fn options(&self) -> &[ConstraintOption] {
        &self.options
    }
}
