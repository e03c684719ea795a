//! Per-face render attributes and the bucket ordering built on them.

use std::cmp::Ordering;
use std::fmt;

/// A single render attribute a face can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
    /// Hard (landable) quad. Written as `quad_hard`.
    Hard,
    /// Not back-face culled.
    TwoSide,
    /// Flat shaded.
    Flat,
    /// Alpha blended. Implicit in OBJ7, never written.
    Alpha,
    /// Uses the cockpit panel texture. Written as `quad_cockpit`.
    Panel,
    /// No polygon offset.
    NoPolyOffset,
}

impl Attribute {
    /// Output priority order, lowest first. `NoPolyOffset` dominates the
    /// bucket ordering so offset polygons are written before everything else.
    pub const ALL: [Attribute; 6] = [
        Attribute::Hard,
        Attribute::TwoSide,
        Attribute::Flat,
        Attribute::Alpha,
        Attribute::Panel,
        Attribute::NoPolyOffset,
    ];

    const fn bit(self) -> u8 {
        match self {
            Attribute::Hard => 1,
            Attribute::TwoSide => 2,
            Attribute::Flat => 4,
            Attribute::Alpha => 8,
            Attribute::Panel => 16,
            Attribute::NoPolyOffset => 32,
        }
    }
}

/// Bitmask of [`Attribute`]s.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FaceFlags(u8);

impl FaceFlags {
    pub const NONE: FaceFlags = FaceFlags(0);
    pub const HARD: FaceFlags = FaceFlags(Attribute::Hard.bit());
    pub const TWOSIDE: FaceFlags = FaceFlags(Attribute::TwoSide.bit());
    pub const FLAT: FaceFlags = FaceFlags(Attribute::Flat.bit());
    pub const ALPHA: FaceFlags = FaceFlags(Attribute::Alpha.bit());
    pub const PANEL: FaceFlags = FaceFlags(Attribute::Panel.bit());
    pub const NPOLY: FaceFlags = FaceFlags(Attribute::NoPolyOffset.bit());

    pub fn contains(self, attribute: Attribute) -> bool {
        self.0 & attribute.bit() != 0
    }

    pub fn insert(&mut self, attribute: Attribute) {
        self.0 |= attribute.bit();
    }

    pub fn with(mut self, attribute: Attribute) -> Self {
        self.insert(attribute);
        self
    }

    pub fn is_hard(self) -> bool {
        self.contains(Attribute::Hard)
    }

    pub fn is_two_sided(self) -> bool {
        self.contains(Attribute::TwoSide)
    }

    pub fn is_flat(self) -> bool {
        self.contains(Attribute::Flat)
    }

    pub fn is_alpha(self) -> bool {
        self.contains(Attribute::Alpha)
    }

    pub fn is_panel(self) -> bool {
        self.contains(Attribute::Panel)
    }

    pub fn is_no_poly_offset(self) -> bool {
        self.contains(Attribute::NoPolyOffset)
    }

    /// The key used to group faces for strip building and output ordering.
    pub fn bucket(self) -> BucketKey {
        BucketKey(self)
    }
}

impl std::ops::BitOr for FaceFlags {
    type Output = FaceFlags;

    fn bitor(self, rhs: FaceFlags) -> FaceFlags {
        FaceFlags(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for FaceFlags {
    fn bitor_assign(&mut self, rhs: FaceFlags) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for FaceFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let set: Vec<_> = Attribute::ALL
            .iter()
            .filter(|a| self.contains(**a))
            .collect();
        write!(f, "FaceFlags({:?})", set)
    }
}

/// Faces with equal keys may share a strip. Keys also fix the order in which
/// buckets are written.
///
/// Ordering compares attributes from highest to lowest priority:
/// `NoPolyOffset`, `Panel`, `Alpha`, `Flat`, `TwoSide`, `Hard`. A key without
/// the attribute sorts before one with it. Polygon-offset faces are therefore
/// written first, panel faces after all non-panel faces of the same offset
/// state, and alpha faces after opaque ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BucketKey(FaceFlags);

impl BucketKey {
    /// Every possible key in output order.
    pub fn all() -> impl Iterator<Item = BucketKey> {
        let mut keys: Vec<BucketKey> = (0u8..64).map(|b| BucketKey(FaceFlags(b))).collect();
        keys.sort();
        keys.into_iter()
    }

    pub fn flags(self) -> FaceFlags {
        self.0
    }
}

impl Ord for BucketKey {
    fn cmp(&self, other: &Self) -> Ordering {
        for attribute in Attribute::ALL.iter().rev() {
            match self.0.contains(*attribute).cmp(&other.0.contains(*attribute)) {
                Ordering::Equal => continue,
                unequal => return unequal,
            }
        }
        Ordering::Equal
    }
}

impl PartialOrd for BucketKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_contains() {
        let mut flags = FaceFlags::NONE;
        flags.insert(Attribute::TwoSide);
        assert!(flags.is_two_sided());
        assert!(!flags.is_flat());
        assert_eq!(flags | FaceFlags::FLAT, FaceFlags::TWOSIDE | FaceFlags::FLAT);
    }

    #[test]
    fn test_npoly_dominates_ordering() {
        let everything_else = FaceFlags::HARD
            | FaceFlags::TWOSIDE
            | FaceFlags::FLAT
            | FaceFlags::ALPHA
            | FaceFlags::PANEL;
        assert!(everything_else.bucket() < FaceFlags::NPOLY.bucket());
        assert!(FaceFlags::ALPHA.bucket() < FaceFlags::PANEL.bucket());
        assert!(FaceFlags::NONE.bucket() < FaceFlags::HARD.bucket());
    }

    #[test]
    fn test_all_keys_sorted_and_complete() {
        let keys: Vec<_> = BucketKey::all().collect();
        assert_eq!(keys.len(), 64);
        assert_eq!(keys[0], FaceFlags::NONE.bucket());
        assert_eq!(keys[1], FaceFlags::HARD.bucket());
        assert_eq!(keys[32], FaceFlags::NPOLY.bucket());
        assert!(keys.windows(2).all(|w| w[0] < w[1]));
    }
}
