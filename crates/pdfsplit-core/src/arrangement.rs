//! Page arrangement model
//!
//! Tracks the ordered list of page references ("slots"), the rotation of every
//! source page and the split markers placed between slots.
//!
//! Two addressing schemes coexist:
//! - slot position: index into the current page order (delete, split, move)
//! - logical page index: 0-based page of the source document (rotate, duplicate)
//!
//! Split markers are keyed by slot position and are shifted explicitly on every
//! insertion and removal so they always satisfy `marker <= len - 2`.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Clockwise rotation of a source page, in quarter turns
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum Rotation {
    #[default]
    R0,
    R90,
    R180,
    R270,
}

impl Rotation {
    /// Rotation in degrees (0, 90, 180, 270)
    pub fn degrees(self) -> i32 {
        match self {
            Rotation::R0 => 0,
            Rotation::R90 => 90,
            Rotation::R180 => 180,
            Rotation::R270 => 270,
        }
    }

    /// Normalize an arbitrary multiple of 90 into a rotation.
    /// Returns None for angles that are not quarter turns.
    pub fn from_degrees(angle: i32) -> Option<Self> {
        match angle.rem_euclid(360) {
            0 => Some(Rotation::R0),
            90 => Some(Rotation::R90),
            180 => Some(Rotation::R180),
            270 => Some(Rotation::R270),
            _ => None,
        }
    }

    /// Apply one quarter turn in the given direction
    pub fn turned(self, direction: RotateDirection) -> Self {
        let angle = (self.degrees() + direction.delta() + 360) % 360;
        // Always a quarter turn: both operands are multiples of 90
        Rotation::from_degrees(angle).unwrap_or_default()
    }

    pub fn is_zero(self) -> bool {
        self == Rotation::R0
    }
}

impl From<Rotation> for i32 {
    fn from(rotation: Rotation) -> Self {
        rotation.degrees()
    }
}

impl TryFrom<i32> for Rotation {
    type Error = String;

    fn try_from(angle: i32) -> Result<Self, Self::Error> {
        Rotation::from_degrees(angle)
            .ok_or_else(|| format!("Rotation must be a multiple of 90, got {}", angle))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RotateDirection {
    /// Counter-clockwise
    Left,
    /// Clockwise
    Right,
}

impl RotateDirection {
    fn delta(self) -> i32 {
        match self {
            RotateDirection::Left => -90,
            RotateDirection::Right => 90,
        }
    }
}

/// Ordered, duplicable page references with rotations and split markers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PageArrangement {
    num_pages: usize,
    order: Vec<usize>,
    rotations: BTreeMap<usize, Rotation>,
    splits: BTreeSet<usize>,
}

impl PageArrangement {
    /// Create an arrangement showing every page of a `num_pages` document once
    pub fn new(num_pages: usize) -> Self {
        let mut arrangement = Self::default();
        arrangement.initialize(num_pages);
        arrangement
    }

    /// Reset to the identity order and drop every rotation and split marker
    pub fn initialize(&mut self, num_pages: usize) {
        self.num_pages = num_pages;
        self.order = (0..num_pages).collect();
        self.rotations.clear();
        self.splits.clear();
    }

    /// Number of pages in the source document
    pub fn num_pages(&self) -> usize {
        self.num_pages
    }

    pub fn order(&self) -> &[usize] {
        &self.order
    }

    /// Number of slots in the current order
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Logical page held by a slot
    pub fn page_at(&self, slot: usize) -> Option<usize> {
        self.order.get(slot).copied()
    }

    /// First slot holding the given logical page
    pub fn first_slot_of(&self, logical: usize) -> Option<usize> {
        self.order.iter().position(|&page| page == logical)
    }

    /// Current rotation of a source page (0 when never rotated)
    pub fn rotation(&self, logical: usize) -> Rotation {
        self.rotations.get(&logical).copied().unwrap_or_default()
    }

    pub fn rotations(&self) -> &BTreeMap<usize, Rotation> {
        &self.rotations
    }

    /// Split markers, ascending
    pub fn split_markers(&self) -> &BTreeSet<usize> {
        &self.splits
    }

    /// Whether a document boundary follows the given slot
    pub fn is_split_after(&self, slot: usize) -> bool {
        self.splits.contains(&slot)
    }

    /// Rotate a source page a quarter turn. Every occurrence shares the result.
    ///
    /// Pages that are valid for the document but no longer in the order are
    /// still accepted; the entry is inert until the page is shown again.
    pub fn rotate(&mut self, logical: usize, direction: RotateDirection) -> Option<Rotation> {
        if logical >= self.num_pages {
            debug!(logical, num_pages = self.num_pages, "rotate ignored: no such page");
            return None;
        }

        let rotation = self.rotation(logical).turned(direction);
        if rotation.is_zero() {
            self.rotations.remove(&logical);
        } else {
            self.rotations.insert(logical, rotation);
        }
        debug!(logical, degrees = rotation.degrees(), "page rotated");
        Some(rotation)
    }

    /// Insert a copy of `logical` right after its first occurrence.
    ///
    /// Markers at or after the original slot shift by one, so the copy stays in
    /// the same section as the page it was duplicated from.
    /// Returns the slot of the new copy.
    pub fn duplicate(&mut self, logical: usize) -> Option<usize> {
        let Some(original) = self.first_slot_of(logical) else {
            debug!(logical, "duplicate ignored: page not in order");
            return None;
        };

        let inserted = original + 1;
        self.order.insert(inserted, logical);
        self.splits = self
            .splits
            .iter()
            .map(|&marker| if marker >= original { marker + 1 } else { marker })
            .collect();

        debug!(logical, slot = inserted, "page duplicated");
        Some(inserted)
    }

    /// Remove exactly one slot. Other occurrences of the same page stay.
    ///
    /// Markers before the slot are kept, a marker on the slot is dropped and
    /// markers after it move down by one. Returns the removed logical page.
    pub fn delete_slot(&mut self, slot: usize) -> Option<usize> {
        if slot >= self.order.len() {
            debug!(slot, len = self.order.len(), "delete ignored: slot out of range");
            return None;
        }

        let logical = self.order.remove(slot);
        self.splits = self
            .splits
            .iter()
            .filter(|&&marker| marker != slot)
            .map(|&marker| if marker > slot { marker - 1 } else { marker })
            .collect();
        self.drop_trailing_markers();

        debug!(slot, logical, "slot deleted");
        Some(logical)
    }

    /// Remove every slot holding `logical`. Returns the number of slots removed.
    pub fn delete_logical(&mut self, logical: usize) -> usize {
        let slots: Vec<usize> = self.slots_of(logical);

        // Descending so earlier slot positions stay valid
        for &slot in slots.iter().rev() {
            self.delete_slot(slot);
        }
        slots.len()
    }

    /// All slots holding `logical`, ascending
    pub fn slots_of(&self, logical: usize) -> Vec<usize> {
        self.order
            .iter()
            .enumerate()
            .filter(|(_, &page)| page == logical)
            .map(|(slot, _)| slot)
            .collect()
    }

    /// Move one slot to a new position (drag and drop).
    ///
    /// Markers are boundaries between positions, not attached to pages, so
    /// they stay where they are.
    pub fn move_slot(&mut self, from: usize, to: usize) -> bool {
        let len = self.order.len();
        if from >= len || to >= len {
            debug!(from, to, len, "move ignored: slot out of range");
            return false;
        }
        if from == to {
            return false;
        }

        let logical = self.order.remove(from);
        self.order.insert(to, logical);
        debug!(from, to, logical, "slot moved");
        true
    }

    /// Toggle the boundary after `position`.
    ///
    /// Returns the new state, or None when the position cannot hold a marker
    /// (there is no slot after it).
    pub fn toggle_split(&mut self, position: usize) -> Option<bool> {
        if !self.is_valid_marker(position) {
            debug!(position, len = self.order.len(), "split ignored: position out of range");
            return None;
        }

        let enabled = if self.splits.remove(&position) {
            false
        } else {
            self.splits.insert(position);
            true
        };
        debug!(position, enabled, "split toggled");
        Some(enabled)
    }

    /// Replace every marker. Positions that cannot hold a marker are skipped.
    /// Returns the number of markers kept.
    pub fn replace_splits<I: IntoIterator<Item = usize>>(&mut self, positions: I) -> usize {
        let splits: BTreeSet<usize> = positions
            .into_iter()
            .filter(|&position| self.is_valid_marker(position))
            .collect();
        self.splits = splits;
        self.splits.len()
    }

    /// Remove every marker. Returns true when something was removed.
    pub fn clear_splits(&mut self) -> bool {
        let changed = !self.splits.is_empty();
        self.splits.clear();
        changed
    }

    fn is_valid_marker(&self, position: usize) -> bool {
        position + 1 < self.order.len()
    }

    fn drop_trailing_markers(&mut self) {
        let limit = self.order.len().saturating_sub(1);
        self.splits.retain(|&marker| marker < limit);
    }
}
