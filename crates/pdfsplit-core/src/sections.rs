//! Sectioning: partition the page order into export documents
//!
//! Sections are always derived from the current order and never stored, so
//! any edit that changes the order or the markers yields fresh sections.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::num::NonZeroUsize;

/// How the page order is cut into sections
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "size")]
pub enum SectionMode {
    /// Cut after every split marker
    #[default]
    Manual,
    /// Fixed-size chunks; split markers are kept but ignored
    Interval(NonZeroUsize),
}

/// A contiguous run of slots exported as one document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    /// Position in the computed section list (0-based)
    pub index: usize,
    /// First slot (inclusive)
    pub start: usize,
    /// Last slot (inclusive)
    pub end: usize,
    /// Logical pages in slot order, duplicates included
    pub pages: Vec<usize>,
}

impl Section {
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn contains_slot(&self, slot: usize) -> bool {
        !self.is_empty() && (self.start..=self.end).contains(&slot)
    }
}

/// Compute sections for `order` under `mode`.
///
/// In manual mode `markers` are boundaries after slot positions; positions
/// with no slot after them are ignored. An empty order has no sections.
pub fn compute_sections(
    order: &[usize],
    mode: SectionMode,
    markers: &BTreeSet<usize>,
) -> Vec<Section> {
    if order.is_empty() {
        return Vec::new();
    }

    match mode {
        SectionMode::Manual => manual_sections(order, markers),
        SectionMode::Interval(size) => interval_sections(order, size),
    }
}

fn manual_sections(order: &[usize], markers: &BTreeSet<usize>) -> Vec<Section> {
    let mut sections = Vec::with_capacity(markers.len() + 1);
    let mut start = 0;

    // BTreeSet iterates ascending
    for &marker in markers.iter().filter(|&&m| m + 1 < order.len()) {
        sections.push(section(sections.len(), order, start, marker));
        start = marker + 1;
    }
    sections.push(section(sections.len(), order, start, order.len() - 1));

    sections
}

fn interval_sections(order: &[usize], size: NonZeroUsize) -> Vec<Section> {
    order
        .chunks(size.get())
        .enumerate()
        .map(|(index, chunk)| {
            let start = index * size.get();
            Section {
                index,
                start,
                end: start + chunk.len() - 1,
                pages: chunk.to_vec(),
            }
        })
        .collect()
}

fn section(index: usize, order: &[usize], start: usize, end: usize) -> Section {
    Section {
        index,
        start,
        end,
        pages: order[start..=end].to_vec(),
    }
}

/// Section info for display, with the skip flag resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionSummary {
    pub index: usize,
    pub start: usize,
    pub end: usize,
    pub page_count: usize,
    /// 1-based page numbers of the source document, in slot order
    pub pages: Vec<usize>,
    pub skipped: bool,
}

impl SectionSummary {
    pub fn new(section: &Section, skipped: bool) -> Self {
        Self {
            index: section.index,
            start: section.start,
            end: section.end,
            page_count: section.len(),
            pages: section.pages.iter().map(|page| page + 1).collect(),
            skipped,
        }
    }
}
