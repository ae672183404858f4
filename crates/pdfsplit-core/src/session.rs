//! Document session
//!
//! Owns everything that belongs to "the currently loaded document": the source
//! document, the page arrangement, the section mode, the skip set and the
//! preview cursor. All edits go through this object so the cross-structure
//! rules (skip set invalidation, preview cursor tracking) live in one place.
//!
//! Lifecycle: `Empty -> Loaded -> {Edited}* -> Exporting -> Loaded`.
//! Export borrows the session immutably and never changes the arrangement.

use crate::arrangement::{PageArrangement, RotateDirection, Rotation};
use crate::codec::DocumentCodec;
use crate::command::SessionCommand;
use crate::config::{DeleteGranularity, SplitConfig};
use crate::delivery::FileDelivery;
use crate::error::PdfSplitError;
use crate::export::{export_sections, ExportProgress, ExportRequest, ExportSummary};
use crate::render::{PageRenderer, SizeHint};
use crate::sections::{compute_sections, Section, SectionMode, SectionSummary};
use serde::Serialize;
use std::collections::BTreeSet;
use std::num::NonZeroUsize;
use tracing::{debug, info, warn};

/// The page currently shown full size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PreviewTarget {
    pub slot: usize,
    pub logical: usize,
    /// 1-based page number for renderers
    pub page_number: usize,
    pub rotation: Rotation,
}

pub struct SplitSession<C: DocumentCodec> {
    codec: C,
    config: SplitConfig,
    source: Option<C::Document>,
    arrangement: PageArrangement,
    mode: SectionMode,
    skipped: BTreeSet<usize>,
    /// Slot position of the previewed page
    preview: Option<usize>,
}

impl<C: DocumentCodec> SplitSession<C> {
    pub fn new(codec: C, config: SplitConfig) -> Self {
        let mode = config.initial_mode();
        Self {
            codec,
            config,
            source: None,
            arrangement: PageArrangement::default(),
            mode,
            skipped: BTreeSet::new(),
            preview: None,
        }
    }

    /// Load a new source document, replacing all previous state.
    /// On failure the session is left empty.
    pub fn load(&mut self, bytes: &[u8]) -> Result<usize, PdfSplitError> {
        self.reset();

        let document = self
            .codec
            .load(bytes)
            .inspect_err(|e| warn!(error = %e, "failed to load document"))?;
        let num_pages = self.codec.page_count(&document);

        self.arrangement.initialize(num_pages);
        self.source = Some(document);
        info!(num_pages, size_bytes = bytes.len(), "document loaded");
        Ok(num_pages)
    }

    /// Drop the source document and every edit
    pub fn reset(&mut self) {
        self.source = None;
        self.arrangement.initialize(0);
        self.mode = self.config.initial_mode();
        self.skipped.clear();
        self.preview = None;
    }

    pub fn is_loaded(&self) -> bool {
        self.source.is_some()
    }

    pub fn config(&self) -> &SplitConfig {
        &self.config
    }

    pub fn source(&self) -> Option<&C::Document> {
        self.source.as_ref()
    }

    pub fn arrangement(&self) -> &PageArrangement {
        &self.arrangement
    }

    pub fn mode(&self) -> SectionMode {
        self.mode
    }

    pub fn skipped_sections(&self) -> &BTreeSet<usize> {
        &self.skipped
    }

    // ============ Edits ============

    /// Rotate every occurrence of a source page. Sections are unaffected.
    pub fn rotate(&mut self, logical: usize, direction: RotateDirection) -> Option<Rotation> {
        self.arrangement.rotate(logical, direction)
    }

    /// Insert a copy of a page after its first occurrence
    pub fn duplicate(&mut self, logical: usize) -> Option<usize> {
        let inserted = self.arrangement.duplicate(logical)?;
        self.preview = self
            .preview
            .map(|slot| if slot >= inserted { slot + 1 } else { slot });
        self.invalidate_sections();
        Some(inserted)
    }

    /// Delete the page at `slot`. With [`DeleteGranularity::Logical`] every
    /// copy of the same source page goes with it.
    /// Returns the number of slots removed.
    pub fn delete(&mut self, slot: usize) -> usize {
        let removed: Vec<usize> = match self.config.delete_granularity {
            DeleteGranularity::Slot => match self.arrangement.delete_slot(slot) {
                Some(_) => vec![slot],
                None => Vec::new(),
            },
            DeleteGranularity::Logical => {
                let Some(logical) = self.arrangement.page_at(slot) else {
                    debug!(slot, "delete ignored: slot out of range");
                    return 0;
                };
                let slots = self.arrangement.slots_of(logical);
                self.arrangement.delete_logical(logical);
                slots
            }
        };

        if removed.is_empty() {
            return 0;
        }

        self.preview = self.preview.and_then(|current| {
            if removed.contains(&current) {
                debug!(slot = current, "previewed page deleted, closing preview");
                None
            } else {
                Some(current - removed.iter().filter(|&&s| s < current).count())
            }
        });
        self.invalidate_sections();
        removed.len()
    }

    /// Move a slot to a new position. The preview follows the moved page.
    pub fn move_slot(&mut self, from: usize, to: usize) -> bool {
        if !self.arrangement.move_slot(from, to) {
            return false;
        }

        self.preview = self.preview.map(|slot| {
            if slot == from {
                to
            } else if from < slot && slot <= to {
                slot - 1
            } else if to <= slot && slot < from {
                slot + 1
            } else {
                slot
            }
        });
        self.invalidate_sections();
        true
    }

    /// Toggle the boundary after `position`; None when the position is out of range
    pub fn toggle_split(&mut self, position: usize) -> Option<bool> {
        let enabled = self.arrangement.toggle_split(position)?;
        self.invalidate_sections();
        Some(enabled)
    }

    pub fn clear_splits(&mut self) -> bool {
        let changed = self.arrangement.clear_splits();
        if changed {
            self.invalidate_sections();
        }
        changed
    }

    /// Replace all markers with boundaries after the given 1-based slot
    /// numbers ("2, 5-6") and switch to manual mode.
    pub fn split_after_pages(&mut self, ranges: &str) -> Result<usize, PdfSplitError> {
        let len = self.arrangement.len();
        let numbers = crate::parse_ranges(ranges)?;

        for &number in &numbers {
            if number == 0 || number >= len {
                return Err(PdfSplitError::InvalidRange(format!(
                    "Cannot split after page {} (order has {} pages)",
                    number, len
                )));
            }
        }

        let count = self
            .arrangement
            .replace_splits(numbers.iter().map(|&number| number - 1));
        self.mode = SectionMode::Manual;
        self.invalidate_sections();
        Ok(count)
    }

    /// Cut into fixed chunks of `size` pages. Markers are kept but ignored.
    pub fn set_interval(&mut self, size: usize) -> Result<(), PdfSplitError> {
        let size = NonZeroUsize::new(size)
            .ok_or_else(|| PdfSplitError::InvalidRange("Interval must be at least 1".into()))?;
        self.set_mode(SectionMode::Interval(size));
        Ok(())
    }

    /// Go back to cutting at the split markers
    pub fn use_manual_splits(&mut self) {
        self.set_mode(SectionMode::Manual);
    }

    pub fn set_mode(&mut self, mode: SectionMode) {
        debug!(?mode, "section mode changed");
        self.mode = mode;
        self.invalidate_sections();
    }

    /// Apply an edit sent as a command. Returns whether anything changed.
    pub fn apply(&mut self, command: SessionCommand) -> Result<bool, PdfSplitError> {
        let changed = match command {
            SessionCommand::Rotate { page, direction } => self.rotate(page, direction).is_some(),
            SessionCommand::Duplicate { page } => self.duplicate(page).is_some(),
            SessionCommand::Delete { slot } => self.delete(slot) > 0,
            SessionCommand::Move { from, to } => self.move_slot(from, to),
            SessionCommand::ToggleSplit { position } => self.toggle_split(position).is_some(),
            SessionCommand::ClearSplits => self.clear_splits(),
            SessionCommand::SplitAfter { pages } => {
                self.split_after_pages(&pages)?;
                true
            }
            SessionCommand::SetInterval { size } => {
                self.set_interval(size)?;
                true
            }
            SessionCommand::ManualSplits => {
                self.use_manual_splits();
                true
            }
            SessionCommand::ToggleSkip { section } => self.toggle_skip(section).is_some(),
            SessionCommand::OpenPreview { slot } => self.open_preview(slot).is_some(),
            SessionCommand::ClosePreview => self.close_preview(),
        };
        Ok(changed)
    }

    // ============ Sections ============

    /// Sections of the current order, computed fresh
    pub fn sections(&self) -> Vec<Section> {
        compute_sections(
            self.arrangement.order(),
            self.mode,
            self.arrangement.split_markers(),
        )
    }

    pub fn section_summaries(&self) -> Vec<SectionSummary> {
        self.sections()
            .iter()
            .map(|section| SectionSummary::new(section, self.skipped.contains(&section.index)))
            .collect()
    }

    /// Toggle whether a section is left out of the next export.
    /// Returns the new skip state, or None for an unknown section.
    pub fn toggle_skip(&mut self, index: usize) -> Option<bool> {
        let count = self.sections().len();
        if index >= count {
            debug!(index, count, "skip ignored: no such section");
            return None;
        }

        let skipped = if self.skipped.remove(&index) {
            false
        } else {
            self.skipped.insert(index);
            true
        };
        Some(skipped)
    }

    pub fn clear_skips(&mut self) {
        self.skipped.clear();
    }

    fn invalidate_sections(&mut self) {
        if !self.skipped.is_empty() {
            debug!(count = self.skipped.len(), "sections changed, clearing skip set");
            self.skipped.clear();
        }
    }

    // ============ Export ============

    /// Export every section not in the skip set, in order
    pub fn export<D, P>(
        &self,
        delivery: &mut D,
        progress: &mut P,
    ) -> Result<ExportSummary, PdfSplitError>
    where
        D: FileDelivery + ?Sized,
        P: ExportProgress + ?Sized,
    {
        let source = self.source.as_ref().ok_or(PdfSplitError::NoDocument)?;
        let sections = self.sections();

        export_sections(
            &self.codec,
            source,
            ExportRequest {
                sections: &sections,
                skipped: &self.skipped,
                rotations: self.arrangement.rotations(),
            },
            &self.config,
            delivery,
            progress,
        )
    }

    // ============ Preview ============

    /// Show the page at `slot` full size
    pub fn open_preview(&mut self, slot: usize) -> Option<PreviewTarget> {
        let target = self.target_at(slot)?;
        self.preview = Some(slot);
        Some(target)
    }

    /// Returns true if a preview was open
    pub fn close_preview(&mut self) -> bool {
        self.preview.take().is_some()
    }

    pub fn preview_target(&self) -> Option<PreviewTarget> {
        self.preview.and_then(|slot| self.target_at(slot))
    }

    /// Step the preview to the next slot, staying on the last one at the end
    pub fn preview_next(&mut self) -> Option<PreviewTarget> {
        let slot = self.preview?;
        let next = (slot + 1).min(self.arrangement.len().saturating_sub(1));
        self.open_preview(next)
    }

    /// Step the preview to the previous slot, staying on the first one
    pub fn preview_previous(&mut self) -> Option<PreviewTarget> {
        let slot = self.preview?;
        self.open_preview(slot.saturating_sub(1))
    }

    /// What a renderer needs to draw the page at `slot`
    pub fn target_at(&self, slot: usize) -> Option<PreviewTarget> {
        let logical = self.arrangement.page_at(slot)?;
        Some(PreviewTarget {
            slot,
            logical,
            page_number: logical + 1,
            rotation: self.arrangement.rotation(logical),
        })
    }

    /// Render the previewed page, if any
    pub fn render_preview<R>(&self, renderer: &R) -> Result<Option<R::Output>, PdfSplitError>
    where
        R: PageRenderer<C::Document>,
    {
        match self.preview {
            Some(slot) => self.render_slot(renderer, slot, SizeHint::full()).map(Some),
            None => Ok(None),
        }
    }

    /// Render the page at `slot`, e.g. for a thumbnail
    pub fn render_slot<R>(
        &self,
        renderer: &R,
        slot: usize,
        size: SizeHint,
    ) -> Result<R::Output, PdfSplitError>
    where
        R: PageRenderer<C::Document>,
    {
        let source = self.source.as_ref().ok_or(PdfSplitError::NoDocument)?;
        let target = self.target_at(slot).ok_or_else(|| {
            PdfSplitError::InvalidRange(format!(
                "Slot {} is out of range ({} slots)",
                slot,
                self.arrangement.len()
            ))
        })?;
        renderer.render_page(source, target.page_number, target.rotation, size)
    }
}
