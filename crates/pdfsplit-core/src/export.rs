//! Export engine
//!
//! Turns the retained sections into one output document each. Every codec
//! call is issued in sequence and only one output document exists at a time.
//! A failure aborts the run; files already delivered are not taken back.

use crate::arrangement::Rotation;
use crate::codec::DocumentCodec;
use crate::config::SplitConfig;
use crate::delivery::{FileDelivery, OutputFile};
use crate::error::PdfSplitError;
use crate::sections::Section;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, warn};

/// Progress hook, called before each section is built
pub trait ExportProgress {
    fn on_section(&mut self, current: usize, total: usize, filename: &str);
}

impl<F: FnMut(usize, usize, &str)> ExportProgress for F {
    fn on_section(&mut self, current: usize, total: usize, filename: &str) {
        self(current, total, filename)
    }
}

/// Progress hook that ignores every update
pub struct NoProgress;

impl ExportProgress for NoProgress {
    fn on_section(&mut self, _current: usize, _total: usize, _filename: &str) {}
}

/// Everything export reads from the arrangement
#[derive(Debug, Clone, Copy)]
pub struct ExportRequest<'a> {
    pub sections: &'a [Section],
    pub skipped: &'a BTreeSet<usize>,
    pub rotations: &'a BTreeMap<usize, Rotation>,
}

/// One delivered file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportedFile {
    pub filename: String,
    pub section: usize,
    pub page_count: usize,
    pub size_bytes: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExportSummary {
    pub files: Vec<ExportedFile>,
    /// Sections left out because they were in the skip set
    pub skipped_sections: usize,
    pub page_count: usize,
    pub output_size_bytes: usize,
}

/// Build and deliver `split_{n}.pdf` for every section not in the skip set.
///
/// Files are numbered 1.. among the exported sections only, so skipped
/// sections leave no gaps.
pub fn export_sections<C, D, P>(
    codec: &C,
    source: &C::Document,
    request: ExportRequest<'_>,
    config: &SplitConfig,
    delivery: &mut D,
    progress: &mut P,
) -> Result<ExportSummary, PdfSplitError>
where
    C: DocumentCodec,
    D: FileDelivery + ?Sized,
    P: ExportProgress + ?Sized,
{
    let retained: Vec<&Section> = request
        .sections
        .iter()
        .filter(|section| !request.skipped.contains(&section.index))
        .filter(|section| !section.is_empty())
        .collect();

    let mut summary = ExportSummary {
        skipped_sections: request.sections.len() - retained.len(),
        ..ExportSummary::default()
    };
    info!(
        sections = retained.len(),
        skipped = summary.skipped_sections,
        "starting export"
    );

    for (i, section) in retained.iter().enumerate() {
        let number = i + 1;
        let filename = config.filename_for(number);
        progress.on_section(number, retained.len(), &filename);

        let bytes = build_section(codec, source, section, request.rotations)
            .map_err(|e| e.in_section(number))
            .inspect_err(|e| warn!(section = number, error = %e, "export aborted"))?;

        let exported = ExportedFile {
            filename: filename.clone(),
            section: section.index,
            page_count: section.len(),
            size_bytes: bytes.len(),
        };
        delivery
            .deliver(OutputFile {
                number,
                section: section.index,
                filename,
                page_count: section.len(),
                bytes,
            })
            .inspect_err(|e| warn!(section = number, error = %e, "delivery failed"))?;

        debug!(file = %exported.filename, pages = exported.page_count, bytes = exported.size_bytes, "section exported");
        summary.page_count += exported.page_count;
        summary.output_size_bytes += exported.size_bytes;
        summary.files.push(exported);
    }

    info!(
        files = summary.files.len(),
        bytes = summary.output_size_bytes,
        "export complete"
    );
    Ok(summary)
}

/// Copy the section's pages into a fresh document and serialize it
fn build_section<C: DocumentCodec>(
    codec: &C,
    source: &C::Document,
    section: &Section,
    rotations: &BTreeMap<usize, Rotation>,
) -> Result<Vec<u8>, PdfSplitError> {
    let mut target = codec.create_empty();

    for &logical in &section.pages {
        let mut page = codec.copy_page(source, logical)?;
        let rotation = rotations.get(&logical).copied().unwrap_or_default();
        if !rotation.is_zero() {
            codec.set_rotation(&mut page, rotation);
        }
        codec.append_page(&mut target, page)?;
    }

    codec.serialize(target)
}
