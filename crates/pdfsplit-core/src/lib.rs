//! PDF page arrangement and split export
//!
//! A loaded document is shown as an ordered list of page slots. Slots can be
//! rotated, duplicated, deleted and reordered; split markers between slots (or
//! a fixed interval) cut the order into sections, and each section not marked
//! as skipped is exported as its own PDF.
//!
//! - [`PageArrangement`]: order, rotations and split markers
//! - [`compute_sections`]: derive sections from the current order
//! - [`export_sections`]: build one document per retained section
//! - [`SplitSession`]: ties the above together for one loaded document
//!
//! PDF access goes through the [`DocumentCodec`] trait; [`LopdfCodec`] is the
//! lopdf implementation.

pub mod arrangement;
pub mod codec;
pub mod command;
pub mod config;
pub mod delivery;
pub mod error;
pub mod export;
pub mod lopdf_codec;
pub mod render;
pub mod sections;
pub mod session;

pub use arrangement::{PageArrangement, RotateDirection, Rotation};
pub use codec::DocumentCodec;
pub use command::SessionCommand;
pub use config::{DeleteGranularity, SplitConfig};
pub use delivery::{FileDelivery, OutputFile};
pub use error::PdfSplitError;
pub use export::{export_sections, ExportProgress, ExportSummary, ExportedFile, NoProgress};
pub use lopdf_codec::{LopdfCodec, PdfDocument};
pub use render::{PageRenderer, SizeHint};
pub use sections::{compute_sections, Section, SectionMode, SectionSummary};
pub use session::{PreviewTarget, SplitSession};

/// Parse PDF bytes and return page count
pub fn get_page_count(bytes: &[u8]) -> Result<usize, PdfSplitError> {
    let codec = LopdfCodec::new();
    let document = codec.load(bytes)?;
    Ok(codec.page_count(&document))
}

/// Parse page list like "2, 5-7" into sorted unique page numbers
pub fn parse_ranges(input: &str) -> Result<Vec<usize>, PdfSplitError> {
    use std::collections::BTreeSet;

    let mut pages = BTreeSet::new();

    for part in input.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }

        if let Some((start, end)) = part.split_once('-') {
            let start: usize = start
                .trim()
                .parse()
                .map_err(|_| PdfSplitError::InvalidRange(format!("Invalid start: {}", start)))?;
            let end: usize = end
                .trim()
                .parse()
                .map_err(|_| PdfSplitError::InvalidRange(format!("Invalid end: {}", end)))?;

            if start > end {
                return Err(PdfSplitError::InvalidRange(format!(
                    "Start {} > end {}",
                    start, end
                )));
            }

            pages.extend(start..=end);
        } else {
            let page: usize = part
                .parse()
                .map_err(|_| PdfSplitError::InvalidRange(format!("Invalid page: {}", part)))?;
            pages.insert(page);
        }
    }

    Ok(pages.into_iter().collect())
}
