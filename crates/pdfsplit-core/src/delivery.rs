//! Output file delivery
//!
//! Export hands every finished document to a `FileDelivery`. What "deliver"
//! means (download, write to disk, collect in memory) is up to the caller.

use crate::error::PdfSplitError;
use serde::Serialize;

/// One exported document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputFile {
    /// 1-based number among exported sections
    pub number: usize,
    /// Index of the section this file was built from
    pub section: usize,
    pub filename: String,
    pub page_count: usize,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

pub trait FileDelivery {
    fn deliver(&mut self, file: OutputFile) -> Result<(), PdfSplitError>;
}

/// Collect files in memory
impl FileDelivery for Vec<OutputFile> {
    fn deliver(&mut self, file: OutputFile) -> Result<(), PdfSplitError> {
        self.push(file);
        Ok(())
    }
}

impl<T: FileDelivery + ?Sized> FileDelivery for &mut T {
    fn deliver(&mut self, file: OutputFile) -> Result<(), PdfSplitError> {
        (**self).deliver(file)
    }
}
