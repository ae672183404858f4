use thiserror::Error;

#[derive(Error, Debug)]
pub enum PdfSplitError {
    #[error("Failed to parse PDF: {0}")]
    ParseError(String),

    #[error("Invalid page range: {0}")]
    InvalidRange(String),

    #[error("PDF operation failed: {0}")]
    OperationError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Failed to deliver {filename}: {reason}")]
    DeliveryError { filename: String, reason: String },

    #[error("No document loaded")]
    NoDocument,

    #[error("Export failed at section {section}: {source}")]
    ExportFailed {
        section: usize,
        #[source]
        source: Box<PdfSplitError>,
    },
}

impl PdfSplitError {
    /// Wrap an error with the 1-based number of the section being exported
    pub fn in_section(self, section: usize) -> Self {
        PdfSplitError::ExportFailed {
            section,
            source: Box::new(self),
        }
    }
}
