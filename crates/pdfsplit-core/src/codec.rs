//! Document codec contract
//!
//! The codec owns everything byte-level: parsing the source, copying pages
//! between documents, applying rotation and writing the result. The export
//! engine only sequences these calls.

use crate::arrangement::Rotation;
use crate::error::PdfSplitError;

pub trait DocumentCodec {
    /// A parsed or newly created document
    type Document;
    /// A page copied out of a source document, not yet attached anywhere
    type Page;

    /// Parse source bytes
    fn load(&self, bytes: &[u8]) -> Result<Self::Document, PdfSplitError>;

    /// Number of pages in a document
    fn page_count(&self, document: &Self::Document) -> usize;

    /// A new document with no pages
    fn create_empty(&self) -> Self::Document;

    /// Copy the page at 0-based `logical` index, with everything it references
    fn copy_page(
        &self,
        source: &Self::Document,
        logical: usize,
    ) -> Result<Self::Page, PdfSplitError>;

    /// Rotate a copied page clockwise
    fn set_rotation(&self, page: &mut Self::Page, rotation: Rotation);

    /// Append a copied page at the end of `target`
    fn append_page(
        &self,
        target: &mut Self::Document,
        page: Self::Page,
    ) -> Result<(), PdfSplitError>;

    /// Write a document out as PDF bytes
    fn serialize(&self, document: Self::Document) -> Result<Vec<u8>, PdfSplitError>;
}
