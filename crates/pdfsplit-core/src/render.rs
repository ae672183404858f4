//! Preview rendering contract
//!
//! Rendering is only used for on-screen preview; export never depends on it.

use crate::arrangement::Rotation;
use crate::error::PdfSplitError;
use serde::{Deserialize, Serialize};

/// Bounding box the rendered page should fit into, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeHint {
    pub max_width: u32,
    pub max_height: u32,
}

impl SizeHint {
    pub fn thumbnail() -> Self {
        Self {
            max_width: 200,
            max_height: 200,
        }
    }

    pub fn full() -> Self {
        Self {
            max_width: 800,
            max_height: 800,
        }
    }
}

pub trait PageRenderer<D> {
    /// Rasterized view, in whatever form the front end consumes
    type Output;

    /// Render 1-based `page_number` of `document` with `rotation` applied
    fn render_page(
        &self,
        document: &D,
        page_number: usize,
        rotation: Rotation,
        size: SizeHint,
    ) -> Result<Self::Output, PdfSplitError>;
}
