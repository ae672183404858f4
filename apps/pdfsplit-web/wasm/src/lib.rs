//! WASM bindings for the page arranger and split exporter
//!
//! The document and every edit live in Rust inside `PdfSplitSession`.
//! JavaScript handles DOM events, draws pages with the viewports it is given
//! and saves the files passed to its delivery callback.
//!
//! ## Usage (JavaScript)
//!
//! ```javascript
//! import init, { PdfSplitSession } from './pkg/pdfsplit_wasm.js';
//!
//! await init();
//!
//! const session = new PdfSplitSession();
//! session.setProgressCallback((current, total, filename) => updateUI(current, total, filename));
//! session.loadDocument("file.pdf", bytes);
//! session.rotatePage(2, true);
//! session.toggleSplit(1);
//! const sections = session.getSections();
//! session.toggleSkip(0);
//! session.exportSections((filename, bytes) => downloadBlob(bytes, filename));
//! ```

pub mod page_info;
pub mod session;
pub mod validation;

use wasm_bindgen::prelude::*;

pub use page_info::{PageInfo, PageOrientation, PageViewport, ViewportRenderer};
pub use session::PdfSplitSession;
pub use validation::PdfInfo;

/// Initialize the WASM module
/// Called automatically by wasm-bindgen
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Get the library version
#[wasm_bindgen]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Quick validation check for a PDF file
/// Returns Ok(()) if valid, Err with message if not
#[wasm_bindgen]
pub fn quick_validate(bytes: &[u8]) -> Result<(), JsValue> {
    validation::quick_validate(bytes).map_err(|e| JsValue::from_str(&e))
}

/// Get PDF info without creating a session
#[wasm_bindgen]
pub fn get_pdf_info(bytes: &[u8]) -> Result<JsValue, JsValue> {
    let info = validation::validate_pdf(bytes).map_err(|e| JsValue::from_str(&e))?;

    serde_wasm_bindgen::to_value(&info)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

/// Format bytes as human-readable string
#[wasm_bindgen]
pub fn format_bytes(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = KB * 1024;

    match bytes {
        b if b < KB => format!("{} B", b),
        b if b < MB => format!("{:.1} KB", b as f64 / KB as f64),
        b => format!("{:.1} MB", b as f64 / MB as f64),
    }
}
