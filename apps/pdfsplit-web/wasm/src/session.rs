//! Stateful split session for JavaScript
//!
//! Holds the loaded document and every edit in Rust memory. JavaScript only
//! forwards user events, draws what it is told to draw and saves the files
//! handed to its delivery callback.

use crate::page_info::{PageInfo, PageViewport, ViewportRenderer};
use crate::validation::{check_header, document_info, PdfInfo};
use pdfsplit_core::{
    ExportSummary, FileDelivery, LopdfCodec, OutputFile, PdfSplitError, PreviewTarget,
    RotateDirection, SectionSummary, SessionCommand, SizeHint, SplitConfig, SplitSession,
};
use serde::Serialize;
use wasm_bindgen::prelude::*;

/// Passes each exported file to a JS function `(filename, bytes) => void`
struct JsDelivery<'a> {
    callback: &'a js_sys::Function,
}

impl FileDelivery for JsDelivery<'_> {
    fn deliver(&mut self, file: OutputFile) -> Result<(), PdfSplitError> {
        let array = js_sys::Uint8Array::new_with_length(file.bytes.len() as u32);
        array.copy_from(&file.bytes);

        self.callback
            .call2(&JsValue::null(), &JsValue::from_str(&file.filename), &array)
            .map(|_| ())
            .map_err(|e| PdfSplitError::DeliveryError {
                filename: file.filename.clone(),
                reason: e.as_string().unwrap_or_else(|| format!("{:?}", e)),
            })
    }
}

/// Loaded document name and upload info
struct LoadedFile {
    name: String,
    info: PdfInfo,
}

#[wasm_bindgen]
pub struct PdfSplitSession {
    inner: SplitSession<LopdfCodec>,
    file: Option<LoadedFile>,
    progress_callback: Option<js_sys::Function>,
}

#[wasm_bindgen]
impl PdfSplitSession {
    /// Create a session. `config_json` may override any `SplitConfig` field.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<PdfSplitSession, JsValue> {
        Self::with_config_json(config_json.as_deref()).map_err(|e| JsValue::from_str(&e))
    }

    /// Set a progress callback function
    /// Callback signature: (current: number, total: number, filename: string) => void
    #[wasm_bindgen(js_name = setProgressCallback)]
    pub fn set_progress_callback(&mut self, callback: js_sys::Function) {
        self.progress_callback = Some(callback);
    }

    /// Load a document, replacing the current one and all edits.
    /// Returns document info on success.
    #[wasm_bindgen(js_name = loadDocument)]
    pub fn load_document(&mut self, name: &str, bytes: &[u8]) -> Result<JsValue, JsValue> {
        let info = self
            .load_document_internal(name, bytes)
            .map_err(|e| JsValue::from_str(&e))?;
        to_js(&info)
    }

    /// Drop the document and every edit
    pub fn reset(&mut self) {
        self.inner.reset();
        self.file = None;
    }

    #[wasm_bindgen(getter, js_name = isLoaded)]
    pub fn is_loaded(&self) -> bool {
        self.inner.is_loaded()
    }

    #[wasm_bindgen(getter, js_name = fileName)]
    pub fn file_name(&self) -> Option<String> {
        self.file.as_ref().map(|file| file.name.clone())
    }

    /// Page count of the loaded document
    #[wasm_bindgen(js_name = getPageCount)]
    pub fn get_page_count(&self) -> usize {
        self.inner.arrangement().num_pages()
    }

    /// Number of slots in the current order
    #[wasm_bindgen(js_name = getSlotCount)]
    pub fn get_slot_count(&self) -> usize {
        self.inner.arrangement().len()
    }

    /// 0-based logical page for every slot
    #[wasm_bindgen(js_name = getOrder)]
    pub fn get_order(&self) -> Vec<u32> {
        self.inner
            .arrangement()
            .order()
            .iter()
            .map(|&page| page as u32)
            .collect()
    }

    /// Slot positions with a boundary after them
    #[wasm_bindgen(js_name = getSplitMarkers)]
    pub fn get_split_markers(&self) -> Vec<u32> {
        self.inner
            .arrangement()
            .split_markers()
            .iter()
            .map(|&slot| slot as u32)
            .collect()
    }

    /// Document info from the last successful load
    #[wasm_bindgen(js_name = getDocumentInfo)]
    pub fn get_document_info(&self) -> Result<JsValue, JsValue> {
        match &self.file {
            Some(file) => to_js(&file.info),
            None => Ok(JsValue::NULL),
        }
    }

    // ============ Edits ============

    /// Rotate a page a quarter turn; returns the new user rotation in degrees
    #[wasm_bindgen(js_name = rotatePage)]
    pub fn rotate_page(&mut self, page: usize, clockwise: bool) -> Option<i32> {
        let direction = if clockwise {
            RotateDirection::Right
        } else {
            RotateDirection::Left
        };
        self.inner
            .rotate(page, direction)
            .map(|rotation| rotation.degrees())
    }

    /// Insert a copy of `page` after its first occurrence; returns the new slot
    #[wasm_bindgen(js_name = duplicatePage)]
    pub fn duplicate_page(&mut self, page: usize) -> Option<usize> {
        self.inner.duplicate(page)
    }

    /// Returns the number of slots removed
    #[wasm_bindgen(js_name = deleteSlot)]
    pub fn delete_slot(&mut self, slot: usize) -> usize {
        self.inner.delete(slot)
    }

    #[wasm_bindgen(js_name = moveSlot)]
    pub fn move_slot(&mut self, from: usize, to: usize) -> bool {
        self.inner.move_slot(from, to)
    }

    #[wasm_bindgen(js_name = toggleSplit)]
    pub fn toggle_split(&mut self, position: usize) -> Option<bool> {
        self.inner.toggle_split(position)
    }

    #[wasm_bindgen(js_name = clearSplits)]
    pub fn clear_splits(&mut self) -> bool {
        self.inner.clear_splits()
    }

    /// Input: "2, 5-6" (split after these 1-based slot numbers)
    #[wasm_bindgen(js_name = splitAfterPages)]
    pub fn split_after_pages(&mut self, ranges: &str) -> Result<usize, JsValue> {
        self.inner
            .split_after_pages(ranges)
            .map_err(|e| JsValue::from_str(&format!("Invalid split list: {}", e)))
    }

    #[wasm_bindgen(js_name = setInterval)]
    pub fn set_interval(&mut self, size: usize) -> Result<(), JsValue> {
        self.inner
            .set_interval(size)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    #[wasm_bindgen(js_name = useManualSplits)]
    pub fn use_manual_splits(&mut self) {
        self.inner.use_manual_splits();
    }

    /// Apply a JSON command, e.g. `{"type":"Move","from":3,"to":0}`.
    /// Returns whether anything changed.
    #[wasm_bindgen(js_name = applyCommand)]
    pub fn apply_command(&mut self, json: &str) -> Result<bool, JsValue> {
        self.apply_command_internal(json)
            .map_err(|e| JsValue::from_str(&e))
    }

    // ============ Sections ============

    #[wasm_bindgen(js_name = getSections)]
    pub fn get_sections(&self) -> Result<JsValue, JsValue> {
        to_js(&self.inner.section_summaries())
    }

    /// Returns the new skip state, or undefined for an unknown section
    #[wasm_bindgen(js_name = toggleSkip)]
    pub fn toggle_skip(&mut self, section: usize) -> Option<bool> {
        self.inner.toggle_skip(section)
    }

    /// Mark every section for export again
    #[wasm_bindgen(js_name = clearSkips)]
    pub fn clear_skips(&mut self) {
        self.inner.clear_skips();
    }

    // ============ Pages and preview ============

    /// Geometry of the page in `slot`, with the user's rotation applied
    #[wasm_bindgen(js_name = getPageInfo)]
    pub fn get_page_info(&self, slot: usize) -> Result<JsValue, JsValue> {
        let info = self
            .page_info_internal(slot)
            .map_err(|e| JsValue::from_str(&e))?;
        to_js(&info)
    }

    /// Viewport for drawing the thumbnail of `slot`
    #[wasm_bindgen(js_name = getThumbnail)]
    pub fn get_thumbnail(&self, slot: usize) -> Result<JsValue, JsValue> {
        let viewport = self
            .viewport_internal(slot, SizeHint::thumbnail())
            .map_err(|e| JsValue::from_str(&e))?;
        to_js(&viewport)
    }

    #[wasm_bindgen(js_name = openPreview)]
    pub fn open_preview(&mut self, slot: usize) -> Result<JsValue, JsValue> {
        let target = self.inner.open_preview(slot);
        to_js(&target)
    }

    #[wasm_bindgen(js_name = closePreview)]
    pub fn close_preview(&mut self) -> bool {
        self.inner.close_preview()
    }

    #[wasm_bindgen(js_name = previewNext)]
    pub fn preview_next(&mut self) -> Result<JsValue, JsValue> {
        let target = self.inner.preview_next();
        to_js(&target)
    }

    #[wasm_bindgen(js_name = previewPrevious)]
    pub fn preview_previous(&mut self) -> Result<JsValue, JsValue> {
        let target = self.inner.preview_previous();
        to_js(&target)
    }

    /// Target and full-size viewport of the open preview, or null
    #[wasm_bindgen(js_name = getPreview)]
    pub fn get_preview(&self) -> Result<JsValue, JsValue> {
        let preview = self
            .preview_internal()
            .map_err(|e| JsValue::from_str(&e))?;
        to_js(&preview)
    }

    // ============ Export ============

    /// Export every section not marked as skipped.
    /// `deliver` is called as `(filename, bytes)` once per file, in order.
    #[wasm_bindgen(js_name = exportSections)]
    pub fn export_sections(&self, deliver: &js_sys::Function) -> Result<JsValue, JsValue> {
        let mut delivery = JsDelivery { callback: deliver };
        let summary = self
            .export_internal(&mut delivery)
            .map_err(|e| JsValue::from_str(&format!("Export failed: {}", e)))?;
        to_js(&summary)
    }
}

/// The open preview, resolved for drawing
#[derive(Debug, Serialize)]
struct PreviewView {
    target: PreviewTarget,
    viewport: PageViewport,
}

impl PdfSplitSession {
    fn with_config_json(config_json: Option<&str>) -> Result<Self, String> {
        let config = match config_json {
            Some(json) => SplitConfig::from_json(json).map_err(|e| e.to_string())?,
            None => SplitConfig::default(),
        };

        Ok(Self {
            inner: SplitSession::new(LopdfCodec::from_config(&config), config),
            file: None,
            progress_callback: None,
        })
    }

    /// Internal method to load a document (testable without JsValue)
    fn load_document_internal(&mut self, name: &str, bytes: &[u8]) -> Result<PdfInfo, String> {
        self.reset();

        check_header(bytes)?;
        self.inner.load(bytes).map_err(|e| e.to_string())?;

        let info = self
            .inner
            .source()
            .ok_or_else(|| "No document loaded".to_string())
            .and_then(|source| document_info(source.document(), bytes));
        if info.is_err() {
            self.inner.reset();
        }
        let info = info?;

        self.file = Some(LoadedFile {
            name: name.to_string(),
            info: info.clone(),
        });
        Ok(info)
    }

    fn apply_command_internal(&mut self, json: &str) -> Result<bool, String> {
        let command =
            SessionCommand::from_json(json).map_err(|e| format!("Invalid command: {}", e))?;
        self.inner.apply(command).map_err(|e| e.to_string())
    }

    fn section_summaries_internal(&self) -> Vec<SectionSummary> {
        self.inner.section_summaries()
    }

    fn page_info_internal(&self, slot: usize) -> Result<PageInfo, String> {
        let source = self.inner.source().ok_or("No document loaded")?;
        let target = self
            .inner
            .target_at(slot)
            .ok_or_else(|| format!("Slot {} is out of range", slot))?;
        PageInfo::from_document(source, target.page_number, target.rotation)
    }

    fn viewport_internal(&self, slot: usize, size: SizeHint) -> Result<PageViewport, String> {
        self.inner
            .render_slot(&ViewportRenderer, slot, size)
            .map_err(|e| e.to_string())
    }

    fn preview_internal(&self) -> Result<Option<PreviewView>, String> {
        let Some(target) = self.inner.preview_target() else {
            return Ok(None);
        };
        let viewport = self
            .inner
            .render_preview(&ViewportRenderer)
            .map_err(|e| e.to_string())?
            .ok_or("Preview closed")?;
        Ok(Some(PreviewView { target, viewport }))
    }

    fn export_internal<D: FileDelivery>(&self, delivery: &mut D) -> Result<ExportSummary, String> {
        let mut progress = |current: usize, total: usize, filename: &str| {
            self.report_progress(current, total, filename)
        };
        self.inner
            .export(delivery, &mut progress)
            .map_err(|e| e.to_string())
    }

    /// Report progress to JavaScript callback
    fn report_progress(&self, current: usize, total: usize, filename: &str) {
        if let Some(ref callback) = self.progress_callback {
            let this = JsValue::null();
            let _ = callback.call3(
                &this,
                &JsValue::from(current as u32),
                &JsValue::from(total as u32),
                &JsValue::from_str(filename),
            );
        }
    }
}

fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}
