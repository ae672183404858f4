//! Page geometry for thumbnails and the preview
//!
//! Pixels are drawn by the browser; this module works out what to draw: the
//! page size, the rotation the viewer should apply, and the scale that fits a
//! requested box.

use lopdf::{Dictionary, Document, Object, ObjectId};
use pdfsplit_core::lopdf_codec::inherited_attribute;
use pdfsplit_core::{PageRenderer, PdfDocument, PdfSplitError, Rotation, SizeHint};
use serde::Serialize;

/// US Letter, used when no MediaBox is found
const DEFAULT_MEDIA_BOX: [f64; 4] = [0.0, 0.0, 612.0, 792.0];

/// Information about a single page as currently arranged
#[derive(Debug, Clone, Serialize)]
pub struct PageInfo {
    /// Page number in the source document (1-indexed)
    pub page_num: usize,
    /// Page width in points (1 point = 1/72 inch)
    pub width: f32,
    pub height: f32,
    /// /Rotate stored in the source document
    pub intrinsic_rotation: i32,
    /// Rotation the viewer should apply: intrinsic plus the user's rotation
    pub rotation: i32,
    pub orientation: PageOrientation,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub enum PageOrientation {
    Portrait,
    Landscape,
    Square,
}

impl PageOrientation {
    fn of(width: f64, height: f64) -> Self {
        if (width - height).abs() < 1.0 {
            PageOrientation::Square
        } else if width > height {
            PageOrientation::Landscape
        } else {
            PageOrientation::Portrait
        }
    }
}

impl PageInfo {
    /// Info for 1-based `page_num` with the session's `rotation` applied on top
    pub fn from_document(
        doc: &PdfDocument,
        page_num: usize,
        rotation: Rotation,
    ) -> Result<Self, String> {
        let page_id = page_num
            .checked_sub(1)
            .and_then(|logical| doc.page_id(logical))
            .ok_or_else(|| format!("Page {} not found", page_num))?;
        let page_dict = page_dictionary(doc.document(), page_id)
            .ok_or_else(|| format!("Page {} is not a dictionary", page_num))?;

        let media_box = match inherited_attribute(doc.document(), page_dict, b"MediaBox") {
            Some(Object::Array(array)) => parse_box_array(array)?,
            _ => DEFAULT_MEDIA_BOX,
        };
        let (width, height) = (
            (media_box[2] - media_box[0]).abs(),
            (media_box[3] - media_box[1]).abs(),
        );

        let intrinsic_rotation = inherited_attribute(doc.document(), page_dict, b"Rotate")
            .and_then(|rotate| rotate.as_i64().ok())
            .map_or(0, |angle| normalize_rotation(angle as i32));
        let effective = normalize_rotation(intrinsic_rotation + rotation.degrees());

        // Sideways pages swap their visible width and height
        let orientation = if effective % 180 == 90 {
            PageOrientation::of(height, width)
        } else {
            PageOrientation::of(width, height)
        };

        Ok(Self {
            page_num,
            width: width as f32,
            height: height as f32,
            intrinsic_rotation,
            rotation: effective,
            orientation,
        })
    }

    /// Width and height after rotation
    pub fn display_size(&self) -> (f32, f32) {
        if self.rotation % 180 == 90 {
            (self.height, self.width)
        } else {
            (self.width, self.height)
        }
    }
}

/// How the browser should draw a page into a box
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PageViewport {
    pub page_num: usize,
    pub rotation: i32,
    /// Points to pixels
    pub scale: f32,
    pub width: u32,
    pub height: u32,
}

/// Renderer that lays pages out for the browser's PDF viewer
#[derive(Debug, Default, Clone, Copy)]
pub struct ViewportRenderer;

impl PageRenderer<PdfDocument> for ViewportRenderer {
    type Output = PageViewport;

    fn render_page(
        &self,
        document: &PdfDocument,
        page_number: usize,
        rotation: Rotation,
        size: SizeHint,
    ) -> Result<PageViewport, PdfSplitError> {
        let info = PageInfo::from_document(document, page_number, rotation)
            .map_err(PdfSplitError::OperationError)?;
        let (width, height) = info.display_size();

        let scale = (size.max_width as f32 / width).min(size.max_height as f32 / height);
        let scale = if scale.is_finite() && scale > 0.0 { scale } else { 1.0 };

        Ok(PageViewport {
            page_num: page_number,
            rotation: info.rotation,
            scale,
            width: (width * scale).round() as u32,
            height: (height * scale).round() as u32,
        })
    }
}

fn page_dictionary(doc: &Document, page_id: ObjectId) -> Option<&Dictionary> {
    doc.get_object(page_id).and_then(|obj| obj.as_dict()).ok()
}

/// Parse a box array [x1, y1, x2, y2]
fn parse_box_array(array: &[Object]) -> Result<[f64; 4], String> {
    if array.len() != 4 {
        return Err("MediaBox must have 4 elements".to_string());
    }

    let mut result = [0.0; 4];
    for (i, obj) in array.iter().enumerate() {
        result[i] = match obj {
            Object::Integer(n) => *n as f64,
            Object::Real(n) => *n as f64,
            _ => return Err(format!("MediaBox element {} is not a number", i)),
        };
    }

    Ok(result)
}

/// Normalize rotation to 0, 90, 180, or 270
fn normalize_rotation(angle: i32) -> i32 {
    angle.rem_euclid(360)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::Stream;
    use pdfsplit_core::{DocumentCodec, LopdfCodec};

    /// Two pages: a portrait Letter page and a landscape page with /Rotate 90.
    /// The first page inherits its MediaBox from the page tree.
    fn create_mixed_pdf() -> Vec<u8> {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();
        let content_id = doc.add_object(Stream::new(Dictionary::new(), b"BT ET".to_vec()));

        let portrait = doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            ("Contents", Object::Reference(content_id)),
        ]));
        let landscape = doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            ("Contents", Object::Reference(content_id)),
            ("Rotate", Object::Integer(90)),
            (
                "MediaBox",
                Object::Array(vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Real(842.0),
                    Object::Real(595.0),
                ]),
            ),
        ]));

        let pages = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Count", Object::Integer(2)),
            (
                "Kids",
                Object::Array(vec![
                    Object::Reference(portrait),
                    Object::Reference(landscape),
                ]),
            ),
            (
                "MediaBox",
                Object::Array(vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(612),
                    Object::Integer(792),
                ]),
            ),
        ]);
        doc.objects.insert(pages_id, Object::Dictionary(pages));

        let catalog_id = doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(pages_id)),
        ]));
        doc.trailer.set("Root", Object::Reference(catalog_id));

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer).unwrap();
        buffer
    }

    fn load() -> PdfDocument {
        LopdfCodec::new().load(&create_mixed_pdf()).unwrap()
    }

    #[test]
    fn test_normalize_rotation() {
        assert_eq!(normalize_rotation(0), 0);
        assert_eq!(normalize_rotation(360), 0);
        assert_eq!(normalize_rotation(450), 90);
        assert_eq!(normalize_rotation(-90), 270);
    }

    #[test]
    fn test_parse_box_array() {
        let array = vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Real(612.0),
            Object::Real(792.0),
        ];
        assert_eq!(parse_box_array(&array).unwrap(), [0.0, 0.0, 612.0, 792.0]);
        assert!(parse_box_array(&array[..3]).is_err());
    }

    #[test]
    fn test_inherited_media_box() {
        let doc = load();
        let info = PageInfo::from_document(&doc, 1, Rotation::R0).unwrap();
        assert_eq!((info.width, info.height), (612.0, 792.0));
        assert_eq!(info.rotation, 0);
        assert_eq!(info.orientation, PageOrientation::Portrait);
    }

    #[test]
    fn test_user_rotation_changes_orientation() {
        let doc = load();
        let info = PageInfo::from_document(&doc, 1, Rotation::R90).unwrap();
        assert_eq!(info.rotation, 90);
        assert_eq!(info.orientation, PageOrientation::Landscape);
        assert_eq!(info.display_size(), (792.0, 612.0));
    }

    #[test]
    fn test_intrinsic_rotation_composes() {
        let doc = load();
        let info = PageInfo::from_document(&doc, 2, Rotation::R0).unwrap();
        assert_eq!(info.intrinsic_rotation, 90);
        assert_eq!(info.orientation, PageOrientation::Portrait);

        let turned = PageInfo::from_document(&doc, 2, Rotation::R270).unwrap();
        assert_eq!(turned.rotation, 0);
        assert_eq!(turned.orientation, PageOrientation::Landscape);
    }

    #[test]
    fn test_missing_page() {
        let doc = load();
        assert!(PageInfo::from_document(&doc, 0, Rotation::R0).is_err());
        assert!(PageInfo::from_document(&doc, 3, Rotation::R0).is_err());
    }

    #[test]
    fn test_viewport_fits_box() {
        let doc = load();
        let viewport = ViewportRenderer
            .render_page(&doc, 1, Rotation::R0, SizeHint::thumbnail())
            .unwrap();
        assert_eq!(viewport.height, 200);
        assert!(viewport.width <= 200);

        let sideways = ViewportRenderer
            .render_page(&doc, 1, Rotation::R90, SizeHint::thumbnail())
            .unwrap();
        assert_eq!(sideways.width, 200);
        assert_eq!(sideways.rotation, 90);
    }
}
