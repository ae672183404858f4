//! lopdf-backed document codec
//!
//! Pages are copied with "Construction by Whitelist": the page dictionary plus
//! every object reachable from it, minus the page tree itself. Attributes the
//! page inherits from its ancestors are resolved onto the copy first, so the
//! copy renders the same without its old parent.

use crate::arrangement::Rotation;
use crate::codec::DocumentCodec;
use crate::config::SplitConfig;
use crate::error::PdfSplitError;
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Page attributes that may be inherited from the page tree
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Guard against cyclic /Parent chains
const MAX_TREE_DEPTH: usize = 64;

#[derive(Debug, Clone)]
pub struct LopdfCodec {
    pdf_version: String,
    compress: bool,
}

impl LopdfCodec {
    pub fn new() -> Self {
        Self::from_config(&SplitConfig::default())
    }

    pub fn from_config(config: &SplitConfig) -> Self {
        Self {
            pdf_version: config.pdf_version.clone(),
            compress: config.compress_output,
        }
    }
}

impl Default for LopdfCodec {
    fn default() -> Self {
        Self::new()
    }
}

/// A document plus its flattened page list
#[derive(Debug, Clone)]
pub struct PdfDocument {
    document: Document,
    pages_id: ObjectId,
    page_ids: Vec<ObjectId>,
    /// Source object id -> id already written into this document
    imported: HashMap<ObjectId, ObjectId>,
}

impl PdfDocument {
    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    /// Object id of the page at 0-based `logical` index
    pub fn page_id(&self, logical: usize) -> Option<ObjectId> {
        self.page_ids.get(logical).copied()
    }
}

/// A detached page and the objects it references, still numbered as in the source
#[derive(Debug, Clone)]
pub struct CopiedPage {
    dictionary: Dictionary,
    objects: BTreeMap<ObjectId, Object>,
}

impl CopiedPage {
    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    /// Number of objects carried along with the page dictionary
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }
}

impl DocumentCodec for LopdfCodec {
    type Document = PdfDocument;
    type Page = CopiedPage;

    fn load(&self, bytes: &[u8]) -> Result<PdfDocument, PdfSplitError> {
        let document =
            Document::load_mem(bytes).map_err(|e| PdfSplitError::ParseError(e.to_string()))?;
        let pages_id = pages_root(&document)?;
        let page_ids = document.get_pages().into_values().collect();

        Ok(PdfDocument {
            document,
            pages_id,
            page_ids,
            imported: HashMap::new(),
        })
    }

    fn page_count(&self, document: &PdfDocument) -> usize {
        document.page_count()
    }

    fn create_empty(&self) -> PdfDocument {
        let mut document = Document::with_version(self.pdf_version.clone());
        let pages_id = document.new_object_id();

        let pages = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Kids", Object::Array(Vec::new())),
            ("Count", Object::Integer(0)),
        ]);
        document.objects.insert(pages_id, Object::Dictionary(pages));

        let catalog = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(pages_id)),
        ]);
        let catalog_id = document.add_object(catalog);
        document.trailer.set("Root", Object::Reference(catalog_id));

        PdfDocument {
            document,
            pages_id,
            page_ids: Vec::new(),
            imported: HashMap::new(),
        }
    }

    fn copy_page(&self, source: &PdfDocument, logical: usize) -> Result<CopiedPage, PdfSplitError> {
        let page_id = source.page_id(logical).ok_or_else(|| {
            PdfSplitError::OperationError(format!(
                "Page {} does not exist (document has {} pages)",
                logical + 1,
                source.page_count()
            ))
        })?;

        let mut dictionary = source
            .document
            .get_object(page_id)
            .and_then(|object| object.as_dict())
            .map_err(|e| {
                PdfSplitError::OperationError(format!("Page {} is unreadable: {}", logical + 1, e))
            })?
            .clone();

        for key in INHERITABLE {
            if !dictionary.has(key) {
                if let Some(value) = inherited_attribute(&source.document, &dictionary, key) {
                    dictionary.set(key, value.clone());
                }
            }
        }
        dictionary.remove(b"Parent");

        let objects = collect_dependencies(&source.document, page_id, &dictionary);

        Ok(CopiedPage {
            dictionary,
            objects,
        })
    }

    fn set_rotation(&self, page: &mut CopiedPage, rotation: Rotation) {
        // Compose with the page's own /Rotate so the result matches the preview
        let intrinsic = page
            .dictionary
            .get(b"Rotate")
            .and_then(|object| object.as_i64())
            .unwrap_or(0);
        let combined = (intrinsic + i64::from(rotation.degrees())).rem_euclid(360);
        page.dictionary.set("Rotate", Object::Integer(combined));
    }

    fn append_page(&self, target: &mut PdfDocument, page: CopiedPage) -> Result<(), PdfSplitError> {
        let CopiedPage {
            mut dictionary,
            objects,
        } = page;

        // Objects shared with earlier pages are written once per document
        let fresh: Vec<(ObjectId, Object)> = objects
            .into_iter()
            .filter(|(old_id, _)| !target.imported.contains_key(old_id))
            .collect();
        for (old_id, _) in &fresh {
            let new_id = target.document.new_object_id();
            target.imported.insert(*old_id, new_id);
        }

        for (old_id, mut object) in fresh {
            remap_refs(&mut object, &target.imported);
            if let Some(&new_id) = target.imported.get(&old_id) {
                target.document.objects.insert(new_id, object);
            }
        }

        for (_, value) in dictionary.iter_mut() {
            remap_refs(value, &target.imported);
        }
        dictionary.set("Parent", Object::Reference(target.pages_id));

        let page_id = target.document.add_object(dictionary);
        target.page_ids.push(page_id);

        update_page_tree(&mut target.document, target.pages_id, &target.page_ids)
    }

    fn serialize(&self, mut document: PdfDocument) -> Result<Vec<u8>, PdfSplitError> {
        if self.compress {
            document.document.compress();
        }

        let mut buffer = Vec::new();
        document
            .document
            .save_to(&mut buffer)
            .map_err(|e| PdfSplitError::SerializationError(format!("Save failed: {}", e)))?;

        Ok(buffer)
    }
}

/// Find the root Pages object through the catalog
fn pages_root(document: &Document) -> Result<ObjectId, PdfSplitError> {
    let catalog_id = document
        .trailer
        .get(b"Root")
        .and_then(|root| root.as_reference())
        .map_err(|_| PdfSplitError::ParseError("No Root in trailer".into()))?;

    let catalog = document
        .get_object(catalog_id)
        .and_then(|object| object.as_dict())
        .map_err(|_| PdfSplitError::ParseError("Catalog not found".into()))?;

    catalog
        .get(b"Pages")
        .and_then(|pages| pages.as_reference())
        .map_err(|_| PdfSplitError::ParseError("No Pages in catalog".into()))
}

/// Look up `key` on the page, then up its /Parent chain
pub fn inherited_attribute<'a>(
    document: &'a Document,
    page: &'a Dictionary,
    key: &[u8],
) -> Option<&'a Object> {
    let mut node = page;

    for _ in 0..MAX_TREE_DEPTH {
        if let Ok(value) = node.get(key) {
            return Some(value);
        }
        let parent = node.get(b"Parent").and_then(|p| p.as_reference()).ok()?;
        node = document
            .get_object(parent)
            .and_then(|object| object.as_dict())
            .ok()?;
    }

    None
}

/// Every object reachable from the page, excluding page tree nodes
fn collect_dependencies(
    document: &Document,
    page_id: ObjectId,
    page: &Dictionary,
) -> BTreeMap<ObjectId, Object> {
    let mut objects = BTreeMap::new();
    let mut visited = HashSet::from([page_id]);
    let mut pending = Vec::new();

    for (_, value) in page.iter() {
        collect_refs(value, &mut pending);
    }

    while let Some(id) = pending.pop() {
        if !visited.insert(id) {
            continue;
        }
        let Ok(object) = document.get_object(id) else {
            continue;
        };
        // Links back into the page tree (annotation /P, other pages) are not followed
        if is_page_tree_node(object) {
            continue;
        }
        collect_refs(object, &mut pending);
        objects.insert(id, object.clone());
    }

    objects
}

fn collect_refs(object: &Object, out: &mut Vec<ObjectId>) {
    match object {
        Object::Reference(id) => out.push(*id),
        Object::Array(items) => items.iter().for_each(|item| collect_refs(item, out)),
        Object::Dictionary(dict) => dict.iter().for_each(|(_, value)| collect_refs(value, out)),
        Object::Stream(stream) => stream
            .dict
            .iter()
            .for_each(|(_, value)| collect_refs(value, out)),
        _ => {}
    }
}

/// Rewrite references through `ids`; references that were not copied become null
fn remap_refs(object: &mut Object, ids: &HashMap<ObjectId, ObjectId>) {
    match object {
        Object::Reference(id) => {
            let replacement = ids
                .get(id)
                .map_or(Object::Null, |&new_id| Object::Reference(new_id));
            *object = replacement;
        }
        Object::Array(items) => items.iter_mut().for_each(|item| remap_refs(item, ids)),
        Object::Dictionary(dict) => {
            for (_, value) in dict.iter_mut() {
                remap_refs(value, ids);
            }
        }
        Object::Stream(stream) => {
            for (_, value) in stream.dict.iter_mut() {
                remap_refs(value, ids);
            }
        }
        _ => {}
    }
}

fn is_page_tree_node(object: &Object) -> bool {
    let Object::Dictionary(dict) = object else {
        return false;
    };
    matches!(dict.get(b"Type"), Ok(Object::Name(name)) if name == b"Page" || name == b"Pages")
}

/// Point the Pages node at `page_ids`
fn update_page_tree(
    document: &mut Document,
    pages_id: ObjectId,
    page_ids: &[ObjectId],
) -> Result<(), PdfSplitError> {
    if let Some(Object::Dictionary(ref mut pages_dict)) = document.objects.get_mut(&pages_id) {
        let kids = page_ids
            .iter()
            .map(|&id| Object::Reference(id))
            .collect::<Vec<_>>();
        pages_dict.set("Kids", Object::Array(kids));
        pages_dict.set("Count", Object::Integer(page_ids.len() as i64));
        Ok(())
    } else {
        Err(PdfSplitError::OperationError(
            "Invalid pages dictionary".into(),
        ))
    }
}
