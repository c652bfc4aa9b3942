use lopdf::{Document, Object, ObjectId};
use std::path::Path;

use super::root_pages_id;
use crate::error::{MergeSplitError, Result};

/// Page attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Guards against cyclic `Parent` chains in damaged files.
const MAX_TREE_DEPTH: usize = 64;

/// Cuts single pages out of a document.
pub struct PageExtractor;

impl PageExtractor {
    /// Build a one-page document holding 1-indexed `page` of `doc`.
    ///
    /// `source` is only used for error reporting.
    ///
    /// # Errors
    ///
    /// Returns [`MergeSplitError::PageOutOfRange`] for a page the document does
    /// not have, or a PDF error if the page tree is malformed.
    pub fn extract_page(doc: &Document, source: &Path, page: u32) -> Result<Document> {
        let pages = doc.get_pages();
        let page_id = *pages
            .get(&page)
            .ok_or_else(|| MergeSplitError::PageOutOfRange {
                path: source.to_path_buf(),
                page,
                total: pages.len() as u32,
            })?;

        let mut single = doc.clone();
        pin_inherited_attributes(&mut single, page_id)?;

        let pages_id = root_pages_id(&single)?;
        {
            let root = single.get_dictionary_mut(pages_id)?;
            root.set("Kids", Object::Array(vec![Object::Reference(page_id)]));
            root.set("Count", Object::Integer(1));
        }
        single
            .get_dictionary_mut(page_id)?
            .set("Parent", Object::Reference(pages_id));

        // Outlines point at pages that are no longer in the tree.
        single.catalog_mut()?.remove(b"Outlines");
        single.prune_objects();
        single.compress();

        Ok(single)
    }
}

/// Copy inheritable attributes from the page's ancestors onto the page itself,
/// so the page no longer depends on its position in the tree.
///
/// # Errors
///
/// Fails if `page_id` is not a dictionary.
pub fn pin_inherited_attributes(doc: &mut Document, page_id: ObjectId) -> Result<()> {
    let missing: Vec<(&[u8], Object)> = {
        let page = doc.get_dictionary(page_id)?;
        INHERITABLE
            .iter()
            .filter(|key| !page.has(key))
            .filter_map(|&key| inherited_value(doc, page_id, key).map(|value| (key, value)))
            .collect()
    };

    if missing.is_empty() {
        return Ok(());
    }

    let page = doc.get_dictionary_mut(page_id)?;
    for (key, value) in missing {
        page.set(key.to_vec(), value);
    }
    Ok(())
}

fn inherited_value(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<Object> {
    let mut current = parent_of(doc, page_id);
    for _ in 0..MAX_TREE_DEPTH {
        let node_id = current?;
        let node = doc.get_dictionary(node_id).ok()?;
        if let Ok(value) = node.get(key) {
            return Some(value.clone());
        }
        current = parent_of(doc, node_id);
    }
    None
}

fn parent_of(doc: &Document, id: ObjectId) -> Option<ObjectId> {
    doc.get_dictionary(id)
        .ok()?
        .get(b"Parent")
        .and_then(Object::as_reference)
        .ok()
}
