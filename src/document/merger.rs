use lopdf::{Document, Object, ObjectId};

use super::pages::pin_inherited_attributes;
use super::root_pages_id;
use crate::error::{MergeSplitError, Result};

/// Concatenates documents page by page.
pub struct DocumentMerger;

impl DocumentMerger {
    /// Merge `documents` in order into a single document.
    ///
    /// The first document is the base. Every later document is renumbered past
    /// the base's highest object id, its objects are moved over, and its pages
    /// are appended to the base's root `Pages` node. Attributes a page
    /// inherited from its old tree are copied onto the page first so it renders
    /// the same in its new home.
    ///
    /// # Errors
    ///
    /// Fails if `documents` is empty or a page tree is malformed.
    pub fn merge(documents: Vec<Document>) -> Result<Document> {
        let mut documents = documents.into_iter();
        let Some(mut merged) = documents.next() else {
            return Err(MergeSplitError::other("No documents to merge"));
        };

        let pages_id = root_pages_id(&merged)?;
        let mut max_id = merged.max_id;

        for mut doc in documents {
            let incoming: Vec<ObjectId> = doc.get_pages().into_values().collect();
            for &page_id in &incoming {
                pin_inherited_attributes(&mut doc, page_id)?;
            }

            // Renumber before moving objects over so ids cannot collide.
            doc.renumber_objects_with(max_id + 1);
            max_id = doc.max_id;

            let page_ids: Vec<ObjectId> = doc.get_pages().into_values().collect();
            merged.objects.extend(doc.objects);
            Self::append_pages(&mut merged, pages_id, &page_ids)?;
        }

        merged.max_id = max_id;
        // The absorbed catalogs and page tree roots are now unreachable.
        merged.prune_objects();
        merged.renumber_objects();
        merged.compress();

        Ok(merged)
    }

    fn append_pages(merged: &mut Document, pages_id: ObjectId, page_ids: &[ObjectId]) -> Result<()> {
        for &page_id in page_ids {
            merged
                .get_dictionary_mut(page_id)?
                .set("Parent", Object::Reference(pages_id));
        }

        let pages = merged.get_dictionary_mut(pages_id)?;
        let kids = pages.get_mut(b"Kids")?.as_array_mut()?;
        kids.extend(page_ids.iter().map(|&id| Object::Reference(id)));

        let count = pages.get(b"Count")?.as_i64()?;
        pages.set("Count", Object::Integer(count + page_ids.len() as i64));

        Ok(())
    }
}
