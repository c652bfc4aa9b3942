//! Document-level PDF surgery: combining documents and cutting out pages.
//!
//! Everything here works on in-memory [`lopdf::Document`]s and is blocking.
//! Loading and saving live in [`crate::io`].

mod merger;
mod pages;

pub use merger::DocumentMerger;
pub use pages::{PageExtractor, pin_inherited_attributes};

use lopdf::{Document, ObjectId};

use crate::error::Result;

/// Object id of the document's root `Pages` node.
pub(crate) fn root_pages_id(doc: &Document) -> Result<ObjectId> {
    Ok(doc.catalog()?.get(b"Pages")?.as_reference()?)
}
