//! Reading PDFs from disk and committing outputs to it.

mod reader;
mod writer;

pub use reader::PdfReader;
pub use writer::{OutputWriter, PdfWriter};
