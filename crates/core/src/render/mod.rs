//! PDF generation for the documents officers sign.
//!
//! The layouts are deliberately plain: a title, the application particulars
//! and one empty box per signer at the coordinates the HSM will stamp.

mod context;
mod pdf;

pub use context::DocumentContext;
pub use pdf::{PdfRenderer, RenderError};
