//! Sheet packing and print output for extracted card images.
//!
//! Entries coming out of the core expander are laid out on fixed-size pages
//! ([`layout`], [`compose`]), optionally sharpened ([`sharpen`]) and written
//! as a multi-page PDF ([`pdf`]) alongside a CSV manifest ([`manifest`]).

pub mod compose;
pub mod layout;
pub mod manifest;
pub mod pdf;
pub mod sharpen;

pub use compose::{Page, arrange_images};
pub use layout::{CardSize, LayoutOptions, SheetLayout, SheetSize, fit_to_height, scale_to_dpi};
pub use manifest::{OUTPUT_MANIFEST_NAME, render_manifest, write_manifest};
pub use pdf::{OUTPUT_PDF_NAME, pdf_bytes, write_pdf};
pub use sharpen::{EdgeDensityDetector, TextBox, TextRegionDetector, sharpen_text_regions};
