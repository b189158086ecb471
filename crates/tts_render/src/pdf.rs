use std::fs;
use std::io::Write as _;
use std::path::Path;

use flate2::Compression;
use flate2::write::ZlibEncoder;
use lopdf::{Dictionary, Document, Object, Stream};
use tracing::info;
use tts_core::core_api::{CoreError, CoreErrorCode};

use crate::compose::Page;

pub const OUTPUT_PDF_NAME: &str = "tts_extract_out.pdf";

/// Serializes pages into one PDF, each page a single full-bleed RGB image
/// sized so that one pixel is `1/dpi` inch.
pub fn pdf_bytes(pages: &[Page], dpi: u32) -> Result<Vec<u8>, CoreError> {
    if pages.is_empty() {
        return Err(CoreError::new(CoreErrorCode::EmptyInput, "no pages to write"));
    }
    if dpi == 0 {
        return Err(CoreError::new(CoreErrorCode::Encode, "dpi must be positive"));
    }

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let mut kids = Vec::with_capacity(pages.len());

    for page in pages {
        let (width, height) = page.dimensions();
        let image_id = doc.add_object(image_xobject(page, width, height)?);

        let points_w = width as f32 * 72.0 / dpi as f32;
        let points_h = height as f32 * 72.0 / dpi as f32;
        let content = format!("q\n{points_w} 0 0 {points_h} 0 0 cm\n/Im0 Do\nQ\n");
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content.into_bytes()));

        let mut xobjects = Dictionary::new();
        xobjects.set("Im0", Object::Reference(image_id));
        let mut resources = Dictionary::new();
        resources.set("XObject", Object::Dictionary(xobjects));

        let mut page_dict = Dictionary::new();
        page_dict.set("Type", Object::Name(b"Page".to_vec()));
        page_dict.set("Parent", Object::Reference(pages_id));
        page_dict.set(
            "MediaBox",
            vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(points_w),
                Object::Real(points_h),
            ],
        );
        page_dict.set("Resources", Object::Dictionary(resources));
        page_dict.set("Contents", Object::Reference(content_id));
        kids.push(Object::Reference(doc.add_object(page_dict)));
    }

    let mut pages_dict = Dictionary::new();
    pages_dict.set("Type", Object::Name(b"Pages".to_vec()));
    pages_dict.set("Count", Object::Integer(kids.len() as i64));
    pages_dict.set("Kids", Object::Array(kids));
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let mut catalog = Dictionary::new();
    catalog.set("Type", Object::Name(b"Catalog".to_vec()));
    catalog.set("Pages", Object::Reference(pages_id));
    let catalog_id = doc.add_object(catalog);
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut out = Vec::new();
    doc.save_to(&mut out)
        .map_err(|e| CoreError::new(CoreErrorCode::Encode, format!("failed to serialize PDF: {e}")))?;
    Ok(out)
}

pub fn write_pdf(pages: &[Page], dpi: u32, path: &Path) -> Result<(), CoreError> {
    let bytes = pdf_bytes(pages, dpi)?;
    fs::write(path, bytes).map_err(|e| {
        CoreError::new(
            CoreErrorCode::Io,
            format!("failed to write {}: {e}", path.display()),
        )
    })?;
    info!("PDF file created: {}", path.display());
    Ok(())
}

fn image_xobject(page: &Page, width: u32, height: u32) -> Result<Stream, CoreError> {
    let compress_error =
        |e: std::io::Error| CoreError::new(CoreErrorCode::Encode, format!("failed to compress page: {e}"));
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(page.to_rgb().as_raw())
        .map_err(compress_error)?;
    let compressed = encoder.finish().map_err(compress_error)?;

    let mut dict = Dictionary::new();
    dict.set("Type", Object::Name(b"XObject".to_vec()));
    dict.set("Subtype", Object::Name(b"Image".to_vec()));
    dict.set("Width", Object::Integer(i64::from(width)));
    dict.set("Height", Object::Integer(i64::from(height)));
    dict.set("ColorSpace", Object::Name(b"DeviceRGB".to_vec()));
    dict.set("BitsPerComponent", Object::Integer(8));
    dict.set("Filter", Object::Name(b"FlateDecode".to_vec()));
    Ok(Stream::new(dict, compressed))
}
