use std::fs;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use image::{DynamicImage, GrayImage, Rgba, RgbaImage};
use lopdf::{Document, Object};
use tts_core::core_api::{CoreErrorCode, EntryKey, ImageEntry};
use tts_render::{
    LayoutOptions, OUTPUT_PDF_NAME, TextBox, TextRegionDetector, arrange_images, pdf_bytes,
    render_manifest, sharpen_text_regions, write_manifest, write_pdf,
};

fn temp_test_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time before unix epoch")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!(
        "tts_extract_{}_{}_{}",
        prefix,
        std::process::id(),
        nanos
    ));
    fs::create_dir_all(&dir).expect("failed to create temp dir");
    dir
}

fn entry(id: &str, copy_index: u32, back: bool) -> ImageEntry {
    let key = if back {
        EntryKey::back(id, copy_index)
    } else {
        EntryKey::face(id, copy_index)
    };
    ImageEntry {
        key,
        image: Rc::new(DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            10,
            20,
            Rgba([10, 120, 240, 255]),
        ))),
    }
}

/// Reports a fixed box regardless of content.
struct FixedRegion(TextBox);

impl TextRegionDetector for FixedRegion {
    fn detect(&self, _image: &GrayImage) -> Vec<TextBox> {
        vec![self.0]
    }
}

#[test]
fn pdf_has_one_page_per_sheet_sized_in_points() {
    let entries: Vec<ImageEntry> = (0..7).map(|i| entry("card", i, false)).collect();
    let options = LayoutOptions {
        page_size: (50, 60),
        image_size: (10, 20),
        margin: 5,
        dpi: 150,
    };
    let pages = arrange_images(&entries, &options, None).expect("arrange should succeed");
    let bytes = pdf_bytes(&pages, options.dpi).expect("pdf should serialize");

    assert!(bytes.starts_with(b"%PDF-1.5"));
    let doc = Document::load_mem(&bytes).expect("pdf should parse");
    let page_ids: Vec<_> = doc.get_pages().into_values().collect();
    assert_eq!(page_ids.len(), 2);

    let page = doc
        .get_dictionary(page_ids[0])
        .expect("page should be a dictionary");
    let media_box = page
        .get(b"MediaBox")
        .and_then(Object::as_array)
        .expect("page should have a MediaBox");
    let width = media_box[2].as_float().expect("width should be numeric");
    let height = media_box[3].as_float().expect("height should be numeric");
    assert!((width - 24.0).abs() < 0.01, "width {width}");
    assert!((height - 28.8).abs() < 0.01, "height {height}");
}

#[test]
fn pdf_requires_pages() {
    let err = pdf_bytes(&[], 300).expect_err("no pages");
    assert_eq!(err.code, CoreErrorCode::EmptyInput);
}

#[test]
fn write_pdf_creates_file() {
    let dir = temp_test_dir("pdf_write");
    let options = LayoutOptions {
        page_size: (50, 60),
        image_size: (10, 20),
        margin: 5,
        dpi: 300,
    };
    let pages =
        arrange_images(&[entry("a", 0, false)], &options, None).expect("arrange should succeed");
    let path = dir.join(OUTPUT_PDF_NAME);

    write_pdf(&pages, options.dpi, &path).expect("pdf should be written");

    let bytes = fs::read(&path).expect("pdf should be readable");
    let doc = Document::load_mem(&bytes).expect("pdf should parse");
    assert_eq!(doc.get_pages().len(), 1);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn sharpening_is_confined_to_detected_regions() {
    let original = RgbaImage::from_fn(16, 16, |x, y| {
        let level = if (x + y) % 2 == 0 { 100 } else { 150 };
        Rgba([level, level, level, 200])
    });
    let region = TextBox {
        x: 0,
        y: 0,
        width: 8,
        height: 16,
    };
    let mut sharpened = original.clone();

    let boxes = sharpen_text_regions(&mut sharpened, &FixedRegion(region));

    assert_eq!(boxes, 1);
    let mut changed_inside = false;
    for (x, y, pixel) in sharpened.enumerate_pixels() {
        let before = original.get_pixel(x, y);
        assert_eq!(pixel.0[3], 200, "alpha must be preserved at ({x},{y})");
        if region.contains(x, y) {
            changed_inside |= pixel != before;
        } else {
            assert_eq!(pixel, before, "pixel outside the region changed at ({x},{y})");
        }
    }
    assert!(changed_inside);
}

#[test]
fn manifest_lists_keys_in_emission_order() {
    let entries = vec![
        entry("Wendy", 0, false),
        entry("Wendy", 0, true),
        entry("01001", 0, false),
        entry("Lita, the Bold", 0, false),
    ];
    assert_eq!(
        render_manifest(&entries),
        "image_id\nWendy_0\nWendy_0_back\n01001_0\n\"Lita, the Bold_0\"\n"
    );

    let dir = temp_test_dir("manifest");
    let path = dir.join("manifest.csv");
    write_manifest(&path, &entries).expect("manifest should be written");
    let written = fs::read_to_string(&path).expect("manifest should be readable");
    assert_eq!(written.lines().count(), 5);

    let _ = fs::remove_dir_all(&dir);
}
