use image::imageops::{self, FilterType};
use image::buffer::ConvertBuffer;
use image::{GenericImageView, RgbImage, Rgba, RgbaImage};
use tracing::{debug, info};
use tts_core::core_api::{CoreError, CoreErrorCode, EntryKey, ImageEntry};

use crate::layout::{LayoutOptions, SheetLayout, fit_to_height};
use crate::sharpen::{TextRegionDetector, sharpen_text_regions};

/// One printable sheet: a white canvas plus the keys placed on it, in slot
/// order.
#[derive(Debug, Clone)]
pub struct Page {
    canvas: RgbaImage,
    placed: Vec<EntryKey>,
}

impl Page {
    fn blank(layout: &SheetLayout) -> Self {
        Self {
            canvas: RgbaImage::from_pixel(
                layout.page_width,
                layout.page_height,
                Rgba([255, 255, 255, 255]),
            ),
            placed: Vec::new(),
        }
    }

    pub fn canvas(&self) -> &RgbaImage {
        &self.canvas
    }

    pub fn placed(&self) -> &[EntryKey] {
        &self.placed
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.canvas.dimensions()
    }

    /// The canvas is opaque, so dropping alpha loses nothing.
    pub fn to_rgb(&self) -> RgbImage {
        self.canvas.convert()
    }
}

/// Packs entries onto pages in `EntryKey` order.
///
/// The slot width comes from the first sorted image scaled to the target
/// height; every image is then scaled to that height at its own aspect ratio
/// and composited at its slot's top-left corner.
pub fn arrange_images(
    entries: &[ImageEntry],
    options: &LayoutOptions,
    sharpen: Option<&dyn TextRegionDetector>,
) -> Result<Vec<Page>, CoreError> {
    let mut ordered: Vec<&ImageEntry> = entries.iter().collect();
    ordered.sort_by(|a, b| a.key.cmp(&b.key));
    let Some(first) = ordered.first() else {
        return Err(CoreError::new(
            CoreErrorCode::EmptyInput,
            "no card images to arrange",
        ));
    };

    let slot = fit_to_height(first.image.dimensions(), options.image_size.1)?;
    let layout = SheetLayout::compute(options.page_size, slot, options.margin)?;
    let per_page = layout.per_page();
    debug!(
        "Layout {}x{} per page, slot {}x{}, origin ({}, {})",
        layout.per_row,
        layout.per_column,
        layout.image_width,
        layout.image_height,
        layout.start_x,
        layout.start_y
    );

    let total = ordered.len();
    let mut pages = Vec::with_capacity(layout.page_count(total));
    let mut page = Page::blank(&layout);

    for (position, entry) in ordered.into_iter().enumerate() {
        let (width, _) = fit_to_height(entry.image.dimensions(), layout.image_height)?;
        let mut card = entry
            .image
            .resize_exact(width.max(1), layout.image_height, FilterType::Lanczos3)
            .to_rgba8();
        if let Some(detector) = sharpen {
            let regions = sharpen_text_regions(&mut card, detector);
            debug!("Sharpened {regions} text regions on {}", entry.key);
        }

        let (x, y) = layout.slot_origin(position % per_page);
        imageops::overlay(&mut page.canvas, &card, i64::from(x), i64::from(y));
        page.placed.push(entry.key.clone());

        let placed = position + 1;
        if placed % per_page == 0 && placed != total {
            pages.push(std::mem::replace(&mut page, Page::blank(&layout)));
            info!("Created page {}", pages.len());
        }
    }

    pages.push(page);
    info!("Created page {}", pages.len());
    Ok(pages)
}
