use tts_core::core_api::{CoreError, CoreErrorCode};

/// Resolution every preset below is defined at.
pub const PRESET_DPI: u32 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SheetSize {
    A4,
    #[default]
    Letter,
    Legal,
}

impl SheetSize {
    pub fn pixels(self) -> (u32, u32) {
        match self {
            SheetSize::A4 => (2480, 3508),
            SheetSize::Letter => (2550, 3300),
            SheetSize::Legal => (2550, 4200),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CardSize {
    #[default]
    Standard,
    Mini,
}

impl CardSize {
    pub fn pixels(self) -> (u32, u32) {
        match self {
            CardSize::Standard => (734, 1045),
            CardSize::Mini => (500, 734),
        }
    }
}

/// Rescales a size defined at [`PRESET_DPI`] to `dpi`, truncating.
pub fn scale_to_dpi(size: (u32, u32), dpi: u32) -> (u32, u32) {
    let ratio = f64::from(dpi) / f64::from(PRESET_DPI);
    (
        (f64::from(size.0) * ratio) as u32,
        (f64::from(size.1) * ratio) as u32,
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutOptions {
    pub page_size: (u32, u32),
    /// Target card size; only the height is binding, widths follow each
    /// image's aspect ratio.
    pub image_size: (u32, u32),
    pub margin: u32,
    pub dpi: u32,
}

impl LayoutOptions {
    /// A custom card size is used verbatim when both dimensions are set;
    /// presets are scaled to `dpi`.
    pub fn from_presets(
        sheet: SheetSize,
        card: CardSize,
        custom: Option<(u32, u32)>,
        margin: u32,
        dpi: u32,
    ) -> Self {
        let image_size = match custom {
            Some((width, height)) if width > 0 && height > 0 => (width, height),
            _ => scale_to_dpi(card.pixels(), dpi),
        };
        Self {
            page_size: scale_to_dpi(sheet.pixels(), dpi),
            image_size,
            margin,
            dpi,
        }
    }
}

/// Size of an image of `native` dimensions scaled to `target_height`.
pub fn fit_to_height(native: (u32, u32), target_height: u32) -> Result<(u32, u32), CoreError> {
    let (width, height) = native;
    if width == 0 || height == 0 {
        return Err(CoreError::new(
            CoreErrorCode::Layout,
            format!("cannot scale an empty {width}x{height} image"),
        ));
    }
    let scaled = (f64::from(target_height) / f64::from(height)) * f64::from(width);
    Ok((scaled as u32, target_height))
}

/// Centered uniform grid of card slots on one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SheetLayout {
    pub page_width: u32,
    pub page_height: u32,
    pub image_width: u32,
    pub image_height: u32,
    pub margin: u32,
    pub per_row: u32,
    pub per_column: u32,
    pub start_x: u32,
    pub start_y: u32,
}

impl SheetLayout {
    pub fn compute(page: (u32, u32), image: (u32, u32), margin: u32) -> Result<Self, CoreError> {
        let (page_width, page_height) = page;
        let (image_width, image_height) = image;
        if image_width == 0 || image_height == 0 {
            return Err(CoreError::new(
                CoreErrorCode::Layout,
                format!("card size {image_width}x{image_height} is empty"),
            ));
        }

        // A slot step that overflows u32 cannot fit on any page.
        let fits = |page: u32, image: u32| {
            image
                .checked_add(margin)
                .map_or(0, |step| page.saturating_sub(margin) / step)
        };
        let per_row = fits(page_width, image_width);
        let per_column = fits(page_height, image_height);
        if per_row == 0 || per_column == 0 {
            return Err(CoreError::new(
                CoreErrorCode::Layout,
                format!(
                    "a {image_width}x{image_height} card with margin {margin} does not fit on a {page_width}x{page_height} page"
                ),
            ));
        }

        let total_width = per_row * (image_width + margin) - margin;
        let total_height = per_column * (image_height + margin) - margin;
        Ok(Self {
            page_width,
            page_height,
            image_width,
            image_height,
            margin,
            per_row,
            per_column,
            start_x: (page_width - total_width) / 2,
            start_y: (page_height - total_height) / 2,
        })
    }

    pub fn per_page(&self) -> usize {
        (self.per_row * self.per_column) as usize
    }

    /// Top-left corner of `slot`, counted left-to-right then top-to-bottom.
    pub fn slot_origin(&self, slot: usize) -> (u32, u32) {
        let column = slot as u32 % self.per_row;
        let row = slot as u32 / self.per_row;
        (
            self.start_x + column * (self.image_width + self.margin),
            self.start_y + row * (self.image_height + self.margin),
        )
    }

    pub fn page_count(&self, images: usize) -> usize {
        images.div_ceil(self.per_page())
    }
}
