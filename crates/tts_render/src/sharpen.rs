//! Text-region sharpening applied to card images before placement.
//!
//! Detection sits behind [`TextRegionDetector`]; the built-in
//! [`EdgeDensityDetector`] flags blocks dense in vertical strokes, which is
//! where rules text and titles live on a scanned card.

use image::{GrayImage, Rgba, RgbaImage, imageops};

/// Sigma matching a 3×3 Gaussian kernel with automatic sigma.
const BLUR_SIGMA: f32 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl TextBox {
    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }
}

pub trait TextRegionDetector {
    fn detect(&self, image: &GrayImage) -> Vec<TextBox>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeDensityDetector {
    pub block_size: u32,
    /// Minimum horizontal luminance step counted as an edge.
    pub edge_threshold: u8,
    pub min_density: f32,
    pub max_density: f32,
}

impl Default for EdgeDensityDetector {
    fn default() -> Self {
        Self {
            block_size: 16,
            edge_threshold: 40,
            min_density: 0.08,
            max_density: 0.6,
        }
    }
}

impl EdgeDensityDetector {
    fn block_is_text(&self, image: &GrayImage, x0: u32, y0: u32, width: u32, height: u32) -> bool {
        let mut edges = 0u32;
        for y in y0..y0 + height {
            for x in x0..x0 + width {
                if x + 1 >= image.width() {
                    continue;
                }
                let left = image.get_pixel(x, y).0[0];
                let right = image.get_pixel(x + 1, y).0[0];
                if left.abs_diff(right) >= self.edge_threshold {
                    edges += 1;
                }
            }
        }
        let density = edges as f32 / (width * height) as f32;
        density >= self.min_density && density <= self.max_density
    }
}

impl TextRegionDetector for EdgeDensityDetector {
    fn detect(&self, image: &GrayImage) -> Vec<TextBox> {
        let block = self.block_size.max(1);
        let (width, height) = image.dimensions();
        let mut boxes = Vec::new();

        let mut y0 = 0;
        while y0 < height {
            let block_height = block.min(height - y0);
            let mut run: Option<TextBox> = None;
            let mut x0 = 0;
            while x0 < width {
                let block_width = block.min(width - x0);
                if self.block_is_text(image, x0, y0, block_width, block_height) {
                    match run.as_mut() {
                        Some(current) => current.width += block_width,
                        None => {
                            run = Some(TextBox {
                                x: x0,
                                y: y0,
                                width: block_width,
                                height: block_height,
                            })
                        }
                    }
                } else if let Some(done) = run.take() {
                    boxes.push(done);
                }
                x0 += block;
            }
            boxes.extend(run);
            y0 += block;
        }
        boxes
    }
}

/// Applies `2·img − blur(img)` inside every detected box, leaving alpha and
/// pixels outside the boxes untouched. Returns the number of boxes.
pub fn sharpen_text_regions(image: &mut RgbaImage, detector: &dyn TextRegionDetector) -> usize {
    let gray = imageops::grayscale(&*image);
    let boxes = detector.detect(&gray);
    if boxes.is_empty() {
        return 0;
    }

    let blurred = imageops::blur(&*image, BLUR_SIGMA);
    let (width, height) = image.dimensions();
    for region in &boxes {
        let right = (region.x + region.width).min(width);
        let lower = (region.y + region.height).min(height);
        for y in region.y..lower {
            for x in region.x..right {
                let original = image.get_pixel(x, y).0;
                let soft = blurred.get_pixel(x, y).0;
                let mut out = [0u8, 0, 0, original[3]];
                for channel in 0..3 {
                    let value = 2 * i16::from(original[channel]) - i16::from(soft[channel]);
                    out[channel] = value.clamp(0, 255) as u8;
                }
                image.put_pixel(x, y, Rgba(out));
            }
        }
    }
    boxes.len()
}
