//! Deck sheet download, disk cache and per-card cropping.
//!
//! TTS custom decks pack up to `NumWidth × NumHeight` cards into one bitmap.
//! Sheets are cached on disk under a name derived from their URL, the same
//! naming the TTS mod image cache uses, so pointing the cache at TTS's own
//! `Mods/Images` directory avoids downloads entirely.

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use image::{DynamicImage, GenericImageView, ImageFormat};
use tracing::{debug, info};

use crate::core_api::{CoreError, CoreErrorCode};

/// Produces the bitmap for one card side.
pub trait ImageResolver {
    /// With `crop` unset the whole image at `url` is returned; otherwise the
    /// cell `index` of a `grid_width × grid_height` row-major grid.
    fn resolve(
        &mut self,
        url: &str,
        index: u32,
        grid_width: u32,
        grid_height: u32,
        crop: bool,
    ) -> Result<DynamicImage, CoreError>;
}

/// Source of raw sheet bytes on a cache miss.
pub trait SheetFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, CoreError>;
}

impl<T: SheetFetcher + ?Sized> SheetFetcher for &T {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, CoreError> {
        (**self).fetch(url)
    }
}

#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, CoreError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("tts-extract/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                CoreError::new(
                    CoreErrorCode::Fetch,
                    format!("failed to build HTTP client: {e}"),
                )
            })?;
        Ok(Self { client })
    }
}

impl SheetFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, CoreError> {
        let fetch_error =
            |e: reqwest::Error| CoreError::new(CoreErrorCode::Fetch, format!("GET {url}: {e}"));
        let response = self
            .client
            .get(url)
            .send()
            .and_then(|response| response.error_for_status())
            .map_err(fetch_error)?;
        let bytes = response.bytes().map_err(fetch_error)?;
        Ok(bytes.to_vec())
    }
}

/// Decoded sheets kept in memory: a deck's face sheet and its back sheet.
const MEMO_CAPACITY: usize = 2;

/// Disk-backed sheet cache. Each URL is downloaded at most once; only the
/// most recently used sheets stay decoded, older ones are re-read from disk.
#[derive(Debug)]
pub struct SheetCache<F> {
    dir: PathBuf,
    fetcher: F,
    recent: VecDeque<(String, Rc<DynamicImage>)>,
}

impl<F: SheetFetcher> SheetCache<F> {
    pub fn new(dir: impl Into<PathBuf>, fetcher: F) -> Self {
        Self {
            dir: dir.into(),
            fetcher,
            recent: VecDeque::with_capacity(MEMO_CAPACITY),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Existing cache file for `url`, preferring PNG over JPG.
    pub fn cached_path(&self, url: &str) -> Option<PathBuf> {
        let stem = cache_file_stem(url);
        ["png", "jpg"]
            .iter()
            .map(|ext| self.dir.join(format!("{stem}.{ext}")))
            .find(|path| path.is_file())
    }

    /// Number of sheets currently held decoded.
    pub fn memoized(&self) -> usize {
        self.recent.len()
    }

    pub fn sheet(&mut self, url: &str) -> Result<Rc<DynamicImage>, CoreError> {
        if let Some(position) = self.recent.iter().position(|(seen, _)| seen == url)
            && let Some(hit) = self.recent.remove(position)
        {
            let sheet = Rc::clone(&hit.1);
            self.recent.push_front(hit);
            return Ok(sheet);
        }
        let sheet = Rc::new(self.load_or_fetch(url)?);
        if self.recent.len() == MEMO_CAPACITY {
            self.recent.pop_back();
        }
        self.recent.push_front((url.to_string(), Rc::clone(&sheet)));
        Ok(sheet)
    }

    fn load_or_fetch(&self, url: &str) -> Result<DynamicImage, CoreError> {
        if let Some(path) = self.cached_path(url) {
            debug!("Loaded {url} from cache: {}", path.display());
            let bytes = fs::read(&path).map_err(|e| {
                CoreError::new(
                    CoreErrorCode::Io,
                    format!("failed to read {}: {e}", path.display()),
                )
            })?;
            return decode(&bytes, &path.display().to_string());
        }

        let bytes = self.fetcher.fetch(url)?;
        let sheet = decode(&bytes, url)?;

        fs::create_dir_all(&self.dir).map_err(|e| {
            CoreError::new(
                CoreErrorCode::Io,
                format!("failed to create cache dir {}: {e}", self.dir.display()),
            )
        })?;
        let path = self.dir.join(format!("{}.png", cache_file_stem(url)));
        sheet
            .save_with_format(&path, ImageFormat::Png)
            .map_err(|e| {
                CoreError::new(
                    CoreErrorCode::Encode,
                    format!("failed to write {}: {e}", path.display()),
                )
            })?;
        info!("Saved PNG image to cache: {}", path.display());
        Ok(sheet)
    }
}

impl<F: SheetFetcher> ImageResolver for SheetCache<F> {
    fn resolve(
        &mut self,
        url: &str,
        index: u32,
        grid_width: u32,
        grid_height: u32,
        crop: bool,
    ) -> Result<DynamicImage, CoreError> {
        let sheet = self.sheet(url)?;
        if !crop {
            return Ok((*sheet).clone());
        }
        crop_cell(&sheet, index, grid_width, grid_height)
            .map_err(|e| CoreError::new(e.code, format!("{url}: {}", e.message)))
    }
}

fn decode(bytes: &[u8], origin: &str) -> Result<DynamicImage, CoreError> {
    image::load_from_memory(bytes).map_err(|e| {
        CoreError::new(
            CoreErrorCode::Decode,
            format!("failed to decode image from {origin}: {e}"),
        )
    })
}

/// Cache file name (without extension) for a URL: every character that is not
/// an ASCII letter or digit is dropped.
pub fn cache_file_stem(url: &str) -> String {
    url.chars().filter(char::is_ascii_alphanumeric).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellBounds {
    pub left: u32,
    pub upper: u32,
    pub width: u32,
    pub height: u32,
}

impl CellBounds {
    pub fn right(&self) -> u32 {
        self.left + self.width
    }

    pub fn lower(&self) -> u32 {
        self.upper + self.height
    }
}

/// Bounds of cell `index` in a row-major `grid_width × grid_height` grid laid
/// over a `sheet_width × sheet_height` sheet. Remainder pixels on the right
/// and bottom edges belong to no cell.
pub fn cell_bounds(
    sheet_width: u32,
    sheet_height: u32,
    index: u32,
    grid_width: u32,
    grid_height: u32,
) -> CellBounds {
    let width = sheet_width / grid_width;
    let height = sheet_height / grid_height;
    CellBounds {
        left: (index % grid_width) * width,
        upper: (index / grid_width) * height,
        width,
        height,
    }
}

pub fn crop_cell(
    sheet: &DynamicImage,
    index: u32,
    grid_width: u32,
    grid_height: u32,
) -> Result<DynamicImage, CoreError> {
    if grid_width == 0 || grid_height == 0 {
        return Err(CoreError::new(
            CoreErrorCode::Layout,
            format!("invalid deck grid {grid_width}x{grid_height}"),
        ));
    }
    if u64::from(index) >= u64::from(grid_width) * u64::from(grid_height) {
        return Err(CoreError::new(
            CoreErrorCode::Layout,
            format!("card {index} is outside a {grid_width}x{grid_height} grid"),
        ));
    }
    let (sheet_width, sheet_height) = sheet.dimensions();
    let bounds = cell_bounds(sheet_width, sheet_height, index, grid_width, grid_height);
    if bounds.width == 0 || bounds.height == 0 || bounds.lower() > sheet_height {
        return Err(CoreError::new(
            CoreErrorCode::Layout,
            format!(
                "card {index} does not fit a {grid_width}x{grid_height} grid on a {sheet_width}x{sheet_height} sheet"
            ),
        ));
    }
    Ok(sheet.crop_imm(bounds.left, bounds.upper, bounds.width, bounds.height))
}
