use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, ValueEnum};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tts_core::core_api::{CardCatalog, Engine, ExpandOptions, QuantitySource};
use tts_core::deck_sheet::{HttpFetcher, SheetCache};
use tts_render::{
    CardSize, EdgeDensityDetector, LayoutOptions, OUTPUT_MANIFEST_NAME, OUTPUT_PDF_NAME,
    SheetSize, TextRegionDetector, arrange_images, write_manifest, write_pdf,
};

const CACHE_PATH_FILE: &str = "cachepath.txt";
const DEFAULT_CACHE_DIR: &str = "cache";

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum QuantitySourceArg {
    Arkhamdb,
    #[value(name = "tts_saved_object", alias = "tts-saved-object")]
    TtsSavedObject,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum CardSizeArg {
    Standard,
    Mini,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum SheetSizeArg {
    A4,
    Letter,
    Legal,
}

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Cli {
    #[arg(value_name = "SAVE.json")]
    path: PathBuf,
    /// Directory holding downloaded deck sheets; remembered in cachepath.txt.
    #[arg(long = "cache-dir", value_name = "DIR")]
    cache_dir: Option<PathBuf>,
    #[arg(long = "cards-db", value_name = "cards.json", default_value = "cards.json")]
    cards_db: PathBuf,
    #[arg(short, long)]
    quiet: bool,
    /// Also print card backs.
    #[arg(long)]
    back: bool,
    #[arg(
        long = "quantity-source",
        value_enum,
        default_value_t = QuantitySourceArg::Arkhamdb
    )]
    quantity_source: QuantitySourceArg,
    #[arg(long = "card-size", value_enum, default_value_t = CardSizeArg::Standard)]
    card_size: CardSizeArg,
    #[arg(long = "custom-width", value_name = "PX", requires = "custom_height")]
    custom_width: Option<u32>,
    #[arg(long = "custom-height", value_name = "PX", requires = "custom_width")]
    custom_height: Option<u32>,
    #[arg(long = "sheet-size", value_enum, default_value_t = SheetSizeArg::Letter)]
    sheet_size: SheetSizeArg,
    #[arg(long, value_name = "PX", default_value_t = 30)]
    margin: u32,
    #[arg(
        long,
        default_value_t = 300,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    dpi: u32,
    #[arg(long = "exclude-player-backs")]
    exclude_player_backs: bool,
    #[arg(long = "exclude-encounter-backs")]
    exclude_encounter_backs: bool,
    #[arg(long = "sharpen-text")]
    sharpen_text: bool,
    #[arg(long = "output-dir", value_name = "DIR", default_value = ".")]
    output_dir: PathBuf,
    /// Do not open the finished PDF.
    #[arg(long = "no-open")]
    no_open: bool,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.quiet);

    let cache_dir = resolve_cache_dir(cli.cache_dir.as_deref());
    let quantity_source = to_core_quantity_source(cli.quantity_source);
    let catalog = match quantity_source {
        QuantitySource::ArkhamDb => Some(CardCatalog::load_from_path(&cli.cards_db).unwrap_or_else(
            |e| {
                eprintln!("Error loading card database {}: {e}", cli.cards_db.display());
                process::exit(1);
            },
        )),
        QuantitySource::TtsSavedObject => None,
    };

    info!("Extracting images...");
    let session = Engine::new().open_path(&cli.path).unwrap_or_else(|e| {
        eprintln!("Error parsing save file: {}", cli.path.display());
        eprintln!("  {e}");
        process::exit(1);
    });

    let fetcher = HttpFetcher::new().unwrap_or_else(|e| {
        eprintln!("Error setting up downloads: {e}");
        process::exit(1);
    });
    let mut sheets = SheetCache::new(&cache_dir, fetcher);
    let options = ExpandOptions {
        quantity_source,
        back: cli.back,
        exclude_player_backs: cli.exclude_player_backs,
        exclude_encounter_backs: cli.exclude_encounter_backs,
    };
    let entries = session
        .expand(&mut sheets, catalog.as_ref(), &options)
        .unwrap_or_else(|e| {
            eprintln!("Error extracting card images: {e}");
            process::exit(1);
        });

    let manifest_path = cli.output_dir.join(OUTPUT_MANIFEST_NAME);
    let pdf_path = cli.output_dir.join(OUTPUT_PDF_NAME);
    if let Err(e) = fs::create_dir_all(&cli.output_dir) {
        eprintln!("Error creating {}: {e}", cli.output_dir.display());
        process::exit(1);
    }
    if let Err(e) = write_manifest(&manifest_path, &entries) {
        eprintln!("Error writing manifest: {e}");
        process::exit(1);
    }

    let layout = LayoutOptions::from_presets(
        to_sheet_size(cli.sheet_size),
        to_card_size(cli.card_size),
        cli.custom_width.zip(cli.custom_height),
        cli.margin,
        cli.dpi,
    );
    let detector = EdgeDensityDetector::default();
    let sharpen = cli
        .sharpen_text
        .then_some(&detector as &dyn TextRegionDetector);
    let pages = arrange_images(&entries, &layout, sharpen).unwrap_or_else(|e| {
        eprintln!("Error arranging cards: {e}");
        process::exit(1);
    });
    if let Err(e) = write_pdf(&pages, cli.dpi, &pdf_path) {
        eprintln!("Error writing PDF: {e}");
        process::exit(1);
    }

    println!("cards={}", session.cards().len());
    println!("images={}", entries.len());
    println!("pages={}", pages.len());
    println!("pdf={}", pdf_path.display());
    println!("manifest={}", manifest_path.display());

    if !cli.no_open {
        open_in_viewer(&pdf_path);
    }
}

fn init_tracing(quiet: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if quiet { "warn" } else { "info" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_level(false)
        .with_writer(std::io::stderr)
        .init();
}

/// An explicit `--cache-dir` is remembered for later runs; otherwise the
/// remembered directory is used, then `cache`.
fn resolve_cache_dir(explicit: Option<&Path>) -> PathBuf {
    if let Some(dir) = explicit {
        if let Err(e) = fs::write(CACHE_PATH_FILE, dir.to_string_lossy().as_bytes()) {
            warn!("Could not remember cache directory in {CACHE_PATH_FILE}: {e}");
        }
        return dir.to_path_buf();
    }
    match fs::read_to_string(CACHE_PATH_FILE) {
        Ok(saved) if !saved.trim().is_empty() => PathBuf::from(saved.trim()),
        _ => PathBuf::from(DEFAULT_CACHE_DIR),
    }
}

fn open_in_viewer(path: &Path) {
    #[cfg(target_os = "windows")]
    let status = process::Command::new("cmd")
        .args(["/C", "start", ""])
        .arg(path)
        .status();
    #[cfg(target_os = "macos")]
    let status = process::Command::new("open").arg(path).status();
    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    let status = process::Command::new("xdg-open").arg(path).status();

    match status {
        Ok(status) if status.success() => {}
        Ok(status) => warn!("Viewer exited with {status} for {}", path.display()),
        Err(e) => warn!("Could not open {}: {e}", path.display()),
    }
}

fn to_core_quantity_source(arg: QuantitySourceArg) -> QuantitySource {
    match arg {
        QuantitySourceArg::Arkhamdb => QuantitySource::ArkhamDb,
        QuantitySourceArg::TtsSavedObject => QuantitySource::TtsSavedObject,
    }
}

fn to_card_size(arg: CardSizeArg) -> CardSize {
    match arg {
        CardSizeArg::Standard => CardSize::Standard,
        CardSizeArg::Mini => CardSize::Mini,
    }
}

fn to_sheet_size(arg: SheetSizeArg) -> SheetSize {
    match arg {
        SheetSizeArg::A4 => SheetSize::A4,
        SheetSizeArg::Letter => SheetSize::Letter,
        SheetSizeArg::Legal => SheetSize::Legal,
    }
}
