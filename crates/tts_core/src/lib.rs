//! Card extraction for Tabletop Simulator saves.
//!
//! [`core_api::Engine`] walks a save file and collects unique card records;
//! [`deck_sheet::SheetCache`] resolves per-card bitmaps from deck sheets; the
//! session's `expand` step turns records into placeable [`core_api::ImageEntry`]
//! values for the renderer.

pub mod core_api;
pub mod deck_sheet;
pub mod save_tree;
