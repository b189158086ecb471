mod card_catalog;
pub mod common_backs;
mod engine;
mod error;
mod expand;
mod types;

pub use card_catalog::{CardCatalog, CardInfo};
pub use common_backs::CommonBack;
pub use engine::{CardCollection, Engine, Session};
pub use error::{CoreError, CoreErrorCode};
pub use expand::{copies_for, entry_id, expand_records};
pub use types::{
    CardRecord, DeckRef, EntryKey, ExpandOptions, ImageEntry, QuantitySource,
    external_id_from_notes,
};
