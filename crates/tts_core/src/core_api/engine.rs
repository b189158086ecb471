use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde_json::Value;
use tracing::{debug, warn};

use crate::deck_sheet::ImageResolver;
use crate::save_tree::{CardShape, visit_cards};

use super::card_catalog::CardCatalog;
use super::error::{CoreError, CoreErrorCode};
use super::expand::expand_records;
use super::types::{CardRecord, ExpandOptions, ImageEntry, external_id_from_notes};

#[derive(Debug, Default, Clone, Copy)]
pub struct Engine;

/// Unique cards in first-seen order, deduplicated by ArkhamDB id or nickname.
#[derive(Debug, Default, Clone)]
pub struct CardCollection {
    records: Vec<CardRecord>,
    index: HashMap<String, usize>,
}

#[derive(Debug)]
pub struct Session {
    cards: CardCollection,
}

impl Engine {
    pub fn new() -> Self {
        Self
    }

    pub fn open_path(&self, path: &Path) -> Result<Session, CoreError> {
        let bytes = fs::read(path).map_err(|e| {
            CoreError::new(
                CoreErrorCode::Io,
                format!("failed to read {}: {e}", path.display()),
            )
        })?;
        self.open_bytes(bytes)
    }

    pub fn open_bytes<B: AsRef<[u8]>>(&self, bytes: B) -> Result<Session, CoreError> {
        let tree: Value = serde_json::from_slice(bytes.as_ref()).map_err(|e| {
            CoreError::new(
                CoreErrorCode::Parse,
                format!("save file is not valid JSON: {e}"),
            )
        })?;
        Ok(self.open_value(&tree))
    }

    pub fn open_value(&self, tree: &Value) -> Session {
        let mut cards = CardCollection::new();
        visit_cards(tree, &mut |card| cards.insert(card));
        debug!(
            unique = cards.len(),
            occurrences = cards.total_occurrences(),
            "collected cards"
        );
        Session { cards }
    }
}

impl CardCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one occurrence of `card`. The first occurrence of a key creates
    /// the record; later ones only bump its quantity.
    pub fn insert(&mut self, card: CardShape<'_>) {
        let external_id = match card.notes {
            Some(notes) => match external_id_from_notes(notes) {
                Ok(id) => id,
                Err(e) => {
                    warn!("JSON decode error in GMNotes of '{}': {e}", card.nickname);
                    None
                }
            },
            None => None,
        };
        let key = external_id
            .clone()
            .unwrap_or_else(|| card.nickname.to_string());

        if let Some(&position) = self.index.get(&key) {
            self.records[position].quantity += 1;
            return;
        }

        self.index.insert(key.clone(), self.records.len());
        self.records.push(CardRecord {
            key,
            card_id: card.card_id,
            nickname: card.nickname.to_string(),
            custom_deck: card.custom_deck.clone(),
            notes: card.notes.map(ToOwned::to_owned),
            external_id,
            quantity: 1,
        });
    }

    pub fn get(&self, key: &str) -> Option<&CardRecord> {
        self.index.get(key).map(|&position| &self.records[position])
    }

    pub fn records(&self) -> &[CardRecord] {
        &self.records
    }

    pub fn total_occurrences(&self) -> u64 {
        self.records
            .iter()
            .map(|record| u64::from(record.quantity))
            .sum()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Session {
    pub fn cards(&self) -> &CardCollection {
        &self.cards
    }

    /// Resolves every record's images and replicates them per copy.
    ///
    /// `catalog` is only consulted for [`super::QuantitySource::ArkhamDb`];
    /// without one every card prints once.
    pub fn expand<R>(
        &self,
        resolver: &mut R,
        catalog: Option<&CardCatalog>,
        options: &ExpandOptions,
    ) -> Result<Vec<ImageEntry>, CoreError>
    where
        R: ImageResolver + ?Sized,
    {
        expand_records(self.cards.records(), resolver, catalog, options)
    }
}
