use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::{CoreError, CoreErrorCode};

/// One row of ArkhamDB's `cards.json` export. Only the fields the expander
/// reads are kept; everything else in the export is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardInfo {
    pub code: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub quantity: Option<u32>,
    #[serde(default)]
    pub pack_code: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardCatalog {
    entries: BTreeMap<String, CardInfo>,
}

impl CardCatalog {
    pub fn load_from_path(path: &Path) -> Result<Self, CoreError> {
        let bytes = fs::read(path).map_err(|e| {
            CoreError::new(
                CoreErrorCode::Io,
                format!("failed to read {}: {e}", path.display()),
            )
        })?;
        Self::from_json_bytes(&bytes).map_err(|e| {
            CoreError::new(e.code, format!("{}: {}", path.display(), e.message))
        })
    }

    pub fn from_json_bytes(bytes: &[u8]) -> Result<Self, CoreError> {
        let cards: Vec<CardInfo> = serde_json::from_slice(bytes).map_err(|e| {
            CoreError::new(
                CoreErrorCode::Parse,
                format!("card database is not a JSON array of cards: {e}"),
            )
        })?;
        Ok(Self::from_entries(cards))
    }

    /// Builds a catalog; when a code repeats, the first row wins.
    pub fn from_entries<I>(cards: I) -> Self
    where
        I: IntoIterator<Item = CardInfo>,
    {
        let mut entries = BTreeMap::new();
        for card in cards {
            entries.entry(card.code.clone()).or_insert(card);
        }
        Self { entries }
    }

    pub fn get(&self, code: &str) -> Option<&CardInfo> {
        self.entries.get(code)
    }

    /// Copies in a product for `code`; 1 when the code is unknown or the row
    /// has no quantity.
    pub fn quantity_for(&self, code: &str) -> u32 {
        self.get(code).and_then(|card| card.quantity).unwrap_or(1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::CardCatalog;
    use crate::core_api::CoreErrorCode;

    #[test]
    fn parses_export_and_ignores_extra_fields() {
        let raw = br#"[
            {"code": "01001", "name": "Roland Banks", "quantity": 1, "pack_code": "core", "faction_code": "guardian"},
            {"code": "01088", "name": "Emergency Cache", "quantity": 2, "pack_code": "core"},
            {"code": "02005", "name": "Zoey Samaras"}
        ]"#;
        let catalog = CardCatalog::from_json_bytes(raw).expect("catalog should parse");

        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.quantity_for("01088"), 2);
        assert_eq!(catalog.quantity_for("02005"), 1);
        assert_eq!(catalog.quantity_for("99999"), 1);
        assert_eq!(
            catalog.get("01001").and_then(|c| c.pack_code.as_deref()),
            Some("core")
        );
    }

    #[test]
    fn first_duplicate_code_wins() {
        let raw = br#"[{"code": "01", "quantity": 3}, {"code": "01", "quantity": 9}]"#;
        let catalog = CardCatalog::from_json_bytes(raw).expect("catalog should parse");
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.quantity_for("01"), 3);
    }

    #[test]
    fn rejects_non_array_input() {
        let err = CardCatalog::from_json_bytes(br#"{"code": "01"}"#)
            .expect_err("object should be rejected");
        assert_eq!(err.code, CoreErrorCode::Parse);
    }
}
