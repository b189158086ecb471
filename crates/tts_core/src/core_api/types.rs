use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

use image::DynamicImage;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::save_tree::card_index;

use super::error::{CoreError, CoreErrorCode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuantitySource {
    /// Copies per card come from the ArkhamDB card database.
    ArkhamDb,
    /// Copies per card are the number of times the card occurs in the save.
    TtsSavedObject,
}

/// One unique card found in a save, keyed by ArkhamDB id or nickname.
#[derive(Debug, Clone, PartialEq)]
pub struct CardRecord {
    pub key: String,
    pub card_id: u64,
    pub nickname: String,
    pub custom_deck: Map<String, Value>,
    pub notes: Option<String>,
    pub external_id: Option<String>,
    pub quantity: u32,
}

impl CardRecord {
    pub fn card_index(&self) -> u32 {
        card_index(self.card_id)
    }

    pub fn deck(&self) -> Result<DeckRef, CoreError> {
        DeckRef::from_custom_deck(&self.custom_deck, self.card_id).map_err(|e| {
            CoreError::new(e.code, format!("card '{}': {}", self.nickname, e.message))
        })
    }
}

/// Typed view of a `CustomDeck` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckRef {
    pub face_url: String,
    pub back_url: String,
    pub num_width: u32,
    pub num_height: u32,
    pub unique_back: bool,
}

impl DeckRef {
    /// Picks the entry named after the card's deck id (`CardID / 100`),
    /// falling back to the first entry.
    pub fn from_custom_deck(
        custom_deck: &Map<String, Value>,
        card_id: u64,
    ) -> Result<Self, CoreError> {
        let deck_key = (card_id / 100).to_string();
        let entry = custom_deck
            .get(&deck_key)
            .or_else(|| custom_deck.values().next())
            .ok_or_else(|| CoreError::new(CoreErrorCode::Parse, "CustomDeck has no entries"))?;
        let Value::Object(deck) = entry else {
            return Err(CoreError::new(
                CoreErrorCode::Parse,
                "CustomDeck entry is not an object",
            ));
        };

        Ok(Self {
            face_url: required_string(deck, "FaceURL")?,
            back_url: required_string(deck, "BackURL")?,
            num_width: required_grid_dimension(deck, "NumWidth")?,
            num_height: required_grid_dimension(deck, "NumHeight")?,
            unique_back: deck
                .get("UniqueBack")
                .and_then(Value::as_bool)
                .unwrap_or(false),
        })
    }
}

fn required_string(deck: &Map<String, Value>, field: &str) -> Result<String, CoreError> {
    match deck.get(field) {
        Some(Value::String(value)) => Ok(value.clone()),
        _ => Err(CoreError::new(
            CoreErrorCode::Parse,
            format!("CustomDeck entry is missing {field}"),
        )),
    }
}

fn required_grid_dimension(deck: &Map<String, Value>, field: &str) -> Result<u32, CoreError> {
    let value = match deck.get(field) {
        Some(Value::Number(number)) => number.as_u64(),
        Some(Value::String(text)) => text.trim().parse().ok(),
        _ => None,
    };
    match value {
        Some(value) if value > 0 && value <= u64::from(u32::MAX) => Ok(value as u32),
        _ => Err(CoreError::new(
            CoreErrorCode::Parse,
            format!("CustomDeck entry has no usable {field}"),
        )),
    }
}

/// Reads the ArkhamDB id out of a card's `GMNotes` JSON blob.
///
/// Notes that parse but carry no `id` yield `Ok(None)`; notes that are not
/// JSON at all are an error the caller downgrades to a warning.
pub fn external_id_from_notes(notes: &str) -> Result<Option<String>, serde_json::Error> {
    let parsed: Value = serde_json::from_str(notes)?;
    Ok(match parsed.get("id") {
        Some(Value::String(id)) if !id.is_empty() => Some(id.clone()),
        Some(Value::Number(id)) => Some(id.to_string()),
        _ => None,
    })
}

/// Identity of one placed image: `{id}_{copy_index}` or `{id}_{copy_index}_back`.
///
/// Keys order by their rendered string, byte-wise, so `A_10` sorts before
/// `A_2` and a face sorts directly before its back. The rendering is
/// injective (the suffix is always `_<digits>` or `_<digits>_back`), so this
/// order agrees with the derived equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntryKey {
    pub id: String,
    pub copy_index: u32,
    pub is_back: bool,
}

impl EntryKey {
    pub fn face(id: impl Into<String>, copy_index: u32) -> Self {
        Self {
            id: id.into(),
            copy_index,
            is_back: false,
        }
    }

    pub fn back(id: impl Into<String>, copy_index: u32) -> Self {
        Self {
            id: id.into(),
            copy_index,
            is_back: true,
        }
    }
}

impl fmt::Display for EntryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.id, self.copy_index)?;
        if self.is_back {
            f.write_str("_back")?;
        }
        Ok(())
    }
}

impl EntryKey {
    /// Rendered `_{copy_index}[_back]` tail, written into `buf`.
    fn suffix<'a>(&self, buf: &'a mut [u8; 16]) -> &'a [u8] {
        let mut digits = [0u8; 10];
        let mut start = digits.len();
        let mut n = self.copy_index;
        loop {
            start -= 1;
            digits[start] = b'0' + (n % 10) as u8;
            n /= 10;
            if n == 0 {
                break;
            }
        }
        let digits = &digits[start..];
        buf[0] = b'_';
        buf[1..=digits.len()].copy_from_slice(digits);
        let mut len = 1 + digits.len();
        if self.is_back {
            buf[len..len + 5].copy_from_slice(b"_back");
            len += 5;
        }
        &buf[..len]
    }
}

/// Byte-wise order of the rendered keys, without rendering them.
impl Ord for EntryKey {
    fn cmp(&self, other: &Self) -> Ordering {
        let (mut mine_buf, mut theirs_buf) = ([0u8; 16], [0u8; 16]);
        let mine = self.id.bytes().chain(self.suffix(&mut mine_buf).iter().copied());
        let theirs = other
            .id
            .bytes()
            .chain(other.suffix(&mut theirs_buf).iter().copied());
        mine.cmp(theirs)
    }
}

impl PartialOrd for EntryKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A single oriented card bitmap ready for packing. Copies of the same card
/// share one decoded image.
#[derive(Debug, Clone)]
pub struct ImageEntry {
    pub key: EntryKey,
    pub image: Rc<DynamicImage>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpandOptions {
    pub quantity_source: QuantitySource,
    pub back: bool,
    pub exclude_player_backs: bool,
    pub exclude_encounter_backs: bool,
}

impl Default for ExpandOptions {
    fn default() -> Self {
        Self {
            quantity_source: QuantitySource::ArkhamDb,
            back: false,
            exclude_player_backs: false,
            exclude_encounter_backs: false,
        }
    }
}
