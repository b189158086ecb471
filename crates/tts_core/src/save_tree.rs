//! Walking a Tabletop Simulator save tree.
//!
//! Saves are arbitrarily nested JSON: bags inside decks inside states inside
//! the top-level `ObjectStates` array. Rather than modelling every container
//! the walk treats the file as a plain [`Value`] tree and pattern matches
//! objects that look like cards.

use serde_json::{Map, Value};

/// Borrowed view of an object that carries everything needed to print a card.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CardShape<'a> {
    pub nickname: &'a str,
    pub card_id: u64,
    pub custom_deck: &'a Map<String, Value>,
    pub notes: Option<&'a str>,
}

impl<'a> CardShape<'a> {
    /// Matches objects with a non-empty `Nickname`, a numeric `CardID` and a
    /// `CustomDeck` object.
    pub fn from_object(object: &'a Map<String, Value>) -> Option<Self> {
        let nickname = match object.get("Nickname") {
            Some(Value::String(nickname)) if !nickname.is_empty() => nickname.as_str(),
            _ => return None,
        };
        let card_id = object.get("CardID").and_then(parse_card_id)?;
        let Some(Value::Object(custom_deck)) = object.get("CustomDeck") else {
            return None;
        };

        Some(Self {
            nickname,
            card_id,
            custom_deck,
            notes: object.get("GMNotes").and_then(Value::as_str),
        })
    }

    pub fn card_index(&self) -> u32 {
        card_index(self.card_id)
    }
}

/// Position of a card on its deck sheet: the last two decimal digits of the
/// card id (`CardID = deck_id * 100 + index`).
pub fn card_index(card_id: u64) -> u32 {
    (card_id % 100) as u32
}

pub fn parse_card_id(value: &Value) -> Option<u64> {
    match value {
        Value::Number(number) => number.as_u64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

/// Calls `visit` for every card-shaped object, depth first, in document order.
///
/// Card objects are recursed into as well, since states and contained objects
/// hang off the card itself. There is no depth limit; save files are trees.
pub fn visit_cards<'a, F>(value: &'a Value, visit: &mut F)
where
    F: FnMut(CardShape<'a>),
{
    match value {
        Value::Object(object) => {
            if let Some(card) = CardShape::from_object(object) {
                visit(card);
            }
            for child in object.values() {
                visit_cards(child, visit);
            }
        }
        Value::Array(items) => {
            for item in items {
                visit_cards(item, visit);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{CardShape, card_index, parse_card_id, visit_cards};

    #[test]
    fn card_shape_requires_all_three_fields() {
        let card = json!({
            "Nickname": "Roland Banks",
            "CardID": 12300,
            "CustomDeck": { "123": { "FaceURL": "face", "BackURL": "back" } }
        });
        let object = card.as_object().expect("fixture should be an object");
        let shape = CardShape::from_object(object).expect("card should match");
        assert_eq!(shape.nickname, "Roland Banks");
        assert_eq!(shape.card_id, 12300);
        assert_eq!(shape.notes, None);

        for missing in ["Nickname", "CardID", "CustomDeck"] {
            let mut partial = object.clone();
            partial.remove(missing);
            assert!(
                CardShape::from_object(&partial).is_none(),
                "{missing} should be required"
            );
        }
    }

    #[test]
    fn empty_nickname_is_not_a_card() {
        let card = json!({ "Nickname": "", "CardID": 100, "CustomDeck": {} });
        assert!(CardShape::from_object(card.as_object().expect("object")).is_none());
    }

    #[test]
    fn card_ids_accept_digit_strings() {
        assert_eq!(parse_card_id(&json!(101)), Some(101));
        assert_eq!(parse_card_id(&json!("4512")), Some(4512));
        assert_eq!(parse_card_id(&json!("abc")), None);
        assert_eq!(parse_card_id(&json!(-3)), None);
    }

    #[test]
    fn card_index_uses_last_two_digits() {
        assert_eq!(card_index(101), 1);
        assert_eq!(card_index(5), 5);
        assert_eq!(card_index(266_869), 69);
    }

    #[test]
    fn visit_descends_into_cards_and_arrays() {
        let tree = json!({
            "ObjectStates": [{
                "Nickname": "Deck",
                "ContainedObjects": [
                    { "Nickname": "A", "CardID": 100, "CustomDeck": { "1": {} } },
                    {
                        "Nickname": "B", "CardID": 101, "CustomDeck": { "1": {} },
                        "States": { "2": { "Nickname": "C", "CardID": 102, "CustomDeck": { "1": {} } } }
                    }
                ]
            }]
        });

        let mut seen = Vec::new();
        visit_cards(&tree, &mut |card| seen.push(card.nickname));
        assert_eq!(seen, vec!["A", "B", "C"]);
    }
}
