use serde_json::{Value, json};
use tts_core::core_api::{CoreErrorCode, Engine};

fn deck(face: &str, back: &str, width: u32, height: u32) -> Value {
    json!({
        "1": {
            "FaceURL": face,
            "BackURL": back,
            "NumWidth": width,
            "NumHeight": height,
            "UniqueBack": false
        }
    })
}

fn card(nickname: &str, card_id: u64, notes: Option<&str>) -> Value {
    let mut card = json!({
        "Name": "Card",
        "Nickname": nickname,
        "CardID": card_id,
        "CustomDeck": deck("https://example.com/face.jpg", "https://example.com/back.jpg", 10, 7),
    });
    if let Some(notes) = notes {
        card["GMNotes"] = Value::String(notes.to_string());
    }
    card
}

#[test]
fn counts_every_occurrence_of_a_key() {
    let save = json!({
        "SaveName": "Investigator deck",
        "ObjectStates": [{
            "Name": "DeckCustom",
            "Nickname": "",
            "ContainedObjects": [
                card("Machete", 101, None),
                card("Machete", 101, None),
                card("Flashlight", 102, None),
                { "Name": "Bag", "ContainedObjects": [card("Machete", 101, None)] }
            ]
        }]
    });

    let session = Engine::new().open_value(&save);
    let cards = session.cards();

    assert_eq!(cards.len(), 2);
    assert_eq!(cards.get("Machete").map(|c| c.quantity), Some(3));
    assert_eq!(cards.get("Flashlight").map(|c| c.quantity), Some(1));
    assert_eq!(cards.total_occurrences(), 4);
}

#[test]
fn gm_notes_id_takes_precedence_over_nickname() {
    let save = json!([
        card("Roland Banks", 12300, Some(r#"{"id": "01001", "type": "Investigator"}"#)),
        card("Roland Banks (Parallel)", 12301, Some(r#"{"id": "01001"}"#)),
        card("Roland Banks", 12302, Some(r#"{"id": "90024"}"#)),
    ]);

    let session = Engine::new().open_value(&save);
    let keys: Vec<&str> = session
        .cards()
        .records()
        .iter()
        .map(|c| c.key.as_str())
        .collect();

    assert_eq!(keys, vec!["01001", "90024"]);
    let roland = session.cards().get("01001").expect("01001 should be present");
    assert_eq!(roland.quantity, 2);
    assert_eq!(roland.external_id.as_deref(), Some("01001"));
    // The first occurrence defines the record; later ones only count.
    assert_eq!(roland.nickname, "Roland Banks");
    assert_eq!(roland.card_id, 12300);
}

#[test]
fn malformed_notes_fall_back_to_nickname() {
    let save = json!([
        card("Knife", 200, Some("not json {")),
        card("Knife", 200, Some("")),
        card("Knife", 200, Some(r#"{"traits": "Item. Weapon."}"#)),
    ]);

    let session = Engine::new().open_value(&save);
    let knife = session.cards().get("Knife").expect("Knife should be keyed by nickname");

    assert_eq!(session.cards().len(), 1);
    assert_eq!(knife.quantity, 3);
    assert_eq!(knife.external_id, None);
    assert_eq!(knife.notes.as_deref(), Some("not json {"));
}

#[test]
fn keys_do_not_depend_on_traversal_order() {
    let cards = vec![card("A", 100, None), card("B", 101, None), card("A", 100, None)];
    let forward = Value::Array(cards.clone());
    let reverse = Value::Array(cards.into_iter().rev().collect());

    let mut a: Vec<(String, u32)> = Engine::new()
        .open_value(&forward)
        .cards()
        .records()
        .iter()
        .map(|c| (c.key.clone(), c.quantity))
        .collect();
    let mut b: Vec<(String, u32)> = Engine::new()
        .open_value(&reverse)
        .cards()
        .records()
        .iter()
        .map(|c| (c.key.clone(), c.quantity))
        .collect();
    a.sort();
    b.sort();

    assert_eq!(a, b);
    assert_eq!(a, vec![("A".to_string(), 2), ("B".to_string(), 1)]);
}

#[test]
fn records_keep_first_seen_order() {
    let save = json!({
        "ObjectStates": [
            card("Zeta", 100, None),
            card("Alpha", 101, None),
            card("Mid", 102, None),
            card("Alpha", 101, None)
        ]
    });
    let session = Engine::new().open_value(&save);
    let order: Vec<&str> = session
        .cards()
        .records()
        .iter()
        .map(|c| c.nickname.as_str())
        .collect();
    assert_eq!(order, vec!["Zeta", "Alpha", "Mid"]);
}

#[test]
fn deck_ref_reads_grid_and_unique_back() {
    let mut wendy = card("Wendy Adams", 101, None);
    wendy["CustomDeck"] = json!({
        "1": {
            "FaceURL": "https://example.com/sheet.png",
            "BackURL": "https://example.com/backs.png",
            "NumWidth": "10",
            "NumHeight": 7,
            "UniqueBack": true
        }
    });

    let session = Engine::new().open_value(&wendy);
    let record = session.cards().get("Wendy Adams").expect("card should be found");
    let deck = record.deck().expect("deck should parse");

    assert_eq!(record.card_index(), 1);
    assert_eq!(deck.face_url, "https://example.com/sheet.png");
    assert_eq!(deck.back_url, "https://example.com/backs.png");
    assert_eq!((deck.num_width, deck.num_height), (10, 7));
    assert!(deck.unique_back);
}

#[test]
fn deck_ref_prefers_entry_matching_card_id() {
    let mut dog = card("Guard Dog", 4507, None);
    dog["CustomDeck"] = json!({
        "12": { "FaceURL": "wrong", "BackURL": "wrong", "NumWidth": 1, "NumHeight": 1 },
        "45": { "FaceURL": "right", "BackURL": "back", "NumWidth": 10, "NumHeight": 3 }
    });
    let session = Engine::new().open_value(&dog);
    let deck = session.cards().records()[0]
        .deck()
        .expect("deck should parse");
    assert_eq!(deck.face_url, "right");
    assert!(!deck.unique_back);
}

#[test]
fn deck_ref_rejects_zero_grid() {
    let mut broken = card("Broken", 100, None);
    broken["CustomDeck"]["1"]["NumWidth"] = json!(0);
    let session = Engine::new().open_value(&broken);
    let err = session.cards().records()[0]
        .deck()
        .expect_err("zero width should be rejected");
    assert_eq!(err.code, CoreErrorCode::Parse);
    assert!(err.message.contains("NumWidth"));
}

#[test]
fn open_bytes_rejects_invalid_json() {
    let err = Engine::new()
        .open_bytes(b"{ not json")
        .expect_err("invalid json should fail");
    assert_eq!(err.code, CoreErrorCode::Parse);
}

#[test]
fn open_bytes_parses_save_files() {
    let save = json!({ "ObjectStates": [card("Wendy", 101, None)] });
    let bytes = serde_json::to_vec(&save).expect("fixture should serialize");
    let session = Engine::new().open_bytes(bytes).expect("save should parse");
    assert_eq!(session.cards().len(), 1);
}
