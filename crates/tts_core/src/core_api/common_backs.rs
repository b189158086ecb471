//! Card backs shared by whole product lines.
//!
//! Player and encounter cards in the Arkham Horror LCG mod all point their
//! `BackURL` at one of two images. Printing a copy of the same back for every
//! card wastes paper, so the expander can drop them.

use super::types::DeckRef;

pub const COMMON_ENCOUNTER_BACK_URL: &str = "https://i.imgur.com/sRsWiSG.jpg/";
pub const COMMON_PLAYER_BACK_URL: &str = "https://i.imgur.com/EcbhVuh.jpg/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommonBack {
    Player,
    Encounter,
}

impl CommonBack {
    pub const ALL: [CommonBack; 2] = [CommonBack::Encounter, CommonBack::Player];

    pub fn url(&self) -> &'static str {
        match *self {
            Self::Player => COMMON_PLAYER_BACK_URL,
            Self::Encounter => COMMON_ENCOUNTER_BACK_URL,
        }
    }

    /// Exact match against the URL with or without its trailing slash.
    pub fn matches(&self, url: &str) -> bool {
        let canonical = self.url();
        url == canonical || url == canonical.trim_end_matches('/')
    }

    /// Whether either side of the deck is this common back.
    pub fn used_by(&self, deck: &DeckRef) -> bool {
        self.matches(&deck.back_url) || self.matches(&deck.face_url)
    }
}

#[cfg(test)]
mod tests {
    use super::CommonBack;
    use crate::core_api::DeckRef;

    #[test]
    fn matches_with_and_without_trailing_slash() {
        assert!(CommonBack::Player.matches("https://i.imgur.com/EcbhVuh.jpg/"));
        assert!(CommonBack::Player.matches("https://i.imgur.com/EcbhVuh.jpg"));
        assert!(!CommonBack::Player.matches("https://i.imgur.com/EcbhVuh.jpg//"));
        assert!(!CommonBack::Player.matches("https://i.imgur.com/sRsWiSG.jpg"));
        assert!(CommonBack::Encounter.matches("https://i.imgur.com/sRsWiSG.jpg"));
    }

    #[test]
    fn face_side_counts_as_well() {
        let deck = DeckRef {
            face_url: "https://i.imgur.com/sRsWiSG.jpg".to_string(),
            back_url: "https://example.com/unique.png".to_string(),
            num_width: 1,
            num_height: 1,
            unique_back: true,
        };
        assert!(CommonBack::Encounter.used_by(&deck));
        assert!(!CommonBack::Player.used_by(&deck));
    }
}
