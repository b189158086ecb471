use std::rc::Rc;

use image::DynamicImage;
use tracing::{debug, info};

use crate::deck_sheet::ImageResolver;

use super::card_catalog::CardCatalog;
use super::common_backs::CommonBack;
use super::error::CoreError;
use super::types::{
    CardRecord, DeckRef, EntryKey, ExpandOptions, ImageEntry, QuantitySource,
};

/// Turns unique records into placeable images, in record order.
///
/// Faces are always cropped from their deck sheet. Backs are cropped only for
/// decks with `UniqueBack`; otherwise the whole back image is the card back.
pub fn expand_records<R>(
    records: &[CardRecord],
    resolver: &mut R,
    catalog: Option<&CardCatalog>,
    options: &ExpandOptions,
) -> Result<Vec<ImageEntry>, CoreError>
where
    R: ImageResolver + ?Sized,
{
    let mut entries = Vec::new();

    for record in records {
        let deck = record.deck()?;
        let index = record.card_index();

        let face = resolver.resolve(&deck.face_url, index, deck.num_width, deck.num_height, true)?;
        let face = Rc::new(DynamicImage::ImageRgba8(face.to_rgba8()));

        let back = if options.back && !suppresses_back(options, &deck) {
            let back = resolver.resolve(
                &deck.back_url,
                index,
                deck.num_width,
                deck.num_height,
                deck.unique_back,
            )?;
            Some(Rc::new(DynamicImage::ImageRgba8(back.to_rgba8())))
        } else {
            if options.back {
                debug!("Skipped common back for {}", record.nickname);
            }
            None
        };

        let (copies, pack_code) = copies_for(record, catalog, options.quantity_source);
        let id = entry_id(record, options.quantity_source);
        for copy_index in 0..copies {
            entries.push(ImageEntry {
                key: EntryKey::face(id, copy_index),
                image: Rc::clone(&face),
            });
            match pack_code {
                Some(pack) => info!("Added face card from the {pack} pack for {}", record.nickname),
                None => info!("Added face card for {}", record.nickname),
            }

            if let Some(back) = &back {
                entries.push(ImageEntry {
                    key: EntryKey::back(id, copy_index),
                    image: Rc::clone(back),
                });
                match pack_code {
                    Some(pack) => {
                        info!("Added back card from the {pack} pack for {}", record.nickname)
                    }
                    None => info!("Added back card for {}", record.nickname),
                }
            }
        }
    }

    Ok(entries)
}

/// Copies to print and, for database lookups, the pack the card ships in.
pub fn copies_for<'a>(
    record: &CardRecord,
    catalog: Option<&'a CardCatalog>,
    source: QuantitySource,
) -> (u32, Option<&'a str>) {
    match source {
        QuantitySource::ArkhamDb => {
            let info = record
                .external_id
                .as_deref()
                .zip(catalog)
                .and_then(|(id, catalog)| catalog.get(id));
            (
                info.and_then(|card| card.quantity).unwrap_or(1),
                info.and_then(|card| card.pack_code.as_deref()),
            )
        }
        QuantitySource::TtsSavedObject => (record.quantity, None),
    }
}

/// Id used in entry keys: the dedup key for database lookups, the card's
/// nickname when copies come from the save itself.
pub fn entry_id(record: &CardRecord, source: QuantitySource) -> &str {
    match source {
        QuantitySource::ArkhamDb => &record.key,
        QuantitySource::TtsSavedObject => &record.nickname,
    }
}

fn suppresses_back(options: &ExpandOptions, deck: &DeckRef) -> bool {
    CommonBack::ALL.iter().any(|common| {
        let excluded = match common {
            CommonBack::Player => options.exclude_player_backs,
            CommonBack::Encounter => options.exclude_encounter_backs,
        };
        excluded && common.used_by(deck)
    })
}
