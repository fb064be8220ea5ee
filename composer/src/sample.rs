use std::{
    collections::BTreeMap,
    time::{SystemTime, UNIX_EPOCH},
};

use image::RgbaImage;
use rand::{
    Rng,
    seq::{IndexedRandom, SliceRandom},
};

use crate::{
    error::ComposeError,
    placer::CardPlacer,
    record::{CardLabel, LabelRecord},
};

pub const MAX_CARDS_PER_SAMPLE: usize = 9;

pub struct Sample {
    pub image: RgbaImage,
    pub record: LabelRecord,
}

pub struct SampleBuilder<'a> {
    cards: &'a BTreeMap<String, RgbaImage>,
    backgrounds: &'a [RgbaImage],
    draw_boxes: bool,
}

impl<'a> SampleBuilder<'a> {
    pub fn new(cards: &'a BTreeMap<String, RgbaImage>, backgrounds: &'a [RgbaImage]) -> Self {
        Self {
            cards,
            backgrounds,
            draw_boxes: false,
        }
    }

    pub fn draw_boxes(mut self, draw_boxes: bool) -> Self {
        self.draw_boxes = draw_boxes;
        self
    }

    /// Between 1 and `min(9, k)` distinct cards: a shuffled index list cut
    /// to a random length. The returned order is the paste order.
    pub fn select_cards<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
    ) -> Result<Vec<(&'a str, &'a RgbaImage)>, ComposeError> {
        let pool: Vec<_> = self.cards.iter().collect();
        if pool.is_empty() {
            return Err(ComposeError::NoCards);
        }

        let mut idxs: Vec<usize> = (0..pool.len()).collect();
        idxs.shuffle(rng);
        let take = rng.random_range(1..=pool.len().min(MAX_CARDS_PER_SAMPLE));
        idxs.truncate(take);

        Ok(idxs
            .into_iter()
            .map(|i| (pool[i].0.as_str(), pool[i].1))
            .collect())
    }

    pub fn build<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Sample, ComposeError> {
        let selected = self.select_cards(rng)?;
        let background = self
            .backgrounds
            .choose(rng)
            .ok_or(ComposeError::NoBackground)?;

        let mut canvas = background.clone();
        let placer = CardPlacer::new(&canvas);
        let mut input_images = Vec::with_capacity(selected.len());

        for (id, card) in &selected {
            let placement = placer.place(id, card, rng)?;
            placement.paste_onto(&mut canvas);
            if self.draw_boxes {
                placement.bbox.draw(&mut canvas);
            }
            input_images.push(CardLabel {
                label: id.to_string(),
                bbox: placement.bbox.vertices(),
            });
        }

        let ids: Vec<&str> = selected.iter().map(|(id, _)| *id).collect();
        Ok(Sample {
            image: canvas,
            record: LabelRecord {
                filename: sample_filename(&ids, rng),
                input_images,
            },
        })
    }
}

/// `<id>-<id>-...-<unix seconds.micros>-<4 digits>.png`
pub fn sample_filename<R: Rng + ?Sized>(ids: &[&str], rng: &mut R) -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    format!(
        "{}-{}.{:06}-{:04}.png",
        ids.join("-"),
        now.as_secs(),
        now.subsec_micros(),
        rng.random_range(1..10_000u32)
    )
}
