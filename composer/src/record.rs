use serde::{Deserialize, Serialize};

use crate::geom::Vertex;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CardLabel {
    pub label: String,
    pub bbox: [Vertex; 4],
}

/// Labels of one generated image, cards in paste order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LabelRecord {
    pub filename: String,
    pub input_images: Vec<CardLabel>,
}
