//! Card-on-background composition for synthetic detection datasets.
//!
//! [`geom::BoundingBox`] carries the label geometry, [`placer::CardPlacer`]
//! rotates and positions one card, and [`sample::SampleBuilder`] assembles
//! a whole labeled image.

pub mod error;
pub mod geom;
pub mod placer;
pub mod record;
pub mod sample;

pub use error::ComposeError;
pub use geom::{BoundingBox, Vertex};
pub use placer::{CardPlacer, Placement};
pub use record::{CardLabel, LabelRecord};
pub use sample::{Sample, SampleBuilder};
