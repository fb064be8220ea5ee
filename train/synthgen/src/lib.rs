pub mod assets;
pub mod config;
pub mod error;
pub mod generator;
pub mod io;

pub use assets::ImageSet;
pub use config::{FailurePolicy, GenCfg};
pub use error::{GenError, Stage};
pub use generator::{BatchGenerator, BatchReport};
pub use io::{LabelAggregate, LabelStore};
