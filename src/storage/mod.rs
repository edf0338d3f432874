//! CSV storage: input unit lists and append-only output datasets.

pub mod dataset;
pub mod input;

pub use dataset::{DatasetWriter, RecordSink};
pub use input::load_player_units;
