//! HTML extractors for the stats site and the encyclopedia.
//!
//! Pure functions: no I/O, no logging.

pub mod bio;
pub mod links;
pub mod player_index;
pub mod roster;
pub mod text;

pub use bio::BioParser;
pub use links::{extract_letter_links, extract_year_links};
pub use player_index::extract_player_index;
pub use roster::RosterParser;
