//! Work units and output records.

use serde::{Deserialize, Serialize};

use crate::collector::Unit;

/// A player to resolve into a bio row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerUnit {
    pub player_name: String,
    pub player_url: String,
}

impl Unit for PlayerUnit {
    fn key(&self) -> String {
        self.player_url.clone()
    }

    fn url(&self) -> &str {
        &self.player_url
    }

    fn label(&self) -> String {
        self.player_name.clone()
    }
}

/// One all-star season page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeasonUnit {
    pub year: u16,
    pub url: String,
}

impl Unit for SeasonUnit {
    fn key(&self) -> String {
        self.year.to_string()
    }

    fn url(&self) -> &str {
        &self.url
    }

    fn label(&self) -> String {
        self.year.to_string()
    }
}

/// Row of the players index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexRecord {
    pub player_name: String,
    pub player_url: String,
}

/// Row of the player bios dataset, keyed by `player_url`.
///
/// A row with `error` set records a failed attempt. Its derived fields are
/// empty, and it still marks the player as done for later runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BioRecord {
    pub player_name: String,
    pub player_url: String,
    pub born_line: Option<String>,
    pub country: Option<String>,
    pub debut_year: Option<i32>,
    pub error: Option<String>,
}

impl BioRecord {
    pub fn failed(unit: &PlayerUnit, error: String) -> Self {
        Self {
            player_name: unit.player_name.clone(),
            player_url: unit.player_url.clone(),
            born_line: None,
            country: None,
            debut_year: None,
            error: Some(error),
        }
    }
}

/// Row of the all-star rosters dataset, keyed by `(season_year, player_name)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RosterRecord {
    pub season_year: u16,
    pub player_name: String,
    pub source: String,
}
