//! Work-unit lists read from CSV.

use std::path::Path;

use super::dataset::column_index;
use crate::error::HarvestError;
use crate::types::PlayerUnit;

/// Players to process, from a file with `player_name` and `player_url` columns.
pub fn load_player_units(path: &Path) -> Result<Vec<PlayerUnit>, HarvestError> {
    if !path.exists() {
        return Err(HarvestError::MissingInput(path.to_path_buf()));
    }

    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();
    let column = |name: &str| {
        column_index(&headers, name).ok_or_else(|| HarvestError::MissingColumn {
            path: path.to_path_buf(),
            column: name.to_string(),
        })
    };
    let name_idx = column("player_name")?;
    let url_idx = column("player_url")?;

    let mut units = Vec::new();
    for row in reader.records() {
        let row = row?;
        units.push(PlayerUnit {
            player_name: row.get(name_idx).unwrap_or("").trim().to_string(),
            player_url: row.get(url_idx).unwrap_or("").trim().to_string(),
        });
    }
    Ok(units)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_units() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("players_index.csv");
        std::fs::write(
            &path,
            "player_url,player_name\n\
             https://example.com/players/j/jamesle01.html, LeBron James \n\
             https://example.com/players/j/jokicni01.html,Nikola Jokić\n",
        )
        .unwrap();

        let units = load_player_units(&path).unwrap();
        assert_eq!(units.len(), 2);
        assert_eq!(units[0].player_name, "LeBron James");
        assert_eq!(units[1].player_url, "https://example.com/players/j/jokicni01.html");
    }

    #[test]
    fn test_missing_file() {
        let result = load_player_units(Path::new("/nonexistent/players_index.csv"));
        assert!(matches!(result, Err(HarvestError::MissingInput(_))));
    }

    #[test]
    fn test_missing_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("players_index.csv");
        std::fs::write(&path, "player_name\nLeBron James\n").unwrap();

        match load_player_units(&path) {
            Err(HarvestError::MissingColumn { column, .. }) => assert_eq!(column, "player_url"),
            other => panic!("expected missing column, got {:?}", other),
        }
    }
}
