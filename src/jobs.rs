//! Collector jobs for the bios and all-star stages.

use tracing::warn;

use crate::collector::Job;
use crate::scraper::parsers::{BioParser, RosterParser};
use crate::types::{BioRecord, PlayerUnit, RosterRecord, SeasonUnit};

/// One bio row per player profile page.
pub struct BioJob {
    parser: BioParser,
}

impl BioJob {
    pub fn new(parser: BioParser) -> Self {
        Self { parser }
    }
}

impl Job for BioJob {
    type Unit = PlayerUnit;
    type Record = BioRecord;

    const KEY_COLUMN: &'static str = "player_url";

    fn build(&self, unit: &PlayerUnit, html: &str) -> anyhow::Result<Vec<BioRecord>> {
        let fields = self.parser.parse(html);
        Ok(vec![BioRecord {
            player_name: unit.player_name.clone(),
            player_url: unit.player_url.clone(),
            born_line: fields.born_line,
            country: fields.country,
            debut_year: fields.debut_year,
            error: None,
        }])
    }

    fn failed(&self, unit: &PlayerUnit, error: &anyhow::Error) -> Vec<BioRecord> {
        vec![BioRecord::failed(unit, format!("{:#}", error))]
    }
}

/// Roster rows per all-star season page.
///
/// A failed season writes nothing, so it is retried on the next run. The
/// same holds for a page with no recognizable roster table.
pub struct RosterJob {
    parser: RosterParser,
}

impl RosterJob {
    pub fn new(parser: RosterParser) -> Self {
        Self { parser }
    }
}

impl Job for RosterJob {
    type Unit = SeasonUnit;
    type Record = RosterRecord;

    const KEY_COLUMN: &'static str = "season_year";

    fn build(&self, unit: &SeasonUnit, html: &str) -> anyhow::Result<Vec<RosterRecord>> {
        let rows = self.parser.extract_roster_rows(html, unit.year);
        if rows.is_empty() {
            warn!(
                "{}: no roster rows on {}; the season will be fetched again next run",
                unit.year, unit.url
            );
        }
        Ok(rows)
    }

    fn failed(&self, _unit: &SeasonUnit, _error: &anyhow::Error) -> Vec<RosterRecord> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::Collector;
    use crate::scraper::source::testing::ScriptedSource;
    use crate::scraper::Pacer;
    use crate::storage::DatasetWriter;

    const SEASON_HTML: &str = r#"<table class="wikitable">
<tr><th>Player</th><th>Team</th></tr>
<tr><td><a href="/wiki/Michael_Jordan">Michael Jordan</a></td><td>Chicago Bulls</td></tr>
<tr><td><a href="/wiki/Patrick_Ewing">Patrick Ewing</a></td><td>New York Knicks</td></tr>
</table>"#;

    fn season(year: u16) -> SeasonUnit {
        SeasonUnit {
            year,
            url: format!("https://en.wikipedia.org/wiki/{}_NBA_All-Star_Game", year),
        }
    }

    #[test]
    fn test_bio_job_builds_record() {
        let unit = PlayerUnit {
            player_name: "Nikola Jokić".to_string(),
            player_url: "https://example.com/players/j/jokicni01.html".to_string(),
        };
        let html = "<p><strong>Born:</strong> February 19, 1995 in Sombor, Serbia</p>";
        let records = BioJob::new(BioParser::default()).build(&unit, html).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].player_url, unit.player_url);
        assert_eq!(records[0].country.as_deref(), Some("Serbia"));
        assert_eq!(records[0].debut_year, None);
        assert!(records[0].error.is_none());
    }

    #[test]
    fn test_bio_job_failure_row() {
        let unit = PlayerUnit {
            player_name: "X".to_string(),
            player_url: "u".to_string(),
        };
        let err = anyhow::anyhow!("inner").context("outer");
        let records = BioJob::new(BioParser::default()).failed(&unit, &err);
        assert_eq!(records[0].error.as_deref(), Some("outer: inner"));
        assert!(records[0].country.is_none());
    }

    #[tokio::test]
    async fn test_roster_job_resumes_by_season() {
        let dir = tempfile::tempdir().unwrap();
        let units = vec![season(1990), season(1991), season(1992)];
        let mut sink = DatasetWriter::new(dir.path().join("all_stars.csv"));

        let source = ScriptedSource::new()
            .page(&units[0].url, SEASON_HTML)
            .timeout(&units[1].url)
            .page(&units[2].url, SEASON_HTML);
        let job = RosterJob::new(RosterParser::new("en.wikipedia"));
        let mut collector = Collector::new(source, Pacer::none(), 10);
        let summary = collector.run(&job, &units, &mut sink).await.unwrap();

        assert_eq!(summary.errored, 1);
        assert_eq!(summary.written, 4);

        // The failed season left no rows and is fetched again
        let source = ScriptedSource::new().page(&units[1].url, SEASON_HTML);
        let calls = source.calls();
        let mut collector = Collector::new(source, Pacer::none(), 10);
        let summary = collector.run(&job, &units, &mut sink).await.unwrap();

        assert_eq!(calls.get(), 1);
        assert_eq!(summary.skipped, 2);
        assert_eq!(summary.written, 2);

        let rows: Vec<RosterRecord> = csv::Reader::from_path(sink.path())
            .unwrap()
            .deserialize()
            .collect::<Result<_, _>>()
            .unwrap();
        let years: Vec<u16> = rows.iter().map(|r| r.season_year).collect();
        assert_eq!(years, vec![1990, 1990, 1992, 1992, 1991, 1991]);
    }

    #[tokio::test]
    async fn test_season_without_rosters_is_fetched_again() {
        let dir = tempfile::tempdir().unwrap();
        let units = vec![season(2021)];
        let mut sink = DatasetWriter::new(dir.path().join("all_stars.csv"));
        let job = RosterJob::new(RosterParser::new("en.wikipedia"));

        for _ in 0..2 {
            let source = ScriptedSource::new().page(&units[0].url, "<p>Game cancelled</p>");
            let calls = source.calls();
            let mut collector = Collector::new(source, Pacer::none(), 10);
            let summary = collector.run(&job, &units, &mut sink).await.unwrap();

            assert_eq!(calls.get(), 1);
            assert_eq!(summary.errored, 0);
            assert_eq!(summary.written, 0);
        }
        assert!(!sink.path().exists());
    }
}
