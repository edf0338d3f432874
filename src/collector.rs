//! Resumable, batched collection over a list of work units.
//!
//! For each unit: skip it if its key is already in the output, otherwise
//! fetch, extract and buffer its records, then pause. Failures become
//! records (or nothing) instead of aborting. The buffer is flushed every
//! `batch_size` records and once more at the end.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::HarvestError;
use crate::scraper::{Pacer, PageSource};
use crate::storage::RecordSink;

/// One item of work.
pub trait Unit {
    /// Natural key, compared against the output's key column
    fn key(&self) -> String;
    fn url(&self) -> &str;
    /// Human-readable name for logs
    fn label(&self) -> String;
}

/// What to do with a fetched page.
pub trait Job {
    type Unit: Unit;
    type Record: Serialize;

    /// Output column holding unit keys
    const KEY_COLUMN: &'static str;

    /// Records extracted from one unit's page
    fn build(&self, unit: &Self::Unit, html: &str) -> anyhow::Result<Vec<Self::Record>>;

    /// Records that stand in for a failed unit
    fn failed(&self, unit: &Self::Unit, error: &anyhow::Error) -> Vec<Self::Record>;
}

/// Counts from one collector run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub processed: usize,
    pub skipped: usize,
    pub errored: usize,
    pub written: usize,
    pub batches: usize,
}

/// Progress hooks. All methods default to doing nothing.
pub trait CollectorObserver {
    fn on_resume(&mut self, _done: usize) {}
    fn on_skip(&mut self, _key: &str) {}
    fn on_unit(&mut self, _position: usize, _total: usize, _label: &str, _url: &str) {}
    fn on_error(&mut self, _label: &str, _error: &anyhow::Error) {}
    fn on_flush(&mut self, _size: usize, _written: usize) {}
}

/// Observer that ignores everything
pub struct Silent;

impl CollectorObserver for Silent {}

/// Observer that logs through `tracing`
pub struct TracingObserver;

impl CollectorObserver for TracingObserver {
    fn on_resume(&mut self, done: usize) {
        info!("Resume: {} units already in output", done);
    }

    fn on_skip(&mut self, key: &str) {
        debug!("Skipping {}", key);
    }

    fn on_unit(&mut self, position: usize, total: usize, label: &str, url: &str) {
        info!("[{}/{}] {} -> {}", position, total, label, url);
    }

    fn on_error(&mut self, label: &str, error: &anyhow::Error) {
        warn!("{} failed: {:#}", label, error);
    }

    fn on_flush(&mut self, size: usize, written: usize) {
        info!("Wrote batch of {} (total this run: {})", size, written);
    }
}

/// Sequential collector over one page source.
pub struct Collector<S> {
    source: S,
    pacer: Pacer,
    batch_size: usize,
    observer: Box<dyn CollectorObserver + Send>,
}

impl<S: PageSource> Collector<S> {
    pub fn new(source: S, pacer: Pacer, batch_size: usize) -> Self {
        Self {
            source,
            pacer,
            batch_size: batch_size.max(1),
            observer: Box::new(Silent),
        }
    }

    pub fn with_observer(mut self, observer: impl CollectorObserver + Send + 'static) -> Self {
        self.observer = Box::new(observer);
        self
    }

    /// Fetch and extract one unit.
    async fn process<J: Job>(&self, job: &J, unit: &J::Unit) -> anyhow::Result<Vec<J::Record>> {
        let html = self.source.fetch(unit.url()).await?;
        job.build(unit, &html)
    }

    /// Run `job` over `units`, flushing into `sink`.
    ///
    /// Only sink errors abort the run; per-unit failures are recorded.
    pub async fn run<J, K>(
        &mut self,
        job: &J,
        units: &[J::Unit],
        sink: &mut K,
    ) -> Result<RunSummary, HarvestError>
    where
        J: Job,
        K: RecordSink<J::Record>,
    {
        let mut done = sink.existing_keys(J::KEY_COLUMN)?;
        if !done.is_empty() {
            self.observer.on_resume(done.len());
        }

        let mut summary = RunSummary::default();
        let mut buffer: Vec<J::Record> = Vec::with_capacity(self.batch_size);
        let total = units.len();

        for (i, unit) in units.iter().enumerate() {
            let key = unit.key();
            if key.trim().is_empty() || unit.url().trim().is_empty() || done.contains(&key) {
                summary.skipped += 1;
                self.observer.on_skip(&key);
                continue;
            }

            summary.processed += 1;
            let label = unit.label();
            self.observer.on_unit(i + 1, total, &label, unit.url());

            match self.process(job, unit).await {
                Ok(records) => buffer.extend(records),
                Err(e) => {
                    summary.errored += 1;
                    self.observer.on_error(&label, &e);
                    buffer.extend(job.failed(unit, &e));
                }
            }
            done.insert(key);

            self.pacer.pause().await;

            if buffer.len() >= self.batch_size {
                self.flush(sink, &mut buffer, &mut summary)?;
            }
        }

        if !buffer.is_empty() {
            self.flush(sink, &mut buffer, &mut summary)?;
        }

        Ok(summary)
    }

    fn flush<R, K: RecordSink<R>>(
        &mut self,
        sink: &mut K,
        buffer: &mut Vec<R>,
        summary: &mut RunSummary,
    ) -> Result<(), HarvestError> {
        sink.append(buffer)?;
        summary.written += buffer.len();
        summary.batches += 1;
        self.observer.on_flush(buffer.len(), summary.written);
        buffer.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    use crate::jobs::BioJob;
    use crate::scraper::parsers::BioParser;
    use crate::scraper::source::testing::ScriptedSource;
    use crate::storage::DatasetWriter;
    use crate::types::{BioRecord, PlayerUnit};

    const PAGE_1: &str = "<p><strong>Born:</strong> December 30, 1984 in Akron, Ohio us</p>\
                          <p><strong>NBA Debut:</strong> October 29, 2003</p>";
    const PAGE_3: &str = "<p><strong>Born:</strong> February 19, 1995 in Sombor, Serbia</p>\
                          <p><strong>NBA Debut:</strong> November 5, 2015</p>";

    fn unit(n: usize) -> PlayerUnit {
        PlayerUnit {
            player_name: format!("Player {}", n),
            player_url: format!("https://example.com/players/p/player{:02}.html", n),
        }
    }

    fn job() -> BioJob {
        BioJob::new(BioParser::default())
    }

    /// Records every batch handed to the writer.
    struct Recording {
        inner: DatasetWriter,
        batches: Vec<usize>,
    }

    impl RecordSink<BioRecord> for Recording {
        fn existing_keys(&self, column: &str) -> Result<HashSet<String>, HarvestError> {
            self.inner.load_keys(column)
        }

        fn append(&mut self, records: &[BioRecord]) -> Result<(), HarvestError> {
            self.batches.push(records.len());
            self.inner.append_rows(records).map(|_| ())
        }
    }

    fn read_rows(path: &std::path::Path) -> Vec<BioRecord> {
        csv::Reader::from_path(path)
            .unwrap()
            .deserialize()
            .collect::<Result<Vec<BioRecord>, _>>()
            .unwrap()
    }

    #[tokio::test]
    async fn test_failed_unit_recorded_and_run_resumes_without_fetching() {
        let dir = tempfile::tempdir().unwrap();
        let units = vec![unit(1), unit(2), unit(3)];
        let mut sink = DatasetWriter::new(dir.path().join("bios.csv"));

        let source = ScriptedSource::new()
            .page(&units[0].player_url, PAGE_1)
            .timeout(&units[1].player_url)
            .page(&units[2].player_url, PAGE_3);
        let calls = source.calls();

        let mut collector = Collector::new(source, Pacer::none(), 50);
        let summary = collector.run(&job(), &units, &mut sink).await.unwrap();
        assert_eq!(calls.get(), 3);
        assert_eq!(
            summary,
            RunSummary {
                processed: 3,
                skipped: 0,
                errored: 1,
                written: 3,
                batches: 1,
            }
        );

        let rows = read_rows(sink.path());
        assert_eq!(rows.len(), 3);

        assert_eq!(rows[0].country.as_deref(), Some("United States"));
        assert_eq!(rows[0].debut_year, Some(2003));
        assert!(rows[0].born_line.is_some());
        assert!(rows[0].error.is_none());

        assert!(rows[1].error.as_deref().unwrap().contains("timed out"));
        assert!(rows[1].born_line.is_none());
        assert!(rows[1].country.is_none());
        assert!(rows[1].debut_year.is_none());

        assert_eq!(rows[2].country.as_deref(), Some("Serbia"));
        assert_eq!(rows[2].debut_year, Some(2015));
        assert!(rows[2].error.is_none());

        // Second run over the same output fetches nothing
        let source = ScriptedSource::new();
        let calls = source.calls();
        let mut collector = Collector::new(source, Pacer::none(), 50);
        let summary = collector.run(&job(), &units, &mut sink).await.unwrap();

        assert_eq!(calls.get(), 0);
        assert_eq!(summary.skipped, 3);
        assert_eq!(summary.processed, 0);
        assert_eq!(summary.written, 0);
        assert_eq!(read_rows(sink.path()).len(), 3);
    }

    #[tokio::test]
    async fn test_batches_flushed_with_single_header() {
        let dir = tempfile::tempdir().unwrap();
        let units: Vec<_> = (1..=5).map(unit).collect();
        let source = units
            .iter()
            .fold(ScriptedSource::new(), |s, u| s.page(&u.player_url, PAGE_1));

        let mut sink = Recording {
            inner: DatasetWriter::new(dir.path().join("bios.csv")),
            batches: Vec::new(),
        };
        let mut collector = Collector::new(source, Pacer::none(), 2);
        let summary = collector.run(&job(), &units, &mut sink).await.unwrap();

        assert_eq!(sink.batches, vec![2, 2, 1]);
        assert_eq!(summary.batches, 3);
        assert_eq!(summary.written, 5);

        let content = std::fs::read_to_string(sink.inner.path()).unwrap();
        let headers = content
            .lines()
            .filter(|l| l.starts_with("player_name,"))
            .count();
        assert_eq!(headers, 1);
        assert_eq!(content.lines().count(), 6);
    }

    #[tokio::test]
    async fn test_partial_resume_fetches_only_missing() {
        let dir = tempfile::tempdir().unwrap();
        let units: Vec<_> = (1..=4).map(unit).collect();
        let mut sink = DatasetWriter::new(dir.path().join("bios.csv"));
        sink.append_rows(&[
            BioRecord::failed(&units[0], "earlier failure".to_string()),
            BioRecord::failed(&units[2], "earlier failure".to_string()),
        ])
        .unwrap();

        let source = units
            .iter()
            .fold(ScriptedSource::new(), |s, u| s.page(&u.player_url, PAGE_3));
        let calls = source.calls();
        let mut collector = Collector::new(source, Pacer::none(), 50);
        let summary = collector.run(&job(), &units, &mut sink).await.unwrap();

        // Earlier failures count as done
        assert_eq!(calls.get(), 2);
        assert_eq!(summary.skipped, 2);
        assert_eq!(summary.processed, 2);

        let urls: Vec<_> = read_rows(sink.path())
            .into_iter()
            .map(|r| r.player_url)
            .collect();
        assert_eq!(
            urls,
            vec![
                units[0].player_url.clone(),
                units[2].player_url.clone(),
                units[1].player_url.clone(),
                units[3].player_url.clone(),
            ]
        );
    }

    #[tokio::test]
    async fn test_ragged_output_row_still_counts_as_done() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bios.csv");
        let units = vec![unit(1)];
        std::fs::write(
            &path,
            format!(
                "player_name,player_url,born_line,country,debut_year,error\n\
                 Player 1,{},,,,boom,extra\n",
                units[0].player_url
            ),
        )
        .unwrap();

        let source = ScriptedSource::new().page(&units[0].player_url, PAGE_1);
        let calls = source.calls();
        let mut sink = DatasetWriter::new(&path);
        let mut collector = Collector::new(source, Pacer::none(), 50);
        let summary = collector.run(&job(), &units, &mut sink).await.unwrap();

        assert_eq!(calls.get(), 0);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.written, 0);
        assert_eq!(std::fs::read_to_string(&path).unwrap().lines().count(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_and_blank_units_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let blank = PlayerUnit {
            player_name: "Nobody".to_string(),
            player_url: "  ".to_string(),
        };
        let units = vec![unit(1), unit(1), blank];
        let source = ScriptedSource::new().page(&units[0].player_url, PAGE_1);
        let calls = source.calls();

        let mut sink = DatasetWriter::new(dir.path().join("bios.csv"));
        let mut collector = Collector::new(source, Pacer::none(), 50);
        let summary = collector.run(&job(), &units, &mut sink).await.unwrap();

        assert_eq!(calls.get(), 1);
        assert_eq!(summary.processed, 1);
        assert_eq!(summary.skipped, 2);
        assert_eq!(read_rows(sink.path()).len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pacing_applies_to_failed_units() {
        let dir = tempfile::tempdir().unwrap();
        let units = vec![unit(1), unit(2)];
        let source = ScriptedSource::new().timeout(&units[0].player_url);

        let mut sink = DatasetWriter::new(dir.path().join("bios.csv"));
        let mut collector = Collector::new(source, Pacer::new(1.0, 1.0), 50);
        let start = tokio::time::Instant::now();
        let summary = collector.run(&job(), &units, &mut sink).await.unwrap();

        assert_eq!(summary.errored, 2);
        assert!(start.elapsed() >= std::time::Duration::from_secs(2));
    }
}
