//! One archive, one session: unpack, scan, categorize, and build flows.
//!
//! Everything here is blocking; command handlers run it through
//! [`run_blocking`].

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use atlog_archive::{CancelToken, Notice, RecordScanner, Session, SkippedEntry, Unpacker};
use atlog_categorize::{CategorizeMode, Categorizer, CategoryBuckets};
use atlog_config::AtlogConfig;
use atlog_core::{FileCategory, RecordBuffer, TransactionFlow};
use atlog_flow::{FlowBuilder, UiTimeline};
use atlog_rules::RuleTable;

/// Shared, immutable processing setup for every archive of an invocation.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: Arc<AtlogConfig>,
    categorizer: Categorizer,
    cancel: CancelToken,
}

/// Result of unpacking and categorizing one archive.
///
/// Files stay readable until the analysis is dropped.
pub struct Analysis {
    pub session: Session,
    pub skipped: Vec<SkippedEntry>,
    pub notices: Vec<Notice>,
    pub buckets: CategoryBuckets,
}

impl Pipeline {
    pub fn new(config: AtlogConfig, cancel: CancelToken) -> anyhow::Result<Self> {
        let categorizer =
            Categorizer::new(&config.categorize).context("failed to build categorization table")?;
        Ok(Self {
            config: Arc::new(config),
            categorizer,
            cancel,
        })
    }

    #[must_use]
    pub fn with_mode(mut self, mode: CategorizeMode) -> Self {
        self.categorizer = self.categorizer.with_mode(mode);
        self
    }

    pub fn config(&self) -> &AtlogConfig {
        &self.config
    }

    fn read(archive: &Path) -> anyhow::Result<Vec<u8>> {
        std::fs::read(archive).with_context(|| format!("failed to read {}", archive.display()))
    }

    /// Embedded records of an archive, straight from its central directory.
    pub fn records(&self, archive: &Path) -> anyhow::Result<Vec<RecordBuffer>> {
        let bytes = Self::read(archive)?;
        RecordScanner::new(&self.config.scanner, &self.config.archive)
            .with_cancel(self.cancel.clone())
            .scan(&bytes)
            .with_context(|| format!("failed to scan {}", archive.display()))
    }

    /// Unpack and categorize an archive in a fresh session.
    ///
    /// `scratch_root` overrides the configured scratch root.
    pub fn analyze(&self, archive: &Path, scratch_root: Option<&Path>) -> anyhow::Result<Analysis> {
        let bytes = Self::read(archive)?;
        let scratch_root = scratch_root.or(self.config.archive.scratch_root.as_deref());
        let session = Session::new(scratch_root).context("failed to create scratch directory")?;

        let unpacker = Unpacker::new(&self.config.archive)?.with_cancel(self.cancel.clone());
        let report = session
            .unpack(&unpacker, &bytes)
            .with_context(|| format!("failed to unpack {}", archive.display()))?;
        let records = RecordScanner::new(&self.config.scanner, &self.config.archive)
            .with_cancel(self.cancel.clone())
            .scan(&bytes)
            .with_context(|| format!("failed to scan {}", archive.display()))?;

        let buckets = self.categorizer.categorize(report.files, records);
        tracing::info!(
            archive = %archive.display(),
            files = buckets.total(),
            skipped = report.skipped.len(),
            notices = report.notices.len(),
            "archive analyzed"
        );

        Ok(Analysis {
            session,
            skipped: report.skipped,
            notices: report.notices,
            buckets,
        })
    }
}

impl Analysis {
    /// Flows from every customer and UI journal, ordered by start time.
    pub fn flows(&self, rules: Arc<RuleTable>) -> anyhow::Result<Vec<TransactionFlow>> {
        let builder = FlowBuilder::new(rules);
        let mut flows = Vec::new();
        for category in [FileCategory::CustomerJournal, FileCategory::UiJournal] {
            for file in self.buckets.files(category) {
                let built = builder
                    .build(&file.path, category)
                    .with_context(|| format!("failed to read journal {}", file.relative_path.display()))?;
                flows.extend(built);
            }
        }
        flows.sort_by_key(TransactionFlow::start);
        Ok(flows)
    }

    /// Timelines of every UI journal.
    pub fn timelines(&self) -> anyhow::Result<Vec<UiTimeline>> {
        self.buckets
            .files(FileCategory::UiJournal)
            .map(|file| {
                UiTimeline::from_path(&file.path)
                    .with_context(|| format!("failed to read UI journal {}", file.relative_path.display()))
            })
            .collect()
    }
}

/// Load the rule table once per process.
pub fn load_rules(path: &Path) -> anyhow::Result<Arc<RuleTable>> {
    atlog_rules::load_global(path)
        .with_context(|| format!("failed to load rules from {}", path.display()))
}

/// Run blocking work on tokio's blocking pool.
pub async fn run_blocking<T, F>(work: F) -> anyhow::Result<T>
where
    F: FnOnce() -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .context("worker task failed")?
}

/// Trip `cancel` on Ctrl-C.
pub fn cancel_on_ctrl_c(cancel: CancelToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, cancelling");
            cancel.cancel();
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use atlog_archive::fixtures::ZipBuilder;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    const RULES: &str = r#"<configuration><rules>
      <rule type="withdrawal" journal="customer">
        <start>^\d{2}:\d{2}:\d{2}\s+3201\b</start>
        <end>^\d{2}:\d{2}:\d{2}\s+3202\b</end>
      </rule>
    </rules></configuration>"#;

    fn bundle(dir: &TempDir) -> PathBuf {
        let inner = ZipBuilder::new().deflated(
            "CustomerJournal/20240301.jrn",
            b"10:00:00 3201 CARD INSERTED\n10:00:21 3202 CARD TAKEN\n",
        );
        let bytes = ZipBuilder::new()
            .stored("logs/diag.trc", b"10:15:02.31 PID:4f2.1a0 CDM Data: 00\n")
            .nested("journals.zip", &inner)
            .build();
        let path = dir.path().join("bundle.zip");
        std::fs::write(&path, bytes).unwrap();
        path
    }

    fn pipeline() -> Pipeline {
        Pipeline::new(AtlogConfig::default(), CancelToken::new()).unwrap()
    }

    #[test]
    fn analysis_categorizes_and_builds_flows() {
        let dir = TempDir::new().unwrap();
        let archive = bundle(&dir);
        let analysis = pipeline().analyze(&archive, Some(dir.path())).unwrap();

        assert_eq!(analysis.buckets.names(FileCategory::TraceLog), vec!["diag.trc"]);
        assert_eq!(
            analysis.buckets.names(FileCategory::CustomerJournal),
            vec!["20240301.jrn"]
        );

        let rules = Arc::new(RuleTable::from_xml(RULES).unwrap());
        let flows = analysis.flows(rules).unwrap();
        assert_eq!(flows.len(), 1);
        assert!(flows[0].is_complete());
        assert!(analysis.timelines().unwrap().is_empty());
    }

    #[test]
    fn scratch_is_removed_with_the_analysis() {
        let dir = TempDir::new().unwrap();
        let archive = bundle(&dir);
        let analysis = pipeline().analyze(&archive, Some(dir.path())).unwrap();
        let scratch = analysis.session.path().to_path_buf();
        assert!(scratch.is_dir());
        drop(analysis);
        assert!(!scratch.exists());
    }

    #[test]
    fn missing_archive_is_an_error() {
        let err = pipeline()
            .analyze(Path::new("/nonexistent/bundle.zip"), None)
            .err()
            .unwrap();
        assert!(format!("{err:#}").contains("failed to read"));
    }

    #[tokio::test]
    async fn blocking_work_returns_its_result() {
        let value = run_blocking(|| Ok(21 * 2)).await.unwrap();
        assert_eq!(value, 42);
    }
}
