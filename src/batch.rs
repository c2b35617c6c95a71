// Batch execution core
//
// Every multi-file command funnels through this module: enumerate items,
// apply one operation per item behind a fault boundary, collect an ordered
// report. The runner itself performs no I/O and never logs; rendering the
// report is the caller's job.

use async_trait::async_trait;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// One unit of work, immutable once enumerated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchItem {
    pub path: PathBuf,
    pub label: String,
}

impl BatchItem {
    pub fn new<P: Into<PathBuf>, S: Into<String>>(path: P, label: S) -> Self {
        Self {
            path: path.into(),
            label: label.into(),
        }
    }

    /// Create an item labelled with the file name of `path`.
    pub fn from_path<P: Into<PathBuf>>(path: P) -> Self {
        let path = path.into();
        let label = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self { path, label }
    }
}

/// Outcome of applying the operation to one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Operation completed; carries a reference to what it produced.
    Success(PathBuf),
    /// Operation failed; carries a human-readable cause.
    Failure(String),
}

#[derive(Debug, Clone)]
pub struct ItemResult {
    pub item: BatchItem,
    pub outcome: Outcome,
}

impl ItemResult {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Outcome::Success(_))
    }
}

/// Ordered results of one batch run, one entry per enumerated item.
#[derive(Debug, Default)]
pub struct BatchReport {
    results: Vec<ItemResult>,
}

impl BatchReport {
    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.succeeded()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &ItemResult> {
        self.results.iter()
    }

    pub fn failures(&self) -> impl Iterator<Item = &ItemResult> {
        self.results.iter().filter(|r| !r.is_success())
    }
}

/// Per-item work applied by the runner.
///
/// `preflight` validates that the operation can run at all (for example,
/// that the external binary it wraps is installed). A preflight error
/// aborts the batch before any item is touched; errors from `apply` never
/// do.
#[async_trait]
pub trait ItemOperation: Send + Sync {
    fn preflight(&self) -> Result<()> {
        Ok(())
    }

    async fn apply(&self, item: &BatchItem) -> Result<PathBuf>;
}

/// Sequential, single-threaded fold over the enumerated items.
///
/// No retries, no concurrency, no cancellation. Result order matches
/// enumeration order, and every item yields exactly one [`ItemResult`]:
/// operation errors and panics are both downgraded to [`Outcome::Failure`].
pub struct BatchRunner;

impl BatchRunner {
    pub async fn run<O>(items: Vec<BatchItem>, operation: &O) -> Result<BatchReport>
    where
        O: ItemOperation + ?Sized,
    {
        operation.preflight()?;

        let mut results = Vec::with_capacity(items.len());
        for item in items {
            let outcome = match AssertUnwindSafe(operation.apply(&item)).catch_unwind().await {
                Ok(Ok(output)) => Outcome::Success(output),
                Ok(Err(e)) => Outcome::Failure(e.to_string()),
                Err(panic) => Outcome::Failure(describe_panic(panic.as_ref())),
            };
            results.push(ItemResult { item, outcome });
        }

        Ok(BatchReport { results })
    }
}

fn describe_panic(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        format!("operation panicked: {}", message)
    } else if let Some(message) = panic.downcast_ref::<String>() {
        format!("operation panicked: {}", message)
    } else {
        "operation panicked".to_string()
    }
}

/// Convenience used by operations that derive the destination from the
/// source file name.
pub fn output_for(item: &BatchItem, output_dir: &Path) -> PathBuf {
    match item.path.file_name() {
        Some(name) => output_dir.join(name),
        None => output_dir.join(&item.label),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MedleyError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Fails on any item whose path ends in `.bad`, panics on `.boom`.
    struct ExtensionGate {
        invocations: AtomicUsize,
    }

    impl ExtensionGate {
        fn new() -> Self {
            Self {
                invocations: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ItemOperation for ExtensionGate {
        async fn apply(&self, item: &BatchItem) -> Result<PathBuf> {
            self.invocations.fetch_add(1, Ordering::SeqCst);
            match item.path.extension().and_then(|e| e.to_str()) {
                Some("bad") => Err(MedleyError::UnsupportedFormat(item.label.clone())),
                Some("boom") => panic!("unexpected fault"),
                _ => Ok(item.path.with_extension("out")),
            }
        }
    }

    struct Unavailable;

    #[async_trait]
    impl ItemOperation for Unavailable {
        fn preflight(&self) -> Result<()> {
            Err(MedleyError::Media("tool not found".to_string()))
        }

        async fn apply(&self, _item: &BatchItem) -> Result<PathBuf> {
            unreachable!("preflight failure must stop the batch before any item");
        }
    }

    fn items(names: &[&str]) -> Vec<BatchItem> {
        names.iter().map(|name| BatchItem::from_path(*name)).collect()
    }

    #[tokio::test]
    async fn test_every_item_yields_one_result_in_order() {
        let op = ExtensionGate::new();
        let report = BatchRunner::run(items(&["a.ok", "b.bad", "c.ok"]), &op)
            .await
            .unwrap();

        assert_eq!(report.len(), 3);
        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.failed(), 1);

        let labels: Vec<_> = report.iter().map(|r| r.item.label.as_str()).collect();
        assert_eq!(labels, vec!["a.ok", "b.bad", "c.ok"]);
        assert!(report.iter().nth(0).unwrap().is_success());
        assert!(!report.iter().nth(1).unwrap().is_success());
        assert!(report.iter().nth(2).unwrap().is_success());
    }

    #[tokio::test]
    async fn test_failure_carries_cause() {
        let op = ExtensionGate::new();
        let report = BatchRunner::run(items(&["b.bad"]), &op).await.unwrap();

        let failure = report.failures().next().unwrap();
        match &failure.outcome {
            Outcome::Failure(reason) => assert!(reason.contains("b.bad")),
            Outcome::Success(_) => panic!("expected failure"),
        }
    }

    #[tokio::test]
    async fn test_panic_is_downgraded_to_failure() {
        let op = ExtensionGate::new();
        let report = BatchRunner::run(items(&["a.ok", "b.boom", "c.ok"]), &op)
            .await
            .unwrap();

        assert_eq!(report.len(), 3);
        assert_eq!(report.failed(), 1);
        match &report.iter().nth(1).unwrap().outcome {
            Outcome::Failure(reason) => assert!(reason.contains("unexpected fault")),
            Outcome::Success(_) => panic!("expected failure"),
        }
        // The panic must not prevent the remaining items from running.
        assert_eq!(op.invocations.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_empty_input_invokes_nothing() {
        let op = ExtensionGate::new();
        let report = BatchRunner::run(Vec::new(), &op).await.unwrap();

        assert!(report.is_empty());
        assert!(report.all_succeeded());
        assert_eq!(op.invocations.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_preflight_failure_aborts_before_any_item() {
        let result = BatchRunner::run(items(&["a.ok"]), &Unavailable).await;
        assert!(matches!(result, Err(MedleyError::Media(_))));
    }

    #[tokio::test]
    async fn test_rerun_classifies_items_identically() {
        let first = BatchRunner::run(items(&["a.ok", "b.bad"]), &ExtensionGate::new())
            .await
            .unwrap();
        let second = BatchRunner::run(items(&["a.ok", "b.bad"]), &ExtensionGate::new())
            .await
            .unwrap();

        let classify = |report: &BatchReport| -> Vec<bool> {
            report.iter().map(ItemResult::is_success).collect()
        };
        assert_eq!(classify(&first), classify(&second));
    }

    #[test]
    fn test_output_for_keeps_file_name() {
        let item = BatchItem::from_path("/videos/in/take1.mp4");
        assert_eq!(
            output_for(&item, Path::new("/videos/out")),
            PathBuf::from("/videos/out/take1.mp4")
        );
    }
}
