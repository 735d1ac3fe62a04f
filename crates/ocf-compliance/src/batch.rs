//! # Batch Validation
//!
//! Validates many documents concurrently against one engine. Each item runs
//! on the blocking pool under a shared concurrency limit and its own
//! timeout. Results come back in input order whatever the completion order.

use std::sync::Arc;
use std::time::Duration;

use ocf_convert::Encoding;
use serde::Serialize;
use tokio::sync::Semaphore;

use crate::config::EngineConfig;
use crate::orchestrator::Engine;
use crate::run::ValidationRun;

/// One document submitted for batch validation.
#[derive(Debug, Clone)]
pub struct BatchItem {
    /// Caller-chosen label, usually the file name.
    pub name: String,
    pub bytes: Vec<u8>,
    pub encoding: Encoding,
    pub baseline: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "kebab-case", tag = "status")]
pub enum BatchOutcome {
    Completed { run: Box<ValidationRun> },
    /// The engine itself failed, or the worker panicked.
    Failed { reason: String },
    TimedOut { after_ms: u64 },
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchResult {
    pub name: String,
    #[serde(flatten)]
    pub outcome: BatchOutcome,
}

impl BatchResult {
    pub fn run(&self) -> Option<&ValidationRun> {
        match &self.outcome {
            BatchOutcome::Completed { run } => Some(run),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOptions {
    pub concurrency: usize,
    pub timeout: Duration,
}

impl BatchOptions {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            concurrency: config.batch_concurrency.max(1),
            timeout: Duration::from_secs(config.batch_timeout_secs),
        }
    }
}

/// Validate `items` with the limits from the engine's configuration.
pub async fn validate_batch(engine: Arc<Engine>, items: Vec<BatchItem>) -> Vec<BatchResult> {
    let options = BatchOptions::from_config(engine.config());
    validate_batch_with(engine, items, options).await
}

/// Validate `items` with explicit limits.
///
/// The timeout clock for an item starts when it acquires a concurrency
/// permit. A timed-out item keeps its permit until the blocking work
/// actually returns; its result is discarded.
pub async fn validate_batch_with(engine: Arc<Engine>, items: Vec<BatchItem>, options: BatchOptions) -> Vec<BatchResult> {
    let semaphore = Arc::new(Semaphore::new(options.concurrency.max(1)));
    let total = items.len();
    tracing::info!(items = total, concurrency = options.concurrency, "batch started");

    let mut handles = Vec::with_capacity(total);
    for item in items {
        let engine = Arc::clone(&engine);
        let semaphore = Arc::clone(&semaphore);
        let name = item.name.clone();
        let handle = tokio::spawn(async move {
            let permit = match semaphore.acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => return BatchOutcome::Failed { reason: e.to_string() },
            };
            let work = tokio::task::spawn_blocking(move || {
                let _permit = permit;
                engine.validate(&item.bytes, item.encoding, &item.baseline)
            });
            match tokio::time::timeout(options.timeout, work).await {
                Ok(Ok(Ok(run))) => BatchOutcome::Completed { run: Box::new(run) },
                Ok(Ok(Err(e))) => BatchOutcome::Failed { reason: e.to_string() },
                Ok(Err(join)) => BatchOutcome::Failed {
                    reason: format!("validation task failed: {join}"),
                },
                Err(_) => BatchOutcome::TimedOut {
                    after_ms: options.timeout.as_millis() as u64,
                },
            }
        });
        handles.push((name, handle));
    }

    let mut results = Vec::with_capacity(total);
    for (name, handle) in handles {
        let outcome = match handle.await {
            Ok(outcome) => outcome,
            Err(e) => BatchOutcome::Failed {
                reason: format!("batch task failed: {e}"),
            },
        };
        let label = match &outcome {
            BatchOutcome::Completed { .. } => "completed",
            BatchOutcome::Failed { .. } => "failed",
            BatchOutcome::TimedOut { .. } => "timed_out",
        };
        metrics::counter!("ocf_batch_items_total", "outcome" => label).increment(1);
        if !matches!(outcome, BatchOutcome::Completed { .. }) {
            tracing::warn!(item = %name, outcome = label, "batch item did not complete");
        }
        results.push(BatchResult { name, outcome });
    }
    tracing::info!(items = total, "batch finished");
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::ConstraintEvaluator;
    use crate::run::RunOutcome;
    use ocf_catalog::{Registry, ResolvedBaseline};
    use ocf_core::ValidationError;
    use serde_json::Value;
    use std::path::PathBuf;

    fn content_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../content")
    }

    fn engine() -> Engine {
        Engine::new(EngineConfig {
            content_dir: content_dir(),
            ..EngineConfig::default()
        })
        .unwrap()
    }

    fn item(name: &str, file: &str, encoding: Encoding) -> BatchItem {
        BatchItem {
            name: name.to_string(),
            bytes: std::fs::read(content_dir().join("samples").join(file)).unwrap(),
            encoding,
            baseline: "moderate".to_string(),
        }
    }

    struct SlowEvaluator(Duration);

    impl ConstraintEvaluator for SlowEvaluator {
        fn evaluate(&self, _: &Value, _: &ResolvedBaseline, _: &Registry) -> Vec<ValidationError> {
            std::thread::sleep(self.0);
            Vec::new()
        }
    }

    #[tokio::test]
    async fn results_follow_input_order() {
        let items = vec![
            item("a", "ssp-moderate.json", Encoding::Json),
            item("b", "ssp-moderate-incomplete.yaml", Encoding::Yaml),
            BatchItem {
                name: "c".to_string(),
                bytes: b"not json".to_vec(),
                encoding: Encoding::Json,
                baseline: "moderate".to_string(),
            },
        ];
        let results = validate_batch(Arc::new(engine()), items).await;
        let names: Vec<&str> = results.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        let outcomes: Vec<RunOutcome> = results.iter().map(|r| r.run().unwrap().outcome).collect();
        assert_eq!(outcomes, vec![RunOutcome::Pass, RunOutcome::Fail, RunOutcome::Invalid]);
    }

    #[tokio::test]
    async fn slow_item_times_out() {
        let engine = engine().with_evaluator(Arc::new(SlowEvaluator(Duration::from_millis(500))));
        let options = BatchOptions {
            concurrency: 2,
            timeout: Duration::from_millis(50),
        };
        let results = validate_batch_with(
            Arc::new(engine),
            vec![item("slow", "ssp-moderate.json", Encoding::Json)],
            options,
        )
        .await;
        assert!(matches!(results[0].outcome, BatchOutcome::TimedOut { after_ms: 50 }));
        assert!(results[0].run().is_none());
    }

    #[tokio::test]
    async fn empty_batch() {
        assert!(validate_batch(Arc::new(engine()), Vec::new()).await.is_empty());
    }

    #[test]
    fn options_from_config_floor_concurrency() {
        let config = EngineConfig {
            batch_concurrency: 0,
            batch_timeout_secs: 7,
            ..EngineConfig::default()
        };
        let options = BatchOptions::from_config(&config);
        assert_eq!(options.concurrency, 1);
        assert_eq!(options.timeout, Duration::from_secs(7));
    }
}
