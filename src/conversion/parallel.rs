//! Bounded-parallel book execution using tokio.
//!
//! At most `limit` books convert at once; one failing book never
//! disturbs the others. The transcode operation is injected so the
//! scheduling guarantees are testable without ffmpeg.

use std::future::Future;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::Semaphore;

use crate::error::BindError;
use crate::planning::BookPlan;

/// Result of one book's conversion attempt.
#[derive(Debug)]
pub struct BookOutcome {
    /// "Artist - Title" identity for reporting
    pub title: String,
    pub output: Option<PathBuf>,
    pub error: Option<BindError>,
    pub elapsed: Duration,
}

impl BookOutcome {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// What happened across the whole run.
#[derive(Debug)]
pub struct ExecutionSummary {
    pub outcomes: Vec<BookOutcome>,
    /// True when cancellation skipped queued books
    pub cancelled: bool,
}

impl ExecutionSummary {
    pub fn completed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.succeeded()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.completed()
    }
}

/// Run every plan through `transcode` with at most `limit` in flight.
///
/// Dispatch stops as soon as the cancel flag is set; books already in
/// flight are awaited so they can clean up after themselves.
pub async fn execute_plans<F, Fut>(
    plans: Vec<BookPlan>,
    limit: usize,
    cancel: Arc<AtomicBool>,
    transcode: F,
) -> ExecutionSummary
where
    F: Fn(BookPlan) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<PathBuf, BindError>> + Send + 'static,
{
    let limit = limit.max(1);
    let semaphore = Arc::new(Semaphore::new(limit));
    let transcode = Arc::new(transcode);

    log::info!(
        "Converting {} book(s) with up to {} at once",
        plans.len(),
        limit
    );

    let mut futures = FuturesUnordered::new();
    let mut cancelled = false;

    for plan in plans {
        if cancel.load(Ordering::SeqCst) {
            log::warn!("Cancellation requested - skipping remaining books");
            cancelled = true;
            break;
        }

        let Ok(permit) = semaphore.clone().acquire_owned().await else {
            break;
        };
        // The flag may have been set while we waited for a permit
        if cancel.load(Ordering::SeqCst) {
            log::warn!("Cancellation requested - skipping remaining books");
            cancelled = true;
            break;
        }
        let transcode = transcode.clone();

        let handle = tokio::spawn(async move {
            let title = plan.display_title();
            let started = Instant::now();
            let result = transcode(plan).await;
            drop(permit);

            let elapsed = started.elapsed();
            match result {
                Ok(path) => {
                    log::info!(
                        "Finished \"{}\" in {:.1}s -> {}",
                        title,
                        elapsed.as_secs_f64(),
                        path.display()
                    );
                    BookOutcome {
                        title,
                        output: Some(path),
                        error: None,
                        elapsed,
                    }
                }
                Err(error) => {
                    log::error!("Failed \"{}\": {}", title, error);
                    BookOutcome {
                        title,
                        output: None,
                        error: Some(error),
                        elapsed,
                    }
                }
            }
        });

        futures.push(handle);
    }

    // Drain in-flight books, cancelled or not
    let mut outcomes = Vec::new();
    while let Some(joined) = futures.next().await {
        if let Ok(outcome) = joined {
            outcomes.push(outcome);
        }
    }

    ExecutionSummary {
        outcomes,
        cancelled,
    }
}
