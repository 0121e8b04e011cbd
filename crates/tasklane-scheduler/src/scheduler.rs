//! Clock-driven one-shot job executor.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use tasklane_core::{Clock, SystemClock};

use crate::error::SchedulerError;
use crate::key::JobKey;

/// Callback target for fired jobs.
#[async_trait]
pub trait JobHandler: Send + Sync {
    /// Handle a fired job.
    ///
    /// Errors are logged by the dispatch loop and never propagate; the job
    /// is treated as completed either way and does not re-fire.
    async fn on_fire(&self, key: JobKey) -> Result<(), SchedulerError>;
}

/// Handle describing a scheduled job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobHandle {
    pub key: JobKey,
    pub fire_at: DateTime<Utc>,
}

struct PendingJob {
    seq: u64,
    fire_at: DateTime<Utc>,
    sleeper: JoinHandle<()>,
}

#[derive(Default)]
struct SchedulerInner {
    pending: HashMap<JobKey, PendingJob>,
    next_seq: u64,
}

/// One-shot job scheduler.
///
/// Holds at most one pending timer per job key; scheduling an existing key
/// atomically cancels and replaces it, so the old and new timer can never
/// both fire. Fired keys flow through a channel to a single dispatch loop,
/// decoupling submission from execution: `schedule` and `cancel` never
/// block on job callbacks.
///
/// Must be used from within a tokio runtime.
pub struct JobScheduler {
    clock: Arc<dyn Clock>,
    inner: Arc<Mutex<SchedulerInner>>,
    fired_tx: mpsc::UnboundedSender<JobKey>,
    fired_rx: Mutex<Option<mpsc::UnboundedReceiver<JobKey>>>,
    shutdown_tx: broadcast::Sender<()>,
    running: AtomicBool,
}

impl JobScheduler {
    /// Create a scheduler on the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create a scheduler on a custom clock.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        let (fired_tx, fired_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            clock,
            inner: Arc::new(Mutex::new(SchedulerInner::default())),
            fired_tx,
            fired_rx: Mutex::new(Some(fired_rx)),
            shutdown_tx,
            running: AtomicBool::new(false),
        }
    }

    /// Schedule a job, replacing any pending job with the same key.
    pub fn schedule(&self, key: JobKey, fire_at: DateTime<Utc>) -> JobHandle {
        let mut inner = self.inner.lock();
        if let Some(old) = inner.pending.remove(&key) {
            old.sleeper.abort();
            debug!(%key, "replacing pending job");
        }
        let seq = inner.next_seq;
        inner.next_seq += 1;

        // Fix the deadline here, not in the spawned task: the delay is
        // measured from the instant of submission.
        let delay = (fire_at - self.clock.now())
            .to_std()
            .unwrap_or(std::time::Duration::ZERO);
        let sleep = tokio::time::sleep(delay);

        let sleeper = tokio::spawn({
            let table = Arc::clone(&self.inner);
            let tx = self.fired_tx.clone();
            async move {
                sleep.await;

                // Remove the entry before dispatching. A stale generation
                // means this sleeper was replaced and must not fire.
                let current = {
                    let mut inner = table.lock();
                    match inner.pending.get(&key) {
                        Some(job) if job.seq == seq => {
                            inner.pending.remove(&key);
                            true
                        }
                        _ => false,
                    }
                };
                if current {
                    let _ = tx.send(key);
                }
            }
        });

        inner.pending.insert(
            key,
            PendingJob {
                seq,
                fire_at,
                sleeper,
            },
        );
        debug!(%key, %fire_at, "scheduled job");
        JobHandle { key, fire_at }
    }

    /// Cancel a pending job.
    ///
    /// Returns whether a pending job was removed. Cancelling an absent,
    /// already-fired or already-cancelled key is a successful no-op.
    pub fn cancel(&self, key: JobKey) -> bool {
        let mut inner = self.inner.lock();
        match inner.pending.remove(&key) {
            Some(job) => {
                job.sleeper.abort();
                debug!(%key, "cancelled job");
                true
            }
            None => false,
        }
    }

    /// Start the dispatch loop, delivering fired jobs to the handler.
    pub fn run(&self, handler: Arc<dyn JobHandler>) -> Result<(), SchedulerError> {
        let Some(mut fired_rx) = self.fired_rx.lock().take() else {
            return Err(SchedulerError::AlreadyRunning);
        };
        self.running.store(true, Ordering::SeqCst);
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            info!("job dispatch loop started");
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("job dispatch loop stopped");
                        break;
                    }
                    fired = fired_rx.recv() => match fired {
                        Some(key) => {
                            if let Err(e) = handler.on_fire(key).await {
                                error!(%key, "job callback failed: {e}");
                            }
                        }
                        None => break,
                    },
                }
            }
        });

        Ok(())
    }

    /// Stop the dispatch loop.
    ///
    /// Cancels nothing: outstanding jobs are simply not fired after
    /// shutdown.
    pub fn shutdown(&self) {
        if self.running.swap(false, Ordering::SeqCst) {
            let _ = self.shutdown_tx.send(());
        }
    }

    /// Whether the dispatch loop is running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Number of pending jobs.
    pub fn pending_len(&self) -> usize {
        self.inner.lock().pending.len()
    }

    /// Whether a job is pending for the key.
    pub fn is_scheduled(&self, key: JobKey) -> bool {
        self.inner.lock().pending.contains_key(&key)
    }

    /// Fire time of the pending job for a key, if any.
    pub fn fire_time(&self, key: JobKey) -> Option<DateTime<Utc>> {
        self.inner.lock().pending.get(&key).map(|job| job.fire_at)
    }
}

impl Default for JobScheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tasklane_core::ManualClock;
    use tokio::sync::RwLock;
    use uuid::Uuid;

    #[derive(Default)]
    struct RecordingHandler {
        fired: RwLock<Vec<JobKey>>,
    }

    #[async_trait]
    impl JobHandler for RecordingHandler {
        async fn on_fire(&self, key: JobKey) -> Result<(), SchedulerError> {
            self.fired.write().await.push(key);
            Ok(())
        }
    }

    impl RecordingHandler {
        async fn fired(&self) -> Vec<JobKey> {
            self.fired.read().await.clone()
        }
    }

    struct Harness {
        clock: Arc<ManualClock>,
        scheduler: Arc<JobScheduler>,
        handler: Arc<RecordingHandler>,
    }

    fn harness() -> Harness {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let scheduler = Arc::new(JobScheduler::with_clock(clock.clone()));
        let handler = Arc::new(RecordingHandler::default());
        scheduler.run(handler.clone()).unwrap();
        Harness {
            clock,
            scheduler,
            handler,
        }
    }

    /// Advance the manual clock and the tokio clock together, then let
    /// fired jobs drain through the dispatch loop.
    async fn advance(h: &Harness, by: Duration) {
        h.clock.advance(by);
        tokio::time::advance(by.to_std().unwrap()).await;
        tokio::time::sleep(std::time::Duration::from_millis(1)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_schedule_fires_once_at_instant() {
        let h = harness();
        let key = JobKey::reminder(Uuid::new_v4());
        h.scheduler.schedule(key, h.clock.now() + Duration::minutes(5));
        assert_eq!(h.scheduler.pending_len(), 1);

        advance(&h, Duration::minutes(4)).await;
        assert!(h.handler.fired().await.is_empty());
        assert!(h.scheduler.is_scheduled(key));

        advance(&h, Duration::minutes(1)).await;
        assert_eq!(h.handler.fired().await, vec![key]);
        assert_eq!(h.scheduler.pending_len(), 0);

        // One-shot: nothing further.
        advance(&h, Duration::hours(1)).await;
        assert_eq!(h.handler.fired().await, vec![key]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_prevents_fire() {
        let h = harness();
        let key = JobKey::overdue_check(Uuid::new_v4());
        h.scheduler.schedule(key, h.clock.now() + Duration::minutes(5));

        assert!(h.scheduler.cancel(key));
        assert!(!h.scheduler.cancel(key));
        assert_eq!(h.scheduler.pending_len(), 0);

        advance(&h, Duration::minutes(10)).await;
        assert!(h.handler.fired().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reschedule_replaces_pending_job() {
        let h = harness();
        let key = JobKey::reminder(Uuid::new_v4());
        h.scheduler.schedule(key, h.clock.now() + Duration::minutes(5));
        h.scheduler.schedule(key, h.clock.now() + Duration::minutes(20));
        assert_eq!(h.scheduler.pending_len(), 1);

        // The original instant passes without a fire.
        advance(&h, Duration::minutes(10)).await;
        assert!(h.handler.fired().await.is_empty());

        advance(&h, Duration::minutes(10)).await;
        assert_eq!(h.handler.fired().await, vec![key]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fire_order_follows_fire_time() {
        let h = harness();
        let early = JobKey::reminder(Uuid::new_v4());
        let late = JobKey::overdue_check(Uuid::new_v4());
        h.scheduler.schedule(late, h.clock.now() + Duration::minutes(10));
        h.scheduler.schedule(early, h.clock.now() + Duration::minutes(5));

        advance(&h, Duration::minutes(5)).await;
        advance(&h, Duration::minutes(5)).await;
        assert_eq!(h.handler.fired().await, vec![early, late]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_past_instant_fires_immediately() {
        let h = harness();
        let key = JobKey::reminder(Uuid::new_v4());
        h.scheduler.schedule(key, h.clock.now() - Duration::minutes(1));

        advance(&h, Duration::zero()).await;
        assert_eq!(h.handler.fired().await, vec![key]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_dispatch() {
        let h = harness();
        let key = JobKey::reminder(Uuid::new_v4());
        h.scheduler.schedule(key, h.clock.now() + Duration::minutes(5));

        h.scheduler.shutdown();
        assert!(!h.scheduler.is_running());

        advance(&h, Duration::minutes(10)).await;
        assert!(h.handler.fired().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_twice_is_rejected() {
        let h = harness();
        let result = h.scheduler.run(h.handler.clone());
        assert!(matches!(result, Err(SchedulerError::AlreadyRunning)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_two_kinds_per_task_are_independent() {
        let h = harness();
        let task_id = Uuid::new_v4();
        h.scheduler
            .schedule(JobKey::reminder(task_id), h.clock.now() + Duration::minutes(5));
        h.scheduler.schedule(
            JobKey::overdue_check(task_id),
            h.clock.now() + Duration::minutes(5),
        );
        assert_eq!(h.scheduler.pending_len(), 2);

        assert!(h.scheduler.cancel(JobKey::reminder(task_id)));
        assert!(h.scheduler.is_scheduled(JobKey::overdue_check(task_id)));
    }
}
