//! Job processing service for background tasks.
//!
//! This module provides a bounded in-memory job queue. A job that fails with
//! a server error is retried up to [`MAX_ATTEMPTS`] times, so a step may run
//! more than once; nothing survives a restart.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use agora_common::{AppError, AppResult};
use tokio::sync::{Semaphore, mpsc};
use tracing::{debug, error, info, warn};

use super::activity::{ActivityRecord, ActivityService};
use super::inbox::InboxService;
use super::notification::{ExternalNotificationService, NotificationEvent};

/// Default number of concurrent job workers.
pub const DEFAULT_WORKERS: usize = 4;

/// Default channel buffer size for jobs.
pub const DEFAULT_CAPACITY: usize = 1000;

/// Attempts per job step before it is dropped.
pub const MAX_ATTEMPTS: u32 = 3;

/// Pause before the first retry; doubled on each further attempt.
const RETRY_DELAY: Duration = Duration::from_millis(200);

/// Job types that can be processed.
#[derive(Debug, Clone)]
pub enum Job {
    /// Write a ledger row off the request path.
    RecordActivity(ActivityRecord),
    /// Inbox rows and external fan-out for an event.
    Notify(NotificationEvent),
}

/// Job sender for enqueueing jobs.
#[derive(Clone)]
pub struct JobSender {
    sender: mpsc::Sender<Job>,
}

impl JobSender {
    /// Enqueue a job, waiting while the queue is full.
    pub async fn enqueue(&self, job: Job) -> AppResult<()> {
        self.sender
            .send(job)
            .await
            .map_err(|_| AppError::Queue("job queue is closed".to_string()))
    }

    /// Enqueue a ledger write.
    pub async fn record_activity(&self, record: ActivityRecord) -> AppResult<()> {
        self.enqueue(Job::RecordActivity(record)).await
    }

    /// Enqueue a notification event.
    pub async fn notify(&self, event: NotificationEvent) -> AppResult<()> {
        self.enqueue(Job::Notify(event)).await
    }
}

/// Services needed for job processing.
#[derive(Clone)]
pub struct JobWorkerContext {
    pub activity: ActivityService,
    pub inbox: InboxService,
    pub notifications: ExternalNotificationService,
}

/// Job processing service.
pub struct JobService {
    sender: mpsc::Sender<Job>,
    receiver: Option<mpsc::Receiver<Job>>,
}

impl JobService {
    /// Create a job service with a queue of `capacity` jobs.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        Self {
            sender,
            receiver: Some(receiver),
        }
    }

    /// Get a job sender for enqueueing jobs.
    #[must_use]
    pub fn sender(&self) -> JobSender {
        JobSender {
            sender: self.sender.clone(),
        }
    }

    /// Start the job processor with the given context.
    /// This consumes the receiver and spawns the dispatcher task.
    pub fn start(mut self, context: JobWorkerContext, workers: usize) -> AppResult<()> {
        let receiver = self
            .receiver
            .take()
            .ok_or_else(|| AppError::Queue("job service already started".to_string()))?;
        let context = Arc::new(context);
        let workers = workers.max(1);

        tokio::spawn(async move {
            info!("Job worker starting with {} workers", workers);
            run_job_processor(receiver, context, workers).await;
            info!("Job worker stopped");
        });
        Ok(())
    }

    /// Process every job queued so far on the current task.
    #[cfg(any(test, feature = "test-utils"))]
    pub async fn process_pending(&mut self, context: &JobWorkerContext) -> usize {
        let Some(receiver) = self.receiver.as_mut() else {
            return 0;
        };
        let mut processed = 0;
        while let Ok(job) = receiver.try_recv() {
            process_job(job, context).await;
            processed += 1;
        }
        processed
    }

    /// Remove and return every queued job without running it.
    #[cfg(any(test, feature = "test-utils"))]
    pub fn take_queued(&mut self) -> Vec<Job> {
        let mut jobs = Vec::new();
        if let Some(receiver) = self.receiver.as_mut() {
            while let Ok(job) = receiver.try_recv() {
                jobs.push(job);
            }
        }
        jobs
    }
}

impl Default for JobService {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// Run the job processor.
async fn run_job_processor(
    mut receiver: mpsc::Receiver<Job>,
    context: Arc<JobWorkerContext>,
    workers: usize,
) {
    // Use a semaphore to limit concurrent workers
    let semaphore = Arc::new(Semaphore::new(workers));

    while let Some(job) = receiver.recv().await {
        let Ok(permit) = semaphore.clone().acquire_owned().await else {
            warn!("Job worker semaphore closed");
            break;
        };
        let ctx = context.clone();

        tokio::spawn(async move {
            let _permit = permit;
            process_job(job, &ctx).await;
        });
    }
}

/// Process a single job.
async fn process_job(job: Job, context: &JobWorkerContext) {
    match job {
        Job::RecordActivity(record) => process_record_activity(context, record).await,
        Job::Notify(event) => process_notify(context, event).await,
    }
}

/// Run `step` until it succeeds, fails with a client error or runs out of
/// attempts.
async fn with_retry<T, F, Fut>(step: &str, mut op: F) -> AppResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AppResult<T>>,
{
    let mut attempt = 1;
    let mut delay = RETRY_DELAY;
    loop {
        match op().await {
            Err(e) if attempt < MAX_ATTEMPTS && e.is_server_error() => {
                warn!(step, attempt, error = %e, "Job step failed, retrying");
                tokio::time::sleep(delay).await;
                attempt += 1;
                delay *= 2;
            }
            outcome => return outcome,
        }
    }
}

async fn process_record_activity(context: &JobWorkerContext, record: ActivityRecord) {
    let user_id = record.user_id.clone();
    let key = record.key;
    match with_retry("record_activity", || context.activity.record(record.clone())).await {
        Ok(applied) => {
            debug!(user_id = %user_id, key = %key, applied, "Activity job done");
        }
        Err(e) => {
            error!(user_id = %user_id, key = %key, error = %e, "Failed to record activity");
        }
    }
}

async fn process_notify(context: &JobWorkerContext, event: NotificationEvent) {
    if let Err(e) = with_retry("inbox", || context.inbox.handle(&event)).await {
        error!(event = event.name(), error = %e, "Failed to write inbox notifications");
    }
    if let Err(e) = with_retry("fan_out", || context.notifications.handle(&event)).await {
        error!(event = event.name(), error = %e, "Failed to fan out notification");
    }
}
