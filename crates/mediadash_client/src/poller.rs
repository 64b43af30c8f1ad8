//! Interval polling of scrape job statuses.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use client_logging::{client_debug, client_info, client_warn};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::{ApiError, Job, JobId, JobStatus};

#[derive(Debug, Clone)]
pub struct PollSettings {
    pub interval: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
        }
    }
}

#[async_trait]
pub trait JobStatusSource: Send + Sync {
    async fn check(&self, job_ids: &[JobId]) -> Result<Vec<Job>, ApiError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    AllCompleted,
    SomeFailed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PollEvent {
    Statuses(Vec<Job>),
    PollFailed(ApiError),
    /// Last event of a poller that ran to completion.
    Settled(PollOutcome),
}

pub trait PollSink: Send + Sync {
    fn emit(&self, event: PollEvent);
}

pub struct ChannelPollSink {
    tx: mpsc::UnboundedSender<PollEvent>,
}

impl ChannelPollSink {
    pub fn new(tx: mpsc::UnboundedSender<PollEvent>) -> Self {
        Self { tx }
    }
}

impl PollSink for ChannelPollSink {
    fn emit(&self, event: PollEvent) {
        let _ = self.tx.send(event);
    }
}

/// `Some` once every submitted job reports a terminal status.
/// Jobs missing from the response are still outstanding.
pub fn settled_outcome(job_ids: &[JobId], jobs: &[Job]) -> Option<PollOutcome> {
    let mut any_failed = false;
    for id in job_ids {
        let status = jobs.iter().find(|job| &job.id == id)?.status;
        match status {
            JobStatus::Completed => {}
            JobStatus::Failed => any_failed = true,
            JobStatus::Queued | JobStatus::Active | JobStatus::Unknown => return None,
        }
    }
    Some(if any_failed {
        PollOutcome::SomeFailed
    } else {
        PollOutcome::AllCompleted
    })
}

/// Guards the sink so that nothing is emitted once `close` has returned.
struct Gate {
    open: Mutex<bool>,
    sink: Arc<dyn PollSink>,
}

impl Gate {
    fn emit(&self, event: PollEvent) -> bool {
        let open = self.open.lock().unwrap_or_else(PoisonError::into_inner);
        if *open {
            self.sink.emit(event);
        }
        *open
    }

    fn close(&self) {
        *self.open.lock().unwrap_or_else(PoisonError::into_inner) = false;
    }
}

/// Handle to a running poll loop.
///
/// The first poll happens one interval after start. Polls never overlap: a
/// tick that comes due while a poll is outstanding is delayed, not queued.
/// Cancelling (explicitly or by dropping the handle) stops the timer at once
/// and abandons any poll in flight; its result is never emitted.
pub struct JobPoller {
    cancel: CancellationToken,
    gate: Arc<Gate>,
    task: Option<JoinHandle<()>>,
}

impl JobPoller {
    /// Spawns the poll loop on the current tokio runtime.
    pub fn start(
        source: Arc<dyn JobStatusSource>,
        job_ids: Vec<JobId>,
        settings: PollSettings,
        sink: Arc<dyn PollSink>,
    ) -> Self {
        let cancel = CancellationToken::new();
        let gate = Arc::new(Gate {
            open: Mutex::new(true),
            sink,
        });
        client_info!(
            "Polling {} job(s) every {:?}",
            job_ids.len(),
            settings.interval
        );
        let task = tokio::spawn(run_poll_loop(
            source,
            job_ids,
            settings,
            gate.clone(),
            cancel.clone(),
        ));
        Self {
            cancel,
            gate,
            task: Some(task),
        }
    }

    pub fn cancel(&self) {
        if !self.cancel.is_cancelled() {
            client_debug!("Job poller cancelled");
        }
        self.gate.close();
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Waits until the loop exits, either settled or cancelled.
    pub async fn wait(mut self) {
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for JobPoller {
    fn drop(&mut self) {
        self.gate.close();
        self.cancel.cancel();
    }
}

async fn run_poll_loop(
    source: Arc<dyn JobStatusSource>,
    job_ids: Vec<JobId>,
    settings: PollSettings,
    gate: Arc<Gate>,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval_at(Instant::now() + settings.interval, settings.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut tick: u64 = 0;

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            _ = ticker.tick() => {}
        }
        tick += 1;
        client_debug!("Poll tick {} for {} job(s)", tick, job_ids.len());

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            result = source.check(&job_ids) => result,
        };

        match result {
            Ok(jobs) => {
                let outcome = settled_outcome(&job_ids, &jobs);
                if !gate.emit(PollEvent::Statuses(jobs)) {
                    return;
                }
                if let Some(outcome) = outcome {
                    client_info!("All jobs finished after {} poll(s): {:?}", tick, outcome);
                    gate.emit(PollEvent::Settled(outcome));
                    return;
                }
            }
            Err(err) => {
                client_warn!("Polling error on tick {}: {}", tick, err);
                if !gate.emit(PollEvent::PollFailed(err)) {
                    return;
                }
            }
        }
    }
}
