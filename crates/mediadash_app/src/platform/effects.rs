use std::sync::Arc;

use client_logging::{client_info, client_warn};
use mediadash_client::{
    ApiClient, ApiError, ChannelPollSink, FailureKind, Job, JobPoller, JobStatus,
    JobStatusSource, PollEvent, PollSettings, ScrapeResponse,
};
use mediadash_core::{Effect, JobSnapshot, JobState, Msg};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Executes core effects against the backend and feeds the results back as messages.
pub struct EffectRunner {
    api: ApiClient,
    settings: PollSettings,
    msg_tx: mpsc::UnboundedSender<Msg>,
    polling: Option<ActivePoll>,
}

struct ActivePoll {
    poller: JobPoller,
    forwarder: JoinHandle<()>,
}

impl ActivePoll {
    fn stop(self) {
        self.poller.cancel();
        self.forwarder.abort();
    }
}

impl EffectRunner {
    pub fn new(api: ApiClient, settings: PollSettings, msg_tx: mpsc::UnboundedSender<Msg>) -> Self {
        Self {
            api,
            settings,
            msg_tx,
            polling: None,
        }
    }

    pub fn enqueue(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::SubmitUrls { urls } => self.submit(urls),
                Effect::StartPolling { job_ids } => {
                    self.stop_polling();
                    client_info!("StartPolling jobs={}", job_ids.len());
                    self.polling = Some(self.start_polling(job_ids));
                }
                Effect::CancelPolling => self.stop_polling(),
            }
        }
    }

    pub fn stop_polling(&mut self) {
        if let Some(active) = self.polling.take() {
            active.stop();
        }
    }

    fn submit(&self, urls: Vec<String>) {
        client_info!("SubmitUrls count={}", urls.len());
        let scrape = self.api.scrape.clone();
        let msg_tx = self.msg_tx.clone();
        tokio::spawn(async move {
            let msg = match scrape.scrape_media(&urls).await {
                Ok(response) => accepted(response),
                Err(err) => {
                    client_warn!("Submission failed: {}", err);
                    failure_msg(err, |message| Msg::SubmissionFailed { message })
                }
            };
            let _ = msg_tx.send(msg);
        });
    }

    fn start_polling(&self, job_ids: Vec<String>) -> ActivePoll {
        let (event_tx, mut event_rx) = mpsc::unbounded_channel();
        let source: Arc<dyn JobStatusSource> = Arc::new(self.api.scrape.clone());
        let poller = JobPoller::start(
            source,
            job_ids,
            self.settings.clone(),
            Arc::new(ChannelPollSink::new(event_tx)),
        );

        let msg_tx = self.msg_tx.clone();
        let forwarder = tokio::spawn(async move {
            while let Some(event) = event_rx.recv().await {
                let msg = match event {
                    PollEvent::Statuses(jobs) => Msg::JobStatusesReceived(snapshots(jobs)),
                    PollEvent::PollFailed(err) => {
                        failure_msg(err, |message| Msg::PollFailed { message })
                    }
                    // The state machine reaches the same verdict from the statuses.
                    PollEvent::Settled(_) => continue,
                };
                if msg_tx.send(msg).is_err() {
                    return;
                }
            }
        });

        ActivePoll { poller, forwarder }
    }
}

impl Drop for EffectRunner {
    fn drop(&mut self) {
        self.stop_polling();
    }
}

fn accepted(response: ScrapeResponse) -> Msg {
    let data = response.data;
    Msg::SubmissionAccepted {
        queued: data.is_queued(),
        cached_results: data.cached_results.len(),
        message: data.message.or(response.message),
        job_ids: data.job_ids,
    }
}

/// A failed refresh ends the flow; any other failure becomes `otherwise`.
fn failure_msg(err: ApiError, otherwise: impl FnOnce(String) -> Msg) -> Msg {
    if err.kind == FailureKind::SessionExpired {
        Msg::SessionExpired {
            message: err.message,
        }
    } else {
        otherwise(err.message)
    }
}

fn snapshots(jobs: Vec<Job>) -> Vec<JobSnapshot> {
    jobs.into_iter()
        .map(|job| JobSnapshot {
            id: job.id,
            state: map_status(job.status),
        })
        .collect()
}

fn map_status(status: JobStatus) -> JobState {
    match status {
        JobStatus::Queued => JobState::Queued,
        JobStatus::Active => JobState::Active,
        JobStatus::Completed => JobState::Completed,
        JobStatus::Failed => JobState::Failed,
        JobStatus::Unknown => JobState::Unknown,
    }
}
