use crate::view_model::{AppViewModel, JobRowView};

/// Backend job identifiers are opaque strings.
pub type JobId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlowPhase {
    #[default]
    Idle,
    Submitting,
    Polling,
    Settled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Queued,
    Active,
    Completed,
    Failed,
    /// Any status the backend reports that this client does not know about.
    Unknown,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed)
    }

    pub fn label(self) -> &'static str {
        match self {
            JobState::Queued => "queued",
            JobState::Active => "active",
            JobState::Completed => "completed",
            JobState::Failed => "failed",
            JobState::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    AllCompleted,
    SomeFailed,
}

impl Outcome {
    pub fn message(self) -> &'static str {
        match self {
            Outcome::AllCompleted => "All jobs completed successfully!",
            Outcome::SomeFailed => "Some jobs failed to complete",
        }
    }
}

/// One job status as reported by a poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSnapshot {
    pub id: JobId,
    pub state: JobState,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct JobEntry {
    id: JobId,
    state: JobState,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    phase: FlowPhase,
    input: String,
    /// Jobs in submission order.
    jobs: Vec<JobEntry>,
    cached_results: usize,
    submission_message: Option<String>,
    outcome: Option<Outcome>,
    error: Option<String>,
    poll_failures: u32,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> FlowPhase {
        self.phase
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    pub fn view(&self) -> AppViewModel {
        let busy = matches!(self.phase, FlowPhase::Submitting | FlowPhase::Polling);
        AppViewModel {
            phase: self.phase,
            input_url_count: parse_urls(&self.input).len(),
            jobs: self
                .jobs
                .iter()
                .map(|job| JobRowView {
                    job_id: job.id.clone(),
                    state: job.state,
                })
                .collect(),
            cached_results: self.cached_results,
            submission_message: self.submission_message.clone(),
            outcome: self.outcome,
            error: self.error.clone(),
            poll_failures: self.poll_failures,
            can_submit: !busy && !self.input.trim().is_empty(),
            dirty: self.dirty,
        }
    }

    /// Returns whether the state changed since the last call, clearing the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn set_input(&mut self, text: String) {
        if self.input != text {
            self.input = text;
            self.mark_dirty();
        }
    }

    pub(crate) fn input(&self) -> &str {
        &self.input
    }

    /// Clears everything a previous submission left behind and enters `Submitting`.
    pub(crate) fn begin_submission(&mut self) {
        self.jobs.clear();
        self.cached_results = 0;
        self.submission_message = None;
        self.outcome = None;
        self.error = None;
        self.poll_failures = 0;
        self.phase = FlowPhase::Submitting;
        self.mark_dirty();
    }

    pub(crate) fn reject_input(&mut self, message: &str) {
        self.jobs.clear();
        self.outcome = None;
        self.error = Some(message.to_string());
        self.phase = FlowPhase::Idle;
        self.mark_dirty();
    }

    pub(crate) fn submission_failed(&mut self, message: String) {
        self.error = Some(message);
        self.phase = FlowPhase::Idle;
        self.mark_dirty();
    }

    pub(crate) fn start_polling(
        &mut self,
        job_ids: &[JobId],
        cached_results: usize,
        message: Option<String>,
    ) {
        self.jobs = job_ids
            .iter()
            .map(|id| JobEntry {
                id: id.clone(),
                state: JobState::Queued,
            })
            .collect();
        self.cached_results = cached_results;
        self.submission_message = message;
        self.phase = FlowPhase::Polling;
        self.mark_dirty();
    }

    /// Settles a submission that needed no polling (answered from cache).
    pub(crate) fn settle_immediately(&mut self, cached_results: usize, message: Option<String>) {
        self.cached_results = cached_results;
        self.submission_message = message;
        self.settle(Outcome::AllCompleted);
    }

    /// Applies poll results to known jobs. Returns the outcome once every job is terminal.
    pub(crate) fn apply_statuses(&mut self, snapshots: &[JobSnapshot]) -> Option<Outcome> {
        for snapshot in snapshots {
            if let Some(job) = self.jobs.iter_mut().find(|job| job.id == snapshot.id) {
                if job.state != snapshot.state {
                    job.state = snapshot.state;
                    self.dirty = true;
                }
            }
        }

        if !self.jobs.iter().all(|job| job.state.is_terminal()) {
            return None;
        }
        let outcome = if self.jobs.iter().all(|job| job.state == JobState::Completed) {
            Outcome::AllCompleted
        } else {
            Outcome::SomeFailed
        };
        self.settle(outcome);
        Some(outcome)
    }

    pub(crate) fn record_poll_failure(&mut self) {
        self.poll_failures += 1;
        self.mark_dirty();
    }

    /// Abandons the running submission or poll. Jobs stay visible, unsettled.
    pub(crate) fn session_expired(&mut self, message: String) {
        self.phase = FlowPhase::Idle;
        self.outcome = None;
        self.error = Some(message);
        self.mark_dirty();
    }

    pub(crate) fn reset(&mut self) {
        *self = Self {
            dirty: true,
            ..Self::default()
        };
    }

    fn settle(&mut self, outcome: Outcome) {
        self.phase = FlowPhase::Settled;
        self.outcome = Some(outcome);
        match outcome {
            Outcome::AllCompleted => self.input.clear(),
            Outcome::SomeFailed => self.error = Some(outcome.message().to_string()),
        }
        self.mark_dirty();
    }
}

/// Splits raw input into URLs: one per line, trimmed, blank lines dropped.
pub fn parse_urls(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}
