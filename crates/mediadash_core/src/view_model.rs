use crate::{FlowPhase, JobId, JobState, Outcome};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub phase: FlowPhase,
    pub input_url_count: usize,
    pub jobs: Vec<JobRowView>,
    pub cached_results: usize,
    pub submission_message: Option<String>,
    pub outcome: Option<Outcome>,
    pub error: Option<String>,
    pub poll_failures: u32,
    pub can_submit: bool,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRowView {
    pub job_id: JobId,
    pub state: JobState,
}
