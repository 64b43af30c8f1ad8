use crate::JobId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Send the batch of URLs to the scrape endpoint.
    SubmitUrls { urls: Vec<String> },
    /// Start the status poller for the given jobs.
    StartPolling { job_ids: Vec<JobId> },
    /// Stop any active poller. Idempotent.
    CancelPolling,
}
