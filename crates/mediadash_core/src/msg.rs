#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User edited the URL input box.
    InputChanged(String),
    /// User submitted the current URL input for scraping.
    UrlsSubmitted,
    /// Backend accepted the submission.
    SubmissionAccepted {
        /// True when the backend queued jobs rather than answering from cache.
        queued: bool,
        job_ids: Vec<crate::JobId>,
        cached_results: usize,
        message: Option<String>,
    },
    /// Backend (or the client) rejected the submission.
    SubmissionFailed { message: String },
    /// A poll tick returned job statuses.
    JobStatusesReceived(Vec<crate::JobSnapshot>),
    /// A poll tick failed; polling continues.
    PollFailed { message: String },
    /// The stored session is gone; the user has to log in again.
    SessionExpired { message: String },
    /// User clicked "Scrape more" / reset.
    ResetClicked,
    /// Fallback for placeholder wiring.
    NoOp,
}
