use crate::{parse_urls, AppState, Effect, FlowPhase, Msg};

const EMPTY_INPUT_MESSAGE: &str = "Please enter at least one URL";

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::InputChanged(text) => {
            // The input is locked while a submission is in flight or being polled.
            if matches!(state.phase(), FlowPhase::Idle | FlowPhase::Settled) {
                state.set_input(text);
            }
            Vec::new()
        }
        Msg::UrlsSubmitted => {
            let was_polling = match state.phase() {
                FlowPhase::Submitting => return (state, Vec::new()),
                FlowPhase::Polling => true,
                FlowPhase::Idle | FlowPhase::Settled => false,
            };

            let urls = parse_urls(state.input());
            let mut effects = Vec::with_capacity(2);
            // A new submission always retires the previous poller first.
            if was_polling {
                effects.push(Effect::CancelPolling);
            }
            if urls.is_empty() {
                state.reject_input(EMPTY_INPUT_MESSAGE);
                return (state, effects);
            }
            state.begin_submission();
            effects.push(Effect::SubmitUrls { urls });
            effects
        }
        Msg::SubmissionAccepted {
            queued,
            job_ids,
            cached_results,
            message,
        } => {
            if state.phase() != FlowPhase::Submitting {
                return (state, Vec::new());
            }
            if queued && !job_ids.is_empty() {
                state.start_polling(&job_ids, cached_results, message);
                vec![Effect::StartPolling { job_ids }]
            } else {
                state.settle_immediately(cached_results, message);
                Vec::new()
            }
        }
        Msg::SubmissionFailed { message } => {
            if state.phase() == FlowPhase::Submitting {
                state.submission_failed(message);
            }
            Vec::new()
        }
        Msg::JobStatusesReceived(snapshots) => {
            // Late results from a cancelled or finished poller never land.
            if state.phase() != FlowPhase::Polling {
                return (state, Vec::new());
            }
            match state.apply_statuses(&snapshots) {
                Some(_) => vec![Effect::CancelPolling],
                None => Vec::new(),
            }
        }
        Msg::PollFailed { .. } => {
            if state.phase() == FlowPhase::Polling {
                state.record_poll_failure();
            }
            Vec::new()
        }
        Msg::SessionExpired { message } => match state.phase() {
            FlowPhase::Polling => {
                state.session_expired(message);
                vec![Effect::CancelPolling]
            }
            FlowPhase::Submitting => {
                state.session_expired(message);
                Vec::new()
            }
            FlowPhase::Idle | FlowPhase::Settled => Vec::new(),
        },
        Msg::ResetClicked => {
            let effects = if state.phase() == FlowPhase::Polling {
                vec![Effect::CancelPolling]
            } else {
                Vec::new()
            };
            state.reset();
            effects
        }
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}
