use mediadash_core::{update, AppState, Effect, FlowPhase, JobSnapshot, JobState, Msg, Outcome};
use pretty_assertions::assert_eq;

fn init_logging() {
    client_logging::initialize_for_tests();
}

fn polling_state(ids: &[&str]) -> AppState {
    let (state, _) = update(
        AppState::new(),
        Msg::InputChanged("https://one.example.com\nhttps://two.example.com\nhttps://three.example.com".into()),
    );
    let (state, _) = update(state, Msg::UrlsSubmitted);
    let (state, effects) = update(
        state,
        Msg::SubmissionAccepted {
            queued: true,
            job_ids: ids.iter().map(|id| id.to_string()).collect(),
            cached_results: 0,
            message: None,
        },
    );
    assert_eq!(effects.len(), 1);
    state
}

fn statuses(pairs: &[(&str, JobState)]) -> Msg {
    Msg::JobStatusesReceived(
        pairs
            .iter()
            .map(|(id, state)| JobSnapshot {
                id: id.to_string(),
                state: *state,
            })
            .collect(),
    )
}

#[test]
fn settles_with_success_once_every_job_completes() {
    init_logging();
    let state = polling_state(&["a", "b", "c"]);

    let (state, effects) = update(
        state,
        statuses(&[
            ("a", JobState::Active),
            ("b", JobState::Completed),
            ("c", JobState::Queued),
        ]),
    );
    assert!(effects.is_empty());
    assert_eq!(state.phase(), FlowPhase::Polling);

    let (state, effects) = update(
        state,
        statuses(&[
            ("a", JobState::Completed),
            ("b", JobState::Completed),
            ("c", JobState::Completed),
        ]),
    );
    assert_eq!(effects, vec![Effect::CancelPolling]);
    let view = state.view();
    assert_eq!(view.phase, FlowPhase::Settled);
    assert_eq!(view.outcome, Some(Outcome::AllCompleted));
    assert_eq!(view.error, None);
}

#[test]
fn any_failed_job_settles_as_partial_failure() {
    init_logging();
    let state = polling_state(&["a", "b"]);

    let (state, effects) = update(
        state,
        statuses(&[("a", JobState::Completed), ("b", JobState::Failed)]),
    );

    assert_eq!(effects, vec![Effect::CancelPolling]);
    let view = state.view();
    assert_eq!(view.outcome, Some(Outcome::SomeFailed));
    assert_eq!(view.error.as_deref(), Some("Some jobs failed to complete"));
}

#[test]
fn missing_jobs_keep_polling() {
    init_logging();
    let state = polling_state(&["a", "b"]);

    let (state, effects) = update(state, statuses(&[("a", JobState::Completed)]));

    assert!(effects.is_empty());
    assert_eq!(state.phase(), FlowPhase::Polling);
}

#[test]
fn unknown_ids_in_poll_response_are_ignored() {
    init_logging();
    let state = polling_state(&["a"]);

    let (state, _) = update(state, statuses(&[("zzz", JobState::Failed)]));

    let view = state.view();
    assert_eq!(view.jobs.len(), 1);
    assert_eq!(view.jobs[0].state, JobState::Queued);
}

#[test]
fn poll_failures_are_counted_and_polling_continues() {
    init_logging();
    let state = polling_state(&["a"]);

    let (state, effects) = update(
        state,
        Msg::PollFailed {
            message: "network error".into(),
        },
    );

    assert!(effects.is_empty());
    assert_eq!(state.phase(), FlowPhase::Polling);
    assert_eq!(state.view().poll_failures, 1);
}

#[test]
fn statuses_after_reset_never_land() {
    init_logging();
    let state = polling_state(&["a"]);

    let (state, effects) = update(state, Msg::ResetClicked);
    assert_eq!(effects, vec![Effect::CancelPolling]);
    assert_eq!(state.phase(), FlowPhase::Idle);

    let (state, effects) = update(state, statuses(&[("a", JobState::Completed)]));
    assert!(effects.is_empty());
    assert!(state.view().jobs.is_empty());
    assert_eq!(state.outcome(), None);
}

#[test]
fn new_submission_while_polling_cancels_the_old_poller() {
    init_logging();
    let state = polling_state(&["a"]);

    let (state, effects) = update(state, Msg::UrlsSubmitted);

    assert_eq!(effects.first(), Some(&Effect::CancelPolling));
    assert!(matches!(effects.get(1), Some(Effect::SubmitUrls { urls }) if urls.len() == 3));
    assert_eq!(state.phase(), FlowPhase::Submitting);
    assert!(state.view().jobs.is_empty());
}

#[test]
fn statuses_after_settle_are_ignored() {
    init_logging();
    let state = polling_state(&["a"]);
    let (state, _) = update(state, statuses(&[("a", JobState::Failed)]));
    let (state, effects) = update(state, statuses(&[("a", JobState::Completed)]));

    assert!(effects.is_empty());
    assert_eq!(state.outcome(), Some(Outcome::SomeFailed));
}

#[test]
fn expired_session_stops_polling_without_an_outcome() {
    init_logging();
    let state = polling_state(&["a", "b"]);
    let (state, _) = update(state, statuses(&[("a", JobState::Completed)]));

    let (state, effects) = update(
        state,
        Msg::SessionExpired {
            message: "refresh token expired".into(),
        },
    );

    assert_eq!(effects, vec![Effect::CancelPolling]);
    assert_eq!(state.phase(), FlowPhase::Idle);
    assert_eq!(state.outcome(), None);
    let view = state.view();
    assert_eq!(view.error.as_deref(), Some("refresh token expired"));
    assert_eq!(view.jobs.len(), 2);

    let (state, effects) = update(state, statuses(&[("b", JobState::Completed)]));
    assert!(effects.is_empty());
    assert_eq!(state.outcome(), None);
}

#[test]
fn expired_session_during_submission_returns_to_idle() {
    init_logging();
    let (state, _) = update(AppState::new(), Msg::InputChanged("https://one.example.com".into()));
    let (state, _) = update(state, Msg::UrlsSubmitted);

    let (state, effects) = update(
        state,
        Msg::SessionExpired {
            message: "No refresh token available".into(),
        },
    );

    assert!(effects.is_empty());
    assert_eq!(state.phase(), FlowPhase::Idle);
    assert_eq!(state.view().error.as_deref(), Some("No refresh token available"));
}
