//! Plain-text rendering of view models and backend pages.

use std::fmt::Write;

use mediadash_client::{MediaPage, MediaType, User};
use mediadash_core::{AppViewModel, FlowPhase, JobRowView, Outcome};

/// Renders the scrape flow. Returns an empty string when there is nothing to show.
pub fn render_scrape(view: &AppViewModel) -> String {
    let mut out = String::new();
    match view.phase {
        FlowPhase::Idle => {}
        FlowPhase::Submitting => {
            let _ = writeln!(out, "Submitting {} URL(s)...", view.input_url_count);
        }
        FlowPhase::Polling | FlowPhase::Settled => {
            if let Some(message) = &view.submission_message {
                let _ = writeln!(out, "{message}");
            }
            if view.cached_results > 0 {
                let _ = writeln!(out, "Cached results: {}", view.cached_results);
            }
            render_jobs(&mut out, &view.jobs);
            if view.poll_failures > 0 && view.phase == FlowPhase::Polling {
                let _ = writeln!(out, "Status check failed {} time(s), retrying", view.poll_failures);
            }
            if let Some(outcome) = view.outcome {
                let _ = writeln!(out, "{}", outcome.message());
            }
        }
    }
    if let Some(error) = &view.error {
        let _ = writeln!(out, "Error: {error}");
    }
    out
}

fn render_jobs(out: &mut String, jobs: &[JobRowView]) {
    if jobs.is_empty() {
        return;
    }
    let width = jobs.iter().map(|job| job.job_id.len()).max().unwrap_or(0);
    let finished = jobs.iter().filter(|job| job.state.is_terminal()).count();
    let _ = writeln!(out, "Jobs ({finished}/{} finished):", jobs.len());
    for job in jobs {
        let _ = writeln!(out, "  {:<width$}  {}", job.job_id, job.state.label());
    }
}

/// Exit status for a finished scrape flow.
pub fn outcome_succeeded(outcome: Option<Outcome>) -> bool {
    outcome == Some(Outcome::AllCompleted)
}

pub fn render_media_page(media_type: MediaType, page: &MediaPage) -> String {
    let mut out = String::new();
    let title = match media_type {
        MediaType::Image => "Images",
        MediaType::Video => "Videos",
    };
    let _ = writeln!(
        out,
        "{title}: {} total (page {} of {})",
        page.total_for(media_type),
        page.pagination.page,
        page.pagination.total_pages.max(1)
    );
    if page.data.is_empty() {
        let _ = writeln!(out, "  No {media_type}s found");
    }
    for item in &page.data {
        let _ = writeln!(
            out,
            "  {}  {}  {}\n      from {}",
            item.created_date()
                .map(|date| date.to_string())
                .unwrap_or_else(|| item.created_at.clone()),
            item.id,
            item.media_url,
            item.source_url
        );
    }
    if page.pagination.has_more {
        let _ = writeln!(out, "More results: --page {}", page.pagination.page + 1);
    }
    let stats = &page.stats;
    let _ = writeln!(
        out,
        "Sources: {}  Images: {}  Videos: {}",
        stats.total_sources, stats.total_images, stats.total_videos
    );
    out
}

pub fn render_user(user: Option<&User>) -> String {
    match user {
        Some(user) => format!("{} <{}> (id {})", user.user_name, user.email, user.id),
        None => "Not logged in".to_string(),
    }
}
