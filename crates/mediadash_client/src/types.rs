use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub type JobId = String;

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub access_token: String,
    pub refresh_token: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_token", &client_logging::redact_token(&self.access_token))
            .field("refresh_token", &client_logging::redact_token(&self.refresh_token))
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub user_name: String,
}

/// Partial user update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserPatch {
    pub email: Option<String>,
    pub user_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginResponse {
    pub user: User,
    pub tokens: Credentials,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SignupRequest<'a> {
    pub email: &'a str,
    pub full_name: &'a str,
    pub password: &'a str,
}

/// Sign-up form as entered by the user, before client-side checks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignupForm {
    pub email: String,
    pub full_name: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SignupResponse {
    /// Only an explicit `true` counts as success.
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RefreshTokenRequest<'a> {
    pub refresh_token: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Image,
    Video,
}

impl MediaType {
    pub fn as_str(self) -> &'static str {
        match self {
            MediaType::Image => "image",
            MediaType::Video => "video",
        }
    }

    /// Page size the backend grid layout expects for this type.
    pub fn page_limit(self) -> u32 {
        match self {
            MediaType::Image => 12,
            MediaType::Video => 9,
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaItem {
    pub id: String,
    pub source_url: String,
    #[serde(rename = "type")]
    pub media_type: MediaType,
    pub media_url: String,
    /// Kept as sent; one odd timestamp must not fail the whole page.
    pub created_at: String,
    pub updated_at: String,
}

impl MediaItem {
    /// UTC calendar date of `created_at`, if it is RFC 3339.
    pub fn created_date(&self) -> Option<NaiveDate> {
        DateTime::parse_from_rfc3339(&self.created_at)
            .ok()
            .map(|at| at.with_timezone(&Utc).date_naive())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total: u64,
    pub page: u32,
    pub total_pages: u32,
    pub has_more: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaStats {
    pub total_sources: u64,
    pub total_images: u64,
    pub total_videos: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct DateRange {
    pub start: Option<String>,
    pub end: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MediaFilters {
    #[serde(rename = "type")]
    pub media_type: Option<String>,
    pub search: Option<String>,
    pub date_range: DateRange,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MediaPage {
    pub data: Vec<MediaItem>,
    pub pagination: Pagination,
    #[serde(default)]
    pub stats: MediaStats,
    #[serde(default)]
    pub filters: MediaFilters,
}

impl MediaPage {
    pub fn total_for(&self, media_type: MediaType) -> u64 {
        match media_type {
            MediaType::Image => self.stats.total_images,
            MediaType::Video => self.stats.total_videos,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct ScrapeRequest<'a> {
    pub urls: &'a [String],
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScrapeResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    pub data: ScrapeData,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeData {
    pub status: String,
    #[serde(default)]
    pub job_ids: Vec<JobId>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub cached_results: Vec<serde_json::Value>,
}

impl ScrapeData {
    /// True when the backend queued jobs that need polling.
    pub fn is_queued(&self) -> bool {
        self.status == "queued"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Active,
    Completed,
    Failed,
    #[serde(other)]
    Unknown,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub status: JobStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct JobStatusResponse {
    pub jobs: Vec<Job>,
}
