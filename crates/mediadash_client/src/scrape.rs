use std::sync::Arc;

use async_trait::async_trait;
use client_logging::client_info;

use crate::config::endpoints;
use crate::http::{ApiRequest, HttpClient};
use crate::poller::JobStatusSource;
use crate::types::ScrapeRequest;
use crate::{ApiError, Job, JobId, JobStatusResponse, ScrapeResponse};

#[derive(Clone)]
pub struct ScrapeService {
    http: Arc<HttpClient>,
}

impl ScrapeService {
    pub fn new(http: Arc<HttpClient>) -> Self {
        Self { http }
    }

    /// Submits URLs for scraping. The backend either answers from cache or queues jobs.
    pub async fn scrape_media(&self, urls: &[String]) -> Result<ScrapeResponse, ApiError> {
        if urls.is_empty() {
            return Err(ApiError::validation("Please enter at least one URL"));
        }
        let request = ApiRequest::post(endpoints::SCRAPE_MEDIA).json(&ScrapeRequest { urls })?;
        let response: ScrapeResponse = self
            .http
            .send_json(request)
            .await
            .map_err(|err| err.with_fallback("Failed to process URLs. Please try again."))?;
        client_info!(
            "Submitted {} url(s): status={} jobs={} cached={}",
            urls.len(),
            response.data.status,
            response.data.job_ids.len(),
            response.data.cached_results.len()
        );
        Ok(response)
    }

    pub async fn check_job_status(&self, job_ids: &[JobId]) -> Result<JobStatusResponse, ApiError> {
        if job_ids.is_empty() {
            return Err(ApiError::validation("No jobs to check"));
        }
        let request = ApiRequest::get(endpoints::SCRAPE_STATUS).segment(job_ids.join(","));
        self.http
            .send_json(request)
            .await
            .map_err(|err| err.with_fallback("Failed to check job status"))
    }
}

#[async_trait]
impl JobStatusSource for ScrapeService {
    async fn check(&self, job_ids: &[JobId]) -> Result<Vec<Job>, ApiError> {
        Ok(self.check_job_status(job_ids).await?.jobs)
    }
}
