use std::time::Duration;

use url::Url;

use crate::{ApiError, FailureKind};

pub const DEFAULT_API_URL: &str = "http://localhost:3000";

/// Backend routes, relative to the configured base URL.
pub mod endpoints {
    pub const SIGNUP: &str = "/api/auth/signup";
    pub const LOGIN: &str = "/api/auth/login";
    pub const REFRESH_TOKEN: &str = "/auth/refresh-token";
    pub const MEDIA_ALL: &str = "/api/media/all";
    pub const SCRAPE_MEDIA: &str = "/api/scrape/scrape-media";
    pub const SCRAPE_STATUS: &str = "/api/scrape/status";
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: Url,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

impl ApiConfig {
    /// Targets a backend on `DEFAULT_API_URL`.
    pub fn local() -> Result<Self, ApiError> {
        Self::from_base_url(DEFAULT_API_URL)
    }

    pub fn from_base_url(raw: &str) -> Result<Self, ApiError> {
        let base_url = Url::parse(raw.trim())
            .map_err(|err| ApiError::new(FailureKind::InvalidUrl, format!("{raw}: {err}")))?;
        if base_url.cannot_be_a_base() || !matches!(base_url.scheme(), "http" | "https") {
            return Err(ApiError::new(
                FailureKind::InvalidUrl,
                format!("{raw}: expected an http(s) base url"),
            ));
        }
        Ok(Self {
            base_url,
            connect_timeout: CONNECT_TIMEOUT,
            request_timeout: REQUEST_TIMEOUT,
        })
    }

    /// Builds `<base><path>/<segments...>?<query>`.
    ///
    /// The path is appended to the base rather than resolved against it, so a
    /// base like `https://host/backend` keeps its prefix.
    pub(crate) fn endpoint(
        &self,
        path: &str,
        segments: &[String],
        query: &[(String, String)],
    ) -> Result<Url, ApiError> {
        let raw = format!("{}{}", self.base_url.as_str().trim_end_matches('/'), path);
        let mut url = Url::parse(&raw)
            .map_err(|err| ApiError::new(FailureKind::InvalidUrl, format!("{raw}: {err}")))?;
        if !segments.is_empty() {
            let mut path_segments = url.path_segments_mut().map_err(|_| {
                ApiError::new(FailureKind::InvalidUrl, format!("{raw}: cannot append path"))
            })?;
            path_segments.pop_if_empty();
            for segment in segments {
                path_segments.push(segment);
            }
        }
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }
}
