use std::sync::Arc;

use client_logging::client_debug;

use crate::config::endpoints;
use crate::http::{ApiRequest, HttpClient};
use crate::{ApiError, MediaPage, MediaType};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaQuery {
    pub media_type: MediaType,
    pub page: u32,
    /// Blank searches are sent as no search at all.
    pub search: Option<String>,
}

impl MediaQuery {
    pub fn new(media_type: MediaType) -> Self {
        Self {
            media_type,
            page: 1,
            search: None,
        }
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    pub fn search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn limit(&self) -> u32 {
        self.media_type.page_limit()
    }

    fn search_term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
    }

    pub(crate) fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("type".to_string(), self.media_type.as_str().to_string()),
            ("page".to_string(), self.page.to_string()),
            ("limit".to_string(), self.limit().to_string()),
        ];
        if let Some(term) = self.search_term() {
            pairs.push(("search".to_string(), term.to_string()));
        }
        pairs
    }
}

#[derive(Clone)]
pub struct MediaService {
    http: Arc<HttpClient>,
}

impl MediaService {
    pub fn new(http: Arc<HttpClient>) -> Self {
        Self { http }
    }

    pub async fn get_all(&self, query: &MediaQuery) -> Result<MediaPage, ApiError> {
        let request = query
            .to_pairs()
            .into_iter()
            .fold(ApiRequest::get(endpoints::MEDIA_ALL), |request, (key, value)| {
                request.query(key, value)
            });
        let page: MediaPage = self
            .http
            .send_json(request)
            .await
            .map_err(|err| err.with_fallback(&format!("Failed to fetch {}s", query.media_type)))?;
        client_debug!(
            "Fetched {} {}(s), page {}/{}",
            page.data.len(),
            query.media_type,
            page.pagination.page,
            page.pagination.total_pages
        );
        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn as_query_string(query: &MediaQuery) -> String {
        query
            .to_pairs()
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join("&")
    }

    #[test]
    fn image_query_uses_grid_limit_and_omits_empty_search() {
        let query = MediaQuery::new(MediaType::Image).page(2).search("");
        assert_eq!(as_query_string(&query), "type=image&page=2&limit=12");
    }

    #[test]
    fn video_query_includes_trimmed_search() {
        let query = MediaQuery::new(MediaType::Video).search("  cats ");
        assert_eq!(as_query_string(&query), "type=video&page=1&limit=9&search=cats");
    }

    #[test]
    fn whitespace_search_counts_as_absent() {
        let query = MediaQuery::new(MediaType::Video).search("   ");
        assert!(!as_query_string(&query).contains("search"));
    }
}
