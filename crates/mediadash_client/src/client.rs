use std::sync::Arc;

use crate::{AuthService, HttpClient, MediaService, ScrapeService};

/// All backend services sharing one [`HttpClient`], and with it one refresh coordinator.
#[derive(Clone)]
pub struct ApiClient {
    pub auth: AuthService,
    pub media: MediaService,
    pub scrape: ScrapeService,
    http: Arc<HttpClient>,
}

impl ApiClient {
    pub fn new(http: HttpClient) -> Self {
        let http = Arc::new(http);
        Self {
            auth: AuthService::new(http.clone()),
            media: MediaService::new(http.clone()),
            scrape: ScrapeService::new(http.clone()),
            http,
        }
    }

    pub fn http(&self) -> &Arc<HttpClient> {
        &self.http
    }
}
