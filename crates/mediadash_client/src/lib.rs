//! Mediadash client: session storage, authenticated HTTP and the backend services.
mod auth;
mod client;
mod config;
mod error;
mod http;
mod media;
mod poller;
mod refresh;
mod scrape;
mod storage;
mod token_store;
mod types;

pub use auth::AuthService;
pub use client::ApiClient;
pub use config::{endpoints, ApiConfig, DEFAULT_API_URL};
pub use error::{ApiError, FailureKind};
pub use http::{ApiRequest, HttpClient, LogSessionObserver, SessionObserver};
pub use media::{MediaQuery, MediaService};
pub use poller::{
    settled_outcome, ChannelPollSink, JobPoller, JobStatusSource, PollEvent, PollOutcome,
    PollSettings, PollSink,
};
pub use scrape::ScrapeService;
pub use storage::{FileStorage, MemoryStorage, Storage, StorageError};
pub use token_store::{StoredCredentials, TokenStore, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, USER_KEY};
pub use types::{
    Credentials, DateRange, Job, JobId, JobStatus, JobStatusResponse, LoginResponse, MediaFilters,
    MediaItem, MediaPage, MediaStats, MediaType, Pagination, ScrapeData, ScrapeResponse,
    SignupForm, SignupResponse, User, UserPatch,
};
