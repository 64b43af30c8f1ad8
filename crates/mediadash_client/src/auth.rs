use std::sync::Arc;

use client_logging::client_info;

use crate::config::endpoints;
use crate::http::{ApiRequest, HttpClient};
use crate::types::{LoginRequest, SignupRequest};
use crate::{ApiError, FailureKind, LoginResponse, SignupForm, SignupResponse, User, UserPatch};

const LOGIN_FAILED: &str = "Login failed";
const REGISTRATION_FAILED: &str = "Registration failed";

#[derive(Clone)]
pub struct AuthService {
    http: Arc<HttpClient>,
}

impl AuthService {
    pub fn new(http: Arc<HttpClient>) -> Self {
        Self { http }
    }

    /// Registers a new account. Only a body with `success: true` counts as success.
    pub async fn signup(
        &self,
        email: &str,
        full_name: &str,
        password: &str,
    ) -> Result<SignupResponse, ApiError> {
        let request = ApiRequest::post(endpoints::SIGNUP)
            .json(&SignupRequest {
                email,
                full_name,
                password,
            })?
            // A 401 is the backend refusing the signup; refreshing cannot fix that.
            .without_refresh();
        let response: SignupResponse = self
            .http
            .send_json(request)
            .await
            .map_err(|err| err.with_fallback(REGISTRATION_FAILED))?;

        if response.success != Some(true) {
            let message = response
                .message
                .clone()
                .filter(|message| !message.trim().is_empty());
            return Err(match message {
                Some(message) => ApiError::from_backend(FailureKind::Backend, message),
                None => ApiError::new(FailureKind::Backend, REGISTRATION_FAILED),
            });
        }
        client_info!("Registered account for {}", email);
        Ok(response)
    }

    /// Checks the form locally, then registers.
    pub async fn signup_checked(&self, form: &SignupForm) -> Result<SignupResponse, ApiError> {
        validate_signup(form)?;
        self.signup(form.email.trim(), form.full_name.trim(), &form.password)
            .await
    }

    /// Logs in and stores the returned tokens and user.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let request = ApiRequest::post(endpoints::LOGIN)
            .json(&LoginRequest { email, password })?
            // A 401 here means wrong credentials; refreshing cannot fix that.
            .without_refresh();
        let response: LoginResponse = self
            .http
            .send_json(request)
            .await
            .map_err(|err| err.with_fallback(LOGIN_FAILED))?;

        self.http
            .tokens()
            .set_session(&response.tokens, &response.user)?;
        client_info!("Logged in as {}", response.user.user_name);
        Ok(response)
    }

    /// Forgets the local session. The backend is not contacted.
    pub fn logout(&self) -> Result<(), ApiError> {
        self.http.tokens().clear()?;
        client_info!("Logged out");
        Ok(())
    }

    pub fn is_authenticated(&self) -> bool {
        let tokens = self.http.tokens();
        tokens.access_token().is_some() && tokens.user().is_some()
    }

    pub fn current_user(&self) -> Option<User> {
        self.http.tokens().user()
    }

    pub fn update_user(&self, patch: UserPatch) -> Result<Option<User>, ApiError> {
        Ok(self.http.tokens().update_user(patch)?)
    }
}

fn validate_signup(form: &SignupForm) -> Result<(), ApiError> {
    if form.email.trim().is_empty() {
        return Err(ApiError::validation("Email is required"));
    }
    if form.full_name.trim().is_empty() {
        return Err(ApiError::validation("Full name is required"));
    }
    if form.password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }
    if form.password != form.confirm_password {
        return Err(ApiError::validation("Passwords do not match"));
    }
    Ok(())
}
