use std::fs;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use client_logging::client_info;
use mediadash_client::{
    ApiClient, ApiConfig, FileStorage, HttpClient, MediaQuery, MediaType, PollSettings,
    SignupForm, TokenStore,
};
use mediadash_core::{update, AppState, FlowPhase, Msg};
use tokio::sync::mpsc;

use super::effects::EffectRunner;
use super::render;
use super::session::ExpiryNotice;
use crate::cli::{Cli, Command, LoginArgs, MediaArgs, ScrapeArgs, SignupArgs};

/// Exit status after Ctrl-C, as shells report for SIGINT.
const INTERRUPTED: u8 = 130;

pub async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let api = connect(&cli)?;
    match cli.command {
        Command::Signup(args) => signup(&api, args).await,
        Command::Login(args) => login(&api, args).await,
        Command::Logout => {
            api.auth.logout()?;
            println!("Logged out.");
            Ok(ExitCode::SUCCESS)
        }
        Command::Whoami => {
            println!("{}", render::render_user(api.auth.current_user().as_ref()));
            Ok(ExitCode::SUCCESS)
        }
        Command::Media(args) => media(&api, args).await,
        Command::Scrape(args) => scrape(&api, args).await,
    }
}

fn connect(cli: &Cli) -> anyhow::Result<ApiClient> {
    let config = ApiConfig::from_base_url(&cli.api_url)
        .with_context(|| format!("invalid --api-url {:?}", cli.api_url))?;
    let storage = FileStorage::open(&cli.session_file);
    client_info!(
        "Using backend {} with session file {:?}",
        config.base_url,
        storage.path()
    );
    let tokens = TokenStore::new(Arc::new(storage));
    let http = HttpClient::new(config, tokens)?
        .with_session_observer(Arc::new(ExpiryNotice::default()));
    Ok(ApiClient::new(http))
}

async fn signup(api: &ApiClient, args: SignupArgs) -> anyhow::Result<ExitCode> {
    let form = SignupForm {
        email: args.email,
        full_name: args.full_name,
        password: args.password,
        confirm_password: args.confirm_password,
    };
    let response = api.auth.signup_checked(&form).await?;
    match response.message {
        Some(message) => println!("{message}"),
        None => println!("Account created."),
    }
    println!("Run `mediadash login` to sign in.");
    Ok(ExitCode::SUCCESS)
}

async fn login(api: &ApiClient, args: LoginArgs) -> anyhow::Result<ExitCode> {
    let response = api.auth.login(args.email.trim(), &args.password).await?;
    println!("Logged in as {}", render::render_user(Some(&response.user)));
    Ok(ExitCode::SUCCESS)
}

async fn media(api: &ApiClient, args: MediaArgs) -> anyhow::Result<ExitCode> {
    let media_type = MediaType::from(args.media_type);
    let mut query = MediaQuery::new(media_type).page(args.page);
    if let Some(search) = args.search {
        query = query.search(search);
    }
    let page = api.media.get_all(&query).await?;
    print!("{}", render::render_media_page(media_type, &page));
    Ok(ExitCode::SUCCESS)
}

async fn scrape(api: &ApiClient, args: ScrapeArgs) -> anyhow::Result<ExitCode> {
    let mut input = args.urls.join("\n");
    if let Some(path) = &args.file {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read URL file {}", path.display()))?;
        input.push('\n');
        input.push_str(&text);
    }

    match drive_scrape(api, input, PollSettings::default()).await {
        ScrapeEnd::Finished(state) if render::outcome_succeeded(state.outcome()) => {
            Ok(ExitCode::SUCCESS)
        }
        ScrapeEnd::Finished(_) => Ok(ExitCode::FAILURE),
        ScrapeEnd::Interrupted => {
            eprintln!("Cancelled.");
            Ok(ExitCode::from(INTERRUPTED))
        }
    }
}

enum ScrapeEnd {
    /// The flow left `Submitting`/`Polling` on its own.
    Finished(AppState),
    Interrupted,
}

/// Submits `input` and pumps messages until the flow settles, fails or the
/// user presses Ctrl-C. Polling is stopped on every exit path.
async fn drive_scrape(api: &ApiClient, input: String, settings: PollSettings) -> ScrapeEnd {
    let (msg_tx, mut msg_rx) = mpsc::unbounded_channel();
    let mut runner = EffectRunner::new(api.clone(), settings, msg_tx);
    let mut state = AppState::new();
    state = step(state, Msg::InputChanged(input), &mut runner);
    state = step(state, Msg::UrlsSubmitted, &mut runner);

    while matches!(state.phase(), FlowPhase::Submitting | FlowPhase::Polling) {
        tokio::select! {
            msg = msg_rx.recv() => match msg {
                Some(msg) => state = step(state, msg, &mut runner),
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                step(state, Msg::ResetClicked, &mut runner);
                runner.stop_polling();
                return ScrapeEnd::Interrupted;
            }
        }
    }
    runner.stop_polling();
    ScrapeEnd::Finished(state)
}

/// Runs one message through the state machine, executes its effects and
/// prints the view when it changed.
fn step(state: AppState, msg: Msg, runner: &mut EffectRunner) -> AppState {
    let (mut state, effects) = update(state, msg);
    runner.enqueue(effects);
    if state.consume_dirty() {
        print!("{}", render::render_scrape(&state.view()));
    }
    state
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use mediadash_client::{Credentials, User};
    use serde_json::json;
    use wiremock::matchers::{method, path, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn signed_in_api(server: &MockServer) -> ApiClient {
        let tokens = TokenStore::in_memory();
        tokens
            .set_session(
                &Credentials {
                    access_token: "stale".into(),
                    refresh_token: "r1".into(),
                },
                &User {
                    id: "u1".into(),
                    email: "ada@example.com".into(),
                    user_name: "ada".into(),
                },
            )
            .unwrap();
        let config = ApiConfig::from_base_url(&server.uri()).unwrap();
        ApiClient::new(HttpClient::new(config, tokens).unwrap())
    }

    #[tokio::test]
    async fn expired_session_while_polling_ends_the_scrape() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/scrape/scrape-media"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "message": "ok",
                "data": { "status": "queued", "jobIds": ["a"], "cachedResults": [] }
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path_regex("^/api/scrape/status/.*$"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/auth/refresh-token"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(json!({ "message": "refresh token expired" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let api = signed_in_api(&server);
        let settings = PollSettings {
            interval: Duration::from_millis(50),
        };
        let end = tokio::time::timeout(
            Duration::from_secs(5),
            drive_scrape(&api, "https://x.example.com".into(), settings),
        )
        .await
        .expect("scrape ends once the session is gone");

        let ScrapeEnd::Finished(state) = end else {
            panic!("scrape was not interrupted");
        };
        assert_eq!(state.phase(), FlowPhase::Idle);
        assert!(!render::outcome_succeeded(state.outcome()));
        assert_eq!(state.view().error.as_deref(), Some("refresh token expired"));
        assert!(!api.auth.is_authenticated());

        // No tick after the expiry reached the backend.
        tokio::time::sleep(Duration::from_millis(100)).await;
        let status_calls = server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .filter(|request| request.url.path().starts_with("/api/scrape/status/"))
            .count();
        assert_eq!(status_calls, 1);
    }
}
