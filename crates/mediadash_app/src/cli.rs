//! Command-line surface of the `mediadash` binary.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use mediadash_client::{MediaType, DEFAULT_API_URL};

#[derive(Debug, Parser)]
#[command(name = "mediadash", version, about = "Media scraping dashboard client")]
pub struct Cli {
    /// Base URL of the mediadash backend.
    #[arg(long, env = "MEDIADASH_API_URL", default_value = DEFAULT_API_URL, global = true)]
    pub api_url: String,

    /// Where the session (tokens and user) is kept between runs.
    #[arg(
        long,
        env = "MEDIADASH_SESSION_FILE",
        default_value = "./.mediadash_session.ron",
        global = true
    )]
    pub session_file: PathBuf,

    /// Also write logs to this file.
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create an account.
    Signup(SignupArgs),
    /// Sign in and store the session.
    Login(LoginArgs),
    /// Forget the stored session.
    Logout,
    /// Show the signed-in user.
    Whoami,
    /// List scraped media.
    Media(MediaArgs),
    /// Submit URLs for scraping and follow the jobs until they finish.
    Scrape(ScrapeArgs),
}

#[derive(Debug, Args)]
pub struct SignupArgs {
    #[arg(long)]
    pub email: String,
    #[arg(long)]
    pub full_name: String,
    #[arg(long)]
    pub password: String,
    #[arg(long)]
    pub confirm_password: String,
}

#[derive(Debug, Args)]
pub struct LoginArgs {
    #[arg(long)]
    pub email: String,
    #[arg(long)]
    pub password: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MediaKind {
    Image,
    Video,
}

impl From<MediaKind> for MediaType {
    fn from(kind: MediaKind) -> Self {
        match kind {
            MediaKind::Image => MediaType::Image,
            MediaKind::Video => MediaType::Video,
        }
    }
}

#[derive(Debug, Args)]
pub struct MediaArgs {
    #[arg(long = "type", value_enum, default_value_t = MediaKind::Image)]
    pub media_type: MediaKind,
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub page: u32,
    #[arg(long)]
    pub search: Option<String>,
}

#[derive(Debug, Args)]
pub struct ScrapeArgs {
    /// URLs to scrape.
    pub urls: Vec<String>,
    /// Read more URLs from a file, one per line.
    #[arg(long)]
    pub file: Option<PathBuf>,
}
