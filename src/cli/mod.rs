pub mod commands;
pub mod context;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::CONFIG_FILENAME;

#[derive(Parser)]
#[command(name = "vitals2coach")]
#[command(about = "Collect health metrics and submit them to your coach")]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Args)]
pub struct GlobalArgs {
    /// Path to the config file
    #[arg(long, global = true, default_value = CONFIG_FILENAME)]
    pub config: PathBuf,

    /// Override the API base URL
    #[arg(long, global = true, env = "VITALS2COACH_API_URL")]
    pub api_url: Option<String>,

    /// Override the session file location
    #[arg(long, global = true, env = "VITALS2COACH_SESSION")]
    pub session: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub log_json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a config file in the current directory
    Init(InitArgs),
    /// Log in and store the session
    Login(LoginArgs),
    /// Create a new account
    Register(RegisterArgs),
    /// Request a password reset email
    ResetPassword(ResetPasswordArgs),
    /// Forget the stored session
    Logout,
    /// Show the current session
    Status,
    /// Collect a metric snapshot and submit it
    Sync(SyncArgs),
    /// Send a message to the coach
    Coach(CoachArgs),
}

#[derive(clap::Args)]
pub struct InitArgs {
    /// Samples export to use for sync
    #[arg(long)]
    pub samples: Option<PathBuf>,

    /// Overwrite an existing config file
    #[arg(long)]
    pub force: bool,
}

#[derive(clap::Args)]
pub struct LoginArgs {
    /// Account email
    pub email: String,

    #[arg(long, env = "VITALS2COACH_PASSWORD", hide_env_values = true)]
    pub password: String,
}

#[derive(clap::Args)]
pub struct RegisterArgs {
    #[arg(long)]
    pub fullname: String,

    #[arg(long)]
    pub phone: String,

    #[arg(long)]
    pub email: String,

    #[arg(long, env = "VITALS2COACH_PASSWORD", hide_env_values = true)]
    pub password: String,

    #[arg(long)]
    pub confirm_password: String,
}

#[derive(clap::Args)]
pub struct ResetPasswordArgs {
    /// Account email
    pub email: String,
}

#[derive(clap::Args)]
pub struct SyncArgs {
    /// Samples export (JSON); defaults to samples_path from the config
    #[arg(long)]
    pub samples: Option<PathBuf>,
}

#[derive(clap::Args)]
pub struct CoachArgs {
    pub message: String,
}
