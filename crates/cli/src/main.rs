use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use otpgate_api::{AuthClient, HttpAuthClient};
use otpgate_tui::{OtpOptions, RunOutcome};
use otpgate_util::settings::config_root;
use otpgate_util::{Settings, expand_tilde, validate_code, validate_email};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Environment variable overriding the interactive-mode log file.
const LOG_PATH_ENV: &str = "OTPGATE_LOG_PATH";
const LOG_FILE_NAME: &str = "otpgate.log";

/// Verify an email address with a one-time code.
///
/// Without a subcommand an interactive code entry is shown.
#[derive(Debug, Parser)]
#[command(name = "otpgate", version, about)]
struct Cli {
    /// Address the code is sent to
    #[arg(long, env = "OTPGATE_EMAIL")]
    email: String,
    /// Number of digits in the code (1-12)
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=12))]
    length: Option<u8>,
    /// Seconds to wait before another code can be requested
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    cooldown: Option<u32>,
    /// Base URL of the authentication API
    #[arg(long)]
    api_base: Option<String>,
    /// Color theme for the interactive entry
    #[arg(long)]
    theme: Option<String>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Request a new code once and exit
    Send,
    /// Check a code once and exit
    Verify {
        /// The code received by email
        #[arg(long)]
        code: String,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.command.is_none());

    let settings = resolve_settings(&cli, Settings::load()?.with_env_overrides())?;
    let email = validate_email(&cli.email)?;
    let client = HttpAuthClient::new(settings.api_base()).with_context(|| format!("cannot use API base '{}'", settings.api_base()))?;
    info!(api_base = settings.api_base(), "otpgate starting");

    match cli.command {
        None => {
            let options = OtpOptions {
                length: settings.code_length,
                cooldown_seconds: settings.cooldown_seconds,
            };
            let outcome = otpgate_tui::run(Arc::new(client), email, options, settings.theme.as_deref()).await?;
            Ok(match outcome {
                RunOutcome::Verified => ExitCode::SUCCESS,
                RunOutcome::Cancelled => ExitCode::FAILURE,
            })
        }
        Some(Command::Send) => {
            send_code(&client, &email).await?;
            Ok(ExitCode::SUCCESS)
        }
        Some(Command::Verify { code }) => {
            let code = validate_code(&code, settings.code_length)?;
            verify_code(&client, &email, &code).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Interactive mode logs to a file so output does not corrupt the screen;
/// one-shot subcommands log to stderr.
fn init_tracing(interactive: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if !interactive {
        let _ = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).try_init();
        return;
    }

    let path = log_path();
    let file = path
        .parent()
        .map_or(Ok(()), fs::create_dir_all)
        .and_then(|_| OpenOptions::new().create(true).append(true).open(&path));
    match file {
        Ok(file) => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init();
        }
        Err(error) => eprintln!("otpgate: logging disabled, cannot open {}: {error}", path.display()),
    }
}

fn log_path() -> PathBuf {
    match std::env::var(LOG_PATH_ENV) {
        Ok(path) if !path.trim().is_empty() => expand_tilde(&path),
        _ => config_root().join(LOG_FILE_NAME),
    }
}

/// Applies command-line flags on top of file and environment settings.
fn resolve_settings(cli: &Cli, mut settings: Settings) -> Result<Settings> {
    if let Some(length) = cli.length {
        settings.code_length = usize::from(length);
    }
    if let Some(cooldown) = cli.cooldown {
        settings.cooldown_seconds = cooldown;
    }
    if let Some(api_base) = cli.api_base.as_ref() {
        settings.api_base = Some(api_base.clone());
    }
    if let Some(theme) = cli.theme.as_ref() {
        settings.theme = Some(theme.clone());
    }
    settings.validate()?;
    Ok(settings)
}

async fn send_code(client: &dyn AuthClient, email: &str) -> Result<()> {
    match client.resend_code(email).await {
        Ok(ack) => {
            println!("{}", ack.message.unwrap_or_else(|| format!("A new code has been sent to {email}")));
            Ok(())
        }
        Err(error) => {
            warn!(%error, "resend failed");
            Err(anyhow!(error.user_message()))
        }
    }
}

async fn verify_code(client: &dyn AuthClient, email: &str, code: &str) -> Result<()> {
    match client.verify_code(email, code).await {
        Ok(ack) => {
            println!("{}", ack.message.unwrap_or_else(|| "Code verified".to_string()));
            Ok(())
        }
        Err(error) => {
            warn!(%error, "verification failed");
            Err(anyhow!(error.user_message()))
        }
    }
}
