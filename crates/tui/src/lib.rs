//! # Otpgate TUI Library
//!
//! Terminal front end for one-time-code verification. It renders a row of
//! single-digit slots with verify and resend controls, enforces the resend
//! cooldown, and talks to the authentication server through an
//! [`otpgate_api::AuthClient`].
//!
//! ## Architecture
//!
//! - `ui::components::otp` holds the pure widget state, the countdown task
//!   handle and the component that maps input to effects.
//! - `cmd` turns effects into spawned collaborator calls.
//! - `ui::runtime` owns the terminal and the event loop.

mod app;
mod cmd;
mod ui;

use std::sync::Arc;

use anyhow::Result;
use otpgate_api::AuthClient;

pub use ui::components::otp::OtpOptions;
pub use ui::runtime::RunOutcome;

/// Runs the interactive OTP entry until the code is verified or the user quits.
///
/// # Errors
///
/// Terminal setup or teardown failures. Verification and resend failures are
/// shown in the UI and never end the session.
pub async fn run(
    client: Arc<dyn AuthClient>,
    email: String,
    options: OtpOptions,
    preferred_theme: Option<&str>,
) -> Result<RunOutcome> {
    ui::runtime::run_app(client, email, options, preferred_theme).await
}
