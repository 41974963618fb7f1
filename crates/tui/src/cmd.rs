//! # Command Execution Layer
//!
//! This module translates application effects (`Effect`) into imperative
//! commands (`Cmd`) and executes them. It is the boundary where the pure
//! widget state meets side effects:
//! - Calling the authentication collaborator (verify / resend)
//! - Starting and stopping the resend countdown task
//!
//! ## Design
//! - [`Cmd`] is the effectful command type.
//! - [`from_effects`] translates state-driven [`Effect`]s into [`Cmd`]s.
//! - [`run_cmds`] executes them; collaborator calls are spawned and their
//!   join handles returned so the runtime can await them alongside input.
//!
//! This follows a **functional core, imperative shell** pattern: state
//! updates are pure, commands handle side effects.

use std::sync::Arc;

use otpgate_api::AuthClient;
use otpgate_types::{Effect, ExecOutcome, WidgetInstanceId};
use otpgate_util::redact_code;
use tokio::task::{JoinHandle, spawn};
use tracing::{debug, warn};

use crate::app::App;

/// Side-effectful commands executed outside of pure state updates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cmd {
    /// Submit `code` for the widget `instance`.
    VerifyCode { instance: WidgetInstanceId, code: String },
    /// Ask for a new code on behalf of the widget `instance`.
    ResendCode { instance: WidgetInstanceId },
    /// (Re)start the once-per-second countdown.
    StartCountdown { instance: WidgetInstanceId, seconds: u32 },
    StopCountdown,
}

/// Convert application [`Effect`]s into [`Cmd`]s.
///
/// `Quit` has no command counterpart; the runtime extracts it before
/// calling this function and it is dropped here otherwise.
pub fn from_effects(effects: Vec<Effect>) -> Vec<Cmd> {
    effects
        .into_iter()
        .filter_map(|effect| match effect {
            Effect::VerifyRequested { instance, code } => Some(Cmd::VerifyCode { instance, code }),
            Effect::ResendRequested { instance } => Some(Cmd::ResendCode { instance }),
            Effect::StartCountdown { instance, seconds } => Some(Cmd::StartCountdown { instance, seconds }),
            Effect::StopCountdown => Some(Cmd::StopCountdown),
            Effect::Quit => None,
        })
        .collect()
}

/// Execute commands. Collaborator calls are spawned onto the runtime and
/// returned as pending handles; countdown commands take effect immediately.
pub fn run_cmds(app: &mut App, commands: Vec<Cmd>) -> Vec<JoinHandle<ExecOutcome>> {
    let mut pending = Vec::new();
    for command in commands {
        match command {
            Cmd::VerifyCode { instance, code } => {
                pending.push(spawn(exec_verify(app.ctx.client.clone(), app.ctx.email.clone(), instance, code)));
            }
            Cmd::ResendCode { instance } => {
                pending.push(spawn(exec_resend(app.ctx.client.clone(), app.ctx.email.clone(), instance)));
            }
            Cmd::StartCountdown { instance, seconds } => {
                let sender = app.msg_sender();
                app.countdown.start(instance, seconds, sender);
            }
            Cmd::StopCountdown => app.countdown.cancel(),
        }
    }
    pending
}

/// Convenience wrapper: [`from_effects`] followed by [`run_cmds`].
pub fn run_from_effects(app: &mut App, effects: Vec<Effect>) -> Vec<JoinHandle<ExecOutcome>> {
    let commands = from_effects(effects);
    run_cmds(app, commands)
}

async fn exec_verify(client: Arc<dyn AuthClient>, email: String, instance: WidgetInstanceId, code: String) -> ExecOutcome {
    debug!(%instance, code = %redact_code(&code), "verify call started");
    let result = client.verify_code(&email, &code).await.map_err(|error| {
        warn!(%instance, %error, "verify call failed");
        error.user_message()
    });
    ExecOutcome::Verify { instance, result }
}

async fn exec_resend(client: Arc<dyn AuthClient>, email: String, instance: WidgetInstanceId) -> ExecOutcome {
    debug!(%instance, "resend call started");
    let result = client.resend_code(&email).await.map_err(|error| {
        warn!(%instance, %error, "resend call failed");
        error.user_message()
    });
    ExecOutcome::Resend { instance, result }
}
