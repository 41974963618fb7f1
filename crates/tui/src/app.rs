//! Application state for the otpgate TUI.
//!
//! `App` is the central state container: the shared context (theme,
//! collaborator, email), the OTP widget state, notifications, the focus
//! graph and the resend countdown handle.

use std::rc::Rc;
use std::sync::Arc;

use otpgate_api::AuthClient;
use otpgate_types::Msg;
use rat_focus::{Focus, FocusBuilder};
use tokio::sync::mpsc::UnboundedSender;

use crate::ui::components::otp::{OtpEntryState, OtpOptions, ResendCountdown, VerificationState};
use crate::ui::components::toast::ToastState;
use crate::ui::theme::Theme;

/// Cross-cutting shared context owned by the App.
///
/// Holds runtime-wide objects so components do not have to thread them
/// through every call.
pub struct SharedCtx {
    /// Active color theme
    pub theme: Box<dyn Theme>,
    /// Authentication collaborator used for verify/resend calls
    pub client: Arc<dyn AuthClient>,
    /// Address the code was sent to; display-only, forwarded to the client
    pub email: String,
}

pub struct App {
    /// Shared, cross-cutting context (theme, client, email)
    pub ctx: SharedCtx,
    /// The mounted OTP entry widget
    pub otp: OtpEntryState,
    /// Transient notifications
    pub toasts: ToastState,
    /// Focus graph, rebuilt before every render
    pub focus: Rc<Focus>,
    /// Running resend countdown, if any
    pub countdown: ResendCountdown,
    /// Animation frame for busy indicators
    pub throbber_idx: usize,
    msg_sender: UnboundedSender<Msg>,
}

impl App {
    pub fn new(ctx: SharedCtx, options: OtpOptions, msg_sender: UnboundedSender<Msg>) -> Self {
        let otp = OtpEntryState::new(ctx.email.clone(), options);
        let focus = Rc::new(FocusBuilder::build_for(&otp));
        focus.focus(otp.cursor_flag());
        Self {
            ctx,
            otp,
            toasts: ToastState::default(),
            focus,
            countdown: ResendCountdown::new(),
            throbber_idx: 0,
            msg_sender,
        }
    }

    /// Sender used by background tasks to post messages back to the loop.
    pub fn msg_sender(&self) -> UnboundedSender<Msg> {
        self.msg_sender.clone()
    }

    /// Whether a collaborator call is outstanding.
    pub fn is_busy(&self) -> bool {
        self.otp.verification() == VerificationState::Verifying || self.otp.is_resend_in_flight()
    }

    /// Whether the UI needs frequent ticks (busy indicators, toast expiry).
    pub fn needs_animation(&self) -> bool {
        self.is_busy() || !self.toasts.is_empty()
    }

    /// Advances busy indicators and toast lifetimes. Returns `true` when
    /// something visible changed.
    pub fn on_tick(&mut self) -> bool {
        let mut changed = self.toasts.tick();
        if self.is_busy() {
            self.throbber_idx = (self.throbber_idx + 1) % THROBBER_FRAMES.len();
            changed = true;
        }
        changed
    }

    pub fn throbber(&self) -> &'static str {
        THROBBER_FRAMES[self.throbber_idx % THROBBER_FRAMES.len()]
    }
}

const THROBBER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

#[cfg(test)]
pub(crate) mod test_support {
    use async_trait::async_trait;
    use otpgate_api::AuthError;
    use otpgate_types::{ResendAck, VerificationAck};
    use tokio::sync::mpsc::{self, UnboundedReceiver};

    use super::*;
    use crate::ui::theme::DraculaTheme;

    /// Collaborator stub that answers every call with a fixed result.
    pub struct StubClient {
        pub verify_ok: bool,
        pub resend_ok: bool,
    }

    #[async_trait]
    impl AuthClient for StubClient {
        async fn verify_code(&self, _email: &str, code: &str) -> Result<VerificationAck, AuthError> {
            if self.verify_ok {
                Ok(VerificationAck {
                    message: Some(format!("verified {code}")),
                })
            } else {
                Err(AuthError::Rejected {
                    status: Some(400),
                    message: "OTP verification failed".to_string(),
                })
            }
        }

        async fn resend_code(&self, _email: &str) -> Result<ResendAck, AuthError> {
            if self.resend_ok {
                Ok(ResendAck::default())
            } else {
                Err(AuthError::Rejected {
                    status: Some(429),
                    message: "Failed to resend OTP".to_string(),
                })
            }
        }
    }

    pub fn test_app(options: OtpOptions, client: StubClient) -> (App, UnboundedReceiver<Msg>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let ctx = SharedCtx {
            theme: Box::new(DraculaTheme::new()),
            client: Arc::new(client),
            email: "user@example.com".to_string(),
        };
        (App::new(ctx, options, sender), receiver)
    }
}
