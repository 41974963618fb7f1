//! Shared type definitions for the otpgate workspace.
//!
//! The TUI, the API client and the CLI exchange data through the types in
//! this crate: acknowledgements returned by the authentication collaborator,
//! the messages fed into UI components and the effects components hand back
//! to the runtime.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Positive acknowledgement returned when a code was accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationAck {
    /// Optional human-readable message supplied by the server.
    #[serde(default)]
    pub message: Option<String>,
}

/// Positive acknowledgement returned when a new code was sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResendAck {
    /// Optional human-readable message supplied by the server.
    #[serde(default)]
    pub message: Option<String>,
}

/// Severity attached to user-facing notifications.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Info => "info",
            Severity::Success => "success",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        f.write_str(label)
    }
}

static NEXT_INSTANCE_ID: AtomicU64 = AtomicU64::new(1);

/// Identifies one mounted activation of a widget.
///
/// Asynchronous work (collaborator calls, countdown ticks) is tagged with the
/// id of the widget that issued it. A result whose id does not match the
/// currently mounted widget belongs to a torn-down instance and is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WidgetInstanceId(u64);

impl WidgetInstanceId {
    /// Allocates a fresh, process-unique id.
    pub fn next() -> Self {
        Self(NEXT_INSTANCE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for WidgetInstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "otp#{}", self.0)
    }
}

/// Result of a background collaborator call.
///
/// Failures carry the message that should be surfaced to the user; the
/// transport details are logged where the call is made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecOutcome {
    /// Outcome of `verify_code` for the given widget instance.
    Verify {
        instance: WidgetInstanceId,
        result: Result<VerificationAck, String>,
    },
    /// Outcome of `resend_code` for the given widget instance.
    Resend {
        instance: WidgetInstanceId,
        result: Result<ResendAck, String>,
    },
}

impl ExecOutcome {
    pub fn instance(&self) -> WidgetInstanceId {
        match self {
            ExecOutcome::Verify { instance, .. } | ExecOutcome::Resend { instance, .. } => *instance,
        }
    }
}

/// Messages that can be sent to update the application state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Periodic UI tick (toast expiry, throbbers)
    Tick,
    /// Terminal resized
    Resize(u16, u16),
    /// One second of resend cooldown elapsed for the given widget
    CountdownTick(WidgetInstanceId),
    /// Background collaborator call completed
    ExecCompleted(Box<ExecOutcome>),
}

/// Side effects requested by components.
///
/// Components never perform I/O themselves; they describe what should happen
/// and the runtime's command layer carries it out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Submit the given code to the collaborator
    VerifyRequested { instance: WidgetInstanceId, code: String },
    /// Ask the collaborator to send a fresh code
    ResendRequested { instance: WidgetInstanceId },
    /// (Re)start the once-per-second resend countdown
    StartCountdown { instance: WidgetInstanceId, seconds: u32 },
    /// Cancel the resend countdown
    StopCountdown,
    /// Leave the application
    Quit,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instance_ids_are_unique_and_increasing() {
        let first = WidgetInstanceId::next();
        let second = WidgetInstanceId::next();
        assert_ne!(first, second);
        assert!(second.get() > first.get());
    }

    #[test]
    fn exec_outcome_reports_its_instance() {
        let instance = WidgetInstanceId::next();
        let outcome = ExecOutcome::Resend {
            instance,
            result: Err("Failed to resend OTP".to_string()),
        };
        assert_eq!(outcome.instance(), instance);
    }

    #[test]
    fn acknowledgement_message_is_optional() {
        let ack: VerificationAck = serde_json::from_str("{}").expect("empty ack");
        assert_eq!(ack.message, None);
        let ack: ResendAck = serde_json::from_str(r#"{"message":"sent"}"#).expect("ack with message");
        assert_eq!(ack.message.as_deref(), Some("sent"));
    }
}
