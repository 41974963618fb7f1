//! Segmented one-time-code entry: state, resend countdown and the component.

mod countdown;
mod otp_component;
mod state;

pub use countdown::ResendCountdown;
pub use otp_component::OtpComponent;
pub use state::{OtpEntryState, OtpOptions, VerificationState};
