//! UI components: OTP entry and toasts.

pub mod component;
pub mod otp;
pub mod toast;

pub use component::*;
pub use otp::OtpComponent;
pub use toast::ToastComponent;

use ratatui::layout::{Position, Rect};

/// Index of the first area containing the point `(x, y)`.
pub(crate) fn hit_index(areas: &[Rect], x: u16, y: u16) -> Option<usize> {
    let position = Position::new(x, y);
    areas.iter().position(|area| area.contains(position))
}
