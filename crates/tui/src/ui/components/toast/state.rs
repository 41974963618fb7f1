//! Bounded queue of transient notifications.

use std::collections::VecDeque;

use otpgate_types::Severity;

/// Toasts stay visible for this many UI ticks.
pub const TOAST_LIFETIME_TICKS: u16 = 40;
/// At most this many toasts are kept; older ones are dropped first.
pub const MAX_TOASTS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub severity: Severity,
    pub message: String,
    remaining_ticks: u16,
}

#[derive(Debug, Clone, Default)]
pub struct ToastState {
    toasts: VecDeque<Toast>,
}

impl ToastState {
    pub fn push(&mut self, severity: Severity, message: impl Into<String>) {
        if self.toasts.len() == MAX_TOASTS {
            self.toasts.pop_front();
        }
        self.toasts.push_back(Toast {
            severity,
            message: message.into(),
            remaining_ticks: TOAST_LIFETIME_TICKS,
        });
    }

    /// Ages every toast by one tick and drops expired ones. Returns `true`
    /// when the visible set changed.
    pub fn tick(&mut self) -> bool {
        let before = self.toasts.len();
        for toast in self.toasts.iter_mut() {
            toast.remaining_ticks = toast.remaining_ticks.saturating_sub(1);
        }
        self.toasts.retain(|toast| toast.remaining_ticks > 0);
        before != self.toasts.len()
    }

    /// Drops the toast at `index` (oldest first).
    pub fn dismiss(&mut self, index: usize) -> bool {
        self.toasts.remove(index).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Toast> {
        self.toasts.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.toasts.len()
    }
}
