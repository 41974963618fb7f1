//! State for the segmented one-time-code entry.
//!
//! The state is pure: it never spawns work or reads the clock. Keystrokes,
//! pastes, countdown ticks and collaborator outcomes are applied through the
//! methods below, and the component turns the results into `Effect`s.
//!
//! Invariants
//! - every slot holds one ASCII digit or is empty
//! - the cursor is always a valid slot index
//! - resend is only possible once the countdown reached zero
//! - `Verified` is terminal: no method changes the buffer afterwards

use otpgate_types::{ResendAck, VerificationAck, WidgetInstanceId};
use otpgate_util::extract_digits;
use otpgate_util::settings::MAX_CODE_LENGTH;
use rat_focus::{FocusBuilder, FocusFlag, HasFocus};
use ratatui::layout::Rect;

/// Construction parameters for the widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OtpOptions {
    /// Number of digit slots.
    pub length: usize,
    /// Cooldown applied on mount and after every successful resend.
    pub cooldown_seconds: u32,
}

impl Default for OtpOptions {
    fn default() -> Self {
        Self {
            length: 6,
            cooldown_seconds: 30,
        }
    }
}

/// Where the widget stands with respect to verification.
///
/// A failed attempt returns to `Idle`; its reason is kept in
/// [`OtpEntryState::last_error`] until the next edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VerificationState {
    #[default]
    Idle,
    Verifying,
    Verified,
}

#[derive(Debug, Clone)]
pub struct OtpEntryState {
    instance: WidgetInstanceId,
    email: String,
    slots: Vec<Option<char>>,
    cursor: usize,
    cooldown_seconds: u32,
    remaining_seconds: u32,
    verification: VerificationState,
    resend_in_flight: bool,
    last_error: Option<String>,

    container_focus: FocusFlag,
    pub slot_focus: Vec<FocusFlag>,
    pub f_verify: FocusFlag,
    pub f_resend: FocusFlag,
}

impl OtpEntryState {
    /// Mounts a fresh widget: empty buffer, cursor on the first slot and the
    /// countdown at its starting value.
    pub fn new(email: impl Into<String>, options: OtpOptions) -> Self {
        let length = options.length.clamp(1, MAX_CODE_LENGTH);
        let cooldown_seconds = options.cooldown_seconds.max(1);
        let slot_focus = (0..length)
            .map(|index| FocusFlag::new().with_name(&format!("otp.slot.{index}")))
            .collect();

        Self {
            instance: WidgetInstanceId::next(),
            email: email.into(),
            slots: vec![None; length],
            cursor: 0,
            cooldown_seconds,
            remaining_seconds: cooldown_seconds,
            verification: VerificationState::Idle,
            resend_in_flight: false,
            last_error: None,
            container_focus: FocusFlag::new().with_name("otp"),
            slot_focus,
            f_verify: FocusFlag::new().with_name("otp.verify"),
            f_resend: FocusFlag::new().with_name("otp.resend"),
        }
    }

    // ----- Getters -----
    pub fn instance(&self) -> WidgetInstanceId {
        self.instance
    }
    pub fn email(&self) -> &str {
        &self.email
    }
    pub fn length(&self) -> usize {
        self.slots.len()
    }
    pub fn slots(&self) -> &[Option<char>] {
        &self.slots
    }
    pub fn cursor(&self) -> usize {
        self.cursor
    }
    pub fn cooldown_seconds(&self) -> u32 {
        self.cooldown_seconds
    }
    pub fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }
    pub fn verification(&self) -> VerificationState {
        self.verification
    }
    pub fn is_resend_in_flight(&self) -> bool {
        self.resend_in_flight
    }
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// The digits entered so far, concatenated in slot order.
    pub fn code(&self) -> String {
        self.slots.iter().flatten().collect()
    }

    pub fn is_complete(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    /// Slots accept edits only while no verification is pending or done.
    pub fn is_editable(&self) -> bool {
        self.verification == VerificationState::Idle
    }

    pub fn can_submit(&self) -> bool {
        self.is_complete() && self.verification == VerificationState::Idle
    }

    pub fn can_resend(&self) -> bool {
        self.remaining_seconds == 0 && !self.resend_in_flight && self.verification != VerificationState::Verified
    }

    /// Focus handle of the slot under the cursor.
    pub fn cursor_flag(&self) -> &FocusFlag {
        &self.slot_focus[self.cursor]
    }

    /// Index of the slot whose focus flag is set, if any.
    pub fn focused_slot(&self) -> Option<usize> {
        self.slot_focus.iter().position(FocusFlag::get)
    }

    pub fn is_button_focused(&self) -> bool {
        self.f_verify.get() || self.f_resend.get()
    }

    // ----- Editing -----

    /// Types `c` into the slot under the cursor and advances the cursor.
    ///
    /// Anything but an ASCII digit is rejected without a state change.
    /// Returns `true` when the buffer changed.
    pub fn enter_char(&mut self, c: char) -> bool {
        if !self.is_editable() || !c.is_ascii_digit() {
            return false;
        }
        self.slots[self.cursor] = Some(c);
        if self.cursor + 1 < self.slots.len() {
            self.cursor += 1;
        }
        self.after_edit();
        true
    }

    /// Clears the slot under the cursor, or, when it is already empty, the
    /// previous slot (moving the cursor back onto it).
    pub fn backspace(&mut self) -> bool {
        if !self.is_editable() {
            return false;
        }
        if self.slots[self.cursor].is_some() {
            self.slots[self.cursor] = None;
        } else if self.cursor > 0 {
            self.cursor -= 1;
            self.slots[self.cursor] = None;
        } else {
            return false;
        }
        self.after_edit();
        true
    }

    /// Clears the slot under the cursor without moving.
    pub fn delete(&mut self) -> bool {
        if !self.is_editable() || self.slots[self.cursor].is_none() {
            return false;
        }
        self.slots[self.cursor] = None;
        self.after_edit();
        true
    }

    /// Replaces the buffer with the digits found in `text`.
    ///
    /// Non-digits are dropped, the rest is truncated to the slot count and
    /// left-filled; remaining slots are cleared. Text without any digit
    /// empties the buffer and puts the cursor on the first slot.
    pub fn paste(&mut self, text: &str) -> bool {
        if !self.is_editable() {
            return false;
        }
        let digits = extract_digits(text, self.slots.len());
        for (index, slot) in self.slots.iter_mut().enumerate() {
            *slot = digits.get(index).copied();
        }
        self.cursor = digits.len().min(self.slots.len()).saturating_sub(1);
        self.after_edit();
        true
    }

    // ----- Cursor movement -----

    pub fn move_left(&mut self) -> bool {
        self.set_cursor(self.cursor.saturating_sub(1))
    }

    pub fn move_right(&mut self) -> bool {
        self.set_cursor(self.cursor + 1)
    }

    pub fn move_home(&mut self) -> bool {
        self.set_cursor(0)
    }

    pub fn move_end(&mut self) -> bool {
        self.set_cursor(self.slots.len() - 1)
    }

    /// Moves the cursor to `index`, clamped to the last slot. Locked once verified.
    pub fn set_cursor(&mut self, index: usize) -> bool {
        if self.verification == VerificationState::Verified {
            return false;
        }
        let clamped = index.min(self.slots.len() - 1);
        let moved = clamped != self.cursor;
        self.cursor = clamped;
        moved
    }

    fn after_edit(&mut self) {
        self.last_error = None;
    }

    // ----- Verification -----

    /// Enters `Verifying` and returns the code to submit, when submission is allowed.
    pub fn begin_verify(&mut self) -> Option<String> {
        if !self.can_submit() {
            return None;
        }
        self.verification = VerificationState::Verifying;
        self.last_error = None;
        Some(self.code())
    }

    /// Applies the collaborator's answer to a pending verification.
    ///
    /// Success locks the widget for good. Failure returns to `Idle`, keeps
    /// the buffer for correction and records the reason. Returns `false`
    /// when no verification was pending.
    pub fn finish_verify(&mut self, result: Result<VerificationAck, String>) -> bool {
        if self.verification != VerificationState::Verifying {
            return false;
        }
        match result {
            Ok(_) => {
                self.verification = VerificationState::Verified;
                self.last_error = None;
            }
            Err(message) => {
                self.verification = VerificationState::Idle;
                self.last_error = Some(message);
            }
        }
        true
    }

    // ----- Resend -----

    /// Marks a resend as outstanding, when resending is allowed.
    pub fn begin_resend(&mut self) -> bool {
        if !self.can_resend() {
            return false;
        }
        self.resend_in_flight = true;
        true
    }

    /// Applies the collaborator's answer to a pending resend.
    ///
    /// On success the buffer is cleared, the cursor returns to the first
    /// slot and the countdown is reset; the caller must restart the timer.
    /// A failure leaves the countdown and buffer untouched. Returns `true`
    /// when the countdown was reset.
    pub fn finish_resend(&mut self, result: Result<ResendAck, String>) -> bool {
        if !self.resend_in_flight {
            return false;
        }
        self.resend_in_flight = false;
        if result.is_err() || self.verification == VerificationState::Verified {
            return false;
        }
        self.slots.iter_mut().for_each(|slot| *slot = None);
        self.cursor = 0;
        self.remaining_seconds = self.cooldown_seconds;
        self.last_error = None;
        true
    }

    /// One second of cooldown elapsed. Returns `true` once the countdown is
    /// at zero, meaning the timer should stop.
    pub fn tick(&mut self) -> bool {
        self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
        self.remaining_seconds == 0
    }
}

impl HasFocus for OtpEntryState {
    fn build(&self, builder: &mut FocusBuilder) {
        let tag = builder.start(self);
        for slot in &self.slot_focus {
            builder.leaf_widget(slot);
        }
        builder.leaf_widget(&self.f_verify);
        builder.leaf_widget(&self.f_resend);
        builder.end(tag);
    }

    fn focus(&self) -> FocusFlag {
        self.container_focus.clone()
    }

    fn area(&self) -> Rect {
        Rect::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(length: usize, cooldown_seconds: u32) -> OtpEntryState {
        OtpEntryState::new(
            "user@example.com",
            OtpOptions {
                length,
                cooldown_seconds,
            },
        )
    }

    fn type_all(state: &mut OtpEntryState, text: &str) {
        for c in text.chars() {
            state.enter_char(c);
        }
    }

    fn buffer(state: &OtpEntryState) -> String {
        state.slots().iter().map(|slot| slot.unwrap_or('_')).collect()
    }

    fn run_out_cooldown(state: &mut OtpEntryState) {
        while !state.tick() {}
    }

    #[test]
    fn mounts_empty_with_full_cooldown() {
        let st = state(6, 30);
        assert_eq!(buffer(&st), "______");
        assert_eq!(st.cursor(), 0);
        assert_eq!(st.remaining_seconds(), 30);
        assert_eq!(st.verification(), VerificationState::Idle);
        assert!(!st.can_submit());
        assert!(!st.can_resend());
    }

    #[test]
    fn typing_fills_slots_and_advances_cursor() {
        for prefix_len in 0..=6 {
            let mut st = state(6, 30);
            let text = &"123456"[..prefix_len];
            type_all(&mut st, text);
            assert_eq!(st.code(), text);
            assert_eq!(st.cursor(), prefix_len.min(5));
            assert_eq!(st.can_submit(), prefix_len == 6);
        }
    }

    #[test]
    fn non_digits_are_rejected() {
        let mut st = state(6, 30);
        assert!(!st.enter_char('a'));
        assert!(!st.enter_char(' '));
        assert!(!st.enter_char('٣'));
        assert_eq!(buffer(&st), "______");
        assert_eq!(st.cursor(), 0);
    }

    #[test]
    fn typing_on_last_slot_overwrites_in_place() {
        let mut st = state(4, 30);
        type_all(&mut st, "1234");
        assert!(st.enter_char('9'));
        assert_eq!(st.code(), "1239");
        assert_eq!(st.cursor(), 3);
    }

    #[test]
    fn backspace_reaches_through_empty_slot() {
        let mut st = state(6, 30);
        type_all(&mut st, "123");
        assert_eq!(st.cursor(), 3);
        assert!(st.backspace());
        assert_eq!(buffer(&st), "12____");
        assert_eq!(st.cursor(), 2);
    }

    #[test]
    fn backspace_clears_filled_slot_in_place() {
        let mut st = state(6, 30);
        type_all(&mut st, "123456");
        assert!(st.backspace());
        assert_eq!(buffer(&st), "12345_");
        assert_eq!(st.cursor(), 5);
    }

    #[test]
    fn backspace_on_first_empty_slot_is_a_noop() {
        let mut st = state(6, 30);
        assert!(!st.backspace());
        assert_eq!(st.cursor(), 0);
        assert_eq!(buffer(&st), "______");
    }

    #[test]
    fn delete_clears_without_moving() {
        let mut st = state(6, 30);
        type_all(&mut st, "123");
        st.move_home();
        assert!(st.delete());
        assert_eq!(buffer(&st), "_23___");
        assert_eq!(st.cursor(), 0);
        assert!(!st.delete());
    }

    #[test]
    fn arrows_move_within_bounds_without_editing() {
        let mut st = state(4, 30);
        type_all(&mut st, "12");
        assert!(st.move_left());
        assert_eq!(st.cursor(), 1);
        st.move_home();
        assert!(!st.move_left());
        assert_eq!(st.cursor(), 0);
        st.move_end();
        assert!(!st.move_right());
        assert_eq!(st.cursor(), 3);
        assert_eq!(st.code(), "12");
    }

    #[test]
    fn paste_filters_non_digits_and_left_fills() {
        let mut st = state(6, 30);
        type_all(&mut st, "999999");
        assert!(st.paste("Your code: 12-34"));
        assert_eq!(buffer(&st), "1234__");
        assert_eq!(st.cursor(), 3);
    }

    #[test]
    fn paste_truncates_to_slot_count() {
        let mut st = state(6, 30);
        assert!(st.paste("1 2 3 4 5 6 7 8"));
        assert_eq!(st.code(), "123456");
        assert_eq!(st.cursor(), 5);
        assert!(st.can_submit());
    }

    #[test]
    fn paste_without_digits_clears_the_buffer() {
        let mut st = state(6, 30);
        type_all(&mut st, "12");
        assert!(st.paste("hello"));
        assert_eq!(buffer(&st), "______");
        assert_eq!(st.cursor(), 0);
        assert!(!st.can_submit());
    }

    #[test]
    fn failed_verification_returns_to_idle_and_keeps_buffer() {
        let mut st = state(6, 30);
        type_all(&mut st, "123456");
        assert_eq!(st.cursor(), 5);

        assert_eq!(st.begin_verify().as_deref(), Some("123456"));
        assert_eq!(st.verification(), VerificationState::Verifying);
        assert!(!st.can_submit());
        assert!(st.begin_verify().is_none());

        assert!(st.finish_verify(Err("OTP verification failed".to_string())));
        assert_eq!(st.verification(), VerificationState::Idle);
        assert_eq!(st.code(), "123456");
        assert_eq!(st.last_error(), Some("OTP verification failed"));
        assert!(st.can_submit());

        assert!(st.backspace());
        assert_eq!(st.last_error(), None);
    }

    #[test]
    fn edits_are_blocked_while_verifying() {
        let mut st = state(6, 30);
        type_all(&mut st, "123456");
        st.begin_verify();
        assert!(!st.backspace());
        assert!(!st.paste("654321"));
        assert_eq!(st.code(), "123456");
    }

    #[test]
    fn verified_is_terminal() {
        let mut st = state(6, 1);
        type_all(&mut st, "123456");
        st.begin_verify();
        assert!(st.finish_verify(Ok(VerificationAck::default())));
        assert_eq!(st.verification(), VerificationState::Verified);

        run_out_cooldown(&mut st);
        assert!(!st.enter_char('1'));
        assert!(!st.backspace());
        assert!(!st.paste("000000"));
        assert!(!st.move_left());
        assert_eq!(st.code(), "123456");
        assert!(!st.can_submit());
        assert!(!st.can_resend());
        assert!(!st.begin_resend());
        assert!(!st.finish_verify(Err("late".to_string())));
        assert_eq!(st.verification(), VerificationState::Verified);
    }

    #[test]
    fn outcome_without_pending_call_is_ignored() {
        let mut st = state(6, 30);
        assert!(!st.finish_verify(Ok(VerificationAck::default())));
        assert_eq!(st.verification(), VerificationState::Idle);
        assert!(!st.finish_resend(Ok(ResendAck::default())));
        assert_eq!(st.remaining_seconds(), 30);
    }

    #[test]
    fn resend_is_enabled_exactly_at_zero() {
        let mut st = state(6, 3);
        assert!(!st.tick());
        assert!(!st.can_resend());
        assert!(!st.tick());
        assert!(!st.can_resend());
        assert!(st.tick());
        assert_eq!(st.remaining_seconds(), 0);
        assert!(st.can_resend());
        assert!(st.tick());
        assert_eq!(st.remaining_seconds(), 0);
    }

    #[test]
    fn successful_resend_resets_buffer_cursor_and_timer() {
        let mut st = state(6, 30);
        type_all(&mut st, "1234");
        run_out_cooldown(&mut st);

        assert!(st.begin_resend());
        assert!(!st.can_resend());
        assert!(!st.begin_resend());

        assert!(st.finish_resend(Ok(ResendAck::default())));
        assert_eq!(buffer(&st), "______");
        assert_eq!(st.cursor(), 0);
        assert_eq!(st.remaining_seconds(), 30);
        assert!(!st.is_resend_in_flight());
    }

    #[test]
    fn failed_resend_keeps_timer_and_buffer() {
        let mut st = state(6, 30);
        type_all(&mut st, "1234");
        run_out_cooldown(&mut st);

        assert!(st.begin_resend());
        assert!(!st.finish_resend(Err("Failed to resend OTP".to_string())));
        assert_eq!(st.code(), "1234");
        assert_eq!(st.remaining_seconds(), 0);
        assert!(st.can_resend());
    }

    #[test]
    fn resend_landing_after_verification_leaves_buffer_alone() {
        let mut st = state(6, 1);
        type_all(&mut st, "123456");
        run_out_cooldown(&mut st);
        assert!(st.begin_resend());
        st.begin_verify();
        st.finish_verify(Ok(VerificationAck::default()));

        assert!(!st.finish_resend(Ok(ResendAck::default())));
        assert_eq!(st.code(), "123456");
        assert!(!st.is_resend_in_flight());
    }

    #[test]
    fn options_are_clamped_to_supported_range() {
        let st = state(0, 0);
        assert_eq!(st.length(), 1);
        assert_eq!(st.cooldown_seconds(), 1);

        let st = state(40, 30);
        assert_eq!(st.length(), MAX_CODE_LENGTH);
        assert_eq!(st.slots().len(), MAX_CODE_LENGTH);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn digit_chars() -> impl Strategy<Value = Vec<char>> {
            prop::collection::vec(0u32..10, 0..20).prop_map(|digits| {
                digits.into_iter().filter_map(|digit| char::from_digit(digit, 10)).collect()
            })
        }

        proptest! {
            #[test]
            fn typed_digits_fill_slots_in_order(length in 1usize..=MAX_CODE_LENGTH, digits in digit_chars()) {
                let mut st = state(length, 30);
                for &digit in &digits {
                    prop_assert!(st.enter_char(digit));
                }

                let k = digits.len();
                let mut expected: Vec<Option<char>> = digits.iter().take(length).copied().map(Some).collect();
                expected.resize(length, None);
                if k > length {
                    expected[length - 1] = digits.last().copied();
                }
                prop_assert_eq!(st.slots(), expected.as_slice());
                prop_assert_eq!(st.cursor(), k.min(length - 1));
                prop_assert_eq!(st.can_submit(), k >= length);
            }

            #[test]
            fn non_digits_never_change_typed_input(
                digits in digit_chars(),
                noise in prop::collection::vec(any::<char>().prop_filter("non-digit", |c| !c.is_ascii_digit()), 0..20),
            ) {
                let mut clean = state(6, 30);
                let mut noisy = state(6, 30);
                for (index, &digit) in digits.iter().enumerate() {
                    clean.enter_char(digit);
                    if let Some(&c) = noise.get(index) {
                        prop_assert!(!noisy.enter_char(c));
                    }
                    noisy.enter_char(digit);
                }
                prop_assert_eq!(clean.slots(), noisy.slots());
                prop_assert_eq!(clean.cursor(), noisy.cursor());
            }

            #[test]
            fn paste_keeps_only_leading_digits(length in 1usize..=MAX_CODE_LENGTH, prefill in digit_chars(), text in any::<String>()) {
                let mut st = state(length, 30);
                for &digit in &prefill {
                    st.enter_char(digit);
                }
                prop_assert!(st.paste(&text));

                let digits: Vec<char> = text.chars().filter(char::is_ascii_digit).take(length).collect();
                let mut expected: Vec<Option<char>> = digits.iter().copied().map(Some).collect();
                expected.resize(length, None);
                prop_assert_eq!(st.slots(), expected.as_slice());
                prop_assert_eq!(st.cursor(), digits.len().saturating_sub(1));
            }

            #[test]
            fn paste_of_mixed_text_matches_digit_only_paste(length in 1usize..=MAX_CODE_LENGTH, text in "[0-9a-z :\\-]{0,30}") {
                let mut mixed = state(length, 30);
                let mut plain = state(length, 30);
                mixed.paste(&text);
                plain.paste(&text.chars().filter(char::is_ascii_digit).collect::<String>());
                prop_assert_eq!(mixed.slots(), plain.slots());
                prop_assert_eq!(mixed.cursor(), plain.cursor());
            }
        }
    }
}
