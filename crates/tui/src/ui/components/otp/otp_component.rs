use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use otpgate_types::{Effect, ExecOutcome, Msg, Severity};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Position, Rect},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph},
};
use tracing::{debug, info, warn};

use super::VerificationState;
use crate::app::App;
use crate::ui::components::{Component, hit_index};
use crate::ui::theme::theme_helpers::{self as th, ButtonRenderOptions, render_button};

const SLOT_WIDTH: u16 = 5;
const SLOT_HEIGHT: u16 = 3;
const SLOT_GAP: u16 = 1;
const BUTTON_WIDTH: u16 = 18;
const PANEL_MIN_WIDTH: u16 = 52;
const PANEL_HEIGHT: u16 = 14;

const VERIFIED_FALLBACK: &str = "Code verified";
const RESENT_FALLBACK: &str = "A new code has been sent";

/// Segmented code entry with verify and resend controls.
///
/// Keys and pastes edit `app.otp`; the component turns the outcome into
/// effects (verify/resend calls, countdown control) and keeps the focus
/// graph on the slot under the cursor.
#[derive(Debug, Default)]
pub struct OtpComponent {
    slot_areas: Vec<Rect>,
    verify_area: Rect,
    resend_area: Rect,
}

impl OtpComponent {
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves keyboard focus onto the slot under the cursor.
    fn sync_focus(app: &mut App) {
        let flag = app.otp.cursor_flag().clone();
        app.focus.focus(&flag);
    }

    /// After Tab/BackTab, the cursor follows the focused slot.
    fn sync_cursor(app: &mut App) {
        if let Some(index) = app.otp.focused_slot() {
            app.otp.set_cursor(index);
        }
    }

    fn submit(app: &mut App) -> Vec<Effect> {
        match app.otp.begin_verify() {
            Some(code) => {
                let instance = app.otp.instance();
                info!(%instance, "submitting code for verification");
                vec![Effect::VerifyRequested { instance, code }]
            }
            None => Vec::new(),
        }
    }

    fn resend(app: &mut App) -> Vec<Effect> {
        if !app.otp.begin_resend() {
            return Vec::new();
        }
        let instance = app.otp.instance();
        info!(%instance, "requesting a new code");
        vec![Effect::ResendRequested { instance }]
    }

    fn apply_outcome(app: &mut App, outcome: &ExecOutcome) -> Vec<Effect> {
        let instance = app.otp.instance();
        if outcome.instance() != instance {
            debug!(outcome = %outcome.instance(), current = %instance, "discarding outcome for a torn-down widget");
            return Vec::new();
        }
        match outcome {
            ExecOutcome::Verify { result, .. } => {
                if !app.otp.finish_verify(result.clone()) {
                    return Vec::new();
                }
                match result {
                    Ok(ack) => {
                        info!(%instance, "code verified");
                        let message = ack.message.clone().unwrap_or_else(|| VERIFIED_FALLBACK.to_string());
                        app.toasts.push(Severity::Success, message);
                        vec![Effect::StopCountdown]
                    }
                    Err(message) => {
                        warn!(%instance, %message, "verification failed");
                        app.toasts.push(Severity::Error, message.clone());
                        Vec::new()
                    }
                }
            }
            ExecOutcome::Resend { result, .. } => {
                let reset = app.otp.finish_resend(result.clone());
                match result {
                    Ok(ack) if reset => {
                        info!(%instance, "new code sent");
                        let message = ack.message.clone().unwrap_or_else(|| RESENT_FALLBACK.to_string());
                        app.toasts.push(Severity::Success, message);
                        Self::sync_focus(app);
                        vec![Effect::StartCountdown {
                            instance,
                            seconds: app.otp.cooldown_seconds(),
                        }]
                    }
                    Ok(_) => Vec::new(),
                    Err(message) => {
                        warn!(%instance, %message, "resend failed");
                        app.toasts.push(Severity::Error, message.clone());
                        Vec::new()
                    }
                }
            }
        }
    }

    /// Slot keys: digits, deletion and cursor movement.
    fn handle_slot_key(app: &mut App, key: KeyEvent) -> bool {
        let otp = &mut app.otp;
        match key.code {
            KeyCode::Char(c) if !key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) => otp.enter_char(c),
            KeyCode::Backspace => otp.backspace(),
            KeyCode::Delete => otp.delete(),
            KeyCode::Left => otp.move_left(),
            KeyCode::Right => otp.move_right(),
            KeyCode::Home => otp.move_home(),
            KeyCode::End => otp.move_end(),
            _ => false,
        }
    }

    fn panel_area(area: Rect, length: usize) -> Rect {
        let slots_width = Self::slots_width(length);
        let width = slots_width.saturating_add(4).max(PANEL_MIN_WIDTH).min(area.width);
        let height = PANEL_HEIGHT.min(area.height);
        Rect {
            x: area.x + area.width.saturating_sub(width) / 2,
            y: area.y + area.height.saturating_sub(height) / 2,
            width,
            height,
        }
    }

    fn slots_width(length: usize) -> u16 {
        let length = u16::try_from(length).unwrap_or(u16::MAX);
        length
            .saturating_mul(SLOT_WIDTH)
            .saturating_add(length.saturating_sub(1).saturating_mul(SLOT_GAP))
    }

    /// Slot boxes centered horizontally in `row`; slots that do not fit are dropped.
    fn slot_layout(row: Rect, length: usize) -> Vec<Rect> {
        let start = row.x + row.width.saturating_sub(Self::slots_width(length)) / 2;
        (0..u16::try_from(length).unwrap_or(u16::MAX))
            .map(|index| Rect {
                x: start.saturating_add(index.saturating_mul(SLOT_WIDTH + SLOT_GAP)),
                y: row.y,
                width: SLOT_WIDTH,
                height: SLOT_HEIGHT.min(row.height),
            })
            .take_while(|rect| rect.right() <= row.right())
            .collect()
    }

    fn status_line(app: &App) -> Line<'static> {
        let theme = &*app.ctx.theme;
        match app.otp.verification() {
            VerificationState::Verifying => Line::from(vec![
                Span::styled(format!("{} ", app.throbber()), theme.status_info()),
                Span::styled("Verifying code...", theme.text_secondary_style()),
            ]),
            VerificationState::Verified => Line::from(Span::styled(
                "Verified. Press Enter to continue.",
                theme.status_success(),
            )),
            VerificationState::Idle => match app.otp.last_error() {
                Some(error) => Line::from(Span::styled(error.to_string(), theme.status_error())),
                None if app.otp.is_resend_in_flight() => Line::from(vec![
                    Span::styled(format!("{} ", app.throbber()), theme.status_info()),
                    Span::styled("Sending a new code...", theme.text_secondary_style()),
                ]),
                None => Line::default(),
            },
        }
    }

    fn verify_label(state: VerificationState) -> &'static str {
        match state {
            VerificationState::Idle => "Verify",
            VerificationState::Verifying => "Verifying...",
            VerificationState::Verified => "Verified ✓",
        }
    }

    fn resend_label(app: &App) -> String {
        if app.otp.is_resend_in_flight() {
            "Sending...".to_string()
        } else if app.otp.remaining_seconds() > 0 {
            format!("Resend in {}s", app.otp.remaining_seconds())
        } else {
            "Resend code".to_string()
        }
    }

    fn render_slots(&mut self, frame: &mut Frame, row: Rect, app: &App) {
        let theme = &*app.ctx.theme;
        let otp = &app.otp;
        let verified = otp.verification() == VerificationState::Verified;
        let slot_has_focus = !otp.is_button_focused();
        self.slot_areas = Self::slot_layout(row, otp.length());

        for (index, rect) in self.slot_areas.iter().copied().enumerate() {
            let is_cursor = index == otp.cursor() && slot_has_focus && !verified;
            let digit = otp.slots()[index].map(String::from).unwrap_or_default();
            frame.render_widget(
                Paragraph::new(Span::styled(digit, theme.code_digit_style(verified))).centered().block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_type(if is_cursor { BorderType::Thick } else { BorderType::Rounded })
                        .border_style(theme.slot_border_style(is_cursor, otp.is_editable(), verified)),
                ),
                rect,
            );
        }

        if slot_has_focus
            && otp.is_editable()
            && let Some(rect) = self.slot_areas.get(otp.cursor())
        {
            frame.set_cursor_position(Position::new(rect.x + SLOT_WIDTH / 2, rect.y + 1));
        }
    }

    fn render_buttons(&mut self, frame: &mut Frame, row: Rect, app: &App) {
        let theme = &*app.ctx.theme;
        let otp = &app.otp;
        let [_, verify_area, _, resend_area, _] = Layout::horizontal([
            Constraint::Fill(1),
            Constraint::Length(BUTTON_WIDTH),
            Constraint::Length(2),
            Constraint::Length(BUTTON_WIDTH),
            Constraint::Fill(1),
        ])
        .areas(row);
        self.verify_area = verify_area;
        self.resend_area = resend_area;

        let verify_enabled = otp.can_submit() || otp.verification() == VerificationState::Verified;
        render_button(
            frame,
            verify_area,
            Self::verify_label(otp.verification()),
            theme,
            ButtonRenderOptions::new(verify_enabled, otp.f_verify.get(), otp.verification() == VerificationState::Verified, Borders::ALL),
        );
        render_button(
            frame,
            resend_area,
            &Self::resend_label(app),
            theme,
            ButtonRenderOptions::new(otp.can_resend(), otp.f_resend.get(), false, Borders::ALL),
        );
    }
}

impl Component for OtpComponent {
    fn mount_effects(&mut self, app: &mut App) -> Vec<Effect> {
        Self::sync_focus(app);
        vec![Effect::StartCountdown {
            instance: app.otp.instance(),
            seconds: app.otp.remaining_seconds(),
        }]
    }

    fn handle_key_events(&mut self, app: &mut App, key: KeyEvent) -> Vec<Effect> {
        if app.otp.verification() == VerificationState::Verified {
            return match key.code {
                KeyCode::Enter => vec![Effect::Quit],
                _ => Vec::new(),
            };
        }

        if key.code == KeyCode::Char('r') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return Self::resend(app);
        }

        match key.code {
            KeyCode::Tab => {
                app.focus.next();
                Self::sync_cursor(app);
                Vec::new()
            }
            KeyCode::BackTab => {
                app.focus.prev();
                Self::sync_cursor(app);
                Vec::new()
            }
            KeyCode::Enter if app.otp.f_resend.get() => Self::resend(app),
            KeyCode::Enter => Self::submit(app),
            _ if app.otp.is_button_focused() => Vec::new(),
            _ => {
                if Self::handle_slot_key(app, key) {
                    Self::sync_focus(app);
                }
                Vec::new()
            }
        }
    }

    fn handle_paste_events(&mut self, app: &mut App, text: &str) -> Vec<Effect> {
        if app.otp.paste(text) {
            debug!(instance = %app.otp.instance(), "pasted code into slots");
            Self::sync_focus(app);
        }
        Vec::new()
    }

    fn handle_mouse_events(&mut self, app: &mut App, mouse: MouseEvent) -> Vec<Effect> {
        if mouse.kind != MouseEventKind::Down(MouseButton::Left) {
            return Vec::new();
        }
        let position = Position::new(mouse.column, mouse.row);
        if let Some(index) = hit_index(&self.slot_areas, mouse.column, mouse.row) {
            if app.otp.set_cursor(index) || !app.otp.cursor_flag().get() {
                Self::sync_focus(app);
            }
            return Vec::new();
        }
        if self.verify_area.contains(position) {
            let flag = app.otp.f_verify.clone();
            app.focus.focus(&flag);
            return Self::submit(app);
        }
        if self.resend_area.contains(position) {
            let flag = app.otp.f_resend.clone();
            app.focus.focus(&flag);
            return Self::resend(app);
        }
        Vec::new()
    }

    fn update(&mut self, app: &mut App, msg: &Msg) -> Vec<Effect> {
        match msg {
            Msg::CountdownTick(instance) if *instance == app.otp.instance() => {
                if app.otp.tick() {
                    debug!(%instance, "resend cooldown elapsed");
                    vec![Effect::StopCountdown]
                } else {
                    Vec::new()
                }
            }
            Msg::CountdownTick(instance) => {
                debug!(%instance, "ignoring countdown tick for a torn-down widget");
                Vec::new()
            }
            Msg::ExecCompleted(outcome) => Self::apply_outcome(app, outcome),
            _ => Vec::new(),
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, app: &mut App) {
        let theme = &*app.ctx.theme;
        let panel = Self::panel_area(area, app.otp.length());
        let focused = app.otp.verification() != VerificationState::Verified;
        let block = th::block(theme, Some("Verify your email"), focused);
        let inner = block.inner(panel);
        frame.render_widget(Clear, panel);
        frame.render_widget(block, panel);

        let [intro, _, slots, _, status, buttons] = Layout::vertical([
            Constraint::Length(2),
            Constraint::Length(1),
            Constraint::Length(SLOT_HEIGHT),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(3),
        ])
        .areas(inner.inner(ratatui::layout::Margin::new(1, 0)));

        let intro_text = vec![
            Line::from(Span::styled(
                format!("Enter the {}-digit code we sent to", app.otp.length()),
                theme.text_secondary_style(),
            )),
            Line::from(Span::styled(app.otp.email().to_string(), theme.accent_emphasis_style())),
        ];
        frame.render_widget(Paragraph::new(intro_text).centered(), intro);

        self.render_slots(frame, slots, app);
        frame.render_widget(Paragraph::new(Self::status_line(app)).centered(), status);
        self.render_buttons(frame, buttons, app);
    }

    fn get_hint_spans(&self, app: &App) -> Vec<Span<'static>> {
        let theme = &*app.ctx.theme;
        if app.otp.verification() == VerificationState::Verified {
            return th::build_hint_spans(theme, &[(" Enter", " Continue  "), (" Esc", " Quit")]);
        }
        th::build_hint_spans(
            theme,
            &[
                (" 0-9", " Enter digit  "),
                (" ←/→", " Move  "),
                (" Enter", " Verify  "),
                (" Ctrl+R", " Resend  "),
                (" Tab", " Focus  "),
                (" Esc", " Quit"),
            ],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::test_support::{StubClient, test_app};
    use crate::ui::components::otp::OtpOptions;
    use otpgate_types::{ResendAck, VerificationAck, WidgetInstanceId};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn app() -> App {
        let (app, _receiver) = test_app(
            OtpOptions {
                length: 6,
                cooldown_seconds: 30,
            },
            StubClient {
                verify_ok: true,
                resend_ok: true,
            },
        );
        app
    }

    fn type_digits(component: &mut OtpComponent, app: &mut App, digits: &str) {
        for c in digits.chars() {
            component.handle_key_events(app, key(KeyCode::Char(c)));
        }
    }

    fn run_out_cooldown(component: &mut OtpComponent, app: &mut App) {
        let instance = app.otp.instance();
        for _ in 0..app.otp.cooldown_seconds() {
            component.update(app, &Msg::CountdownTick(instance));
        }
    }

    #[test]
    fn mount_starts_the_countdown() {
        let mut app = app();
        let mut component = OtpComponent::new();
        let effects = component.mount_effects(&mut app);
        assert_eq!(
            effects,
            vec![Effect::StartCountdown {
                instance: app.otp.instance(),
                seconds: 30
            }]
        );
    }

    #[test]
    fn typing_moves_focus_with_the_cursor() {
        let mut app = app();
        let mut component = OtpComponent::new();
        type_digits(&mut component, &mut app, "12");
        assert_eq!(app.otp.cursor(), 2);
        assert_eq!(app.otp.focused_slot(), Some(2));

        component.handle_key_events(&mut app, key(KeyCode::Backspace));
        assert_eq!(app.otp.focused_slot(), Some(1));
        assert_eq!(app.otp.code(), "1");
    }

    #[test]
    fn enter_submits_only_a_complete_code() {
        let mut app = app();
        let mut component = OtpComponent::new();
        type_digits(&mut component, &mut app, "12345");
        assert!(component.handle_key_events(&mut app, key(KeyCode::Enter)).is_empty());

        type_digits(&mut component, &mut app, "6");
        let effects = component.handle_key_events(&mut app, key(KeyCode::Enter));
        assert_eq!(
            effects,
            vec![Effect::VerifyRequested {
                instance: app.otp.instance(),
                code: "123456".to_string()
            }]
        );
        assert_eq!(app.otp.verification(), VerificationState::Verifying);
        assert!(component.handle_key_events(&mut app, key(KeyCode::Enter)).is_empty());
    }

    #[test]
    fn paste_fills_slots() {
        let mut app = app();
        let mut component = OtpComponent::new();
        component.handle_paste_events(&mut app, "code: 987-654");
        assert_eq!(app.otp.code(), "987654");
        assert_eq!(app.otp.focused_slot(), Some(5));
    }

    #[test]
    fn failed_verification_raises_an_error_toast() {
        let mut app = app();
        let mut component = OtpComponent::new();
        type_digits(&mut component, &mut app, "123456");
        component.handle_key_events(&mut app, key(KeyCode::Enter));

        let outcome = ExecOutcome::Verify {
            instance: app.otp.instance(),
            result: Err("OTP verification failed".to_string()),
        };
        let effects = component.update(&mut app, &Msg::ExecCompleted(Box::new(outcome)));
        assert!(effects.is_empty());
        assert_eq!(app.otp.verification(), VerificationState::Idle);
        assert_eq!(app.otp.code(), "123456");
        let toast = app.toasts.iter().next().cloned();
        assert_eq!(toast.map(|t| (t.severity, t.message)), Some((Severity::Error, "OTP verification failed".to_string())));
    }

    #[test]
    fn verified_widget_stops_the_countdown_and_quits_on_enter() {
        let mut app = app();
        let mut component = OtpComponent::new();
        type_digits(&mut component, &mut app, "123456");
        component.handle_key_events(&mut app, key(KeyCode::Enter));

        let outcome = ExecOutcome::Verify {
            instance: app.otp.instance(),
            result: Ok(VerificationAck::default()),
        };
        let effects = component.update(&mut app, &Msg::ExecCompleted(Box::new(outcome)));
        assert_eq!(effects, vec![Effect::StopCountdown]);
        assert_eq!(app.otp.verification(), VerificationState::Verified);

        type_digits(&mut component, &mut app, "9");
        assert_eq!(app.otp.code(), "123456");
        assert_eq!(component.handle_key_events(&mut app, key(KeyCode::Enter)), vec![Effect::Quit]);
    }

    #[test]
    fn countdown_tick_stops_at_zero() {
        let mut app = app();
        let mut component = OtpComponent::new();
        let instance = app.otp.instance();
        for _ in 0..29 {
            assert!(component.update(&mut app, &Msg::CountdownTick(instance)).is_empty());
        }
        assert_eq!(component.update(&mut app, &Msg::CountdownTick(instance)), vec![Effect::StopCountdown]);
        assert_eq!(app.otp.remaining_seconds(), 0);
    }

    #[test]
    fn ctrl_r_resends_once_the_cooldown_elapsed() {
        let mut app = app();
        let mut component = OtpComponent::new();
        let ctrl_r = KeyEvent::new(KeyCode::Char('r'), KeyModifiers::CONTROL);
        assert!(component.handle_key_events(&mut app, ctrl_r).is_empty());

        run_out_cooldown(&mut component, &mut app);
        type_digits(&mut component, &mut app, "12");
        let effects = component.handle_key_events(&mut app, ctrl_r);
        assert_eq!(effects, vec![Effect::ResendRequested { instance: app.otp.instance() }]);
        assert!(component.handle_key_events(&mut app, ctrl_r).is_empty());

        let outcome = ExecOutcome::Resend {
            instance: app.otp.instance(),
            result: Ok(ResendAck::default()),
        };
        let effects = component.update(&mut app, &Msg::ExecCompleted(Box::new(outcome)));
        assert_eq!(
            effects,
            vec![Effect::StartCountdown {
                instance: app.otp.instance(),
                seconds: 30
            }]
        );
        assert_eq!(app.otp.code(), "");
        assert_eq!(app.otp.focused_slot(), Some(0));
        assert_eq!(app.otp.remaining_seconds(), 30);
    }

    #[test]
    fn outcomes_and_ticks_for_other_instances_are_ignored() {
        let mut app = app();
        let mut component = OtpComponent::new();
        let stale = WidgetInstanceId::next();
        type_digits(&mut component, &mut app, "123456");
        component.handle_key_events(&mut app, key(KeyCode::Enter));

        let outcome = ExecOutcome::Verify {
            instance: stale,
            result: Ok(VerificationAck::default()),
        };
        assert!(component.update(&mut app, &Msg::ExecCompleted(Box::new(outcome))).is_empty());
        assert_eq!(app.otp.verification(), VerificationState::Verifying);

        assert!(component.update(&mut app, &Msg::CountdownTick(stale)).is_empty());
        assert_eq!(app.otp.remaining_seconds(), 30);
        assert!(app.toasts.is_empty());
    }

    #[test]
    fn tab_moves_to_buttons_and_enter_on_resend_resends() {
        let mut app = app();
        let mut component = OtpComponent::new();
        run_out_cooldown(&mut component, &mut app);
        for _ in 0..6 {
            component.handle_key_events(&mut app, key(KeyCode::Tab));
        }
        assert!(app.otp.f_verify.get());
        type_digits(&mut component, &mut app, "1");
        assert_eq!(app.otp.code(), "");

        component.handle_key_events(&mut app, key(KeyCode::Tab));
        assert!(app.otp.f_resend.get());
        let effects = component.handle_key_events(&mut app, key(KeyCode::Enter));
        assert_eq!(effects, vec![Effect::ResendRequested { instance: app.otp.instance() }]);
    }

    #[test]
    fn slots_are_centered_and_clipped() {
        let row = Rect::new(0, 0, 40, 3);
        let rects = OtpComponent::slot_layout(row, 6);
        assert_eq!(rects.len(), 6);
        assert_eq!(rects[0].x, (40 - OtpComponent::slots_width(6)) / 2);
        assert_eq!(rects[1].x - rects[0].x, SLOT_WIDTH + SLOT_GAP);

        let narrow = OtpComponent::slot_layout(Rect::new(0, 0, 12, 3), 6);
        assert_eq!(narrow.len(), 2);
    }

    #[test]
    fn oversized_lengths_do_not_overflow_the_layout() {
        assert_eq!(OtpComponent::slots_width(usize::MAX), u16::MAX);
        assert_eq!(OtpComponent::slots_width(20_000), u16::MAX);

        let rects = OtpComponent::slot_layout(Rect::new(0, 0, 80, 3), 20_000);
        assert!(!rects.is_empty());
        assert!(rects.iter().all(|rect| rect.right() <= 80));

        let panel = OtpComponent::panel_area(Rect::new(0, 0, 80, 24), usize::MAX);
        assert_eq!(panel.width, 80);
    }
}
