use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent};
use otpgate_types::{Effect, Msg};
use ratatui::{
    prelude::*,
    style::Style,
    widgets::Paragraph,
};

use super::components::{Component, OtpComponent, ToastComponent};
use crate::app::App;

/// Root view: the OTP widget, the hint bar and toast overlay.
#[derive(Debug, Default)]
pub struct MainView {
    pub content_view: OtpComponent,
    pub toast_view: ToastComponent,
}

impl MainView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Effects that must run once before the first frame.
    pub fn mount(&mut self, app: &mut App) -> Vec<Effect> {
        self.content_view.mount_effects(app)
    }

    /// Puts focus back on the slot under the cursor when nothing is focused.
    pub fn restore_focus(&mut self, app: &mut App) {
        let flag = app.otp.cursor_flag().clone();
        app.focus.focus(&flag);
    }

    pub fn handle_message(&mut self, app: &mut App, msg: Msg) -> Vec<Effect> {
        if let Msg::Tick = msg {
            app.on_tick();
        }
        self.content_view.update(app, &msg)
    }

    fn get_preferred_layout(area: Rect) -> [Rect; 2] {
        Layout::vertical([
            Constraint::Min(1),    // Main view
            Constraint::Length(1), // Hints bar
        ])
        .areas(area)
    }
}

impl Component for MainView {
    fn handle_key_events(&mut self, app: &mut App, key: KeyEvent) -> Vec<Effect> {
        if key.code == KeyCode::Esc || (key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL)) {
            return vec![Effect::Quit];
        }
        self.content_view.handle_key_events(app, key)
    }

    fn handle_paste_events(&mut self, app: &mut App, text: &str) -> Vec<Effect> {
        self.content_view.handle_paste_events(app, text)
    }

    fn handle_mouse_events(&mut self, app: &mut App, mouse: MouseEvent) -> Vec<Effect> {
        if self.toast_view.dismiss_at(app, mouse) {
            return Vec::new();
        }
        self.content_view.handle_mouse_events(app, mouse)
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, app: &mut App) {
        // Fill the entire background with the theme's background color for consistency
        let bg_fill = Paragraph::new("").style(Style::default().bg(app.ctx.theme.roles().background));
        frame.render_widget(bg_fill, area);

        let [main_area, hints_area] = Self::get_preferred_layout(area);
        self.content_view.render(frame, main_area, app);

        let hints_widget = Paragraph::new(Line::from(self.get_hint_spans(app))).style(app.ctx.theme.text_muted_style());
        frame.render_widget(hints_widget, hints_area);

        self.toast_view.render(frame, main_area, app);
    }

    fn get_hint_spans(&self, app: &App) -> Vec<Span<'static>> {
        let mut hint_spans = vec![Span::styled("Hints: ", app.ctx.theme.text_muted_style())];
        hint_spans.extend(self.content_view.get_hint_spans(app));
        hint_spans
    }
}
