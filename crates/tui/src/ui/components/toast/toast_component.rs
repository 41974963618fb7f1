use crossterm::event::{MouseButton, MouseEvent, MouseEventKind};
use otpgate_types::Severity;
use ratatui::{
    Frame,
    layout::Rect,
    text::{Line, Span},
    widgets::{Clear, Paragraph, Wrap},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::app::App;
use crate::ui::components::{Component, hit_index};
use crate::ui::theme::theme_helpers as th;

const TOAST_WIDTH: u16 = 44;
const TOAST_HEIGHT: u16 = 3;

/// Stacked notifications in the top-right corner. Clicking a toast dismisses it.
#[derive(Debug, Default)]
pub struct ToastComponent {
    toast_areas: Vec<Rect>,
}

impl ToastComponent {
    fn icon(severity: Severity) -> &'static str {
        match severity {
            Severity::Info => "ℹ",
            Severity::Success => "✓",
            Severity::Warning => "!",
            Severity::Error => "✗",
        }
    }

    /// Areas for `count` toasts stacked downward from the top-right of `area`.
    fn layout(area: Rect, count: usize) -> Vec<Rect> {
        let width = TOAST_WIDTH.min(area.width);
        let x = area.x + area.width.saturating_sub(width);
        (0..count)
            .map(|index| Rect {
                x,
                y: area.y + 1 + TOAST_HEIGHT * index as u16,
                width,
                height: TOAST_HEIGHT,
            })
            .take_while(|rect| rect.bottom() <= area.bottom())
            .collect()
    }

    /// Cuts `message` to at most `max_width` display columns, ending with `…` when cut.
    fn fit_to_width(message: &str, max_width: usize) -> String {
        if message.width() <= max_width {
            return message.to_string();
        }
        let budget = max_width.saturating_sub(1);
        let mut used = 0;
        let mut fitted = String::new();
        for c in message.chars() {
            let width = c.width().unwrap_or(0);
            if used + width > budget {
                break;
            }
            used += width;
            fitted.push(c);
        }
        if max_width > 0 {
            fitted.push('…');
        }
        fitted
    }

    /// Dismisses the toast under a left click. Returns `true` when the click
    /// landed on a toast and must not reach the widgets beneath it.
    pub fn dismiss_at(&mut self, app: &mut App, mouse: MouseEvent) -> bool {
        if mouse.kind != MouseEventKind::Down(MouseButton::Left) {
            return false;
        }
        match hit_index(&self.toast_areas, mouse.column, mouse.row) {
            Some(index) => {
                app.toasts.dismiss(index);
                true
            }
            None => false,
        }
    }
}

impl Component for ToastComponent {
    fn render(&mut self, frame: &mut Frame, area: Rect, app: &mut App) {
        let theme = &*app.ctx.theme;
        self.toast_areas = Self::layout(area, app.toasts.len());
        for (toast, rect) in app.toasts.iter().zip(self.toast_areas.iter().copied()) {
            let style = theme.severity_style(toast.severity);
            let inner_width = rect.width.saturating_sub(4) as usize;
            let message = Self::fit_to_width(&toast.message, inner_width);
            let line = Line::from(vec![
                Span::styled(format!("{} ", Self::icon(toast.severity)), style),
                Span::styled(message, theme.text_primary_style()),
            ]);
            frame.render_widget(Clear, rect);
            frame.render_widget(
                Paragraph::new(line)
                    .wrap(Wrap { trim: true })
                    .block(th::block(theme, None, false).border_style(style)),
                rect,
            );
        }
    }
}
