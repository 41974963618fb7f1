//! Component system for the otpgate TUI.
//!
//! Components are self-contained UI elements: they own local behavior,
//! mutate `App` state in response to input and messages, and report side
//! effects back to the runtime as [`Effect`]s instead of performing them.

use crossterm::event::{KeyEvent, MouseEvent};
use otpgate_types::{Effect, Msg};
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::text::Span;

use crate::app::App;

/// A UI component with its own behavior.
///
/// # Component Lifecycle
///
/// 1. **Mount**: `mount_effects()` is called once when the component is shown
/// 2. **Event Handling**: keys, pastes and mouse events arrive through the `handle_*` methods
/// 3. **State Updates**: `update()` processes application messages
/// 4. **Rendering**: `render()` draws the component into the provided area
pub(crate) trait Component {
    /// Effects to run once when the component is mounted.
    fn mount_effects(&mut self, _app: &mut App) -> Vec<Effect> {
        Vec::new()
    }

    /// Handle key events when this component has focus.
    fn handle_key_events(&mut self, _app: &mut App, _key: KeyEvent) -> Vec<Effect> {
        Vec::new()
    }

    /// Handle a bracketed paste.
    fn handle_paste_events(&mut self, _app: &mut App, _text: &str) -> Vec<Effect> {
        Vec::new()
    }

    /// Handle mouse events.
    fn handle_mouse_events(&mut self, _app: &mut App, _mouse: MouseEvent) -> Vec<Effect> {
        Vec::new()
    }

    /// Update internal state based on an application message.
    ///
    /// Called for every message; components ignore what is not theirs.
    fn update(&mut self, _app: &mut App, _msg: &Msg) -> Vec<Effect> {
        Vec::new()
    }

    /// Render the component into the given area.
    ///
    /// Implementations should be side-effect free except for frame drawing,
    /// cursor placement and remembering hit areas for mouse handling.
    fn render(&mut self, frame: &mut Frame, rect: Rect, app: &mut App);

    /// Key hints shown in the hint bar while this component is active.
    fn get_hint_spans(&self, _app: &App) -> Vec<Span<'static>> {
        Vec::new()
    }
}
