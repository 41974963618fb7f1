//! Runtime: unified event loop and input routing for the TUI.
//!
//! Responsibilities
//! - Own the terminal lifecycle (raw mode, alternate screen, mouse capture,
//!   bracketed paste so a paste arrives as one event).
//! - Drive a single `tokio::select!` loop over terminal input, the message
//!   channel (countdown ticks), pending collaborator calls, a UI ticker and
//!   Ctrl+C.
//! - Route input to the main view and execute returned `Effect`s.
//!
//! Unified Event Loop Strategy
//! - A dedicated input thread blocks on `crossterm::event::read()` and
//!   forwards events over a channel, keeping blocking reads off the runtime.
//! - Smart ticking: fast interval (100 ms) only while something animates
//!   (busy indicator, toasts); long interval (5 s) when idle.
//! - Rendering happens only after something changed.
use std::io::Stdout;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::{self, DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture, Event},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures_util::{StreamExt, stream::FuturesUnordered};
use otpgate_api::AuthClient;
use otpgate_types::{Effect, ExecOutcome, Msg};
use rat_focus::FocusBuilder;
use ratatui::{Terminal, prelude::*};
use tokio::task::JoinHandle;
use tokio::{
    signal,
    sync::mpsc,
    time::{self, MissedTickBehavior},
};
use tracing::{info, warn};

use crate::app::{App, SharedCtx};
use crate::cmd;
use crate::ui::components::component::Component;
use crate::ui::components::otp::{OtpOptions, VerificationState};
use crate::ui::main_component::MainView;
use crate::ui::theme;

/// How the interactive session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The code was accepted.
    Verified,
    /// The user left before a code was accepted.
    Cancelled,
}

const FAST_TICK: Duration = Duration::from_millis(100);
const IDLE_TICK: Duration = Duration::from_millis(5000);

/// Spawn a dedicated input thread that blocks on terminal input and forwards
/// `crossterm` events over a Tokio channel. The thread ends when the
/// receiver is dropped or reading fails.
fn spawn_input_thread() -> mpsc::Receiver<Event> {
    let (sender, receiver) = mpsc::channel(500);
    std::thread::spawn(move || {
        loop {
            match event::poll(Duration::from_millis(250)) {
                Ok(true) => match event::read() {
                    Ok(event) => {
                        if sender.blocking_send(event).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!("Failed to read event: {}", e);
                        break;
                    }
                },
                Ok(false) if sender.is_closed() => break,
                Ok(false) => {}
                Err(e) => {
                    warn!("Failed to poll events: {}", e);
                    break;
                }
            }
        }
    });
    receiver
}

/// Put the terminal into raw mode and enter the alternate screen.
fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture, EnableBracketedPaste).context("enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Restore terminal settings and leave the alternate screen.
fn cleanup_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), DisableBracketedPaste, LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;
    Ok(())
}

fn render(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App, main_view: &mut MainView) -> Result<()> {
    // Rebuild focus just before rendering so the graph stays in sync
    let old_focus = std::mem::take(&mut app.focus);
    app.focus = Rc::new(FocusBuilder::rebuild_for(&app.otp, Some(Rc::unwrap_or_clone(old_focus))));
    if app.focus.focused().is_none() {
        main_view.restore_focus(app);
    }
    terminal.draw(|frame| main_view.render(frame, frame.area(), app))?;
    Ok(())
}

fn handle_input_event(app: &mut App, main_view: &mut MainView, input_event: Event) -> Vec<Effect> {
    match input_event {
        Event::Key(key_event) if key_event.kind == event::KeyEventKind::Press => main_view.handle_key_events(app, key_event),
        Event::Mouse(mouse_event) => main_view.handle_mouse_events(app, mouse_event),
        Event::Paste(text) => main_view.handle_paste_events(app, &text),
        Event::Resize(width, height) => main_view.handle_message(app, Msg::Resize(width, height)),
        Event::Key(_) | Event::FocusGained | Event::FocusLost => Vec::new(),
    }
}

/// Executes queued effects. Returns `true` once `Quit` was requested.
fn process_effects(app: &mut App, effects: &mut Vec<Effect>, pending_execs: &mut FuturesUnordered<JoinHandle<ExecOutcome>>) -> bool {
    let quit_requested = effects.extract_if(0.., |effect| matches!(effect, Effect::Quit)).count() > 0;
    if effects.is_empty() {
        return quit_requested;
    }
    let effects_to_process = std::mem::take(effects);
    let pending = cmd::run_from_effects(app, effects_to_process);
    if !pending.is_empty() && pending_execs.is_empty() {
        app.throbber_idx = 0;
    }
    pending_execs.extend(pending);
    quit_requested
}

/// Entry point for the TUI runtime: sets up the terminal, mounts the widget,
/// runs the event loop, and restores the terminal on exit.
pub async fn run_app(
    client: Arc<dyn AuthClient>,
    email: String,
    options: OtpOptions,
    preferred_theme: Option<&str>,
) -> Result<RunOutcome> {
    let (msg_sender, mut msg_receiver) = mpsc::unbounded_channel();
    let ctx = SharedCtx {
        theme: theme::load(preferred_theme),
        client,
        email,
    };
    let mut app = App::new(ctx, options, msg_sender);
    let mut main_view = MainView::new();

    let mut input_receiver = spawn_input_thread();
    let mut terminal = setup_terminal()?;
    info!(instance = %app.otp.instance(), length = app.otp.length(), "otp widget mounted");

    let mut pending_execs: FuturesUnordered<JoinHandle<ExecOutcome>> = FuturesUnordered::new();
    let mut effects: Vec<Effect> = main_view.mount(&mut app);
    process_effects(&mut app, &mut effects, &mut pending_execs);

    // Ticking strategy: fast while animating, very slow when idle.
    let mut current_interval = IDLE_TICK;
    let mut ticker = time::interval(current_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let result = async {
        render(&mut terminal, &mut app, &mut main_view)?;
        loop {
            let target_interval = if app.needs_animation() { FAST_TICK } else { IDLE_TICK };
            if target_interval != current_interval {
                current_interval = target_interval;
                ticker = time::interval(current_interval);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            }

            let mut needs_render = false;
            tokio::select! {
                // Terminal input events
                maybe_event = input_receiver.recv() => {
                    let Some(event) = maybe_event else {
                        // Input channel closed; shut down cleanly.
                        break;
                    };
                    effects.extend(handle_input_event(&mut app, &mut main_view, event));
                    needs_render = true;
                }

                // Countdown ticks and other posted messages
                Some(msg) = msg_receiver.recv() => {
                    effects.extend(main_view.handle_message(&mut app, msg));
                    needs_render = true;
                }

                Some(joined) = pending_execs.next(), if !pending_execs.is_empty() => {
                    match joined {
                        Ok(outcome) => {
                            effects.extend(main_view.handle_message(&mut app, Msg::ExecCompleted(Box::new(outcome))));
                        }
                        Err(error) => warn!(%error, "collaborator task failed to complete"),
                    }
                    needs_render = true;
                }

                // Periodic animation tick
                _ = ticker.tick() => {
                    let animating = app.needs_animation();
                    effects.extend(main_view.handle_message(&mut app, Msg::Tick));
                    needs_render = animating;
                }

                _ = signal::ctrl_c() => { break; }
            }

            if process_effects(&mut app, &mut effects, &mut pending_execs) {
                break;
            }

            if needs_render {
                render(&mut terminal, &mut app, &mut main_view)?;
            }
        }
        Ok::<(), anyhow::Error>(())
    }
    .await;

    app.countdown.cancel();
    cleanup_terminal(&mut terminal)?;
    result?;

    let outcome = if app.otp.verification() == VerificationState::Verified {
        RunOutcome::Verified
    } else {
        RunOutcome::Cancelled
    };
    info!(?outcome, "otp session finished");
    Ok(outcome)
}
