//! Once-per-second resend countdown.
//!
//! The countdown is a spawned Tokio task that posts `Msg::CountdownTick`
//! into the runtime's message channel. [`ResendCountdown`] owns the task's
//! abort handle: restarting, cancelling or dropping the handle stops the
//! task, so no tick can reach a widget that has been torn down.

use std::time::Duration;

use otpgate_types::{Msg, WidgetInstanceId};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::AbortHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::debug;

const TICK: Duration = Duration::from_secs(1);

#[derive(Debug, Default)]
pub struct ResendCountdown {
    task: Option<AbortHandle>,
}

impl ResendCountdown {
    pub fn new() -> Self {
        Self { task: None }
    }

    /// Starts ticking for `seconds` seconds, replacing any running countdown.
    ///
    /// The task stops on its own after the last tick or when the receiving
    /// side of `sender` is gone. Must be called from within a Tokio runtime.
    pub fn start(&mut self, instance: WidgetInstanceId, seconds: u32, sender: UnboundedSender<Msg>) {
        self.cancel();
        if seconds == 0 {
            return;
        }
        debug!(%instance, seconds, "starting resend countdown");
        let handle = tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + TICK, TICK);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            for _ in 0..seconds {
                interval.tick().await;
                if sender.send(Msg::CountdownTick(instance)).is_err() {
                    break;
                }
            }
        });
        self.task = Some(handle.abort_handle());
    }

    /// Stops the running countdown, if any.
    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Drop for ResendCountdown {
    fn drop(&mut self) {
        self.cancel();
    }
}
