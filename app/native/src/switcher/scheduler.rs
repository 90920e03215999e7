//! Timer tasks owned by a single switch generation.
//!
//! Tasks never touch coordinator state. They only send generation-tagged
//! messages back to the actor, which discards anything stale. The poll loop
//! also watches the confirming generation and exits on its own once that
//! generation is no longer being confirmed.

use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, MissedTickBehavior};

use super::messages::SwitchMessage;

/// Sends `msg` to the actor if it is still running.
async fn deliver(sender: &mpsc::WeakSender<SwitchMessage>, msg: SwitchMessage) -> bool {
    match sender.upgrade() {
        Some(tx) => tx.send(msg).await.is_ok(),
        None => false,
    }
}

/// Starts the poll loop for `generation`.
///
/// The first tick fires one interval after the call.
pub(super) fn spawn_poller(
    generation: u64,
    interval: Duration,
    sender: mpsc::WeakSender<SwitchMessage>,
    mut confirming: watch::Receiver<Option<u64>>,
) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if *confirming.borrow() != Some(generation) {
                        break;
                    }
                    if !deliver(&sender, SwitchMessage::PollTick { generation }).await {
                        break;
                    }
                }
                changed = confirming.changed() => {
                    if changed.is_err() || *confirming.borrow_and_update() != Some(generation) {
                        break;
                    }
                }
            }
        }

        tracing::trace!(generation, "switcher: poll loop stopped");
    });
}

/// Arms the confirmation deadline for `generation`.
pub(super) fn spawn_timeout(
    generation: u64,
    timeout: Duration,
    sender: mpsc::WeakSender<SwitchMessage>,
) {
    tokio::spawn(async move {
        tokio::time::sleep(timeout).await;
        deliver(&sender, SwitchMessage::ConfirmTimeout { generation }).await;
    });
}

/// Arms the success grace timer for `generation`.
pub(super) fn spawn_reset(generation: u64, grace: Duration, sender: mpsc::WeakSender<SwitchMessage>) {
    tokio::spawn(async move {
        tokio::time::sleep(grace).await;
        deliver(&sender, SwitchMessage::GraceElapsed { generation }).await;
    });
}
