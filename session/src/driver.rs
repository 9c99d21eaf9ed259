//! Async driver composing the three race arms with `tokio::select!`.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use crate::channel::{MessageChannel, WindowMessage};
use crate::orchestrator::{SessionPhase, VerificationSession};

/// Drive a session in `AwaitingOutcome` to resolution.
///
/// Races the message listener (the mpsc receiver), the popup liveness poll,
/// and the session deadline. The session's own phase guard makes the race
/// single-resolution: whichever arm fires first settles it, later arms are
/// no-ops, and cleanup runs exactly once inside the state machine.
pub async fn drive(
    mut session: VerificationSession,
    mut messages: mpsc::Receiver<WindowMessage>,
    channel: &MessageChannel,
    poll_interval: Duration,
    deadline: Duration,
) -> VerificationSession {
    if session.phase() != SessionPhase::AwaitingOutcome {
        return session;
    }

    let mut poll = tokio::time::interval(poll_interval);
    poll.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // The first interval tick completes immediately; consume it so the
    // popup gets a chance to exist before the first liveness check.
    poll.tick().await;

    let timeout = tokio::time::sleep(deadline);
    tokio::pin!(timeout);

    let mut listener_open = true;
    loop {
        tokio::select! {
            maybe_message = messages.recv(), if listener_open => {
                match maybe_message {
                    Some(message) => {
                        session.on_message(channel, &message);
                    }
                    // Listener bridge gone: only poll and deadline remain.
                    None => listener_open = false,
                }
            }
            _ = poll.tick() => {
                session.on_poll_tick();
            }
            _ = &mut timeout => {
                session.on_deadline();
            }
        }

        if session.resolution().is_some() {
            return session;
        }
    }
}

