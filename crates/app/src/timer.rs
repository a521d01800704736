//! Timers — scene expiry and button-hold repetition.
//!
//! A [`Timer`] is an owned, cancelable resource held by the object it acts
//! on (a scene slot, a remote). Arming spawns a tokio task that posts a
//! [`TimerFired`] message into the hub queue; the hub routes it back to the
//! owner, which only acts on it if the token still matches its armed timer.
//! A firing that was already queued when the timer was cancelled or
//! re-armed is therefore discarded.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use lumenhub_domain::id::DeviceId;

use crate::message::HubMessage;

/// Identifies one arming of a timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken(u64);

/// What a firing is about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerTarget {
    /// Delete `scene` from the light `device`.
    SceneExpiry { device: DeviceId, scene: String },
    /// Emit the next `tick_*` for the remote `device`.
    HoldRepeat { device: DeviceId },
}

/// Message posted when a timer elapses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerFired {
    pub token: TimerToken,
    pub target: TimerTarget,
}

/// Spawns timer tasks that post back into the hub queue.
#[derive(Debug, Clone)]
pub struct Scheduler {
    sender: mpsc::UnboundedSender<HubMessage>,
    next_token: Arc<AtomicU64>,
}

impl Scheduler {
    #[must_use]
    pub fn new(sender: mpsc::UnboundedSender<HubMessage>) -> Self {
        Self {
            sender,
            next_token: Arc::new(AtomicU64::new(1)),
        }
    }

    fn token(&self) -> TimerToken {
        TimerToken(self.next_token.fetch_add(1, Ordering::Relaxed))
    }

    fn spawn_once(&self, delay: Duration, target: TimerTarget) -> Armed {
        let token = self.token();
        let sender = self.sender.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if sender
                .send(HubMessage::TimerFired(TimerFired { token, target }))
                .is_err()
            {
                tracing::debug!(token = token.0, "hub stopped, timer firing dropped");
            }
        });
        Armed { token, handle }
    }

    fn spawn_periodic(&self, period: Duration, target: TimerTarget) -> Armed {
        let token = self.token();
        let sender = self.sender.clone();
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                let fired = TimerFired {
                    token,
                    target: target.clone(),
                };
                if sender.send(HubMessage::TimerFired(fired)).is_err() {
                    tracing::debug!(token = token.0, "hub stopped, periodic timer ends");
                    break;
                }
            }
        });
        Armed { token, handle }
    }
}

#[derive(Debug)]
struct Armed {
    token: TimerToken,
    handle: JoinHandle<()>,
}

/// A cancelable timer, idle or armed. Dropping it cancels it.
#[derive(Debug, Default)]
pub struct Timer {
    armed: Option<Armed>,
}

impl Timer {
    #[must_use]
    pub fn idle() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    /// Whether `token` belongs to the current arming.
    #[must_use]
    pub fn is_current(&self, token: TimerToken) -> bool {
        self.armed.as_ref().is_some_and(|a| a.token == token)
    }

    /// Arm a one-shot firing after `delay`, replacing any previous arming.
    pub fn arm_once(&mut self, scheduler: &Scheduler, delay: Duration, target: TimerTarget) {
        self.cancel();
        self.armed = Some(scheduler.spawn_once(delay, target));
    }

    /// Arm a firing every `period`, replacing any previous arming.
    pub fn arm_periodic(&mut self, scheduler: &Scheduler, period: Duration, target: TimerTarget) {
        self.cancel();
        self.armed = Some(scheduler.spawn_periodic(period, target));
    }

    /// Cancel the timer. Returns whether it was armed.
    pub fn cancel(&mut self) -> bool {
        match self.armed.take() {
            Some(armed) => {
                armed.handle.abort();
                true
            }
            None => false,
        }
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        self.cancel();
    }
}
