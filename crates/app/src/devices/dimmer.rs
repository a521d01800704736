//! Dimmer — a button remote and its gesture state machine.
//!
//! Raw button codes are decoded through the remote's [`ButtonLayout`].
//! A hold start arms a periodic timer that emits `tick_*` gestures until
//! the matching release; a second hold start while holding is ignored.

use lumenhub_domain::event::EventKind;
use lumenhub_domain::gesture::{ButtonEvent, ButtonLayout, Control, Gesture};
use lumenhub_domain::id::DeviceId;
use lumenhub_domain::telemetry::Payload;

use super::TelemetryHandler;
use crate::context::Context;
use crate::timer::{Timer, TimerTarget, TimerToken};

#[derive(Debug)]
pub struct Dimmer {
    id: DeviceId,
    name: String,
    layout: ButtonLayout,
    inverted: bool,
    /// Control being held; `Some` iff `hold_timer` is armed.
    holding: Option<Control>,
    hold_timer: Timer,
}

impl Dimmer {
    #[must_use]
    pub fn new(id: DeviceId, name: impl Into<String>, layout: ButtonLayout) -> Self {
        Self {
            id,
            name: name.into(),
            layout,
            inverted: false,
            holding: None,
            hold_timer: Timer::idle(),
        }
    }

    #[must_use]
    pub fn id(&self) -> &DeviceId {
        &self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn layout(&self) -> ButtonLayout {
        self.layout
    }

    #[must_use]
    pub fn is_inverted(&self) -> bool {
        self.inverted
    }

    /// Mark the remote as mounted upside down.
    pub fn set_inverted(&mut self, inverted: bool) {
        self.inverted = inverted;
    }

    #[must_use]
    pub fn is_holding(&self) -> bool {
        self.holding.is_some()
    }

    /// Translate a raw vendor code into gestures.
    pub fn handle_code(&mut self, raw: u32, ctx: &mut Context) {
        let Some(action) = self.layout.decode(self.inverted, raw) else {
            tracing::warn!(remote = %self.id, code = raw, layout = ?self.layout, "unknown button code");
            return;
        };
        let control = action.control;

        let gesture = match action.event {
            ButtonEvent::HoldStart => {
                if self.holding.is_some() {
                    tracing::debug!(remote = %self.id, "hold already active, ignoring");
                    return;
                }
                self.hold_timer.arm_periodic(
                    ctx.scheduler(),
                    ctx.settings().hold_repeat_interval,
                    TimerTarget::HoldRepeat {
                        device: self.id.clone(),
                    },
                );
                self.holding = Some(control);
                Gesture::Hold(control)
            }
            ButtonEvent::Release => {
                self.end_hold();
                Gesture::Release(control)
            }
            ButtonEvent::ReleaseHold => {
                self.end_hold();
                Gesture::ReleaseHold(control)
            }
            ButtonEvent::Press => Gesture::Pressed(control),
            ButtonEvent::ShortRelease => Gesture::Released(control),
            ButtonEvent::DoublePress => Gesture::PressedDouble(control),
            ButtonEvent::TriplePress => Gesture::PressedTriple(control),
        };
        self.emit(gesture, ctx);
    }

    /// Handle a hold-repeat firing. Firings of a cancelled hold are dropped.
    pub fn tick(&mut self, token: TimerToken, ctx: &mut Context) {
        match self.holding {
            Some(control) if self.hold_timer.is_current(token) => {
                self.emit(Gesture::Tick(control), ctx);
            }
            _ => tracing::debug!(remote = %self.id, "discarding stale hold tick"),
        }
    }

    fn end_hold(&mut self) {
        self.hold_timer.cancel();
        self.holding = None;
    }

    fn emit(&self, gesture: Gesture, ctx: &mut Context) {
        tracing::debug!(remote = %self.id, %gesture, "gesture");
        ctx.emit(Some(&self.id), EventKind::Gesture { gesture });
    }
}

impl TelemetryHandler for Dimmer {
    fn id(&self) -> &DeviceId {
        &self.id
    }

    fn handle_telemetry(&mut self, payload: &Payload, ctx: &mut Context) {
        match payload {
            Payload::Button { code } => self.handle_code(*code, ctx),
            Payload::State(_) => tracing::debug!(remote = %self.id, "ignoring state payload"),
        }
    }
}
