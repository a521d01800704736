//! Hub context — the side-effect sinks handed to devices while they handle
//! a message: the timer scheduler, the outbox, and pending events.

use std::time::Duration;

use lumenhub_domain::event::{Event, EventKind};
use lumenhub_domain::id::DeviceId;

use crate::outbox::{Activation, Outbox};
use crate::timer::Scheduler;

/// Default interval between `tick_*` gestures while a button is held.
pub const DEFAULT_HOLD_REPEAT: Duration = Duration::from_millis(400);

/// Default transition time attached to activations, in tenths of a second.
pub const DEFAULT_TRANSITION: u16 = 4;

/// Default lifetime of scenes created by automations.
pub const DEFAULT_SCENE_TTL: Duration = Duration::from_secs(120);

/// Runtime tunables of the hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HubSettings {
    pub hold_repeat_interval: Duration,
    pub default_transition: u16,
    pub default_scene_ttl: Duration,
}

impl Default for HubSettings {
    fn default() -> Self {
        Self {
            hold_repeat_interval: DEFAULT_HOLD_REPEAT,
            default_transition: DEFAULT_TRANSITION,
            default_scene_ttl: DEFAULT_SCENE_TTL,
        }
    }
}

/// Effects produced while handling one hub message.
#[derive(Debug)]
pub struct Context {
    scheduler: Scheduler,
    outbox: Outbox,
    settings: HubSettings,
    events: Vec<Event>,
}

impl Context {
    #[must_use]
    pub fn new(scheduler: Scheduler, outbox: Outbox, settings: HubSettings) -> Self {
        Self {
            scheduler,
            outbox,
            settings,
            events: Vec::new(),
        }
    }

    #[must_use]
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    #[must_use]
    pub fn settings(&self) -> &HubSettings {
        &self.settings
    }

    pub fn activate(&self, activation: Activation) {
        self.outbox.send(activation);
    }

    /// Queue an event for publication once the current message is handled.
    pub fn emit(&mut self, device: Option<&DeviceId>, kind: EventKind) {
        self.events.push(Event::new(device.cloned(), kind));
    }

    /// Take the events queued so far.
    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Context wired to plain channels for unit tests.

    use tokio::sync::mpsc;

    use super::{Context, HubSettings};
    use crate::message::HubMessage;
    use crate::outbox::{Activation, Outbox};
    use crate::timer::Scheduler;

    pub(crate) struct Harness {
        pub ctx: Context,
        pub messages: mpsc::UnboundedReceiver<HubMessage>,
        pub activations: mpsc::UnboundedReceiver<Activation>,
    }

    impl Harness {
        pub(crate) fn new() -> Self {
            Self::with_settings(HubSettings::default())
        }

        pub(crate) fn with_settings(settings: HubSettings) -> Self {
            let (tx, messages) = mpsc::unbounded_channel();
            let (outbox, activations) = Outbox::channel();
            Self {
                ctx: Context::new(Scheduler::new(tx), outbox, settings),
                messages,
                activations,
            }
        }

        /// Every activation sent so far.
        pub(crate) fn sent(&mut self) -> Vec<Activation> {
            let mut sent = Vec::new();
            while let Ok(activation) = self.activations.try_recv() {
                sent.push(activation);
            }
            sent
        }

        /// Names of every event emitted so far.
        pub(crate) fn event_names(&mut self) -> Vec<String> {
            self.ctx
                .drain_events()
                .iter()
                .map(lumenhub_domain::event::Event::name)
                .collect()
        }
    }
}
