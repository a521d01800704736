//! Outlet — an on/off plug without scenes.

use lumenhub_domain::device::GatewayTarget;
use lumenhub_domain::event::EventKind;
use lumenhub_domain::id::DeviceId;
use lumenhub_domain::light_state::LightState;
use lumenhub_domain::telemetry::Payload;

use super::TelemetryHandler;
use crate::context::Context;
use crate::outbox::Activation;

#[derive(Debug)]
pub struct Outlet {
    id: DeviceId,
    target: GatewayTarget,
    name: String,
    state: LightState,
}

impl Outlet {
    #[must_use]
    pub fn new(
        id: DeviceId,
        target: GatewayTarget,
        name: impl Into<String>,
        initial: LightState,
    ) -> Self {
        Self {
            id,
            target,
            name: name.into(),
            state: initial,
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
    pub fn is_on(&self) -> bool {
        self.state.on == Some(true)
    }

    pub fn switch_on(&mut self, ctx: &mut Context) {
        self.switch(true, ctx);
    }

    pub fn switch_off(&mut self, ctx: &mut Context) {
        self.switch(false, ctx);
    }

    /// Set the authoritative `on` flag and send it.
    pub fn switch(&mut self, on: bool, ctx: &mut Context) {
        tracing::info!(outlet = %self.id, on, "switching outlet");
        self.state.on = Some(on);
        ctx.activate(Activation {
            device: self.id.clone(),
            target: self.target.clone(),
            state: LightState {
                on: Some(on),
                ..LightState::default()
            },
        });
        ctx.emit(Some(&self.id), EventKind::OutletSwitched { on });
    }
}

impl TelemetryHandler for Outlet {
    fn id(&self) -> &DeviceId {
        &self.id
    }

    fn handle_telemetry(&mut self, payload: &Payload, ctx: &mut Context) {
        let Payload::State(map) = payload else {
            tracing::debug!(outlet = %self.id, "ignoring button payload");
            return;
        };
        let (state, rejected) = LightState::from_fields(map);
        if !rejected.is_empty() {
            tracing::warn!(outlet = %self.id, fields = ?rejected, "dropping unparsable state fields");
        }
        if !map.is_empty() && rejected.len() == map.len() {
            return;
        }
        self.state.merge(&state);
        ctx.emit(
            Some(&self.id),
            EventKind::StateMerged {
                delta: serde_json::Value::Object(map.clone()),
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::testing::Harness;

    fn outlet(on: bool) -> Outlet {
        Outlet::new(
            DeviceId::from("plug"),
            GatewayTarget::light("7"),
            "Heater",
            LightState {
                on: Some(on),
                reachable: Some(true),
                ..LightState::default()
            },
        )
    }

    #[test]
    fn should_send_only_on_flag_when_switching() {
        let mut h = Harness::new();
        let mut outlet = outlet(false);
        outlet.switch_on(&mut h.ctx);

        assert!(outlet.is_on());
        let sent = h.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(
            sent[0].state,
            LightState {
                on: Some(true),
                ..LightState::default()
            }
        );
        assert_eq!(h.event_names(), vec!["switched_on"]);
    }

    #[test]
    fn should_track_inbound_on_flag() {
        let mut h = Harness::new();
        let mut outlet = outlet(true);
        let payload = Payload::State(
            serde_json::json!({"on": false})
                .as_object()
                .cloned()
                .unwrap(),
        );
        outlet.handle_telemetry(&payload, &mut h.ctx);
        assert!(!outlet.is_on());
    }

    #[test]
    fn should_track_on_flag_next_to_unknown_alert() {
        let mut h = Harness::new();
        let mut outlet = outlet(false);
        let payload = Payload::State(
            serde_json::json!({"on": true, "alert": "blink"})
                .as_object()
                .cloned()
                .unwrap(),
        );
        outlet.handle_telemetry(&payload, &mut h.ctx);
        assert!(outlet.is_on());
        assert_eq!(h.event_names(), vec!["state_changed"]);
    }
}
