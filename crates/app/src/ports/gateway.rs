//! Gateway port — the downstream device bridge.
//!
//! A gateway owns the radio side of the installation. The hub reads its
//! catalog once at startup, receives live telemetry from it (delivered
//! through [`HubHandle::telemetry`](crate::hub::HubHandle::telemetry)) and
//! sends it state activations.

use std::future::Future;

use lumenhub_domain::device::{DeviceSnapshot, GatewayTarget};
use lumenhub_domain::error::HubError;
use lumenhub_domain::light_state::LightState;

/// Downstream device bridge.
///
/// Implementations live in adapter crates (e.g. `lumenhub-adapter-virtual`).
pub trait Gateway {
    /// Unique name identifying this gateway (e.g. `"virtual"`).
    fn name(&self) -> &'static str;

    /// Snapshot of every device the gateway knows about.
    fn fetch_catalog(&self) -> impl Future<Output = Result<Vec<DeviceSnapshot>, HubError>> + Send;

    /// Push `state` to `target`.
    ///
    /// Fire-and-forget from the hub's point of view: failures are logged by
    /// the dispatcher and never retried.
    fn activate_state(
        &self,
        target: &GatewayTarget,
        state: &LightState,
    ) -> impl Future<Output = Result<(), HubError>> + Send;
}

impl<T: Gateway + Send + Sync> Gateway for std::sync::Arc<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn fetch_catalog(&self) -> impl Future<Output = Result<Vec<DeviceSnapshot>, HubError>> + Send {
        (**self).fetch_catalog()
    }

    fn activate_state(
        &self,
        target: &GatewayTarget,
        state: &LightState,
    ) -> impl Future<Output = Result<(), HubError>> + Send {
        (**self).activate_state(target, state)
    }
}
