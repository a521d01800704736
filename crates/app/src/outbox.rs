//! Outbox — outbound activations and their dispatcher.
//!
//! Devices push one [`Activation`] per recompute; the dispatcher spawns a
//! gateway call for each, so a slow gateway never blocks event processing.
//! Calls are not serialized per device: the gateway sees last-write-wins.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use lumenhub_domain::device::GatewayTarget;
use lumenhub_domain::id::DeviceId;
use lumenhub_domain::light_state::LightState;

use crate::ports::Gateway;

/// A state to push to one device.
#[derive(Debug, Clone, PartialEq)]
pub struct Activation {
    pub device: DeviceId,
    pub target: GatewayTarget,
    pub state: LightState,
}

/// Sending half of the activation queue.
#[derive(Debug, Clone)]
pub struct Outbox {
    sender: mpsc::UnboundedSender<Activation>,
}

impl Outbox {
    /// Create an outbox and the receiver its dispatcher drains.
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Activation>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    /// Queue an activation. Dropped with a warning once the dispatcher is gone.
    pub fn send(&self, activation: Activation) {
        if let Err(err) = self.sender.send(activation) {
            tracing::warn!(device = %err.0.device, "outbox closed, activation dropped");
        }
    }
}

/// Drain `receiver`, sending each activation to `gateway` on its own task.
pub fn spawn_dispatcher<G>(
    gateway: Arc<G>,
    mut receiver: mpsc::UnboundedReceiver<Activation>,
) -> JoinHandle<()>
where
    G: Gateway + Send + Sync + 'static,
{
    tokio::spawn(async move {
        while let Some(activation) = receiver.recv().await {
            let gateway = Arc::clone(&gateway);
            tokio::spawn(async move {
                tracing::debug!(
                    device = %activation.device,
                    path = %activation.target,
                    "activating state"
                );
                if let Err(err) = gateway
                    .activate_state(&activation.target, &activation.state)
                    .await
                {
                    tracing::error!(
                        device = %activation.device,
                        path = %activation.target,
                        error = %err,
                        "gateway rejected activation"
                    );
                }
            });
        }
        tracing::debug!("outbox dispatcher stopped");
    })
}
