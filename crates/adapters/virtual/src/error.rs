//! Virtual gateway error types.

use lumenhub_domain::error::HubError;

/// Errors specific to the virtual gateway.
#[derive(Debug, thiserror::Error)]
pub enum VirtualError {
    /// No simulated device lives at the activation path.
    #[error("no simulated device at {0}")]
    UnknownTarget(String),

    /// No simulated device has the given unique id.
    #[error("no simulated device with unique id {0}")]
    UnknownDevice(String),

    /// The activated state could not be turned into a telemetry map.
    #[error("failed to encode state")]
    Encode(#[source] serde_json::Error),
}

impl VirtualError {
    /// Convert into a [`HubError::Gateway`] for propagation across port
    /// boundaries.
    pub fn into_domain(self) -> HubError {
        HubError::Gateway(Box::new(self))
    }
}

impl From<VirtualError> for HubError {
    fn from(err: VirtualError) -> Self {
        err.into_domain()
    }
}
