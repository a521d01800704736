//! Device snapshot — one entry of the catalog fetched from the gateway at
//! startup.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::catalog::ModelKey;
use crate::error::{HubError, ValidationError};
use crate::id::DeviceId;

/// Resource family on the gateway, selecting the outbound path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Light,
    Sensor,
}

/// Where commands for a device are sent on the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GatewayTarget {
    pub resource: ResourceKind,
    pub id: String,
}

impl GatewayTarget {
    #[must_use]
    pub fn light(id: impl Into<String>) -> Self {
        Self {
            resource: ResourceKind::Light,
            id: id.into(),
        }
    }

    /// The REST path of the target's state resource.
    #[must_use]
    pub fn state_path(&self) -> String {
        match self.resource {
            ResourceKind::Light => format!("/lights/{}/state", self.id),
            ResourceKind::Sensor => format!("/sensors/{}/state", self.id),
        }
    }
}

impl fmt::Display for GatewayTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.state_path())
    }
}

/// A device as reported by the gateway catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceSnapshot {
    pub resource: ResourceKind,
    /// Gateway-local resource id, e.g. `"3"` for `/lights/3`.
    #[serde(rename = "id")]
    pub gateway_id: String,
    #[serde(rename = "uniqueid")]
    pub unique_id: DeviceId,
    pub name: String,
    #[serde(flatten)]
    pub model: ModelKey,
    #[serde(default)]
    pub state: serde_json::Value,
}

impl DeviceSnapshot {
    /// Create a builder for constructing a [`DeviceSnapshot`].
    #[must_use]
    pub fn builder() -> DeviceSnapshotBuilder {
        DeviceSnapshotBuilder::default()
    }

    #[must_use]
    pub fn target(&self) -> GatewayTarget {
        GatewayTarget {
            resource: self.resource,
            id: self.gateway_id.clone(),
        }
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Validation`] when the unique id is empty.
    pub fn validate(&self) -> Result<(), HubError> {
        if self.unique_id.is_empty() {
            return Err(ValidationError::EmptyIdentifier.into());
        }
        Ok(())
    }
}

/// Step-by-step builder for [`DeviceSnapshot`].
#[derive(Debug, Default)]
pub struct DeviceSnapshotBuilder {
    resource: Option<ResourceKind>,
    gateway_id: Option<String>,
    unique_id: Option<DeviceId>,
    name: Option<String>,
    model: Option<ModelKey>,
    state: Option<serde_json::Value>,
}

impl DeviceSnapshotBuilder {
    #[must_use]
    pub fn resource(mut self, resource: ResourceKind) -> Self {
        self.resource = Some(resource);
        self
    }

    #[must_use]
    pub fn gateway_id(mut self, id: impl Into<String>) -> Self {
        self.gateway_id = Some(id.into());
        self
    }

    #[must_use]
    pub fn unique_id(mut self, id: impl Into<DeviceId>) -> Self {
        self.unique_id = Some(id.into());
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn model(mut self, model: ModelKey) -> Self {
        self.model = Some(model);
        self
    }

    #[must_use]
    pub fn state(mut self, state: serde_json::Value) -> Self {
        self.state = Some(state);
        self
    }

    /// Consume the builder, validate, and return a [`DeviceSnapshot`].
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Validation`] if the unique id is missing or empty.
    pub fn build(self) -> Result<DeviceSnapshot, HubError> {
        let snapshot = DeviceSnapshot {
            resource: self.resource.unwrap_or(ResourceKind::Light),
            gateway_id: self.gateway_id.unwrap_or_default(),
            unique_id: self.unique_id.unwrap_or_default(),
            name: self.name.unwrap_or_default(),
            model: self
                .model
                .unwrap_or_else(|| ModelKey::new(String::new(), String::new(), String::new())),
            state: self.state.unwrap_or(serde_json::Value::Null),
        };
        snapshot.validate()?;
        Ok(snapshot)
    }
}
