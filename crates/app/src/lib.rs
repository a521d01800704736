//! # lumenhub-app
//!
//! Application layer — the hub loop, device behaviours and **port
//! definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `Gateway`: catalog fetch and state activation
//!   - `EventPublisher`: fan-out of hub events
//! - Own every device in one [`registry::DeviceRegistry`] and route inbound
//!   telemetry to it
//! - Compose per-light scenes, decode remote gestures, and manage scene
//!   expiry and hold-repeat timers
//! - Run automations against the events the hub publishes
//! - Provide **in-process infrastructure** (event bus, outbox) that doesn't need IO
//!
//! ## Dependency rule
//! Depends on `lumenhub-domain` only (plus `tokio` for channels and timers).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod automation_engine;
pub mod context;
pub mod devices;
pub mod event_bus;
pub mod hub;
pub mod message;
pub mod outbox;
pub mod ports;
pub mod registry;
pub mod room;
pub mod timer;
