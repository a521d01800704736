//! # lumenhub-domain
//!
//! Pure domain model for the lumenhub lighting hub.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - [`LightState`](light_state::LightState) values with merge and coercion rules
//! - **Scenes** and the compositor that resolves them into one light state
//! - **Gestures**: vendor button-code tables and semantic gesture names
//! - The device **catalog** mapping gateway models to behaviour classes
//! - Inbound **telemetry** and published **events**
//! - **Automations** (trigger → condition → action rules)
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod automation;
pub mod catalog;
pub mod composition;
pub mod device;
pub mod event;
pub mod gesture;
pub mod light_state;
pub mod scene;
pub mod telemetry;
