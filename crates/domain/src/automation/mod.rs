//! Automation — trigger → condition → action rules.
//!
//! Automations are the consumers of semantic events: a remote gesture or a
//! motion report selects a room scene, creates a timed overlay, steps a
//! brightness, or switches an outlet. Each automation has a [`Trigger`],
//! optional [`Condition`]s that must all hold, and one or more [`Action`]s.

mod action;
mod condition;
mod trigger;

pub use action::Action;
pub use condition::{Condition, parse_time_of_day};
pub use trigger::Trigger;

use serde::{Deserialize, Serialize};

use crate::error::{HubError, ValidationError};
use crate::id::AutomationId;
use crate::time::Timestamp;

/// A rule that reacts to events by executing actions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Automation {
    #[serde(default)]
    pub id: AutomationId,
    pub name: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub trigger: Trigger,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub actions: Vec<Action>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_triggered: Option<Timestamp>,
}

fn default_enabled() -> bool {
    true
}

impl Automation {
    /// Create a builder for constructing an [`Automation`].
    #[must_use]
    pub fn builder() -> AutomationBuilder {
        AutomationBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Validation`] when:
    /// - `name` is empty ([`ValidationError::EmptyName`])
    /// - `actions` is empty ([`ValidationError::NoActions`])
    /// - a time window is malformed ([`ValidationError::InvalidTimeOfDay`])
    pub fn validate(&self) -> Result<(), HubError> {
        if self.name.is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        if self.actions.is_empty() {
            return Err(ValidationError::NoActions.into());
        }
        self.conditions.iter().try_for_each(Condition::validate)
    }
}

/// Builder for [`Automation`]; the draft starts enabled with a manual trigger.
#[derive(Debug)]
pub struct AutomationBuilder {
    draft: Automation,
}

impl Default for AutomationBuilder {
    fn default() -> Self {
        Self {
            draft: Automation {
                id: AutomationId::new(),
                name: String::new(),
                enabled: true,
                trigger: Trigger::Manual,
                conditions: Vec::new(),
                actions: Vec::new(),
                last_triggered: None,
            },
        }
    }
}

impl AutomationBuilder {
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.draft.name = name.into();
        self
    }

    /// Build the automation switched off; the engine skips it until enabled.
    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.draft.enabled = false;
        self
    }

    #[must_use]
    pub fn trigger(mut self, trigger: Trigger) -> Self {
        self.draft.trigger = trigger;
        self
    }

    /// Add a condition; all of them must hold for the actions to run.
    #[must_use]
    pub fn condition(mut self, condition: Condition) -> Self {
        self.draft.conditions.push(condition);
        self
    }

    /// Append an action, run after the ones already added.
    #[must_use]
    pub fn action(mut self, action: Action) -> Self {
        self.draft.actions.push(action);
        self
    }

    /// Validate the draft and hand it out.
    ///
    /// # Errors
    ///
    /// Fails with the first violation reported by [`Automation::validate`].
    pub fn build(self) -> Result<Automation, HubError> {
        self.draft.validate()?;
        Ok(self.draft)
    }
}
