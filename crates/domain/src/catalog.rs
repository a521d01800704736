//! Device catalog — maps a gateway `(type, manufacturer, model)` triple to
//! the behaviour class the hub instantiates for it.
//!
//! Unknown triples classify as [`DeviceClass::Unsupported`]; the caller
//! decides whether to log and skip them.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::gesture::ButtonLayout;

/// The identifying triple reported by the gateway for every device.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelKey {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "manufacturername")]
    pub manufacturer: String,
    #[serde(rename = "modelid")]
    pub model: String,
}

impl ModelKey {
    #[must_use]
    pub fn new(
        kind: impl Into<String>,
        manufacturer: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            kind: kind.into(),
            manufacturer: manufacturer.into(),
            model: model.into(),
        }
    }
}

impl fmt::Display for ModelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.kind, self.manufacturer, self.model)
    }
}

/// Passive or event-emitting sensor families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorClass {
    /// Emits `motion` / `motion_gone`.
    Motion,
    /// Emits `opened` / `closed`.
    OpenClose,
    LightLevel,
    Temperature,
    Daylight,
    GenericStatus,
}

/// Behaviour class selected for a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "class", rename_all = "snake_case")]
pub enum DeviceClass {
    /// Dimmable light carrying scenes.
    Light,
    /// On/off plug.
    Outlet,
    /// Button remote decoded through a [`ButtonLayout`].
    Dimmer { layout: ButtonLayout },
    Sensor { sensor: SensorClass },
    Unsupported,
}

const fn sensor(sensor: SensorClass) -> DeviceClass {
    DeviceClass::Sensor { sensor }
}

const fn dimmer(layout: ButtonLayout) -> DeviceClass {
    DeviceClass::Dimmer { layout }
}

/// Models known to work with the hub.
const KNOWN_MODELS: &[(&str, &str, &str, DeviceClass)] = &[
    // lights
    ("Extended color light", "Philips", "LCA001", DeviceClass::Light),
    ("Extended color light", "Philips", "LCT010", DeviceClass::Light),
    ("Extended color light", "Philips", "LCT015", DeviceClass::Light),
    ("Extended color light", "innr", "FL 130 C", DeviceClass::Light),
    (
        "Extended color light",
        "LIDL Livarno Lux",
        "14149506L",
        DeviceClass::Light,
    ),
    // outlets
    ("On/Off plug-in unit", "Heiman", "TS011F", DeviceClass::Outlet),
    (
        "On/Off plug-in unit",
        "IKEA of Sweden",
        "TRADFRI control outlet",
        DeviceClass::Outlet,
    ),
    // remotes
    (
        "ZHASwitch",
        "IKEA of Sweden",
        "TRADFRI on/off switch",
        dimmer(ButtonLayout::IkeaOnOff),
    ),
    (
        "ZHASwitch",
        "IKEA of Sweden",
        "TRADFRI remote control",
        dimmer(ButtonLayout::Unmapped),
    ),
    ("ZHASwitch", "Philips", "RWL021", dimmer(ButtonLayout::HueDimmer)),
    (
        "ZHASwitch",
        "LUMI",
        "lumi.remote.b286opcn01",
        dimmer(ButtonLayout::AqaraDouble),
    ),
    (
        "ZHASwitch",
        "LUMI",
        "lumi.remote.b486opcn01",
        dimmer(ButtonLayout::AqaraQuad),
    ),
    // sensors
    (
        "ZHAPresence",
        "IKEA of Sweden",
        "TRADFRI motion sensor",
        sensor(SensorClass::Motion),
    ),
    ("ZHAPresence", "Philips", "SML001", sensor(SensorClass::Motion)),
    ("ZHAPresence", "Philips", "SML002", sensor(SensorClass::Motion)),
    (
        "CLIPPresence",
        "Phoscon",
        "PHOSCON_VPIR",
        sensor(SensorClass::Motion),
    ),
    (
        "ZHAOpenClose",
        "LUMI",
        "lumi.sensor_magnet.aq2",
        sensor(SensorClass::OpenClose),
    ),
    ("ZHATemperature", "Philips", "SML001", sensor(SensorClass::Temperature)),
    ("ZHATemperature", "Philips", "SML002", sensor(SensorClass::Temperature)),
    ("ZHALightLevel", "Philips", "SML001", sensor(SensorClass::LightLevel)),
    ("ZHALightLevel", "Philips", "SML002", sensor(SensorClass::LightLevel)),
    ("Daylight", "Philips", "PHDL00", sensor(SensorClass::Daylight)),
    (
        "CLIPGenericStatus",
        "Phoscon",
        "PHOSCON_FSM_STATE",
        sensor(SensorClass::GenericStatus),
    ),
];

/// Lookup table from [`ModelKey`] to [`DeviceClass`].
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: HashMap<ModelKey, DeviceClass>,
}

impl Catalog {
    /// An empty catalog: every model is unsupported.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// The catalog of models known to work with the hub.
    #[must_use]
    pub fn builtin() -> Self {
        KNOWN_MODELS
            .iter()
            .fold(Self::empty(), |catalog, (kind, manufacturer, model, class)| {
                catalog.with(ModelKey::new(*kind, *manufacturer, *model), *class)
            })
    }

    /// Add or replace an entry.
    #[must_use]
    pub fn with(mut self, key: ModelKey, class: DeviceClass) -> Self {
        self.entries.insert(key, class);
        self
    }

    #[must_use]
    pub fn classify(&self, key: &ModelKey) -> DeviceClass {
        self.entries
            .get(key)
            .copied()
            .unwrap_or(DeviceClass::Unsupported)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_classify_known_light() {
        let catalog = Catalog::builtin();
        let key = ModelKey::new("Extended color light", "Philips", "LCT015");
        assert_eq!(catalog.classify(&key), DeviceClass::Light);
    }

    #[test]
    fn should_classify_remote_with_its_layout() {
        let catalog = Catalog::builtin();
        let key = ModelKey::new("ZHASwitch", "Philips", "RWL021");
        assert_eq!(
            catalog.classify(&key),
            DeviceClass::Dimmer {
                layout: ButtonLayout::HueDimmer
            }
        );
    }

    #[test]
    fn should_distinguish_sensor_families_sharing_a_model() {
        let catalog = Catalog::builtin();
        let motion = ModelKey::new("ZHAPresence", "Philips", "SML001");
        let level = ModelKey::new("ZHALightLevel", "Philips", "SML001");
        assert_eq!(catalog.classify(&motion), sensor(SensorClass::Motion));
        assert_eq!(catalog.classify(&level), sensor(SensorClass::LightLevel));
    }

    #[test]
    fn should_classify_unknown_model_as_unsupported() {
        let catalog = Catalog::builtin();
        let key = ModelKey::new("Color light", "Acme", "X1");
        assert_eq!(catalog.classify(&key), DeviceClass::Unsupported);
    }

    #[test]
    fn should_allow_extending_builtin_catalog() {
        let key = ModelKey::new("Color light", "Acme", "X1");
        let catalog = Catalog::builtin().with(key.clone(), DeviceClass::Light);
        assert_eq!(catalog.classify(&key), DeviceClass::Light);
        assert_eq!(catalog.len(), KNOWN_MODELS.len() + 1);
    }

    #[test]
    fn should_display_key_as_slash_separated_triple() {
        let key = ModelKey::new("ZHASwitch", "LUMI", "lumi.remote.b286opcn01");
        assert_eq!(key.to_string(), "ZHASwitch/LUMI/lumi.remote.b286opcn01");
    }

    #[test]
    fn should_deserialize_catalog_entry_from_toml() {
        #[derive(Deserialize)]
        struct Entry {
            #[serde(flatten)]
            key: ModelKey,
            #[serde(flatten)]
            class: DeviceClass,
        }
        let entry: Entry = toml::from_str(
            r#"
            type = "ZHASwitch"
            manufacturername = "Acme"
            modelid = "R2"
            class = "dimmer"
            layout = "ikea_on_off"
            "#,
        )
        .unwrap();
        assert_eq!(entry.key.model, "R2");
        assert_eq!(
            entry.class,
            DeviceClass::Dimmer {
                layout: ButtonLayout::IkeaOnOff
            }
        );
    }
}
