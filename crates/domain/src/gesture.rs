//! Gestures — semantic button actions decoded from raw vendor button codes.
//!
//! Remotes report a raw code of the form `button * 1000 + event`. What the
//! event digit means depends on the vendor ([`ButtonLayout`]), and which
//! semantic control a button drives depends on the remote's layout and on
//! whether it is mounted upside down (`inverted`).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The semantic control a button drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    On,
    Off,
    DimUp,
    DimDown,
    /// Numbered button on a multi-gang switch, 1-based.
    Button(u8),
}

impl fmt::Display for Control {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::On => f.write_str("on"),
            Self::Off => f.write_str("off"),
            Self::DimUp => f.write_str("dim_up"),
            Self::DimDown => f.write_str("dim_down"),
            Self::Button(n) => write!(f, "btn{n}"),
        }
    }
}

impl FromStr for Control {
    type Err = UnknownGesture;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "on" => Ok(Self::On),
            "off" => Ok(Self::Off),
            "dim_up" => Ok(Self::DimUp),
            "dim_down" => Ok(Self::DimDown),
            other => other
                .strip_prefix("btn")
                .and_then(|n| n.parse().ok())
                .map(Self::Button)
                .ok_or_else(|| UnknownGesture(s.to_string())),
        }
    }
}

/// A semantic gesture, rendered as `<kind>_<control>[_<suffix>]`
/// (`pressed_on`, `hold_dim_up`, `pressed_btn2_double`, …).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Gesture {
    Pressed(Control),
    /// Button let go after a short press.
    Released(Control),
    PressedDouble(Control),
    PressedTriple(Control),
    /// Start of a long press.
    Hold(Control),
    /// Periodic repeat while a long press is held.
    Tick(Control),
    /// End of a long press.
    Release(Control),
    /// End of a long press, on remotes that distinguish it from [`Released`](Self::Released).
    ReleaseHold(Control),
}

impl Gesture {
    #[must_use]
    pub fn control(self) -> Control {
        match self {
            Self::Pressed(c)
            | Self::Released(c)
            | Self::PressedDouble(c)
            | Self::PressedTriple(c)
            | Self::Hold(c)
            | Self::Tick(c)
            | Self::Release(c)
            | Self::ReleaseHold(c) => c,
        }
    }
}

impl fmt::Display for Gesture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pressed(c) => write!(f, "pressed_{c}"),
            Self::Released(c) => write!(f, "released_{c}"),
            Self::PressedDouble(c) => write!(f, "pressed_{c}_double"),
            Self::PressedTriple(c) => write!(f, "pressed_{c}_triple"),
            Self::Hold(c) => write!(f, "hold_{c}"),
            Self::Tick(c) => write!(f, "tick_{c}"),
            Self::Release(c) => write!(f, "release_{c}"),
            Self::ReleaseHold(c) => write!(f, "release_hold_{c}"),
        }
    }
}

impl FromStr for Gesture {
    type Err = UnknownGesture;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || UnknownGesture(s.to_string());
        if let Some(rest) = s.strip_prefix("pressed_") {
            if let Some(c) = rest.strip_suffix("_double") {
                return c.parse().map(Self::PressedDouble).map_err(|_| unknown());
            }
            if let Some(c) = rest.strip_suffix("_triple") {
                return c.parse().map(Self::PressedTriple).map_err(|_| unknown());
            }
            return rest.parse().map(Self::Pressed).map_err(|_| unknown());
        }
        if let Some(c) = s.strip_prefix("released_") {
            return c.parse().map(Self::Released).map_err(|_| unknown());
        }
        if let Some(c) = s.strip_prefix("release_hold_") {
            return c.parse().map(Self::ReleaseHold).map_err(|_| unknown());
        }
        if let Some(c) = s.strip_prefix("release_") {
            return c.parse().map(Self::Release).map_err(|_| unknown());
        }
        if let Some(c) = s.strip_prefix("hold_") {
            return c.parse().map(Self::Hold).map_err(|_| unknown());
        }
        if let Some(c) = s.strip_prefix("tick_") {
            return c.parse().map(Self::Tick).map_err(|_| unknown());
        }
        Err(unknown())
    }
}

impl From<Gesture> for String {
    fn from(value: Gesture) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for Gesture {
    type Error = UnknownGesture;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A gesture or control name that does not follow the naming scheme.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown gesture {0:?}")]
pub struct UnknownGesture(pub String);

/// What a raw button event means to the gesture state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonEvent {
    Press,
    ShortRelease,
    DoublePress,
    TriplePress,
    HoldStart,
    Release,
    ReleaseHold,
}

/// A decoded raw code: which event happened on which control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeAction {
    pub event: ButtonEvent,
    pub control: Control,
}

/// Controls driven by one physical button: short presses and long presses
/// can address different controls (e.g. `on` vs `dim_up`).
#[derive(Debug, Clone, Copy)]
struct ButtonMap {
    press: Control,
    hold: Control,
}

const fn same(control: Control) -> ButtonMap {
    ButtonMap {
        press: control,
        hold: control,
    }
}

/// IKEA / generic Zigbee switches: hold, press, release.
const ZIGBEE_EVENTS: &[(u32, ButtonEvent)] = &[
    (1, ButtonEvent::HoldStart),
    (2, ButtonEvent::Press),
    (3, ButtonEvent::Release),
];

/// Aqara remotes add double and triple presses.
const AQARA_EVENTS: &[(u32, ButtonEvent)] = &[
    (1, ButtonEvent::HoldStart),
    (2, ButtonEvent::Press),
    (3, ButtonEvent::Release),
    (4, ButtonEvent::DoublePress),
    (5, ButtonEvent::TriplePress),
];

/// Hue dimmers report the initial press and distinguish short from long release.
const HUE_EVENTS: &[(u32, ButtonEvent)] = &[
    (0, ButtonEvent::Press),
    (1, ButtonEvent::HoldStart),
    (2, ButtonEvent::ShortRelease),
    (3, ButtonEvent::ReleaseHold),
];

const IKEA_ON_OFF_BUTTONS: &[ButtonMap] = &[
    ButtonMap {
        press: Control::On,
        hold: Control::DimUp,
    },
    ButtonMap {
        press: Control::Off,
        hold: Control::DimDown,
    },
];

const HUE_DIMMER_BUTTONS: &[ButtonMap] = &[
    same(Control::On),
    same(Control::DimUp),
    same(Control::DimDown),
    same(Control::Off),
];

const AQARA_DOUBLE_BUTTONS: &[ButtonMap] = &[same(Control::On), same(Control::Off)];

const AQARA_QUAD_BUTTONS: &[ButtonMap] = &[
    same(Control::Button(1)),
    same(Control::Button(2)),
    same(Control::Button(3)),
    same(Control::Button(4)),
];

/// Physical button layout of a remote, selecting its code table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonLayout {
    /// IKEA TRADFRI two-button on/off switch.
    IkeaOnOff,
    /// Philips Hue four-button dimmer (RWL021).
    HueDimmer,
    /// Aqara two-button wireless remote.
    AqaraDouble,
    /// Aqara four-button wireless remote.
    AqaraQuad,
    /// A remote whose codes are not mapped; every code is reported unknown.
    Unmapped,
}

impl ButtonLayout {
    fn events(self) -> &'static [(u32, ButtonEvent)] {
        match self {
            Self::IkeaOnOff => ZIGBEE_EVENTS,
            Self::HueDimmer => HUE_EVENTS,
            Self::AqaraDouble | Self::AqaraQuad => AQARA_EVENTS,
            Self::Unmapped => &[],
        }
    }

    fn buttons(self) -> &'static [ButtonMap] {
        match self {
            Self::IkeaOnOff => IKEA_ON_OFF_BUTTONS,
            Self::HueDimmer => HUE_DIMMER_BUTTONS,
            Self::AqaraDouble => AQARA_DOUBLE_BUTTONS,
            Self::AqaraQuad => AQARA_QUAD_BUTTONS,
            Self::Unmapped => &[],
        }
    }

    /// Whether mounting the remote upside down mirrors its buttons.
    #[must_use]
    pub fn is_invertible(self) -> bool {
        matches!(self, Self::IkeaOnOff | Self::AqaraDouble | Self::AqaraQuad)
    }

    /// Decode a raw code. Returns `None` for codes absent from the table.
    #[must_use]
    pub fn decode(self, inverted: bool, raw: u32) -> Option<CodeAction> {
        let buttons = self.buttons();
        let count = u32::try_from(buttons.len()).ok()?;
        let mut button = raw / 1000;
        if button == 0 || button > count {
            return None;
        }
        if inverted && self.is_invertible() {
            button = count + 1 - button;
        }

        let event = self
            .events()
            .iter()
            .find(|(code, _)| *code == raw % 1000)
            .map(|(_, event)| *event)?;

        let map = buttons[usize::try_from(button - 1).ok()?];
        let control = match event {
            ButtonEvent::HoldStart | ButtonEvent::Release | ButtonEvent::ReleaseHold => map.hold,
            _ => map.press,
        };
        Some(CodeAction { event, control })
    }
}
