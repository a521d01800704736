//! Scene composition — resolving the enabled scenes of one light into the
//! single state that gets sent to the bulb.
//!
//! Enabled scenes are ordered by descending priority (insertion order breaks
//! ties) and scanned from the top. A scene is adopted when its brightness is
//! strictly greater than the best seen so far; scanning continues past a
//! scene only while that scene is transparent.

use crate::light_state::LightState;
use crate::scene::Scene;

/// Outcome of a composition pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Composition<'a> {
    /// The scene whose state was adopted, if any beat the dark baseline.
    pub winner: Option<&'a Scene>,
    /// The winning state, or a brightness-0 baseline.
    pub state: LightState,
    /// Pairs of enabled scenes sharing a priority, in processing order.
    pub ties: Vec<(&'a str, &'a str)>,
}

impl Composition<'_> {
    #[must_use]
    pub fn has_ties(&self) -> bool {
        !self.ties.is_empty()
    }
}

/// Compose `scenes` (in insertion order) into one effective state.
#[must_use]
pub fn compose<'a, I>(scenes: I) -> Composition<'a>
where
    I: IntoIterator<Item = &'a Scene>,
{
    let mut enabled: Vec<&Scene> = scenes.into_iter().filter(|s| s.enabled).collect();
    // `sort_by` is stable, so equal priorities keep insertion order.
    enabled.sort_by(|a, b| b.priority.cmp(&a.priority));

    let ties = enabled
        .windows(2)
        .filter(|pair| pair[0].priority == pair[1].priority)
        .map(|pair| (pair[0].name(), pair[1].name()))
        .collect();

    let mut winner: Option<&Scene> = None;
    let mut best = 0;
    for scene in enabled {
        if scene.brightness() > best {
            best = scene.brightness();
            winner = Some(scene);
        }
        if !scene.transparent {
            break;
        }
    }

    let state = winner.map_or_else(|| LightState::with_brightness(0), |s| s.state.clone());

    Composition {
        winner,
        state,
        ties,
    }
}
