// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Title profiles: per-game heuristics mapping quantized projection
//! signatures to layer kinds.
//!
//! Each profile is a stateless [`LayerMatcher`]; the persistent state lives in
//! [`TitleFlags`], owned by the session and passed in by reference. Matchers
//! only ever see `round100`-quantized values.

mod generic;
mod metroid_prime;
mod metroid_prime2;
mod wind_waker;

use core::fmt;
use core::str::FromStr;

pub use generic::GenericMatcher;
pub use metroid_prime::{MetroidPrimeMatcher, PrimeSignatures, METROID_PRIME_SIGNATURES};
pub use metroid_prime2::{MetroidPrime2Matcher, DARK_WORLD, METROID_PRIME2_SIGNATURES};
pub use wind_waker::WindWakerMatcher;

use crate::error::SessionError;
use crate::layer::LayerKind;
use crate::projection::{OrthoSignature, PerspectiveSignature};

/// Exclusive HUD mode. Modes that can never coexist share one field, so
/// entering a mode always replaces the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum HudMode {
    /// Normal play.
    #[default]
    Gameplay,
    /// Scan visor active.
    Scan,
    /// Morph ball camera active.
    Morphball,
    /// Map open.
    Map,
    /// Pause menu open.
    Pause,
}

/// Persistent per-title classifier state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TitleFlags {
    /// Current exclusive mode.
    pub mode: HudMode,
    /// Letterboxed cutscene in progress.
    pub cinematic: bool,
    /// Alternate-dimension world palette is active.
    pub dark_world: bool,
    /// Zoomed telescope/scope view.
    pub telescope: bool,
}

impl TitleFlags {
    /// Switches mode. Map and pause also end any cutscene.
    pub fn enter(&mut self, mode: HudMode) {
        self.mode = mode;
        if matches!(mode, HudMode::Map | HudMode::Pause) {
            self.cinematic = false;
        }
    }

    /// Mode is one of `modes`.
    pub fn in_mode(&self, modes: &[HudMode]) -> bool {
        modes.contains(&self.mode)
    }
}

/// Per-title classification entry points.
pub trait LayerMatcher {
    /// Classifies a perspective call.
    fn classify_3d(&self, ordinal: usize, sig: &PerspectiveSignature, flags: &mut TitleFlags) -> LayerKind;
    /// Classifies an orthographic call.
    fn classify_2d(&self, ordinal: usize, sig: &OrthoSignature, flags: &mut TitleFlags) -> LayerKind;
}

/// Supported title profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum TitleProfile {
    /// Any title without a dedicated profile.
    #[default]
    Generic,
    /// Metroid Prime.
    MetroidPrime,
    /// Metroid Prime 2: Echoes.
    MetroidPrime2,
    /// The Legend of Zelda: The Wind Waker.
    WindWaker,
}

static GENERIC: GenericMatcher = GenericMatcher;
static METROID_PRIME: MetroidPrimeMatcher = MetroidPrimeMatcher;
static METROID_PRIME2: MetroidPrime2Matcher = MetroidPrime2Matcher;
static WIND_WAKER: WindWakerMatcher = WindWakerMatcher;

impl TitleProfile {
    /// Every profile.
    pub const ALL: [Self; 4] = [
        Self::Generic,
        Self::MetroidPrime,
        Self::MetroidPrime2,
        Self::WindWaker,
    ];

    /// Picks a profile from a disc game id (`GM8E01`, `G2MP01`, ...).
    pub fn from_game_id(game_id: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|p| p.game_id_prefix().is_some_and(|prefix| game_id.starts_with(prefix)))
            .unwrap_or(Self::Generic)
    }

    /// Game-id prefix that selects this profile.
    pub fn game_id_prefix(self) -> Option<&'static str> {
        match self {
            Self::Generic => None,
            Self::MetroidPrime => Some("GM8"),
            Self::MetroidPrime2 => Some("G2M"),
            Self::WindWaker => Some("GZL"),
        }
    }

    /// Stable name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Generic => "generic",
            Self::MetroidPrime => "metroid-prime",
            Self::MetroidPrime2 => "metroid-prime-2",
            Self::WindWaker => "wind-waker",
        }
    }

    /// The matcher implementing this profile.
    pub fn matcher(self) -> &'static dyn LayerMatcher {
        match self {
            Self::Generic => &GENERIC,
            Self::MetroidPrime => &METROID_PRIME,
            Self::MetroidPrime2 => &METROID_PRIME2,
            Self::WindWaker => &WIND_WAKER,
        }
    }
}

impl fmt::Display for TitleProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TitleProfile {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.name() == s)
            .ok_or_else(|| SessionError::UnknownTitle(s.to_owned()))
    }
}
