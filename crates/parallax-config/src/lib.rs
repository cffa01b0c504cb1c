// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Configuration services for Parallax (config port, JSON service, VR prefs).
//! Keeps storage adapters thin and framework-agnostic.

pub mod config;
pub mod prefs;

pub use config::{ConfigError, ConfigService, ConfigStore, MemoryConfigStore};
pub use prefs::{
    game_prefs_key, DebugPrefs, HudPrefs, LayerHackPrefs, MotionSicknessMethod, MotionSicknessPrefs,
    ScreenPrefs, SkyboxSickness, SplitscreenPrefs, StabilizationPrefs, VrPrefs, WorldPrefs,
    PREFS_KEY,
};
