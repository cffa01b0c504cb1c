// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! User-tunable VR preferences (world placement, HUD box, 2-D screen, comfort).
//!
//! Distances are in metres and angles in degrees; the compositor converts to
//! game units with `world.units_per_metre`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, ConfigService, ConfigStore};

/// Config key under which a session's prefs are persisted.
pub const PREFS_KEY: &str = "vr-prefs";

/// Config key holding one title's overrides of the global prefs.
pub fn game_prefs_key(game_id: &str) -> String {
    format!("{PREFS_KEY}.{game_id}")
}

/// Saved preferences for a stereo session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VrPrefs {
    /// Master switch; when false every batch passes through monoscopic.
    pub enabled: bool,
    /// Share one view matrix between eyes and emit a stereo separation scalar.
    pub single_pass_stereo: bool,
    /// The console is configured for 16:9 output (otherwise 4:3).
    pub widescreen: bool,
    /// Hide cinematic letterbox bars.
    pub hide_letterbox: bool,
    /// 3-D world placement.
    pub world: WorldPrefs,
    /// HUD box drawn over the 3-D world.
    pub hud: HudPrefs,
    /// Virtual screen used for purely 2-D scenes.
    pub screen: ScreenPrefs,
    /// Camera stabilization.
    pub stabilization: StabilizationPrefs,
    /// Comfort options.
    pub motion_sickness: MotionSicknessPrefs,
    /// Split-screen selection when no HMD is attached.
    pub splitscreen: SplitscreenPrefs,
    /// Per-layer hack overrides keyed by layer name (e.g. `"hud_2d"`).
    pub layers: BTreeMap<String, LayerHackPrefs>,
    /// Debug helpers.
    pub debug: DebugPrefs,
}

impl Default for VrPrefs {
    fn default() -> Self {
        Self {
            enabled: true,
            single_pass_stereo: false,
            widescreen: true,
            hide_letterbox: true,
            world: WorldPrefs::default(),
            hud: HudPrefs::default(),
            screen: ScreenPrefs::default(),
            stabilization: StabilizationPrefs::default(),
            motion_sickness: MotionSicknessPrefs::default(),
            splitscreen: SplitscreenPrefs::default(),
            layers: BTreeMap::new(),
            debug: DebugPrefs::default(),
        }
    }
}

impl VrPrefs {
    /// Range-check every numeric field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let w = &self.world;
        ensure_positive("world.units_per_metre", w.units_per_metre)?;
        ensure_positive("world.scale", w.scale)?;
        ensure_finite("world.camera_forward", w.camera_forward)?;
        ensure_finite("world.camera_pitch", w.camera_pitch)?;
        ensure_finite("world.screen_pitch", w.screen_pitch)?;
        ensure_finite("world.lean_back_angle", w.lean_back_angle)?;
        ensure_finite("world.aim_distance", w.aim_distance)?;
        ensure_range("world.min_fov", w.min_fov, 0.0, 179.0)?;

        ensure_positive("hud.distance", self.hud.distance)?;
        ensure_range("hud.thickness", self.hud.thickness, 0.0, f32::MAX)?;
        ensure_range("hud.closer_3d", self.hud.closer_3d, 0.0, 1.0)?;

        ensure_positive("screen.height", self.screen.height)?;
        ensure_positive("screen.distance", self.screen.distance)?;
        ensure_range("screen.thickness", self.screen.thickness, 0.0, f32::MAX)?;
        ensure_finite("screen.up", self.screen.up)?;
        ensure_finite("screen.right", self.screen.right)?;

        ensure_range("motion_sickness.fov", self.motion_sickness.fov, 1.0, 179.0)?;

        if self.splitscreen.selected_player > 4 {
            return Err(ConfigError::Invalid(format!(
                "splitscreen.selected_player must be 0..=4, got {}",
                self.splitscreen.selected_player
            )));
        }
        for (name, hack) in &self.layers {
            hack.validate(name)?;
        }
        Ok(())
    }

    /// Reject layer names the caller does not recognise.
    pub fn validate_layer_names<F>(&self, is_known: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> bool,
    {
        let unknown: Vec<&str> = self
            .layers
            .keys()
            .map(String::as_str)
            .chain(self.debug.flash_layer.as_deref())
            .filter(|name| !is_known(name))
            .collect();
        if unknown.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(format!(
                "unknown layer name(s): {}",
                unknown.join(", ")
            )))
        }
    }

    /// Global prefs with the overrides saved for `game_id` layered on top.
    pub fn load_for_game<S: ConfigStore>(config: &ConfigService<S>, game_id: &str) -> Result<Self, ConfigError> {
        if game_id.is_empty() {
            return config.load_or_default(PREFS_KEY);
        }
        config.load_layered(&[PREFS_KEY, &game_prefs_key(game_id)])
    }

    /// Saves these prefs as `game_id`'s own settings (the global prefs for an
    /// empty id).
    pub fn save_for_game<S: ConfigStore>(&self, config: &ConfigService<S>, game_id: &str) -> Result<(), ConfigError> {
        if game_id.is_empty() {
            return config.save(PREFS_KEY, self);
        }
        config.save(&game_prefs_key(game_id), self)
    }

    /// Hack overrides for `layer`, or neutral defaults.
    pub fn layer_hacks(&self, layer: &str) -> LayerHackPrefs {
        self.layers.get(layer).copied().unwrap_or_default()
    }
}

/// 3-D world placement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldPrefs {
    /// Game units per real-world metre.
    pub units_per_metre: f32,
    /// Overall world scale (1 = life size).
    pub scale: f32,
    /// Move the camera forward by this many metres.
    pub camera_forward: f32,
    /// Camera pitch in degrees up, for 3-D scenes.
    pub camera_pitch: f32,
    /// Camera pitch in degrees up, for 2-D screens.
    pub screen_pitch: f32,
    /// Lean-back angle in degrees.
    pub lean_back_angle: f32,
    /// Distance in metres at which the HUD lines up with the world.
    pub aim_distance: f32,
    /// Narrower horizontal FOVs (degrees) push the camera forward instead.
    pub min_fov: f32,
}

impl Default for WorldPrefs {
    fn default() -> Self {
        Self {
            units_per_metre: 1.0,
            scale: 1.0,
            camera_forward: 0.0,
            camera_pitch: 0.0,
            screen_pitch: 0.0,
            lean_back_angle: 0.0,
            aim_distance: 7.0,
            min_fov: 10.0,
        }
    }
}

/// HUD box drawn over the 3-D world.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HudPrefs {
    /// Depth 0 of the HUD sits this many metres away.
    pub distance: f32,
    /// The 2-D layer is a box this many metres thick.
    pub thickness: f32,
    /// 3-D HUD elements are pulled this fraction from back (0) to front (1).
    pub closer_3d: f32,
    /// Draw the HUD over the world regardless of depth.
    pub on_top: bool,
}

impl Default for HudPrefs {
    fn default() -> Self {
        Self {
            distance: 1.5,
            thickness: 0.5,
            closer_3d: 0.5,
            on_top: false,
        }
    }
}

/// Virtual screen for scenes with no 3-D world.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenPrefs {
    /// Screen height in metres.
    pub height: f32,
    /// Screen distance in metres.
    pub distance: f32,
    /// Screen thickness in metres.
    pub thickness: f32,
    /// Raise the screen by this many metres.
    pub up: f32,
    /// Shift the screen right by this many metres.
    pub right: f32,
}

impl Default for ScreenPrefs {
    fn default() -> Self {
        Self {
            height: 2.0,
            distance: 1.5,
            thickness: 0.5,
            up: 0.0,
            right: 0.0,
        }
    }
}

/// Which parts of the game camera to cancel out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StabilizationPrefs {
    /// Cancel game camera pitch.
    pub pitch: bool,
    /// Cancel game camera roll.
    pub roll: bool,
    /// Cancel game camera yaw.
    pub yaw: bool,
    /// Cancel game camera translation.
    pub position: bool,
    /// The title profile can read camera angles at all.
    pub can_read_camera_angles: bool,
}

impl StabilizationPrefs {
    /// Any rotational stabilization requested.
    pub fn any_rotation(&self) -> bool {
        self.pitch || self.roll || self.yaw
    }
}

/// Comfort strategy applied while the player is moving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MotionSicknessMethod {
    /// No comfort measure.
    #[default]
    None,
    /// Narrow the visible field of view (reported to the compositing stage).
    ReduceFov,
    /// Blank the world, keep the HUD.
    BlackScreen,
}

/// Skybox handling while motion sickness mitigation is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SkyboxSickness {
    /// Draw the skybox normally.
    #[default]
    Normal,
    /// Hide the skybox.
    Hide,
    /// Keep the skybox out of camera stabilization.
    Lock,
}

/// Motion sickness settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionSicknessPrefs {
    /// Strategy for the world.
    pub method: MotionSicknessMethod,
    /// Strategy for the skybox.
    pub skybox: SkyboxSickness,
    /// Visible FOV in degrees while `ReduceFov` is active.
    pub fov: f32,
}

impl Default for MotionSicknessPrefs {
    fn default() -> Self {
        Self {
            method: MotionSicknessMethod::None,
            skybox: SkyboxSickness::Normal,
            fov: 45.0,
        }
    }
}

/// Split-screen selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SplitscreenPrefs {
    /// Player slot shown without an HMD (1..=4); 0 shows every slot.
    pub selected_player: u8,
}

/// Per-layer placement hacks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerHackPrefs {
    /// Never draw the layer.
    pub hide: bool,
    /// Draw the layer in head space.
    pub stuck_to_head: bool,
    /// Multiply world units for this layer.
    pub scale: f32,
    /// Multiply the projection's horizontal scale.
    pub width: f32,
    /// Multiply the projection's vertical scale.
    pub height: f32,
    /// Add to the projection's vertical off-axis term.
    pub up: f32,
    /// Add to the projection's horizontal off-axis term.
    pub right: f32,
}

impl Default for LayerHackPrefs {
    fn default() -> Self {
        Self {
            hide: false,
            stuck_to_head: false,
            scale: 1.0,
            width: 1.0,
            height: 1.0,
            up: 0.0,
            right: 0.0,
        }
    }
}

impl LayerHackPrefs {
    fn validate(&self, name: &str) -> Result<(), ConfigError> {
        ensure_finite(&format!("layers.{name}.scale"), self.scale)?;
        ensure_finite(&format!("layers.{name}.width"), self.width)?;
        ensure_finite(&format!("layers.{name}.height"), self.height)?;
        ensure_finite(&format!("layers.{name}.up"), self.up)?;
        ensure_finite(&format!("layers.{name}.right"), self.right)
    }
}

/// Debug helpers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DebugPrefs {
    /// Blink this layer on and off to identify it in-game.
    pub flash_layer: Option<String>,
    /// Frames per on/off phase; 0 disables flashing.
    pub flash_period_frames: u32,
}

fn ensure_finite(field: &str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!("{field} must be finite, got {value}")))
    }
}

fn ensure_positive(field: &str, value: f32) -> Result<(), ConfigError> {
    ensure_finite(field, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!("{field} must be > 0, got {value}")))
    }
}

fn ensure_range(field: &str, value: f32, min: f32, max: f32) -> Result<(), ConfigError> {
    ensure_finite(field, value)?;
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!(
            "{field} must be within [{min}, {max}], got {value}"
        )))
    }
}
