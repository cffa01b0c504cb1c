// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Semantic render layers and the per-layer render policy.

use parallax_config::VrPrefs;

use crate::projection::ProjectionKind;
use crate::titles::TitleFlags;
use crate::viewport::ViewportClassification;

/// Semantic classification of a draw-call batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum LayerKind {
    /// 3-D world geometry.
    World,
    /// Head-locked 3-D geometry (visor, cockpit).
    Helmet,
    /// 3-D HUD element (radar, lock-on reticle).
    Hud3D,
    /// 2-D HUD overlay.
    Hud2D,
    /// On-screen text.
    Text,
    /// Scan visor overlay.
    ScanOverlay,
    /// Map screen.
    Map,
    /// Pause or menu screen.
    Menu,
    /// Cinematic letterbox bars.
    Letterbox,
    /// Full-screen post effect re-projecting an already rendered image.
    ScreenEffect,
    /// Perspective batch no matcher recognised, treated as world.
    UnknownWorld,
    /// Perspective batch no matcher recognised, treated as HUD.
    UnknownHud,
    /// Orthographic batch no matcher recognised.
    Unknown2D,
}

impl LayerKind {
    /// Every kind, in declaration order.
    pub const ALL: [Self; 13] = [
        Self::World,
        Self::Helmet,
        Self::Hud3D,
        Self::Hud2D,
        Self::Text,
        Self::ScanOverlay,
        Self::Map,
        Self::Menu,
        Self::Letterbox,
        Self::ScreenEffect,
        Self::UnknownWorld,
        Self::UnknownHud,
        Self::Unknown2D,
    ];

    /// Stable name, also the key for per-layer prefs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::World => "world",
            Self::Helmet => "helmet",
            Self::Hud3D => "hud_3d",
            Self::Hud2D => "hud_2d",
            Self::Text => "text",
            Self::ScanOverlay => "scan_overlay",
            Self::Map => "map",
            Self::Menu => "menu",
            Self::Letterbox => "letterbox",
            Self::ScreenEffect => "screen_effect",
            Self::UnknownWorld => "unknown_world",
            Self::UnknownHud => "unknown_hud",
            Self::Unknown2D => "unknown_2d",
        }
    }

    /// Inverse of [`Self::as_str`].
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == name)
    }

    /// World geometry (recognised or not).
    pub fn is_world(self) -> bool {
        matches!(self, Self::World | Self::UnknownWorld)
    }

    /// Layers that stay visible while comfort blanking hides the world.
    pub fn is_hud(self) -> bool {
        matches!(
            self,
            Self::Helmet
                | Self::Hud3D
                | Self::Hud2D
                | Self::Text
                | Self::ScanOverlay
                | Self::Map
                | Self::Menu
                | Self::UnknownHud
                | Self::Unknown2D
        )
    }

    /// How the compositor places a batch of this kind.
    pub fn placement(self, projection: ProjectionKind) -> Placement {
        match projection {
            ProjectionKind::Orthographic => Placement::HudBox2D,
            ProjectionKind::Perspective => match self {
                Self::World | Self::UnknownWorld | Self::Helmet | Self::Map => Placement::World,
                _ => Placement::HudBox3D,
            },
        }
    }
}

impl core::fmt::Display for LayerKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the compositor puts a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// World view chain (camera dolly, stabilization, head tracking).
    World,
    /// Perspective HUD geometry pushed into the HUD box.
    HudBox3D,
    /// Orthographic layer mapped onto the HUD box or 2-D screen.
    HudBox2D,
}

/// Per-layer rendering decisions consumed by the compositor and by later
/// compositing stages.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RenderPolicy {
    /// Do not draw.
    pub hide: bool,
    /// The source image is already stereo; only re-project it flat.
    pub fullscreen_already_stereo: bool,
    /// Draw in head space.
    pub stuck_to_head: bool,
    /// Draw as skybox (no translation).
    pub skybox: bool,
    /// World-unit multiplier.
    pub scale: f32,
    /// Projection horizontal scale multiplier.
    pub width: f32,
    /// Projection vertical scale multiplier.
    pub height: f32,
    /// Projection vertical off-axis shift.
    pub up: f32,
    /// Projection horizontal off-axis shift.
    pub right: f32,
    /// Zoomed scope view: own FOV, no head rotation.
    pub telescope: bool,
}

impl Default for RenderPolicy {
    fn default() -> Self {
        Self {
            hide: false,
            fullscreen_already_stereo: false,
            stuck_to_head: false,
            skybox: false,
            scale: 1.0,
            width: 1.0,
            height: 1.0,
            up: 0.0,
            right: 0.0,
            telescope: false,
        }
    }
}

impl RenderPolicy {
    /// Derives the policy for `kind` from title flags, viewport and user prefs.
    pub fn derive(
        kind: LayerKind,
        flags: &TitleFlags,
        viewport: &ViewportClassification,
        prefs: &VrPrefs,
    ) -> Self {
        let hacks = prefs.layer_hacks(kind.as_str());
        Self {
            hide: hacks.hide || (kind == LayerKind::Letterbox && flags.cinematic && prefs.hide_letterbox),
            fullscreen_already_stereo: kind == LayerKind::ScreenEffect,
            stuck_to_head: hacks.stuck_to_head || kind == LayerKind::Helmet,
            skybox: viewport.skybox && kind.is_world(),
            scale: hacks.scale,
            width: hacks.width,
            height: hacks.height,
            up: hacks.up,
            right: hacks.right,
            telescope: kind == LayerKind::World && flags.telescope,
        }
    }
}

/// Layer kind plus its render policy.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LayerClassification {
    /// Semantic kind.
    pub kind: LayerKind,
    /// Render policy.
    pub policy: RenderPolicy,
}
