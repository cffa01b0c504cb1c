// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Per-title stereo session: owns the scene tracker, both classifiers and the
//! compositor, and drives them for each draw batch.
//!
//! A host calls [`StereoSession::begin_frame`] once per emulated frame, then
//! [`StereoSession::process_batch`] for every batch in submission order.

use parallax_config::{ConfigService, ConfigStore, VrPrefs};
use tracing::{debug, info};

use crate::classifier::LayerClassifier;
use crate::compositor::{ComposeRequest, Compositor, StereoMatrices};
use crate::error::SessionError;
use crate::hmd::{CameraStabilization, HmdRuntime, VrFrameState};
use crate::layer::{LayerClassification, LayerKind, RenderPolicy};
use crate::math::Vec3;
use crate::projection::RawProjectionState;
use crate::scene::SceneTracker;
use crate::titles::{TitleFlags, TitleProfile};
use crate::viewport::{ScreenRegion, ViewportClassification, ViewportClassifier, ViewportRect};

/// Host-provided state for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameInputs {
    /// Free-look camera translation in metres.
    pub free_look: Vec3,
    /// Game camera motion to cancel, when the title exposes it.
    pub stabilization: Option<CameraStabilization>,
    /// The player is moving fast enough for comfort measures.
    pub motion_sickness_active: bool,
}

/// One draw batch as submitted by the legacy pipeline.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BatchInput {
    /// Viewport registers in effect.
    pub viewport: ViewportRect,
    /// Projection registers in effect.
    pub projection: RawProjectionState,
    /// Final screen region (after aspect correction).
    pub screen: ScreenRegion,
}

/// Everything decided for one batch.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BatchOutput {
    /// Frame the batch belongs to.
    pub frame: u64,
    /// Viewport ordinal within the scene.
    pub viewport_ordinal: usize,
    /// Projection ordinal within the scene.
    pub projection_ordinal: usize,
    /// Viewport classification.
    pub viewport: ViewportClassification,
    /// Layer classification and policy.
    pub layer: LayerClassification,
    /// Per-eye matrices.
    pub matrices: StereoMatrices,
}

/// Stereo state for one running title.
#[derive(Debug, Clone)]
pub struct StereoSession {
    prefs: VrPrefs,
    scene: SceneTracker,
    viewports: ViewportClassifier,
    layers: LayerClassifier,
    compositor: Compositor,
    frame: VrFrameState,
}

impl StereoSession {
    /// Session for the title with `game_id`.
    pub fn new(game_id: &str, prefs: VrPrefs) -> Result<Self, SessionError> {
        Self::with_profile(TitleProfile::from_game_id(game_id), prefs)
    }

    /// Session with an explicit profile.
    pub fn with_profile(profile: TitleProfile, prefs: VrPrefs) -> Result<Self, SessionError> {
        check_prefs(&prefs)?;
        info!(profile = profile.name(), enabled = prefs.enabled, "stereo session started");
        Ok(Self {
            prefs,
            scene: SceneTracker::new(),
            viewports: ViewportClassifier::new(),
            layers: LayerClassifier::new(profile),
            compositor: Compositor::new(),
            frame: VrFrameState::default(),
        })
    }

    /// Session whose prefs come from `config`: the global prefs with this
    /// title's saved overrides on top, defaults when neither is stored.
    pub fn from_config<S: ConfigStore>(game_id: &str, config: &ConfigService<S>) -> Result<Self, SessionError> {
        let prefs = VrPrefs::load_for_game(config, game_id)?;
        Self::new(game_id, prefs)
    }

    /// Replaces the prefs; takes effect on the next batch.
    pub fn set_prefs(&mut self, prefs: VrPrefs) -> Result<(), SessionError> {
        check_prefs(&prefs)?;
        debug!("prefs replaced");
        self.prefs = prefs;
        Ok(())
    }

    /// Current prefs.
    pub fn prefs(&self) -> &VrPrefs {
        &self.prefs
    }

    /// Active title profile.
    pub fn profile(&self) -> TitleProfile {
        self.layers.profile()
    }

    /// Title classifier flags.
    pub fn flags(&self) -> &TitleFlags {
        self.layers.flags()
    }

    /// Scene tracker.
    pub fn scene(&self) -> &SceneTracker {
        &self.scene
    }

    /// Starts a frame: samples the headset once and checks for a scene
    /// change. Returns true when a new scene began.
    pub fn begin_frame(&mut self, runtime: &mut dyn HmdRuntime, inputs: FrameInputs) -> bool {
        let hmd = if self.prefs.enabled && runtime.is_present() && !self.compositor.is_runtime_lost() {
            match runtime.sample() {
                Ok(sample) => Some(sample),
                Err(err) => {
                    self.compositor.mark_runtime_lost(&err);
                    None
                }
            }
        } else {
            None
        };
        let new_scene = self.scene.begin_frame();
        if new_scene {
            self.compositor.on_new_scene();
        }
        self.frame = VrFrameState {
            hmd,
            free_look: inputs.free_look,
            stabilization: inputs.stabilization,
            motion_sickness_active: inputs.motion_sickness_active,
            frame_index: self.scene.frame_index(),
        };
        new_scene
    }

    /// Classifies and composes one batch.
    pub fn process_batch(&mut self, batch: &BatchInput) -> BatchOutput {
        let viewport_ordinal = self.scene.record_viewport(&batch.viewport);
        let projection_ordinal = self.scene.record_projection(&batch.projection);
        let viewport = self.viewports.classify(&batch.viewport, &batch.screen);
        let kind = self
            .layers
            .classify(projection_ordinal, &batch.projection, &mut self.scene);
        let layer = LayerClassification {
            kind,
            policy: RenderPolicy::derive(kind, self.layers.flags(), &viewport, &self.prefs),
        };
        let request = ComposeRequest {
            layer: &layer,
            viewport: &viewport,
            viewport_rect: &batch.viewport,
            screen: &batch.screen,
            projection: &batch.projection,
            widest: self.scene.widest(),
            frame: &self.frame,
            prefs: &self.prefs,
        };
        let matrices = self.compositor.compose(&request);
        BatchOutput {
            frame: self.frame.frame_index,
            viewport_ordinal,
            projection_ordinal,
            viewport,
            layer,
            matrices,
        }
    }

    /// Clears a runtime loss; the next frame samples the headset again.
    pub fn reenable_vr(&mut self) {
        self.compositor.reenable_vr();
    }

    /// HUD should be drawn over the world: a HUD layer followed a world layer
    /// this scene, or the user forces it.
    pub fn hud_above_world(&self) -> bool {
        self.compositor.hud_above_world() || self.prefs.hud.on_top
    }

    /// Stereo output is being produced for the current frame.
    pub fn is_vr_active(&self) -> bool {
        self.prefs.enabled && self.frame.hmd.is_some() && !self.compositor.is_runtime_lost()
    }
}

fn check_prefs(prefs: &VrPrefs) -> Result<(), SessionError> {
    prefs.validate()?;
    prefs.validate_layer_names(|name| LayerKind::from_name(name).is_some())?;
    Ok(())
}
