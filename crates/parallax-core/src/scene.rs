// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Scene boundary detection, per-scene ordinals and the widest-FOV record.
//!
//! The legacy pipeline re-emits the same viewport/projection sequence every
//! frame while a scene is stable. Each value is logged against its ordinal;
//! when a logged value differs from the previous frame's value at the same
//! ordinal (or the ordinal is new) a change is armed, and the next
//! [`SceneTracker::is_new_scene`] reports it. Detection is therefore always one
//! frame late.

use tracing::debug;

use crate::math::round100;
use crate::projection::{FovParams, RawProjectionState};
use crate::viewport::ViewportRect;

/// Entries tracked per log; later ordinals are classified but not compared.
pub const SCENE_LOG_CAPACITY: usize = 64;

/// Widest 3-D world frustum seen in the current scene, quantized to hundredths.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WidestFov {
    /// Horizontal field of view in degrees.
    pub hfov: f32,
    /// Vertical field of view in degrees.
    pub vfov: f32,
    /// Near plane.
    pub near: f32,
    /// Far plane.
    pub far: f32,
}

impl WidestFov {
    /// Quantizes `fov` the same way the classifiers compare it.
    pub fn quantized(fov: &FovParams) -> Self {
        let q = |v: f32| round100(v) as f32 / 100.0;
        Self {
            hfov: q(fov.hfov),
            vfov: q(fov.vfov),
            near: q(fov.near),
            far: q(fov.far),
        }
    }

    /// As frustum parameters.
    pub fn to_params(self) -> FovParams {
        FovParams {
            hfov: self.hfov,
            vfov: self.vfov,
            near: self.near,
            far: self.far,
        }
    }
}

#[derive(Debug, Clone)]
struct OrdinalLog<const N: usize> {
    entries: Vec<[u32; N]>,
    cursor: usize,
}

impl<const N: usize> Default for OrdinalLog<N> {
    fn default() -> Self {
        Self {
            entries: Vec::with_capacity(SCENE_LOG_CAPACITY),
            cursor: 0,
        }
    }
}

impl<const N: usize> OrdinalLog<N> {
    /// Logs `bits` at the next ordinal. Returns the ordinal and whether it
    /// differs from the previous frame's entry.
    fn record(&mut self, bits: [u32; N]) -> (usize, Option<bool>) {
        let ordinal = self.cursor;
        self.cursor += 1;
        if ordinal >= SCENE_LOG_CAPACITY {
            return (ordinal, None);
        }
        let changed = match self.entries.get_mut(ordinal) {
            Some(slot) if *slot == bits => false,
            Some(slot) => {
                *slot = bits;
                true
            }
            None => {
                self.entries.push(bits);
                true
            }
        };
        (ordinal, Some(changed))
    }

    fn rewind(&mut self) {
        self.cursor = 0;
    }
}

/// Mutable per-scene context: ordinal counters, change logs, widest FOV.
#[derive(Debug, Clone, Default)]
pub struct SceneTracker {
    viewports: OrdinalLog<6>,
    projections: OrdinalLog<7>,
    armed: bool,
    overflow_logged: bool,
    widest: Option<WidestFov>,
    frame: u64,
    scene: u64,
}

impl SceneTracker {
    /// Empty tracker; the first frame's entries arm a change.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a frame: rewinds the ordinal counters, then reports whether a
    /// change armed during the previous frame marks a new scene.
    pub fn begin_frame(&mut self) -> bool {
        self.frame += 1;
        self.viewports.rewind();
        self.projections.rewind();
        self.is_new_scene()
    }

    /// Returns true exactly once per armed change; on true the ordinal
    /// counters rewind and the widest-FOV record clears.
    pub fn is_new_scene(&mut self) -> bool {
        if !self.armed {
            return false;
        }
        self.armed = false;
        debug!(
            frame = self.frame,
            scene = self.scene + 1,
            viewports = self.viewports.cursor,
            projections = self.projections.cursor,
            "scene transition"
        );
        self.viewports.rewind();
        self.projections.rewind();
        self.widest = None;
        self.scene += 1;
        true
    }

    /// Logs a viewport and returns its 0-based ordinal within the scene.
    pub fn record_viewport(&mut self, viewport: &ViewportRect) -> usize {
        let (ordinal, changed) = self.viewports.record(viewport.bits());
        self.note(changed, "viewport");
        ordinal
    }

    /// Logs a projection and returns its 0-based ordinal within the scene.
    pub fn record_projection(&mut self, projection: &RawProjectionState) -> usize {
        let (ordinal, changed) = self.projections.record(projection.bits());
        self.note(changed, "projection");
        ordinal
    }

    fn note(&mut self, changed: Option<bool>, log: &'static str) {
        match changed {
            Some(true) => self.armed = true,
            Some(false) => {}
            None if !self.overflow_logged => {
                self.overflow_logged = true;
                debug!(log, capacity = SCENE_LOG_CAPACITY, "scene log full; later entries untracked");
            }
            None => {}
        }
    }

    /// A change is pending for the next [`Self::is_new_scene`].
    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Offers a recognised world frustum; kept when its HFOV beats the record.
    pub fn offer_widest(&mut self, fov: &FovParams) -> bool {
        let candidate = WidestFov::quantized(fov);
        let wider = self.widest.is_none_or(|w| candidate.hfov > w.hfov);
        if wider {
            self.widest = Some(candidate);
        }
        wider
    }

    /// Widest world frustum of the current scene.
    pub fn widest(&self) -> Option<WidestFov> {
        self.widest
    }

    /// Frames started so far.
    pub fn frame_index(&self) -> u64 {
        self.frame
    }

    /// Scene transitions detected so far.
    pub fn scene_index(&self) -> u64 {
        self.scene
    }

    /// Next viewport ordinal.
    pub fn viewport_ordinal(&self) -> usize {
        self.viewports.cursor
    }

    /// Next projection ordinal.
    pub fn projection_ordinal(&self) -> usize {
        self.projections.cursor
    }
}
