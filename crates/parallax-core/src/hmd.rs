// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! HMD runtime port and the per-frame VR state handed to the compositor.

use crate::error::RuntimeError;
use crate::math::{Mat4, Quat, Vec3};

/// Interpupillary distance used by [`HmdSample::default`], in metres.
pub const DEFAULT_IPD: f32 = 0.064;

/// Left or right eye.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Eye {
    /// Left eye.
    Left,
    /// Right eye.
    Right,
}

impl Eye {
    /// Both eyes, left first.
    pub const BOTH: [Self; 2] = [Self::Left, Self::Right];

    fn index(self) -> usize {
        match self {
            Self::Left => 0,
            Self::Right => 1,
        }
    }
}

/// Per-eye field of view as tangents of the half-angles from the eye axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EyeFov {
    /// Tangent of the left half-angle.
    pub left_tan: f32,
    /// Tangent of the right half-angle.
    pub right_tan: f32,
    /// Tangent of the upward half-angle.
    pub up_tan: f32,
    /// Tangent of the downward half-angle.
    pub down_tan: f32,
}

impl EyeFov {
    /// Symmetric field of view.
    pub const fn symmetric(h_tan: f32, v_tan: f32) -> Self {
        Self {
            left_tan: h_tan,
            right_tan: h_tan,
            up_tan: v_tan,
            down_tan: v_tan,
        }
    }

    /// Both spans are positive and finite.
    pub fn is_valid(&self) -> bool {
        let h = self.left_tan + self.right_tan;
        let v = self.up_tan + self.down_tan;
        h.is_finite() && v.is_finite() && h > 0.0 && v > 0.0
    }
}

/// One pose/FOV sample from the runtime.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HmdSample {
    /// Head orientation.
    pub head_rotation: Quat,
    /// Head position in metres.
    pub head_position: Vec3,
    /// Per-eye FOV, left then right.
    pub eye_fov: [EyeFov; 2],
    /// Per-eye offset from the head centre in metres, left then right.
    pub eye_offset: [Vec3; 2],
}

impl Default for HmdSample {
    fn default() -> Self {
        let half_ipd = DEFAULT_IPD * 0.5;
        Self {
            head_rotation: Quat::identity(),
            head_position: Vec3::ZERO,
            eye_fov: [EyeFov::symmetric(1.0, 1.0); 2],
            eye_offset: [Vec3::new(-half_ipd, 0.0, 0.0), Vec3::new(half_ipd, 0.0, 0.0)],
        }
    }
}

impl HmdSample {
    /// FOV for `eye`.
    pub fn fov(&self, eye: Eye) -> EyeFov {
        self.eye_fov[eye.index()]
    }

    /// View offset for `eye`.
    pub fn offset(&self, eye: Eye) -> Vec3 {
        self.eye_offset[eye.index()]
    }
}

/// Pose source. Implementations wrap a vendor runtime; tests use [`StaticHmd`].
pub trait HmdRuntime {
    /// Samples the current pose. An error means the runtime is gone.
    fn sample(&mut self) -> Result<HmdSample, RuntimeError>;
    /// A headset is attached.
    fn is_present(&self) -> bool;
}

/// No headset: monoscopic output.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHmd;

impl HmdRuntime for NoHmd {
    fn sample(&mut self) -> Result<HmdSample, RuntimeError> {
        Err(RuntimeError::NotInitialized)
    }

    fn is_present(&self) -> bool {
        false
    }
}

/// Headset that always reports the same sample until marked lost.
#[derive(Debug, Clone, Default)]
pub struct StaticHmd {
    sample: HmdSample,
    lost: bool,
}

impl StaticHmd {
    /// Runtime reporting `sample`.
    pub fn new(sample: HmdSample) -> Self {
        Self { sample, lost: false }
    }

    /// Replaces the reported sample.
    pub fn set_sample(&mut self, sample: HmdSample) {
        self.sample = sample;
    }

    /// Makes every later [`HmdRuntime::sample`] fail (or succeed again).
    pub fn set_lost(&mut self, lost: bool) {
        self.lost = lost;
    }
}

impl HmdRuntime for StaticHmd {
    fn sample(&mut self) -> Result<HmdSample, RuntimeError> {
        if self.lost {
            Err(RuntimeError::Unavailable("static runtime marked lost".into()))
        } else {
            Ok(self.sample)
        }
    }

    fn is_present(&self) -> bool {
        true
    }
}

/// Game camera motion to cancel, as reported by the title's memory reader.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraStabilization {
    /// Inverse of the game camera's rotation (pitch/roll/yaw as configured).
    pub rotation: Mat4,
    /// Game camera position in metres.
    pub position: Vec3,
}

/// Everything the compositor needs about the current frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VrFrameState {
    /// Latest HMD sample; `None` without a headset or after runtime loss.
    pub hmd: Option<HmdSample>,
    /// Free-look camera translation in metres, in view space.
    pub free_look: Vec3,
    /// Game camera motion to cancel, when readable.
    pub stabilization: Option<CameraStabilization>,
    /// The player is moving fast enough for comfort measures to kick in.
    pub motion_sickness_active: bool,
    /// Frame counter.
    pub frame_index: u64,
}
