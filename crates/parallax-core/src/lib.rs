// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! parallax-core: stereoscopic retrofit for a legacy fixed-function pipeline.
//!
//! The emulated title submits draw batches with a viewport and a projection
//! and no notion of eyes. This crate works out what each batch is (world,
//! HUD, menu, screen effect...) and rewrites its transforms into per-eye view
//! and projection matrices for a head-mounted display.
//!
//! The pipeline per batch is:
//! [`SceneTracker`] (ordinals, scene changes, widest world FOV) →
//! [`ViewportClassifier`] → [`LayerClassifier`] (per-title [`TitleProfile`]) →
//! [`RenderPolicy`] → [`Compositor`]. [`StereoSession`] drives all of it.
#![forbid(unsafe_code)]

/// Float32 math (Vec3, Mat4, Quat) and scalar helpers.
pub mod math;

pub mod classifier;
pub mod compositor;
pub mod error;
pub mod hmd;
pub mod hud_box;
pub mod layer;
pub mod projection;
pub mod scene;
pub mod session;
pub mod titles;
pub mod viewport;

pub use classifier::LayerClassifier;
pub use compositor::{ComposeRequest, Compositor, StereoMatrices};
pub use error::{RuntimeError, SessionError};
pub use hmd::{
    CameraStabilization, Eye, EyeFov, HmdRuntime, HmdSample, NoHmd, StaticHmd, VrFrameState,
};
pub use layer::{LayerClassification, LayerKind, Placement, RenderPolicy};
pub use projection::{FovParams, OrthoEdges, ProjectionKind, RawProjectionState};
pub use scene::{SceneTracker, WidestFov};
pub use session::{BatchInput, BatchOutput, FrameInputs, StereoSession};
pub use titles::{HudMode, TitleFlags, TitleProfile};
pub use viewport::{
    ScreenRegion, SplitscreenKind, ViewportClassification, ViewportClassifier, ViewportKind,
    ViewportRect,
};
