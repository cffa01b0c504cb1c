// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Recorded draw-call traces and their replay through a [`StereoSession`].
//!
//! A trace is JSON:
//!
//! ```json
//! { "game_id": "GM8E01",
//!   "screen": { "left": 0, "top": 0, "width": 640, "height": 528 },
//!   "frames": [[ { "viewport": { "left": 0, "top": 0, "width": 640, "height": 528 },
//!                  "projection": { "hfov": 73.27, "vfov": 60, "near": 5, "far": 30000 } } ]] }
//! ```
//!
//! Viewports and projections are accepted either as raw registers or in the
//! friendlier edge/FOV forms.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use parallax_config::VrPrefs;
use parallax_core::projection::OrthoEdges;
use parallax_core::{
    BatchInput, BatchOutput, FrameInputs, HmdRuntime, HmdSample, NoHmd, RawProjectionState,
    ScreenRegion, SessionError, StaticHmd, StereoSession, TitleProfile, ViewportRect,
};

/// A recorded run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    /// Disc game id; selects the title profile.
    pub game_id: String,
    /// Final screen region for every batch.
    pub screen: ScreenRegion,
    /// Batches per frame, in submission order.
    pub frames: Vec<Vec<TraceBatch>>,
}

impl Trace {
    /// Reads a trace file.
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("failed to open trace {}", path.display()))?;
        let trace = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("failed to parse trace {}", path.display()))?;
        Ok(trace)
    }

    /// Total number of batches.
    pub fn batch_count(&self) -> usize {
        self.frames.iter().map(Vec::len).sum()
    }
}

/// One recorded batch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TraceBatch {
    /// Viewport in effect.
    pub viewport: ViewportEntry,
    /// Projection in effect.
    pub projection: ProjectionEntry,
}

impl TraceBatch {
    /// Session input for this batch.
    pub fn to_input(&self, screen: ScreenRegion) -> BatchInput {
        BatchInput {
            viewport: self.viewport.to_rect(),
            projection: self.projection.to_state(),
            screen,
        }
    }
}

fn one() -> f32 {
    1.0
}

/// Viewport as registers or as pixel edges.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ViewportEntry {
    /// Raw registers.
    Registers(ViewportRect),
    /// Pixel edges and a normalised depth range.
    Edges {
        /// Left edge.
        left: f32,
        /// Top edge.
        top: f32,
        /// Width.
        width: f32,
        /// Height.
        height: f32,
        /// Near depth (default 0).
        #[serde(default)]
        near: f32,
        /// Far depth (default 1).
        #[serde(default = "one")]
        far: f32,
    },
}

impl ViewportEntry {
    /// Register form.
    pub fn to_rect(self) -> ViewportRect {
        match self {
            Self::Registers(rect) => rect,
            Self::Edges {
                left,
                top,
                width,
                height,
                near,
                far,
            } => ViewportRect::from_edges(left, top, width, height, near, far),
        }
    }
}

/// Projection as registers, as a symmetric frustum, or as an ortho box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProjectionEntry {
    /// Raw registers.
    Registers(RawProjectionState),
    /// Symmetric perspective frustum, degrees.
    Fov {
        /// Horizontal FOV.
        hfov: f32,
        /// Vertical FOV.
        vfov: f32,
        /// Near plane.
        near: f32,
        /// Far plane.
        far: f32,
    },
    /// Orthographic box.
    Ortho {
        /// Left edge.
        left: f32,
        /// Right edge.
        right: f32,
        /// Top edge.
        top: f32,
        /// Bottom edge.
        bottom: f32,
        /// Near depth.
        #[serde(default)]
        near: f32,
        /// Far depth.
        #[serde(default = "one")]
        far: f32,
    },
}

impl ProjectionEntry {
    /// Register form.
    pub fn to_state(self) -> RawProjectionState {
        match self {
            Self::Registers(state) => state,
            Self::Fov { hfov, vfov, near, far } => RawProjectionState::from_fov(hfov, vfov, near, far),
            Self::Ortho {
                left,
                right,
                top,
                bottom,
                near,
                far,
            } => RawProjectionState::from_edges(OrthoEdges {
                left,
                right,
                top,
                bottom,
                near,
                far,
            }),
        }
    }
}

/// How to replay.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReplayOptions {
    /// Profile override; the trace's game id decides otherwise.
    pub title: Option<TitleProfile>,
    /// Replay with a stationary headset instead of none.
    pub hmd: bool,
}

/// One replayed batch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReplayRecord {
    /// The batch's frame started a new scene.
    pub new_scene: bool,
    /// Index of the batch within its frame.
    pub batch: usize,
    /// Session output.
    #[serde(flatten)]
    pub output: BatchOutput,
}

impl ReplayRecord {
    /// One-line human summary.
    pub fn describe(&self) -> String {
        let o = &self.output;
        format!(
            "frame {:>4} #{:<2} vp{:<2} proj{:<2} {:<17} {:<13} hide={} stuck={} skybox={}{}",
            o.frame,
            self.batch,
            o.viewport_ordinal,
            o.projection_ordinal,
            o.viewport.kind.as_str(),
            o.layer.kind.as_str(),
            u8::from(o.layer.policy.hide),
            u8::from(o.layer.policy.stuck_to_head),
            u8::from(o.layer.policy.skybox),
            if self.new_scene && self.batch == 0 { "  <- new scene" } else { "" },
        )
    }
}

/// Runs every batch of `trace` through a fresh session.
pub fn replay(trace: &Trace, prefs: VrPrefs, opts: &ReplayOptions) -> Result<Vec<ReplayRecord>, SessionError> {
    let mut session = match opts.title {
        Some(profile) => StereoSession::with_profile(profile, prefs)?,
        None => StereoSession::new(&trace.game_id, prefs)?,
    };
    let mut runtime: Box<dyn HmdRuntime> = if opts.hmd {
        Box::new(StaticHmd::new(HmdSample::default()))
    } else {
        Box::new(NoHmd)
    };

    let mut records = Vec::with_capacity(trace.batch_count());
    for frame in &trace.frames {
        let new_scene = session.begin_frame(runtime.as_mut(), FrameInputs::default());
        for (batch, entry) in frame.iter().enumerate() {
            let output = session.process_batch(&entry.to_input(trace.screen));
            records.push(ReplayRecord {
                new_scene,
                batch,
                output,
            });
        }
    }
    Ok(records)
}
