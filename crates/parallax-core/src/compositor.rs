// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Stereoscopic transform compositor.
//!
//! For each classified batch the compositor produces per-eye view and
//! projection matrices. Branches, in order:
//!
//! 1. VR switched off: source projection, identity view, both eyes.
//! 2. Suppressed (hidden layer, unselected split-screen slot without a
//!    headset, comfort blanking, debug flash): all-zero matrices.
//! 3. No headset or runtime lost: monoscopic pass-through.
//! 4. Render-to-texture viewport: monoscopic pass-through.
//! 5. Already-stereo full-screen effect: projection hacks only.
//! 6. Full composite: per-eye projection, world chain or HUD box, head tracking.

use parallax_config::{MotionSicknessMethod, SkyboxSickness, VrPrefs};
use tracing::{info, trace, warn};

use crate::error::RuntimeError;
use crate::hmd::{Eye, EyeFov, VrFrameState};
use crate::hud_box::{box_transform, zoom_forward, BoxEdges, HudBox, ViewportFraction};
use crate::layer::{LayerClassification, LayerKind, Placement, RenderPolicy};
use crate::math::{deg_to_rad, rad_to_deg, safe_div, Mat4, Quat, Vec3};
use crate::projection::{FovParams, ProjectionKind, RawProjectionState};
use crate::scene::WidestFov;
use crate::viewport::{ScreenRegion, ViewportClassification, ViewportKind, ViewportRect};

/// Horizontal FOV assumed before any world layer has been seen, in degrees.
pub const DEFAULT_HFOV: f32 = 70.0;
/// Near plane assumed before any world layer has been seen.
pub const DEFAULT_NEAR: f32 = 1.0;
/// Far plane assumed before any world layer has been seen.
pub const DEFAULT_FAR: f32 = 10_000.0;
/// Near plane for HUD-box layers, in metres.
pub const HUD_NEAR_METRES: f32 = 0.1;

/// Matrices for one batch.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StereoMatrices {
    /// Left eye view.
    pub view_left: Mat4,
    /// Right eye view.
    pub view_right: Mat4,
    /// Left eye projection.
    pub proj_left: Mat4,
    /// Right eye projection.
    pub proj_right: Mat4,
    /// Single-pass stereo: clip-space x shift per eye; 0 otherwise.
    pub stereo_separation: f32,
    /// Visible FOV (degrees) the compositing stage should vignette to.
    pub vignette_fov: Option<f32>,
}

impl StereoMatrices {
    /// Everything zero: nothing rasterizes.
    pub const fn zero() -> Self {
        Self {
            view_left: Mat4::zero(),
            view_right: Mat4::zero(),
            proj_left: Mat4::zero(),
            proj_right: Mat4::zero(),
            stereo_separation: 0.0,
            vignette_fov: None,
        }
    }

    /// Unmodified monoscopic source for both eyes.
    pub const fn pass_through(source: Mat4) -> Self {
        Self {
            view_left: Mat4::identity(),
            view_right: Mat4::identity(),
            proj_left: source,
            proj_right: source,
            stereo_separation: 0.0,
            vignette_fov: None,
        }
    }

    /// View for `eye`.
    pub fn view(&self, eye: Eye) -> Mat4 {
        match eye {
            Eye::Left => self.view_left,
            Eye::Right => self.view_right,
        }
    }

    /// Projection for `eye`.
    pub fn proj(&self, eye: Eye) -> Mat4 {
        match eye {
            Eye::Left => self.proj_left,
            Eye::Right => self.proj_right,
        }
    }

    /// `proj * view` for `eye`.
    pub fn combined(&self, eye: Eye) -> Mat4 {
        self.proj(eye) * self.view(eye)
    }

    /// All four matrices are zero.
    pub fn is_hidden(&self) -> bool {
        self.view_left.is_zero() && self.view_right.is_zero() && self.proj_left.is_zero() && self.proj_right.is_zero()
    }
}

/// Inputs for one composition.
#[derive(Debug, Clone, Copy)]
pub struct ComposeRequest<'a> {
    /// Classified layer.
    pub layer: &'a LayerClassification,
    /// Classified viewport.
    pub viewport: &'a ViewportClassification,
    /// Raw viewport registers.
    pub viewport_rect: &'a ViewportRect,
    /// Final screen region.
    pub screen: &'a ScreenRegion,
    /// Raw projection registers.
    pub projection: &'a RawProjectionState,
    /// Widest world frustum of the scene.
    pub widest: Option<WidestFov>,
    /// Current frame.
    pub frame: &'a VrFrameState,
    /// User prefs.
    pub prefs: &'a VrPrefs,
}

impl ComposeRequest<'_> {
    fn placement(&self) -> Placement {
        if self.projection.is_perspective() && self.viewport.kind.is_sub_screen() {
            Placement::HudBox3D
        } else {
            self.layer.kind.placement(self.projection.kind)
        }
    }

    /// Game units per metre for this layer.
    pub fn units(&self) -> f32 {
        let world = &self.prefs.world;
        safe_div(world.units_per_metre * self.layer.policy.scale, world.scale)
    }

    fn fraction(&self) -> ViewportFraction {
        if self.viewport.kind.is_sub_screen() {
            ViewportFraction::of(self.viewport_rect, self.screen)
        } else {
            ViewportFraction::FULL
        }
    }

    fn hud_box(&self, units: f32) -> HudBox {
        match self.widest {
            Some(w) => {
                let zoom = zoom_forward(w.hfov, self.prefs.world.min_fov, self.prefs.world.aim_distance);
                HudBox::over_world(self.prefs, &w.to_params(), units, zoom)
            }
            None => HudBox::screen(self.prefs, units),
        }
    }

    fn box_edges(&self) -> BoxEdges {
        match self.projection.kind {
            ProjectionKind::Perspective => BoxEdges::from_perspective(self.projection, self.prefs.hud.closer_3d),
            ProjectionKind::Orthographic => BoxEdges::from_ortho(&self.projection.ortho_edges()),
        }
    }
}

/// Composes per-eye matrices; holds the runtime-loss latch and the per-scene
/// HUD-over-world latch.
#[derive(Debug, Clone, Default)]
pub struct Compositor {
    runtime_lost: bool,
    world_seen: bool,
    hud_above_world: bool,
}

impl Compositor {
    /// Fresh compositor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Falls back to pass-through until [`Self::reenable_vr`].
    pub fn mark_runtime_lost(&mut self, err: &RuntimeError) {
        if !self.runtime_lost {
            warn!(error = %err, "hmd runtime lost; falling back to monoscopic output");
        }
        self.runtime_lost = true;
    }

    /// Clears the runtime-loss latch.
    pub fn reenable_vr(&mut self) {
        if self.runtime_lost {
            info!("vr re-enabled");
        }
        self.runtime_lost = false;
    }

    /// The runtime-loss latch is set.
    pub fn is_runtime_lost(&self) -> bool {
        self.runtime_lost
    }

    /// Resets per-scene latches.
    pub fn on_new_scene(&mut self) {
        self.world_seen = false;
        self.hud_above_world = false;
    }

    /// A HUD layer followed a world layer in this scene.
    pub fn hud_above_world(&self) -> bool {
        self.hud_above_world
    }

    /// Composes the matrices for one batch.
    pub fn compose(&mut self, req: &ComposeRequest<'_>) -> StereoMatrices {
        let source = req.projection.to_mat4();
        if !req.prefs.enabled {
            return StereoMatrices::pass_through(source);
        }
        if let Some(reason) = suppression(req) {
            trace!(layer = req.layer.kind.as_str(), reason, "layer suppressed");
            return StereoMatrices::zero();
        }
        let hmd = match req.frame.hmd {
            Some(hmd) if !self.runtime_lost => hmd,
            _ => return StereoMatrices::pass_through(source),
        };
        if req.viewport.kind == ViewportKind::RenderToTexture {
            return StereoMatrices::pass_through(source);
        }
        let policy = &req.layer.policy;
        if policy.fullscreen_already_stereo {
            let proj = apply_projection_hacks(source, policy, req.projection.kind);
            return StereoMatrices {
                proj_left: proj,
                proj_right: proj,
                ..StereoMatrices::pass_through(source)
            };
        }

        self.note_layer(req.layer.kind);

        let units = req.units();
        let placement = req.placement();
        let fov = effective_fov(req);

        let (near, far) = match placement {
            Placement::World => {
                let own = req.projection.fov();
                if own.is_valid() {
                    (own.near, own.far)
                } else {
                    (fov.near, fov.far)
                }
            }
            Placement::HudBox3D | Placement::HudBox2D => {
                let near = HUD_NEAR_METRES * units;
                (near, fov.far.max(near * 2.0))
            }
        };

        let mut proj = [Mat4::zero(); 2];
        for eye in Eye::BOTH {
            let eye_fov = if policy.telescope {
                pinhole(&fov)
            } else {
                let f = hmd.fov(eye);
                if f.is_valid() {
                    f
                } else {
                    pinhole(&fov)
                }
            };
            let p = off_axis_projection(&eye_fov, near, far);
            proj[eye_index(eye)] = apply_projection_hacks(p, policy, ProjectionKind::Perspective);
        }

        let view = view_matrix(req, placement, units, hmd.head_rotation, hmd.head_position);

        let (mut views, separation) = if req.prefs.single_pass_stereo {
            let sep = hmd.offset(Eye::Right).x() * units * proj[1].get(0, 0);
            ([view, view], sep)
        } else {
            let per_eye = |eye: Eye| Mat4::translation_vec(-hmd.offset(eye).scale(units)) * view;
            ([per_eye(Eye::Left), per_eye(Eye::Right)], 0.0)
        };

        // ortho layers flip y through their box scale instead
        let perspective = req.projection.is_perspective();
        for (axis, mirrored) in [(0, req.projection.is_mirrored_x()), (1, req.projection.is_mirrored_y())] {
            if perspective && mirrored {
                for (p, v) in proj.iter_mut().zip(views.iter_mut()) {
                    *p = p.mirrored_axis(axis);
                    *v = v.mirrored_axis(axis);
                }
            }
        }

        let sickness = &req.prefs.motion_sickness;
        let vignette_fov = (req.frame.motion_sickness_active && sickness.method == MotionSicknessMethod::ReduceFov)
            .then_some(sickness.fov);

        StereoMatrices {
            view_left: views[0],
            view_right: views[1],
            proj_left: proj[0],
            proj_right: proj[1],
            stereo_separation: separation,
            vignette_fov,
        }
    }

    /// Maps a point in HUD space (metres in front of the player, before head
    /// tracking) back into the layer's own 2-D coordinates.
    pub fn hud_point_to_layer(&self, req: &ComposeRequest<'_>, point: Vec3) -> Vec3 {
        let units = req.units();
        let inverse = box_transform(&req.box_edges(), &req.fraction(), &req.hud_box(units), true);
        inverse.transform_point(&point.scale(units))
    }

    fn note_layer(&mut self, kind: LayerKind) {
        if kind.is_world() {
            self.world_seen = true;
        } else if kind.is_hud() && self.world_seen {
            self.hud_above_world = true;
        }
    }
}

fn eye_index(eye: Eye) -> usize {
    match eye {
        Eye::Left => 0,
        Eye::Right => 1,
    }
}

fn suppression(req: &ComposeRequest<'_>) -> Option<&'static str> {
    let kind = req.layer.kind;
    let policy = &req.layer.policy;
    let prefs = req.prefs;
    if policy.hide {
        return Some("hidden");
    }
    if req.frame.hmd.is_none() {
        let selected = prefs.splitscreen.selected_player;
        if let Some(player) = req.viewport.kind.player() {
            if selected != 0 && player != selected {
                return Some("unselected player");
            }
        }
    }
    if req.frame.motion_sickness_active {
        let sickness = &prefs.motion_sickness;
        if sickness.method == MotionSicknessMethod::BlackScreen && !kind.is_hud() {
            return Some("motion sickness blackout");
        }
        if sickness.skybox == SkyboxSickness::Hide && policy.skybox {
            return Some("motion sickness skybox");
        }
    }
    let debug = &prefs.debug;
    if debug.flash_period_frames > 0
        && debug.flash_layer.as_deref() == Some(kind.as_str())
        && (req.frame.frame_index / u64::from(debug.flash_period_frames)) % 2 == 1
    {
        return Some("debug flash");
    }
    None
}

/// Layer's own frustum for recognised world layers, else the scene's widest,
/// else the default.
fn effective_fov(req: &ComposeRequest<'_>) -> FovParams {
    if req.layer.kind == LayerKind::World && req.projection.is_perspective() {
        let own = req.projection.fov();
        if own.is_valid() {
            return own;
        }
    }
    req.widest
        .map_or_else(|| default_fov(req.prefs.widescreen), WidestFov::to_params)
}

/// 70° horizontal at the console's aspect ratio.
pub fn default_fov(widescreen: bool) -> FovParams {
    let aspect = if widescreen { 16.0 / 9.0 } else { 4.0 / 3.0 };
    let h_tan = (deg_to_rad(DEFAULT_HFOV) * 0.5).tan();
    FovParams {
        hfov: DEFAULT_HFOV,
        vfov: rad_to_deg(2.0 * (h_tan / aspect).atan()),
        near: DEFAULT_NEAR,
        far: DEFAULT_FAR,
    }
}

fn pinhole(fov: &FovParams) -> EyeFov {
    EyeFov::symmetric(
        (deg_to_rad(fov.hfov) * 0.5).tan(),
        (deg_to_rad(fov.vfov) * 0.5).tan(),
    )
}

/// Off-axis projection from half-angle tangents, with the legacy depth
/// mapping (`z` in `[-1, 0]`). A collapsed depth window zeroes the depth terms.
pub fn off_axis_projection(fov: &EyeFov, near: f32, far: f32) -> Mat4 {
    let h = fov.left_tan + fov.right_tan;
    let v = fov.up_tan + fov.down_tan;
    let depth = far - near;
    let (m22, m23) = if depth > 0.0 {
        (-near / depth, -(far * near) / depth)
    } else {
        (0.0, 0.0)
    };
    Mat4::from_rows([
        [safe_div(2.0, h), 0.0, safe_div(fov.right_tan - fov.left_tan, h), 0.0],
        [0.0, safe_div(2.0, v), safe_div(fov.up_tan - fov.down_tan, v), 0.0],
        [0.0, 0.0, m22, m23],
        [0.0, 0.0, -1.0, 0.0],
    ])
}

/// Width/height scale the projection; right/up shift it off-axis. An
/// orthographic projection shifts through its translation column.
pub fn apply_projection_hacks(proj: Mat4, policy: &RenderPolicy, kind: ProjectionKind) -> Mat4 {
    let shift_col = match kind {
        ProjectionKind::Perspective => 2,
        ProjectionKind::Orthographic => 3,
    };
    proj.with(0, 0, proj.get(0, 0) * policy.width)
        .with(1, 1, proj.get(1, 1) * policy.height)
        .with(0, shift_col, proj.get(0, shift_col) + policy.right)
        .with(1, shift_col, proj.get(1, shift_col) + policy.up)
}

fn view_matrix(
    req: &ComposeRequest<'_>,
    placement: Placement,
    units: f32,
    head_rotation: Quat,
    head_position: Vec3,
) -> Mat4 {
    let policy = &req.layer.policy;
    let prefs = req.prefs;
    let stuck = policy.stuck_to_head;
    let skybox = policy.skybox;
    let identity = Mat4::identity();

    let rotation = if stuck || policy.telescope {
        identity
    } else {
        head_rotation.conjugate().to_mat4()
    };
    let lean_back = if stuck {
        identity
    } else {
        Mat4::rotation_x(deg_to_rad(prefs.world.lean_back_angle))
    };
    let pitch = if stuck {
        identity
    } else {
        camera_pitch(req)
    };

    let (head_pos, free_look, camera_position) = if stuck || skybox {
        (identity, identity, identity)
    } else {
        let camera_position = match req.frame.stabilization {
            Some(s) if prefs.stabilization.position => Mat4::translation_vec(-s.position.scale(units)),
            _ => identity,
        };
        (
            Mat4::translation_vec(-head_position.scale(units)),
            Mat4::translation_vec(req.frame.free_look.scale(units)),
            camera_position,
        )
    };

    let tail = rotation * head_pos * lean_back * free_look * pitch * camera_position;

    match placement {
        Placement::World => {
            let forward = if stuck || skybox {
                identity
            } else {
                let zoom = req
                    .widest
                    .map_or(0.0, |w| zoom_forward(w.hfov, prefs.world.min_fov, prefs.world.aim_distance));
                Mat4::translation(0.0, 0.0, (prefs.world.camera_forward + zoom) * units)
            };
            tail * forward
        }
        Placement::HudBox3D | Placement::HudBox2D => {
            let hud_box = box_transform(&req.box_edges(), &req.fraction(), &req.hud_box(units), false);
            tail * hud_box
        }
    }
}

fn camera_pitch(req: &ComposeRequest<'_>) -> Mat4 {
    let prefs = req.prefs;
    let pitch_deg = if req.projection.is_perspective() || req.widest.is_some() {
        prefs.world.camera_pitch
    } else {
        prefs.world.screen_pitch
    };
    let user_pitch = Mat4::rotation_x(-deg_to_rad(pitch_deg));
    let stab = &prefs.stabilization;
    let locked_skybox = req.layer.policy.skybox && prefs.motion_sickness.skybox == SkyboxSickness::Lock;
    if stab.any_rotation() && stab.can_read_camera_angles && !locked_skybox {
        let game = req.frame.stabilization.map_or_else(Mat4::identity, |s| s.rotation);
        if stab.pitch {
            game
        } else {
            game * user_pitch
        }
    } else {
        user_pitch
    }
}
