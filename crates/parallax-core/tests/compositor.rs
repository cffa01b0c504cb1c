// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]
use parallax_config::{LayerHackPrefs, MotionSicknessMethod, VrPrefs};
use parallax_core::hud_box::{box_scale_position, BoxDepth, BoxEdges, HudBox, ViewportFraction};
use parallax_core::math::{Mat4, Quat, Vec3};
use parallax_core::projection::OrthoEdges;
use parallax_core::{
    ComposeRequest, Compositor, Eye, HmdSample, LayerClassification, LayerKind, RawProjectionState,
    RenderPolicy, RuntimeError, ScreenRegion, SplitscreenKind, StereoMatrices,
    ViewportClassification, ViewportKind, ViewportRect, VrFrameState, WidestFov,
};

const EPS: f32 = 1e-4;

struct Fixture {
    layer: LayerClassification,
    viewport: ViewportClassification,
    rect: ViewportRect,
    screen: ScreenRegion,
    projection: RawProjectionState,
    widest: Option<WidestFov>,
    frame: VrFrameState,
    prefs: VrPrefs,
}

impl Fixture {
    fn world() -> Self {
        Self {
            layer: LayerClassification {
                kind: LayerKind::World,
                policy: RenderPolicy::default(),
            },
            viewport: ViewportClassification {
                kind: ViewportKind::Fullscreen,
                skybox: false,
                splitscreen: SplitscreenKind::None,
            },
            rect: ViewportRect::from_edges(0.0, 0.0, 640.0, 528.0, 0.0, 1.0),
            screen: ScreenRegion::sized(640.0, 528.0),
            projection: RawProjectionState::from_fov(73.27, 60.0, 5.0, 30000.0),
            widest: None,
            frame: VrFrameState {
                hmd: Some(HmdSample::default()),
                ..VrFrameState::default()
            },
            prefs: VrPrefs::default(),
        }
    }

    fn hud_2d() -> Self {
        let mut f = Self::world();
        f.layer.kind = LayerKind::Hud2D;
        f.projection = RawProjectionState::from_edges(OrthoEdges {
            left: 0.0,
            right: 640.0,
            top: 0.0,
            bottom: 480.0,
            near: 0.0,
            far: 1.0,
        });
        f
    }

    fn request(&self) -> ComposeRequest<'_> {
        ComposeRequest {
            layer: &self.layer,
            viewport: &self.viewport,
            viewport_rect: &self.rect,
            screen: &self.screen,
            projection: &self.projection,
            widest: self.widest,
            frame: &self.frame,
            prefs: &self.prefs,
        }
    }

    fn compose(&self) -> StereoMatrices {
        Compositor::new().compose(&self.request())
    }
}

fn all_finite(m: &Mat4) -> bool {
    m.to_array().iter().all(|v| v.is_finite())
}

#[test]
fn hidden_layer_is_all_zero() {
    let mut f = Fixture::world();
    f.layer.policy.hide = true;
    let out = f.compose();
    assert!(out.is_hidden());
    assert_eq!(out.stereo_separation, 0.0);
    assert_eq!(out, StereoMatrices::zero());
}

#[test]
fn vr_disabled_passes_source_through() {
    let mut f = Fixture::world();
    f.prefs.enabled = false;
    f.layer.policy.hide = true;
    let out = f.compose();
    let source = f.projection.to_mat4();
    assert_eq!(out, StereoMatrices::pass_through(source));
    assert_eq!(out.combined(Eye::Left), out.combined(Eye::Right));
}

#[test]
fn missing_or_lost_runtime_is_monoscopic() {
    let mut f = Fixture::world();
    f.frame.hmd = None;
    assert_eq!(f.compose(), StereoMatrices::pass_through(f.projection.to_mat4()));

    let f = Fixture::world();
    let mut c = Compositor::new();
    c.mark_runtime_lost(&RuntimeError::Unavailable("unplugged".into()));
    assert_eq!(c.compose(&f.request()), StereoMatrices::pass_through(f.projection.to_mat4()));
    c.reenable_vr();
    assert_ne!(c.compose(&f.request()), StereoMatrices::pass_through(f.projection.to_mat4()));
}

#[test]
fn render_to_texture_stays_monoscopic() {
    let mut f = Fixture::world();
    f.viewport.kind = ViewportKind::RenderToTexture;
    assert_eq!(f.compose(), StereoMatrices::pass_through(f.projection.to_mat4()));
}

#[test]
fn already_stereo_layer_only_gets_projection_hacks() {
    let mut f = Fixture::world();
    f.layer.kind = LayerKind::ScreenEffect;
    f.layer.policy.fullscreen_already_stereo = true;
    f.layer.policy.width = 2.0;
    f.layer.policy.right = 0.1;
    let source = f.projection.to_mat4();
    let out = f.compose();
    assert_eq!(out.view_left, Mat4::identity());
    assert_eq!(out.view_right, Mat4::identity());
    assert_eq!(out.proj_left.get(0, 0), source.get(0, 0) * 2.0);
    assert!((out.proj_left.get(0, 2) - 0.1).abs() < EPS);
    assert_eq!(out.proj_left, out.proj_right);
    assert_eq!(out.stereo_separation, 0.0);
}

#[test]
fn two_pass_eyes_differ_by_ipd() {
    let f = Fixture::world();
    let out = f.compose();
    assert!((out.view_left.get(0, 3) - 0.032).abs() < EPS);
    assert!((out.view_right.get(0, 3) + 0.032).abs() < EPS);
    assert_eq!(out.stereo_separation, 0.0);
    // native per-eye FOV (tan 1 each way)
    assert!((out.proj_left.get(0, 0) - 1.0).abs() < EPS);
    assert_eq!(out.proj_left.get(3, 2), -1.0);
    assert_eq!(out.vignette_fov, None);
}

#[test]
fn single_pass_shares_view_and_reports_separation() {
    let mut f = Fixture::world();
    f.prefs.single_pass_stereo = true;
    f.prefs.world.units_per_metre = 10.0;
    let out = f.compose();
    assert_eq!(out.view_left, out.view_right);
    assert!((out.stereo_separation - 0.32).abs() < EPS, "{}", out.stereo_separation);
}

#[test]
fn world_layer_uses_its_own_depth_window() {
    let f = Fixture::world();
    let out = f.compose();
    // z' = m22*z + m23 with near=5 maps to the near plane value
    let m22 = out.proj_left.get(2, 2);
    let m23 = out.proj_left.get(2, 3);
    let near = m23 / (m22 - 1.0);
    let far = m23 / m22;
    assert!((near - 5.0).abs() < 0.01, "{near}");
    assert!((far - 30000.0).abs() < 1.0, "{far}");
}

#[test]
fn head_rotation_is_undone_in_the_view() {
    let mut f = Fixture::world();
    let q = Quat::from_axis_angle(Vec3::UNIT_Y, 0.5);
    f.frame.hmd = Some(HmdSample {
        head_rotation: q,
        ..HmdSample::default()
    });
    let out = f.compose();
    let expected = Mat4::translation(0.032, 0.0, 0.0) * q.conjugate().to_mat4();
    assert!(out.view_left.max_abs_diff(&expected) < EPS);
}

#[test]
fn stuck_to_head_ignores_head_pose() {
    let mut f = Fixture::world();
    f.layer.policy.stuck_to_head = true;
    f.frame.hmd = Some(HmdSample {
        head_rotation: Quat::from_axis_angle(Vec3::UNIT_Y, 0.5),
        head_position: Vec3::new(0.3, 1.7, -0.2),
        ..HmdSample::default()
    });
    f.prefs.world.lean_back_angle = 20.0;
    let out = f.compose();
    assert!(out.view_left.max_abs_diff(&Mat4::translation(0.032, 0.0, 0.0)) < EPS);
}

#[test]
fn skybox_ignores_head_position() {
    let mut f = Fixture::world();
    f.frame.hmd = Some(HmdSample {
        head_position: Vec3::new(1.0, 0.0, 0.0),
        ..HmdSample::default()
    });
    let moving = f.compose();
    assert!((moving.view_left.get(0, 3) - (0.032 - 1.0)).abs() < EPS);

    f.layer.policy.skybox = true;
    let sky = f.compose();
    assert!((sky.view_left.get(0, 3) - 0.032).abs() < EPS);
}

#[test]
fn mirrored_source_mirrors_the_composite() {
    let f = Fixture::world();
    let plain = f.compose();
    let mut m = Fixture::world();
    m.projection.coeffs[0] = -m.projection.coeffs[0];
    let mirrored = m.compose();
    for eye in Eye::BOTH {
        let expected = plain.combined(eye).mirrored_axis(0);
        assert!(mirrored.combined(eye).max_abs_diff(&expected) < EPS);
    }
}

#[test]
fn unselected_player_hidden_only_without_hmd() {
    let mut f = Fixture::world();
    f.viewport.kind = ViewportKind::Player1;
    f.prefs.splitscreen.selected_player = 2;
    assert!(!f.compose().is_hidden());
    f.frame.hmd = None;
    assert!(f.compose().is_hidden());
    f.viewport.kind = ViewportKind::Player2;
    assert!(!f.compose().is_hidden());
}

#[test]
fn black_screen_keeps_hud_visible() {
    let mut f = Fixture::world();
    f.prefs.motion_sickness.method = MotionSicknessMethod::BlackScreen;
    f.frame.motion_sickness_active = true;
    assert!(f.compose().is_hidden());

    let mut h = Fixture::hud_2d();
    h.prefs.motion_sickness.method = MotionSicknessMethod::BlackScreen;
    h.frame.motion_sickness_active = true;
    assert!(!h.compose().is_hidden());
}

#[test]
fn reduce_fov_reports_vignette() {
    let mut f = Fixture::world();
    f.prefs.motion_sickness.method = MotionSicknessMethod::ReduceFov;
    f.prefs.motion_sickness.fov = 50.0;
    assert_eq!(f.compose().vignette_fov, None);
    f.frame.motion_sickness_active = true;
    assert_eq!(f.compose().vignette_fov, Some(50.0));
}

#[test]
fn debug_flash_blinks_the_named_layer() {
    let mut f = Fixture::world();
    f.prefs.debug.flash_layer = Some("world".into());
    f.prefs.debug.flash_period_frames = 2;
    f.frame.frame_index = 1;
    assert!(!f.compose().is_hidden());
    f.frame.frame_index = 2;
    assert!(f.compose().is_hidden());
    f.frame.frame_index = 4;
    assert!(!f.compose().is_hidden());
}

#[test]
fn layer_hacks_reach_the_projection() {
    let mut f = Fixture::world();
    f.prefs.layers.insert(
        "world".into(),
        LayerHackPrefs {
            height: 3.0,
            up: 0.25,
            ..LayerHackPrefs::default()
        },
    );
    f.layer.policy = RenderPolicy::derive(LayerKind::World, &Default::default(), &f.viewport, &f.prefs);
    let out = f.compose();
    assert!((out.proj_left.get(1, 1) - 3.0).abs() < EPS);
    assert!((out.proj_left.get(1, 2) - 0.25).abs() < EPS);
}

#[test]
fn hud_centre_maps_back_to_layer_centre() {
    let f = Fixture::hud_2d();
    let c = Compositor::new();
    let p = c.hud_point_to_layer(&f.request(), Vec3::new(0.0, 0.0, -1.5));
    assert!((p.x() - 320.0).abs() < 0.01, "{p:?}");
    assert!((p.y() - 240.0).abs() < 0.01, "{p:?}");
    assert!(p.z().abs() < 0.01, "{p:?}");
}

#[test]
fn hud_layer_sits_at_screen_distance() {
    let f = Fixture::hud_2d();
    let out = f.compose();
    // layer centre lands straight ahead at the virtual screen distance
    let centre = out.view_left.transform_point(&Vec3::new(320.0, 240.0, 0.0));
    assert!((centre.x() - 0.032).abs() < EPS, "{centre:?}");
    assert!(centre.y().abs() < EPS, "{centre:?}");
    assert!((centre.z() + 1.5).abs() < EPS, "{centre:?}");
}

#[test]
fn zero_width_box_has_zero_scale_not_nan() {
    let mut f = Fixture::hud_2d();
    f.projection = RawProjectionState::from_edges(OrthoEdges {
        left: 100.0,
        right: 100.0,
        top: 0.0,
        bottom: 480.0,
        near: 0.0,
        far: 1.0,
    });
    let out = f.compose();
    for eye in Eye::BOTH {
        assert!(all_finite(&out.view(eye)));
        assert!(all_finite(&out.proj(eye)));
    }

    let edges = BoxEdges {
        left: 5.0,
        right: 5.0,
        top: 1.0,
        bottom: 1.0,
        depth: BoxDepth::Volume { near: 2.0, far: 2.0 },
    };
    let dims = HudBox::screen(&VrPrefs::default(), 1.0);
    let (scale, position) = box_scale_position(&edges, &ViewportFraction::FULL, &dims);
    assert_eq!(scale, Vec3::ZERO);
    assert!(position.to_array().iter().all(|v| v.is_finite()));
}

#[test]
fn non_positive_aim_distance_falls_back_to_hud_distance() {
    let mut prefs = VrPrefs::default();
    prefs.world.aim_distance = 0.0;
    let fov = Fixture::world().projection.fov();
    let dims = HudBox::over_world(&prefs, &fov, 1.0, 0.0);
    assert_eq!(dims.aim_distance, dims.distance);
    prefs.world.aim_distance = -3.0;
    let dims = HudBox::over_world(&prefs, &fov, 1.0, 0.0);
    assert_eq!(dims.aim_distance, prefs.hud.distance);
}

#[test]
fn hud_over_world_matches_widest_frustum() {
    let mut f = Fixture::hud_2d();
    f.widest = Some(WidestFov {
        hfov: 90.0,
        vfov: 90.0,
        near: 1.0,
        far: 1000.0,
    });
    let out = f.compose();
    // with a 90 degree world the 640-wide layer spans 2 * distance across
    let left = out.view_left.transform_point(&Vec3::new(0.0, 240.0, 0.0));
    let right = out.view_left.transform_point(&Vec3::new(640.0, 240.0, 0.0));
    assert!(((right.x() - left.x()) - 3.0).abs() < 1e-3, "{left:?} {right:?}");
}
