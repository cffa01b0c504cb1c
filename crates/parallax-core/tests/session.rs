// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]
use parallax_config::{ConfigService, LayerHackPrefs, MemoryConfigStore, VrPrefs, PREFS_KEY};
use parallax_core::math::{Quat, Vec3};
use parallax_core::projection::OrthoEdges;
use parallax_core::{
    BatchInput, BatchOutput, FrameInputs, HmdSample, HudMode, LayerKind, NoHmd, RawProjectionState,
    ScreenRegion, SessionError, StaticHmd, StereoMatrices, StereoSession, TitleProfile,
    ViewportKind, ViewportRect,
};

const SCREEN: ScreenRegion = ScreenRegion::sized(640.0, 528.0);

fn batch(projection: RawProjectionState) -> BatchInput {
    BatchInput {
        viewport: ViewportRect::from_edges(0.0, 0.0, 640.0, 528.0, 0.0, 1.0),
        projection,
        screen: SCREEN,
    }
}

fn prime_world() -> BatchInput {
    batch(RawProjectionState::from_fov(73.27, 60.0, 5.0, 30000.0))
}

fn prime_radar() -> BatchInput {
    batch(RawProjectionState::from_fov(55.0, 55.0, 1.0, 1000.0))
}

fn prime_hud() -> BatchInput {
    batch(RawProjectionState::from_edges(OrthoEdges {
        left: 0.0,
        right: 640.0,
        top: 0.0,
        bottom: 448.0,
        near: 0.0,
        far: 1.0,
    }))
}

fn prime_session() -> StereoSession {
    StereoSession::new("GM8E01", VrPrefs::default()).expect("default prefs are valid")
}

#[test]
fn game_id_picks_profile() {
    assert_eq!(prime_session().profile(), TitleProfile::MetroidPrime);
    let s = StereoSession::new("GALE01", VrPrefs::default()).expect("session");
    assert_eq!(s.profile(), TitleProfile::Generic);
}

#[test]
fn prime_world_then_radar() {
    let mut s = prime_session();
    let mut hmd = StaticHmd::new(HmdSample::default());
    s.begin_frame(&mut hmd, FrameInputs::default());

    let world = s.process_batch(&prime_world());
    assert_eq!(world.projection_ordinal, 0);
    assert_eq!(world.layer.kind, LayerKind::World);
    assert_eq!(world.viewport.kind, ViewportKind::Fullscreen);
    let widest = s.scene().widest().expect("world updates the widest record");
    assert!((widest.hfov - 73.27).abs() < 1e-3);
    assert!((widest.vfov - 60.0).abs() < 1e-3);
    assert!((widest.near - 5.0).abs() < 1e-3);
    assert!((widest.far - 30000.0).abs() < 1e-1);

    let radar = s.process_batch(&prime_radar());
    assert_eq!(radar.projection_ordinal, 1);
    assert_eq!(radar.layer.kind, LayerKind::Hud3D);
    assert!(!radar.matrices.is_hidden());
    assert!((s.scene().widest().expect("kept").hfov - 73.27).abs() < 1e-3);
    assert!(s.is_vr_active());
}

#[test]
fn radar_signature_at_ordinal_zero_is_unknown() {
    let mut s = prime_session();
    s.begin_frame(&mut NoHmd, FrameInputs::default());
    let out = s.process_batch(&prime_radar());
    assert_eq!(out.layer.kind, LayerKind::UnknownWorld);
    assert!(s.scene().widest().is_none());
}

#[test]
fn scene_change_is_reported_one_frame_late() {
    let mut s = prime_session();
    let mut hmd = StaticHmd::new(HmdSample::default());

    assert!(!s.begin_frame(&mut hmd, FrameInputs::default()));
    s.process_batch(&prime_world());
    // first frame's entries were all new
    assert!(s.begin_frame(&mut hmd, FrameInputs::default()));
    s.process_batch(&prime_world());
    assert!(!s.begin_frame(&mut hmd, FrameInputs::default()));

    // morph ball camera replaces the world camera at ordinal 0
    let out = s.process_batch(&batch(RawProjectionState::from_fov(70.0, 56.2, 5.0, 30000.0)));
    assert_eq!(out.layer.kind, LayerKind::World);
    assert_eq!(s.flags().mode, HudMode::Morphball);
    assert!(s.scene().widest().is_some());
    assert!(s.begin_frame(&mut hmd, FrameInputs::default()));
    assert!(s.scene().widest().is_none());
    assert_eq!(s.scene().projection_ordinal(), 0);
}

fn generic_world(hfov: f32) -> BatchInput {
    batch(RawProjectionState::from_fov(hfov, 45.0, 1.0, 1000.0))
}

fn submit_frame(s: &mut StereoSession, hfovs: &[f32]) -> Vec<BatchOutput> {
    hfovs.iter().map(|&h| s.process_batch(&generic_world(h))).collect()
}

#[test]
fn changes_past_the_scene_log_are_ignored() {
    let mut s = StereoSession::new("GALE01", VrPrefs::default()).expect("session");
    let mut hmd = StaticHmd::new(HmdSample::default());
    let steady = vec![60.0; 70];

    s.begin_frame(&mut hmd, FrameInputs::default());
    submit_frame(&mut s, &steady);
    assert!(s.begin_frame(&mut hmd, FrameInputs::default()));
    submit_frame(&mut s, &steady);
    assert!(!s.begin_frame(&mut hmd, FrameInputs::default()));

    // only ordinals 64..70 change; they sit past the log
    let mut tail = steady.clone();
    tail[64..].fill(80.0);
    let out = submit_frame(&mut s, &tail);
    let last = out.last().expect("batches");
    assert_eq!(last.projection_ordinal, 69);
    assert_eq!(last.layer.kind, LayerKind::World);
    assert_eq!(s.scene().projection_ordinal(), 70);
    assert!(!s.begin_frame(&mut hmd, FrameInputs::default()));

    let mut head = tail;
    head[0] = 80.0;
    submit_frame(&mut s, &head);
    assert!(s.begin_frame(&mut hmd, FrameInputs::default()));
}

#[test]
fn head_pose_is_sampled_once_per_frame() {
    let mut s = prime_session();
    let mut hmd = StaticHmd::new(HmdSample::default());
    s.begin_frame(&mut hmd, FrameInputs::default());
    let before = s.process_batch(&prime_world()).matrices;

    hmd.set_sample(HmdSample {
        head_rotation: Quat::from_axis_angle(Vec3::UNIT_Y, 0.5),
        ..HmdSample::default()
    });
    let same_frame = s.process_batch(&prime_world()).matrices;
    assert_eq!(same_frame, before);

    s.begin_frame(&mut hmd, FrameInputs::default());
    let turned = s.process_batch(&prime_world()).matrices;
    assert_ne!(turned.view_left, before.view_left);
    assert_eq!(turned.proj_left, before.proj_left);
}

#[test]
fn hud_after_world_sets_draw_order_latch() {
    let mut s = prime_session();
    let mut hmd = StaticHmd::new(HmdSample::default());
    s.begin_frame(&mut hmd, FrameInputs::default());
    s.process_batch(&prime_hud());
    assert!(!s.hud_above_world());
    s.process_batch(&prime_world());
    let hud = s.process_batch(&prime_hud());
    assert_eq!(hud.layer.kind, LayerKind::Hud2D);
    assert!(s.hud_above_world());

    // new scene clears it
    s.begin_frame(&mut hmd, FrameInputs::default());
    assert!(!s.hud_above_world());
}

#[test]
fn hud_on_top_pref_forces_latch() {
    let mut prefs = VrPrefs::default();
    prefs.hud.on_top = true;
    let s = StereoSession::new("GM8E01", prefs).expect("session");
    assert!(s.hud_above_world());
}

#[test]
fn runtime_loss_latches_until_reenabled() {
    let mut s = prime_session();
    let mut hmd = StaticHmd::new(HmdSample::default());
    s.begin_frame(&mut hmd, FrameInputs::default());
    assert!(s.is_vr_active());

    hmd.set_lost(true);
    s.begin_frame(&mut hmd, FrameInputs::default());
    assert!(!s.is_vr_active());
    let b = prime_world();
    let out = s.process_batch(&b);
    assert_eq!(out.matrices, StereoMatrices::pass_through(b.projection.to_mat4()));

    // the runtime coming back is not enough
    hmd.set_lost(false);
    s.begin_frame(&mut hmd, FrameInputs::default());
    assert!(!s.is_vr_active());

    s.reenable_vr();
    s.begin_frame(&mut hmd, FrameInputs::default());
    assert!(s.is_vr_active());
    let out = s.process_batch(&b);
    assert_ne!(out.matrices.view_left, out.matrices.view_right);
}

#[test]
fn letterbox_hidden_by_default() {
    let mut s = prime_session();
    let mut hmd = StaticHmd::new(HmdSample::default());
    s.begin_frame(&mut hmd, FrameInputs::default());
    let bars = batch(RawProjectionState::from_edges(OrthoEdges {
        left: 0.0,
        right: 640.0,
        top: 448.0,
        bottom: 0.0,
        near: 0.0,
        far: 1.0,
    }));
    let out = s.process_batch(&bars);
    assert_eq!(out.layer.kind, LayerKind::Letterbox);
    assert!(out.layer.policy.hide);
    assert!(out.matrices.is_hidden());
    assert!(s.flags().cinematic);
}

#[test]
fn prefs_round_trip_through_config() {
    let config = ConfigService::new(MemoryConfigStore::new());
    let mut prefs = VrPrefs::default();
    prefs.layers.insert(
        "hud_2d".into(),
        LayerHackPrefs {
            hide: true,
            ..LayerHackPrefs::default()
        },
    );
    config.save(PREFS_KEY, &prefs).expect("save");
    let mut s = StereoSession::from_config("GM8E01", &config).expect("session");
    assert_eq!(s.prefs(), &prefs);

    let mut hmd = StaticHmd::new(HmdSample::default());
    s.begin_frame(&mut hmd, FrameInputs::default());
    assert!(s.process_batch(&prime_hud()).matrices.is_hidden());
}

#[test]
fn each_title_gets_its_own_saved_prefs() {
    let config = ConfigService::new(MemoryConfigStore::new());
    let mut global = VrPrefs::default();
    global.world.units_per_metre = 1.0;
    config.save(PREFS_KEY, &global).expect("save global");
    let mut prime = global.clone();
    prime.world.units_per_metre = 4.0;
    prime.save_for_game(&config, "GM8E01").expect("save prime");

    let a = StereoSession::from_config("GM8E01", &config).expect("prime session");
    let b = StereoSession::from_config("GZLE01", &config).expect("zelda session");
    assert_eq!(a.prefs().world.units_per_metre, 4.0);
    assert_eq!(b.prefs().world.units_per_metre, 1.0);
}

#[test]
fn missing_config_uses_defaults() {
    let config = ConfigService::new(MemoryConfigStore::new());
    let s = StereoSession::from_config("GZLE01", &config).expect("session");
    assert_eq!(s.prefs(), &VrPrefs::default());
    assert_eq!(s.profile(), TitleProfile::WindWaker);
}

#[test]
fn unknown_layer_names_are_rejected() {
    let mut prefs = VrPrefs::default();
    prefs.layers.insert("sky".into(), LayerHackPrefs::default());
    let err = StereoSession::new("GM8E01", prefs).expect_err("unknown layer");
    assert!(matches!(err, SessionError::Config(_)));

    let mut s = prime_session();
    let mut bad = VrPrefs::default();
    bad.hud.closer_3d = 2.0;
    assert!(s.set_prefs(bad).is_err());
    assert_eq!(s.prefs(), &VrPrefs::default());
}

#[test]
fn disabled_prefs_skip_sampling() {
    let mut prefs = VrPrefs::default();
    prefs.enabled = false;
    let mut s = StereoSession::new("GM8E01", prefs).expect("session");
    let mut hmd = StaticHmd::new(HmdSample::default());
    s.begin_frame(&mut hmd, FrameInputs::default());
    assert!(!s.is_vr_active());
    let b = prime_world();
    let out = s.process_batch(&b);
    assert_eq!(out.matrices, StereoMatrices::pass_through(b.projection.to_mat4()));
    // classification still runs
    assert_eq!(out.layer.kind, LayerKind::World);
}
