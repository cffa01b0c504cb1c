// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]
use std::fs;
use std::path::PathBuf;

use clap::Parser;
use parallax_cli::cli::{run, Cli};
use parallax_cli::trace::{replay, ReplayOptions, Trace};
use parallax_config::VrPrefs;
use parallax_core::{LayerKind, TitleProfile, ViewportKind};

const PRIME_TRACE: &str = r#"{
  "game_id": "GM8E01",
  "screen": { "left": 0, "top": 0, "width": 640, "height": 528 },
  "frames": [
    [
      { "viewport": { "left": 0, "top": 0, "width": 640, "height": 528 },
        "projection": { "hfov": 73.27, "vfov": 60, "near": 5, "far": 30000 } },
      { "viewport": { "left": 0, "top": 0, "width": 640, "height": 528 },
        "projection": { "left": 0, "right": 640, "top": 0, "bottom": 448 } }
    ],
    [
      { "viewport": { "left": 0, "top": 0, "width": 640, "height": 528 },
        "projection": { "hfov": 73.27, "vfov": 60, "near": 5, "far": 30000 } }
    ]
  ]
}"#;

fn scratch(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("parallax-cli-{}-{name}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).expect("scratch dir");
    dir
}

fn run_args(args: &[&str]) -> String {
    let cli = Cli::try_parse_from(args).expect("args parse");
    let mut out = Vec::new();
    run(cli, &mut out).expect("command runs");
    String::from_utf8(out).expect("utf8 output")
}

#[test]
fn replay_classifies_each_batch() {
    let trace: Trace = serde_json::from_str(PRIME_TRACE).expect("trace parses");
    assert_eq!(trace.batch_count(), 3);

    let records = replay(&trace, VrPrefs::default(), &ReplayOptions { title: None, hmd: true })
        .expect("replay");
    assert_eq!(records.len(), 3);
    assert_eq!(records[0].output.layer.kind, LayerKind::World);
    assert_eq!(records[0].output.viewport.kind, ViewportKind::Fullscreen);
    assert_eq!(records[1].output.layer.kind, LayerKind::Hud2D);
    assert_eq!(records[1].batch, 1);
    assert!(!records[0].new_scene);
    // first frame's entries were new, so the second frame opens a scene
    assert!(records[2].new_scene);
    assert!(records[2].describe().contains("<- new scene"));
}

#[test]
fn title_override_beats_game_id() {
    let mut trace: Trace = serde_json::from_str(PRIME_TRACE).expect("trace parses");
    // the radar frustum is a HUD only under the Metroid Prime profile
    let radar = serde_json::from_str(
        r#"{ "viewport": { "left": 0, "top": 0, "width": 640, "height": 528 },
             "projection": { "hfov": 55, "vfov": 55, "near": 1, "far": 1000 } }"#,
    )
    .expect("batch parses");
    trace.frames = vec![vec![trace.frames[0][0], radar]];

    let prime = replay(&trace, VrPrefs::default(), &ReplayOptions::default()).expect("replay");
    assert_eq!(prime[1].output.layer.kind, LayerKind::Hud3D);

    let opts = ReplayOptions {
        title: Some(TitleProfile::Generic),
        hmd: false,
    };
    let generic = replay(&trace, VrPrefs::default(), &opts).expect("replay");
    assert_eq!(generic[1].output.layer.kind, LayerKind::World);
}

#[test]
fn replay_command_prints_summary_and_json() {
    let dir = scratch("replay");
    let path = dir.join("trace.json");
    fs::write(&path, PRIME_TRACE).expect("write trace");
    let config = dir.join("config");
    let trace = path.to_str().expect("utf8 path");
    let config = config.to_str().expect("utf8 path");

    let text = run_args(&["parallax", "--config-dir", config, "replay", trace, "--hmd"]);
    assert_eq!(text.lines().count(), 4);
    assert!(text.lines().last().is_some_and(|l| l.starts_with("2 frames, 3 batches")));

    let json = run_args(&["parallax", "replay", trace, "--json", "--config-dir", config]);
    let first: serde_json::Value =
        serde_json::from_str(json.lines().next().expect("a line")).expect("json line");
    assert_eq!(first["batch"], 0);
    assert_eq!(first["new_scene"], false);
    assert_eq!(json.lines().count(), 3);
}

#[test]
fn unknown_title_is_an_error() {
    let dir = scratch("title");
    let path = dir.join("trace.json");
    fs::write(&path, PRIME_TRACE).expect("write trace");
    let cli = Cli::try_parse_from([
        "parallax",
        "--config-dir",
        dir.to_str().expect("utf8 path"),
        "replay",
        path.to_str().expect("utf8 path"),
        "--title",
        "super-metroid",
    ])
    .expect("args parse");
    assert!(run(cli, &mut Vec::new()).is_err());
}

#[test]
fn titles_lists_every_profile() {
    let text = run_args(&["parallax", "titles"]);
    assert_eq!(text.lines().count(), TitleProfile::ALL.len());
    assert!(text.contains("metroid-prime-2"));
    assert!(text.contains("GZL"));
}

#[test]
fn prefs_show_path_and_reset() {
    let dir = scratch("prefs");
    let base = dir.to_str().expect("utf8 path");

    let path = run_args(&["parallax", "--config-dir", base, "prefs", "path"]);
    assert!(path.trim_end().ends_with("vr-prefs.json"));

    let shown = run_args(&["parallax", "--config-dir", base, "prefs", "show"]);
    let prefs: VrPrefs = serde_json::from_str(&shown).expect("prefs json");
    assert_eq!(prefs, VrPrefs::default());

    let mut custom = VrPrefs::default();
    custom.enabled = false;
    fs::write(dir.join("vr-prefs.json"), serde_json::to_vec(&custom).expect("encode")).expect("write");
    let shown = run_args(&["parallax", "--config-dir", base, "prefs", "show"]);
    let prefs: VrPrefs = serde_json::from_str(&shown).expect("prefs json");
    assert!(!prefs.enabled);

    run_args(&["parallax", "--config-dir", base, "prefs", "reset"]);
    assert!(!dir.join("vr-prefs.json").exists());
}

#[test]
fn prefs_can_target_one_game() {
    let dir = scratch("game");
    let base = dir.to_str().expect("utf8 path");

    let path = run_args(&["parallax", "--config-dir", base, "prefs", "--game", "GM8E01", "path"]);
    assert!(path.trim_end().ends_with("vr-prefs.GM8E01.json"));

    fs::write(dir.join("vr-prefs.json"), r#"{ "world": { "units_per_metre": 2.0 } }"#).expect("write global");
    fs::write(dir.join("vr-prefs.GM8E01.json"), r#"{ "hud": { "distance": 3.0 } }"#).expect("write game");

    let shown = run_args(&["parallax", "--config-dir", base, "prefs", "--game", "GM8E01", "show"]);
    let prime: VrPrefs = serde_json::from_str(&shown).expect("prefs json");
    assert_eq!(prime.world.units_per_metre, 2.0);
    assert_eq!(prime.hud.distance, 3.0);

    let shown = run_args(&["parallax", "--config-dir", base, "prefs", "--game", "GZLE01", "show"]);
    let zelda: VrPrefs = serde_json::from_str(&shown).expect("prefs json");
    assert_eq!(zelda.world.units_per_metre, 2.0);
    assert_eq!(zelda.hud.distance, VrPrefs::default().hud.distance);

    run_args(&["parallax", "--config-dir", base, "prefs", "--game", "GM8E01", "reset"]);
    assert!(!dir.join("vr-prefs.GM8E01.json").exists());
    assert!(dir.join("vr-prefs.json").exists());
}
