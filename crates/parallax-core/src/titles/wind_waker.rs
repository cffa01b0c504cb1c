// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
use crate::layer::LayerKind;
use crate::projection::{OrthoSignature, PerspectiveSignature};
use crate::titles::{LayerMatcher, TitleFlags};

/// Narrower world frusta than this (hundredths of a degree) are the telescope.
const TELESCOPE_MAX_HFOV: i32 = 2000;
/// Perspective calls after the first whose far plane is this close are HUD widgets.
const HUD_MAX_FAR: i32 = 100_000;

const HUD: OrthoSignature = OrthoSignature::edges(0, 64000, 0, 48000);
const LETTERBOX: OrthoSignature = OrthoSignature::edges(0, 64000, 48000, 0);
const SCREEN_EFFECT: OrthoSignature = OrthoSignature::edges(-100, 100, 100, -100);

/// The Wind Waker (GZL).
#[derive(Debug, Clone, Copy, Default)]
pub struct WindWakerMatcher;

impl LayerMatcher for WindWakerMatcher {
    fn classify_3d(&self, ordinal: usize, sig: &PerspectiveSignature, flags: &mut TitleFlags) -> LayerKind {
        if sig.hfov <= 0 || sig.far <= sig.near {
            return if ordinal == 0 {
                LayerKind::UnknownWorld
            } else {
                LayerKind::UnknownHud
            };
        }
        if ordinal == 0 {
            flags.telescope = sig.hfov < TELESCOPE_MAX_HFOV;
            return LayerKind::World;
        }
        if sig.far <= HUD_MAX_FAR {
            LayerKind::Hud3D
        } else {
            LayerKind::World
        }
    }

    fn classify_2d(&self, _ordinal: usize, sig: &OrthoSignature, flags: &mut TitleFlags) -> LayerKind {
        if sig.same_box(&SCREEN_EFFECT) {
            LayerKind::ScreenEffect
        } else if sig.same_box(&LETTERBOX) {
            flags.cinematic = true;
            LayerKind::Letterbox
        } else if sig.same_box(&HUD) {
            flags.cinematic = false;
            LayerKind::Hud2D
        } else {
            LayerKind::Unknown2D
        }
    }
}
