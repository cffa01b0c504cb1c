// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
use crate::layer::LayerKind;
use crate::projection::{OrthoSignature, PerspectiveSignature};
use crate::titles::{LayerMatcher, TitleFlags};

/// Fallback profile: every usable frustum is world, every usable box is HUD.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericMatcher;

impl LayerMatcher for GenericMatcher {
    fn classify_3d(&self, _ordinal: usize, sig: &PerspectiveSignature, _flags: &mut TitleFlags) -> LayerKind {
        let valid = sig.hfov > 0
            && sig.vfov > 0
            && sig.hfov < 18000
            && sig.vfov < 18000
            && sig.near > 0
            && sig.far > sig.near;
        if valid {
            LayerKind::World
        } else {
            LayerKind::UnknownWorld
        }
    }

    fn classify_2d(&self, _ordinal: usize, sig: &OrthoSignature, _flags: &mut TitleFlags) -> LayerKind {
        if sig.is_degenerate() {
            LayerKind::Unknown2D
        } else {
            LayerKind::Hud2D
        }
    }
}
