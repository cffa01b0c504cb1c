// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
use crate::layer::LayerKind;
use crate::projection::{OrthoSignature, PerspectiveSignature};
use crate::titles::metroid_prime::{classify_prime_2d, classify_prime_3d, PrimeSignatures};
use crate::titles::{LayerMatcher, TitleFlags};

/// Metroid Prime 2: Echoes (G2M).
pub const METROID_PRIME2_SIGNATURES: PrimeSignatures = PrimeSignatures {
    world: PerspectiveSignature::new(7327, 6000, 500, 4_096_000),
    helmet: PerspectiveSignature::new(7327, 6000, 10, 409_600),
    morphball: PerspectiveSignature::new(7000, 5620, 500, 4_096_000),
    radar: PerspectiveSignature::new(5500, 5500, 100, 100_000),
    map: PerspectiveSignature::new(4500, 3690, 100, 512_000),
    screen_effect: OrthoSignature::edges(-100, 100, 100, -100),
    hud: OrthoSignature::edges(0, 64000, 0, 44800),
    text: OrthoSignature::edges(-32000, 32000, 22400, -22400),
    letterbox: OrthoSignature::edges(0, 64000, 44800, 0),
    menu: OrthoSignature::edges(0, 64000, 0, 48000),
};

/// World camera in the dark dimension: same frustum, shorter far plane.
pub const DARK_WORLD: PerspectiveSignature = PerspectiveSignature::new(7327, 6000, 500, 2_048_000);

/// Metroid Prime 2 matcher.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetroidPrime2Matcher;

impl LayerMatcher for MetroidPrime2Matcher {
    fn classify_3d(&self, ordinal: usize, sig: &PerspectiveSignature, flags: &mut TitleFlags) -> LayerKind {
        let t = &METROID_PRIME2_SIGNATURES;
        if *sig == DARK_WORLD {
            flags.dark_world = true;
            return classify_prime_3d(t, ordinal, &t.world, flags);
        }
        if *sig == t.world {
            flags.dark_world = false;
        }
        classify_prime_3d(t, ordinal, sig, flags)
    }

    fn classify_2d(&self, ordinal: usize, sig: &OrthoSignature, flags: &mut TitleFlags) -> LayerKind {
        let t = &METROID_PRIME2_SIGNATURES;
        // outside the dark world the NDC box carries the echo visor overlay, not a post effect
        if sig.same_box(&t.screen_effect) && !flags.dark_world {
            return LayerKind::Hud2D;
        }
        classify_prime_2d(t, ordinal, sig, flags)
    }
}
