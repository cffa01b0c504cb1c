// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Metroid Prime profile. The table-driven matching here is shared with the
//! sequel, which only swaps constants and adds the dark-world flag.

use crate::layer::LayerKind;
use crate::projection::{OrthoSignature, PerspectiveSignature};
use crate::titles::{HudMode, LayerMatcher, TitleFlags};

/// Quantized signatures a Prime-engine title emits, in hundredths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrimeSignatures {
    /// First-person world camera.
    pub world: PerspectiveSignature,
    /// Visor/helmet geometry drawn just in front of the eye.
    pub helmet: PerspectiveSignature,
    /// Third-person morph ball camera.
    pub morphball: PerspectiveSignature,
    /// Radar and other perspective HUD widgets (never at ordinal 0).
    pub radar: PerspectiveSignature,
    /// Map screen camera.
    pub map: PerspectiveSignature,
    /// NDC-sized box used by visor post effects.
    pub screen_effect: OrthoSignature,
    /// Full 640×448 HUD box.
    pub hud: OrthoSignature,
    /// Centred text box used by scan text.
    pub text: OrthoSignature,
    /// Vertically flipped HUD box used for cutscene bars.
    pub letterbox: OrthoSignature,
    /// Pause menu box.
    pub menu: OrthoSignature,
}

/// Metroid Prime (GM8).
pub const METROID_PRIME_SIGNATURES: PrimeSignatures = PrimeSignatures {
    world: PerspectiveSignature::new(7327, 6000, 500, 3_000_000),
    helmet: PerspectiveSignature::new(7327, 6000, 10, 409_600),
    morphball: PerspectiveSignature::new(7000, 5620, 500, 3_000_000),
    radar: PerspectiveSignature::new(5500, 5500, 100, 100_000),
    map: PerspectiveSignature::new(4500, 3690, 100, 512_000),
    screen_effect: OrthoSignature::edges(-100, 100, 100, -100),
    hud: OrthoSignature::edges(0, 64000, 0, 44800),
    text: OrthoSignature::edges(-32000, 32000, 22400, -22400),
    letterbox: OrthoSignature::edges(0, 64000, 44800, 0),
    menu: OrthoSignature::edges(0, 60800, 0, 44800),
};

/// Metroid Prime matcher.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetroidPrimeMatcher;

impl LayerMatcher for MetroidPrimeMatcher {
    fn classify_3d(&self, ordinal: usize, sig: &PerspectiveSignature, flags: &mut TitleFlags) -> LayerKind {
        classify_prime_3d(&METROID_PRIME_SIGNATURES, ordinal, sig, flags)
    }

    fn classify_2d(&self, ordinal: usize, sig: &OrthoSignature, flags: &mut TitleFlags) -> LayerKind {
        classify_prime_2d(&METROID_PRIME_SIGNATURES, ordinal, sig, flags)
    }
}

pub(super) fn classify_prime_3d(
    t: &PrimeSignatures,
    ordinal: usize,
    sig: &PerspectiveSignature,
    flags: &mut TitleFlags,
) -> LayerKind {
    if *sig == t.world {
        // the world camera at the head of a scene means we're back in first person
        if ordinal == 0 && flags.in_mode(&[HudMode::Morphball, HudMode::Map]) {
            flags.enter(HudMode::Gameplay);
        }
        return LayerKind::World;
    }
    if *sig == t.morphball {
        if ordinal == 0 {
            flags.enter(HudMode::Morphball);
        }
        return LayerKind::World;
    }
    if *sig == t.helmet {
        if flags.in_mode(&[HudMode::Morphball, HudMode::Map, HudMode::Pause]) {
            flags.enter(HudMode::Gameplay);
        }
        return LayerKind::Helmet;
    }
    if *sig == t.map {
        flags.enter(HudMode::Map);
        return LayerKind::Map;
    }
    if *sig == t.radar && ordinal >= 1 {
        // radar is hidden by the scan visor and by menus
        if flags.in_mode(&[HudMode::Scan, HudMode::Map, HudMode::Pause]) {
            flags.enter(HudMode::Gameplay);
        }
        return LayerKind::Hud3D;
    }
    if ordinal == 0 {
        LayerKind::UnknownWorld
    } else {
        LayerKind::UnknownHud
    }
}

pub(super) fn classify_prime_2d(
    t: &PrimeSignatures,
    _ordinal: usize,
    sig: &OrthoSignature,
    flags: &mut TitleFlags,
) -> LayerKind {
    if sig.same_box(&t.screen_effect) {
        return LayerKind::ScreenEffect;
    }
    if sig.same_box(&t.hud) {
        flags.cinematic = false;
        return match flags.mode {
            HudMode::Scan => LayerKind::ScanOverlay,
            HudMode::Map => LayerKind::Map,
            HudMode::Pause => LayerKind::Menu,
            HudMode::Gameplay | HudMode::Morphball => LayerKind::Hud2D,
        };
    }
    if sig.same_box(&t.text) {
        if flags.mode == HudMode::Gameplay {
            flags.enter(HudMode::Scan);
        }
        return LayerKind::Text;
    }
    if sig.same_box(&t.letterbox) {
        flags.cinematic = true;
        return LayerKind::Letterbox;
    }
    if sig.same_box(&t.menu) {
        flags.enter(HudMode::Pause);
        return LayerKind::Menu;
    }
    LayerKind::Unknown2D
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn morphball_round_trip() {
        let m = MetroidPrimeMatcher;
        let mut f = TitleFlags::default();
        let t = &METROID_PRIME_SIGNATURES;
        assert_eq!(m.classify_3d(0, &t.morphball, &mut f), LayerKind::World);
        assert_eq!(f.mode, HudMode::Morphball);
        assert_eq!(m.classify_3d(0, &t.world, &mut f), LayerKind::World);
        assert_eq!(f.mode, HudMode::Gameplay);
    }

    #[test]
    fn radar_at_ordinal_zero_is_not_hud() {
        let m = MetroidPrimeMatcher;
        let mut f = TitleFlags::default();
        let radar = METROID_PRIME_SIGNATURES.radar;
        assert_eq!(m.classify_3d(0, &radar, &mut f), LayerKind::UnknownWorld);
        assert_eq!(m.classify_3d(1, &radar, &mut f), LayerKind::Hud3D);
    }

    #[test]
    fn hud_box_follows_mode() {
        let m = MetroidPrimeMatcher;
        let t = &METROID_PRIME_SIGNATURES;
        let mut f = TitleFlags::default();
        assert_eq!(m.classify_2d(2, &t.text, &mut f), LayerKind::Text);
        assert_eq!(f.mode, HudMode::Scan);
        assert_eq!(m.classify_2d(3, &t.hud, &mut f), LayerKind::ScanOverlay);
        assert_eq!(m.classify_2d(4, &t.menu, &mut f), LayerKind::Menu);
        assert_eq!(m.classify_2d(5, &t.hud, &mut f), LayerKind::Menu);
    }
}
