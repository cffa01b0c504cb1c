// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Projection layer classifier: routes a projection to the active title
//! profile and feeds recognised world frusta into the scene's widest record.

use tracing::trace;

use crate::layer::LayerKind;
use crate::projection::{ProjectionKind, RawProjectionState};
use crate::scene::SceneTracker;
use crate::titles::{TitleFlags, TitleProfile};

/// Classifies projections for one title; owns that title's persistent flags.
#[derive(Debug, Clone, Default)]
pub struct LayerClassifier {
    profile: TitleProfile,
    flags: TitleFlags,
}

impl LayerClassifier {
    /// Classifier for `profile` with cleared flags.
    pub fn new(profile: TitleProfile) -> Self {
        Self {
            profile,
            flags: TitleFlags::default(),
        }
    }

    /// Active profile.
    pub fn profile(&self) -> TitleProfile {
        self.profile
    }

    /// Current flags.
    pub fn flags(&self) -> &TitleFlags {
        &self.flags
    }

    /// Classifies the projection at `ordinal`. A recognised world layer whose
    /// HFOV beats the scene's record replaces it.
    pub fn classify(
        &mut self,
        ordinal: usize,
        projection: &RawProjectionState,
        scene: &mut SceneTracker,
    ) -> LayerKind {
        let matcher = self.profile.matcher();
        let kind = match projection.kind {
            ProjectionKind::Perspective => {
                let sig = projection.perspective_signature();
                let kind = matcher.classify_3d(ordinal, &sig, &mut self.flags);
                if kind == LayerKind::World {
                    scene.offer_widest(&sig.to_params());
                }
                kind
            }
            ProjectionKind::Orthographic => {
                let sig = projection.ortho_signature();
                matcher.classify_2d(ordinal, &sig, &mut self.flags)
            }
        };
        trace!(
            profile = self.profile.name(),
            ordinal,
            layer = kind.as_str(),
            mode = ?self.flags.mode,
            "projection classified"
        );
        kind
    }
}
