// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! The virtual HUD box: a scale+translate that places 2-D layers and
//! perspective HUD widgets at a fixed distance in front of the player.

use parallax_config::VrPrefs;

use crate::math::{clamp, deg_to_rad, safe_div, Mat4, Vec3};
use crate::projection::{FovParams, OrthoEdges, RawProjectionState};
use crate::viewport::{ScreenRegion, ViewportRect};

/// HUD never moves closer than this when the world scale shrinks it, in metres.
pub const MIN_HUD_DISTANCE: f32 = 0.28;
/// HUD never moves further than this when the world scale grows it, in metres.
pub const MAX_HUD_DISTANCE: f32 = 3.0;

/// How the source layer's depth maps into the box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BoxDepth {
    /// Orthographic depth window; stretched to the box thickness.
    Volume {
        /// Near depth of the source layer.
        near: f32,
        /// Far depth of the source layer.
        far: f32,
    },
    /// Perspective widget drawn at `z_obj` units in front of its camera;
    /// depth keeps the horizontal scale.
    Plane {
        /// Depth the edges were measured at.
        z_obj: f32,
    },
}

/// Extents of the source layer in its own units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxEdges {
    /// Left edge.
    pub left: f32,
    /// Right edge.
    pub right: f32,
    /// Top edge.
    pub top: f32,
    /// Bottom edge.
    pub bottom: f32,
    /// Depth mapping.
    pub depth: BoxDepth,
}

impl BoxEdges {
    /// Edges of an orthographic layer.
    pub fn from_ortho(e: &OrthoEdges) -> Self {
        Self {
            left: e.left,
            right: e.right,
            top: e.top,
            bottom: e.bottom,
            depth: BoxDepth::Volume {
                near: e.near,
                far: e.far,
            },
        }
    }

    /// Edges of a perspective layer's frustum, measured `closer` of the way
    /// from its near plane to its far plane.
    pub fn from_perspective(p: &RawProjectionState, closer: f32) -> Self {
        let [p0, p1, p2, p3, _, _] = p.coeffs;
        let fov = p.fov();
        let z_obj = fov.near + (fov.far - fov.near) * closer;
        Self {
            left: safe_div(p1 - 1.0, p0) * z_obj,
            right: safe_div(p1 + 1.0, p0) * z_obj,
            top: safe_div(p3 + 1.0, p2) * z_obj,
            bottom: safe_div(p3 - 1.0, p2) * z_obj,
            depth: BoxDepth::Plane { z_obj },
        }
    }
}

/// Share of the HUD a sub-screen viewport covers, and where.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportFraction {
    /// Width and height as fractions of the screen.
    pub scale: [f32; 2],
    /// Centre offset as fractions of the screen, x right and y up.
    pub offset: [f32; 2],
}

impl ViewportFraction {
    /// The whole screen.
    pub const FULL: Self = Self {
        scale: [1.0, 1.0],
        offset: [0.0, 0.0],
    };

    /// Fraction covered by `vp`. A degenerate screen yields [`Self::FULL`].
    pub fn of(vp: &ViewportRect, screen: &ScreenRegion) -> Self {
        if screen.is_degenerate() {
            return Self::FULL;
        }
        let (sw, sh) = (screen.width, screen.height);
        Self {
            scale: [vp.width() / sw, vp.height() / sh],
            offset: [
                ((vp.left() + vp.width() * 0.5) - (screen.left + sw * 0.5)) / sw,
                -((vp.top() + vp.height() * 0.5) - (screen.top + sh * 0.5)) / sh,
            ],
        }
    }
}

/// Box dimensions in game units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HudBox {
    /// Width of the full HUD.
    pub width: f32,
    /// Height of the full HUD.
    pub height: f32,
    /// Thickness given to a 2-D layer's depth range.
    pub thickness: f32,
    /// Distance from the eye to depth 0.
    pub distance: f32,
    /// Vertical shift.
    pub up: f32,
    /// Horizontal shift.
    pub right: f32,
    /// Distance at which the HUD lines up with the world.
    pub aim_distance: f32,
    /// Camera dolly applied to the world.
    pub camera_forward: f32,
}

impl HudBox {
    /// Virtual flat screen for scenes with no 3-D world.
    pub fn screen(prefs: &VrPrefs, units: f32) -> Self {
        let s = &prefs.screen;
        let height = s.height * units;
        let aspect = if prefs.widescreen { 16.0 / 9.0 } else { 4.0 / 3.0 };
        let distance = s.distance * units;
        Self {
            width: height * aspect,
            height,
            thickness: s.thickness * units,
            distance,
            up: s.up * units,
            right: s.right * units,
            aim_distance: distance,
            camera_forward: 0.0,
        }
    }

    /// HUD floating over a 3-D world whose widest frustum is `fov`.
    pub fn over_world(prefs: &VrPrefs, fov: &FovParams, units: f32, zoom_forward: f32) -> Self {
        let world = &prefs.world;
        let hud_scale = clamped_hud_scale(world.scale, prefs.hud.distance);
        let distance = prefs.hud.distance * hud_scale * units;
        let camera_forward = (world.camera_forward + zoom_forward) * world.scale * units;
        let mut aim_distance = world.aim_distance * world.scale * units;
        if aim_distance <= 0.0 {
            aim_distance = distance;
        }
        let correction = safe_div(aim_distance + camera_forward, aim_distance);
        Self {
            width: 2.0 * (deg_to_rad(fov.hfov) * 0.5).tan() * distance * correction,
            height: 2.0 * (deg_to_rad(fov.vfov) * 0.5).tan() * distance * correction,
            thickness: prefs.hud.thickness * hud_scale * units,
            distance,
            up: 0.0,
            right: 0.0,
            aim_distance,
            camera_forward,
        }
    }
}

/// World scale applied to the HUD distance, limited so the HUD stays within
/// [`MIN_HUD_DISTANCE`, `MAX_HUD_DISTANCE`] unless it started outside.
pub fn clamped_hud_scale(scale: f32, hud_distance: f32) -> f32 {
    if scale < 1.0 && hud_distance >= MIN_HUD_DISTANCE && hud_distance * scale < MIN_HUD_DISTANCE {
        MIN_HUD_DISTANCE / hud_distance
    } else if scale > 1.0 && hud_distance <= MAX_HUD_DISTANCE && hud_distance * scale > MAX_HUD_DISTANCE {
        MAX_HUD_DISTANCE / hud_distance
    } else {
        scale
    }
}

/// Extra dolly (metres) that keeps aim correct when the widest FOV is
/// narrower than `min_fov`; 0 otherwise.
pub fn zoom_forward(widest_hfov: f32, min_fov: f32, aim_distance: f32) -> f32 {
    if widest_hfov > min_fov {
        return 0.0;
    }
    let narrow = (deg_to_rad(clamp(widest_hfov, 0.0, 179.0)) * 0.5).tan();
    if narrow <= 0.0 {
        return 0.0;
    }
    aim_distance * (deg_to_rad(min_fov) * 0.5).tan() / narrow - aim_distance
}

/// Scale and position of the box. Coinciding edges give a zero scale.
pub fn box_scale_position(edges: &BoxEdges, fraction: &ViewportFraction, dims: &HudBox) -> (Vec3, Vec3) {
    let sx = if edges.right == edges.left {
        0.0
    } else {
        fraction.scale[0] * dims.width / (edges.right - edges.left)
    };
    // positive is up in 3-D
    let sy = if edges.top == edges.bottom {
        0.0
    } else {
        fraction.scale[1] * dims.height / (edges.top - edges.bottom)
    };
    let (sz, pz) = match edges.depth {
        BoxDepth::Plane { z_obj } => (sx, sx * z_obj - dims.distance),
        BoxDepth::Volume { near, far } => {
            let sz = if far == near {
                0.0
            } else {
                dims.thickness / (far - near)
            };
            (sz, -dims.distance)
        }
    };
    let px = sx * (-(edges.right + edges.left) * 0.5) + fraction.offset[0] * dims.width + dims.right;
    let py = sy * (-(edges.top + edges.bottom) * 0.5) + fraction.offset[1] * dims.height + dims.up;
    (Vec3::new(sx, sy, sz), Vec3::new(px, py, pz))
}

/// Box transform (`T(position) * S(scale)`), or its inverse when `invert`.
/// Zero scale components invert to zero.
pub fn box_transform(edges: &BoxEdges, fraction: &ViewportFraction, dims: &HudBox, invert: bool) -> Mat4 {
    let (scale, position) = box_scale_position(edges, fraction, dims);
    if invert {
        let [sx, sy, sz] = scale.to_array();
        let inv = Mat4::scale(safe_div(1.0, sx), safe_div(1.0, sy), safe_div(1.0, sz));
        inv * Mat4::translation_vec(-position)
    } else {
        let [sx, sy, sz] = scale.to_array();
        Mat4::translation_vec(position) * Mat4::scale(sx, sy, sz)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dims() -> HudBox {
        HudBox::screen(&VrPrefs::default(), 1.0)
    }

    #[test]
    fn flat_layer_gets_zero_depth_scale() {
        let edges = BoxEdges {
            left: 0.0,
            right: 640.0,
            top: 0.0,
            bottom: 480.0,
            depth: BoxDepth::Volume { near: 0.5, far: 0.5 },
        };
        let (scale, position) = box_scale_position(&edges, &ViewportFraction::FULL, &dims());
        assert_eq!(scale.z(), 0.0);
        assert_eq!(position.z(), -1.5);
        assert!(scale.y() < 0.0);
    }

    #[test]
    fn inverse_undoes_forward() {
        let edges = BoxEdges {
            left: 0.0,
            right: 640.0,
            top: 0.0,
            bottom: 480.0,
            depth: BoxDepth::Volume { near: 0.0, far: 1.0 },
        };
        let d = dims();
        let f = ViewportFraction::FULL;
        let m = box_transform(&edges, &f, &d, true) * box_transform(&edges, &f, &d, false);
        assert!(m.max_abs_diff(&Mat4::identity()) < 1e-5);
    }

    #[test]
    fn hud_scale_clamps_to_comfort_range() {
        assert_eq!(clamped_hud_scale(0.1, 1.5), MIN_HUD_DISTANCE / 1.5);
        assert_eq!(clamped_hud_scale(10.0, 1.5), MAX_HUD_DISTANCE / 1.5);
        assert_eq!(clamped_hud_scale(1.0, 1.5), 1.0);
        // already outside the range: left alone
        assert_eq!(clamped_hud_scale(0.5, 0.2), 0.5);
    }

    #[test]
    fn zoom_only_below_min_fov() {
        assert_eq!(zoom_forward(60.0, 10.0, 7.0), 0.0);
        let z = zoom_forward(5.0, 10.0, 7.0);
        assert!(z > 6.9 && z < 7.1, "{z}");
    }
}
