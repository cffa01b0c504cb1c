// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Raw projection registers as the legacy pipeline supplies them, plus the
//! derived field-of-view / box-edge values and their quantized signatures.

use crate::math::{deg_to_rad, rad_to_deg, round100, safe_div, Mat4};

/// Which of the two register encodings a projection uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ProjectionKind {
    /// Perspective frustum (world geometry or 3-D HUD elements).
    Perspective,
    /// Orthographic box (2-D overlays, text, screen effects).
    Orthographic,
}

/// The six projection coefficients for one draw-call batch.
///
/// Perspective rows are `[p0 0 p1 0; 0 p2 p3 0; 0 0 p4 p5; 0 0 -1 0]`;
/// orthographic rows are `[p0 0 0 p1; 0 p2 0 p3; 0 0 p4 p5; 0 0 0 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RawProjectionState {
    /// Register encoding.
    pub kind: ProjectionKind,
    /// `p0..p5` in register order.
    pub coeffs: [f32; 6],
}

/// Field of view (degrees) and depth window (game units) of a perspective projection.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FovParams {
    /// Horizontal field of view in degrees.
    pub hfov: f32,
    /// Vertical field of view in degrees.
    pub vfov: f32,
    /// Near plane distance.
    pub near: f32,
    /// Far plane distance.
    pub far: f32,
}

/// Box edges of an orthographic projection in its own 2-D units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrthoEdges {
    /// Left edge.
    pub left: f32,
    /// Right edge.
    pub right: f32,
    /// Top edge.
    pub top: f32,
    /// Bottom edge.
    pub bottom: f32,
    /// Near depth.
    pub near: f32,
    /// Far depth.
    pub far: f32,
}

/// Round100-quantized perspective values used by the title matchers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PerspectiveSignature {
    /// `round100(hfov)`.
    pub hfov: i32,
    /// `round100(vfov)`.
    pub vfov: i32,
    /// `round100(near)`.
    pub near: i32,
    /// `round100(far)`.
    pub far: i32,
}

/// Round100-quantized orthographic edges used by the title matchers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OrthoSignature {
    /// `round100(left)`.
    pub left: i32,
    /// `round100(right)`.
    pub right: i32,
    /// `round100(top)`.
    pub top: i32,
    /// `round100(bottom)`.
    pub bottom: i32,
    /// `round100(near)`.
    pub near: i32,
    /// `round100(far)`.
    pub far: i32,
}

impl RawProjectionState {
    /// Wraps perspective coefficients.
    pub const fn perspective(coeffs: [f32; 6]) -> Self {
        Self {
            kind: ProjectionKind::Perspective,
            coeffs,
        }
    }

    /// Wraps orthographic coefficients.
    pub const fn orthographic(coeffs: [f32; 6]) -> Self {
        Self {
            kind: ProjectionKind::Orthographic,
            coeffs,
        }
    }

    /// Encodes a symmetric perspective frustum the way the legacy pipeline would.
    pub fn from_fov(hfov: f32, vfov: f32, near: f32, far: f32) -> Self {
        let depth = far - near;
        Self::perspective([
            safe_div(1.0, (deg_to_rad(hfov) * 0.5).tan()),
            0.0,
            safe_div(1.0, (deg_to_rad(vfov) * 0.5).tan()),
            0.0,
            safe_div(-near, depth),
            safe_div(-(far * near), depth),
        ])
    }

    /// Encodes an orthographic box the way the legacy pipeline would.
    pub fn from_edges(edges: OrthoEdges) -> Self {
        let OrthoEdges {
            left,
            right,
            top,
            bottom,
            near,
            far,
        } = edges;
        let width = right - left;
        let height = top - bottom;
        let depth = far - near;
        Self::orthographic([
            safe_div(2.0, width),
            safe_div(-(right + left), width),
            safe_div(2.0, height),
            safe_div(-(top + bottom), height),
            safe_div(-1.0, depth),
            safe_div(-far, depth),
        ])
    }

    /// True for perspective registers.
    pub fn is_perspective(&self) -> bool {
        self.kind == ProjectionKind::Perspective
    }

    /// Expands the registers into the matrix the legacy pipeline would upload.
    pub fn to_mat4(&self) -> Mat4 {
        let [p0, p1, p2, p3, p4, p5] = self.coeffs;
        match self.kind {
            ProjectionKind::Perspective => Mat4::from_rows([
                [p0, 0.0, p1, 0.0],
                [0.0, p2, p3, 0.0],
                [0.0, 0.0, p4, p5],
                [0.0, 0.0, -1.0, 0.0],
            ]),
            ProjectionKind::Orthographic => Mat4::from_rows([
                [p0, 0.0, 0.0, p1],
                [0.0, p2, 0.0, p3],
                [0.0, 0.0, p4, p5],
                [0.0, 0.0, 0.0, 1.0],
            ]),
        }
    }

    /// Horizontal scale register is negative (camera mirrored left/right).
    pub fn is_mirrored_x(&self) -> bool {
        self.coeffs[0] < 0.0
    }

    /// Vertical scale register is negative (camera mirrored up/down).
    pub fn is_mirrored_y(&self) -> bool {
        self.coeffs[2] < 0.0
    }

    /// Field of view and depth window, read as a perspective projection.
    pub fn fov(&self) -> FovParams {
        let [p0, _, p2, _, p4, p5] = self.coeffs;
        FovParams {
            hfov: half_angle_degrees(p0),
            vfov: half_angle_degrees(p2),
            near: safe_div(p5, p4 - 1.0),
            far: safe_div(p5, p4),
        }
    }

    /// Box edges, read as an orthographic projection.
    pub fn ortho_edges(&self) -> OrthoEdges {
        let [p0, p1, p2, p3, p4, p5] = self.coeffs;
        let far = safe_div(p5, p4);
        OrthoEdges {
            left: safe_div(-1.0 - p1, p0),
            right: safe_div(1.0 - p1, p0),
            top: safe_div(1.0 - p3, p2),
            bottom: safe_div(-1.0 - p3, p2),
            near: far + safe_div(1.0, p4),
            far,
        }
    }

    /// Quantized perspective signature.
    pub fn perspective_signature(&self) -> PerspectiveSignature {
        let fov = self.fov();
        PerspectiveSignature {
            hfov: round100(fov.hfov),
            vfov: round100(fov.vfov),
            near: round100(fov.near),
            far: round100(fov.far),
        }
    }

    /// Quantized orthographic signature.
    pub fn ortho_signature(&self) -> OrthoSignature {
        let e = self.ortho_edges();
        OrthoSignature {
            left: round100(e.left),
            right: round100(e.right),
            top: round100(e.top),
            bottom: round100(e.bottom),
            near: round100(e.near),
            far: round100(e.far),
        }
    }

    /// Bit patterns used by scene-change detection.
    pub(crate) fn bits(&self) -> [u32; 7] {
        let tag = match self.kind {
            ProjectionKind::Perspective => 0,
            ProjectionKind::Orthographic => 1,
        };
        let c = self.coeffs;
        [
            tag,
            c[0].to_bits(),
            c[1].to_bits(),
            c[2].to_bits(),
            c[3].to_bits(),
            c[4].to_bits(),
            c[5].to_bits(),
        ]
    }
}

/// `2 * atan(1 / |scale|)` in degrees; 0 for a zero register.
fn half_angle_degrees(scale: f32) -> f32 {
    if scale == 0.0 {
        return 0.0;
    }
    rad_to_deg(2.0 * (1.0 / scale.abs()).atan())
}

impl FovParams {
    /// Values are usable as a frustum: positive angles and a forward depth window.
    pub fn is_valid(&self) -> bool {
        self.hfov > 0.0
            && self.vfov > 0.0
            && self.hfov < 180.0
            && self.vfov < 180.0
            && self.near > 0.0
            && self.far > self.near
    }
}

impl PerspectiveSignature {
    /// Builds a signature directly from hundredths.
    pub const fn new(hfov: i32, vfov: i32, near: i32, far: i32) -> Self {
        Self {
            hfov,
            vfov,
            near,
            far,
        }
    }

    /// Dequantized values (hundredths back to units).
    pub fn to_params(self) -> FovParams {
        FovParams {
            hfov: self.hfov as f32 / 100.0,
            vfov: self.vfov as f32 / 100.0,
            near: self.near as f32 / 100.0,
            far: self.far as f32 / 100.0,
        }
    }
}

impl OrthoSignature {
    /// Builds a signature from hundredths, depth window ignored (set to 0).
    pub const fn edges(left: i32, right: i32, top: i32, bottom: i32) -> Self {
        Self {
            left,
            right,
            top,
            bottom,
            near: 0,
            far: 0,
        }
    }

    /// Same left/right/top/bottom, ignoring depth.
    pub fn same_box(&self, other: &Self) -> bool {
        self.left == other.left
            && self.right == other.right
            && self.top == other.top
            && self.bottom == other.bottom
    }

    /// Zero width or zero height after quantization.
    pub fn is_degenerate(&self) -> bool {
        self.left == self.right || self.top == self.bottom
    }
}
