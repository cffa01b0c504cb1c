// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Float32 math for matrix composition: column-major `Mat4`, `Vec3`, `Quat`,
//! and the scalar helpers the classifiers rely on.
//!
//! Matrices act on column vectors (`M * v`), so in a product `A * B` the
//! transform `B` is applied first.

use std::f32::consts::TAU;

mod mat4;
mod quat;
mod vec3;

pub use mat4::Mat4;
pub use quat::Quat;
pub use vec3::Vec3;

/// Global epsilon used by math routines when detecting degenerate values.
pub const EPSILON: f32 = 1e-6;

/// Clamps `value` to `[min, max]`. Callers guarantee `min <= max`.
pub fn clamp(value: f32, min: f32, max: f32) -> f32 {
    value.max(min).min(max)
}

/// Converts degrees to radians with float32 precision.
pub fn deg_to_rad(value: f32) -> f32 {
    value * (TAU / 360.0)
}

/// Converts radians to degrees with float32 precision.
pub fn rad_to_deg(value: f32) -> f32 {
    value * (360.0 / TAU)
}

/// Quantizes to hundredths: `round(x * 100)`.
///
/// Emulated fixed-point coefficients carry binary noise, so every equality or
/// threshold test in the classifiers goes through this first. Non-finite
/// input quantizes to 0.
pub fn round100(value: f32) -> i32 {
    let scaled = (f64::from(value) * 100.0).round();
    if scaled.is_finite() {
        scaled.clamp(f64::from(i32::MIN), f64::from(i32::MAX)) as i32
    } else {
        0
    }
}

/// `num / den`, or 0 when `den` is exactly zero.
pub fn safe_div(num: f32, den: f32) -> f32 {
    if den == 0.0 {
        0.0
    } else {
        num / den
    }
}
