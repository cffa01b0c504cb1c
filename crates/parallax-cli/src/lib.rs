// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Command-line front end for Parallax.
//!
//! `parallax replay` feeds a recorded draw-call trace through a
//! [`parallax_core::StereoSession`] and prints how each batch was classified
//! and composited. `parallax titles` lists the built-in title profiles and
//! `parallax prefs` inspects or resets the stored VR preferences.
#![forbid(unsafe_code)]

pub mod cli;
pub mod trace;
