// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Error types surfaced by the HMD port and session construction.
//!
//! Classification misses, scene-log overflow and degenerate geometry are not
//! errors: they resolve to `Unknown*` layers, silent truncation and zero
//! scale factors respectively.

use parallax_config::ConfigError;
use thiserror::Error;

/// Failure reported by an [`HmdRuntime`](crate::HmdRuntime).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    /// The runtime was present but stopped delivering poses.
    #[error("hmd runtime unavailable: {0}")]
    Unavailable(String),
    /// No runtime has been initialised.
    #[error("hmd runtime not initialised")]
    NotInitialized,
}

/// Errors raised while building or reconfiguring a [`StereoSession`](crate::StereoSession).
#[derive(Debug, Error)]
pub enum SessionError {
    /// A title profile name that is not in the registry.
    #[error("unknown title profile: {0}")]
    UnknownTitle(String),
    /// Preferences failed to load or validate.
    #[error(transparent)]
    Config(#[from] ConfigError),
}
