// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! CLI entry point for Parallax.

use anyhow::Result;
use parallax_cli::cli::entrypoint;

fn main() -> Result<()> {
    entrypoint()
}
