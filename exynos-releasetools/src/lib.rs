/*
 * SPDX-FileCopyrightText: 2026 Andrew Gunnerson
 * SPDX-License-Identifier: GPL-3.0-only
 */

//! The semver versioning covers the CLI only. The library exists so that the
//! packaging hooks can be driven directly by an OTA generator and by tests.
//!
//! The CLI source files use concrete types wherever possible for simplicity,
//! while the "library"-style source files aim to be generic over the archive
//! implementation.

pub mod cli;
pub mod format;
pub mod releasetools;
pub mod util;
