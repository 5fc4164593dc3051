/*
 * SPDX-FileCopyrightText: 2026 Andrew Gunnerson
 * SPDX-License-Identifier: GPL-3.0-only
 */

pub mod archive;
pub mod bota;
pub mod buildprop;
pub mod edify;
