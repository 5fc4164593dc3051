// SPDX-FileCopyrightText: 2026 Andrew Gunnerson
// SPDX-License-Identifier: GPL-3.0-only

//! Constants and offset bookkeeping for the bootloader blob partitions
//! (`bota*`). The device-side `exynos9820.write_data_bt` and
//! `exynos9820.mark_header_bt` functions own the on-disk header format. The
//! packager only needs to know where each blob lands.

use crate::format::edify::Expr;

/// Single partition holding every bootloader blob on consolidated layouts.
pub const SINGLE_BOTA: &str = "/dev/block/by-name/bota";

/// Size of the header that precedes each blob.
pub const HEADER_SIZE: u64 = 36;

/// Offset of the first blob. The partition header occupies the bytes before.
pub const FIRST_OFFSET: u64 = 8;

/// Value passed to `mark_header_bt` to mark a header as valid.
pub const HEADER_MAGIC: u64 = 3142939818;

/// Namespace of the recovery-side functions for this platform.
pub const NAMESPACE: &str = "exynos9820";

fn function(name: &str) -> String {
    format!("{NAMESPACE}.{name}")
}

/// `exynos9820.mark_header_bt("<dest>", 0, <count>, <magic>)`. A zero magic
/// invalidates the header before blobs are rewritten.
pub fn mark_header(dest: &str, count: u64, magic: u64) -> Expr {
    Expr::call(
        function("mark_header_bt"),
        [Expr::str(dest), Expr::Int(0), Expr::Int(count), Expr::Int(magic)],
    )
}

/// `exynos9820.write_data_bt("<source>", "<dest>", <offset>, <size>)`
pub fn write_data(source: &str, dest: &str, offset: u64, size: u64) -> Expr {
    Expr::call(
        function("write_data_bt"),
        [
            Expr::str(source),
            Expr::str(dest),
            Expr::Int(offset),
            Expr::Int(size),
        ],
    )
}

/// `exynos9820.verify_no_downgrade("<version>")`
pub fn verify_no_downgrade(version: &str) -> Expr {
    Expr::call(function("verify_no_downgrade"), [Expr::str(version)])
}

/// `exynos9820.retrofit_dynamic_partitions()`
pub fn retrofit_dynamic_partitions() -> Expr {
    Expr::call(function("retrofit_dynamic_partitions"), [])
}

/// Tracks where the next blob goes when several blobs share one partition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BotaCursor {
    offset: u64,
    count: u64,
}

impl Default for BotaCursor {
    fn default() -> Self {
        Self::new()
    }
}

impl BotaCursor {
    pub fn new() -> Self {
        Self {
            offset: FIRST_OFFSET,
            count: 0,
        }
    }

    /// Offset at which the next blob will be written.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Number of blobs written so far.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Account for a blob of `size` bytes. A zero size means nothing was
    /// written and leaves the cursor untouched.
    pub fn advance(&mut self, size: u64) {
        if size > 0 {
            self.count += 1;
            self.offset += size + HEADER_SIZE;
        }
    }
}
