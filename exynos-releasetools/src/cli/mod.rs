/*
 * SPDX-FileCopyrightText: 2026 Andrew Gunnerson
 * SPDX-License-Identifier: GPL-3.0-only
 */

pub mod args;
pub mod completion;
pub mod hook;
pub mod info;

macro_rules! status {
    ($($arg:tt)*) => {
        eprintln!("\x1b[1m[*] {}\x1b[0m", format!($($arg)*))
    }
}

pub(crate) use status;
