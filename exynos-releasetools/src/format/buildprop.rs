// SPDX-FileCopyrightText: 2026 Andrew Gunnerson
// SPDX-License-Identifier: GPL-3.0-only

use std::collections::BTreeMap;

use bstr::ByteSlice;
use thiserror::Error;

use crate::format::archive::{self, ArchiveReader};

/// Locations of the vendor build.prop inside a target-files zip, in order of
/// preference.
pub const VENDOR_BUILD_PROP_PATHS: [&str; 2] = ["VENDOR/etc/build.prop", "VENDOR/build.prop"];

pub const PROP_BOARD_PLATFORM: &str = "ro.board.platform";

/// Platform whose bootloader blobs all live in a single `bota` partition.
pub const PLATFORM_SINGLE_BOTA: &str = "universal9825_r";

#[derive(Debug, Error)]
pub enum Error {
    #[error("build.prop is not valid UTF-8: {0}")]
    NotUtf8(String),
    #[error("Archive error")]
    Archive(#[from] archive::Error),
}

type Result<T> = std::result::Result<T, Error>;

/// Parsed `key=value` properties.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BuildProps {
    props: BTreeMap<String, String>,
}

impl BuildProps {
    /// Parse build.prop contents. Comments, blank lines, and `import`
    /// directives are ignored. Later definitions override earlier ones.
    pub fn parse(data: &str) -> Self {
        let mut props = BTreeMap::new();

        for line in data.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with("import ") {
                continue;
            }

            if let Some((key, value)) = line.split_once('=') {
                props.insert(key.trim().to_owned(), value.trim().to_owned());
            }
        }

        Self { props }
    }

    /// Load the vendor properties from a target-files zip. If no vendor
    /// build.prop exists, the result is empty.
    pub fn from_archive(archive: &mut impl ArchiveReader) -> Result<Self> {
        for path in VENDOR_BUILD_PROP_PATHS {
            if !archive.contains(path) {
                continue;
            }

            let data = archive.read(path)?;
            let data = data
                .to_str()
                .map_err(|_| Error::NotUtf8(path.to_owned()))?;

            return Ok(Self::parse(data));
        }

        Ok(Self::default())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.props.get(key).map(|v| v.as_str())
    }

    pub fn set(&mut self, key: &str, value: &str) {
        self.props.insert(key.to_owned(), value.to_owned());
    }
}

/// Bootloader partition layout of a build.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Layout {
    /// Separate `bota0`, `bota1`, and `bota2` partitions. Devices with this
    /// layout need their dynamic partitions retrofitted.
    Legacy,
    /// All bootloader blobs concatenated in one `bota` partition.
    SingleBota,
}

impl Layout {
    pub fn from_platform(platform: Option<&str>) -> Self {
        match platform {
            Some(PLATFORM_SINGLE_BOTA) => Self::SingleBota,
            _ => Self::Legacy,
        }
    }
}

/// Build configuration needed by the packaging hooks.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BuildInfo {
    pub vendor: BuildProps,
}

impl BuildInfo {
    pub fn new(vendor: BuildProps) -> Self {
        Self { vendor }
    }

    pub fn platform(&self) -> Option<&str> {
        self.vendor.get(PROP_BOARD_PLATFORM)
    }

    pub fn layout(&self) -> Layout {
        Layout::from_platform(self.platform())
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::format::archive::MemoryArchive;

    #[test]
    fn parse_props() {
        let props = BuildProps::parse(
            "# begin build properties\n\
             \n\
             import /vendor/default.prop\n\
             ro.board.platform=exynos9820\r\n\
             ro.vendor.build.fingerprint = samsung/beyond1lte \n\
             ro.board.platform=universal9825_r\n\
             garbage line\n",
        );

        assert_eq!(props.get(PROP_BOARD_PLATFORM), Some("universal9825_r"));
        assert_eq!(
            props.get("ro.vendor.build.fingerprint"),
            Some("samsung/beyond1lte"),
        );
        assert_eq!(props.get("garbage line"), None);
        assert_eq!(props.get("import /vendor/default.prop"), None);
    }

    #[test]
    fn layout_from_platform() {
        assert_eq!(Layout::from_platform(None), Layout::Legacy);
        assert_eq!(Layout::from_platform(Some("exynos9820")), Layout::Legacy);
        assert_eq!(
            Layout::from_platform(Some("universal9825_r")),
            Layout::SingleBota,
        );
    }

    #[test]
    fn load_from_archive() {
        let mut archive = MemoryArchive::new()
            .with_entry("VENDOR/build.prop", "ro.board.platform=exynos9820\n")
            .with_entry("VENDOR/etc/build.prop", "ro.board.platform=universal9825_r\n");
        let info = BuildInfo::new(BuildProps::from_archive(&mut archive).unwrap());
        assert_eq!(info.layout(), Layout::SingleBota);

        let mut archive = MemoryArchive::new();
        let info = BuildInfo::new(BuildProps::from_archive(&mut archive).unwrap());
        assert_eq!(info.platform(), None);
        assert_eq!(info.layout(), Layout::Legacy);

        let mut archive = MemoryArchive::new().with_entry("VENDOR/build.prop", *b"\xff=\xff");
        assert_matches!(
            BuildProps::from_archive(&mut archive),
            Err(Error::NotUtf8(p)) if p == "VENDOR/build.prop"
        );
    }
}
