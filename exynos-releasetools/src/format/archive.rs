// SPDX-FileCopyrightText: 2026 Andrew Gunnerson
// SPDX-License-Identifier: GPL-3.0-only

//! Random access to named entries in target-files and OTA zips.
//!
//! The packaging hooks only need a handful of operations, so they are written
//! against [`ArchiveReader`] and [`ArchiveWriter`] instead of concrete zip
//! types. [`MemoryArchive`] implements both and is used when no real zip is
//! involved.

use std::{
    collections::BTreeMap,
    io::{self, Read, Seek, Write},
};

use thiserror::Error;
use zip::{
    CompressionMethod, ZipArchive, ZipWriter,
    result::ZipError,
    write::SimpleFileOptions,
};

#[derive(Debug, Error)]
pub enum Error {
    #[error("Missing entry in archive: {0}")]
    MissingEntry(String),
    #[error("Duplicate entry in archive: {0}")]
    DuplicateEntry(String),
    #[error("Entry size mismatch for {name}: expected {expected}, read {actual}")]
    SizeMismatch {
        name: String,
        expected: u64,
        actual: u64,
    },
    #[error("Zip error")]
    Zip(#[from] ZipError),
    #[error("I/O error")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Read-only view of an input archive.
pub trait ArchiveReader {
    /// Check whether a file entry with the exact name exists.
    fn contains(&self, name: &str) -> bool;

    /// Read the full uncompressed contents of an entry.
    fn read(&mut self, name: &str) -> Result<Vec<u8>>;

    /// Get the uncompressed size of an entry without reading it.
    fn size(&mut self, name: &str) -> Result<u64>;

    /// List all entry names in archive order.
    fn names(&self) -> Vec<String>;
}

/// Append-only view of an output archive.
pub trait ArchiveWriter {
    fn write_entry(&mut self, name: &str, data: &[u8]) -> Result<()>;
}

fn map_not_found(name: &str, e: ZipError) -> Error {
    match e {
        ZipError::FileNotFound => Error::MissingEntry(name.to_owned()),
        e => e.into(),
    }
}

impl<R: Read + Seek> ArchiveReader for ZipArchive<R> {
    fn contains(&self, name: &str) -> bool {
        self.index_for_name(name).is_some()
    }

    fn read(&mut self, name: &str) -> Result<Vec<u8>> {
        let mut entry = self.by_name(name).map_err(|e| map_not_found(name, e))?;
        let expected = entry.size();

        let mut data = Vec::new();
        entry.read_to_end(&mut data)?;

        if data.len() as u64 != expected {
            return Err(Error::SizeMismatch {
                name: name.to_owned(),
                expected,
                actual: data.len() as u64,
            });
        }

        Ok(data)
    }

    fn size(&mut self, name: &str) -> Result<u64> {
        let entry = self.by_name(name).map_err(|e| map_not_found(name, e))?;

        Ok(entry.size())
    }

    fn names(&self) -> Vec<String> {
        self.file_names().map(|n| n.to_owned()).collect()
    }
}

impl<W: Write + Seek> ArchiveWriter for ZipWriter<W> {
    fn write_entry(&mut self, name: &str, data: &[u8]) -> Result<()> {
        // The zip64 flag must be decided before any data is written.
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .large_file(data.len() as u64 >= 0xffffffff);

        self.start_file(name, options)?;
        self.write_all(data)?;

        Ok(())
    }
}

/// An archive held entirely in memory. Entries keep insertion order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MemoryArchive {
    order: Vec<String>,
    entries: BTreeMap<String, Vec<u8>>,
}

impl MemoryArchive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insertion. Replaces an existing entry with the same name.
    pub fn with_entry(mut self, name: &str, data: impl Into<Vec<u8>>) -> Self {
        self.insert(name, data);
        self
    }

    pub fn insert(&mut self, name: &str, data: impl Into<Vec<u8>>) {
        if self.entries.insert(name.to_owned(), data.into()).is_none() {
            self.order.push(name.to_owned());
        }
    }

    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.entries.get(name).map(|d| d.as_slice())
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Copy every entry into a real zip.
    pub fn write_to(&self, writer: &mut impl ArchiveWriter) -> Result<()> {
        for name in &self.order {
            writer.write_entry(name, &self.entries[name])?;
        }

        Ok(())
    }
}

impl ArchiveReader for MemoryArchive {
    fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    fn read(&mut self, name: &str) -> Result<Vec<u8>> {
        self.entries
            .get(name)
            .cloned()
            .ok_or_else(|| Error::MissingEntry(name.to_owned()))
    }

    fn size(&mut self, name: &str) -> Result<u64> {
        self.entries
            .get(name)
            .map(|d| d.len() as u64)
            .ok_or_else(|| Error::MissingEntry(name.to_owned()))
    }

    fn names(&self) -> Vec<String> {
        self.order.clone()
    }
}

impl ArchiveWriter for MemoryArchive {
    fn write_entry(&mut self, name: &str, data: &[u8]) -> Result<()> {
        // Zip files permit duplicate names, but the installer only ever sees
        // one of them.
        if self.entries.contains_key(name) {
            return Err(Error::DuplicateEntry(name.to_owned()));
        }

        self.insert(name, data);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn memory_archive_order() {
        let mut archive = MemoryArchive::new()
            .with_entry("b", *b"2")
            .with_entry("a", *b"1");
        archive.insert("b", *b"22");

        assert_eq!(archive.names(), ["b", "a"]);
        assert_eq!(archive.get("b"), Some(&b"22"[..]));
        assert_eq!(archive.size("a").unwrap(), 1);
        assert_matches!(archive.read("c"), Err(Error::MissingEntry(n)) if n == "c");
    }

    #[test]
    fn memory_archive_rejects_duplicate_writes() {
        let mut archive = MemoryArchive::new();
        archive.write_entry("dtbo.img", b"x").unwrap();

        assert_matches!(
            archive.write_entry("dtbo.img", b"y"),
            Err(Error::DuplicateEntry(n)) if n == "dtbo.img"
        );
    }

    #[test]
    fn zip_reader_and_writer() {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        writer.write_entry("IMAGES/dtbo.img", b"dtbo").unwrap();
        writer.write_entry("RADIO/models", b"SM-G970F\n").unwrap();
        let data = writer.finish().unwrap().into_inner();

        let mut reader = ZipArchive::new(Cursor::new(data)).unwrap();

        assert!(reader.contains("IMAGES/dtbo.img"));
        assert!(!reader.contains("IMAGES/vbmeta.img"));
        assert_eq!(reader.names(), ["IMAGES/dtbo.img", "RADIO/models"]);
        assert_eq!(reader.size("RADIO/models").unwrap(), 9);
        assert_eq!(reader.read("IMAGES/dtbo.img").unwrap(), b"dtbo");
        assert_matches!(
            reader.read("IMAGES/vbmeta.img"),
            Err(Error::MissingEntry(n)) if n == "IMAGES/vbmeta.img"
        );
    }
}
