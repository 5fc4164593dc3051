// SPDX-FileCopyrightText: 2026 Andrew Gunnerson
// SPDX-License-Identifier: GPL-3.0-only

//! Device-specific OTA packaging hooks for Exynos 9820/9825 devices.
//!
//! The OTA generator calls into this module at fixed points while it assembles
//! the updater-script. Each hook copies images and firmware blobs from the
//! target-files zip into the OTA zip and appends the statements that make
//! recovery flash them.

pub mod models;

use thiserror::Error;
use tracing::{debug, info};

use crate::{
    format::{
        archive::{self, ArchiveReader, ArchiveWriter},
        bota::{self, BotaCursor},
        buildprop::{BuildInfo, Layout},
        edify::{EdifyScript, Expr, Statement},
    },
    util::NumBytes,
};

pub use models::{ModelFirmware, read_models};

pub const PROP_MODEL: &str = "ro.boot.em.model";
pub const PROP_BOOTLOADER: &str = "ro.boot.bootloader";

const MSG_UNSUPPORTED_MODEL: &str = "Unsupported model, not updating firmware!";

#[derive(Debug, Error)]
pub enum Error {
    #[error("Entry is not valid UTF-8: {0}")]
    NotUtf8(String),
    #[error("Firmware version file is empty for model: {0}")]
    EmptyVersion(String),
    #[error("Model ID is not a valid path component: {0:?}")]
    InvalidModel(String),
    #[error("Archive error")]
    Archive(#[from] archive::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// How a firmware blob reaches its partition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriteMode {
    /// Extract the blob directly over the partition.
    Simple,
    /// Write the blob at `offset` with `write_data_bt`. Unless the target is
    /// the single bota partition, the write is bracketed by its own header
    /// invalidation and finalization.
    HeaderTracked { offset: u64 },
}

/// A firmware blob and the partition it is flashed to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FirmwareBlob {
    pub name: &'static str,
    pub dest: &'static str,
    pub mode: WriteMode,
}

const fn tracked(name: &'static str, dest: &'static str) -> FirmwareBlob {
    FirmwareBlob {
        name,
        dest,
        mode: WriteMode::HeaderTracked {
            offset: bota::FIRST_OFFSET,
        },
    }
}

const fn simple(name: &'static str, dest: &'static str) -> FirmwareBlob {
    FirmwareBlob {
        name,
        dest,
        mode: WriteMode::Simple,
    }
}

/// Bootloader blobs on devices with separate `bota0`..`bota2` partitions.
pub const LEGACY_BOOTLOADER_BLOBS: [FirmwareBlob; 5] = [
    tracked("sboot.bin", "/dev/block/by-name/bota0"),
    tracked("cm.bin", "/dev/block/by-name/bota1"),
    tracked("up_param.bin", "/dev/block/by-name/bota2"),
    simple("keystorage.bin", "/dev/block/by-name/keystorage"),
    simple("uh.bin", "/dev/block/by-name/uh"),
];

/// Bootloader blobs written back to back into the single `bota` partition,
/// in on-disk order.
pub const SINGLE_BOTA_BLOBS: [&str; 5] = [
    "cm.bin",
    "keystorage.bin",
    "sboot.bin",
    "uh.bin",
    "up_param.bin",
];

/// Modem and auxiliary blobs flashed on every layout.
pub const COMMON_BLOBS: [FirmwareBlob; 6] = [
    simple("modem.bin", "/dev/block/by-name/radio"),
    simple("modem_5g.bin", "/dev/block/by-name/radio2"),
    simple("modem_debug.bin", "/dev/block/by-name/cp_debug"),
    simple("modem_debug_5g.bin", "/dev/block/by-name/cp2_debug"),
    simple("dqmdbg.img", "/dev/block/by-name/dqmdbg"),
    simple("param.bin", "/dev/block/by-name/param"),
];

pub fn image_path(basename: &str) -> String {
    format!("IMAGES/{basename}")
}

pub fn radio_path(basename: &str, model: &str) -> String {
    format!("RADIO/{basename}_{model}")
}

pub fn firmware_path(model: &str, basename: &str) -> String {
    format!("firmware/{model}/{basename}")
}

/// Handles passed to every hook. `input_zip` is the target-files zip the
/// images are read from.
pub struct OtaInfo<'a, R: ArchiveReader, W: ArchiveWriter> {
    pub input_zip: &'a mut R,
    pub output_zip: &'a mut W,
    pub script: &'a mut EdifyScript,
    pub build_info: &'a BuildInfo,
}

/// Handles for incremental OTAs. Only the target (post-update) files are
/// needed because firmware is always flashed in full.
pub struct IncrementalOtaInfo<'a, T: ArchiveReader, W: ArchiveWriter> {
    pub target_zip: &'a mut T,
    pub output_zip: &'a mut W,
    pub script: &'a mut EdifyScript,
    pub build_info: &'a BuildInfo,
}

/// Copy `IMAGES/<basename>` into the OTA and flash it to `dest`. The image is
/// required. A missing entry fails the whole packaging run.
pub fn add_image<R: ArchiveReader, W: ArchiveWriter>(
    info: &mut OtaInfo<R, W>,
    basename: &str,
    dest: &str,
    print_info: bool,
) -> Result<()> {
    let data = info.input_zip.read(&image_path(basename))?;
    info!("Adding image {basename} ({:?}) for {dest}", NumBytes(data.len()));

    info.output_zip.write_entry(basename, &data)?;

    if print_info {
        let partition = dest.rsplit('/').next().unwrap_or(dest);
        info.script.print(format!("Patching {partition} image unconditionally..."));
    }

    info.script.package_extract_file(basename, dest);

    Ok(())
}

/// Copy the `model`-specific firmware blob into the OTA and append the
/// statements that flash it to `script`.
///
/// Blobs that don't exist for the model are skipped. Returns the size of the
/// blob for [`WriteMode::HeaderTracked`] writes, or 0 if the blob was skipped
/// or written with [`WriteMode::Simple`].
pub fn add_firmware_image(
    input_zip: &mut impl ArchiveReader,
    output_zip: &mut impl ArchiveWriter,
    script: &mut EdifyScript,
    model: &str,
    blob: &FirmwareBlob,
) -> Result<u64> {
    let input_path = radio_path(blob.name, model);
    if !input_zip.contains(&input_path) {
        debug!("Firmware blob not present for {model}: {}", blob.name);
        return Ok(0);
    }

    let data = input_zip.read(&input_path)?;
    let output_path = firmware_path(model, blob.name);
    info!(
        "Adding firmware {output_path} ({:?}) for {}",
        NumBytes(data.len()),
        blob.dest,
    );

    output_zip.write_entry(&output_path, &data)?;

    let stem = blob.name.split('.').next().unwrap_or(blob.name);
    script.print(format!("Patching {stem} image unconditionally..."));

    match blob.mode {
        WriteMode::Simple => {
            script.package_extract_file(&output_path, blob.dest);
            Ok(0)
        }
        WriteMode::HeaderTracked { offset } => {
            let single_bota = blob.dest == bota::SINGLE_BOTA;
            let size = input_zip.size(&input_path)?;

            if !single_bota {
                script.push(Statement::Assert(bota::mark_header(blob.dest, 0, 0)));
            }

            script.push(Statement::Assert(bota::write_data(
                &output_path,
                blob.dest,
                offset,
                size,
            )));

            if !single_bota {
                script.push(Statement::Assert(bota::mark_header(
                    blob.dest,
                    0,
                    bota::HEADER_MAGIC,
                )));
            }

            Ok(size)
        }
    }
}

/// Write every present bootloader blob consecutively into the single bota
/// partition. The whole sequence is bracketed by one header invalidation and
/// one finalization carrying the number of blobs written.
fn add_single_bota_images(
    input_zip: &mut impl ArchiveReader,
    output_zip: &mut impl ArchiveWriter,
    script: &mut EdifyScript,
    model: &str,
) -> Result<()> {
    let mut cursor = BotaCursor::new();

    script.push(Statement::Assert(bota::mark_header(bota::SINGLE_BOTA, 0, 0)));

    for name in SINGLE_BOTA_BLOBS {
        let blob = FirmwareBlob {
            name,
            dest: bota::SINGLE_BOTA,
            mode: WriteMode::HeaderTracked {
                offset: cursor.offset(),
            },
        };

        let size = add_firmware_image(input_zip, output_zip, script, model, &blob)?;
        cursor.advance(size);
    }

    script.push(Statement::Assert(bota::mark_header(
        bota::SINGLE_BOTA,
        cursor.count(),
        bota::HEADER_MAGIC,
    )));

    Ok(())
}

/// Build the body of the per-model firmware update block.
fn firmware_update_body(
    input_zip: &mut impl ArchiveReader,
    output_zip: &mut impl ArchiveWriter,
    layout: Layout,
    firmware: &ModelFirmware,
) -> Result<EdifyScript> {
    let ModelFirmware { model, version } = firmware;
    let mut body = EdifyScript::new();

    match layout {
        Layout::Legacy => {
            body.print(format!("Updating firmware to {version} for {model}"));

            for blob in &LEGACY_BOOTLOADER_BLOBS {
                add_firmware_image(input_zip, output_zip, &mut body, model, blob)?;
            }
        }
        Layout::SingleBota => {
            add_single_bota_images(input_zip, output_zip, &mut body, model)?;
        }
    }

    for blob in &COMMON_BLOBS {
        add_firmware_image(input_zip, output_zip, &mut body, model, blob)?;
    }

    Ok(body)
}

/// Conditions under which a model's firmware is flashed: the device is that
/// model, the new bootloader is not a downgrade, and it is not already
/// installed.
fn firmware_update_conditions(firmware: &ModelFirmware) -> Vec<Expr> {
    vec![
        Expr::getprop(PROP_MODEL).is(firmware.model.as_str()),
        bota::verify_no_downgrade(&firmware.version).is("0"),
        Expr::getprop(PROP_BOOTLOADER).is_not(firmware.version.as_str()),
    ]
}

/// Shared implementation of the full and incremental install end hooks.
pub fn ota_install_end<R: ArchiveReader, W: ArchiveWriter>(
    info: &mut OtaInfo<R, W>,
) -> Result<()> {
    if info.input_zip.contains(&image_path("dtb.img")) {
        add_image(info, "dtb.img", "/dev/block/by-name/dtb", true)?;
    }
    add_image(info, "dtbo.img", "/dev/block/by-name/dtbo", true)?;
    add_image(info, "vbmeta.img", "/dev/block/by-name/vbmeta", true)?;

    let Some(models) = read_models(info.input_zip)? else {
        debug!("No {} in input; skipping firmware", models::PATH_MODELS);
        return Ok(());
    };

    let layout = info.build_info.layout();
    debug!("Bootloader layout: {layout:?}");

    for firmware in &models {
        info!(
            "Packaging firmware {} for {}",
            firmware.version, firmware.model,
        );

        info.script.comment(format!(
            "Firmware update to {} for {}",
            firmware.version, firmware.model,
        ));

        let body = firmware_update_body(info.input_zip, info.output_zip, layout, firmware)?;

        info.script.push(Statement::IfElse {
            conditions: firmware_update_conditions(firmware),
            body: body.into_statements(),
        });
    }

    if !models.is_empty() {
        info.script.push(Statement::AbortUnless {
            conditions: models
                .iter()
                .map(|f| Expr::getprop(PROP_MODEL).is(f.model.as_str()))
                .collect(),
            message: MSG_UNSUPPORTED_MODEL.to_owned(),
        });
    }

    Ok(())
}

/// Hook run before the main installation steps of a full OTA. Legacy-layout
/// devices get their dynamic partitions retrofitted from `super_empty.img`.
pub fn full_ota_install_begin<R: ArchiveReader, W: ArchiveWriter>(
    info: &mut OtaInfo<R, W>,
) -> Result<()> {
    if info.build_info.layout() != Layout::Legacy {
        return Ok(());
    }

    add_image(info, "super_empty.img", "/tmp/super_empty.img", false)?;
    info.script.push(Statement::Expr(bota::retrofit_dynamic_partitions()));

    Ok(())
}

/// Hook run after the main installation steps of a full OTA.
pub fn full_ota_install_end<R: ArchiveReader, W: ArchiveWriter>(
    info: &mut OtaInfo<R, W>,
) -> Result<()> {
    ota_install_end(info)
}

/// Hook run after the main installation steps of an incremental OTA. Images
/// and firmware come from the target files since incremental payloads don't
/// carry them.
pub fn incremental_ota_install_end<T: ArchiveReader, W: ArchiveWriter>(
    info: &mut IncrementalOtaInfo<T, W>,
) -> Result<()> {
    let mut full_info = OtaInfo {
        input_zip: &mut *info.target_zip,
        output_zip: &mut *info.output_zip,
        script: &mut *info.script,
        build_info: info.build_info,
    };

    ota_install_end(&mut full_info)
}

