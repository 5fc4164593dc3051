// SPDX-FileCopyrightText: 2026 Andrew Gunnerson
// SPDX-License-Identifier: GPL-3.0-only

use std::{
    fs::File,
    io::{BufReader, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tempfile::NamedTempFile;
use tracing::info;
use zip::{ZipArchive, ZipWriter};

use crate::{
    cli::status,
    format::{
        buildprop::{BuildInfo, BuildProps, PROP_BOARD_PLATFORM},
        edify::EdifyScript,
    },
    releasetools::{self, IncrementalOtaInfo, OtaInfo},
    util,
};

/// Point in the OTA generation at which the device-specific steps run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Hook {
    FullInstallBegin,
    FullInstallEnd,
    IncrementalInstallEnd,
}

pub fn open_input(path: &Path) -> Result<ZipArchive<BufReader<File>>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open target files for reading: {path:?}"))?;
    let zip = ZipArchive::new(BufReader::new(file))
        .with_context(|| format!("Failed to read target files zip: {path:?}"))?;

    Ok(zip)
}

pub fn load_build_info(
    zip: &mut ZipArchive<BufReader<File>>,
    platform: Option<&str>,
) -> Result<BuildInfo> {
    let mut props =
        BuildProps::from_archive(zip).context("Failed to load vendor build properties")?;

    if let Some(p) = platform {
        props.set(PROP_BOARD_PLATFORM, p);
    }

    Ok(BuildInfo::new(props))
}

fn run_hook(
    hook: Hook,
    input_zip: &mut ZipArchive<BufReader<File>>,
    output_zip: &mut ZipWriter<NamedTempFile>,
    script: &mut EdifyScript,
    build_info: &BuildInfo,
) -> releasetools::Result<()> {
    match hook {
        Hook::FullInstallBegin => releasetools::full_ota_install_begin(&mut OtaInfo {
            input_zip,
            output_zip,
            script,
            build_info,
        }),
        Hook::FullInstallEnd => releasetools::full_ota_install_end(&mut OtaInfo {
            input_zip,
            output_zip,
            script,
            build_info,
        }),
        Hook::IncrementalInstallEnd => {
            releasetools::incremental_ota_install_end(&mut IncrementalOtaInfo {
                target_zip: input_zip,
                output_zip,
                script,
                build_info,
            })
        }
    }
}

fn write_script(path: &Path, script: &EdifyScript) -> Result<()> {
    let mut temp = NamedTempFile::new_in(util::parent_path(path))
        .with_context(|| format!("Failed to create temporary file for: {path:?}"))?;
    write!(temp, "{script}").with_context(|| format!("Failed to write script: {path:?}"))?;
    temp.persist(path)
        .with_context(|| format!("Failed to move script into place: {path:?}"))?;

    Ok(())
}

pub fn hook_main(cli: &HookCli) -> Result<()> {
    let mut input_zip = open_input(&cli.input)?;
    let build_info = load_build_info(&mut input_zip, cli.platform.as_deref())?;
    info!("Bootloader layout: {:?}", build_info.layout());

    let temp = NamedTempFile::new_in(util::parent_path(&cli.output))
        .with_context(|| format!("Failed to create temporary file for: {:?}", cli.output))?;
    let mut output_zip = ZipWriter::new(temp);
    let mut script = EdifyScript::new();

    run_hook(
        cli.hook,
        &mut input_zip,
        &mut output_zip,
        &mut script,
        &build_info,
    )
    .with_context(|| format!("Failed to run {:?} hook", cli.hook))?;

    let temp = output_zip
        .finish()
        .with_context(|| format!("Failed to finalize output zip: {:?}", cli.output))?;
    temp.persist(&cli.output)
        .with_context(|| format!("Failed to move output zip into place: {:?}", cli.output))?;

    match &cli.script {
        Some(path) => write_script(path, &script)?,
        None => print!("{script}"),
    }

    status!(
        "Wrote {} script statements and {:?}",
        script.statements().len(),
        cli.output,
    );

    Ok(())
}

/// Run a device-specific OTA packaging hook.
///
/// The images and firmware needed by the hook are copied from the target files
/// zip into a new zip, which is meant to be merged into the OTA package. The
/// updater-script fragment is printed to stdout unless --script is given.
#[derive(Debug, Parser)]
pub struct HookCli {
    /// Hook to run.
    #[arg(long, value_enum, value_name = "HOOK")]
    pub hook: Hook,

    /// Path to input target files zip.
    ///
    /// For incremental OTAs, this is the target (post-update) files zip.
    #[arg(short, long, value_name = "FILE", value_parser)]
    pub input: PathBuf,

    /// Path to output zip containing the copied images and firmware.
    #[arg(short, long, value_name = "FILE", value_parser)]
    pub output: PathBuf,

    /// Path to output updater-script fragment.
    #[arg(long, value_name = "FILE", value_parser)]
    pub script: Option<PathBuf>,

    /// Override ro.board.platform from the vendor build.prop.
    #[arg(long, value_name = "NAME")]
    pub platform: Option<String>,
}
