// SPDX-FileCopyrightText: 2026 Andrew Gunnerson
// SPDX-License-Identifier: GPL-3.0-only

use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;

use crate::{
    cli::hook,
    format::{archive::ArchiveReader, buildprop::Layout},
    releasetools::{self, ModelFirmware},
};

#[derive(Clone, Debug, Serialize)]
struct FirmwareInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    platform: Option<String>,
    single_bota: bool,
    has_dtb: bool,
    models: Vec<ModelFirmware>,
}

pub fn info_main(cli: &InfoCli) -> Result<()> {
    let mut input_zip = hook::open_input(&cli.input)?;
    let build_info = hook::load_build_info(&mut input_zip, cli.platform.as_deref())?;

    let models = releasetools::read_models(&mut input_zip)
        .with_context(|| format!("Failed to read models: {:?}", cli.input))?
        .unwrap_or_default();

    let info = FirmwareInfo {
        platform: build_info.platform().map(|p| p.to_owned()),
        single_bota: build_info.layout() == Layout::SingleBota,
        has_dtb: input_zip.contains(&releasetools::image_path("dtb.img")),
        models,
    };

    if !cli.quiet {
        println!("{info:#?}");
    }

    if let Some(path) = &cli.output_info {
        let data = toml_edit::ser::to_string_pretty(&info)
            .with_context(|| format!("Failed to serialize firmware info TOML: {path:?}"))?;
        fs::write(path, data)
            .with_context(|| format!("Failed to write firmware info TOML: {path:?}"))?;
    }

    Ok(())
}

/// Display the firmware that would be packaged from a target files zip.
///
/// Only models that have a firmware version file are listed.
#[derive(Debug, Parser)]
pub struct InfoCli {
    /// Path to input target files zip.
    #[arg(short, long, value_name = "FILE", value_parser)]
    pub input: PathBuf,

    /// Path to output info TOML.
    #[arg(long, value_name = "FILE", value_parser)]
    pub output_info: Option<PathBuf>,

    /// Override ro.board.platform from the vendor build.prop.
    #[arg(long, value_name = "NAME")]
    pub platform: Option<String>,

    /// Don't print firmware information.
    #[arg(short, long)]
    pub quiet: bool,
}
