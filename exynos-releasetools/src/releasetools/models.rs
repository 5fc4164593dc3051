// SPDX-FileCopyrightText: 2026 Andrew Gunnerson
// SPDX-License-Identifier: GPL-3.0-only

use bstr::ByteVec;
use serde::Serialize;
use tracing::{debug, warn};

use crate::{
    format::archive::ArchiveReader,
    releasetools::{Error, Result},
};

pub const PATH_MODELS: &str = "RADIO/models";

pub fn version_path(model: &str) -> String {
    format!("RADIO/version_{model}")
}

/// A model that has firmware packaged for it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ModelFirmware {
    pub model: String,
    pub version: String,
}

/// Model IDs become output zip directories, so they must be a single path
/// component.
fn validate_model(model: &str) -> Result<()> {
    if model == "." || model == ".." || model.contains(['/', '\\']) {
        return Err(Error::InvalidModel(model.to_owned()));
    }

    Ok(())
}

fn read_utf8(zip: &mut impl ArchiveReader, path: &str) -> Result<String> {
    let data = zip.read(path)?;

    data.into_string().map_err(|_| Error::NotUtf8(path.to_owned()))
}

/// Read the firmware version for a model. Only the first line is used.
fn read_version(zip: &mut impl ArchiveReader, model: &str) -> Result<String> {
    let path = version_path(model);
    let data = read_utf8(zip, &path)?;

    match data.lines().next() {
        Some(line) if !line.is_empty() => Ok(line.to_owned()),
        _ => Err(Error::EmptyVersion(model.to_owned())),
    }
}

/// List the models that have both an entry in `RADIO/models` and a
/// `RADIO/version_<model>` file, in the order they appear in `RADIO/models`.
/// Repeated model IDs keep their first position. Returns [`None`] if the
/// archive has no models list at all.
pub fn read_models(zip: &mut impl ArchiveReader) -> Result<Option<Vec<ModelFirmware>>> {
    if !zip.contains(PATH_MODELS) {
        return Ok(None);
    }

    let data = read_utf8(zip, PATH_MODELS)?;
    let mut result = vec![];

    for model in data.lines().map(str::trim).filter(|m| !m.is_empty()) {
        if result.iter().any(|f: &ModelFirmware| f.model == model) {
            debug!("Skipping repeated model: {model}");
            continue;
        }

        if !zip.contains(&version_path(model)) {
            warn!("Skipping model without firmware version: {model}");
            continue;
        }

        validate_model(model)?;

        result.push(ModelFirmware {
            model: model.to_owned(),
            version: read_version(zip, model)?,
        });
    }

    Ok(Some(result))
}
