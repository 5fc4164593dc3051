/*
 * SPDX-FileCopyrightText: 2026 Andrew Gunnerson
 * SPDX-License-Identifier: GPL-3.0-only
 */

use std::{fs::File, io, path::PathBuf};

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use clap_complete::Shell;

use crate::cli::args::Cli;

pub fn completion_main(cli: &CompletionCli) -> Result<()> {
    let mut command = Cli::command();
    let name = env!("CARGO_PKG_NAME");

    match &cli.output {
        Some(path) => {
            let mut file = File::create(path)
                .with_context(|| format!("Failed to open for writing: {path:?}"))?;
            clap_complete::generate(cli.shell, &mut command, name, &mut file);
        }
        None => clap_complete::generate(cli.shell, &mut command, name, &mut io::stdout()),
    }

    Ok(())
}

/// Generate shell tab completion configs.
#[derive(Debug, Parser)]
pub struct CompletionCli {
    /// The shell to generate completions for.
    #[arg(short, long, value_name = "SHELL", value_parser)]
    pub shell: Shell,

    /// Write the completion config to a file instead of stdout.
    #[arg(short, long, value_name = "FILE", value_parser)]
    pub output: Option<PathBuf>,
}
