/*
 * SPDX-FileCopyrightText: 2026 Andrew Gunnerson
 * SPDX-License-Identifier: GPL-3.0-only
 */

use std::{
    io,
    sync::atomic::{AtomicBool, Ordering},
};

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::Level;

use crate::cli::{completion, hook, info};

#[derive(Debug, Subcommand)]
pub enum Command {
    Hook(hook::HookCli),
    Info(info::InfoCli),
    Completion(completion::CompletionCli),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => Self::ERROR,
            LogLevel::Warn => Self::WARN,
            LogLevel::Info => Self::INFO,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Trace => Self::TRACE,
        }
    }
}

#[derive(Debug, Parser)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Lowest log message severity to output.
    #[arg(
        long,
        global = true,
        value_enum,
        value_name = "LEVEL",
        default_value_t = LogLevel::Info,
    )]
    pub log_level: LogLevel,
}

/// Log to stderr so that stdout only contains the generated script.
pub fn init_logging(level: LogLevel) {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_max_level(Level::from(level))
        .with_target(false)
        .without_time()
        .init();
}

pub fn main(logging_initialized: &AtomicBool) -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.log_level);
    logging_initialized.store(true, Ordering::SeqCst);

    match cli.command {
        Command::Hook(c) => hook::hook_main(&c),
        Command::Info(c) => info::info_main(&c),
        Command::Completion(c) => completion::completion_main(&c),
    }
}
