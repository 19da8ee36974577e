//! Configuration module.
//!
//! This module defines the command-line interface (CLI) for the converter using `clap`.
//! Each subcommand names its input file and an optional output path; when the
//! output is omitted it is derived from the input by swapping the extension.

use clap::{Parser, Subcommand};
use std::num::ParseIntError;
use std::path::{Path, PathBuf};

use crate::container::DEFAULT_BUFFER_SIZE;

/// Converts GameCube/Wii executables between DOL, ELF and flat binary.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info", help = "Set the logging level")]
    pub log_level: String,

    /// Block size used when moving data inside a file
    #[arg(long, default_value_t = DEFAULT_BUFFER_SIZE, help = "Staging buffer size in bytes")]
    pub buffer_size: usize,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the sections of a DOL file
    Info {
        input: PathBuf,
    },

    /// Dump a DOL file to a flat memory image
    ToBin {
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Convert a DOL file to ELF
    ToElf {
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Also emit a PT_LOAD program header for every section
        #[arg(long)]
        program_headers: bool,
    },

    /// Wrap a flat binary in a DOL file
    FromBin {
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long, value_parser = parse_hex, default_value = "0x80003100")]
        load_address: u32,
        #[arg(long, value_parser = parse_hex, default_value = "0x80003100")]
        entry_point: u32,
    },

    /// Convert an ELF file to DOL
    FromElf {
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

impl Command {
    /// Where the command writes its result, if it writes one.
    pub fn output_path(&self) -> Option<PathBuf> {
        match self {
            Command::Info { .. } => None,
            Command::ToBin { input, output } => Some(output_or(input, output, "bin")),
            Command::ToElf { input, output, .. } => Some(output_or(input, output, "elf")),
            Command::FromBin { input, output, .. } | Command::FromElf { input, output } => {
                Some(output_or(input, output, "dol"))
            }
        }
    }
}

fn output_or(input: &Path, output: &Option<PathBuf>, extension: &str) -> PathBuf {
    output.clone().unwrap_or_else(|| input.with_extension(extension))
}

/// Parses a hexadecimal `u32`, with or without a `0x` prefix.
pub fn parse_hex(s: &str) -> Result<u32, ParseIntError> {
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    u32::from_str_radix(digits, 16)
}
