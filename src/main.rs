//! Entry point for the doltool converter.
//!
//! This file handles high-level application flow:
//! 1. Parse command-line arguments using `clap`.
//! 2. Install the `tracing` subscriber.
//! 3. Open the input container and run the requested conversion into the output.
//!
//! Error handling is done via `anyhow`.

use anyhow::{Context, Result};
use clap::Parser;
use memmap2::Mmap;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use tracing_subscriber::EnvFilter;

use doltool::config::{Command, Config};
use doltool::container::ByteFile;
use doltool::convert::{self, ElfOptions};
use doltool::dol::{DolFile, SectionKind};
use doltool::elf::ElfFile;

fn main() -> Result<()> {
    let config = Config::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let output = config.command.output_path();
    let buffer_size = config.buffer_size;

    match &config.command {
        Command::Info { input } => {
            let mut dol = open_dol(input, buffer_size)?;
            print_info(&mut dol).with_context(|| format!("failed to read {}", input.display()))?;
        }

        Command::ToBin { input, .. } => {
            let output = output.context("no output path")?;
            let mut dol = open_dol(input, buffer_size)?;
            let file = File::create(&output).with_context(|| format!("failed to create {}", output.display()))?;
            let mut out = BufWriter::new(file);
            let image = convert::dol_to_binary(&mut dol, &mut out).context("failed to dump DOL")?;
            out.into_inner().map_err(|e| e.into_error())?;
            println!(
                "Wrote {} bytes to {} (load address {:#010x}, entry point {:#010x}{})",
                image.size,
                output.display(),
                image.load_address,
                image.entry_point,
                if image.jump_inserted { ", jump inserted" } else { "" }
            );
        }

        Command::ToElf { input, program_headers, .. } => {
            let output = output.context("no output path")?;
            let mut dol = open_dol(input, buffer_size)?;
            let target = create_target(&output, buffer_size)?;
            let options = ElfOptions {
                program_headers: *program_headers,
            };
            let mut elf = convert::dol_to_elf(&mut dol, target, options).context("failed to convert DOL to ELF")?;
            elf.close()?;
            println!("Converted {} to {}", input.display(), output.display());
        }

        Command::FromBin {
            input,
            load_address,
            entry_point,
            ..
        } => {
            let output = output.context("no output path")?;
            let file = File::open(input).with_context(|| format!("failed to open {}", input.display()))?;
            let mmap = unsafe { Mmap::map(&file)? };
            let size = convert::binary_size(mmap.len() as u64)?;

            let target = create_target(&output, buffer_size)?;
            let mut dol = convert::binary_to_dol(target, &mut &mmap[..], size, *load_address, *entry_point)
                .context("failed to convert binary to DOL")?;
            dol.close()?;
            println!("Converted {} to {}", input.display(), output.display());
        }

        Command::FromElf { input, .. } => {
            let output = output.context("no output path")?;
            let file = ByteFile::open(input)
                .with_context(|| format!("failed to open {}", input.display()))?
                .with_buffer_size(buffer_size);
            let mut elf = ElfFile::attach(file).with_context(|| format!("failed to read {}", input.display()))?;
            let target = create_target(&output, buffer_size)?;
            let mut dol = convert::elf_to_dol(&mut elf, target).context("failed to convert ELF to DOL")?;
            dol.close()?;
            println!("Converted {} to {}", input.display(), output.display());
        }
    }

    Ok(())
}

fn open_dol(path: &Path, buffer_size: usize) -> Result<DolFile> {
    let file = ByteFile::open(path)
        .with_context(|| format!("failed to open {}", path.display()))?
        .with_buffer_size(buffer_size);
    DolFile::attach(file).with_context(|| format!("{} is not a DOL file", path.display()))
}

fn create_target(path: &Path, buffer_size: usize) -> Result<ByteFile> {
    Ok(ByteFile::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?
        .with_buffer_size(buffer_size))
}

fn print_info(dol: &mut DolFile) -> doltool::Result<()> {
    println!("Entry point: {:#010x}", dol.entry_point()?);
    println!(
        "BSS:         {:#010x} ({:#x} bytes)",
        dol.bss_address()?,
        dol.bss_size()?
    );
    for kind in SectionKind::ALL {
        for (index, slot) in dol.valid_slots(kind)? {
            println!(
                "{kind}{index:<2} offset {:#08x}  address {:#010x}  size {:#x}",
                slot.offset, slot.address, slot.size
            );
        }
    }
    Ok(())
}
