//! DOL and ELF32 binary editing library.
//!
//! This library provides the core components for the `doltool` converter.
//! It is organized into several modules:
//! - `config`: CLI configuration.
//! - `storage`: Backing stores the containers edit (files or memory).
//! - `container`: Byte-level insert, remove and shift.
//! - `dol`: DOL files with their fixed section slots.
//! - `elf`: 32-bit ELF files with program and section header tables.
//! - `convert`: Conversions between flat binaries, DOL and ELF.

pub mod config;
pub mod container;
pub mod convert;
pub mod dol;
pub mod elf;
pub mod error;
pub mod storage;
pub mod utils;

pub use error::{Error, Result};
