//! Error type shared by every container and conversion.
//!
//! Each fallible operation reports one of these kinds instead of a reserved
//! bit pattern, so an all-ones address is just an address.

use std::io;

use thiserror::Error;

use crate::dol::SectionKind;

/// Errors produced while editing DOL or ELF containers.
#[derive(Error, Debug)]
pub enum Error {
    /// The container has been closed (or was never opened).
    #[error("no file is open")]
    NotOpen,

    /// A slot or table index is past the capacity or current count.
    #[error("index {index} out of range (limit {limit})")]
    IndexOutOfRange { index: usize, limit: usize },

    /// A move would place data before the start of the file, or an offset
    /// lies outside the file or a table that has not been placed.
    #[error("invalid file offset {0:#x}")]
    InvalidOffset(i64),

    /// No section or segment covers the requested address or offset.
    #[error("{0:#010x} is not covered by any section")]
    Unmapped(u32),

    /// A read or write moved fewer bytes than requested.
    #[error("short transfer at offset {offset:#x}: expected {expected} bytes")]
    ShortIo { offset: u64, expected: u64 },

    /// A staging buffer could not be allocated.
    #[error("could not allocate a {0} byte buffer")]
    AllocationFailure(usize),

    /// The string table or a header table could not be created on first use.
    #[error("failed to create the {what}")]
    TableBootstrap {
        what: &'static str,
        #[source]
        source: Box<Error>,
    },

    /// The addressed DOL slot holds no section.
    #[error("{kind} slot {index} is empty")]
    EmptySlot { kind: SectionKind, index: usize },

    /// Every DOL slot of this kind is occupied.
    #[error("all {0} slots are in use")]
    NoFreeSlot(SectionKind),

    /// Address bounds were requested from a file with no sections.
    #[error("file contains no sections")]
    NoSections,

    /// A name lookup was attempted on an ELF without a string table.
    #[error("file has no section name string table")]
    NoStringTable,

    /// The file does not start with the ELF identification bytes.
    #[error("not an ELF file")]
    BadMagic,

    /// The ELF identification names a class other than 32-bit.
    #[error("unsupported ELF class {0}")]
    UnsupportedClass(u8),

    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
