//! Conversions between flat binaries, DOL files and ELF files.
//!
//! Every conversion reads from one open container and writes into another,
//! streaming section bytes straight across with the source's range readers.

use std::io::{self, Read, Seek, SeekFrom, Write};

use object::elf::{
    EM_PPC, PF_R, PF_W, PF_X, PT_LOAD, SHF_ALLOC, SHF_EXECINSTR, SHF_WRITE, SHT_NOBITS, SHT_PROGBITS,
};
use object::Endianness;

use crate::container::ByteFile;
use crate::dol::{DolFile, SectionKind, SECTION_ALIGN};
use crate::elf::{ElfFile, ProgramHeader, SectionHeader};
use crate::error::{Error, Result};
use crate::storage::Storage;

/// Lowest address a loader may place code at without clobbering the
/// low-memory globals.
pub const MIN_SAFE_LOAD_ADDRESS: u32 = 0x8000_3100;

/// Load address and entry point used when none are given.
pub const DEFAULT_LOAD_ADDRESS: u32 = 0x8000_3100;

/// PowerPC `b` with a zero displacement.
const BRANCH_OPCODE: u32 = 0x4800_0000;
const BRANCH_DISPLACEMENT_MASK: u32 = 0x03FF_FFFC;

/// Options for [`dol_to_elf`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ElfOptions {
    /// Also describe every text and data section with a `PT_LOAD` program
    /// header that shares the section's bytes.
    pub program_headers: bool,
}

/// What [`dol_to_binary`] produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinaryImage {
    /// Address the first output byte must be loaded at.
    pub load_address: u32,
    pub entry_point: u32,
    /// A branch to the entry point was written as the first instruction.
    pub jump_inserted: bool,
    /// Bytes written.
    pub size: u64,
}

/// Encodes an unconditional relative branch from `from` to `to`.
pub fn branch_instruction(from: u32, to: u32) -> u32 {
    BRANCH_OPCODE | (to.wrapping_sub(from) & BRANCH_DISPLACEMENT_MASK)
}

/// Stores `size` bytes of `source` in a new DOL as one text section loaded at
/// `load_address`.
pub fn binary_to_dol<T: Storage, R: Read + ?Sized>(
    target: ByteFile<T>,
    source: &mut R,
    size: u32,
    load_address: u32,
    entry_point: u32,
) -> Result<DolFile<T>> {
    let mut dol = DolFile::init(target)?;
    dol.add_section(SectionKind::Text, source, load_address, size)?;
    dol.set_entry_point(entry_point)?;
    Ok(dol)
}

/// Writes the memory image of `dol` to `out`, starting at its current
/// position.
///
/// The image starts at the lowest section address. When the entry point is
/// elsewhere and there is room below the image, a branch to the entry point
/// is placed in the word just before it and the image starts there instead.
pub fn dol_to_binary<S: Storage, W: Write + Seek + ?Sized>(dol: &mut DolFile<S>, out: &mut W) -> Result<BinaryImage> {
    let lowest = dol.lowest_address()?;
    let entry_point = dol.entry_point()?;
    let jump_inserted = entry_point != lowest && lowest >= MIN_SAFE_LOAD_ADDRESS + 4;
    let load_address = if jump_inserted { lowest - 4 } else { lowest };

    let start = out.stream_position()?;
    let mut end = 0u64;
    if jump_inserted {
        out.write_all(&branch_instruction(load_address, entry_point).to_be_bytes())?;
        end = 4;
        tracing::debug!(
            load_address = format_args!("{load_address:#010x}"),
            entry_point = format_args!("{entry_point:#010x}"),
            "inserted branch to entry point"
        );
    }

    for kind in SectionKind::ALL {
        for (index, slot) in dol.valid_slots(kind)? {
            let target = u64::from(slot.address - load_address);
            if target > end {
                out.seek(SeekFrom::Start(start + end))?;
                io::copy(&mut io::repeat(0).take(target - end), out)?;
            }
            out.seek(SeekFrom::Start(start + target))?;
            dol.extract_section(kind, index, out)?;
            end = end.max(target + u64::from(slot.size));
        }
    }
    out.seek(SeekFrom::Start(start + end))?;

    Ok(BinaryImage {
        load_address,
        entry_point,
        jump_inserted,
        size: end,
    })
}

/// Builds a big-endian PowerPC ELF holding every section of `dol`.
///
/// Text slot `n` becomes `.textn`, data slot `n` becomes `.datan`, and the bss
/// range becomes a `.bss` section with no file bytes.
pub fn dol_to_elf<S: Storage, T: Storage>(
    dol: &mut DolFile<S>,
    target: ByteFile<T>,
    options: ElfOptions,
) -> Result<ElfFile<T>> {
    let mut elf = ElfFile::init(target, Endianness::Big)?;
    elf.set_machine(EM_PPC)?;
    elf.set_entry_point(dol.entry_point()?)?;

    for kind in SectionKind::ALL {
        let (prefix, flags, segment_flags) = match kind {
            SectionKind::Text => (".text", SHF_ALLOC | SHF_EXECINSTR, PF_R | PF_X),
            SectionKind::Data => (".data", SHF_ALLOC | SHF_WRITE, PF_R | PF_W),
        };
        for (index, slot) in dol.valid_slots(kind)? {
            let name = format!("{prefix}{index}");
            let header = SectionHeader::new(SHT_PROGBITS, flags, slot.address, slot.size, SECTION_ALIGN);
            let section = elf.add_section(&name, header, &mut dol.section_reader(kind, index)?)?;

            if options.program_headers {
                let offset = elf.section_offset(section)?;
                elf.add_program_header(ProgramHeader {
                    offset,
                    ..ProgramHeader::load(PT_LOAD, slot.address, slot.size, segment_flags, SECTION_ALIGN)
                })?;
            }
        }
    }

    let bss = SectionHeader::new(SHT_NOBITS, SHF_ALLOC | SHF_WRITE, dol.bss_address()?, dol.bss_size()?, 1);
    elf.add_section(".bss", bss, &mut io::empty())?;
    Ok(elf)
}

/// Builds a DOL from the loadable sections of `elf`.
///
/// Executable `SHT_PROGBITS` sections become text sections, other
/// `SHT_PROGBITS` sections with an address and a size become data sections,
/// and a section named `.bss` supplies the bss range.
pub fn elf_to_dol<S: Storage, T: Storage>(elf: &mut ElfFile<S>, target: ByteFile<T>) -> Result<DolFile<T>> {
    let mut dol = DolFile::init(target)?;
    if !elf.is_ppc()? {
        tracing::warn!(machine = elf.machine()?, "ELF file is not for PowerPC");
    }

    let named = elf.string_table_index()?.is_some();
    for index in 0..elf.section_count()? {
        let section = elf.section(index)?;
        if section.kind == SHT_PROGBITS {
            let kind = if section.flags & SHF_EXECINSTR != 0 {
                Some(SectionKind::Text)
            } else if section.address != 0 && section.size != 0 {
                Some(SectionKind::Data)
            } else {
                None
            };
            if let Some(kind) = kind {
                let mut reader = elf.section_reader(index)?;
                dol.add_section(kind, &mut reader, section.address, section.size)?;
            }
        }

        if named && is_bss(elf, index) {
            dol.set_bss_address(section.address)?;
            dol.set_bss_size(section.size)?;
        }
    }

    dol.set_entry_point(elf.entry_point()?)?;
    Ok(dol)
}

fn is_bss<S: Storage>(elf: &mut ElfFile<S>, index: usize) -> bool {
    match elf.section_name(index) {
        Ok(name) => name.eq_ignore_ascii_case(".bss"),
        Err(err) => {
            tracing::warn!(index, %err, "unreadable section name");
            false
        }
    }
}

/// Checks that a flat binary's length fits in a DOL section size field.
pub fn binary_size(len: u64) -> Result<u32> {
    u32::try_from(len).map_err(|_| Error::InvalidOffset(len as i64))
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::container::Container;

    fn memory() -> ByteFile<Cursor<Vec<u8>>> {
        ByteFile::from_store(Cursor::new(Vec::new()))
    }

    #[test]
    fn branch_encodes_the_displacement() {
        assert_eq!(branch_instruction(0x8000_3FFC, 0x8000_4010), 0x4800_0014);
        assert_eq!(branch_instruction(0x8000_3FFC, 0x8000_3FFC), BRANCH_OPCODE);
    }

    #[test]
    fn flat_binary_round_trips_without_a_jump() {
        let input = [0u8; 64];
        let mut dol = binary_to_dol(memory(), &mut &input[..], 64, 0x8000_4000, 0x8000_4000).unwrap();
        assert_eq!(dol.count_valid(SectionKind::Text).unwrap(), 1);
        assert_eq!(dol.address(SectionKind::Text, 0).unwrap(), 0x8000_4000);
        assert_eq!(dol.size(SectionKind::Text, 0).unwrap(), 64);

        let mut out = Cursor::new(Vec::new());
        let image = dol_to_binary(&mut dol, &mut out).unwrap();
        assert!(!image.jump_inserted);
        assert_eq!(image.load_address, 0x8000_4000);
        assert_eq!(out.into_inner(), input);
    }

    #[test]
    fn mismatched_entry_gets_a_branch() {
        let input = [0u8; 64];
        let mut dol = binary_to_dol(memory(), &mut &input[..], 64, 0x8000_4000, 0x8000_4010).unwrap();
        let mut out = Cursor::new(Vec::new());
        let image = dol_to_binary(&mut dol, &mut out).unwrap();

        let bytes = out.into_inner();
        assert!(image.jump_inserted);
        assert_eq!(image.load_address, 0x8000_3FFC);
        assert_eq!(bytes.len(), 68);
        assert_eq!(&bytes[..4], &[0x48, 0x00, 0x00, 0x14]);
        assert!(bytes[4..].iter().all(|&b| b == 0));
    }

    #[test]
    fn no_branch_without_headroom() {
        let input = [0u8; 32];
        let mut dol = binary_to_dol(memory(), &mut &input[..], 32, MIN_SAFE_LOAD_ADDRESS, 0x8000_3200).unwrap();
        let mut out = Cursor::new(Vec::new());
        let image = dol_to_binary(&mut dol, &mut out).unwrap();
        assert!(!image.jump_inserted);
        assert_eq!(out.into_inner().len(), 32);
    }

    #[test]
    fn gaps_between_sections_are_zero_filled() {
        let mut dol = DolFile::init(memory()).unwrap();
        dol.add_section(SectionKind::Text, &mut &[1u8; 32][..], 0x8000_4000, 32).unwrap();
        dol.add_section(SectionKind::Data, &mut &[2u8; 32][..], 0x8000_4040, 32).unwrap();
        dol.set_entry_point(0x8000_4000).unwrap();

        let mut out = Cursor::new(Vec::new());
        assert_eq!(dol_to_binary(&mut dol, &mut out).unwrap().size, 0x60);
        let bytes = out.into_inner();
        assert!(bytes[..32].iter().all(|&b| b == 1));
        assert!(bytes[32..64].iter().all(|&b| b == 0));
        assert!(bytes[64..].iter().all(|&b| b == 2));
    }

    #[test]
    fn dol_sections_become_named_elf_sections() {
        let mut dol = DolFile::init(memory()).unwrap();
        dol.add_section(SectionKind::Text, &mut &[7u8; 64][..], 0x8000_4000, 64).unwrap();
        dol.set_bss_address(0x8010_0000).unwrap();
        dol.set_bss_size(32).unwrap();
        dol.set_entry_point(0x8000_4000).unwrap();

        let mut elf = dol_to_elf(&mut dol, memory(), ElfOptions::default()).unwrap();
        assert!(elf.is_ppc().unwrap());
        assert_eq!(elf.entry_point().unwrap(), 0x8000_4000);
        assert_eq!(elf.section_count().unwrap(), 4);

        assert_eq!(elf.section_name(2).unwrap(), ".text0");
        let text = elf.section(2).unwrap();
        assert_eq!((text.address, text.size), (0x8000_4000, 64));
        assert_eq!(text.flags, SHF_ALLOC | SHF_EXECINSTR);

        assert_eq!(elf.section_name(3).unwrap(), ".bss");
        let bss = elf.section(3).unwrap();
        assert_eq!((bss.kind, bss.address, bss.size), (SHT_NOBITS, 0x8010_0000, 32));
        assert_eq!(bss.flags, SHF_ALLOC | SHF_WRITE);
    }

    #[test]
    fn program_headers_share_section_bytes() {
        let mut dol = DolFile::init(memory()).unwrap();
        dol.add_section(SectionKind::Text, &mut &[7u8; 64][..], 0x8000_4000, 64).unwrap();
        dol.add_section(SectionKind::Data, &mut &[8u8; 32][..], 0x8000_8000, 32).unwrap();
        let options = ElfOptions { program_headers: true };

        let mut elf = dol_to_elf(&mut dol, memory(), options).unwrap();
        assert_eq!(elf.program_count().unwrap(), 2);
        assert_eq!(elf.program_offset(0).unwrap(), elf.section_offset(2).unwrap());
        assert_eq!(elf.program_offset(1).unwrap(), elf.section_offset(3).unwrap());

        let mut out = Vec::new();
        elf.extract_program_data(1, &mut out).unwrap();
        assert_eq!(out, [8u8; 32]);
    }

    #[test]
    fn elf_round_trip_restores_the_dol_layout() {
        let mut dol = DolFile::init(memory()).unwrap();
        dol.add_section(SectionKind::Text, &mut &[7u8; 64][..], 0x8000_4000, 64).unwrap();
        dol.add_section(SectionKind::Data, &mut &[8u8; 32][..], 0x8000_8000, 32).unwrap();
        dol.set_bss_address(0x8010_0000).unwrap();
        dol.set_bss_size(0x200).unwrap();
        dol.set_entry_point(0x8000_4020).unwrap();

        let mut elf = dol_to_elf(&mut dol, memory(), ElfOptions::default()).unwrap();
        let mut back = elf_to_dol(&mut elf, memory()).unwrap();

        assert_eq!(back.valid_slots(SectionKind::Text).unwrap().len(), 1);
        assert_eq!(back.address(SectionKind::Data, 0).unwrap(), 0x8000_8000);
        assert_eq!(back.bss_address().unwrap(), 0x8010_0000);
        assert_eq!(back.bss_size().unwrap(), 0x200);
        assert_eq!(back.entry_point().unwrap(), 0x8000_4020);
        assert_eq!(back.bytes().len().unwrap(), 0x100 + 64 + 32);
    }

    #[test]
    fn broken_section_name_is_not_fatal() {
        let mut dol = DolFile::init(memory()).unwrap();
        dol.add_section(SectionKind::Text, &mut &[7u8; 64][..], 0x8000_4000, 64).unwrap();
        dol.set_bss_address(0x8010_0000).unwrap();
        dol.set_bss_size(0x40).unwrap();

        let mut elf = dol_to_elf(&mut dol, memory(), ElfOptions::default()).unwrap();
        elf.set_section_name_offset(2, 0x1000).unwrap();
        assert!(elf.section_name(2).is_err());

        let mut back = elf_to_dol(&mut elf, memory()).unwrap();
        assert_eq!(back.address(SectionKind::Text, 0).unwrap(), 0x8000_4000);
        assert_eq!(back.bss_address().unwrap(), 0x8010_0000);
        assert_eq!(back.bss_size().unwrap(), 0x40);
    }
}
