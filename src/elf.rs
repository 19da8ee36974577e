//! 32-bit ELF container editing.
//!
//! `ElfFile` edits an ELF image in place. Every multi-byte field goes through
//! the file's own byte order. Adding or removing data anywhere in the file
//! re-homes both header tables and every entry's data offset, so callers can
//! grow and shrink the file without tracking where things went.

mod strtab;
mod table;

use std::fs::File;
use std::io::{Read, Take, Write};
use std::mem::offset_of;
use std::path::Path;

use object::elf::{
    Ident, ELFCLASS32, ELFCLASS64, ELFDATA2LSB, ELFDATA2MSB, ELFMAG, ELFOSABI_SYSV, EM_386, EM_68K, EM_MIPS, EM_NONE,
    EM_PPC, ET_CORE, ET_DYN, ET_EXEC, ET_NONE, ET_REL, EV_CURRENT, PT_NULL, SHF_ALLOC, SHN_UNDEF, SHT_NOBITS,
};
use object::endian::{Endian, U16, U32};
use object::pod;
use object::Endianness;

use crate::container::{ByteFile, Container};
use crate::error::{Error, Result};
use crate::storage::Storage;
use crate::utils::relocate;

use table::{
    Ehdr, Phdr, Shdr, Table, P_ALIGN, P_FILESZ, P_FLAGS, P_MEMSZ, P_OFFSET, P_PADDR, P_TYPE, P_VADDR,
    SH_ADDR, SH_ADDRALIGN, SH_ENTSIZE, SH_FLAGS, SH_INFO, SH_LINK, SH_NAME, SH_OFFSET, SH_SIZE, SH_TYPE,
};

const EI_CLASS: u64 = offset_of!(Ident, class) as u64;
const EI_DATA: u64 = offset_of!(Ident, data) as u64;

const E_TYPE: u64 = offset_of!(Ehdr, e_type) as u64;
const E_MACHINE: u64 = offset_of!(Ehdr, e_machine) as u64;
const E_ENTRY: u64 = offset_of!(Ehdr, e_entry) as u64;
const E_FLAGS: u64 = offset_of!(Ehdr, e_flags) as u64;
const E_SHSTRNDX: u64 = offset_of!(Ehdr, e_shstrndx) as u64;

/// Size of the ELF file header.
pub const HEADER_SIZE: u64 = std::mem::size_of::<Ehdr>() as u64;

/// One program header entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgramHeader {
    pub kind: u32,
    pub offset: u32,
    pub address: u32,
    pub physical_address: u32,
    pub file_size: u32,
    pub memory_size: u32,
    pub flags: u32,
    pub align: u32,
}

impl ProgramHeader {
    /// A segment loaded at `address` whose file and memory images match.
    pub fn load(kind: u32, address: u32, size: u32, flags: u32, align: u32) -> Self {
        Self {
            kind,
            address,
            physical_address: address,
            file_size: size,
            memory_size: size,
            flags,
            align,
            ..Self::default()
        }
    }

    fn to_raw(self, e: Endianness) -> Phdr {
        Phdr {
            p_type: U32::new(e, self.kind),
            p_offset: U32::new(e, self.offset),
            p_vaddr: U32::new(e, self.address),
            p_paddr: U32::new(e, self.physical_address),
            p_filesz: U32::new(e, self.file_size),
            p_memsz: U32::new(e, self.memory_size),
            p_flags: U32::new(e, self.flags),
            p_align: U32::new(e, self.align),
        }
    }

    fn from_raw(raw: &Phdr, e: Endianness) -> Self {
        Self {
            kind: raw.p_type.get(e),
            offset: raw.p_offset.get(e),
            address: raw.p_vaddr.get(e),
            physical_address: raw.p_paddr.get(e),
            file_size: raw.p_filesz.get(e),
            memory_size: raw.p_memsz.get(e),
            flags: raw.p_flags.get(e),
            align: raw.p_align.get(e),
        }
    }
}

/// One section header entry. `name` is an offset into the string table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SectionHeader {
    pub name: u32,
    pub kind: u32,
    pub flags: u32,
    pub address: u32,
    pub offset: u32,
    pub size: u32,
    pub link: u32,
    pub info: u32,
    pub align: u32,
    pub entry_size: u32,
}

impl SectionHeader {
    pub fn new(kind: u32, flags: u32, address: u32, size: u32, align: u32) -> Self {
        Self {
            kind,
            flags,
            address,
            size,
            align,
            ..Self::default()
        }
    }

    /// Sections of this type occupy no bytes in the file.
    pub fn is_nobits(&self) -> bool {
        self.kind == SHT_NOBITS
    }

    fn to_raw(self, e: Endianness) -> Shdr {
        Shdr {
            sh_name: U32::new(e, self.name),
            sh_type: U32::new(e, self.kind),
            sh_flags: U32::new(e, self.flags),
            sh_addr: U32::new(e, self.address),
            sh_offset: U32::new(e, self.offset),
            sh_size: U32::new(e, self.size),
            sh_link: U32::new(e, self.link),
            sh_info: U32::new(e, self.info),
            sh_addralign: U32::new(e, self.align),
            sh_entsize: U32::new(e, self.entry_size),
        }
    }

    fn from_raw(raw: &Shdr, e: Endianness) -> Self {
        Self {
            name: raw.sh_name.get(e),
            kind: raw.sh_type.get(e),
            flags: raw.sh_flags.get(e),
            address: raw.sh_addr.get(e),
            offset: raw.sh_offset.get(e),
            size: raw.sh_size.get(e),
            link: raw.sh_link.get(e),
            info: raw.sh_info.get(e),
            align: raw.sh_addralign.get(e),
            entry_size: raw.sh_entsize.get(e),
        }
    }
}

/// An address range backed by file bytes.
#[derive(Debug, Clone, Copy)]
struct Mapping {
    address: u32,
    offset: u32,
    size: u32,
}

/// An open 32-bit ELF file.
#[derive(Debug)]
pub struct ElfFile<S: Storage = File> {
    file: ByteFile<S>,
    endian: Endianness,
    /// Data offsets being tracked across an edit; see `with_pinned`.
    pinned: Vec<u64>,
}

macro_rules! entry_accessors {
    ($table:expr; $($get:ident, $set:ident => $field:expr;)*) => {
        $(
            pub fn $get(&mut self, index: usize) -> Result<u32> {
                self.entry_word($table, index, $field)
            }

            pub fn $set(&mut self, index: usize, value: u32) -> Result<()> {
                self.set_entry_word($table, index, $field, value)
            }
        )*
    };
}

impl ElfFile<File> {
    /// Creates an empty ELF executable, replacing any existing file.
    pub fn create(path: impl AsRef<Path>, endian: Endianness) -> Result<Self> {
        Self::init(ByteFile::create(path)?, endian)
    }

    /// Opens an existing ELF file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::attach(ByteFile::open(path)?)
    }
}

impl<S: Storage> ElfFile<S> {
    pub fn create_in(store: S, endian: Endianness) -> Result<Self> {
        Self::init(ByteFile::from_store(store), endian)
    }

    pub fn open_in(store: S) -> Result<Self> {
        Self::attach(ByteFile::from_store(store))
    }

    /// Writes a fresh header, a null section entry and an empty name table
    /// into `file`.
    pub fn init(mut file: ByteFile<S>, endian: Endianness) -> Result<Self> {
        let u16 = |v: u16| U16::new(endian, v);
        let u32 = |v: u32| U32::new(endian, v);

        let header = Ehdr {
            e_ident: Ident {
                magic: ELFMAG,
                class: ELFCLASS32,
                data: match endian {
                    Endianness::Big => ELFDATA2MSB,
                    Endianness::Little => ELFDATA2LSB,
                },
                version: EV_CURRENT,
                os_abi: ELFOSABI_SYSV,
                abi_version: 0,
                padding: [0; 7],
            },
            e_type: u16(ET_EXEC),
            e_machine: u16(EM_NONE),
            e_version: u32(EV_CURRENT as u32),
            e_entry: u32(0),
            e_phoff: u32(0),
            e_shoff: u32(HEADER_SIZE as u32),
            e_flags: u32(0),
            e_ehsize: u16(HEADER_SIZE as u16),
            e_phentsize: u16(Table::Program.entry_size() as u16),
            e_phnum: u16(0),
            e_shentsize: u16(Table::Section.entry_size() as u16),
            e_shnum: u16(1),
            e_shstrndx: u16(SHN_UNDEF),
        };

        file.store()?.truncate(0)?;
        file.write_at(0, pod::bytes_of(&header))?;
        file.write_at(HEADER_SIZE, pod::bytes_of(&SectionHeader::default().to_raw(endian)))?;

        let mut elf = Self {
            file,
            endian,
            pinned: Vec::new(),
        };
        elf.add_string("")?;
        Ok(elf)
    }

    /// Wraps an open container holding an ELF image.
    pub fn attach(mut file: ByteFile<S>) -> Result<Self> {
        let mut ident = [0u8; 16];
        file.read_at(0, &mut ident)?;
        if ident[..ELFMAG.len()] != ELFMAG {
            return Err(Error::BadMagic);
        }
        let class = ident[EI_CLASS as usize];
        if class != ELFCLASS32 {
            return Err(Error::UnsupportedClass(class));
        }
        if file.len()? < HEADER_SIZE {
            return Err(Error::ShortIo {
                offset: 0,
                expected: HEADER_SIZE,
            });
        }
        let endian = if ident[EI_DATA as usize] == ELFDATA2MSB {
            Endianness::Big
        } else {
            Endianness::Little
        };
        Ok(Self {
            file,
            endian,
            pinned: Vec::new(),
        })
    }

    pub fn is_open(&self) -> bool {
        self.file.is_open()
    }

    pub fn close(&mut self) -> Result<()> {
        self.file.close()
    }

    pub fn path(&self) -> Option<&Path> {
        self.file.path()
    }

    pub fn into_store(self) -> Result<S> {
        self.file.into_store()
    }

    fn read_u8(&mut self, at: u64) -> Result<u8> {
        let mut buf = [0u8; 1];
        self.file.read_at(at, &mut buf)?;
        Ok(buf[0])
    }

    fn read_u16(&mut self, at: u64) -> Result<u16> {
        let mut buf = [0u8; 2];
        self.file.read_at(at, &mut buf)?;
        Ok(self.endian.read_u16_bytes(buf))
    }

    fn write_u16(&mut self, at: u64, value: u16) -> Result<()> {
        let bytes = self.endian.write_u16_bytes(value);
        self.file.write_at(at, &bytes)
    }

    fn read_u32(&mut self, at: u64) -> Result<u32> {
        let mut buf = [0u8; 4];
        self.file.read_at(at, &mut buf)?;
        Ok(self.endian.read_u32_bytes(buf))
    }

    fn write_u32(&mut self, at: u64, value: u32) -> Result<()> {
        let bytes = self.endian.write_u32_bytes(value);
        self.file.write_at(at, &bytes)
    }

    /// Word size of the file in bits.
    pub fn object_size(&mut self) -> Result<u32> {
        Ok(match self.read_u8(EI_CLASS)? {
            ELFCLASS64 => 64,
            _ => 32,
        })
    }

    pub fn endianness(&self) -> Result<Endianness> {
        if !self.is_open() {
            return Err(Error::NotOpen);
        }
        Ok(self.endian)
    }

    pub fn is_32bit(&mut self) -> Result<bool> {
        Ok(self.object_size()? == 32)
    }

    pub fn is_64bit(&mut self) -> Result<bool> {
        Ok(self.object_size()? == 64)
    }

    pub fn is_little_endian(&self) -> Result<bool> {
        Ok(self.endianness()? == Endianness::Little)
    }

    pub fn is_big_endian(&self) -> Result<bool> {
        Ok(self.endianness()? == Endianness::Big)
    }

    pub fn file_type(&mut self) -> Result<u16> {
        self.read_u16(E_TYPE)
    }

    pub fn set_file_type(&mut self, kind: u16) -> Result<()> {
        self.write_u16(E_TYPE, kind)
    }

    pub fn is_type_none(&mut self) -> Result<bool> {
        Ok(self.file_type()? == ET_NONE)
    }

    pub fn is_type_relocatable(&mut self) -> Result<bool> {
        Ok(self.file_type()? == ET_REL)
    }

    pub fn is_type_executable(&mut self) -> Result<bool> {
        Ok(self.file_type()? == ET_EXEC)
    }

    pub fn is_type_shared(&mut self) -> Result<bool> {
        Ok(self.file_type()? == ET_DYN)
    }

    pub fn is_type_core(&mut self) -> Result<bool> {
        Ok(self.file_type()? == ET_CORE)
    }

    pub fn machine(&mut self) -> Result<u16> {
        self.read_u16(E_MACHINE)
    }

    pub fn set_machine(&mut self, machine: u16) -> Result<()> {
        self.write_u16(E_MACHINE, machine)
    }

    pub fn is_mips(&mut self) -> Result<bool> {
        Ok(self.machine()? == EM_MIPS)
    }

    pub fn is_ppc(&mut self) -> Result<bool> {
        Ok(self.machine()? == EM_PPC)
    }

    pub fn is_intel386(&mut self) -> Result<bool> {
        Ok(self.machine()? == EM_386)
    }

    pub fn is_m68k(&mut self) -> Result<bool> {
        Ok(self.machine()? == EM_68K)
    }

    pub fn entry_point(&mut self) -> Result<u32> {
        self.read_u32(E_ENTRY)
    }

    pub fn set_entry_point(&mut self, address: u32) -> Result<()> {
        self.write_u32(E_ENTRY, address)
    }

    pub fn flags(&mut self) -> Result<u32> {
        self.read_u32(E_FLAGS)
    }

    pub fn set_flags(&mut self, flags: u32) -> Result<()> {
        self.write_u32(E_FLAGS, flags)
    }

    pub fn program_count(&mut self) -> Result<usize> {
        self.table_count(Table::Program)
    }

    pub fn section_count(&mut self) -> Result<usize> {
        self.table_count(Table::Section)
    }

    /// File offset of the program header table, `None` while it is empty.
    pub fn program_table_offset(&mut self) -> Result<Option<u32>> {
        let base = self.table_base(Table::Program)?;
        Ok((base != 0).then_some(base))
    }

    /// File offset of the section header table, `None` while it is empty.
    pub fn section_table_offset(&mut self) -> Result<Option<u32>> {
        let base = self.table_base(Table::Section)?;
        Ok((base != 0).then_some(base))
    }

    entry_accessors! { Table::Program;
        program_type, set_program_type => P_TYPE;
        program_offset, set_program_offset => P_OFFSET;
        program_address, set_program_address => P_VADDR;
        program_physical_address, set_program_physical_address => P_PADDR;
        program_size, set_program_size => P_FILESZ;
        program_memory_size, set_program_memory_size => P_MEMSZ;
        program_flags, set_program_flags => P_FLAGS;
        program_align, set_program_align => P_ALIGN;
    }

    entry_accessors! { Table::Section;
        section_name_offset, set_section_name_offset => SH_NAME;
        section_type, set_section_type => SH_TYPE;
        section_flags, set_section_flags => SH_FLAGS;
        section_address, set_section_address => SH_ADDR;
        section_offset, set_section_offset => SH_OFFSET;
        section_size, set_section_size => SH_SIZE;
        section_link, set_section_link => SH_LINK;
        section_info, set_section_info => SH_INFO;
        section_align, set_section_align => SH_ADDRALIGN;
        section_entry_size, set_section_entry_size => SH_ENTSIZE;
    }

    pub fn program(&mut self, index: usize) -> Result<ProgramHeader> {
        let mut raw = ProgramHeader::default().to_raw(self.endian);
        self.read_entry(Table::Program, index, &mut raw)?;
        Ok(ProgramHeader::from_raw(&raw, self.endian))
    }

    pub fn section(&mut self, index: usize) -> Result<SectionHeader> {
        let mut raw = SectionHeader::default().to_raw(self.endian);
        self.read_entry(Table::Section, index, &mut raw)?;
        Ok(SectionHeader::from_raw(&raw, self.endian))
    }

    fn write_program(&mut self, index: usize, header: &ProgramHeader) -> Result<()> {
        let raw = header.to_raw(self.endian);
        self.write_entry(Table::Program, index, &raw)
    }

    fn write_section(&mut self, index: usize, header: &SectionHeader) -> Result<()> {
        let raw = header.to_raw(self.endian);
        self.write_entry(Table::Section, index, &raw)
    }

    /// Runs `edit` while tracking where the bytes at `offset` end up.
    ///
    /// Every shift performed by `edit` relocates the pinned offset the same
    /// way it relocates recorded offsets, so the returned position is where
    /// the data lives once the edit is complete.
    fn with_pinned<T>(&mut self, offset: u64, edit: impl FnOnce(&mut Self) -> Result<T>) -> Result<(T, u64)> {
        self.pinned.push(offset);
        let outcome = edit(self);
        let moved = self.pinned.pop().unwrap_or(offset);
        outcome.map(|value| (value, moved))
    }

    /// Appends a program header describing data already in the file.
    ///
    /// `header.offset` names the data as it lies now. If the table grows in
    /// front of it the stored offset accounts for that.
    pub fn add_program_header(&mut self, header: ProgramHeader) -> Result<usize> {
        let (index, offset) = self.with_pinned(u64::from(header.offset), |elf| elf.append_entry(Table::Program))?;
        let header = ProgramHeader {
            offset: narrow(offset)?,
            ..header
        };
        self.write_program(index, &header)?;
        tracing::debug!(index, offset = header.offset, size = header.file_size, "added program header");
        Ok(index)
    }

    /// Appends a section header named `name` describing data already in the
    /// file. The name is added to the string table first; `header.name` is
    /// ignored.
    pub fn add_section_header(&mut self, name: &str, header: SectionHeader) -> Result<usize> {
        let ((name, index), offset) = self.with_pinned(u64::from(header.offset), |elf| {
            let name = elf.add_string(name)?;
            let index = elf.append_entry(Table::Section)?;
            Ok((name, index))
        })?;
        let header = SectionHeader {
            name,
            offset: narrow(offset)?,
            ..header
        };
        self.write_section(index, &header)?;
        tracing::debug!(index, offset = header.offset, size = header.size, "added section header");
        Ok(index)
    }

    /// Deletes a program header entry. The data it described is untouched.
    pub fn remove_program_header(&mut self, index: usize) -> Result<()> {
        self.remove_entry(Table::Program, index)?;
        tracing::debug!(index, "removed program header");
        Ok(())
    }

    /// Deletes a section header entry. The data it described is untouched.
    pub fn remove_section_header(&mut self, index: usize) -> Result<()> {
        self.remove_entry(Table::Section, index)?;
        match self.string_table_index()? {
            Some(strndx) if strndx == index => self.set_string_table_index(None)?,
            Some(strndx) if strndx > index => self.set_string_table_index(Some(strndx - 1))?,
            _ => {}
        }
        tracing::debug!(index, "removed section header");
        Ok(())
    }

    /// Appends `header.file_size` bytes from `source` to the file and adds a
    /// program header for them.
    pub fn add_program<R: Read + ?Sized>(&mut self, header: ProgramHeader, source: &mut R) -> Result<usize> {
        let offset = self.append_data(u64::from(header.file_size), source)?;
        self.add_program_header(ProgramHeader {
            offset: narrow(offset)?,
            ..header
        })
    }

    /// Appends `header.size` bytes from `source` and adds a section header
    /// for them. `SHT_NOBITS` sections read nothing and keep `header.offset`.
    pub fn add_section<R: Read + ?Sized>(
        &mut self,
        name: &str,
        header: SectionHeader,
        source: &mut R,
    ) -> Result<usize> {
        if header.is_nobits() {
            return self.add_section_header(name, header);
        }
        let offset = self.append_data(u64::from(header.size), source)?;
        self.add_section_header(
            name,
            SectionHeader {
                offset: narrow(offset)?,
                ..header
            },
        )
    }

    /// Copies `size` bytes from `source` to the end of the file and returns
    /// where they start. A failed copy leaves the file at its old length.
    fn append_data<R: Read + ?Sized>(&mut self, size: u64, source: &mut R) -> Result<u64> {
        let offset = self.file.len()?;
        if let Err(err) = self.file.copy_in(offset, size, source) {
            self.file.store()?.truncate(offset)?;
            return Err(err);
        }
        Ok(offset)
    }

    /// Removes a program header and, unless another entry still refers to the
    /// same offset, the data it described.
    pub fn remove_program(&mut self, index: usize) -> Result<()> {
        let header = self.program(index)?;
        let ((), offset) = self.with_pinned(u64::from(header.offset), |elf| elf.remove_program_header(index))?;
        self.release(offset, header.file_size)
    }

    /// Removes a section header and, unless another entry still refers to the
    /// same offset, the data it described.
    pub fn remove_section(&mut self, index: usize) -> Result<()> {
        let header = self.section(index)?;
        let ((), offset) = self.with_pinned(u64::from(header.offset), |elf| elf.remove_section_header(index))?;
        if header.is_nobits() {
            return Ok(());
        }
        self.release(offset, header.size)
    }

    fn release(&mut self, offset: u64, size: u32) -> Result<()> {
        if offset == 0 || size == 0 {
            return Ok(());
        }
        if self.is_referenced(narrow(offset)?)? {
            tracing::debug!(offset, size, "data still referenced, leaving it in place");
            return Ok(());
        }
        self.remove(offset, u64::from(size))?;
        Ok(())
    }

    fn remove_all_of(&mut self, table: Table) -> Result<()> {
        let mut outcome = Ok(());
        for index in (0..self.table_count(table)?).rev() {
            let removed = match table {
                Table::Program => self.remove_program(index),
                Table::Section => self.remove_section(index),
            };
            if let Err(err) = removed {
                tracing::warn!(?table, index, %err, "failed to remove entry");
                if outcome.is_ok() {
                    outcome = Err(err);
                }
            }
        }
        outcome
    }

    /// Removes every program and its data. All entries are attempted; the
    /// first failure is reported.
    pub fn remove_all_programs(&mut self) -> Result<()> {
        self.remove_all_of(Table::Program)
    }

    /// Removes every section, including the null section and the string
    /// table. All entries are attempted; the first failure is reported.
    pub fn remove_all_sections(&mut self) -> Result<()> {
        self.remove_all_of(Table::Section)
    }

    pub fn remove_all_programs_and_sections(&mut self) -> Result<()> {
        let programs = self.remove_all_programs();
        let sections = self.remove_all_sections();
        programs.and(sections)
    }

    /// Ranges with both an address and file bytes, programs first.
    fn mappings(&mut self) -> Result<Vec<Mapping>> {
        let mut mappings = Vec::new();
        for index in 0..self.program_count()? {
            let p = self.program(index)?;
            if p.kind != PT_NULL && p.file_size != 0 {
                mappings.push(Mapping {
                    address: p.address,
                    offset: p.offset,
                    size: p.file_size,
                });
            }
        }
        for index in 0..self.section_count()? {
            let s = self.section(index)?;
            if s.flags & SHF_ALLOC != 0 && !s.is_nobits() && s.size != 0 {
                mappings.push(Mapping {
                    address: s.address,
                    offset: s.offset,
                    size: s.size,
                });
            }
        }
        Ok(mappings)
    }

    /// Start addresses of every loadable program and allocated section.
    fn load_addresses(&mut self) -> Result<Vec<u32>> {
        let mut addresses = Vec::new();
        for index in 0..self.program_count()? {
            if self.program_type(index)? != PT_NULL {
                addresses.push(self.program_address(index)?);
            }
        }
        for index in 0..self.section_count()? {
            if self.section_flags(index)? & SHF_ALLOC != 0 {
                addresses.push(self.section_address(index)?);
            }
        }
        Ok(addresses)
    }

    pub fn lowest_address(&mut self) -> Result<u32> {
        self.load_addresses()?.into_iter().min().ok_or(Error::NoSections)
    }

    pub fn highest_address(&mut self) -> Result<u32> {
        self.load_addresses()?.into_iter().max().ok_or(Error::NoSections)
    }

    pub fn address_to_offset(&mut self, address: u32) -> Result<u32> {
        let m = self
            .mappings()?
            .into_iter()
            .find(|m| address >= m.address && u64::from(address - m.address) < u64::from(m.size))
            .ok_or(Error::Unmapped(address))?;
        let delta = address - m.address;
        m.offset
            .checked_add(delta)
            .ok_or(Error::InvalidOffset(i64::from(m.offset) + i64::from(delta)))
    }

    pub fn offset_to_address(&mut self, offset: u32) -> Result<u32> {
        let m = self
            .mappings()?
            .into_iter()
            .find(|m| offset >= m.offset && u64::from(offset - m.offset) < u64::from(m.size))
            .ok_or(Error::Unmapped(offset))?;
        m.address.checked_add(offset - m.offset).ok_or(Error::Unmapped(offset))
    }

    /// Streams a program's file bytes to `sink`.
    pub fn extract_program_data<W: Write + ?Sized>(&mut self, index: usize, sink: &mut W) -> Result<u64> {
        let p = self.program(index)?;
        self.file.copy_out(u64::from(p.offset), u64::from(p.file_size), sink)
    }

    /// Streams a section's file bytes to `sink`. `SHT_NOBITS` sections have
    /// none.
    pub fn extract_section_data<W: Write + ?Sized>(&mut self, index: usize, sink: &mut W) -> Result<u64> {
        let s = self.section(index)?;
        if s.is_nobits() {
            return Ok(0);
        }
        self.file.copy_out(u64::from(s.offset), u64::from(s.size), sink)
    }

    pub fn program_reader(&mut self, index: usize) -> Result<Take<&mut S>> {
        let p = self.program(index)?;
        self.file.range_reader(u64::from(p.offset), u64::from(p.file_size))
    }

    pub fn section_reader(&mut self, index: usize) -> Result<Take<&mut S>> {
        let s = self.section(index)?;
        let (offset, size) = if s.is_nobits() { (0, 0) } else { (s.offset, s.size) };
        self.file.range_reader(u64::from(offset), u64::from(size))
    }
}

impl<S: Storage> Container for ElfFile<S> {
    type Store = S;

    fn bytes(&mut self) -> &mut ByteFile<S> {
        &mut self.file
    }

    fn shift(&mut self, from: u64, delta: i64) -> Result<()> {
        self.file.shift_bytes(from, delta)?;
        if delta == 0 {
            return Ok(());
        }

        for table in Table::ALL {
            let base = u64::from(self.table_base(table)?);
            if base != 0 && base >= from {
                self.set_table_base(table, moved(base, delta)?)?;
            }
        }
        for table in Table::ALL {
            for index in 0..self.table_count(table)? {
                let offset = u64::from(self.entry_word(table, index, table.offset_field())?);
                if offset >= from {
                    self.set_entry_word(table, index, table.offset_field(), moved(offset, delta)?)?;
                }
            }
        }
        for pin in self.pinned.iter_mut() {
            if *pin >= from {
                *pin = relocate(*pin, delta).ok_or(Error::InvalidOffset(*pin as i64))?;
            }
        }
        Ok(())
    }
}

/// Narrows a file offset to the 32-bit width ELF32 records.
fn narrow(offset: u64) -> Result<u32> {
    u32::try_from(offset).map_err(|_| Error::InvalidOffset(offset as i64))
}

fn moved(offset: u64, delta: i64) -> Result<u32> {
    relocate(offset, delta)
        .ok_or(Error::InvalidOffset((offset as i64).saturating_add(delta)))
        .and_then(narrow)
}
