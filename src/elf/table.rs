//! Program and section header tables.
//!
//! Both tables live somewhere inside the file, located by a base offset and an
//! entry count in the ELF header. An entry is addressed as
//! `base + index * entry_size` and every field in a 32-bit entry is one word.

use std::mem::{offset_of, size_of};

use object::elf::{FileHeader32, ProgramHeader32, SectionHeader32};
use object::pod;
use object::Endianness;

use super::{narrow, ElfFile};
use crate::container::Container;
use crate::error::{Error, Result};
use crate::storage::Storage;

pub(super) type Ehdr = FileHeader32<Endianness>;
pub(super) type Phdr = ProgramHeader32<Endianness>;
pub(super) type Shdr = SectionHeader32<Endianness>;

pub(super) const P_TYPE: u64 = offset_of!(Phdr, p_type) as u64;
pub(super) const P_OFFSET: u64 = offset_of!(Phdr, p_offset) as u64;
pub(super) const P_VADDR: u64 = offset_of!(Phdr, p_vaddr) as u64;
pub(super) const P_PADDR: u64 = offset_of!(Phdr, p_paddr) as u64;
pub(super) const P_FILESZ: u64 = offset_of!(Phdr, p_filesz) as u64;
pub(super) const P_MEMSZ: u64 = offset_of!(Phdr, p_memsz) as u64;
pub(super) const P_FLAGS: u64 = offset_of!(Phdr, p_flags) as u64;
pub(super) const P_ALIGN: u64 = offset_of!(Phdr, p_align) as u64;

pub(super) const SH_NAME: u64 = offset_of!(Shdr, sh_name) as u64;
pub(super) const SH_TYPE: u64 = offset_of!(Shdr, sh_type) as u64;
pub(super) const SH_FLAGS: u64 = offset_of!(Shdr, sh_flags) as u64;
pub(super) const SH_ADDR: u64 = offset_of!(Shdr, sh_addr) as u64;
pub(super) const SH_OFFSET: u64 = offset_of!(Shdr, sh_offset) as u64;
pub(super) const SH_SIZE: u64 = offset_of!(Shdr, sh_size) as u64;
pub(super) const SH_LINK: u64 = offset_of!(Shdr, sh_link) as u64;
pub(super) const SH_INFO: u64 = offset_of!(Shdr, sh_info) as u64;
pub(super) const SH_ADDRALIGN: u64 = offset_of!(Shdr, sh_addralign) as u64;
pub(super) const SH_ENTSIZE: u64 = offset_of!(Shdr, sh_entsize) as u64;

/// Which of the two header tables an operation addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Table {
    Program,
    Section,
}

impl Table {
    pub(crate) const ALL: [Table; 2] = [Table::Program, Table::Section];

    pub(crate) const fn entry_size(self) -> u64 {
        match self {
            Table::Program => size_of::<Phdr>() as u64,
            Table::Section => size_of::<Shdr>() as u64,
        }
    }

    const fn base_field(self) -> u64 {
        match self {
            Table::Program => offset_of!(Ehdr, e_phoff) as u64,
            Table::Section => offset_of!(Ehdr, e_shoff) as u64,
        }
    }

    const fn count_field(self) -> u64 {
        match self {
            Table::Program => offset_of!(Ehdr, e_phnum) as u64,
            Table::Section => offset_of!(Ehdr, e_shnum) as u64,
        }
    }

    /// Field holding the file offset of the data an entry describes.
    pub(crate) const fn offset_field(self) -> u64 {
        match self {
            Table::Program => P_OFFSET,
            Table::Section => SH_OFFSET,
        }
    }
}

impl<S: Storage> ElfFile<S> {
    pub(crate) fn table_base(&mut self, table: Table) -> Result<u32> {
        self.read_u32(table.base_field())
    }

    pub(crate) fn set_table_base(&mut self, table: Table, base: u32) -> Result<()> {
        self.write_u32(table.base_field(), base)
    }

    pub(crate) fn table_count(&mut self, table: Table) -> Result<usize> {
        self.read_u16(table.count_field()).map(usize::from)
    }

    fn set_table_count(&mut self, table: Table, count: usize) -> Result<()> {
        let count = u16::try_from(count).map_err(|_| Error::IndexOutOfRange {
            index: count,
            limit: usize::from(u16::MAX),
        })?;
        self.write_u16(table.count_field(), count)
    }

    /// File offset of entry `index`.
    pub(crate) fn entry_at(&mut self, table: Table, index: usize) -> Result<u64> {
        let count = self.table_count(table)?;
        if index >= count {
            return Err(Error::IndexOutOfRange { index, limit: count });
        }
        let base = u64::from(self.table_base(table)?);
        Ok(base + index as u64 * table.entry_size())
    }

    pub(crate) fn entry_word(&mut self, table: Table, index: usize, field: u64) -> Result<u32> {
        let at = self.entry_at(table, index)?;
        self.read_u32(at + field)
    }

    pub(crate) fn set_entry_word(&mut self, table: Table, index: usize, field: u64, value: u32) -> Result<()> {
        let at = self.entry_at(table, index)?;
        self.write_u32(at + field, value)
    }

    /// Reads a whole entry into `raw`.
    pub(super) fn read_entry<T: pod::Pod>(&mut self, table: Table, index: usize, raw: &mut T) -> Result<()> {
        let at = self.entry_at(table, index)?;
        self.file.read_at(at, pod::bytes_of_mut(raw))
    }

    pub(super) fn write_entry<T: pod::Pod>(&mut self, table: Table, index: usize, raw: &T) -> Result<()> {
        let at = self.entry_at(table, index)?;
        self.file.write_at(at, pod::bytes_of(raw))
    }

    /// Inserts one zeroed entry after the last entry of `table`, placing the
    /// table at the end of the file if it has none yet. Returns the new index.
    ///
    /// The entry is zeroed while the file moves around it; the caller fills it
    /// in once every offset has settled.
    pub(crate) fn append_entry(&mut self, table: Table) -> Result<usize> {
        let count = self.table_count(table)?;
        let size = table.entry_size();
        let at = if count == 0 {
            self.file.len()?
        } else {
            u64::from(self.table_base(table)?) + count as u64 * size
        };

        self.insert_zeroes(at, size)?;
        if count == 0 {
            self.set_table_base(table, narrow(at)?)?;
        }
        self.set_table_count(table, count + 1)?;
        Ok(count)
    }

    /// Deletes entry `index` from `table`. The count drops before the bytes
    /// move so the relocation pass never reads the departing entry.
    pub(crate) fn remove_entry(&mut self, table: Table, index: usize) -> Result<()> {
        let at = self.entry_at(table, index)?;
        let remaining = self.table_count(table)? - 1;
        self.set_table_count(table, remaining)?;
        if remaining == 0 {
            self.set_table_base(table, 0)?;
        }
        self.remove(at, table.entry_size())?;
        Ok(())
    }

    /// True if any program or section entry records `offset` as its data.
    pub(crate) fn is_referenced(&mut self, offset: u32) -> Result<bool> {
        for table in Table::ALL {
            for index in 0..self.table_count(table)? {
                if self.entry_word(table, index, table.offset_field())? == offset {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }
}
