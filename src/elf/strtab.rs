//! Section name string table.

use std::io::{BufRead, BufReader};

use object::elf::{SHN_UNDEF, SHT_STRTAB};

use super::{narrow, ElfFile, SectionHeader, E_SHSTRNDX};
use crate::container::Container;
use crate::error::{Error, Result};
use crate::storage::Storage;

use super::table::Table;

/// Leading bytes of a fresh table: the empty name and the table's own name.
const SHSTRTAB: &[u8] = b"\0.shstrtab\0";

impl<S: Storage> ElfFile<S> {
    /// Index of the section holding section names, if there is one.
    pub fn string_table_index(&mut self) -> Result<Option<usize>> {
        let index = self.read_u16(E_SHSTRNDX)?;
        Ok((index != SHN_UNDEF).then_some(usize::from(index)))
    }

    pub fn set_string_table_index(&mut self, index: Option<usize>) -> Result<()> {
        let raw = match index {
            Some(index) => u16::try_from(index).map_err(|_| Error::IndexOutOfRange {
                index,
                limit: usize::from(u16::MAX),
            })?,
            None => SHN_UNDEF,
        };
        self.write_u16(E_SHSTRNDX, raw)
    }

    /// Appends `name` to the string table and returns its offset within the
    /// table. The table (and its section entry) is created on first use.
    pub fn add_string(&mut self, name: &str) -> Result<u32> {
        let Some(index) = self.string_table_index()? else {
            return self
                .create_string_table(name)
                .map_err(|source| Error::TableBootstrap {
                    what: "section name string table",
                    source: Box::new(source),
                });
        };

        let base = self.section_offset(index)?;
        let size = self.section_size(index)?;
        let bytes = nul_terminated(name);
        let grown = size
            .checked_add(narrow(bytes.len() as u64)?)
            .ok_or(Error::InvalidOffset(i64::from(size)))?;

        self.insert_bytes(u64::from(base) + u64::from(size), &bytes)?;
        // An empty table starts at the insertion point, so the relocation pass
        // has just pushed its own offset past the new string.
        self.set_section_offset(index, base)?;
        self.set_section_size(index, grown)?;
        Ok(size)
    }

    fn create_string_table(&mut self, name: &str) -> Result<u32> {
        if self.table_count(Table::Section)? == 0 {
            self.append_entry(Table::Section)?;
        }

        let mut bytes = SHSTRTAB.to_vec();
        bytes.extend_from_slice(&nul_terminated(name));
        let base = self.bytes().len()?;
        self.insert_bytes(base, &bytes)?;

        let (index, base) = self.with_pinned(base, |elf| elf.append_entry(Table::Section))?;
        let header = SectionHeader {
            name: 1,
            kind: SHT_STRTAB,
            offset: narrow(base)?,
            size: narrow(bytes.len() as u64)?,
            align: 1,
            entry_size: 1,
            ..SectionHeader::default()
        };
        self.write_section(index, &header)?;
        self.set_string_table_index(Some(index))?;

        tracing::debug!(index, offset = base, "created section name string table");
        Ok(SHSTRTAB.len() as u32)
    }

    /// Reads the NUL-terminated string at `offset` within the string table.
    pub fn string(&mut self, offset: u32) -> Result<String> {
        let index = self.string_table_index()?.ok_or(Error::NoStringTable)?;
        let base = u64::from(self.section_offset(index)?);
        let size = self.section_size(index)?;
        if offset >= size {
            return Err(Error::InvalidOffset(i64::from(offset)));
        }

        let reader = self
            .bytes()
            .range_reader(base + u64::from(offset), u64::from(size - offset))?;
        let mut raw = Vec::new();
        BufReader::new(reader).read_until(0, &mut raw)?;
        if raw.last() == Some(&0) {
            raw.pop();
        }
        Ok(String::from_utf8_lossy(&raw).into_owned())
    }

    pub fn section_name(&mut self, index: usize) -> Result<String> {
        let offset = self.section_name_offset(index)?;
        self.string(offset)
    }
}

fn nul_terminated(s: &str) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(s.len() + 1);
    bytes.extend_from_slice(s.as_bytes());
    bytes.push(0);
    bytes
}
