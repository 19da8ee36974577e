//! DOL container editing.
//!
//! A DOL file starts with a fixed 0x100 byte big-endian header describing up
//! to seven text and eleven data sections, one bss range and the entry point.
//! Section data follows the header in any order, each section padded to a
//! multiple of 32 bytes.

use std::fmt;
use std::fs::File;
use std::io::{Read, Take, Write};
use std::path::Path;

use object::endian::{BigEndian, Endian};

use crate::container::{ByteFile, Container};
use crate::error::{Error, Result};
use crate::storage::Storage;
use crate::utils::{align_up, relocate};

/// Size of the DOL header in bytes.
pub const HEADER_SIZE: u64 = 0x100;

/// Section data is always stored in multiples of this many bytes.
pub const SECTION_ALIGN: u32 = 32;

const TEXT_SLOTS: usize = 7;
const DATA_SLOTS: usize = 11;
const ALL_SLOTS: u64 = (TEXT_SLOTS + DATA_SLOTS) as u64;

const OFFSETS_AT: u64 = 0;
const ADDRESSES_AT: u64 = ALL_SLOTS * 4;
const SIZES_AT: u64 = ALL_SLOTS * 8;
const BSS_ADDRESS_AT: u64 = ALL_SLOTS * 12;
const BSS_SIZE_AT: u64 = BSS_ADDRESS_AT + 4;
const ENTRY_POINT_AT: u64 = BSS_ADDRESS_AT + 8;

/// The two families of DOL section slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionKind {
    Text,
    Data,
}

impl SectionKind {
    pub const ALL: [SectionKind; 2] = [SectionKind::Text, SectionKind::Data];

    /// Number of slots the header reserves for this kind.
    pub const fn max_slots(self) -> usize {
        match self {
            SectionKind::Text => TEXT_SLOTS,
            SectionKind::Data => DATA_SLOTS,
        }
    }

    /// Position of this kind's first slot within each header column.
    const fn first_slot(self) -> u64 {
        match self {
            SectionKind::Text => 0,
            SectionKind::Data => TEXT_SLOTS as u64,
        }
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SectionKind::Text => f.write_str("text"),
            SectionKind::Data => f.write_str("data"),
        }
    }
}

/// One section descriptor as recorded in the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Slot {
    pub offset: u32,
    pub address: u32,
    pub size: u32,
}

impl Slot {
    /// A slot describes a section when its file offset is set.
    pub fn is_valid(&self) -> bool {
        self.offset != 0 && self.offset != u32::MAX
    }

    fn contains_address(&self, address: u32) -> bool {
        address >= self.address && u64::from(address) < u64::from(self.address) + u64::from(self.size)
    }

    fn contains_offset(&self, offset: u32) -> bool {
        offset >= self.offset && u64::from(offset) < u64::from(self.offset) + u64::from(self.size)
    }
}

/// An open DOL file.
#[derive(Debug)]
pub struct DolFile<S: Storage = File> {
    file: ByteFile<S>,
}

impl DolFile<File> {
    /// Creates a DOL file with an empty header, replacing any existing file.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        Self::init(ByteFile::create(path)?)
    }

    /// Opens an existing DOL file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::attach(ByteFile::open(path)?)
    }
}

impl<S: Storage> DolFile<S> {
    /// Writes an empty header into `store` and wraps it.
    pub fn create_in(store: S) -> Result<Self> {
        Self::init(ByteFile::from_store(store))
    }

    /// Wraps a store that already holds a DOL image.
    pub fn open_in(store: S) -> Result<Self> {
        Self::attach(ByteFile::from_store(store))
    }

    /// Writes an empty header into an already open container.
    pub fn init(mut file: ByteFile<S>) -> Result<Self> {
        file.store()?.truncate(0)?;
        file.write_zeroes(0, HEADER_SIZE)?;
        Ok(Self { file })
    }

    /// Wraps an already open container holding a DOL image.
    pub fn attach(mut file: ByteFile<S>) -> Result<Self> {
        if file.len()? < HEADER_SIZE {
            return Err(Error::ShortIo {
                offset: 0,
                expected: HEADER_SIZE,
            });
        }
        Ok(Self { file })
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

    fn read_word(&mut self, at: u64) -> Result<u32> {
        let mut buf = [0u8; 4];
        self.file.read_at(at, &mut buf)?;
        Ok(BigEndian.read_u32_bytes(buf))
    }

    fn write_word(&mut self, at: u64, value: u32) -> Result<()> {
        self.file.write_at(at, &BigEndian.write_u32_bytes(value))
    }

    fn slot_field(&self, column: u64, kind: SectionKind, index: usize) -> Result<u64> {
        if !self.file.is_open() {
            return Err(Error::NotOpen);
        }
        if index >= kind.max_slots() {
            return Err(Error::IndexOutOfRange {
                index,
                limit: kind.max_slots(),
            });
        }
        Ok(column + (kind.first_slot() + index as u64) * 4)
    }

    /// Reads all three fields of a slot.
    pub fn slot(&mut self, kind: SectionKind, index: usize) -> Result<Slot> {
        Ok(Slot {
            offset: self.offset(kind, index)?,
            address: self.address(kind, index)?,
            size: self.size(kind, index)?,
        })
    }

    pub fn offset(&mut self, kind: SectionKind, index: usize) -> Result<u32> {
        let at = self.slot_field(OFFSETS_AT, kind, index)?;
        self.read_word(at)
    }

    pub fn address(&mut self, kind: SectionKind, index: usize) -> Result<u32> {
        let at = self.slot_field(ADDRESSES_AT, kind, index)?;
        self.read_word(at)
    }

    pub fn size(&mut self, kind: SectionKind, index: usize) -> Result<u32> {
        let at = self.slot_field(SIZES_AT, kind, index)?;
        self.read_word(at)
    }

    pub fn set_offset(&mut self, kind: SectionKind, index: usize, offset: u32) -> Result<()> {
        let at = self.slot_field(OFFSETS_AT, kind, index)?;
        self.write_word(at, offset)
    }

    pub fn set_address(&mut self, kind: SectionKind, index: usize, address: u32) -> Result<()> {
        let at = self.slot_field(ADDRESSES_AT, kind, index)?;
        self.write_word(at, address)
    }

    pub fn set_size(&mut self, kind: SectionKind, index: usize, size: u32) -> Result<()> {
        let at = self.slot_field(SIZES_AT, kind, index)?;
        self.write_word(at, size)
    }

    fn set_slot(&mut self, kind: SectionKind, index: usize, slot: Slot) -> Result<()> {
        self.set_address(kind, index, slot.address)?;
        self.set_offset(kind, index, slot.offset)?;
        self.set_size(kind, index, slot.size)
    }

    pub fn is_valid(&mut self, kind: SectionKind, index: usize) -> Result<bool> {
        Ok(Slot {
            offset: self.offset(kind, index)?,
            ..Slot::default()
        }
        .is_valid())
    }

    /// Number of occupied slots of `kind`.
    pub fn count_valid(&mut self, kind: SectionKind) -> Result<usize> {
        let mut count = 0;
        for index in 0..kind.max_slots() {
            if self.is_valid(kind, index)? {
                count += 1;
            }
        }
        Ok(count)
    }

    /// Occupied slots of `kind` with their slot indices.
    pub fn valid_slots(&mut self, kind: SectionKind) -> Result<Vec<(usize, Slot)>> {
        let mut slots = Vec::new();
        for index in 0..kind.max_slots() {
            let slot = self.slot(kind, index)?;
            if slot.is_valid() {
                slots.push((index, slot));
            }
        }
        Ok(slots)
    }

    fn all_valid_slots(&mut self) -> Result<Vec<(SectionKind, usize, Slot)>> {
        let mut slots = Vec::new();
        for kind in SectionKind::ALL {
            for (index, slot) in self.valid_slots(kind)? {
                slots.push((kind, index, slot));
            }
        }
        Ok(slots)
    }

    pub fn entry_point(&mut self) -> Result<u32> {
        self.read_word(ENTRY_POINT_AT)
    }

    pub fn set_entry_point(&mut self, address: u32) -> Result<()> {
        self.write_word(ENTRY_POINT_AT, address)
    }

    pub fn bss_address(&mut self) -> Result<u32> {
        self.read_word(BSS_ADDRESS_AT)
    }

    pub fn set_bss_address(&mut self, address: u32) -> Result<()> {
        self.write_word(BSS_ADDRESS_AT, address)
    }

    pub fn bss_size(&mut self) -> Result<u32> {
        self.read_word(BSS_SIZE_AT)
    }

    pub fn set_bss_size(&mut self, size: u32) -> Result<()> {
        self.write_word(BSS_SIZE_AT, size)
    }

    /// Lowest load address of any text or data section. Bss is not counted.
    pub fn lowest_address(&mut self) -> Result<u32> {
        self.all_valid_slots()?
            .into_iter()
            .map(|(_, _, slot)| slot.address)
            .min()
            .ok_or(Error::NoSections)
    }

    /// Highest load address of any text or data section. Bss is not counted.
    pub fn highest_address(&mut self) -> Result<u32> {
        self.all_valid_slots()?
            .into_iter()
            .map(|(_, _, slot)| slot.address)
            .max()
            .ok_or(Error::NoSections)
    }

    /// Maps a load address to the file offset holding it.
    pub fn address_to_offset(&mut self, address: u32) -> Result<u32> {
        let (_, _, slot) = self
            .all_valid_slots()?
            .into_iter()
            .find(|(_, _, slot)| slot.contains_address(address))
            .ok_or(Error::Unmapped(address))?;
        let delta = address - slot.address;
        slot.offset
            .checked_add(delta)
            .ok_or(Error::InvalidOffset(i64::from(slot.offset) + i64::from(delta)))
    }

    /// Maps a file offset to the load address it is copied to.
    pub fn offset_to_address(&mut self, offset: u32) -> Result<u32> {
        let (_, _, slot) = self
            .all_valid_slots()?
            .into_iter()
            .find(|(_, _, slot)| slot.contains_offset(offset))
            .ok_or(Error::Unmapped(offset))?;
        slot.address
            .checked_add(offset - slot.offset)
            .ok_or(Error::Unmapped(offset))
    }

    fn occupied_slot(&mut self, kind: SectionKind, index: usize) -> Result<Slot> {
        let slot = self.slot(kind, index)?;
        if !slot.is_valid() {
            return Err(Error::EmptySlot { kind, index });
        }
        Ok(slot)
    }

    /// Streams a section's bytes (including padding) to `sink`.
    pub fn extract_section<W: Write + ?Sized>(&mut self, kind: SectionKind, index: usize, sink: &mut W) -> Result<u64> {
        let slot = self.occupied_slot(kind, index)?;
        self.file
            .copy_out(u64::from(slot.offset), u64::from(slot.size), sink)
    }

    /// Lends a reader over a section's bytes.
    pub fn section_reader(&mut self, kind: SectionKind, index: usize) -> Result<Take<&mut S>> {
        let slot = self.occupied_slot(kind, index)?;
        self.file
            .range_reader(u64::from(slot.offset), u64::from(slot.size))
    }

    /// Stores `size` bytes from `source` as section `index`, replacing whatever
    /// the slot held. The data goes at the end of the file and is zero padded
    /// to a multiple of 32 bytes; the padded size is returned. The slot is
    /// only written once the data is in place.
    pub fn insert_section<R: Read + ?Sized>(
        &mut self,
        kind: SectionKind,
        index: usize,
        source: &mut R,
        address: u32,
        size: u32,
    ) -> Result<u32> {
        if self.is_valid(kind, index)? {
            self.remove_section(kind, index)?;
        }

        let padded = align_up(size, SECTION_ALIGN).ok_or(Error::InvalidOffset(i64::from(size)))?;
        let end = self.file.len()?;
        let offset = u32::try_from(end).map_err(|_| Error::InvalidOffset(end as i64))?;

        let copied = self
            .file
            .copy_in(end, u64::from(size), source)
            .and_then(|_| self.file.write_zeroes(end + u64::from(size), u64::from(padded - size)));
        if let Err(err) = copied {
            self.file.store()?.truncate(end)?;
            return Err(err);
        }
        self.set_slot(kind, index, Slot { offset, address, size: padded })?;

        tracing::debug!(%kind, index, address = format_args!("{address:#010x}"), size = padded, "inserted section");
        Ok(padded)
    }

    /// Stores a new section in the first free slot of `kind`.
    pub fn add_section<R: Read + ?Sized>(
        &mut self,
        kind: SectionKind,
        source: &mut R,
        address: u32,
        size: u32,
    ) -> Result<u32> {
        let mut free = None;
        for index in 0..kind.max_slots() {
            if !self.is_valid(kind, index)? {
                free = Some(index);
                break;
            }
        }
        let index = free.ok_or(Error::NoFreeSlot(kind))?;
        self.insert_section(kind, index, source, address, size)
    }

    /// Clears a slot and deletes its bytes from the file.
    pub fn remove_section(&mut self, kind: SectionKind, index: usize) -> Result<()> {
        let slot = self.occupied_slot(kind, index)?;
        self.remove(u64::from(slot.offset), u64::from(slot.size))?;
        self.set_slot(kind, index, Slot::default())?;
        tracing::debug!(%kind, index, "removed section");
        Ok(())
    }

    /// Removes every section of `kind`. All slots are attempted; the first
    /// failure is reported.
    pub fn remove_all_of(&mut self, kind: SectionKind) -> Result<()> {
        let mut outcome = Ok(());
        for index in 0..kind.max_slots() {
            let removed = match self.is_valid(kind, index) {
                Ok(true) => self.remove_section(kind, index),
                Ok(false) => continue,
                Err(err) => Err(err),
            };
            if let Err(err) = removed {
                tracing::warn!(%kind, index, %err, "failed to remove section");
                if outcome.is_ok() {
                    outcome = Err(err);
                }
            }
        }
        outcome
    }

    /// Removes every text and data section.
    pub fn remove_all(&mut self) -> Result<()> {
        let text = self.remove_all_of(SectionKind::Text);
        let data = self.remove_all_of(SectionKind::Data);
        text.and(data)
    }
}

impl<S: Storage> Container for DolFile<S> {
    type Store = S;

    fn bytes(&mut self) -> &mut ByteFile<S> {
        &mut self.file
    }

    fn shift(&mut self, from: u64, delta: i64) -> Result<()> {
        self.file.shift_bytes(from, delta)?;
        for (kind, index, slot) in self.all_valid_slots()? {
            let offset = u64::from(slot.offset);
            if offset >= from {
                let moved = relocate(offset, delta)
                    .and_then(|o| u32::try_from(o).ok())
                    .ok_or(Error::InvalidOffset(offset as i64 + delta))?;
                self.set_offset(kind, index, moved)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    type MemDol = DolFile<Cursor<Vec<u8>>>;

    fn empty() -> MemDol {
        DolFile::create_in(Cursor::new(Vec::new())).unwrap()
    }

    fn add(dol: &mut MemDol, kind: SectionKind, fill: u8, address: u32, size: u32) -> u32 {
        let data = vec![fill; size as usize];
        dol.add_section(kind, &mut &data[..], address, size).unwrap()
    }

    #[test]
    fn create_writes_zeroed_header() {
        let mut dol = empty();
        assert_eq!(dol.bytes().len().unwrap(), HEADER_SIZE);
        assert_eq!(dol.count_valid(SectionKind::Text).unwrap(), 0);
        assert_eq!(dol.count_valid(SectionKind::Data).unwrap(), 0);
        assert_eq!(dol.entry_point().unwrap(), 0);
    }

    #[test]
    fn header_fields_land_at_fixed_positions() {
        let mut dol = empty();
        add(&mut dol, SectionKind::Data, 1, 0x8000_5000, 32);
        dol.set_bss_address(0x8010_0000).unwrap();
        dol.set_bss_size(0x40).unwrap();
        dol.set_entry_point(0x8000_3100).unwrap();
        let image = dol.into_store().unwrap().into_inner();

        let word = |at: usize| u32::from_be_bytes(image[at..at + 4].try_into().unwrap());
        assert_eq!(word(0x1C), 0x100);
        assert_eq!(word(0x64), 0x8000_5000);
        assert_eq!(word(0xAC), 32);
        assert_eq!(word(0xD8), 0x8010_0000);
        assert_eq!(word(0xDC), 0x40);
        assert_eq!(word(0xE0), 0x8000_3100);
    }

    #[test]
    fn sections_are_padded_to_32_bytes() {
        let mut dol = empty();
        assert_eq!(add(&mut dol, SectionKind::Text, 0xAA, 0x8000_4000, 40), 64);
        let slot = dol.slot(SectionKind::Text, 0).unwrap();
        assert_eq!(slot.size, 64);

        let mut out = Vec::new();
        dol.extract_section(SectionKind::Text, 0, &mut out).unwrap();
        assert!(out[..40].iter().all(|&b| b == 0xAA));
        assert!(out[40..].iter().all(|&b| b == 0));
    }

    #[test]
    fn address_and_offset_conversions_invert() {
        let mut dol = empty();
        add(&mut dol, SectionKind::Text, 1, 0x8000_4000, 64);
        add(&mut dol, SectionKind::Data, 2, 0x8000_8000, 32);
        for offset in [0x100u32, 0x13F, 0x140, 0x15F] {
            let address = dol.offset_to_address(offset).unwrap();
            assert_eq!(dol.address_to_offset(address).unwrap(), offset);
        }
        assert!(matches!(dol.address_to_offset(0x9000_0000), Err(Error::Unmapped(_))));
    }

    #[test]
    fn removing_a_section_rehomes_later_offsets() {
        let mut dol = empty();
        add(&mut dol, SectionKind::Text, 1, 0x8000_4000, 64);
        add(&mut dol, SectionKind::Data, 2, 0x8000_8000, 32);
        dol.remove_section(SectionKind::Text, 0).unwrap();

        assert!(!dol.is_valid(SectionKind::Text, 0).unwrap());
        assert_eq!(dol.offset(SectionKind::Data, 0).unwrap(), 0x100);
        assert_eq!(dol.bytes().len().unwrap(), HEADER_SIZE + 32);
        let mut out = Vec::new();
        dol.extract_section(SectionKind::Data, 0, &mut out).unwrap();
        assert_eq!(out, vec![2u8; 32]);
    }

    #[test]
    fn insert_replaces_an_occupied_slot() {
        let mut dol = empty();
        add(&mut dol, SectionKind::Text, 1, 0x8000_4000, 64);
        let data = [7u8; 32];
        dol.insert_section(SectionKind::Text, 0, &mut &data[..], 0x8000_6000, 32)
            .unwrap();
        assert_eq!(dol.count_valid(SectionKind::Text).unwrap(), 1);
        assert_eq!(dol.address(SectionKind::Text, 0).unwrap(), 0x8000_6000);
        assert_eq!(dol.bytes().len().unwrap(), HEADER_SIZE + 32);
    }

    #[test]
    fn add_fails_once_every_slot_is_used() {
        let mut dol = empty();
        for i in 0..SectionKind::Text.max_slots() as u32 {
            add(&mut dol, SectionKind::Text, 0, 0x8000_0000 + i * 0x100, 32);
        }
        let data = [0u8; 32];
        let err = dol
            .add_section(SectionKind::Text, &mut &data[..], 0x8100_0000, 32)
            .unwrap_err();
        assert!(matches!(err, Error::NoFreeSlot(SectionKind::Text)));
    }

    #[test]
    fn bounds_ignore_bss_and_report_empty_files() {
        let mut dol = empty();
        dol.set_bss_address(0x8000_0000).unwrap();
        assert!(matches!(dol.lowest_address(), Err(Error::NoSections)));
        add(&mut dol, SectionKind::Data, 0, 0x8000_9000, 32);
        add(&mut dol, SectionKind::Text, 0, 0x8000_4000, 32);
        assert_eq!(dol.lowest_address().unwrap(), 0x8000_4000);
        assert_eq!(dol.highest_address().unwrap(), 0x8000_9000);
    }

    #[test]
    fn remove_all_clears_every_slot() {
        let mut dol = empty();
        add(&mut dol, SectionKind::Text, 1, 0x8000_4000, 32);
        add(&mut dol, SectionKind::Text, 2, 0x8000_5000, 32);
        add(&mut dol, SectionKind::Data, 3, 0x8000_6000, 32);
        dol.remove_all().unwrap();
        assert_eq!(dol.count_valid(SectionKind::Text).unwrap(), 0);
        assert_eq!(dol.count_valid(SectionKind::Data).unwrap(), 0);
        assert_eq!(dol.bytes().len().unwrap(), HEADER_SIZE);
    }

    #[test]
    fn out_of_range_and_empty_slots_are_rejected() {
        let mut dol = empty();
        assert!(matches!(
            dol.address(SectionKind::Text, 7),
            Err(Error::IndexOutOfRange { index: 7, limit: 7 })
        ));
        let mut sink = Vec::new();
        assert!(matches!(
            dol.extract_section(SectionKind::Data, 0, &mut sink),
            Err(Error::EmptySlot { .. })
        ));
        dol.close().unwrap();
        assert!(matches!(dol.entry_point(), Err(Error::NotOpen)));
    }

    #[test]
    fn lookups_reject_offsets_past_u32() {
        let mut dol = empty();
        dol.set_offset(SectionKind::Text, 0, 0xFFFF_FFF0).unwrap();
        dol.set_address(SectionKind::Text, 0, 0x8000_0000).unwrap();
        dol.set_size(SectionKind::Text, 0, 0x100).unwrap();
        assert!(matches!(dol.address_to_offset(0x8000_0020), Err(Error::InvalidOffset(_))));
        assert_eq!(dol.address_to_offset(0x8000_0008).unwrap(), 0xFFFF_FFF8);

        dol.set_offset(SectionKind::Text, 0, 0x100).unwrap();
        dol.set_address(SectionKind::Text, 0, 0xFFFF_FFC0).unwrap();
        assert!(matches!(dol.offset_to_address(0x180), Err(Error::Unmapped(0x180))));
        assert_eq!(dol.offset_to_address(0x108).unwrap(), 0xFFFF_FFC8);
    }

    #[test]
    fn short_source_leaves_slot_empty() {
        let mut dol = empty();
        let data = [9u8; 16];
        let err = dol
            .insert_section(SectionKind::Data, 2, &mut &data[..], 0x8000_7000, 64)
            .unwrap_err();
        assert!(matches!(err, Error::ShortIo { .. }));
        assert!(!dol.is_valid(SectionKind::Data, 2).unwrap());
        assert_eq!(dol.bytes().len().unwrap(), HEADER_SIZE);
    }

    #[test]
    fn failed_removal_keeps_the_slot() {
        let mut dol = empty();
        dol.set_offset(SectionKind::Text, 1, 0x1_0000).unwrap();
        dol.set_address(SectionKind::Text, 1, 0x8000_4000).unwrap();
        dol.set_size(SectionKind::Text, 1, 0x20).unwrap();
        assert!(dol.remove_section(SectionKind::Text, 1).is_err());
        assert!(dol.is_valid(SectionKind::Text, 1).unwrap());
        assert_eq!(dol.offset(SectionKind::Text, 1).unwrap(), 0x1_0000);
    }

    #[test]
    fn remove_all_continues_past_a_broken_slot() {
        let mut dol = empty();
        add(&mut dol, SectionKind::Text, 1, 0x8000_4000, 32);
        dol.set_offset(SectionKind::Text, 1, 0x1_0000).unwrap();
        dol.set_address(SectionKind::Text, 1, 0x8000_5000).unwrap();
        dol.set_size(SectionKind::Text, 1, 0x20).unwrap();
        add(&mut dol, SectionKind::Data, 2, 0x8000_6000, 32);

        assert!(dol.remove_all().is_err());
        assert!(!dol.is_valid(SectionKind::Text, 0).unwrap());
        assert!(dol.is_valid(SectionKind::Text, 1).unwrap());
        assert_eq!(dol.count_valid(SectionKind::Text).unwrap(), 1);
        assert_eq!(dol.count_valid(SectionKind::Data).unwrap(), 0);
        assert_eq!(dol.bytes().len().unwrap(), HEADER_SIZE);
    }
}
