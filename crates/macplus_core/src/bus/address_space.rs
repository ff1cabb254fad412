/*
    MartyPC
    https://github.com/dbalsom/martypc

    Copyright 2022-2025 Daniel Balsom

    Permission is hereby granted, free of charge, to any person obtaining a
    copy of this software and associated documentation files (the “Software”),
    to deal in the Software without restriction, including without limitation
    the rights to use, copy, modify, merge, publish, distribute, sublicense,
    and/or sell copies of the Software, and to permit persons to whom the
    Software is furnished to do so, subject to the following conditions:

    The above copyright notice and this permission notice shall be included in
    all copies or substantial portions of the Software.

    THE SOFTWARE IS PROVIDED “AS IS”, WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
    IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
    FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
    AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
    LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
    FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER
    DEALINGS IN THE SOFTWARE.

    --------------------------------------------------------------------------

    bus::address_space.rs

    The 24-bit address space: an ordered set of named blocks.

    A block is backed by its own storage, by a mirror of another block's storage
    (the overlay clones), or by a chip register window. At most one enabled block
    may cover any address.
*/
use crate::error::MemError;

pub const ADDRESS_MASK: u32 = 0x00FF_FFFF;
pub const ADDRESS_SPACE_SIZE: usize = 0x0100_0000;

// 8K pages. Every chip window is 8K aligned.
const PAGE_SHIFT: u32 = 13;
const PAGE_COUNT: usize = ADDRESS_SPACE_SIZE >> PAGE_SHIFT;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct BlockId(usize);

impl BlockId {
    pub fn index(&self) -> usize {
        self.0
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RegisterWindow {
    Via,
    Scc,
    Scsi,
    Iwm,
}

pub enum Backing {
    Storage(Vec<u8>),
    /// Shares the storage of another block, starting at its first byte.
    Mirror(BlockId),
    Registers(RegisterWindow),
}

pub struct MemBlock {
    pub name: &'static str,
    pub base: u32,
    pub size: u32,
    pub read_only: bool,
    pub enabled: bool,
    pub backing: Backing,
}

impl MemBlock {
    pub fn storage(name: &'static str, base: u32, data: Vec<u8>, read_only: bool) -> Self {
        Self {
            name,
            base,
            size: data.len() as u32,
            read_only,
            enabled: true,
            backing: Backing::Storage(data),
        }
    }

    pub fn mirror(name: &'static str, base: u32, size: u32, of: BlockId, read_only: bool) -> Self {
        Self {
            name,
            base,
            size,
            read_only,
            enabled: false,
            backing: Backing::Mirror(of),
        }
    }

    pub fn registers(name: &'static str, base: u32, size: u32, window: RegisterWindow) -> Self {
        Self {
            name,
            base,
            size,
            read_only: false,
            enabled: true,
            backing: Backing::Registers(window),
        }
    }

    #[inline]
    pub fn contains(&self, address: u32) -> bool {
        address >= self.base && ((address - self.base) as u64) < self.size as u64
    }

    #[inline]
    fn end(&self) -> u64 {
        self.base as u64 + self.size as u64
    }

    fn overlaps(&self, other: &MemBlock) -> bool {
        (self.base as u64) < other.end() && (other.base as u64) < self.end()
    }
}

/// Where an address lands.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Resolved {
    /// Byte `offset` of the storage owned by `owner`.
    Storage { owner: BlockId, offset: usize, read_only: bool },
    Registers(RegisterWindow, u32),
    Unmapped,
}

pub struct AddressSpace {
    blocks:   Vec<MemBlock>,
    page_map: Vec<Option<BlockId>>,
}

impl Default for AddressSpace {
    fn default() -> Self {
        Self::new()
    }
}

impl AddressSpace {
    pub fn new() -> Self {
        Self {
            blocks:   Vec::new(),
            page_map: vec![None; PAGE_COUNT],
        }
    }

    pub fn add_block(&mut self, block: MemBlock) -> Result<BlockId, MemError> {
        if block.size == 0 {
            return Err(MemError::EmptyBlock(block.name));
        }
        if let Backing::Mirror(of) = block.backing {
            if self.blocks.get(of.0).is_none() {
                return Err(MemError::UnknownBlock(of.0));
            }
        }
        if block.enabled {
            self.check_overlap(&block, None)?;
        }
        log::debug!(
            "Adding block '{}' at {:06X} size {:X}{}{}",
            block.name,
            block.base,
            block.size,
            if block.read_only { " ro" } else { "" },
            if block.enabled { "" } else { " (disabled)" }
        );
        let id = BlockId(self.blocks.len());
        let enabled = block.enabled;
        self.blocks.push(block);
        if enabled {
            self.map_block(id);
        }
        Ok(id)
    }

    fn check_overlap(&self, block: &MemBlock, skip: Option<BlockId>) -> Result<(), MemError> {
        for (i, other) in self.blocks.iter().enumerate() {
            if Some(BlockId(i)) == skip || !other.enabled {
                continue;
            }
            if block.overlaps(other) {
                return Err(MemError::Overlap(block.name, block.base, other.name));
            }
        }
        Ok(())
    }

    /// Enable or disable a block. Enabling fails if another enabled block overlaps it.
    pub fn set_enabled(&mut self, id: BlockId, enabled: bool) -> Result<(), MemError> {
        let block = self.blocks.get(id.0).ok_or(MemError::UnknownBlock(id.0))?;
        if block.enabled == enabled {
            return Ok(());
        }
        if enabled {
            self.check_overlap(block, Some(id))?;
        }
        self.blocks[id.0].enabled = enabled;
        self.rebuild_map();
        Ok(())
    }

    pub fn is_enabled(&self, id: BlockId) -> bool {
        self.blocks.get(id.0).map(|b| b.enabled).unwrap_or(false)
    }

    pub fn block(&self, id: BlockId) -> Option<&MemBlock> {
        self.blocks.get(id.0)
    }

    pub fn blocks(&self) -> impl Iterator<Item = (BlockId, &MemBlock)> {
        self.blocks.iter().enumerate().map(|(i, b)| (BlockId(i), b))
    }

    fn map_block(&mut self, id: BlockId) {
        let block = &self.blocks[id.0];
        let first = (block.base >> PAGE_SHIFT) as usize;
        let last = ((block.end() - 1) >> PAGE_SHIFT) as usize;
        for page in first..=last.min(PAGE_COUNT - 1) {
            if self.page_map[page].is_none() {
                self.page_map[page] = Some(id);
            }
        }
    }

    fn rebuild_map(&mut self) {
        self.page_map.iter_mut().for_each(|p| *p = None);
        for i in 0..self.blocks.len() {
            if self.blocks[i].enabled {
                self.map_block(BlockId(i));
            }
        }
    }

    /// The enabled block covering `address`.
    pub fn find(&self, address: u32) -> Option<BlockId> {
        let address = address & ADDRESS_MASK;
        if let Some(id) = self.page_map[(address >> PAGE_SHIFT) as usize] {
            if self.blocks[id.0].contains(address) {
                return Some(id);
            }
        }
        // Pages shared by blocks with unaligned edges.
        self.blocks
            .iter()
            .position(|b| b.enabled && b.contains(address))
            .map(BlockId)
    }

    pub fn resolve(&self, address: u32) -> Resolved {
        let address = address & ADDRESS_MASK;
        let Some(id) = self.find(address) else {
            return Resolved::Unmapped;
        };
        let block = &self.blocks[id.0];
        let offset = address - block.base;
        match block.backing {
            Backing::Storage(_) => Resolved::Storage {
                owner: id,
                offset: offset as usize,
                read_only: block.read_only,
            },
            Backing::Mirror(of) => match &self.blocks[of.0].backing {
                Backing::Storage(data) if (offset as usize) < data.len() => Resolved::Storage {
                    owner: of,
                    offset: offset as usize,
                    read_only: block.read_only,
                },
                _ => Resolved::Unmapped,
            },
            Backing::Registers(window) => Resolved::Registers(window, offset),
        }
    }

    pub fn storage(&self, id: BlockId) -> Option<&[u8]> {
        match &self.blocks.get(id.0)?.backing {
            Backing::Storage(data) => Some(data),
            _ => None,
        }
    }

    pub fn storage_mut(&mut self, id: BlockId) -> Option<&mut [u8]> {
        match &mut self.blocks.get_mut(id.0)?.backing {
            Backing::Storage(data) => Some(data),
            _ => None,
        }
    }

    /// Read a byte from storage. Register windows and holes read as None.
    pub fn peek_u8(&self, address: u32) -> Option<u8> {
        match self.resolve(address) {
            Resolved::Storage { owner, offset, .. } => self.storage(owner).map(|d| d[offset]),
            _ => None,
        }
    }

    /// Write a byte to storage, honoring the read-only flag.
    pub fn poke_u8(&mut self, address: u32, data: u8) -> bool {
        match self.resolve(address) {
            Resolved::Storage {
                owner,
                offset,
                read_only: false,
            } => {
                if let Some(storage) = self.storage_mut(owner) {
                    storage[offset] = data;
                    return true;
                }
                false
            }
            _ => false,
        }
    }

    pub fn poke_u32_be(&mut self, address: u32, data: u32) -> bool {
        data.to_be_bytes()
            .iter()
            .enumerate()
            .fold(true, |ok, (i, b)| self.poke_u8(address.wrapping_add(i as u32), *b) && ok)
    }

    /// Up to `len` contiguous storage bytes starting at `address`, clipped to the end of the block.
    pub fn slice(&self, address: u32, len: usize) -> Option<&[u8]> {
        match self.resolve(address) {
            Resolved::Storage { owner, offset, .. } => {
                let data = self.storage(owner)?;
                let end = offset.saturating_add(len).min(data.len());
                Some(&data[offset..end])
            }
            _ => None,
        }
    }

    /// Copy of the live address range, for comparisons and dumps.
    pub fn snapshot(&self, start: u32, len: usize) -> Vec<Option<u8>> {
        (0..len).map(|i| self.peek_u8(start.wrapping_add(i as u32))).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlap_rejected() {
        let mut space = AddressSpace::new();
        space
            .add_block(MemBlock::storage("ram", 0, vec![0; 0x10000], false))
            .unwrap();
        let err = space
            .add_block(MemBlock::storage("rom", 0x8000, vec![0; 0x10000], true))
            .unwrap_err();
        assert_eq!(err, MemError::Overlap("rom", 0x8000, "ram"));
        assert!(space
            .add_block(MemBlock::storage("rom", 0x10000, vec![0; 0x10000], true))
            .is_ok());
    }

    #[test]
    fn test_mirror_shares_storage() {
        let mut space = AddressSpace::new();
        let ram = space
            .add_block(MemBlock::storage("ram", 0, vec![0; 0x4000], false))
            .unwrap();
        let clone = space
            .add_block(MemBlock::mirror("ram clone", 0x600000, 0x2000, ram, false))
            .unwrap();

        assert!(space.poke_u8(0x10, 0xAA));
        assert_eq!(space.peek_u8(0x600010), None);

        space.set_enabled(clone, true).unwrap();
        assert_eq!(space.peek_u8(0x600010), Some(0xAA));
        assert!(space.poke_u8(0x600011, 0x55));
        assert_eq!(space.peek_u8(0x11), Some(0x55));
        // Past the clone's size.
        assert_eq!(space.peek_u8(0x602000), None);
    }

    #[test]
    fn test_read_only_and_mask() {
        let mut space = AddressSpace::new();
        space
            .add_block(MemBlock::storage("rom", 0x400000, vec![0x12; 0x100], true))
            .unwrap();
        assert!(!space.poke_u8(0x400000, 0));
        assert_eq!(space.peek_u8(0x400000), Some(0x12));
        assert_eq!(space.peek_u8(0xFF400001), Some(0x12));
        assert!(!space.poke_u32_be(0x400000, 0));
    }

    #[test]
    fn test_unaligned_block_edges() {
        let mut space = AddressSpace::new();
        space
            .add_block(MemBlock::storage("a", 0, vec![1; 0x1100], false))
            .unwrap();
        space
            .add_block(MemBlock::storage("b", 0x1100, vec![2; 0x100], false))
            .unwrap();
        assert_eq!(space.peek_u8(0x10FF), Some(1));
        assert_eq!(space.peek_u8(0x1100), Some(2));
        assert_eq!(space.peek_u8(0x1200), None);
        assert_eq!(space.slice(0x10FE, 16).map(|s| s.len()), Some(2));
    }

    #[test]
    fn test_registers_resolve() {
        let mut space = AddressSpace::new();
        space
            .add_block(MemBlock::registers("via", 0xEFE000, 0x2000, RegisterWindow::Via))
            .unwrap();
        assert_eq!(space.resolve(0xEFE1FE), Resolved::Registers(RegisterWindow::Via, 0x1FE));
        assert_eq!(space.resolve(0xF00000), Resolved::Unmapped);
    }
}
