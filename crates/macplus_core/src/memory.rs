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

    memory.rs

    RAM, ROM and the boot-time overlay.

    The composer creates the RAM and ROM blocks, their overlay clones and the chip
    register windows, and flips the overlay. The clones mirror the storage of the
    block they shadow, so a disabled clone always matches its live counterpart.
*/
use crate::{
    bus::{
        AddressSpace, BlockId, MemBlock, RegisterWindow, IWM_ADDRESS, IWM_SIZE, SCC_ADDRESS, SCC_SIZE, SCSI_ADDRESS,
        SCSI_SIZE, VIA_ADDRESS, VIA_SIZE,
    },
    error::MemError,
    machine_config::{MachineConfig, VIDEO_HEIGHT, VIDEO_WIDTH},
    machine_types::MacModel,
};

pub const RAM_CLONE_ADDRESS: u32 = 0x0060_0000;
pub const RAM_CLONE_MAX_SIZE: u32 = 0x0020_0000;
pub const ROM_CLONE_ADDRESS: u32 = 0;

/// Bytes in one 1bpp frame.
pub const FRAME_SIZE: usize = (VIDEO_WIDTH / 8 * VIDEO_HEIGHT) as usize;

const VIDEO_BUFFER_OFFSET: u32 = 0x5900;
const VIDEO_ALT_OFFSET: u32 = 0x8000;
const SOUND_BUFFER_OFFSET: u32 = 0x300;
const SOUND_ALT_OFFSET: u32 = 0x5C00;

const MEMTEST_PATCH_PLUS: (u32, u32) = (0x02AE, 0x0040_0000);
const MEMTEST_PATCH_SE: (u32, u32) = (0x0CFC, 0x574C_5343);

/// Video and sound buffer addresses, derived from the top of RAM.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct BufferLayout {
    pub vbuf1: u32,
    pub vbuf2: u32,
    pub sbuf1: u32,
    pub sbuf2: u32,
}

impl BufferLayout {
    pub fn from_ram_size(ram_size: u32) -> Self {
        let vbuf1 = ram_size.checked_sub(VIDEO_BUFFER_OFFSET).unwrap_or(0);
        let vbuf2 = if vbuf1 >= VIDEO_ALT_OFFSET {
            vbuf1 - VIDEO_ALT_OFFSET
        }
        else {
            vbuf1
        };
        let sbuf1 = ram_size.checked_sub(SOUND_BUFFER_OFFSET).unwrap_or(0);
        let sbuf2 = sbuf1.wrapping_sub(SOUND_ALT_OFFSET);
        Self {
            vbuf1,
            vbuf2,
            sbuf1,
            sbuf2,
        }
    }

    pub fn video(&self, main: bool) -> u32 {
        if main {
            self.vbuf1
        }
        else {
            self.vbuf2
        }
    }

    pub fn sound(&self, main: bool) -> u32 {
        if main {
            self.sbuf1
        }
        else {
            self.sbuf2
        }
    }
}

#[derive(Default)]
pub struct MemoryComposer {
    ram: Option<BlockId>,
    rom: Option<BlockId>,
    ram_clone: Option<BlockId>,
    rom_clone: Option<BlockId>,
    overlay: bool,
}

impl MemoryComposer {
    /// Create RAM, ROM and the overlay clones. A missing ROM image or a zero
    /// sized RAM is logged and leaves the block absent.
    pub fn build(space: &mut AddressSpace, config: &MachineConfig, rom_image: Option<Vec<u8>>) -> Self {
        let mut composer = MemoryComposer::default();

        if config.ram.size == 0 {
            log::error!("RAM: size is zero, no RAM block");
        }
        else {
            log::debug!(
                "RAM: addr=0x{:06X} size={}K fill=0x{:02X}",
                config.ram.address,
                config.ram.size / 1024,
                config.ram.fill
            );
            let data = vec![config.ram.fill; config.ram.size as usize];
            composer.ram = Self::add(space, MemBlock::storage("ram", config.ram.address, data, false));
        }

        match rom_image {
            Some(mut image) => {
                log::debug!(
                    "ROM: addr=0x{:06X} size={}K image={} bytes",
                    config.rom.address,
                    config.rom.size / 1024,
                    image.len()
                );
                image.resize(config.rom.size as usize, 0);
                composer.rom = Self::add(space, MemBlock::storage("rom", config.rom.address, image, true));
            }
            None => {
                log::error!("ROM: no image loaded from {}", config.rom.file.display());
            }
        }

        composer.add_clones(space, config);

        if !config.system.memtest {
            log::debug!("RAM: disabling memory test");
            composer.patch_memtest(space, config.system.model);
        }
        composer
    }

    fn add(space: &mut AddressSpace, block: MemBlock) -> Option<BlockId> {
        match space.add_block(block) {
            Ok(id) => Some(id),
            Err(e) => {
                log::error!("{}", e);
                None
            }
        }
    }

    fn add_clones(&mut self, space: &mut AddressSpace, config: &MachineConfig) {
        let (Some(ram), Some(rom)) = (self.ram, self.rom) else {
            log::error!("RAM/ROM: overlay unavailable without both RAM and ROM");
            return;
        };
        if config.ram.address != 0 {
            log::error!("RAM: not found at 000000, overlay unavailable");
            return;
        }
        let ram_clone_size = config.ram.size.min(RAM_CLONE_MAX_SIZE);
        self.ram_clone = Self::add(
            space,
            MemBlock::mirror("ram overlay", RAM_CLONE_ADDRESS, ram_clone_size, ram, false),
        );
        self.rom_clone = Self::add(
            space,
            MemBlock::mirror("rom overlay", ROM_CLONE_ADDRESS, config.rom.size, rom, true),
        );
    }

    /// Map one chip register window at its fixed address.
    pub fn map_window(&self, space: &mut AddressSpace, window: RegisterWindow) {
        let (name, base, size) = match window {
            RegisterWindow::Via => ("via", VIA_ADDRESS, VIA_SIZE),
            RegisterWindow::Scc => ("scc", SCC_ADDRESS, SCC_SIZE),
            RegisterWindow::Scsi => ("scsi", SCSI_ADDRESS, SCSI_SIZE),
            RegisterWindow::Iwm => ("iwm", IWM_ADDRESS, IWM_SIZE),
        };
        log::debug!("{}: addr=0x{:06X} size=0x{:06X}", name.to_uppercase(), base, size);
        Self::add(space, MemBlock::registers(name, base, size, window));
    }

    pub fn ram(&self) -> Option<BlockId> {
        self.ram
    }

    pub fn rom(&self) -> Option<BlockId> {
        self.rom
    }

    pub fn overlay(&self) -> bool {
        self.overlay
    }

    pub fn ram_size(&self, space: &AddressSpace) -> u32 {
        self.ram.and_then(|id| space.block(id)).map(|b| b.size).unwrap_or(0)
    }

    /// `len` bytes of RAM at `address`, whether or not the RAM block is
    /// currently live. Falls back to whatever storage maps the address.
    pub fn ram_slice<'a>(&self, space: &'a AddressSpace, address: u32, len: usize) -> Option<&'a [u8]> {
        let from_ram = self.ram.and_then(|id| {
            let base = space.block(id)?.base;
            let offset = address.checked_sub(base)? as usize;
            space.storage(id)?.get(offset..offset + len)
        });
        from_ram.or_else(|| space.slice(address, len))
    }

    /// Swap which block of each ROM/RAM pair is live.
    pub fn set_overlay(&mut self, space: &mut AddressSpace, overlay: bool) -> Result<(), MemError> {
        let (Some(ram), Some(ram_clone), Some(rom_clone)) = (self.ram, self.ram_clone, self.rom_clone) else {
            return Ok(());
        };
        if overlay == self.overlay {
            return Ok(());
        }
        log::trace!("overlay: {}", overlay);

        // Disable first so the enable never overlaps.
        if overlay {
            space.set_enabled(ram, false)?;
            space.set_enabled(rom_clone, true)?;
            space.set_enabled(ram_clone, true)?;
        }
        else {
            space.set_enabled(rom_clone, false)?;
            space.set_enabled(ram_clone, false)?;
            space.set_enabled(ram, true)?;
        }
        self.overlay = overlay;
        Ok(())
    }

    /// Reset-time memory setup: overlay on for machines that boot through it,
    /// otherwise overlay off with the boot vectors copied from ROM into RAM.
    pub fn reset(&mut self, space: &mut AddressSpace, model: MacModel) -> Result<(), MemError> {
        if model.has_overlay() {
            return self.set_overlay(space, true);
        }
        self.set_overlay(space, false)?;

        let vectors = self
            .rom
            .and_then(|id| space.storage(id))
            .filter(|rom| rom.len() >= 8)
            .map(|rom| {
                (
                    u32::from_be_bytes([rom[0], rom[1], rom[2], rom[3]]),
                    u32::from_be_bytes([rom[4], rom[5], rom[6], rom[7]]),
                )
            });
        if let Some((ssp, pc)) = vectors {
            space.poke_u32_be(0, ssp);
            space.poke_u32_be(4, pc);
        }
        Ok(())
    }

    /// Skip the ROM memory test by pre-setting the value it checks.
    pub fn patch_memtest(&self, space: &mut AddressSpace, model: MacModel) {
        let (address, value) = match model {
            MacModel::Plus => MEMTEST_PATCH_PLUS,
            MacModel::Se | MacModel::Classic => MEMTEST_PATCH_SE,
        };
        if !space.poke_u32_be(address, value) {
            log::debug!("RAM: memory test patch at 0x{:04X} not applied", address);
        }
    }

    /// Fill the main frame with white.
    pub fn clear_frame(&self, space: &mut AddressSpace, buffers: &BufferLayout) {
        for i in 0..FRAME_SIZE as u32 {
            space.poke_u8(buffers.vbuf1.wrapping_add(i), 0xFF);
        }
    }
}
