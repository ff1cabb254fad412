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

    bus::mod.rs

    The machine bus.

    MacBus owns the address space and the chips that own register windows in it
    (VIA, SCC, SCSI and IWM). It implements CpuBus, so the CPU sees one flat
    24-bit big-endian memory.
*/
pub mod address_space;

pub use address_space::{AddressSpace, Backing, BlockId, MemBlock, RegisterWindow, Resolved, ADDRESS_MASK};

use crate::device_traits::{CpuBus, Iwm, MmioDevice, Scc, SccChannel, Scsi, Via};

pub const OPEN_BUS_BYTE: u8 = 0xFF;

pub const VIA_ADDRESS: u32 = 0x00EF_E000;
pub const VIA_SIZE: u32 = 16 * 512;
pub const SCC_ADDRESS: u32 = 0x0080_0000;
pub const SCC_SIZE: u32 = 0x0040_0000;
pub const SCSI_ADDRESS: u32 = 0x0058_0000;
pub const SCSI_SIZE: u32 = 0x0008_0000;
pub const IWM_ADDRESS: u32 = 0x00D0_0000;
pub const IWM_SIZE: u32 = 0x0010_0000;

// SCC register decode, relative to SCC_ADDRESS. Reads and writes use separate
// address ranges.
const SCC_READ_CTL_B: u32 = 0x1F_FFF8;
const SCC_READ_CTL_A: u32 = 0x1F_FFFA;
const SCC_READ_DATA_B: u32 = 0x1F_FFFC;
const SCC_READ_DATA_A: u32 = 0x1F_FFFE;
const SCC_WRITE_CTL_B: u32 = 0x3F_FFF9;
const SCC_WRITE_CTL_A: u32 = 0x3F_FFFB;
const SCC_WRITE_DATA_B: u32 = 0x3F_FFFD;
const SCC_WRITE_DATA_A: u32 = 0x3F_FFFF;

#[derive(Default)]
pub struct MacBus {
    space: AddressSpace,
    pub(crate) via: Option<Box<dyn Via>>,
    pub(crate) scc: Option<Box<dyn Scc>>,
    pub(crate) scsi: Option<Box<dyn Scsi>>,
    pub(crate) iwm: Option<Box<dyn Iwm>>,
}

impl MacBus {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn space(&self) -> &AddressSpace {
        &self.space
    }

    pub fn space_mut(&mut self) -> &mut AddressSpace {
        &mut self.space
    }

    fn device(&mut self, window: RegisterWindow) -> Option<&mut dyn MmioDevice> {
        match window {
            RegisterWindow::Via => self.via.as_deref_mut().map(|d| d as &mut dyn MmioDevice),
            RegisterWindow::Scsi => self.scsi.as_deref_mut().map(|d| d as &mut dyn MmioDevice),
            RegisterWindow::Iwm => self.iwm.as_deref_mut().map(|d| d as &mut dyn MmioDevice),
            RegisterWindow::Scc => None,
        }
    }

    fn scc_read(&mut self, offset: u32) -> u8 {
        let Some(scc) = self.scc.as_deref_mut() else {
            return OPEN_BUS_BYTE;
        };
        let val = match offset {
            SCC_READ_CTL_B => scc.ctl(SccChannel::B),
            SCC_READ_CTL_A => scc.ctl(SccChannel::A),
            SCC_READ_DATA_B => scc.data(SccChannel::B),
            SCC_READ_DATA_A => scc.data(SccChannel::A),
            _ => OPEN_BUS_BYTE,
        };
        log::trace!("scc: get  8: {:06X} -> {:02X}", offset, val);
        val
    }

    fn scc_write(&mut self, offset: u32, data: u8) {
        let Some(scc) = self.scc.as_deref_mut() else {
            return;
        };
        log::trace!("scc: set  8: {:06X} <- {:02X}", offset, data);
        match offset {
            SCC_WRITE_CTL_B => scc.set_ctl(SccChannel::B, data),
            SCC_WRITE_CTL_A => scc.set_ctl(SccChannel::A, data),
            SCC_WRITE_DATA_B => scc.set_data(SccChannel::B, data),
            SCC_WRITE_DATA_A => scc.set_data(SccChannel::A, data),
            _ => {}
        }
    }

    fn mmio_read_u8(&mut self, window: RegisterWindow, offset: u32) -> u8 {
        if window == RegisterWindow::Scc {
            return self.scc_read(offset);
        }
        self.device(window)
            .map(|d| d.mmio_read_u8(offset))
            .unwrap_or(OPEN_BUS_BYTE)
    }

    fn mmio_write_u8(&mut self, window: RegisterWindow, offset: u32, data: u8) {
        if window == RegisterWindow::Scc {
            self.scc_write(offset, data);
        }
        else if let Some(d) = self.device(window) {
            d.mmio_write_u8(offset, data);
        }
    }

    /// Storage bytes at `address` if `N` bytes are contiguous in one block.
    fn storage_bytes<const N: usize>(&self, address: u32) -> Option<[u8; N]> {
        match self.space.resolve(address) {
            Resolved::Storage { owner, offset, .. } => {
                let data = self.space.storage(owner)?;
                data.get(offset..offset + N)?.try_into().ok()
            }
            _ => None,
        }
    }

    fn write_storage<const N: usize>(&mut self, address: u32, bytes: [u8; N]) -> bool {
        match self.space.resolve(address) {
            Resolved::Storage {
                owner,
                offset,
                read_only,
            } => {
                if read_only {
                    // Writes to ROM are dropped.
                    return true;
                }
                if let Some(dst) = self.space.storage_mut(owner).and_then(|d| d.get_mut(offset..offset + N)) {
                    dst.copy_from_slice(&bytes);
                    return true;
                }
                false
            }
            _ => false,
        }
    }
}

impl CpuBus for MacBus {
    fn read_u8(&mut self, address: u32) -> u8 {
        let address = address & ADDRESS_MASK;
        match self.space.resolve(address) {
            Resolved::Storage { owner, offset, .. } => self
                .space
                .storage(owner)
                .map(|d| d[offset])
                .unwrap_or(OPEN_BUS_BYTE),
            Resolved::Registers(window, offset) => self.mmio_read_u8(window, offset),
            Resolved::Unmapped => OPEN_BUS_BYTE,
        }
    }

    fn read_u16(&mut self, address: u32) -> u16 {
        let address = address & ADDRESS_MASK;
        if let Some(bytes) = self.storage_bytes::<2>(address) {
            return u16::from_be_bytes(bytes);
        }
        if let Resolved::Registers(window, offset) = self.space.resolve(address) {
            if let Some(d) = self.device(window) {
                return d.mmio_read_u16(offset);
            }
        }
        let hi = self.read_u8(address);
        let lo = self.read_u8(address.wrapping_add(1));
        u16::from_be_bytes([hi, lo])
    }

    fn read_u32(&mut self, address: u32) -> u32 {
        let address = address & ADDRESS_MASK;
        if let Some(bytes) = self.storage_bytes::<4>(address) {
            return u32::from_be_bytes(bytes);
        }
        if let Resolved::Registers(window, offset) = self.space.resolve(address) {
            if let Some(d) = self.device(window) {
                return d.mmio_read_u32(offset);
            }
        }
        let hi = self.read_u16(address);
        let lo = self.read_u16(address.wrapping_add(2));
        (hi as u32) << 16 | lo as u32
    }

    fn write_u8(&mut self, address: u32, data: u8) {
        let address = address & ADDRESS_MASK;
        match self.space.resolve(address) {
            Resolved::Storage { .. } => {
                self.write_storage(address, [data]);
            }
            Resolved::Registers(window, offset) => self.mmio_write_u8(window, offset, data),
            Resolved::Unmapped => {}
        }
    }

    fn write_u16(&mut self, address: u32, data: u16) {
        let address = address & ADDRESS_MASK;
        if self.write_storage(address, data.to_be_bytes()) {
            return;
        }
        if let Resolved::Registers(window, offset) = self.space.resolve(address) {
            if let Some(d) = self.device(window) {
                d.mmio_write_u16(offset, data);
                return;
            }
        }
        let [hi, lo] = data.to_be_bytes();
        self.write_u8(address, hi);
        self.write_u8(address.wrapping_add(1), lo);
    }

    fn write_u32(&mut self, address: u32, data: u32) {
        let address = address & ADDRESS_MASK;
        if self.write_storage(address, data.to_be_bytes()) {
            return;
        }
        if let Resolved::Registers(window, offset) = self.space.resolve(address) {
            if let Some(d) = self.device(window) {
                d.mmio_write_u32(offset, data);
                return;
            }
        }
        self.write_u16(address, (data >> 16) as u16);
        self.write_u16(address.wrapping_add(2), data as u16);
    }
}
