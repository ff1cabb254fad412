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

    device_traits::mod.rs

    Traits for the external collaborators the machine owns.

    The core wires these chips together but does not implement their register
    level behavior. Every chip is optional; a missing chip is a silent no-op.
*/
pub mod chips;
pub mod cpu;
pub mod disk;
pub mod terminal;

pub use chips::*;
pub use cpu::{Cpu, CpuBus};
pub use disk::{DiskImage, DiskSet, SharedDisks};
pub use terminal::Terminal;

/// Byte/word/long register access within a chip's memory window. Offsets are
/// relative to the window base. Wider accesses are composed big-endian from
/// byte accesses unless a chip overrides them.
pub trait MmioDevice {
    fn mmio_read_u8(&mut self, offset: u32) -> u8;
    fn mmio_write_u8(&mut self, offset: u32, data: u8);

    fn mmio_read_u16(&mut self, offset: u32) -> u16 {
        let hi = self.mmio_read_u8(offset);
        let lo = self.mmio_read_u8(offset.wrapping_add(1));
        u16::from_be_bytes([hi, lo])
    }

    fn mmio_read_u32(&mut self, offset: u32) -> u32 {
        let hi = self.mmio_read_u16(offset);
        let lo = self.mmio_read_u16(offset.wrapping_add(2));
        (hi as u32) << 16 | lo as u32
    }

    fn mmio_write_u16(&mut self, offset: u32, data: u16) {
        let [hi, lo] = data.to_be_bytes();
        self.mmio_write_u8(offset, hi);
        self.mmio_write_u8(offset.wrapping_add(1), lo);
    }

    fn mmio_write_u32(&mut self, offset: u32, data: u32) {
        self.mmio_write_u16(offset, (data >> 16) as u16);
        self.mmio_write_u16(offset.wrapping_add(2), data as u16);
    }
}
