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

    device_traits::cpu.rs

    The interface to the 68000 instruction engine.
*/
use crate::{error::CpuError, machine_types::CpuModel};

/// Memory as seen by the CPU. Implemented by the machine bus, which resolves
/// each access to RAM, ROM or a chip register window.
pub trait CpuBus {
    fn read_u8(&mut self, address: u32) -> u8;
    fn read_u16(&mut self, address: u32) -> u16;
    fn read_u32(&mut self, address: u32) -> u32;
    fn write_u8(&mut self, address: u32, data: u8);
    fn write_u16(&mut self, address: u32, data: u16);
    fn write_u32(&mut self, address: u32, data: u32);
}

pub trait Cpu {
    fn set_model(&mut self, model: CpuModel) -> Result<(), CpuError>;

    /// Reset the CPU. Reads the initial stack pointer and PC from the bus.
    fn reset(&mut self, bus: &mut dyn CpuBus);

    /// Execute for `cycles` clock units.
    fn clock(&mut self, bus: &mut dyn CpuBus, cycles: u64);

    /// Duration of the last instruction executed, in clock units.
    fn delay(&self) -> u32;

    /// Drive the priority-encoded interrupt input (IPL0-2). 0 means no interrupt.
    fn set_interrupt_level(&mut self, level: u8);

    /// The interrupt mask level from the status register.
    fn interrupt_mask(&self) -> u8;

    fn pc(&self) -> u32;
    fn last_pc(&self) -> u32;

    /// Set the PC and refill the prefetch queue from the new location.
    fn set_pc_prefetch(&mut self, bus: &mut dyn CpuBus, pc: u32);

    fn areg(&self, reg: usize) -> u32;
    fn set_areg(&mut self, reg: usize, value: u32);

    /// Look up a register by name, eg "pc", "sr", "d0", "a7".
    fn register(&self, name: &str) -> Option<u32>;
    fn set_register(&mut self, name: &str, value: u32) -> bool;

    /// Human-readable register dump.
    fn state_string(&self) -> String;
}
