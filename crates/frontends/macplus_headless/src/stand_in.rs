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

    macplus_headless::stand_in.rs

    A stand-in CPU for pacing runs.

    FixedDelayCpu executes nothing. Every step takes a fixed number of clock
    units, so the clock cascade, the chips and the wall-clock sync run exactly as
    they would under a real instruction engine with that average instruction
    length.
*/
use macplus_core::{
    device_traits::{Cpu, CpuBus},
    error::CpuError,
    machine_types::CpuModel,
    wires::CpuWiring,
};

pub struct FixedDelayCpu {
    model:  CpuModel,
    delay:  u32,
    pc:     u32,
    areg:   [u32; 8],
    dreg:   [u32; 8],
    mask:   u8,
    ipl:    u8,
    cycles: u64,
    // The reset line. Never pulsed.
    _wiring: CpuWiring,
}

impl FixedDelayCpu {
    pub fn new(delay: u32, wiring: CpuWiring) -> Self {
        Self {
            model: CpuModel::M68000,
            delay: delay.max(1),
            pc: 0,
            areg: [0; 8],
            dreg: [0; 8],
            mask: 7,
            ipl: 0,
            cycles: 0,
            _wiring: wiring,
        }
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn ipl(&self) -> u8 {
        self.ipl
    }

    fn sr(&self) -> u32 {
        0x2000 | (self.mask as u32) << 8
    }
}

/// Split a register name like "d3" into its bank and index.
fn reg_slot(name: &str) -> Option<(char, usize)> {
    let mut chars = name.chars();
    let bank = chars.next()?;
    let index = chars.as_str().parse::<usize>().ok().filter(|&i| i < 8)?;
    Some((bank, index))
}

impl Cpu for FixedDelayCpu {
    fn set_model(&mut self, model: CpuModel) -> Result<(), CpuError> {
        match model {
            CpuModel::M68000 | CpuModel::M68010 => {
                self.model = model;
                Ok(())
            }
            _ => Err(CpuError::Unsupported(model.to_string())),
        }
    }

    fn reset(&mut self, bus: &mut dyn CpuBus) {
        self.areg[7] = bus.read_u32(0);
        self.pc = bus.read_u32(4);
        self.mask = 7;
        log::debug!("cpu: reset ssp={:08X} pc={:08X}", self.areg[7], self.pc);
    }

    fn clock(&mut self, _bus: &mut dyn CpuBus, cycles: u64) {
        self.cycles += cycles;
    }

    fn delay(&self) -> u32 {
        self.delay
    }

    fn set_interrupt_level(&mut self, level: u8) {
        self.ipl = level;
    }

    fn interrupt_mask(&self) -> u8 {
        self.mask
    }

    fn pc(&self) -> u32 {
        self.pc
    }

    fn last_pc(&self) -> u32 {
        self.pc
    }

    fn set_pc_prefetch(&mut self, _bus: &mut dyn CpuBus, pc: u32) {
        self.pc = pc;
    }

    fn areg(&self, reg: usize) -> u32 {
        self.areg[reg & 7]
    }

    fn set_areg(&mut self, reg: usize, value: u32) {
        self.areg[reg & 7] = value;
    }

    fn register(&self, name: &str) -> Option<u32> {
        let name = name.to_lowercase();
        match name.as_str() {
            "pc" => Some(self.pc),
            "sr" => Some(self.sr()),
            "sp" | "ssp" => Some(self.areg[7]),
            _ => match reg_slot(&name)? {
                ('a', i) => Some(self.areg[i]),
                ('d', i) => Some(self.dreg[i]),
                _ => None,
            },
        }
    }

    fn set_register(&mut self, name: &str, value: u32) -> bool {
        let name = name.to_lowercase();
        match name.as_str() {
            "pc" => self.pc = value,
            "sr" => self.mask = ((value >> 8) & 7) as u8,
            "sp" | "ssp" => self.areg[7] = value,
            _ => match reg_slot(&name) {
                Some(('a', i)) => self.areg[i] = value,
                Some(('d', i)) => self.dreg[i] = value,
                _ => return false,
            },
        }
        true
    }

    fn state_string(&self) -> String {
        format!(
            "{} PC={:06X} SR={:04X} A7={:08X} IPL={} cycles={}",
            self.model,
            self.pc,
            self.sr(),
            self.areg[7],
            self.ipl,
            self.cycles
        )
    }
}
