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

    machine::state.rs

    Human-readable machine state, for debug output and crash reports.
*/
use std::fmt;

use crate::machine::Machine;

#[derive(Clone, Debug, Default)]
pub struct MachineStringState {
    pub model:        String,
    pub state:        String,
    pub cpu:          String,
    pub ipl:          String,
    pub irq_pending:  String,
    pub port_a:       String,
    pub port_b:       String,
    pub port_b_input: String,
    pub overlay:      String,
    pub speed:        String,
    pub speed_slots:  String,
    pub extra:        String,
    pub sleep_debt:   String,
    pub clock_count:  String,
    pub video_buffer: String,
    pub sound_buffer: String,
    pub brk:          String,
}

impl fmt::Display for MachineStringState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "model:   {} ({})", self.model, self.state)?;
        writeln!(f, "cpu:     {}", self.cpu)?;
        writeln!(f, "ipl:     {} pending: {}", self.ipl, self.irq_pending)?;
        writeln!(
            f,
            "via:     pa={} pb={} pb_in={}",
            self.port_a, self.port_b, self.port_b_input
        )?;
        writeln!(f, "overlay: {}", self.overlay)?;
        writeln!(
            f,
            "speed:   {} slots={} extra={} debt={}us",
            self.speed, self.speed_slots, self.extra, self.sleep_debt
        )?;
        writeln!(f, "clock:   {}", self.clock_count)?;
        writeln!(f, "vbuf:    {} sbuf: {}", self.video_buffer, self.sound_buffer)?;
        write!(f, "break:   {}", self.brk)
    }
}

impl Machine {
    pub fn string_state(&self) -> MachineStringState {
        MachineStringState {
            model: self.model.to_string(),
            state: format!("{:?}", self.state),
            cpu: self
                .cpu
                .as_ref()
                .map(|cpu| cpu.state_string())
                .unwrap_or_else(|| "none".to_string()),
            ipl: format!("{}", self.interrupts.level()),
            irq_pending: format!("{:08b}", self.interrupts.pending()),
            port_a: format!("{:02X}", self.router.port_a().byte()),
            port_b: format!("{:02X}", self.router.port_b().byte()),
            port_b_input: format!("{:02X}", self.port_b_input.byte()),
            overlay: format!("{}", self.memory.overlay()),
            speed: format!("{}", self.pacing.speed_factor()),
            speed_slots: format!("{:?}", self.speed.slots()),
            extra: format!("{}", self.pacing.extra()),
            sleep_debt: format!("{}", self.pacing.debt()),
            clock_count: format!("{}", self.pacing.clock_count()),
            video_buffer: format!("{:06X}", self.router.video_base()),
            sound_buffer: format!("{:06X}", self.router.sound_base()),
            brk: format!("{:?}", self.brk),
        }
    }
}
