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

    devices::via_ports.rs

    VIA port A and port B decoding.

    The VIA's two output ports carry the discrete control lines of the board:
    overlay or drive select, head select, the video and sound page selects, the
    volume, the RTC serial lines, the sound disable and the ADB state lines. The
    router keeps a shadow of each output port and emits one action per field that
    changed on a write. Writes that change nothing produce no actions.
*/
use modular_bitfield::prelude::*;

use crate::{machine_types::MacModel, memory::BufferLayout};

pub const PORT_A_RESET: u8 = 0xF7;
pub const PORT_B_RESET: u8 = 0xFF;

#[bitfield]
#[derive(Copy, Clone, Debug)]
pub struct ViaPortA {
    pub volume: B3,
    /// Plus only. Set selects the main sound buffer.
    pub sound_page_main: bool,
    /// Overlay on the Plus, floppy drive select on the SE and Classic.
    pub overlay: bool,
    pub head_sel: bool,
    pub video_page_main: bool,
    pub scc_wait_req: bool,
}

#[bitfield]
#[derive(Copy, Clone, Debug)]
pub struct ViaPortB {
    pub rtc_data: bool,
    pub rtc_clock: bool,
    pub rtc_enable: bool,
    /// Mouse button on the Plus, ADB interrupt on the SE and Classic. Active low.
    pub mouse_switch: bool,
    pub mouse_x2: bool,
    pub mouse_y2: bool,
    pub scsi_int_disable: bool,
    pub sound_disable: bool,
}

impl ViaPortA {
    pub fn from_byte(byte: u8) -> Self {
        Self::from_bytes([byte])
    }

    pub fn byte(&self) -> u8 {
        self.into_bytes()[0]
    }
}

impl ViaPortB {
    pub fn from_byte(byte: u8) -> Self {
        Self::from_bytes([byte])
    }

    pub fn byte(&self) -> u8 {
        self.into_bytes()[0]
    }

    /// ST0/ST1. These share bits 4 and 5 with the quadrature inputs of the Plus.
    pub fn adb_state(&self) -> u8 {
        self.mouse_x2() as u8 | (self.mouse_y2() as u8) << 1
    }

    fn adb_changed(&self) -> bool {
        self.mouse_x2() || self.mouse_y2()
    }

    fn rtc_changed(&self) -> bool {
        self.rtc_data() || self.rtc_clock() || self.rtc_enable()
    }
}

/// Hardware actions decoded from a port write.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PortAction {
    Overlay(bool),
    DriveSelect(bool),
    HeadSelect(bool),
    /// New active frame buffer address.
    VideoBuffer(u32),
    /// New active sound buffer address.
    SoundBuffer(u32),
    Volume(u8),
    /// The full port B value, for the RTC to sample its three lines.
    Rtc(u8),
    SoundEnable(bool),
    ScsiMask(bool),
    AdbState(u8),
}

pub struct SignalRouter {
    model: MacModel,
    buffers: BufferLayout,
    port_a: ViaPortA,
    port_b: ViaPortB,
    video_base: u32,
    sound_base: u32,
}

impl SignalRouter {
    pub fn new(model: MacModel, buffers: BufferLayout) -> Self {
        Self {
            model,
            buffers,
            port_a: ViaPortA::new(),
            port_b: ViaPortB::new(),
            video_base: buffers.vbuf1,
            sound_base: buffers.sbuf1,
        }
    }

    /// Set the shadows to their power-on values. The buffer selection is kept.
    pub fn reset(&mut self) {
        self.port_a = ViaPortA::from_byte(PORT_A_RESET);
        self.port_b = ViaPortB::from_byte(PORT_B_RESET);
    }

    pub fn port_a(&self) -> ViaPortA {
        self.port_a
    }

    pub fn port_b(&self) -> ViaPortB {
        self.port_b
    }

    pub fn buffers(&self) -> &BufferLayout {
        &self.buffers
    }

    pub fn video_base(&self) -> u32 {
        self.video_base
    }

    pub fn sound_base(&self) -> u32 {
        self.sound_base
    }

    pub fn port_a_changed(&mut self, value: u8) -> Vec<PortAction> {
        let old = self.port_a.byte();
        if old == value {
            return Vec::new();
        }
        log::trace!("via: set port a: {:02X}", value);

        let new = ViaPortA::from_byte(value);
        let changed = ViaPortA::from_byte(old ^ value);
        self.port_a = new;

        let mut actions = Vec::new();
        if changed.overlay() {
            if self.model.has_overlay() {
                actions.push(PortAction::Overlay(new.overlay()));
            }
            else {
                actions.push(PortAction::DriveSelect(new.overlay()));
            }
        }
        if changed.head_sel() {
            actions.push(PortAction::HeadSelect(new.head_sel()));
        }
        if changed.video_page_main() {
            log::debug!(
                "{} video buffer",
                if new.video_page_main() { "main" } else { "alternate" }
            );
            self.video_base = self.buffers.video(new.video_page_main());
            actions.push(PortAction::VideoBuffer(self.video_base));
        }
        if changed.sound_page_main() && self.model.has_alternate_sound_buffer() {
            log::debug!(
                "{} sound buffer",
                if new.sound_page_main() { "main" } else { "alternate" }
            );
            self.sound_base = self.buffers.sound(new.sound_page_main());
            actions.push(PortAction::SoundBuffer(self.sound_base));
        }
        if changed.volume() != 0 {
            actions.push(PortAction::Volume(new.volume()));
        }
        actions
    }

    pub fn port_b_changed(&mut self, value: u8) -> Vec<PortAction> {
        let old = self.port_b.byte();
        if old == value {
            return Vec::new();
        }
        log::trace!("via: set port b: {:02X}", value);

        let new = ViaPortB::from_byte(value);
        let changed = ViaPortB::from_byte(old ^ value);
        self.port_b = new;

        let mut actions = Vec::new();
        if changed.rtc_changed() {
            actions.push(PortAction::Rtc(value));
        }
        if changed.sound_disable() {
            actions.push(PortAction::SoundEnable(!new.sound_disable()));
        }
        if changed.scsi_int_disable() {
            actions.push(PortAction::ScsiMask(new.scsi_int_disable()));
        }
        if changed.adb_changed() && self.model.has_adb() {
            actions.push(PortAction::AdbState(new.adb_state()));
        }
        actions
    }
}
