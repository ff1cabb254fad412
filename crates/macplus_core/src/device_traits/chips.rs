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

    device_traits::chips.rs

    Peripheral chip interfaces.

    Outward lines (interrupts, port outputs, motor, VBI and so on) are not part
    of these traits. Chips receive narrow Wire handles at construction time, see
    wires.rs.
*/
use super::MmioDevice;
use crate::{
    device_traits::terminal::{KeyCode, KeyEvent},
    machine_config::IwmDriveConfig,
};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SccChannel {
    A,
    B,
}

/// 6522 Versatile Interface Adapter.
pub trait Via: MmioDevice {
    fn reset(&mut self);
    fn clock(&mut self, cycles: u64);
    fn set_port_a_input(&mut self, value: u8);
    fn set_port_b_input(&mut self, value: u8);
    fn set_ca1_input(&mut self, level: bool);
    fn set_ca2_input(&mut self, level: bool);
    fn set_shift_input(&mut self, value: u8);
}

/// 8530 Serial Communications Controller. The bus decodes the SCC window into
/// per-channel control and data accesses.
pub trait Scc {
    fn reset(&mut self);
    fn clock(&mut self, cycles: u64);
    fn ctl(&mut self, channel: SccChannel) -> u8;
    fn set_ctl(&mut self, channel: SccChannel, value: u8);
    fn data(&mut self, channel: SccChannel) -> u8;
    fn set_data(&mut self, channel: SccChannel, value: u8);
    /// The DCD inputs carry the mouse quadrature interrupts.
    fn set_dcd(&mut self, channel: SccChannel, level: bool);
    fn set_multichar(&mut self, channel: SccChannel, rx: u32, tx: u32);
}

/// Host side of one serial port, moving characters between the SCC and a host driver.
pub trait SerialLink {
    fn process(&mut self, scc: &mut dyn Scc);
}

/// NCR 5380 SCSI controller.
pub trait Scsi: MmioDevice {
    fn reset(&mut self);
    fn set_drive(&mut self, id: u32, drive: u32, vendor: &str, product: &str);
}

/// IWM floppy controller.
pub trait Iwm: MmioDevice {
    fn clock(&mut self, cycles: u64);
    fn set_drive_select(&mut self, select: bool);
    fn set_head_select(&mut self, select: bool);
    /// Disk speed PWM samples, taken from the sound buffer on every VBI.
    fn set_pwm(&mut self, samples: &[u8]);
    fn configure_drive(&mut self, index: usize, drive: &IwmDriveConfig);
}

pub trait SoundChip {
    fn clock(&mut self, cycles: u64);
    fn set_volume(&mut self, volume: u8);
    fn set_enable(&mut self, enable: bool);
    fn set_lowpass(&mut self, freq: u32);
    /// Called on every vertical blank with the active sound buffer.
    fn vbl(&mut self, buffer: &[u8]);
}

/// Real time clock and parameter RAM.
pub trait Rtc {
    /// Port B output of the VIA. The RTC samples its data, clock and enable lines.
    fn set_port(&mut self, value: u8);
    fn clock(&mut self, cycles: u64);
    /// When set, the clock follows host time rather than emulated time.
    fn set_realtime(&mut self, realtime: bool);
    fn load_pram(&mut self, data: &[u8]);
    fn pram(&self) -> Vec<u8>;
    fn set_pram_byte(&mut self, index: usize, value: u8);
    fn set_time_str(&mut self, time: &str) -> bool;
    fn set_time_now(&mut self);
}

/// Mac Plus serial keyboard, attached to the VIA shift register.
pub trait Keyboard {
    fn set_model(&mut self, model: u32, intl: bool);
    fn set_keypad_motion(&mut self, motion: bool);
    fn clock(&mut self, cycles: u64);
    fn set_key(&mut self, event: KeyEvent, key: KeyCode);
    /// Byte shifted out of the VIA.
    fn receive(&mut self, value: u8);
    /// VIA CB2 line.
    fn set_data(&mut self, level: bool);
}

/// Apple Desktop Bus transceiver with its attached devices.
pub trait AdbHost {
    fn reset(&mut self);
    fn clock(&mut self, cycles: u64);
    /// ST0/ST1 state lines from VIA port B.
    fn set_state(&mut self, state: u8);
    fn shift_out(&mut self, value: u8);
    fn attach_mouse(&mut self) -> bool;
    fn attach_keyboard(&mut self, keypad_motion: bool) -> bool;
    fn mouse_move(&mut self, buttons: u32, dx: i32, dy: i32);
    fn set_key(&mut self, event: KeyEvent, key: KeyCode);
}

pub trait Video {
    /// Advance the beam. `frame` is the active 1bpp frame buffer, if it is mapped.
    fn clock(&mut self, cycles: u64, frame: Option<&[u8]>);
    fn brightness(&self) -> u32;
    fn set_brightness(&mut self, brightness: u32);
    fn set_colors(&mut self, color0: u32, color1: u32);
}

/// Replacement floppy driver that services disk requests outside the guest.
pub trait SonyDriver {
    fn reset(&mut self);
    /// Returns true if the driver wants its check routine run.
    fn check(&mut self) -> bool;
    fn check_addr(&self) -> u32;
}
