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

    machine::signals.rs

    Signal routing.

    Drains the signal queue and delivers each signal to its destination. A
    handler may cause further signals; they are drained in the same pass.
*/
use crate::{
    bus::OPEN_BUS_BYTE,
    device_traits::{terminal::HostEvent, CpuBus},
    devices::via_ports::PortAction,
    interrupt::IrqSource,
    machine::{Machine, DISK_MOTOR_SPEED},
    pacing::SpeedSlot,
    wires::Signal,
};

/// Signals handled per drain before the queue is assumed to be oscillating.
pub const MAX_SIGNALS_PER_DRAIN: usize = 4096;

/// PWM samples taken from the sound buffer on each vertical blank.
pub const PWM_SAMPLES: usize = 370;
/// One word per sample; the sound chip sees the whole buffer.
pub const SOUND_BUFFER_SIZE: usize = PWM_SAMPLES * 2;

#[rustfmt::skip]
const CLASSIC_PWM: [u8; 64] = [
    0x00, 0x01, 0x3b, 0x02, 0x3c, 0x28, 0x36, 0x03,
    0x3d, 0x20, 0x31, 0x29, 0x37, 0x13, 0x23, 0x04,
    0x3e, 0x34, 0x1e, 0x21, 0x32, 0x0c, 0x0e, 0x2a,
    0x38, 0x10, 0x1b, 0x14, 0x24, 0x17, 0x2c, 0x05,
    0x3f, 0x3a, 0x27, 0x35, 0x1f, 0x30, 0x12, 0x22,
    0x33, 0x1d, 0x0b, 0x0d, 0x0f, 0x1a, 0x16, 0x2b,
    0x39, 0x26, 0x2f, 0x11, 0x1c, 0x0a, 0x19, 0x15,
    0x25, 0x2e, 0x09, 0x18, 0x2d, 0x08, 0x07, 0x06,
];

/// Screen brightness of the Classic from the first PWM sample, in 32..=255.
pub fn classic_brightness(sample: u8) -> u32 {
    let v = (CLASSIC_PWM[(sample & 0x3F) as usize] as u32).clamp(1, 31);
    32 + (223 * (30 - (v - 1)) + 15) / 30
}

impl Machine {
    pub(crate) fn process_signals(&mut self) {
        for _ in 0..MAX_SIGNALS_PER_DRAIN {
            let Some(signal) = self.signals.try_recv() else {
                return;
            };
            self.handle_signal(signal);
        }
        log::warn!(
            "signal queue not settling, {} signals left pending",
            self.signals.pending()
        );
    }

    fn handle_signal(&mut self, signal: Signal) {
        log::trace!("signal: {:?}", signal);
        match signal {
            Signal::Interrupt(source, level) => {
                if source == IrqSource::Scsi && !self.model.has_scsi_interrupt() {
                    return;
                }
                let ipl = self.interrupts.set_source(source, level);
                self.set_cpu_interrupt(ipl);
            }
            Signal::ViaPortA(value) => {
                for action in self.router.port_a_changed(value) {
                    self.apply_port_action(action);
                }
            }
            Signal::ViaPortB(value) => {
                for action in self.router.port_b_changed(value) {
                    self.apply_port_action(action);
                }
            }
            Signal::ViaShiftOut(value) => {
                if let Some(kbd) = self.keyboard.as_mut() {
                    kbd.receive(value);
                }
                else if let Some(adb) = self.adb.as_mut() {
                    adb.shift_out(value);
                }
            }
            Signal::ViaCb2(level) => {
                if let Some(kbd) = self.keyboard.as_mut() {
                    kbd.set_data(level);
                }
            }
            Signal::KeyboardData(value) | Signal::AdbShiftIn(value) => {
                if let Some(via) = self.bus.via.as_mut() {
                    via.set_shift_input(value);
                }
            }
            Signal::AdbInterrupt(level) => {
                // Active low on port B bit 3.
                let old = self.port_b_input.byte();
                self.port_b_input.set_mouse_switch(!level);
                if self.port_b_input.byte() != old {
                    self.push_port_b_input();
                }
            }
            Signal::RtcData(level) => {
                let old = self.port_b_input.byte();
                self.port_b_input.set_rtc_data(level);
                if self.port_b_input.byte() != old {
                    self.push_port_b_input();
                }
            }
            Signal::RtcOneSecond(level) => self.one_second(level),
            Signal::VerticalBlank(level) => self.vertical_blank(level),
            Signal::IwmMotor(on) => {
                log::debug!("{}iwm: motor {}", self.pc_tag(), if on { "on" } else { "off" });
                self.speed.set(SpeedSlot::DiskMotor, if on { DISK_MOTOR_SPEED } else { 0 });
                self.adjust_speed();
            }
            Signal::CpuReset(level) => {
                if level {
                    self.reset();
                }
            }
        }
    }

    fn apply_port_action(&mut self, action: PortAction) {
        match action {
            PortAction::Overlay(overlay) => {
                if let Err(e) = self.memory.set_overlay(self.bus.space_mut(), overlay) {
                    log::error!("overlay: {}", e);
                }
            }
            PortAction::DriveSelect(select) => {
                if let Some(iwm) = self.bus.iwm.as_mut() {
                    iwm.set_drive_select(select);
                }
            }
            PortAction::HeadSelect(select) => {
                if let Some(iwm) = self.bus.iwm.as_mut() {
                    iwm.set_head_select(select);
                }
            }
            PortAction::VideoBuffer(address) => {
                log::trace!("video buffer: {:06X}", address);
            }
            PortAction::SoundBuffer(address) => {
                log::trace!("sound buffer: {:06X}", address);
            }
            PortAction::Volume(volume) => {
                if let Some(sound) = self.sound.as_mut() {
                    sound.set_volume(volume);
                }
            }
            PortAction::Rtc(value) => {
                if let Some(rtc) = self.rtc.as_mut() {
                    rtc.set_port(value);
                }
            }
            PortAction::SoundEnable(enable) => {
                if let Some(sound) = self.sound.as_mut() {
                    sound.set_enable(enable);
                }
            }
            PortAction::ScsiMask(masked) => {
                let ipl = self.interrupts.set_scsi_mask(masked);
                self.set_cpu_interrupt(ipl);
            }
            PortAction::AdbState(state) => {
                if let Some(adb) = self.adb.as_mut() {
                    adb.set_state(state);
                }
            }
        }
    }

    fn vertical_blank(&mut self, level: bool) {
        if !level {
            return;
        }
        if let Some(via) = self.bus.via.as_mut() {
            via.set_ca1_input(false);
            via.set_ca1_input(true);
        }

        if let Some(sound) = self.sound.as_mut() {
            let buffer = self
                .memory
                .ram_slice(self.bus.space(), self.router.sound_base(), SOUND_BUFFER_SIZE)
                .unwrap_or_default();
            sound.vbl(buffer);
        }

        let sbuf1 = self.router.buffers().sbuf1;
        let space = self.bus.space();
        let samples: Vec<u8> = (0..PWM_SAMPLES as u32)
            .map(|i| space.peek_u8(sbuf1.wrapping_add(i + 1)).unwrap_or(OPEN_BUS_BYTE))
            .collect();

        if self.model.has_pwm_brightness() {
            let brightness = classic_brightness(samples[0]);
            if let Some(video) = self.video.as_mut() {
                if video.brightness() != brightness {
                    video.set_brightness(brightness);
                }
            }
        }
        else if let Some(iwm) = self.bus.iwm.as_mut() {
            iwm.set_pwm(&samples);
        }
    }

    fn one_second(&mut self, level: bool) {
        if !level {
            return;
        }
        let wants_check = self.sony.as_mut().map(|sony| sony.check()).unwrap_or(false);
        if wants_check {
            self.sony_check();
        }
        if let Some(via) = self.bus.via.as_mut() {
            via.set_ca2_input(false);
            via.set_ca2_input(true);
        }
    }

    /// Make the CPU call the driver's check routine, as if it had been called
    /// from the current PC.
    fn sony_check(&mut self) {
        let tag = self.pc_tag();
        let (Some(cpu), Some(sony)) = (self.cpu.as_mut(), self.sony.as_ref()) else {
            return;
        };
        if cpu.interrupt_mask() == 7 {
            log::debug!("{}sony: check aborted (iml=7)", tag);
            return;
        }
        log::debug!("{}sony: check", tag);
        let a7 = cpu.areg(7).wrapping_sub(4);
        self.bus.write_u32(a7, cpu.pc());
        cpu.set_areg(7, a7);
        cpu.set_pc_prefetch(&mut self.bus, sony.check_addr());
    }

    pub(crate) fn dispatch_host_events(&mut self) {
        while let Some(event) = self.signals.try_recv_host() {
            match event {
                HostEvent::Key(event, key) => self.set_key(event, key),
                HostEvent::Mouse { dx, dy, buttons } => {
                    let t = &self.config.terminal;
                    let dx = dx.saturating_mul(t.mouse_mul_x) / t.mouse_div_x;
                    let dy = dy.saturating_mul(t.mouse_mul_y) / t.mouse_div_y;
                    self.set_mouse(dx, dy, buttons);
                }
                HostEvent::Message { name, value } => {
                    if let Err(e) = self.set_message(&name, &value) {
                        log::warn!("{}", e);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classic_brightness_range() {
        // Table value 0 clamps to 1, the brightest setting.
        assert_eq!(classic_brightness(0x00), 255);
        // Table value 0x3F clamps to 31, the darkest.
        assert_eq!(classic_brightness(0x20), 32);
        // Only the low six bits index the table.
        assert_eq!(classic_brightness(0xC1), classic_brightness(0x01));
        for s in 0..=255u8 {
            assert!((32..=255).contains(&classic_brightness(s)));
        }
    }
}
