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

    machine::tests.rs

    Machine tests against mock chips.
*/
use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

use super::*;
use crate::{
    bus::VIA_ADDRESS,
    crash,
    error::MessageError,
    memory::{BufferLayout, FRAME_SIZE},
    testing::*,
    wires::BitLine,
};

const CHECK_ADDR: u32 = 0x0040_0F00;
const ROM_SSP: u32 = 0x0040_002A;
const ROM_PC: u32 = 0x0040_008C;

fn rom_image() -> Vec<u8> {
    let mut rom = vec![0u8; 0x20000];
    rom[0..4].copy_from_slice(&ROM_SSP.to_be_bytes());
    rom[4..8].copy_from_slice(&ROM_PC.to_be_bytes());
    rom
}

#[derive(Default)]
struct Rig {
    probe: Probe,
    clock: FakeClock,
    regs: Rc<RefCell<CpuRegs>>,
    sony_check: Rc<Cell<bool>>,
    via_irq: Captured<BitLine>,
    scc_irq: Captured<BitLine>,
    scsi_irq: Captured<BitLine>,
    adb_irq: Captured<BitLine>,
    osi: Captured<BitLine>,
    vbi: Captured<BitLine>,
    motor: Captured<BitLine>,
}

fn config(model: MacModel) -> MachineConfig {
    let mut config = MachineConfig::default();
    config.system.model = model;
    config
}

fn build_with(config: MachineConfig, script: Vec<HostEvent>, terminal: bool) -> (Machine, Rig) {
    let rig = Rig::default();
    let p = rig.probe.clone();

    let cpu = MockCpu::new(p.clone());
    let regs = cpu.regs.clone();
    let sony = MockSony::new(p.clone(), CHECK_ADDR);
    let sony_check = sony.wants_check.clone();

    let mut builder = Machine::builder()
        .with_config(config)
        .with_rom_image(rom_image())
        .with_host_clock(Box::new(rig.clock.clone()))
        .with_clock_store(Box::new(MemClockStore::default()))
        .with_cpu(move |w| Ok(Box::new(cpu.with_wiring(w))))
        .with_via({
            let (p, slot) = (p.clone(), rig.via_irq.clone());
            move |w| {
                *slot.borrow_mut() = Some(w.irq.clone());
                Ok(Box::new(MockVia::new(p).with_wiring(w)))
            }
        })
        .with_scc({
            let (p, slot) = (p.clone(), rig.scc_irq.clone());
            move |w| {
                *slot.borrow_mut() = Some(w.irq);
                Ok(Box::new(MockScc::new(p)))
            }
        })
        .with_serial({
            let p = p.clone();
            move |channel, _driver| Ok(Box::new(MockSerial::new(p.clone(), channel)))
        })
        .with_rtc({
            let (p, slot) = (p.clone(), rig.osi.clone());
            move |w| {
                *slot.borrow_mut() = Some(w.one_second);
                Ok(Box::new(MockRtc::new(p)))
            }
        })
        .with_keyboard({
            let p = p.clone();
            move |_| Ok(Box::new(MockKeyboard::new(p)))
        })
        .with_adb({
            let (p, slot) = (p.clone(), rig.adb_irq.clone());
            move |w| {
                *slot.borrow_mut() = Some(w.irq);
                Ok(Box::new(MockAdb::new(p)))
            }
        })
        .with_iwm({
            let (p, slot) = (p.clone(), rig.motor.clone());
            move |w| {
                *slot.borrow_mut() = Some(w.motor);
                Ok(Box::new(MockIwm::new(p)))
            }
        })
        .with_scsi({
            let (p, slot) = (p.clone(), rig.scsi_irq.clone());
            move |w| {
                *slot.borrow_mut() = w.irq;
                Ok(Box::new(MockScsi::new(p)))
            }
        })
        .with_sony(move |_| Ok(Box::new(sony)))
        .with_sound({
            let p = p.clone();
            move || Ok(Box::new(MockSound::new(p)))
        })
        .with_video({
            let (p, slot) = (p.clone(), rig.vbi.clone());
            move |w| {
                *slot.borrow_mut() = Some(w.vbi);
                Ok(Box::new(MockVideo::new(p)))
            }
        });
    if terminal {
        let p = p.clone();
        builder = builder.with_terminal(move |w| Ok(Box::new(MockTerminal::new(p, w).with_script(script))));
    }

    let machine = builder.build().unwrap();
    let rig = Rig { regs, sony_check, ..rig };
    (machine, rig)
}

fn build(model: MacModel) -> (Machine, Rig) {
    build_with(config(model), Vec::new(), true)
}

fn pulse(line: &Captured<BitLine>, level: bool) {
    line.borrow().as_ref().expect("line not wired").set(level);
}

#[test]
fn test_build_runs_setup() {
    let (machine, rig) = build(MacModel::Plus);
    let p = &rig.probe;
    assert_eq!(machine.state(), MachineState::Initialized);
    assert!(p.contains("cpu.model 68000"));
    assert!(p.contains("scc.multichar A 1 1"));
    assert!(p.contains("scc.multichar B 1 1"));
    assert!(!p.contains("serial.process A"));
    assert!(p.contains("rtc.realtime 1"));
    assert!(p.contains("rtc.time 1984-01-24 00:00:00"));
    assert!(p.contains("kbd.model 0 0"));
    assert!(p.contains("iwm.drive 1 2"));
    assert!(p.contains("scsi.drive 6 128 PCE PCEDISK"));
    assert!(p.contains("sound.lowpass 8000"));
    assert!(p.contains("video.brightness 255"));
    assert!(p.contains("term.open 512 342"));
    assert!(p.contains("term.title macplus"));
    // The Plus has no ADB and does not route the SCSI interrupt.
    assert_eq!(p.count("adb."), 0);
    assert!(rig.scsi_irq.borrow().is_none());
    // Setup order.
    assert!(p.position("cpu.model 68000") < p.position("scc.multichar A 1 1"));
    assert!(p.position("rtc.realtime 1") < p.position("kbd.model 0 0"));
    assert!(p.position("scsi.drive 6 128 PCE PCEDISK") < p.position("term.open 512 342"));
}

#[test]
fn test_build_se_attaches_adb() {
    let (_machine, rig) = build(MacModel::Se);
    let p = &rig.probe;
    assert!(p.contains("adb.attach mouse"));
    assert!(p.contains("adb.attach keyboard 0"));
    assert_eq!(p.count("kbd."), 0);
    assert!(rig.scsi_irq.borrow().is_some());
}

#[test]
fn test_reset_plus_boots_through_overlay() {
    let (mut machine, rig) = build(MacModel::Plus);
    machine.reset();
    assert_eq!(machine.state(), MachineState::Running);
    assert!(!machine.in_reset());

    let regs = rig.regs.borrow();
    assert_eq!(regs.resets, 1);
    assert_eq!(regs.areg[7], ROM_SSP);
    assert_eq!(regs.pc, ROM_PC);
    drop(regs);

    assert_eq!(machine.string_state().overlay, "true");
    assert!(rig.probe.contains("via.ira F7"));
    assert!(rig.probe.contains("via.irb FF"));
    assert!(rig.probe.contains("sony.reset"));
    assert!(rig.probe.contains("scsi.reset"));
    assert!(rig.probe.contains("scc.reset"));
    assert_eq!(machine.port_b_input().byte(), 0xFF);
    assert_eq!(machine.router().port_a().byte(), 0xF7);
}

#[test]
fn test_reset_se_copies_vectors() {
    let (mut machine, rig) = build(MacModel::Se);
    machine.reset();
    assert_eq!(machine.string_state().overlay, "false");
    assert_eq!(rig.regs.borrow().pc, ROM_PC);
    assert_eq!(machine.read_u8(4), 0x00);
    assert_eq!(machine.read_u8(5), 0x40);
    assert!(rig.probe.contains("adb.reset"));
}

#[test]
fn test_reset_guard_ignores_nested_reset() {
    let (mut machine, rig) = build(MacModel::Plus);
    rig.regs.borrow_mut().reset_line_on_reset = true;
    machine.reset();
    assert_eq!(rig.regs.borrow().resets, 1);
    assert!(!machine.in_reset());

    // Outside a reset the line does reset the machine.
    rig.regs.borrow_mut().reset_line_on_reset = false;
    machine.reset();
    assert_eq!(rig.regs.borrow().resets, 2);
}

#[test]
fn test_port_a_overlay_and_video_buffer() {
    let (mut machine, _rig) = build(MacModel::Plus);
    machine.reset();
    let layout = BufferLayout::from_ram_size(machine.config().ram.size);
    assert_eq!(machine.router().video_base(), layout.vbuf1);

    // Clear the overlay bit.
    machine.write_u8(VIA_ADDRESS + MockVia::ORA, 0xE7);
    assert_eq!(machine.string_state().overlay, "false");
    machine.write_u8(0x100, 0x42);
    assert_eq!(machine.read_u8(0x100), 0x42);

    // Select the alternate video buffer, then back.
    machine.write_u8(VIA_ADDRESS + MockVia::ORA, 0xA7);
    assert_eq!(machine.router().video_base(), layout.vbuf2);
    machine.write_u8(VIA_ADDRESS + MockVia::ORA, 0xE7);
    assert_eq!(machine.router().video_base(), layout.vbuf1);
}

#[test]
fn test_interrupts_reach_cpu() {
    let (mut machine, rig) = build(MacModel::Plus);
    machine.reset();
    pulse(&rig.via_irq, true);
    machine.advance(1);
    assert_eq!(rig.regs.borrow().level, 1);
    pulse(&rig.scc_irq, true);
    machine.advance(1);
    assert_eq!(rig.regs.borrow().level, 2);
    pulse(&rig.scc_irq, false);
    pulse(&rig.via_irq, false);
    machine.advance(1);
    assert_eq!(rig.regs.borrow().level, 0);
}

#[test]
fn test_scsi_interrupt_masked_by_port_b() {
    let (mut machine, rig) = build(MacModel::Se);
    machine.reset();
    // Port B resets with the SCSI interrupt disabled.
    pulse(&rig.scsi_irq, true);
    machine.advance(1);
    assert_eq!(rig.regs.borrow().level, 0);

    machine.write_u8(VIA_ADDRESS + MockVia::ORB, 0xBF);
    assert_eq!(rig.regs.borrow().level, 1);
    machine.write_u8(VIA_ADDRESS + MockVia::ORB, 0xFF);
    assert_eq!(rig.regs.borrow().level, 0);
}

#[test]
fn test_vbi_pulses_ca1_and_feeds_pwm() {
    let (mut machine, rig) = build(MacModel::Plus);
    machine.reset();
    rig.probe.clear();
    pulse(&rig.vbi, true);
    machine.advance(1);

    let p = &rig.probe;
    let ca1_low = p.position("via.ca1 0").unwrap();
    let ca1_high = p.position("via.ca1 1").unwrap();
    assert!(ca1_low < ca1_high);
    assert!(p.contains("sound.vbl 740"));
    assert!(p.contains("iwm.pwm 370"));

    // The falling edge does nothing.
    p.clear();
    pulse(&rig.vbi, false);
    machine.advance(1);
    assert_eq!(p.count("via.ca1"), 0);
}

#[test]
fn test_vbi_sets_classic_brightness() {
    let (mut machine, rig) = build(MacModel::Classic);
    machine.reset();
    let layout = BufferLayout::from_ram_size(machine.config().ram.size);

    // 0x20 maps to the darkest PWM setting.
    machine.write_u8(layout.sbuf1 + 1, 0x20);
    pulse(&rig.vbi, true);
    machine.advance(1);
    assert_eq!(rig.probe.last("video.brightness"), Some("video.brightness 32".to_string()));
    assert_eq!(rig.probe.count("iwm.pwm"), 0);

    // Unchanged brightness is not set again.
    pulse(&rig.vbi, true);
    machine.advance(1);
    assert_eq!(rig.probe.count("video.brightness 32"), 1);
}

#[test]
fn test_one_second_runs_sony_check() {
    let (mut machine, rig) = build(MacModel::Se);
    machine.reset();
    {
        let mut regs = rig.regs.borrow_mut();
        regs.mask = 0;
        regs.pc = 0x0040_1234;
        regs.areg[7] = 0x2000;
    }
    rig.sony_check.set(true);
    pulse(&rig.osi, true);
    machine.advance(1);

    let regs = rig.regs.borrow();
    assert_eq!(regs.pc, CHECK_ADDR);
    assert_eq!(regs.areg[7], 0x1FFC);
    drop(regs);
    let pushed: Vec<u8> = (0..4).map(|i| machine.read_u8(0x1FFC + i)).collect();
    assert_eq!(pushed, vec![0x00, 0x40, 0x12, 0x34]);

    let p = &rig.probe;
    assert!(p.position("cpu.prefetch 400F00") < p.position("via.ca2 0"));
    assert!(p.position("via.ca2 0") < p.position("via.ca2 1"));
}

#[test]
fn test_sony_check_skipped_at_mask_seven() {
    let (mut machine, rig) = build(MacModel::Se);
    machine.reset();
    rig.regs.borrow_mut().pc = 0x0040_1234;
    rig.sony_check.set(true);
    pulse(&rig.osi, true);
    machine.advance(1);
    assert_eq!(rig.regs.borrow().pc, 0x0040_1234);
    assert!(rig.probe.contains("via.ca2 1"));
}

#[test]
fn test_clock_cascade() {
    let (mut machine, rig) = build(MacModel::Plus);
    machine.reset();
    machine.advance(2560);
    let p = &rig.probe;
    assert_eq!(p.total("cpu.clock"), 2560);
    assert_eq!(p.total("sound.clock"), 2560);
    assert_eq!(p.total("via.clock"), 256);
    assert_eq!(p.total("iwm.clock"), 256);
    assert_eq!(p.total("scc.clock"), 1200);
    assert_eq!(p.total("video.clock"), 2560);
    assert_eq!(p.total("video.frame"), FRAME_SIZE as u64);
    assert_eq!(p.total("kbd.clock"), 2560);
    assert_eq!(p.count("serial.process A"), 2);
    assert_eq!(p.count("serial.process B"), 2);
    assert_eq!(p.total("rtc.clock"), 0);

    machine.advance(8200);
    assert_eq!(p.total("rtc.clock"), 8200 + 2560);
    assert_eq!(p.total("term.check"), 1);
}

#[test]
fn test_advance_one_step_uses_cpu_delay() {
    let (mut machine, rig) = build(MacModel::Plus);
    machine.reset();
    rig.regs.borrow_mut().delay = 12;
    assert_eq!(machine.advance_one_step(), 12);
    rig.regs.borrow_mut().delay = 0;
    assert_eq!(machine.advance_one_step(), 1);
    assert_eq!(machine.pacing().clock_count(), 13);
}

#[test]
fn test_pause_freezes_and_resyncs() {
    let (mut machine, rig) = build(MacModel::Plus);
    machine.reset();
    machine.pause(true);
    assert!(machine.is_paused());
    assert_eq!(machine.advance_one_step(), 0);
    assert_eq!(rig.regs.borrow().cycles, 0);

    // A long pause must not count as running behind.
    rig.clock.advance(5_000_000);
    machine.set_mouse(0, 0, 1);
    assert!(!machine.is_paused());
    machine.advance(40_000);
    assert_eq!(machine.pacing().debt(), 4000);
    assert_eq!(machine.pacing().sync_stats().forgiven, 0);
}

#[test]
fn test_reset_keeps_pause() {
    let (mut machine, rig) = build(MacModel::Plus);
    machine.reset();
    machine.pause(true);
    machine.reset();
    assert_eq!(machine.state(), MachineState::Paused);

    machine.set_message("emu.reset", "").unwrap();
    assert_eq!(machine.state(), MachineState::Paused);
    assert_eq!(machine.advance_one_step(), 0);
    assert_eq!(rig.regs.borrow().cycles, 0);

    machine.pause(false);
    assert_eq!(machine.state(), MachineState::Running);
    let delay = rig.regs.borrow().delay as u64;
    assert_eq!(machine.advance_one_step(), delay);
}

#[test]
fn test_pause_needs_reset() {
    let (mut machine, _rig) = build(MacModel::Plus);
    machine.pause(true);
    assert_eq!(machine.state(), MachineState::Initialized);
    machine.reset();
    assert_eq!(machine.state(), MachineState::Running);
}

#[test]
fn test_quadrature_mouse() {
    let (mut machine, rig) = build(MacModel::Plus);
    machine.reset();
    let p = &rig.probe;

    machine.set_mouse(5, 0, 0);
    machine.advance(8192 * 10);
    assert!(p.contains("scc.dcd A 0"));
    assert_eq!(p.last("via.irb"), Some("via.irb EF".to_string()));
    machine.advance(8192 * 10);
    assert!(p.contains("scc.dcd A 1"));
    assert_eq!(p.last("via.irb"), Some("via.irb FF".to_string()));
    machine.advance(8192 * 10);
    assert_eq!(p.count("scc.dcd"), 2);
    assert_eq!(p.count("scc.dcd B"), 0);

    // The button drives port B bit 3, active low, only on change.
    machine.set_mouse(0, 0, 1);
    assert_eq!(p.last("via.irb"), Some("via.irb F7".to_string()));
    machine.set_mouse(0, 0, 1);
    assert_eq!(p.count("via.irb F7"), 1);
    machine.set_mouse(0, 0, 0);
    assert_eq!(p.last("via.irb"), Some("via.irb FF".to_string()));
}

#[test]
fn test_release_button_sends_term_release() {
    let (mut machine, rig) = build(MacModel::Plus);
    machine.reset();
    machine.set_mouse(0, 0, 4);
    assert!(!rig.probe.contains("term.release 1"));
    machine.set_mouse(0, 0, 0);
    assert!(rig.probe.contains("term.release 1"));
}

#[test]
fn test_adb_mouse_forwards_raw() {
    let (mut machine, rig) = build(MacModel::Se);
    machine.reset();
    rig.probe.clear();
    machine.set_mouse(3, -2, 1);
    assert!(rig.probe.contains("adb.mouse 1 3 -2"));
    assert_eq!(rig.probe.count("via.irb"), 0);
    assert_eq!(machine.port_b_input().byte(), 0xFF);
}

#[test]
fn test_adb_interrupt_drives_port_b() {
    let (mut machine, rig) = build(MacModel::Se);
    machine.reset();
    pulse(&rig.adb_irq, true);
    machine.advance(1);
    assert_eq!(rig.probe.last("via.irb"), Some("via.irb F7".to_string()));
    pulse(&rig.adb_irq, false);
    machine.advance(1);
    assert_eq!(rig.probe.last("via.irb"), Some("via.irb FF".to_string()));
}

#[test]
fn test_keys_and_shift_register() {
    let (mut machine, rig) = build(MacModel::Plus);
    machine.reset();
    machine.set_key(KeyEvent::Down, KeyCode(42));
    machine.set_key(KeyEvent::Magic, KeyCode(7));
    assert!(rig.probe.contains("kbd.key Down 42"));
    assert_eq!(rig.probe.count("kbd.key "), 1);

    machine.write_u8(VIA_ADDRESS + MockVia::SR, 0x10);
    assert!(rig.probe.contains("kbd.receive 10"));
}

#[test]
fn test_disk_motor_limits_speed() {
    let (mut machine, rig) = build(MacModel::Plus);
    machine.reset();
    machine.set_message("emu.cpu.speed", "8").unwrap();
    assert_eq!(machine.pacing().speed_factor(), 8);

    pulse(&rig.motor, true);
    machine.advance(1);
    assert_eq!(machine.pacing().speed_factor(), DISK_MOTOR_SPEED);
    pulse(&rig.motor, false);
    machine.advance(1);
    assert_eq!(machine.pacing().speed_factor(), 8);
    assert_eq!(machine.speed_limits().slots(), [8, 0]);
}

#[test]
fn test_messages() {
    let (mut machine, rig) = build(MacModel::Plus);
    machine.reset();

    machine.set_message("emu.stop", "").unwrap();
    assert_eq!(machine.take_break(), BreakState::Stop);
    assert_eq!(machine.take_break(), BreakState::None);
    machine.set_message("emu.exit", "").unwrap();
    assert_eq!(machine.take_break(), BreakState::Abort);

    machine.set_message("emu.pause", "1").unwrap();
    assert!(machine.is_paused());
    machine.set_message("emu.pause.toggle", "").unwrap();
    assert!(!machine.is_paused());

    machine.set_message("emu.cpu.speed", "3").unwrap();
    assert_eq!(machine.pacing().speed_factor(), 3);
    assert_eq!(rig.probe.last("rtc.realtime"), Some("rtc.realtime 1".to_string()));
    machine.set_message("emu.cpu.speed", "1").unwrap();
    assert_eq!(rig.probe.last("rtc.realtime"), Some("rtc.realtime 0".to_string()));
    machine.set_message("emu.cpu.speed.step", "-5").unwrap();
    assert_eq!(machine.speed_limits().get(SpeedSlot::User), 1);
    machine.set_message("emu.cpu.speed.step", "+2").unwrap();
    assert_eq!(machine.pacing().speed_factor(), 3);

    machine.set_message("emu.cpu.model", "68010").unwrap();
    assert!(rig.probe.contains("cpu.model 68010"));
    assert!(matches!(
        machine.set_message("emu.cpu.model", "68020"),
        Err(MessageError::BadValue(..))
    ));
    assert!(matches!(
        machine.set_message("emu.cpu.speed", "fast"),
        Err(MessageError::BadValue(..))
    ));

    machine.set_message("term.fullscreen", "1").unwrap();
    assert!(rig.probe.contains("term.fullscreen 1"));
    assert_eq!(
        machine.set_message("emu.bogus", "1"),
        Err(MessageError::Unknown("emu.bogus".to_string()))
    );

    let resets = rig.regs.borrow().resets;
    machine.set_message("emu.reset", "").unwrap();
    assert_eq!(rig.regs.borrow().resets, resets + 1);
}

#[test]
fn test_term_message_without_terminal() {
    let (mut machine, _rig) = build_with(config(MacModel::Plus), Vec::new(), false);
    assert_eq!(
        machine.set_message("term.title", "x"),
        Err(MessageError::NoTerminal("term.title".to_string()))
    );
}

#[test]
fn test_host_events_dispatched_on_slow_poll() {
    let script = vec![
        HostEvent::Key(KeyEvent::Down, KeyCode(9)),
        HostEvent::Message {
            name: "emu.stop".to_string(),
            value: String::new(),
        },
    ];
    let (mut machine, rig) = build_with(config(MacModel::Plus), script, true);
    machine.reset();
    machine.advance(8192 * 10);
    assert!(rig.probe.contains("kbd.key Down 9"));
    assert_eq!(machine.take_break(), BreakState::Stop);
}

#[test]
fn test_host_sender_mouse_scaled() {
    let mut config = config(MacModel::Se);
    config.terminal.mouse_mul_x = 2;
    config.terminal.mouse_div_y = 2;
    let (mut machine, rig) = build_with(config, Vec::new(), true);
    machine.reset();
    machine
        .host_sender()
        .send(HostEvent::Mouse {
            dx: 3,
            dy: 5,
            buttons: 0,
        })
        .unwrap();
    machine.advance(8192 * 10);
    assert!(rig.probe.contains("adb.mouse 0 6 2"));

    // Huge host deltas saturate instead of overflowing.
    machine
        .host_sender()
        .send(HostEvent::Mouse {
            dx: i32::MAX,
            dy: i32::MIN,
            buttons: 0,
        })
        .unwrap();
    machine.advance(8192 * 10);
    assert!(rig.probe.contains(&format!("adb.mouse 0 {} {}", i32::MAX, i32::MIN / 2)));
}

#[test]
fn test_pram_loaded_patched_and_saved() {
    let mut config = config(MacModel::Classic);
    config.rtc.romdisk = true;
    config.rtc.appletalk = Some(true);
    config.rtc.start = None;

    let store = MemClockStore::new(Some(vec![0xA8; 256]));
    let (machine, probe) = build_with_store(config, store.clone());
    assert!(probe.contains("rtc.load 256"));
    assert!(probe.contains("rtc.time now"));
    drop(machine);

    let saved = store.data.borrow().clone().unwrap();
    assert_eq!(saved[0], 0xA8);
    assert_eq!(saved[0x13], 0x21);
    assert_eq!(&saved[0x78..0x7C], &[0x00, 0x06, 0xFF, 0xCB]);
}

/// A machine with only an RTC.
fn build_with_store(config: MachineConfig, store: MemClockStore) -> (Machine, Probe) {
    let p = Probe::new();
    let machine = Machine::builder()
        .with_config(config)
        .with_rom_image(rom_image())
        .with_host_clock(Box::new(FakeClock::new()))
        .with_clock_store(Box::new(store))
        .with_rtc({
            let p = p.clone();
            move |_| Ok(Box::new(MockRtc::new(p)))
        })
        .build()
        .unwrap();
    (machine, p)
}

#[test]
fn test_missing_pram_and_chips_tolerated() {
    let (mut machine, probe) = build_with_store(config(MacModel::Plus), MemClockStore::new(None));
    assert_eq!(probe.count("rtc.load"), 0);
    // No CPU, VIA or video: the machine still steps.
    machine.reset();
    assert_eq!(machine.advance_one_step(), 1);
    machine.advance(100_000);
    assert!(machine.register("pc").is_none());
}

#[test]
fn test_failed_chip_left_absent() {
    let machine = Machine::builder()
        .with_config(config(MacModel::Plus))
        .with_host_clock(Box::new(FakeClock::new()))
        .with_via(|_| anyhow::bail!("no via"))
        .build()
        .unwrap();
    assert!(machine.bus().via.is_none());
}

#[test]
fn test_invalid_config_fails_build() {
    let mut config = config(MacModel::Plus);
    config.rom.size = 0;
    assert!(Machine::builder().with_config(config).build().is_err());
}

#[test]
fn test_registers_and_state_dump() {
    let (mut machine, _rig) = build(MacModel::Plus);
    machine.reset();
    assert_eq!(machine.register("pc"), Some(ROM_PC));
    assert!(machine.set_register("pc", 0x1234));
    assert!(!machine.set_register("d9", 0));
    assert_eq!(machine.register("pc"), Some(0x1234));

    let state = machine.string_state();
    assert_eq!(state.model, "mac-plus");
    assert_eq!(state.state, "Running");
    let text = state.to_string();
    assert!(text.contains("PC=001234"));
    assert!(text.contains("pa=F7 pb=FF pb_in=FF"));
}

#[test]
fn test_crash_report() {
    crash::clear();
    assert!(crash::report().is_none());

    let (machine, _rig) = build(MacModel::Plus);
    let machine = Rc::new(RefCell::new(machine));
    crash::register(&machine);
    assert!(crash::report().unwrap().contains("mac-plus"));

    {
        let _held = machine.borrow_mut();
        assert!(crash::report().is_none());
    }

    drop(machine);
    assert!(crash::report().is_none());
    crash::clear();
}
