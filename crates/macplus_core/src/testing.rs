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

    testing.rs

    Mock chips and clocks for unit tests.

    Every mock records what the machine did to it in a shared Probe, so a test can
    keep a handle after the mock has been moved into the machine.
*/
use std::{
    cell::{Cell, RefCell},
    collections::HashMap,
    rc::Rc,
};

use crate::{
    clock_store::ClockStore,
    device_traits::{
        terminal::{HostEvent, KeyCode, KeyEvent},
        AdbHost, Cpu, CpuBus, Iwm, Keyboard, MmioDevice, Rtc, Scc, SccChannel, Scsi, SerialLink, SonyDriver,
        SoundChip, Terminal, Via, Video,
    },
    error::{CpuError, MessageError, StoreError},
    machine_config::IwmDriveConfig,
    machine_types::CpuModel,
    pacing::HostClock,
    wires::{CpuWiring, TerminalWiring, ViaWiring},
};

#[derive(Default)]
struct ProbeInner {
    events: Vec<String>,
    tallies: HashMap<&'static str, u64>,
}

/// Shared event log. Clones record into the same log.
#[derive(Clone, Default)]
pub struct Probe(Rc<RefCell<ProbeInner>>);

impl Probe {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn record(&self, event: impl Into<String>) {
        self.0.borrow_mut().events.push(event.into());
    }

    /// Accumulate a counter, for calls too frequent to log one by one.
    pub fn tally(&self, name: &'static str, n: u64) {
        *self.0.borrow_mut().tallies.entry(name).or_default() += n;
    }

    pub fn total(&self, name: &str) -> u64 {
        self.0.borrow().tallies.get(name).copied().unwrap_or(0)
    }

    pub fn events(&self) -> Vec<String> {
        self.0.borrow().events.clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.0.borrow().events.iter().filter(|e| e.starts_with(prefix)).count()
    }

    pub fn contains(&self, event: &str) -> bool {
        self.0.borrow().events.iter().any(|e| e == event)
    }

    /// Most recent event starting with `prefix`.
    pub fn last(&self, prefix: &str) -> Option<String> {
        self.0.borrow().events.iter().rev().find(|e| e.starts_with(prefix)).cloned()
    }

    /// Position of the first event equal to `event`.
    pub fn position(&self, event: &str) -> Option<usize> {
        self.0.borrow().events.iter().position(|e| e == event)
    }

    pub fn clear(&self) {
        let mut inner = self.0.borrow_mut();
        inner.events.clear();
        inner.tallies.clear();
    }
}

/// A slot a device factory can stash a wire in.
pub type Captured<T> = Rc<RefCell<Option<T>>>;

#[derive(Default)]
struct FakeClockInner {
    now: u64,
    sleeps: Vec<u64>,
}

/// Host clock that only moves when told to. Sleeping advances it.
#[derive(Clone, Default)]
pub struct FakeClock(Rc<RefCell<FakeClockInner>>);

impl FakeClock {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn advance(&self, us: u64) {
        self.0.borrow_mut().now += us;
    }

    pub fn sleeps(&self) -> Vec<u64> {
        self.0.borrow().sleeps.clone()
    }
}

impl HostClock for FakeClock {
    fn now_us(&mut self) -> u64 {
        self.0.borrow().now
    }

    fn sleep_us(&mut self, us: u64) {
        let mut inner = self.0.borrow_mut();
        inner.now += us;
        inner.sleeps.push(us);
    }
}

/// Register file of the mock CPU, shared with the test.
#[derive(Default)]
pub struct CpuRegs {
    pub pc: u32,
    pub last_pc: u32,
    pub areg: [u32; 8],
    pub mask: u8,
    pub level: u8,
    pub delay: u32,
    pub cycles: u64,
    pub resets: u32,
    /// Pulse the reset line from inside reset().
    pub reset_line_on_reset: bool,
}

pub struct MockCpu {
    probe: Probe,
    wiring: Option<CpuWiring>,
    pub regs: Rc<RefCell<CpuRegs>>,
}

impl MockCpu {
    pub fn new(probe: Probe) -> Self {
        let regs = CpuRegs {
            delay: 4,
            ..Default::default()
        };
        Self {
            probe,
            wiring: None,
            regs: Rc::new(RefCell::new(regs)),
        }
    }

    pub fn with_wiring(mut self, wiring: CpuWiring) -> Self {
        self.wiring = Some(wiring);
        self
    }
}

impl Cpu for MockCpu {
    fn set_model(&mut self, model: CpuModel) -> Result<(), CpuError> {
        if model == CpuModel::M68020 {
            return Err(CpuError::Unsupported(model.to_string()));
        }
        self.probe.record(format!("cpu.model {}", model));
        Ok(())
    }

    fn reset(&mut self, bus: &mut dyn CpuBus) {
        self.probe.record("cpu.reset");
        let ssp = bus.read_u32(0);
        let pc = bus.read_u32(4);
        let pulse = {
            let mut regs = self.regs.borrow_mut();
            regs.resets += 1;
            regs.areg[7] = ssp;
            regs.pc = pc;
            regs.mask = 7;
            regs.reset_line_on_reset
        };
        if pulse {
            if let Some(wiring) = &self.wiring {
                wiring.reset.set(true);
            }
        }
    }

    fn clock(&mut self, _bus: &mut dyn CpuBus, cycles: u64) {
        self.regs.borrow_mut().cycles += cycles;
        self.probe.tally("cpu.clock", cycles);
    }

    fn delay(&self) -> u32 {
        self.regs.borrow().delay
    }

    fn set_interrupt_level(&mut self, level: u8) {
        self.regs.borrow_mut().level = level;
        self.probe.record(format!("cpu.ipl {}", level));
    }

    fn interrupt_mask(&self) -> u8 {
        self.regs.borrow().mask
    }

    fn pc(&self) -> u32 {
        self.regs.borrow().pc
    }

    fn last_pc(&self) -> u32 {
        self.regs.borrow().last_pc
    }

    fn set_pc_prefetch(&mut self, _bus: &mut dyn CpuBus, pc: u32) {
        self.regs.borrow_mut().pc = pc;
        self.probe.record(format!("cpu.prefetch {:06X}", pc));
    }

    fn areg(&self, reg: usize) -> u32 {
        self.regs.borrow().areg[reg & 7]
    }

    fn set_areg(&mut self, reg: usize, value: u32) {
        self.regs.borrow_mut().areg[reg & 7] = value;
    }

    fn register(&self, name: &str) -> Option<u32> {
        let regs = self.regs.borrow();
        match name {
            "pc" => Some(regs.pc),
            "a7" | "sp" => Some(regs.areg[7]),
            _ => None,
        }
    }

    fn set_register(&mut self, name: &str, value: u32) -> bool {
        let mut regs = self.regs.borrow_mut();
        match name {
            "pc" => regs.pc = value,
            "a7" | "sp" => regs.areg[7] = value,
            _ => return false,
        }
        true
    }

    fn state_string(&self) -> String {
        let regs = self.regs.borrow();
        format!("PC={:06X} A7={:08X}", regs.pc, regs.areg[7])
    }
}

/// VIA register file. Writes to ORB, ORA and SR drive the matching wires.
pub struct MockVia {
    probe: Probe,
    wiring: Option<ViaWiring>,
    regs: [u8; 16],
}

impl MockVia {
    pub const ORB: u32 = 0x0000;
    pub const ORA: u32 = 0x1E00;
    pub const SR: u32 = 0x1400;

    pub fn new(probe: Probe) -> Self {
        Self {
            probe,
            wiring: None,
            regs: [0; 16],
        }
    }

    pub fn with_wiring(mut self, wiring: ViaWiring) -> Self {
        self.wiring = Some(wiring);
        self
    }
}

impl MmioDevice for MockVia {
    fn mmio_read_u8(&mut self, offset: u32) -> u8 {
        self.regs[(offset >> 9) as usize & 0x0F]
    }

    fn mmio_write_u8(&mut self, offset: u32, data: u8) {
        self.probe.record(format!("via.write {:04X} {:02X}", offset, data));
        let reg = (offset >> 9) as usize & 0x0F;
        self.regs[reg] = data;
        if let Some(wiring) = &self.wiring {
            match reg {
                0 => wiring.port_b.set(data),
                1 | 15 => wiring.port_a.set(data),
                10 => wiring.shift_out.set(data),
                _ => {}
            }
        }
    }
}

impl Via for MockVia {
    fn reset(&mut self) {
        self.regs = [0; 16];
        self.probe.record("via.reset");
    }

    fn clock(&mut self, cycles: u64) {
        self.probe.tally("via.clock", cycles);
    }

    fn set_port_a_input(&mut self, value: u8) {
        self.probe.record(format!("via.ira {:02X}", value));
    }

    fn set_port_b_input(&mut self, value: u8) {
        self.probe.record(format!("via.irb {:02X}", value));
    }

    fn set_ca1_input(&mut self, level: bool) {
        self.probe.record(format!("via.ca1 {}", level as u8));
    }

    fn set_ca2_input(&mut self, level: bool) {
        self.probe.record(format!("via.ca2 {}", level as u8));
    }

    fn set_shift_input(&mut self, value: u8) {
        self.probe.record(format!("via.sr {:02X}", value));
    }
}

pub struct MockScc {
    probe: Probe,
    ctl: [u8; 2],
    data: [u8; 2],
}

impl MockScc {
    pub fn new(probe: Probe) -> Self {
        Self {
            probe,
            ctl: [0; 2],
            data: [0; 2],
        }
    }
}

fn channel_index(channel: SccChannel) -> usize {
    match channel {
        SccChannel::A => 0,
        SccChannel::B => 1,
    }
}

impl Scc for MockScc {
    fn reset(&mut self) {
        self.probe.record("scc.reset");
    }

    fn clock(&mut self, cycles: u64) {
        self.probe.tally("scc.clock", cycles);
    }

    fn ctl(&mut self, channel: SccChannel) -> u8 {
        self.ctl[channel_index(channel)]
    }

    fn set_ctl(&mut self, channel: SccChannel, value: u8) {
        self.probe.record("scc.write");
        self.ctl[channel_index(channel)] = value;
    }

    fn data(&mut self, channel: SccChannel) -> u8 {
        self.data[channel_index(channel)]
    }

    fn set_data(&mut self, channel: SccChannel, value: u8) {
        self.probe.record("scc.write");
        self.data[channel_index(channel)] = value;
    }

    fn set_dcd(&mut self, channel: SccChannel, level: bool) {
        self.probe.record(format!("scc.dcd {:?} {}", channel, level as u8));
    }

    fn set_multichar(&mut self, channel: SccChannel, rx: u32, tx: u32) {
        self.probe.record(format!("scc.multichar {:?} {} {}", channel, rx, tx));
    }
}

pub struct MockSerial {
    probe: Probe,
    channel: SccChannel,
}

impl MockSerial {
    pub fn new(probe: Probe, channel: SccChannel) -> Self {
        Self { probe, channel }
    }
}

impl SerialLink for MockSerial {
    fn process(&mut self, _scc: &mut dyn Scc) {
        self.probe.record(format!("serial.process {:?}", self.channel));
    }
}

pub struct MockScsi {
    probe: Probe,
}

impl MockScsi {
    pub fn new(probe: Probe) -> Self {
        Self { probe }
    }
}

impl MmioDevice for MockScsi {
    fn mmio_read_u8(&mut self, _offset: u32) -> u8 {
        0
    }

    fn mmio_write_u8(&mut self, _offset: u32, _data: u8) {}
}

impl Scsi for MockScsi {
    fn reset(&mut self) {
        self.probe.record("scsi.reset");
    }

    fn set_drive(&mut self, id: u32, drive: u32, vendor: &str, product: &str) {
        self.probe.record(format!("scsi.drive {} {} {} {}", id, drive, vendor, product));
    }
}

pub struct MockIwm {
    probe: Probe,
}

impl MockIwm {
    pub fn new(probe: Probe) -> Self {
        Self { probe }
    }
}

impl MmioDevice for MockIwm {
    fn mmio_read_u8(&mut self, _offset: u32) -> u8 {
        0x1F
    }

    fn mmio_write_u8(&mut self, _offset: u32, _data: u8) {}
}

impl Iwm for MockIwm {
    fn clock(&mut self, cycles: u64) {
        self.probe.tally("iwm.clock", cycles);
    }

    fn set_drive_select(&mut self, select: bool) {
        self.probe.record(format!("iwm.drive_sel {}", select as u8));
    }

    fn set_head_select(&mut self, select: bool) {
        self.probe.record(format!("iwm.head_sel {}", select as u8));
    }

    fn set_pwm(&mut self, samples: &[u8]) {
        self.probe.record(format!("iwm.pwm {}", samples.len()));
    }

    fn configure_drive(&mut self, index: usize, drive: &IwmDriveConfig) {
        self.probe.record(format!("iwm.drive {} {}", index, drive.drive));
    }
}

pub struct MockSound {
    probe: Probe,
}

impl MockSound {
    pub fn new(probe: Probe) -> Self {
        Self { probe }
    }
}

impl SoundChip for MockSound {
    fn clock(&mut self, cycles: u64) {
        self.probe.tally("sound.clock", cycles);
    }

    fn set_volume(&mut self, volume: u8) {
        self.probe.record(format!("sound.volume {}", volume));
    }

    fn set_enable(&mut self, enable: bool) {
        self.probe.record(format!("sound.enable {}", enable as u8));
    }

    fn set_lowpass(&mut self, freq: u32) {
        self.probe.record(format!("sound.lowpass {}", freq));
    }

    fn vbl(&mut self, buffer: &[u8]) {
        self.probe.record(format!("sound.vbl {}", buffer.len()));
    }
}

pub struct MockRtc {
    probe: Probe,
    pram: Vec<u8>,
}

impl MockRtc {
    pub fn new(probe: Probe) -> Self {
        Self {
            probe,
            pram: vec![0; 256],
        }
    }
}

impl Rtc for MockRtc {
    fn set_port(&mut self, value: u8) {
        self.probe.record(format!("rtc.port {:02X}", value));
    }

    fn clock(&mut self, cycles: u64) {
        self.probe.tally("rtc.clock", cycles);
    }

    fn set_realtime(&mut self, realtime: bool) {
        self.probe.record(format!("rtc.realtime {}", realtime as u8));
    }

    fn load_pram(&mut self, data: &[u8]) {
        let n = data.len().min(self.pram.len());
        self.pram[..n].copy_from_slice(&data[..n]);
        self.probe.record(format!("rtc.load {}", data.len()));
    }

    fn pram(&self) -> Vec<u8> {
        self.pram.clone()
    }

    fn set_pram_byte(&mut self, index: usize, value: u8) {
        if let Some(b) = self.pram.get_mut(index) {
            *b = value;
        }
    }

    fn set_time_str(&mut self, time: &str) -> bool {
        self.probe.record(format!("rtc.time {}", time));
        time.len() == 19
    }

    fn set_time_now(&mut self) {
        self.probe.record("rtc.time now");
    }
}

pub struct MockKeyboard {
    probe: Probe,
}

impl MockKeyboard {
    pub fn new(probe: Probe) -> Self {
        Self { probe }
    }
}

impl Keyboard for MockKeyboard {
    fn set_model(&mut self, model: u32, intl: bool) {
        self.probe.record(format!("kbd.model {} {}", model, intl as u8));
    }

    fn set_keypad_motion(&mut self, motion: bool) {
        self.probe.record(format!("kbd.keypad {}", motion as u8));
    }

    fn clock(&mut self, cycles: u64) {
        self.probe.tally("kbd.clock", cycles);
    }

    fn set_key(&mut self, event: KeyEvent, key: KeyCode) {
        self.probe.record(format!("kbd.key {:?} {}", event, key.0));
    }

    fn receive(&mut self, value: u8) {
        self.probe.record(format!("kbd.receive {:02X}", value));
    }

    fn set_data(&mut self, level: bool) {
        self.probe.record(format!("kbd.data {}", level as u8));
    }
}

pub struct MockAdb {
    probe: Probe,
    pub mouse_ok: bool,
}

impl MockAdb {
    pub fn new(probe: Probe) -> Self {
        Self { probe, mouse_ok: true }
    }
}

impl AdbHost for MockAdb {
    fn reset(&mut self) {
        self.probe.record("adb.reset");
    }

    fn clock(&mut self, cycles: u64) {
        self.probe.tally("adb.clock", cycles);
    }

    fn set_state(&mut self, state: u8) {
        self.probe.record(format!("adb.state {}", state));
    }

    fn shift_out(&mut self, value: u8) {
        self.probe.record(format!("adb.shift_out {:02X}", value));
    }

    fn attach_mouse(&mut self) -> bool {
        self.probe.record("adb.attach mouse");
        self.mouse_ok
    }

    fn attach_keyboard(&mut self, keypad_motion: bool) -> bool {
        self.probe.record(format!("adb.attach keyboard {}", keypad_motion as u8));
        true
    }

    fn mouse_move(&mut self, buttons: u32, dx: i32, dy: i32) {
        self.probe.record(format!("adb.mouse {} {} {}", buttons, dx, dy));
    }

    fn set_key(&mut self, event: KeyEvent, key: KeyCode) {
        self.probe.record(format!("adb.key {:?} {}", event, key.0));
    }
}

pub struct MockVideo {
    probe: Probe,
    brightness: u32,
}

impl MockVideo {
    pub fn new(probe: Probe) -> Self {
        Self { probe, brightness: 0 }
    }
}

impl Video for MockVideo {
    fn clock(&mut self, cycles: u64, frame: Option<&[u8]>) {
        self.probe.tally("video.clock", cycles);
        if let Some(frame) = frame {
            self.probe.tally("video.frame", frame.len() as u64);
        }
    }

    fn brightness(&self) -> u32 {
        self.brightness
    }

    fn set_brightness(&mut self, brightness: u32) {
        self.brightness = brightness;
        self.probe.record(format!("video.brightness {}", brightness));
    }

    fn set_colors(&mut self, color0: u32, color1: u32) {
        self.probe.record(format!("video.colors {:06X} {:06X}", color0, color1));
    }
}

pub struct MockSony {
    probe: Probe,
    pub wants_check: Rc<Cell<bool>>,
    check_addr: u32,
}

impl MockSony {
    pub fn new(probe: Probe, check_addr: u32) -> Self {
        Self {
            probe,
            wants_check: Rc::new(Cell::new(false)),
            check_addr,
        }
    }
}

impl SonyDriver for MockSony {
    fn reset(&mut self) {
        self.probe.record("sony.reset");
    }

    fn check(&mut self) -> bool {
        self.wants_check.replace(false)
    }

    fn check_addr(&self) -> u32 {
        self.check_addr
    }
}

/// Terminal that queues scripted host events on its first check.
pub struct MockTerminal {
    probe: Probe,
    wiring: TerminalWiring,
    script: Vec<HostEvent>,
}

impl MockTerminal {
    pub fn new(probe: Probe, wiring: TerminalWiring) -> Self {
        Self {
            probe,
            wiring,
            script: Vec::new(),
        }
    }

    pub fn with_script(mut self, script: Vec<HostEvent>) -> Self {
        self.script = script;
        self
    }
}

impl Terminal for MockTerminal {
    fn open(&mut self, width: u32, height: u32) {
        self.probe.record(format!("term.open {} {}", width, height));
    }

    fn check(&mut self) {
        self.probe.tally("term.check", 1);
        for event in self.script.drain(..) {
            let _ = self.wiring.events.send(event);
        }
    }

    fn set_message(&mut self, name: &str, value: &str) -> Result<(), MessageError> {
        self.probe.record(format!("{} {}", name, value));
        Ok(())
    }
}

/// In-memory clock store, shared with the test.
#[derive(Clone, Default)]
pub struct MemClockStore {
    pub data: Rc<RefCell<Option<Vec<u8>>>>,
}

impl MemClockStore {
    pub fn new(data: Option<Vec<u8>>) -> Self {
        Self {
            data: Rc::new(RefCell::new(data)),
        }
    }
}

impl ClockStore for MemClockStore {
    fn load(&mut self) -> Result<Vec<u8>, StoreError> {
        self.data.borrow().clone().ok_or(StoreError::Empty)
    }

    fn save(&mut self, data: &[u8]) -> Result<(), StoreError> {
        *self.data.borrow_mut() = Some(data.to_vec());
        Ok(())
    }

    fn name(&self) -> String {
        "memory".to_string()
    }
}
