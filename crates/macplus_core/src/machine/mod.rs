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

    machine::mod.rs

    The machine orchestrator.

    Machine owns every chip and the board logic between them. It is built by
    MachineBuilder, advanced by the external run loop through advance() or
    advance_one_step(), and takes host input through set_mouse(), set_key() and
    set_message().
*/
pub mod builder;
mod messages;
mod signals;
pub mod state;

pub use builder::MachineBuilder;
pub use state::MachineStringState;

use crossbeam_channel::Sender;

use crate::{
    bus::MacBus,
    clock_store::ClockStore,
    device_traits::{
        terminal::{HostEvent, KeyCode, KeyEvent},
        AdbHost, Cpu, CpuBus, Keyboard, Rtc, SccChannel, SerialLink, SharedDisks, SonyDriver, SoundChip, Terminal,
        Video,
    },
    devices::{
        mouse::QuadratureMouse,
        via_ports::{SignalRouter, ViaPortB, PORT_A_RESET, PORT_B_RESET},
    },
    interrupt::InterruptAggregator,
    machine_config::MachineConfig,
    machine_types::{BreakState, MacModel},
    memory::MemoryComposer,
    pacing::{PacingEngine, SpeedLimits, SpeedSlot},
    wires::SignalBus,
};

/// Speed limit requested while the floppy motor runs.
pub const DISK_MOTOR_SPEED: u32 = 4;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MachineState {
    Uninitialized,
    Initialized,
    Running,
    Paused,
    Destroyed,
}

pub struct Machine {
    config: MachineConfig,
    model: MacModel,
    state: MachineState,
    in_reset: bool,
    brk: BreakState,

    bus: MacBus,
    memory: MemoryComposer,
    signals: SignalBus,
    router: SignalRouter,
    interrupts: InterruptAggregator,
    port_b_input: ViaPortB,
    mouse: QuadratureMouse,
    pacing: PacingEngine,
    speed: SpeedLimits,

    cpu: Option<Box<dyn Cpu>>,
    serial: [Option<Box<dyn SerialLink>>; 2],
    rtc: Option<Box<dyn Rtc>>,
    keyboard: Option<Box<dyn Keyboard>>,
    adb: Option<Box<dyn AdbHost>>,
    adb_mouse: bool,
    adb_keyboard: bool,
    disks: SharedDisks,
    sony: Option<Box<dyn SonyDriver>>,
    sound: Option<Box<dyn SoundChip>>,
    terminal: Option<Box<dyn Terminal>>,
    video: Option<Box<dyn Video>>,
    clock_store: Option<Box<dyn ClockStore>>,
}

impl Machine {
    pub fn builder() -> MachineBuilder {
        MachineBuilder::new()
    }

    /// Log prefix with the address of the last instruction executed.
    pub(crate) fn pc_tag(&self) -> String {
        match self.cpu.as_ref() {
            Some(cpu) => format!("[{:06X}] ", cpu.last_pc()),
            None => String::new(),
        }
    }

    pub fn change_state(&mut self, new_state: MachineState) {
        match (self.state, new_state) {
            (MachineState::Uninitialized, MachineState::Initialized) => {
                log::debug!("Machine initialized");
                self.state = new_state;
            }
            (MachineState::Initialized, MachineState::Running) => {
                log::debug!("Starting machine...");
                self.state = new_state;
            }
            (MachineState::Running, MachineState::Paused) => {
                log::debug!("Pausing machine...");
                self.state = new_state;
            }
            (MachineState::Initialized, MachineState::Paused) => {
                log::warn!("Can't pause a machine that has not been reset");
            }
            (MachineState::Paused, MachineState::Running) => {
                log::debug!("Resuming machine...");
                self.state = new_state;
                self.pacing.discontinuity();
            }
            (_, MachineState::Destroyed) => {
                log::debug!("Destroying machine...");
                self.state = new_state;
            }
            _ => {}
        }
    }

    pub fn state(&self) -> MachineState {
        self.state
    }

    pub fn model(&self) -> MacModel {
        self.model
    }

    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    pub fn bus(&self) -> &MacBus {
        &self.bus
    }

    pub fn router(&self) -> &SignalRouter {
        &self.router
    }

    pub fn interrupts(&self) -> &InterruptAggregator {
        &self.interrupts
    }

    pub fn pacing(&self) -> &PacingEngine {
        &self.pacing
    }

    pub fn speed_limits(&self) -> SpeedLimits {
        self.speed
    }

    pub fn disks(&self) -> SharedDisks {
        self.disks.clone()
    }

    /// Current input latch of VIA port B.
    pub fn port_b_input(&self) -> ViaPortB {
        self.port_b_input
    }

    /// Queue for host input, for front ends without a Terminal.
    pub fn host_sender(&self) -> Sender<HostEvent> {
        self.signals.host_sender()
    }

    /// Reset every chip to its power-on state. Re-entrant calls, as from a CPU
    /// RESET instruction during the reset itself, are ignored.
    pub fn reset(&mut self) {
        if self.in_reset {
            return;
        }
        self.in_reset = true;
        log::debug!("{}mac: reset", self.pc_tag());

        self.mouse.reset();
        let level = self.interrupts.reset();
        self.set_cpu_interrupt(level);

        if let Err(e) = self.memory.reset(self.bus.space_mut(), self.model) {
            log::error!("mac: memory reset failed: {}", e);
        }

        self.router.reset();
        let level = self.interrupts.set_scsi_mask(self.router.port_b().scsi_int_disable());
        self.set_cpu_interrupt(level);
        self.port_b_input = ViaPortB::from_byte(PORT_B_RESET);
        if let Some(via) = self.bus.via.as_mut() {
            via.reset();
            via.set_port_a_input(PORT_A_RESET);
            via.set_port_b_input(PORT_B_RESET);
        }

        if let Some(sony) = self.sony.as_mut() {
            sony.reset();
        }
        if let Some(scsi) = self.bus.scsi.as_mut() {
            scsi.reset();
        }
        if let Some(scc) = self.bus.scc.as_mut() {
            scc.reset();
        }
        if let Some(adb) = self.adb.as_mut() {
            adb.reset();
        }
        if let Some(cpu) = self.cpu.as_mut() {
            cpu.reset(&mut self.bus);
        }

        self.pacing.discontinuity();
        // Signals raised by the reset itself are handled while the guard is up.
        self.process_signals();
        self.in_reset = false;

        // A paused machine stays paused across a reset.
        if self.state != MachineState::Paused {
            self.change_state(MachineState::Running);
        }
    }

    pub fn in_reset(&self) -> bool {
        self.in_reset
    }

    pub fn pause(&mut self, pause: bool) {
        if pause {
            self.change_state(MachineState::Paused);
        }
        else {
            self.change_state(MachineState::Running);
        }
    }

    pub fn is_paused(&self) -> bool {
        self.state == MachineState::Paused
    }

    /// The pending stop condition, cleared by reading it.
    pub fn take_break(&mut self) -> BreakState {
        std::mem::take(&mut self.brk)
    }

    pub fn set_break(&mut self, brk: BreakState) {
        self.brk = brk;
    }

    /// Run one CPU instruction's worth of clock units. While paused only the
    /// host is polled. Returns the units advanced.
    pub fn advance_one_step(&mut self) -> u64 {
        if self.is_paused() {
            self.poll_host();
            return 0;
        }
        self.advance(0)
    }

    /// Advance the machine by `n` CPU clock units. 0 means the duration of the
    /// last instruction.
    pub fn advance(&mut self, n: u64) -> u64 {
        let n = if n == 0 {
            self.cpu.as_ref().map(|cpu| cpu.delay() as u64).unwrap_or(0).max(1)
        }
        else {
            n
        };
        let tick = self.pacing.advance(n);

        if let Some(cpu) = self.cpu.as_mut() {
            cpu.clock(&mut self.bus, tick.cpu);
        }
        if let Some(sound) = self.sound.as_mut() {
            sound.clock(tick.cpu);
        }
        self.process_signals();

        if tick.via == 0 {
            return n;
        }
        if let Some(via) = self.bus.via.as_mut() {
            via.clock(tick.via);
        }
        if let Some(adb) = self.adb.as_mut() {
            adb.clock(tick.adb);
        }
        if let Some(iwm) = self.bus.iwm.as_mut() {
            iwm.clock(tick.via);
        }
        if tick.serial > 0 {
            if let Some(scc) = self.bus.scc.as_mut() {
                scc.clock(tick.serial);
            }
        }
        self.process_signals();

        if let Some(units) = tick.video {
            self.clock_video(units);
            self.process_signals();
        }

        if let Some(units) = tick.slow {
            self.poll_host();
            self.poll_mouse();
            if let Some(rtc) = self.rtc.as_mut() {
                rtc.clock(units);
            }
            self.process_signals();
            self.pacing.realtime_sync(units);
        }
        n
    }

    fn clock_video(&mut self, units: u64) {
        if let Some(video) = self.video.as_mut() {
            let frame = self.memory.ram_slice(
                self.bus.space(),
                self.router.video_base(),
                crate::memory::FRAME_SIZE,
            );
            video.clock(units, frame);
        }

        // Twice, to move characters in both directions in one pass.
        if let Some(scc) = self.bus.scc.as_deref_mut() {
            for link in self.serial.iter_mut().flatten() {
                link.process(scc);
                link.process(scc);
            }
        }

        if let Some(kbd) = self.keyboard.as_mut() {
            kbd.clock(units);
        }
    }

    /// Let the terminal poll the host, then handle whatever it queued.
    fn poll_host(&mut self) {
        if let Some(terminal) = self.terminal.as_mut() {
            terminal.check();
        }
        self.dispatch_host_events();
    }

    fn poll_mouse(&mut self) {
        if self.adb.is_some() {
            return;
        }
        let poll = self.mouse.poll();
        if let Some(x) = poll.x {
            self.port_b_input.set_mouse_x2(x.quadrature);
            self.push_port_b_input();
            if let Some(scc) = self.bus.scc.as_mut() {
                scc.set_dcd(SccChannel::A, x.dcd);
            }
        }
        if let Some(y) = poll.y {
            self.port_b_input.set_mouse_y2(y.quadrature);
            self.push_port_b_input();
            if let Some(scc) = self.bus.scc.as_mut() {
                scc.set_dcd(SccChannel::B, y.dcd);
            }
        }
    }

    pub(crate) fn push_port_b_input(&mut self) {
        let value = self.port_b_input.byte();
        if let Some(via) = self.bus.via.as_mut() {
            via.set_port_b_input(value);
        }
    }

    pub(crate) fn set_cpu_interrupt(&mut self, level: u8) {
        if let Some(cpu) = self.cpu.as_mut() {
            cpu.set_interrupt_level(level);
        }
    }

    /// Host pointer input: relative motion and the button mask.
    pub fn set_mouse(&mut self, dx: i32, dy: i32, buttons: u32) {
        if self.is_paused() {
            if buttons != 0 {
                self.pause(false);
            }
            return;
        }

        let change = self.mouse.set_buttons(buttons);
        if change.release {
            if let Err(e) = self.set_message("term.release", "1") {
                log::debug!("mac: {}", e);
            }
        }

        if self.adb_mouse {
            if let Some(adb) = self.adb.as_mut() {
                adb.mouse_move(buttons, dx, dy);
            }
            return;
        }

        if let Some(pressed) = change.primary {
            let old = self.port_b_input.byte();
            self.port_b_input.set_mouse_switch(!pressed);
            if self.port_b_input.byte() != old {
                self.push_port_b_input();
            }
        }
        self.mouse.add_motion(dx, dy);
    }

    pub fn set_key(&mut self, event: KeyEvent, key: KeyCode) {
        if event == KeyEvent::Magic {
            log::debug!("{}mac: hotkey {:?} ignored", self.pc_tag(), key);
            return;
        }
        if let Some(kbd) = self.keyboard.as_mut() {
            kbd.set_key(event, key);
        }
        if self.adb_keyboard {
            if let Some(adb) = self.adb.as_mut() {
                adb.set_key(event, key);
            }
        }
    }

    /// Set one speed limit and apply the resulting effective factor.
    pub fn set_speed(&mut self, slot: SpeedSlot, factor: u32) {
        self.speed.set(slot, factor);
        self.adjust_speed();
    }

    pub(crate) fn adjust_speed(&mut self) {
        let factor = self.speed.effective();
        if factor == self.pacing.speed_factor() {
            return;
        }
        log::debug!("{}speed: {}", self.pc_tag(), factor);
        if let Some(rtc) = self.rtc.as_mut() {
            rtc.set_realtime(factor != 1);
        }
        self.pacing.set_speed_factor(factor);
        self.pacing.discontinuity();
    }

    pub fn register(&self, name: &str) -> Option<u32> {
        self.cpu.as_ref()?.register(name)
    }

    pub fn set_register(&mut self, name: &str, value: u32) -> bool {
        self.cpu.as_mut().map(|cpu| cpu.set_register(name, value)).unwrap_or(false)
    }

    /// Debugger memory access through the machine bus.
    pub fn read_u8(&mut self, address: u32) -> u8 {
        self.bus.read_u8(address)
    }

    /// Debugger memory write through the machine bus. Chip register writes
    /// take effect immediately.
    pub fn write_u8(&mut self, address: u32, data: u8) {
        self.bus.write_u8(address, data);
        self.process_signals();
    }

    /// Save the parameter RAM to the clock store.
    pub fn save_pram(&mut self) {
        let (Some(rtc), Some(store)) = (self.rtc.as_ref(), self.clock_store.as_mut()) else {
            return;
        };
        log::debug!("RTC: saving parameter RAM to {}", store.name());
        if let Err(e) = store.save(&rtc.pram()) {
            log::error!("writing rtc file failed ({}): {}", store.name(), e);
        }
    }
}

impl Drop for Machine {
    fn drop(&mut self) {
        self.change_state(MachineState::Destroyed);
        self.save_pram();

        let failed = self.disks.borrow_mut().commit_all();
        for drive in failed {
            log::error!("DISK: commit failed for drive {}", drive);
        }

        // Reverse of construction order.
        self.video = None;
        self.terminal = None;
        self.sound = None;
        self.sony = None;
        self.bus.scsi = None;
        self.bus.iwm = None;
        self.adb = None;
        self.keyboard = None;
        self.rtc = None;
        self.serial = [None, None];
        self.bus.scc = None;
        self.bus.via = None;
        self.cpu = None;
    }
}

#[cfg(test)]
mod tests;
