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

    machine::builder.rs

    Machine construction.

    Chips are supplied as factories that receive their wiring. Setup runs in a
    fixed order; a chip that fails to construct is logged and left absent, and
    the rest of the machine is built without it.
*/
use anyhow::Result;

use crate::{
    bus::{MacBus, RegisterWindow},
    clock_store::ClockStore,
    device_traits::{
        AdbHost, Cpu, DiskImage, DiskSet, Iwm, Keyboard, Rtc, Scc, SccChannel, Scsi, SerialLink, SonyDriver,
        SoundChip, Terminal, Via, Video,
    },
    devices::{
        mouse::QuadratureMouse,
        via_ports::{SignalRouter, ViaPortB, PORT_B_RESET},
    },
    interrupt::InterruptAggregator,
    machine::{Machine, MachineState},
    machine_config::{MachineConfig, VIDEO_HEIGHT, VIDEO_WIDTH},
    memory::{BufferLayout, MemoryComposer},
    pacing::{HostClock, PacingEngine, SpeedLimits, SystemClock},
    wires::{
        AdbWiring, CpuWiring, IwmWiring, KeyboardWiring, RtcWiring, SccWiring, ScsiWiring, SignalBus, SonyWiring,
        TerminalWiring, ViaWiring, VideoWiring,
    },
};

pub type DeviceFactory<W, D> = Box<dyn FnOnce(W) -> Result<D>>;
pub type SerialFactory = Box<dyn FnMut(SccChannel, &str) -> Result<Box<dyn SerialLink>>>;

/// PRAM bytes that make the ROM disk the startup device.
const PRAM_ROMDISK: (usize, [u8; 4]) = (0x78, [0x00, 0x06, 0xFF, 0xCB]);
const PRAM_APPLETALK: usize = 0x13;

pub const TITLE: &str = "macplus";

fn construct<W, D>(name: &str, factory: Option<DeviceFactory<W, D>>, wiring: W) -> Option<D> {
    let factory = factory?;
    match factory(wiring) {
        Ok(device) => Some(device),
        Err(e) => {
            log::error!("{}: setup failed: {}", name, e);
            None
        }
    }
}

#[derive(Default)]
pub struct MachineBuilder {
    config: MachineConfig,
    rom_image: Option<Vec<u8>>,
    host_clock: Option<Box<dyn HostClock>>,
    clock_store: Option<Box<dyn ClockStore>>,
    disks: Vec<(u32, Box<dyn DiskImage>)>,
    cpu: Option<DeviceFactory<CpuWiring, Box<dyn Cpu>>>,
    via: Option<DeviceFactory<ViaWiring, Box<dyn Via>>>,
    scc: Option<DeviceFactory<SccWiring, Box<dyn Scc>>>,
    serial: Option<SerialFactory>,
    rtc: Option<DeviceFactory<RtcWiring, Box<dyn Rtc>>>,
    keyboard: Option<DeviceFactory<KeyboardWiring, Box<dyn Keyboard>>>,
    adb: Option<DeviceFactory<AdbWiring, Box<dyn AdbHost>>>,
    iwm: Option<DeviceFactory<IwmWiring, Box<dyn Iwm>>>,
    scsi: Option<DeviceFactory<ScsiWiring, Box<dyn Scsi>>>,
    sony: Option<DeviceFactory<SonyWiring, Box<dyn SonyDriver>>>,
    sound: Option<DeviceFactory<(), Box<dyn SoundChip>>>,
    terminal: Option<DeviceFactory<TerminalWiring, Box<dyn Terminal>>>,
    video: Option<DeviceFactory<VideoWiring, Box<dyn Video>>>,
}

impl MachineBuilder {
    pub fn new() -> Self {
        MachineBuilder { ..Default::default() }
    }

    pub fn with_config(mut self, config: MachineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_rom_image(mut self, image: Vec<u8>) -> Self {
        self.rom_image = Some(image);
        self
    }

    pub fn with_host_clock(mut self, clock: Box<dyn HostClock>) -> Self {
        self.host_clock = Some(clock);
        self
    }

    pub fn with_clock_store(mut self, store: Box<dyn ClockStore>) -> Self {
        self.clock_store = Some(store);
        self
    }

    pub fn with_disk(mut self, drive: u32, image: Box<dyn DiskImage>) -> Self {
        self.disks.push((drive, image));
        self
    }

    pub fn with_cpu(mut self, f: impl FnOnce(CpuWiring) -> Result<Box<dyn Cpu>> + 'static) -> Self {
        self.cpu = Some(Box::new(f));
        self
    }

    pub fn with_via(mut self, f: impl FnOnce(ViaWiring) -> Result<Box<dyn Via>> + 'static) -> Self {
        self.via = Some(Box::new(f));
        self
    }

    pub fn with_scc(mut self, f: impl FnOnce(SccWiring) -> Result<Box<dyn Scc>> + 'static) -> Self {
        self.scc = Some(Box::new(f));
        self
    }

    /// Opens the host side of a serial port from its driver string.
    pub fn with_serial(mut self, f: impl FnMut(SccChannel, &str) -> Result<Box<dyn SerialLink>> + 'static) -> Self {
        self.serial = Some(Box::new(f));
        self
    }

    pub fn with_rtc(mut self, f: impl FnOnce(RtcWiring) -> Result<Box<dyn Rtc>> + 'static) -> Self {
        self.rtc = Some(Box::new(f));
        self
    }

    pub fn with_keyboard(mut self, f: impl FnOnce(KeyboardWiring) -> Result<Box<dyn Keyboard>> + 'static) -> Self {
        self.keyboard = Some(Box::new(f));
        self
    }

    pub fn with_adb(mut self, f: impl FnOnce(AdbWiring) -> Result<Box<dyn AdbHost>> + 'static) -> Self {
        self.adb = Some(Box::new(f));
        self
    }

    pub fn with_iwm(mut self, f: impl FnOnce(IwmWiring) -> Result<Box<dyn Iwm>> + 'static) -> Self {
        self.iwm = Some(Box::new(f));
        self
    }

    pub fn with_scsi(mut self, f: impl FnOnce(ScsiWiring) -> Result<Box<dyn Scsi>> + 'static) -> Self {
        self.scsi = Some(Box::new(f));
        self
    }

    pub fn with_sony(mut self, f: impl FnOnce(SonyWiring) -> Result<Box<dyn SonyDriver>> + 'static) -> Self {
        self.sony = Some(Box::new(f));
        self
    }

    pub fn with_sound(mut self, f: impl FnOnce() -> Result<Box<dyn SoundChip>> + 'static) -> Self {
        self.sound = Some(Box::new(move |()| f()));
        self
    }

    pub fn with_terminal(mut self, f: impl FnOnce(TerminalWiring) -> Result<Box<dyn Terminal>> + 'static) -> Self {
        self.terminal = Some(Box::new(f));
        self
    }

    pub fn with_video(mut self, f: impl FnOnce(VideoWiring) -> Result<Box<dyn Video>> + 'static) -> Self {
        self.video = Some(Box::new(f));
        self
    }

    /// Construct and wire the machine. Only an invalid configuration fails;
    /// chip failures leave the chip absent.
    pub fn build(self) -> Result<Machine> {
        let config = self.config;
        config.validate()?;
        let model = config.system.model;
        let signals = SignalBus::new();

        log::debug!("SYSTEM: model={} memtest={}", model, config.system.memtest);

        // Memory
        let mut bus = MacBus::new();
        let memory = MemoryComposer::build(bus.space_mut(), &config, self.rom_image);
        let buffers = BufferLayout::from_ram_size(memory.ram_size(bus.space()));
        log::debug!(
            "RAM: vbuf1=0x{:06X} vbuf2=0x{:06X} sbuf1=0x{:06X} sbuf2=0x{:06X}",
            buffers.vbuf1,
            buffers.vbuf2,
            buffers.sbuf1,
            buffers.sbuf2
        );

        // CPU
        log::debug!("CPU: model={} speed={}", config.cpu.model, config.cpu.speed);
        let mut cpu = construct("CPU", self.cpu, signals.cpu());
        if let Some(cpu) = cpu.as_mut() {
            if let Err(e) = cpu.set_model(config.cpu.model) {
                log::error!("CPU: unknown model ({}): {}", config.cpu.model, e);
            }
        }
        let speed = SpeedLimits::new(config.cpu.speed);
        let host_clock = self
            .host_clock
            .unwrap_or_else(|| Box::new(SystemClock::new()) as Box<dyn HostClock>);
        let pacing = PacingEngine::new(host_clock, speed.effective());

        // VIA
        bus.via = construct("VIA", self.via, signals.via());
        memory.map_window(bus.space_mut(), RegisterWindow::Via);

        // SCC
        bus.scc = construct("SCC", self.scc, signals.scc());
        memory.map_window(bus.space_mut(), RegisterWindow::Scc);
        if let Some(scc) = bus.scc.as_mut() {
            let m = config.serial.multichar;
            scc.set_multichar(SccChannel::A, m, m);
            scc.set_multichar(SccChannel::B, m, m);
        }

        // Serial ports
        let mut serial: [Option<Box<dyn SerialLink>>; 2] = [None, None];
        if let Some(mut open) = self.serial {
            for (i, channel) in [SccChannel::A, SccChannel::B].into_iter().enumerate() {
                let Some(driver) = config.serial.drivers[i].as_deref() else {
                    continue;
                };
                log::debug!("SERIAL: port={} driver={}", i, driver);
                match open(channel, driver) {
                    Ok(link) => serial[i] = Some(link),
                    Err(e) => log::error!("SERIAL: can't open driver ({}): {}", driver, e),
                }
            }
        }

        // RTC
        let mut clock_store = self.clock_store;
        let mut rtc = construct("RTC", self.rtc, signals.rtc());
        if let Some(rtc) = rtc.as_mut() {
            Self::setup_rtc(&mut **rtc, clock_store.as_deref_mut(), &config);
        }

        // Keyboard
        let mut keyboard = None;
        if model.has_serial_keyboard() {
            log::debug!(
                "KBD: model={} intl={} keypad={}",
                config.keyboard.model,
                config.keyboard.intl,
                if config.keyboard.keypad_motion { "motion" } else { "keypad" }
            );
            keyboard = construct("KBD", self.keyboard, signals.keyboard());
            if let Some(kbd) = keyboard.as_mut() {
                kbd.set_model(config.keyboard.model, config.keyboard.intl);
                kbd.set_keypad_motion(config.keyboard.keypad_motion);
            }
        }

        // ADB
        let mut adb = None;
        let mut adb_mouse = false;
        let mut adb_keyboard = false;
        if model.has_adb() {
            log::debug!("ADB: mouse={} keyboard={}", config.adb.mouse, config.adb.keyboard);
            adb = construct("ADB", self.adb, signals.adb());
            if let Some(adb) = adb.as_mut() {
                if config.adb.mouse {
                    adb_mouse = adb.attach_mouse();
                    if !adb_mouse {
                        log::error!("ADB: can't create mouse");
                    }
                }
                if config.adb.keyboard {
                    adb_keyboard = adb.attach_keyboard(config.adb.keypad_motion);
                    if !adb_keyboard {
                        log::error!("ADB: can't create keyboard");
                    }
                }
            }
        }

        // Disks
        let mut disk_set = DiskSet::new();
        for (drive, image) in self.disks {
            disk_set.insert(drive, image);
        }
        if disk_set.is_empty() {
            log::debug!("DISK: no disks");
        }
        let disks = disk_set.into_shared();

        // IWM
        bus.iwm = construct("IWM", self.iwm, signals.iwm(disks.clone()));
        memory.map_window(bus.space_mut(), RegisterWindow::Iwm);
        if let Some(iwm) = bus.iwm.as_mut() {
            for (i, drive) in config.iwm.drives.iter().enumerate() {
                log::debug!(
                    "IWM: drive={} disk={} inserted={} single_sided={} auto_rotate={}",
                    drive.drive,
                    drive.disk,
                    drive.inserted,
                    drive.single_sided,
                    drive.auto_rotate
                );
                iwm.configure_drive(i, drive);
            }
        }

        // SCSI
        bus.scsi = construct(
            "SCSI",
            self.scsi,
            signals.scsi(disks.clone(), model.has_scsi_interrupt()),
        );
        memory.map_window(bus.space_mut(), RegisterWindow::Scsi);
        if let Some(scsi) = bus.scsi.as_mut() {
            for dev in &config.scsi.devices {
                log::debug!(
                    "SCSI: id={} drive={} vendor=\"{}\" product=\"{}\"",
                    dev.id,
                    dev.drive,
                    dev.vendor,
                    dev.product
                );
                scsi.set_drive(dev.id, dev.drive, &dev.vendor, &dev.product);
            }
        }

        // Sony
        let sony = construct("SONY", self.sony, signals.sony(disks.clone()));

        // Sound
        log::debug!(
            "SOUND: lowpass={} driver={}",
            config.sound.lowpass,
            config.sound.driver
        );
        let mut sound = construct("SOUND", self.sound, ());
        if let Some(sound) = sound.as_mut() {
            sound.set_lowpass(config.sound.lowpass);
        }

        // Terminal
        let terminal = construct("TERM", self.terminal, signals.terminal());
        if terminal.is_none() {
            log::debug!("TERM: no terminal");
        }

        // Video
        log::debug!(
            "VIDEO: w={} h={} brightness={}",
            VIDEO_WIDTH,
            VIDEO_HEIGHT,
            config.video.brightness
        );
        let mut video = construct("VIDEO", self.video, signals.video());
        if let Some(video) = video.as_mut() {
            video.set_colors(config.video.color0, config.video.color1);
            video.set_brightness(config.video.scaled_brightness());
        }

        let router = SignalRouter::new(model, buffers);

        let mut machine = Machine {
            config,
            model,
            state: MachineState::Uninitialized,
            in_reset: false,
            brk: Default::default(),
            bus,
            memory,
            signals,
            router,
            interrupts: InterruptAggregator::new(),
            port_b_input: ViaPortB::from_byte(PORT_B_RESET),
            mouse: QuadratureMouse::new(),
            pacing,
            speed,
            cpu,
            serial,
            rtc,
            keyboard,
            adb,
            adb_mouse,
            adb_keyboard,
            disks,
            sony,
            sound,
            terminal,
            video,
            clock_store,
        };

        if machine.video.is_some() {
            if let Some(terminal) = machine.terminal.as_mut() {
                terminal.open(VIDEO_WIDTH, VIDEO_HEIGHT);
            }
        }
        let buffers = *machine.router.buffers();
        machine.memory.clear_frame(machine.bus.space_mut(), &buffers);

        if machine.terminal.is_some() {
            if let Err(e) = machine.set_message("term.title", TITLE) {
                log::warn!("{}", e);
            }
        }
        machine.pacing.discontinuity();
        machine.change_state(MachineState::Initialized);
        Ok(machine)
    }

    fn setup_rtc(rtc: &mut dyn Rtc, store: Option<&mut (dyn ClockStore + 'static)>, config: &MachineConfig) {
        log::debug!(
            "RTC: file={} realtime=1 start={}",
            config.rtc.file.display(),
            config.rtc.start.as_deref().unwrap_or("now")
        );
        rtc.set_realtime(true);

        if let Some(store) = store {
            match store.load() {
                Ok(data) => rtc.load_pram(&data),
                Err(e) => log::error!("reading rtc file failed ({}): {}", store.name(), e),
            }
        }

        if config.rtc.romdisk {
            let (offset, bytes) = PRAM_ROMDISK;
            for (i, b) in bytes.into_iter().enumerate() {
                rtc.set_pram_byte(offset + i, b);
            }
        }
        if let Some(appletalk) = config.rtc.appletalk {
            rtc.set_pram_byte(PRAM_APPLETALK, if appletalk { 0x21 } else { 0x22 });
        }

        match config.rtc.start.as_deref() {
            Some(start) => {
                if !rtc.set_time_str(start) {
                    log::error!("RTC: bad start time ({})", start);
                }
            }
            None => rtc.set_time_now(),
        }
    }
}
