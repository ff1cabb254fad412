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

    wires.rs

    Signal lines between chips.

    Each outward line of a chip is a Wire: a sender bound to one Signal variant.
    A chip only receives the wires it drives, so it cannot reach anything else on
    the board. The machine drains the signal queue after each operation and
    routes every signal to its destination.
*/
use crossbeam_channel::{unbounded, Receiver, Sender};

use crate::{
    device_traits::{terminal::HostEvent, SharedDisks},
    interrupt::IrqSource,
};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Signal {
    Interrupt(IrqSource, bool),
    ViaPortA(u8),
    ViaPortB(u8),
    ViaShiftOut(u8),
    ViaCb2(bool),
    KeyboardData(u8),
    AdbShiftIn(u8),
    AdbInterrupt(bool),
    RtcData(bool),
    RtcOneSecond(bool),
    VerticalBlank(bool),
    IwmMotor(bool),
    CpuReset(bool),
}

/// One outward line of a chip.
pub struct Wire<T> {
    tx: Sender<Signal>,
    route: fn(T) -> Signal,
}

impl<T> Clone for Wire<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            route: self.route,
        }
    }
}

impl<T> Wire<T> {
    pub fn new(tx: Sender<Signal>, route: fn(T) -> Signal) -> Self {
        Self { tx, route }
    }

    #[inline]
    pub fn set(&self, value: T) {
        // The receiver only goes away during machine teardown.
        if self.tx.send((self.route)(value)).is_err() {
            log::trace!("Wire::set(): machine is gone, signal dropped");
        }
    }
}

pub type BitLine = Wire<bool>;
pub type ByteLine = Wire<u8>;

pub struct CpuWiring {
    pub reset: BitLine,
}

pub struct ViaWiring {
    pub irq: BitLine,
    pub port_a: ByteLine,
    pub port_b: ByteLine,
    pub shift_out: ByteLine,
    pub cb2: BitLine,
}

pub struct SccWiring {
    pub irq: BitLine,
}

pub struct ScsiWiring {
    /// Only connected on machines that route the SCSI interrupt.
    pub irq: Option<BitLine>,
    pub disks: SharedDisks,
}

pub struct IwmWiring {
    pub motor: BitLine,
    pub disks: SharedDisks,
}

pub struct RtcWiring {
    pub data: BitLine,
    pub one_second: BitLine,
}

pub struct KeyboardWiring {
    pub data: ByteLine,
    pub irq: Wire<(u8, bool)>,
}

pub struct AdbWiring {
    pub shift_in: ByteLine,
    pub irq: BitLine,
}

pub struct VideoWiring {
    pub vbi: BitLine,
}

pub struct SonyWiring {
    pub disks: SharedDisks,
}

pub struct TerminalWiring {
    pub events: Sender<HostEvent>,
}

/// Owns both ends of the signal queue and hands out wires.
pub struct SignalBus {
    tx: Sender<Signal>,
    rx: Receiver<Signal>,
    host_tx: Sender<HostEvent>,
    host_rx: Receiver<HostEvent>,
}

impl SignalBus {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        let (host_tx, host_rx) = unbounded();
        Self {
            tx,
            rx,
            host_tx,
            host_rx,
        }
    }

    fn wire<T>(&self, route: fn(T) -> Signal) -> Wire<T> {
        Wire::new(self.tx.clone(), route)
    }

    pub fn cpu(&self) -> CpuWiring {
        CpuWiring {
            reset: self.wire(Signal::CpuReset),
        }
    }

    pub fn via(&self) -> ViaWiring {
        ViaWiring {
            irq: self.wire(|v: bool| Signal::Interrupt(IrqSource::Via, v)),
            port_a: self.wire(Signal::ViaPortA),
            port_b: self.wire(Signal::ViaPortB),
            shift_out: self.wire(Signal::ViaShiftOut),
            cb2: self.wire(Signal::ViaCb2),
        }
    }

    pub fn scc(&self) -> SccWiring {
        SccWiring {
            irq: self.wire(|v: bool| Signal::Interrupt(IrqSource::Scc, v)),
        }
    }

    pub fn scsi(&self, disks: SharedDisks, irq_connected: bool) -> ScsiWiring {
        ScsiWiring {
            irq: irq_connected.then(|| self.wire(|v: bool| Signal::Interrupt(IrqSource::Scsi, v))),
            disks,
        }
    }

    pub fn iwm(&self, disks: SharedDisks) -> IwmWiring {
        IwmWiring {
            motor: self.wire(Signal::IwmMotor),
            disks,
        }
    }

    pub fn rtc(&self) -> RtcWiring {
        RtcWiring {
            data: self.wire(Signal::RtcData),
            one_second: self.wire(Signal::RtcOneSecond),
        }
    }

    pub fn keyboard(&self) -> KeyboardWiring {
        KeyboardWiring {
            data: self.wire(Signal::KeyboardData),
            irq: self.wire(|(level, v): (u8, bool)| Signal::Interrupt(IrqSource::Keyboard(level), v)),
        }
    }

    pub fn adb(&self) -> AdbWiring {
        AdbWiring {
            shift_in: self.wire(Signal::AdbShiftIn),
            irq: self.wire(Signal::AdbInterrupt),
        }
    }

    pub fn video(&self) -> VideoWiring {
        VideoWiring {
            vbi: self.wire(Signal::VerticalBlank),
        }
    }

    pub fn sony(&self, disks: SharedDisks) -> SonyWiring {
        SonyWiring { disks }
    }

    pub fn terminal(&self) -> TerminalWiring {
        TerminalWiring {
            events: self.host_tx.clone(),
        }
    }

    /// Sender for host events, for front ends that inject input directly.
    pub fn host_sender(&self) -> Sender<HostEvent> {
        self.host_tx.clone()
    }

    #[inline]
    pub fn try_recv(&self) -> Option<Signal> {
        self.rx.try_recv().ok()
    }

    #[inline]
    pub fn try_recv_host(&self) -> Option<HostEvent> {
        self.host_rx.try_recv().ok()
    }

    pub fn pending(&self) -> usize {
        self.rx.len()
    }
}
