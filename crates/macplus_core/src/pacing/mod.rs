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

    pacing::mod.rs

    The clock cascade and speed control.

    CPU clock units feed a chain of stages:

      CPU units -> / speed factor -> / 10 (VIA, IWM, ADB, SCC) -> 256 (video)
        -> 8192 (slow poll: terminal, mouse, RTC, wall-clock sync)

    The engine only counts. It reports what each stage produced in a ClockTick
    and the machine clocks the chips accordingly.
*/
pub mod divider;
pub mod sync;

pub use divider::{DivisorStage, RatioStage, ThresholdStage};
pub use sync::{HostClock, RealtimeSync, SyncStats, SystemClock};

pub const VIA_DIVISOR: u64 = 10;
pub const VIDEO_THRESHOLD: u64 = 256;
pub const SLOW_POLL_THRESHOLD: u64 = 8192;
// 3.672 MHz = 15/32 * 7.8336 MHz
pub const SERIAL_MUL: u64 = 15;
pub const SERIAL_DIV: u64 = 32;

pub const SPEED_SLOTS: usize = 2;

/// Sources of a speed limit. The effective factor is the smallest non-zero slot.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SpeedSlot {
    User = 0,
    DiskMotor = 1,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SpeedLimits {
    slots: [u32; SPEED_SLOTS],
}

impl SpeedLimits {
    pub fn new(user: u32) -> Self {
        let mut limits = Self::default();
        limits.set(SpeedSlot::User, user);
        limits
    }

    pub fn set(&mut self, slot: SpeedSlot, factor: u32) {
        self.slots[slot as usize] = factor;
    }

    pub fn get(&self, slot: SpeedSlot) -> u32 {
        self.slots[slot as usize]
    }

    /// Minimum of the non-zero slots, or 0 (dynamic) when every slot is 0.
    pub fn effective(&self) -> u32 {
        self.slots.iter().copied().filter(|&v| v > 0).min().unwrap_or(0)
    }

    pub fn slots(&self) -> [u32; SPEED_SLOTS] {
        self.slots
    }
}

/// What one advance produced at each stage.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ClockTick {
    pub cpu:    u64,         // CPU and sound units, including dynamic credit
    pub via:    u64,         // VIA and IWM steps
    pub adb:    u64,         // ADB units (10 per VIA step)
    pub serial: u64,         // SCC clocks
    pub video:  Option<u64>, // Units flushed to video, serial and keyboard
    pub slow:   Option<u64>, // Units flushed to the slow poll
}

/// Cumulative units delivered by each stage.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct StageCounts {
    pub units:  u64,
    pub cpu:    u64,
    pub via:    u64,
    pub serial: u64,
    pub video:  u64,
    pub slow:   u64,
}

pub struct PacingEngine {
    cpu_stage: DivisorStage,
    via_stage: DivisorStage,
    video_stage: ThresholdStage,
    slow_stage: ThresholdStage,
    serial_stage: RatioStage,
    speed_factor: u32,
    extra: u64,
    counts: StageCounts,
    sync: RealtimeSync,
}

impl PacingEngine {
    pub fn new(clock: Box<dyn HostClock>, speed_factor: u32) -> Self {
        let mut engine = Self {
            cpu_stage: DivisorStage::new(1),
            via_stage: DivisorStage::new(VIA_DIVISOR),
            video_stage: ThresholdStage::new(VIDEO_THRESHOLD),
            slow_stage: ThresholdStage::new(SLOW_POLL_THRESHOLD),
            serial_stage: RatioStage::new(SERIAL_MUL, SERIAL_DIV),
            speed_factor,
            extra: 0,
            counts: Default::default(),
            sync: RealtimeSync::new(clock),
        };
        engine.set_speed_factor(speed_factor);
        engine
    }

    /// Advance by `n` CPU clock units.
    pub fn advance(&mut self, n: u64) -> ClockTick {
        let mut tick = ClockTick {
            cpu: if self.speed_factor == 0 { n + self.extra } else { n },
            ..Default::default()
        };
        self.counts.units += n;
        self.counts.cpu += tick.cpu;

        let ticks = self.cpu_stage.add(n);
        tick.via = self.via_stage.add(ticks);
        if tick.via == 0 {
            return tick;
        }

        let units = VIA_DIVISOR * tick.via;
        tick.adb = units;
        tick.serial = self.serial_stage.add(units);
        self.counts.via += tick.via;
        self.counts.serial += tick.serial;

        tick.video = self.video_stage.add(units);
        if let Some(video) = tick.video {
            self.counts.video += video;
            tick.slow = self.slow_stage.add(video);
            if let Some(slow) = tick.slow {
                self.counts.slow += slow;
            }
        }
        tick
    }

    /// Wall-clock synchronization, run from the slow poll.
    pub fn realtime_sync(&mut self, units: u64) {
        self.sync.sync(units, &mut self.extra);
    }

    pub fn discontinuity(&mut self) {
        self.sync.discontinuity();
        self.extra = 0;
    }

    pub fn set_speed_factor(&mut self, factor: u32) {
        self.speed_factor = factor;
        self.cpu_stage.set_period(factor.max(1) as u64);
        self.extra = 0;
    }

    pub fn speed_factor(&self) -> u32 {
        self.speed_factor
    }

    pub fn extra(&self) -> u64 {
        self.extra
    }

    pub fn debt(&self) -> i64 {
        self.sync.debt()
    }

    pub fn sync_stats(&self) -> SyncStats {
        self.sync.stats()
    }

    pub fn counts(&self) -> StageCounts {
        self.counts
    }

    /// Total CPU clock units advanced.
    pub fn clock_count(&self) -> u64 {
        self.counts.units
    }

    /// Pending units in each stage, leaves first.
    pub fn pending(&self) -> [u64; 5] {
        [
            self.cpu_stage.pending(),
            self.via_stage.pending(),
            self.serial_stage.pending(),
            self.video_stage.pending(),
            self.slow_stage.pending(),
        ]
    }
}
