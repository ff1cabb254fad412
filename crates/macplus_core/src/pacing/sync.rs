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

    pacing::sync.rs

    Wall-clock synchronization.

    Every sync period of emulated time the elapsed host time is measured. Running
    ahead builds up sleep debt, which is paid with a blocking sleep once it
    crosses a threshold. Running behind lets the debt go negative and withdraws
    the extra cycles granted to the CPU in dynamic speed mode.
*/
use std::time::Duration;

use web_time::Instant;

/// The Mac Plus CPU clock in Hz.
pub const CPU_CLOCK: u64 = 7_833_600;
/// Synchronizations per second.
pub const SYNC_RATE: u64 = 250;
pub const SYNC_PERIOD_UNITS: u64 = CPU_CLOCK / SYNC_RATE;
pub const SYNC_PERIOD_US: i64 = 1_000_000 / SYNC_RATE as i64;
/// A stall longer than this is forgiven rather than caught up.
pub const FORGIVE_US: i64 = 1_000_000;

cfg_if::cfg_if! {
    if #[cfg(windows)] {
        // Coarser sleep granularity.
        pub const SLEEP_THRESHOLD_US: i64 = 20_000;
    }
    else {
        pub const SLEEP_THRESHOLD_US: i64 = 10_000;
    }
}

/// Host time source. The only place the emulator blocks.
pub trait HostClock {
    /// Monotonic microseconds.
    fn now_us(&mut self) -> u64;
    fn sleep_us(&mut self, us: u64);
}

pub struct SystemClock {
    start: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self { start: Instant::now() }
    }
}

impl SystemClock {
    pub fn new() -> Self {
        Default::default()
    }
}

impl HostClock for SystemClock {
    fn now_us(&mut self) -> u64 {
        self.start.elapsed().as_micros() as u64
    }

    fn sleep_us(&mut self, us: u64) {
        std::thread::sleep(Duration::from_micros(us));
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SyncStats {
    pub periods: u64,
    pub sleeps: u64,
    pub forgiven: u64,
}

pub struct RealtimeSync {
    clock: Box<dyn HostClock>,
    sync_clk: u64, // Units toward the next sync period
    last_us: u64,  // Host time of the last measurement
    debt: i64,     // Microseconds ahead of the host (positive) or behind (negative)
    stats: SyncStats,
}

impl RealtimeSync {
    pub fn new(mut clock: Box<dyn HostClock>) -> Self {
        let last_us = clock.now_us();
        Self {
            clock,
            sync_clk: 0,
            last_us,
            debt: 0,
            stats: Default::default(),
        }
    }

    /// Restart the measurement from now. Used after pauses and speed changes.
    pub fn discontinuity(&mut self) {
        self.sync_clk = 0;
        self.last_us = self.clock.now_us();
    }

    pub fn debt(&self) -> i64 {
        self.debt
    }

    pub fn stats(&self) -> SyncStats {
        self.stats
    }

    /// Account for `units` of emulated time. At most one period is measured per call.
    /// `extra` is the dynamic mode cycle credit.
    pub fn sync(&mut self, units: u64, extra: &mut u64) {
        self.sync_clk += units;
        if self.sync_clk < SYNC_PERIOD_UNITS {
            return;
        }
        self.sync_clk -= SYNC_PERIOD_UNITS;
        self.stats.periods += 1;

        let now = self.clock.now_us();
        let elapsed = now.saturating_sub(self.last_us) as i64;
        self.last_us = now;

        if elapsed < SYNC_PERIOD_US {
            self.debt += SYNC_PERIOD_US - elapsed;
            if self.debt > 0 {
                *extra += 1;
            }
        }
        else {
            self.debt -= elapsed - SYNC_PERIOD_US;
            if self.debt < 0 && *extra > 0 {
                *extra -= 1;
            }
        }

        // The debt stays; the next interval includes the sleep and settles it.
        if self.debt >= SLEEP_THRESHOLD_US {
            self.stats.sleeps += 1;
            self.clock.sleep_us(self.debt as u64);
        }

        if self.debt < -FORGIVE_US {
            log::debug!("system too slow, skipping 1 second");
            self.debt += FORGIVE_US;
            self.stats.forgiven += 1;
        }
    }
}
