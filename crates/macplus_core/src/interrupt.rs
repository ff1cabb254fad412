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

    interrupt.rs

    Interrupt request aggregation.

    The 68000 has a single priority-encoded interrupt input. Each source owns one
    bit of a level mask; the level presented to the CPU is the highest set bit.
    Level 1 is shared: it is the OR of the VIA and (on the SE) the SCSI
    controller, and the SCSI half is gated by VIA port B bit 6.
*/
use std::fmt;

pub const VIA_LEVEL: u8 = 1;
pub const SCC_LEVEL: u8 = 2;
pub const MAX_LEVEL: u8 = 7;

/// Interrupt request sources feeding the aggregator.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum IrqSource {
    Via,
    Scsi,
    Scc,
    /// The keyboard names its own level.
    Keyboard(u8),
}

impl fmt::Display for IrqSource {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            IrqSource::Via => write!(f, "via"),
            IrqSource::Scsi => write!(f, "scsi"),
            IrqSource::Scc => write!(f, "scc"),
            IrqSource::Keyboard(level) => write!(f, "kbd({})", level),
        }
    }
}

#[derive(Default)]
pub struct InterruptAggregator {
    // Bit n set means level n is requested. Bit 0 is unused.
    pending: u8,
    via: bool,
    scsi_raw: bool,
    scsi_masked: bool,
    level: u8,
}

impl InterruptAggregator {
    pub fn new() -> Self {
        Default::default()
    }

    /// Mark or clear one source. Returns the effective level.
    pub fn set_source(&mut self, source: IrqSource, asserted: bool) -> u8 {
        match source {
            IrqSource::Via => {
                self.via = asserted;
                self.update_shared();
            }
            IrqSource::Scsi => {
                self.scsi_raw = asserted;
                self.update_shared();
            }
            IrqSource::Scc => self.set_level_bit(SCC_LEVEL, asserted),
            IrqSource::Keyboard(level) => self.set_level_bit(level, asserted),
        }
        self.reassert()
    }

    /// Gate the SCSI half of level 1. Driven by VIA port B bit 6.
    pub fn set_scsi_mask(&mut self, masked: bool) -> u8 {
        self.scsi_masked = masked;
        self.update_shared();
        self.reassert()
    }

    fn update_shared(&mut self) {
        let shared = self.via || (self.scsi_raw && !self.scsi_masked);
        self.set_level_bit(VIA_LEVEL, shared);
    }

    fn set_level_bit(&mut self, level: u8, asserted: bool) {
        if level == 0 || level > MAX_LEVEL {
            log::warn!("interrupt: ignoring request at invalid level {}", level);
            return;
        }
        if asserted {
            self.pending |= 1 << level;
        }
        else {
            self.pending &= !(1 << level);
        }
    }

    /// Recompute the effective level from the pending mask.
    pub fn reassert(&mut self) -> u8 {
        let level = (8 - (self.pending >> 1).leading_zeros()) as u8;
        if level != self.level {
            log::trace!("interrupt level {}", level);
        }
        self.level = level;
        level
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    pub fn pending(&self) -> u8 {
        self.pending
    }

    /// Clear every source, including both halves of level 1. The SCSI gate
    /// follows port B and is left alone.
    pub fn reset(&mut self) -> u8 {
        self.pending = 0;
        self.via = false;
        self.scsi_raw = false;
        self.reassert()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assert_then_clear_returns_to_zero() {
        let sources = [
            IrqSource::Via,
            IrqSource::Scsi,
            IrqSource::Scc,
            IrqSource::Keyboard(1),
            IrqSource::Keyboard(4),
            IrqSource::Keyboard(7),
        ];
        for source in sources {
            let mut agg = InterruptAggregator::new();
            assert!(agg.set_source(source, true) > 0, "{}", source);
            assert_eq!(agg.set_source(source, false), 0, "{}", source);
            assert_eq!(agg.pending(), 0);
        }
    }

    #[test]
    fn test_highest_level_wins() {
        let mut agg = InterruptAggregator::new();
        assert_eq!(agg.set_source(IrqSource::Via, true), 1);
        assert_eq!(agg.set_source(IrqSource::Scc, true), 2);
        assert_eq!(agg.set_source(IrqSource::Keyboard(4), true), 4);
        assert_eq!(agg.set_source(IrqSource::Scc, false), 4);
        assert_eq!(agg.set_source(IrqSource::Keyboard(4), false), 1);
        assert_eq!(agg.level(), 1);
    }

    #[test]
    fn test_shared_level_is_an_or() {
        let mut agg = InterruptAggregator::new();
        agg.set_source(IrqSource::Via, true);
        agg.set_source(IrqSource::Scsi, true);
        assert_eq!(agg.set_source(IrqSource::Via, false), 1);
        assert_eq!(agg.set_source(IrqSource::Scsi, false), 0);

        agg.set_source(IrqSource::Scsi, true);
        agg.set_source(IrqSource::Via, true);
        assert_eq!(agg.set_source(IrqSource::Scsi, false), 1);
    }

    #[test]
    fn test_scsi_mask_reevaluated_on_both_edges() {
        let mut agg = InterruptAggregator::new();

        // Raw line rises while masked.
        agg.set_scsi_mask(true);
        assert_eq!(agg.set_source(IrqSource::Scsi, true), 0);

        // Unmasking exposes the pending raw line.
        assert_eq!(agg.set_scsi_mask(false), 1);
        assert_eq!(agg.set_scsi_mask(true), 0);

        // The mask never hides the VIA half.
        assert_eq!(agg.set_source(IrqSource::Via, true), 1);
        assert_eq!(agg.set_source(IrqSource::Via, false), 0);
    }

    #[test]
    fn test_reassert_is_idempotent() {
        let mut agg = InterruptAggregator::new();
        agg.set_source(IrqSource::Scc, true);
        assert_eq!(agg.reassert(), 2);
        assert_eq!(agg.reassert(), 2);
        assert_eq!(agg.reset(), 0);
        assert_eq!(agg.set_source(IrqSource::Keyboard(9), true), 0);
    }
}
