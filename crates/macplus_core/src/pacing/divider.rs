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

    pacing::divider.rs

    Clock divider stages.

    Each stage accumulates input units and reports a carry. Stages keep their
    remainders between calls, so feeding a stage n units at once or in pieces
    yields the same total carry.
*/

/// Divides its input by a period, keeping the remainder.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DivisorStage {
    acc:    u64, // Units below one period
    period: u64,
}

impl DivisorStage {
    pub fn new(period: u64) -> Self {
        Self {
            acc:    0,
            period: period.max(1),
        }
    }

    #[inline]
    pub fn add(&mut self, n: u64) -> u64 {
        self.acc += n;
        let carry = self.acc / self.period;
        self.acc -= carry * self.period;
        carry
    }

    pub fn set_period(&mut self, period: u64) {
        self.period = period.max(1);
    }

    pub fn period(&self) -> u64 {
        self.period
    }

    pub fn pending(&self) -> u64 {
        self.acc
    }

    pub fn reset(&mut self) {
        self.acc = 0;
    }
}

/// Accumulates until a threshold is reached, then flushes everything it holds.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ThresholdStage {
    acc:       u64,
    threshold: u64,
}

impl ThresholdStage {
    pub fn new(threshold: u64) -> Self {
        Self { acc: 0, threshold }
    }

    #[inline]
    pub fn add(&mut self, n: u64) -> Option<u64> {
        self.acc += n;
        if self.acc >= self.threshold {
            Some(std::mem::take(&mut self.acc))
        }
        else {
            None
        }
    }

    pub fn pending(&self) -> u64 {
        self.acc
    }

    pub fn reset(&mut self) {
        self.acc = 0;
    }
}

/// Scales its input by mul/div, keeping the fractional part.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RatioStage {
    acc: u64,
    mul: u64,
    div: u64,
}

impl RatioStage {
    pub fn new(mul: u64, div: u64) -> Self {
        Self {
            acc: 0,
            mul,
            div: div.max(1),
        }
    }

    #[inline]
    pub fn add(&mut self, n: u64) -> u64 {
        self.acc += self.mul * n;
        let carry = self.acc / self.div;
        self.acc %= self.div;
        carry
    }

    pub fn pending(&self) -> u64 {
        self.acc
    }

    pub fn reset(&mut self) {
        self.acc = 0;
    }
}
