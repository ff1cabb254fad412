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

    devices::mouse.rs

    Quadrature mouse encoder for machines without ADB.

    The Plus mouse reports motion as pulses: each axis toggles an SCC DCD input
    (raising an interrupt) and presents a direction bit on VIA port B (X2, Y2).
    Host motion accumulates here and drains two units per axis per poll.
*/
pub const STEP: i32 = 2;

/// Mask bit of the button that releases the host pointer capture.
pub const RELEASE_BUTTON: u32 = 0x04;

/// One pulse on one axis.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct AxisPulse {
    /// Level driven onto the SCC DCD input for this axis.
    pub dcd: bool,
    /// Direction bit for VIA port B (X2 or Y2).
    pub quadrature: bool,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct MousePoll {
    pub x: Option<AxisPulse>,
    pub y: Option<AxisPulse>,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ButtonChange {
    /// New state of the primary button, if it changed.
    pub primary: Option<bool>,
    /// The capture release button went up.
    pub release: bool,
}

#[derive(Default)]
pub struct QuadratureMouse {
    delta_x: i32,
    delta_y: i32,
    dcd_a: bool,
    dcd_b: bool,
    buttons: u32,
}

impl QuadratureMouse {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn reset(&mut self) {
        *self = Default::default();
    }

    pub fn delta(&self) -> (i32, i32) {
        (self.delta_x, self.delta_y)
    }

    pub fn buttons(&self) -> u32 {
        self.buttons
    }

    pub fn add_motion(&mut self, dx: i32, dy: i32) {
        self.delta_x = self.delta_x.saturating_add(dx);
        self.delta_y = self.delta_y.saturating_add(dy);
    }

    /// Record a new button mask and report the edges the machine acts on.
    pub fn set_buttons(&mut self, buttons: u32) -> ButtonChange {
        let old = self.buttons;
        self.buttons = buttons;
        ButtonChange {
            primary: ((old ^ buttons) & 1 != 0).then_some(buttons & 1 != 0),
            release: (old ^ buttons) & !buttons & RELEASE_BUTTON != 0,
        }
    }

    /// Drain at most one step from each axis.
    pub fn poll(&mut self) -> MousePoll {
        let mut poll = MousePoll::default();

        if self.delta_x.abs() >= STEP {
            let forward = self.delta_x > 0;
            if forward {
                self.delta_x -= STEP;
            }
            else {
                self.delta_x += STEP;
            }
            poll.x = Some(AxisPulse {
                dcd: self.dcd_a,
                quadrature: if forward { self.dcd_a } else { !self.dcd_a },
            });
            self.dcd_a = !self.dcd_a;
        }

        // The Y direction bit has the opposite sense.
        if self.delta_y.abs() >= STEP {
            let forward = self.delta_y > 0;
            if forward {
                self.delta_y -= STEP;
            }
            else {
                self.delta_y += STEP;
            }
            poll.y = Some(AxisPulse {
                dcd: self.dcd_b,
                quadrature: if forward { !self.dcd_b } else { self.dcd_b },
            });
            self.dcd_b = !self.dcd_b;
        }

        poll
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plus_five_drains_twice() {
        let mut mouse = QuadratureMouse::new();
        mouse.add_motion(5, 0);

        let first = mouse.poll();
        let second = mouse.poll();
        let third = mouse.poll();

        assert_eq!(first.x.map(|p| p.dcd), Some(false));
        assert_eq!(second.x.map(|p| p.dcd), Some(true));
        assert_eq!(third, MousePoll::default());
        assert_eq!(mouse.delta(), (1, 0));
        assert!(first.y.is_none() && second.y.is_none());
    }

    #[test]
    fn test_negative_delta() {
        let mut mouse = QuadratureMouse::new();
        mouse.add_motion(-4, -3);
        let first = mouse.poll();
        assert_eq!(first.x, Some(AxisPulse { dcd: false, quadrature: true }));
        assert_eq!(first.y, Some(AxisPulse { dcd: false, quadrature: false }));
        let second = mouse.poll();
        assert_eq!(second.x, Some(AxisPulse { dcd: true, quadrature: false }));
        assert!(second.y.is_none());
        assert_eq!(mouse.delta(), (0, -1));
    }

    #[test]
    fn test_direction_bits_per_axis() {
        let mut mouse = QuadratureMouse::new();
        mouse.add_motion(2, 2);
        let poll = mouse.poll();
        // Forward X presents the DCD level, forward Y its inverse.
        assert_eq!(poll.x, Some(AxisPulse { dcd: false, quadrature: false }));
        assert_eq!(poll.y, Some(AxisPulse { dcd: false, quadrature: true }));
    }

    #[test]
    fn test_button_edges() {
        let mut mouse = QuadratureMouse::new();
        assert_eq!(
            mouse.set_buttons(1),
            ButtonChange {
                primary: Some(true),
                release: false
            }
        );
        assert_eq!(mouse.set_buttons(1), ButtonChange::default());
        assert_eq!(mouse.set_buttons(5).primary, None);
        assert_eq!(
            mouse.set_buttons(0),
            ButtonChange {
                primary: Some(false),
                release: true
            }
        );
        mouse.add_motion(9, 9);
        mouse.reset();
        assert_eq!(mouse.delta(), (0, 0));
        assert_eq!(mouse.buttons(), 0);
    }
}
