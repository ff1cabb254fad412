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

    device_traits::terminal.rs

    The display and input collaborator.
*/
use crate::error::MessageError;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum KeyEvent {
    Down,
    Up,
    /// A host hotkey combination.
    Magic,
}

/// Host key code. The mapping to Macintosh scan codes belongs to the keyboard models.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct KeyCode(pub u32);

/// Events queued by the terminal for the machine.
#[derive(Clone, Debug, PartialEq)]
pub enum HostEvent {
    Key(KeyEvent, KeyCode),
    /// Relative motion plus the current button mask. Bit 0 is the primary button.
    Mouse { dx: i32, dy: i32, buttons: u32 },
    Message { name: String, value: String },
}

pub trait Terminal {
    fn open(&mut self, width: u32, height: u32);
    /// Poll the host for input. Events are queued on the terminal's event wire.
    fn check(&mut self);
    fn set_message(&mut self, name: &str, value: &str) -> Result<(), MessageError>;
}
