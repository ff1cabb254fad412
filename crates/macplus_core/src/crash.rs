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

    crash.rs

    Machine state for crash reports.

    A panic hook cannot own the machine. It holds a weak handle registered here
    and asks for a state dump if the machine is still alive and not borrowed by
    the code that panicked.
*/
use std::{
    cell::RefCell,
    rc::{Rc, Weak},
};

use crate::machine::Machine;

thread_local! {
    static MACHINE: RefCell<Weak<RefCell<Machine>>> = RefCell::new(Weak::new());
}

pub fn register(machine: &Rc<RefCell<Machine>>) {
    MACHINE.with(|m| *m.borrow_mut() = Rc::downgrade(machine));
}

pub fn clear() {
    MACHINE.with(|m| *m.borrow_mut() = Weak::new());
}

/// State dump of the registered machine. None if no machine is registered,
/// it has been dropped, or it is mutably borrowed.
pub fn report() -> Option<String> {
    MACHINE.with(|m| {
        let machine = m.try_borrow().ok()?.upgrade()?;
        let machine = machine.try_borrow().ok()?;
        Some(machine.string_state().to_string())
    })
}
