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

    machine::messages.rs

    Named control messages from the host.
*/
use crate::{
    error::MessageError,
    machine::Machine,
    machine_types::{BreakState, CpuModel},
    pacing::SpeedSlot,
};

fn parse_bool(name: &str, value: &str) -> Result<bool, MessageError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(MessageError::BadValue(name.to_string(), value.to_string())),
    }
}

fn parse_num<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, MessageError> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| MessageError::BadValue(name.to_string(), value.to_string()))
}

impl Machine {
    pub fn set_message(&mut self, name: &str, value: &str) -> Result<(), MessageError> {
        log::debug!("{}message: \"{}\" \"{}\"", self.pc_tag(), name, value);

        match name {
            "emu.stop" => self.brk = BreakState::Stop,
            "emu.exit" => self.brk = BreakState::Abort,
            "emu.pause" => {
                let pause = parse_bool(name, value)?;
                self.pause(pause);
            }
            "emu.pause.toggle" => {
                let pause = !self.is_paused();
                self.pause(pause);
            }
            "emu.reset" => self.reset(),
            "emu.cpu.speed" => {
                let factor = parse_num::<u32>(name, value)?;
                self.set_speed(SpeedSlot::User, factor);
            }
            "emu.cpu.speed.step" => {
                let step = parse_num::<i64>(name, value)?;
                let factor = (self.speed.get(SpeedSlot::User) as i64 + step).clamp(1, u32::MAX as i64);
                self.set_speed(SpeedSlot::User, factor as u32);
            }
            "emu.cpu.model" => {
                let model = value
                    .parse::<CpuModel>()
                    .map_err(|_| MessageError::BadValue(name.to_string(), value.to_string()))?;
                let Some(cpu) = self.cpu.as_mut() else {
                    return Err(MessageError::BadValue(name.to_string(), value.to_string()));
                };
                if let Err(e) = cpu.set_model(model) {
                    log::error!("{}", e);
                    return Err(MessageError::BadValue(name.to_string(), value.to_string()));
                }
            }
            _ if name.starts_with("term.") => match self.terminal.as_mut() {
                Some(terminal) => terminal.set_message(name, value)?,
                None => return Err(MessageError::NoTerminal(name.to_string())),
            },
            _ => return Err(MessageError::Unknown(name.to_string())),
        }
        Ok(())
    }
}
