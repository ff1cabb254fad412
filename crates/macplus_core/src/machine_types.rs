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

    machine_types.rs

    Enumerations for the supported machine models and CPU variants.
*/
use std::{fmt, fmt::Display, str::FromStr};

use serde_derive::Deserialize;

#[derive(Copy, Clone, Debug, Default, Deserialize, Hash, Eq, PartialEq)]
pub enum MacModel {
    #[default]
    #[serde(rename = "mac-plus", alias = "plus")]
    Plus,
    #[serde(rename = "mac-se", alias = "se")]
    Se,
    #[serde(rename = "mac-classic", alias = "classic")]
    Classic,
}

impl FromStr for MacModel {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, String>
    where
        Self: Sized,
    {
        match s.to_lowercase().as_str() {
            "mac-plus" | "plus" => Ok(MacModel::Plus),
            "mac-se" | "se" => Ok(MacModel::Se),
            "mac-classic" | "classic" => Ok(MacModel::Classic),
            _ => Err("Bad value for model".to_string()),
        }
    }
}

impl Display for MacModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MacModel::Plus => write!(f, "mac-plus"),
            MacModel::Se => write!(f, "mac-se"),
            MacModel::Classic => write!(f, "mac-classic"),
        }
    }
}

impl MacModel {
    /// The Plus maps ROM at address 0 after reset and clears the overlay through VIA port A.
    pub fn has_overlay(&self) -> bool {
        matches!(self, MacModel::Plus)
    }

    /// The Plus talks to its keyboard through the VIA shift register. Later models use ADB.
    pub fn has_serial_keyboard(&self) -> bool {
        matches!(self, MacModel::Plus)
    }

    pub fn has_adb(&self) -> bool {
        matches!(self, MacModel::Se | MacModel::Classic)
    }

    /// Only the SE routes the SCSI controller interrupt to the CPU.
    pub fn has_scsi_interrupt(&self) -> bool {
        matches!(self, MacModel::Se)
    }

    /// Only the Plus selects between two sound buffers.
    pub fn has_alternate_sound_buffer(&self) -> bool {
        matches!(self, MacModel::Plus)
    }

    /// The Classic derives its screen brightness from the PWM samples in the sound buffer.
    pub fn has_pwm_brightness(&self) -> bool {
        matches!(self, MacModel::Classic)
    }
}

#[derive(Copy, Clone, Debug, Default, Deserialize, Hash, Eq, PartialEq)]
pub enum CpuModel {
    #[default]
    #[serde(rename = "68000")]
    M68000,
    #[serde(rename = "68010")]
    M68010,
    #[serde(rename = "68020")]
    M68020,
}

impl FromStr for CpuModel {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, String>
    where
        Self: Sized,
    {
        match s.to_lowercase().as_str() {
            "68000" | "m68000" => Ok(CpuModel::M68000),
            "68010" | "m68010" => Ok(CpuModel::M68010),
            "68020" | "m68020" => Ok(CpuModel::M68020),
            _ => Err("Bad value for cpu model".to_string()),
        }
    }
}

impl Display for CpuModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CpuModel::M68000 => write!(f, "68000"),
            CpuModel::M68010 => write!(f, "68010"),
            CpuModel::M68020 => write!(f, "68020"),
        }
    }
}

/// Stop condition observed by the external run loop between steps.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum BreakState {
    #[default]
    None,
    Stop,
    Abort,
}
