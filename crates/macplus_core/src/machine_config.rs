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

    machine_config.rs

    Machine configuration.

    Every section falls back to the stock Macintosh Plus defaults, so an empty
    TOML document describes a working 4MB Mac Plus.
*/
use std::path::{Path, PathBuf};

use serde_derive::Deserialize;

use crate::{
    error::ConfigError,
    machine_types::{CpuModel, MacModel},
};

pub const DEFAULT_RAM_SIZE: u32 = 4096 * 1024;
pub const DEFAULT_ROM_ADDRESS: u32 = 0x0040_0000;
pub const DEFAULT_ROM_SIZE: u32 = 128 * 1024;
pub const VIDEO_WIDTH: u32 = 512;
pub const VIDEO_HEIGHT: u32 = 342;

const fn _default_true() -> bool {
    true
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct SystemConfig {
    pub model:   MacModel,
    pub memtest: bool,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            model:   MacModel::Plus,
            memtest: false,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct CpuConfig {
    pub model: CpuModel,
    /// Speed multiplier. 1 runs at 7.8336MHz, 0 adjusts dynamically.
    pub speed: u32,
}

impl Default for CpuConfig {
    fn default() -> Self {
        Self {
            model: CpuModel::M68000,
            speed: 1,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct RamConfig {
    pub address: u32,
    pub size:    u32,
    pub fill:    u8,
}

impl Default for RamConfig {
    fn default() -> Self {
        Self {
            address: 0,
            size:    DEFAULT_RAM_SIZE,
            fill:    0,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct RomConfig {
    pub address: u32,
    pub size:    u32,
    pub file:    PathBuf,
}

impl Default for RomConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_ROM_ADDRESS,
            size:    DEFAULT_ROM_SIZE,
            file:    PathBuf::from("rom.bin"),
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct RtcConfig {
    pub file: PathBuf,
    /// Start time as "YYYY-MM-DD HH:MM:SS". When absent the clock starts at the host time.
    pub start: Option<String>,
    /// Make the ROM disk the startup disk. Only the Classic ROM has one.
    pub romdisk: bool,
    pub appletalk: Option<bool>,
}

impl Default for RtcConfig {
    fn default() -> Self {
        Self {
            file: PathBuf::from("pram-mac-plus.dat"),
            start: Some("1984-01-24 00:00:00".to_string()),
            romdisk: false,
            appletalk: None,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct AdbConfig {
    pub mouse: bool,
    pub keyboard: bool,
    pub keypad_motion: bool,
}

impl Default for AdbConfig {
    fn default() -> Self {
        Self {
            mouse: true,
            keyboard: true,
            keypad_motion: false,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct KeyboardConfig {
    pub model: u32,
    pub intl: bool,
    pub keypad_motion: bool,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct ScsiDeviceConfig {
    pub id: u32,
    pub drive: u32,
    #[serde(default = "_default_vendor")]
    pub vendor: String,
    #[serde(default = "_default_product")]
    pub product: String,
}

fn _default_vendor() -> String {
    "PCE".to_string()
}

fn _default_product() -> String {
    "PCEDISK".to_string()
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScsiConfig {
    pub devices: Vec<ScsiDeviceConfig>,
}

impl Default for ScsiConfig {
    fn default() -> Self {
        Self {
            devices: vec![ScsiDeviceConfig {
                id: 6,
                drive: 128,
                vendor: _default_vendor(),
                product: _default_product(),
            }],
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct IwmDriveConfig {
    pub drive: u32,
    pub disk: u32,
    #[serde(default)]
    pub inserted: bool,
    #[serde(default)]
    pub single_sided: bool,
    #[serde(default = "_default_true")]
    pub auto_rotate: bool,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct IwmConfig {
    pub drives: Vec<IwmDriveConfig>,
}

impl Default for IwmConfig {
    fn default() -> Self {
        let drive = |n| IwmDriveConfig {
            drive: n,
            disk: n,
            inserted: false,
            single_sided: false,
            auto_rotate: true,
        };
        Self {
            drives: vec![drive(1), drive(2)],
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct SerialConfig {
    pub multichar: u32,
    pub drivers: [Option<String>; 2],
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            multichar: 1,
            drivers: [
                Some("stdio:file=ser_a.out:flush=1".to_string()),
                Some("stdio:file=ser_b.out".to_string()),
            ],
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct TerminalConfig {
    pub escape: String,
    pub scale: u32,
    pub aspect_x: u32,
    pub aspect_y: u32,
    pub mouse_mul_x: i32,
    pub mouse_div_x: i32,
    pub mouse_mul_y: i32,
    pub mouse_div_y: i32,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            escape: "ESC".to_string(),
            scale: 1,
            aspect_x: 3,
            aspect_y: 2,
            mouse_mul_x: 1,
            mouse_div_x: 1,
            mouse_mul_y: 1,
            mouse_div_y: 1,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct SoundConfig {
    /// Low-pass cut-off in Hz. 0 disables the filter.
    pub lowpass: u32,
    pub driver: String,
}

impl Default for SoundConfig {
    fn default() -> Self {
        Self {
            lowpass: 8000,
            driver: "null".to_string(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct VideoConfig {
    pub color0: u32,
    pub color1: u32,
    /// Brightness in the range 0 - 1000.
    pub brightness: u32,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            color0: 0x000000,
            color1: 0xffffff,
            brightness: 1000,
        }
    }
}

impl VideoConfig {
    /// Brightness scaled to the 0-255 range used by the video chip.
    pub fn scaled_brightness(&self) -> u32 {
        (255 * self.brightness.min(1000) + 500) / 1000
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct MachineConfig {
    pub system: SystemConfig,
    pub cpu: CpuConfig,
    pub ram: RamConfig,
    pub rom: RomConfig,
    pub rtc: RtcConfig,
    pub adb: AdbConfig,
    pub keyboard: KeyboardConfig,
    pub scsi: ScsiConfig,
    pub iwm: IwmConfig,
    pub serial: SerialConfig,
    pub terminal: TerminalConfig,
    pub sound: SoundConfig,
    pub video: VideoConfig,
}

impl MachineConfig {
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ConfigError> {
        let config: MachineConfig = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let toml_str = std::fs::read_to_string(path)?;
        Self::from_toml_str(&toml_str)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ram.size > 0x0100_0000 {
            return Err(ConfigError::BadValue("ram.size", format!("{:#X}", self.ram.size)));
        }
        if self.rom.size == 0 {
            return Err(ConfigError::BadValue("rom.size", "0".to_string()));
        }
        if self.terminal.mouse_div_x == 0 || self.terminal.mouse_div_y == 0 {
            return Err(ConfigError::BadValue("terminal.mouse_div", "0".to_string()));
        }
        Ok(())
    }
}
