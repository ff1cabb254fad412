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

    macplus_config::lib.rs

    Emulator configuration.

    Reads the emulator configuration file and overlays command line arguments
    on top of it. Command line arguments take priority over the configuration
    file.

    Features:
    - `use_bpaf`: Enable BPAF support for command line argument parsing.
*/

mod args;

use std::path::{Path, PathBuf};

pub use args::CmdLineArgs;
#[cfg(feature = "use_bpaf")]
pub use args::cli_args;

use cfg_if::cfg_if;
use macplus_core::machine_config::MachineConfig;
use serde_derive::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Emulator {
    /// Relative paths in the configuration resolve against this directory.
    pub basedir: PathBuf,
    /// Stop after this many seconds of emulated time.
    pub timeout: Option<u64>,
    /// Clock units per step of the stand-in CPU.
    pub cpu_delay: u32,
    pub verbose: bool,
}

impl Default for Emulator {
    fn default() -> Self {
        Self {
            basedir: PathBuf::from("."),
            timeout: None,
            cpu_delay: 8,
            verbose: false,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ConfigFileParams {
    pub emulator: Emulator,
    pub machine: MachineConfig,
}

impl ConfigFileParams {
    pub fn overlay(&mut self, shell_args: CmdLineArgs) {
        if let Some(basedir) = shell_args.base_dir {
            self.emulator.basedir = basedir;
        }
        if let Some(model) = shell_args.model {
            self.machine.system.model = model;
        }
        if let Some(rom) = shell_args.rom {
            self.machine.rom.file = rom;
        }
        if let Some(pram) = shell_args.pram {
            self.machine.rtc.file = pram;
        }
        if let Some(speed) = shell_args.speed {
            self.machine.cpu.speed = speed;
        }
        if let Some(timeout) = shell_args.timeout {
            self.emulator.timeout = Some(timeout);
        }

        self.machine.system.memtest |= shell_args.memtest;
        self.emulator.verbose |= shell_args.verbose;
    }

    /// Resolve a configured path against the base directory.
    pub fn resolve_path(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        }
        else {
            self.emulator.basedir.join(path)
        }
    }
}

pub fn read_config(toml_string: impl AsRef<str>, shell_args: CmdLineArgs) -> Result<ConfigFileParams, anyhow::Error> {
    let mut toml_args: ConfigFileParams = toml::from_str(toml_string.as_ref())?;

    // Command line arguments override config file arguments
    toml_args.overlay(shell_args);
    toml_args.machine.validate()?;

    Ok(toml_args)
}

fn shell_args() -> CmdLineArgs {
    cfg_if! {
        if #[cfg(feature = "use_bpaf")] {
            log::debug!("Reading command line arguments...");
            cli_args().run()
        }
        else {
            log::debug!("Argument reading disabled...");
            CmdLineArgs::default()
        }
    }
}

/// Read the TOML configuration from a file path, parse and overlay command line arguments.
pub fn read_config_file<P>(default_path: P) -> Result<ConfigFileParams, anyhow::Error>
where
    P: AsRef<Path>,
{
    let shell_args = shell_args();

    // Allow configuration file path to be overridden by command line argument 'config_file'
    let toml_string = if let Some(configfile_path) = shell_args.config_file.as_ref() {
        std::fs::read_to_string(configfile_path)?
    }
    else {
        std::fs::read_to_string(default_path)?
    };

    read_config(toml_string, shell_args)
}

/// Read the TOML configuration from a string, parse and overlay command line arguments.
pub fn read_config_string(toml_string: impl AsRef<str>) -> Result<ConfigFileParams, anyhow::Error> {
    read_config(toml_string, shell_args())
}
