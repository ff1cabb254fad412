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

    macplus_headless::lib.rs

    Headless front end main library component.

    Runs a machine with no display, no sound output and a stand-in CPU. Used to
    measure pacing and to exercise the chips and the board logic without a real
    instruction engine.
*/

#![forbid(unsafe_code)]

mod stand_in;

use std::{cell::RefCell, rc::Rc};

use anyhow::Context;
use web_time::Instant;

use macplus_config::ConfigFileParams;
use macplus_core::{
    clock_store::FileClockStore,
    crash,
    machine::Machine,
    machine_types::BreakState,
    pacing::sync::CPU_CLOCK,
};

pub use crate::stand_in::FixedDelayCpu;

/// Steps between checks of the stop conditions.
const STEPS_PER_CHECK: usize = 1000;

#[derive(Debug, Default)]
pub struct RunStats {
    pub steps: u64,
    pub clock_count: u64,
    pub brk: BreakState,
}

pub fn run() {
    // The logger comes up before the configuration so configuration loading can log. Until the
    // verbose setting is known, only a -v on the command line enables debug output.
    let verbose_arg = std::env::args().skip(1).any(|arg| arg == "-v" || arg == "--verbose");
    let rust_log = std::env::var_os("RUST_LOG").is_some();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    if !rust_log && !verbose_arg {
        log::set_max_level(log::LevelFilter::Info);
    }

    // First we resolve the emulator configuration by parsing the configuration toml and merging it with
    // command line arguments.
    let config = match macplus_config::read_config_file("./macplus.toml") {
        Ok(config) => config,
        Err(e) => match e.downcast_ref::<std::io::Error>() {
            Some(e) if e.kind() == std::io::ErrorKind::NotFound => {
                eprintln!(
                    "Configuration file not found! Please create macplus.toml in the emulator directory \
                               or provide the path to configuration file with --configfile."
                );
                std::process::exit(1);
            }
            Some(e) => {
                eprintln!("Unknown IO error reading configuration file:\n{}", e);
                std::process::exit(1);
            }
            None => {
                eprintln!(
                    "Failed to parse configuration file. There may be a typo or otherwise invalid toml:\n{}",
                    e
                );
                std::process::exit(1);
            }
        },
    };

    if !rust_log && config.emulator.verbose {
        log::set_max_level(log::LevelFilter::Debug);
    }

    install_panic_hook();

    if let Err(e) = run_headless(config) {
        log::error!("{:#}", e);
        std::process::exit(1);
    }
}

/// Print the machine state before the default panic output.
fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        match crash::report() {
            Some(report) => eprintln!("Machine state:\n{}", report),
            None => eprintln!("Machine state unavailable."),
        }
        default_hook(info);
    }));
}

pub fn build_machine(config: &ConfigFileParams) -> anyhow::Result<Machine> {
    let rom_path = config.resolve_path(&config.machine.rom.file);
    let pram_path = config.resolve_path(&config.machine.rtc.file);
    let delay = config.emulator.cpu_delay;

    let mut builder = Machine::builder()
        .with_config(config.machine.clone())
        .with_clock_store(Box::new(FileClockStore::new(pram_path)))
        .with_cpu(move |wiring| Ok(Box::new(FixedDelayCpu::new(delay, wiring))));

    // A missing ROM is not fatal. The machine runs with an empty ROM block.
    match std::fs::read(&rom_path) {
        Ok(image) => builder = builder.with_rom_image(image),
        Err(e) => log::error!("ROM: can't load {}: {}", rom_path.display(), e),
    }

    builder.build().context("Failed to build machine")
}

/// Step the machine until a break is requested or `limit` clock units have run.
pub fn run_machine(machine: &Rc<RefCell<Machine>>, limit: Option<u64>) -> RunStats {
    let mut stats = RunStats::default();
    loop {
        let mut machine = machine.borrow_mut();
        for _ in 0..STEPS_PER_CHECK {
            machine.advance_one_step();
        }
        stats.steps += STEPS_PER_CHECK as u64;
        stats.clock_count = machine.pacing().clock_count();

        let brk = machine.take_break();
        if brk != BreakState::None {
            stats.brk = brk;
            break;
        }
        if limit.is_some_and(|limit| stats.clock_count >= limit) {
            break;
        }
    }
    stats
}

/// Emulated time limit in clock units.
fn timeout_units(timeout: Option<u64>) -> Option<u64> {
    timeout.map(|secs| secs.saturating_mul(CPU_CLOCK))
}

fn run_headless(config: ConfigFileParams) -> anyhow::Result<()> {
    let limit = timeout_units(config.emulator.timeout);
    let machine = Rc::new(RefCell::new(build_machine(&config)?));
    crash::register(&machine);

    machine.borrow_mut().reset();
    log::info!(
        "Running {} headless{}",
        config.machine.system.model,
        match config.emulator.timeout {
            Some(secs) => format!(" for {} emulated seconds", secs),
            None => String::new(),
        }
    );

    let start = Instant::now();
    let stats = run_machine(&machine, limit);
    let elapsed = start.elapsed();

    let emulated = stats.clock_count as f64 / CPU_CLOCK as f64;
    let host = elapsed.as_secs_f64();
    log::info!(
        "Stopped ({:?}) after {} steps: {:.2}s emulated in {:.2}s ({:.0}%)",
        stats.brk,
        stats.steps,
        emulated,
        host,
        if host > 0.0 { emulated / host * 100.0 } else { 0.0 }
    );
    log::debug!("{}", machine.borrow().string_state());

    crash::clear();
    // Dropping the machine saves the parameter RAM.
    drop(machine);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use macplus_config::CmdLineArgs;

    fn config(toml: &str) -> ConfigFileParams {
        macplus_config::read_config(toml, CmdLineArgs::default()).unwrap()
    }

    #[test]
    fn test_run_until_limit() {
        let dir = std::env::temp_dir().join(format!("macplus-headless-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let mut config = config("[machine.cpu]\nspeed = 8");
        config.emulator.basedir = dir.clone();

        // No ROM file in the directory; the machine still runs.
        let machine = Rc::new(RefCell::new(build_machine(&config).unwrap()));
        machine.borrow_mut().reset();
        let stats = run_machine(&machine, Some(50_000));
        assert_eq!(stats.brk, BreakState::None);
        assert!(stats.clock_count >= 50_000);
        assert_eq!(stats.steps * 8, stats.clock_count);
        assert!(machine.borrow().register("pc").is_some());

        drop(machine);
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_timeout_units() {
        assert_eq!(timeout_units(None), None);
        assert_eq!(timeout_units(Some(2)), Some(2 * CPU_CLOCK));
        assert_eq!(timeout_units(Some(u64::MAX)), Some(u64::MAX));
    }

    #[test]
    fn test_run_until_break() {
        let config = config("");
        let machine = Rc::new(RefCell::new(build_machine(&config).unwrap()));
        machine.borrow_mut().reset();
        machine.borrow_mut().set_message("emu.exit", "").unwrap();
        let stats = run_machine(&machine, None);
        assert_eq!(stats.brk, BreakState::Abort);
        assert_eq!(stats.steps, STEPS_PER_CHECK as u64);
    }
}
