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

    macplus_config::args.rs

    Command line arguments. Parsed with bpaf when the use_bpaf feature is enabled.
*/
use std::path::PathBuf;

use macplus_core::machine_types::MacModel;

#[cfg(feature = "use_bpaf")]
use bpaf::Bpaf;

#[cfg_attr(feature = "use_bpaf", derive(Bpaf))]
#[cfg_attr(feature = "use_bpaf", bpaf(options, version, generate(cli_args)))]
#[derive(Debug, Default)]
pub struct CmdLineArgs {
    #[cfg_attr(feature = "use_bpaf", bpaf(long("config_file"), long("configfile")))]
    pub config_file: Option<PathBuf>,

    #[cfg_attr(feature = "use_bpaf", bpaf(long("base_dir"), long("basedir")))]
    pub base_dir: Option<PathBuf>,

    // Machine options
    #[cfg_attr(feature = "use_bpaf", bpaf(long))]
    pub model: Option<MacModel>,

    #[cfg_attr(feature = "use_bpaf", bpaf(long))]
    pub rom: Option<PathBuf>,

    #[cfg_attr(feature = "use_bpaf", bpaf(long))]
    pub pram: Option<PathBuf>,

    /// Speed multiplier, 0 for dynamic.
    #[cfg_attr(feature = "use_bpaf", bpaf(long))]
    pub speed: Option<u32>,

    #[cfg_attr(feature = "use_bpaf", bpaf(long, switch))]
    pub memtest: bool,

    // Emulator options
    /// Stop after this many seconds of emulated time.
    #[cfg_attr(feature = "use_bpaf", bpaf(long))]
    pub timeout: Option<u64>,

    #[cfg_attr(feature = "use_bpaf", bpaf(short('v'), long, switch))]
    pub verbose: bool,
}
