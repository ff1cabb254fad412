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

    error.rs

    Error types for the emulator core.

    None of these are fatal. Setup logs them and carries on with the affected
    block or chip absent.
*/
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum MemError {
    #[error("Block '{0}' at {1:06X} overlaps enabled block '{2}'")]
    Overlap(&'static str, u32, &'static str),
    #[error("No block with id {0}")]
    UnknownBlock(usize),
    #[error("Address {0:06X} is not backed by storage")]
    Unmapped(u32),
    #[error("Block '{0}' has zero size")]
    EmptyBlock(&'static str),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Unknown machine model: {0}")]
    BadModel(String),
    #[error("Unknown CPU model: {0}")]
    BadCpu(String),
    #[error("Invalid value for {0}: {1}")]
    BadValue(&'static str, String),
    #[error("Failed to parse machine configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Failed to read machine configuration: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Clock store is empty")]
    Empty,
    #[error("Clock store I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug, PartialEq)]
pub enum MessageError {
    #[error("Unknown message: {0}")]
    Unknown(String),
    #[error("Bad value '{1}' for message {0}")]
    BadValue(String, String),
    #[error("No terminal attached for message {0}")]
    NoTerminal(String),
}

#[derive(Error, Debug, PartialEq)]
pub enum CpuError {
    #[error("CPU model {0} is not supported by the attached CPU")]
    Unsupported(String),
    #[error("No CPU attached")]
    Missing,
}
