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

    clock_store.rs

    Persistence for the RTC parameter RAM.

    The blob is opaque here; its layout belongs to the RTC.
*/
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::error::StoreError;

pub trait ClockStore {
    fn load(&mut self) -> Result<Vec<u8>, StoreError>;
    fn save(&mut self, data: &[u8]) -> Result<(), StoreError>;
    fn name(&self) -> String;
}

pub struct FileClockStore {
    path: PathBuf,
}

impl FileClockStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl ClockStore for FileClockStore {
    fn load(&mut self) -> Result<Vec<u8>, StoreError> {
        let data = fs::read(&self.path)?;
        if data.is_empty() {
            return Err(StoreError::Empty);
        }
        Ok(data)
    }

    fn save(&mut self, data: &[u8]) -> Result<(), StoreError> {
        fs::write(&self.path, data)?;
        Ok(())
    }

    fn name(&self) -> String {
        self.path.display().to_string()
    }
}
