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

    device_traits::disk.rs

    Disk collection shared by the IWM, SCSI and Sony driver.

    Image formats and their I/O are provided by the front end through DiskImage.
*/
use std::{cell::RefCell, rc::Rc};

pub trait DiskImage {
    fn blocks(&self) -> u64;
    fn read_only(&self) -> bool;
    fn read(&mut self, lba: u64, buf: &mut [u8]) -> bool;
    fn write(&mut self, lba: u64, buf: &[u8]) -> bool;
    /// Flush pending writes to the backing image.
    fn commit(&mut self) -> bool;
    fn name(&self) -> String;
}

struct DiskEntry {
    drive: u32,
    image: Box<dyn DiskImage>,
}

#[derive(Default)]
pub struct DiskSet {
    disks: Vec<DiskEntry>,
}

pub type SharedDisks = Rc<RefCell<DiskSet>>;

impl DiskSet {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn into_shared(self) -> SharedDisks {
        Rc::new(RefCell::new(self))
    }

    /// Insert a disk, replacing any disk already in `drive`.
    pub fn insert(&mut self, drive: u32, image: Box<dyn DiskImage>) {
        log::debug!(
            "DISK: drive={} blocks={} {} {}",
            drive,
            image.blocks(),
            if image.read_only() { "ro" } else { "rw" },
            image.name()
        );
        self.disks.retain(|d| d.drive != drive);
        self.disks.push(DiskEntry { drive, image });
    }

    pub fn remove(&mut self, drive: u32) -> Option<Box<dyn DiskImage>> {
        let idx = self.disks.iter().position(|d| d.drive == drive)?;
        Some(self.disks.remove(idx).image)
    }

    pub fn get_mut(&mut self, drive: u32) -> Option<&mut (dyn DiskImage + 'static)> {
        self.disks
            .iter_mut()
            .find(|d| d.drive == drive)
            .map(|d| d.image.as_mut())
    }

    pub fn drives(&self) -> Vec<u32> {
        self.disks.iter().map(|d| d.drive).collect()
    }

    pub fn len(&self) -> usize {
        self.disks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.disks.is_empty()
    }

    /// Commit every disk. Returns the drives that failed.
    pub fn commit_all(&mut self) -> Vec<u32> {
        let mut failed = Vec::new();
        for entry in self.disks.iter_mut() {
            if !entry.image.commit() {
                failed.push(entry.drive);
            }
        }
        failed
    }
}
