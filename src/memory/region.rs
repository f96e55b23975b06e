// SPDX-License-Identifier: EUPL-1.2 OR GPL-3.0-or-later
// Copyright Contributors to the sdb project.

#![allow(clippy::len_without_is_empty)]

use std::ops::Range;

use crate::memory::{Address, MemorySize, Width};

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum MemoryError {
    /// Access does not fall entirely inside the region.
    OutOfBounds { address: Address, width: Width },
    /// Region size cannot be represented on the host.
    TooLarge { size: MemorySize },
}

impl std::fmt::Display for MemoryError {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::OutOfBounds { address, width } => write!(
                fmt,
                "address {} is out of bound of physical memory ({}-bit access)",
                address, *width as i32
            ),
            Self::TooLarge { size } => {
                write!(fmt, "memory size {} cannot be allocated on this host", size)
            }
        }
    }
}

impl std::error::Error for MemoryError {}

/// A contiguous range of guest RAM.
pub struct MemoryRegion {
    pub name: &'static str,
    /// Offset from start of physical address space.
    pub phys_offset: Address,
    pub size: MemorySize,
    map: Vec<u8>,
}

impl std::fmt::Debug for MemoryRegion {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        fmt.debug_struct("MemoryRegion")
            .field("name", &self.name)
            .field("phys_offset", &self.phys_offset)
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

impl From<&MemoryRegion> for Range<Address> {
    fn from(mr: &MemoryRegion) -> Self {
        let start = mr.phys_offset;
        Self {
            start,
            end: Address(start.0 + mr.size.get()),
        }
    }
}

impl MemoryRegion {
    /// Allocates a zero-filled region of `size` bytes at `phys_offset`.
    pub fn new(
        name: &'static str,
        size: MemorySize,
        phys_offset: Address,
    ) -> Result<Self, MemoryError> {
        let len = usize::try_from(size.get()).map_err(|_| MemoryError::TooLarge { size })?;
        if phys_offset.checked_add(size.get()).is_none() {
            return Err(MemoryError::TooLarge { size });
        }
        Ok(Self {
            name,
            phys_offset,
            size,
            map: vec![0; len],
        })
    }

    #[inline]
    pub fn contains(&self, address: Address) -> bool {
        Range::<Address>::from(self).contains(&address)
    }

    /// Returns the byte range inside the backing buffer for an access of
    /// `len` bytes at `address`.
    fn offset_range(&self, address: Address, len: usize) -> Option<Range<usize>> {
        let start = usize::try_from(address.0.checked_sub(self.phys_offset.0)?).ok()?;
        let end = start.checked_add(len)?;
        (end <= self.map.len()).then_some(start..end)
    }

    /// Reads a little-endian value of `width` from `address`.
    pub fn read(&self, address: Address, width: Width) -> Result<u64, MemoryError> {
        let range = self
            .offset_range(address, width.bytes())
            .ok_or(MemoryError::OutOfBounds { address, width })?;
        let mut bytes = [0_u8; 8];
        bytes[..width.bytes()].copy_from_slice(&self.map[range]);
        Ok(u64::from_le_bytes(bytes))
    }

    /// Writes the low `width` bits of `value` to `address` in little-endian
    /// order.
    pub fn write(&mut self, address: Address, value: u64, width: Width) -> Result<(), MemoryError> {
        let range = self
            .offset_range(address, width.bytes())
            .ok_or(MemoryError::OutOfBounds { address, width })?;
        self.map[range].copy_from_slice(&value.to_le_bytes()[..width.bytes()]);
        Ok(())
    }

    /// Copies `input` into the region starting at `address`.
    pub fn load(&mut self, address: Address, input: &[u8]) -> Result<(), MemoryError> {
        let range = self
            .offset_range(address, input.len())
            .ok_or(MemoryError::OutOfBounds {
                address,
                width: Width::_8,
            })?;
        self.map[range].copy_from_slice(input);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_write_widths() {
        let mut region =
            MemoryRegion::new("ram", MemorySize::new(0x100).unwrap(), Address(0x1000)).unwrap();
        region
            .write(Address(0x1000), 0xdead_beef, Width::_32)
            .unwrap();
        assert_eq!(region.read(Address(0x1000), Width::_32), Ok(0xdead_beef));
        assert_eq!(region.read(Address(0x1000), Width::_8), Ok(0xef));
        assert_eq!(region.read(Address(0x1002), Width::_16), Ok(0xdead));
        region.write(Address(0x1001), 0x1234, Width::_8).unwrap();
        assert_eq!(region.read(Address(0x1000), Width::_32), Ok(0xdead_34ef));
    }

    #[test]
    fn test_out_of_bounds() {
        let region =
            MemoryRegion::new("ram", MemorySize::new(0x10).unwrap(), Address(0x1000)).unwrap();
        assert!(!region.contains(Address(0xfff)));
        assert!(region.contains(Address(0x100f)));
        assert_eq!(
            region.read(Address(0xfff), Width::_8),
            Err(MemoryError::OutOfBounds {
                address: Address(0xfff),
                width: Width::_8
            })
        );
        assert!(region.read(Address(0x100d), Width::_32).is_err());
        assert!(region.read(Address(0x100c), Width::_32).is_ok());
        assert!(region.read(Address(u64::MAX), Width::_64).is_err());
    }
}
