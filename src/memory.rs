//
// sdb
//
// Copyright 2025 Emmanouil Pitsidianakis <manos@pitsidianak.is>
//
// This file is part of sdb.
//
// sdb is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// sdb is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with sdb. If not, see <http://www.gnu.org/licenses/>.
//
// SPDX-License-Identifier: EUPL-1.2 OR GPL-3.0-or-later

//! Guest memory types shared by the monitor and its targets.

mod address;
mod region;
mod size;

pub use address::*;
pub use region::*;
pub use size::*;

/// Default guest physical address of DRAM, which is also the reset program
/// counter.
pub const PHYS_MEM_START: u64 = 0x8000_0000;

#[derive(Clone, Copy, Debug, Eq, PartialEq, PartialOrd)]
#[repr(i32)]
/// Register/memory width in bits.
pub enum Width {
    _64 = 64,
    _32 = 32,
    _16 = 16,
    _8 = 8,
}

impl Width {
    /// Access size in bytes.
    #[inline]
    pub const fn bytes(self) -> usize {
        match self {
            Self::_8 => 1,
            Self::_16 => 2,
            Self::_32 => 4,
            Self::_64 => 8,
        }
    }
}
