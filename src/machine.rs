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

//! Reference RV32I machine that the monitor can drive.

use std::{num::NonZero, ops::Range};

use crate::{
    memory::*,
    target::{Target, Trap},
};

mod interpreter;
pub mod registers;

pub use registers::RegisterFile;

/// Image loaded when no program is given:
///
/// ```text
/// auipc t0, 0
/// sb    zero, 16(t0)
/// lbu   a0, 16(t0)
/// ebreak
/// .word 0xdeadbeef
/// ```
pub const BUILTIN_IMAGE: [u32; 5] = [
    0x0000_0297,
    0x0002_8823,
    0x0102_c503,
    0x0010_0073,
    0xdead_beef,
];

/// The state of the emulated machine.
#[derive(Debug)]
pub struct Machine {
    pub pc: u32,
    pub registers: RegisterFile,
    pub memory: MemoryRegion,
}

impl Machine {
    /// Creates a machine with `memory` as its RAM and the program counter at
    /// the start of RAM.
    pub fn new(memory: MemoryRegion) -> Result<Self, Box<dyn std::error::Error>> {
        let range = Range::<Address>::from(&memory);
        if range.end.0 > 1 << 32 {
            return Err(format!(
                "Memory region {}-{} does not fit in the 32-bit physical address space.",
                range.start, range.end
            )
            .into());
        }
        Ok(Self {
            pc: memory.phys_offset.0 as u32,
            registers: RegisterFile::default(),
            memory,
        })
    }

    /// Load code to physical memory address.
    pub fn load_code(
        &mut self,
        input: &[u8],
        address: Address,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let Some(input_size) = NonZero::new(input.len() as u64) else {
            log::info!("Called `load_code` with empty slice which does nothing.");
            return Ok(());
        };
        if address < self.memory.phys_offset {
            return Err(format!(
                "Cannot load code to address {} which is below start of DRAM {}.",
                address, self.memory.phys_offset,
            )
            .into());
        }
        if !self.memory.contains(address) {
            return Err(format!(
                "Address {} does not fit into DRAM of size {}.",
                address, self.memory.size
            )
            .into());
        }
        if self.memory.load(address, input).is_err() {
            return Err(format!(
                "Input of size {} cannot fit in DRAM of size {} starting from address {}.",
                MemorySize(input_size),
                self.memory.size,
                address,
            )
            .into());
        }
        log::debug!("Loaded {} bytes at {}", input.len(), address);
        Ok(())
    }

    /// Loads [`BUILTIN_IMAGE`] at the start of RAM.
    pub fn load_builtin_image(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let bytes = BUILTIN_IMAGE
            .iter()
            .flat_map(|word| word.to_le_bytes())
            .collect::<Vec<u8>>();
        self.load_code(&bytes, self.memory.phys_offset)
    }
}

impl Target for Machine {
    fn step(&mut self) -> Result<(), Trap> {
        let pc = Address(self.pc.into());
        let raw = self
            .memory
            .read(pc, Width::_32)
            .map_err(|error| Trap::MemoryFault { pc, error })? as u32;
        log::trace!("{}: {:08x}", pc, raw);
        self.pc = self.execute(raw)?;
        Ok(())
    }

    fn pc(&self) -> Address {
        Address(self.pc.into())
    }

    fn read_memory(&self, address: Address, width: Width) -> Result<u64, MemoryError> {
        self.memory.read(address, width)
    }

    fn register(&self, name: &str) -> Option<u64> {
        if name == "pc" {
            return Some(self.pc.into());
        }
        self.registers.by_name(name).map(u64::from)
    }

    fn display_registers(&self, out: &mut dyn std::io::Write) -> std::io::Result<()> {
        for (name, value) in self.registers.iter() {
            writeln!(out, "{:<15}0x{:<15x}{}", name, value, value)?;
        }
        writeln!(out, "{:<15}0x{:<15x}{}", "pc", self.pc, self.pc)
    }
}
