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

use sdb::{
    machine::Machine,
    memory::{Address, MemoryRegion, MemorySize, PHYS_MEM_START},
    monitor::{ExitReason, Monitor},
    target::Target,
};

/// Counts t1 down from 5, storing each value to `base + 0x100`, then
/// halts with a0 = 0.
#[allow(dead_code)]
pub const COUNTDOWN: [u32; 7] = [
    // auipc t0, 0
    0x0000_0297,
    // addi  t1, zero, 5
    0x0050_0313,
    // sw    t1, 256(t0)
    0x1062_a023,
    // addi  t1, t1, -1
    0xfff3_0313,
    // bnez  t1, -8
    0xfe03_1ce3,
    // li    a0, 0
    0x0000_0513,
    // ebreak
    0x0010_0073,
];

#[allow(dead_code)]
pub fn make_test_machine(memory_size: MemorySize, program: &[u32]) -> Machine {
    let memory = MemoryRegion::new("ram", memory_size, Address(PHYS_MEM_START)).unwrap();
    let mut machine = Machine::new(memory).unwrap();
    let bytes = program
        .iter()
        .flat_map(|word| word.to_le_bytes())
        .collect::<Vec<u8>>();
    machine.load_code(&bytes, Address(PHYS_MEM_START)).unwrap();
    machine
}

/// Feeds `script` to the monitor's command loop and returns everything it
/// printed.
#[allow(dead_code)]
pub fn run_script<T: Target>(monitor: &mut Monitor<T>, script: &str) -> (ExitReason, String) {
    let mut out = vec![];
    let reason = monitor.run(script.as_bytes(), &mut out).unwrap();
    (reason, String::from_utf8(out).unwrap())
}
