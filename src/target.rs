// SPDX-License-Identifier: EUPL-1.2 OR GPL-3.0-or-later
// Copyright Contributors to the sdb project.

//! Interface between the monitor and an emulated machine.

use crate::memory::{Address, MemoryError, Width};

/// Condition that stops guest execution.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Trap {
    /// The guest executed its halt instruction with exit `code`.
    Halt { pc: Address, code: u64 },
    /// The instruction at `pc` could not be decoded or is not supported.
    IllegalInstruction { pc: Address, raw: u32 },
    /// Instruction fetch or data access failed.
    MemoryFault { pc: Address, error: MemoryError },
}

impl Trap {
    /// Program counter of the instruction that raised the trap.
    pub const fn pc(&self) -> Address {
        match self {
            Self::Halt { pc, .. }
            | Self::IllegalInstruction { pc, .. }
            | Self::MemoryFault { pc, .. } => *pc,
        }
    }
}

impl std::fmt::Display for Trap {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Halt { pc, code } => write!(fmt, "halt at pc = {} with code {}", pc, code),
            Self::IllegalInstruction { pc, raw } => {
                write!(fmt, "illegal instruction 0x{:08x} at pc = {}", raw, pc)
            }
            Self::MemoryFault { pc, error } => write!(fmt, "memory fault at pc = {}: {}", pc, error),
        }
    }
}

impl std::error::Error for Trap {}

/// An emulated machine the monitor can drive.
///
/// The monitor never interprets instructions itself: it single-steps the
/// target, and uses the read-only accessors to evaluate expressions and
/// inspect state between steps.
pub trait Target {
    /// Executes exactly one instruction.
    fn step(&mut self) -> Result<(), Trap>;

    /// Address of the next instruction to execute.
    fn pc(&self) -> Address;

    /// Reads a little-endian value of `width` from guest physical memory.
    fn read_memory(&self, address: Address, width: Width) -> Result<u64, MemoryError>;

    /// Looks up a register by name, without any `$` prefix.
    fn register(&self, name: &str) -> Option<u64>;

    /// Writes a human readable register dump.
    fn display_registers(&self, out: &mut dyn std::io::Write) -> std::io::Result<()>;
}
