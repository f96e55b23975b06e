// SPDX-License-Identifier: EUPL-1.2 OR GPL-3.0-or-later
// Copyright Contributors to the sdb project.

//! RV32I instruction interpreter.

use crate::{
    machine::Machine,
    memory::{Address, Width},
    target::Trap,
};

/// Encoding of `ebreak`, used as the halt instruction.
const EBREAK: u32 = 0x0010_0073;

#[inline]
const fn rd(raw: u32) -> u32 {
    (raw >> 7) & 0x1f
}

#[inline]
const fn rs1(raw: u32) -> u32 {
    (raw >> 15) & 0x1f
}

#[inline]
const fn rs2(raw: u32) -> u32 {
    (raw >> 20) & 0x1f
}

#[inline]
const fn funct3(raw: u32) -> u32 {
    (raw >> 12) & 0x7
}

#[inline]
const fn funct7(raw: u32) -> u32 {
    raw >> 25
}

/// Sign bits of the instruction, all ones or all zeros.
#[inline]
const fn sign(raw: u32) -> u32 {
    ((raw as i32) >> 31) as u32
}

#[inline]
const fn imm_i(raw: u32) -> u32 {
    ((raw as i32) >> 20) as u32
}

#[inline]
const fn imm_s(raw: u32) -> u32 {
    (sign(raw) << 12) | (((raw >> 25) & 0x7f) << 5) | ((raw >> 7) & 0x1f)
}

#[inline]
const fn imm_b(raw: u32) -> u32 {
    (sign(raw) << 12)
        | (((raw >> 7) & 0x1) << 11)
        | (((raw >> 25) & 0x3f) << 5)
        | (((raw >> 8) & 0xf) << 1)
}

#[inline]
const fn imm_u(raw: u32) -> u32 {
    raw & 0xffff_f000
}

#[inline]
const fn imm_j(raw: u32) -> u32 {
    (sign(raw) << 20)
        | (raw & 0x000f_f000)
        | (((raw >> 20) & 0x1) << 11)
        | (((raw >> 21) & 0x3ff) << 1)
}

impl Machine {
    fn load(&self, pc: Address, address: u32, width: Width) -> Result<u32, Trap> {
        self.memory
            .read(Address(address.into()), width)
            .map(|value| value as u32)
            .map_err(|error| Trap::MemoryFault { pc, error })
    }

    fn store(&mut self, pc: Address, address: u32, value: u32, width: Width) -> Result<(), Trap> {
        self.memory
            .write(Address(address.into()), value.into(), width)
            .map_err(|error| Trap::MemoryFault { pc, error })
    }

    /// Executes `raw`, located at the current program counter, and returns the
    /// address of the next instruction.
    pub(super) fn execute(&mut self, raw: u32) -> Result<u32, Trap> {
        let pc = self.pc;
        let trap_pc = Address(pc.into());
        let illegal = || Trap::IllegalInstruction { pc: trap_pc, raw };
        let x1 = self.registers.get(rs1(raw));
        let x2 = self.registers.get(rs2(raw));
        let mut next_pc = pc.wrapping_add(4);

        match raw & 0x7f {
            // lui
            0x37 => self.registers.set(rd(raw), imm_u(raw)),
            // auipc
            0x17 => self.registers.set(rd(raw), pc.wrapping_add(imm_u(raw))),
            // jal
            0x6f => {
                self.registers.set(rd(raw), next_pc);
                next_pc = pc.wrapping_add(imm_j(raw));
            }
            // jalr
            0x67 if funct3(raw) == 0 => {
                let target = x1.wrapping_add(imm_i(raw)) & !1;
                self.registers.set(rd(raw), next_pc);
                next_pc = target;
            }
            // branches
            0x63 => {
                let taken = match funct3(raw) {
                    0b000 => x1 == x2,
                    0b001 => x1 != x2,
                    0b100 => (x1 as i32) < (x2 as i32),
                    0b101 => (x1 as i32) >= (x2 as i32),
                    0b110 => x1 < x2,
                    0b111 => x1 >= x2,
                    _ => return Err(illegal()),
                };
                if taken {
                    next_pc = pc.wrapping_add(imm_b(raw));
                }
            }
            // loads
            0x03 => {
                let address = x1.wrapping_add(imm_i(raw));
                let value = match funct3(raw) {
                    0b000 => self.load(trap_pc, address, Width::_8)? as i8 as i32 as u32,
                    0b001 => self.load(trap_pc, address, Width::_16)? as i16 as i32 as u32,
                    0b010 => self.load(trap_pc, address, Width::_32)?,
                    0b100 => self.load(trap_pc, address, Width::_8)?,
                    0b101 => self.load(trap_pc, address, Width::_16)?,
                    _ => return Err(illegal()),
                };
                self.registers.set(rd(raw), value);
            }
            // stores
            0x23 => {
                let address = x1.wrapping_add(imm_s(raw));
                let width = match funct3(raw) {
                    0b000 => Width::_8,
                    0b001 => Width::_16,
                    0b010 => Width::_32,
                    _ => return Err(illegal()),
                };
                self.store(trap_pc, address, x2, width)?;
            }
            // register-immediate
            0x13 => {
                let imm = imm_i(raw);
                let shamt = rs2(raw);
                let value = match (funct3(raw), funct7(raw)) {
                    (0b000, _) => x1.wrapping_add(imm),
                    (0b010, _) => u32::from((x1 as i32) < (imm as i32)),
                    (0b011, _) => u32::from(x1 < imm),
                    (0b100, _) => x1 ^ imm,
                    (0b110, _) => x1 | imm,
                    (0b111, _) => x1 & imm,
                    (0b001, 0b000_0000) => x1 << shamt,
                    (0b101, 0b000_0000) => x1 >> shamt,
                    (0b101, 0b010_0000) => ((x1 as i32) >> shamt) as u32,
                    _ => return Err(illegal()),
                };
                self.registers.set(rd(raw), value);
            }
            // register-register
            0x33 => {
                let shamt = x2 & 0x1f;
                let value = match (funct3(raw), funct7(raw)) {
                    (0b000, 0b000_0000) => x1.wrapping_add(x2),
                    (0b000, 0b010_0000) => x1.wrapping_sub(x2),
                    (0b001, 0b000_0000) => x1 << shamt,
                    (0b010, 0b000_0000) => u32::from((x1 as i32) < (x2 as i32)),
                    (0b011, 0b000_0000) => u32::from(x1 < x2),
                    (0b100, 0b000_0000) => x1 ^ x2,
                    (0b101, 0b000_0000) => x1 >> shamt,
                    (0b101, 0b010_0000) => ((x1 as i32) >> shamt) as u32,
                    (0b110, 0b000_0000) => x1 | x2,
                    (0b111, 0b000_0000) => x1 & x2,
                    _ => return Err(illegal()),
                };
                self.registers.set(rd(raw), value);
            }
            // fence: single hart, nothing to order
            0x0f => {}
            0x73 if raw == EBREAK => {
                return Err(Trap::Halt {
                    pc: trap_pc,
                    code: self.registers.get(10).into(),
                });
            }
            _ => return Err(illegal()),
        }
        Ok(next_pc)
    }
}
