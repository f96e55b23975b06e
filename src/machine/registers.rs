// SPDX-License-Identifier: EUPL-1.2 OR GPL-3.0-or-later
// Copyright Contributors to the sdb project.

//! RV32 general purpose register file.

/// ABI names of `x0`..`x31`.
pub const REGISTER_NAMES: [&str; 32] = [
    "$0", "ra", "sp", "gp", "tp", "t0", "t1", "t2", "s0", "s1", "a0", "a1", "a2", "a3", "a4", "a5",
    "a6", "a7", "s2", "s3", "s4", "s5", "s6", "s7", "s8", "s9", "s10", "s11", "t3", "t4", "t5",
    "t6",
];

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RegisterFile {
    x: [u32; 32],
}

impl RegisterFile {
    /// Reads `x{index}`. `x0` always reads as zero.
    #[inline]
    pub fn get(&self, index: u32) -> u32 {
        self.x[index as usize & 0x1f]
    }

    /// Writes `x{index}`. Writes to `x0` are discarded.
    #[inline]
    pub fn set(&mut self, index: u32, value: u32) {
        let index = index as usize & 0x1f;
        if index != 0 {
            self.x[index] = value;
        }
    }

    /// Resolves a register name to its index.
    ///
    /// Accepts ABI names (`a0`, `sp`, ...), their aliases `zero`, `0` and
    /// `fp`, and architectural names `x0` to `x31`.
    pub fn index_of(name: &str) -> Option<u32> {
        match name {
            "0" | "zero" => return Some(0),
            "fp" => return Some(8),
            _ => {}
        }
        if let Some(index) = REGISTER_NAMES.iter().position(|n| *n == name) {
            return Some(index as u32);
        }
        name.strip_prefix('x')
            .filter(|digits| !digits.starts_with('+'))
            .and_then(|digits| digits.parse::<u32>().ok())
            .filter(|index| *index < 32)
    }

    /// Reads a register by name, see [`Self::index_of`].
    pub fn by_name(&self, name: &str) -> Option<u32> {
        Self::index_of(name).map(|index| self.get(index))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, u32)> + '_ {
        REGISTER_NAMES.iter().copied().zip(self.x.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_names() {
        assert_eq!(RegisterFile::index_of("$0"), Some(0));
        assert_eq!(RegisterFile::index_of("0"), Some(0));
        assert_eq!(RegisterFile::index_of("zero"), Some(0));
        assert_eq!(RegisterFile::index_of("sp"), Some(2));
        assert_eq!(RegisterFile::index_of("fp"), Some(8));
        assert_eq!(RegisterFile::index_of("s0"), Some(8));
        assert_eq!(RegisterFile::index_of("a0"), Some(10));
        assert_eq!(RegisterFile::index_of("t6"), Some(31));
        assert_eq!(RegisterFile::index_of("x31"), Some(31));
        assert_eq!(RegisterFile::index_of("x32"), None);
        assert_eq!(RegisterFile::index_of("x+1"), None);
        assert_eq!(RegisterFile::index_of("pc"), None);
    }

    #[test]
    fn test_zero_register_is_hardwired() {
        let mut regs = RegisterFile::default();
        regs.set(0, 0xffff_ffff);
        regs.set(10, 42);
        assert_eq!(regs.get(0), 0);
        assert_eq!(regs.by_name("a0"), Some(42));
        assert_eq!(regs.iter().nth(10), Some(("a0", 42)));
    }
}
