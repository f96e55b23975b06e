//
// sdb
//
// Copyright 2025- Manos Pitsidianakis
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

use std::{borrow::Cow, num::NonZero, path::PathBuf};

use clap::Parser;
use sdb::{
    memory::{Address, MemorySize, PHYS_MEM_START},
    watchpoint::DEFAULT_CAPACITY,
};

fn maybe_hex(s: &str) -> Result<u64, Cow<'static, str>> {
    const HEX_PREFIX: &str = "0x";
    const HEX_PREFIX_UPPER: &str = "0X";
    const HEX_PREFIX_LEN: usize = HEX_PREFIX.len();

    let result = if s.starts_with(HEX_PREFIX) || s.starts_with(HEX_PREFIX_UPPER) {
        u64::from_str_radix(&s[HEX_PREFIX_LEN..], 16)
    } else {
        s.parse::<u64>()
    };

    result.map_err(|err| Cow::Owned(err.to_string()))
}

fn address(s: &str) -> Result<Address, Cow<'static, str>> {
    maybe_hex(s).map(Address)
}

fn memory_size(s: &str) -> Result<MemorySize, Cow<'static, str>> {
    const SUFFIXES: [(&str, &str, NonZero<u64>); 3] = [
        ("KiB", "K", MemorySize::KiB),
        ("MiB", "M", MemorySize::MiB),
        ("GiB", "G", MemorySize::GiB),
    ];

    fn err<A>(_: A) -> Cow<'static, str> {
        Cow::Borrowed(
            "Expected decimal or hexadecimal value, with optional suffixes: B (bytes), K/KiB \
             (Kibibytes), M/MiB (Mibibytes) or G/GiB. (A kibibyte is 1024 bytes)",
        )
    }
    fn non_zero_map(
        value: Result<u64, Cow<'static, str>>,
    ) -> Result<MemorySize, Cow<'static, str>> {
        Ok(MemorySize(value?.try_into().map_err(|err| {
            Cow::Owned(format!("Memory size must be non-zero: {err}"))
        })?))
    }
    if let Ok(num) = maybe_hex(s) {
        return non_zero_map(Ok(num));
    }

    for (long, short, unit) in SUFFIXES {
        if let Some(s) = s.strip_suffix(long).or_else(|| s.strip_suffix(short)) {
            let mut value = non_zero_map(maybe_hex(s).map_err(err))?;
            value.0 = value.0.checked_mul(unit).ok_or_else(|| {
                Cow::Owned(format!(
                    "{}{} is too large be represented in 64 bits",
                    value.0, long
                ))
            })?;
            return Ok(value);
        }
    }
    if let Some(s) = s.strip_suffix("B") {
        return non_zero_map(maybe_hex(s).map_err(err));
    }

    Err(err(()))
}

const DEFAULT_MEMORY_SIZE: MemorySize =
    MemorySize(NonZero::new(128 * MemorySize::MiB.get()).unwrap());

const DEFAULT_WATCHPOINTS: NonZero<usize> = NonZero::new(DEFAULT_CAPACITY).unwrap();

/// Simple debugging monitor for an RV32I emulator
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Increase log verbosity; may be repeated. `RUST_LOG` takes precedence.
    #[arg(short, long, default_value_t = 0, action = clap::ArgAction::Count)]
    pub verbose: u8,
    /// Run the program to completion without reading any commands.
    #[arg(short, long)]
    pub batch: bool,
    /// Maximum number of watchpoints that can be set at the same time.
    #[arg(long, default_value_t = DEFAULT_WATCHPOINTS)]
    pub watchpoints: NonZero<usize>,
    /// Hexadecimal or decimal value of the physical address guest memory
    /// starts at. The image is loaded there and execution begins there.
    #[arg(long, default_value_t = Address(PHYS_MEM_START), value_parser=address)]
    pub start_address: Address,
    /// Non-zero hexadecimal or decimal value of the size of guest memory.
    #[arg(long, default_value_t = DEFAULT_MEMORY_SIZE, value_parser=memory_size)]
    pub memory: MemorySize,

    /// Path to a raw binary file containing RV32I instructions (NOT an ELF
    /// file!). A small built-in program is used when it is not given.
    #[arg(value_name = "IMAGE")]
    pub image: Option<PathBuf>,
}

impl Args {
    /// Parse command-line arguments from the process environment.
    pub fn parse() -> Result<Self, String> {
        let retval = <Self as clap::Parser>::parse();
        retval.validate()?;
        Ok(retval)
    }

    fn validate(&self) -> Result<(), String> {
        match self.start_address.checked_add(self.memory.get()) {
            Some(end) if end.0 <= 1 << 32 => Ok(()),
            _ => Err(format!(
                "Invalid arguments: Memory of size {} starting at {} does not fit in the 32-bit \
                 physical address space.",
                self.memory, self.start_address
            )),
        }
    }

    /// Log level selected by `--verbose`.
    pub fn log_level(&self) -> log::LevelFilter {
        match self.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_size() {
        assert_eq!(memory_size("4096").unwrap().get(), 4096);
        assert_eq!(memory_size("0x1000").unwrap().get(), 4096);
        assert_eq!(memory_size("4K").unwrap().get(), 4096);
        assert_eq!(memory_size("128MiB").unwrap().get(), 128 * 1024 * 1024);
        assert_eq!(memory_size("1G").unwrap().get(), 1024 * 1024 * 1024);
        assert_eq!(memory_size("16B").unwrap().get(), 16);
        memory_size("0").unwrap_err();
        memory_size("0K").unwrap_err();
        memory_size("lots").unwrap_err();
        memory_size("0xffffffffffffffffG").unwrap_err();
    }

    #[test]
    fn test_arguments() {
        let args = <Args as clap::Parser>::try_parse_from(["sdb"]).unwrap();
        assert!(!args.batch);
        assert_eq!(args.watchpoints.get(), DEFAULT_CAPACITY);
        assert_eq!(args.start_address, Address(PHYS_MEM_START));
        assert_eq!(args.memory.get(), 128 * 1024 * 1024);
        assert_eq!(args.image, None);
        assert_eq!(args.log_level(), log::LevelFilter::Warn);
        args.validate().unwrap();

        let args = <Args as clap::Parser>::try_parse_from([
            "sdb",
            "-b",
            "-vv",
            "--watchpoints",
            "4",
            "--memory",
            "4K",
            "--start-address",
            "0x1000",
            "prog.bin",
        ])
        .unwrap();
        assert!(args.batch);
        assert_eq!(args.watchpoints.get(), 4);
        assert_eq!(args.log_level(), log::LevelFilter::Debug);
        assert_eq!(args.image, Some(PathBuf::from("prog.bin")));
        args.validate().unwrap();

        let args = <Args as clap::Parser>::try_parse_from([
            "sdb",
            "--memory",
            "4K",
            "--start-address",
            "0xfffff800",
        ])
        .unwrap();
        args.validate().unwrap_err();
        let args = <Args as clap::Parser>::try_parse_from([
            "sdb",
            "--start-address",
            "0xfffff000",
            "--memory",
            "4K",
        ])
        .unwrap();
        args.validate().unwrap();
        <Args as clap::Parser>::try_parse_from(["sdb", "--watchpoints", "0"]).unwrap_err();
    }
}
