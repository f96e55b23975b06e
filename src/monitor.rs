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

//! Interactive debugging monitor.
//!
//! A [`Monitor`] owns a [`Target`] and a [`WatchpointPool`], reads commands
//! line by line and drives execution of the target.

use std::{
    io::{BufRead, Write},
    ops::ControlFlow,
};

use crate::{
    expr,
    memory::{Address, Width},
    target::{Target, Trap},
    watchpoint::{WatchEvent, WatchpointError, WatchpointPool},
};

mod command;

pub use command::*;

/// Shown before reading each command.
pub const PROMPT: &str = "(sdb) ";

/// Executed instructions are traced when fewer than this many are requested.
pub const MAX_INSTRUCTIONS_TO_PRINT: u64 = 10;

/// Execution state of the target, as seen by the monitor.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ExecState {
    /// Instructions are being executed.
    Running,
    /// Waiting for a command.
    Stopped,
    /// The guest halted with `code`.
    Ended { pc: Address, code: u64 },
    /// The guest raised a trap other than halting.
    Aborted { pc: Address },
    /// The operator quit.
    Quit,
}

/// Why [`Monitor::run`] returned.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ExitReason {
    /// The operator entered `q`.
    Quit,
    /// Input was closed.
    EndOfInput,
    /// Batch mode ran the program once.
    Batch,
}

#[derive(Debug)]
pub struct Monitor<T> {
    target: T,
    watchpoints: WatchpointPool,
    state: ExecState,
    batch_mode: bool,
    instructions: u64,
}

impl<T: Target> Monitor<T> {
    pub fn new(target: T, watchpoint_capacity: usize) -> Self {
        Self {
            target,
            watchpoints: WatchpointPool::new(watchpoint_capacity),
            state: ExecState::Stopped,
            batch_mode: false,
            instructions: 0,
        }
    }

    /// In batch mode [`Self::run`] does not read commands and instead runs
    /// the program to completion.
    pub fn set_batch_mode(&mut self, batch_mode: bool) {
        self.batch_mode = batch_mode;
    }

    #[inline]
    pub fn target(&self) -> &T {
        &self.target
    }

    #[inline]
    pub fn target_mut(&mut self) -> &mut T {
        &mut self.target
    }

    #[inline]
    pub fn watchpoints(&self) -> &WatchpointPool {
        &self.watchpoints
    }

    #[inline]
    pub fn state(&self) -> &ExecState {
        &self.state
    }

    /// Number of guest instructions executed so far.
    #[inline]
    pub fn instructions_executed(&self) -> u64 {
        self.instructions
    }

    /// Whether the session should end with a failure exit status.
    pub fn is_exit_status_bad(&self) -> bool {
        !matches!(
            self.state,
            ExecState::Quit | ExecState::Ended { code: 0, .. }
        )
    }

    /// Reads and dispatches commands from `input` until the operator quits or
    /// the input ends.
    pub fn run<R: BufRead, W: Write>(
        &mut self,
        mut input: R,
        mut out: W,
    ) -> std::io::Result<ExitReason> {
        if self.batch_mode {
            log::info!("Batch mode: running program to completion");
            self.execute(u64::MAX, &mut out)?;
            out.flush()?;
            return Ok(ExitReason::Batch);
        }
        let mut buf = vec![];
        loop {
            write!(out, "{}", PROMPT)?;
            out.flush()?;
            buf.clear();
            if input.read_until(b'\n', &mut buf)? == 0 {
                writeln!(out)?;
                log::debug!("End of input");
                return Ok(ExitReason::EndOfInput);
            }
            let line = String::from_utf8_lossy(&buf);
            if let ControlFlow::Break(reason) = self.dispatch(&line, &mut out)? {
                out.flush()?;
                return Ok(reason);
            }
        }
    }

    /// Parses and executes one line of input.
    ///
    /// Only `q` breaks out of the command loop; all other commands, and all
    /// errors, are reported to `out` and continue. Only failing to write to
    /// `out` is returned as an error.
    pub fn dispatch<W: Write>(
        &mut self,
        line: &str,
        out: &mut W,
    ) -> std::io::Result<ControlFlow<ExitReason>> {
        match Command::parse(line) {
            Ok(command) => self.execute_command(command, out),
            Err(err) => {
                log::debug!("Could not parse {:?}: {:?}", line, err);
                writeln!(out, "{}", err)?;
                Ok(ControlFlow::Continue(()))
            }
        }
    }

    pub fn execute_command<W: Write>(
        &mut self,
        command: Command,
        out: &mut W,
    ) -> std::io::Result<ControlFlow<ExitReason>> {
        log::debug!("Executing {:?}", command);
        match command {
            Command::Help(None) => {
                for command in COMMANDS {
                    writeln!(out, "{} - {}", command.name, command.description)?;
                }
            }
            Command::Help(Some(name)) => match CommandDescription::find(&name) {
                Some(command) => writeln!(
                    out,
                    "{} - {}\nUsage: {}",
                    command.name, command.description, command.usage
                )?,
                None => writeln!(out, "{}", CommandError::Unknown(name))?,
            },
            Command::Continue => self.execute(u64::MAX, out)?,
            Command::Quit => {
                self.state = ExecState::Quit;
                return Ok(ControlFlow::Break(ExitReason::Quit));
            }
            Command::Step(count) => self.execute(count, out)?,
            Command::Info(InfoSubject::Registers) => self.target.display_registers(out)?,
            Command::Info(InfoSubject::Watchpoints) => self.print_watchpoints(out)?,
            Command::Examine { count, address } => self.examine(count, address, out)?,
            Command::Print(expression) => match expr::evaluate(&expression, &self.target) {
                Ok(value) => writeln!(out, "> {}", value)?,
                Err(err) => writeln!(out, "Invalid expression: {}", err)?,
            },
            Command::Watch(expression) => match self.watchpoints.allocate(&expression) {
                Ok(id) => {
                    log::info!("Set watchpoint {} on {:?}", id, expression);
                    writeln!(out, "Watchpoint {}: {}", id, expression)?;
                }
                Err(err @ WatchpointError::PoolExhausted { .. }) => {
                    writeln!(out, "Cannot set watchpoint: {}", err)?
                }
                Err(err) => writeln!(out, "{}", err)?,
            },
            Command::Delete(id) => match self.watchpoints.deallocate(id) {
                Ok(()) => {
                    log::info!("Deleted watchpoint {}", id);
                    writeln!(out, "Deleted watchpoint {}", id)?;
                }
                Err(_) => writeln!(out, "No watchpoint number {}.", id)?,
            },
        }
        Ok(ControlFlow::Continue(()))
    }

    /// Executes up to `count` instructions, stopping early when the guest
    /// traps or a watchpoint changes.
    pub fn execute<W: Write>(&mut self, count: u64, out: &mut W) -> std::io::Result<()> {
        match self.state {
            ExecState::Ended { .. } | ExecState::Aborted { .. } => {
                writeln!(
                    out,
                    "Program execution has ended. To restart the program, exit and run again."
                )?;
                return Ok(());
            }
            _ => self.state = ExecState::Running,
        }
        let trace = count < MAX_INSTRUCTIONS_TO_PRINT;
        for _ in 0..count {
            let pc = self.target.pc();
            if trace {
                match self.target.read_memory(pc, Width::_32) {
                    Ok(raw) => writeln!(out, "{}: {:08x}", pc, raw)?,
                    Err(_) => writeln!(out, "{}: ????????", pc)?,
                }
            }
            let result = self.target.step();
            self.instructions += 1;
            if let Err(trap) = result {
                log::debug!("Trap: {}", trap);
                self.state = match trap {
                    Trap::Halt { pc, code } => ExecState::Ended { pc, code },
                    other => {
                        writeln!(out, "{}", other)?;
                        ExecState::Aborted { pc: other.pc() }
                    }
                };
            }
            self.check_watchpoints(out)?;
            if self.state != ExecState::Running {
                break;
            }
        }

        match self.state {
            ExecState::Running => self.state = ExecState::Stopped,
            ExecState::Ended { pc, code } => {
                let verdict = if code == 0 {
                    "HIT GOOD TRAP"
                } else {
                    "HIT BAD TRAP"
                };
                writeln!(out, "sdb: {} at pc = {}", verdict, pc)?;
                self.statistics(out)?;
            }
            ExecState::Aborted { pc } => {
                writeln!(out, "sdb: ABORT at pc = {}", pc)?;
                self.statistics(out)?;
            }
            ExecState::Stopped | ExecState::Quit => {}
        }
        Ok(())
    }

    /// Scans every watchpoint and stops execution if any value changed.
    fn check_watchpoints<W: Write>(&mut self, out: &mut W) -> std::io::Result<()> {
        let target = &self.target;
        let report = self
            .watchpoints
            .scan_for_changes(|expression| expr::evaluate(expression, target));
        for event in &report.events {
            match event {
                WatchEvent::Changed {
                    id,
                    expression,
                    new_value,
                    old_value,
                } => writeln!(
                    out,
                    "Watchpoint {}: {}\n  Old value = {}\n  New value = {}",
                    id, expression, old_value, new_value
                )?,
                WatchEvent::Invalid {
                    id,
                    expression,
                    error,
                } => {
                    log::warn!("Watchpoint {} on {:?} is invalid: {}", id, expression, error);
                    writeln!(
                        out,
                        "Watchpoint {}: invalid expression '{}': {}",
                        id, expression, error
                    )?
                }
            }
        }
        if report.halt() && self.state == ExecState::Running {
            self.state = ExecState::Stopped;
        }
        Ok(())
    }

    fn print_watchpoints<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        if self.watchpoints.is_empty() {
            return writeln!(out, "No watchpoints.");
        }
        writeln!(out, "{:<6}{:<24}{}", "Num", "Expression", "Value")?;
        for watchpoint in &self.watchpoints {
            writeln!(
                out,
                "{:<6}{:<24}{}",
                watchpoint.id.0, watchpoint.expression, watchpoint.last_value
            )?;
        }
        Ok(())
    }

    fn examine<W: Write>(&self, count: u64, address: Address, out: &mut W) -> std::io::Result<()> {
        writeln!(out, "{:<14}{:<24}{}", "Address", "Hexadecimal", "Decimal")?;
        let mut current = address;
        for _ in 0..count {
            let word = match self.target.read_memory(current, Width::_32) {
                Ok(word) => (word as u32).to_le_bytes(),
                Err(err) => return writeln!(out, "Cannot access memory: {}", err),
            };
            writeln!(
                out,
                "0x{:<12x}0x{:02x}  0x{:02x}  0x{:02x}  0x{:02x}    {:<4}  {:<4}  {:<4}  {}",
                current.0,
                word[0],
                word[1],
                word[2],
                word[3],
                word[0],
                word[1],
                word[2],
                word[3]
            )?;
            let Some(next) = current.checked_add(4) else {
                break;
            };
            current = next;
        }
        Ok(())
    }

    fn statistics<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        writeln!(out, "sdb: total guest instructions = {}", self.instructions)
    }
}
