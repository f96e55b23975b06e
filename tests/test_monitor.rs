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
    machine::BUILTIN_IMAGE,
    memory::{Address, MemorySize},
    monitor::{ExecState, ExitReason, Monitor, PROMPT},
    target::Target,
};

mod utils;

const MEMORY_SIZE: MemorySize = MemorySize::new(0x1000).unwrap();

#[test]
fn test_memory_watchpoint() {
    _ = env_logger::builder().is_test(true).try_init();

    let machine = utils::make_test_machine(MEMORY_SIZE, &utils::COUNTDOWN);
    let mut monitor = Monitor::new(machine, 4);
    let (reason, output) = utils::run_script(
        &mut monitor,
        "w *0x80000100\nc\np $t1\nc\nc\nc\nc\nc\n",
    );
    assert_eq!(reason, ExitReason::EndOfInput);
    assert!(
        output.contains("Watchpoint 0: *0x80000100\n  Old value = 0\n  New value = 5\n"),
        "{output}"
    );
    assert!(output.contains("> 5\n"), "{output}");
    for (old, new) in [(5, 4), (4, 3), (3, 2), (2, 1)] {
        assert!(
            output.contains(&format!("  Old value = {old}\n  New value = {new}\n")),
            "{output}"
        );
    }
    assert!(output.contains("sdb: HIT GOOD TRAP at pc = 0x80000018\n"), "{output}");
    assert!(output.contains("sdb: total guest instructions = 19\n"), "{output}");
    assert_eq!(monitor.instructions_executed(), 19);
    assert!(!monitor.is_exit_status_bad());
}

#[test]
fn test_expression_watchpoint() {
    _ = env_logger::builder().is_test(true).try_init();

    let machine = utils::make_test_machine(MEMORY_SIZE, &utils::COUNTDOWN);
    let mut monitor = Monitor::new(machine, 4);
    let (_, output) = utils::run_script(&mut monitor, "w $t1 == 2\nc\n");
    assert!(
        output.contains("Watchpoint 0: $t1 == 2\n  Old value = 0\n  New value = 1\n"),
        "{output}"
    );
    assert_eq!(monitor.instructions_executed(), 10);
    assert_eq!(monitor.target().register("t1"), Some(2));
    assert_eq!(monitor.state(), &ExecState::Stopped);

    // Deleting the watchpoint lets execution run to the end.
    let (_, output) = utils::run_script(&mut monitor, "d 0\nc\n");
    assert!(output.contains("Deleted watchpoint 0\n"), "{output}");
    assert!(output.contains("HIT GOOD TRAP"), "{output}");
    assert_eq!(monitor.instructions_executed(), 19);
}

#[test]
fn test_builtin_image_batch() {
    _ = env_logger::builder().is_test(true).try_init();

    let machine = utils::make_test_machine(MEMORY_SIZE, &BUILTIN_IMAGE);
    let mut monitor = Monitor::new(machine, 4);
    monitor.set_batch_mode(true);
    let (reason, output) = utils::run_script(&mut monitor, "");
    assert_eq!(reason, ExitReason::Batch);
    assert_eq!(
        output,
        "sdb: HIT GOOD TRAP at pc = 0x8000000c\nsdb: total guest instructions = 4\n"
    );
    assert_eq!(
        monitor.state(),
        &ExecState::Ended {
            pc: Address(0x8000_000c),
            code: 0
        }
    );
    assert!(!monitor.is_exit_status_bad());
}

#[test]
fn test_session() {
    _ = env_logger::builder().is_test(true).try_init();

    let machine = utils::make_test_machine(MEMORY_SIZE, &BUILTIN_IMAGE);
    let mut monitor = Monitor::new(machine, 2);
    let (reason, output) = utils::run_script(
        &mut monitor,
        "help\n\
         bogus\n\
         w $pc\n\
         w $a0\n\
         w $t0\n\
         info w\n\
         d 7\n\
         x 1 0x80000010\n\
         c\n\
         c\n\
         c\n\
         c\n\
         si\n\
         q\n\
         info r\n",
    );
    assert_eq!(reason, ExitReason::Quit);
    assert!(output.contains("Unknown command 'bogus'\n"), "{output}");
    assert!(output.contains("Watchpoint 1: $a0\n"), "{output}");
    assert!(output.contains("Cannot set watchpoint: "), "{output}");
    assert!(output.contains("No watchpoint number 7.\n"), "{output}");
    assert!(output.contains("0xef  0xbe  0xad  0xde"), "{output}");
    assert!(output.contains("sdb: HIT GOOD TRAP at pc = 0x8000000c\n"), "{output}");
    assert!(
        output.contains("Program execution has ended. To restart the program, exit and run again.\n"),
        "{output}"
    );
    // `info r` after `q` is never read.
    assert!(!output.contains("zero"), "{output}");
    assert_eq!(output.matches(PROMPT).count(), 14);
    assert_eq!(monitor.state(), &ExecState::Quit);
    assert!(!monitor.is_exit_status_bad());
}
