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

use sdb::{machine::Machine, memory::MemoryRegion, monitor::Monitor};

mod cli;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = cli::Args::parse()?;
    env_logger::Builder::new()
        .filter_level(args.log_level())
        .parse_default_env()
        .init();
    log::debug!("{:?}", args);

    let memory = MemoryRegion::new("ram", args.memory, args.start_address)?;
    let mut machine = Machine::new(memory)?;
    match args.image {
        Some(ref path) => {
            let input = std::fs::read(path)
                .map_err(|err| format!("Could not read image {}: {}", path.display(), err))?;
            machine.load_code(&input, args.start_address)?;
            log::info!("Loaded image {} at {}", path.display(), args.start_address);
        }
        None => {
            log::info!("No image given, using the built-in image");
            machine.load_builtin_image()?;
        }
    }

    let mut monitor = Monitor::new(machine, args.watchpoints.get());
    monitor.set_batch_mode(args.batch);
    let reason = monitor.run(std::io::stdin().lock(), std::io::stdout().lock())?;
    log::debug!("Monitor exited: {:?}", reason);

    if monitor.is_exit_status_bad() {
        std::process::exit(1);
    }
    Ok(())
}
