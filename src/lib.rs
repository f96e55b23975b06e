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

//! A simple debugging monitor for CPU emulators.
//!
//! The [`monitor::Monitor`] reads commands from the operator, steps a
//! [`target::Target`] and stops execution whenever the value of an expression
//! watched through the [`watchpoint::WatchpointPool`] changes.
//!
//! A small RV32I interpreter, [`machine::Machine`], is included as a target.

pub mod expr;
pub mod machine;
pub mod memory;
pub mod monitor;
pub mod target;
pub mod watchpoint;
