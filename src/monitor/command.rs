// SPDX-License-Identifier: EUPL-1.2 OR GPL-3.0-or-later
// Copyright Contributors to the sdb project.

//! Monitor commands and their parser.

use crate::{
    memory::Address,
    watchpoint::{WatchpointId, MAX_EXPRESSION_LEN},
};

const HELP_USAGE: &str = "help [COMMAND]";
const SI_USAGE: &str = "si [N]";
const INFO_USAGE: &str = "info r|w";
const X_USAGE: &str = "x N 0xADDR";
const P_USAGE: &str = "p EXPR";
const W_USAGE: &str = "w EXPR";
const D_USAGE: &str = "d N";

#[derive(Debug)]
pub struct CommandDescription {
    pub name: &'static str,
    pub usage: &'static str,
    pub description: &'static str,
}

/// Every command the monitor understands, in `help` order.
pub const COMMANDS: &[CommandDescription] = &[
    CommandDescription {
        name: "help",
        usage: HELP_USAGE,
        description: "Display information about all supported commands",
    },
    CommandDescription {
        name: "c",
        usage: "c",
        description: "Continue the execution of the program",
    },
    CommandDescription {
        name: "q",
        usage: "q",
        description: "Exit the monitor",
    },
    CommandDescription {
        name: "si",
        usage: SI_USAGE,
        description: "Step N instructions, 1 if N is not given",
    },
    CommandDescription {
        name: "info",
        usage: INFO_USAGE,
        description: "Print register state or watchpoint information",
    },
    CommandDescription {
        name: "x",
        usage: X_USAGE,
        description: "Print N consecutive 4-byte words of memory starting at ADDR, in hexadecimal \
                      and decimal",
    },
    CommandDescription {
        name: "p",
        usage: P_USAGE,
        description: "Evaluate the expression EXPR and print its value",
    },
    CommandDescription {
        name: "w",
        usage: W_USAGE,
        description: "Stop execution when the value of EXPR changes",
    },
    CommandDescription {
        name: "d",
        usage: D_USAGE,
        description: "Delete watchpoint number N",
    },
];

impl CommandDescription {
    /// Looks up a command by its exact name.
    pub fn find(name: &str) -> Option<&'static Self> {
        COMMANDS.iter().find(|c| c.name == name)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum InfoSubject {
    Registers,
    Watchpoints,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Command {
    Help(Option<String>),
    Continue,
    Quit,
    Step(u64),
    Info(InfoSubject),
    Examine { count: u64, address: Address },
    Print(String),
    Watch(String),
    Delete(WatchpointId),
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CommandError {
    Unknown(String),
    MissingArgument {
        usage: &'static str,
    },
    InvalidArgument {
        usage: &'static str,
        argument: String,
        reason: &'static str,
    },
}

impl std::fmt::Display for CommandError {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Unknown(name) => write!(fmt, "Unknown command '{}'", name),
            Self::MissingArgument { usage } => write!(fmt, "Usage: {}", usage),
            Self::InvalidArgument {
                usage,
                argument,
                reason,
            } => write!(
                fmt,
                "Invalid argument '{}': {}\nUsage: {}",
                argument, reason, usage
            ),
        }
    }
}

impl std::error::Error for CommandError {}

fn parse_number<N: std::str::FromStr>(
    usage: &'static str,
    argument: &str,
) -> Result<N, CommandError> {
    argument
        .parse::<N>()
        .map_err(|_| CommandError::InvalidArgument {
            usage,
            argument: argument.to_string(),
            reason: "expected a non-negative decimal number",
        })
}

fn parse_hex_address(usage: &'static str, argument: &str) -> Result<Address, CommandError> {
    let invalid = |reason| CommandError::InvalidArgument {
        usage,
        argument: argument.to_string(),
        reason,
    };
    let digits = argument
        .strip_prefix("0x")
        .ok_or_else(|| invalid("address must be a 0x-prefixed hexadecimal number"))?;
    u64::from_str_radix(digits, 16)
        .map(Address)
        .map_err(|_| invalid("address is not a valid 64-bit hexadecimal number"))
}

impl Command {
    /// Parses one line of operator input.
    ///
    /// The first whitespace-separated word selects the command and the rest
    /// of the line is its argument. An empty line steps one instruction.
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let line = line.trim();
        let (name, args) = match line.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, Some(rest.trim_start())),
            None => (line, None),
        };
        let args = args.filter(|args| !args.is_empty());
        let required = |usage| args.ok_or(CommandError::MissingArgument { usage });

        Ok(match name {
            "" => Self::Step(1),
            "help" => Self::Help(args.and_then(|a| a.split_whitespace().next()).map(String::from)),
            "c" => Self::Continue,
            "q" => Self::Quit,
            "si" => Self::Step(match args {
                None => 1,
                Some(count) => parse_number(SI_USAGE, count)?,
            }),
            "info" => match required(INFO_USAGE)? {
                "r" => Self::Info(InfoSubject::Registers),
                "w" => Self::Info(InfoSubject::Watchpoints),
                other => {
                    return Err(CommandError::InvalidArgument {
                        usage: INFO_USAGE,
                        argument: other.to_string(),
                        reason: "expected `r` or `w`",
                    })
                }
            },
            "x" => {
                let mut words = required(X_USAGE)?.split_whitespace();
                let count = parse_number(X_USAGE, words.next().unwrap_or_default())?;
                let address = words
                    .next()
                    .ok_or(CommandError::MissingArgument { usage: X_USAGE })?;
                Self::Examine {
                    count,
                    address: parse_hex_address(X_USAGE, address)?,
                }
            }
            "p" => Self::Print(required(P_USAGE)?.to_string()),
            "w" => {
                let expression = required(W_USAGE)?;
                if expression.len() > MAX_EXPRESSION_LEN {
                    return Err(CommandError::InvalidArgument {
                        usage: W_USAGE,
                        argument: expression.to_string(),
                        reason: "expression is longer than 128 bytes",
                    });
                }
                Self::Watch(expression.to_string())
            }
            "d" => Self::Delete(WatchpointId(parse_number(D_USAGE, required(D_USAGE)?)?)),
            other => return Err(CommandError::Unknown(other.to_string())),
        })
    }
}
