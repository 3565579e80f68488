/********************************************************************************
 * Copyright (c) 2024 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

mod cli;
mod commands;
mod config;
mod oauth;

use crate::cli::Cli;
use crate::commands::{CommandError, EXIT_USAGE};
use clap::error::{ContextKind, ErrorKind};
use clap::Parser;
use route_events::trace::{self, RTR_TRACE};
use std::io;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    // stdout carries command output and events only.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .try_init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => return parse_failure(err),
    };

    let trace = trace::sink_from_env(std::env::var(RTR_TRACE).ok().as_deref());
    debug!(
        component = "rtr",
        command = cli.command.name(),
        trace = trace.is_some(),
        "running command"
    );

    let mut out = io::stdout();
    let mut diagnostics = io::stderr();
    match commands::run(cli.command, trace, &mut out, &mut diagnostics).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report(&err);
            ExitCode::from(err.exit_code())
        }
    }
}

fn parse_failure(err: clap::Error) -> ExitCode {
    match err.kind() {
        ErrorKind::InvalidSubcommand => {
            let command = err
                .get(ContextKind::InvalidSubcommand)
                .map(ToString::to_string)
                .unwrap_or_default();
            println!("Not a valid command: {command}");
            ExitCode::from(EXIT_USAGE)
        }
        ErrorKind::DisplayHelp
        | ErrorKind::DisplayVersion
        | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
            let _ = err.print();
            ExitCode::SUCCESS
        }
        _ => {
            let _ = err.print();
            ExitCode::from(EXIT_USAGE)
        }
    }
}

fn report(err: &CommandError) {
    match err {
        CommandError::Usage { command, issues } => {
            for issue in issues {
                println!("{issue}");
            }
            println!();
            println!("{}", cli::command_help(command));
        }
        other => println!("{other}"),
    }
}
