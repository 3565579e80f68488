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

use clap::{Args, CommandFactory, Parser, Subcommand};
use std::path::PathBuf;

const ENVIRONMENT_HELP: &str = "ENVIRONMENT VARIABLES:
   RTR_TRACE=true\tPrint API request diagnostics to stdout";

const REGISTER_ABOUT: &str = "Registers routes with the routing-api

Routes must be specified in JSON format, like so:
'[{\"route\":\"foo.com\", \"port\":12345, \"ip\":\"1.2.3.4\", \"ttl\":5, \"log_guid\":\"log-guid\"}]'";

const UNREGISTER_ABOUT: &str = "Unregisters routes with the routing-api

Routes must be specified in JSON format, like so:
'[{\"route\":\"foo.com\", \"port\":12345, \"ip\":\"1.2.3.4\"}]'";

/// A CLI for the Router API server.
#[derive(Parser, Debug)]
#[command(name = "rtr", version, about, after_help = ENVIRONMENT_HELP)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Registers routes with the routing-api
    #[command(long_about = REGISTER_ABOUT)]
    Register(RoutesArgs),

    /// Unregisters routes with the routing-api
    #[command(long_about = UNREGISTER_ABOUT)]
    Unregister(RoutesArgs),

    /// Lists the currently registered routes
    List(ListArgs),

    /// Stream events from the Routing API
    Events(EventsArgs),
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Register(_) => "register",
            Command::Unregister(_) => "unregister",
            Command::List(_) => "list",
            Command::Events(_) => "events",
        }
    }

    pub fn api_args(&self) -> &ApiArgs {
        match self {
            Command::Register(args) | Command::Unregister(args) => &args.api,
            Command::List(args) => &args.api,
            Command::Events(args) => &args.api,
        }
    }

    /// Problems with positional arguments, reported next to flag problems.
    pub fn argument_issues(&self) -> Vec<String> {
        let (count, wants_routes) = match self {
            Command::Register(args) | Command::Unregister(args) => (args.routes.len(), true),
            Command::List(args) => (args.extra.len(), false),
            Command::Events(args) => (args.extra.len(), false),
        };

        let mut issues = Vec::new();
        if wants_routes && count == 0 {
            issues.push("Must provide routes JSON.".to_string());
        } else if count > usize::from(wants_routes) {
            issues.push("Unexpected arguments.".to_string());
        }
        issues
    }
}

/// Connection flags shared by every command.
#[derive(Args, Debug, Clone, Default)]
pub struct ApiArgs {
    /// Endpoint for the routing-api. (required)
    #[arg(long)]
    pub api: Option<String>,

    /// Id of the OAuth client. (required)
    #[arg(long)]
    pub client_id: Option<String>,

    /// Secret for OAuth client. (required)
    #[arg(long)]
    pub client_secret: Option<String>,

    /// URL for OAuth client. (required)
    #[arg(long)]
    pub oauth_url: Option<String>,

    /// Skip OAuth TLS Verification (optional)
    #[arg(short = 'k', long)]
    pub skip_tls_verification: bool,

    /// CA for UAA client (optional)
    #[arg(long, value_name = "FILE")]
    pub ca_certs: Option<PathBuf>,

    /// json5 file with default values for the flags above
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct RoutesArgs {
    #[command(flatten)]
    pub api: ApiArgs,

    /// Routes as a JSON array
    #[arg(value_name = "ROUTES_JSON")]
    pub routes: Vec<String>,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    #[command(flatten)]
    pub api: ApiArgs,

    #[arg(hide = true)]
    pub extra: Vec<String>,
}

#[derive(Args, Debug)]
pub struct EventsArgs {
    #[command(flatten)]
    pub api: ApiArgs,

    /// Stream HTTP events
    #[arg(long)]
    pub http: bool,

    /// Stream TCP events
    #[arg(long)]
    pub tcp: bool,

    #[arg(hide = true)]
    pub extra: Vec<String>,
}

/// Rendered help of one subcommand.
pub fn command_help(name: &str) -> String {
    let mut command = Cli::command();
    match command.find_subcommand_mut(name) {
        Some(subcommand) => subcommand.render_help().to_string(),
        None => command.render_help().to_string(),
    }
}
