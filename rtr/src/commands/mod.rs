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

//! Command implementations and their exit semantics.

mod events;
mod list;
mod register;
mod unregister;

use crate::cli::Command;
use crate::config::Settings;
use crate::oauth::TokenFetcher;
use route_events::error::BoxError;
use route_events::trace::TraceSink;
use route_events::{ProtocolSelection, Route, RoutingApiClient};
use std::io::Write;
use std::sync::Arc;
use thiserror::Error;

/// Missing flags, bad arguments or an unknown command.
pub const EXIT_USAGE: u8 = 1;

/// The command ran and failed.
pub const EXIT_COMMAND_FAILED: u8 = 3;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("{}", .issues.join("\n"))]
    Usage {
        command: &'static str,
        issues: Vec<String>,
    },

    #[error("Invalid json format.")]
    InvalidJson(#[source] serde_json::Error),

    #[error("{action} failed: {source}")]
    Failed {
        action: &'static str,
        #[source]
        source: BoxError,
    },
}

impl CommandError {
    fn failed(action: &'static str, source: impl Into<BoxError>) -> Self {
        CommandError::Failed {
            action,
            source: source.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            CommandError::Usage { .. } => EXIT_USAGE,
            CommandError::InvalidJson(_) | CommandError::Failed { .. } => EXIT_COMMAND_FAILED,
        }
    }
}

/// Validated settings plus the optional traffic dump shared by all commands.
pub struct Context {
    settings: Settings,
    trace: Option<Arc<dyn TraceSink>>,
}

impl Context {
    pub fn new(settings: Settings, trace: Option<Arc<dyn TraceSink>>) -> Self {
        Self { settings, trace }
    }

    /// Fetches a token and returns a client that sends it on every call.
    async fn client(&self) -> Result<RoutingApiClient, BoxError> {
        let token = TokenFetcher::new(&self.settings)?.fetch_token().await?;
        let mut client =
            RoutingApiClient::new(&self.settings.api, self.settings.skip_tls_verification)?
                .with_trace(self.trace.clone());
        client.set_token(token.access_token);
        Ok(client)
    }
}

/// Validates `command` and runs it.
///
/// Command output goes to `out`. `diagnostics` receives per-subscription
/// messages while streaming events.
pub async fn run<O: Write, E: Write>(
    command: Command,
    trace: Option<Arc<dyn TraceSink>>,
    out: &mut O,
    diagnostics: &mut E,
) -> Result<(), CommandError> {
    let (settings, mut issues) = match Settings::resolve(command.api_args()) {
        Ok(settings) => (Some(settings), Vec::new()),
        Err(issues) => (None, issues),
    };
    issues.extend(command.argument_issues());

    let settings = match settings {
        Some(settings) if issues.is_empty() => settings,
        _ => {
            return Err(CommandError::Usage {
                command: command.name(),
                issues,
            })
        }
    };
    let context = Context::new(settings, trace);

    match command {
        Command::Register(args) => {
            let routes_json = args.routes.into_iter().next().unwrap_or_default();
            register::run(&context, &routes_json, out).await
        }
        Command::Unregister(args) => {
            let routes_json = args.routes.into_iter().next().unwrap_or_default();
            unregister::run(&context, &routes_json, out).await
        }
        Command::List(_) => list::run(&context, out).await,
        Command::Events(args) => {
            let selection = ProtocolSelection::from_flags(args.http, args.tcp);
            events::run(&context, selection, out, diagnostics).await
        }
    }
}

fn parse_routes(routes_json: &str) -> Result<Vec<Route>, CommandError> {
    serde_json::from_str(routes_json).map_err(CommandError::InvalidJson)
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    fn command(args: &[&str]) -> Command {
        Cli::try_parse_from(std::iter::once("rtr").chain(args.iter().copied()))
            .expect("arguments should parse")
            .command
    }

    #[tokio::test]
    async fn flag_and_argument_issues_are_reported_together() {
        let (mut out, mut diagnostics) = (Vec::new(), Vec::new());

        let err = run(command(&["register"]), None, &mut out, &mut diagnostics)
            .await
            .unwrap_err();

        assert_eq!(err.exit_code(), EXIT_USAGE);
        match err {
            CommandError::Usage { command, issues } => {
                assert_eq!(command, "register");
                assert_eq!(issues.len(), 5);
                assert_eq!(issues[4], "Must provide routes JSON.");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn invalid_routes_json_fails_before_any_request() {
        let (mut out, mut diagnostics) = (Vec::new(), Vec::new());
        let args = [
            "register",
            "--api",
            "some-server-name",
            "--client-id",
            "some-name",
            "--client-secret",
            "some-secret",
            "--oauth-url",
            "http://127.0.0.1:9",
            r#"[{"kind":"of","valid":"json}]"#,
        ];

        let err = run(command(&args), None, &mut out, &mut diagnostics)
            .await
            .unwrap_err();

        assert!(matches!(err, CommandError::InvalidJson(_)));
        assert_eq!(err.exit_code(), EXIT_COMMAND_FAILED);
        assert_eq!(err.to_string(), "Invalid json format.");
    }

    #[test]
    fn failures_name_the_action() {
        let err = CommandError::failed("listing routes", "boom");

        assert_eq!(err.to_string(), "listing routes failed: boom");
        assert_eq!(err.exit_code(), EXIT_COMMAND_FAILED);
    }
}
