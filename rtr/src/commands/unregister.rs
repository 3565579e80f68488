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

use super::{parse_routes, CommandError, Context};
use std::io::Write;
use tracing::info;

const ACTION: &str = "route unregistration";

pub(super) async fn run<O: Write>(
    context: &Context,
    routes_json: &str,
    out: &mut O,
) -> Result<(), CommandError> {
    let routes = parse_routes(routes_json)?;
    let client = context
        .client()
        .await
        .map_err(|err| CommandError::failed(ACTION, err))?;

    client
        .delete_routes(&routes)
        .await
        .map_err(|err| CommandError::failed(ACTION, err))?;
    info!(component = "rtr", count = routes.len(), "unregistered routes");

    writeln!(out, "Successfully unregistered routes: {routes_json}")
        .map_err(|err| CommandError::failed(ACTION, err))
}
