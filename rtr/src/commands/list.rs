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

use super::{CommandError, Context};
use std::io::Write;

const ACTION: &str = "listing routes";

pub(super) async fn run<O: Write>(context: &Context, out: &mut O) -> Result<(), CommandError> {
    let client = context
        .client()
        .await
        .map_err(|err| CommandError::failed(ACTION, err))?;
    let routes = client
        .routes()
        .await
        .map_err(|err| CommandError::failed(ACTION, err))?;

    let listing =
        serde_json::to_string(&routes).map_err(|err| CommandError::failed(ACTION, err))?;
    writeln!(out, "{listing}").map_err(|err| CommandError::failed(ACTION, err))
}
