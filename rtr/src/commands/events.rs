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
use route_events::{FanInCoordinator, ProtocolSelection};
use std::io::Write;
use std::sync::Arc;
use tracing::info;

const ACTION: &str = "streaming events";

/// Streams until every subscription that started has ended.
pub(super) async fn run<O: Write, E: Write>(
    context: &Context,
    selection: ProtocolSelection,
    out: &mut O,
    diagnostics: &mut E,
) -> Result<(), CommandError> {
    let client = context
        .client()
        .await
        .map_err(|err| CommandError::failed(ACTION, err))?;

    let mut coordinator = FanInCoordinator::new(Arc::new(client), selection);
    let summary = coordinator
        .run(out, diagnostics)
        .await
        .map_err(|err| CommandError::failed(ACTION, err))?;

    if !summary.any_started() {
        return Err(CommandError::failed(
            ACTION,
            "no event subscription could be established",
        ));
    }

    info!(
        component = "rtr",
        started = summary.started,
        events_written = summary.events_written,
        "event streaming finished"
    );
    Ok(())
}
