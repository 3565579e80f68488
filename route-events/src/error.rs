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

//! Error types for the event pipeline and the routing API client.

use std::io;
use thiserror::Error;

/// Boxed transport error kept as the source of a [`StreamError::Connection`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Terminal failures of a raw event reader.
#[derive(Debug, Error)]
pub enum StreamError {
    /// The connection failed while reading.
    #[error("connection error: {0}")]
    Connection(#[source] BoxError),

    /// The server ended the stream.
    #[error("EOF")]
    Eof,

    /// The reader was closed locally.
    #[error("event stream closed")]
    Closed,

    /// The byte stream is not valid event-stream framing.
    #[error("malformed event stream: {0}")]
    Framing(String),
}

/// Failures surfaced by an [`EventSource`](crate::EventSource).
#[derive(Debug, Error)]
pub enum EventError {
    #[error(transparent)]
    Stream(#[from] StreamError),

    #[error("unable to decode payload of '{action}' event: {source}")]
    Decode {
        action: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("unable to encode event for display: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Failures of a single routing API call, including stream establishment.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Request(#[from] reqwest::Error),

    #[error("routing api responded with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid routing api url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Failures to bring up one subscription runner.
#[derive(Debug, Error)]
pub enum StartError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("unable to spawn subscription thread: {0}")]
    Spawn(#[source] io::Error),

    #[error("subscription thread exited before connecting")]
    Aborted,
}
