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

//! Wire layer.
//!
//! Owns event-stream framing and the translation of raw frames into typed
//! route events. Nothing in here spawns work or touches channels.

mod sse_reader;
mod translator;

pub use sse_reader::{ByteStream, SseEventReader};
pub use translator::{translate, translate_route_event, translate_tcp_route_event, Translator};

use crate::error::StreamError;
use async_trait::async_trait;
use serde::{Serialize, Serializer};

/// One frame as read from the event stream.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct RawEvent {
    pub name: String,
    #[serde(serialize_with = "serialize_data")]
    pub data: Vec<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry: Option<u64>,
}

impl RawEvent {
    pub fn new(name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
            ..Default::default()
        }
    }
}

fn serialize_data<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&String::from_utf8_lossy(data))
}

/// Pull-based reader of raw frames from one connection.
///
/// Every error is terminal. After [`close`](RawEventSource::close) every call to
/// [`next`](RawEventSource::next) fails with [`StreamError::Closed`].
#[async_trait]
pub trait RawEventSource: Send {
    async fn next(&mut self) -> Result<RawEvent, StreamError>;

    async fn close(&mut self) -> Result<(), StreamError>;
}
