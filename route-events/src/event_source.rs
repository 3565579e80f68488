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

use crate::error::EventError;
use crate::models::{DomainEvent, Route, RouteMapping, TcpRouteMapping};
use crate::wire::{translate, RawEventSource, Translator};

/// A finite, non-restartable sequence of typed route events read from one connection.
///
/// Each call to [`next`](EventSource::next) consumes exactly one frame. Once an
/// error is returned the source is exhausted and callers stop pulling.
///
/// # Examples
///
/// ```
/// use bytes::Bytes;
/// use futures::stream;
/// use route_events::{EventSource, Route, SseEventReader};
///
/// # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
/// let frames: Vec<Result<Bytes, std::io::Error>> = vec![Ok(Bytes::from_static(
///     b"event: Upsert\ndata: {\"route\":\"foo.com\",\"port\":8080,\"ip\":\"1.2.3.4\"}\n\n",
/// ))];
/// let reader = SseEventReader::from_stream(stream::iter(frames), None);
/// let mut source: EventSource<Route> = EventSource::new(Box::new(reader));
///
/// let event = source.next().await.unwrap();
/// assert_eq!(event.action, "Upsert");
/// assert_eq!(event.payload.route, "foo.com");
/// assert!(source.next().await.is_err());
/// # });
/// ```
pub struct EventSource<M> {
    raw: Box<dyn RawEventSource>,
    translator: Translator<M>,
}

/// Source of HTTP route events.
pub type RouteEventSource = EventSource<Route>;

/// Source of TCP route events.
pub type TcpRouteEventSource = EventSource<TcpRouteMapping>;

impl<M: RouteMapping> EventSource<M> {
    /// Uses the generic JSON translator for `M`.
    pub fn new(raw: Box<dyn RawEventSource>) -> Self {
        Self::with_translator(raw, translate::<M>)
    }

    pub fn with_translator(raw: Box<dyn RawEventSource>, translator: Translator<M>) -> Self {
        Self { raw, translator }
    }

    pub async fn next(&mut self) -> Result<DomainEvent<M>, EventError> {
        let raw_event = self.raw.next().await?;
        (self.translator)(raw_event)
    }

    pub async fn close(&mut self) -> Result<(), EventError> {
        self.raw.close().await?;
        Ok(())
    }
}
