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

//! # route-events
//!
//! `route-events` turns the routing API's server-sent event streams into typed
//! route events and merges the HTTP and TCP streams into one line-oriented output.
//!
//! Typical usage goes through [`RoutingApiClient`] and [`FanInCoordinator`]:
//!
//! ```no_run
//! use std::io;
//! use std::sync::Arc;
//! use route_events::{FanInCoordinator, ProtocolSelection, RoutingApiClient};
//!
//! # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
//! let mut client = RoutingApiClient::new("https://api.example.com", false).unwrap();
//! client.set_token("access-token");
//!
//! let mut coordinator = FanInCoordinator::new(Arc::new(client), ProtocolSelection::both());
//! let summary = coordinator
//!     .run(&mut io::stdout(), &mut io::stderr())
//!     .await
//!     .unwrap();
//! assert_eq!(summary.started, summary.terminated);
//! # });
//! ```
//!
//! ## Internal architecture map
//!
//! - Wire: event-stream framing ([`SseEventReader`]) and payload translation
//! - Event source: one typed, finite sequence of events per connection
//! - Subscription: one runner thread per protocol and the fan-in coordinator
//! - Client: authenticated routing API calls and stream establishment
//! - Runtime: dedicated subscription threads with their own runtimes
//!
//! ## Observability model
//!
//! The workspace uses `tracing` for logs/events.
//! Library code emits events and does not initialize a global subscriber. The
//! `rtr` binary installs `tracing_subscriber` once at process start.
//! Raw API traffic dumps are separate: they go through an injected
//! [`trace::TraceSink`] and are off unless one is supplied.

mod client;
pub use client::{RoutingApiClient, EVENTS_PATH, ROUTES_PATH, TCP_EVENTS_PATH};

pub mod error;
pub use error::{ApiError, EventError, StartError, StreamError};

mod event_source;
pub use event_source::{EventSource, RouteEventSource, TcpRouteEventSource};

mod models;
pub use models::{DomainEvent, Protocol, ProtocolSelection, Route, RouteMapping, TcpRouteMapping};

#[doc(hidden)]
pub mod observability;
mod runtime;

mod subscription;
pub use subscription::{
    EventSubscriber, FanInCoordinator, FanInState, FanInSummary, SubscriptionFailure,
    SubscriptionRunner,
};

pub mod trace;

mod wire;
pub use wire::{
    translate, translate_route_event, translate_tcp_route_event, ByteStream, RawEvent,
    RawEventSource, SseEventReader, Translator,
};
