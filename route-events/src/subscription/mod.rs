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

//! Subscription layer.
//!
//! One [`SubscriptionRunner`] per protocol pulls events on its own thread and
//! forwards them over two shared channels; the [`FanInCoordinator`] merges both
//! channels into the consumer-facing output and ends once every runner it
//! started has reported its terminal failure.

mod fan_in;
mod runner;

pub use fan_in::{FanInCoordinator, FanInState, FanInSummary};
pub use runner::{SubscriptionFailure, SubscriptionRunner};

use crate::error::ApiError;
use crate::event_source::{RouteEventSource, TcpRouteEventSource};
use async_trait::async_trait;

/// Establishes authenticated event streams, one connection per call.
#[async_trait]
pub trait EventSubscriber: Send + Sync {
    async fn subscribe_to_events(&self) -> Result<RouteEventSource, ApiError>;

    async fn subscribe_to_tcp_events(&self) -> Result<TcpRouteEventSource, ApiError>;
}
