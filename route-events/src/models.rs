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

//! Route mappings exchanged with the routing API and the events that carry them.

use serde::de::DeserializeOwned;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Protocol family of a route subscription.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Protocol {
    Http,
    Tcp,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Http => "http",
            Protocol::Tcp => "tcp",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which protocol families an `events` run streams.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ProtocolSelection {
    pub http: bool,
    pub tcp: bool,
}

impl ProtocolSelection {
    /// Builds a selection from explicit flags; selecting neither streams both.
    pub fn from_flags(http: bool, tcp: bool) -> Self {
        if !http && !tcp {
            return Self::both();
        }
        Self { http, tcp }
    }

    pub fn both() -> Self {
        Self {
            http: true,
            tcp: true,
        }
    }

    /// Selected protocols, HTTP first.
    pub fn protocols(&self) -> Vec<Protocol> {
        let mut protocols = Vec::with_capacity(2);
        if self.http {
            protocols.push(Protocol::Http);
        }
        if self.tcp {
            protocols.push(Protocol::Tcp);
        }
        protocols
    }
}

/// Mapping shape carried by one protocol's route events.
pub trait RouteMapping: Serialize + DeserializeOwned + Send + 'static {
    const PROTOCOL: Protocol;

    /// Key under which the mapping is displayed next to `Action`.
    const EVENT_FIELD: &'static str;
}

/// A single HTTP route-to-backend binding.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Route {
    #[serde(default)]
    pub route: String,
    #[serde(default)]
    pub port: u16,
    #[serde(default)]
    pub ip: String,
    #[serde(default)]
    pub ttl: u32,
    #[serde(default)]
    pub log_guid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route_service_url: Option<String>,
}

impl RouteMapping for Route {
    const PROTOCOL: Protocol = Protocol::Http;
    const EVENT_FIELD: &'static str = "Route";
}

/// A single TCP port-mapping binding.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct TcpRouteMapping {
    #[serde(default)]
    pub router_group_guid: String,
    #[serde(default)]
    pub external_port: u16,
    #[serde(default)]
    pub host_ip: String,
    #[serde(default)]
    pub host_port: u16,
}

impl RouteMapping for TcpRouteMapping {
    const PROTOCOL: Protocol = Protocol::Tcp;
    const EVENT_FIELD: &'static str = "TcpRouteMapping";
}

/// A route change as delivered to the consumer.
///
/// `action` is the wire event name as received, e.g. `Upsert` or `Delete`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DomainEvent<M> {
    pub action: String,
    pub payload: M,
}

impl<M: RouteMapping> Serialize for DomainEvent<M> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("Action", &self.action)?;
        map.serialize_entry(M::EVENT_FIELD, &self.payload)?;
        map.end()
    }
}
