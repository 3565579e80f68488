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

//! Raw frame to domain event translation.

use super::RawEvent;
use crate::error::EventError;
use crate::models::{DomainEvent, Route, RouteMapping, TcpRouteMapping};

/// Translation function plugged into an [`EventSource`](crate::EventSource).
pub type Translator<M> = fn(RawEvent) -> Result<DomainEvent<M>, EventError>;

/// Decodes the frame payload as `M` and pairs it with the frame name.
pub fn translate<M: RouteMapping>(raw: RawEvent) -> Result<DomainEvent<M>, EventError> {
    match serde_json::from_slice::<M>(&raw.data) {
        Ok(payload) => Ok(DomainEvent {
            action: raw.name,
            payload,
        }),
        Err(source) => Err(EventError::Decode {
            action: raw.name,
            source,
        }),
    }
}

pub fn translate_route_event(raw: RawEvent) -> Result<DomainEvent<Route>, EventError> {
    translate(raw)
}

pub fn translate_tcp_route_event(
    raw: RawEvent,
) -> Result<DomainEvent<TcpRouteMapping>, EventError> {
    translate(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_route() -> Route {
        Route {
            route: "z.a.k".to_string(),
            port: 63,
            ip: "42.42.42.42".to_string(),
            ttl: 1,
            log_guid: "Tomato".to_string(),
            route_service_url: Some("https://route-service-url.com".to_string()),
        }
    }

    #[test]
    fn route_payload_survives_encode_and_translate() {
        let route = sample_route();
        let raw = RawEvent::new("Delete", serde_json::to_vec(&route).unwrap());

        let event = translate_route_event(raw).expect("payload should decode");

        assert_eq!(event.action, "Delete");
        assert_eq!(event.payload, route);
    }

    #[test]
    fn tcp_payload_survives_encode_and_translate() {
        let mapping = TcpRouteMapping {
            router_group_guid: "rg-1".to_string(),
            external_port: 5200,
            host_ip: "10.0.0.4".to_string(),
            host_port: 61000,
        };
        let raw = RawEvent::new("Upsert", serde_json::to_vec(&mapping).unwrap());

        let event = translate_tcp_route_event(raw).expect("payload should decode");

        assert_eq!(event.payload, mapping);
    }

    #[test]
    fn unknown_action_is_passed_through() {
        let raw = RawEvent::new("Rebalance", br#"{"route":"a.b"}"#.to_vec());

        let event = translate_route_event(raw).expect("payload should decode");

        assert_eq!(event.action, "Rebalance");
    }

    #[test]
    fn invalid_json_is_a_decode_error() {
        let raw = RawEvent::new("Upsert", b"{not json".to_vec());

        let err = translate_route_event(raw).expect_err("payload should not decode");

        match err {
            EventError::Decode { action, .. } => assert_eq!(action, "Upsert"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn mismatched_shape_is_a_decode_error() {
        let raw = RawEvent::new("Upsert", br#"{"external_port":"not-a-port"}"#.to_vec());

        assert!(matches!(
            translate_tcp_route_event(raw),
            Err(EventError::Decode { .. })
        ));
    }
}
