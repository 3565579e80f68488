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

mod support;

use route_events::trace::{TraceSink, WriterTraceSink};
use route_events::{ApiError, EventError, EventSubscriber, Route, StreamError};
use serde_json::json;
use std::sync::Arc;
use support::{make_client, SharedBuffer, BEARER};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn route(name: &str, port: u16) -> Route {
    Route {
        route: name.to_string(),
        port,
        ip: "1.2.3.4".to_string(),
        ttl: 5,
        log_guid: "my-guid".to_string(),
        route_service_url: None,
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn upsert_posts_routes_with_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/routing/v1/routes"))
        .and(header("authorization", BEARER))
        .and(body_json(json!([
            {"route": "zak.com", "port": 3, "ip": "1.2.3.4", "ttl": 5, "log_guid": "my-guid"}
        ])))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    make_client(&server)
        .upsert_routes(&[route("zak.com", 3)])
        .await
        .expect("upsert should succeed");
}

#[tokio::test(flavor = "multi_thread")]
async fn delete_sends_routes_in_body() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/routing/v1/routes"))
        .and(header("authorization", BEARER))
        .and(body_json(json!([
            {"route": "jak.com", "port": 8, "ip": "1.2.3.4", "ttl": 5, "log_guid": "my-guid"}
        ])))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    make_client(&server)
        .delete_routes(&[route("jak.com", 8)])
        .await
        .expect("delete should succeed");
}

#[tokio::test(flavor = "multi_thread")]
async fn routes_decodes_listing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/routing/v1/routes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"route": "post_here", "port": 7000, "ip": "1.2.3.4", "ttl": 50, "log_guid": "my-guid"},
            {"route": "example.com", "port": 8, "ip": "11"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let routes = make_client(&server).routes().await.expect("listing should succeed");

    assert_eq!(routes.len(), 2);
    assert_eq!(
        routes[0],
        Route {
            ttl: 50,
            ..route("post_here", 7000)
        }
    );
    assert_eq!(routes[1].ttl, 0);
    assert_eq!(routes[1].log_guid, "");
}

#[tokio::test(flavor = "multi_thread")]
async fn rejected_request_reports_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/routing/v1/routes"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid token"))
        .mount(&server)
        .await;

    let err = make_client(&server).routes().await.unwrap_err();

    match err {
        ApiError::Status { status, body } => {
            assert_eq!(status, 401);
            assert_eq!(body, "invalid token");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn subscribe_reads_events_until_server_closes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/routing/v1/tcp_routes/events"))
        .and(header("authorization", BEARER))
        .and(header("accept", "text/event-stream"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            "event: Upsert\ndata: {\"router_group_guid\":\"rg\",\"external_port\":5200,\"host_ip\":\"10.0.0.1\",\"host_port\":61000}\n\n",
            "text/event-stream",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let client = make_client(&server);
    let mut source = client
        .subscribe_to_tcp_events()
        .await
        .expect("subscription should succeed");

    let event = source.next().await.expect("one event");
    assert_eq!(event.action, "Upsert");
    assert_eq!(event.payload.external_port, 5200);
    assert!(matches!(
        source.next().await,
        Err(EventError::Stream(StreamError::Eof))
    ));
}

#[tokio::test(flavor = "multi_thread")]
async fn subscribe_fails_on_rejected_stream() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/routing/v1/events"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let result = make_client(&server).subscribe_to_events().await;

    assert!(matches!(result, Err(ApiError::Status { status: 403, .. })));
}

#[tokio::test(flavor = "multi_thread")]
async fn trace_sink_receives_sanitized_traffic() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/routing/v1/routes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let buffer = SharedBuffer::default();
    let sink: Arc<dyn TraceSink> = Arc::new(WriterTraceSink::new(buffer.clone()));
    let client = make_client(&server).with_trace(Some(sink));

    client.routes().await.expect("listing should succeed");

    let dump = buffer.contents();
    assert!(dump.contains("REQUEST: ["));
    assert!(dump.contains("GET http://"));
    assert!(dump.contains("RESPONSE: ["));
    assert!(dump.contains("HTTP/1.1 200"));
    assert!(dump.contains("Authorization: [PRIVATE DATA HIDDEN]"));
    assert!(!dump.contains("test-token"));
}
