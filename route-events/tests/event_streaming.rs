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

use route_events::{FanInCoordinator, FanInState, Protocol, ProtocolSelection};
use std::sync::Arc;
use support::{lines, make_client, BEARER};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const DELETE_FRAME: &str = "event: Delete\ndata: {\"route\":\"z.a.k\",\"port\":63,\"ip\":\"42.42.42.42\",\"ttl\":1,\"log_guid\":\"Tomato\",\"route_service_url\":\"https://route-service-url.com\"}\n\n";
const DELETE_LINE: &str = r#"{"Action":"Delete","Route":{"route":"z.a.k","port":63,"ip":"42.42.42.42","ttl":1,"log_guid":"Tomato","route_service_url":"https://route-service-url.com"}}"#;
const TCP_FRAME: &str = "event: Upsert\ndata: {\"router_group_guid\":\"rg\",\"external_port\":5200,\"host_ip\":\"10.0.0.1\",\"host_port\":61000}\n\n";

async fn mount_stream(server: &MockServer, stream_path: &str, body: &str, calls: u64) {
    Mock::given(method("GET"))
        .and(path(stream_path))
        .and(header("authorization", BEARER))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body.to_string(), "text/event-stream"))
        .expect(calls)
        .mount(server)
        .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn http_event_is_printed_as_one_json_line() {
    let server = MockServer::start().await;
    mount_stream(&server, "/routing/v1/events", DELETE_FRAME, 1).await;
    mount_stream(&server, "/routing/v1/tcp_routes/events", "", 0).await;

    let mut coordinator = FanInCoordinator::new(
        Arc::new(make_client(&server)),
        ProtocolSelection::from_flags(true, false),
    );
    let (mut out, mut diagnostics) = (Vec::new(), Vec::new());
    let summary = coordinator.run(&mut out, &mut diagnostics).await.unwrap();

    assert_eq!(coordinator.state(), FanInState::Done);
    assert_eq!(summary.events_written, 1);
    assert_eq!(lines(&out), vec![DELETE_LINE.to_string()]);
    assert_eq!(lines(&diagnostics), vec!["Connection closed: EOF".to_string()]);
}

#[tokio::test(flavor = "multi_thread")]
async fn server_closing_without_data_reports_connection_closed() {
    let server = MockServer::start().await;
    mount_stream(&server, "/routing/v1/events", "", 1).await;
    mount_stream(&server, "/routing/v1/tcp_routes/events", "", 1).await;

    let mut coordinator =
        FanInCoordinator::new(Arc::new(make_client(&server)), ProtocolSelection::both());
    let (mut out, mut diagnostics) = (Vec::new(), Vec::new());
    let summary = coordinator.run(&mut out, &mut diagnostics).await.unwrap();

    assert_eq!(summary.started, 2);
    assert_eq!(summary.terminated, 2);
    assert!(out.is_empty());
    let diagnostics = lines(&diagnostics);
    assert_eq!(diagnostics.len(), 2);
    assert!(diagnostics
        .iter()
        .all(|line| line.starts_with("Connection closed: ")));
}

#[tokio::test(flavor = "multi_thread")]
async fn both_protocols_are_merged() {
    let server = MockServer::start().await;
    mount_stream(&server, "/routing/v1/events", DELETE_FRAME, 1).await;
    mount_stream(&server, "/routing/v1/tcp_routes/events", TCP_FRAME, 1).await;

    let mut coordinator =
        FanInCoordinator::new(Arc::new(make_client(&server)), ProtocolSelection::both());
    let (mut out, mut diagnostics) = (Vec::new(), Vec::new());
    let summary = coordinator.run(&mut out, &mut diagnostics).await.unwrap();

    assert_eq!(summary.events_written, 2);
    let out = lines(&out);
    assert!(out.contains(&DELETE_LINE.to_string()));
    assert!(out.contains(
        &r#"{"Action":"Upsert","TcpRouteMapping":{"router_group_guid":"rg","external_port":5200,"host_ip":"10.0.0.1","host_port":61000}}"#
            .to_string()
    ));
}

#[tokio::test(flavor = "multi_thread")]
async fn rejected_protocol_does_not_stop_the_other() {
    let server = MockServer::start().await;
    mount_stream(&server, "/routing/v1/events", DELETE_FRAME, 1).await;
    Mock::given(method("GET"))
        .and(path("/routing/v1/tcp_routes/events"))
        .respond_with(ResponseTemplate::new(404).set_body_string("tcp routing disabled"))
        .expect(1)
        .mount(&server)
        .await;

    let mut coordinator =
        FanInCoordinator::new(Arc::new(make_client(&server)), ProtocolSelection::both());
    let (mut out, mut diagnostics) = (Vec::new(), Vec::new());
    let summary = coordinator.run(&mut out, &mut diagnostics).await.unwrap();

    assert_eq!(summary.started, 1);
    assert_eq!(summary.failed_to_start, vec![Protocol::Tcp]);
    assert_eq!(lines(&out), vec![DELETE_LINE.to_string()]);
    let diagnostics = lines(&diagnostics);
    assert_eq!(diagnostics.len(), 2);
    assert!(diagnostics
        .iter()
        .any(|line| line.starts_with("streaming events failed: ") && line.contains("404")));
    assert!(diagnostics.contains(&"Connection closed: EOF".to_string()));
}
