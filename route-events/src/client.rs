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

//! Authenticated client for the routing API.

use crate::error::ApiError;
use crate::event_source::{EventSource, RouteEventSource, TcpRouteEventSource};
use crate::models::Route;
use crate::observability::{events, fields};
use crate::subscription::EventSubscriber;
use crate::trace::{self, TraceSink};
use crate::wire::SseEventReader;
use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, Response};
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

const COMPONENT: &str = "routing_api_client";

pub const ROUTES_PATH: &str = "/routing/v1/routes";
pub const EVENTS_PATH: &str = "/routing/v1/events";
pub const TCP_EVENTS_PATH: &str = "/routing/v1/tcp_routes/events";

const JSON_CONTENT_TYPE: &str = "application/json";
const EVENT_STREAM_CONTENT_TYPE: &str = "text/event-stream";

/// Client for the routing API endpoints used by `rtr`.
///
/// Connections are not pooled. Each event stream is opened on the runtime of
/// the subscription thread that reads it, and a pooled connection would stay
/// bound to whichever runtime created it.
pub struct RoutingApiClient {
    http: reqwest::Client,
    api: String,
    token: Option<String>,
    trace: Option<Arc<dyn TraceSink>>,
}

impl RoutingApiClient {
    pub fn new(api: &str, skip_tls_verification: bool) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(skip_tls_verification)
            .pool_max_idle_per_host(0)
            .build()?;
        Ok(Self {
            http,
            api: api.trim_end_matches('/').to_string(),
            token: None,
            trace: None,
        })
    }

    pub fn with_trace(mut self, trace: Option<Arc<dyn TraceSink>>) -> Self {
        self.trace = trace;
        self
    }

    pub fn set_token(&mut self, token: impl Into<String>) {
        self.token = Some(token.into());
    }

    pub async fn upsert_routes(&self, routes: &[Route]) -> Result<(), ApiError> {
        let body = serde_json::to_string(routes)?;
        self.request_text(Method::POST, ROUTES_PATH, Some(body)).await?;
        Ok(())
    }

    pub async fn delete_routes(&self, routes: &[Route]) -> Result<(), ApiError> {
        let body = serde_json::to_string(routes)?;
        self.request_text(Method::DELETE, ROUTES_PATH, Some(body)).await?;
        Ok(())
    }

    pub async fn routes(&self) -> Result<Vec<Route>, ApiError> {
        let body = self.request_text(Method::GET, ROUTES_PATH, None).await?;
        Ok(serde_json::from_str(&body)?)
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(Url::parse(&format!("{}{path}", self.api))?)
    }

    async fn request_text(
        &self,
        method: Method,
        path: &str,
        body: Option<String>,
    ) -> Result<String, ApiError> {
        let response = self.execute(method, path, body, JSON_CONTENT_TYPE).await?;
        let status = response.status().as_u16();
        let text = response.text().await?;
        if let Some(sink) = &self.trace {
            trace::trace_response(sink.as_ref(), status, &text);
        }
        Ok(text)
    }

    async fn open_event_stream(&self, path: &str) -> Result<SseEventReader, ApiError> {
        let response = self
            .execute(Method::GET, path, None, EVENT_STREAM_CONTENT_TYPE)
            .await?;
        if let Some(sink) = &self.trace {
            trace::trace_response(sink.as_ref(), response.status().as_u16(), "");
        }
        Ok(SseEventReader::from_stream(
            response.bytes_stream(),
            self.trace.clone(),
        ))
    }

    /// Sends one request and turns a non-success status into [`ApiError::Status`].
    async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<String>,
        accept: &str,
    ) -> Result<Response, ApiError> {
        let url = self.endpoint(path)?;

        let mut headers = vec![(ACCEPT.to_string(), accept.to_string())];
        if let Some(token) = &self.token {
            headers.push((AUTHORIZATION.to_string(), format!("bearer {token}")));
        }
        if body.is_some() {
            headers.push((CONTENT_TYPE.to_string(), JSON_CONTENT_TYPE.to_string()));
        }

        if let Some(sink) = &self.trace {
            trace::trace_request(
                sink.as_ref(),
                method.as_str(),
                url.as_str(),
                &headers,
                body.as_deref(),
            );
        }

        let mut request = self.http.request(method.clone(), url);
        for (name, value) in &headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if let Some(body) = body {
            request = request.body(body);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(err) => {
                warn!(
                    event = events::API_REQUEST_FAILED,
                    component = COMPONENT,
                    method = method.as_str(),
                    path,
                    err = fields::format_error_chain(&err).as_str(),
                    "routing api request failed"
                );
                return Err(err.into());
            }
        };

        let status = response.status();
        debug!(
            event = events::API_REQUEST,
            component = COMPONENT,
            method = method.as_str(),
            path,
            status = status.as_u16(),
            "routing api request"
        );

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        if let Some(sink) = &self.trace {
            trace::trace_response(sink.as_ref(), status.as_u16(), &body);
        }
        warn!(
            event = events::API_REQUEST_FAILED,
            component = COMPONENT,
            method = method.as_str(),
            path,
            status = status.as_u16(),
            "routing api rejected request"
        );
        Err(ApiError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl EventSubscriber for RoutingApiClient {
    async fn subscribe_to_events(&self) -> Result<RouteEventSource, ApiError> {
        let reader = self.open_event_stream(EVENTS_PATH).await?;
        Ok(EventSource::new(Box::new(reader)))
    }

    async fn subscribe_to_tcp_events(&self) -> Result<TcpRouteEventSource, ApiError> {
        let reader = self.open_event_stream(TCP_EVENTS_PATH).await?;
        Ok(EventSource::new(Box::new(reader)))
    }
}
