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

//! Opt-in diagnostic dumps of routing API traffic.
//!
//! Tracing is off unless a [`TraceSink`] is injected into the client and readers.
//! [`sink_from_env`] reproduces the `RTR_TRACE=true` switch of the command line
//! tool. Every entry is passed through [`sanitize`] before it is written, so
//! bearer tokens and passwords never reach the sink's writer.

use crate::wire::RawEvent;
use chrono::{SecondsFormat, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

/// Environment variable that enables tracing when set to exactly `true`.
pub const RTR_TRACE: &str = "RTR_TRACE";

pub const PRIVATE_DATA_PLACEHOLDER: &str = "[PRIVATE DATA HIDDEN]";

const SENSITIVE_JSON_FIELDS: [&str; 5] = [
    "access_token",
    "refresh_token",
    "token",
    "password",
    "oldPassword",
];

lazy_static! {
    static ref AUTHORIZATION_HEADER: Regex =
        Regex::new(r"(?mi)^authorization: .*").expect("authorization pattern is valid");
    static ref PASSWORD_FORM_FIELD: Regex =
        Regex::new(r"password=[^&]*&").expect("password pattern is valid");
    static ref SENSITIVE_JSON: Vec<(&'static str, Regex)> = SENSITIVE_JSON_FIELDS
        .iter()
        .map(|field| {
            let pattern = format!(r#""{field}":\s*"[^"]*""#);
            (
                *field,
                Regex::new(&pattern).expect("json field pattern is valid"),
            )
        })
        .collect();
}

/// Receiver of trace entries.
pub trait TraceSink: Send + Sync {
    fn record(&self, entry: &str);
}

/// Sink writing sanitized entries to any writer, stdout by default.
pub struct WriterTraceSink<W: Write + Send> {
    writer: Mutex<W>,
}

impl WriterTraceSink<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> WriterTraceSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        match self.writer.into_inner() {
            Ok(writer) => writer,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl<W: Write + Send> TraceSink for WriterTraceSink<W> {
    fn record(&self, entry: &str) {
        let mut writer = match self.writer.lock() {
            Ok(writer) => writer,
            Err(poisoned) => poisoned.into_inner(),
        };
        // Trace output is best effort.
        let _ = writeln!(writer, "{}", sanitize(entry));
        let _ = writer.flush();
    }
}

/// Returns a stdout sink when `value` is exactly `true`.
pub fn sink_from_env(value: Option<&str>) -> Option<Arc<dyn TraceSink>> {
    match value {
        Some("true") => Some(Arc::new(WriterTraceSink::stdout())),
        _ => None,
    }
}

/// Hides credentials in a trace entry.
pub fn sanitize(input: &str) -> String {
    let auth_replacement = format!("Authorization: {PRIVATE_DATA_PLACEHOLDER}");
    let mut sanitized = AUTHORIZATION_HEADER
        .replace_all(input, auth_replacement.as_str())
        .into_owned();

    let password_replacement = format!("password={PRIVATE_DATA_PLACEHOLDER}&");
    sanitized = PASSWORD_FORM_FIELD
        .replace_all(&sanitized, password_replacement.as_str())
        .into_owned();

    for (field, pattern) in SENSITIVE_JSON.iter() {
        let replacement = format!(r#""{field}":"{PRIVATE_DATA_PLACEHOLDER}""#);
        sanitized = pattern
            .replace_all(&sanitized, replacement.as_str())
            .into_owned();
    }

    sanitized
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub(crate) fn trace_request(
    sink: &dyn TraceSink,
    method: &str,
    url: &str,
    headers: &[(String, String)],
    body: Option<&str>,
) {
    let mut entry = format!("\nREQUEST: [{}]\n{method} {url} HTTP/1.1\n", timestamp());
    for (name, value) in headers {
        entry.push_str(&format!("{name}: {value}\n"));
    }
    if let Some(body) = body {
        entry.push('\n');
        entry.push_str(body);
        entry.push('\n');
    }
    sink.record(&entry);
}

pub(crate) fn trace_response(sink: &dyn TraceSink, status: u16, body: &str) {
    sink.record(&format!(
        "\nRESPONSE: [{}]\nHTTP/1.1 {status}\n\n{body}\n",
        timestamp()
    ));
}

pub(crate) fn trace_event(sink: &dyn TraceSink, event: &RawEvent) {
    match serde_json::to_string(event) {
        Ok(event_json) => sink.record(&format!("\nEVENT: [{}]\n{event_json}\n", timestamp())),
        Err(err) => sink.record(&format!("Error dumping event\n{err}\n")),
    }
}
