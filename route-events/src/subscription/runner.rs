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

//! Per-protocol subscription loop running on a dedicated thread.

use super::EventSubscriber;
use crate::error::{ApiError, EventError, StartError};
use crate::event_source::EventSource;
use crate::models::{Protocol, RouteMapping};
use crate::observability::{
    events,
    fields::{self, RunnerContext},
};
use crate::runtime::worker_runtime::{spawn_subscription_loop, SUBSCRIPTION_THREAD_NAME_PREFIX};
use std::fmt;
use std::sync::Arc;
use std::thread;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::oneshot;
use tracing::{debug, info, warn, Level};
use uuid::Uuid;

const COMPONENT: &str = "subscription_runner";

/// Terminal report of one runner, sent exactly once on the error channel.
#[derive(Debug)]
pub struct SubscriptionFailure {
    pub protocol: Protocol,
    pub runner_id: String,
    pub error: EventError,
}

impl fmt::Display for SubscriptionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)
    }
}

/// Handle to a running subscription thread.
pub struct SubscriptionRunner {
    runner_id: String,
    protocol: Protocol,
    handle: thread::JoinHandle<()>,
}

impl SubscriptionRunner {
    /// Connects `protocol` on a new thread and, once connected, starts forwarding.
    ///
    /// Returns after the connection attempt has finished, so a connection failure
    /// is reported here and no runner is left behind.
    pub async fn start(
        protocol: Protocol,
        subscriber: Arc<dyn EventSubscriber>,
        event_tx: UnboundedSender<String>,
        failure_tx: UnboundedSender<SubscriptionFailure>,
    ) -> Result<Self, StartError> {
        let runner_id = Uuid::new_v4().hyphenated().to_string();
        let thread_name = format!("{SUBSCRIPTION_THREAD_NAME_PREFIX}{protocol}");
        let (ready_tx, ready_rx) = oneshot::channel();
        let runner_id_for_loop = runner_id.clone();

        debug!(
            event = events::RUNNER_SPAWN_START,
            component = COMPONENT,
            runner_id = runner_id.as_str(),
            protocol = protocol.as_str(),
            "spawning subscription runner"
        );

        let spawned = spawn_subscription_loop(thread_name, move || async move {
            match protocol {
                Protocol::Http => {
                    let connected = subscriber.subscribe_to_events().await;
                    Self::connect_and_run(
                        runner_id_for_loop,
                        connected,
                        ready_tx,
                        event_tx,
                        failure_tx,
                    )
                    .await;
                }
                Protocol::Tcp => {
                    let connected = subscriber.subscribe_to_tcp_events().await;
                    Self::connect_and_run(
                        runner_id_for_loop,
                        connected,
                        ready_tx,
                        event_tx,
                        failure_tx,
                    )
                    .await;
                }
            }
        });

        let handle = match spawned {
            Ok(handle) => handle,
            Err(err) => {
                warn!(
                    event = events::RUNNER_SPAWN_FAILED,
                    component = COMPONENT,
                    runner_id = runner_id.as_str(),
                    protocol = protocol.as_str(),
                    err = %err,
                    "unable to spawn subscription runner"
                );
                return Err(StartError::Spawn(err));
            }
        };

        match ready_rx.await {
            Ok(Ok(())) => {
                info!(
                    event = events::RUNNER_SPAWN_OK,
                    component = COMPONENT,
                    runner_id = runner_id.as_str(),
                    protocol = protocol.as_str(),
                    "subscription runner streaming"
                );
                Ok(Self {
                    runner_id,
                    protocol,
                    handle,
                })
            }
            // The thread ends right after reporting; it is left to exit on its own.
            Ok(Err(err)) => Err(StartError::Api(err)),
            Err(_) => Err(StartError::Aborted),
        }
    }

    pub fn runner_id(&self) -> &str {
        &self.runner_id
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Waits for the runner thread to exit.
    pub fn join(self) -> thread::Result<()> {
        self.handle.join()
    }

    async fn connect_and_run<M: RouteMapping>(
        runner_id: String,
        connected: Result<EventSource<M>, ApiError>,
        ready: oneshot::Sender<Result<(), ApiError>>,
        event_tx: UnboundedSender<String>,
        failure_tx: UnboundedSender<SubscriptionFailure>,
    ) {
        match connected {
            Ok(mut source) => {
                if ready.send(Ok(())).is_err() {
                    let _ = source.close().await;
                    return;
                }
                Self::run_loop(runner_id, source, event_tx, failure_tx).await;
            }
            Err(err) => {
                let _ = ready.send(Err(err));
            }
        }
    }

    /// Pulls events until the source fails, then reports that failure once.
    pub(crate) async fn run_loop<M: RouteMapping>(
        runner_id: String,
        mut source: EventSource<M>,
        event_tx: UnboundedSender<String>,
        failure_tx: UnboundedSender<SubscriptionFailure>,
    ) {
        let runner_context = RunnerContext::with_current_thread(runner_id);
        let protocol = M::PROTOCOL;

        let error = loop {
            let event = match source.next().await {
                Ok(event) => event,
                Err(err) => break err,
            };

            let line = match serde_json::to_string(&event) {
                Ok(line) => line,
                Err(err) => break EventError::Encode(err),
            };

            if tracing::enabled!(Level::DEBUG) {
                debug!(
                    event = events::RUNNER_EVENT_FORWARDED,
                    component = COMPONENT,
                    runner_id = runner_context.runner_id.as_str(),
                    runner_thread = runner_context.runner_thread.as_str(),
                    protocol = protocol.as_str(),
                    action = event.action.as_str(),
                    "forwarding route event"
                );
            }

            if event_tx.send(line).is_err() {
                info!(
                    event = events::RUNNER_CONSUMER_GONE,
                    component = COMPONENT,
                    runner_id = runner_context.runner_id.as_str(),
                    runner_thread = runner_context.runner_thread.as_str(),
                    protocol = protocol.as_str(),
                    "event channel closed; stopping subscription"
                );
                Self::close_source(&runner_context, &mut source).await;
                return;
            }
        };

        info!(
            event = events::RUNNER_TERMINATED,
            component = COMPONENT,
            runner_id = runner_context.runner_id.as_str(),
            runner_thread = runner_context.runner_thread.as_str(),
            protocol = protocol.as_str(),
            err = fields::format_error_chain(&error).as_str(),
            "subscription terminated"
        );
        Self::close_source(&runner_context, &mut source).await;

        let _ = failure_tx.send(SubscriptionFailure {
            protocol,
            runner_id: runner_context.runner_id,
            error,
        });
    }

    async fn close_source<M: RouteMapping>(
        runner_context: &RunnerContext,
        source: &mut EventSource<M>,
    ) {
        if let Err(err) = source.close().await {
            warn!(
                event = events::RUNNER_CLOSE_FAILED,
                component = COMPONENT,
                runner_id = runner_context.runner_id.as_str(),
                runner_thread = runner_context.runner_thread.as_str(),
                err = %err,
                "unable to close event source"
            );
        }
    }
}
