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

//! Fan-in of all protocol runners into one output stream.

use super::{EventSubscriber, SubscriptionFailure, SubscriptionRunner};
use crate::models::{Protocol, ProtocolSelection};
use crate::observability::{events, fields};
use futures::stream::{FuturesUnordered, StreamExt};
use std::io::{self, Write};
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::{debug, info, warn};

const COMPONENT: &str = "fan_in";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FanInState {
    Idle,
    Streaming,
    Draining,
    Done,
}

/// What happened during one [`FanInCoordinator::run`].
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct FanInSummary {
    pub started: usize,
    pub terminated: usize,
    pub events_written: usize,
    pub failed_to_start: Vec<Protocol>,
}

impl FanInSummary {
    pub fn any_started(&self) -> bool {
        self.started > 0
    }
}

/// Starts one runner per selected protocol and merges their output.
///
/// Event lines go to `out` as they arrive. Connection failures and runner
/// terminations are written to `diagnostics`. The run ends once every runner
/// that started has terminated; a failing protocol never stops its sibling.
pub struct FanInCoordinator {
    subscriber: Arc<dyn EventSubscriber>,
    selection: ProtocolSelection,
    state: FanInState,
}

impl FanInCoordinator {
    pub fn new(subscriber: Arc<dyn EventSubscriber>, selection: ProtocolSelection) -> Self {
        Self {
            subscriber,
            selection,
            state: FanInState::Idle,
        }
    }

    pub fn state(&self) -> FanInState {
        self.state
    }

    pub async fn run<O: Write, E: Write>(
        &mut self,
        out: &mut O,
        diagnostics: &mut E,
    ) -> io::Result<FanInSummary> {
        let (event_tx, mut event_rx) = mpsc::unbounded_channel::<String>();
        let (failure_tx, mut failure_rx) = mpsc::unbounded_channel::<SubscriptionFailure>();
        let mut summary = FanInSummary::default();
        let mut runners = Vec::new();
        let mut failed_to_start = Vec::new();

        // All protocols connect at once; a stalled connection never holds back another.
        let mut pending_starts = self
            .selection
            .protocols()
            .into_iter()
            .enumerate()
            .map(|(order, protocol)| {
                debug!(
                    event = events::SUBSCRIBE_START,
                    component = COMPONENT,
                    protocol = protocol.as_str(),
                    "subscribing to route events"
                );
                let start = SubscriptionRunner::start(
                    protocol,
                    self.subscriber.clone(),
                    event_tx.clone(),
                    failure_tx.clone(),
                );
                async move { (order, protocol, start.await) }
            })
            .collect::<FuturesUnordered<_>>();

        // Only runners hold senders from here on, so both channels close with them.
        drop(event_tx);
        drop(failure_tx);

        self.transition(FanInState::Streaming);
        let mut channels_closed = false;
        while self.state == FanInState::Streaming {
            tokio::select! {
                Some((order, protocol, started)) = pending_starts.next(), if !pending_starts.is_empty() => {
                    match started {
                        Ok(runner) => {
                            info!(
                                event = events::SUBSCRIBE_OK,
                                component = COMPONENT,
                                protocol = protocol.as_str(),
                                runner_id = runner.runner_id(),
                                "subscribed to route events"
                            );
                            runners.push(runner);
                            summary.started += 1;
                        }
                        Err(err) => {
                            warn!(
                                event = events::SUBSCRIBE_FAILED,
                                component = COMPONENT,
                                protocol = protocol.as_str(),
                                err = fields::format_error_chain(&err).as_str(),
                                "unable to subscribe to route events"
                            );
                            writeln!(diagnostics, "streaming events failed: {err}")?;
                            diagnostics.flush()?;
                            failed_to_start.push((order, protocol));
                        }
                    }
                }
                Some(line) = event_rx.recv() => {
                    Self::write_event(out, &line)?;
                    summary.events_written += 1;
                }
                Some(failure) = failure_rx.recv() => {
                    summary.terminated += 1;
                    info!(
                        event = events::FANIN_SUBSCRIPTION_ENDED,
                        component = COMPONENT,
                        protocol = failure.protocol.as_str(),
                        runner_id = failure.runner_id.as_str(),
                        terminated = summary.terminated,
                        expected = summary.started,
                        "subscription ended"
                    );
                    writeln!(diagnostics, "Connection closed: {failure}")?;
                    diagnostics.flush()?;
                }
                else => {
                    warn!(
                        event = events::FANIN_SUBSCRIPTION_ENDED,
                        component = COMPONENT,
                        terminated = summary.terminated,
                        expected = summary.started,
                        "all runners exited without reporting"
                    );
                    channels_closed = true;
                }
            }

            // The expected count is only final once every start has resolved.
            if pending_starts.is_empty()
                && (channels_closed || summary.terminated == summary.started)
            {
                if summary.started == 0 {
                    self.transition(FanInState::Done);
                } else {
                    self.transition(FanInState::Draining);
                }
            }
        }

        failed_to_start.sort_by_key(|(order, _)| *order);
        summary.failed_to_start = failed_to_start
            .into_iter()
            .map(|(_, protocol)| protocol)
            .collect();
        if self.state == FanInState::Done {
            return Ok(summary);
        }

        summary.events_written += Self::drain_queued(&mut event_rx, out)?;
        self.transition(FanInState::Done);

        // Runners exit right after reporting; any still running are left detached.
        for runner in runners.into_iter().filter(SubscriptionRunner::is_finished) {
            let runner_id = runner.runner_id().to_string();
            let protocol = runner.protocol();
            if runner.join().is_err() {
                warn!(
                    event = events::RUNNER_JOIN_FAILED,
                    component = COMPONENT,
                    runner_id = runner_id.as_str(),
                    protocol = protocol.as_str(),
                    "runner thread panicked"
                );
            }
        }

        Ok(summary)
    }

    /// Writes events already queued when the last runner terminated, without waiting.
    fn drain_queued<O: Write>(
        event_rx: &mut UnboundedReceiver<String>,
        out: &mut O,
    ) -> io::Result<usize> {
        let mut drained = 0;
        while let Ok(line) = event_rx.try_recv() {
            Self::write_event(out, &line)?;
            drained += 1;
        }
        debug!(
            event = events::FANIN_DRAINED,
            component = COMPONENT,
            drained,
            "drained queued events"
        );
        Ok(drained)
    }

    fn write_event<O: Write>(out: &mut O, line: &str) -> io::Result<()> {
        let written = writeln!(out, "{line}").and_then(|_| out.flush());
        if let Err(err) = &written {
            warn!(
                event = events::FANIN_OUTPUT_FAILED,
                component = COMPONENT,
                err = %err,
                "unable to write route event"
            );
        }
        written
    }

    fn transition(&mut self, next: FanInState) {
        debug!(
            event = events::FANIN_STATE_CHANGE,
            component = COMPONENT,
            from = ?self.state,
            to = ?next,
            "fan-in state change"
        );
        self.state = next;
    }
}
