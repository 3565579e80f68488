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

//! Canonical structured event names used across `route-events`.

// Wire layer.
pub const STREAM_PARTIAL_FRAME_DROPPED: &str = "stream_partial_frame_dropped";

// Subscription establishment.
pub const SUBSCRIBE_START: &str = "subscribe_start";
pub const SUBSCRIBE_OK: &str = "subscribe_ok";
pub const SUBSCRIBE_FAILED: &str = "subscribe_failed";

// Runner lifecycle.
pub const RUNNER_SPAWN_START: &str = "runner_spawn_start";
pub const RUNNER_SPAWN_OK: &str = "runner_spawn_ok";
pub const RUNNER_SPAWN_FAILED: &str = "runner_spawn_failed";
pub const RUNNER_EVENT_FORWARDED: &str = "runner_event_forwarded";
pub const RUNNER_TERMINATED: &str = "runner_terminated";
pub const RUNNER_CONSUMER_GONE: &str = "runner_consumer_gone";
pub const RUNNER_CLOSE_FAILED: &str = "runner_close_failed";
pub const RUNNER_JOIN_FAILED: &str = "runner_join_failed";

// Fan-in coordinator.
pub const FANIN_STATE_CHANGE: &str = "fanin_state_change";
pub const FANIN_SUBSCRIPTION_ENDED: &str = "fanin_subscription_ended";
pub const FANIN_DRAINED: &str = "fanin_drained";
pub const FANIN_OUTPUT_FAILED: &str = "fanin_output_failed";

// Routing API calls.
pub const API_REQUEST: &str = "api_request";
pub const API_REQUEST_FAILED: &str = "api_request_failed";
