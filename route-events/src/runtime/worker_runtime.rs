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

//! Runtime helper for spawning subscription loops on dedicated threads.

use std::future::Future;
use std::io;
use std::thread;
use tokio::runtime::Builder;

pub(crate) const SUBSCRIPTION_THREAD_NAME_PREFIX: &str = "rtr-sub-";

/// Runs `run_loop` on a new named thread driven by its own current-thread runtime.
///
/// The runtime is built before the thread is spawned so that both failures reach
/// the caller instead of tearing down the thread.
pub(crate) fn spawn_subscription_loop<F, Fut>(
    thread_name: String,
    run_loop: F,
) -> io::Result<thread::JoinHandle<()>>
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + 'static,
{
    let runtime = Builder::new_current_thread().enable_all().build()?;

    thread::Builder::new()
        .name(thread_name)
        .spawn(move || runtime.block_on(run_loop()))
}
