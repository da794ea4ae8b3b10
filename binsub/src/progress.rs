/*
 * Copyright 2022 William Swartzendruber
 *
 * This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a
 * copy of the MPL was not distributed with this file, You can obtain one at
 * https://mozilla.org/MPL/2.0/.
 *
 * SPDX-License-Identifier: MPL-2.0
 */

//! Progress reporting and cooperative cancellation for the writers.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

/// How far a write has come.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ProgressInfo {
    /// Events written so far.
    pub current: usize,
    /// Events to be written in total.
    pub total: usize,
}

/// Receives progress updates. Callbacks may be invoked from worker threads.
pub trait ProgressCallback: Send + Sync {
    fn on_progress(&self, info: &ProgressInfo);
}

impl<F> ProgressCallback for F where
    F: Fn(&ProgressInfo) + Send + Sync,
{
    fn on_progress(&self, info: &ProgressInfo) {
        self(info)
    }
}

/// A cancellation flag shared between the caller and a running write.
///
/// Writers check it between events and stop early, leaving whatever they have already written
/// in place.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {

    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. Every clone of the token observes it.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Optional hooks a writer consults while it runs.
#[derive(Clone, Default)]
pub struct WriteControl {
    pub progress: Option<Arc<dyn ProgressCallback>>,
    pub cancellation: Option<CancellationToken>,
}

impl WriteControl {

    pub fn with_progress(mut self, progress: Arc<dyn ProgressCallback>) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn with_cancellation(mut self, cancellation: CancellationToken) -> Self {
        self.cancellation = Some(cancellation);
        self
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancellation.as_ref().map_or(false, CancellationToken::is_cancelled)
    }

    pub(crate) fn report(&self, current: usize, total: usize) {
        if let Some(progress) = &self.progress {
            progress.on_progress(&ProgressInfo { current, total });
        }
    }
}

/// What a batch write accomplished.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct WriteSummary {
    /// Events fully written.
    pub written: usize,
    /// Whether the write stopped early because cancellation was requested.
    pub cancelled: bool,
}
