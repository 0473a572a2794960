// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Execution streams.
//!
//! A [`Stream`] is a FIFO pipeline of primitives. [`submit`](Stream::submit)
//! appends without executing; [`wait`](Stream::wait) runs every pending
//! primitive in submission order, blocks until all of them finish, and
//! returns the stream status. `wait` is the required synchronization
//! point before any output memory may be read. There is no ordering
//! guarantee between different streams.

use crate::{Primitive, PrimitiveError, StreamMetrics};
use std::time::Instant;

/// An ordered execution pipeline with a blocking join.
///
/// # Examples
/// ```no_run
/// use primitive_runtime::Stream;
/// # fn demo(p1: Box<dyn primitive_runtime::Primitive>,
/// #         p2: Box<dyn primitive_runtime::Primitive>) {
/// let mut stream = Stream::new();
/// stream.submit(p1).submit(p2);
/// stream.wait().unwrap();
/// # }
/// ```
#[derive(Default)]
pub struct Stream {
    pipeline: Vec<Box<dyn Primitive>>,
    next: usize,
    failure: Option<PrimitiveError>,
    metrics: StreamMetrics,
}

impl Stream {
    /// Creates an empty stream.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a primitive to the pipeline. May be called any number of
    /// times before (or between) join points.
    pub fn submit(&mut self, primitive: Box<dyn Primitive>) -> &mut Self {
        tracing::debug!(
            "submit '{}' on {} (pipeline depth {})",
            primitive.name(),
            primitive.engine(),
            self.pipeline.len() + 1,
        );
        self.pipeline.push(primitive);
        self
    }

    /// Executes all pending primitives in submission order and blocks
    /// until they complete.
    ///
    /// The first failing primitive aborts the remainder of the pipeline
    /// and its error becomes the stream status. Calling `wait` again with
    /// nothing pending is a no-op that returns the cached status.
    pub fn wait(&mut self) -> Result<(), PrimitiveError> {
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }
        if self.next >= self.pipeline.len() {
            return Ok(());
        }

        let start = Instant::now();
        while self.next < self.pipeline.len() {
            let primitive = &self.pipeline[self.next];
            let t = Instant::now();
            let result = primitive.execute_forward();
            self.next += 1;

            match result {
                Ok(()) => self.metrics.record(primitive.name(), t.elapsed()),
                Err(e) => {
                    tracing::warn!("primitive '{}' failed: {e}", primitive.name());
                    // Abandon the rest of the pipeline; the stream is failed.
                    self.next = self.pipeline.len();
                    self.failure = Some(e.clone());
                    self.metrics.finalise(start.elapsed());
                    return Err(e);
                }
            }
        }
        self.metrics.finalise(start.elapsed());
        tracing::debug!("{}", self.metrics.summary());
        Ok(())
    }

    /// Returns the number of primitives submitted so far.
    pub fn len(&self) -> usize {
        self.pipeline.len()
    }

    /// Returns `true` if nothing has been submitted.
    pub fn is_empty(&self) -> bool {
        self.pipeline.is_empty()
    }

    /// Returns the execution metrics collected so far.
    pub fn metrics(&self) -> &StreamMetrics {
        &self.metrics
    }
}

impl std::fmt::Debug for Stream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stream")
            .field("submitted", &self.pipeline.len())
            .field("executed", &self.next)
            .field("failed", &self.failure.is_some())
            .finish()
    }
}
