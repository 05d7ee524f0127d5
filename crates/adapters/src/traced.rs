// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced machine wrappers for consistent observability

use crate::machine::{FeederAdapter, HeadAdapter, MachineAdapter, MachineError, MachineEvent};
use async_trait::async_trait;
use pnp_core::{Location, Part, PartId};
use std::sync::Arc;
use tokio::sync::{broadcast, Semaphore};
use tracing::Instrument;

/// Wrapper that adds tracing to any MachineAdapter, its heads and feeders
#[derive(Clone)]
pub struct TracedMachine<M> {
    inner: M,
}

impl<M> TracedMachine<M> {
    pub fn new(inner: M) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &M {
        &self.inner
    }
}

#[async_trait]
impl<M: MachineAdapter> MachineAdapter for TracedMachine<M> {
    type Head = TracedHead<M::Head>;
    type Feeder = TracedFeeder<M::Feeder>;
    type Camera = M::Camera;

    fn is_enabled(&self) -> bool {
        self.inner.is_enabled()
    }

    async fn set_enabled(&self, enabled: bool) -> Result<(), MachineError> {
        let span = tracing::info_span!("machine.set_enabled", enabled);
        let result = self.inner.set_enabled(enabled).instrument(span.clone()).await;
        let _guard = span.enter();
        match &result {
            Ok(()) => tracing::info!(enabled = self.inner.is_enabled(), "enablement applied"),
            Err(e) => tracing::error!(error = %e, "enablement request failed"),
        }
        result
    }

    fn heads(&self) -> Vec<Self::Head> {
        self.inner.heads().into_iter().map(TracedHead::new).collect()
    }

    fn feeders(&self) -> Vec<Self::Feeder> {
        self.inner
            .feeders()
            .into_iter()
            .map(TracedFeeder::new)
            .collect()
    }

    fn cameras(&self) -> Vec<Self::Camera> {
        self.inner.cameras()
    }

    fn subscribe(&self) -> broadcast::Receiver<MachineEvent> {
        self.inner.subscribe()
    }

    fn run_token(&self) -> Arc<Semaphore> {
        self.inner.run_token()
    }
}

/// Wrapper that adds tracing to any HeadAdapter
#[derive(Clone)]
pub struct TracedHead<H> {
    inner: H,
}

impl<H> TracedHead<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<H: HeadAdapter> HeadAdapter for TracedHead<H> {
    fn id(&self) -> &str {
        self.inner.id()
    }

    async fn home(&self) -> Result<(), MachineError> {
        let span = tracing::info_span!("head.home", head = self.inner.id());

        let start = std::time::Instant::now();
        let result = self.inner.home().instrument(span.clone()).await;
        let elapsed = start.elapsed();
        let _guard = span.enter();

        match &result {
            Ok(()) => tracing::info!(elapsed_ms = elapsed.as_millis() as u64, "homed"),
            Err(e) => tracing::error!(
                elapsed_ms = elapsed.as_millis() as u64,
                error = %e,
                "homing failed"
            ),
        }
        result
    }

    async fn move_to(&self, location: Location) -> Result<(), MachineError> {
        let span = tracing::info_span!("head.move_to", head = self.inner.id(), to = %location);

        let start = std::time::Instant::now();
        let result = self.inner.move_to(location).instrument(span.clone()).await;
        let elapsed = start.elapsed();
        let _guard = span.enter();

        match &result {
            Ok(()) => tracing::debug!(elapsed_ms = elapsed.as_millis() as u64, "moved"),
            Err(e) => tracing::error!(
                elapsed_ms = elapsed.as_millis() as u64,
                error = %e,
                "move failed"
            ),
        }
        result
    }

    async fn pick(&self, part: &Part) -> Result<(), MachineError> {
        let span = tracing::info_span!("head.pick", head = self.inner.id(), part = %part.id);
        let result = self.inner.pick(part).instrument(span.clone()).await;
        let _guard = span.enter();

        // Pick failures go to the delegate, so they are not errors yet
        match &result {
            Ok(()) => tracing::debug!("picked"),
            Err(e) => tracing::warn!(error = %e, "pick failed"),
        }
        result
    }

    async fn place(&self) -> Result<(), MachineError> {
        let span = tracing::info_span!("head.place", head = self.inner.id());
        let result = self.inner.place().instrument(span.clone()).await;
        let _guard = span.enter();
        match &result {
            Ok(()) => tracing::debug!("placed"),
            Err(e) => tracing::error!(error = %e, "place failed"),
        }
        result
    }
}

/// Wrapper that adds tracing to any FeederAdapter
#[derive(Clone)]
pub struct TracedFeeder<F> {
    inner: F,
}

impl<F> TracedFeeder<F> {
    pub fn new(inner: F) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<F: FeederAdapter> FeederAdapter for TracedFeeder<F> {
    fn id(&self) -> &str {
        self.inner.id()
    }

    fn part_id(&self) -> &PartId {
        self.inner.part_id()
    }

    fn is_enabled(&self) -> bool {
        self.inner.is_enabled()
    }

    async fn feed(&self, head: &str) -> Result<Location, MachineError> {
        let span = tracing::info_span!("feeder.feed", feeder = self.inner.id(), head);
        let result = self.inner.feed(head).instrument(span.clone()).await;
        let _guard = span.enter();

        tracing::trace!(pick_at = ?result.as_ref().ok(), "fed");
        if let Err(e) = &result {
            tracing::warn!(error = %e, "feed failed");
        }
        result
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
