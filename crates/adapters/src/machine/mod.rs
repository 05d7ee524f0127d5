// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Machine abstraction
//!
//! Capability traits the coordinator drives. Implementations own the hardware
//! transport; the coordinator only sees these calls and their errors.

mod sim;

pub use sim::{
    SimCamera, SimCameraConfig, SimFeeder, SimFeederConfig, SimHead, SimMachineConfig,
    SimulatedMachine,
};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeCamera, FakeFeeder, FakeHead, FakeMachine, MachineCall};

use async_trait::async_trait;
use pnp_core::{Location, Part, PartId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{broadcast, Semaphore};

/// Capacity of the lifecycle notification channel
pub const LIFECYCLE_CAPACITY: usize = 64;

/// Errors from machine operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MachineError {
    #[error("machine is disabled")]
    Disabled,
    #[error("enable failed: {0}")]
    EnableFailed(String),
    #[error("disable failed: {0}")]
    DisableFailed(String),
    #[error("feeder {feeder}: {reason}")]
    Feed { feeder: String, reason: String },
    #[error("head {head} motion failed: {reason}")]
    Motion { head: String, reason: String },
    #[error("head {head} pick failed: {reason}")]
    Pick { head: String, reason: String },
    #[error("head {head} place failed: {reason}")]
    Place { head: String, reason: String },
    #[error("head {head} homing failed: {reason}")]
    Homing { head: String, reason: String },
}

/// Machine lifecycle notifications
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MachineEvent {
    Enabled,
    EnableFailed { reason: String },
    Disabled { reason: String },
    DisableFailed { reason: String },
    HeadActivity { head: String },
}

/// Direction a camera looks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Looking {
    #[default]
    Down,
    Up,
}

/// A head carrying a nozzle
#[async_trait]
pub trait HeadAdapter: Clone + Send + Sync + 'static {
    fn id(&self) -> &str;

    /// Run the homing sequence
    async fn home(&self) -> Result<(), MachineError>;

    /// Move to an absolute table pose
    async fn move_to(&self, location: Location) -> Result<(), MachineError>;

    /// Acquire a part at the current position
    async fn pick(&self, part: &Part) -> Result<(), MachineError>;

    /// Release the held part at the current position
    async fn place(&self) -> Result<(), MachineError>;
}

/// A source of one kind of part
#[async_trait]
pub trait FeederAdapter: Clone + Send + Sync + 'static {
    fn id(&self) -> &str;

    /// The part this feeder supplies
    fn part_id(&self) -> &PartId;

    fn is_enabled(&self) -> bool {
        true
    }

    /// Present the next part for `head`, returning the pose to pick it from
    async fn feed(&self, head: &str) -> Result<Location, MachineError>;
}

/// A camera. Images are not consumed by job execution.
pub trait CameraAdapter: Clone + Send + Sync + 'static {
    fn id(&self) -> &str;
    fn looking(&self) -> Looking;
}

/// The machine: enablement plus its heads, feeders and cameras
#[async_trait]
pub trait MachineAdapter: Clone + Send + Sync + 'static {
    type Head: HeadAdapter;
    type Feeder: FeederAdapter;
    type Camera: CameraAdapter;

    fn is_enabled(&self) -> bool;

    /// Request enable or disable. Outcome is also broadcast as a [`MachineEvent`].
    async fn set_enabled(&self, enabled: bool) -> Result<(), MachineError>;

    fn heads(&self) -> Vec<Self::Head>;
    fn feeders(&self) -> Vec<Self::Feeder>;
    fn cameras(&self) -> Vec<Self::Camera>;

    /// Receive lifecycle notifications emitted after this call
    fn subscribe(&self) -> broadcast::Receiver<MachineEvent>;

    /// Single-permit claim on actuation, shared by every clone of this
    /// machine. Whoever holds the permit is the only one driving it.
    fn run_token(&self) -> Arc<Semaphore>;
}

/// First enabled feeder supplying `part`
pub fn feeder_for<M: MachineAdapter>(machine: &M, part: &PartId) -> Option<M::Feeder> {
    machine
        .feeders()
        .into_iter()
        .find(|f| f.is_enabled() && f.part_id() == part)
}

/// Broadcast side of the lifecycle channel, shared by machine implementations
#[derive(Clone)]
pub struct LifecycleNotifier {
    tx: broadcast::Sender<MachineEvent>,
}

impl LifecycleNotifier {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(LIFECYCLE_CAPACITY);
        Self { tx }
    }

    pub fn notify(&self, event: MachineEvent) {
        // No receivers is fine: nobody is listening yet
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MachineEvent> {
        self.tx.subscribe()
    }
}

impl Default for LifecycleNotifier {
    fn default() -> Self {
        Self::new()
    }
}
