// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Simulated machine driven from configuration

use super::{
    CameraAdapter, FeederAdapter, HeadAdapter, LifecycleNotifier, Looking, MachineAdapter,
    MachineError, MachineEvent,
};
use async_trait::async_trait;
use pnp_core::{Location, Part, PartId};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Semaphore;

fn default_heads() -> Vec<String> {
    vec!["H1".to_string()]
}

fn default_true() -> bool {
    true
}

/// Simulated machine layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimMachineConfig {
    #[serde(default = "default_heads")]
    pub heads: Vec<String>,
    #[serde(default)]
    pub cameras: Vec<SimCameraConfig>,
    #[serde(default)]
    pub feeders: Vec<SimFeederConfig>,
    /// Simulated duration of every head move
    #[serde(default, with = "humantime_serde")]
    pub move_delay: Duration,
}

impl Default for SimMachineConfig {
    fn default() -> Self {
        Self {
            heads: default_heads(),
            cameras: Vec::new(),
            feeders: Vec::new(),
            move_delay: Duration::ZERO,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimFeederConfig {
    pub id: String,
    pub part: PartId,
    /// Pose a head picks from
    #[serde(default)]
    pub location: Location,
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Every Nth feed fails (mis-feed simulation)
    #[serde(default)]
    pub fail_every: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimCameraConfig {
    pub id: String,
    #[serde(default)]
    pub looking: Looking,
}

struct Shared {
    enabled: AtomicBool,
    notifier: LifecycleNotifier,
    run_token: Arc<Semaphore>,
    move_delay: Duration,
}

impl Shared {
    fn ensure_enabled(&self) -> Result<(), MachineError> {
        if self.enabled.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(MachineError::Disabled)
        }
    }
}

/// In-process machine that acts out every command without hardware
#[derive(Clone)]
pub struct SimulatedMachine {
    shared: Arc<Shared>,
    heads: Vec<SimHead>,
    feeders: Vec<SimFeeder>,
    cameras: Vec<SimCamera>,
}

impl SimulatedMachine {
    /// Build a machine from config. It starts disabled.
    pub fn new(config: &SimMachineConfig) -> Self {
        let shared = Arc::new(Shared {
            enabled: AtomicBool::new(false),
            notifier: LifecycleNotifier::new(),
            run_token: Arc::new(Semaphore::new(1)),
            move_delay: config.move_delay,
        });

        let heads = config
            .heads
            .iter()
            .map(|id| SimHead {
                id: id.clone(),
                shared: Arc::clone(&shared),
                position: Arc::new(Mutex::new(Location::ORIGIN)),
                holding: Arc::new(Mutex::new(None)),
            })
            .collect();

        let feeders = config
            .feeders
            .iter()
            .map(|f| SimFeeder {
                id: f.id.clone(),
                part_id: f.part.clone(),
                location: f.location,
                enabled: f.enabled,
                fail_every: f.fail_every.filter(|n| *n > 0),
                feeds: Arc::new(AtomicU32::new(0)),
                shared: Arc::clone(&shared),
            })
            .collect();

        let cameras = config
            .cameras
            .iter()
            .map(|c| SimCamera {
                id: c.id.clone(),
                looking: c.looking,
            })
            .collect();

        Self {
            shared,
            heads,
            feeders,
            cameras,
        }
    }

    /// Drop enablement without a request, as an e-stop or fault would
    pub fn fault(&self, reason: impl Into<String>) {
        if self.shared.enabled.swap(false, Ordering::SeqCst) {
            let reason = reason.into();
            tracing::warn!(%reason, "simulated machine fault");
            self.shared
                .notifier
                .notify(MachineEvent::Disabled { reason });
        }
    }
}

#[async_trait]
impl MachineAdapter for SimulatedMachine {
    type Head = SimHead;
    type Feeder = SimFeeder;
    type Camera = SimCamera;

    fn is_enabled(&self) -> bool {
        self.shared.enabled.load(Ordering::SeqCst)
    }

    async fn set_enabled(&self, enabled: bool) -> Result<(), MachineError> {
        let was = self.shared.enabled.swap(enabled, Ordering::SeqCst);
        if enabled && !was {
            self.shared.notifier.notify(MachineEvent::Enabled);
        } else if !enabled && was {
            self.shared.notifier.notify(MachineEvent::Disabled {
                reason: "disable requested".to_string(),
            });
        }
        Ok(())
    }

    fn heads(&self) -> Vec<SimHead> {
        self.heads.clone()
    }

    fn feeders(&self) -> Vec<SimFeeder> {
        self.feeders.clone()
    }

    fn cameras(&self) -> Vec<SimCamera> {
        self.cameras.clone()
    }

    fn subscribe(&self) -> tokio::sync::broadcast::Receiver<MachineEvent> {
        self.shared.notifier.subscribe()
    }

    fn run_token(&self) -> Arc<Semaphore> {
        Arc::clone(&self.shared.run_token)
    }
}

#[derive(Clone)]
pub struct SimHead {
    id: String,
    shared: Arc<Shared>,
    position: Arc<Mutex<Location>>,
    holding: Arc<Mutex<Option<PartId>>>,
}

impl SimHead {
    pub fn position(&self) -> Location {
        *self.position.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn holding(&self) -> Option<PartId> {
        self.holding
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    async fn travel(&self, location: Location) {
        if !self.shared.move_delay.is_zero() {
            tokio::time::sleep(self.shared.move_delay).await;
        }
        *self.position.lock().unwrap_or_else(|e| e.into_inner()) = location;
        self.shared.notifier.notify(MachineEvent::HeadActivity {
            head: self.id.clone(),
        });
    }
}

#[async_trait]
impl HeadAdapter for SimHead {
    fn id(&self) -> &str {
        &self.id
    }

    async fn home(&self) -> Result<(), MachineError> {
        self.shared.ensure_enabled()?;
        // Homing discards anything left on the nozzle
        *self.holding.lock().unwrap_or_else(|e| e.into_inner()) = None;
        self.travel(Location::ORIGIN).await;
        Ok(())
    }

    async fn move_to(&self, location: Location) -> Result<(), MachineError> {
        self.shared.ensure_enabled()?;
        self.travel(location).await;
        Ok(())
    }

    async fn pick(&self, part: &Part) -> Result<(), MachineError> {
        self.shared.ensure_enabled()?;
        *self.holding.lock().unwrap_or_else(|e| e.into_inner()) = Some(part.id.clone());
        Ok(())
    }

    async fn place(&self) -> Result<(), MachineError> {
        self.shared.ensure_enabled()?;
        let held = self
            .holding
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        match held {
            Some(_) => Ok(()),
            None => Err(MachineError::Place {
                head: self.id.clone(),
                reason: "nozzle is empty".to_string(),
            }),
        }
    }
}

#[derive(Clone)]
pub struct SimFeeder {
    id: String,
    part_id: PartId,
    location: Location,
    enabled: bool,
    fail_every: Option<u32>,
    feeds: Arc<AtomicU32>,
    shared: Arc<Shared>,
}

#[async_trait]
impl FeederAdapter for SimFeeder {
    fn id(&self) -> &str {
        &self.id
    }

    fn part_id(&self) -> &PartId {
        &self.part_id
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    async fn feed(&self, _head: &str) -> Result<Location, MachineError> {
        self.shared.ensure_enabled()?;
        let count = self.feeds.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(every) = self.fail_every {
            if count % every == 0 {
                return Err(MachineError::Feed {
                    feeder: self.id.clone(),
                    reason: format!("mis-feed on feed {count}"),
                });
            }
        }
        Ok(self.location)
    }
}

#[derive(Clone)]
pub struct SimCamera {
    id: String,
    looking: Looking,
}

impl CameraAdapter for SimCamera {
    fn id(&self) -> &str {
        &self.id
    }

    fn looking(&self) -> Looking {
        self.looking
    }
}

#[cfg(test)]
#[path = "sim_tests.rs"]
mod tests;
