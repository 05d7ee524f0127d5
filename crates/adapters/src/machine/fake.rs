// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake machine for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{
    CameraAdapter, FeederAdapter, HeadAdapter, LifecycleNotifier, Looking, MachineAdapter,
    MachineError, MachineEvent,
};
use async_trait::async_trait;
use pnp_core::{Location, Part, PartId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

/// Recorded machine call
#[derive(Debug, Clone, PartialEq)]
pub enum MachineCall {
    SetEnabled { enabled: bool },
    Home { head: String },
    Feed { feeder: String, head: String },
    MoveTo { head: String, location: Location },
    Pick { head: String, part: PartId },
    Place { head: String },
}

impl MachineCall {
    /// Calls that move or actuate hardware
    pub fn is_actuation(&self) -> bool {
        !matches!(self, MachineCall::SetEnabled { .. })
    }
}

#[derive(Default)]
struct FakeState {
    enabled: bool,
    enable_failure: Option<String>,
    disable_failure: Option<String>,
    /// Remaining failures per part
    pick_failures: HashMap<PartId, u32>,
    move_failure: Option<String>,
    place_failure: Option<String>,
    home_failure: Option<String>,
    picks_held: bool,
}

struct Shared {
    state: Mutex<FakeState>,
    calls: Mutex<Vec<MachineCall>>,
    notifier: LifecycleNotifier,
    pick_gate: Semaphore,
    run_token: Arc<Semaphore>,
}

impl Shared {
    fn state(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Record `call` if the machine is enabled
    fn actuate(&self, call: MachineCall) -> Result<(), MachineError> {
        if !self.state().enabled {
            return Err(MachineError::Disabled);
        }
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(call);
        Ok(())
    }
}

/// Fake machine for testing. Starts enabled with a single head `H1`.
#[derive(Clone)]
pub struct FakeMachine {
    shared: Arc<Shared>,
    heads: Vec<String>,
    feeders: Vec<(String, PartId, Location, bool)>,
    cameras: Vec<(String, Looking)>,
}

impl Default for FakeMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeMachine {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(FakeState {
                    enabled: true,
                    ..FakeState::default()
                }),
                calls: Mutex::new(Vec::new()),
                notifier: LifecycleNotifier::new(),
                pick_gate: Semaphore::new(0),
                run_token: Arc::new(Semaphore::new(1)),
            }),
            heads: vec!["H1".to_string()],
            feeders: Vec::new(),
            cameras: Vec::new(),
        }
    }

    /// Replace the head list
    pub fn with_heads(mut self, heads: &[&str]) -> Self {
        self.heads = heads.iter().map(|h| h.to_string()).collect();
        self
    }

    pub fn with_feeder(mut self, id: &str, part: impl Into<PartId>) -> Self {
        self.feeders
            .push((id.to_string(), part.into(), Location::ORIGIN, true));
        self
    }

    pub fn with_disabled_feeder(mut self, id: &str, part: impl Into<PartId>) -> Self {
        self.feeders
            .push((id.to_string(), part.into(), Location::ORIGIN, false));
        self
    }

    pub fn with_camera(mut self, id: &str, looking: Looking) -> Self {
        self.cameras.push((id.to_string(), looking));
        self
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<MachineCall> {
        self.shared
            .calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn clear_calls(&self) {
        self.shared
            .calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }

    /// Number of recorded pick attempts
    pub fn pick_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, MachineCall::Pick { .. }))
            .count()
    }

    /// Parts placed, in order
    pub fn placed_parts(&self) -> Vec<PartId> {
        let mut holding = None;
        let mut placed = Vec::new();
        for call in self.calls() {
            match call {
                MachineCall::Pick { part, .. } => holding = Some(part),
                MachineCall::Place { .. } => placed.extend(holding.take()),
                _ => {}
            }
        }
        placed
    }

    /// Fail the next `times` picks of `part`
    pub fn fail_picks(&self, part: impl Into<PartId>, times: u32) {
        self.shared.state().pick_failures.insert(part.into(), times);
    }

    pub fn fail_moves(&self, reason: &str) {
        self.shared.state().move_failure = Some(reason.to_string());
    }

    pub fn fail_places(&self, reason: &str) {
        self.shared.state().place_failure = Some(reason.to_string());
    }

    pub fn fail_homing(&self, reason: &str) {
        self.shared.state().home_failure = Some(reason.to_string());
    }

    pub fn fail_enable(&self, reason: &str) {
        self.shared.state().enable_failure = Some(reason.to_string());
    }

    pub fn fail_disable(&self, reason: &str) {
        self.shared.state().disable_failure = Some(reason.to_string());
    }

    /// Drop enablement as an e-stop would
    pub fn disable_with(&self, reason: &str) {
        self.shared.state().enabled = false;
        self.shared.notifier.notify(MachineEvent::Disabled {
            reason: reason.to_string(),
        });
    }

    /// Block picks after they are recorded until released
    pub fn hold_picks(&self) {
        self.shared.state().picks_held = true;
    }

    /// Let `n` held picks proceed
    pub fn release_picks(&self, n: usize) {
        self.shared.pick_gate.add_permits(n);
    }

    /// Stop holding picks and release any that are waiting. Holding cannot be
    /// re-armed afterwards.
    pub fn open_picks(&self) {
        self.shared.state().picks_held = false;
        self.shared.pick_gate.close();
    }
}

#[async_trait]
impl MachineAdapter for FakeMachine {
    type Head = FakeHead;
    type Feeder = FakeFeeder;
    type Camera = FakeCamera;

    fn is_enabled(&self) -> bool {
        self.shared.state().enabled
    }

    async fn set_enabled(&self, enabled: bool) -> Result<(), MachineError> {
        self.shared
            .calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(MachineCall::SetEnabled { enabled });

        let event = {
            let mut state = self.shared.state();
            let failure = if enabled {
                state.enable_failure.clone()
            } else {
                state.disable_failure.clone()
            };
            match failure {
                Some(reason) if enabled => Err(MachineEvent::EnableFailed { reason }),
                Some(reason) => Err(MachineEvent::DisableFailed { reason }),
                None if state.enabled == enabled => return Ok(()),
                None => {
                    state.enabled = enabled;
                    Ok(if enabled {
                        MachineEvent::Enabled
                    } else {
                        MachineEvent::Disabled {
                            reason: "disable requested".to_string(),
                        }
                    })
                }
            }
        };

        match event {
            Ok(event) => {
                self.shared.notifier.notify(event);
                Ok(())
            }
            Err(event) => {
                let err = match &event {
                    MachineEvent::EnableFailed { reason } => {
                        MachineError::EnableFailed(reason.clone())
                    }
                    MachineEvent::DisableFailed { reason } => {
                        MachineError::DisableFailed(reason.clone())
                    }
                    _ => MachineError::Disabled,
                };
                self.shared.notifier.notify(event);
                Err(err)
            }
        }
    }

    fn heads(&self) -> Vec<FakeHead> {
        self.heads
            .iter()
            .map(|id| FakeHead {
                id: id.clone(),
                shared: Arc::clone(&self.shared),
            })
            .collect()
    }

    fn feeders(&self) -> Vec<FakeFeeder> {
        self.feeders
            .iter()
            .map(|(id, part, location, enabled)| FakeFeeder {
                id: id.clone(),
                part_id: part.clone(),
                location: *location,
                enabled: *enabled,
                shared: Arc::clone(&self.shared),
            })
            .collect()
    }

    fn cameras(&self) -> Vec<FakeCamera> {
        self.cameras
            .iter()
            .map(|(id, looking)| FakeCamera {
                id: id.clone(),
                looking: *looking,
            })
            .collect()
    }

    fn subscribe(&self) -> tokio::sync::broadcast::Receiver<MachineEvent> {
        self.shared.notifier.subscribe()
    }

    fn run_token(&self) -> Arc<Semaphore> {
        Arc::clone(&self.shared.run_token)
    }
}

#[derive(Clone)]
pub struct FakeHead {
    id: String,
    shared: Arc<Shared>,
}

#[async_trait]
impl HeadAdapter for FakeHead {
    fn id(&self) -> &str {
        &self.id
    }

    async fn home(&self) -> Result<(), MachineError> {
        self.shared.actuate(MachineCall::Home {
            head: self.id.clone(),
        })?;
        match self.shared.state().home_failure.clone() {
            Some(reason) => Err(MachineError::Homing {
                head: self.id.clone(),
                reason,
            }),
            None => Ok(()),
        }
    }

    async fn move_to(&self, location: Location) -> Result<(), MachineError> {
        self.shared.actuate(MachineCall::MoveTo {
            head: self.id.clone(),
            location,
        })?;
        if let Some(reason) = self.shared.state().move_failure.clone() {
            return Err(MachineError::Motion {
                head: self.id.clone(),
                reason,
            });
        }
        self.shared.notifier.notify(MachineEvent::HeadActivity {
            head: self.id.clone(),
        });
        Ok(())
    }

    async fn pick(&self, part: &Part) -> Result<(), MachineError> {
        self.shared.actuate(MachineCall::Pick {
            head: self.id.clone(),
            part: part.id.clone(),
        })?;

        let held = self.shared.state().picks_held;
        if held {
            if let Ok(permit) = self.shared.pick_gate.acquire().await {
                permit.forget();
            }
            if !self.shared.state().enabled {
                return Err(MachineError::Disabled);
            }
        }

        let mut state = self.shared.state();
        if let Some(remaining) = state.pick_failures.get_mut(&part.id) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(MachineError::Pick {
                    head: self.id.clone(),
                    reason: format!("vacuum not reached for {}", part.id),
                });
            }
        }
        Ok(())
    }

    async fn place(&self) -> Result<(), MachineError> {
        self.shared.actuate(MachineCall::Place {
            head: self.id.clone(),
        })?;
        match self.shared.state().place_failure.clone() {
            Some(reason) => Err(MachineError::Place {
                head: self.id.clone(),
                reason,
            }),
            None => Ok(()),
        }
    }
}

#[derive(Clone)]
pub struct FakeFeeder {
    id: String,
    part_id: PartId,
    location: Location,
    enabled: bool,
    shared: Arc<Shared>,
}

#[async_trait]
impl FeederAdapter for FakeFeeder {
    fn id(&self) -> &str {
        &self.id
    }

    fn part_id(&self) -> &PartId {
        &self.part_id
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    async fn feed(&self, head: &str) -> Result<Location, MachineError> {
        self.shared.actuate(MachineCall::Feed {
            feeder: self.id.clone(),
            head: head.to_string(),
        })?;
        Ok(self.location)
    }
}

#[derive(Clone)]
pub struct FakeCamera {
    id: String,
    looking: Looking,
}

impl CameraAdapter for FakeCamera {
    fn id(&self) -> &str {
        &self.id
    }

    fn looking(&self) -> Looking {
        self.looking
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
