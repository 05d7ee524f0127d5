// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job execution coordinator
//!
//! Owns the job state machine and the single-owner run token. A run also
//! holds the machine's own token, so two coordinators never drive one
//! machine at once. Commands are
//! applied synchronously under the control lock and never wait on hardware;
//! the execution loop runs on its own task (see [`crate::executor`]) and
//! observes the effects of commands at placement boundaries.

use crate::config::CoordinatorConfig;
use crate::delegate::{JobDelegate, SkipAndContinue};
use crate::error::CoordinatorError;
use crate::executor::{self, Run};
use pnp_adapters::MachineAdapter;
use pnp_core::{
    Command, CommandError, Cursor, Directive, Event, EventBus, Job, JobControls, JobState,
    Preconditions,
};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use tokio::sync::{Notify, OwnedSemaphorePermit, Semaphore};
use tracing::Instrument;

/// Placement counts for the current or most recent run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Progress {
    pub placed: usize,
    pub skipped: usize,
    /// Next placement to process
    pub cursor: Option<Cursor>,
}

/// Mutable coordinator state, guarded by one lock
pub(crate) struct Control {
    pub(crate) state: JobState,
    pub(crate) job: Option<Arc<Job>>,
    pub(crate) cursor: Option<Cursor>,
    /// Bumped on every launch and halt. A worker with a stale generation
    /// must not start new actuation.
    pub(crate) generation: u64,
    /// Set by a forced stop. Blocks place-phase actuation until the next launch.
    pub(crate) lockout: bool,
    /// Placements granted by `step` while paused
    pub(crate) steps: u32,
    /// The worker is between picking up a cursor and recording its outcome
    pub(crate) in_flight: bool,
    /// Paused while a placement was in flight. The first `step` is spent on
    /// that placement instead of granting another.
    pub(crate) draining: bool,
    /// Pause after the current placement (step from Stopped)
    pub(crate) auto_pause: bool,
    pub(crate) placed: usize,
    pub(crate) skipped: usize,
}

struct Inner<M> {
    machine: M,
    bus: EventBus,
    config: CoordinatorConfig,
    delegate: RwLock<Option<Arc<dyn JobDelegate>>>,
    control: Mutex<Control>,
    wake: Notify,
    run_token: Arc<Semaphore>,
    machine_token: Arc<Semaphore>,
}

/// Runs, pauses, steps and stops a job against one machine
pub struct Coordinator<M> {
    inner: Arc<Inner<M>>,
}

impl<M> Clone for Coordinator<M> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<M: MachineAdapter> Coordinator<M> {
    pub fn new(machine: M, bus: EventBus, config: CoordinatorConfig) -> Self {
        let machine_token = machine.run_token();
        Self {
            inner: Arc::new(Inner {
                machine,
                bus,
                config,
                delegate: RwLock::new(None),
                control: Mutex::new(Control {
                    state: JobState::Stopped,
                    job: None,
                    cursor: None,
                    generation: 0,
                    lockout: false,
                    steps: 0,
                    in_flight: false,
                    draining: false,
                    auto_pause: false,
                    placed: 0,
                    skipped: 0,
                }),
                wake: Notify::new(),
                run_token: Arc::new(Semaphore::new(1)),
                machine_token,
            }),
        }
    }

    pub fn machine(&self) -> &M {
        &self.inner.machine
    }

    pub fn bus(&self) -> &EventBus {
        &self.inner.bus
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.inner.config
    }

    /// Install the pick failure delegate, replacing any previous one
    pub fn set_delegate(&self, delegate: Arc<dyn JobDelegate>) {
        *self
            .inner
            .delegate
            .write()
            .unwrap_or_else(|e| e.into_inner()) = Some(delegate);
    }

    /// Remove the delegate; pick failures then skip the placement
    pub fn clear_delegate(&self) {
        *self
            .inner
            .delegate
            .write()
            .unwrap_or_else(|e| e.into_inner()) = None;
    }

    pub(crate) fn delegate(&self) -> Arc<dyn JobDelegate> {
        self.inner
            .delegate
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
            .unwrap_or_else(|| Arc::new(SkipAndContinue))
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, Control> {
        self.inner.control.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub(crate) async fn wait_for_wake(&self) {
        self.inner.wake.notified().await;
    }

    // -- Queries --------------------------------------------------------------

    pub fn state(&self) -> JobState {
        self.lock().state
    }

    pub fn job(&self) -> Option<Arc<Job>> {
        self.lock().job.clone()
    }

    pub fn cursor(&self) -> Option<Cursor> {
        self.lock().cursor
    }

    pub fn progress(&self) -> Progress {
        let control = self.lock();
        Progress {
            placed: control.placed,
            skipped: control.skipped,
            cursor: control.cursor,
        }
    }

    /// Operator actions available right now
    pub fn controls(&self) -> JobControls {
        JobControls::for_state(self.state(), self.inner.machine.is_enabled())
    }

    /// An execution loop still holds the run token
    pub fn is_run_in_progress(&self) -> bool {
        self.inner.run_token.available_permits() == 0
    }

    /// Wait until no execution loop holds the run token
    pub async fn join(&self) {
        if let Ok(permit) = self.inner.run_token.acquire().await {
            drop(permit);
        }
    }

    // -- Job lifecycle --------------------------------------------------------

    /// Replace the loaded job. Only allowed while Stopped with no run finishing.
    pub fn load_job(&self, job: Job) -> Result<(), CoordinatorError> {
        let mut control = self.lock();
        self.ensure_idle(&control)?;

        let boards = job.board_count();
        let placements = job.placement_count();
        control.job = Some(Arc::new(job));
        control.cursor = None;
        control.placed = 0;
        control.skipped = 0;

        tracing::info!(boards, placements, "job loaded");
        self.inner
            .bus
            .publish(Event::JobLoaded { boards, placements });
        Ok(())
    }

    pub fn new_job(&self) -> Result<(), CoordinatorError> {
        self.load_job(Job::new())
    }

    pub fn close_job(&self) -> Result<(), CoordinatorError> {
        let mut control = self.lock();
        self.ensure_idle(&control)?;
        if control.job.take().is_some() {
            control.cursor = None;
            tracing::info!("job closed");
            self.inner.bus.publish(Event::JobClosed);
        }
        Ok(())
    }

    /// Edit the loaded job in place, creating an empty one if none is loaded.
    /// Same restriction as [`Coordinator::load_job`].
    pub fn update_job<R>(&self, edit: impl FnOnce(&mut Job) -> R) -> Result<R, CoordinatorError> {
        let mut control = self.lock();
        self.ensure_idle(&control)?;

        let job = control.job.get_or_insert_with(|| Arc::new(Job::new()));
        let result = edit(Arc::make_mut(job));
        let event = Event::JobLoaded {
            boards: job.board_count(),
            placements: job.placement_count(),
        };
        control.cursor = None;

        self.inner.bus.publish(event);
        Ok(result)
    }

    fn ensure_idle(&self, control: &Control) -> Result<(), CoordinatorError> {
        if control.state != JobState::Stopped {
            return Err(CoordinatorError::JobActive(control.state));
        }
        if self.is_run_in_progress() {
            return Err(CommandError::RunInProgress.into());
        }
        Ok(())
    }

    // -- Commands -------------------------------------------------------------

    pub fn start(&self) -> Result<JobState, CoordinatorError> {
        self.command(Command::Start)
    }

    pub fn step(&self) -> Result<JobState, CoordinatorError> {
        self.command(Command::Step)
    }

    pub fn pause(&self) -> Result<JobState, CoordinatorError> {
        self.command(Command::Pause)
    }

    pub fn resume(&self) -> Result<JobState, CoordinatorError> {
        self.command(Command::Resume)
    }

    pub fn stop(&self) -> Result<JobState, CoordinatorError> {
        self.command(Command::Stop)
    }

    /// Start, pause or resume depending on the current state
    pub fn toggle(&self) -> Result<JobState, CoordinatorError> {
        self.command(Command::Toggle)
    }

    /// Apply an operator command. Returns the state after the command.
    /// Must be called from within a tokio runtime.
    pub fn command(&self, command: Command) -> Result<JobState, CoordinatorError> {
        let mut control = self.lock();
        let permit = Arc::clone(&self.inner.run_token).try_acquire_owned().ok();
        // Only a launch needs the machine's claim
        let claim = match &permit {
            Some(_) if control.state == JobState::Stopped => {
                Arc::clone(&self.inner.machine_token).try_acquire_owned().ok()
            }
            _ => None,
        };
        let pre = Preconditions {
            job_loaded: control.job.is_some(),
            machine_enabled: self.inner.machine.is_enabled(),
            run_in_progress: permit.is_none(),
            machine_claimed: permit.is_some()
                && control.state == JobState::Stopped
                && claim.is_none(),
        };

        let transition = match control.state.apply(command, &pre) {
            Ok(transition) => transition,
            Err(e) => {
                tracing::warn!(%command, state = %control.state, error = %e, "command rejected");
                return Err(e.into());
            }
        };
        tracing::info!(
            %command,
            from = %transition.from,
            to = %transition.to,
            "command accepted"
        );

        match transition.directive {
            Directive::Launch { auto_pause } => {
                let (Some(permit), Some(claim)) = (permit, claim) else {
                    return Err(CommandError::RunInProgress.into());
                };
                self.launch(&mut control, auto_pause, [claim, permit]);
            }
            Directive::Continue => {
                control.draining = false;
                self.set_state(&mut control, JobState::Running);
                self.inner.wake.notify_one();
            }
            Directive::StepOnce => {
                if control.draining {
                    control.draining = false;
                } else {
                    control.steps += 1;
                    self.inner.wake.notify_one();
                }
            }
            Directive::Suspend => {
                control.auto_pause = false;
                control.draining = control.in_flight;
                self.set_state(&mut control, JobState::Paused);
            }
            Directive::Halt => self.halt(&mut control),
            Directive::None => {}
        }

        Ok(control.state)
    }

    /// Stop because the machine can no longer be driven. Unlike an operator
    /// stop, no further actuation of the in-flight placement is allowed.
    pub fn force_stop(&self, reason: &str) {
        let mut control = self.lock();
        control.lockout = true;

        let transition = control.state.machine_disabled();
        if transition.directive == Directive::Halt {
            tracing::warn!(reason, from = %transition.from, "forcing stop");
            self.inner.bus.publish(Event::ForcedStop {
                reason: reason.to_string(),
            });
            self.halt(&mut control);
        }
    }

    fn launch(
        &self,
        control: &mut Control,
        auto_pause: bool,
        permits: [OwnedSemaphorePermit; 2],
    ) {
        let Some(job) = control.job.clone() else {
            return;
        };

        control.generation += 1;
        control.cursor = job.first_cursor();
        control.steps = 0;
        control.in_flight = false;
        control.draining = false;
        control.auto_pause = auto_pause;
        control.lockout = false;
        control.placed = 0;
        control.skipped = 0;
        self.set_state(control, JobState::Running);

        let run_id = uuid::Uuid::new_v4();
        let span = tracing::info_span!("job.run", run = %run_id, generation = control.generation);
        let run = Run::new(self.clone(), control.generation, job, permits);
        tokio::spawn(executor::run(run).instrument(span));
    }

    /// Discard the cursor and move to Stopped. The worker notices at its next check.
    pub(crate) fn halt(&self, control: &mut Control) {
        control.generation += 1;
        control.cursor = None;
        control.steps = 0;
        control.draining = false;
        control.auto_pause = false;
        self.set_state(control, JobState::Stopped);
        self.inner.wake.notify_one();
    }

    pub(crate) fn set_state(&self, control: &mut Control, to: JobState) {
        let from = control.state;
        if from != to {
            control.state = to;
            self.inner.bus.publish(Event::JobStateChanged { from, to });
        }
    }
}

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;
